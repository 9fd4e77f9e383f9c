//! Payment gateway abstraction.
//!
//! The concrete gateway is chosen once when the engine is constructed and
//! injected as a trait object — there is no per-call mode branching. A real
//! UPI rail integration lives outside this workspace; the scripted
//! [`SimulatedGateway`] here serves tests and non-production deployments.
//!
//! Every call carries a bounded timeout. A timeout is a **failure**: the
//! caller must never assume the money moved.

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Mutex;
use rust_decimal::Decimal;
use uuid::Uuid;

use fleetpay_types::MandateId;

/// One collection attempt against the UPI rail.
#[derive(Debug, Clone)]
pub struct CollectionRequest {
    pub mandate_id: MandateId,
    /// The operator's UPI handle the mandate was granted on.
    pub upi_id: String,
    pub amount: Decimal,
    pub description: String,
    /// Traceability pointer (charge id or shipment id).
    pub reference_id: String,
    /// Bounded timeout for this call.
    pub timeout: Duration,
}

/// What the gateway reported back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayResponse {
    /// The debit went through; `gateway_ref` is the rail-side reference.
    Approved { gateway_ref: String },
    /// The rail processed the request and said no.
    Declined { reason: String },
    /// No answer within the timeout. Treated as a failure.
    TimedOut,
}

/// A payment rail capable of executing mandate collections.
pub trait PaymentGateway: Send + Sync {
    /// Execute one collection. Blocks for at most `request.timeout`.
    fn collect(&self, request: &CollectionRequest) -> GatewayResponse;
}

/// Scripted in-memory gateway.
///
/// Outcomes are served from a queue; when the queue is empty every call is
/// approved with a generated reference. Thread-safe, so concurrent mandate
/// charges behave like they would against the real rail.
#[derive(Default)]
pub struct SimulatedGateway {
    scripted: Mutex<VecDeque<GatewayResponse>>,
}

impl SimulatedGateway {
    /// A gateway that approves everything.
    #[must_use]
    pub fn approving() -> Self {
        Self::default()
    }

    /// Queue the outcome for the next collection call.
    pub fn script(&self, response: GatewayResponse) {
        self.scripted.lock().push_back(response);
    }

    /// Queue `n` declines with the given reason.
    pub fn script_declines(&self, n: usize, reason: &str) {
        let mut scripted = self.scripted.lock();
        for _ in 0..n {
            scripted.push_back(GatewayResponse::Declined {
                reason: reason.to_string(),
            });
        }
    }
}

impl PaymentGateway for SimulatedGateway {
    fn collect(&self, _request: &CollectionRequest) -> GatewayResponse {
        if let Some(response) = self.scripted.lock().pop_front() {
            return response;
        }
        GatewayResponse::Approved {
            gateway_ref: format!("sim-{}", Uuid::now_v7()),
        }
    }
}
