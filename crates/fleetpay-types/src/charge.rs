//! # WinFeeCharge — the two-phase platform fee record
//!
//! A win-fee charge is *created* when an operator's bid wins (no money moves)
//! and *collected* when the trip actually starts. Decoupling the two keeps
//! operators from being penalized for shipments that never start.
//!
//! ## State Machine
//!
//! ```text
//!   ┌─────────┐  collection ok   ┌─────────┐  early cancel  ┌──────────┐
//!   │ PENDING ├─────────────────▶│ SUCCESS ├───────────────▶│ REFUNDED │
//!   └───┬─────┘                  └─────────┘                └──────────┘
//!       │ collection failed          ▲
//!       ▼                            │ retry ok
//!   ┌────────┐───────────────────────┘
//!   │ FAILED │
//!   └────────┘
//! ```
//!
//! At most one transition *into* SUCCESS is permitted per charge — the
//! idempotency contract for at-least-once trigger delivery hangs off this.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{BidId, BookingId, ChargeId, FleetpayError, OperatorId, Result, ShipmentId};

/// Collection status of a win-fee charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// Obligation recorded; no collection attempted yet (or retry scheduled).
    Pending,
    /// Fee collected. Entered at most once per charge.
    Success,
    /// Last collection attempt failed; the charge stays retryable.
    Failed,
    /// Collected then auto-refunded on early cancellation. Terminal.
    Refunded,
}

impl PaymentStatus {
    /// Can this status transition to the given target?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Success | Self::Failed)
                | (Self::Failed, Self::Success | Self::Pending)
                | (Self::Success, Self::Refunded)
        )
    }

    /// Whether a collection attempt is still allowed from this status.
    #[must_use]
    pub fn is_collectible(&self) -> bool {
        matches!(self, Self::Pending | Self::Failed)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Success => write!(f, "SUCCESS"),
            Self::Failed => write!(f, "FAILED"),
            Self::Refunded => write!(f, "REFUNDED"),
        }
    }
}

/// How a collected fee was actually pulled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Charged through the operator's UPI Autopay mandate.
    UpiMandate,
    /// Debited from the operator's wallet balance in the ledger.
    WalletDebit,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UpiMandate => write!(f, "UPI_MANDATE"),
            Self::WalletDebit => write!(f, "WALLET_DEBIT"),
        }
    }
}

/// Platform fee owed by an operator whose bid was accepted.
///
/// Created once per `(booking, bid)` pair; the deterministic [`ChargeId`]
/// makes duplicate creation converge on the same record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WinFeeCharge {
    /// Deterministic charge identifier (see [`ChargeId::for_bid`]).
    pub id: ChargeId,
    /// The operator who owes the fee.
    pub operator_id: OperatorId,
    /// The booking whose bid was won.
    pub booking_id: BookingId,
    /// The winning bid.
    pub bid_id: BidId,
    /// Fee amount computed from the bid at win time.
    pub fee_amount: Decimal,
    /// Collection status.
    pub payment_status: PaymentStatus,
    /// The shipment, once trip-start associates one.
    pub shipment_id: Option<ShipmentId>,
    /// How the fee was collected, once it was.
    pub payment_method: Option<PaymentMethod>,
    /// Reason recorded on the most recent failed attempt.
    pub failure_reason: Option<String>,
    /// When the fee was successfully collected.
    pub charged_at: Option<DateTime<Utc>>,
    /// Set by trip completion when the fee is still unpaid — flags the
    /// charge for follow-up. No money moves.
    pub overdue_since: Option<DateTime<Utc>>,
    /// District the winning bid ran in, when the booking domain supplied it.
    pub district_id: Option<String>,
    /// Region the winning bid ran in, when the booking domain supplied it.
    pub region_id: Option<String>,
    /// When the obligation was recorded.
    pub created_at: DateTime<Utc>,
}

impl WinFeeCharge {
    /// Record a new PENDING obligation. No money moves here.
    #[must_use]
    pub fn new(
        operator_id: OperatorId,
        booking_id: BookingId,
        bid_id: BidId,
        fee_amount: Decimal,
    ) -> Self {
        Self {
            id: ChargeId::for_bid(&booking_id, &bid_id),
            operator_id,
            booking_id,
            bid_id,
            fee_amount,
            payment_status: PaymentStatus::Pending,
            shipment_id: None,
            payment_method: None,
            failure_reason: None,
            charged_at: None,
            overdue_since: None,
            district_id: None,
            region_id: None,
            created_at: Utc::now(),
        }
    }

    fn transition(&mut self, target: PaymentStatus) -> Result<()> {
        if !self.payment_status.can_transition_to(target) {
            return Err(FleetpayError::InvalidTransition {
                from: self.payment_status.to_string(),
                to: target.to_string(),
            });
        }
        self.payment_status = target;
        Ok(())
    }

    /// Mark the fee collected. Fails with [`FleetpayError::AlreadyCollected`]
    /// if a SUCCESS transition already happened — callers relying on the
    /// idempotency contract check the status first and short-circuit.
    pub fn mark_collected(&mut self, method: PaymentMethod) -> Result<()> {
        if self.payment_status == PaymentStatus::Success {
            return Err(FleetpayError::AlreadyCollected(self.id));
        }
        self.transition(PaymentStatus::Success)?;
        self.payment_method = Some(method);
        self.failure_reason = None;
        self.charged_at = Some(Utc::now());
        Ok(())
    }

    /// Record a failed collection attempt. The charge stays retryable.
    pub fn mark_failed(&mut self, reason: impl Into<String>) -> Result<()> {
        // FAILED -> FAILED keeps the latest reason without a transition.
        if self.payment_status != PaymentStatus::Failed {
            self.transition(PaymentStatus::Failed)?;
        }
        self.failure_reason = Some(reason.into());
        Ok(())
    }

    /// Auto-refund after early cancellation. Only a SUCCESS charge refunds.
    pub fn mark_refunded(&mut self) -> Result<()> {
        self.transition(PaymentStatus::Refunded)
    }

    /// Flag the charge for follow-up when the trip completed unpaid.
    pub fn mark_overdue(&mut self) {
        if self.overdue_since.is_none() {
            self.overdue_since = Some(Utc::now());
        }
    }
}

/// Dummy charge for testing. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl WinFeeCharge {
    /// Create a dummy charge for unit tests.
    pub fn dummy(fee_amount: Decimal) -> Self {
        let n: u32 = rand::random();
        Self::new(
            OperatorId::new(),
            BookingId::new(format!("BK-{n}")),
            BidId::new(format!("BID-{n}")),
            fee_amount,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_charge() -> WinFeeCharge {
        WinFeeCharge::dummy(Decimal::new(3000, 0))
    }

    #[test]
    fn new_charge_is_pending() {
        let charge = make_charge();
        assert_eq!(charge.payment_status, PaymentStatus::Pending);
        assert!(charge.charged_at.is_none());
        assert!(charge.payment_method.is_none());
        assert_eq!(charge.id, ChargeId::for_bid(&charge.booking_id, &charge.bid_id));
    }

    #[test]
    fn transitions_valid() {
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Success));
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Failed));
        assert!(PaymentStatus::Failed.can_transition_to(PaymentStatus::Success));
        assert!(PaymentStatus::Failed.can_transition_to(PaymentStatus::Pending));
        assert!(PaymentStatus::Success.can_transition_to(PaymentStatus::Refunded));
    }

    #[test]
    fn transitions_invalid() {
        assert!(!PaymentStatus::Success.can_transition_to(PaymentStatus::Pending));
        assert!(!PaymentStatus::Success.can_transition_to(PaymentStatus::Failed));
        assert!(!PaymentStatus::Refunded.can_transition_to(PaymentStatus::Pending));
        assert!(!PaymentStatus::Refunded.can_transition_to(PaymentStatus::Success));
        assert!(!PaymentStatus::Pending.can_transition_to(PaymentStatus::Refunded));
    }

    #[test]
    fn collect_records_method_and_timestamp() {
        let mut charge = make_charge();
        charge.mark_collected(PaymentMethod::WalletDebit).unwrap();
        assert_eq!(charge.payment_status, PaymentStatus::Success);
        assert_eq!(charge.payment_method, Some(PaymentMethod::WalletDebit));
        assert!(charge.charged_at.is_some());
    }

    #[test]
    fn double_collect_blocked() {
        let mut charge = make_charge();
        charge.mark_collected(PaymentMethod::UpiMandate).unwrap();
        let err = charge.mark_collected(PaymentMethod::UpiMandate).unwrap_err();
        assert!(matches!(err, FleetpayError::AlreadyCollected(id) if id == charge.id));
    }

    #[test]
    fn failed_charge_can_retry_into_success() {
        let mut charge = make_charge();
        charge.mark_failed("gateway declined").unwrap();
        assert_eq!(charge.payment_status, PaymentStatus::Failed);
        assert_eq!(charge.failure_reason.as_deref(), Some("gateway declined"));

        charge.mark_collected(PaymentMethod::UpiMandate).unwrap();
        assert_eq!(charge.payment_status, PaymentStatus::Success);
        assert!(charge.failure_reason.is_none());
    }

    #[test]
    fn repeated_failure_keeps_latest_reason() {
        let mut charge = make_charge();
        charge.mark_failed("first").unwrap();
        charge.mark_failed("second").unwrap();
        assert_eq!(charge.failure_reason.as_deref(), Some("second"));
    }

    #[test]
    fn refund_requires_success() {
        let mut charge = make_charge();
        let err = charge.mark_refunded().unwrap_err();
        assert!(matches!(err, FleetpayError::InvalidTransition { .. }));

        charge.mark_collected(PaymentMethod::WalletDebit).unwrap();
        charge.mark_refunded().unwrap();
        assert_eq!(charge.payment_status, PaymentStatus::Refunded);
    }

    #[test]
    fn overdue_timestamp_set_once() {
        let mut charge = make_charge();
        charge.mark_overdue();
        let first = charge.overdue_since;
        assert!(first.is_some());
        charge.mark_overdue();
        assert_eq!(charge.overdue_since, first);
    }

    #[test]
    fn serde_roundtrip() {
        let charge = make_charge();
        let json = serde_json::to_string(&charge).unwrap();
        let back: WinFeeCharge = serde_json::from_str(&json).unwrap();
        assert_eq!(charge.id, back.id);
        assert_eq!(charge.fee_amount, back.fee_amount);
        assert_eq!(charge.payment_status, back.payment_status);
    }
}
