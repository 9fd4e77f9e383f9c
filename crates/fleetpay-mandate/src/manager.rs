//! The mandate manager — lifecycle transitions and circuit-broken charging.
//!
//! Charge validation order (each check before any gateway contact):
//! 1. mandate exists
//! 2. mandate is ACTIVE (PAUSED short-circuits with `MandatePaused`)
//! 3. amount within the authorized cap
//! 4. failure threshold not reached
//!
//! A mandate's own lock is held across the gateway call, so concurrent
//! charges against one mandate serialize and the failure counter stays
//! exact. Charges against different mandates proceed in parallel.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;

use fleetpay_types::{
    FleetpayError, GatewayConfig, MandateId, MandateStatus, OperatorId, Result, UpiMandate,
};

use crate::gateway::{CollectionRequest, GatewayResponse, PaymentGateway};

/// Proof of a successful mandate collection.
#[derive(Debug, Clone)]
pub struct MandateChargeReceipt {
    pub mandate_id: MandateId,
    pub operator_id: OperatorId,
    pub amount: Decimal,
    /// Rail-side reference returned by the gateway.
    pub gateway_ref: String,
    pub charged_at: DateTime<Utc>,
}

/// Owns every mandate and is the only component that mutates them.
pub struct MandateManager {
    mandates: RwLock<HashMap<MandateId, Arc<Mutex<UpiMandate>>>>,
    /// Latest registered mandate per operator, for collection routing.
    by_operator: RwLock<HashMap<OperatorId, MandateId>>,
    gateway: Arc<dyn PaymentGateway>,
    config: GatewayConfig,
}

impl MandateManager {
    /// Construct with an injected gateway. The gateway choice is made here,
    /// once — never per call.
    #[must_use]
    pub fn new(gateway: Arc<dyn PaymentGateway>, config: GatewayConfig) -> Self {
        Self {
            mandates: RwLock::new(HashMap::new()),
            by_operator: RwLock::new(HashMap::new()),
            gateway,
            config,
        }
    }

    /// Register a new PENDING mandate for an operator.
    ///
    /// # Errors
    /// Returns `InvalidAmount` if `max_amount` is not positive.
    pub fn register(
        &self,
        operator_id: OperatorId,
        upi_id: impl Into<String>,
        max_amount: Decimal,
    ) -> Result<MandateId> {
        if max_amount <= Decimal::ZERO {
            return Err(FleetpayError::InvalidAmount {
                reason: format!("mandate max_amount must be positive, got {max_amount}"),
            });
        }
        let mandate = UpiMandate::new(operator_id, upi_id, max_amount);
        let mandate_id = mandate.id;
        self.mandates
            .write()
            .insert(mandate_id, Arc::new(Mutex::new(mandate)));
        self.by_operator.write().insert(operator_id, mandate_id);
        Ok(mandate_id)
    }

    fn handle(&self, mandate_id: MandateId) -> Result<Arc<Mutex<UpiMandate>>> {
        self.mandates
            .read()
            .get(&mandate_id)
            .cloned()
            .ok_or(FleetpayError::MandateNotFound(mandate_id))
    }

    /// Operator approved the mandate on the UPI rail: PENDING → ACTIVE.
    pub fn approve(&self, mandate_id: MandateId) -> Result<()> {
        let handle = self.handle(mandate_id)?;
        let mut mandate = handle.lock();
        mandate.approve()
    }

    /// Operator revoked the mandate. Terminal.
    pub fn revoke(&self, mandate_id: MandateId) -> Result<()> {
        let handle = self.handle(mandate_id)?;
        let mut mandate = handle.lock();
        mandate.revoke()
    }

    /// Explicit admin reactivation from PAUSED. Nothing in this engine
    /// resumes a paused mandate automatically.
    pub fn reactivate(&self, mandate_id: MandateId) -> Result<()> {
        let handle = self.handle(mandate_id)?;
        let mut mandate = handle.lock();
        mandate.reactivate()?;
        tracing::info!(mandate = %mandate_id, "Mandate reactivated by admin");
        Ok(())
    }

    /// Snapshot of a mandate's current state.
    pub fn get(&self, mandate_id: MandateId) -> Result<UpiMandate> {
        let handle = self.handle(mandate_id)?;
        let mandate = handle.lock();
        Ok(mandate.clone())
    }

    /// The operator's chargeable mandate, if they have one that is ACTIVE.
    #[must_use]
    pub fn active_mandate_for(&self, operator_id: OperatorId) -> Option<MandateId> {
        let mandate_id = *self.by_operator.read().get(&operator_id)?;
        let handle = self.mandates.read().get(&mandate_id).cloned()?;
        let mandate = handle.lock();
        (mandate.status == MandateStatus::Active).then_some(mandate_id)
    }

    /// Charge a mandate through the gateway.
    ///
    /// On success the failure counter resets and `last_used_at` is stamped.
    /// On decline or timeout the counter increments and the mandate pauses
    /// exactly when the third consecutive failure is recorded.
    ///
    /// # Errors
    /// - `MandateNotFound` / `MandateNotActive` / `MandatePaused`
    /// - `MandateLimitExceeded` if `amount > max_amount`
    /// - `GatewayDeclined` / `GatewayTimeout` for failed attempts
    pub fn charge(
        &self,
        mandate_id: MandateId,
        amount: Decimal,
        description: &str,
        reference_id: &str,
    ) -> Result<MandateChargeReceipt> {
        if amount <= Decimal::ZERO {
            return Err(FleetpayError::InvalidAmount {
                reason: format!("charge amount must be positive, got {amount}"),
            });
        }

        let handle = self.handle(mandate_id)?;
        let mut mandate = handle.lock();

        match mandate.status {
            MandateStatus::Active => {}
            MandateStatus::Paused => return Err(FleetpayError::MandatePaused(mandate_id)),
            status => {
                return Err(FleetpayError::MandateNotActive {
                    id: mandate_id,
                    status,
                });
            }
        }
        if amount > mandate.max_amount {
            return Err(FleetpayError::MandateLimitExceeded {
                requested: amount,
                max: mandate.max_amount,
            });
        }
        // Breaker check before any gateway contact. Unreachable while the
        // third failure pauses synchronously, but the contract stands alone.
        if mandate.breaker_open() {
            return Err(FleetpayError::MandatePaused(mandate_id));
        }

        let request = CollectionRequest {
            mandate_id,
            upi_id: mandate.upi_id.clone(),
            amount,
            description: description.to_string(),
            reference_id: reference_id.to_string(),
            timeout: Duration::from_millis(self.config.timeout_ms),
        };
        let response = self.gateway.collect(&request);

        match response {
            GatewayResponse::Approved { gateway_ref } => {
                mandate.record_success();
                tracing::info!(
                    mandate = %mandate_id,
                    operator = %mandate.operator_id,
                    amount = %amount,
                    gateway_ref = %gateway_ref,
                    "Mandate charge approved"
                );
                Ok(MandateChargeReceipt {
                    mandate_id,
                    operator_id: mandate.operator_id,
                    amount,
                    gateway_ref,
                    charged_at: Utc::now(),
                })
            }
            GatewayResponse::Declined { reason } => {
                let paused = mandate.record_failure(reason.clone());
                if paused {
                    tracing::warn!(
                        mandate = %mandate_id,
                        failures = mandate.failure_count,
                        "Mandate paused after repeated failures"
                    );
                }
                Err(FleetpayError::GatewayDeclined { reason })
            }
            GatewayResponse::TimedOut => {
                // A timeout never means success.
                let paused = mandate.record_failure("gateway timeout");
                if paused {
                    tracing::warn!(
                        mandate = %mandate_id,
                        failures = mandate.failure_count,
                        "Mandate paused after repeated failures"
                    );
                }
                Err(FleetpayError::GatewayTimeout {
                    timeout_ms: self.config.timeout_ms,
                })
            }
        }
    }
}
