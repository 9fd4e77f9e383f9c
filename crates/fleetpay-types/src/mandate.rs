//! # UPIMandate — recurring-payment authorization with a circuit breaker
//!
//! A mandate authorizes the platform to pull up to `max_amount` from the
//! operator's UPI account. Consecutive charge failures trip a breaker:
//! the third failure moves the mandate to PAUSED and further charges are
//! short-circuited without contacting the gateway.
//!
//! ## State Machine
//!
//! ```text
//!   ┌─────────┐  approve  ┌────────┐  3rd failure  ┌────────┐
//!   │ PENDING ├──────────▶│ ACTIVE ├──────────────▶│ PAUSED │
//!   └───┬─────┘           └───┬────┘               └───┬────┘
//!       │                     │      reactivate        │
//!       │                     │◀───────────────────────┤
//!       │ revoke              │ revoke                 │ revoke
//!       ▼                     ▼                        ▼
//!   ┌─────────────────────────────────────────────────────┐
//!   │                       REVOKED                       │
//!   └─────────────────────────────────────────────────────┘
//! ```
//!
//! Reactivation from PAUSED is an explicit admin action — nothing in this
//! engine resumes a paused mandate on its own.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{FleetpayError, MandateId, OperatorId, Result, constants};

/// Lifecycle state of a UPI mandate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MandateStatus {
    /// Created, awaiting operator approval on the UPI rail.
    Pending,
    /// Approved and chargeable.
    Active,
    /// Circuit breaker tripped after repeated failures.
    Paused,
    /// Revoked by the operator. Terminal.
    Revoked,
}

impl MandateStatus {
    /// Can this status transition to the given target?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Active)
                | (Self::Active, Self::Paused)
                | (Self::Paused, Self::Active)
                | (Self::Pending | Self::Active | Self::Paused, Self::Revoked)
        )
    }
}

impl std::fmt::Display for MandateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Active => write!(f, "ACTIVE"),
            Self::Paused => write!(f, "PAUSED"),
            Self::Revoked => write!(f, "REVOKED"),
        }
    }
}

/// A UPI Autopay authorization for recurring fee collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpiMandate {
    /// Globally unique mandate identifier.
    pub id: MandateId,
    /// The operator who granted the mandate.
    pub operator_id: OperatorId,
    /// The operator's UPI handle (e.g. `fleet@okbank`).
    pub upi_id: String,
    /// Per-charge cap authorized by the operator.
    pub max_amount: Decimal,
    /// Lifecycle state.
    pub status: MandateStatus,
    /// Consecutive failures since the last success (0..=3).
    pub failure_count: u8,
    /// Reason recorded on the most recent failure.
    pub last_failure_reason: Option<String>,
    /// When the mandate last charged successfully.
    pub last_used_at: Option<DateTime<Utc>>,
    /// When the mandate was registered.
    pub created_at: DateTime<Utc>,
}

impl UpiMandate {
    /// Register a new mandate in PENDING state.
    #[must_use]
    pub fn new(operator_id: OperatorId, upi_id: impl Into<String>, max_amount: Decimal) -> Self {
        Self {
            id: MandateId::new(),
            operator_id,
            upi_id: upi_id.into(),
            max_amount,
            status: MandateStatus::Pending,
            failure_count: 0,
            last_failure_reason: None,
            last_used_at: None,
            created_at: Utc::now(),
        }
    }

    fn transition(&mut self, target: MandateStatus) -> Result<()> {
        if !self.status.can_transition_to(target) {
            return Err(FleetpayError::InvalidTransition {
                from: self.status.to_string(),
                to: target.to_string(),
            });
        }
        self.status = target;
        Ok(())
    }

    /// Operator approved the mandate on the UPI rail.
    pub fn approve(&mut self) -> Result<()> {
        self.transition(MandateStatus::Active)
    }

    /// Operator revoked the mandate. Terminal.
    pub fn revoke(&mut self) -> Result<()> {
        self.transition(MandateStatus::Revoked)
    }

    /// Explicit admin reactivation from PAUSED. Resets the breaker.
    pub fn reactivate(&mut self) -> Result<()> {
        self.transition(MandateStatus::Active)?;
        self.failure_count = 0;
        self.last_failure_reason = None;
        Ok(())
    }

    /// Record a successful charge: reset the breaker, stamp `last_used_at`.
    pub fn record_success(&mut self) {
        self.failure_count = 0;
        self.last_failure_reason = None;
        self.last_used_at = Some(Utc::now());
    }

    /// Record a failed charge. Increments the failure counter and trips the
    /// breaker (ACTIVE → PAUSED) exactly when the threshold is reached.
    /// Returns `true` if this failure paused the mandate.
    pub fn record_failure(&mut self, reason: impl Into<String>) -> bool {
        self.failure_count = self.failure_count.saturating_add(1);
        self.last_failure_reason = Some(reason.into());
        if self.status == MandateStatus::Active
            && self.failure_count >= constants::MAX_MANDATE_FAILURES
        {
            self.status = MandateStatus::Paused;
            return true;
        }
        false
    }

    /// Whether the breaker is open (no gateway contact allowed).
    #[must_use]
    pub fn breaker_open(&self) -> bool {
        self.failure_count >= constants::MAX_MANDATE_FAILURES
    }
}

/// Dummy mandate for testing. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl UpiMandate {
    /// Create an already-ACTIVE dummy mandate for unit tests.
    pub fn dummy_active(max_amount: Decimal) -> Self {
        let mut mandate = Self::new(OperatorId::new(), "fleet@okbank", max_amount);
        mandate.status = MandateStatus::Active;
        mandate
    }
}
