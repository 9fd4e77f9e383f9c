//! Error types for the FleetPay settlement engine.
//!
//! All errors use the `FP_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Validation errors
//! - 2xx: Ledger / balance errors
//! - 3xx: Win-fee charge errors
//! - 4xx: Mandate errors
//! - 5xx: Payment gateway errors
//! - 9xx: General / internal errors

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{ChargeId, MandateId, MandateStatus, ShipmentId};

/// Central error enum for all FleetPay operations.
#[derive(Debug, Error)]
pub enum FleetpayError {
    // =================================================================
    // Validation Errors (1xx)
    // =================================================================
    /// An amount failed validation (zero, negative, or otherwise unusable).
    #[error("FP_ERR_100: Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    /// A configured percentage is out of range or percentages don't add up.
    #[error("FP_ERR_101: Invalid percentage: {reason}")]
    InvalidPercentage { reason: String },

    /// A status transition that the entity's state machine forbids.
    #[error("FP_ERR_102: Invalid transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    // =================================================================
    // Ledger / Balance Errors (2xx)
    // =================================================================
    /// A DEBIT would drive the operator balance negative.
    #[error("FP_ERR_200: Insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: Decimal, available: Decimal },

    /// One leg of an atomic posting failed; the whole batch was discarded.
    #[error("FP_ERR_201: Transaction aborted at leg {leg}: {reason}")]
    TransactionAborted { leg: usize, reason: String },

    /// A transfer where source and destination are the same operator.
    #[error("FP_ERR_202: Transfer source and destination are the same operator")]
    SelfTransfer,

    // =================================================================
    // Win-Fee Charge Errors (3xx)
    // =================================================================
    /// No charge exists for the given id.
    #[error("FP_ERR_300: Charge not found: {0}")]
    ChargeNotFound(ChargeId),

    /// The charge was already collected. Idempotent callers treat this as
    /// a no-op rather than a failure.
    #[error("FP_ERR_301: Charge already collected: {0}")]
    AlreadyCollected(ChargeId),

    /// The shipment could not be resolved to a booking/bid context.
    #[error("FP_ERR_302: Shipment not found: {0}")]
    ShipmentNotFound(ShipmentId),

    // =================================================================
    // Mandate Errors (4xx)
    // =================================================================
    /// No mandate exists for the given id.
    #[error("FP_ERR_400: Mandate not found: {0}")]
    MandateNotFound(MandateId),

    /// The mandate is not in a chargeable state.
    #[error("FP_ERR_401: Mandate {id} is {status}, not ACTIVE")]
    MandateNotActive { id: MandateId, status: MandateStatus },

    /// The mandate hit the failure threshold; the circuit breaker is open
    /// and the gateway was not contacted.
    #[error("FP_ERR_402: Mandate {0} is paused after repeated failures")]
    MandatePaused(MandateId),

    /// The requested amount exceeds the mandate's authorized cap.
    #[error("FP_ERR_403: Mandate limit exceeded: requested {requested}, max {max}")]
    MandateLimitExceeded { requested: Decimal, max: Decimal },

    // =================================================================
    // Payment Gateway Errors (5xx)
    // =================================================================
    /// The gateway processed the request and declined it.
    #[error("FP_ERR_500: Gateway declined: {reason}")]
    GatewayDeclined { reason: String },

    /// The gateway did not answer within the bounded timeout.
    /// Treated as a failure — success is never assumed.
    #[error("FP_ERR_501: Gateway timed out after {timeout_ms}ms")]
    GatewayTimeout { timeout_ms: u64 },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("FP_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Configuration error (bad config values, missing wiring).
    #[error("FP_ERR_901: Configuration error: {0}")]
    Configuration(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, FleetpayError>;
