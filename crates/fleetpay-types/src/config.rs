//! Configuration for the settlement engine.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{CommissionPolicy, FleetpayError, Result, constants};

/// Top-level configuration for the ledger & settlement engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Platform fee as a percentage of the winning bid (0 < pct <= 100).
    pub fee_percent: Decimal,
    /// Seconds after collection during which a cancellation auto-refunds.
    pub refund_window_secs: i64,
    /// Commission fan-out policy.
    pub commission: CommissionPolicy,
    /// Payment gateway settings.
    pub gateway: GatewayConfig,
    /// Default page size for entry listings.
    pub page_limit: usize,
}

impl EngineConfig {
    /// Validate all configured values.
    pub fn validate(&self) -> Result<()> {
        if self.fee_percent <= Decimal::ZERO || self.fee_percent > Decimal::ONE_HUNDRED {
            return Err(FleetpayError::InvalidPercentage {
                reason: format!("fee_percent {} out of (0, 100]", self.fee_percent),
            });
        }
        if self.refund_window_secs < 0 {
            return Err(FleetpayError::Configuration(
                "refund_window_secs must be non-negative".to_string(),
            ));
        }
        if self.page_limit == 0 || self.page_limit > constants::MAX_PAGE_LIMIT {
            return Err(FleetpayError::Configuration(format!(
                "page_limit {} out of 1..={}",
                self.page_limit,
                constants::MAX_PAGE_LIMIT
            )));
        }
        self.commission.validate()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fee_percent: constants::DEFAULT_FEE_PERCENT,
            refund_window_secs: constants::REFUND_WINDOW_SECS,
            commission: CommissionPolicy::default(),
            gateway: GatewayConfig::default(),
            page_limit: constants::DEFAULT_PAGE_LIMIT,
        }
    }
}

/// Payment gateway settings. The concrete gateway implementation is injected
/// once at engine construction; this only carries the call parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Bounded timeout for a single gateway call, in milliseconds.
    pub timeout_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            timeout_ms: constants::DEFAULT_GATEWAY_TIMEOUT_MS,
        }
    }
}
