//! Commission splits — fan-out of a collected fee across franchise tiers.
//!
//! Tier amounts are computed from a fixed percentage policy. The regional
//! and unit shares round to 2 decimal places; HQ takes the remainder so the
//! three tiers always sum to the fee exactly.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{ChargeId, FleetpayError, FranchiseId, Result, constants};

/// Fixed percentage policy for franchise commission fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionPolicy {
    /// HQ tier share (also absorbs the rounding remainder).
    pub hq_percent: Decimal,
    /// Regional franchise share.
    pub regional_percent: Decimal,
    /// Unit franchise share.
    pub unit_percent: Decimal,
}

impl CommissionPolicy {
    /// Validate that the three shares sum to exactly 100%.
    pub fn validate(&self) -> Result<()> {
        let total = self.hq_percent + self.regional_percent + self.unit_percent;
        if total != Decimal::ONE_HUNDRED {
            return Err(FleetpayError::InvalidPercentage {
                reason: format!("commission tiers sum to {total}, expected 100"),
            });
        }
        if self.hq_percent < Decimal::ZERO
            || self.regional_percent < Decimal::ZERO
            || self.unit_percent < Decimal::ZERO
        {
            return Err(FleetpayError::InvalidPercentage {
                reason: "commission tier percentage is negative".to_string(),
            });
        }
        Ok(())
    }

    /// Split a fee across the three tiers.
    ///
    /// Regional and unit shares round to 2 dp; HQ receives the remainder,
    /// so `hq + regional + unit == fee` holds exactly.
    #[must_use]
    pub fn allocate(&self, fee: Decimal) -> TierAmounts {
        let regional = (fee * self.regional_percent / Decimal::ONE_HUNDRED).round_dp(2);
        let unit = (fee * self.unit_percent / Decimal::ONE_HUNDRED).round_dp(2);
        let hq = fee - regional - unit;
        TierAmounts { hq, regional, unit }
    }
}

impl Default for CommissionPolicy {
    fn default() -> Self {
        Self {
            hq_percent: constants::DEFAULT_HQ_PERCENT,
            regional_percent: constants::DEFAULT_REGIONAL_PERCENT,
            unit_percent: constants::DEFAULT_UNIT_PERCENT,
        }
    }
}

/// Per-tier amounts produced by [`CommissionPolicy::allocate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierAmounts {
    pub hq: Decimal,
    pub regional: Decimal,
    pub unit: Decimal,
}

impl TierAmounts {
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.hq + self.regional + self.unit
    }
}

/// The franchise owners a split pays out to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FranchiseTiers {
    pub hq_id: FranchiseId,
    pub regional_id: FranchiseId,
    pub unit_id: FranchiseId,
}

/// Persisted fan-out of one collected fee across the franchise hierarchy.
///
/// Created only as a side effect of a SUCCESS charge; bookkeeping that is
/// eventually consistent relative to the authoritative charge record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionSplit {
    /// The charge whose fee this split fans out.
    pub charge_id: ChargeId,
    /// Franchise owners per tier.
    pub tiers: FranchiseTiers,
    /// Per-tier amounts; sum equals the charge's `fee_amount` exactly.
    pub amounts: TierAmounts,
    /// District the shipment ran in, when known.
    pub district_id: Option<String>,
    /// Region the shipment ran in, when known.
    pub region_id: Option<String>,
    /// When the split was recorded.
    pub created_at: DateTime<Utc>,
}
