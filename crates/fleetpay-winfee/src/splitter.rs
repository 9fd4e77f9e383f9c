//! Commission splitter — fan-out of a collected fee across franchise tiers.
//!
//! Invoked only after a charge reaches SUCCESS. Recording is idempotent per
//! charge, and a recording failure is the *caller's* problem to log, never
//! to roll back: the charge record stays authoritative and the split is
//! eventually consistent bookkeeping.

use std::collections::HashMap;

use chrono::Utc;
use parking_lot::Mutex;
use rust_decimal::Decimal;

use fleetpay_types::{
    ChargeId, CommissionPolicy, CommissionSplit, FleetpayError, FranchiseTiers, Result,
};

/// Records one commission split per collected charge.
pub struct CommissionSplitter {
    policy: CommissionPolicy,
    splits: Mutex<HashMap<ChargeId, CommissionSplit>>,
}

impl CommissionSplitter {
    /// # Errors
    /// Returns `InvalidPercentage` when the policy doesn't sum to 100.
    pub fn new(policy: CommissionPolicy) -> Result<Self> {
        policy.validate()?;
        Ok(Self {
            policy,
            splits: Mutex::new(HashMap::new()),
        })
    }

    /// Split `fee` across the tiers and persist the record.
    ///
    /// Duplicate calls for the same charge return the existing split
    /// unchanged — at-least-once callers converge on one record.
    pub fn record(
        &self,
        charge_id: ChargeId,
        fee: Decimal,
        tiers: FranchiseTiers,
        district_id: Option<String>,
        region_id: Option<String>,
    ) -> Result<CommissionSplit> {
        if fee <= Decimal::ZERO {
            return Err(FleetpayError::InvalidAmount {
                reason: format!("commission fee must be positive, got {fee}"),
            });
        }

        let mut splits = self.splits.lock();
        if let Some(existing) = splits.get(&charge_id) {
            return Ok(existing.clone());
        }

        let amounts = self.policy.allocate(fee);
        let split = CommissionSplit {
            charge_id,
            tiers,
            amounts,
            district_id,
            region_id,
            created_at: Utc::now(),
        };
        splits.insert(charge_id, split.clone());
        tracing::debug!(
            charge = %charge_id,
            hq = %amounts.hq,
            regional = %amounts.regional,
            unit = %amounts.unit,
            "Commission split recorded"
        );
        Ok(split)
    }

    /// The split recorded for a charge, if any.
    #[must_use]
    pub fn get(&self, charge_id: ChargeId) -> Option<CommissionSplit> {
        self.splits.lock().get(&charge_id).cloned()
    }
}
