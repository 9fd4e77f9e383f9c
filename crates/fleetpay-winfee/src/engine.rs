//! The win-fee lifecycle engine.
//!
//! Two-phase fee handling: the obligation is *recorded* at bid-win (no money
//! moves) and *collected* at trip-start. Triggers arrive at-least-once from
//! the booking domain's event pipeline, so every handler is idempotent —
//! trip-start short-circuits on an already-collected charge, and the
//! deterministic charge id makes duplicate creation converge.
//!
//! Collection failure is reported, logged, and left retryable. It never
//! blocks the trip from starting.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;

use fleetpay_ledger::Ledger;
use fleetpay_mandate::MandateManager;
use fleetpay_types::{
    BidId, BookingId, ChargeId, CommissionSplit, EngineConfig, EntryType, FleetpayError,
    FranchiseTiers, OperatorId, PaymentMethod, PaymentStatus, Reference, Result, ShipmentId,
    WinFeeCharge,
};

use crate::directory::{ShipmentContext, ShipmentDirectory};
use crate::splitter::CommissionSplitter;

/// Returned by [`WinFeeEngine::on_bid_win`].
#[derive(Debug, Clone)]
pub struct BidWinAck {
    pub charge_id: ChargeId,
    pub fee_amount: Decimal,
}

/// Returned by [`WinFeeEngine::on_trip_start`].
///
/// `fee_collected == false` is not an error: the trip proceeds and the
/// charge stays retryable.
#[derive(Debug, Clone)]
pub struct TripStartOutcome {
    pub fee_collected: bool,
    pub fee_amount: Decimal,
    pub payment_method: Option<PaymentMethod>,
    pub message: String,
}

/// Drives the win-fee lifecycle across the ledger, mandate manager, and
/// commission splitter.
pub struct WinFeeEngine {
    config: EngineConfig,
    ledger: Arc<Ledger>,
    mandates: Arc<MandateManager>,
    splitter: CommissionSplitter,
    directory: Arc<dyn ShipmentDirectory>,
    /// Franchise owners commissions fan out to.
    franchise: FranchiseTiers,
    charges: RwLock<HashMap<ChargeId, Arc<Mutex<WinFeeCharge>>>>,
}

impl WinFeeEngine {
    /// # Errors
    /// Returns `InvalidPercentage`/`Configuration` for bad config values.
    pub fn new(
        config: EngineConfig,
        ledger: Arc<Ledger>,
        mandates: Arc<MandateManager>,
        directory: Arc<dyn ShipmentDirectory>,
        franchise: FranchiseTiers,
    ) -> Result<Self> {
        config.validate()?;
        let splitter = CommissionSplitter::new(config.commission)?;
        Ok(Self {
            config,
            ledger,
            mandates,
            splitter,
            directory,
            franchise,
            charges: RwLock::new(HashMap::new()),
        })
    }

    /// The ledger this engine posts to, for balance and statement queries.
    #[must_use]
    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    /// Snapshot of a charge's current state.
    pub fn charge(&self, charge_id: ChargeId) -> Result<WinFeeCharge> {
        let handle = self
            .charges
            .read()
            .get(&charge_id)
            .cloned()
            .ok_or(FleetpayError::ChargeNotFound(charge_id))?;
        let charge = handle.lock();
        Ok(charge.clone())
    }

    /// The commission split recorded for a charge, if any.
    #[must_use]
    pub fn split(&self, charge_id: ChargeId) -> Option<CommissionSplit> {
        self.splitter.get(charge_id)
    }

    fn compute_fee(&self, bid_amount: Decimal) -> Result<Decimal> {
        if bid_amount <= Decimal::ZERO {
            return Err(FleetpayError::InvalidAmount {
                reason: format!("bid amount must be positive, got {bid_amount}"),
            });
        }
        Ok((bid_amount * self.config.fee_percent / Decimal::ONE_HUNDRED).round_dp(2))
    }

    fn charge_handle(
        &self,
        charge_id: ChargeId,
        create: impl FnOnce() -> WinFeeCharge,
    ) -> Arc<Mutex<WinFeeCharge>> {
        if let Some(handle) = self.charges.read().get(&charge_id) {
            return Arc::clone(handle);
        }
        let mut charges = self.charges.write();
        Arc::clone(
            charges
                .entry(charge_id)
                .or_insert_with(|| Arc::new(Mutex::new(create()))),
        )
    }

    /// Bid-win trigger: record the fee obligation. Zero ledger mutation —
    /// bids on shipments that never start are not penalized.
    ///
    /// Re-delivery of the same `(booking, bid)` win returns the existing
    /// charge unchanged.
    pub fn on_bid_win(
        &self,
        operator_id: OperatorId,
        booking_id: BookingId,
        bid_id: BidId,
        bid_amount: Decimal,
        district_id: Option<String>,
        region_id: Option<String>,
    ) -> Result<BidWinAck> {
        let fee_amount = self.compute_fee(bid_amount)?;
        let charge_id = ChargeId::for_bid(&booking_id, &bid_id);

        let handle = self.charge_handle(charge_id, || {
            let mut charge = WinFeeCharge::new(operator_id, booking_id, bid_id, fee_amount);
            charge.district_id = district_id;
            charge.region_id = region_id;
            tracing::info!(
                charge = %charge_id,
                operator = %operator_id,
                fee = %fee_amount,
                "Win-fee charge recorded at bid win"
            );
            charge
        });
        let charge = handle.lock();
        Ok(BidWinAck {
            charge_id,
            fee_amount: charge.fee_amount,
        })
    }

    /// Trip-start trigger: collect the fee.
    ///
    /// Looks up (or creates on the fly) the charge for the shipment's
    /// `(booking, bid)` pair. If the charge is already SUCCESS, returns
    /// immediately with `fee_collected = true` and no side effects —
    /// at-least-once delivery protection. Otherwise attempts collection via
    /// the operator's active mandate, falling back to a direct wallet
    /// debit; failure leaves the charge retryable and the trip unblocked.
    ///
    /// # Errors
    /// Only synchronous validation fails: `ShipmentNotFound`. Collection
    /// failures come back inside the outcome.
    pub fn on_trip_start(&self, shipment_id: &ShipmentId) -> Result<TripStartOutcome> {
        let context = self
            .directory
            .resolve(shipment_id)
            .ok_or_else(|| FleetpayError::ShipmentNotFound(shipment_id.clone()))?;
        let charge_id = ChargeId::for_bid(&context.booking_id, &context.bid_id);

        // A missed bid-win trigger must not lose the fee: create on the fly.
        let fallback_fee = self.compute_fee(context.bid_amount)?;
        let handle = self.charge_handle(charge_id, || {
            tracing::warn!(
                charge = %charge_id,
                shipment = %shipment_id,
                "No charge from bid win, creating at trip start"
            );
            let mut charge = WinFeeCharge::new(
                context.operator_id,
                context.booking_id.clone(),
                context.bid_id.clone(),
                fallback_fee,
            );
            charge.district_id = context.district_id.clone();
            charge.region_id = context.region_id.clone();
            charge
        });

        // The charge lock is held across the whole attempt, so a duplicate
        // trigger waits and then hits the SUCCESS short-circuit.
        let mut charge = handle.lock();
        if charge.shipment_id.is_none() {
            charge.shipment_id = Some(shipment_id.clone());
        }

        if charge.payment_status == PaymentStatus::Success {
            return Ok(TripStartOutcome {
                fee_collected: true,
                fee_amount: charge.fee_amount,
                payment_method: charge.payment_method,
                message: "win fee already collected".to_string(),
            });
        }
        if !charge.payment_status.is_collectible() {
            return Ok(TripStartOutcome {
                fee_collected: false,
                fee_amount: charge.fee_amount,
                payment_method: None,
                message: format!(
                    "charge is {}, left for manual review",
                    charge.payment_status
                ),
            });
        }

        let fee = charge.fee_amount;
        let description = format!("Win fee for booking {}", charge.booking_id);
        let attempt = self.try_collect(&context, charge_id, fee, &description);

        match attempt {
            Ok(method) => {
                charge.mark_collected(method)?;
                self.record_split(&charge);
                tracing::info!(
                    charge = %charge_id,
                    shipment = %shipment_id,
                    method = %method,
                    fee = %fee,
                    "Win fee collected at trip start"
                );
                Ok(TripStartOutcome {
                    fee_collected: true,
                    fee_amount: fee,
                    payment_method: Some(method),
                    message: format!("win fee collected via {method}"),
                })
            }
            Err(err) => {
                // Payment failure is non-fatal to the trip: record, report.
                let reason = err.to_string();
                charge.mark_failed(reason.clone())?;
                tracing::warn!(
                    charge = %charge_id,
                    shipment = %shipment_id,
                    reason = %reason,
                    "Win fee collection failed, charge left retryable"
                );
                Ok(TripStartOutcome {
                    fee_collected: false,
                    fee_amount: fee,
                    payment_method: None,
                    message: format!("win fee collection failed: {reason}; trip may proceed"),
                })
            }
        }
    }

    /// Route one collection attempt: active mandate first, wallet debit
    /// otherwise. A mandate charge moves money on the UPI rail, so only the
    /// wallet path posts a ledger entry.
    fn try_collect(
        &self,
        context: &ShipmentContext,
        charge_id: ChargeId,
        fee: Decimal,
        description: &str,
    ) -> Result<PaymentMethod> {
        if let Some(mandate_id) = self.mandates.active_mandate_for(context.operator_id) {
            self.mandates
                .charge(mandate_id, fee, description, &charge_id.to_string())?;
            return Ok(PaymentMethod::UpiMandate);
        }
        self.ledger.post_entry(
            context.operator_id,
            EntryType::Debit,
            fee,
            description,
            Reference::win_fee(charge_id),
        )?;
        Ok(PaymentMethod::WalletDebit)
    }

    /// Record the commission fan-out. Failures are logged and swallowed:
    /// the split is eventually consistent relative to the charge.
    fn record_split(&self, charge: &WinFeeCharge) {
        let result = self.splitter.record(
            charge.id,
            charge.fee_amount,
            self.franchise.clone(),
            charge.district_id.clone(),
            charge.region_id.clone(),
        );
        if let Err(err) = result {
            tracing::warn!(
                charge = %charge.id,
                error = %err,
                "Commission split recording failed, charge stays SUCCESS"
            );
        }
    }

    /// Trip-complete trigger: flag a still-unpaid charge for follow-up.
    /// No money moves.
    ///
    /// # Errors
    /// `ShipmentNotFound` when the shipment cannot be resolved.
    pub fn on_trip_complete(&self, shipment_id: &ShipmentId) -> Result<()> {
        let context = self
            .directory
            .resolve(shipment_id)
            .ok_or_else(|| FleetpayError::ShipmentNotFound(shipment_id.clone()))?;
        let charge_id = ChargeId::for_bid(&context.booking_id, &context.bid_id);

        let Some(handle) = self.charges.read().get(&charge_id).cloned() else {
            return Ok(());
        };
        let mut charge = handle.lock();
        if charge.payment_status.is_collectible() {
            charge.mark_overdue();
            tracing::info!(
                charge = %charge_id,
                shipment = %shipment_id,
                "Trip completed with unpaid win fee, flagged overdue"
            );
        }
        Ok(())
    }

    /// Trip-cancellation trigger.
    ///
    /// A SUCCESS charge younger than the refund window auto-refunds: a
    /// compensating CREDIT is posted to the operator's wallet together with
    /// the REFUNDED transition, keeping the recorded balance consistent
    /// with the refund. Anything else is left untouched for manual review.
    ///
    /// # Errors
    /// `ShipmentNotFound` when the shipment cannot be resolved.
    pub fn on_trip_cancellation(&self, shipment_id: &ShipmentId, reason: &str) -> Result<()> {
        let context = self
            .directory
            .resolve(shipment_id)
            .ok_or_else(|| FleetpayError::ShipmentNotFound(shipment_id.clone()))?;
        let charge_id = ChargeId::for_bid(&context.booking_id, &context.bid_id);

        let Some(handle) = self.charges.read().get(&charge_id).cloned() else {
            return Ok(());
        };
        let mut charge = handle.lock();
        if charge.payment_status != PaymentStatus::Success {
            return Ok(());
        }

        let Some(charged_at) = charge.charged_at else {
            return Err(FleetpayError::Internal(
                "SUCCESS charge missing charged_at".to_string(),
            ));
        };
        let window = Duration::seconds(self.config.refund_window_secs);
        if Utc::now() - charged_at >= window {
            tracing::info!(
                charge = %charge_id,
                shipment = %shipment_id,
                reason,
                "Cancellation outside refund window, left for manual review"
            );
            return Ok(());
        }

        // Compensating credit first; the status flips only once the money
        // is back on the book.
        self.ledger.post_entry(
            charge.operator_id,
            EntryType::Credit,
            charge.fee_amount,
            &format!("Win fee refund for booking {}", charge.booking_id),
            Reference::refund(charge_id),
        )?;
        charge.mark_refunded()?;
        tracing::info!(
            charge = %charge_id,
            shipment = %shipment_id,
            fee = %charge.fee_amount,
            reason,
            "Win fee auto-refunded on early cancellation"
        );
        Ok(())
    }
}
