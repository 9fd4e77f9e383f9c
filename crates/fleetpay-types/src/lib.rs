//! # fleetpay-types
//!
//! Shared types, errors, and configuration for the **FleetPay** ledger &
//! settlement engine.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`OperatorId`], [`EntryId`], [`ChargeId`], [`MandateId`],
//!   plus the booking-domain-owned [`BookingId`], [`BidId`], [`ShipmentId`],
//!   [`FranchiseId`]
//! - **Ledger model**: [`LedgerEntry`], [`EntryType`], [`Reference`], [`ReferenceKind`]
//! - **Charge model**: [`WinFeeCharge`], [`PaymentStatus`], [`PaymentMethod`]
//! - **Mandate model**: [`UpiMandate`], [`MandateStatus`]
//! - **Commission model**: [`CommissionSplit`], [`CommissionPolicy`], [`TierAmounts`]
//! - **Configuration**: [`EngineConfig`], [`GatewayConfig`]
//! - **Errors**: [`FleetpayError`] with `FP_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod charge;
pub mod config;
pub mod constants;
pub mod entry;
pub mod error;
pub mod ids;
pub mod mandate;
pub mod split;

// Re-export all primary types at crate root for ergonomic imports:
//   use fleetpay_types::{LedgerEntry, WinFeeCharge, UpiMandate, ...};

pub use charge::*;
pub use config::*;
pub use entry::*;
pub use error::*;
pub use ids::*;
pub use mandate::*;
pub use split::*;

// Constants are accessed via `fleetpay_types::constants::FOO`
// (not re-exported to avoid name collisions).
