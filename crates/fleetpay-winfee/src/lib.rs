//! # fleetpay-winfee
//!
//! **Win-Fee Lifecycle**: two-phase platform fee handling driven by the
//! booking domain's triggers, plus the franchise commission fan-out.
//!
//! ## Trigger Flow
//!
//! ```text
//! on_bid_win        → PENDING charge recorded (no money moves)
//! on_trip_start     → collect via mandate or wallet debit
//!                       success → SUCCESS + commission split
//!                       failure → FAILED (retryable), trip proceeds
//! on_trip_complete  → unpaid charge flagged overdue (no money moves)
//! on_trip_cancel    → SUCCESS charge < refund window → REFUNDED
//!                     + compensating CREDIT posted to the wallet
//! ```
//!
//! Triggers are at-least-once: all handlers are idempotent, with the
//! deterministic charge id and the SUCCESS short-circuit doing the work.

pub mod directory;
pub mod engine;
pub mod splitter;

pub use directory::{InMemoryDirectory, ShipmentContext, ShipmentDirectory};
pub use engine::{BidWinAck, TripStartOutcome, WinFeeEngine};
pub use splitter::CommissionSplitter;
