//! # fleetpay-mandate
//!
//! **UPI Mandate Manager**: recurring-payment authorization state machine
//! with failure-threshold circuit breaking.
//!
//! ## Flow
//!
//! ```text
//! register() → PENDING → approve() → ACTIVE
//!   charge(): exists? → ACTIVE? → amount ≤ cap? → breaker closed? → gateway
//!     success → failure_count = 0, last_used_at stamped
//!     failure → failure_count += 1; 3rd failure → PAUSED
//!   PAUSED → reactivate() (admin) → ACTIVE
//! ```
//!
//! The gateway is injected once at construction as a trait object; a paused
//! mandate short-circuits before the gateway is ever contacted.

pub mod gateway;
pub mod manager;

pub use gateway::{CollectionRequest, GatewayResponse, PaymentGateway, SimulatedGateway};
pub use manager::{MandateChargeReceipt, MandateManager};
