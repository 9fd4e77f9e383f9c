//! Identifiers used throughout FleetPay.
//!
//! Internal entity IDs use UUIDv7 for time-ordered lexicographic sorting.
//! Identifiers owned by the booking domain (bookings, bids, shipments,
//! franchises) are opaque string newtypes — this engine never parses them.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// OperatorId
// ---------------------------------------------------------------------------

/// Unique identifier for a fleet operator (the party being charged fees).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct OperatorId(pub Uuid);

impl OperatorId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for OperatorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OperatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// EntryId
// ---------------------------------------------------------------------------

/// Unique identifier for a single ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct EntryId(pub Uuid);

impl EntryId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ChargeId
// ---------------------------------------------------------------------------

/// Unique identifier for a win-fee charge.
///
/// Derived deterministically from the `(booking, bid)` pair so that
/// at-least-once trigger delivery converges on the same charge record
/// no matter which handler creates it first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ChargeId(pub Uuid);

impl ChargeId {
    /// Deterministic `ChargeId` for a won bid.
    ///
    /// Every component derives the **exact same** id for the same
    /// `(booking, bid)` pair — this is what makes duplicate `on_bid_win`
    /// and on-the-fly creation in `on_trip_start` land on one record.
    #[must_use]
    pub fn for_bid(booking_id: &BookingId, bid_id: &BidId) -> Self {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(b"fleetpay:charge_id:v1:");
        hasher.update(booking_id.0.as_bytes());
        hasher.update(b":");
        hasher.update(bid_id.0.as_bytes());
        let hash = hasher.finalize();
        let bytes: [u8; 16] = hash[..16].try_into().expect("SHA-256 produces 32 bytes");
        Self(Uuid::from_bytes(bytes))
    }
}

impl fmt::Display for ChargeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chg:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// MandateId
// ---------------------------------------------------------------------------

/// Unique identifier for a UPI Autopay mandate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct MandateId(pub Uuid);

impl MandateId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for MandateId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MandateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mnd:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// External identifiers (owned by the booking domain)
// ---------------------------------------------------------------------------

macro_rules! external_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

external_id! {
    /// Booking identifier issued by the booking domain.
    BookingId
}

external_id! {
    /// Bid identifier issued by the bidding domain.
    BidId
}

external_id! {
    /// Shipment identifier issued by the shipment domain.
    ShipmentId
}

external_id! {
    /// Franchise identifier (HQ / regional / unit tier owner).
    FranchiseId
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
