//! Shipment resolution port.
//!
//! Shipments belong to the booking/shipment domain; this engine only needs
//! to resolve a shipment id back to the booking, bid, and operator that the
//! win fee hangs off. The trait is the seam — an HTTP/DB-backed resolver
//! plugs in outside this workspace, the in-memory one serves tests and
//! simulation.

use std::collections::HashMap;

use parking_lot::RwLock;
use rust_decimal::Decimal;

use fleetpay_types::{BidId, BookingId, OperatorId, ShipmentId};

/// Everything the win-fee lifecycle needs to know about a shipment.
#[derive(Debug, Clone)]
pub struct ShipmentContext {
    pub operator_id: OperatorId,
    pub booking_id: BookingId,
    pub bid_id: BidId,
    /// The winning bid amount, used when the charge must be created on the
    /// fly at trip start.
    pub bid_amount: Decimal,
    pub district_id: Option<String>,
    pub region_id: Option<String>,
}

/// Resolves shipment ids to their booking context.
pub trait ShipmentDirectory: Send + Sync {
    /// `None` when the shipment is unknown to the booking domain.
    fn resolve(&self, shipment_id: &ShipmentId) -> Option<ShipmentContext>;
}

/// In-memory directory for tests and simulation.
#[derive(Default)]
pub struct InMemoryDirectory {
    shipments: RwLock<HashMap<ShipmentId, ShipmentContext>>,
}

impl InMemoryDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a shipment's context.
    pub fn insert(&self, shipment_id: ShipmentId, context: ShipmentContext) {
        self.shipments.write().insert(shipment_id, context);
    }
}

impl ShipmentDirectory for InMemoryDirectory {
    fn resolve(&self, shipment_id: &ShipmentId) -> Option<ShipmentContext> {
        self.shipments.read().get(shipment_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_roundtrip() {
        let directory = InMemoryDirectory::new();
        let shipment_id = ShipmentId::new("SHP-1");
        directory.insert(
            shipment_id.clone(),
            ShipmentContext {
                operator_id: OperatorId::new(),
                booking_id: BookingId::new("BK-1"),
                bid_id: BidId::new("BID-1"),
                bid_amount: Decimal::new(60_000, 0),
                district_id: Some("D-1".to_string()),
                region_id: None,
            },
        );

        let context = directory.resolve(&shipment_id).unwrap();
        assert_eq!(context.booking_id, BookingId::new("BK-1"));
        assert!(directory.resolve(&ShipmentId::new("SHP-404")).is_none());
    }
}
