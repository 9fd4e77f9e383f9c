//! The ledger entry — one immutable, signed money-movement record.
//!
//! Every entry carries a `balance_after` snapshot: the operator's running
//! balance immediately after the entry was applied. The current balance is
//! always the latest entry's snapshot, never a separately mutated field.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{ChargeId, EntryId, OperatorId, ShipmentId};

/// Direction of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryType {
    /// Money into the operator wallet.
    Credit,
    /// Money out of the operator wallet. Must never overdraw the balance.
    Debit,
}

impl EntryType {
    /// Sign applied to the amount when computing the running balance.
    #[must_use]
    pub fn sign(self) -> Decimal {
        match self {
            Self::Credit => Decimal::ONE,
            Self::Debit => Decimal::NEGATIVE_ONE,
        }
    }
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Credit => write!(f, "CREDIT"),
            Self::Debit => write!(f, "DEBIT"),
        }
    }
}

/// What kind of record a ledger entry points back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceKind {
    /// A win-fee charge collection.
    WinFee,
    /// A shipment-scoped movement.
    Shipment,
    /// An inbound payment (top-up, payout, settlement credit).
    Payment,
    /// A compensating credit for a refunded charge.
    Refund,
    /// One leg of an operator-to-operator transfer.
    Transfer,
    /// A manual correction posted by operations staff.
    Adjustment,
}

impl std::fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WinFee => write!(f, "WIN_FEE"),
            Self::Shipment => write!(f, "SHIPMENT"),
            Self::Payment => write!(f, "PAYMENT"),
            Self::Refund => write!(f, "REFUND"),
            Self::Transfer => write!(f, "TRANSFER"),
            Self::Adjustment => write!(f, "ADJUSTMENT"),
        }
    }
}

/// Traceability pointer from a ledger entry to the record that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub kind: ReferenceKind,
    /// Identifier in the referenced record set (charge id, shipment id, ...).
    pub id: String,
}

impl Reference {
    #[must_use]
    pub fn new(kind: ReferenceKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    /// Reference to a win-fee charge collection.
    #[must_use]
    pub fn win_fee(charge_id: ChargeId) -> Self {
        Self::new(ReferenceKind::WinFee, charge_id.to_string())
    }

    /// Reference to a refunded charge.
    #[must_use]
    pub fn refund(charge_id: ChargeId) -> Self {
        Self::new(ReferenceKind::Refund, charge_id.to_string())
    }

    /// Reference to a shipment.
    #[must_use]
    pub fn shipment(shipment_id: &ShipmentId) -> Self {
        Self::new(ReferenceKind::Shipment, shipment_id.as_str())
    }
}

/// One immutable, append-only ledger entry.
///
/// Entries are never edited or deleted; corrections are modeled as new
/// compensating entries. For a given operator, `balance_after` forms a
/// strict running sum: `balance_after[n] = balance_after[n-1] ± amount[n]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Globally unique entry identifier.
    pub id: EntryId,
    /// Operator whose balance this entry moves.
    pub operator_id: OperatorId,
    /// CREDIT or DEBIT.
    pub entry_type: EntryType,
    /// Always positive; the direction comes from `entry_type`.
    pub amount: Decimal,
    /// Running balance immediately after this entry.
    pub balance_after: Decimal,
    /// Human-readable description for statements and audit.
    pub description: String,
    /// Traceability pointer back to the causing record.
    pub reference: Reference,
    /// When the entry was posted.
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// The amount with its direction applied.
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        self.entry_type.sign() * self.amount
    }
}
