//! A single operator's append-only book.
//!
//! The book is the unit of serialization: every "read balance, compute
//! `balance_after`, append" sequence happens while the caller holds this
//! operator's lock, so concurrent postings cannot lose updates.

use chrono::Utc;
use fleetpay_types::{
    EntryId, EntryType, FleetpayError, LedgerEntry, OperatorId, Reference, Result,
};
use rust_decimal::Decimal;

/// Append-only entry list for one operator.
#[derive(Debug, Default)]
pub struct OperatorBook {
    entries: Vec<LedgerEntry>,
}

impl OperatorBook {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Current balance: the latest entry's snapshot, zero when empty.
    #[must_use]
    pub fn balance(&self) -> Decimal {
        self.entries
            .last()
            .map_or(Decimal::ZERO, |entry| entry.balance_after)
    }

    /// Validate a posting against a hypothetical running balance.
    ///
    /// Used both for single postings (with the book's own balance) and for
    /// multi-leg batches, where earlier legs already moved the running
    /// balance before this leg is checked.
    pub fn validate_posting(
        entry_type: EntryType,
        amount: Decimal,
        running_balance: Decimal,
    ) -> Result<Decimal> {
        if amount <= Decimal::ZERO {
            return Err(FleetpayError::InvalidAmount {
                reason: format!("posting amount must be positive, got {amount}"),
            });
        }
        let next = running_balance + entry_type.sign() * amount;
        if next < Decimal::ZERO {
            return Err(FleetpayError::InsufficientBalance {
                needed: amount,
                available: running_balance,
            });
        }
        Ok(next)
    }

    /// Validate and append one entry. On failure the book is untouched.
    pub fn append(
        &mut self,
        operator_id: OperatorId,
        entry_type: EntryType,
        amount: Decimal,
        description: &str,
        reference: Reference,
    ) -> Result<LedgerEntry> {
        let balance_after = Self::validate_posting(entry_type, amount, self.balance())?;
        let entry = LedgerEntry {
            id: EntryId::new(),
            operator_id,
            entry_type,
            amount,
            balance_after,
            description: description.to_string(),
            reference,
            created_at: Utc::now(),
        };
        self.entries.push(entry.clone());
        Ok(entry)
    }

    /// All entries in append order.
    #[must_use]
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Number of entries in the book.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the book has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
