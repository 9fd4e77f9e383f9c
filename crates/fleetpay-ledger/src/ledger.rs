//! The operator ledger — single source of truth for balances.
//!
//! Each operator's book sits behind its own mutex; the map of books sits
//! behind a read-write lock that is only held long enough to clone the
//! per-operator handle. Multi-operator operations (atomic batches,
//! transfers) acquire the involved operator locks in ascending
//! [`OperatorId`] order, so two transfers running in opposite directions
//! cannot deadlock.

use std::collections::HashMap;
use std::sync::Arc;

use fleetpay_types::{
    EntryType, FleetpayError, LedgerEntry, OperatorId, Reference, Result,
};
use parking_lot::{Mutex, MutexGuard, RwLock};
use rust_decimal::Decimal;

use crate::book::OperatorBook;

/// One leg of a multi-entry posting.
#[derive(Debug, Clone)]
pub struct Posting {
    pub operator_id: OperatorId,
    pub entry_type: EntryType,
    pub amount: Decimal,
    pub description: String,
    pub reference: Reference,
}

/// Result of an atomic operator-to-operator transfer.
#[derive(Debug, Clone)]
pub struct TransferReceipt {
    pub debit: LedgerEntry,
    pub credit: LedgerEntry,
}

/// Append-only per-operator balance ledger.
///
/// Balances are derived: `get_balance` is always the latest entry's
/// `balance_after`. No component caches balances elsewhere.
pub struct Ledger {
    books: RwLock<HashMap<OperatorId, Arc<Mutex<OperatorBook>>>>,
}

impl Ledger {
    #[must_use]
    pub fn new() -> Self {
        Self {
            books: RwLock::new(HashMap::new()),
        }
    }

    /// Clone the handle for an operator's book, creating the book on first
    /// use. The outer map lock is released before any book lock is taken.
    fn book_handle(&self, operator_id: OperatorId) -> Arc<Mutex<OperatorBook>> {
        if let Some(handle) = self.books.read().get(&operator_id) {
            return Arc::clone(handle);
        }
        let mut books = self.books.write();
        Arc::clone(
            books
                .entry(operator_id)
                .or_insert_with(|| Arc::new(Mutex::new(OperatorBook::new()))),
        )
    }

    /// Current balance for an operator. Zero when no entries exist.
    #[must_use]
    pub fn get_balance(&self, operator_id: OperatorId) -> Decimal {
        let handle = match self.books.read().get(&operator_id) {
            Some(handle) => Arc::clone(handle),
            None => return Decimal::ZERO,
        };
        let book = handle.lock();
        book.balance()
    }

    /// Post a single entry. The balance read and the append happen inside
    /// one critical section for the operator.
    ///
    /// # Errors
    /// - `InvalidAmount` if `amount <= 0`
    /// - `InsufficientBalance` if a DEBIT would overdraw; no entry is created
    pub fn post_entry(
        &self,
        operator_id: OperatorId,
        entry_type: EntryType,
        amount: Decimal,
        description: &str,
        reference: Reference,
    ) -> Result<LedgerEntry> {
        let handle = self.book_handle(operator_id);
        let mut book = handle.lock();
        book.append(operator_id, entry_type, amount, description, reference)
    }

    /// Apply a list of postings as one all-or-nothing transaction.
    ///
    /// All involved operator locks are acquired in ascending id order, every
    /// leg is validated against the running balances, and only then are the
    /// entries appended. If any leg fails, zero entries persist.
    ///
    /// # Errors
    /// Returns `TransactionAborted` naming the failing leg.
    pub fn post_atomic(&self, postings: &[Posting]) -> Result<Vec<LedgerEntry>> {
        if postings.is_empty() {
            return Ok(Vec::new());
        }

        // Lock acquisition order: ascending operator id, each operator once.
        let mut operator_ids: Vec<OperatorId> =
            postings.iter().map(|posting| posting.operator_id).collect();
        operator_ids.sort_unstable();
        operator_ids.dedup();

        let handles: Vec<(OperatorId, Arc<Mutex<OperatorBook>>)> = operator_ids
            .iter()
            .map(|&id| (id, self.book_handle(id)))
            .collect();
        let mut guards: HashMap<OperatorId, MutexGuard<'_, OperatorBook>> = handles
            .iter()
            .map(|(id, handle)| (*id, handle.lock()))
            .collect();

        // Phase 1: validate every leg against simulated running balances.
        let mut running: HashMap<OperatorId, Decimal> = guards
            .iter()
            .map(|(id, book)| (*id, book.balance()))
            .collect();
        for (leg, posting) in postings.iter().enumerate() {
            let balance = running
                .get_mut(&posting.operator_id)
                .ok_or_else(|| FleetpayError::Internal("posting operator missing".into()))?;
            match OperatorBook::validate_posting(posting.entry_type, posting.amount, *balance) {
                Ok(next) => *balance = next,
                Err(err) => {
                    tracing::warn!(
                        leg,
                        operator = %posting.operator_id,
                        amount = %posting.amount,
                        "Atomic posting aborted, no entries persisted"
                    );
                    return Err(FleetpayError::TransactionAborted {
                        leg,
                        reason: err.to_string(),
                    });
                }
            }
        }

        // Phase 2: apply. Every leg was validated, so appends cannot fail.
        let mut entries = Vec::with_capacity(postings.len());
        for posting in postings {
            let book = guards
                .get_mut(&posting.operator_id)
                .ok_or_else(|| FleetpayError::Internal("posting operator missing".into()))?;
            let entry = book.append(
                posting.operator_id,
                posting.entry_type,
                posting.amount,
                &posting.description,
                posting.reference.clone(),
            )?;
            entries.push(entry);
        }
        Ok(entries)
    }

    /// Atomic transfer: debit on the source, credit on the destination.
    /// If the source would overdraw, neither leg is applied.
    ///
    /// # Errors
    /// - `SelfTransfer` if source and destination are the same operator
    /// - `InvalidAmount` if `amount <= 0`
    /// - `InsufficientBalance` if the source balance cannot cover the debit
    pub fn transfer(
        &self,
        from: OperatorId,
        to: OperatorId,
        amount: Decimal,
        description: &str,
        reference: Reference,
    ) -> Result<TransferReceipt> {
        if from == to {
            return Err(FleetpayError::SelfTransfer);
        }

        let from_handle = self.book_handle(from);
        let to_handle = self.book_handle(to);

        // Fixed global lock order by operator id.
        let (mut from_book, mut to_book) = if from < to {
            let first = from_handle.lock();
            let second = to_handle.lock();
            (first, second)
        } else {
            let second = to_handle.lock();
            let first = from_handle.lock();
            (first, second)
        };

        // Validate the debit before touching either book.
        OperatorBook::validate_posting(EntryType::Debit, amount, from_book.balance())?;

        let debit = from_book.append(
            from,
            EntryType::Debit,
            amount,
            description,
            reference.clone(),
        )?;
        let credit = to_book.append(to, EntryType::Credit, amount, description, reference)?;
        Ok(TransferReceipt { debit, credit })
    }

    /// Snapshot of an operator's entries in append order.
    #[must_use]
    pub fn entries(&self, operator_id: OperatorId) -> Vec<LedgerEntry> {
        let handle = match self.books.read().get(&operator_id) {
            Some(handle) => Arc::clone(handle),
            None => return Vec::new(),
        };
        let book = handle.lock();
        book.entries().to_vec()
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
