//! # fleetpay-ledger
//!
//! **Ledger Core**: append-only per-operator balance books with atomic
//! multi-entry postings and transfers.
//!
//! ## Guarantees
//!
//! 1. Per-operator serialization — the "read balance, compute
//!    `balance_after`, append" sequence runs inside one operator lock,
//!    so concurrent postings never lose updates
//! 2. No overdrafts — a DEBIT that would drive the balance negative is
//!    rejected without creating an entry
//! 3. Atomicity — multi-leg postings and transfers apply all legs or none,
//!    with operator locks taken in a fixed global order (no deadlocks)
//! 4. Derived balances — the current balance is always the latest entry's
//!    snapshot; there is no separately mutated balance field

pub mod book;
pub mod ledger;
pub mod query;

pub use book::OperatorBook;
pub use ledger::{Ledger, Posting, TransferReceipt};
pub use query::{EntryFilter, Page, list_entries};
