//! Entry listing with filters and pagination, for statements and reporting.

use chrono::{DateTime, Utc};
use fleetpay_types::{EntryType, LedgerEntry, OperatorId, ReferenceKind};
use serde::{Deserialize, Serialize};

use crate::ledger::Ledger;

/// Filter for [`list_entries`]. Empty filter matches everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryFilter {
    /// Only entries of this type.
    pub entry_type: Option<EntryType>,
    /// Only entries referencing this kind of record.
    pub reference_kind: Option<ReferenceKind>,
    /// Only entries posted at or after this instant.
    pub from: Option<DateTime<Utc>>,
    /// Only entries posted strictly before this instant.
    pub to: Option<DateTime<Utc>>,
}

impl EntryFilter {
    fn matches(&self, entry: &LedgerEntry) -> bool {
        if self.entry_type.is_some_and(|t| t != entry.entry_type) {
            return false;
        }
        if self
            .reference_kind
            .is_some_and(|k| k != entry.reference.kind)
        {
            return false;
        }
        if self.from.is_some_and(|from| entry.created_at < from) {
            return false;
        }
        if self.to.is_some_and(|to| entry.created_at >= to) {
            return false;
        }
        true
    }
}

/// One page of filtered entries plus the total filtered row count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub entries: Vec<LedgerEntry>,
    pub total: usize,
}

/// List an operator's entries, oldest first, with `page` starting at 1.
///
/// `total` counts every entry the filter matches, not just this page.
/// A zero `limit` or `page` is coerced to 1.
#[must_use]
pub fn list_entries(
    ledger: &Ledger,
    operator_id: OperatorId,
    filter: &EntryFilter,
    page: usize,
    limit: usize,
) -> Page {
    let page = page.max(1);
    let limit = limit.max(1);

    let filtered: Vec<LedgerEntry> = ledger
        .entries(operator_id)
        .into_iter()
        .filter(|entry| filter.matches(entry))
        .collect();
    let total = filtered.len();

    let entries = filtered
        .into_iter()
        .skip((page - 1) * limit)
        .take(limit)
        .collect();
    Page { entries, total }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetpay_types::Reference;
    use rust_decimal::Decimal;

    fn seeded_ledger(op: OperatorId) -> Ledger {
        let ledger = Ledger::new();
        ledger
            .post_entry(
                op,
                EntryType::Credit,
                Decimal::new(1000, 0),
                "top-up",
                Reference::new(ReferenceKind::Payment, "PAY-1"),
            )
            .unwrap();
        for n in 0..5 {
            ledger
                .post_entry(
                    op,
                    EntryType::Debit,
                    Decimal::new(10 + n, 0),
                    "fee",
                    Reference::new(ReferenceKind::WinFee, format!("chg-{n}")),
                )
                .unwrap();
        }
        ledger
    }

    #[test]
    fn unfiltered_listing_returns_everything() {
        let op = OperatorId::new();
        let ledger = seeded_ledger(op);
        let page = list_entries(&ledger, op, &EntryFilter::default(), 1, 50);
        assert_eq!(page.total, 6);
        assert_eq!(page.entries.len(), 6);
        // Oldest first: the credit comes before any debit.
        assert_eq!(page.entries[0].entry_type, EntryType::Credit);
    }

    #[test]
    fn type_filter_narrows() {
        let op = OperatorId::new();
        let ledger = seeded_ledger(op);
        let filter = EntryFilter {
            entry_type: Some(EntryType::Debit),
            ..EntryFilter::default()
        };
        let page = list_entries(&ledger, op, &filter, 1, 50);
        assert_eq!(page.total, 5);
        assert!(page.entries.iter().all(|e| e.entry_type == EntryType::Debit));
    }

    #[test]
    fn reference_kind_filter_narrows() {
        let op = OperatorId::new();
        let ledger = seeded_ledger(op);
        let filter = EntryFilter {
            reference_kind: Some(ReferenceKind::Payment),
            ..EntryFilter::default()
        };
        let page = list_entries(&ledger, op, &filter, 1, 50);
        assert_eq!(page.total, 1);
    }

    #[test]
    fn pagination_windows_correctly() {
        let op = OperatorId::new();
        let ledger = seeded_ledger(op);

        let first = list_entries(&ledger, op, &EntryFilter::default(), 1, 4);
        assert_eq!(first.entries.len(), 4);
        assert_eq!(first.total, 6);

        let second = list_entries(&ledger, op, &EntryFilter::default(), 2, 4);
        assert_eq!(second.entries.len(), 2);
        assert_eq!(second.total, 6);

        let third = list_entries(&ledger, op, &EntryFilter::default(), 3, 4);
        assert!(third.entries.is_empty());
        assert_eq!(third.total, 6);
    }

    #[test]
    fn unknown_operator_lists_empty() {
        let ledger = Ledger::new();
        let page = list_entries(&ledger, OperatorId::new(), &EntryFilter::default(), 1, 10);
        assert!(page.entries.is_empty());
        assert_eq!(page.total, 0);
    }
}
