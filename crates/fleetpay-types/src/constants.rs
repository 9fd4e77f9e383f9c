//! System-wide limits and defaults.

use rust_decimal::Decimal;

/// Default platform fee as a percentage of the winning bid amount.
pub const DEFAULT_FEE_PERCENT: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

/// Window after collection during which a cancellation auto-refunds.
pub const REFUND_WINDOW_SECS: i64 = 3600;

/// Consecutive failures that trip a mandate's circuit breaker.
pub const MAX_MANDATE_FAILURES: u8 = 3;

/// Bounded timeout for payment gateway calls. A timeout is a failure.
pub const DEFAULT_GATEWAY_TIMEOUT_MS: u64 = 10_000;

/// Default page size for ledger entry listings.
pub const DEFAULT_PAGE_LIMIT: usize = 50;

/// Hard cap on page size for ledger entry listings.
pub const MAX_PAGE_LIMIT: usize = 500;

/// Default commission tier shares (must sum to 100).
pub const DEFAULT_HQ_PERCENT: Decimal = Decimal::from_parts(50, 0, 0, false, 0);
pub const DEFAULT_REGIONAL_PERCENT: Decimal = Decimal::from_parts(30, 0, 0, false, 0);
pub const DEFAULT_UNIT_PERCENT: Decimal = Decimal::from_parts(20, 0, 0, false, 0);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commission_defaults_sum_to_100() {
        assert_eq!(
            DEFAULT_HQ_PERCENT + DEFAULT_REGIONAL_PERCENT + DEFAULT_UNIT_PERCENT,
            Decimal::ONE_HUNDRED
        );
    }

    #[test]
    fn fee_percent_is_five() {
        assert_eq!(DEFAULT_FEE_PERCENT, Decimal::new(5, 0));
    }
}
