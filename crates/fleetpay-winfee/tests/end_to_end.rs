//! End-to-end tests across the ledger, mandate manager, and win-fee engine.
//!
//! These exercise the full trigger lifecycle the way the booking domain
//! drives it: bid win → trip start → trip complete / cancellation, with
//! both collection paths (UPI mandate, wallet debit), duplicate delivery,
//! and the mandate circuit breaker.

use std::sync::Arc;
use std::thread;

use fleetpay_ledger::{EntryFilter, Ledger, list_entries};
use fleetpay_mandate::{GatewayResponse, MandateManager, PaymentGateway, SimulatedGateway};
use fleetpay_types::{
    BidId, BookingId, ChargeId, EngineConfig, EntryType, FranchiseId, FranchiseTiers,
    GatewayConfig, MandateStatus, OperatorId, PaymentMethod, PaymentStatus, Reference,
    ReferenceKind, ShipmentId,
};
use fleetpay_winfee::{InMemoryDirectory, ShipmentContext, ShipmentDirectory, WinFeeEngine};
use rust_decimal::Decimal;

/// Helper: the full settlement stack wired the way a deployment wires it.
struct SettlementStack {
    gateway: Arc<SimulatedGateway>,
    ledger: Arc<Ledger>,
    mandates: Arc<MandateManager>,
    directory: Arc<InMemoryDirectory>,
    engine: WinFeeEngine,
}

impl SettlementStack {
    fn new() -> Self {
        let gateway = Arc::new(SimulatedGateway::approving());
        let ledger = Arc::new(Ledger::new());
        let mandates = Arc::new(MandateManager::new(
            Arc::clone(&gateway) as Arc<dyn PaymentGateway>,
            GatewayConfig::default(),
        ));
        let directory = Arc::new(InMemoryDirectory::new());
        let engine = WinFeeEngine::new(
            EngineConfig::default(),
            Arc::clone(&ledger),
            Arc::clone(&mandates),
            Arc::clone(&directory) as Arc<dyn ShipmentDirectory>,
            FranchiseTiers {
                hq_id: FranchiseId::new("FR-HQ"),
                regional_id: FranchiseId::new("FR-REG-NORTH"),
                unit_id: FranchiseId::new("FR-UNIT-DLI-3"),
            },
        )
        .expect("Engine construction should succeed");
        Self {
            gateway,
            ledger,
            mandates,
            directory,
            engine,
        }
    }

    fn shipment(&self, tag: &str, operator_id: OperatorId, bid_amount: i64) -> ShipmentId {
        let shipment_id = ShipmentId::new(format!("SHP-{tag}"));
        self.directory.insert(
            shipment_id.clone(),
            ShipmentContext {
                operator_id,
                booking_id: BookingId::new(format!("BK-{tag}")),
                bid_id: BidId::new(format!("BID-{tag}")),
                bid_amount: Decimal::new(bid_amount, 0),
                district_id: Some("D-NORTH-11".to_string()),
                region_id: Some("R-NORTH".to_string()),
            },
        );
        shipment_id
    }

    fn fund(&self, operator_id: OperatorId, amount: i64) {
        self.ledger
            .post_entry(
                operator_id,
                EntryType::Credit,
                Decimal::new(amount, 0),
                "wallet top-up",
                Reference::new(ReferenceKind::Payment, "PAY-SEED"),
            )
            .expect("Funding should succeed");
    }

    fn charge_id(&self, tag: &str) -> ChargeId {
        ChargeId::for_bid(
            &BookingId::new(format!("BK-{tag}")),
            &BidId::new(format!("BID-{tag}")),
        )
    }
}

// =============================================================================
// Scenario A: ledger running balance
// =============================================================================
#[test]
fn e2e_scenario_a_running_balance() {
    let stack = SettlementStack::new();
    let op = OperatorId::new();

    stack
        .ledger
        .post_entry(
            op,
            EntryType::Credit,
            Decimal::new(1000, 0),
            "top-up",
            Reference::new(ReferenceKind::Payment, "PAY-1"),
        )
        .unwrap();
    stack
        .ledger
        .post_entry(
            op,
            EntryType::Debit,
            Decimal::new(50, 0),
            "fee",
            Reference::new(ReferenceKind::Adjustment, "ADJ-1"),
        )
        .unwrap();

    assert_eq!(stack.ledger.get_balance(op), Decimal::new(950, 0));
    let snapshots: Vec<Decimal> = stack
        .ledger
        .entries(op)
        .iter()
        .map(|e| e.balance_after)
        .collect();
    assert_eq!(snapshots, vec![Decimal::new(1000, 0), Decimal::new(950, 0)]);
}

// =============================================================================
// Scenario B: bid win → trip start → commission split
// =============================================================================
#[test]
fn e2e_scenario_b_full_win_fee_lifecycle() {
    let stack = SettlementStack::new();
    let op = OperatorId::new();
    let shipment = stack.shipment("B", op, 60_000);
    stack.fund(op, 50_000);

    // Bid win: PENDING charge of 3000 (5% of 60,000), zero ledger change.
    let ack = stack
        .engine
        .on_bid_win(
            op,
            BookingId::new("BK-B"),
            BidId::new("BID-B"),
            Decimal::new(60_000, 0),
            Some("D-NORTH-11".to_string()),
            Some("R-NORTH".to_string()),
        )
        .unwrap();
    assert_eq!(ack.fee_amount, Decimal::new(3000, 0));
    assert_eq!(stack.ledger.get_balance(op), Decimal::new(50_000, 0));
    assert_eq!(
        stack.engine.charge(ack.charge_id).unwrap().payment_status,
        PaymentStatus::Pending
    );

    // Trip start: the fee is collected and the charge flips to SUCCESS.
    let outcome = stack.engine.on_trip_start(&shipment).unwrap();
    assert!(outcome.fee_collected);
    assert_eq!(outcome.fee_amount, Decimal::new(3000, 0));
    assert_eq!(stack.ledger.get_balance(op), Decimal::new(47_000, 0));
    assert_eq!(
        stack.engine.charge(ack.charge_id).unwrap().payment_status,
        PaymentStatus::Success
    );

    // A commission split totaling the fee was recorded.
    let split = stack.engine.split(ack.charge_id).unwrap();
    assert_eq!(split.amounts.total(), Decimal::new(3000, 0));
    assert_eq!(split.amounts.hq, Decimal::new(1500, 0));
    assert_eq!(split.amounts.regional, Decimal::new(900, 0));
    assert_eq!(split.amounts.unit, Decimal::new(600, 0));
    assert_eq!(split.district_id.as_deref(), Some("D-NORTH-11"));
}

// =============================================================================
// Scenario C: underfunded transfer mutates nothing
// =============================================================================
#[test]
fn e2e_scenario_c_failed_transfer_is_atomic() {
    let stack = SettlementStack::new();
    let a = OperatorId::new();
    let b = OperatorId::new();
    stack.fund(a, 300);

    let err = stack
        .ledger
        .transfer(
            a,
            b,
            Decimal::new(500, 0),
            "inter-operator settlement",
            Reference::new(ReferenceKind::Transfer, "TRF-1"),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        fleetpay_types::FleetpayError::InsufficientBalance { .. }
    ));
    assert_eq!(stack.ledger.get_balance(a), Decimal::new(300, 0));
    assert_eq!(stack.ledger.get_balance(b), Decimal::ZERO);
    assert!(stack.ledger.entries(b).is_empty());
}

// =============================================================================
// Idempotency: duplicate trip-start collects at most once
// =============================================================================
#[test]
fn e2e_duplicate_trip_start_collects_once() {
    let stack = SettlementStack::new();
    let op = OperatorId::new();
    let shipment = stack.shipment("dup", op, 60_000);
    stack.fund(op, 10_000);

    let first = stack.engine.on_trip_start(&shipment).unwrap();
    assert!(first.fee_collected);
    assert_eq!(stack.ledger.get_balance(op), Decimal::new(7000, 0));

    // At-least-once delivery: the retry is a no-op.
    let second = stack.engine.on_trip_start(&shipment).unwrap();
    assert!(second.fee_collected);
    assert_eq!(second.payment_method, Some(PaymentMethod::WalletDebit));
    assert!(second.message.contains("already collected"));
    assert_eq!(stack.ledger.get_balance(op), Decimal::new(7000, 0));

    // Exactly one WIN_FEE debit on the book.
    let filter = EntryFilter {
        reference_kind: Some(ReferenceKind::WinFee),
        ..EntryFilter::default()
    };
    let page = list_entries(&stack.ledger, op, &filter, 1, 50);
    assert_eq!(page.total, 1);
}

#[test]
fn e2e_concurrent_trip_start_collects_once() {
    let stack = Arc::new(SettlementStack::new());
    let op = OperatorId::new();
    let shipment = stack.shipment("race", op, 60_000);
    stack.fund(op, 100_000);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let stack = Arc::clone(&stack);
            let shipment = shipment.clone();
            thread::spawn(move || stack.engine.on_trip_start(&shipment).unwrap())
        })
        .collect();
    let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert!(outcomes.iter().all(|o| o.fee_collected));
    // The fee left the wallet exactly once.
    assert_eq!(stack.ledger.get_balance(op), Decimal::new(97_000, 0));
}

// =============================================================================
// Mandate circuit breaker through the engine
// =============================================================================
#[test]
fn e2e_breaker_pauses_mandate_then_wallet_takes_over() {
    let stack = SettlementStack::new();
    let op = OperatorId::new();
    stack.fund(op, 20_000);

    let mandate_id = stack
        .mandates
        .register(op, "fleet@okbank", Decimal::new(50_000, 0))
        .unwrap();
    stack.mandates.approve(mandate_id).unwrap();
    stack.gateway.script_declines(3, "account frozen");

    // Three trips, three declines: the mandate pauses.
    for n in 0..3 {
        let shipment = stack.shipment(&format!("brk{n}"), op, 60_000);
        let outcome = stack.engine.on_trip_start(&shipment).unwrap();
        assert!(!outcome.fee_collected);
    }
    let mandate = stack.mandates.get(mandate_id).unwrap();
    assert_eq!(mandate.status, MandateStatus::Paused);
    assert_eq!(mandate.failure_count, 3);
    // The wallet was never touched by the mandate failures.
    assert_eq!(stack.ledger.get_balance(op), Decimal::new(20_000, 0));

    // Next trip: no active mandate, so collection falls back to the wallet.
    let shipment = stack.shipment("brk3", op, 60_000);
    let outcome = stack.engine.on_trip_start(&shipment).unwrap();
    assert!(outcome.fee_collected);
    assert_eq!(outcome.payment_method, Some(PaymentMethod::WalletDebit));
    assert_eq!(stack.ledger.get_balance(op), Decimal::new(17_000, 0));
}

#[test]
fn e2e_gateway_timeout_is_a_failure_not_a_collection() {
    let stack = SettlementStack::new();
    let op = OperatorId::new();
    let shipment = stack.shipment("to", op, 60_000);

    let mandate_id = stack
        .mandates
        .register(op, "fleet@okbank", Decimal::new(50_000, 0))
        .unwrap();
    stack.mandates.approve(mandate_id).unwrap();
    stack.gateway.script(GatewayResponse::TimedOut);

    let outcome = stack.engine.on_trip_start(&shipment).unwrap();
    assert!(!outcome.fee_collected, "a timeout must never count as paid");
    assert_eq!(
        stack.engine.charge(stack.charge_id("to")).unwrap().payment_status,
        PaymentStatus::Failed
    );
    assert_eq!(stack.mandates.get(mandate_id).unwrap().failure_count, 1);
}

// =============================================================================
// Refund on early cancellation
// =============================================================================
#[test]
fn e2e_early_cancellation_credits_the_wallet_back() {
    let stack = SettlementStack::new();
    let op = OperatorId::new();
    let shipment = stack.shipment("rfnd", op, 40_000);
    stack.fund(op, 5000);

    let outcome = stack.engine.on_trip_start(&shipment).unwrap();
    assert!(outcome.fee_collected);
    assert_eq!(stack.ledger.get_balance(op), Decimal::new(3000, 0));

    stack
        .engine
        .on_trip_cancellation(&shipment, "vehicle breakdown")
        .unwrap();

    let charge = stack.engine.charge(stack.charge_id("rfnd")).unwrap();
    assert_eq!(charge.payment_status, PaymentStatus::Refunded);
    assert_eq!(stack.ledger.get_balance(op), Decimal::new(5000, 0));

    // The compensating entry is a CREDIT referencing the refund.
    let filter = EntryFilter {
        reference_kind: Some(ReferenceKind::Refund),
        ..EntryFilter::default()
    };
    let page = list_entries(&stack.ledger, op, &filter, 1, 10);
    assert_eq!(page.total, 1);
    assert_eq!(page.entries[0].entry_type, EntryType::Credit);
    assert_eq!(page.entries[0].amount, Decimal::new(2000, 0));
}

// =============================================================================
// Statement listing across the lifecycle
// =============================================================================
#[test]
fn e2e_statement_reflects_the_whole_lifecycle() {
    let stack = SettlementStack::new();
    let op = OperatorId::new();
    stack.fund(op, 10_000);

    for n in 0..3 {
        let shipment = stack.shipment(&format!("st{n}"), op, 20_000);
        stack.engine.on_trip_start(&shipment).unwrap();
    }

    // 1 top-up + 3 win-fee debits, oldest first.
    let page = list_entries(&stack.ledger, op, &EntryFilter::default(), 1, 50);
    assert_eq!(page.total, 4);
    assert_eq!(page.entries[0].entry_type, EntryType::Credit);
    assert_eq!(stack.ledger.get_balance(op), Decimal::new(7000, 0));

    let debits = EntryFilter {
        entry_type: Some(EntryType::Debit),
        ..EntryFilter::default()
    };
    assert_eq!(list_entries(&stack.ledger, op, &debits, 1, 50).total, 3);
}
