//! Fund transfer integration tests.

mod common;

use common::{customer, teller, EngineHarness};
use ledger_core::{
    AccountStatus, LedgerError, LedgerPolicy, Sign, TransactionType, TypeCatalog,
    MAX_AMOUNT_CENTS,
};
use ledger_engine::{Engine, TransferClass, TransferDestination, TransferRequest, WarningCode};

fn internal(from: &str, to: &str, amount_cents: i64) -> TransferRequest {
    TransferRequest {
        from_account: from.into(),
        destination: TransferDestination::Internal {
            account_number: to.into(),
        },
        amount_cents,
        description: None,
    }
}

fn external(from: &str, amount_cents: i64) -> TransferRequest {
    TransferRequest {
        from_account: from.into(),
        destination: TransferDestination::External {
            bank_name: "Other Bank".into(),
            account_number: "99-1234".into(),
            account_name: "J. Doe".into(),
        },
        amount_cents,
        description: Some("Rent".into()),
    }
}

/// Customer 1 owns A1 and A2, customer 2 owns B1. A1 holds 1,000.00.
async fn setup() -> EngineHarness {
    let h = EngineHarness::new();
    h.open("A1", 1).await;
    h.open("A2", 1).await;
    h.open("B1", 2).await;
    h.deposit("A1", 100_000).await;
    h
}

#[tokio::test]
async fn same_customer_transfer_is_free() {
    let h = setup().await;

    let receipt = h
        .engine
        .transfer(&internal("A1", "A2", 20_000), customer(1))
        .await
        .unwrap();

    assert_eq!(receipt.class, TransferClass::SameCustomer);
    assert_eq!(receipt.fee_cents, 0);
    assert!(receipt.fee.is_none());
    assert_eq!(receipt.sender_balance_cents, 80_000);

    let credit = receipt.credit.expect("credit row");
    assert_eq!(credit.transaction_type, "Transfer In");
    assert_eq!(credit.reference, receipt.reference);
    assert_eq!(credit.related_account_id, Some(h.account("A1").await.id));
    assert_eq!(receipt.debit.transaction_type, "Transfer Out");
    assert_eq!(receipt.debit.reference, receipt.reference);

    assert_eq!(h.balance("A1").await, 80_000);
    assert_eq!(h.balance("A2").await, 20_000);
    assert_eq!(h.account("A2").await.status, AccountStatus::Active);
}

#[tokio::test]
async fn other_customer_transfer_charges_flat_fee() {
    let h = setup().await;

    let receipt = h
        .engine
        .transfer(&internal("A1", "B1", 20_000), customer(1))
        .await
        .unwrap();

    assert_eq!(receipt.class, TransferClass::OtherCustomer);
    assert_eq!(receipt.fee_cents, 1_500);
    let fee = receipt.fee.expect("fee row");
    assert_eq!(fee.transaction_type, "Service Charge");
    assert_eq!(fee.reference, receipt.reference);
    assert_eq!(h.balance("A1").await, 100_000 - 20_000 - 1_500);
    assert_eq!(h.balance("B1").await, 20_000);
}

#[tokio::test]
async fn other_bank_transfer_records_sender_side_only() {
    let h = setup().await;
    let rows_before = h.store.transaction_count().await;

    let receipt = h
        .engine
        .transfer(&external("A1", 30_000), customer(1))
        .await
        .unwrap();

    assert_eq!(receipt.class, TransferClass::OtherBank);
    assert_eq!(receipt.fee_cents, 2_500);
    assert!(receipt.credit.is_none());
    assert!(receipt.debit.description.contains("Other Bank"));
    assert_eq!(h.store.transaction_count().await, rows_before + 2);
    assert_eq!(h.balance("A1").await, 100_000 - 30_000 - 2_500);
}

#[tokio::test]
async fn sender_must_cover_amount_plus_fee() {
    let h = setup().await;
    let rows_before = h.store.transaction_count().await;

    // Exactly the balance, but the fee pushes it over.
    let err = h
        .engine
        .transfer(&internal("A1", "B1", 100_000), customer(1))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        LedgerError::InsufficientFunds {
            balance: 100_000,
            required: 101_500
        }
    ));
    assert_eq!(h.store.transaction_count().await, rows_before);
    assert_eq!(h.balance("B1").await, 0);
}

#[tokio::test]
async fn shortfall_after_transfer_is_a_warning() {
    let h = setup().await;

    let receipt = h
        .engine
        .transfer(&internal("A1", "A2", 95_000), customer(1))
        .await
        .unwrap();

    assert_eq!(receipt.sender_balance_cents, 5_000);
    assert_eq!(receipt.sender_status, AccountStatus::BelowMaintaining);
    assert!(receipt
        .warnings
        .iter()
        .any(|w| w.code == WarningCode::BelowMaintaining));
}

#[tokio::test]
async fn transfer_in_recovers_receiver() {
    let h = setup().await;
    h.deposit("B1", 1_000).await;
    assert_eq!(h.account("B1").await.status, AccountStatus::BelowMaintaining);

    h.engine
        .transfer(&internal("A1", "B1", 9_000), customer(1))
        .await
        .unwrap();

    let b1 = h.account("B1").await;
    assert_eq!(b1.status, AccountStatus::Active);
    assert_eq!(b1.below_maintaining_since, None);
}

#[tokio::test]
async fn lower_id_receiver_is_locked_first_and_still_works() {
    let h = setup().await;
    h.deposit("B1", 50_000).await;

    // B1 has the highest id; sending to A1 locks A1 first.
    let receipt = h
        .engine
        .transfer(&internal("B1", "A1", 10_000), customer(2))
        .await
        .unwrap();

    assert_eq!(receipt.sender_balance_cents, 50_000 - 10_000 - 1_500);
    assert_eq!(h.balance("A1").await, 110_000);
}

#[tokio::test]
async fn rejects_same_account_and_foreign_sender() {
    let h = setup().await;

    let err = h
        .engine
        .transfer(&internal("A1", "A1", 100), customer(1))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::SameAccount));

    let err = h
        .engine
        .transfer(&internal("A1", "B1", 100), customer(2))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Forbidden(_)));

    let err = h
        .engine
        .transfer(&internal("A1", "missing", 100), customer(1))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::AccountNotFound { .. }));

    let err = h
        .engine
        .transfer(&internal("A1", "B1", 0), customer(1))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidAmount(_)));
}

#[tokio::test]
async fn employees_may_transfer_on_behalf_of_customers() {
    let h = setup().await;

    let receipt = h
        .engine
        .transfer(&internal("A1", "B1", 1_000), teller())
        .await
        .unwrap();

    assert_eq!(receipt.debit.employee_id, teller().employee_id());
}

#[tokio::test]
async fn flagged_sender_cannot_transfer_out() {
    let h = setup().await;
    h.deposit("B1", 100).await;
    h.engine.run_nightly().await.unwrap();
    assert_eq!(h.account("B1").await.status, AccountStatus::FlaggedForRemoval);
    h.deposit("B1", 50).await;

    let err = h
        .engine
        .transfer(&internal("B1", "A1", 10), customer(2))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::AccountFlagged { .. }));
}

// ============================================================================
// Amount range
// ============================================================================

#[tokio::test]
async fn oversized_transfer_is_rejected() {
    let h = setup().await;
    let rows_before = h.store.transaction_count().await;

    let err = h
        .engine
        .transfer(&internal("A1", "B1", i64::MAX), customer(1))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidAmount(_)));

    let err = h
        .engine
        .transfer(&external("A1", i64::MAX), customer(1))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidAmount(_)));

    assert_eq!(h.store.transaction_count().await, rows_before);
    assert_eq!(h.balance("A1").await, 100_000);
    assert_eq!(h.balance("B1").await, 0);
}

#[tokio::test]
async fn largest_amount_plus_fee_is_still_checked_against_the_balance() {
    let h = setup().await;

    let err = h
        .engine
        .transfer(&internal("A1", "B1", MAX_AMOUNT_CENTS), customer(1))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        LedgerError::InsufficientFunds {
            balance: 100_000,
            required
        } if required == MAX_AMOUNT_CENTS + 1_500
    ));
    assert_eq!(h.balance("A1").await, 100_000);
}

#[tokio::test]
async fn transfer_overflowing_the_receiver_is_rejected() {
    let h = setup().await;
    h.post_directly("B1", TransactionType::Deposit, i64::MAX - 10)
        .await;
    let rows_before = h.store.transaction_count().await;

    let err = h
        .engine
        .transfer(&internal("A1", "B1", 1_000), customer(1))
        .await
        .unwrap_err();

    assert!(matches!(err, LedgerError::InvalidAmount(_)));
    assert_eq!(h.store.transaction_count().await, rows_before);
    assert_eq!(h.balance("A1").await, 100_000);
}

#[tokio::test]
async fn sender_balance_is_read_back_through_the_catalog() {
    let h = setup().await;

    // Transfer fees configured as rebates.
    let defaults = TypeCatalog::default();
    let catalog = TypeCatalog::from_entries(TransactionType::ALL.into_iter().map(|t| {
        let sign = if t == TransactionType::ServiceCharge {
            Sign::Credit
        } else {
            defaults.sign_of(t.as_str()).unwrap()
        };
        (t.as_str(), sign)
    }));
    let policy = LedgerPolicy {
        catalog,
        ..LedgerPolicy::default()
    };
    let engine = Engine::new(h.engine.store().clone(), h.clock.clone(), policy);

    let receipt = engine
        .transfer(&internal("A1", "B1", 30_000), customer(1))
        .await
        .unwrap();

    let overview = engine.account_overview("A1").await.unwrap();
    assert_eq!(receipt.sender_balance_cents, 100_000 - 30_000 + 1_500);
    assert_eq!(receipt.sender_balance_cents, overview.balance_cents);
}
