//! Teller endpoint integration tests.

mod common;

use axum::http::StatusCode;
use common::{TestHarness, TELLER_ID};
use serde_json::json;

// ============================================================================
// Withdrawals
// ============================================================================

#[tokio::test]
async fn withdrawal_success() {
    let harness = TestHarness::new();
    harness.open_account("1001", 1).await;
    harness.seed_deposit("1001", 50_000).await;

    let response = harness
        .server
        .post("/v1/teller/withdrawals")
        .add_header("authorization", harness.employee_auth_header())
        .json(&json!({ "account_number": "1001", "amount_cents": 12_500 }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["balance_cents"], 37_500);
    assert_eq!(body["data"]["status"], "active");
    assert_eq!(body["data"]["transaction"]["transaction_type"], "Withdrawal");
    assert_eq!(body["data"]["transaction"]["employee_id"], TELLER_ID);
    assert_eq!(body["data"]["warnings"], json!([]));
}

#[tokio::test]
async fn withdrawal_of_full_balance_returns_warnings() {
    let harness = TestHarness::new();
    harness.open_account("1002", 1).await;
    harness.seed_deposit("1002", 15_000).await;

    let response = harness
        .server
        .post("/v1/teller/withdrawals")
        .add_header("authorization", harness.employee_auth_header())
        .json(&json!({ "account_number": "1002", "amount_cents": 15_000 }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["data"]["balance_cents"], 0);
    assert_eq!(body["data"]["status"], "below_maintaining");
    let codes: Vec<_> = body["data"]["warnings"]
        .as_array()
        .unwrap()
        .iter()
        .map(|w| w["code"].as_str().unwrap().to_string())
        .collect();
    assert!(codes.contains(&"below_maintaining".to_string()));
    assert!(codes.contains(&"zero_balance".to_string()));
}

#[tokio::test]
async fn withdrawal_insufficient_funds() {
    let harness = TestHarness::new();
    harness.open_account("1003", 1).await;
    harness.seed_deposit("1003", 5_000).await;

    let response = harness
        .server
        .post("/v1/teller/withdrawals")
        .add_header("authorization", harness.employee_auth_header())
        .json(&json!({ "account_number": "1003", "amount_cents": 6_000 }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "insufficient_funds");
    assert_eq!(body["error"]["details"]["balance"], 5_000);
    assert_eq!(body["error"]["details"]["required"], 6_000);
    assert_eq!(harness.store.transaction_count().await, 1);
}

#[tokio::test]
async fn withdrawal_rejects_bad_amount() {
    let harness = TestHarness::new();
    harness.open_account("1004", 1).await;

    let response = harness
        .server
        .post("/v1/teller/withdrawals")
        .add_header("authorization", harness.employee_auth_header())
        .json(&json!({ "account_number": "1004", "amount_cents": 0 }))
        .await;

    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn deposit_rejects_huge_amount() {
    let harness = TestHarness::new();
    harness.open_account("1008", 1).await;
    harness.seed_deposit("1008", 1_000).await;

    let response = harness
        .server
        .post("/v1/teller/deposits")
        .add_header("authorization", harness.employee_auth_header())
        .json(&json!({ "account_number": "1008", "amount_cents": i64::MAX }))
        .await;

    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn withdrawal_unknown_account() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/teller/withdrawals")
        .add_header("authorization", harness.employee_auth_header())
        .json(&json!({ "account_number": "9999", "amount_cents": 100 }))
        .await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn withdrawal_from_flagged_account_is_rejected() {
    let harness = TestHarness::new();
    harness.open_account("1005", 1).await;
    harness.seed_deposit("1005", 200).await;
    // The first fee takes the balance to zero and flags the account.
    harness.engine.run_nightly().await.unwrap();
    harness.seed_deposit("1005", 100).await;

    let response = harness
        .server
        .post("/v1/teller/withdrawals")
        .add_header("authorization", harness.employee_auth_header())
        .json(&json!({ "account_number": "1005", "amount_cents": 50 }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "account_flagged");
}

#[tokio::test]
async fn withdrawal_requires_employee() {
    let harness = TestHarness::new();
    harness.open_account("1006", 1).await;

    let response = harness
        .server
        .post("/v1/teller/withdrawals")
        .json(&json!({ "account_number": "1006", "amount_cents": 100 }))
        .await;
    response.assert_status_unauthorized();

    let response = harness
        .server
        .post("/v1/teller/withdrawals")
        .add_header("authorization", harness.customer_auth_header(1))
        .json(&json!({ "account_number": "1006", "amount_cents": 100 }))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    let response = harness
        .server
        .post("/v1/teller/withdrawals")
        .add_header("authorization", "Bearer not-a-jwt")
        .json(&json!({ "account_number": "1006", "amount_cents": 100 }))
        .await;
    response.assert_status_unauthorized();
}

// ============================================================================
// Deposits
// ============================================================================

#[tokio::test]
async fn deposit_recovers_account() {
    let harness = TestHarness::new();
    harness.open_account("1101", 1).await;
    harness.seed_deposit("1101", 4_000).await;

    let response = harness
        .server
        .post("/v1/teller/deposits")
        .add_header("authorization", harness.employee_auth_header())
        .json(&json!({ "account_number": "1101", "amount_cents": 6_000 }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["data"]["balance_cents"], 10_000);
    assert_eq!(body["data"]["status"], "active");
    assert_eq!(body["data"]["transition"]["transition"], "recovered");
}

#[tokio::test]
async fn deposit_into_closed_account_is_rejected() {
    let harness = TestHarness::new();
    harness.open_account("1102", 1).await;
    harness.engine.archive("1102").await.unwrap();

    let response = harness
        .server
        .post("/v1/teller/deposits")
        .add_header("authorization", harness.employee_auth_header())
        .json(&json!({ "account_number": "1102", "amount_cents": 6_000 }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "account_closed");
}
