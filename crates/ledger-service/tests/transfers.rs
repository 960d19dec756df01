//! Transfer endpoint integration tests.

mod common;

use axum::http::StatusCode;
use common::TestHarness;
use serde_json::json;

/// Customer 1 owns A1 and A2, customer 2 owns B1. A1 holds 1,000.00.
async fn setup() -> TestHarness {
    let harness = TestHarness::new();
    harness.open_account("A1", 1).await;
    harness.open_account("A2", 1).await;
    harness.open_account("B1", 2).await;
    harness.seed_deposit("A1", 100_000).await;
    harness
}

#[tokio::test]
async fn customer_transfers_to_own_account_for_free() {
    let harness = setup().await;

    let response = harness
        .server
        .post("/v1/transfers")
        .add_header("authorization", harness.customer_auth_header(1))
        .json(&json!({
            "from_account": "A1",
            "destination": { "kind": "internal", "account_number": "A2" },
            "amount_cents": 20_000
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["class"], "same_customer");
    assert_eq!(body["data"]["fee_cents"], 0);
    assert_eq!(body["data"]["sender_balance_cents"], 80_000);
    assert_eq!(body["data"]["credit"]["transaction_type"], "Transfer In");
    assert_eq!(
        body["data"]["credit"]["reference"],
        body["data"]["debit"]["reference"]
    );
}

#[tokio::test]
async fn transfer_to_other_customer_charges_fee() {
    let harness = setup().await;

    let response = harness
        .server
        .post("/v1/transfers")
        .add_header("authorization", harness.customer_auth_header(1))
        .json(&json!({
            "from_account": "A1",
            "destination": { "kind": "internal", "account_number": "B1" },
            "amount_cents": 20_000
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["data"]["class"], "other_customer");
    assert_eq!(body["data"]["fee_cents"], 1_500);
    assert_eq!(body["data"]["fee"]["transaction_type"], "Service Charge");
    assert_eq!(body["data"]["sender_balance_cents"], 78_500);
}

#[tokio::test]
async fn transfer_to_other_bank() {
    let harness = setup().await;

    let response = harness
        .server
        .post("/v1/transfers")
        .add_header("authorization", harness.customer_auth_header(1))
        .json(&json!({
            "from_account": "A1",
            "destination": {
                "kind": "external",
                "bank_name": "Other Bank",
                "account_number": "99-1234",
                "account_name": "J. Doe"
            },
            "amount_cents": 30_000,
            "description": "Rent"
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["data"]["class"], "other_bank");
    assert_eq!(body["data"]["fee_cents"], 2_500);
    assert!(body["data"]["credit"].is_null());
    assert_eq!(body["data"]["sender_balance_cents"], 67_500);
}

#[tokio::test]
async fn transfer_shortfall_is_reported_as_warning() {
    let harness = setup().await;

    let response = harness
        .server
        .post("/v1/transfers")
        .add_header("authorization", harness.customer_auth_header(1))
        .json(&json!({
            "from_account": "A1",
            "destination": { "kind": "internal", "account_number": "A2" },
            "amount_cents": 95_000
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["data"]["sender_status"], "below_maintaining");
    assert_eq!(body["data"]["warnings"][0]["code"], "below_maintaining");
}

#[tokio::test]
async fn transfer_must_cover_fee() {
    let harness = setup().await;

    let response = harness
        .server
        .post("/v1/transfers")
        .add_header("authorization", harness.customer_auth_header(1))
        .json(&json!({
            "from_account": "A1",
            "destination": { "kind": "internal", "account_number": "B1" },
            "amount_cents": 100_000
        }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "insufficient_funds");
    assert_eq!(body["error"]["details"]["required"], 101_500);
}

#[tokio::test]
async fn customer_cannot_send_from_someone_elses_account() {
    let harness = setup().await;

    let response = harness
        .server
        .post("/v1/transfers")
        .add_header("authorization", harness.customer_auth_header(2))
        .json(&json!({
            "from_account": "A1",
            "destination": { "kind": "internal", "account_number": "B1" },
            "amount_cents": 1_000
        }))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "forbidden");
}

#[tokio::test]
async fn transfer_to_same_account_is_rejected() {
    let harness = setup().await;

    let response = harness
        .server
        .post("/v1/transfers")
        .add_header("authorization", harness.customer_auth_header(1))
        .json(&json!({
            "from_account": "A1",
            "destination": { "kind": "internal", "account_number": "A1" },
            "amount_cents": 1_000
        }))
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn transfer_of_huge_amount_is_rejected() {
    let harness = setup().await;

    let response = harness
        .server
        .post("/v1/transfers")
        .add_header("authorization", harness.customer_auth_header(1))
        .json(&json!({
            "from_account": "A1",
            "destination": { "kind": "internal", "account_number": "B1" },
            "amount_cents": i64::MAX
        }))
        .await;

    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "bad_request");

    let response = harness
        .server
        .get("/v1/accounts/A1")
        .add_header("authorization", harness.customer_auth_header(1))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["data"]["balance_cents"], 100_000);
}

#[tokio::test]
async fn transfer_without_auth_fails() {
    let harness = setup().await;

    let response = harness
        .server
        .post("/v1/transfers")
        .json(&json!({
            "from_account": "A1",
            "destination": { "kind": "internal", "account_number": "A2" },
            "amount_cents": 1_000
        }))
        .await;

    response.assert_status_unauthorized();
}
