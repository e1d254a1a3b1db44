//! Usage estimate, gate and charge integration tests.

mod common;

use common::TestHarness;
use serde_json::json;

fn charge_body(harness: &TestHarness, event_id: &str, tool: &str, quantity: f64) -> serde_json::Value {
    json!({
        "event_id": event_id,
        "user_id": harness.test_user_id.to_string(),
        "tool": tool,
        "quantity": quantity,
        "input_size": 2048,
        "output_size": 4096,
        "metadata": { "source_language": "en" }
    })
}

// ============================================================================
// Estimate
// ============================================================================

#[tokio::test]
async fn estimate_translation() {
    let harness = TestHarness::new();
    harness.create_account().await;

    let response = harness
        .server
        .post("/v1/usage/estimate")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "tool": "translation", "quantity": 5000.0 }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["base_credits"], 1);
    assert_eq!(body["service_fee_credits"], 0);
    assert_eq!(body["total_credits"], 1);
    assert!(body["estimated_seconds"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn estimate_has_no_side_effects() {
    let harness = TestHarness::new();
    harness.create_account().await;

    harness
        .server
        .post("/v1/usage/estimate")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "tool": "image_generation", "quantity": 3.0 }))
        .await
        .assert_status_ok();

    assert_eq!(harness.balance().await, 10);
}

#[tokio::test]
async fn estimate_is_rate_limited() {
    let harness = TestHarness::with_config(|config| {
        config.estimate_rate_limit_per_minute = 2;
    });
    harness.create_account().await;

    for _ in 0..2 {
        harness
            .server
            .post("/v1/usage/estimate")
            .add_header("authorization", harness.user_auth_header())
            .json(&json!({ "tool": "translation", "quantity": 100.0 }))
            .await
            .assert_status_ok();
    }

    let response = harness
        .server
        .post("/v1/usage/estimate")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "tool": "translation", "quantity": 100.0 }))
        .await;

    assert_eq!(response.status_code(), 429);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "rate_limited");
}

// ============================================================================
// Gate
// ============================================================================

#[tokio::test]
async fn check_balance_sufficient_and_not() {
    let harness = TestHarness::new();
    harness.create_account().await;

    let response = harness
        .server
        .post("/v1/usage/check")
        .add_header("x-api-key", harness.service_api_key.clone())
        .json(&json!({
            "user_id": harness.test_user_id.to_string(),
            "required_credits": 10
        }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["sufficient"], true);

    let response = harness
        .server
        .post("/v1/usage/check")
        .add_header("x-api-key", harness.service_api_key.clone())
        .json(&json!({
            "user_id": harness.test_user_id.to_string(),
            "required_credits": 11
        }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["sufficient"], false);
}

#[tokio::test]
async fn check_balance_unknown_user_is_zero_not_error() {
    let harness = TestHarness::new();
    // No account created

    let response = harness
        .server
        .post("/v1/usage/check")
        .add_header("x-api-key", harness.service_api_key.clone())
        .json(&json!({
            "user_id": harness.test_user_id.to_string(),
            "required_credits": 1
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["sufficient"], false);
    assert_eq!(body["balance_credits"], 0);
}

// ============================================================================
// Charge
// ============================================================================

#[tokio::test]
async fn charge_matches_estimate() {
    let harness = TestHarness::new();
    harness.create_account().await;
    harness.grant_credits(100).await;

    let estimate = harness
        .server
        .post("/v1/usage/estimate")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "tool": "transcription", "quantity": 1500.0 }))
        .await;
    estimate.assert_status_ok();
    let estimate: serde_json::Value = estimate.json();

    let charge = harness
        .server
        .post("/v1/usage/charge")
        .add_header("x-api-key", harness.service_api_key.clone())
        .json(&charge_body(&harness, "evt_charge_1", "transcription", 1500.0))
        .await;
    charge.assert_status_ok();
    let charge: serde_json::Value = charge.json();

    // The user is never charged a different amount than previewed
    assert_eq!(charge["credits_used"], estimate["total_credits"]);
    assert_eq!(
        charge["balance_credits"].as_i64().unwrap(),
        110 - estimate["total_credits"].as_i64().unwrap()
    );
}

#[tokio::test]
async fn charge_records_usage_transaction() {
    let harness = TestHarness::new();
    harness.create_account().await;
    harness.grant_credits(100).await;

    harness
        .server
        .post("/v1/usage/charge")
        .add_header("x-api-key", harness.service_api_key.clone())
        .json(&charge_body(&harness, "evt_charge_2", "image_generation", 2.0))
        .await
        .assert_status_ok();

    let response = harness
        .server
        .get("/v1/credits/transactions")
        .add_header("authorization", harness.user_auth_header())
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let transactions = body["transactions"].as_array().unwrap();
    // 2 images * 5.0 = 10 base + 1 fee = 11
    assert_eq!(transactions[0]["kind"], "usage");
    assert_eq!(transactions[0]["amount_credits"], -11);
}

#[tokio::test]
async fn charge_with_insufficient_balance_mutates_nothing() {
    let harness = TestHarness::new();
    harness.create_account().await; // 10 credits

    let response = harness
        .server
        .post("/v1/usage/charge")
        .add_header("x-api-key", harness.service_api_key.clone())
        .json(&charge_body(&harness, "evt_charge_3", "video_generation", 60.0))
        .await;

    assert_eq!(response.status_code(), 402);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "insufficient_credits");
    assert_eq!(body["error"]["details"]["balance"], 10);

    // Balance and transaction history are untouched
    assert_eq!(harness.balance().await, 10);
    let response = harness
        .server
        .get("/v1/credits/transactions")
        .add_header("authorization", harness.user_auth_header())
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["transactions"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn charge_replay_is_rejected_without_double_charge() {
    let harness = TestHarness::new();
    harness.create_account().await;
    harness.grant_credits(100).await;

    let body = charge_body(&harness, "evt_charge_4", "ocr", 10.0);

    harness
        .server
        .post("/v1/usage/charge")
        .add_header("x-api-key", harness.service_api_key.clone())
        .json(&body)
        .await
        .assert_status_ok();

    let balance_after_first = harness.balance().await;

    let replay = harness
        .server
        .post("/v1/usage/charge")
        .add_header("x-api-key", harness.service_api_key.clone())
        .json(&body)
        .await;

    assert_eq!(replay.status_code(), 409);
    let replay: serde_json::Value = replay.json();
    assert_eq!(replay["error"]["code"], "duplicate_event");

    assert_eq!(harness.balance().await, balance_after_first);
}

#[tokio::test]
async fn charge_requires_service_key() {
    let harness = TestHarness::new();
    harness.create_account().await;

    let response = harness
        .server
        .post("/v1/usage/charge")
        .add_header("authorization", harness.user_auth_header())
        .json(&charge_body(&harness, "evt_charge_5", "translation", 100.0))
        .await;

    response.assert_status_unauthorized();
}
