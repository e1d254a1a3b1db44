//! Promo code validation and redemption integration tests.

mod common;

use common::TestHarness;
use omni_credits_core::UserId;
use serde_json::json;

async fn create_code(harness: &TestHarness, body: serde_json::Value) {
    harness
        .server
        .post("/v1/promo/codes")
        .add_header("x-api-key", harness.service_api_key.clone())
        .json(&body)
        .await
        .assert_status_ok();
}

// ============================================================================
// Validate
// ============================================================================

#[tokio::test]
async fn validate_unknown_code() {
    let harness = TestHarness::new();
    harness.create_account().await;

    let response = harness
        .server
        .post("/v1/promo/validate")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "code": "GHOST" }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["valid"], false);
    assert_eq!(body["error_code"], "invalid_code");
    assert_eq!(body["message"], "This promo code does not exist.");
}

#[tokio::test]
async fn validate_localizes_messages() {
    let harness = TestHarness::new();
    harness.create_account().await;

    let response = harness
        .server
        .post("/v1/promo/validate")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "code": "GHOST", "lang": "de" }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error_code"], "invalid_code");
    assert_eq!(body["message"], "Dieser Gutscheincode existiert nicht.");
}

#[tokio::test]
async fn validate_valid_code_case_insensitively() {
    let harness = TestHarness::new();
    harness.create_account().await;
    create_code(
        &harness,
        json!({ "code": "WELCOME50", "kind": "credits", "value": 50 }),
    )
    .await;

    let response = harness
        .server
        .post("/v1/promo/validate")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "code": "welcome50" }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["valid"], true);
    assert_eq!(body["promo_type"], "credits");
    assert_eq!(body["value"], 50);
}

#[tokio::test]
async fn validate_expired_code() {
    let harness = TestHarness::new();
    harness.create_account().await;
    create_code(
        &harness,
        json!({
            "code": "BYGONE",
            "kind": "credits",
            "value": 10,
            "expires_at": "2020-01-01T00:00:00Z"
        }),
    )
    .await;

    let response = harness
        .server
        .post("/v1/promo/validate")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "code": "BYGONE" }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["valid"], false);
    assert_eq!(body["error_code"], "code_expired");
}

// ============================================================================
// Redeem
// ============================================================================

#[tokio::test]
async fn redeem_credits_code() {
    let harness = TestHarness::new();
    harness.create_account().await;
    create_code(
        &harness,
        json!({ "code": "WELCOME50", "kind": "credits", "value": 50 }),
    )
    .await;

    let response = harness
        .server
        .post("/v1/promo/redeem")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "code": "welcome50" }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["credits_added"], 50);
    assert_eq!(body["balance_credits"], 60);

    assert_eq!(harness.balance().await, 60);
}

#[tokio::test]
async fn redeem_twice_returns_already_used_and_single_grant() {
    let harness = TestHarness::new();
    harness.create_account().await;
    create_code(
        &harness,
        json!({ "code": "ONCE", "kind": "credits", "value": 25 }),
    )
    .await;

    harness
        .server
        .post("/v1/promo/redeem")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "code": "ONCE" }))
        .await
        .assert_status_ok();

    let response = harness
        .server
        .post("/v1/promo/redeem")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "code": "ONCE" }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["error_code"], "already_used");

    // Exactly one grant reflected in the balance
    assert_eq!(harness.balance().await, 35);
}

#[tokio::test]
async fn capped_code_exhausts_for_second_user() {
    let harness = TestHarness::new();
    harness.create_account().await;
    create_code(
        &harness,
        json!({ "code": "SINGLE", "kind": "credits", "value": 20, "max_uses": 1 }),
    )
    .await;

    harness
        .server
        .post("/v1/promo/redeem")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "code": "SINGLE" }))
        .await
        .assert_status_ok();

    // Second user signs up and tries the same code
    let other_user = UserId::generate();
    let other_auth = TestHarness::auth_header_for(other_user);
    harness
        .server
        .post("/v1/accounts")
        .add_header("authorization", other_auth.clone())
        .json(&json!({}))
        .await
        .assert_status_ok();

    let response = harness
        .server
        .post("/v1/promo/redeem")
        .add_header("authorization", other_auth)
        .json(&json!({ "code": "SINGLE" }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["error_code"], "code_exhausted");
}

#[tokio::test]
async fn discount_code_is_not_redeemable_standalone() {
    let harness = TestHarness::new();
    harness.create_account().await;
    create_code(
        &harness,
        json!({ "code": "TENOFF", "kind": "discount_percent", "value": 10 }),
    )
    .await;

    let response = harness
        .server
        .post("/v1/promo/redeem")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "code": "TENOFF" }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["error_code"], "not_credits_code");

    assert_eq!(harness.balance().await, 10);
}

// ============================================================================
// Administrative creation
// ============================================================================

#[tokio::test]
async fn create_code_requires_service_key() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/promo/codes")
        .json(&json!({ "code": "NOPE", "kind": "credits", "value": 10 }))
        .await;

    response.assert_status_unauthorized();
}

#[tokio::test]
async fn create_duplicate_code_conflicts() {
    let harness = TestHarness::new();
    create_code(
        &harness,
        json!({ "code": "DUPE", "kind": "credits", "value": 10 }),
    )
    .await;

    let response = harness
        .server
        .post("/v1/promo/codes")
        .add_header("x-api-key", harness.service_api_key.clone())
        .json(&json!({ "code": "dupe", "kind": "credits", "value": 10 }))
        .await;

    assert_eq!(response.status_code(), 409);
}

#[tokio::test]
async fn create_code_with_non_positive_value_fails() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/promo/codes")
        .add_header("x-api-key", harness.service_api_key.clone())
        .json(&json!({ "code": "ZERO", "kind": "credits", "value": 0 }))
        .await;

    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "invalid_amount");
}
