//! Reading generation integration tests.
//!
//! These cover the charge-gated pipeline: balance checks before the oracle
//! is consulted, no charge on failure, fallback content on blank replies,
//! and the one-per-day limit on the daily tools.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use common::TestHarness;
use guia_core::ToolKind;
use guia_oracle::fallback;
use guia_oracle::mock::MockOracle;
use serde_json::json;

// ============================================================================
// Tarot
// ============================================================================

#[tokio::test]
async fn tarot_reading_charges_seven_points() {
    let harness =
        TestHarness::with_oracle(MockOracle::new().with_reply("As cartas anunciam um novo ciclo."));
    harness.onboard().await;

    let response = harness
        .server
        .post("/v1/readings/tarot")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "question": "Ele pensa em mim?" }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["tool"], "tarot");
    assert_eq!(body["content"], "As cartas anunciam um novo ciclo.");
    assert_eq!(body["cost_points"], 7);
    assert_eq!(body["fallback"], false);
    assert_eq!(body["balance_points"], 3);
    assert_eq!(body["input"]["question"], "Ele pensa em mim?");
    assert_eq!(body["input"]["cards"].as_array().unwrap().len(), 3);

    let reading_id = body["id"].as_str().unwrap().to_string();
    assert_eq!(harness.balance().await, 3);

    // The deduction is one ledger entry referencing the reading.
    let response = harness
        .server
        .get("/v1/points/transactions")
        .add_header("authorization", harness.user_auth_header())
        .await;
    let body: serde_json::Value = response.json();
    let usage = body["transactions"]
        .as_array()
        .unwrap()
        .iter()
        .find(|tx| tx["kind"] == "tool_usage")
        .expect("usage entry");
    assert_eq!(usage["amount_points"], -7);
    assert_eq!(usage["balance_after_points"], 3);
    assert_eq!(usage["reference"], reading_id.as_str());
}

#[tokio::test]
async fn insufficient_points_block_before_the_oracle() {
    let harness = TestHarness::with_oracle(MockOracle::new().with_reply("Primeira leitura."));
    harness.onboard().await;

    // First reading: 10 - 7 = 3 points left.
    harness
        .server
        .post("/v1/readings/tarot")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "question": "Primeira pergunta" }))
        .await
        .assert_status_ok();

    // 3 < 7: refused with the shortfall spelled out, and no generation.
    let response = harness
        .server
        .post("/v1/readings/tarot")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "question": "Segunda pergunta" }))
        .await;

    response.assert_status(StatusCode::PAYMENT_REQUIRED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "insufficient_points");
    assert_eq!(body["error"]["details"]["balance"], 3);
    assert_eq!(body["error"]["details"]["required"], 7);
    assert!(body["error"]["user_message"].as_str().is_some());

    assert_eq!(harness.oracle.call_count(), 1);
    assert_eq!(harness.balance().await, 3);

    let response = harness
        .server
        .get("/v1/readings")
        .add_header("authorization", harness.user_auth_header())
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["readings"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn reading_requires_completed_onboarding() {
    let harness = TestHarness::new();
    harness.create_user().await;

    let response = harness
        .server
        .post("/v1/readings/tarot")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "question": "Posso perguntar?" }))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "onboarding_required");
    assert_eq!(harness.oracle.call_count(), 0);
}

#[tokio::test]
async fn reading_requires_an_account() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/readings/tarot")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "question": "Posso perguntar?" }))
        .await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn reading_without_auth_fails() {
    let harness = TestHarness::new();

    harness
        .server
        .post("/v1/readings/tarot")
        .json(&json!({ "question": "Posso perguntar?" }))
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn oracle_failure_charges_nothing() {
    let harness = TestHarness::with_oracle(MockOracle::new().with_failure());
    harness.onboard().await;

    let response = harness
        .server
        .post("/v1/readings/tarot")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "question": "O que me aguarda?" }))
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "generation_failed");
    assert!(body["error"]["user_message"].as_str().is_some());

    // No charge, no reading, nothing in the ledger beyond the welcome.
    assert_eq!(harness.balance().await, 10);

    let response = harness
        .server
        .get("/v1/readings")
        .add_header("authorization", harness.user_auth_header())
        .await;
    let body: serde_json::Value = response.json();
    assert!(body["readings"].as_array().unwrap().is_empty());

    let response = harness
        .server
        .get("/v1/points/transactions")
        .add_header("authorization", harness.user_auth_header())
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["transactions"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn blank_generation_delivers_fallback_and_charges() {
    let harness = TestHarness::with_oracle(MockOracle::new().with_blank());
    harness.onboard().await;

    let response = harness
        .server
        .post("/v1/readings/tarot")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "question": "O que me aguarda?" }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["fallback"], true);
    assert_eq!(body["content"], fallback::content(ToolKind::Tarot));
    assert_eq!(body["balance_points"], 3);

    assert_eq!(harness.balance().await, 3);
}

#[tokio::test]
async fn tarot_request_validation() {
    let harness = TestHarness::new();
    harness.onboard().await;
    let auth = harness.user_auth_header();

    // Blank question
    harness
        .server
        .post("/v1/readings/tarot")
        .add_header("authorization", auth.clone())
        .json(&json!({ "question": "   " }))
        .await
        .assert_status_bad_request();

    // Over the length cap
    harness
        .server
        .post("/v1/readings/tarot")
        .add_header("authorization", auth.clone())
        .json(&json!({ "question": "a".repeat(501) }))
        .await
        .assert_status_bad_request();

    // Wrong spread size
    harness
        .server
        .post("/v1/readings/tarot")
        .add_header("authorization", auth.clone())
        .json(&json!({ "question": "Pergunta", "cards": ["O Sol", "A Lua"] }))
        .await
        .assert_status_bad_request();

    // Unknown card
    harness
        .server
        .post("/v1/readings/tarot")
        .add_header("authorization", auth.clone())
        .json(&json!({ "question": "Pergunta", "cards": ["O Sol", "A Lua", "O Dragão"] }))
        .await
        .assert_status_bad_request();

    // Duplicated card
    harness
        .server
        .post("/v1/readings/tarot")
        .add_header("authorization", auth.clone())
        .json(&json!({ "question": "Pergunta", "cards": ["O Sol", "O Sol", "A Lua"] }))
        .await
        .assert_status_bad_request();

    // None of the rejected requests reached the oracle or charged points.
    assert_eq!(harness.oracle.call_count(), 0);
    assert_eq!(harness.balance().await, 10);
}

#[tokio::test]
async fn tarot_accepts_cards_chosen_by_the_frontend() {
    let harness = TestHarness::new();
    harness.onboard().await;

    let response = harness
        .server
        .post("/v1/readings/tarot")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({
            "question": "Qual caminho seguir?",
            "cards": ["A Estrela", "o sol", "A Lua"]
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    // Canonical names, in the order they were revealed.
    assert_eq!(body["input"]["cards"], json!(["A Estrela", "O Sol", "A Lua"]));
}

// ============================================================================
// Daily Tools
// ============================================================================

#[tokio::test]
async fn daily_card_is_limited_to_one_per_day() {
    let harness = TestHarness::new();
    harness.onboard().await;

    let response = harness
        .server
        .post("/v1/readings/tarot/daily")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["tool"], "daily_card");
    assert_eq!(body["cost_points"], 2);
    assert_eq!(body["balance_points"], 8);
    assert!(body["input"]["card"].as_str().is_some());

    // Same tool, same day: refused and not charged.
    let response = harness
        .server
        .post("/v1/readings/tarot/daily")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "daily_limit_reached");
    assert_eq!(body["error"]["details"]["tool"], "daily_card");

    // The other daily tool has its own counter.
    let response = harness
        .server
        .post("/v1/readings/horoscope/daily")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    assert_eq!(harness.balance().await, 6);
}

#[tokio::test]
async fn daily_horoscope_resolves_the_sign() {
    // Explicit sign wins.
    let harness = TestHarness::new();
    harness.onboard().await;

    let response = harness
        .server
        .post("/v1/readings/horoscope/daily")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "sign": "peixes" }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["tool"], "daily_horoscope");
    assert_eq!(body["input"]["sign"], "peixes");
}

#[tokio::test]
async fn daily_horoscope_falls_back_to_the_profile_birth_date() {
    let harness = TestHarness::new();
    // Profile birth date 1990-03-25 puts the user in Aries.
    harness.onboard().await;

    let response = harness
        .server
        .post("/v1/readings/horoscope/daily")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["input"]["sign"], "aries");
}

#[tokio::test]
async fn daily_horoscope_needs_a_sign_from_somewhere() {
    let harness = TestHarness::new();
    harness.create_user().await;

    // Onboard without a birth date.
    harness
        .server
        .post("/v1/users/me/onboarding")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "display_name": "Maria" }))
        .await
        .assert_status_ok();

    // No sign in the request either.
    harness
        .server
        .post("/v1/readings/horoscope/daily")
        .add_header("authorization", harness.user_auth_header())
        .await
        .assert_status_bad_request();

    // An unknown sign is rejected too.
    harness
        .server
        .post("/v1/readings/horoscope/daily")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "sign": "dragão" }))
        .await
        .assert_status_bad_request();

    assert_eq!(harness.balance().await, 10);
}

// ============================================================================
// Birth Chart
// ============================================================================

#[tokio::test]
async fn birth_chart_uses_profile_data() {
    let harness = TestHarness::new();
    harness.onboard().await;

    let response = harness
        .server
        .post("/v1/readings/birth-chart")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["tool"], "birth_chart");
    assert_eq!(body["cost_points"], 10);
    assert_eq!(body["balance_points"], 0);
    assert_eq!(body["input"]["birth_date"], "1990-03-25");
}

#[tokio::test]
async fn birth_chart_accepts_request_overrides() {
    let harness = TestHarness::new();
    harness.onboard().await;

    let response = harness
        .server
        .post("/v1/readings/birth-chart")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({
            "birth_date": "2000-01-01",
            "birth_time": "04:30",
            "birth_place": "Salvador, BA"
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["input"]["birth_date"], "2000-01-01");
    assert_eq!(body["input"]["birth_time"], "04:30");
    assert_eq!(body["input"]["birth_place"], "Salvador, BA");
}

#[tokio::test]
async fn birth_chart_requires_a_birth_date() {
    let harness = TestHarness::new();
    harness.create_user().await;

    harness
        .server
        .post("/v1/users/me/onboarding")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "display_name": "Maria" }))
        .await
        .assert_status_ok();

    harness
        .server
        .post("/v1/readings/birth-chart")
        .add_header("authorization", harness.user_auth_header())
        .await
        .assert_status_bad_request();

    assert_eq!(harness.balance().await, 10);
}

// ============================================================================
// Numerology and Dreams
// ============================================================================

#[tokio::test]
async fn numerology_computes_the_numbers() {
    let harness = TestHarness::new();
    harness.onboard().await;

    let response = harness
        .server
        .post("/v1/readings/numerology")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "full_name": "Maria Silva" }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["tool"], "numerology");
    assert_eq!(body["cost_points"], 5);
    assert_eq!(body["balance_points"], 5);
    assert_eq!(body["input"]["full_name"], "Maria Silva");
    assert!(body["input"]["destiny_number"].as_u64().is_some());
    // Life path comes from the profile birth date.
    assert!(body["input"]["life_path_number"].as_u64().is_some());
}

#[tokio::test]
async fn numerology_rejects_a_name_without_letters() {
    let harness = TestHarness::new();
    harness.onboard().await;

    harness
        .server
        .post("/v1/readings/numerology")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "full_name": "123 456" }))
        .await
        .assert_status_bad_request();

    assert_eq!(harness.balance().await, 10);
}

#[tokio::test]
async fn dream_interpretation_works() {
    let harness = TestHarness::new();
    harness.onboard().await;

    let response = harness
        .server
        .post("/v1/readings/dreams")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "description": "Sonhei que atravessava um rio de águas claras." }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["tool"], "dream_interpretation");
    assert_eq!(body["cost_points"], 5);
    assert_eq!(body["balance_points"], 5);
}

#[tokio::test]
async fn dream_description_is_validated() {
    let harness = TestHarness::new();
    harness.onboard().await;

    harness
        .server
        .post("/v1/readings/dreams")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "description": "" }))
        .await
        .assert_status_bad_request();

    harness
        .server
        .post("/v1/readings/dreams")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "description": "s".repeat(2001) }))
        .await
        .assert_status_bad_request();

    assert_eq!(harness.balance().await, 10);
}

// ============================================================================
// History
// ============================================================================

#[tokio::test]
async fn get_reading_by_id() {
    let harness = TestHarness::new();
    harness.onboard().await;

    let response = harness
        .server
        .post("/v1/readings/tarot")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "question": "Qual o meu caminho?" }))
        .await;
    let body: serde_json::Value = response.json();
    let reading_id = body["id"].as_str().unwrap().to_string();

    let response = harness
        .server
        .get(&format!("/v1/readings/{reading_id}"))
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["id"], reading_id.as_str());
    assert_eq!(body["tool"], "tarot");
}

#[tokio::test]
async fn readings_are_private_to_their_owner() {
    let harness = TestHarness::new();
    harness.onboard().await;

    let response = harness
        .server
        .post("/v1/readings/tarot")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "question": "Segredo meu" }))
        .await;
    let body: serde_json::Value = response.json();
    let reading_id = body["id"].as_str().unwrap().to_string();

    // Another user gets a 404, not a 403: the ID's existence stays hidden.
    let other = TestHarness::other_user_auth_header();
    harness
        .server
        .get(&format!("/v1/readings/{reading_id}"))
        .add_header("authorization", other)
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn get_reading_rejects_a_malformed_id() {
    let harness = TestHarness::new();
    harness.onboard().await;

    harness
        .server
        .get("/v1/readings/not-a-ulid")
        .add_header("authorization", harness.user_auth_header())
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn list_readings_newest_first() {
    let harness = TestHarness::new();
    harness.onboard().await;
    harness.grant(100).await;

    harness
        .server
        .post("/v1/readings/tarot")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "question": "Primeira" }))
        .await
        .assert_status_ok();

    // ULIDs order by millisecond; keep the two readings apart.
    tokio::time::sleep(Duration::from_millis(2)).await;

    harness
        .server
        .post("/v1/readings/dreams")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "description": "Sonhei com o mar." }))
        .await
        .assert_status_ok();

    let response = harness
        .server
        .get("/v1/readings")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let readings = body["readings"].as_array().unwrap();
    assert_eq!(readings.len(), 2);
    assert_eq!(readings[0]["tool"], "dream_interpretation");
    assert_eq!(readings[1]["tool"], "tarot");
    assert_eq!(body["has_more"], false);

    let response = harness
        .server
        .get("/v1/readings?limit=1")
        .add_header("authorization", harness.user_auth_header())
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["readings"].as_array().unwrap().len(), 1);
    assert_eq!(body["has_more"], true);
}
