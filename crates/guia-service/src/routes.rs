//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post, put};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{health, payments, points, readings, users, webhooks};
use crate::state::AppState;

// ============================================================================
// Concurrency Limiting Constants
// ============================================================================

/// Maximum concurrent requests for reading endpoints.
/// Each reading holds an upstream generation call open, so these are the
/// expensive requests to let pile up.
const READING_MAX_CONCURRENT_REQUESTS: usize = 32;

/// Maximum concurrent requests for general API endpoints.
const API_MAX_CONCURRENT_REQUESTS: usize = 64;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
///
/// ## Users (JWT auth)
/// - `POST /v1/users` - Register (or return) the caller's account
/// - `GET /v1/users/me` - Get the caller's account
/// - `PUT /v1/users/me/profile` - Replace the spiritual profile
/// - `POST /v1/users/me/onboarding` - Save profile and finish onboarding
///
/// ## Points (JWT auth)
/// - `GET /v1/points/balance` - Current balance
/// - `GET /v1/points/transactions` - Ledger history
/// - `POST /v1/points/grant` - Admin credit grant (`x-admin-key`)
///
/// ## Readings (JWT auth, concurrency-limited)
/// - `POST /v1/readings/tarot` - Three-card tarot reading
/// - `POST /v1/readings/tarot/daily` - Card of the day
/// - `POST /v1/readings/horoscope/daily` - Daily horoscope
/// - `POST /v1/readings/birth-chart` - Birth chart interpretation
/// - `POST /v1/readings/numerology` - Numerology report
/// - `POST /v1/readings/dreams` - Dream interpretation
/// - `GET /v1/readings` - Reading history
/// - `GET /v1/readings/:id` - Single reading
///
/// ## Payments (JWT auth)
/// - `POST /v1/payments/checkout` - Stripe Checkout session
/// - `POST /v1/payments/pix` - PIX charge with QR code
/// - `GET /v1/payments/pix/:txid` - PIX charge status (settles on paid)
/// - `GET /v1/payments` - Payment history
///
/// ## Webhooks (signature verification)
/// - `POST /webhooks/stripe` - Stripe events
/// - `POST /webhooks/pix` - PIX payment notifications
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    // Build CORS layer
    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    // Reading routes get their own, tighter concurrency limit: each one
    // can occupy an oracle call for several seconds.
    let reading_routes = Router::new()
        .route("/", get(readings::list_readings))
        .route("/:id", get(readings::get_reading))
        .route("/tarot", post(readings::request_tarot))
        .route("/tarot/daily", post(readings::request_daily_card))
        .route("/horoscope/daily", post(readings::request_daily_horoscope))
        .route("/birth-chart", post(readings::request_birth_chart))
        .route("/numerology", post(readings::request_numerology))
        .route("/dreams", post(readings::request_dream))
        .layer(ConcurrencyLimitLayer::new(READING_MAX_CONCURRENT_REQUESTS));

    let api_routes = Router::new()
        // Users
        .route("/users", post(users::create_user))
        .route("/users/me", get(users::get_me))
        .route("/users/me/profile", put(users::update_profile))
        .route("/users/me/onboarding", post(users::complete_onboarding))
        // Points
        .route("/points/balance", get(points::get_balance))
        .route("/points/transactions", get(points::list_transactions))
        .route("/points/grant", post(points::grant_points))
        // Payments
        .route("/payments/checkout", post(payments::create_checkout))
        .route("/payments/pix", post(payments::create_pix_charge))
        .route("/payments/pix/:txid", get(payments::get_pix_charge))
        .route("/payments", get(payments::list_payments))
        // Readings (with their own concurrency limit)
        .nest("/readings", reading_routes)
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS));

    Router::new()
        // Health stays outside the concurrency limits.
        .route("/health", get(health::health))
        .nest("/v1", api_routes)
        // Webhooks are excluded too; the processors retry on 429s and
        // slow ACKs, which only multiplies traffic.
        .route("/webhooks/stripe", post(webhooks::stripe_webhook))
        .route("/webhooks/pix", post(webhooks::pix_webhook))
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
