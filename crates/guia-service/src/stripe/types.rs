//! Stripe API wire types (the subset this service touches).

use serde::Deserialize;

/// A Stripe customer.
#[derive(Debug, Clone, Deserialize)]
pub struct Customer {
    /// Customer ID (`cus_...`).
    pub id: String,
}

/// A Stripe Checkout session.
///
/// Webhook events carry the full session object; the webhook handler reads
/// the fields it needs straight from the event JSON, so this type only
/// covers the session-creation response.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    /// Session ID (`cs_...`). Doubles as our pending-payment key.
    pub id: String,

    /// Hosted checkout URL the buyer is redirected to.
    #[serde(default)]
    pub url: Option<String>,
}

/// Error response envelope from the Stripe API.
#[derive(Debug, Deserialize)]
pub struct StripeErrorResponse {
    /// The error payload.
    pub error: StripeErrorDetail,
}

/// Error details from the Stripe API.
#[derive(Debug, Deserialize)]
pub struct StripeErrorDetail {
    /// Error type (e.g. `invalid_request_error`).
    #[serde(rename = "type", default)]
    pub error_type: String,

    /// Human-readable message.
    #[serde(default)]
    pub message: String,

    /// Machine-readable code, when present.
    #[serde(default)]
    pub code: Option<String>,
}
