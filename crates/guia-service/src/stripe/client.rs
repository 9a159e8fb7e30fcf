//! Stripe API client.
//!
//! Speaks to the Customers and Checkout endpoints with Stripe's form
//! encoding over a pooled reqwest client. Webhook signatures are checked
//! in the webhook handler against the configured signing secret, not
//! here, so the client only exists when an API key is configured.

use std::time::Duration;

use reqwest::Client;

use guia_core::PointPackage;

use super::types::{CheckoutSession, Customer, StripeErrorResponse};

/// Failures talking to Stripe.
#[derive(Debug, thiserror::Error)]
pub enum StripeError {
    /// The request never got a usable response.
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// Stripe rejected the call.
    #[error("Stripe API error: {error_type}: {message}")]
    Api {
        /// Stripe's error type (e.g. `invalid_request_error`).
        error_type: String,
        /// Human-readable message.
        message: String,
        /// Machine-readable code, when present.
        code: Option<String>,
    },

    /// The session came back without a redirect URL.
    #[error("checkout session has no URL")]
    MissingUrl,
}

/// Thin client over the Stripe REST API.
#[derive(Debug, Clone)]
pub struct StripeClient {
    client: Client,
    api_key: String,
}

impl StripeClient {
    /// Stripe API base URL.
    const BASE_URL: &'static str = "https://api.stripe.com/v1";

    /// Build a client around a secret key (`sk_test_...` / `sk_live_...`).
    ///
    /// # Panics
    ///
    /// Panics if reqwest cannot assemble the client, which only happens
    /// with a broken TLS backend.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("reqwest client with static settings builds");

        Self {
            client,
            api_key: api_key.into(),
        }
    }

    /// Create a customer carrying our user ID in its metadata.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or Stripe rejects it.
    pub async fn create_customer(
        &self,
        user_id: &str,
        name: Option<&str>,
    ) -> Result<Customer, StripeError> {
        let mut form = vec![("metadata[user_id]", user_id.to_string())];
        if let Some(name) = name {
            form.push(("name", name.to_string()));
        }

        self.post_form("customers", &form).await
    }

    /// Create a Checkout session for a point package, priced in BRL.
    ///
    /// The package terms go into the session metadata for support tooling
    /// only; settlement reads the local pending-payment record, never
    /// these fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or Stripe rejects it.
    pub async fn create_checkout_session(
        &self,
        customer_id: Option<&str>,
        user_id: &str,
        package: &PointPackage,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession, StripeError> {
        let product_name = format!("Guia do Coração — {}", package.label);
        let product_description = format!("{} pontos cósmicos", package.points);

        let mut form = Vec::with_capacity(12);
        form.push(("mode", "payment".to_string()));
        form.push(("success_url", success_url.to_string()));
        form.push(("cancel_url", cancel_url.to_string()));
        form.push(("client_reference_id", user_id.to_string()));
        form.push(("line_items[0][quantity]", "1".to_string()));
        form.push(("line_items[0][price_data][currency]", "brl".to_string()));
        form.push((
            "line_items[0][price_data][unit_amount]",
            package.price_cents.to_string(),
        ));
        form.push((
            "line_items[0][price_data][product_data][name]",
            product_name,
        ));
        form.push((
            "line_items[0][price_data][product_data][description]",
            product_description,
        ));
        form.push(("metadata[user_id]", user_id.to_string()));
        form.push(("metadata[package_id]", package.id.to_string()));
        form.push(("metadata[points]", package.points.to_string()));

        if let Some(cid) = customer_id {
            form.push(("customer", cid.to_string()));
        }

        tracing::debug!(
            user_id = %user_id,
            package_id = %package.id,
            amount_cents = package.price_cents,
            "Opening Stripe checkout session"
        );

        self.post_form("checkout/sessions", &form).await
    }

    async fn post_form<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, String)],
    ) -> Result<T, StripeError> {
        let response = self
            .client
            .post(format!("{}/{path}", Self::BASE_URL))
            .basic_auth(&self.api_key, Option::<&str>::None)
            .form(form)
            .send()
            .await?;

        parse_response(response).await
    }
}

/// Turn a Stripe response into the expected type or a typed API error.
async fn parse_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, StripeError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    // Error bodies carry a structured envelope; fall back to the bare
    // status when they don't parse.
    match response.json::<StripeErrorResponse>().await {
        Ok(envelope) => Err(StripeError::Api {
            error_type: envelope.error.error_type,
            message: envelope.error.message,
            code: envelope.error.code,
        }),
        Err(_) => Err(StripeError::Api {
            error_type: "unknown".into(),
            message: format!("HTTP {status}"),
            code: None,
        }),
    }
}
