//! PIX API client implementation.
//!
//! Follows the Banco Central "cob" immediate-charge API as exposed by
//! Brazilian PSPs: OAuth client-credentials for tokens, `PUT /v2/cob/{txid}`
//! to create a charge, and `GET /v2/loc/{id}/qrcode` for the copy-paste
//! code and QR image. Production PSPs require mutual TLS; the client
//! accepts an optional PEM identity for that.

use reqwest::Client;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use super::types::{Charge, PixErrorBody, QrCode, TokenResponse};

/// Error type for PIX operations.
#[derive(Debug, thiserror::Error)]
pub enum PixError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// PIX API returned an error.
    #[error("PIX API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the provider.
        message: String,
    },

    /// Client-side configuration problem (bad PEM, unbuildable client).
    #[error("PIX configuration error: {0}")]
    Configuration(String),
}

/// How long before expiry a cached token is discarded.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// A cached OAuth access token.
#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// PIX API client.
#[derive(Debug)]
pub struct PixClient {
    client: Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    pix_key: String,
    token: RwLock<Option<CachedToken>>,
}

impl PixClient {
    /// Create a new PIX client.
    ///
    /// `identity_pem` is the concatenated certificate + private key used
    /// for mutual TLS; pass `None` for sandboxes that don't require it.
    ///
    /// # Errors
    ///
    /// Returns `PixError::Configuration` if the PEM is invalid or the
    /// HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        pix_key: impl Into<String>,
        identity_pem: Option<&[u8]>,
    ) -> Result<Self, PixError> {
        let mut builder = Client::builder().timeout(Duration::from_secs(30));

        if let Some(pem) = identity_pem {
            let identity = reqwest::Identity::from_pem(pem)
                .map_err(|e| PixError::Configuration(format!("invalid mTLS identity: {e}")))?;
            builder = builder.identity(identity);
        }

        let client = builder
            .build()
            .map_err(|e| PixError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            pix_key: pix_key.into(),
            token: RwLock::new(None),
        })
    }

    /// Create an immediate charge with a one-hour expiry.
    ///
    /// `txid` must be 26-35 alphanumeric characters; we generate 32-char
    /// hex IDs, which always comply.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the provider rejects it.
    pub async fn create_charge(
        &self,
        txid: &str,
        amount_cents: i64,
        description: &str,
    ) -> Result<Charge, PixError> {
        let token = self.token().await?;
        let body = serde_json::json!({
            "calendario": { "expiracao": 3600 },
            "valor": { "original": amount_brl(amount_cents) },
            "chave": self.pix_key,
            "solicitacaoPagador": description,
        });

        let response = self
            .client
            .put(format!("{}/v2/cob/{txid}", self.base_url))
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Fetch the current state of a charge.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the provider rejects it.
    pub async fn get_charge(&self, txid: &str) -> Result<Charge, PixError> {
        let token = self.token().await?;

        let response = self
            .client
            .get(format!("{}/v2/cob/{txid}", self.base_url))
            .bearer_auth(&token)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Fetch the copy-paste code and QR image for a charge location.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the provider rejects it.
    pub async fn get_qr_code(&self, location_id: i64) -> Result<QrCode, PixError> {
        let token = self.token().await?;

        let response = self
            .client
            .get(format!("{}/v2/loc/{location_id}/qrcode", self.base_url))
            .bearer_auth(&token)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Return a valid access token, fetching a fresh one when the cached
    /// token is missing or near expiry.
    async fn token(&self) -> Result<String, PixError> {
        {
            let cached = self.token.read().await;
            if let Some(token) = cached.as_ref() {
                if token.expires_at > Instant::now() {
                    return Ok(token.access_token.clone());
                }
            }
        }

        let mut cached = self.token.write().await;
        // Another task may have refreshed while we waited for the lock.
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() {
                return Ok(token.access_token.clone());
            }
        }

        let response = self
            .client
            .post(format!("{}/oauth/token", self.base_url))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .json(&serde_json::json!({ "grant_type": "client_credentials" }))
            .send()
            .await?;

        let token: TokenResponse = Self::handle_response(response).await?;
        let lifetime = Duration::from_secs(token.expires_in)
            .saturating_sub(TOKEN_EXPIRY_MARGIN);

        tracing::debug!(expires_in = token.expires_in, "Fetched PIX access token");

        *cached = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });

        Ok(token.access_token)
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, PixError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let message = match response.json::<PixErrorBody>().await {
            Ok(body) => body
                .message()
                .unwrap_or_else(|| format!("HTTP {status}")),
            Err(_) => format!("HTTP {status}"),
        };

        Err(PixError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// Format centavos as the decimal BRL string the cob API expects (`"19.90"`).
#[must_use]
pub fn amount_brl(cents: i64) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brl_formatting() {
        assert_eq!(amount_brl(990), "9.90");
        assert_eq!(amount_brl(1990), "19.90");
        assert_eq!(amount_brl(100), "1.00");
        assert_eq!(amount_brl(5), "0.05");
        assert_eq!(amount_brl(7990), "79.90");
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = PixClient::new(
            "https://pix.example.com/",
            "id",
            "secret",
            "chave@example.com",
            None,
        )
        .unwrap();
        assert_eq!(client.base_url, "https://pix.example.com");
    }
}
