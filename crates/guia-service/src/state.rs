//! Application state shared across all request handlers.

use std::sync::Arc;

use guia_oracle::{ChatOracle, Oracle, OracleConfig};
use guia_store::RocksStore;

use crate::config::ServiceConfig;
use crate::guard::InflightGuard;
use crate::pix::PixClient;
use crate::stripe::StripeClient;

/// Shared application state.
///
/// The oracle and the payment clients are optional: a deployment without
/// the matching credentials still serves accounts and history, and the
/// affected endpoints answer 502 instead of panicking at startup.
pub struct AppState {
    /// Storage backend.
    pub store: Arc<RocksStore>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Generation provider for readings.
    pub oracle: Option<Arc<dyn Oracle>>,

    /// Stripe client for card checkout.
    pub stripe: Option<Arc<StripeClient>>,

    /// PIX client for instant payments.
    pub pix: Option<Arc<PixClient>>,

    /// Per-user in-flight reading guard.
    pub inflight: InflightGuard,
}

impl AppState {
    /// Create application state from configuration.
    #[must_use]
    pub fn new(store: Arc<RocksStore>, config: ServiceConfig) -> Self {
        let oracle = build_oracle(&config);
        let stripe = build_stripe(&config);
        let pix = build_pix(&config);

        Self {
            store,
            config,
            oracle,
            stripe,
            pix,
            inflight: InflightGuard::new(),
        }
    }

    /// Replace the oracle. Used by tests to inject a scripted one.
    #[must_use]
    pub fn with_oracle(mut self, oracle: Arc<dyn Oracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }
}

fn build_oracle(config: &ServiceConfig) -> Option<Arc<dyn Oracle>> {
    let Some(api_key) = config.oracle_api_key.clone() else {
        tracing::warn!("Oracle API key not configured - readings disabled");
        return None;
    };

    let oracle_config = OracleConfig {
        api_url: config.oracle_api_url.clone(),
        api_key,
        model: config.oracle_model.clone(),
        temperature: config.oracle_temperature,
        max_tokens: config.oracle_max_tokens,
        timeout_secs: config.oracle_timeout_seconds,
    };

    match ChatOracle::new(oracle_config) {
        Ok(oracle) => {
            tracing::info!(model = %config.oracle_model, "Oracle enabled");
            Some(Arc::new(oracle))
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to build oracle - readings disabled");
            None
        }
    }
}

fn build_stripe(config: &ServiceConfig) -> Option<Arc<StripeClient>> {
    config.stripe_api_key.as_ref().map_or_else(
        || {
            tracing::warn!("Stripe API key not configured - card checkout disabled");
            None
        },
        |api_key| {
            tracing::info!("Stripe integration enabled");
            Some(Arc::new(StripeClient::new(api_key.clone())))
        },
    )
}

fn build_pix(config: &ServiceConfig) -> Option<Arc<PixClient>> {
    let (Some(api_url), Some(client_id), Some(client_secret), Some(pix_key)) = (
        config.pix_api_url.as_ref(),
        config.pix_client_id.as_ref(),
        config.pix_client_secret.as_ref(),
        config.pix_key.as_ref(),
    ) else {
        tracing::warn!("PIX credentials not configured - PIX payments disabled");
        return None;
    };

    let identity_pem = match config.pix_identity_pem.as_ref() {
        Some(path) => match std::fs::read(path) {
            Ok(pem) => Some(pem),
            Err(e) => {
                tracing::error!(path = %path, error = %e, "Failed to read PIX mTLS identity - PIX payments disabled");
                return None;
            }
        },
        None => None,
    };

    match PixClient::new(
        api_url.clone(),
        client_id.clone(),
        client_secret.clone(),
        pix_key.clone(),
        identity_pem.as_deref(),
    ) {
        Ok(client) => {
            tracing::info!(api_url = %api_url, "PIX integration enabled");
            Some(Arc::new(client))
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to build PIX client - PIX payments disabled");
            None
        }
    }
}
