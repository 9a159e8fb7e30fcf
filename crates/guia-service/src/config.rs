//! Service configuration.

use guia_core::WELCOME_BONUS_POINTS;
use serde::Deserialize;
use std::path::Path;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Path to the `RocksDB` data directory (default: "/data/guia").
    pub data_dir: String,

    /// Auth provider base URL for JWKS fetches.
    pub auth_base_url: String,

    /// Expected JWT audience (default: "guia-coracao").
    pub auth_audience: String,

    /// Admin API key for the `x-admin-key` endpoints.
    pub admin_api_key: Option<String>,

    /// Accept `test-token:<uuid>` bearer tokens instead of JWTs.
    ///
    /// Never enable this outside local runs and integration tests.
    pub allow_test_tokens: bool,

    /// Points credited when an account is first created.
    pub welcome_bonus_points: i64,

    /// Frontend URL for checkout redirects.
    pub frontend_url: String,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    ///
    /// Reading requests wait on the generation provider, so this sits well
    /// above a typical API timeout.
    pub request_timeout_seconds: u64,

    /// Chat-completion provider base URL.
    pub oracle_api_url: String,

    /// Chat-completion API key (readings are disabled without it).
    pub oracle_api_key: Option<String>,

    /// Chat-completion model identifier.
    pub oracle_model: String,

    /// Sampling temperature override.
    pub oracle_temperature: Option<f32>,

    /// Completion token cap override.
    pub oracle_max_tokens: Option<u32>,

    /// Oracle request timeout in seconds.
    pub oracle_timeout_seconds: u64,

    /// Stripe API key (card checkout is disabled without it).
    pub stripe_api_key: Option<String>,

    /// Stripe webhook signing secret.
    pub stripe_webhook_secret: Option<String>,

    /// PIX API base URL (PIX purchases are disabled without it).
    pub pix_api_url: Option<String>,

    /// PIX OAuth client ID.
    pub pix_client_id: Option<String>,

    /// PIX OAuth client secret.
    pub pix_client_secret: Option<String>,

    /// The receiving PIX key (chave).
    pub pix_key: Option<String>,

    /// PIX webhook signing secret.
    pub pix_webhook_secret: Option<String>,

    /// Path to a PEM bundle (certificate + key) for PIX mutual TLS.
    pub pix_identity_pem: Option<String>,
}

/// Oracle secrets file structure.
#[derive(Debug, Deserialize)]
struct OracleSecrets {
    api_key: String,
    #[serde(default)]
    api_url: Option<String>,
    #[serde(default)]
    model: Option<String>,
}

/// Stripe secrets file structure.
#[derive(Debug, Deserialize)]
struct StripeSecrets {
    api_key: String,
    #[serde(default)]
    webhook_secret: Option<String>,
}

/// PIX secrets file structure.
#[derive(Debug, Deserialize)]
struct PixSecrets {
    api_url: String,
    client_id: String,
    client_secret: String,
    pix_key: String,
    #[serde(default)]
    webhook_secret: Option<String>,
    #[serde(default)]
    identity_pem: Option<String>,
}

impl ServiceConfig {
    /// Load configuration from environment variables and secrets files.
    #[must_use]
    pub fn from_env() -> Self {
        let (oracle_api_key, oracle_api_url, oracle_model) = load_oracle_secrets();
        let (stripe_api_key, stripe_webhook_secret) = load_stripe_secrets();
        let pix = load_pix_secrets();

        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            data_dir: std::env::var("DATA_DIR").unwrap_or_else(|_| "/data/guia".into()),
            auth_base_url: std::env::var("AUTH_BASE_URL")
                .unwrap_or_else(|_| "https://auth.guiadocoracao.app".into()),
            auth_audience: std::env::var("AUTH_AUDIENCE").unwrap_or_else(|_| "guia-coracao".into()),
            admin_api_key: std::env::var("ADMIN_API_KEY").ok(),
            allow_test_tokens: std::env::var("ALLOW_TEST_TOKENS")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            welcome_bonus_points: std::env::var("WELCOME_BONUS_POINTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(WELCOME_BONUS_POINTS),
            frontend_url: std::env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: std::env::var("MAX_BODY_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(64 * 1024), // 64KB; request bodies are small JSON
            request_timeout_seconds: std::env::var("REQUEST_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(90),
            oracle_api_url: oracle_api_url
                .unwrap_or_else(|| "https://api.openai.com".into()),
            oracle_api_key,
            oracle_model: oracle_model.unwrap_or_else(|| "gpt-4o-mini".into()),
            oracle_temperature: std::env::var("ORACLE_TEMPERATURE")
                .ok()
                .and_then(|s| s.parse().ok())
                .or(Some(0.8)),
            oracle_max_tokens: std::env::var("ORACLE_MAX_TOKENS")
                .ok()
                .and_then(|s| s.parse().ok())
                .or(Some(900)),
            oracle_timeout_seconds: std::env::var("ORACLE_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60),
            stripe_api_key,
            stripe_webhook_secret,
            pix_api_url: pix.api_url,
            pix_client_id: pix.client_id,
            pix_client_secret: pix.client_secret,
            pix_key: pix.pix_key,
            pix_webhook_secret: pix.webhook_secret,
            pix_identity_pem: pix.identity_pem,
        }
    }
}

/// Load oracle secrets from file or environment.
fn load_oracle_secrets() -> (Option<String>, Option<String>, Option<String>) {
    let secret_paths = [
        ".secrets/oracle.json",
        "guia/.secrets/oracle.json",
        "../.secrets/oracle.json",
    ];

    for path in &secret_paths {
        if let Ok(secrets) = load_secrets_file::<OracleSecrets>(path) {
            tracing::info!(path = %path, "Loaded oracle secrets from file");
            return (Some(secrets.api_key), secrets.api_url, secrets.model);
        }
    }

    tracing::debug!("Oracle secrets file not found, using environment variables");
    (
        std::env::var("ORACLE_API_KEY").ok(),
        std::env::var("ORACLE_API_URL").ok(),
        std::env::var("ORACLE_MODEL").ok(),
    )
}

/// Load Stripe secrets from file or environment.
fn load_stripe_secrets() -> (Option<String>, Option<String>) {
    let secret_paths = [
        ".secrets/stripe.json",
        "guia/.secrets/stripe.json",
        "../.secrets/stripe.json",
    ];

    for path in &secret_paths {
        if let Ok(secrets) = load_secrets_file::<StripeSecrets>(path) {
            tracing::info!(path = %path, "Loaded Stripe secrets from file");
            return (Some(secrets.api_key), secrets.webhook_secret);
        }
    }

    tracing::debug!("Stripe secrets file not found, using environment variables");
    (
        std::env::var("STRIPE_API_KEY").ok(),
        std::env::var("STRIPE_WEBHOOK_SECRET").ok(),
    )
}

/// PIX settings resolved from a secrets file or environment variables.
struct PixSettings {
    api_url: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
    pix_key: Option<String>,
    webhook_secret: Option<String>,
    identity_pem: Option<String>,
}

/// Load PIX secrets from file or environment.
fn load_pix_secrets() -> PixSettings {
    let secret_paths = [
        ".secrets/pix.json",
        "guia/.secrets/pix.json",
        "../.secrets/pix.json",
    ];

    for path in &secret_paths {
        if let Ok(secrets) = load_secrets_file::<PixSecrets>(path) {
            tracing::info!(path = %path, "Loaded PIX secrets from file");
            return PixSettings {
                api_url: Some(secrets.api_url),
                client_id: Some(secrets.client_id),
                client_secret: Some(secrets.client_secret),
                pix_key: Some(secrets.pix_key),
                webhook_secret: secrets.webhook_secret,
                identity_pem: secrets.identity_pem,
            };
        }
    }

    tracing::debug!("PIX secrets file not found, using environment variables");
    PixSettings {
        api_url: std::env::var("PIX_API_URL").ok(),
        client_id: std::env::var("PIX_CLIENT_ID").ok(),
        client_secret: std::env::var("PIX_CLIENT_SECRET").ok(),
        pix_key: std::env::var("PIX_KEY").ok(),
        webhook_secret: std::env::var("PIX_WEBHOOK_SECRET").ok(),
        identity_pem: std::env::var("PIX_IDENTITY_PEM").ok(),
    }
}

/// Load secrets from a JSON file.
fn load_secrets_file<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, std::io::Error> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Secrets file not found",
        ));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            data_dir: "/data/guia".into(),
            auth_base_url: "https://auth.guiadocoracao.app".into(),
            auth_audience: "guia-coracao".into(),
            admin_api_key: None,
            allow_test_tokens: false,
            welcome_bonus_points: WELCOME_BONUS_POINTS,
            frontend_url: "http://localhost:3000".into(),
            cors_origins: vec!["*".into()],
            max_body_bytes: 64 * 1024,
            request_timeout_seconds: 90,
            oracle_api_url: "https://api.openai.com".into(),
            oracle_api_key: None,
            oracle_model: "gpt-4o-mini".into(),
            oracle_temperature: Some(0.8),
            oracle_max_tokens: Some(900),
            oracle_timeout_seconds: 60,
            stripe_api_key: None,
            stripe_webhook_secret: None,
            pix_api_url: None,
            pix_client_id: None,
            pix_client_secret: None,
            pix_key: None,
            pix_webhook_secret: None,
            pix_identity_pem: None,
        }
    }
}
