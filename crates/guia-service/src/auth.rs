//! Request authentication extractors.
//!
//! End users arrive with an RS256 JWT issued by the auth provider; the
//! [`AuthUser`] extractor validates it against the provider's published
//! JWKS, cached in-process for an hour. Support tooling uses the
//! [`AdminAuth`] extractor, which checks the `x-admin-key` header against
//! the configured admin key.
//!
//! When `allow_test_tokens` is set in the configuration, a bearer token of
//! the form `test-token:<uuid>` authenticates as that user with no JWT
//! involved. The integration harness enables this; production config must
//! never set it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tokio::sync::RwLock;

use guia_core::UserId;

use crate::config::ServiceConfig;
use crate::crypto;
use crate::error::ApiError;
use crate::state::AppState;

/// Cached JWKS keys are refreshed after this long.
const JWKS_REFRESH_INTERVAL: Duration = Duration::from_secs(3600);

/// Timeout for a JWKS fetch.
const JWKS_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// An authenticated end user.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user ID.
    pub user_id: UserId,
    /// The raw subject claim from the JWT.
    pub subject: String,
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 Arc<AppState>,
    ) -> ::core::pin::Pin<
        Box<
            dyn ::core::future::Future<Output = Result<Self, Self::Rejection>>
                + ::core::marker::Send
                + 'async_trait,
        >,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let token = parts
                .headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .and_then(strip_bearer)
                .ok_or(ApiError::Unauthorized)?;

            // Harness bypass; never honored unless the config opts in.
            if state.config.allow_test_tokens {
                if let Some(raw_id) = token.strip_prefix("test-token:") {
                    let user_id = raw_id.parse::<UserId>().map_err(|_| ApiError::Unauthorized)?;
                    return Ok(AuthUser {
                        user_id,
                        subject: raw_id.to_string(),
                    });
                }
            }

            let claims = verify_bearer_jwt(token, &state.config).await?;
            let user_id = claims.sub.parse::<UserId>().map_err(|_| ApiError::Unauthorized)?;

            Ok(AuthUser {
                user_id,
                subject: claims.sub,
            })
        })
    }
}

/// Admin authentication for privileged endpoints (manual point grants).
///
/// Refuses every request when no admin key is configured.
#[derive(Debug, Clone)]
pub struct AdminAuth {
    /// Admin identifier, for audit logging.
    pub admin_id: String,
}

impl FromRequestParts<Arc<AppState>> for AdminAuth {
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 Arc<AppState>,
    ) -> ::core::pin::Pin<
        Box<
            dyn ::core::future::Future<Output = Result<Self, Self::Rejection>>
                + ::core::marker::Send
                + 'async_trait,
        >,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let presented = parts
                .headers
                .get("x-admin-key")
                .and_then(|v| v.to_str().ok())
                .ok_or(ApiError::Unauthorized)?;

            let configured = state
                .config
                .admin_api_key
                .as_deref()
                .ok_or(ApiError::Unauthorized)?;

            if !crypto::constant_time_eq(presented, configured) {
                return Err(ApiError::Unauthorized);
            }

            let admin_id = parts
                .headers
                .get("x-admin-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("admin")
                .to_string();

            tracing::info!(admin_id = %admin_id, "Admin authenticated");

            Ok(AdminAuth { admin_id })
        })
    }
}

/// Take the token out of an `Authorization: Bearer ...` value.
fn strip_bearer(header: &str) -> Option<&str> {
    header.strip_prefix("Bearer ")
}

/// The claims this service reads from a validated token.
///
/// Expiry, issuer and audience are checked by the `Validation` settings;
/// only the subject is carried forward.
#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
}

/// JWKS document published at `/.well-known/jwks.json`.
#[derive(Debug, Deserialize)]
struct JwksDocument {
    keys: Vec<JwksKey>,
}

/// One key out of the JWKS document.
#[derive(Debug, Deserialize)]
struct JwksKey {
    kty: String,
    kid: Option<String>,
    n: Option<String>,
    e: Option<String>,
}

/// In-process key cache.
///
/// Holds decoded keys by kid plus a fallback for kid-less tokens, and the
/// reqwest client used to refresh them (kept for connection reuse).
struct KeyCache {
    client: reqwest::Client,
    by_kid: HashMap<String, DecodingKey>,
    fallback: Option<DecodingKey>,
    refreshed_at: Instant,
}

impl KeyCache {
    fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(JWKS_HTTP_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            by_kid: HashMap::new(),
            fallback: None,
            // Backdated so the first lookup always refreshes.
            refreshed_at: Instant::now()
                .checked_sub(JWKS_REFRESH_INTERVAL)
                .unwrap_or_else(Instant::now),
        }
    }

    fn is_stale(&self) -> bool {
        self.refreshed_at.elapsed() >= JWKS_REFRESH_INTERVAL
    }

    fn lookup(&self, kid: Option<&str>) -> Option<DecodingKey> {
        match kid {
            Some(kid) => self.by_kid.get(kid).cloned(),
            None => self.fallback.clone(),
        }
    }

    /// Replace the cached keys with a freshly fetched document.
    fn install(&mut self, document: &JwksDocument) {
        self.by_kid.clear();
        self.fallback = None;
        self.refreshed_at = Instant::now();

        for key in &document.keys {
            let Some(decoded) = decode_rsa_key(key) else {
                continue;
            };
            if let Some(kid) = &key.kid {
                self.by_kid.insert(kid.clone(), decoded.clone());
            }
            // First usable key doubles as the fallback for kid-less tokens.
            if self.fallback.is_none() {
                self.fallback = Some(decoded);
            }
        }
    }
}

static KEY_CACHE: std::sync::OnceLock<RwLock<KeyCache>> = std::sync::OnceLock::new();

fn key_cache() -> &'static RwLock<KeyCache> {
    KEY_CACHE.get_or_init(|| RwLock::new(KeyCache::new()))
}

/// Validate an RS256 JWT against the provider's JWKS.
async fn verify_bearer_jwt(token: &str, config: &ServiceConfig) -> Result<Claims, ApiError> {
    let header = decode_header(token).map_err(|e| {
        tracing::debug!(error = %e, "Malformed JWT header");
        ApiError::Unauthorized
    })?;

    let key = decoding_key_for(header.kid.as_deref(), config).await?;

    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&[&config.auth_audience]);
    validation.set_issuer(&[&config.auth_base_url]);

    let data = decode::<Claims>(token, &key, &validation).map_err(|e| {
        tracing::debug!(error = %e, "JWT validation failed");
        ApiError::Unauthorized
    })?;

    Ok(data.claims)
}

/// Resolve a decoding key, refreshing the JWKS when the cache misses or is
/// past its refresh interval.
async fn decoding_key_for(
    kid: Option<&str>,
    config: &ServiceConfig,
) -> Result<DecodingKey, ApiError> {
    let cache = key_cache();

    {
        let guard = cache.read().await;
        if !guard.is_stale() {
            if let Some(key) = guard.lookup(kid) {
                return Ok(key);
            }
        }
    }

    let document = fetch_jwks(config).await?;

    let mut guard = cache.write().await;
    guard.install(&document);
    guard.lookup(kid).ok_or(ApiError::Unauthorized)
}

/// Fetch the JWKS document from the auth provider.
async fn fetch_jwks(config: &ServiceConfig) -> Result<JwksDocument, ApiError> {
    let url = format!("{}/.well-known/jwks.json", config.auth_base_url);

    tracing::debug!(url = %url, "Fetching JWKS");

    let client = { key_cache().read().await.client.clone() };

    let response = client.get(&url).send().await.map_err(|e| {
        tracing::error!(error = %e, url = %url, "JWKS fetch failed");
        ApiError::ExternalService("Failed to fetch authentication keys".into())
    })?;

    if !response.status().is_success() {
        tracing::error!(status = %response.status(), url = %url, "JWKS fetch returned an error");
        return Err(ApiError::ExternalService(
            "Failed to fetch authentication keys".into(),
        ));
    }

    let document: JwksDocument = response.json().await.map_err(|e| {
        tracing::error!(error = %e, "JWKS response did not parse");
        ApiError::ExternalService("Failed to parse authentication keys".into())
    })?;

    tracing::info!(keys = document.keys.len(), "JWKS refreshed");

    Ok(document)
}

/// Decode the RSA components of a JWKS key. Non-RSA keys are skipped.
fn decode_rsa_key(key: &JwksKey) -> Option<DecodingKey> {
    if key.kty != "RSA" {
        tracing::debug!(kty = %key.kty, "Skipping non-RSA JWKS key");
        return None;
    }

    DecodingKey::from_rsa_components(key.n.as_ref()?, key.e.as_ref()?).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_prefix_is_required() {
        assert_eq!(strip_bearer("Bearer abc"), Some("abc"));
        assert_eq!(strip_bearer("bearer abc"), None);
        assert_eq!(strip_bearer("abc"), None);
    }

    #[test]
    fn non_rsa_keys_are_skipped() {
        let key = JwksKey {
            kty: "EC".into(),
            kid: Some("k1".into()),
            n: None,
            e: None,
        };
        assert!(decode_rsa_key(&key).is_none());
    }

    #[test]
    fn rsa_key_without_components_is_skipped() {
        let key = JwksKey {
            kty: "RSA".into(),
            kid: Some("k1".into()),
            n: None,
            e: None,
        };
        assert!(decode_rsa_key(&key).is_none());
    }

    #[test]
    fn install_leaves_no_fallback_when_no_key_is_usable() {
        let mut cache = KeyCache::new();
        cache.install(&JwksDocument {
            keys: vec![JwksKey {
                kty: "EC".into(),
                kid: Some("ec1".into()),
                n: None,
                e: None,
            }],
        });

        assert!(cache.lookup(None).is_none());
        assert!(cache.lookup(Some("ec1")).is_none());
        assert!(!cache.is_stale());
    }
}
