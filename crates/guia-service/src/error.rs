//! API error types and their HTTP mapping.
//!
//! Handlers return [`ApiError`]; the [`IntoResponse`] impl turns each
//! variant into a status code plus a JSON body of the form:
//!
//! ```json
//! {
//!   "error": {
//!     "code": "insufficient_points",
//!     "message": "insufficient points: balance=3, required=7",
//!     "user_message": "Seus pontos cósmicos não são suficientes...",
//!     "details": { "balance": 3, "required": 7 }
//!   }
//! }
//! ```
//!
//! `message` is for operators and logs (English); `user_message` is the
//! Portuguese text the frontend can show as-is, present only on variants
//! users routinely hit.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use guia_core::ToolKind;
use guia_store::StoreError;
use serde_json::json;

use crate::pix::PixError;
use crate::stripe::StripeError;
use guia_oracle::OracleError;

/// API error type with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or invalid credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// Readings require a completed onboarding questionnaire.
    #[error("onboarding not complete")]
    OnboardingRequired,

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed or invalid request.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// State conflict (e.g. duplicate creation).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Another reading for this user is still being generated.
    #[error("a reading is already in progress")]
    ReadingInProgress,

    /// Balance too low for the requested reading.
    #[error("insufficient points: balance={balance}, required={required}")]
    InsufficientPoints {
        /// Current balance.
        balance: i64,
        /// Cost of the requested reading.
        required: i64,
    },

    /// A once-per-day tool was already used today.
    #[error("daily limit reached for {tool}")]
    DailyLimitReached {
        /// The tool that hit its limit.
        tool: ToolKind,
    },

    /// The generation provider failed; nothing was charged.
    #[error("reading generation failed: {0}")]
    GenerationFailed(String),

    /// Internal error. The message is logged, never returned to clients.
    #[error("internal error: {0}")]
    Internal(String),

    /// An external dependency (payment processor, auth provider) failed.
    #[error("external service error: {0}")]
    ExternalService(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, user_message, details) = match &self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                self.to_string(),
                None,
                None,
            ),
            Self::OnboardingRequired => (
                StatusCode::FORBIDDEN,
                "onboarding_required",
                self.to_string(),
                Some("Complete seu perfil para desbloquear as leituras.".to_string()),
                None,
            ),
            Self::NotFound(_) => (
                StatusCode::NOT_FOUND,
                "not_found",
                self.to_string(),
                None,
                None,
            ),
            Self::BadRequest(_) => (
                StatusCode::BAD_REQUEST,
                "bad_request",
                self.to_string(),
                None,
                None,
            ),
            Self::Conflict(_) => (
                StatusCode::CONFLICT,
                "conflict",
                self.to_string(),
                None,
                None,
            ),
            Self::ReadingInProgress => (
                StatusCode::CONFLICT,
                "reading_in_progress",
                self.to_string(),
                Some(
                    "Sua leitura anterior ainda está sendo canalizada. Aguarde um instante."
                        .to_string(),
                ),
                None,
            ),
            Self::InsufficientPoints { balance, required } => (
                StatusCode::PAYMENT_REQUIRED,
                "insufficient_points",
                self.to_string(),
                Some(
                    "Seus pontos cósmicos não são suficientes para esta leitura. \
                     Recarregue para continuar."
                        .to_string(),
                ),
                Some(json!({ "balance": balance, "required": required })),
            ),
            Self::DailyLimitReached { tool } => (
                StatusCode::TOO_MANY_REQUESTS,
                "daily_limit_reached",
                self.to_string(),
                Some(format!(
                    "Você já recebeu sua {} de hoje. Volte amanhã!",
                    tool.label_pt()
                )),
                Some(json!({ "tool": tool.as_str() })),
            ),
            Self::GenerationFailed(_) => (
                StatusCode::BAD_GATEWAY,
                "generation_failed",
                self.to_string(),
                Some(
                    "O oráculo está em silêncio neste momento. Tente novamente em \
                     instantes — seus pontos não foram descontados."
                        .to_string(),
                ),
                None,
            ),
            Self::Internal(detail) => {
                tracing::error!(detail = %detail, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal error".to_string(),
                    None,
                    None,
                )
            }
            Self::ExternalService(_) => (
                StatusCode::BAD_GATEWAY,
                "external_service_error",
                self.to_string(),
                None,
                None,
            ),
        };

        let mut error = json!({
            "code": code,
            "message": message,
        });
        if let Some(user_message) = user_message {
            error["user_message"] = json!(user_message);
        }
        if let Some(details) = details {
            error["details"] = details;
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => Self::NotFound(format!("{entity}: {id}")),
            StoreError::AlreadyExists { entity, id } => {
                Self::Conflict(format!("{entity} already exists: {id}"))
            }
            StoreError::InsufficientPoints { balance, required } => {
                Self::InsufficientPoints { balance, required }
            }
            StoreError::DailyLimitReached { tool, .. } => Self::DailyLimitReached { tool },
            StoreError::Database(msg) | StoreError::Serialization(msg) => Self::Internal(msg),
        }
    }
}

impl From<OracleError> for ApiError {
    fn from(err: OracleError) -> Self {
        tracing::warn!(error = %err, "Oracle request failed");
        Self::GenerationFailed(err.to_string())
    }
}

impl From<StripeError> for ApiError {
    fn from(err: StripeError) -> Self {
        tracing::error!(error = %err, "Stripe request failed");
        Self::ExternalService(format!("stripe: {err}"))
    }
}

impl From<PixError> for ApiError {
    fn from(err: PixError) -> Self {
        tracing::error!(error = %err, "PIX request failed");
        Self::ExternalService(format!("pix: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_api_errors() {
        let err: ApiError = StoreError::InsufficientPoints {
            balance: 3,
            required: 7,
        }
        .into();
        assert!(matches!(
            err,
            ApiError::InsufficientPoints {
                balance: 3,
                required: 7
            }
        ));

        let err: ApiError = StoreError::not_found("user", "abc").into();
        assert!(matches!(err, ApiError::NotFound(_)));

        let err: ApiError = StoreError::already_exists("payment", "cs_1").into();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[test]
    fn oracle_errors_never_become_client_faults() {
        let err: ApiError = OracleError::Api {
            status: 429,
            message: "rate limited".into(),
        }
        .into();
        assert!(matches!(err, ApiError::GenerationFailed(_)));
    }
}
