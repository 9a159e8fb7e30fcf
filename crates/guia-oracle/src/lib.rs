//! Generative-AI adapter for the Guia do Coração backend.
//!
//! Every reading delivered by the service is produced by an *oracle*: a
//! chat-completion backend wrapped behind the [`Oracle`] trait. The trait
//! keeps the service handlers independent of the concrete provider, which
//! makes readings testable without network access (see [`mock::MockOracle`]).
//!
//! The crate also owns the Portuguese prompt builders ([`prompt`]) and the
//! canned fallback texts ([`fallback`]) used when the provider answers with
//! an empty completion.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod client;
pub mod fallback;
pub mod mock;
pub mod prompt;

pub use client::{ChatOracle, OracleConfig};
pub use prompt::Prompt;

use async_trait::async_trait;
use guia_core::ToolKind;
use thiserror::Error;

/// A request for one generated reading.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Tool the reading belongs to. Selects the fallback text when the
    /// provider returns a blank completion.
    pub tool: ToolKind,
    /// System and user prompt pair, already rendered in Portuguese.
    pub prompt: Prompt,
}

impl GenerationRequest {
    /// Builds a request for `tool` from an assembled prompt.
    #[must_use]
    pub fn new(tool: ToolKind, prompt: Prompt) -> Self {
        Self { tool, prompt }
    }
}

/// A generated reading.
#[derive(Debug, Clone)]
pub struct Generation {
    /// The reading text, in Portuguese.
    pub content: String,
    /// True when `content` is the canned fallback rather than a completion.
    pub fallback: bool,
}

/// Errors returned by oracle implementations.
///
/// An `Err` means no usable text was produced and the caller must not
/// charge the user. A blank completion is *not* an error: implementations
/// substitute the tool's fallback text and flag it via
/// [`Generation::fallback`].
#[derive(Debug, Error)]
pub enum OracleError {
    /// The provider could not be reached or the response body was invalid.
    #[error("oracle request failed: {0}")]
    Http(String),

    /// The provider answered with a non-success status.
    #[error("oracle rejected request ({status}): {message}")]
    Api {
        /// HTTP status code returned by the provider.
        status: u16,
        /// Provider error message, when one was supplied.
        message: String,
    },

    /// The oracle is not configured (missing API key or URL).
    #[error("oracle is not configured: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for OracleError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}

/// Port for generating reading content.
///
/// Implementations must be cheap to share across request handlers.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Generates one reading for `request`.
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation, OracleError>;
}
