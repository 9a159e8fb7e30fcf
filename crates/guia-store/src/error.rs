//! Error types for the storage layer.

use chrono::NaiveDate;

use guia_core::ToolKind;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Record not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// What kind of record was missing.
        entity: &'static str,
        /// The key that was looked up.
        id: String,
    },

    /// Record already exists (creation is not idempotent at this layer).
    #[error("{entity} already exists: {id}")]
    AlreadyExists {
        /// What kind of record collided.
        entity: &'static str,
        /// The key that collided.
        id: String,
    },

    /// Insufficient points for a deduction.
    #[error("insufficient points: balance={balance}, required={required}")]
    InsufficientPoints {
        /// Current balance in points.
        balance: i64,
        /// Required amount in points.
        required: i64,
    },

    /// A daily-limited tool was already used on this date.
    #[error("daily limit reached for {tool} on {date}")]
    DailyLimitReached {
        /// The tool that hit its limit.
        tool: ToolKind,
        /// The Brasília date the limit applies to.
        date: NaiveDate,
    },
}

impl StoreError {
    /// Shorthand for a `NotFound` error.
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Shorthand for an `AlreadyExists` error.
    #[must_use]
    pub fn already_exists(entity: &'static str, id: impl Into<String>) -> Self {
        Self::AlreadyExists {
            entity,
            id: id.into(),
        }
    }
}
