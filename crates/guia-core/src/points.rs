//! Point-ledger transaction types.
//!
//! Every balance change appends exactly one ledger entry. Entries are
//! immutable once written; history is the sum of entries, never an edit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ReadingId, ToolKind, TransactionId, UserId};

/// A point-ledger entry representing one balance change.
///
/// Entries use ULIDs so listing a user's history in key order is
/// chronological.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointTransaction {
    /// Unique transaction ID (ULID for time-ordering).
    pub id: TransactionId,

    /// The user whose balance was affected.
    pub user_id: UserId,

    /// Amount in points. Positive = credit, negative = debit.
    pub amount_points: i64,

    /// Kind of transaction.
    pub kind: TransactionKind,

    /// Balance after this transaction.
    pub balance_after_points: i64,

    /// What this entry refers to: a payment transaction ID for purchases,
    /// a reading ID for tool usage.
    pub reference: Option<String>,

    /// Human-readable description.
    pub description: String,

    /// Additional metadata (tool, package, provider, etc.).
    pub metadata: serde_json::Value,

    /// When the transaction was created.
    pub created_at: DateTime<Utc>,
}

impl PointTransaction {
    /// Create a purchase entry for a settled payment.
    #[must_use]
    pub fn purchase(
        user_id: UserId,
        amount_points: i64,
        balance_after_points: i64,
        payment_id: &str,
        description: String,
    ) -> Self {
        Self {
            id: TransactionId::generate(),
            user_id,
            amount_points,
            kind: TransactionKind::Purchase,
            balance_after_points,
            reference: Some(payment_id.to_string()),
            description,
            metadata: serde_json::Value::Null,
            created_at: Utc::now(),
        }
    }

    /// Create a tool-usage entry (deduction).
    #[must_use]
    pub fn tool_usage(
        user_id: UserId,
        amount_points: i64,
        balance_after_points: i64,
        tool: ToolKind,
        reading_id: ReadingId,
    ) -> Self {
        Self {
            id: TransactionId::generate(),
            user_id,
            amount_points: -amount_points.abs(), // Always negative for usage
            kind: TransactionKind::ToolUsage,
            balance_after_points,
            reference: Some(reading_id.to_string()),
            description: format!("Leitura: {}", tool.label_pt()),
            metadata: serde_json::json!({ "tool": tool.as_str() }),
            created_at: Utc::now(),
        }
    }

    /// Create the welcome-bonus entry granted on account creation.
    #[must_use]
    pub fn welcome(user_id: UserId, amount_points: i64) -> Self {
        Self {
            id: TransactionId::generate(),
            user_id,
            amount_points,
            kind: TransactionKind::Welcome,
            balance_after_points: amount_points,
            reference: None,
            description: "Bônus de boas-vindas".to_string(),
            metadata: serde_json::Value::Null,
            created_at: Utc::now(),
        }
    }

    /// Create a refund/support-grant entry.
    #[must_use]
    pub fn refund(
        user_id: UserId,
        amount_points: i64,
        balance_after_points: i64,
        reason: String,
    ) -> Self {
        Self {
            id: TransactionId::generate(),
            user_id,
            amount_points,
            kind: TransactionKind::Refund,
            balance_after_points,
            reference: None,
            description: reason,
            metadata: serde_json::Value::Null,
            created_at: Utc::now(),
        }
    }
}

/// Kind of ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// User bought points (Stripe or PIX).
    Purchase,

    /// Points deducted for a reading.
    ToolUsage,

    /// Welcome bonus on account creation.
    Welcome,

    /// Manual refund or support grant.
    Refund,
}

impl TransactionKind {
    /// Check if this kind adds points (positive balance change).
    #[must_use]
    pub const fn is_credit(&self) -> bool {
        matches!(self, Self::Purchase | Self::Welcome | Self::Refund)
    }

    /// Check if this kind removes points (negative balance change).
    #[must_use]
    pub const fn is_debit(&self) -> bool {
        matches!(self, Self::ToolUsage)
    }
}
