//! Point balance, ledger history, and admin grant handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use guia_core::{PointTransaction, TransactionKind, UserId};
use guia_store::Store;

use crate::auth::{AdminAuth, AuthUser};
use crate::error::ApiError;
use crate::state::AppState;

/// Balance response.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// Current point balance.
    pub balance_points: i64,
    /// Lifetime points bought.
    pub lifetime_purchased_points: i64,
    /// Lifetime points granted.
    pub lifetime_granted_points: i64,
    /// Lifetime points spent.
    pub lifetime_spent_points: i64,
}

/// `GET /v1/points/balance` - Current balance and lifetime counters.
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<BalanceResponse>, ApiError> {
    let user = state
        .store
        .get_user(&auth.user_id)?
        .ok_or_else(|| ApiError::NotFound("user".into()))?;

    Ok(Json(BalanceResponse {
        balance_points: user.balance_points,
        lifetime_purchased_points: user.lifetime_purchased_points,
        lifetime_granted_points: user.lifetime_granted_points,
        lifetime_spent_points: user.lifetime_spent_points,
    }))
}

/// Query parameters for transaction listing.
#[derive(Debug, Deserialize)]
pub struct ListTransactionsQuery {
    /// Maximum number of entries to return (capped at 100).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Number of entries to skip.
    #[serde(default)]
    pub offset: usize,
}

const fn default_limit() -> usize {
    50
}

/// API view of a ledger entry.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    /// Transaction ID.
    pub id: String,
    /// Signed point amount.
    pub amount_points: i64,
    /// Entry kind.
    pub kind: TransactionKind,
    /// Balance after this entry.
    pub balance_after_points: i64,
    /// Human-readable description (Portuguese).
    pub description: String,
    /// Reading or payment ID this entry refers to.
    pub reference: Option<String>,
    /// Entry time (RFC 3339).
    pub created_at: String,
}

impl From<&PointTransaction> for TransactionResponse {
    fn from(tx: &PointTransaction) -> Self {
        Self {
            id: tx.id.to_string(),
            amount_points: tx.amount_points,
            kind: tx.kind,
            balance_after_points: tx.balance_after_points,
            description: tx.description.clone(),
            reference: tx.reference.clone(),
            created_at: tx.created_at.to_rfc3339(),
        }
    }
}

/// Transaction list response.
#[derive(Debug, Serialize)]
pub struct TransactionListResponse {
    /// Entries, newest first.
    pub transactions: Vec<TransactionResponse>,
    /// Whether more entries exist past this page.
    pub has_more: bool,
}

/// `GET /v1/points/transactions` - Paginated ledger history, newest first.
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<Json<TransactionListResponse>, ApiError> {
    let limit = query.limit.clamp(1, 100);

    // Fetch one past the page to learn whether more entries exist.
    let mut transactions = state
        .store
        .list_transactions_by_user(&auth.user_id, limit + 1, query.offset)?;

    let has_more = transactions.len() > limit;
    transactions.truncate(limit);

    Ok(Json(TransactionListResponse {
        transactions: transactions.iter().map(TransactionResponse::from).collect(),
        has_more,
    }))
}

/// Request body for manual grants.
#[derive(Debug, Deserialize)]
pub struct GrantPointsRequest {
    /// Target user.
    pub user_id: String,
    /// Points to credit (must be positive).
    pub amount_points: i64,
    /// Reason recorded in the ledger entry.
    pub reason: String,
}

/// Grant response.
#[derive(Debug, Serialize)]
pub struct GrantPointsResponse {
    /// Balance after the grant.
    pub balance_points: i64,
    /// The ledger entry created.
    pub transaction_id: String,
}

/// `POST /v1/points/grant` - Manually credit points (support refunds).
///
/// Admin-only; appends a `Refund` ledger entry.
pub async fn grant_points(
    State(state): State<Arc<AppState>>,
    admin: AdminAuth,
    Json(req): Json<GrantPointsRequest>,
) -> Result<Json<GrantPointsResponse>, ApiError> {
    let user_id = req
        .user_id
        .parse::<UserId>()
        .map_err(|_| ApiError::BadRequest("invalid user_id".into()))?;

    if req.amount_points <= 0 {
        return Err(ApiError::BadRequest(
            "amount_points must be positive".into(),
        ));
    }
    if req.reason.trim().is_empty() {
        return Err(ApiError::BadRequest("reason is required".into()));
    }

    // balance_after is recomputed by the store inside its critical section.
    let transaction = PointTransaction::refund(user_id, req.amount_points, 0, req.reason.clone());
    let balance = state
        .store
        .credit_points(&user_id, req.amount_points, &transaction)?;

    tracing::info!(
        admin_id = %admin.admin_id,
        user_id = %user_id,
        amount_points = req.amount_points,
        reason = %req.reason,
        "Points granted"
    );

    Ok(Json(GrantPointsResponse {
        balance_points: balance,
        transaction_id: transaction.id.to_string(),
    }))
}
