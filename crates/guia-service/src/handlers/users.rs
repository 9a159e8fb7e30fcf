//! Account handlers: creation, profile, onboarding.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use guia_core::{PointTransaction, User, UserProfile};
use guia_store::{Store, StoreError};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// API view of a user account.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// The user ID.
    pub user_id: String,
    /// Current point balance.
    pub balance_points: i64,
    /// Lifetime points bought.
    pub lifetime_purchased_points: i64,
    /// Lifetime points granted (welcome bonus, refunds).
    pub lifetime_granted_points: i64,
    /// Lifetime points spent on readings.
    pub lifetime_spent_points: i64,
    /// Whether onboarding was completed.
    pub onboarding_complete: bool,
    /// Personalization answers.
    pub profile: UserProfile,
    /// Account creation time (RFC 3339).
    pub created_at: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.user_id.to_string(),
            balance_points: user.balance_points,
            lifetime_purchased_points: user.lifetime_purchased_points,
            lifetime_granted_points: user.lifetime_granted_points,
            lifetime_spent_points: user.lifetime_spent_points,
            onboarding_complete: user.onboarding_complete,
            profile: user.profile.clone(),
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// `POST /v1/users` - Ensure the authenticated user has an account.
///
/// First sign-in creates the account and grants the welcome bonus as a
/// single ledger entry; later calls return the existing account
/// unchanged, so the frontend can fire this on every login.
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    if let Some(existing) = state.store.get_user(&auth.user_id)? {
        return Ok(Json(UserResponse::from(&existing)));
    }

    let mut user = User::new(auth.user_id);
    let bonus = state.config.welcome_bonus_points;
    let welcome = if bonus > 0 {
        user.balance_points = bonus;
        user.lifetime_granted_points = bonus;
        Some(PointTransaction::welcome(auth.user_id, bonus))
    } else {
        None
    };

    match state.store.create_user(&user, welcome.as_ref()) {
        Ok(()) => {
            tracing::info!(
                user_id = %auth.user_id,
                welcome_points = bonus,
                "User created"
            );
            Ok(Json(UserResponse::from(&user)))
        }
        // Lost a first-sign-in race; the other request's account wins.
        Err(StoreError::AlreadyExists { .. }) => {
            let existing = state
                .store
                .get_user(&auth.user_id)?
                .ok_or_else(|| ApiError::Internal("user vanished after creation race".into()))?;
            Ok(Json(UserResponse::from(&existing)))
        }
        Err(e) => Err(e.into()),
    }
}

/// `GET /v1/users/me` - Fetch the authenticated user's account.
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .store
        .get_user(&auth.user_id)?
        .ok_or_else(|| ApiError::NotFound("user".into()))?;

    Ok(Json(UserResponse::from(&user)))
}

/// `PUT /v1/users/me/profile` - Replace the personalization profile.
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(profile): Json<UserProfile>,
) -> Result<Json<UserResponse>, ApiError> {
    let mut user = state
        .store
        .get_user(&auth.user_id)?
        .ok_or_else(|| ApiError::NotFound("user".into()))?;

    user.profile = profile;
    user.updated_at = Utc::now();
    state.store.put_user(&user)?;

    tracing::info!(user_id = %auth.user_id, "Profile updated");

    Ok(Json(UserResponse::from(&user)))
}

/// `POST /v1/users/me/onboarding` - Save onboarding answers and mark the
/// questionnaire complete.
///
/// Idempotent: re-submitting replaces the answers and leaves the flag set.
pub async fn complete_onboarding(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(profile): Json<UserProfile>,
) -> Result<Json<UserResponse>, ApiError> {
    let mut user = state
        .store
        .get_user(&auth.user_id)?
        .ok_or_else(|| ApiError::NotFound("user".into()))?;

    user.profile = profile;
    user.onboarding_complete = true;
    user.updated_at = Utc::now();
    state.store.put_user(&user)?;

    tracing::info!(user_id = %auth.user_id, "Onboarding completed");

    Ok(Json(UserResponse::from(&user)))
}
