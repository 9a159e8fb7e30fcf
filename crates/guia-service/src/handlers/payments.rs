//! Payment handlers: Stripe Checkout, PIX charges, and purchase history.
//!
//! Both purchase paths write a `PendingPayment` keyed by the processor's
//! transaction ID before the buyer ever pays. Settlement (webhook or PIX
//! poll) looks that record up and calls the store's `settle_payment`,
//! which flips Pending to Paid exactly once; the credited amount always
//! comes from the stored record, never from processor payloads.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use guia_core::{PaymentProvider, PendingPayment, PointPackage, PointTransaction};
use guia_store::{Settlement, Store};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;
use crate::stripe::StripeError;

/// Request body for starting a purchase.
#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    /// Catalog package to buy.
    pub package_id: String,
}

/// Checkout session response.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    /// Pending-payment ID (the Stripe session ID).
    pub payment_id: String,
    /// Hosted checkout URL to redirect the buyer to.
    pub checkout_url: String,
}

/// `POST /v1/payments/checkout` - Start a Stripe Checkout purchase.
pub async fn create_checkout(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(req): Json<PurchaseRequest>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let package = PointPackage::find(&req.package_id)
        .ok_or_else(|| ApiError::BadRequest(format!("unknown package: {}", req.package_id)))?;

    let stripe = state
        .stripe
        .as_ref()
        .ok_or_else(|| ApiError::ExternalService("Stripe is not configured".into()))?;

    let mut user = state
        .store
        .get_user(&auth.user_id)?
        .ok_or_else(|| ApiError::NotFound("user".into()))?;

    // Create the Stripe customer lazily so return purchases share one.
    if user.stripe_customer_id.is_none() {
        match stripe
            .create_customer(&auth.user_id.to_string(), user.profile.display_name.as_deref())
            .await
        {
            Ok(customer) => {
                user.stripe_customer_id = Some(customer.id);
                user.updated_at = chrono::Utc::now();
                state.store.put_user(&user)?;
            }
            Err(e) => {
                // Checkout works without a customer; don't fail the purchase.
                tracing::warn!(user_id = %auth.user_id, error = %e, "Failed to create Stripe customer");
            }
        }
    }

    let success_url = format!(
        "{}/pontos/sucesso?session_id={{CHECKOUT_SESSION_ID}}",
        state.config.frontend_url
    );
    let cancel_url = format!("{}/pontos/cancelado", state.config.frontend_url);

    let session = stripe
        .create_checkout_session(
            user.stripe_customer_id.as_deref(),
            &auth.user_id.to_string(),
            package,
            &success_url,
            &cancel_url,
        )
        .await?;

    let checkout_url = session.url.ok_or(StripeError::MissingUrl)?;

    let pending = PendingPayment::new(session.id, auth.user_id, PaymentProvider::Stripe, package);
    state.store.put_payment(&pending)?;

    tracing::info!(
        user_id = %auth.user_id,
        payment_id = %pending.payment_id,
        package_id = %package.id,
        amount_cents = package.price_cents,
        "Checkout session created"
    );

    Ok(Json(CheckoutResponse {
        payment_id: pending.payment_id,
        checkout_url,
    }))
}

/// PIX charge response.
#[derive(Debug, Serialize)]
pub struct PixChargeResponse {
    /// Pending-payment ID (the PIX `txid`).
    pub payment_id: String,
    /// "Copia e cola" BR Code.
    pub qr_code: String,
    /// Base64 `data:` URI with the QR image.
    pub qr_code_image: String,
    /// Price in centavos.
    pub amount_cents: i64,
    /// Points credited on payment.
    pub points: i64,
    /// Seconds until the charge expires.
    pub expires_in_seconds: u64,
}

/// `POST /v1/payments/pix` - Create a PIX charge for a package.
pub async fn create_pix_charge(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(req): Json<PurchaseRequest>,
) -> Result<Json<PixChargeResponse>, ApiError> {
    let package = PointPackage::find(&req.package_id)
        .ok_or_else(|| ApiError::BadRequest(format!("unknown package: {}", req.package_id)))?;

    let pix = state
        .pix
        .as_ref()
        .ok_or_else(|| ApiError::ExternalService("PIX is not configured".into()))?;

    // The account must exist before we take money for it.
    state
        .store
        .get_user(&auth.user_id)?
        .ok_or_else(|| ApiError::NotFound("user".into()))?;

    // 32 hex chars, inside the 26-35 alphanumeric window txids allow.
    let txid = uuid::Uuid::new_v4().simple().to_string();
    let description = format!("Guia do Coração — {}", package.label);

    let charge = pix
        .create_charge(&txid, package.price_cents, &description)
        .await?;

    let location = charge
        .loc
        .ok_or_else(|| ApiError::ExternalService("PIX charge has no location".into()))?;
    let qr = pix.get_qr_code(location.id).await?;

    let pending = PendingPayment::new(txid, auth.user_id, PaymentProvider::Pix, package);
    state.store.put_payment(&pending)?;

    tracing::info!(
        user_id = %auth.user_id,
        payment_id = %pending.payment_id,
        package_id = %package.id,
        amount_cents = package.price_cents,
        "PIX charge created"
    );

    Ok(Json(PixChargeResponse {
        payment_id: pending.payment_id,
        qr_code: qr.qrcode,
        qr_code_image: qr.image,
        amount_cents: package.price_cents,
        points: package.points,
        expires_in_seconds: 3600,
    }))
}

/// PIX status response.
#[derive(Debug, Serialize)]
pub struct PixStatusResponse {
    /// Pending-payment ID.
    pub payment_id: String,
    /// `"pending"` or `"paid"`.
    pub status: String,
    /// Points this payment credits.
    pub points: i64,
    /// Balance after settlement; present once paid.
    pub balance_points: Option<i64>,
}

/// `GET /v1/payments/pix/{txid}` - Poll a PIX charge.
///
/// When the charge is still pending locally, asks the PIX API and settles
/// on the spot if the payment went through. The webhook usually wins this
/// race; `settle_payment` makes the loser a no-op.
pub async fn get_pix_charge(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(txid): Path<String>,
) -> Result<Json<PixStatusResponse>, ApiError> {
    let payment = state
        .store
        .get_payment(&txid)?
        .filter(|p| p.user_id == auth.user_id)
        .ok_or_else(|| ApiError::NotFound("payment".into()))?;

    if payment.is_paid() {
        let user = state
            .store
            .get_user(&auth.user_id)?
            .ok_or_else(|| ApiError::NotFound("user".into()))?;
        return Ok(Json(PixStatusResponse {
            payment_id: payment.payment_id,
            status: "paid".into(),
            points: payment.points,
            balance_points: Some(user.balance_points),
        }));
    }

    let Some(pix) = state.pix.as_ref() else {
        return Ok(Json(pending_status(&payment)));
    };

    let charge = pix.get_charge(&txid).await?;
    if !charge.status.is_paid() {
        return Ok(Json(pending_status(&payment)));
    }

    let balance = match settle(&state, &payment)? {
        Settlement::Credited { new_balance } => new_balance,
        Settlement::AlreadySettled => {
            state
                .store
                .get_user(&auth.user_id)?
                .ok_or_else(|| ApiError::NotFound("user".into()))?
                .balance_points
        }
    };

    Ok(Json(PixStatusResponse {
        payment_id: payment.payment_id,
        status: "paid".into(),
        points: payment.points,
        balance_points: Some(balance),
    }))
}

fn pending_status(payment: &PendingPayment) -> PixStatusResponse {
    PixStatusResponse {
        payment_id: payment.payment_id.clone(),
        status: "pending".into(),
        points: payment.points,
        balance_points: None,
    }
}

/// API view of a payment.
#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    /// Pending-payment ID.
    pub payment_id: String,
    /// `"stripe"` or `"pix"`.
    pub provider: &'static str,
    /// Package bought.
    pub package_id: String,
    /// Points credited on settlement.
    pub points: i64,
    /// Price in centavos.
    pub amount_cents: i64,
    /// `"pending"` or `"paid"`.
    pub status: String,
    /// Creation time (RFC 3339).
    pub created_at: String,
    /// Settlement time (RFC 3339), once paid.
    pub paid_at: Option<String>,
}

impl From<&PendingPayment> for PaymentResponse {
    fn from(payment: &PendingPayment) -> Self {
        Self {
            payment_id: payment.payment_id.clone(),
            provider: payment.provider.as_str(),
            package_id: payment.package_id.clone(),
            points: payment.points,
            amount_cents: payment.amount_cents,
            status: if payment.is_paid() { "paid" } else { "pending" }.into(),
            created_at: payment.created_at.to_rfc3339(),
            paid_at: payment.paid_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Query parameters for payment history.
#[derive(Debug, Deserialize)]
pub struct ListPaymentsQuery {
    /// Maximum number of payments to return (capped at 100).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Number of payments to skip.
    #[serde(default)]
    pub offset: usize,
}

const fn default_limit() -> usize {
    20
}

/// Payment list response.
#[derive(Debug, Serialize)]
pub struct PaymentListResponse {
    /// Payments, newest first.
    pub payments: Vec<PaymentResponse>,
    /// Whether more payments exist past this page.
    pub has_more: bool,
}

/// `GET /v1/payments` - Paginated payment history, newest first.
pub async fn list_payments(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<ListPaymentsQuery>,
) -> Result<Json<PaymentListResponse>, ApiError> {
    let limit = query.limit.clamp(1, 100);

    let mut payments = state
        .store
        .list_payments_by_user(&auth.user_id, limit + 1, query.offset)?;

    let has_more = payments.len() > limit;
    payments.truncate(limit);

    Ok(Json(PaymentListResponse {
        payments: payments.iter().map(PaymentResponse::from).collect(),
        has_more,
    }))
}

/// Settle a pending payment: build the purchase ledger entry and hand it
/// to the store, which credits exactly once. Shared by the PIX poll and
/// both webhooks.
pub(crate) fn settle(state: &AppState, payment: &PendingPayment) -> Result<Settlement, ApiError> {
    let label = PointPackage::find(&payment.package_id)
        .map_or_else(|| payment.package_id.clone(), |p| p.label.to_string());

    // balance_after is recomputed by the store inside its critical section.
    let transaction = PointTransaction::purchase(
        payment.user_id,
        payment.points,
        0,
        &payment.payment_id,
        format!("Compra: {label}"),
    );

    let settlement = state.store.settle_payment(&payment.payment_id, &transaction)?;

    match settlement {
        Settlement::Credited { new_balance } => {
            tracing::info!(
                user_id = %payment.user_id,
                payment_id = %payment.payment_id,
                points = payment.points,
                balance_points = new_balance,
                "Payment settled"
            );
        }
        Settlement::AlreadySettled => {
            tracing::info!(
                payment_id = %payment.payment_id,
                "Payment already settled; ignoring replay"
            );
        }
    }

    Ok(settlement)
}
