//! PIX API wire types (cob charges, QR codes, webhook payloads).
//!
//! Field names follow the Banco Central API, which speaks Portuguese;
//! serde renames keep the Rust side conventional.

use serde::Deserialize;

/// OAuth token response.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    /// Bearer token for subsequent calls.
    pub access_token: String,

    /// Token lifetime in seconds.
    pub expires_in: u64,
}

/// An immediate charge ("cob").
#[derive(Debug, Clone, Deserialize)]
pub struct Charge {
    /// Charge transaction ID; our pending-payment key.
    pub txid: String,

    /// Current charge status.
    pub status: ChargeStatus,

    /// Payment location, used to fetch the QR code.
    #[serde(default)]
    pub loc: Option<Location>,
}

/// Lifecycle of a cob charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChargeStatus {
    /// Waiting for payment.
    Ativa,
    /// Paid.
    Concluida,
    /// Cancelled by the receiver.
    RemovidaPeloUsuarioRecebedor,
    /// Cancelled by the PSP.
    RemovidaPeloPsp,
    /// Any status introduced after this enum was written.
    #[serde(other)]
    Unknown,
}

impl ChargeStatus {
    /// Whether the charge was paid.
    #[must_use]
    pub const fn is_paid(&self) -> bool {
        matches!(self, Self::Concluida)
    }
}

/// Payment location attached to a charge.
#[derive(Debug, Clone, Deserialize)]
pub struct Location {
    /// Location ID, used in the QR code endpoint path.
    pub id: i64,

    /// Location URL embedded in the QR code.
    #[serde(default)]
    pub location: Option<String>,
}

/// QR code for a charge location.
#[derive(Debug, Clone, Deserialize)]
pub struct QrCode {
    /// The "copia e cola" BR Code string.
    pub qrcode: String,

    /// Base64 `data:` URI with the QR image.
    #[serde(rename = "imagemQrcode")]
    pub image: String,
}

/// Webhook payload: a batch of received payments.
#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    /// Payments being notified.
    pub pix: Vec<ReceivedPix>,
}

/// One received payment inside a webhook batch.
#[derive(Debug, Deserialize)]
pub struct ReceivedPix {
    /// The charge this payment settles.
    pub txid: String,

    /// End-to-end bank transaction ID.
    #[serde(rename = "endToEndId", default)]
    pub end_to_end_id: Option<String>,

    /// Amount paid, as a decimal BRL string. Informational only; credited
    /// points always come from the stored pending payment.
    #[serde(rename = "valor", default)]
    pub amount: Option<String>,
}

/// Error body shapes the PIX providers use: the Banco Central RFC-7807
/// style (`detail`) and the legacy style (`mensagem`).
#[derive(Debug, Deserialize)]
pub struct PixErrorBody {
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    mensagem: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

impl PixErrorBody {
    /// Best available human-readable message.
    #[must_use]
    pub fn message(self) -> Option<String> {
        self.detail.or(self.mensagem).or(self.title)
    }
}
