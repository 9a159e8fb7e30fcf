//! PIX API integration for instant BRL payments.

pub mod client;
pub mod types;

pub use client::{PixClient, PixError};
pub use types::{Charge, ChargeStatus, QrCode, WebhookPayload};
