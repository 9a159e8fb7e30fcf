//! Guia do Coração HTTP API Service.
//!
//! This crate provides the HTTP API for the Guia do Coração backend,
//! including:
//!
//! - User accounts and spiritual profiles
//! - Cosmic point balance and transaction history
//! - Mystical readings (tarot, horoscope, birth chart, numerology, dreams)
//! - Point purchases via Stripe Checkout and PIX
//! - Payment webhooks
//!
//! # Authentication
//!
//! End-user requests carry a JWT from the identity provider; admin
//! operations use the `x-admin-key` header.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Some handlers need async for consistency

pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod guard;
pub mod handlers;
pub mod pix;
pub mod routes;
pub mod state;
pub mod stripe;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use pix::{PixClient, PixError};
pub use routes::create_router;
pub use state::AppState;
pub use stripe::{StripeClient, StripeError};
