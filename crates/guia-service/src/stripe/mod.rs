//! Stripe API integration for card checkout.

pub mod client;
pub mod types;

pub use client::{StripeClient, StripeError};
pub use types::{CheckoutSession, Customer};
