//! Core types and utilities for the Guia do Coração backend.
//!
//! This crate provides the foundational types used throughout the platform:
//!
//! - **Identifiers**: `UserId`, `ReadingId`, `TransactionId`
//! - **Users**: `User`, `UserProfile`, `FocusArea`
//! - **Points**: `PointTransaction`, `TransactionKind`
//! - **Readings**: `Reading`, `ToolKind`
//! - **Payments**: `PendingPayment`, `PointPackage`
//! - **Mystic helpers**: zodiac signs, numerology reduction, tarot deck
//!
//! # Cosmic Points
//!
//! Points are the in-app currency spent on readings. Balances and ledger
//! amounts are stored as `i64` whole points; money only appears on the
//! payment side, as BRL centavos (`amount_cents`), also `i64`.
//!
//! - User buys the 120-point pack for R$ 19,90 → balance +120
//! - A tarot reading costs 7 points → balance -7

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod ids;
pub mod numerology;
pub mod payment;
pub mod points;
pub mod reading;
pub mod tarot;
pub mod time;
pub mod user;
pub mod zodiac;

pub use ids::{IdError, ReadingId, TransactionId, UserId};
pub use payment::{PaymentProvider, PaymentStatus, PendingPayment, PointPackage};
pub use points::{PointTransaction, TransactionKind};
pub use reading::{Reading, ToolKind};
pub use user::{FocusArea, User, UserProfile, WELCOME_BONUS_POINTS};
pub use zodiac::ZodiacSign;
