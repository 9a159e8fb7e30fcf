//! `RocksDB` storage layer for the Guia do Coração backend.
//!
//! This crate provides persistent storage for users, readings, the point
//! ledger, and pending payments using `RocksDB` with column families.
//!
//! # Architecture
//!
//! The storage uses the following column families:
//!
//! - `users`: Primary user records, keyed by `user_id`
//! - `readings` / `readings_by_user`: Reading artifacts plus a per-user index
//! - `transactions` / `transactions_by_user`: The append-only point ledger
//! - `payments` / `payments_by_user`: Pending payments keyed by processor ID
//! - `daily_readings`: One marker per (user, tool, Brasília date)
//!
//! Compound operations (`record_reading`, `credit_points`, `settle_payment`)
//! re-check their preconditions under the store's write lock and commit all
//! row changes in a single `WriteBatch`, so a balance change and its ledger
//! entry land together or not at all.
//!
//! # Example
//!
//! ```no_run
//! use guia_store::{RocksStore, Store};
//! use guia_core::{User, UserId};
//!
//! let store = RocksStore::open("/tmp/guia-db").unwrap();
//!
//! let user_id = UserId::generate();
//! let user = User::new(user_id);
//! store.create_user(&user, None).unwrap();
//!
//! let retrieved = store.get_user(&user_id).unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod rocks;
pub mod schema;

pub use error::{Result, StoreError};
pub use rocks::RocksStore;

use chrono::NaiveDate;

use guia_core::{
    PendingPayment, PointTransaction, Reading, ReadingId, ToolKind, TransactionId, User, UserId,
};

/// Outcome of a payment settlement attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// The payment transitioned to `Paid` and points were credited.
    Credited {
        /// Balance after the credit.
        new_balance: i64,
    },

    /// The payment was already `Paid`; nothing changed.
    AlreadySettled,
}

/// The storage trait defining all database operations.
///
/// This trait abstracts the storage layer, allowing for different
/// implementations (e.g., `RocksDB`, in-memory for testing).
pub trait Store: Send + Sync {
    // =========================================================================
    // User Operations
    // =========================================================================

    /// Create a user record, optionally together with its opening
    /// welcome-bonus ledger entry.
    ///
    /// The caller prepares the opening balance on the user and the matching
    /// entry; both are written in one batch.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::AlreadyExists` if the user exists.
    fn create_user(&self, user: &User, welcome: Option<&PointTransaction>) -> Result<()>;

    /// Insert or update a user record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_user(&self, user: &User) -> Result<()>;

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_user(&self, user_id: &UserId) -> Result<Option<User>>;

    // =========================================================================
    // Reading Operations
    // =========================================================================

    /// Get a reading by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_reading(&self, reading_id: &ReadingId) -> Result<Option<Reading>>;

    /// List readings for a user, ordered by time (newest first).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_readings_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Reading>>;

    /// Check whether a daily-limited tool was already used on `date`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn has_daily_reading(&self, user_id: &UserId, tool: ToolKind, date: NaiveDate) -> Result<bool>;

    // =========================================================================
    // Ledger Operations
    // =========================================================================

    /// Get a ledger transaction by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_transaction(&self, transaction_id: &TransactionId) -> Result<Option<PointTransaction>>;

    /// List ledger transactions for a user, ordered by time (newest first).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_transactions_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<PointTransaction>>;

    // =========================================================================
    // Payment Operations
    // =========================================================================

    /// Insert a pending payment.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::AlreadyExists` if the processor ID was seen
    /// before.
    fn put_payment(&self, payment: &PendingPayment) -> Result<()>;

    /// Get a payment by its processor transaction ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_payment(&self, payment_id: &str) -> Result<Option<PendingPayment>>;

    /// List payments for a user, ordered by time (newest first).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_payments_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<PendingPayment>>;

    // =========================================================================
    // Compound Operations
    // =========================================================================

    /// Record a reading: re-check the balance (and the daily limit for
    /// daily-limited tools), deduct points, store the reading, append the
    /// ledger entry, and write the daily marker, all atomically.
    ///
    /// The transaction's `balance_after_points` is overwritten with the
    /// post-deduction balance computed inside the critical section.
    ///
    /// Returns the new balance after deduction.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the user doesn't exist.
    /// - `StoreError::InsufficientPoints` if the balance is too low.
    /// - `StoreError::DailyLimitReached` if the tool was already used on
    ///   `date`.
    fn record_reading(
        &self,
        reading: &Reading,
        transaction: &PointTransaction,
        date: NaiveDate,
    ) -> Result<i64>;

    /// Add points to a user and record the ledger entry atomically.
    ///
    /// The transaction's `balance_after_points` is overwritten with the
    /// post-credit balance.
    ///
    /// Returns the new balance after addition.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the user doesn't exist.
    fn credit_points(
        &self,
        user_id: &UserId,
        amount_points: i64,
        transaction: &PointTransaction,
    ) -> Result<i64>;

    /// Settle a pending payment exactly once: mark it `Paid`, credit its
    /// points to the owner, and append the purchase ledger entry atomically.
    ///
    /// Replays return `Settlement::AlreadySettled` without touching
    /// anything, which is what makes webhook retries and webhook/poll races
    /// safe.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the payment or its owner doesn't
    /// exist.
    fn settle_payment(&self, payment_id: &str, transaction: &PointTransaction)
        -> Result<Settlement>;
}
