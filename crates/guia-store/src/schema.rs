//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Primary user records, keyed by `user_id`.
    pub const USERS: &str = "users";

    /// Reading artifacts, keyed by `reading_id` (ULID).
    pub const READINGS: &str = "readings";

    /// Index: readings by user, keyed by `user_id || reading_id`.
    /// Value is empty (index only).
    pub const READINGS_BY_USER: &str = "readings_by_user";

    /// Point-ledger transactions, keyed by `transaction_id` (ULID).
    pub const TRANSACTIONS: &str = "transactions";

    /// Index: transactions by user, keyed by `user_id || transaction_id`.
    /// Value is empty (index only).
    pub const TRANSACTIONS_BY_USER: &str = "transactions_by_user";

    /// Pending payments, keyed by the processor transaction ID.
    pub const PAYMENTS: &str = "payments";

    /// Index: payments by user, keyed by
    /// `user_id || created_at_millis || payment_id`. Value is empty.
    pub const PAYMENTS_BY_USER: &str = "payments_by_user";

    /// Daily-limit markers, keyed by `user_id || tool || date`.
    /// Value is the reading ID that consumed the day.
    pub const DAILY_READINGS: &str = "daily_readings";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::USERS,
        cf::READINGS,
        cf::READINGS_BY_USER,
        cf::TRANSACTIONS,
        cf::TRANSACTIONS_BY_USER,
        cf::PAYMENTS,
        cf::PAYMENTS_BY_USER,
        cf::DAILY_READINGS,
    ]
}
