//! Key encoding utilities for `RocksDB`.
//!
//! This module provides functions for encoding and decoding keys used in
//! column families. User IDs and ULIDs are fixed 16-byte values, so
//! composite index keys concatenate without separators; ULID keys sort
//! chronologically.

use chrono::{DateTime, NaiveDate, Utc};

use guia_core::{ReadingId, ToolKind, TransactionId, UserId};

/// Create a user key from a user ID.
#[must_use]
pub fn user_key(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Create a reading key from a reading ID.
#[must_use]
pub fn reading_key(reading_id: &ReadingId) -> Vec<u8> {
    reading_id.to_bytes().to_vec()
}

/// Create a user-reading index key.
///
/// Format: `user_id (16 bytes) || reading_id (16 bytes)`
#[must_use]
pub fn user_reading_key(user_id: &UserId, reading_id: &ReadingId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(user_id.as_bytes());
    key.extend_from_slice(&reading_id.to_bytes());
    key
}

/// Create a transaction key from a transaction ID.
#[must_use]
pub fn transaction_key(transaction_id: &TransactionId) -> Vec<u8> {
    transaction_id.to_bytes().to_vec()
}

/// Create a user-transaction index key.
///
/// Format: `user_id (16 bytes) || transaction_id (16 bytes)`
#[must_use]
pub fn user_transaction_key(user_id: &UserId, transaction_id: &TransactionId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(user_id.as_bytes());
    key.extend_from_slice(&transaction_id.to_bytes());
    key
}

/// Create a prefix for iterating all index entries for a user.
#[must_use]
pub fn user_prefix(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Extract the reading ID from a user-reading index key.
///
/// # Panics
///
/// Panics if the key is not at least 32 bytes.
#[must_use]
pub fn extract_reading_id_from_user_key(key: &[u8]) -> ReadingId {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&key[16..32]);
    ReadingId::from_bytes(bytes)
}

/// Extract the transaction ID from a user-transaction index key.
///
/// # Panics
///
/// Panics if the key is not at least 32 bytes.
#[must_use]
pub fn extract_transaction_id_from_user_key(key: &[u8]) -> TransactionId {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&key[16..32]);
    TransactionId::from_bytes(bytes)
}

/// Create a payment key from the processor transaction ID.
#[must_use]
pub fn payment_key(payment_id: &str) -> Vec<u8> {
    payment_id.as_bytes().to_vec()
}

/// Create a user-payment index key.
///
/// Format: `user_id (16) || created_at millis, big-endian (8) || payment_id`
///
/// Processor IDs are opaque strings with no time ordering, so the creation
/// timestamp supplies the chronological sort.
#[must_use]
pub fn user_payment_key(user_id: &UserId, created_at: DateTime<Utc>, payment_id: &str) -> Vec<u8> {
    let millis = u64::try_from(created_at.timestamp_millis()).unwrap_or(0);
    let mut key = Vec::with_capacity(24 + payment_id.len());
    key.extend_from_slice(user_id.as_bytes());
    key.extend_from_slice(&millis.to_be_bytes());
    key.extend_from_slice(payment_id.as_bytes());
    key
}

/// Extract the payment ID from a user-payment index key.
#[must_use]
pub fn extract_payment_id_from_user_key(key: &[u8]) -> String {
    String::from_utf8_lossy(&key[24.min(key.len())..]).into_owned()
}

/// Create a daily-limit marker key.
///
/// Format: `user_id (16) || tool id || date (yyyy-mm-dd)`
#[must_use]
pub fn daily_reading_key(user_id: &UserId, tool: ToolKind, date: NaiveDate) -> Vec<u8> {
    let date_str = date.format("%Y-%m-%d").to_string();
    let mut key = Vec::with_capacity(16 + tool.as_str().len() + date_str.len());
    key.extend_from_slice(user_id.as_bytes());
    key.extend_from_slice(tool.as_str().as_bytes());
    key.extend_from_slice(date_str.as_bytes());
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_key_length() {
        let user_id = UserId::generate();
        let key = user_key(&user_id);
        assert_eq!(key.len(), 16);
    }

    #[test]
    fn user_reading_key_format() {
        let user_id = UserId::generate();
        let reading_id = ReadingId::generate();
        let key = user_reading_key(&user_id, &reading_id);

        assert_eq!(key.len(), 32);
        assert_eq!(&key[..16], user_id.as_bytes());
        assert_eq!(&key[16..], reading_id.to_bytes());
    }

    #[test]
    fn extract_reading_id_roundtrip() {
        let user_id = UserId::generate();
        let reading_id = ReadingId::generate();
        let key = user_reading_key(&user_id, &reading_id);

        let extracted = extract_reading_id_from_user_key(&key);
        assert_eq!(extracted, reading_id);
    }

    #[test]
    fn extract_transaction_id_roundtrip() {
        let user_id = UserId::generate();
        let tx_id = TransactionId::generate();
        let key = user_transaction_key(&user_id, &tx_id);

        let extracted = extract_transaction_id_from_user_key(&key);
        assert_eq!(extracted, tx_id);
    }

    #[test]
    fn payment_index_key_sorts_by_time() {
        let user_id = UserId::generate();
        let early = Utc::now();
        let late = early + chrono::Duration::seconds(5);

        let a = user_payment_key(&user_id, early, "zzz");
        let b = user_payment_key(&user_id, late, "aaa");
        assert!(a < b);

        assert_eq!(extract_payment_id_from_user_key(&a), "zzz");
        assert_eq!(extract_payment_id_from_user_key(&b), "aaa");
    }

    #[test]
    fn daily_keys_distinguish_tool_and_date() {
        let user_id = UserId::generate();
        let d1 = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2025, 6, 11).unwrap();

        let card = daily_reading_key(&user_id, ToolKind::DailyCard, d1);
        let horoscope = daily_reading_key(&user_id, ToolKind::DailyHoroscope, d1);
        let next_day = daily_reading_key(&user_id, ToolKind::DailyCard, d2);

        assert_ne!(card, horoscope);
        assert_ne!(card, next_day);
    }
}
