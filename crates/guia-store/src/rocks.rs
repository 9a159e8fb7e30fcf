//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store`
//! trait. Compound operations serialize through a store-wide write lock so
//! the precondition checks and the `WriteBatch` commit cannot interleave
//! with another writer.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::NaiveDate;
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded,
    Options, WriteBatch,
};

use guia_core::{
    PaymentStatus, PendingPayment, PointTransaction, Reading, ReadingId, ToolKind, TransactionId,
    TransactionKind, User, UserId,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::{Settlement, Store};

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    write_lock: Mutex<()>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Mutex::new(()),
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Take the store-wide write lock for a read-modify-write section.
    fn write_guard(&self) -> MutexGuard<'_, ()> {
        self.write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Collect index keys under `prefix`, newest first, paginated.
    ///
    /// Index keys embed time-ordered components, so forward iteration plus
    /// a reverse yields newest-first.
    fn list_index_keys(
        &self,
        cf_name: &str,
        prefix: &[u8],
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Vec<u8>>> {
        let cf = self.cf(cf_name)?;
        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(prefix, rocksdb::Direction::Forward));

        let mut all_keys: Vec<Vec<u8>> = Vec::new();
        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;

            if !key.starts_with(prefix) {
                break;
            }

            all_keys.push(key.to_vec());
        }

        all_keys.reverse();

        Ok(all_keys.into_iter().skip(offset).take(limit).collect())
    }
}

impl Store for RocksStore {
    // =========================================================================
    // User Operations
    // =========================================================================

    fn create_user(&self, user: &User, welcome: Option<&PointTransaction>) -> Result<()> {
        let _guard = self.write_guard();

        if self.get_user(&user.user_id)?.is_some() {
            return Err(StoreError::already_exists("user", user.user_id.to_string()));
        }

        let cf_users = self.cf(cf::USERS)?;
        let user_value = Self::serialize(user)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_users, keys::user_key(&user.user_id), &user_value);

        if let Some(tx) = welcome {
            let cf_tx = self.cf(cf::TRANSACTIONS)?;
            let cf_tx_by_user = self.cf(cf::TRANSACTIONS_BY_USER)?;
            batch.put_cf(&cf_tx, keys::transaction_key(&tx.id), Self::serialize(tx)?);
            batch.put_cf(
                &cf_tx_by_user,
                keys::user_transaction_key(&user.user_id, &tx.id),
                [],
            );
        }

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn put_user(&self, user: &User) -> Result<()> {
        let cf = self.cf(cf::USERS)?;
        let key = keys::user_key(&user.user_id);
        let value = Self::serialize(user)?;

        self.db
            .put_cf(&cf, key, value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get_user(&self, user_id: &UserId) -> Result<Option<User>> {
        let cf = self.cf(cf::USERS)?;
        let key = keys::user_key(user_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    // =========================================================================
    // Reading Operations
    // =========================================================================

    fn get_reading(&self, reading_id: &ReadingId) -> Result<Option<Reading>> {
        let cf = self.cf(cf::READINGS)?;
        let key = keys::reading_key(reading_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn list_readings_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Reading>> {
        let prefix = keys::user_prefix(user_id);
        let index_keys = self.list_index_keys(cf::READINGS_BY_USER, &prefix, limit, offset)?;

        let mut readings = Vec::with_capacity(index_keys.len());
        for key in index_keys {
            let reading_id = keys::extract_reading_id_from_user_key(&key);
            if let Some(reading) = self.get_reading(&reading_id)? {
                readings.push(reading);
            }
        }

        Ok(readings)
    }

    fn has_daily_reading(&self, user_id: &UserId, tool: ToolKind, date: NaiveDate) -> Result<bool> {
        let cf = self.cf(cf::DAILY_READINGS)?;
        let key = keys::daily_reading_key(user_id, tool, date);

        let exists = self
            .db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .is_some();

        Ok(exists)
    }

    // =========================================================================
    // Ledger Operations
    // =========================================================================

    fn get_transaction(&self, transaction_id: &TransactionId) -> Result<Option<PointTransaction>> {
        let cf = self.cf(cf::TRANSACTIONS)?;
        let key = keys::transaction_key(transaction_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn list_transactions_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<PointTransaction>> {
        let prefix = keys::user_prefix(user_id);
        let index_keys = self.list_index_keys(cf::TRANSACTIONS_BY_USER, &prefix, limit, offset)?;

        let mut transactions = Vec::with_capacity(index_keys.len());
        for key in index_keys {
            let tx_id = keys::extract_transaction_id_from_user_key(&key);
            if let Some(tx) = self.get_transaction(&tx_id)? {
                transactions.push(tx);
            }
        }

        Ok(transactions)
    }

    // =========================================================================
    // Payment Operations
    // =========================================================================

    fn put_payment(&self, payment: &PendingPayment) -> Result<()> {
        let _guard = self.write_guard();

        if self.get_payment(&payment.payment_id)?.is_some() {
            return Err(StoreError::already_exists(
                "payment",
                payment.payment_id.clone(),
            ));
        }

        let cf_payments = self.cf(cf::PAYMENTS)?;
        let cf_by_user = self.cf(cf::PAYMENTS_BY_USER)?;

        let value = Self::serialize(payment)?;
        let index_key =
            keys::user_payment_key(&payment.user_id, payment.created_at, &payment.payment_id);

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_payments, keys::payment_key(&payment.payment_id), &value);
        batch.put_cf(&cf_by_user, &index_key, []);

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get_payment(&self, payment_id: &str) -> Result<Option<PendingPayment>> {
        let cf = self.cf(cf::PAYMENTS)?;
        let key = keys::payment_key(payment_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn list_payments_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<PendingPayment>> {
        let prefix = keys::user_prefix(user_id);
        let index_keys = self.list_index_keys(cf::PAYMENTS_BY_USER, &prefix, limit, offset)?;

        let mut payments = Vec::with_capacity(index_keys.len());
        for key in index_keys {
            let payment_id = keys::extract_payment_id_from_user_key(&key);
            if let Some(payment) = self.get_payment(&payment_id)? {
                payments.push(payment);
            }
        }

        Ok(payments)
    }

    // =========================================================================
    // Compound Operations
    // =========================================================================

    fn record_reading(
        &self,
        reading: &Reading,
        transaction: &PointTransaction,
        date: NaiveDate,
    ) -> Result<i64> {
        let _guard = self.write_guard();

        // Re-check everything under the lock; the handler's optimistic
        // checks may be stale by now.
        let mut user = self
            .get_user(&reading.user_id)?
            .ok_or_else(|| StoreError::not_found("user", reading.user_id.to_string()))?;

        if user.balance_points < reading.cost_points {
            return Err(StoreError::InsufficientPoints {
                balance: user.balance_points,
                required: reading.cost_points,
            });
        }

        if reading.tool.daily_limited()
            && self.has_daily_reading(&reading.user_id, reading.tool, date)?
        {
            return Err(StoreError::DailyLimitReached {
                tool: reading.tool,
                date,
            });
        }

        let cf_users = self.cf(cf::USERS)?;
        let cf_readings = self.cf(cf::READINGS)?;
        let cf_readings_by_user = self.cf(cf::READINGS_BY_USER)?;
        let cf_tx = self.cf(cf::TRANSACTIONS)?;
        let cf_tx_by_user = self.cf(cf::TRANSACTIONS_BY_USER)?;

        user.balance_points -= reading.cost_points;
        user.lifetime_spent_points += reading.cost_points;
        user.updated_at = chrono::Utc::now();

        let mut ledger_entry = transaction.clone();
        ledger_entry.balance_after_points = user.balance_points;

        let user_value = Self::serialize(&user)?;
        let reading_value = Self::serialize(reading)?;
        let tx_value = Self::serialize(&ledger_entry)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_users, keys::user_key(&reading.user_id), &user_value);
        batch.put_cf(&cf_readings, keys::reading_key(&reading.id), &reading_value);
        batch.put_cf(
            &cf_readings_by_user,
            keys::user_reading_key(&reading.user_id, &reading.id),
            [],
        );
        batch.put_cf(&cf_tx, keys::transaction_key(&ledger_entry.id), &tx_value);
        batch.put_cf(
            &cf_tx_by_user,
            keys::user_transaction_key(&reading.user_id, &ledger_entry.id),
            [],
        );

        if reading.tool.daily_limited() {
            let cf_daily = self.cf(cf::DAILY_READINGS)?;
            batch.put_cf(
                &cf_daily,
                keys::daily_reading_key(&reading.user_id, reading.tool, date),
                reading.id.to_bytes(),
            );
        }

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(user.balance_points)
    }

    fn credit_points(
        &self,
        user_id: &UserId,
        amount_points: i64,
        transaction: &PointTransaction,
    ) -> Result<i64> {
        let _guard = self.write_guard();

        let mut user = self
            .get_user(user_id)?
            .ok_or_else(|| StoreError::not_found("user", user_id.to_string()))?;

        user.balance_points += amount_points;
        user.updated_at = chrono::Utc::now();

        match transaction.kind {
            TransactionKind::Purchase => {
                user.lifetime_purchased_points += amount_points;
            }
            TransactionKind::Welcome | TransactionKind::Refund => {
                user.lifetime_granted_points += amount_points;
            }
            TransactionKind::ToolUsage => {}
        }

        let mut ledger_entry = transaction.clone();
        ledger_entry.balance_after_points = user.balance_points;

        let cf_users = self.cf(cf::USERS)?;
        let cf_tx = self.cf(cf::TRANSACTIONS)?;
        let cf_tx_by_user = self.cf(cf::TRANSACTIONS_BY_USER)?;

        let user_value = Self::serialize(&user)?;
        let tx_value = Self::serialize(&ledger_entry)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_users, keys::user_key(user_id), &user_value);
        batch.put_cf(&cf_tx, keys::transaction_key(&ledger_entry.id), &tx_value);
        batch.put_cf(
            &cf_tx_by_user,
            keys::user_transaction_key(user_id, &ledger_entry.id),
            [],
        );

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(user.balance_points)
    }

    fn settle_payment(
        &self,
        payment_id: &str,
        transaction: &PointTransaction,
    ) -> Result<Settlement> {
        let _guard = self.write_guard();

        let mut payment = self
            .get_payment(payment_id)?
            .ok_or_else(|| StoreError::not_found("payment", payment_id))?;

        if payment.is_paid() {
            return Ok(Settlement::AlreadySettled);
        }

        let mut user = self
            .get_user(&payment.user_id)?
            .ok_or_else(|| StoreError::not_found("user", payment.user_id.to_string()))?;

        let now = chrono::Utc::now();
        payment.status = PaymentStatus::Paid;
        payment.paid_at = Some(now);

        user.balance_points += payment.points;
        user.lifetime_purchased_points += payment.points;
        user.updated_at = now;

        let mut ledger_entry = transaction.clone();
        ledger_entry.balance_after_points = user.balance_points;

        let cf_payments = self.cf(cf::PAYMENTS)?;
        let cf_users = self.cf(cf::USERS)?;
        let cf_tx = self.cf(cf::TRANSACTIONS)?;
        let cf_tx_by_user = self.cf(cf::TRANSACTIONS_BY_USER)?;

        let payment_value = Self::serialize(&payment)?;
        let user_value = Self::serialize(&user)?;
        let tx_value = Self::serialize(&ledger_entry)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_payments, keys::payment_key(payment_id), &payment_value);
        batch.put_cf(&cf_users, keys::user_key(&payment.user_id), &user_value);
        batch.put_cf(&cf_tx, keys::transaction_key(&ledger_entry.id), &tx_value);
        batch.put_cf(
            &cf_tx_by_user,
            keys::user_transaction_key(&payment.user_id, &ledger_entry.id),
            [],
        );

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Settlement::Credited {
            new_balance: user.balance_points,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guia_core::{PaymentProvider, PointPackage, TransactionKind};
    use tempfile::TempDir;

    fn create_test_store() -> (RocksStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = RocksStore::open(dir.path()).unwrap();
        (store, dir)
    }

    fn user_with_balance(store: &RocksStore, balance: i64) -> UserId {
        let user_id = UserId::generate();
        let mut user = User::new(user_id);
        user.balance_points = balance;
        user.onboarding_complete = true;
        store.create_user(&user, None).unwrap();
        user_id
    }

    fn tarot_reading(user_id: UserId) -> Reading {
        Reading::new(
            user_id,
            ToolKind::Tarot,
            "As cartas revelam um novo ciclo.".into(),
            false,
            serde_json::json!({ "question": "ele volta?" }),
        )
    }

    #[test]
    fn user_crud() {
        let (store, _dir) = create_test_store();
        let user_id = UserId::generate();
        let mut user = User::new(user_id);
        user.balance_points = 50;

        store.create_user(&user, None).unwrap();

        let retrieved = store.get_user(&user_id).unwrap().unwrap();
        assert_eq!(retrieved.balance_points, 50);
        assert!(!retrieved.onboarding_complete);

        // Updates go through put_user.
        let mut updated = retrieved;
        updated.onboarding_complete = true;
        store.put_user(&updated).unwrap();
        assert!(store.get_user(&user_id).unwrap().unwrap().onboarding_complete);

        // Creating the same user again fails.
        let result = store.create_user(&user, None);
        assert!(matches!(result, Err(StoreError::AlreadyExists { .. })));
    }

    #[test]
    fn create_user_with_welcome_grant() {
        let (store, _dir) = create_test_store();
        let user_id = UserId::generate();
        let mut user = User::new(user_id);
        user.balance_points = 10;
        user.lifetime_granted_points = 10;

        let welcome = PointTransaction::welcome(user_id, 10);
        store.create_user(&user, Some(&welcome)).unwrap();

        let retrieved = store.get_user(&user_id).unwrap().unwrap();
        assert_eq!(retrieved.balance_points, 10);

        let txs = store.list_transactions_by_user(&user_id, 10, 0).unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].kind, TransactionKind::Welcome);
        assert_eq!(txs[0].amount_points, 10);
        assert_eq!(txs[0].balance_after_points, 10);
    }

    #[test]
    fn record_reading_debits_and_stores_everything() {
        let (store, _dir) = create_test_store();
        let user_id = user_with_balance(&store, 10);

        let reading = tarot_reading(user_id);
        // balance_after is deliberately wrong; the store overwrites it.
        let tx = PointTransaction::tool_usage(user_id, 7, 0, ToolKind::Tarot, reading.id);

        let date = guia_core::time::brasilia_today();
        let balance = store.record_reading(&reading, &tx, date).unwrap();
        assert_eq!(balance, 3);

        let user = store.get_user(&user_id).unwrap().unwrap();
        assert_eq!(user.balance_points, 3);
        assert_eq!(user.lifetime_spent_points, 7);

        let stored = store.get_reading(&reading.id).unwrap().unwrap();
        assert_eq!(stored.cost_points, 7);
        assert_eq!(stored.content, reading.content);

        let listed = store.list_readings_by_user(&user_id, 10, 0).unwrap();
        assert_eq!(listed.len(), 1);

        let txs = store.list_transactions_by_user(&user_id, 10, 0).unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].amount_points, -7);
        assert_eq!(txs[0].balance_after_points, 3);
        assert_eq!(txs[0].reference.as_deref(), Some(reading.id.to_string().as_str()));
    }

    #[test]
    fn insufficient_points_changes_nothing() {
        let (store, _dir) = create_test_store();
        let user_id = user_with_balance(&store, 5);

        let reading = tarot_reading(user_id);
        let tx = PointTransaction::tool_usage(user_id, 7, 0, ToolKind::Tarot, reading.id);

        let date = guia_core::time::brasilia_today();
        let result = store.record_reading(&reading, &tx, date);
        assert!(matches!(
            result,
            Err(StoreError::InsufficientPoints {
                balance: 5,
                required: 7
            })
        ));

        let user = store.get_user(&user_id).unwrap().unwrap();
        assert_eq!(user.balance_points, 5);
        assert_eq!(user.lifetime_spent_points, 0);
        assert!(store.get_reading(&reading.id).unwrap().is_none());
        assert!(store
            .list_transactions_by_user(&user_id, 10, 0)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn daily_limit_blocks_second_use_same_day() {
        let (store, _dir) = create_test_store();
        let user_id = user_with_balance(&store, 100);
        let date = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();

        let first = Reading::new(
            user_id,
            ToolKind::DailyCard,
            "O Sol ilumina seu dia.".into(),
            false,
            serde_json::Value::Null,
        );
        let tx1 = PointTransaction::tool_usage(user_id, 2, 0, ToolKind::DailyCard, first.id);
        let balance = store.record_reading(&first, &tx1, date).unwrap();
        assert_eq!(balance, 98);
        assert!(store
            .has_daily_reading(&user_id, ToolKind::DailyCard, date)
            .unwrap());

        let second = Reading::new(
            user_id,
            ToolKind::DailyCard,
            "A Lua convida ao repouso.".into(),
            false,
            serde_json::Value::Null,
        );
        let tx2 = PointTransaction::tool_usage(user_id, 2, 0, ToolKind::DailyCard, second.id);
        let result = store.record_reading(&second, &tx2, date);
        assert!(matches!(
            result,
            Err(StoreError::DailyLimitReached { tool: ToolKind::DailyCard, .. })
        ));

        // Nothing changed for the rejected attempt.
        let user = store.get_user(&user_id).unwrap().unwrap();
        assert_eq!(user.balance_points, 98);
        assert_eq!(store.list_readings_by_user(&user_id, 10, 0).unwrap().len(), 1);

        // A different tool and the next day are both fine.
        let other = Reading::new(
            user_id,
            ToolKind::DailyHoroscope,
            "Bom dia para recomeços.".into(),
            false,
            serde_json::Value::Null,
        );
        let tx3 = PointTransaction::tool_usage(user_id, 2, 0, ToolKind::DailyHoroscope, other.id);
        store.record_reading(&other, &tx3, date).unwrap();

        let next_day = date.succ_opt().unwrap();
        let tomorrow = Reading::new(
            user_id,
            ToolKind::DailyCard,
            "A Estrela renova a esperança.".into(),
            false,
            serde_json::Value::Null,
        );
        let tx4 = PointTransaction::tool_usage(user_id, 2, 0, ToolKind::DailyCard, tomorrow.id);
        store.record_reading(&tomorrow, &tx4, next_day).unwrap();
    }

    #[test]
    fn record_reading_unknown_user() {
        let (store, _dir) = create_test_store();
        let user_id = UserId::generate();

        let reading = tarot_reading(user_id);
        let tx = PointTransaction::tool_usage(user_id, 7, 0, ToolKind::Tarot, reading.id);

        let date = guia_core::time::brasilia_today();
        let result = store.record_reading(&reading, &tx, date);
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn credit_points_updates_lifetime_counters() {
        let (store, _dir) = create_test_store();
        let user_id = user_with_balance(&store, 0);

        let tx = PointTransaction::purchase(user_id, 120, 0, "pix_tx_1", "Pacote Místico".into());
        let balance = store.credit_points(&user_id, 120, &tx).unwrap();
        assert_eq!(balance, 120);

        let user = store.get_user(&user_id).unwrap().unwrap();
        assert_eq!(user.lifetime_purchased_points, 120);
        assert_eq!(user.lifetime_granted_points, 0);

        let refund = PointTransaction::refund(user_id, 5, 0, "Cortesia do suporte".into());
        let balance = store.credit_points(&user_id, 5, &refund).unwrap();
        assert_eq!(balance, 125);

        let user = store.get_user(&user_id).unwrap().unwrap();
        assert_eq!(user.lifetime_granted_points, 5);

        let txs = store.list_transactions_by_user(&user_id, 10, 0).unwrap();
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].balance_after_points, 125); // Newest first
    }

    #[test]
    fn settle_payment_credits_exactly_once() {
        let (store, _dir) = create_test_store();
        let user_id = user_with_balance(&store, 10);

        let package = PointPackage::find("mistico").unwrap();
        let payment = PendingPayment::new(
            "pix_tx_42".into(),
            user_id,
            PaymentProvider::Pix,
            package,
        );
        store.put_payment(&payment).unwrap();

        let tx = PointTransaction::purchase(user_id, 120, 0, "pix_tx_42", "Pacote Místico".into());
        let settlement = store.settle_payment("pix_tx_42", &tx).unwrap();
        assert_eq!(settlement, Settlement::Credited { new_balance: 130 });

        let stored = store.get_payment("pix_tx_42").unwrap().unwrap();
        assert!(stored.is_paid());
        assert!(stored.paid_at.is_some());

        // Replay: no further credit, no extra ledger entry.
        let tx2 = PointTransaction::purchase(user_id, 120, 0, "pix_tx_42", "Pacote Místico".into());
        let settlement = store.settle_payment("pix_tx_42", &tx2).unwrap();
        assert_eq!(settlement, Settlement::AlreadySettled);

        let user = store.get_user(&user_id).unwrap().unwrap();
        assert_eq!(user.balance_points, 130);
        assert_eq!(user.lifetime_purchased_points, 120);

        let txs = store.list_transactions_by_user(&user_id, 10, 0).unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].kind, TransactionKind::Purchase);
        assert_eq!(txs[0].balance_after_points, 130);
    }

    #[test]
    fn settle_unknown_payment_is_not_found() {
        let (store, _dir) = create_test_store();
        let user_id = UserId::generate();
        let tx = PointTransaction::purchase(user_id, 50, 0, "ghost", "Pacote".into());

        let result = store.settle_payment("ghost", &tx);
        assert!(matches!(
            result,
            Err(StoreError::NotFound { entity: "payment", .. })
        ));
    }

    #[test]
    fn duplicate_payment_id_rejected() {
        let (store, _dir) = create_test_store();
        let user_id = user_with_balance(&store, 0);

        let package = PointPackage::find("inicial").unwrap();
        let payment =
            PendingPayment::new("tx_dup".into(), user_id, PaymentProvider::Pix, package);
        store.put_payment(&payment).unwrap();

        let result = store.put_payment(&payment);
        assert!(matches!(result, Err(StoreError::AlreadyExists { .. })));
    }

    #[test]
    fn payments_list_newest_first() {
        let (store, _dir) = create_test_store();
        let user_id = user_with_balance(&store, 0);
        let package = PointPackage::find("inicial").unwrap();

        let mut first =
            PendingPayment::new("tx_a".into(), user_id, PaymentProvider::Pix, package);
        first.created_at = chrono::Utc::now() - chrono::Duration::seconds(10);
        store.put_payment(&first).unwrap();

        let second =
            PendingPayment::new("tx_b".into(), user_id, PaymentProvider::Stripe, package);
        store.put_payment(&second).unwrap();

        let payments = store.list_payments_by_user(&user_id, 10, 0).unwrap();
        assert_eq!(payments.len(), 2);
        assert_eq!(payments[0].payment_id, "tx_b");
        assert_eq!(payments[1].payment_id, "tx_a");
    }

    #[test]
    fn transactions_pagination() {
        let (store, _dir) = create_test_store();
        let user_id = user_with_balance(&store, 0);

        // Different ULID timestamps keep the ordering deterministic.
        let tx1 = PointTransaction::refund(user_id, 5, 0, "Grant 1".into());
        store.credit_points(&user_id, 5, &tx1).unwrap();

        std::thread::sleep(std::time::Duration::from_millis(2));

        let tx2 = PointTransaction::refund(user_id, 3, 0, "Grant 2".into());
        store.credit_points(&user_id, 3, &tx2).unwrap();

        let page1 = store.list_transactions_by_user(&user_id, 1, 0).unwrap();
        let page2 = store.list_transactions_by_user(&user_id, 1, 1).unwrap();
        assert_eq!(page1.len(), 1);
        assert_eq!(page2.len(), 1);
        assert_eq!(page1[0].description, "Grant 2"); // Newest first
        assert_eq!(page2[0].description, "Grant 1");
    }
}
