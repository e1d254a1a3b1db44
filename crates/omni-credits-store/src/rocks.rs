//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store` trait.

use std::path::Path;
use std::sync::Arc;

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded,
    Options, WriteBatch,
};

use omni_credits_core::{
    Account, CreditTransaction, PaymentSession, PromoCode, PromoKind, PromoRedemption,
    PromoRejection, Referral, TransactionId, TransactionKind, UsageLog, UserId,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::Store;

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
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

        Ok(Self { db: Arc::new(db) })
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

    /// Get a record from a column family, if present.
    fn get_record<T: serde::de::DeserializeOwned>(
        &self,
        cf_name: &str,
        key: &[u8],
    ) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    /// Stage a transaction and its user index entry into a batch.
    fn batch_transaction(
        &self,
        batch: &mut WriteBatch,
        transaction: &CreditTransaction,
    ) -> Result<()> {
        let cf_tx = self.cf(cf::TRANSACTIONS)?;
        let cf_by_user = self.cf(cf::TRANSACTIONS_BY_USER)?;

        let tx_key = keys::transaction_key(&transaction.id);
        let user_tx_key = keys::user_transaction_key(&transaction.user_id, &transaction.id);
        let value = Self::serialize(transaction)?;

        batch.put_cf(&cf_tx, &tx_key, &value);
        batch.put_cf(&cf_by_user, &user_tx_key, []); // Index entry (empty value)

        Ok(())
    }

    /// Stage an account write into a batch.
    fn batch_account(&self, batch: &mut WriteBatch, account: &Account) -> Result<()> {
        let cf_accounts = self.cf(cf::ACCOUNTS)?;
        let key = keys::account_key(&account.user_id);
        let value = Self::serialize(account)?;
        batch.put_cf(&cf_accounts, &key, &value);
        Ok(())
    }

    fn write(&self, batch: WriteBatch) -> Result<()> {
        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }
}

impl Store for RocksStore {
    // =========================================================================
    // Account Operations
    // =========================================================================

    fn create_account(&self, account: &Account, welcome_tx: &CreditTransaction) -> Result<()> {
        let mut batch = WriteBatch::default();
        self.batch_account(&mut batch, account)?;
        self.batch_transaction(&mut batch, welcome_tx)?;
        self.write(batch)
    }

    fn put_account(&self, account: &Account) -> Result<()> {
        let cf = self.cf(cf::ACCOUNTS)?;
        let key = keys::account_key(&account.user_id);
        let value = Self::serialize(account)?;

        self.db
            .put_cf(&cf, key, value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get_account(&self, user_id: &UserId) -> Result<Option<Account>> {
        self.get_record(cf::ACCOUNTS, &keys::account_key(user_id))
    }

    fn delete_account(&self, user_id: &UserId) -> Result<()> {
        let cf = self.cf(cf::ACCOUNTS)?;
        let key = keys::account_key(user_id);

        if self.get_account(user_id)?.is_none() {
            return Err(StoreError::NotFound);
        }

        self.db
            .delete_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    // =========================================================================
    // Transaction Operations
    // =========================================================================

    fn get_transaction(&self, transaction_id: &TransactionId) -> Result<Option<CreditTransaction>> {
        self.get_record(cf::TRANSACTIONS, &keys::transaction_key(transaction_id))
    }

    fn list_transactions_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<CreditTransaction>> {
        let cf_by_user = self.cf(cf::TRANSACTIONS_BY_USER)?;
        let prefix = keys::user_transactions_prefix(user_id);

        let iter = self.db.iterator_cf(
            &cf_by_user,
            IteratorMode::From(&prefix, rocksdb::Direction::Forward),
        );

        // Collect all matching keys first (ULIDs are naturally time-ordered)
        let mut all_keys: Vec<Vec<u8>> = Vec::new();
        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;

            if !key.starts_with(&prefix) {
                break;
            }

            all_keys.push(key.to_vec());
        }

        // Reverse to get newest first
        all_keys.reverse();

        let mut transactions = Vec::new();
        for key in all_keys.into_iter().skip(offset) {
            if transactions.len() >= limit {
                break;
            }

            let tx_id = keys::extract_transaction_id_from_user_key(&key);
            if let Some(tx) = self.get_transaction(&tx_id)? {
                transactions.push(tx);
            }
        }

        Ok(transactions)
    }

    // =========================================================================
    // Usage Operations
    // =========================================================================

    fn get_usage_log(&self, event_id: &str) -> Result<Option<UsageLog>> {
        self.get_record(cf::USAGE_LOGS, &keys::usage_log_key(event_id))
    }

    fn debit_usage(&self, log: &UsageLog, transaction: &CreditTransaction) -> Result<i64> {
        // Idempotency: a repeated event id must not double-charge
        if self.get_usage_log(&log.event_id)?.is_some() {
            return Err(StoreError::DuplicateEvent {
                event_id: log.event_id.clone(),
            });
        }

        let mut account = self.get_account(&log.user_id)?.ok_or(StoreError::NotFound)?;

        // Re-validate at debit time; the earlier gate check is not trusted
        if account.balance_credits < log.credits_charged {
            return Err(StoreError::InsufficientCredits {
                balance: account.balance_credits,
                required: log.credits_charged,
            });
        }

        account.balance_credits -= log.credits_charged;
        account.lifetime_used_credits += log.credits_charged;
        account.updated_at = chrono::Utc::now();

        let cf_usage = self.cf(cf::USAGE_LOGS)?;
        let log_key = keys::usage_log_key(&log.event_id);
        let log_value = Self::serialize(log)?;

        let mut batch = WriteBatch::default();
        self.batch_account(&mut batch, &account)?;
        self.batch_transaction(&mut batch, transaction)?;
        batch.put_cf(&cf_usage, &log_key, &log_value);

        self.write(batch)?;

        Ok(account.balance_credits)
    }

    // =========================================================================
    // Top-Up Operations
    // =========================================================================

    fn add_credits(
        &self,
        user_id: &UserId,
        amount_credits: i64,
        transaction: &CreditTransaction,
    ) -> Result<i64> {
        let mut account = self.get_account(user_id)?.ok_or(StoreError::NotFound)?;

        account.balance_credits += amount_credits;
        account.updated_at = chrono::Utc::now();

        match transaction.kind {
            TransactionKind::Purchase => {
                account.lifetime_purchased_credits += amount_credits;
            }
            TransactionKind::Bonus => {
                account.lifetime_granted_credits += amount_credits;
            }
            TransactionKind::Usage | TransactionKind::Refund => {}
        }

        let mut batch = WriteBatch::default();
        self.batch_account(&mut batch, &account)?;
        self.batch_transaction(&mut batch, transaction)?;

        self.write(batch)?;

        Ok(account.balance_credits)
    }

    fn credit_purchase(
        &self,
        user_id: &UserId,
        amount_credits: i64,
        session: &PaymentSession,
        transaction: &CreditTransaction,
    ) -> Result<i64> {
        // Replay guard: a redelivered webhook must not credit twice
        if self.has_payment_session(&session.session_id)? {
            return Err(StoreError::DuplicateSession {
                session_id: session.session_id.clone(),
            });
        }

        let mut account = self.get_account(user_id)?.ok_or(StoreError::NotFound)?;

        account.balance_credits += amount_credits;
        account.lifetime_purchased_credits += amount_credits;
        account.updated_at = chrono::Utc::now();

        let cf_sessions = self.cf(cf::PAYMENT_SESSIONS)?;
        let session_key = keys::payment_session_key(&session.session_id);
        let session_value = Self::serialize(session)?;

        let mut batch = WriteBatch::default();
        self.batch_account(&mut batch, &account)?;
        self.batch_transaction(&mut batch, transaction)?;
        batch.put_cf(&cf_sessions, &session_key, &session_value);

        self.write(batch)?;

        Ok(account.balance_credits)
    }

    fn has_payment_session(&self, session_id: &str) -> Result<bool> {
        let cf = self.cf(cf::PAYMENT_SESSIONS)?;
        let exists = self
            .db
            .get_cf(&cf, keys::payment_session_key(session_id))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .is_some();
        Ok(exists)
    }

    // =========================================================================
    // Promo Operations
    // =========================================================================

    fn put_promo_code(&self, code: &PromoCode) -> Result<()> {
        let cf = self.cf(cf::PROMO_CODES)?;
        let key = keys::promo_code_key(&code.code);
        let value = Self::serialize(code)?;

        self.db
            .put_cf(&cf, key, value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get_promo_code(&self, code: &str) -> Result<Option<PromoCode>> {
        self.get_record(cf::PROMO_CODES, &keys::promo_code_key(code))
    }

    fn get_redemption(&self, user_id: &UserId, code: &str) -> Result<Option<PromoRedemption>> {
        self.get_record(cf::PROMO_REDEMPTIONS, &keys::redemption_key(user_id, code))
    }

    fn redeem_promo(
        &self,
        user_id: &UserId,
        code: &str,
        transaction: &CreditTransaction,
        redemption: &PromoRedemption,
    ) -> Result<i64> {
        // Re-run the full validation against fresh rows; the caller's earlier
        // validate call is not trusted.
        let mut promo = self
            .get_promo_code(code)?
            .ok_or(StoreError::PromoRejected(PromoRejection::InvalidCode))?;

        if promo.kind != PromoKind::Credits {
            return Err(StoreError::PromoRejected(PromoRejection::NotCreditsCode));
        }

        let already_used = self.get_redemption(user_id, code)?.is_some();
        promo.validate(chrono::Utc::now(), already_used)?;

        let mut account = self.get_account(user_id)?.ok_or(StoreError::NotFound)?;

        let granted = promo.value;
        account.balance_credits += granted;
        account.lifetime_granted_credits += granted;
        account.updated_at = chrono::Utc::now();

        promo.used_count += 1;

        let cf_codes = self.cf(cf::PROMO_CODES)?;
        let cf_redemptions = self.cf(cf::PROMO_REDEMPTIONS)?;

        let code_key = keys::promo_code_key(&promo.code);
        let code_value = Self::serialize(&promo)?;
        let redemption_key = keys::redemption_key(user_id, code);
        let redemption_value = Self::serialize(redemption)?;

        let mut batch = WriteBatch::default();
        self.batch_account(&mut batch, &account)?;
        self.batch_transaction(&mut batch, transaction)?;
        batch.put_cf(&cf_codes, &code_key, &code_value);
        batch.put_cf(&cf_redemptions, &redemption_key, &redemption_value);

        self.write(batch)?;

        Ok(account.balance_credits)
    }

    // =========================================================================
    // Referral Operations
    // =========================================================================

    fn get_user_by_referral_code(&self, code: &str) -> Result<Option<UserId>> {
        let cf = self.cf(cf::REFERRAL_CODES)?;
        let value = self
            .db
            .get_cf(&cf, keys::referral_code_key(code))
            .map_err(|e| StoreError::Database(e.to_string()))?;

        match value {
            Some(bytes) => {
                let raw: [u8; 16] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| StoreError::Serialization("bad referral code value".into()))?;
                Ok(Some(UserId::from_bytes(raw)))
            }
            None => Ok(None),
        }
    }

    fn assign_referral_code(&self, user_id: &UserId, code: &str) -> Result<()> {
        if let Some(owner) = self.get_user_by_referral_code(code)? {
            if owner == *user_id {
                return Ok(());
            }
            return Err(StoreError::ReferralCodeTaken {
                code: code.to_string(),
            });
        }

        let mut account = self.get_account(user_id)?.ok_or(StoreError::NotFound)?;
        account.referral_code = Some(code.to_string());
        account.updated_at = chrono::Utc::now();

        let cf_codes = self.cf(cf::REFERRAL_CODES)?;

        let mut batch = WriteBatch::default();
        self.batch_account(&mut batch, &account)?;
        batch.put_cf(&cf_codes, keys::referral_code_key(code), user_id.as_bytes());

        self.write(batch)
    }

    fn get_referral(
        &self,
        referrer_id: &UserId,
        referred_id: &UserId,
    ) -> Result<Option<Referral>> {
        self.get_record(cf::REFERRALS, &keys::referral_key(referrer_id, referred_id))
    }

    fn apply_referral(
        &self,
        referral: &Referral,
        referrer_tx: &CreditTransaction,
        referred_tx: &CreditTransaction,
    ) -> Result<(i64, i64)> {
        // The composite key makes the bonus at-most-once per pair
        if self
            .get_referral(&referral.referrer_id, &referral.referred_id)?
            .is_some()
        {
            return Err(StoreError::AlreadyReferred);
        }

        let mut referrer = self
            .get_account(&referral.referrer_id)?
            .ok_or(StoreError::NotFound)?;
        let mut referred = self
            .get_account(&referral.referred_id)?
            .ok_or(StoreError::NotFound)?;

        let bonus = referral.bonus_credits;
        let now = chrono::Utc::now();

        referrer.balance_credits += bonus;
        referrer.lifetime_granted_credits += bonus;
        referrer.updated_at = now;

        referred.balance_credits += bonus;
        referred.lifetime_granted_credits += bonus;
        referred.updated_at = now;

        let cf_referrals = self.cf(cf::REFERRALS)?;
        let referral_key = keys::referral_key(&referral.referrer_id, &referral.referred_id);
        let referral_value = Self::serialize(referral)?;

        let mut batch = WriteBatch::default();
        self.batch_account(&mut batch, &referrer)?;
        self.batch_account(&mut batch, &referred)?;
        self.batch_transaction(&mut batch, referrer_tx)?;
        self.batch_transaction(&mut batch, referred_tx)?;
        batch.put_cf(&cf_referrals, &referral_key, &referral_value);

        self.write(batch)?;

        Ok((referrer.balance_credits, referred.balance_credits))
    }

    fn list_referrals_by_referrer(&self, referrer_id: &UserId) -> Result<Vec<Referral>> {
        let cf_referrals = self.cf(cf::REFERRALS)?;
        let prefix = keys::referrer_prefix(referrer_id);

        let iter = self.db.iterator_cf(
            &cf_referrals,
            IteratorMode::From(&prefix, rocksdb::Direction::Forward),
        );

        let mut referrals = Vec::new();
        for item in iter {
            let (key, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;

            if !key.starts_with(&prefix) {
                break;
            }

            referrals.push(Self::deserialize(&value)?);
        }

        Ok(referrals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use omni_credits_core::{ToolKind, REFERRAL_BONUS_CREDITS, SIGNUP_BONUS_CREDITS};
    use tempfile::TempDir;

    fn create_test_store() -> (RocksStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = RocksStore::open(dir.path()).unwrap();
        (store, dir)
    }

    fn signup(store: &RocksStore) -> UserId {
        let user_id = UserId::generate();
        let mut account = Account::new(user_id);
        account.balance_credits = SIGNUP_BONUS_CREDITS;
        account.lifetime_granted_credits = SIGNUP_BONUS_CREDITS;

        let tx = CreditTransaction::bonus(
            user_id,
            SIGNUP_BONUS_CREDITS,
            SIGNUP_BONUS_CREDITS,
            "Welcome bonus".into(),
            serde_json::Value::Null,
        );
        store.create_account(&account, &tx).unwrap();
        user_id
    }

    fn transaction_sum(store: &RocksStore, user_id: &UserId) -> i64 {
        store
            .list_transactions_by_user(user_id, 1000, 0)
            .unwrap()
            .iter()
            .map(|tx| tx.amount_credits)
            .sum()
    }

    #[test]
    fn account_crud() {
        let (store, _dir) = create_test_store();
        let user_id = UserId::generate();
        let mut account = Account::new(user_id);
        account.balance_credits = 500;

        store.put_account(&account).unwrap();

        let retrieved = store.get_account(&user_id).unwrap().unwrap();
        assert_eq!(retrieved.balance_credits, 500);

        store.delete_account(&user_id).unwrap();
        assert!(store.get_account(&user_id).unwrap().is_none());
        assert!(matches!(
            store.delete_account(&user_id),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn signup_grants_exactly_one_bonus() {
        let (store, _dir) = create_test_store();
        let user_id = signup(&store);

        let account = store.get_account(&user_id).unwrap().unwrap();
        assert_eq!(account.balance_credits, SIGNUP_BONUS_CREDITS);

        let transactions = store.list_transactions_by_user(&user_id, 10, 0).unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].kind, TransactionKind::Bonus);
        assert_eq!(transactions[0].amount_credits, SIGNUP_BONUS_CREDITS);
    }

    #[test]
    fn transaction_pagination_newest_first() {
        let (store, _dir) = create_test_store();
        let user_id = signup(&store);

        std::thread::sleep(std::time::Duration::from_millis(2)); // Ensure different ULIDs

        let tx = CreditTransaction::purchase(
            user_id,
            500,
            510,
            "Purchase 1".into(),
            serde_json::Value::Null,
        );
        store.add_credits(&user_id, 500, &tx).unwrap();

        let page1 = store.list_transactions_by_user(&user_id, 1, 0).unwrap();
        let page2 = store.list_transactions_by_user(&user_id, 1, 1).unwrap();
        assert_eq!(page1[0].description, "Purchase 1"); // Newest first
        assert_eq!(page2[0].description, "Welcome bonus");
    }

    #[test]
    fn debit_usage_and_idempotency() {
        let (store, _dir) = create_test_store();
        let user_id = signup(&store);

        let log = UsageLog::new("evt_123".into(), user_id, ToolKind::Translation, 5000.0, 1);
        let tx = CreditTransaction::usage(
            user_id,
            1,
            SIGNUP_BONUS_CREDITS - 1,
            "Translation".into(),
            serde_json::json!({}),
        );

        let balance = store.debit_usage(&log, &tx).unwrap();
        assert_eq!(balance, SIGNUP_BONUS_CREDITS - 1);
        assert!(store.get_usage_log("evt_123").unwrap().is_some());

        // Replaying the same event must not double-charge
        let result = store.debit_usage(&log, &tx);
        assert!(matches!(result, Err(StoreError::DuplicateEvent { .. })));

        let account = store.get_account(&user_id).unwrap().unwrap();
        assert_eq!(account.balance_credits, SIGNUP_BONUS_CREDITS - 1);
        assert_eq!(transaction_sum(&store, &user_id), account.balance_credits);
    }

    #[test]
    fn insufficient_balance_leaves_state_unchanged() {
        let (store, _dir) = create_test_store();
        let user_id = signup(&store);

        let log = UsageLog::new("evt_456".into(), user_id, ToolKind::VideoGeneration, 60.0, 132);
        let tx = CreditTransaction::usage(
            user_id,
            132,
            0,
            "Video generation".into(),
            serde_json::json!({}),
        );

        let result = store.debit_usage(&log, &tx);
        assert!(matches!(
            result,
            Err(StoreError::InsufficientCredits {
                balance: SIGNUP_BONUS_CREDITS,
                required: 132
            })
        ));

        // Balance, transaction log and usage log are all untouched
        let account = store.get_account(&user_id).unwrap().unwrap();
        assert_eq!(account.balance_credits, SIGNUP_BONUS_CREDITS);
        assert_eq!(
            store.list_transactions_by_user(&user_id, 10, 0).unwrap().len(),
            1
        );
        assert!(store.get_usage_log("evt_456").unwrap().is_none());
    }

    #[test]
    fn balance_equals_transaction_sum_after_mixed_operations() {
        let (store, _dir) = create_test_store();
        let user_id = signup(&store);

        let purchase = CreditTransaction::purchase(
            user_id,
            500,
            510,
            "Purchase".into(),
            serde_json::Value::Null,
        );
        store.add_credits(&user_id, 500, &purchase).unwrap();

        let log = UsageLog::new("evt_1".into(), user_id, ToolKind::ImageGeneration, 4.0, 22);
        let usage = CreditTransaction::usage(
            user_id,
            22,
            488,
            "Image generation".into(),
            serde_json::json!({}),
        );
        store.debit_usage(&log, &usage).unwrap();

        let account = store.get_account(&user_id).unwrap().unwrap();
        assert_eq!(account.balance_credits, 488);
        assert_eq!(transaction_sum(&store, &user_id), 488);
    }

    #[test]
    fn credit_purchase_replay_is_rejected() {
        let (store, _dir) = create_test_store();
        let user_id = signup(&store);

        let session = PaymentSession::new("cs_test_1".into(), user_id, 500).with_package("standard");
        let tx = CreditTransaction::purchase(
            user_id,
            500,
            510,
            "Purchased Standard package".into(),
            serde_json::json!({"session_id": "cs_test_1"}),
        );

        let balance = store.credit_purchase(&user_id, 500, &session, &tx).unwrap();
        assert_eq!(balance, SIGNUP_BONUS_CREDITS + 500);
        assert!(store.has_payment_session("cs_test_1").unwrap());

        // Redelivery of the same session id must not credit again
        let replay_tx = CreditTransaction::purchase(
            user_id,
            500,
            1010,
            "Purchased Standard package".into(),
            serde_json::json!({"session_id": "cs_test_1"}),
        );
        let result = store.credit_purchase(&user_id, 500, &session, &replay_tx);
        assert!(matches!(result, Err(StoreError::DuplicateSession { .. })));

        let account = store.get_account(&user_id).unwrap().unwrap();
        assert_eq!(account.balance_credits, SIGNUP_BONUS_CREDITS + 500);
        assert_eq!(
            store.list_transactions_by_user(&user_id, 10, 0).unwrap().len(),
            2
        );
    }

    #[test]
    fn promo_redeem_once_per_user() {
        let (store, _dir) = create_test_store();
        let user_id = signup(&store);

        let promo = PromoCode::new("WELCOME50", PromoKind::Credits, 50);
        store.put_promo_code(&promo).unwrap();

        let tx = CreditTransaction::bonus(
            user_id,
            50,
            60,
            "Promo code WELCOME50".into(),
            serde_json::json!({"promo_code": "WELCOME50"}),
        );
        let redemption = PromoRedemption {
            code: "WELCOME50".into(),
            user_id,
            credits_awarded: 50,
            redeemed_at: chrono::Utc::now(),
        };

        let balance = store
            .redeem_promo(&user_id, "welcome50", &tx, &redemption)
            .unwrap();
        assert_eq!(balance, SIGNUP_BONUS_CREDITS + 50);

        let stored = store.get_promo_code("WELCOME50").unwrap().unwrap();
        assert_eq!(stored.used_count, 1);

        // Second redemption by the same user is rejected with AlreadyUsed
        let result = store.redeem_promo(&user_id, "WELCOME50", &tx, &redemption);
        assert!(matches!(
            result,
            Err(StoreError::PromoRejected(PromoRejection::AlreadyUsed))
        ));

        // Exactly one grant applied
        let account = store.get_account(&user_id).unwrap().unwrap();
        assert_eq!(account.balance_credits, SIGNUP_BONUS_CREDITS + 50);
        assert_eq!(transaction_sum(&store, &user_id), account.balance_credits);
    }

    #[test]
    fn capped_promo_exhausts_for_second_user() {
        let (store, _dir) = create_test_store();
        let user_a = signup(&store);
        let user_b = signup(&store);

        let promo = PromoCode::new("SINGLE", PromoKind::Credits, 20).with_max_uses(1);
        store.put_promo_code(&promo).unwrap();

        let tx_a = CreditTransaction::bonus(
            user_a,
            20,
            30,
            "Promo code SINGLE".into(),
            serde_json::Value::Null,
        );
        let redemption_a = PromoRedemption {
            code: "SINGLE".into(),
            user_id: user_a,
            credits_awarded: 20,
            redeemed_at: chrono::Utc::now(),
        };
        store
            .redeem_promo(&user_a, "SINGLE", &tx_a, &redemption_a)
            .unwrap();

        let tx_b = CreditTransaction::bonus(
            user_b,
            20,
            30,
            "Promo code SINGLE".into(),
            serde_json::Value::Null,
        );
        let redemption_b = PromoRedemption {
            code: "SINGLE".into(),
            user_id: user_b,
            credits_awarded: 20,
            redeemed_at: chrono::Utc::now(),
        };
        let result = store.redeem_promo(&user_b, "SINGLE", &tx_b, &redemption_b);
        assert!(matches!(
            result,
            Err(StoreError::PromoRejected(PromoRejection::CodeExhausted))
        ));

        let account_b = store.get_account(&user_b).unwrap().unwrap();
        assert_eq!(account_b.balance_credits, SIGNUP_BONUS_CREDITS);
    }

    #[test]
    fn unknown_promo_code_rejected() {
        let (store, _dir) = create_test_store();
        let user_id = signup(&store);

        let tx = CreditTransaction::bonus(user_id, 1, 11, "Promo".into(), serde_json::Value::Null);
        let redemption = PromoRedemption {
            code: "GHOST".into(),
            user_id,
            credits_awarded: 1,
            redeemed_at: chrono::Utc::now(),
        };

        let result = store.redeem_promo(&user_id, "GHOST", &tx, &redemption);
        assert!(matches!(
            result,
            Err(StoreError::PromoRejected(PromoRejection::InvalidCode))
        ));
    }

    #[test]
    fn referral_code_assignment_and_collision() {
        let (store, _dir) = create_test_store();
        let user_a = signup(&store);
        let user_b = signup(&store);

        store.assign_referral_code(&user_a, "REF-AB12CD34").unwrap();

        let owner = store.get_user_by_referral_code("REF-AB12CD34").unwrap();
        assert_eq!(owner, Some(user_a));

        let account = store.get_account(&user_a).unwrap().unwrap();
        assert_eq!(account.referral_code.as_deref(), Some("REF-AB12CD34"));

        // Re-assigning the same code to its owner is a no-op
        store.assign_referral_code(&user_a, "REF-AB12CD34").unwrap();

        // Another user cannot claim the same code
        let result = store.assign_referral_code(&user_b, "REF-AB12CD34");
        assert!(matches!(result, Err(StoreError::ReferralCodeTaken { .. })));
    }

    #[test]
    fn referral_bonus_applies_once_per_pair() {
        let (store, _dir) = create_test_store();
        let referrer = signup(&store);
        let referred = signup(&store);

        let referral = Referral::completed(referrer, referred, REFERRAL_BONUS_CREDITS);
        let referrer_tx = CreditTransaction::bonus(
            referrer,
            REFERRAL_BONUS_CREDITS,
            SIGNUP_BONUS_CREDITS + REFERRAL_BONUS_CREDITS,
            "Referral bonus".into(),
            serde_json::Value::Null,
        );
        let referred_tx = CreditTransaction::bonus(
            referred,
            REFERRAL_BONUS_CREDITS,
            SIGNUP_BONUS_CREDITS + REFERRAL_BONUS_CREDITS,
            "Referral welcome bonus".into(),
            serde_json::Value::Null,
        );

        let (referrer_balance, referred_balance) = store
            .apply_referral(&referral, &referrer_tx, &referred_tx)
            .unwrap();
        assert_eq!(referrer_balance, SIGNUP_BONUS_CREDITS + REFERRAL_BONUS_CREDITS);
        assert_eq!(referred_balance, SIGNUP_BONUS_CREDITS + REFERRAL_BONUS_CREDITS);

        // Second application for the same pair is rejected
        let result = store.apply_referral(&referral, &referrer_tx, &referred_tx);
        assert!(matches!(result, Err(StoreError::AlreadyReferred)));

        // Both balances reflect exactly one bonus
        let referrer_account = store.get_account(&referrer).unwrap().unwrap();
        let referred_account = store.get_account(&referred).unwrap().unwrap();
        assert_eq!(
            referrer_account.balance_credits,
            SIGNUP_BONUS_CREDITS + REFERRAL_BONUS_CREDITS
        );
        assert_eq!(
            referred_account.balance_credits,
            SIGNUP_BONUS_CREDITS + REFERRAL_BONUS_CREDITS
        );
        assert_eq!(transaction_sum(&store, &referrer), referrer_account.balance_credits);
        assert_eq!(transaction_sum(&store, &referred), referred_account.balance_credits);
    }

    #[test]
    fn list_referrals_by_referrer() {
        let (store, _dir) = create_test_store();
        let referrer = signup(&store);

        for _ in 0..3 {
            let referred = signup(&store);
            let referral = Referral::completed(referrer, referred, REFERRAL_BONUS_CREDITS);
            let referrer_tx = CreditTransaction::bonus(
                referrer,
                REFERRAL_BONUS_CREDITS,
                0,
                "Referral bonus".into(),
                serde_json::Value::Null,
            );
            let referred_tx = CreditTransaction::bonus(
                referred,
                REFERRAL_BONUS_CREDITS,
                0,
                "Referral welcome bonus".into(),
                serde_json::Value::Null,
            );
            store
                .apply_referral(&referral, &referrer_tx, &referred_tx)
                .unwrap();
        }

        let referrals = store.list_referrals_by_referrer(&referrer).unwrap();
        assert_eq!(referrals.len(), 3);
        assert!(referrals.iter().all(|r| r.referrer_id == referrer));
    }
}
