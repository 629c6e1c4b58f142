//! Store abstraction for progression state.
//!
//! The engine is written against this trait, not a database product.
//! `update_if_version` is a compare-and-swap on the record's version
//! counter: the ledger's optimistic-retry loop is built on it, and it is
//! what turns concurrent writes to one account into a serial history.
//! `insert_award` must be conditional (insert-if-absent), never
//! insert-then-check, so concurrent evaluations award at most once.
//!
//! `MemoryStore` is the reference implementation and the test double;
//! `SqliteStore` (in `store_sqlite`) is the durable one.

use crate::account::{AccountRecord, BadgeAward};
use crate::error::StrideError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;

/// One account's ranking-relevant fields, read in a single consistent pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RankingRow {
    pub account_id: String,
    pub display_name: String,
    pub points: u64,
    pub level: u32,
    pub streak: u32,
    pub created_at: DateTime<Utc>,
}

impl RankingRow {
    pub fn of(record: &AccountRecord) -> Self {
        Self {
            account_id: record.account_id.clone(),
            display_name: record.display_name.clone(),
            points: record.points,
            level: record.level,
            streak: record.streak,
            created_at: record.created_at,
        }
    }
}

/// Durable, queryable store for account records and badge awards.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Insert a fresh record. Fails with `InvalidInput` if the id exists.
    async fn create_account(&self, record: AccountRecord) -> Result<(), StrideError>;

    /// Read one record, or `None` if the account is unknown.
    async fn load(&self, account_id: &str) -> Result<Option<AccountRecord>, StrideError>;

    /// Write `record` only if the stored version still equals
    /// `expected_version`. Returns whether the write applied.
    async fn update_if_version(
        &self,
        record: &AccountRecord,
        expected_version: u64,
    ) -> Result<bool, StrideError>;

    /// Record an award unless one already exists for this
    /// (account, badge) pair. Returns whether it was newly recorded.
    async fn insert_award(&self, award: &BadgeAward) -> Result<bool, StrideError>;

    /// All awards for one account.
    async fn awards_for(&self, account_id: &str) -> Result<Vec<BadgeAward>, StrideError>;

    /// Every account's ranking fields as one self-consistent snapshot.
    async fn ranking_rows(&self) -> Result<Vec<RankingRow>, StrideError>;

    /// Number of provisioned accounts.
    async fn account_count(&self) -> Result<u64, StrideError>;
}

/// In-memory store. Guards are never held across an await point.
#[derive(Default)]
pub struct MemoryStore {
    accounts: RwLock<HashMap<String, AccountRecord>>,
    awards: RwLock<HashMap<String, Vec<BadgeAward>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> StrideError {
        StrideError::StoreUnavailable("memory store lock poisoned".to_string())
    }
}

#[async_trait]
impl ProgressStore for MemoryStore {
    async fn create_account(&self, record: AccountRecord) -> Result<(), StrideError> {
        let mut accounts = self.accounts.write().map_err(|_| Self::poisoned())?;
        if accounts.contains_key(&record.account_id) {
            return Err(StrideError::InvalidInput(format!(
                "account already exists: {}",
                record.account_id
            )));
        }
        accounts.insert(record.account_id.clone(), record);
        Ok(())
    }

    async fn load(&self, account_id: &str) -> Result<Option<AccountRecord>, StrideError> {
        let accounts = self.accounts.read().map_err(|_| Self::poisoned())?;
        Ok(accounts.get(account_id).cloned())
    }

    async fn update_if_version(
        &self,
        record: &AccountRecord,
        expected_version: u64,
    ) -> Result<bool, StrideError> {
        let mut accounts = self.accounts.write().map_err(|_| Self::poisoned())?;
        match accounts.get_mut(&record.account_id) {
            Some(stored) if stored.version == expected_version => {
                *stored = record.clone();
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Ok(false),
        }
    }

    async fn insert_award(&self, award: &BadgeAward) -> Result<bool, StrideError> {
        let mut awards = self.awards.write().map_err(|_| Self::poisoned())?;
        let list = awards.entry(award.account_id.clone()).or_default();
        if list.iter().any(|a| a.badge_id == award.badge_id) {
            return Ok(false);
        }
        list.push(award.clone());
        Ok(true)
    }

    async fn awards_for(&self, account_id: &str) -> Result<Vec<BadgeAward>, StrideError> {
        let awards = self.awards.read().map_err(|_| Self::poisoned())?;
        Ok(awards.get(account_id).cloned().unwrap_or_default())
    }

    async fn ranking_rows(&self) -> Result<Vec<RankingRow>, StrideError> {
        let accounts = self.accounts.read().map_err(|_| Self::poisoned())?;
        Ok(accounts.values().map(RankingRow::of).collect())
    }

    async fn account_count(&self) -> Result<u64, StrideError> {
        let accounts = self.accounts.read().map_err(|_| Self::poisoned())?;
        Ok(accounts.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> AccountRecord {
        AccountRecord::new(id, id, Utc::now())
    }

    #[tokio::test]
    async fn test_create_then_load() {
        let store = MemoryStore::new();
        store.create_account(record("a-1")).await.unwrap();
        let loaded = store.load("a-1").await.unwrap().unwrap();
        assert_eq!(loaded.account_id, "a-1");
        assert!(store.load("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_create_rejected() {
        let store = MemoryStore::new();
        store.create_account(record("a-1")).await.unwrap();
        let err = store.create_account(record("a-1")).await.unwrap_err();
        assert!(matches!(err, StrideError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_cas_applies_once() {
        let store = MemoryStore::new();
        store.create_account(record("a-1")).await.unwrap();

        let mut updated = store.load("a-1").await.unwrap().unwrap();
        updated.points = 100;
        updated.version = 1;
        assert!(store.update_if_version(&updated, 0).await.unwrap());

        // Stale writer: still claims version 0.
        let mut stale = updated.clone();
        stale.points = 999;
        assert!(!store.update_if_version(&stale, 0).await.unwrap());

        assert_eq!(store.load("a-1").await.unwrap().unwrap().points, 100);
    }

    #[tokio::test]
    async fn test_award_insert_is_idempotent() {
        let store = MemoryStore::new();
        let award = BadgeAward {
            account_id: "a-1".to_string(),
            badge_id: "first_unit".to_string(),
            earned_at: Utc::now(),
        };
        assert!(store.insert_award(&award).await.unwrap());
        assert!(!store.insert_award(&award).await.unwrap());
        assert_eq!(store.awards_for("a-1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_ranking_rows_cover_all_accounts() {
        let store = MemoryStore::new();
        store.create_account(record("a-1")).await.unwrap();
        store.create_account(record("a-2")).await.unwrap();
        let rows = store.ranking_rows().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(store.account_count().await.unwrap(), 2);
    }
}
