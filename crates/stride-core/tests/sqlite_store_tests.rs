//! SQLite store tests: behavioural parity with the in-memory store plus
//! durability across reopen.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use stride_core::account::{AccountRecord, BadgeAward, StatDeltas};
use stride_core::badges::BadgeCatalog;
use stride_core::error::StrideError;
use stride_core::ledger::ProgressionLedger;
use stride_core::ranking::RankingView;
use stride_core::store::ProgressStore;
use stride_core::store_sqlite::SqliteStore;
use tempfile::tempdir;

fn t0() -> DateTime<Utc> {
    "2026-03-10T12:00:00Z".parse().unwrap()
}

#[tokio::test]
async fn test_create_load_round_trip() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let mut record = AccountRecord::new("a-1", "Ada", t0());
    record.points = 250;
    record.level = 2;
    record.last_activity = Some(t0());
    store.create_account(record.clone()).await.unwrap();

    let loaded = store.load("a-1").await.unwrap().unwrap();
    assert_eq!(loaded, record);
    assert!(store.load("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_duplicate_create_rejected() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    store
        .create_account(AccountRecord::new("a-1", "Ada", t0()))
        .await
        .unwrap();
    let err = store
        .create_account(AccountRecord::new("a-1", "Ada again", t0()))
        .await
        .unwrap_err();
    assert!(matches!(err, StrideError::InvalidInput(_)));
}

#[tokio::test]
async fn test_versioned_update_rejects_stale_writer() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    store
        .create_account(AccountRecord::new("a-1", "Ada", t0()))
        .await
        .unwrap();

    let mut updated = store.load("a-1").await.unwrap().unwrap();
    updated.points = 100;
    updated.version = 1;
    assert!(store.update_if_version(&updated, 0).await.unwrap());

    let mut stale = updated.clone();
    stale.points = 999;
    assert!(!store.update_if_version(&stale, 0).await.unwrap());

    let current = store.load("a-1").await.unwrap().unwrap();
    assert_eq!(current.points, 100);
    assert_eq!(current.version, 1);
}

#[tokio::test]
async fn test_award_unique_per_account_badge_pair() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let award = BadgeAward {
        account_id: "a-1".to_string(),
        badge_id: "first_unit".to_string(),
        earned_at: t0(),
    };
    assert!(store.insert_award(&award).await.unwrap());
    assert!(!store.insert_award(&award).await.unwrap());

    // Same badge for another account is a different fact.
    let other = BadgeAward {
        account_id: "a-2".to_string(),
        ..award.clone()
    };
    assert!(store.insert_award(&other).await.unwrap());

    let awards = store.awards_for("a-1").await.unwrap();
    assert_eq!(awards.len(), 1);
    assert_eq!(awards[0].earned_at, t0());
}

#[tokio::test]
async fn test_ledger_end_to_end_on_sqlite() {
    let store: Arc<dyn ProgressStore> = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let ledger = ProgressionLedger::new(Arc::clone(&store), BadgeCatalog::default_catalog());
    ledger
        .provision_account(Some("a-1".to_string()), "Ada", t0())
        .await
        .unwrap();

    let deltas = StatDeltas {
        units_completed: 1,
        ..Default::default()
    };
    let first = ledger.apply_completion("a-1", 150, &deltas, t0()).await.unwrap();
    assert_eq!(first.new_points, 150);
    assert!(first.newly_earned.iter().any(|b| b.id == "first_unit"));

    let second = ledger.apply_completion("a-1", 150, &deltas, t0()).await.unwrap();
    assert_eq!(second.new_points, 300);
    assert!(second.newly_earned.iter().all(|b| b.id != "first_unit"));
}

#[tokio::test]
async fn test_state_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("progress.db");

    {
        let store: Arc<dyn ProgressStore> = Arc::new(SqliteStore::open(&path).await.unwrap());
        let ledger = ProgressionLedger::new(Arc::clone(&store), BadgeCatalog::default_catalog());
        ledger
            .provision_account(Some("a-1".to_string()), "Ada", t0())
            .await
            .unwrap();
        let deltas = StatDeltas {
            units_completed: 1,
            ..Default::default()
        };
        ledger.apply_completion("a-1", 150, &deltas, t0()).await.unwrap();
    }

    let store = SqliteStore::open(&path).await.unwrap();
    let record = store.load("a-1").await.unwrap().unwrap();
    assert_eq!(record.points, 150);
    assert_eq!(record.level, 2);
    assert_eq!(record.units_completed, 1);
    assert_eq!(record.version, 1);

    let awards = store.awards_for("a-1").await.unwrap();
    assert_eq!(awards.len(), 1);
    assert_eq!(awards[0].badge_id, "first_unit");
}

#[tokio::test]
async fn test_ranking_parity_with_memory_semantics() {
    let store: Arc<dyn ProgressStore> = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let ledger = ProgressionLedger::new(Arc::clone(&store), BadgeCatalog::default_catalog());

    ledger
        .provision_account(Some("A".to_string()), "Ada", t0())
        .await
        .unwrap();
    ledger
        .provision_account(
            Some("B".to_string()),
            "Blaise",
            t0() + chrono::Duration::minutes(5),
        )
        .await
        .unwrap();
    ledger
        .provision_account(
            Some("C".to_string()),
            "Curie",
            t0() + chrono::Duration::minutes(10),
        )
        .await
        .unwrap();
    ledger
        .apply_completion("A", 500, &StatDeltas::default(), t0())
        .await
        .unwrap();
    ledger
        .apply_completion("B", 500, &StatDeltas::default(), t0())
        .await
        .unwrap();
    ledger
        .apply_completion("C", 700, &StatDeltas::default(), t0())
        .await
        .unwrap();

    let view = RankingView::new(store);
    let page = view.page(0, 10).await.unwrap();
    let ids: Vec<&str> = page.iter().map(|e| e.account_id.as_str()).collect();
    assert_eq!(ids, vec!["C", "A", "B"]);
    assert_eq!(view.rank_of("B").await.unwrap(), Some(3));
}
