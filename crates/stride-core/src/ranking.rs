//! Global ranking view.
//!
//! Read-only. Orders the whole account pool by the key
//! `(points desc, created_at asc, account_id asc)` and answers paging and
//! rank queries from one self-consistent snapshot, so a page never mixes
//! pre- and post-update fields of the same account.
//!
//! Rank is position-in-sequence under that key, not a strictly-greater
//! count, so `page` and `rank_of` can never disagree about tie handling.
//! A configurable max age lets deployments serve a cached snapshot; a
//! rebuilt snapshot never replaces a newer one, so an account's own
//! points cannot appear to regress across successive calls.

use crate::error::StrideError;
use crate::store::{ProgressStore, RankingRow};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// One row of the global ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub rank: u64,
    pub account_id: String,
    pub display_name: String,
    pub points: u64,
    pub level: u32,
    pub streak: u32,
}

/// Largest page a single call returns.
pub const MAX_PAGE_LIMIT: usize = 100;

struct Snapshot {
    built_at: Instant,
    rows: Vec<RankingRow>,
}

pub struct RankingView {
    store: Arc<dyn ProgressStore>,
    max_age: Duration,
    cached: RwLock<Option<Arc<Snapshot>>>,
}

/// Strict total order: points descending, then account age (older first),
/// then account id as the final tie-break.
fn ranking_order(a: &RankingRow, b: &RankingRow) -> Ordering {
    b.points
        .cmp(&a.points)
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.account_id.cmp(&b.account_id))
}

impl RankingView {
    /// A view that reads fresh on every call.
    pub fn new(store: Arc<dyn ProgressStore>) -> Self {
        Self::with_max_age(store, Duration::ZERO)
    }

    /// A view that may serve a snapshot up to `max_age` old.
    pub fn with_max_age(store: Arc<dyn ProgressStore>, max_age: Duration) -> Self {
        Self {
            store,
            max_age,
            cached: RwLock::new(None),
        }
    }

    async fn snapshot(&self) -> Result<Arc<Snapshot>, StrideError> {
        if !self.max_age.is_zero() {
            let cached = self.cached.read().await;
            if let Some(snapshot) = cached.as_ref() {
                if snapshot.built_at.elapsed() < self.max_age {
                    return Ok(Arc::clone(snapshot));
                }
            }
        }

        let mut rows = self.store.ranking_rows().await?;
        rows.sort_by(ranking_order);
        let fresh = Arc::new(Snapshot {
            built_at: Instant::now(),
            rows,
        });

        let mut cached = self.cached.write().await;
        match cached.as_ref() {
            // A concurrent rebuild may have won; keep whichever is newer.
            Some(existing) if existing.built_at >= fresh.built_at => Ok(Arc::clone(existing)),
            _ => {
                *cached = Some(Arc::clone(&fresh));
                Ok(fresh)
            }
        }
    }

    /// Page of the global ranking. `limit` is clamped to [`MAX_PAGE_LIMIT`].
    pub async fn page(&self, offset: usize, limit: usize) -> Result<Vec<RankingEntry>, StrideError> {
        let snapshot = self.snapshot().await?;
        Ok(snapshot
            .rows
            .iter()
            .enumerate()
            .skip(offset)
            .take(limit.min(MAX_PAGE_LIMIT))
            .map(|(index, row)| RankingEntry {
                rank: index as u64 + 1,
                account_id: row.account_id.clone(),
                display_name: row.display_name.clone(),
                points: row.points,
                level: row.level,
                streak: row.streak,
            })
            .collect())
    }

    /// This account's rank, or `None` if the account is unknown.
    pub async fn rank_of(&self, account_id: &str) -> Result<Option<u64>, StrideError> {
        let snapshot = self.snapshot().await?;
        Ok(snapshot
            .rows
            .iter()
            .position(|row| row.account_id == account_id)
            .map(|index| index as u64 + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn row(id: &str, points: u64, created_at: &str) -> RankingRow {
        RankingRow {
            account_id: id.to_string(),
            display_name: id.to_string(),
            points,
            level: 1,
            streak: 0,
            created_at: created_at.parse::<DateTime<Utc>>().unwrap(),
        }
    }

    #[test]
    fn test_order_points_descending() {
        let a = row("a", 500, "2026-01-01T00:00:00Z");
        let c = row("c", 700, "2026-01-03T00:00:00Z");
        assert_eq!(ranking_order(&c, &a), Ordering::Less);
    }

    #[test]
    fn test_order_ties_by_creation_then_id() {
        let a = row("a", 500, "2026-01-01T00:00:00Z");
        let b = row("b", 500, "2026-01-02T00:00:00Z");
        assert_eq!(ranking_order(&a, &b), Ordering::Less);

        let twin = row("b2", 500, "2026-01-01T00:00:00Z");
        let twin2 = row("b1", 500, "2026-01-01T00:00:00Z");
        assert_eq!(ranking_order(&twin2, &twin), Ordering::Less);
    }
}
