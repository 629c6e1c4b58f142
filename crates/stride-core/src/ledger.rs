//! The progression ledger: sole writer of account records.
//!
//! Applies a completion event to one account as an all-or-nothing unit:
//! points, derived level, streak and stat counters land in a single
//! versioned write. Concurrent calls for the same account serialize
//! through the store's compare-and-swap; a failed swap retries from a
//! fresh read, bounded by configuration. Badge awards follow the
//! committed write and are individually idempotent, so a lost award race
//! or a failed insert never duplicates or rolls anything back.

use crate::account::{AccountRecord, BadgeAward, BadgeStatus, ProgressSnapshot, ProgressionResult, StatDeltas};
use crate::badges::{BadgeCatalog, BadgeDefinition};
use crate::error::StrideError;
use crate::levels;
use crate::store::ProgressStore;
use crate::streak::resolve_streak;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default bound on optimistic-update retries per call.
pub const DEFAULT_MAX_UPDATE_RETRIES: u32 = 32;

/// Default deadline for one `apply_completion` call.
pub const DEFAULT_APPLY_TIMEOUT_MS: u64 = 2_000;

/// Ledger tuning knobs.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    pub max_update_retries: u32,
    pub apply_timeout_ms: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_update_retries: DEFAULT_MAX_UPDATE_RETRIES,
            apply_timeout_ms: DEFAULT_APPLY_TIMEOUT_MS,
        }
    }
}

/// Stateful core of the engine.
pub struct ProgressionLedger {
    store: Arc<dyn ProgressStore>,
    catalog: BadgeCatalog,
    config: LedgerConfig,
}

impl ProgressionLedger {
    pub fn new(store: Arc<dyn ProgressStore>, catalog: BadgeCatalog) -> Self {
        Self::with_config(store, catalog, LedgerConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn ProgressStore>,
        catalog: BadgeCatalog,
        config: LedgerConfig,
    ) -> Self {
        Self {
            store,
            catalog,
            config,
        }
    }

    pub fn catalog(&self) -> &BadgeCatalog {
        &self.catalog
    }

    /// Provisioning hook for the identity layer. Generates an id when
    /// none is supplied.
    pub async fn provision_account(
        &self,
        account_id: Option<String>,
        display_name: &str,
        now: DateTime<Utc>,
    ) -> Result<AccountRecord, StrideError> {
        if display_name.trim().is_empty() {
            return Err(StrideError::InvalidInput(
                "display_name must not be empty".to_string(),
            ));
        }
        let account_id = account_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let record = AccountRecord::new(&account_id, display_name, now);
        self.store.create_account(record.clone()).await?;
        debug!(account_id = %record.account_id, "account provisioned");
        Ok(record)
    }

    /// Apply one completion event to one account.
    ///
    /// Runs under the configured deadline; on expiry nothing has
    /// committed and the caller may retry (point awarding is only
    /// idempotent if the caller deduplicates by event id upstream).
    pub async fn apply_completion(
        &self,
        account_id: &str,
        points_awarded: u64,
        deltas: &StatDeltas,
        now: DateTime<Utc>,
    ) -> Result<ProgressionResult, StrideError> {
        let deadline = Duration::from_millis(self.config.apply_timeout_ms);
        match tokio::time::timeout(
            deadline,
            self.apply_inner(account_id, points_awarded, deltas, now),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(StrideError::Timeout),
        }
    }

    async fn apply_inner(
        &self,
        account_id: &str,
        points_awarded: u64,
        deltas: &StatDeltas,
        now: DateTime<Utc>,
    ) -> Result<ProgressionResult, StrideError> {
        for attempt in 0..self.config.max_update_retries {
            let record = self
                .store
                .load(account_id)
                .await?
                .ok_or_else(|| StrideError::AccountNotFound(account_id.to_string()))?;

            let new_points = record.points.checked_add(points_awarded).ok_or_else(|| {
                StrideError::InvalidInput("point total would overflow".to_string())
            })?;
            let new_level = levels::level_for_points(new_points);
            let streak = resolve_streak(record.last_activity, record.streak, now);

            let mut updated = record.clone();
            updated.points = new_points;
            updated.level = new_level;
            updated.streak = streak.streak;
            updated.last_activity = Some(now);
            updated.units_completed = updated.units_completed.saturating_add(deltas.units_completed);
            updated.perfect_scores = updated.perfect_scores.saturating_add(deltas.perfect_scores);
            updated.camps_completed = updated.camps_completed.saturating_add(deltas.camps_completed);
            updated.ai_sessions = updated.ai_sessions.saturating_add(deltas.ai_sessions);
            updated.version = record.version + 1;

            if !self
                .store
                .update_if_version(&updated, record.version)
                .await?
            {
                debug!(account_id, attempt, "version conflict, retrying from fresh read");
                continue;
            }

            let newly_earned = self.award_new_badges(&updated, now).await;
            return Ok(ProgressionResult {
                new_points,
                new_level,
                leveled_up: new_level > record.level,
                new_streak: streak.streak,
                streak_changed: streak.changed,
                newly_earned,
            });
        }

        Err(StrideError::Contention(account_id.to_string()))
    }

    /// Evaluate the catalog against post-update stats and persist any
    /// newly satisfied badges. The ledger write has already committed;
    /// failures here are logged, not propagated; criteria are monotonic,
    /// so a missed award is recorded on the next qualifying event.
    async fn award_new_badges(
        &self,
        record: &AccountRecord,
        now: DateTime<Utc>,
    ) -> Vec<BadgeDefinition> {
        let earned: HashSet<String> = match self.store.awards_for(&record.account_id).await {
            Ok(awards) => awards.into_iter().map(|a| a.badge_id).collect(),
            Err(e) => {
                warn!(account_id = %record.account_id, error = %e,
                    "could not read earned badges; deferring evaluation to next event");
                return Vec::new();
            }
        };

        let mut newly_earned = Vec::new();
        for badge in self.catalog.newly_satisfied(&record.stats(), &earned) {
            let award = BadgeAward {
                account_id: record.account_id.clone(),
                badge_id: badge.id.clone(),
                earned_at: now,
            };
            match self.store.insert_award(&award).await {
                // Newly recorded: this call won the (account, badge) race.
                Ok(true) => newly_earned.push(badge.clone()),
                // A concurrent evaluation got there first.
                Ok(false) => {}
                Err(e) => {
                    warn!(account_id = %record.account_id, badge_id = %badge.id, error = %e,
                        "badge award not persisted; will retry on next qualifying event");
                }
            }
        }
        newly_earned
    }

    /// Read-only projection for dashboards.
    pub async fn snapshot(&self, account_id: &str) -> Result<ProgressSnapshot, StrideError> {
        let record = self
            .store
            .load(account_id)
            .await?
            .ok_or_else(|| StrideError::AccountNotFound(account_id.to_string()))?;
        Ok(ProgressSnapshot::of(&record))
    }

    /// Full catalog with this account's earned status.
    pub async fn list_badges(&self, account_id: &str) -> Result<Vec<BadgeStatus>, StrideError> {
        if self.store.load(account_id).await?.is_none() {
            return Err(StrideError::AccountNotFound(account_id.to_string()));
        }
        let awards = self.store.awards_for(account_id).await?;
        Ok(self
            .catalog
            .entries()
            .iter()
            .map(|badge| BadgeStatus {
                badge: badge.clone(),
                earned_at: awards
                    .iter()
                    .find(|a| a.badge_id == badge.id)
                    .map(|a| a.earned_at),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::Duration as ChronoDuration;

    fn ledger() -> ProgressionLedger {
        ProgressionLedger::new(Arc::new(MemoryStore::new()), BadgeCatalog::default_catalog())
    }

    fn t0() -> DateTime<Utc> {
        "2026-03-10T12:00:00Z".parse().unwrap()
    }

    #[tokio::test]
    async fn test_apply_to_missing_account_fails() {
        let ledger = ledger();
        let err = ledger
            .apply_completion("ghost", 10, &StatDeltas::default(), t0())
            .await
            .unwrap_err();
        assert!(matches!(err, StrideError::AccountNotFound(_)));
    }

    #[tokio::test]
    async fn test_points_level_streak_update_together() {
        let ledger = ledger();
        ledger
            .provision_account(Some("a-1".to_string()), "Ada", t0())
            .await
            .unwrap();

        let result = ledger
            .apply_completion("a-1", 150, &StatDeltas::default(), t0())
            .await
            .unwrap();
        assert_eq!(result.new_points, 150);
        assert_eq!(result.new_level, 2);
        assert!(result.leveled_up);
        assert_eq!(result.new_streak, 1);
        assert!(result.streak_changed);

        let snap = ledger.snapshot("a-1").await.unwrap();
        assert_eq!(snap.points, 150);
        assert_eq!(snap.level, 2);
        assert_eq!(snap.streak, 1);
        assert_eq!(snap.last_activity, Some(t0()));
    }

    #[tokio::test]
    async fn test_streak_judged_against_stored_last_activity() {
        let ledger = ledger();
        ledger
            .provision_account(Some("a-1".to_string()), "Ada", t0())
            .await
            .unwrap();

        ledger
            .apply_completion("a-1", 10, &StatDeltas::default(), t0())
            .await
            .unwrap();

        // Next day: extends.
        let day2 = t0() + ChronoDuration::hours(30);
        let result = ledger
            .apply_completion("a-1", 10, &StatDeltas::default(), day2)
            .await
            .unwrap();
        assert_eq!(result.new_streak, 2);

        // Second event the same day: judged against day2, not day1.
        let result = ledger
            .apply_completion("a-1", 10, &StatDeltas::default(), day2 + ChronoDuration::hours(1))
            .await
            .unwrap();
        assert_eq!(result.new_streak, 2);
        assert!(!result.streak_changed);
    }

    #[tokio::test]
    async fn test_badge_awarded_exactly_once_on_resubmission() {
        let ledger = ledger();
        ledger
            .provision_account(Some("a-1".to_string()), "Ada", t0())
            .await
            .unwrap();
        let deltas = StatDeltas {
            units_completed: 1,
            ..Default::default()
        };

        let first = ledger.apply_completion("a-1", 150, &deltas, t0()).await.unwrap();
        assert_eq!(
            first
                .newly_earned
                .iter()
                .filter(|b| b.id == "first_unit")
                .count(),
            1
        );

        // Accidental resubmission without upstream dedup: points move,
        // the badge does not.
        let second = ledger.apply_completion("a-1", 150, &deltas, t0()).await.unwrap();
        assert_eq!(second.new_points, 300);
        assert!(second.newly_earned.iter().all(|b| b.id != "first_unit"));
    }

    #[tokio::test]
    async fn test_list_badges_reports_earned_status() {
        let ledger = ledger();
        ledger
            .provision_account(Some("a-1".to_string()), "Ada", t0())
            .await
            .unwrap();
        let deltas = StatDeltas {
            units_completed: 1,
            ..Default::default()
        };
        ledger.apply_completion("a-1", 10, &deltas, t0()).await.unwrap();

        let statuses = ledger.list_badges("a-1").await.unwrap();
        assert_eq!(statuses.len(), ledger.catalog().len());
        let first_unit = statuses.iter().find(|s| s.badge.id == "first_unit").unwrap();
        assert_eq!(first_unit.earned_at, Some(t0()));
        let ten_units = statuses.iter().find(|s| s.badge.id == "ten_units").unwrap();
        assert!(ten_units.earned_at.is_none());
    }

    #[tokio::test]
    async fn test_provision_rejects_empty_display_name() {
        let ledger = ledger();
        let err = ledger
            .provision_account(None, "  ", t0())
            .await
            .unwrap_err();
        assert!(matches!(err, StrideError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_provision_generates_id_when_absent() {
        let ledger = ledger();
        let record = ledger.provision_account(None, "Ada", t0()).await.unwrap();
        assert!(!record.account_id.is_empty());
        assert_eq!(record.level, 1);
    }
}
