//! Account progression records and completion-event results.
//!
//! One `AccountRecord` per account; mutated only by the progression
//! ledger. The `version` field is the optimistic-concurrency token the
//! store checks on every write. It never leaves the engine.

use crate::badges::{AccountStats, BadgeDefinition};
use crate::levels;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Durable per-account progression state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRecord {
    /// Opaque unique id supplied by the identity layer
    pub account_id: String,
    /// Name shown on the ranking
    pub display_name: String,
    /// Creation instant; ranking tie-break (older ranks higher)
    pub created_at: DateTime<Utc>,
    /// Total points; never decreases through engine operation
    pub points: u64,
    /// Cached projection of `points`; recomputed on every write
    pub level: u32,
    /// Consecutive-day activity streak
    pub streak: u32,
    /// Instant of the last completion event, if any
    pub last_activity: Option<DateTime<Utc>>,
    pub units_completed: u64,
    pub perfect_scores: u64,
    pub camps_completed: u64,
    pub ai_sessions: u64,
    /// Optimistic-concurrency token, bumped on every committed write
    #[serde(skip)]
    pub version: u64,
}

impl AccountRecord {
    /// Fresh record for a newly provisioned account.
    pub fn new(account_id: &str, display_name: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            account_id: account_id.to_string(),
            display_name: display_name.to_string(),
            created_at,
            points: 0,
            level: levels::level_for_points(0),
            streak: 0,
            last_activity: None,
            units_completed: 0,
            perfect_scores: 0,
            camps_completed: 0,
            ai_sessions: 0,
            version: 0,
        }
    }

    /// Stats projection for badge evaluation.
    pub fn stats(&self) -> AccountStats {
        AccountStats {
            points: self.points,
            level: self.level,
            streak: self.streak,
            units_completed: self.units_completed,
            perfect_scores: self.perfect_scores,
            camps_completed: self.camps_completed,
            ai_sessions: self.ai_sessions,
        }
    }
}

/// Stat counter increments carried by a completion event.
///
/// All fields default to zero so callers only name what changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatDeltas {
    #[serde(default)]
    pub units_completed: u64,
    #[serde(default)]
    pub perfect_scores: u64,
    #[serde(default)]
    pub camps_completed: u64,
    #[serde(default)]
    pub ai_sessions: u64,
}

impl StatDeltas {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Result of applying one completion event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressionResult {
    pub new_points: u64,
    pub new_level: u32,
    pub leveled_up: bool,
    pub new_streak: u32,
    pub streak_changed: bool,
    pub newly_earned: Vec<BadgeDefinition>,
}

/// An earned badge: unique per (account, badge), written exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadgeAward {
    pub account_id: String,
    pub badge_id: String,
    pub earned_at: DateTime<Utc>,
}

/// Catalog entry plus this account's earned status, for badge listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BadgeStatus {
    pub badge: BadgeDefinition,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub earned_at: Option<DateTime<Utc>>,
}

/// Read-only projection for dashboards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub account_id: String,
    pub display_name: String,
    pub points: u64,
    pub level: u32,
    pub streak: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<DateTime<Utc>>,
    pub points_to_next_level: u64,
    pub progress_percent: u8,
}

impl ProgressSnapshot {
    pub fn of(record: &AccountRecord) -> Self {
        Self {
            account_id: record.account_id.clone(),
            display_name: record.display_name.clone(),
            points: record.points,
            level: record.level,
            streak: record.streak,
            last_activity: record.last_activity,
            points_to_next_level: levels::points_to_next(record.points),
            progress_percent: levels::progress_percent(record.points),
        }
    }
}
