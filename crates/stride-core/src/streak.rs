//! Daily-activity streak resolution.
//!
//! Pure policy over the wall-clock gap since the stored last-activity
//! instant. The resolver never writes `last_activity` itself; the ledger
//! records `last_activity = now` together with the resolved streak in the
//! same atomic update, so two events straddling a window boundary are
//! each judged against the value that was stored when they were applied.

use chrono::{DateTime, Utc};

/// Gap below this keeps the streak untouched (same activity day).
pub const KEEP_WINDOW_HOURS: i64 = 24;

/// Gap below this (and at least [`KEEP_WINDOW_HOURS`]) extends the streak.
pub const EXTEND_WINDOW_HOURS: i64 = 48;

/// Outcome of resolving a streak against one activity instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakUpdate {
    pub streak: u32,
    pub changed: bool,
}

/// Resolve the streak for an event at `now`.
///
/// - no prior activity: the streak starts at 1
/// - under 24h elapsed: unchanged (multiple completions in one day must
///   not double-increment)
/// - 24h to under 48h: consecutive day, streak + 1
/// - 48h or more: a full day was missed, reset to 1
///
/// A clock that moved backwards lands in the under-24h branch: it must
/// never reset anyone's streak.
pub fn resolve_streak(
    last_activity: Option<DateTime<Utc>>,
    current_streak: u32,
    now: DateTime<Utc>,
) -> StreakUpdate {
    let Some(last) = last_activity else {
        return StreakUpdate {
            streak: 1,
            changed: true,
        };
    };

    let hours = (now - last).num_hours();
    if hours < KEEP_WINDOW_HOURS {
        StreakUpdate {
            streak: current_streak,
            changed: false,
        }
    } else if hours < EXTEND_WINDOW_HOURS {
        StreakUpdate {
            streak: current_streak.saturating_add(1),
            changed: true,
        }
    } else {
        StreakUpdate {
            streak: 1,
            changed: true,
        }
    }
}
