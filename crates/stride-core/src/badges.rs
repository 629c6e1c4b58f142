//! Achievement badges for the Stride progression system.
//!
//! Badge criteria are monotonic thresholds over tracked stats: once an
//! account satisfies one it keeps satisfying it, which is what makes
//! award insertion safely re-attemptable at any later event.
//!
//! The evaluator is pure. It reports which catalog entries are newly
//! satisfied; persisting awards is the ledger's job.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Typed threshold predicate over one tracked stat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "stat", content = "threshold")]
pub enum BadgeCriterion {
    Points(u64),
    Level(u32),
    StreakDays(u32),
    UnitsCompleted(u64),
    PerfectScores(u64),
    CampsCompleted(u64),
    AiSessions(u64),
}

impl BadgeCriterion {
    pub fn is_satisfied(&self, stats: &AccountStats) -> bool {
        match *self {
            BadgeCriterion::Points(n) => stats.points >= n,
            BadgeCriterion::Level(n) => stats.level >= n,
            BadgeCriterion::StreakDays(n) => stats.streak >= n,
            BadgeCriterion::UnitsCompleted(n) => stats.units_completed >= n,
            BadgeCriterion::PerfectScores(n) => stats.perfect_scores >= n,
            BadgeCriterion::CampsCompleted(n) => stats.camps_completed >= n,
            BadgeCriterion::AiSessions(n) => stats.ai_sessions >= n,
        }
    }
}

/// The stats slice the evaluator reads; a projection of the account record
/// after the triggering update has been applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountStats {
    pub points: u64,
    pub level: u32,
    pub streak: u32,
    pub units_completed: u64,
    pub perfect_scores: u64,
    pub camps_completed: u64,
    pub ai_sessions: u64,
}

/// Badge catalog entry, immutable at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadgeDefinition {
    /// Unique identifier
    pub id: String,
    /// ASCII badge symbol (e.g., "[1]", "<7d>")
    pub symbol: String,
    /// Short name
    pub name: String,
    /// Description of how to earn it
    pub description: String,
    /// Unlock criterion
    pub criterion: BadgeCriterion,
}

impl BadgeDefinition {
    fn new(id: &str, symbol: &str, name: &str, desc: &str, criterion: BadgeCriterion) -> Self {
        Self {
            id: id.to_string(),
            symbol: symbol.to_string(),
            name: name.to_string(),
            description: desc.to_string(),
            criterion,
        }
    }
}

/// Ordered badge catalog.
#[derive(Debug, Clone)]
pub struct BadgeCatalog {
    entries: Vec<BadgeDefinition>,
}

impl BadgeCatalog {
    pub fn new(entries: Vec<BadgeDefinition>) -> Self {
        Self { entries }
    }

    /// The built-in catalog.
    pub fn default_catalog() -> Self {
        use BadgeCriterion::*;
        Self::new(vec![
            // Unit milestones
            BadgeDefinition::new("first_unit", "[1]", "First Steps", "Complete your first unit", UnitsCompleted(1)),
            BadgeDefinition::new("ten_units", "[10]", "Getting Going", "Complete 10 units", UnitsCompleted(10)),
            BadgeDefinition::new("fifty_units", "[50]", "Regular Learner", "Complete 50 units", UnitsCompleted(50)),
            BadgeDefinition::new("hundred_units", "[100]", "Course Devourer", "Complete 100 units", UnitsCompleted(100)),
            // Streaks
            BadgeDefinition::new("streak_3", "<3d>", "On Fire", "Maintain a 3-day streak", StreakDays(3)),
            BadgeDefinition::new("streak_7", "<7d>", "Week Warrior", "Maintain a 7-day streak", StreakDays(7)),
            BadgeDefinition::new("streak_30", "<30d>", "Monthly Master", "Maintain a 30-day streak", StreakDays(30)),
            // Points and levels
            BadgeDefinition::new("points_1k", "(1k)", "Point Collector", "Earn 1,000 points", Points(1_000)),
            BadgeDefinition::new("points_10k", "(10k)", "Point Hoarder", "Earn 10,000 points", Points(10_000)),
            BadgeDefinition::new("level_5", "|L5|", "Climbing", "Reach level 5", Level(5)),
            BadgeDefinition::new("level_10", "|L10|", "Seasoned", "Reach level 10", Level(10)),
            // Quality
            BadgeDefinition::new("perfect_10", "(10!)", "Perfectionist", "Get 10 perfect scores", PerfectScores(10)),
            // Camps
            BadgeDefinition::new("first_camp", "{c}", "Camper", "Finish your first camp", CampsCompleted(1)),
            BadgeDefinition::new("five_camps", "{c5}", "Trailblazer", "Finish 5 camps", CampsCompleted(5)),
            // AI practice
            BadgeDefinition::new("ai_10", "~ai~", "Conversationalist", "Hold 10 AI practice sessions", AiSessions(10)),
            BadgeDefinition::new("ai_100", "~ai+~", "Fluent Talker", "Hold 100 AI practice sessions", AiSessions(100)),
        ])
    }

    pub fn entries(&self) -> &[BadgeDefinition] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&BadgeDefinition> {
        self.entries.iter().find(|b| b.id == id)
    }

    /// Catalog entries newly satisfied by `stats` that are not in
    /// `already_earned`, in catalog order.
    pub fn newly_satisfied(
        &self,
        stats: &AccountStats,
        already_earned: &HashSet<String>,
    ) -> Vec<&BadgeDefinition> {
        self.entries
            .iter()
            .filter(|b| !already_earned.contains(&b.id))
            .filter(|b| b.criterion.is_satisfied(stats))
            .collect()
    }
}

impl Default for BadgeCatalog {
    fn default() -> Self {
        Self::default_catalog()
    }
}
