//! Shared types and engine logic for Stride components.
//!
//! Stride is a gamified course-progress tracker. This crate is its
//! progression and ranking engine: completion events become durable
//! per-account state (points, level, streak, stat counters) plus two
//! derived views (badge awards, global ranking), correct under
//! concurrent updates for the same or different accounts.

pub mod account;
pub mod badges;
pub mod error;
pub mod ledger;
pub mod levels;
pub mod ranking;
pub mod rpc;
pub mod store;
pub mod store_sqlite;
pub mod streak;

pub use account::{
    AccountRecord, BadgeAward, BadgeStatus, ProgressSnapshot, ProgressionResult, StatDeltas,
};
pub use badges::{AccountStats, BadgeCatalog, BadgeCriterion, BadgeDefinition};
pub use error::StrideError;
pub use ledger::{LedgerConfig, ProgressionLedger};
pub use ranking::{RankingEntry, RankingView};
pub use rpc::{RpcError, RpcMethod, RpcRequest, RpcResponse};
pub use store::{MemoryStore, ProgressStore, RankingRow};
pub use store_sqlite::SqliteStore;
pub use streak::{resolve_streak, StreakUpdate};

/// Socket path for strided
pub const SOCKET_PATH: &str = "/run/stride/stride.sock";

/// State directory for Stride
pub const STATE_DIR: &str = "/var/lib/stride";
