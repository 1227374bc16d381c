//! Gamification: the points ledger and achievement unlocking.

pub mod achievements;
pub mod ledger;
pub mod types;

pub use achievements::{AchievementError, AchievementManager};
pub use ledger::{LedgerError, PointsLedger};
pub use types::{
    default_achievements, Achievement, AchievementCriteria, PointsTransaction, StudentStats,
    TransactionKind, UnlockedAchievement,
};
