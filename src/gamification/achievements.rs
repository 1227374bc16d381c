//! Achievement rules and unlock checks.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::ledger::PointsLedger;
use super::types::{
    Achievement, AchievementCriteria, StudentStats, TransactionKind, UnlockedAchievement,
};

/// Manager for achievement rules and per-user unlocks.
pub struct AchievementManager<'a> {
    conn: &'a Connection,
}

impl<'a> AchievementManager<'a> {
    /// Create a new achievement manager with a database connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Seed the default achievement rules if not present.
    pub fn initialize_achievements(&self) -> Result<(), AchievementError> {
        for achievement in super::types::default_achievements() {
            let (criteria_type, criteria_value) = achievement.criteria.as_parts();
            self.conn
                .execute(
                    "INSERT OR IGNORE INTO achievements
                     (id, name, description, criteria_type, criteria_value, points)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        achievement.id,
                        achievement.name,
                        achievement.description,
                        criteria_type,
                        criteria_value,
                        achievement.points,
                    ],
                )
                .map_err(|e| AchievementError::Database(e.to_string()))?;
        }

        Ok(())
    }

    /// Get all achievement rules.
    pub fn all(&self) -> Result<Vec<Achievement>, AchievementError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, name, description, criteria_type, criteria_value, points
                 FROM achievements",
            )
            .map_err(|e| AchievementError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], parse_achievement_row)
            .map_err(|e| AchievementError::Database(e.to_string()))?;

        let mut achievements = Vec::new();
        for row in rows {
            achievements.push(row.map_err(|e| AchievementError::Database(e.to_string()))?);
        }

        Ok(achievements)
    }

    /// Achievements a user has unlocked, most recent first.
    pub fn unlocked_for(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<UnlockedAchievement>, AchievementError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT a.id, a.name, a.description, a.criteria_type, a.criteria_value, a.points,
                        ua.unlocked_at
                 FROM achievements a
                 JOIN user_achievements ua ON a.id = ua.achievement_id
                 WHERE ua.user_id = ?1
                 ORDER BY ua.unlocked_at DESC",
            )
            .map_err(|e| AchievementError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![user_id.to_string()], |row| {
                let achievement = parse_achievement_row(row)?;
                let unlocked_str: String = row.get(6)?;
                let unlocked_at = DateTime::parse_from_rfc3339(&unlocked_str)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            6,
                            rusqlite::types::Type::Text,
                            Box::new(e),
                        )
                    })?;
                Ok(UnlockedAchievement {
                    achievement,
                    unlocked_at,
                })
            })
            .map_err(|e| AchievementError::Database(e.to_string()))?;

        let mut unlocked = Vec::new();
        for row in rows {
            unlocked.push(row.map_err(|e| AchievementError::Database(e.to_string()))?);
        }

        Ok(unlocked)
    }

    /// Evaluate every rule against the user's current state and unlock the
    /// ones newly satisfied.
    ///
    /// Each unlock also awards the achievement's points through the ledger.
    /// Idempotent: a second call with no intervening state change returns
    /// an empty list.
    pub fn check_for_achievements(
        &self,
        user_id: Uuid,
        stats: &StudentStats,
    ) -> Result<Vec<Achievement>, AchievementError> {
        let ledger = PointsLedger::new(self.conn);
        let total_points = ledger
            .user_points(user_id)
            .map_err(|e| AchievementError::Database(e.to_string()))?;

        let unlocked_ids: Vec<String> = self
            .unlocked_for(user_id)?
            .iter()
            .map(|u| u.achievement.id.clone())
            .collect();

        let mut newly_unlocked = Vec::new();

        for achievement in self.all()? {
            if unlocked_ids.contains(&achievement.id) {
                continue;
            }

            let meets_criteria = match achievement.criteria {
                AchievementCriteria::CourseCompletions(n) => stats.course_completions >= n,
                AchievementCriteria::LoginStreakDays(n) => stats.login_streak_days >= n,
                AchievementCriteria::TotalPoints(n) => total_points >= n,
                AchievementCriteria::ForumPosts(n) => stats.forum_posts >= n,
            };

            if meets_criteria {
                self.unlock(user_id, &achievement)?;
                ledger
                    .award(
                        user_id,
                        achievement.points,
                        TransactionKind::Achievement,
                        Some(&achievement.name),
                    )
                    .map_err(|e| AchievementError::Database(e.to_string()))?;
                newly_unlocked.push(achievement);
            }
        }

        Ok(newly_unlocked)
    }

    /// Record an unlock for a user.
    fn unlock(&self, user_id: Uuid, achievement: &Achievement) -> Result<(), AchievementError> {
        let now = Utc::now();

        self.conn
            .execute(
                "INSERT INTO user_achievements (id, user_id, achievement_id, unlocked_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    Uuid::new_v4().to_string(),
                    user_id.to_string(),
                    achievement.id,
                    now.to_rfc3339(),
                ],
            )
            .map_err(|e| AchievementError::Database(e.to_string()))?;

        tracing::info!(user = %user_id, achievement = %achievement.id, "Achievement unlocked");

        Ok(())
    }
}

fn parse_achievement_row(row: &rusqlite::Row) -> rusqlite::Result<Achievement> {
    let criteria_type: String = row.get(3)?;
    let criteria_value: i64 = row.get(4)?;

    Ok(Achievement {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        criteria: AchievementCriteria::from_parts(&criteria_type, criteria_value).ok_or_else(
            || {
                rusqlite::Error::FromSqlConversionFailure(
                    3,
                    rusqlite::types::Type::Text,
                    format!("unknown criteria type: {}", criteria_type).into(),
                )
            },
        )?,
        points: row.get(5)?,
    })
}

/// Achievement errors.
#[derive(Debug, thiserror::Error)]
pub enum AchievementError {
    #[error("Achievement not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),
}
