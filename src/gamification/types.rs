//! Points ledger and achievement types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reason a points transaction was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Achievement,
    CourseCompletion,
    AssessmentCompletion,
    LoginStreak,
    ContentCreation,
    ForumParticipation,
    Custom,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Achievement => "achievement",
            TransactionKind::CourseCompletion => "course_completion",
            TransactionKind::AssessmentCompletion => "assessment_completion",
            TransactionKind::LoginStreak => "login_streak",
            TransactionKind::ContentCreation => "content_creation",
            TransactionKind::ForumParticipation => "forum_participation",
            TransactionKind::Custom => "custom",
        }
    }

    pub fn from_str(s: &str) -> Option<TransactionKind> {
        match s {
            "achievement" => Some(TransactionKind::Achievement),
            "course_completion" => Some(TransactionKind::CourseCompletion),
            "assessment_completion" => Some(TransactionKind::AssessmentCompletion),
            "login_streak" => Some(TransactionKind::LoginStreak),
            "content_creation" => Some(TransactionKind::ContentCreation),
            "forum_participation" => Some(TransactionKind::ForumParticipation),
            "custom" => Some(TransactionKind::Custom),
            _ => None,
        }
    }
}

/// One row of the append-only points ledger. Points are signed: deductions
/// are negative amounts, never deletions of earlier rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointsTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub points: i64,
    pub kind: TransactionKind,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Rule deciding when an achievement unlocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AchievementCriteria {
    CourseCompletions(u32),
    LoginStreakDays(u32),
    TotalPoints(i64),
    ForumPosts(u32),
}

impl AchievementCriteria {
    /// Stable (type, value) pair stored in the database.
    pub fn as_parts(&self) -> (&'static str, i64) {
        match self {
            AchievementCriteria::CourseCompletions(n) => ("course_completions", *n as i64),
            AchievementCriteria::LoginStreakDays(n) => ("login_streak_days", *n as i64),
            AchievementCriteria::TotalPoints(n) => ("total_points", *n),
            AchievementCriteria::ForumPosts(n) => ("forum_posts", *n as i64),
        }
    }

    /// Rebuild from the stored pair.
    pub fn from_parts(criteria_type: &str, value: i64) -> Option<AchievementCriteria> {
        match criteria_type {
            "course_completions" => Some(AchievementCriteria::CourseCompletions(value as u32)),
            "login_streak_days" => Some(AchievementCriteria::LoginStreakDays(value as u32)),
            "total_points" => Some(AchievementCriteria::TotalPoints(value)),
            "forum_posts" => Some(AchievementCriteria::ForumPosts(value as u32)),
            _ => None,
        }
    }
}

/// An achievement rule definition.
#[derive(Debug, Clone)]
pub struct Achievement {
    pub id: String,
    pub name: String,
    pub description: String,
    pub criteria: AchievementCriteria,
    /// Points awarded on unlock.
    pub points: i64,
}

/// An achievement a user has unlocked.
#[derive(Debug, Clone)]
pub struct UnlockedAchievement {
    pub achievement: Achievement,
    pub unlocked_at: DateTime<Utc>,
}

/// Snapshot of the activity counters the unlock rules read.
///
/// Course completions, streaks, and forum posts live outside this crate's
/// tables; callers pass the current counters in.
#[derive(Debug, Clone, Copy, Default)]
pub struct StudentStats {
    pub course_completions: u32,
    pub login_streak_days: u32,
    pub forum_posts: u32,
}

/// Achievement rules seeded on first run.
pub fn default_achievements() -> Vec<Achievement> {
    vec![
        Achievement {
            id: "primeiro-curso".to_string(),
            name: "Primeiro Curso".to_string(),
            description: "Conclua o seu primeiro curso".to_string(),
            criteria: AchievementCriteria::CourseCompletions(1),
            points: 50,
        },
        Achievement {
            id: "maratonista".to_string(),
            name: "Maratonista".to_string(),
            description: "Conclua dez cursos".to_string(),
            criteria: AchievementCriteria::CourseCompletions(10),
            points: 300,
        },
        Achievement {
            id: "sequencia-7".to_string(),
            name: "Uma Semana de Foco".to_string(),
            description: "Acesse a plataforma por sete dias seguidos".to_string(),
            criteria: AchievementCriteria::LoginStreakDays(7),
            points: 70,
        },
        Achievement {
            id: "sequencia-30".to_string(),
            name: "Um Mês de Dedicação".to_string(),
            description: "Acesse a plataforma por trinta dias seguidos".to_string(),
            criteria: AchievementCriteria::LoginStreakDays(30),
            points: 250,
        },
        Achievement {
            id: "mil-pontos".to_string(),
            name: "Clube dos Mil".to_string(),
            description: "Acumule mil pontos".to_string(),
            criteria: AchievementCriteria::TotalPoints(1000),
            points: 100,
        },
        Achievement {
            id: "voz-ativa".to_string(),
            name: "Voz Ativa".to_string(),
            description: "Publique dez mensagens no fórum".to_string(),
            criteria: AchievementCriteria::ForumPosts(10),
            points: 40,
        },
    ]
}
