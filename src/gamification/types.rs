//! Core types for drills, completions and badges.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Player record with the point total and aggregate counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    /// Lifetime points, never decreases.
    pub points: u64,
    pub stats: UserStats,
    /// Calendar day of the most recent completion, in the configured offset.
    pub last_completed_on: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new player with zero points.
    pub fn new(id: Uuid, name: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name,
            points: 0,
            stats: UserStats::default(),
            last_completed_on: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Aggregate counters used by threshold badges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub current_streak: u32,
    pub total_reps: u32,
    pub sessions_completed: u32,
}

/// A training exercise created by a coach.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Drill {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub points_per_rep: u32,
    /// Flat points for finishing a session of this drill.
    pub completion_bonus: u32,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Drill {
    /// Points awarded for completing `reps` repetitions.
    pub fn points_for(&self, reps: u32) -> u64 {
        u64::from(self.points_per_rep) * u64::from(reps) + u64::from(self.completion_bonus)
    }
}

/// One completed drill. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrillCompletion {
    pub id: Uuid,
    pub user_id: Uuid,
    pub drill_id: Uuid,
    pub reps: u32,
    pub points_awarded: u64,
    pub completed_at: DateTime<Utc>,
}

/// How a badge is earned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UnlockType {
    /// Current streak reaches the threshold
    Streak,
    /// Total reps reach the threshold
    Reps,
    /// Completed sessions reach the threshold
    Drills,
    /// Named pattern over the completion history
    Special,
    /// Unrecognized value from the catalog; never eligible
    Other(String),
}

impl UnlockType {
    pub fn as_str(&self) -> &str {
        match self {
            UnlockType::Streak => "streak",
            UnlockType::Reps => "reps",
            UnlockType::Drills => "drills",
            UnlockType::Special => "special",
            UnlockType::Other(s) => s,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "streak" => UnlockType::Streak,
            "reps" => UnlockType::Reps,
            "drills" => UnlockType::Drills,
            "special" => UnlockType::Special,
            other => UnlockType::Other(other.to_string()),
        }
    }
}

impl From<String> for UnlockType {
    fn from(s: String) -> Self {
        UnlockType::parse(&s)
    }
}

impl From<UnlockType> for String {
    fn from(t: UnlockType) -> Self {
        t.as_str().to_string()
    }
}

impl std::fmt::Display for UnlockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Badge definition from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub unlock_type: UnlockType,
    /// Threshold for streak/reps/drills badges. Unused for special badges.
    pub unlock_value: i64,
}

impl Badge {
    fn new(
        id: &str,
        name: &str,
        description: &str,
        icon: &str,
        unlock_type: UnlockType,
        unlock_value: i64,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            icon: icon.to_string(),
            unlock_type,
            unlock_value,
        }
    }
}

/// Record that a user unlocked a badge. Created once per (user, badge).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserBadge {
    pub id: Uuid,
    pub user_id: Uuid,
    pub badge_id: String,
    pub earned_at: DateTime<Utc>,
}

impl UserBadge {
    pub fn new(id: Uuid, user_id: Uuid, badge_id: String, earned_at: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id,
            badge_id,
            earned_at,
        }
    }
}

/// Progress towards a threshold badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BadgeProgress {
    pub current: i64,
    pub target: i64,
}

impl BadgeProgress {
    /// Progress percentage, clamped to 0..=100.
    pub fn percentage(&self) -> f32 {
        if self.target <= 0 {
            return 100.0;
        }
        ((self.current as f32 / self.target as f32) * 100.0).clamp(0.0, 100.0)
    }

    pub fn is_complete(&self) -> bool {
        self.current >= self.target
    }
}

/// Progress of `stats` towards `badge`, or `None` for special badges.
pub fn badge_progress(badge: &Badge, stats: &UserStats) -> Option<BadgeProgress> {
    let current = match badge.unlock_type {
        UnlockType::Streak => stats.current_streak,
        UnlockType::Reps => stats.total_reps,
        UnlockType::Drills => stats.sessions_completed,
        UnlockType::Special | UnlockType::Other(_) => return None,
    };

    Some(BadgeProgress {
        current: i64::from(current),
        target: badge.unlock_value,
    })
}

/// Seed badge catalog.
pub fn default_badges() -> Vec<Badge> {
    vec![
        Badge::new(
            "first_drill",
            "First Rep",
            "Complete your first drill",
            "👟",
            UnlockType::Drills,
            1,
        ),
        Badge::new(
            "drills_10",
            "Getting Serious",
            "Complete 10 drills",
            "🎯",
            UnlockType::Drills,
            10,
        ),
        Badge::new(
            "drills_50",
            "Drill Sergeant",
            "Complete 50 drills",
            "🎖️",
            UnlockType::Drills,
            50,
        ),
        Badge::new("drills_100", "Centurion", "Complete 100 drills", "🏛️", UnlockType::Drills, 100),
        Badge::new("reps_100", "Century", "Log 100 total reps", "💯", UnlockType::Reps, 100),
        Badge::new(
            "reps_1000",
            "Rep Machine",
            "Log 1,000 total reps",
            "⚙️",
            UnlockType::Reps,
            1000,
        ),
        Badge::new("reps_10000", "10K Club", "Log 10,000 total reps", "🏆", UnlockType::Reps, 10000),
        Badge::new("streak_3", "On Fire", "Train 3 days in a row", "🔥", UnlockType::Streak, 3),
        Badge::new("streak_7", "Week Warrior", "Train 7 days in a row", "📅", UnlockType::Streak, 7),
        Badge::new(
            "streak_30",
            "Unstoppable",
            "Train 30 days in a row",
            "🌟",
            UnlockType::Streak,
            30,
        ),
        Badge::new(
            "six_seven",
            "6 7",
            "Finish a drill with exactly 67 reps",
            "6️⃣",
            UnlockType::Special,
            0,
        ),
        Badge::new(
            "lucky_77",
            "Lucky 77",
            "Finish a drill with exactly 77 reps",
            "🍀",
            UnlockType::Special,
            0,
        ),
        Badge::new(
            "early_bird",
            "Early Bird",
            "Finish a drill before 6 AM",
            "🌅",
            UnlockType::Special,
            0,
        ),
        Badge::new(
            "night_owl",
            "Night Owl",
            "Finish a drill after 10 PM",
            "🦉",
            UnlockType::Special,
            0,
        ),
        Badge::new(
            "hat_trick",
            "Hat Trick",
            "Finish 3 drills in one day",
            "🎩",
            UnlockType::Special,
            0,
        ),
        Badge::new(
            "marathon",
            "Marathon",
            "Finish 10 drills in one day",
            "🏃",
            UnlockType::Special,
            0,
        ),
        Badge::new(
            "weekend_warrior",
            "Weekend Warrior",
            "Train on a Saturday and a Sunday",
            "🗓️",
            UnlockType::Special,
            0,
        ),
        Badge::new(
            "double_down",
            "Double Down",
            "Repeat the same drill twice in one day",
            "✌️",
            UnlockType::Special,
            0,
        ),
        Badge::new(
            "comeback_kid",
            "Comeback Kid",
            "Come back after a week off",
            "💪",
            UnlockType::Special,
            0,
        ),
        Badge::new(
            "social_star",
            "Social Star",
            "Share your progress",
            "⭐",
            UnlockType::Special,
            0,
        ),
    ]
}
