//! Drill completion flow.
//!
//! Logging a completion appends the record, adds points, updates the
//! player's stats, then checks for a level-up and new badges. Only the
//! first three steps can fail the call; badge checks never do.

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::badges::BadgeEngine;
use super::leveling::{
    calculate_level, check_special_value, detect_level_up, points_to_next_level, tier_for_level,
    LevelUp, Tier,
};
use super::special::{local_day, SpecialRegistry};
use super::streak::{next_streak, visible_streak};
use super::types::{Badge, DrillCompletion, User, UserStats};
use crate::storage::{Database, DatabaseError};

/// Result of logging one completion.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionOutcome {
    pub completion: DrillCompletion,
    pub points_before: u64,
    pub points_after: u64,
    pub stats: UserStats,
    pub level_up: Option<LevelUp>,
    pub new_badges: Vec<Badge>,
    /// Reps or the new point total contain a 67.
    pub special_value: bool,
}

/// Snapshot of a player's progress for display.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressSummary {
    pub user_id: Uuid,
    pub name: String,
    pub points: u64,
    pub level: u64,
    pub tier: Tier,
    pub points_to_next_level: u64,
    pub stats: UserStats,
    pub badges_earned: usize,
}

/// Completion errors.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    #[error("Drill not found: {0}")]
    DrillNotFound(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Records completions and drives levels and badges.
pub struct CompletionService<'a> {
    db: &'a Database,
    offset: FixedOffset,
    registry: SpecialRegistry,
    clock: fn() -> DateTime<Utc>,
    new_id: fn() -> Uuid,
}

impl<'a> CompletionService<'a> {
    /// Create a service. `offset` is the team's local time.
    pub fn new(db: &'a Database, offset: FixedOffset) -> Self {
        Self {
            db,
            offset,
            registry: SpecialRegistry::with_defaults(),
            clock: Utc::now,
            new_id: Uuid::new_v4,
        }
    }

    /// Replace the special badge rules.
    pub fn with_registry(mut self, registry: SpecialRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Replace the clock used for `updated_at` and unlock timestamps.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the id generator used for unlock records.
    pub fn with_id_source(mut self, new_id: fn() -> Uuid) -> Self {
        self.new_id = new_id;
        self
    }

    fn badge_engine(&self) -> BadgeEngine<'a, Database> {
        BadgeEngine::new(self.db, self.offset)
            .with_registry(self.registry.clone())
            .with_clock(self.clock)
            .with_id_source(self.new_id)
    }

    /// Log `reps` of a drill for a player as completion `completion_id`.
    pub fn complete_drill(
        &self,
        completion_id: Uuid,
        user_id: Uuid,
        drill_id: Uuid,
        reps: u32,
        completed_at: DateTime<Utc>,
    ) -> Result<CompletionOutcome, CompletionError> {
        let mut user = self
            .db
            .get_user(&user_id)?
            .ok_or(CompletionError::UserNotFound(user_id))?;
        let drill = self
            .db
            .get_drill(&drill_id)?
            .ok_or(CompletionError::DrillNotFound(drill_id))?;

        let completion = DrillCompletion {
            id: completion_id,
            user_id,
            drill_id,
            reps,
            points_awarded: drill.points_for(reps),
            completed_at,
        };

        let points_before = user.points;
        self.apply_completion(&mut user, &completion);
        self.db.record_completion(&completion, &user)?;

        tracing::info!(
            %user_id,
            drill = %drill.name,
            reps,
            points = completion.points_awarded,
            total_points = user.points,
            "Drill completed"
        );

        let level_up = detect_level_up(points_before, user.points);
        if let Some(up) = &level_up {
            tracing::info!(
                %user_id,
                level = up.to_level,
                tier = %up.tier,
                tier_changed = up.tier_changed,
                "Level up"
            );
        }

        let new_badges = self.badge_engine().check_and_unlock(user_id, &user.stats, None);

        Ok(CompletionOutcome {
            special_value: check_special_value(reps) || check_special_value(user.points),
            completion,
            points_before,
            points_after: user.points,
            stats: user.stats,
            level_up,
            new_badges,
        })
    }

    /// Add a completion to the player's points and stats.
    fn apply_completion(&self, user: &mut User, completion: &DrillCompletion) {
        let day = local_day(&completion.completed_at, &self.offset);

        user.points = user.points.saturating_add(completion.points_awarded);
        user.stats.total_reps = user.stats.total_reps.saturating_add(completion.reps);
        user.stats.sessions_completed = user.stats.sessions_completed.saturating_add(1);

        // A backdated completion does not move the streak.
        if user.last_completed_on.map_or(true, |last| day >= last) {
            user.stats.current_streak =
                next_streak(user.stats.current_streak, user.last_completed_on, day);
            user.last_completed_on = Some(day);
        }

        user.updated_at = (self.clock)();
    }

    /// Re-run badge checks with the player's stored stats.
    pub fn recheck(&self, user_id: Uuid) -> Result<Vec<Badge>, CompletionError> {
        let user = self
            .db
            .get_user(&user_id)?
            .ok_or(CompletionError::UserNotFound(user_id))?;

        tracing::debug!(%user_id, "Rechecking badges");
        Ok(self.badge_engine().check_and_unlock(user_id, &user.stats, None))
    }

    /// Current level, tier and counters for a player.
    pub fn summary(&self, user_id: Uuid, today: DateTime<Utc>) -> Result<ProgressSummary, CompletionError> {
        let user = self
            .db
            .get_user(&user_id)?
            .ok_or(CompletionError::UserNotFound(user_id))?;
        let badges_earned = self.db.list_earned_badges(&user_id)?.len();

        let level = calculate_level(user.points);
        let mut stats = user.stats;
        stats.current_streak = visible_streak(
            stats.current_streak,
            user.last_completed_on,
            local_day(&today, &self.offset),
        );

        Ok(ProgressSummary {
            user_id,
            name: user.name,
            points: user.points,
            level,
            tier: tier_for_level(level),
            points_to_next_level: points_to_next_level(user.points),
            stats,
            badges_earned,
        })
    }
}
