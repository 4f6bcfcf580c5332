//! Badge eligibility and unlocking.
//!
//! The engine reads the user's completion history, owned badges and the
//! catalog through [`BadgeStore`], decides which badges are newly earned and
//! writes one unlock per badge. Badge checks are auxiliary to the completion
//! flow, so store failures are logged and reported as "no new badges".

use chrono::{DateTime, FixedOffset, Utc};
use std::collections::HashSet;
use uuid::Uuid;

use super::special::SpecialRegistry;
use super::types::{Badge, DrillCompletion, UnlockType, UserBadge, UserStats};
use crate::storage::DatabaseError;

/// Persistence operations the badge engine depends on.
pub trait BadgeStore {
    /// Full completion history for a user.
    fn fetch_completions(&self, user_id: Uuid) -> Result<Vec<DrillCompletion>, DatabaseError>;

    /// Ids of badges the user already owns.
    fn fetch_owned_badge_ids(&self, user_id: Uuid) -> Result<HashSet<String>, DatabaseError>;

    /// Every badge in the catalog.
    fn fetch_badge_catalog(&self) -> Result<Vec<Badge>, DatabaseError>;

    /// Record an unlock. Fails if the user already owns the badge.
    fn insert_unlock(&self, unlock: &UserBadge) -> Result<(), DatabaseError>;
}

/// Badge errors.
#[derive(Debug, thiserror::Error)]
pub enum BadgeError {
    #[error("Store error: {0}")]
    Store(#[from] DatabaseError),
}

/// Decides and records badge unlocks.
pub struct BadgeEngine<'a, S: BadgeStore> {
    store: &'a S,
    registry: SpecialRegistry,
    offset: FixedOffset,
    clock: fn() -> DateTime<Utc>,
    new_id: fn() -> Uuid,
}

impl<'a, S: BadgeStore> BadgeEngine<'a, S> {
    /// Create an engine with the built-in special rules, evaluating local
    /// time at `offset`.
    pub fn new(store: &'a S, offset: FixedOffset) -> Self {
        Self {
            store,
            registry: SpecialRegistry::with_defaults(),
            offset,
            clock: Utc::now,
            new_id: Uuid::new_v4,
        }
    }

    /// Replace the special rule registry.
    pub fn with_registry(mut self, registry: SpecialRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Replace the clock used to stamp unlocks.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the id generator used for unlock records.
    pub fn with_id_source(mut self, new_id: fn() -> Uuid) -> Self {
        self.new_id = new_id;
        self
    }

    /// Check and unlock badges for a user.
    ///
    /// `history` may be passed when the caller already has the completion
    /// list; otherwise it is fetched. Returns the badges unlocked by this
    /// call, or an empty list if any fetch fails.
    pub fn check_and_unlock(
        &self,
        user_id: Uuid,
        stats: &UserStats,
        history: Option<&[DrillCompletion]>,
    ) -> Vec<Badge> {
        match self.try_check_and_unlock(user_id, stats, history) {
            Ok(unlocked) => unlocked,
            Err(e) => {
                tracing::warn!(%user_id, error = %e, "Badge check failed, skipping");
                Vec::new()
            }
        }
    }

    fn try_check_and_unlock(
        &self,
        user_id: Uuid,
        stats: &UserStats,
        history: Option<&[DrillCompletion]>,
    ) -> Result<Vec<Badge>, BadgeError> {
        let fetched;
        let history = match history {
            Some(history) => history,
            None => {
                fetched = self.store.fetch_completions(user_id)?;
                fetched.as_slice()
            }
        };

        let owned = self.store.fetch_owned_badge_ids(user_id)?;
        let catalog = self.store.fetch_badge_catalog()?;

        let mut newly_earned = Vec::new();

        for badge in catalog {
            if owned.contains(&badge.id) {
                continue;
            }

            let eligible = self.is_eligible(&badge, stats, history);
            tracing::debug!(
                %user_id,
                badge = %badge.name,
                unlock_type = %badge.unlock_type,
                decision = eligible,
                "Evaluated badge"
            );

            if !eligible {
                continue;
            }

            let unlock =
                UserBadge::new((self.new_id)(), user_id, badge.id.clone(), (self.clock)());
            match self.store.insert_unlock(&unlock) {
                Ok(()) => {
                    tracing::info!(%user_id, badge = %badge.name, "Badge unlocked");
                    newly_earned.push(badge);
                }
                Err(e) => {
                    tracing::warn!(
                        %user_id,
                        badge = %badge.name,
                        error = %e,
                        "Failed to record badge unlock"
                    );
                }
            }
        }

        Ok(newly_earned)
    }

    /// Whether `badge` is earned by `stats` and `history`.
    pub fn is_eligible(&self, badge: &Badge, stats: &UserStats, history: &[DrillCompletion]) -> bool {
        match &badge.unlock_type {
            UnlockType::Streak => i64::from(stats.current_streak) >= badge.unlock_value,
            UnlockType::Reps => i64::from(stats.total_reps) >= badge.unlock_value,
            UnlockType::Drills => i64::from(stats.sessions_completed) >= badge.unlock_value,
            UnlockType::Special => {
                match self.registry.evaluate(&badge.name, history, &self.offset) {
                    Some(met) => met,
                    None => {
                        tracing::warn!(badge = %badge.name, "Unknown special badge");
                        false
                    }
                }
            }
            UnlockType::Other(kind) => {
                tracing::warn!(badge = %badge.name, unlock_type = %kind, "Unknown unlock type");
                false
            }
        }
    }
}
