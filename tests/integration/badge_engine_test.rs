//! Integration tests for the badge engine against SQLite.

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use repquest::gamification::badges::{BadgeEngine, BadgeStore};
use repquest::gamification::types::{
    Badge, Drill, DrillCompletion, UnlockType, User, UserBadge, UserStats,
};
use repquest::storage::{Database, DatabaseError};
use std::collections::HashSet;
use uuid::Uuid;

fn utc() -> FixedOffset {
    FixedOffset::east_opt(0).unwrap()
}

fn at(d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, d, h, 0, 0).unwrap()
}

struct Fixture {
    db: Database,
    user_id: Uuid,
    drill_id: Uuid,
}

impl Fixture {
    fn new() -> Self {
        let db = Database::open_in_memory().expect("Failed to create database");
        db.initialize_badges().unwrap();

        let user = User::new(Uuid::new_v4(), "Jordan".to_string(), Utc::now());
        db.insert_user(&user).unwrap();

        let drill = Drill {
            id: Uuid::new_v4(),
            name: "Cone weaves".to_string(),
            description: None,
            points_per_rep: 1,
            completion_bonus: 0,
            created_by: None,
            created_at: Utc::now(),
        };
        db.insert_drill(&drill).unwrap();

        Self {
            db,
            user_id: user.id,
            drill_id: drill.id,
        }
    }

    /// Append a completion without touching the user's stats.
    fn log(&self, reps: u32, completed_at: DateTime<Utc>) {
        let user = self.db.get_user(&self.user_id).unwrap().unwrap();
        let completion = DrillCompletion {
            id: Uuid::new_v4(),
            user_id: self.user_id,
            drill_id: self.drill_id,
            reps,
            points_awarded: u64::from(reps),
            completed_at,
        };
        self.db.record_completion(&completion, &user).unwrap();
    }
}

fn names(badges: &[Badge]) -> Vec<String> {
    badges.iter().map(|b| b.name.clone()).collect()
}

#[test]
fn test_hat_trick_from_stored_history() {
    let fx = Fixture::new();
    fx.log(10, at(5, 9));
    fx.log(10, at(5, 12));
    fx.log(10, at(5, 17));

    let engine = BadgeEngine::new(&fx.db, utc());
    let unlocked = names(&engine.check_and_unlock(fx.user_id, &UserStats::default(), None));

    assert!(unlocked.contains(&"Hat Trick".to_string()));
    assert!(!unlocked.contains(&"Marathon".to_string()));
    // Same drill three times on one day.
    assert!(unlocked.contains(&"Double Down".to_string()));
}

#[test]
fn test_second_run_unlocks_nothing() {
    let fx = Fixture::new();
    fx.log(67, at(5, 9));

    let engine = BadgeEngine::new(&fx.db, utc());
    let stats = UserStats {
        current_streak: 1,
        total_reps: 67,
        sessions_completed: 1,
    };

    let first = engine.check_and_unlock(fx.user_id, &stats, None);
    assert!(!first.is_empty());
    assert!(engine.check_and_unlock(fx.user_id, &stats, None).is_empty());

    let earned = fx.db.list_earned_badges(&fx.user_id).unwrap();
    assert_eq!(earned.len(), first.len());
}

#[test]
fn test_owned_badge_never_reunlocked() {
    let fx = Fixture::new();
    fx.db
        .insert_unlock(&UserBadge::new(
            Uuid::new_v4(),
            fx.user_id,
            "streak_30".to_string(),
            at(1, 0),
        ))
        .unwrap();

    let engine = BadgeEngine::new(&fx.db, utc());
    let stats = UserStats {
        current_streak: 365,
        total_reps: 0,
        sessions_completed: 0,
    };
    let unlocked = names(&engine.check_and_unlock(fx.user_id, &stats, Some(&[])));

    assert!(!unlocked.contains(&"Unstoppable".to_string()));
    assert!(unlocked.contains(&"Week Warrior".to_string()));
    assert_eq!(fx.db.fetch_owned_badge_ids(fx.user_id).unwrap().len(), 3);
}

/// Store whose ownership snapshot was taken before another request
/// recorded its unlocks.
struct StaleOwnership<'a>(&'a Database);

impl BadgeStore for StaleOwnership<'_> {
    fn fetch_completions(&self, user_id: Uuid) -> Result<Vec<DrillCompletion>, DatabaseError> {
        self.0.fetch_completions(user_id)
    }

    fn fetch_owned_badge_ids(&self, _user_id: Uuid) -> Result<HashSet<String>, DatabaseError> {
        Ok(HashSet::new())
    }

    fn fetch_badge_catalog(&self) -> Result<Vec<Badge>, DatabaseError> {
        self.0.fetch_badge_catalog()
    }

    fn insert_unlock(&self, unlock: &UserBadge) -> Result<(), DatabaseError> {
        self.0.insert_unlock(unlock)
    }
}

#[test]
fn test_concurrent_unlock_is_excluded() {
    let fx = Fixture::new();
    let winner = UserBadge::new(Uuid::new_v4(), fx.user_id, "first_drill".to_string(), at(1, 0));
    fx.db.insert_unlock(&winner).unwrap();

    let duplicate = UserBadge::new(Uuid::new_v4(), fx.user_id, "first_drill".to_string(), at(1, 1));
    assert!(matches!(
        fx.db.insert_unlock(&duplicate),
        Err(DatabaseError::ConstraintViolation(_))
    ));

    let store = StaleOwnership(&fx.db);
    let engine = BadgeEngine::new(&store, utc());
    let stats = UserStats {
        current_streak: 0,
        total_reps: 100,
        sessions_completed: 1,
    };
    let unlocked = names(&engine.check_and_unlock(fx.user_id, &stats, Some(&[])));

    assert_eq!(unlocked, vec!["Century".to_string()]);
    let earned = fx.db.list_earned_badges(&fx.user_id).unwrap();
    assert_eq!(earned.len(), 2);
    let first = earned.iter().find(|e| e.badge.id == "first_drill").unwrap();
    assert_eq!(first.earned_at, at(1, 0));
}

#[test]
fn test_custom_catalog_entries() {
    let fx = Fixture::new();
    fx.db
        .insert_badge_if_missing(&Badge {
            id: "minutes_60".to_string(),
            name: "Hour of Power".to_string(),
            description: "Train for an hour".to_string(),
            icon: "⏱️".to_string(),
            unlock_type: UnlockType::Other("minutes".to_string()),
            unlock_value: 60,
        })
        .unwrap();
    fx.db
        .insert_badge_if_missing(&Badge {
            id: "secret".to_string(),
            name: "Secret Handshake".to_string(),
            description: "???".to_string(),
            icon: "🤝".to_string(),
            unlock_type: UnlockType::Special,
            unlock_value: 0,
        })
        .unwrap();

    let stored = fx.db.list_badges().unwrap();
    let hour = stored.iter().find(|b| b.id == "minutes_60").unwrap();
    assert_eq!(hour.unlock_type, UnlockType::Other("minutes".to_string()));

    let engine = BadgeEngine::new(&fx.db, utc());
    let stats = UserStats {
        current_streak: 1000,
        total_reps: 1000,
        sessions_completed: 1000,
    };
    let unlocked = names(&engine.check_and_unlock(fx.user_id, &stats, Some(&[])));
    assert!(!unlocked.contains(&"Hour of Power".to_string()));
    assert!(!unlocked.contains(&"Secret Handshake".to_string()));
}

#[test]
fn test_local_offset_changes_calendar_day() {
    let fx = Fixture::new();
    // At UTC+3 only the 20:00 UTC completion stays on the 5th.
    fx.log(5, at(5, 20));
    fx.log(5, at(5, 22));
    fx.log(5, at(5, 23));

    let stats = UserStats::default();
    let in_utc = BadgeEngine::new(&fx.db, utc());
    let history = fx.db.list_completions(&fx.user_id).unwrap();
    let hat_trick = fx
        .db
        .list_badges()
        .unwrap()
        .into_iter()
        .find(|b| b.name == "Hat Trick")
        .unwrap();
    assert!(in_utc.is_eligible(&hat_trick, &stats, &history));

    let plus_three = BadgeEngine::new(&fx.db, FixedOffset::east_opt(3 * 3600).unwrap());
    assert!(!plus_three.is_eligible(&hat_trick, &stats, &history));
}
