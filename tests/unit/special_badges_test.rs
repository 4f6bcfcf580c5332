//! Unit tests for special badge rules.

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use repquest::gamification::special::SpecialRegistry;
use repquest::gamification::types::DrillCompletion;
use uuid::Uuid;

fn utc() -> FixedOffset {
    FixedOffset::east_opt(0).unwrap()
}

fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

fn record(reps: u32, completed_at: DateTime<Utc>) -> DrillCompletion {
    DrillCompletion {
        id: Uuid::new_v4(),
        user_id: Uuid::nil(),
        drill_id: Uuid::new_v4(),
        reps,
        points_awarded: 0,
        completed_at,
    }
}

fn eligible(name: &str, history: &[DrillCompletion]) -> bool {
    SpecialRegistry::with_defaults()
        .evaluate(name, history, &utc())
        .unwrap_or_else(|| panic!("no rule for {}", name))
}

#[test]
fn test_three_on_one_day_is_hat_trick_not_marathon() {
    let history = vec![
        record(10, at(2024, 1, 5, 9)),
        record(10, at(2024, 1, 5, 12)),
        record(10, at(2024, 1, 5, 17)),
    ];
    assert!(eligible("Hat Trick", &history));
    assert!(!eligible("Marathon", &history));
}

#[test]
fn test_three_spread_over_days_is_not_hat_trick() {
    let history = vec![
        record(10, at(2024, 1, 5, 9)),
        record(10, at(2024, 1, 6, 9)),
        record(10, at(2024, 1, 7, 9)),
    ];
    assert!(!eligible("Hat Trick", &history));
}

#[test]
fn test_ten_on_one_day_is_marathon() {
    let history: Vec<_> = (8..18).map(|h| record(5, at(2024, 1, 5, h))).collect();
    assert!(eligible("Marathon", &history));
    assert!(eligible("Hat Trick", &history));
}

#[test]
fn test_67_reps_without_77() {
    let history = vec![record(67, at(2024, 1, 5, 9)), record(20, at(2024, 1, 6, 9))];
    assert!(eligible("6 7", &history));
    assert!(!eligible("Lucky 77", &history));
}

#[test]
fn test_lucky_77() {
    let history = vec![record(77, at(2024, 1, 5, 9))];
    assert!(eligible("Lucky 77", &history));
    assert!(!eligible("6 7", &history));
}

#[test]
fn test_weekend_warrior_across_different_weekends() {
    // 2024-06-01 is a Saturday, 2024-06-09 a Sunday of the following weekend.
    let history = vec![record(5, at(2024, 6, 1, 10)), record(5, at(2024, 6, 9, 10))];
    assert!(eligible("Weekend Warrior", &history));
}

#[test]
fn test_weekend_warrior_needs_both_days() {
    let saturdays = vec![record(5, at(2024, 6, 1, 10)), record(5, at(2024, 6, 8, 10))];
    assert!(!eligible("Weekend Warrior", &saturdays));
}

#[test]
fn test_single_record_is_not_comeback() {
    let history = vec![record(5, at(2024, 1, 5, 9))];
    assert!(!eligible("Comeback Kid", &history));
}

#[test]
fn test_week_gap_is_comeback() {
    let history = vec![record(5, at(2024, 1, 5, 9)), record(5, at(2024, 1, 14, 9))];
    assert!(eligible("Comeback Kid", &history));

    let close = vec![record(5, at(2024, 1, 5, 9)), record(5, at(2024, 1, 11, 9))];
    assert!(!eligible("Comeback Kid", &close));
}

#[test]
fn test_early_bird_and_night_owl_boundaries() {
    assert!(eligible("Early Bird", &[record(1, at(2024, 1, 5, 5))]));
    assert!(!eligible("Early Bird", &[record(1, at(2024, 1, 5, 6))]));
    assert!(eligible("Night Owl", &[record(1, at(2024, 1, 5, 22))]));
    assert!(!eligible("Night Owl", &[record(1, at(2024, 1, 5, 21))]));
}

#[test]
fn test_double_down_same_drill_same_day() {
    let drill = Uuid::new_v4();
    let mut first = record(5, at(2024, 1, 5, 9));
    let mut second = record(5, at(2024, 1, 5, 15));
    first.drill_id = drill;
    second.drill_id = drill;
    assert!(eligible("Double Down", &[first.clone(), second]));

    let other = record(5, at(2024, 1, 5, 16));
    assert!(!eligible("Double Down", &[first, other]));
}

#[test]
fn test_social_star_is_never_earned() {
    let history: Vec<_> = (0..24).map(|h| record(67, at(2024, 6, 1, h))).collect();
    assert!(!eligible("Social Star", &history));
}

#[test]
fn test_empty_history() {
    for name in [
        "6 7",
        "Lucky 77",
        "Early Bird",
        "Night Owl",
        "Hat Trick",
        "Marathon",
        "Weekend Warrior",
        "Double Down",
        "Comeback Kid",
        "Social Star",
    ] {
        assert!(!eligible(name, &[]), "{} matched empty history", name);
    }
}
