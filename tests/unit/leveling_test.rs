//! Unit tests for level and tier calculations.

use repquest::gamification::leveling::{
    calculate_level, check_special_value, points_to_next_level, tier_for_level,
    tier_info_for_level, Tier, POINTS_PER_LEVEL,
};

#[test]
fn test_zero_points_is_rookie() {
    assert_eq!(calculate_level(0), 0);
    assert_eq!(tier_for_level(calculate_level(0)), Tier::Rookie);
}

#[test]
fn test_just_below_first_level() {
    assert_eq!(calculate_level(999), 0);
    assert_eq!(points_to_next_level(999), 1);
}

#[test]
fn test_exactly_one_level() {
    assert_eq!(calculate_level(1000), 1);
    assert_eq!(points_to_next_level(1000), 1000);
}

#[test]
fn test_the_67_tier() {
    let level = calculate_level(67_000);
    assert_eq!(level, 67);
    assert_eq!(tier_for_level(level), Tier::The67);
    assert_eq!(tier_for_level(level).name(), "The 67");
}

#[test]
fn test_diamond_tier() {
    let level = calculate_level(100_000);
    assert_eq!(level, 100);
    assert_eq!(tier_for_level(level), Tier::Diamond);
}

#[test]
fn test_67_band_runs_until_diamond() {
    for level in 67..100 {
        assert_eq!(tier_for_level(level), Tier::The67, "level {}", level);
    }
    for level in 50..67 {
        assert_eq!(tier_for_level(level), Tier::Gold, "level {}", level);
    }
}

#[test]
fn test_points_to_next_level_always_positive() {
    for points in [0, 1, 499, 999, 1000, 1001, 66_999, 67_000, 1_000_000] {
        let remaining = points_to_next_level(points);
        assert!(remaining > 0);
        assert!(remaining <= POINTS_PER_LEVEL);
        assert_eq!(
            points + remaining,
            (calculate_level(points) + 1) * POINTS_PER_LEVEL
        );
    }
}

#[test]
fn test_points_to_next_level_near_u64_max() {
    for points in [u64::MAX - 1615, u64::MAX - 1, u64::MAX] {
        let remaining = points_to_next_level(points);
        assert!(remaining > 0, "points {}", points);
        assert!(remaining <= POINTS_PER_LEVEL);
        assert_eq!((points % POINTS_PER_LEVEL) + remaining, POINTS_PER_LEVEL);
    }
    assert_eq!(points_to_next_level(u64::MAX), 385);
    assert_eq!(tier_for_level(calculate_level(u64::MAX)), Tier::Diamond);
}

#[test]
fn test_tier_info_attributes() {
    let info = tier_info_for_level(12);
    assert_eq!(info.tier, Tier::Bronze);
    assert_eq!(info.name, "Bronze");
    assert!(info.color.starts_with('#'));
    assert!(!info.emoji.is_empty());
}

#[test]
fn test_special_value_detection() {
    assert!(check_special_value(67));
    assert!(check_special_value(670));
    assert!(check_special_value(1167));
    assert!(!check_special_value(6));
    assert!(!check_special_value(76));
    assert!(!check_special_value(6007));
}
