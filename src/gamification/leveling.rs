//! Level and tier calculations.
//!
//! Levels are always derived from the point total and never stored, so the
//! two cannot drift apart.

use serde::{Deserialize, Serialize};

/// Points needed to advance one level.
pub const POINTS_PER_LEVEL: u64 = 1000;

/// Prestige tier derived from a level.
///
/// Variants are declared in ascending prestige so that `Ord` follows level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Rookie,
    Bronze,
    Silver,
    Gold,
    The67,
    Diamond,
}

/// Tier thresholds, highest first. Lookup takes the first row whose minimum
/// level is satisfied, so this order must stay descending.
pub const TIER_THRESHOLDS: &[(u64, Tier)] = &[
    (100, Tier::Diamond),
    (67, Tier::The67),
    (50, Tier::Gold),
    (20, Tier::Silver),
    (10, Tier::Bronze),
    (0, Tier::Rookie),
];

impl Tier {
    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            Tier::Rookie => "Rookie",
            Tier::Bronze => "Bronze",
            Tier::Silver => "Silver",
            Tier::Gold => "Gold",
            Tier::The67 => "The 67",
            Tier::Diamond => "Diamond",
        }
    }

    /// Display color as a hex string.
    pub fn color(&self) -> &'static str {
        match self {
            Tier::Rookie => "#9CA3AF",
            Tier::Bronze => "#CD7F32",
            Tier::Silver => "#C0C0C0",
            Tier::Gold => "#FFD700",
            Tier::The67 => "#A855F7",
            Tier::Diamond => "#38BDF8",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Tier::Rookie => "🌱",
            Tier::Bronze => "🥉",
            Tier::Silver => "🥈",
            Tier::Gold => "🥇",
            Tier::The67 => "🔥",
            Tier::Diamond => "💎",
        }
    }

    /// Bundle the display attributes.
    pub fn info(&self) -> TierInfo {
        TierInfo {
            tier: *self,
            name: self.name(),
            color: self.color(),
            emoji: self.emoji(),
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Display attributes of a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TierInfo {
    pub tier: Tier,
    pub name: &'static str,
    pub color: &'static str,
    pub emoji: &'static str,
}

/// Level for a point total: one level per 1000 points, starting at 0.
pub fn calculate_level(points: u64) -> u64 {
    points / POINTS_PER_LEVEL
}

/// Points still needed to reach the next level. Always at least 1.
pub fn points_to_next_level(points: u64) -> u64 {
    POINTS_PER_LEVEL - points % POINTS_PER_LEVEL
}

/// Tier for a level, first match over [`TIER_THRESHOLDS`].
pub fn tier_for_level(level: u64) -> Tier {
    TIER_THRESHOLDS
        .iter()
        .find(|(min, _)| level >= *min)
        .map(|(_, tier)| *tier)
        .unwrap_or(Tier::Rookie)
}

/// Tier display attributes for a level.
pub fn tier_info_for_level(level: u64) -> TierInfo {
    tier_for_level(level).info()
}

/// True if the decimal rendering of `value` contains "67".
pub fn check_special_value<T: std::fmt::Display>(value: T) -> bool {
    value.to_string().contains("67")
}

/// A level increase caused by a change in points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelUp {
    pub from_level: u64,
    pub to_level: u64,
    pub tier: Tier,
    /// Whether the tier also changed.
    pub tier_changed: bool,
}

/// Compare levels before and after a points change.
pub fn detect_level_up(points_before: u64, points_after: u64) -> Option<LevelUp> {
    let from_level = calculate_level(points_before);
    let to_level = calculate_level(points_after);

    if to_level <= from_level {
        return None;
    }

    let tier = tier_for_level(to_level);
    Some(LevelUp {
        from_level,
        to_level,
        tier,
        tier_changed: tier != tier_for_level(from_level),
    })
}
