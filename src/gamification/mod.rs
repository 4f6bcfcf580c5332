//! Points, levels and badges.
//!
//! Provides level and tier math, badge eligibility rules, and the drill
//! completion flow that ties them together.

pub mod badges;
pub mod completion;
pub mod leveling;
pub mod special;
pub mod streak;
pub mod types;

// Re-export commonly used types
pub use badges::{BadgeEngine, BadgeError, BadgeStore};
pub use completion::{CompletionError, CompletionOutcome, CompletionService, ProgressSummary};
pub use leveling::{
    calculate_level, check_special_value, detect_level_up, points_to_next_level, tier_for_level,
    LevelUp, Tier, TierInfo,
};
pub use special::{SpecialRegistry, SpecialRule};
pub use types::*;
