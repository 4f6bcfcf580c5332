//! RepQuest - Drill Tracking for Youth Sports Teams
//!
//! Coaches create drills, players log completions to earn points, levels and
//! badges. This crate holds the points/levels/badges engine and its SQLite
//! persistence.

pub mod gamification;
pub mod storage;

// Re-export commonly used types
pub use gamification::badges::BadgeEngine;
pub use gamification::completion::CompletionService;
pub use storage::config::AppConfig;
pub use storage::database::Database;
