//! Database schema definitions for RepQuest.

/// SQL schema for creating all database tables.
pub const SCHEMA: &str = r#"
-- Players table
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    points INTEGER NOT NULL DEFAULT 0 CHECK (points >= 0),
    total_reps INTEGER NOT NULL DEFAULT 0,
    sessions_completed INTEGER NOT NULL DEFAULT 0,
    current_streak INTEGER NOT NULL DEFAULT 0,
    last_completed_on TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Drills table
CREATE TABLE IF NOT EXISTS drills (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    points_per_rep INTEGER NOT NULL DEFAULT 0,
    completion_bonus INTEGER NOT NULL DEFAULT 0,
    created_by TEXT REFERENCES users(id) ON DELETE SET NULL,
    created_at TEXT NOT NULL
);

-- Drill completions (append-only)
CREATE TABLE IF NOT EXISTS drill_completions (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    drill_id TEXT NOT NULL REFERENCES drills(id),
    reps INTEGER NOT NULL CHECK (reps >= 0),
    points_awarded INTEGER NOT NULL,
    completed_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_drill_completions_user_id ON drill_completions(user_id);
CREATE INDEX IF NOT EXISTS idx_drill_completions_completed_at ON drill_completions(user_id, completed_at);

-- Badge catalog
CREATE TABLE IF NOT EXISTS badges (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT NOT NULL,
    icon TEXT NOT NULL,
    unlock_type TEXT NOT NULL,
    unlock_value INTEGER NOT NULL DEFAULT 0
);

-- Unlocked badges, one row per (user, badge)
CREATE TABLE IF NOT EXISTS user_badges (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    badge_id TEXT NOT NULL REFERENCES badges(id),
    earned_at TEXT NOT NULL,
    UNIQUE(user_id, badge_id)
);

CREATE INDEX IF NOT EXISTS idx_user_badges_user_id ON user_badges(user_id);
"#;

/// Schema version tracking table
pub const SCHEMA_VERSION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);
"#;

/// Current schema version
pub const CURRENT_VERSION: i32 = 1;
