//! Database operations using rusqlite.
//!
//! Players, drills, the append-only completion history, the badge catalog
//! and badge unlocks all live in one SQLite file.

use crate::gamification::badges::BadgeStore;
use crate::gamification::types::{
    default_badges, Badge, Drill, DrillCompletion, UnlockType, User, UserBadge, UserStats,
};
use crate::storage::schema::{CURRENT_VERSION, SCHEMA, SCHEMA_VERSION_TABLE};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, ErrorCode, Result as SqliteResult};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

/// Database wrapper for SQLite operations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create a database at the given path.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DatabaseError::IoError(e.to_string()))?;
        }

        let conn =
            Connection::open(path).map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        let db = Self { conn };
        db.initialize()?;

        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        let db = Self { conn };
        db.initialize()?;

        Ok(db)
    }

    /// Initialize the database schema.
    fn initialize(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        // Create schema version table
        self.conn
            .execute_batch(SCHEMA_VERSION_TABLE)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

        // Check current version
        let current_version = self.get_schema_version()?;

        if current_version < CURRENT_VERSION {
            self.migrate(current_version)?;
        }

        Ok(())
    }

    /// Get the current schema version.
    fn get_schema_version(&self) -> Result<i32, DatabaseError> {
        let result: SqliteResult<i32> = self.conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        );

        match result {
            Ok(version) => Ok(version),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
            Err(e) => Err(DatabaseError::QueryFailed(e.to_string())),
        }
    }

    /// Run database migrations.
    fn migrate(&self, from_version: i32) -> Result<(), DatabaseError> {
        if from_version < 1 {
            self.conn
                .execute_batch(SCHEMA)
                .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

            self.conn
                .execute(
                    "INSERT INTO schema_version (version, applied_at) VALUES (?, datetime('now'))",
                    [CURRENT_VERSION],
                )
                .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

            tracing::info!(version = CURRENT_VERSION, "Database migrated");
        }

        Ok(())
    }

    /// Get a reference to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    // ========== Badge Catalog ==========

    /// Seed the default badge catalog. Existing rows are left untouched.
    pub fn initialize_badges(&self) -> Result<usize, DatabaseError> {
        let mut inserted = 0;
        for badge in default_badges() {
            inserted += self.insert_badge_if_missing(&badge)?;
        }

        tracing::debug!(inserted, "Seeded badge catalog");
        Ok(inserted)
    }

    /// Insert a badge definition unless one with the same id exists.
    pub fn insert_badge_if_missing(&self, badge: &Badge) -> Result<usize, DatabaseError> {
        self.conn
            .execute(
                "INSERT OR IGNORE INTO badges (id, name, description, icon, unlock_type, unlock_value)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    badge.id,
                    badge.name,
                    badge.description,
                    badge.icon,
                    badge.unlock_type.as_str(),
                    badge.unlock_value,
                ],
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))
    }

    /// Get all badges in the catalog.
    pub fn list_badges(&self) -> Result<Vec<Badge>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, name, description, icon, unlock_type, unlock_value
                 FROM badges ORDER BY rowid",
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map([], badge_from_row)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        rows.collect::<SqliteResult<Vec<_>>>()
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))
    }

    /// Get badges earned by a user, most recent first.
    pub fn list_earned_badges(&self, user_id: &Uuid) -> Result<Vec<EarnedBadge>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT b.id, b.name, b.description, b.icon, b.unlock_type, b.unlock_value, ub.earned_at
                 FROM badges b
                 JOIN user_badges ub ON b.id = ub.badge_id
                 WHERE ub.user_id = ?1
                 ORDER BY ub.earned_at DESC",
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map(params![user_id.to_string()], |row| {
                Ok((badge_from_row(row)?, row.get::<_, String>(6)?))
            })
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let mut earned = Vec::new();
        for row in rows {
            let (badge, earned_at) = row.map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
            earned.push(EarnedBadge {
                badge,
                earned_at: parse_timestamp(&earned_at, "earned date")?,
            });
        }

        Ok(earned)
    }

    /// Record a badge unlock.
    pub fn insert_user_badge(&self, unlock: &UserBadge) -> Result<(), DatabaseError> {
        self.conn
            .execute(
                "INSERT INTO user_badges (id, user_id, badge_id, earned_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    unlock.id.to_string(),
                    unlock.user_id.to_string(),
                    unlock.badge_id,
                    unlock.earned_at.to_rfc3339(),
                ],
            )
            .map_err(map_write_error)?;

        Ok(())
    }

    // ========== User Operations ==========

    /// Insert a new player.
    pub fn insert_user(&self, user: &User) -> Result<(), DatabaseError> {
        self.conn
            .execute(
                "INSERT INTO users (id, name, points, total_reps, sessions_completed,
                 current_streak, last_completed_on, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    user.id.to_string(),
                    user.name,
                    to_sql_int(user.points)?,
                    user.stats.total_reps,
                    user.stats.sessions_completed,
                    user.stats.current_streak,
                    user.last_completed_on.map(|d| d.to_string()),
                    user.created_at.to_rfc3339(),
                    user.updated_at.to_rfc3339(),
                ],
            )
            .map_err(map_write_error)?;

        Ok(())
    }

    /// Get a player by ID.
    pub fn get_user(&self, id: &Uuid) -> Result<Option<User>, DatabaseError> {
        let result = self.conn.query_row(
            "SELECT id, name, points, total_reps, sessions_completed, current_streak,
             last_completed_on, created_at, updated_at
             FROM users WHERE id = ?1",
            params![id.to_string()],
            UserRow::from_row,
        );

        match result {
            Ok(row) => Ok(Some(row.into_user()?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DatabaseError::QueryFailed(e.to_string())),
        }
    }

    /// Get all players, highest points first.
    pub fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, name, points, total_reps, sessions_completed, current_streak,
                 last_completed_on, created_at, updated_at
                 FROM users ORDER BY points DESC, name",
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map([], UserRow::from_row)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let mut users = Vec::new();
        for row in rows {
            let row = row.map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
            users.push(row.into_user()?);
        }

        Ok(users)
    }

    /// Append a completion and store the player's updated progress in one
    /// transaction.
    pub fn record_completion(
        &self,
        completion: &DrillCompletion,
        user: &User,
    ) -> Result<(), DatabaseError> {
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;

        tx.execute(
            "INSERT INTO drill_completions (id, user_id, drill_id, reps, points_awarded, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                completion.id.to_string(),
                completion.user_id.to_string(),
                completion.drill_id.to_string(),
                completion.reps,
                to_sql_int(completion.points_awarded)?,
                completion.completed_at.to_rfc3339(),
            ],
        )
        .map_err(map_write_error)?;

        let rows_affected = tx
            .execute(
                "UPDATE users SET points = ?2, total_reps = ?3, sessions_completed = ?4,
                 current_streak = ?5, last_completed_on = ?6, updated_at = ?7 WHERE id = ?1",
                params![
                    user.id.to_string(),
                    to_sql_int(user.points)?,
                    user.stats.total_reps,
                    user.stats.sessions_completed,
                    user.stats.current_streak,
                    user.last_completed_on.map(|d| d.to_string()),
                    user.updated_at.to_rfc3339(),
                ],
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        if rows_affected == 0 {
            return Err(DatabaseError::NotFound(format!("User {}", user.id)));
        }

        tx.commit()
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))
    }

    // ========== Drill Operations ==========

    /// Insert a new drill.
    pub fn insert_drill(&self, drill: &Drill) -> Result<(), DatabaseError> {
        self.conn
            .execute(
                "INSERT INTO drills (id, name, description, points_per_rep, completion_bonus,
                 created_by, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    drill.id.to_string(),
                    drill.name,
                    drill.description,
                    drill.points_per_rep,
                    drill.completion_bonus,
                    drill.created_by.map(|id| id.to_string()),
                    drill.created_at.to_rfc3339(),
                ],
            )
            .map_err(map_write_error)?;

        Ok(())
    }

    /// Get a drill by ID.
    pub fn get_drill(&self, id: &Uuid) -> Result<Option<Drill>, DatabaseError> {
        let result = self.conn.query_row(
            "SELECT id, name, description, points_per_rep, completion_bonus, created_by, created_at
             FROM drills WHERE id = ?1",
            params![id.to_string()],
            DrillRow::from_row,
        );

        match result {
            Ok(row) => Ok(Some(row.into_drill()?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DatabaseError::QueryFailed(e.to_string())),
        }
    }

    /// Get all drills by name.
    pub fn list_drills(&self) -> Result<Vec<Drill>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, name, description, points_per_rep, completion_bonus, created_by, created_at
                 FROM drills ORDER BY name",
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map([], DrillRow::from_row)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let mut drills = Vec::new();
        for row in rows {
            let row = row.map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
            drills.push(row.into_drill()?);
        }

        Ok(drills)
    }

    // ========== Completion History ==========

    /// Get a player's completions, oldest first.
    pub fn list_completions(&self, user_id: &Uuid) -> Result<Vec<DrillCompletion>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, user_id, drill_id, reps, points_awarded, completed_at
                 FROM drill_completions WHERE user_id = ?1 ORDER BY completed_at",
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map(params![user_id.to_string()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, u32>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let mut completions = Vec::new();
        for row in rows {
            let (id, user_id, drill_id, reps, points_awarded, completed_at) =
                row.map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

            completions.push(DrillCompletion {
                id: parse_uuid(&id)?,
                user_id: parse_uuid(&user_id)?,
                drill_id: parse_uuid(&drill_id)?,
                reps,
                points_awarded: from_sql_int(points_awarded)?,
                completed_at: parse_timestamp(&completed_at, "completion date")?,
            });
        }

        Ok(completions)
    }
}

impl BadgeStore for Database {
    fn fetch_completions(&self, user_id: Uuid) -> Result<Vec<DrillCompletion>, DatabaseError> {
        self.list_completions(&user_id)
    }

    fn fetch_owned_badge_ids(&self, user_id: Uuid) -> Result<HashSet<String>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare("SELECT badge_id FROM user_badges WHERE user_id = ?1")
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map(params![user_id.to_string()], |row| row.get::<_, String>(0))
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        rows.collect::<SqliteResult<HashSet<_>>>()
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))
    }

    fn fetch_badge_catalog(&self) -> Result<Vec<Badge>, DatabaseError> {
        self.list_badges()
    }

    fn insert_unlock(&self, unlock: &UserBadge) -> Result<(), DatabaseError> {
        self.insert_user_badge(unlock)
    }
}

/// Catalog badge with the time a user earned it.
#[derive(Debug, Clone, serde::Serialize)]
pub struct EarnedBadge {
    pub badge: Badge,
    pub earned_at: DateTime<Utc>,
}

// ========== Helper Types for Row Conversion ==========

struct UserRow {
    id: String,
    name: String,
    points: i64,
    total_reps: u32,
    sessions_completed: u32,
    current_streak: u32,
    last_completed_on: Option<String>,
    created_at: String,
    updated_at: String,
}

impl UserRow {
    fn from_row(row: &rusqlite::Row<'_>) -> SqliteResult<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            points: row.get(2)?,
            total_reps: row.get(3)?,
            sessions_completed: row.get(4)?,
            current_streak: row.get(5)?,
            last_completed_on: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }

    fn into_user(self) -> Result<User, DatabaseError> {
        let last_completed_on = self
            .last_completed_on
            .map(|s| s.parse::<NaiveDate>())
            .transpose()
            .map_err(|e| {
                DatabaseError::DeserializationError(format!("Invalid completion day: {}", e))
            })?;

        Ok(User {
            id: parse_uuid(&self.id)?,
            name: self.name,
            points: from_sql_int(self.points)?,
            stats: UserStats {
                current_streak: self.current_streak,
                total_reps: self.total_reps,
                sessions_completed: self.sessions_completed,
            },
            last_completed_on,
            created_at: parse_timestamp(&self.created_at, "created date")?,
            updated_at: parse_timestamp(&self.updated_at, "updated date")?,
        })
    }
}

struct DrillRow {
    id: String,
    name: String,
    description: Option<String>,
    points_per_rep: u32,
    completion_bonus: u32,
    created_by: Option<String>,
    created_at: String,
}

impl DrillRow {
    fn from_row(row: &rusqlite::Row<'_>) -> SqliteResult<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            points_per_rep: row.get(3)?,
            completion_bonus: row.get(4)?,
            created_by: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    fn into_drill(self) -> Result<Drill, DatabaseError> {
        Ok(Drill {
            id: parse_uuid(&self.id)?,
            name: self.name,
            description: self.description,
            points_per_rep: self.points_per_rep,
            completion_bonus: self.completion_bonus,
            created_by: self.created_by.as_deref().map(parse_uuid).transpose()?,
            created_at: parse_timestamp(&self.created_at, "created date")?,
        })
    }
}

fn badge_from_row(row: &rusqlite::Row<'_>) -> SqliteResult<Badge> {
    let unlock_type: String = row.get(4)?;
    Ok(Badge {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        icon: row.get(3)?,
        unlock_type: UnlockType::parse(&unlock_type),
        unlock_value: row.get(5)?,
    })
}

fn parse_uuid(s: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(s)
        .map_err(|e| DatabaseError::DeserializationError(format!("Invalid UUID: {}", e)))
}

fn parse_timestamp(s: &str, what: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::DeserializationError(format!("Invalid {}: {}", what, e)))
}

fn to_sql_int(value: u64) -> Result<i64, DatabaseError> {
    i64::try_from(value)
        .map_err(|_| DatabaseError::SerializationError(format!("Value out of range: {}", value)))
}

fn from_sql_int(value: i64) -> Result<u64, DatabaseError> {
    u64::try_from(value)
        .map_err(|_| DatabaseError::DeserializationError(format!("Negative value: {}", value)))
}

/// Map insert errors, separating constraint violations from other failures.
fn map_write_error(e: rusqlite::Error) -> DatabaseError {
    match e {
        rusqlite::Error::SqliteFailure(err, msg) if err.code == ErrorCode::ConstraintViolation => {
            DatabaseError::ConstraintViolation(msg.unwrap_or_else(|| err.to_string()))
        }
        other => DatabaseError::QueryFailed(other.to_string()),
    }
}

/// Database errors.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),
}
