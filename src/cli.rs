//! Command line interface.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use uuid::Uuid;

use repquest::gamification::leveling::{calculate_level, points_to_next_level, tier_for_level};
use repquest::gamification::types::{Drill, User};
use repquest::gamification::CompletionService;
use repquest::storage::config::{get_config_path, save_config};
use repquest::storage::{AppConfig, Database};

#[derive(Parser)]
#[command(name = "repquest")]
#[command(about = "Drill tracking with points, levels and badges", version)]
pub struct Cli {
    /// Print JSON instead of text
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
    /// Database file, overriding the configured path
    #[arg(long, global = true)]
    database: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the level and tier for a point total
    Level { points: u64 },
    /// Write the current settings to the config file
    InitConfig,
    /// Add any missing badges to the catalog
    Seed,
    /// Register a player
    AddUser { name: String },
    /// Create a drill
    AddDrill {
        name: String,
        #[arg(long)]
        points_per_rep: u32,
        #[arg(long, default_value_t = 0)]
        bonus: u32,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        coach: Option<Uuid>,
    },
    /// List players by points
    Users,
    /// List drills
    Drills,
    /// Log a drill completion
    Complete {
        #[arg(long)]
        user: Uuid,
        #[arg(long)]
        drill: Uuid,
        #[arg(long)]
        reps: u32,
    },
    /// Re-run badge checks for a player
    Recheck {
        #[arg(long)]
        user: Uuid,
    },
    /// Show a player's earned badges
    Badges {
        #[arg(long)]
        user: Uuid,
    },
    /// Show a player's level, tier and stats
    Summary {
        #[arg(long)]
        user: Uuid,
    },
}

#[derive(Serialize)]
struct LevelReport {
    points: u64,
    level: u64,
    tier: &'static str,
    emoji: &'static str,
    points_to_next_level: u64,
}

pub fn run(cli: Cli, config: AppConfig) -> Result<()> {
    let json = cli.json;

    if let Command::Level { points } = cli.command {
        let level = calculate_level(points);
        let tier = tier_for_level(level);
        let report = LevelReport {
            points,
            level,
            tier: tier.name(),
            emoji: tier.emoji(),
            points_to_next_level: points_to_next_level(points),
        };
        return emit(json, &report, || {
            format!(
                "Level {} {} {} ({} points to next level)",
                report.level, report.emoji, report.tier, report.points_to_next_level
            )
        });
    }

    if let Command::InitConfig = cli.command {
        save_config(&config)?;
        let path = get_config_path();
        return emit(json, &path, || format!("Wrote {}", path.display()));
    }

    let path = cli.database.unwrap_or_else(|| config.database_path());
    let db = Database::open(&path)
        .with_context(|| format!("opening database at {}", path.display()))?;
    let seeded = db.initialize_badges()?;
    let service = CompletionService::new(&db, config.utc_offset()?);

    match cli.command {
        Command::Level { .. } | Command::InitConfig => Ok(()),
        Command::Seed => emit(json, &seeded, || format!("Added {} badges", seeded)),
        Command::AddUser { name } => {
            let user = User::new(Uuid::new_v4(), name, Utc::now());
            db.insert_user(&user)?;
            emit(json, &user, || format!("{} {}", user.id, user.name))
        }
        Command::AddDrill {
            name,
            points_per_rep,
            bonus,
            description,
            coach,
        } => {
            let drill = Drill {
                id: Uuid::new_v4(),
                name,
                description,
                points_per_rep,
                completion_bonus: bonus,
                created_by: coach,
                created_at: Utc::now(),
            };
            db.insert_drill(&drill)?;
            emit(json, &drill, || format!("{} {}", drill.id, drill.name))
        }
        Command::Users => {
            let users = db.list_users()?;
            emit(json, &users, || {
                users
                    .iter()
                    .map(|u| format!("{} {:<20} {:>8} pts", u.id, u.name, u.points))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        Command::Drills => {
            let drills = db.list_drills()?;
            emit(json, &drills, || {
                drills
                    .iter()
                    .map(|d| {
                        format!(
                            "{} {:<20} {}/rep +{}",
                            d.id, d.name, d.points_per_rep, d.completion_bonus
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        Command::Complete { user, drill, reps } => {
            let outcome = service.complete_drill(Uuid::new_v4(), user, drill, reps, Utc::now())?;
            emit(json, &outcome, || {
                let mut lines = vec![format!(
                    "+{} points ({} total)",
                    outcome.completion.points_awarded, outcome.points_after
                )];
                if let Some(up) = &outcome.level_up {
                    lines.push(format!(
                        "Level up! {} -> {} {} {}",
                        up.from_level,
                        up.to_level,
                        up.tier.emoji(),
                        up.tier
                    ));
                }
                for badge in &outcome.new_badges {
                    lines.push(format!("Badge unlocked: {} {}", badge.icon, badge.name));
                }
                if outcome.special_value {
                    lines.push("6 7!".to_string());
                }
                lines.join("\n")
            })
        }
        Command::Recheck { user } => {
            let badges = service.recheck(user)?;
            emit(json, &badges, || {
                if badges.is_empty() {
                    "No new badges".to_string()
                } else {
                    badges
                        .iter()
                        .map(|b| format!("Badge unlocked: {} {}", b.icon, b.name))
                        .collect::<Vec<_>>()
                        .join("\n")
                }
            })
        }
        Command::Badges { user } => {
            let earned = db.list_earned_badges(&user)?;
            emit(json, &earned, || {
                earned
                    .iter()
                    .map(|e| {
                        format!(
                            "{} {:<18} {}",
                            e.badge.icon,
                            e.badge.name,
                            e.earned_at.format("%Y-%m-%d")
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        Command::Summary { user } => {
            let summary = service.summary(user, Utc::now())?;
            emit(json, &summary, || {
                format!(
                    "{}: level {} {} {} | {} pts, {} to next | streak {} | {} reps in {} sessions | {} badges",
                    summary.name,
                    summary.level,
                    summary.tier.emoji(),
                    summary.tier,
                    summary.points,
                    summary.points_to_next_level,
                    summary.stats.current_streak,
                    summary.stats.total_reps,
                    summary.stats.sessions_completed,
                    summary.badges_earned
                )
            })
        }
    }
}

fn emit<T: Serialize>(json: bool, value: &T, text: impl FnOnce() -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", text());
    }
    Ok(())
}
