//! Special badge rules.
//!
//! Special badges are decided by a named pattern over the whole completion
//! history instead of a counter threshold. Rules live in a registry keyed by
//! badge name, so adding a badge means registering a rule.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Timelike, Utc, Weekday};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use super::types::DrillCompletion;

/// Custom predicate over the completion history.
pub type SpecialPredicate = fn(&[DrillCompletion], &FixedOffset) -> bool;

/// Pattern a special badge checks for.
#[derive(Debug, Clone)]
pub enum SpecialRule {
    /// Some completion has exactly this many reps
    RepsExactly(u32),
    /// Some completion happened before this local hour
    HourBefore(u32),
    /// Some completion happened at or after this local hour
    HourAtLeast(u32),
    /// Some calendar day has at least this many completions
    CompletionsInOneDay(usize),
    /// Completions exist on every listed weekday, not necessarily the same week
    AllWeekdays(Vec<Weekday>),
    /// Some calendar day has the same drill completed more than once
    RepeatedDrillInOneDay,
    /// Two consecutive completions are at least this far apart
    GapAtLeast(Duration),
    /// Reserved badge that cannot be earned yet
    Never,
    Custom(SpecialPredicate),
}

impl SpecialRule {
    /// Evaluate the rule. Hours, days and weekdays use `offset` as local time.
    pub fn is_met(&self, history: &[DrillCompletion], offset: &FixedOffset) -> bool {
        match self {
            SpecialRule::RepsExactly(reps) => history.iter().any(|c| c.reps == *reps),
            SpecialRule::HourBefore(hour) => history
                .iter()
                .any(|c| local(&c.completed_at, offset).hour() < *hour),
            SpecialRule::HourAtLeast(hour) => history
                .iter()
                .any(|c| local(&c.completed_at, offset).hour() >= *hour),
            SpecialRule::CompletionsInOneDay(min) => {
                completions_per_day(history, offset).values().any(|n| n >= min)
            }
            SpecialRule::AllWeekdays(days) => {
                let seen: HashSet<Weekday> = history
                    .iter()
                    .map(|c| local(&c.completed_at, offset).weekday())
                    .collect();
                !days.is_empty() && days.iter().all(|d| seen.contains(d))
            }
            SpecialRule::RepeatedDrillInOneDay => {
                let mut seen: HashSet<(NaiveDate, Uuid)> = HashSet::new();
                history
                    .iter()
                    .any(|c| !seen.insert((local_day(&c.completed_at, offset), c.drill_id)))
            }
            SpecialRule::GapAtLeast(gap) => {
                let mut times: Vec<DateTime<Utc>> =
                    history.iter().map(|c| c.completed_at).collect();
                times.sort_unstable();
                times.windows(2).any(|pair| pair[1] - pair[0] >= *gap)
            }
            SpecialRule::Never => false,
            SpecialRule::Custom(predicate) => predicate(history, offset),
        }
    }
}

fn local(at: &DateTime<Utc>, offset: &FixedOffset) -> DateTime<FixedOffset> {
    at.with_timezone(offset)
}

/// Calendar day of a timestamp in the given offset.
pub fn local_day(at: &DateTime<Utc>, offset: &FixedOffset) -> NaiveDate {
    local(at, offset).date_naive()
}

fn completions_per_day(
    history: &[DrillCompletion],
    offset: &FixedOffset,
) -> HashMap<NaiveDate, usize> {
    let mut per_day = HashMap::new();
    for completion in history {
        *per_day
            .entry(local_day(&completion.completed_at, offset))
            .or_insert(0) += 1;
    }
    per_day
}

/// Registry of special rules keyed by badge name.
#[derive(Debug, Clone, Default)]
pub struct SpecialRegistry {
    rules: HashMap<String, SpecialRule>,
}

impl SpecialRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in special badges.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry
            .register("6 7", SpecialRule::RepsExactly(67))
            .register("Lucky 77", SpecialRule::RepsExactly(77))
            .register("Early Bird", SpecialRule::HourBefore(6))
            .register("Night Owl", SpecialRule::HourAtLeast(22))
            .register("Hat Trick", SpecialRule::CompletionsInOneDay(3))
            .register("Marathon", SpecialRule::CompletionsInOneDay(10))
            .register(
                "Weekend Warrior",
                SpecialRule::AllWeekdays(vec![Weekday::Sat, Weekday::Sun]),
            )
            .register("Double Down", SpecialRule::RepeatedDrillInOneDay)
            .register("Comeback Kid", SpecialRule::GapAtLeast(Duration::days(7)))
            // Needs share tracking before it can be earned.
            .register("Social Star", SpecialRule::Never);
        registry
    }

    /// Register or replace the rule for a badge name.
    pub fn register(&mut self, name: &str, rule: SpecialRule) -> &mut Self {
        self.rules.insert(name.to_string(), rule);
        self
    }

    pub fn get(&self, name: &str) -> Option<&SpecialRule> {
        self.rules.get(name)
    }

    /// Evaluate the rule for `name`. Returns `None` if no rule is registered.
    pub fn evaluate(
        &self,
        name: &str,
        history: &[DrillCompletion],
        offset: &FixedOffset,
    ) -> Option<bool> {
        self.get(name).map(|rule| rule.is_met(history, offset))
    }
}
