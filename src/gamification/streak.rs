//! Daily streak tracking.

use chrono::NaiveDate;

/// Streak after a completion on `today`, given the streak so far and the day
/// of the previous completion.
pub fn next_streak(current: u32, last_day: Option<NaiveDate>, today: NaiveDate) -> u32 {
    match last_day {
        Some(last) if last == today => current.max(1),
        Some(last) if last.succ_opt() == Some(today) => current + 1,
        _ => 1,
    }
}

/// Streak as seen on `today` without a new completion. A streak survives
/// until the end of the day after the last completion.
pub fn visible_streak(current: u32, last_day: Option<NaiveDate>, today: NaiveDate) -> u32 {
    match last_day {
        Some(last) if last == today || last.succ_opt() == Some(today) => current,
        _ => 0,
    }
}
