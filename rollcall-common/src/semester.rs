//! Semester week calculation
//!
//! Week 1 covers days 0..=6 from the configured start date, week 2 the next
//! seven days, and so on. The timetable stores full English day names, so
//! the weekday helper produces those.

use chrono::{NaiveDate, Weekday};

/// 1-based semester week for a scan date
///
/// `scan_date` must not precede `semester_start`; the caller rejects
/// before-start scans first.
pub fn semester_week(semester_start: NaiveDate, scan_date: NaiveDate) -> i64 {
    (scan_date - semester_start).num_days().div_euclid(7) + 1
}

/// Full English day name as stored in the schedule table
pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Check a day name against the closed set the schedule table accepts
pub fn is_valid_day_name(day: &str) -> bool {
    matches!(
        day,
        "Monday" | "Tuesday" | "Wednesday" | "Thursday" | "Friday" | "Saturday" | "Sunday"
    )
}
