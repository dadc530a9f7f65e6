//! Row models for the attendance schema

use crate::Error;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Attendance status, closed enumeration
///
/// Stored as TEXT; the schema CHECK constraint and this enum are the only
/// two places that know the set of legal values. Parsed at every boundary
/// so a free-form string never reaches the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum AttendanceStatus {
    Present,
    Absent,
    Medical,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "Present",
            AttendanceStatus::Absent => "Absent",
            AttendanceStatus::Medical => "Medical",
        }
    }
}

impl std::fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AttendanceStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Present" => Ok(AttendanceStatus::Present),
            "Absent" => Ok(AttendanceStatus::Absent),
            "Medical" => Ok(AttendanceStatus::Medical),
            other => Err(Error::InvalidInput(format!(
                "Invalid attendance status '{}' (expected Present, Absent or Medical)",
                other
            ))),
        }
    }
}

/// One roster entry, keyed by a unique RFID tag
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Student {
    pub guid: String,
    pub reg_no: String,
    pub full_name: String,
    pub email: Option<String>,
    pub faculty: Option<String>,
    pub rfid_tag_id: String,
    /// Medical exceptions granted so far, invariant 0..=2
    pub medical_count: i64,
}

/// One taught subject
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Subject {
    pub guid: String,
    pub code: String,
    pub name: String,
}

/// One weekly-recurring class slot in the timetable
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ScheduleEntry {
    pub guid: String,
    pub subject_id: String,
    /// Full English day name, "Monday".."Sunday"
    pub day_of_week: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub semester_week: i64,
}

/// One attendance decision: at most one per (student, subject, date)
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AttendanceRecord {
    pub guid: String,
    pub student_id: String,
    pub subject_id: String,
    pub date: NaiveDate,
    pub time_in: NaiveTime,
    pub status: AttendanceStatus,
}
