//! Scan resolution
//!
//! Turns one raw RFID scan event into exactly one attendance decision:
//! which student, which subject, which semester week, and whether the day
//! is already recorded. Every expected condition is a `ScanOutcome` value;
//! `Err` is reserved for store failures. The only write on any path is the
//! single insert for a fresh `Recorded` outcome.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use rollcall_common::db::models::{AttendanceRecord, AttendanceStatus, Student};
use rollcall_common::db::settings::load_semester_settings;
use rollcall_common::semester::{semester_week, weekday_name};
use rollcall_common::{Error, Result};
use sqlx::SqlitePool;
use uuid::Uuid;

/// The one timestamp format the reader device sends; anything else is rejected
pub const SCAN_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Result of resolving one scan event
#[derive(Debug, Clone)]
pub enum ScanOutcome {
    /// A new attendance record was written with status Present
    Recorded { record: AttendanceRecord },
    /// This (student, subject, date) was already recorded; no write
    AlreadyRecorded { record: AttendanceRecord },
    /// The tag is not bound to any student
    UnknownTag { rfid_tag_id: String },
    /// No timetable slot covers this day, time and week
    NoScheduledClass {
        day: &'static str,
        time: NaiveTime,
        week: i64,
    },
    /// The scan predates the configured semester start
    ScanBeforeSemesterStart {
        scan_date: NaiveDate,
        semester_start: NaiveDate,
    },
    /// The computed week falls outside the configured semester length
    SemesterWeekOutOfRange { week: i64, max_weeks: u32 },
    /// Semester settings are not configured; ingestion cannot proceed
    SettingsMissing,
    /// The timestamp did not match the required format
    MalformedTimestamp { raw: String },
}

/// Resolve one (tag, timestamp) scan event
///
/// Checks run in a fixed order and each short-circuits; validation always
/// precedes persistence, so failure outcomes are side-effect-free.
pub async fn resolve_scan(
    pool: &SqlitePool,
    rfid_tag_id: &str,
    raw_timestamp: &str,
) -> Result<ScanOutcome> {
    // 1. Strict timestamp parse, before any store access. chrono tolerates
    // non-zero-padded fields, so the parsed value must render back to the
    // input byte-for-byte.
    let scan = NaiveDateTime::parse_from_str(raw_timestamp, SCAN_TIMESTAMP_FORMAT)
        .ok()
        .filter(|dt| dt.format(SCAN_TIMESTAMP_FORMAT).to_string() == raw_timestamp);
    let Some(scan) = scan else {
        return Ok(ScanOutcome::MalformedTimestamp {
            raw: raw_timestamp.to_string(),
        });
    };
    let scan_date = scan.date();
    let scan_time = scan.time();

    // 2. Roster lookup by tag
    let student: Option<Student> = sqlx::query_as(
        "SELECT guid, reg_no, full_name, email, faculty, rfid_tag_id, medical_count
         FROM students WHERE rfid_tag_id = ? LIMIT 1",
    )
    .bind(rfid_tag_id)
    .fetch_optional(pool)
    .await?;

    let Some(student) = student else {
        return Ok(ScanOutcome::UnknownTag {
            rfid_tag_id: rfid_tag_id.to_string(),
        });
    };

    // 3. Semester settings must be configured explicitly
    let Some(settings) = load_semester_settings(pool).await? else {
        return Ok(ScanOutcome::SettingsMissing);
    };

    // 4. Scans before the semester start are rejected, not backdated
    if scan_date < settings.semester_start_date {
        return Ok(ScanOutcome::ScanBeforeSemesterStart {
            scan_date,
            semester_start: settings.semester_start_date,
        });
    }

    // 5. Week 1 covers days 0..=6 from the start date
    let week = semester_week(settings.semester_start_date, scan_date);

    // 6. Bound by the configured semester length
    if week < 1 || week > i64::from(settings.semester_weeks) {
        return Ok(ScanOutcome::SemesterWeekOutOfRange {
            week,
            max_weeks: settings.semester_weeks,
        });
    }

    // 7. Timetable match. Overlapping slots are a timetable ambiguity the
    // resolver does not arbitrate: first match wins.
    let day = weekday_name(scan_date.weekday());
    let time_str = scan_time.format("%H:%M:%S").to_string();

    let subject_id: Option<String> = sqlx::query_scalar(
        "SELECT subject_id FROM schedule
         WHERE day_of_week = ? AND start_time <= ? AND end_time >= ? AND semester_week = ?
         LIMIT 1",
    )
    .bind(day)
    .bind(&time_str)
    .bind(&time_str)
    .bind(week)
    .fetch_optional(pool)
    .await?;

    let Some(subject_id) = subject_id else {
        return Ok(ScanOutcome::NoScheduledClass {
            day,
            time: scan_time,
            week,
        });
    };

    // 8. Ledger check on the idempotency key
    let date_str = scan_date.format("%Y-%m-%d").to_string();
    if let Some(existing) = fetch_by_key(pool, &student.guid, &subject_id, &date_str).await? {
        return Ok(ScanOutcome::AlreadyRecorded { record: existing });
    }

    // 9. Insert. A concurrent scan may have won between the check and this
    // insert; the unique constraint decides, and the loser reports the
    // surviving record instead of failing.
    let guid = Uuid::new_v4().to_string();
    let insert = sqlx::query(
        "INSERT INTO attendance (guid, student_id, subject_id, date, time_in, status)
         VALUES (?, ?, ?, ?, ?, 'Present')",
    )
    .bind(&guid)
    .bind(&student.guid)
    .bind(&subject_id)
    .bind(&date_str)
    .bind(&time_str)
    .execute(pool)
    .await;

    match insert {
        Ok(_) => Ok(ScanOutcome::Recorded {
            record: AttendanceRecord {
                guid,
                student_id: student.guid,
                subject_id,
                date: scan_date,
                time_in: scan_time,
                status: AttendanceStatus::Present,
            },
        }),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            let existing = fetch_by_key(pool, &student.guid, &subject_id, &date_str)
                .await?
                .ok_or_else(|| {
                    Error::Internal("duplicate insert reported but no record found".to_string())
                })?;
            Ok(ScanOutcome::AlreadyRecorded { record: existing })
        }
        Err(e) => Err(e.into()),
    }
}

async fn fetch_by_key(
    pool: &SqlitePool,
    student_id: &str,
    subject_id: &str,
    date: &str,
) -> Result<Option<AttendanceRecord>> {
    let record = sqlx::query_as(
        "SELECT guid, student_id, subject_id, date, time_in, status
         FROM attendance WHERE student_id = ? AND subject_id = ? AND date = ? LIMIT 1",
    )
    .bind(student_id)
    .bind(subject_id)
    .bind(date)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}
