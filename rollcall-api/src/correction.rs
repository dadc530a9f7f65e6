//! Attendance status correction
//!
//! The only path that mutates a record's status, and the only path that
//! touches a student's medical counter. Counter changes are conditional
//! UPDATEs, so the [0, 2] invariant and the limit check are enforced at the
//! store even under concurrent corrections.
//!
//! Transition table:
//! - Absent -> Medical: increment counter, rejected at 2
//! - Medical -> Absent: decrement counter
//! - same value: no-op, reported distinctly
//! - all other transitions: plain status overwrite, no counter effect

use rollcall_common::db::models::{AttendanceRecord, AttendanceStatus};
use rollcall_common::{Error, Result};
use sqlx::SqlitePool;

/// Result of one correction request
#[derive(Debug, Clone)]
pub enum CorrectionOutcome {
    /// Status changed; `previous` is the status before the update
    Updated {
        record: AttendanceRecord,
        previous: AttendanceStatus,
    },
    /// Requested status equals the current one; nothing written
    Unchanged { record: AttendanceRecord },
    /// Absent -> Medical rejected: the student is at the limit
    MedicalLimitReached { medical_count: i64 },
    /// No attendance record with this id
    NotFound,
}

/// Apply one status correction to an existing attendance record
pub async fn set_status(
    pool: &SqlitePool,
    attendance_id: &str,
    new_status: AttendanceStatus,
) -> Result<CorrectionOutcome> {
    let Some(record) = fetch_by_id(pool, attendance_id).await? else {
        return Ok(CorrectionOutcome::NotFound);
    };

    if record.status == new_status {
        return Ok(CorrectionOutcome::Unchanged { record });
    }

    let mut tx = pool.begin().await?;

    match (record.status, new_status) {
        (AttendanceStatus::Absent, AttendanceStatus::Medical) => {
            // Check-and-increment in one statement; two concurrent
            // corrections cannot both pass the < 2 check.
            let result = sqlx::query(
                "UPDATE students
                 SET medical_count = medical_count + 1, updated_at = CURRENT_TIMESTAMP
                 WHERE guid = ? AND medical_count < 2",
            )
            .bind(&record.student_id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                drop(tx);
                let medical_count: i64 =
                    sqlx::query_scalar("SELECT medical_count FROM students WHERE guid = ?")
                        .bind(&record.student_id)
                        .fetch_one(pool)
                        .await?;
                return Ok(CorrectionOutcome::MedicalLimitReached { medical_count });
            }
        }
        (AttendanceStatus::Medical, AttendanceStatus::Absent) => {
            // Guarded so the counter cannot go below 0 even if the record
            // and counter ever disagree.
            sqlx::query(
                "UPDATE students
                 SET medical_count = medical_count - 1, updated_at = CURRENT_TIMESTAMP
                 WHERE guid = ? AND medical_count > 0",
            )
            .bind(&record.student_id)
            .execute(&mut *tx)
            .await?;
        }
        _ => {} // plain overwrite, no counter effect
    }

    // Guarded by the status we read: if another correction slipped in
    // between, nothing is written and the counter change rolls back.
    let result = sqlx::query(
        "UPDATE attendance
         SET status = ?, updated_at = CURRENT_TIMESTAMP
         WHERE guid = ? AND status = ?",
    )
    .bind(new_status.as_str())
    .bind(attendance_id)
    .bind(record.status.as_str())
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::Internal(format!(
            "attendance record {} changed concurrently",
            attendance_id
        )));
    }

    tx.commit().await?;

    let previous = record.status;
    Ok(CorrectionOutcome::Updated {
        record: AttendanceRecord {
            status: new_status,
            ..record
        },
        previous,
    })
}

/// Fetch one attendance record by id
pub async fn fetch_by_id(pool: &SqlitePool, attendance_id: &str) -> Result<Option<AttendanceRecord>> {
    let record = sqlx::query_as(
        "SELECT guid, student_id, subject_id, date, time_in, status
         FROM attendance WHERE guid = ? LIMIT 1",
    )
    .bind(attendance_id)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}
