//! Database initialization
//!
//! Creates the attendance schema on first run. Initialization is idempotent
//! and safe to call on every startup.
//!
//! The semester settings (`semester_weeks`, `semester_start_date`) are
//! deliberately NOT seeded here: ingestion must not run against an
//! unconfigured semester, so a missing setting surfaces as an explicit
//! error instead of a silent default. Seeding happens only through the
//! settings update endpoint.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Enable foreign keys (subject delete guard, attendance cascade)
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL mode: concurrent scan ingestion and admin reads
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    // Migrations (idempotent - safe to call multiple times)
    create_settings_table(&pool).await?;
    create_students_table(&pool).await?;
    create_subjects_table(&pool).await?;
    create_schedule_table(&pool).await?;
    create_attendance_table(&pool).await?;

    Ok(pool)
}

/// Create the settings table
///
/// Stores configuration key-value pairs. The rows themselves are written
/// only by the admin settings update.
pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the students table (the roster)
///
/// Each student is bound to exactly one RFID tag. The medical counter is
/// range-checked in the schema so no write path can push it outside [0, 2].
pub async fn create_students_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS students (
            guid TEXT PRIMARY KEY,
            reg_no TEXT NOT NULL UNIQUE,
            full_name TEXT NOT NULL,
            email TEXT,
            faculty TEXT,
            rfid_tag_id TEXT NOT NULL UNIQUE,
            medical_count INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK (medical_count >= 0 AND medical_count <= 2)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_students_rfid_tag ON students(rfid_tag_id)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the subjects table
pub async fn create_subjects_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS subjects (
            guid TEXT PRIMARY KEY,
            code TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the schedule table (the weekly timetable)
///
/// One row per weekly-recurring class slot. Overlapping slots on the same
/// day/week are not rejected; resolution takes the first match.
pub async fn create_schedule_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schedule (
            guid TEXT PRIMARY KEY,
            subject_id TEXT NOT NULL REFERENCES subjects(guid) ON DELETE RESTRICT,
            day_of_week TEXT NOT NULL CHECK (day_of_week IN
                ('Monday', 'Tuesday', 'Wednesday', 'Thursday', 'Friday', 'Saturday', 'Sunday')),
            start_time TEXT NOT NULL,
            end_time TEXT NOT NULL,
            semester_week INTEGER NOT NULL CHECK (semester_week >= 1),
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK (end_time > start_time)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_schedule_slot ON schedule(day_of_week, semester_week)",
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_schedule_subject ON schedule(subject_id)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the attendance table (the ledger)
///
/// UNIQUE(student_id, subject_id, date) is the idempotency key: a second
/// insert for the same class day fails at the store, so concurrent scans
/// cannot both record.
pub async fn create_attendance_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS attendance (
            guid TEXT PRIMARY KEY,
            student_id TEXT NOT NULL REFERENCES students(guid) ON DELETE CASCADE,
            subject_id TEXT NOT NULL REFERENCES subjects(guid) ON DELETE RESTRICT,
            date TEXT NOT NULL,
            time_in TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'Present' CHECK (status IN ('Present', 'Absent', 'Medical')),
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (student_id, subject_id, date)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_attendance_student ON attendance(student_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_attendance_date ON attendance(date)")
        .execute(pool)
        .await?;

    Ok(())
}
