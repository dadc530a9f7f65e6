//! Unit tests for database initialization and the semester settings accessor
//!
//! Covers schema creation, idempotent re-initialization, the store-level
//! constraints the write paths rely on, and the all-or-nothing settings
//! update.

use chrono::NaiveDate;
use rollcall_common::db::init_database;
use rollcall_common::db::settings::{
    load_semester_settings, update_semester_settings, KEY_SEMESTER_WEEKS,
};
use sqlx::SqlitePool;
use tempfile::TempDir;

/// Test helper: fresh database in a throwaway directory
async fn setup_test_db() -> (SqlitePool, TempDir) {
    let dir = tempfile::tempdir().expect("Should create temp dir");
    let db_path = dir.path().join("rollcall.db");
    let pool = init_database(&db_path)
        .await
        .expect("Database initialization failed");
    (pool, dir)
}

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("rollcall.db");
    assert!(!db_path.exists());

    let result = init_database(&db_path).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_init_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("rollcall.db");

    let pool1 = init_database(&db_path).await;
    assert!(pool1.is_ok());
    drop(pool1);

    // Second init opens the existing file and re-runs the migrations
    let pool2 = init_database(&db_path).await;
    assert!(pool2.is_ok(), "Failed to re-open existing database: {:?}", pool2.err());
}

#[tokio::test]
async fn test_no_semester_settings_seeded() {
    let (pool, _dir) = setup_test_db().await;

    // A fresh database is unconfigured until an admin sets the semester
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM settings WHERE key = ?")
        .bind(KEY_SEMESTER_WEEKS)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0, "Semester settings must not be seeded at init");

    let settings = load_semester_settings(&pool).await.unwrap();
    assert!(settings.is_none());
}

#[tokio::test]
async fn test_attendance_unique_constraint() {
    let (pool, _dir) = setup_test_db().await;
    seed_student_and_subject(&pool, "stu-1", "sub-1").await;

    sqlx::query(
        "INSERT INTO attendance (guid, student_id, subject_id, date, time_in)
         VALUES ('att-1', 'stu-1', 'sub-1', '2025-01-06', '09:00:00')",
    )
    .execute(&pool)
    .await
    .unwrap();

    // Same (student, subject, date) with a different time must be refused
    let second = sqlx::query(
        "INSERT INTO attendance (guid, student_id, subject_id, date, time_in)
         VALUES ('att-2', 'stu-1', 'sub-1', '2025-01-06', '10:30:00')",
    )
    .execute(&pool)
    .await;

    match second {
        Err(sqlx::Error::Database(db_err)) => assert!(db_err.is_unique_violation()),
        other => panic!("Expected unique violation, got {:?}", other),
    }
}

#[tokio::test]
async fn test_medical_count_range_check() {
    let (pool, _dir) = setup_test_db().await;

    let result = sqlx::query(
        "INSERT INTO students (guid, reg_no, full_name, rfid_tag_id, medical_count)
         VALUES ('stu-x', 'REG-X', 'X', 'TAG-X', 3)",
    )
    .execute(&pool)
    .await;

    assert!(result.is_err(), "medical_count above 2 must be rejected by the schema");
}

#[tokio::test]
async fn test_subject_delete_restricted_by_schedule() {
    let (pool, _dir) = setup_test_db().await;
    seed_student_and_subject(&pool, "stu-1", "sub-1").await;

    sqlx::query(
        "INSERT INTO schedule (guid, subject_id, day_of_week, start_time, end_time, semester_week)
         VALUES ('sch-1', 'sub-1', 'Monday', '09:00:00', '11:00:00', 1)",
    )
    .execute(&pool)
    .await
    .unwrap();

    let delete = sqlx::query("DELETE FROM subjects WHERE guid = 'sub-1'")
        .execute(&pool)
        .await;

    // ON DELETE RESTRICT surfaces as extended code 1811, not as a plain
    // foreign key violation (787)
    match delete {
        Err(sqlx::Error::Database(db_err)) => {
            assert!(
                matches!(db_err.code().as_deref(), Some("787") | Some("1811")),
                "Expected restrict constraint, got code {:?}",
                db_err.code()
            );
        }
        other => panic!("Expected constraint violation, got {:?}", other),
    }

    let survives: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subjects WHERE guid = 'sub-1'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(survives, 1, "Referenced subject must survive the delete");
}

#[tokio::test]
async fn test_student_delete_cascades_attendance() {
    let (pool, _dir) = setup_test_db().await;
    seed_student_and_subject(&pool, "stu-1", "sub-1").await;

    sqlx::query(
        "INSERT INTO attendance (guid, student_id, subject_id, date, time_in)
         VALUES ('att-1', 'stu-1', 'sub-1', '2025-01-06', '09:00:00')",
    )
    .execute(&pool)
    .await
    .unwrap();

    sqlx::query("DELETE FROM students WHERE guid = 'stu-1'")
        .execute(&pool)
        .await
        .unwrap();

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM attendance")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(remaining, 0, "Attendance must cascade with the student");
}

#[tokio::test]
async fn test_settings_update_and_load_roundtrip() {
    let (pool, _dir) = setup_test_db().await;
    let start = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();

    update_semester_settings(&pool, 15, start).await.unwrap();

    let settings = load_semester_settings(&pool).await.unwrap().unwrap();
    assert_eq!(settings.semester_weeks, 15);
    assert_eq!(settings.semester_start_date, start);

    // Upsert replaces, it does not duplicate
    update_semester_settings(&pool, 20, start).await.unwrap();
    let settings = load_semester_settings(&pool).await.unwrap().unwrap();
    assert_eq!(settings.semester_weeks, 20);

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM settings")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(rows, 2);
}

#[tokio::test]
async fn test_settings_update_rejects_bad_weeks() {
    let (pool, _dir) = setup_test_db().await;
    let start = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();

    update_semester_settings(&pool, 15, start).await.unwrap();

    assert!(update_semester_settings(&pool, 0, start).await.is_err());
    assert!(update_semester_settings(&pool, 53, start).await.is_err());

    // Rejected updates leave the stored values untouched
    let settings = load_semester_settings(&pool).await.unwrap().unwrap();
    assert_eq!(settings.semester_weeks, 15);
}

#[tokio::test]
async fn test_malformed_setting_treated_as_unconfigured() {
    let (pool, _dir) = setup_test_db().await;
    let start = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();

    update_semester_settings(&pool, 15, start).await.unwrap();

    sqlx::query("UPDATE settings SET value = 'soon' WHERE key = 'semester_start_date'")
        .execute(&pool)
        .await
        .unwrap();

    let settings = load_semester_settings(&pool).await.unwrap();
    assert!(settings.is_none(), "Malformed value must read as unconfigured");
}

async fn seed_student_and_subject(pool: &SqlitePool, student_guid: &str, subject_guid: &str) {
    sqlx::query(
        "INSERT INTO students (guid, reg_no, full_name, rfid_tag_id)
         VALUES (?, ?, ?, ?)",
    )
    .bind(student_guid)
    .bind(format!("REG-{}", student_guid))
    .bind("Test Student")
    .bind(format!("TAG-{}", student_guid))
    .execute(pool)
    .await
    .unwrap();

    sqlx::query("INSERT INTO subjects (guid, code, name) VALUES (?, ?, 'Test Subject')")
        .bind(subject_guid)
        .bind(format!("CODE-{}", subject_guid))
        .execute(pool)
        .await
        .unwrap();
}
