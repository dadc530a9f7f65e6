//! Integration tests for scan resolution
//!
//! Exercises the full decision chain against a real database: timestamp
//! parsing, roster lookup, semester settings, week computation, timetable
//! matching, and the idempotent insert.

use chrono::NaiveDate;
use rollcall_api::resolver::{resolve_scan, ScanOutcome};
use rollcall_common::db::init_database;
use rollcall_common::db::models::AttendanceStatus;
use rollcall_common::db::settings::update_semester_settings;
use sqlx::SqlitePool;
use tempfile::TempDir;

const TAG: &str = "04:A3:22:B1";

/// Test helper: fresh database with one enrolled student and one subject
async fn setup_test_db() -> (SqlitePool, TempDir) {
    let dir = tempfile::tempdir().expect("Should create temp dir");
    let db_path = dir.path().join("rollcall.db");
    let pool = init_database(&db_path)
        .await
        .expect("Database initialization failed");

    sqlx::query(
        "INSERT INTO students (guid, reg_no, full_name, rfid_tag_id)
         VALUES ('stu-1', 'CS2021-001', 'Test Student', ?)",
    )
    .bind(TAG)
    .execute(&pool)
    .await
    .unwrap();

    sqlx::query("INSERT INTO subjects (guid, code, name) VALUES ('sub-1', 'CS101', 'Programming')")
        .execute(&pool)
        .await
        .unwrap();

    (pool, dir)
}

/// Semester of 15 weeks starting Monday 2025-01-06
async fn configure_semester(pool: &SqlitePool, weeks: u32) {
    let start = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
    update_semester_settings(pool, weeks, start).await.unwrap();
}

async fn add_slot(pool: &SqlitePool, guid: &str, day: &str, start: &str, end: &str, week: i64) {
    sqlx::query(
        "INSERT INTO schedule (guid, subject_id, day_of_week, start_time, end_time, semester_week)
         VALUES (?, 'sub-1', ?, ?, ?, ?)",
    )
    .bind(guid)
    .bind(day)
    .bind(start)
    .bind(end)
    .bind(week)
    .execute(pool)
    .await
    .unwrap();
}

async fn attendance_count(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM attendance")
        .fetch_one(pool)
        .await
        .unwrap()
}

// =============================================================================
// Happy path and idempotency
// =============================================================================

#[tokio::test]
async fn test_scan_recorded_as_present() {
    let (pool, _dir) = setup_test_db().await;
    configure_semester(&pool, 15).await;
    add_slot(&pool, "sch-1", "Monday", "09:00:00", "11:00:00", 1).await;

    let outcome = resolve_scan(&pool, TAG, "2025-01-06 09:30:00").await.unwrap();

    match outcome {
        ScanOutcome::Recorded { record } => {
            assert_eq!(record.student_id, "stu-1");
            assert_eq!(record.subject_id, "sub-1");
            assert_eq!(record.status, AttendanceStatus::Present);
            assert_eq!(record.date, NaiveDate::from_ymd_opt(2025, 1, 6).unwrap());
        }
        other => panic!("Expected Recorded, got {:?}", other),
    }
    assert_eq!(attendance_count(&pool).await, 1);
}

#[tokio::test]
async fn test_second_scan_same_day_is_duplicate() {
    let (pool, _dir) = setup_test_db().await;
    configure_semester(&pool, 15).await;
    add_slot(&pool, "sch-1", "Monday", "09:00:00", "11:00:00", 1).await;

    let first = resolve_scan(&pool, TAG, "2025-01-06 09:30:00").await.unwrap();
    assert!(matches!(first, ScanOutcome::Recorded { .. }));

    // Later the same day, still within the slot
    let second = resolve_scan(&pool, TAG, "2025-01-06 10:15:00").await.unwrap();
    match second {
        ScanOutcome::AlreadyRecorded { record } => {
            // The surviving record is the original, not the retry
            assert_eq!(record.time_in.to_string(), "09:30:00");
        }
        other => panic!("Expected AlreadyRecorded, got {:?}", other),
    }
    assert_eq!(attendance_count(&pool).await, 1);
}

#[tokio::test]
async fn test_concurrent_double_scan_records_once() {
    let (pool, _dir) = setup_test_db().await;
    configure_semester(&pool, 15).await;
    add_slot(&pool, "sch-1", "Monday", "09:00:00", "11:00:00", 1).await;

    // The reader device can retransmit; both resolutions race on the same
    // idempotency key and the unique constraint decides the winner.
    let p1 = pool.clone();
    let p2 = pool.clone();
    let a = tokio::spawn(async move { resolve_scan(&p1, TAG, "2025-01-06 09:30:00").await });
    let b = tokio::spawn(async move { resolve_scan(&p2, TAG, "2025-01-06 09:30:01").await });

    let a = a.await.unwrap().unwrap();
    let b = b.await.unwrap().unwrap();

    let recorded = [&a, &b]
        .iter()
        .filter(|o| matches!(o, ScanOutcome::Recorded { .. }))
        .count();
    assert!(recorded <= 1, "At most one scan may record");
    for outcome in [&a, &b] {
        assert!(
            matches!(outcome, ScanOutcome::Recorded { .. } | ScanOutcome::AlreadyRecorded { .. }),
            "Unexpected outcome {:?}",
            outcome
        );
    }
    assert_eq!(attendance_count(&pool).await, 1);
}

// =============================================================================
// Week computation through resolution
// =============================================================================

#[tokio::test]
async fn test_week_boundaries() {
    let (pool, _dir) = setup_test_db().await;
    configure_semester(&pool, 15).await;
    // Sunday of week 1 and Monday of week 2
    add_slot(&pool, "sch-1", "Sunday", "09:00:00", "11:00:00", 1).await;
    add_slot(&pool, "sch-2", "Monday", "09:00:00", "11:00:00", 2).await;

    // 2025-01-12 is day 6 from the start: still week 1
    let sunday = resolve_scan(&pool, TAG, "2025-01-12 09:30:00").await.unwrap();
    assert!(matches!(sunday, ScanOutcome::Recorded { .. }), "{:?}", sunday);

    // 2025-01-13 is day 7: week 2
    let monday = resolve_scan(&pool, TAG, "2025-01-13 09:30:00").await.unwrap();
    assert!(matches!(monday, ScanOutcome::Recorded { .. }), "{:?}", monday);
}

#[tokio::test]
async fn test_slot_time_range_is_inclusive() {
    let (pool, _dir) = setup_test_db().await;
    configure_semester(&pool, 15).await;
    add_slot(&pool, "sch-1", "Monday", "09:00:00", "11:00:00", 1).await;
    add_slot(&pool, "sch-2", "Monday", "09:00:00", "11:00:00", 2).await;

    let at_start = resolve_scan(&pool, TAG, "2025-01-06 09:00:00").await.unwrap();
    assert!(matches!(at_start, ScanOutcome::Recorded { .. }), "{:?}", at_start);

    // End of the slot, the following week
    let at_end = resolve_scan(&pool, TAG, "2025-01-13 11:00:00").await.unwrap();
    assert!(matches!(at_end, ScanOutcome::Recorded { .. }), "{:?}", at_end);

    // One second before the slot opens: the timetable check runs ahead of
    // the duplicate check, so this misses even on a recorded day
    let early = resolve_scan(&pool, TAG, "2025-01-06 08:59:59").await.unwrap();
    assert!(matches!(early, ScanOutcome::NoScheduledClass { .. }), "{:?}", early);
}

#[tokio::test]
async fn test_scan_before_semester_start() {
    let (pool, _dir) = setup_test_db().await;
    configure_semester(&pool, 15).await;
    add_slot(&pool, "sch-1", "Friday", "09:00:00", "11:00:00", 1).await;

    let outcome = resolve_scan(&pool, TAG, "2025-01-03 09:30:00").await.unwrap();

    match outcome {
        ScanOutcome::ScanBeforeSemesterStart { scan_date, semester_start } => {
            assert_eq!(scan_date, NaiveDate::from_ymd_opt(2025, 1, 3).unwrap());
            assert_eq!(semester_start, NaiveDate::from_ymd_opt(2025, 1, 6).unwrap());
        }
        other => panic!("Expected ScanBeforeSemesterStart, got {:?}", other),
    }
    assert_eq!(attendance_count(&pool).await, 0);
}

#[tokio::test]
async fn test_week_beyond_semester_length() {
    let (pool, _dir) = setup_test_db().await;
    configure_semester(&pool, 2).await;
    add_slot(&pool, "sch-1", "Monday", "09:00:00", "11:00:00", 3).await;

    // 2025-01-20 is week 3 of a 2-week semester
    let outcome = resolve_scan(&pool, TAG, "2025-01-20 09:30:00").await.unwrap();

    match outcome {
        ScanOutcome::SemesterWeekOutOfRange { week, max_weeks } => {
            assert_eq!(week, 3);
            assert_eq!(max_weeks, 2);
        }
        other => panic!("Expected SemesterWeekOutOfRange, got {:?}", other),
    }
    assert_eq!(attendance_count(&pool).await, 0);
}

// =============================================================================
// Rejection outcomes are side-effect-free
// =============================================================================

#[tokio::test]
async fn test_unknown_tag() {
    let (pool, _dir) = setup_test_db().await;
    configure_semester(&pool, 15).await;
    add_slot(&pool, "sch-1", "Monday", "09:00:00", "11:00:00", 1).await;

    let outcome = resolve_scan(&pool, "FF:FF:FF:FF", "2025-01-06 09:30:00")
        .await
        .unwrap();

    match outcome {
        ScanOutcome::UnknownTag { rfid_tag_id } => assert_eq!(rfid_tag_id, "FF:FF:FF:FF"),
        other => panic!("Expected UnknownTag, got {:?}", other),
    }
    assert_eq!(attendance_count(&pool).await, 0);
}

#[tokio::test]
async fn test_settings_missing_blocks_ingestion() {
    let (pool, _dir) = setup_test_db().await;
    add_slot(&pool, "sch-1", "Monday", "09:00:00", "11:00:00", 1).await;

    let outcome = resolve_scan(&pool, TAG, "2025-01-06 09:30:00").await.unwrap();

    assert!(matches!(outcome, ScanOutcome::SettingsMissing), "{:?}", outcome);
    assert_eq!(attendance_count(&pool).await, 0);
}

#[tokio::test]
async fn test_no_scheduled_class() {
    let (pool, _dir) = setup_test_db().await;
    configure_semester(&pool, 15).await;
    add_slot(&pool, "sch-1", "Monday", "09:00:00", "11:00:00", 1).await;

    // Right day, outside the slot
    let outcome = resolve_scan(&pool, TAG, "2025-01-06 13:00:00").await.unwrap();

    match outcome {
        ScanOutcome::NoScheduledClass { day, week, .. } => {
            assert_eq!(day, "Monday");
            assert_eq!(week, 1);
        }
        other => panic!("Expected NoScheduledClass, got {:?}", other),
    }
    assert_eq!(attendance_count(&pool).await, 0);
}

#[tokio::test]
async fn test_malformed_timestamps() {
    let (pool, _dir) = setup_test_db().await;
    configure_semester(&pool, 15).await;

    for raw in [
        "2025-01-06T09:30:00",
        "06/01/2025 09:30:00",
        "2025-01-06",
        "2025-1-6 9:30:00",
        "2025-01-06 9:30:00",
        "not a timestamp",
        "",
    ] {
        let outcome = resolve_scan(&pool, TAG, raw).await.unwrap();
        assert!(
            matches!(outcome, ScanOutcome::MalformedTimestamp { .. }),
            "'{}' should be rejected, got {:?}",
            raw,
            outcome
        );
    }
    assert_eq!(attendance_count(&pool).await, 0);
}
