//! rollcall-api library - RFID attendance service
//!
//! One axum service: scan ingestion for the reader device, plus the admin
//! surfaces (roster, subjects, timetable, ledger corrections, settings).

use axum::Router;
use rollcall_common::events::NotificationSink;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod correction;
pub mod resolver;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Fire-and-forget outcome notifications
    pub sink: NotificationSink,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, sink: NotificationSink) -> Self {
        Self { db, sink }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post, put};

    Router::new()
        // Reader device
        .route("/api/attendance/scan", post(api::record_scan))
        // Ledger
        .route("/api/attendance", get(api::list_attendance))
        .route("/api/attendance/:id/status", post(api::set_attendance_status))
        // Roster
        .route("/api/students", get(api::list_students).post(api::create_student))
        .route(
            "/api/students/:id",
            put(api::update_student).delete(api::delete_student),
        )
        .route("/api/students/:id/attendance", get(api::student_history))
        // Subjects
        .route("/api/subjects", get(api::list_subjects).post(api::create_subject))
        .route(
            "/api/subjects/:id",
            put(api::update_subject).delete(api::delete_subject),
        )
        // Timetable
        .route(
            "/api/schedule",
            get(api::list_schedule).post(api::create_schedule_entry),
        )
        .route(
            "/api/schedule/:id",
            put(api::update_schedule_entry).delete(api::delete_schedule_entry),
        )
        // Settings
        .route("/api/settings", get(api::get_settings).put(api::update_settings))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
