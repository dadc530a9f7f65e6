//! HTTP API handlers for rollcall-api

pub mod attendance;
pub mod health;
pub mod scan;
pub mod schedule;
pub mod settings;
pub mod students;
pub mod subjects;

pub use attendance::{list_attendance, set_attendance_status};
pub use health::health_routes;
pub use scan::record_scan;
pub use schedule::{create_schedule_entry, delete_schedule_entry, list_schedule, update_schedule_entry};
pub use settings::{get_settings, update_settings};
pub use students::{create_student, delete_student, list_students, student_history, update_student};
pub use subjects::{create_subject, delete_subject, list_subjects, update_subject};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rollcall_common::Error;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::error;

/// Response envelope shared by every endpoint
///
/// The `status` field carries the outcome ("success", "warning", "error");
/// the reader device inspects the body, not the HTTP code.
#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub status: &'static str,
    pub message: String,
    pub data: Value,
}

impl ApiResponse {
    pub fn success(message: impl Into<String>, data: Value) -> Self {
        Self {
            status: "success",
            message: message.into(),
            data,
        }
    }

    pub fn warning(message: impl Into<String>, data: Value) -> Self {
        Self {
            status: "warning",
            message: message.into(),
            data,
        }
    }

    pub fn error(message: impl Into<String>, data: Value) -> Self {
        Self {
            status: "error",
            message: message.into(),
            data,
        }
    }
}

/// Error type for admin handlers
///
/// Input and lookup errors keep their message; infrastructure errors are
/// logged with detail server-side and surfaced as a generic body.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Internal,
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            other => {
                error!("Request failed: {}", other);
                ApiError::Internal
            }
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        error!("Database error: {}", err);
        ApiError::Internal
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "A database error occurred.".to_string(),
            ),
        };

        let body = Json(ApiResponse::error(message, json!({})));
        (status, body).into_response()
    }
}
