//! Attendance ledger endpoints: filtered listing and status correction

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use rollcall_common::db::models::{AttendanceRecord, AttendanceStatus};
use rollcall_common::events::AttendanceEvent;
use serde::Deserialize;
use serde_json::json;
use sqlx::QueryBuilder;

use crate::api::{ApiError, ApiResponse};
use crate::correction::{set_status, CorrectionOutcome};
use crate::AppState;

/// Optional filters for the ledger view
#[derive(Debug, Deserialize)]
pub struct AttendanceFilter {
    pub date: Option<String>,
    pub subject_id: Option<String>,
    pub student_id: Option<String>,
}

/// GET /api/attendance?date=&subject_id=&student_id=
pub async fn list_attendance(
    State(state): State<AppState>,
    Query(filter): Query<AttendanceFilter>,
) -> Result<Json<ApiResponse>, ApiError> {
    let mut qb = QueryBuilder::new(
        "SELECT guid, student_id, subject_id, date, time_in, status FROM attendance WHERE 1=1",
    );
    if let Some(date) = &filter.date {
        qb.push(" AND date = ").push_bind(date);
    }
    if let Some(subject_id) = &filter.subject_id {
        qb.push(" AND subject_id = ").push_bind(subject_id);
    }
    if let Some(student_id) = &filter.student_id {
        qb.push(" AND student_id = ").push_bind(student_id);
    }
    qb.push(" ORDER BY date DESC, time_in DESC");

    let records: Vec<AttendanceRecord> = qb.build_query_as().fetch_all(&state.db).await?;

    Ok(Json(ApiResponse::success(
        format!("{} attendance record(s).", records.len()),
        json!({ "records": records }),
    )))
}

/// Correction request; the status string is validated before any store access
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: Option<String>,
}

/// POST /api/attendance/:id/status
pub async fn set_attendance_status(
    State(state): State<AppState>,
    Path(attendance_id): Path<String>,
    Json(request): Json<StatusRequest>,
) -> Result<(StatusCode, Json<ApiResponse>), ApiError> {
    let raw = request
        .status
        .ok_or_else(|| ApiError::BadRequest("Missing status field.".to_string()))?;
    let new_status: AttendanceStatus = raw
        .parse()
        .map_err(|e: rollcall_common::Error| ApiError::BadRequest(e.to_string()))?;

    match set_status(&state.db, &attendance_id, new_status).await? {
        CorrectionOutcome::Updated { record, previous } => {
            state.sink.notify(AttendanceEvent::StatusCorrected {
                attendance_id: record.guid.clone(),
                old_status: previous,
                new_status: record.status,
                timestamp: Utc::now(),
            });
            Ok((
                StatusCode::OK,
                Json(ApiResponse::success(
                    format!("Attendance status updated to {}.", record.status),
                    json!({ "record": record }),
                )),
            ))
        }
        CorrectionOutcome::Unchanged { record } => Ok((
            StatusCode::OK,
            Json(ApiResponse::success(
                format!("Attendance status already {}; nothing changed.", record.status),
                json!({ "record": record }),
            )),
        )),
        CorrectionOutcome::MedicalLimitReached { medical_count } => {
            state.sink.notify(AttendanceEvent::CorrectionRejected {
                attendance_id,
                reason: "medical limit reached".to_string(),
                timestamp: Utc::now(),
            });
            Ok((
                StatusCode::CONFLICT,
                Json(ApiResponse::error(
                    "Cannot set to Medical: student has already reached the limit of 2 medical reasons.",
                    json!({ "medical_count": medical_count }),
                )),
            ))
        }
        CorrectionOutcome::NotFound => {
            state.sink.notify(AttendanceEvent::CorrectionRejected {
                attendance_id: attendance_id.clone(),
                reason: "no such attendance record".to_string(),
                timestamp: Utc::now(),
            });
            Err(ApiError::NotFound(format!(
                "No attendance record with id {}.",
                attendance_id
            )))
        }
    }
}
