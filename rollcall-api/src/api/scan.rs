//! Scan ingestion endpoint
//!
//! Consumed by the RFID reader device. Always answers 200 with the
//! `{status, message, data}` envelope; the body carries the outcome. The
//! device retries failed POSTs itself; the server never retries a
//! resolution.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use rollcall_common::events::AttendanceEvent;
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::resolver::{resolve_scan, ScanOutcome};
use crate::{api::ApiResponse, AppState};

/// Raw scan event from the reader
///
/// Fields are optional so missing/empty values get the envelope error the
/// device expects instead of a framework rejection.
#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub rfid_tag_id: Option<String>,
    pub timestamp: Option<String>,
}

/// POST /api/attendance/scan
pub async fn record_scan(
    State(state): State<AppState>,
    Json(request): Json<ScanRequest>,
) -> Json<ApiResponse> {
    let (Some(rfid_tag_id), Some(timestamp)) = (request.rfid_tag_id, request.timestamp) else {
        return Json(ApiResponse::error(
            "Missing RFID tag ID or timestamp.",
            json!({}),
        ));
    };
    if rfid_tag_id.is_empty() || timestamp.is_empty() {
        return Json(ApiResponse::error(
            "Missing RFID tag ID or timestamp.",
            json!({}),
        ));
    }

    let outcome = match resolve_scan(&state.db, &rfid_tag_id, &timestamp).await {
        Ok(outcome) => outcome,
        Err(e) => {
            // Store failure: full detail server-side, generic body out
            error!("Scan resolution failed for tag '{}': {}", rfid_tag_id, e);
            state.sink.notify(AttendanceEvent::ScanRejected {
                rfid_tag_id,
                reason: "store failure".to_string(),
                timestamp: Utc::now(),
            });
            return Json(ApiResponse::error(
                "A database error occurred while recording attendance.",
                json!({}),
            ));
        }
    };

    let response = outcome_response(&outcome);
    state.sink.notify(outcome_event(&rfid_tag_id, &outcome, &response));
    Json(response)
}

/// Map a resolution outcome to the device-facing envelope
fn outcome_response(outcome: &ScanOutcome) -> ApiResponse {
    match outcome {
        ScanOutcome::Recorded { record } => ApiResponse::success(
            "Attendance recorded successfully.",
            json!({
                "student_id": record.student_id,
                "subject_id": record.subject_id,
                "date": record.date,
                "time_in": record.time_in,
            }),
        ),
        ScanOutcome::AlreadyRecorded { record } => ApiResponse::warning(
            "Attendance already recorded for this student, subject, and date.",
            json!({
                "student_id": record.student_id,
                "subject_id": record.subject_id,
                "date": record.date,
            }),
        ),
        ScanOutcome::UnknownTag { rfid_tag_id } => ApiResponse::error(
            "RFID tag ID not registered to any student.",
            json!({ "rfid_tag_id": rfid_tag_id }),
        ),
        ScanOutcome::NoScheduledClass { day, time, week } => ApiResponse::error(
            format!(
                "No class scheduled for this time, day ({}), and semester week ({}).",
                day, week
            ),
            json!({ "day": day, "time": time, "week": week }),
        ),
        ScanOutcome::ScanBeforeSemesterStart {
            scan_date,
            semester_start,
        } => ApiResponse::error(
            "Attendance scan date precedes the semester start date.",
            json!({ "scan_date": scan_date, "semester_start": semester_start }),
        ),
        ScanOutcome::SemesterWeekOutOfRange { week, max_weeks } => ApiResponse::error(
            format!(
                "Attendance scan date outside expected semester weeks range. (Week {})",
                week
            ),
            json!({ "week": week, "max_weeks": max_weeks }),
        ),
        ScanOutcome::SettingsMissing => ApiResponse::error(
            "Semester settings not configured in system settings.",
            json!({}),
        ),
        ScanOutcome::MalformedTimestamp { .. } => ApiResponse::error(
            "Invalid timestamp format. Expected YYYY-MM-DD HH:MM:SS.",
            json!({}),
        ),
    }
}

/// Every outcome, success or failure, is forwarded to the sink
fn outcome_event(rfid_tag_id: &str, outcome: &ScanOutcome, response: &ApiResponse) -> AttendanceEvent {
    let now = Utc::now();
    match outcome {
        ScanOutcome::Recorded { record } => AttendanceEvent::ScanRecorded {
            student_id: record.student_id.clone(),
            subject_id: record.subject_id.clone(),
            date: record.date,
            time_in: record.time_in,
            timestamp: now,
        },
        ScanOutcome::AlreadyRecorded { record } => AttendanceEvent::ScanDuplicate {
            student_id: record.student_id.clone(),
            subject_id: record.subject_id.clone(),
            date: record.date,
            timestamp: now,
        },
        _ => AttendanceEvent::ScanRejected {
            rfid_tag_id: rfid_tag_id.to_string(),
            reason: response.message.clone(),
            timestamp: now,
        },
    }
}
