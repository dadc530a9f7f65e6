//! Roster management endpoints
//!
//! Enrollment binds a student to one RFID tag; the tag is immutable after
//! that (re-tagging means deleting and re-enrolling). The medical counter
//! may be seeded at enrollment but is never direct-written afterwards; the
//! status-correction operation is its only mutation path.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{NaiveDate, NaiveTime};
use rollcall_common::db::models::{AttendanceStatus, Student};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::api::{ApiError, ApiResponse};
use crate::AppState;

const STUDENT_COLUMNS: &str = "guid, reg_no, full_name, email, faculty, rfid_tag_id, medical_count";

#[derive(Debug, Deserialize)]
pub struct CreateStudentRequest {
    pub reg_no: String,
    pub full_name: String,
    pub email: Option<String>,
    pub faculty: Option<String>,
    pub rfid_tag_id: String,
    pub medical_count: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStudentRequest {
    pub reg_no: String,
    pub full_name: String,
    pub email: Option<String>,
    pub faculty: Option<String>,
}

/// GET /api/students
pub async fn list_students(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse>, ApiError> {
    let students: Vec<Student> = sqlx::query_as(&format!(
        "SELECT {} FROM students ORDER BY reg_no",
        STUDENT_COLUMNS
    ))
    .fetch_all(&state.db)
    .await?;

    Ok(Json(ApiResponse::success(
        format!("{} student(s).", students.len()),
        json!({ "students": students }),
    )))
}

/// POST /api/students
pub async fn create_student(
    State(state): State<AppState>,
    Json(request): Json<CreateStudentRequest>,
) -> Result<(StatusCode, Json<ApiResponse>), ApiError> {
    if request.reg_no.is_empty() || request.full_name.is_empty() || request.rfid_tag_id.is_empty()
    {
        return Err(ApiError::BadRequest(
            "Registration number, full name and RFID tag ID are required.".to_string(),
        ));
    }
    let medical_count = request.medical_count.unwrap_or(0);
    if !(0..=2).contains(&medical_count) {
        return Err(ApiError::BadRequest(
            "Medical count must be between 0 and 2.".to_string(),
        ));
    }

    let guid = Uuid::new_v4().to_string();
    let insert = sqlx::query(
        "INSERT INTO students (guid, reg_no, full_name, email, faculty, rfid_tag_id, medical_count)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&guid)
    .bind(&request.reg_no)
    .bind(&request.full_name)
    .bind(&request.email)
    .bind(&request.faculty)
    .bind(&request.rfid_tag_id)
    .bind(medical_count)
    .execute(&state.db)
    .await;

    match insert {
        Ok(_) => Ok((
            StatusCode::CREATED,
            Json(ApiResponse::success(
                "Student enrolled successfully.",
                json!({ "guid": guid }),
            )),
        )),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            Err(ApiError::Conflict(
                "Registration number or RFID tag is already enrolled.".to_string(),
            ))
        }
        Err(e) => Err(e.into()),
    }
}

/// PUT /api/students/:id
///
/// The RFID tag and medical counter are deliberately not updatable here.
pub async fn update_student(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
    Json(request): Json<UpdateStudentRequest>,
) -> Result<Json<ApiResponse>, ApiError> {
    if request.reg_no.is_empty() || request.full_name.is_empty() {
        return Err(ApiError::BadRequest(
            "Registration number and full name are required.".to_string(),
        ));
    }

    let update = sqlx::query(
        "UPDATE students
         SET reg_no = ?, full_name = ?, email = ?, faculty = ?, updated_at = CURRENT_TIMESTAMP
         WHERE guid = ?",
    )
    .bind(&request.reg_no)
    .bind(&request.full_name)
    .bind(&request.email)
    .bind(&request.faculty)
    .bind(&student_id)
    .execute(&state.db)
    .await;

    match update {
        Ok(result) if result.rows_affected() == 0 => Err(ApiError::NotFound(format!(
            "No student with id {}.",
            student_id
        ))),
        Ok(_) => Ok(Json(ApiResponse::success(
            "Student updated successfully.",
            json!({ "guid": student_id }),
        ))),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            Err(ApiError::Conflict(
                "Registration number is already enrolled.".to_string(),
            ))
        }
        Err(e) => Err(e.into()),
    }
}

/// DELETE /api/students/:id
///
/// Cascades the student's attendance history.
pub async fn delete_student(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> Result<Json<ApiResponse>, ApiError> {
    let result = sqlx::query("DELETE FROM students WHERE guid = ?")
        .bind(&student_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(format!(
            "No student with id {}.",
            student_id
        )));
    }

    Ok(Json(ApiResponse::success(
        "Student and attendance history deleted.",
        json!({ "guid": student_id }),
    )))
}

/// One row of a student's attendance history
#[derive(Debug, FromRow, Serialize)]
pub struct HistoryRow {
    pub date: NaiveDate,
    pub time_in: NaiveTime,
    pub status: AttendanceStatus,
    pub subject_code: String,
    pub subject_name: String,
}

/// GET /api/students/:id/attendance
///
/// The student-facing history view.
pub async fn student_history(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> Result<Json<ApiResponse>, ApiError> {
    let student: Option<Student> = sqlx::query_as(&format!(
        "SELECT {} FROM students WHERE guid = ? LIMIT 1",
        STUDENT_COLUMNS
    ))
    .bind(&student_id)
    .fetch_optional(&state.db)
    .await?;

    let Some(student) = student else {
        return Err(ApiError::NotFound(format!(
            "No student with id {}.",
            student_id
        )));
    };

    let history: Vec<HistoryRow> = sqlx::query_as(
        "SELECT a.date, a.time_in, a.status, s.code AS subject_code, s.name AS subject_name
         FROM attendance a
         JOIN subjects s ON s.guid = a.subject_id
         WHERE a.student_id = ?
         ORDER BY a.date DESC, a.time_in DESC",
    )
    .bind(&student_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(ApiResponse::success(
        format!("{} attendance record(s).", history.len()),
        json!({ "student": student, "history": history }),
    )))
}
