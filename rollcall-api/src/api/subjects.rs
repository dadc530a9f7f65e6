//! Subject management endpoints
//!
//! Deleting a subject is refused while any schedule or attendance row
//! references it: past attendance must keep its subject.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use rollcall_common::db::models::Subject;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::api::{ApiError, ApiResponse};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SubjectRequest {
    pub code: String,
    pub name: String,
}

/// GET /api/subjects
pub async fn list_subjects(State(state): State<AppState>) -> Result<Json<ApiResponse>, ApiError> {
    let subjects: Vec<Subject> =
        sqlx::query_as("SELECT guid, code, name FROM subjects ORDER BY code")
            .fetch_all(&state.db)
            .await?;

    Ok(Json(ApiResponse::success(
        format!("{} subject(s).", subjects.len()),
        json!({ "subjects": subjects }),
    )))
}

/// POST /api/subjects
pub async fn create_subject(
    State(state): State<AppState>,
    Json(request): Json<SubjectRequest>,
) -> Result<(StatusCode, Json<ApiResponse>), ApiError> {
    if request.code.is_empty() || request.name.is_empty() {
        return Err(ApiError::BadRequest(
            "Subject code and name are required.".to_string(),
        ));
    }

    let guid = Uuid::new_v4().to_string();
    let insert = sqlx::query("INSERT INTO subjects (guid, code, name) VALUES (?, ?, ?)")
        .bind(&guid)
        .bind(&request.code)
        .bind(&request.name)
        .execute(&state.db)
        .await;

    match insert {
        Ok(_) => Ok((
            StatusCode::CREATED,
            Json(ApiResponse::success(
                "Subject created successfully.",
                json!({ "guid": guid }),
            )),
        )),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(
            ApiError::Conflict("A subject with this code already exists.".to_string()),
        ),
        Err(e) => Err(e.into()),
    }
}

/// PUT /api/subjects/:id
pub async fn update_subject(
    State(state): State<AppState>,
    Path(subject_id): Path<String>,
    Json(request): Json<SubjectRequest>,
) -> Result<Json<ApiResponse>, ApiError> {
    if request.code.is_empty() || request.name.is_empty() {
        return Err(ApiError::BadRequest(
            "Subject code and name are required.".to_string(),
        ));
    }

    let update = sqlx::query(
        "UPDATE subjects SET code = ?, name = ?, updated_at = CURRENT_TIMESTAMP WHERE guid = ?",
    )
    .bind(&request.code)
    .bind(&request.name)
    .bind(&subject_id)
    .execute(&state.db)
    .await;

    match update {
        Ok(result) if result.rows_affected() == 0 => Err(ApiError::NotFound(format!(
            "No subject with id {}.",
            subject_id
        ))),
        Ok(_) => Ok(Json(ApiResponse::success(
            "Subject updated successfully.",
            json!({ "guid": subject_id }),
        ))),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(
            ApiError::Conflict("A subject with this code already exists.".to_string()),
        ),
        Err(e) => Err(e.into()),
    }
}

/// DELETE /api/subjects/:id
pub async fn delete_subject(
    State(state): State<AppState>,
    Path(subject_id): Path<String>,
) -> Result<Json<ApiResponse>, ApiError> {
    // SQLite reports ON DELETE RESTRICT as a trigger constraint (extended
    // code 1811), which is_foreign_key_violation() does not match, so the
    // references are checked up front.
    let referenced: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM schedule WHERE subject_id = ?)
             OR EXISTS(SELECT 1 FROM attendance WHERE subject_id = ?)",
    )
    .bind(&subject_id)
    .bind(&subject_id)
    .fetch_one(&state.db)
    .await?;

    if referenced {
        return Err(ApiError::Conflict(
            "Subject is referenced by schedule entries or attendance records.".to_string(),
        ));
    }

    let delete = sqlx::query("DELETE FROM subjects WHERE guid = ?")
        .bind(&subject_id)
        .execute(&state.db)
        .await;

    match delete {
        Ok(result) if result.rows_affected() == 0 => Err(ApiError::NotFound(format!(
            "No subject with id {}.",
            subject_id
        ))),
        Ok(_) => Ok(Json(ApiResponse::success(
            "Subject deleted successfully.",
            json!({ "guid": subject_id }),
        ))),
        // A reference created between the check and the delete still trips
        // the constraint; codes 787 and 1811 both mean the restrict fired.
        Err(sqlx::Error::Database(db_err))
            if matches!(db_err.code().as_deref(), Some("787") | Some("1811")) =>
        {
            Err(ApiError::Conflict(
                "Subject is referenced by schedule entries or attendance records.".to_string(),
            ))
        }
        Err(e) => Err(e.into()),
    }
}
