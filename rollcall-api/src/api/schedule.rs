//! Timetable management endpoints
//!
//! Each entry is one weekly-recurring class slot. Time ranges must not
//! wrap overnight; overlap between entries is not rejected here (the
//! resolver takes the first match).

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveTime;
use rollcall_common::db::models::ScheduleEntry;
use rollcall_common::semester::is_valid_day_name;
use serde::Deserialize;
use serde_json::json;
use sqlx::QueryBuilder;
use uuid::Uuid;

use crate::api::{ApiError, ApiResponse};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ScheduleEntryRequest {
    pub subject_id: String,
    pub day_of_week: String,
    pub start_time: String,
    pub end_time: String,
    pub semester_week: i64,
}

/// Optional filters for the timetable view
#[derive(Debug, Deserialize)]
pub struct ScheduleFilter {
    pub day: Option<String>,
    pub week: Option<i64>,
}

/// Validated slot fields, parsed before any store access
struct SlotFields {
    start_time: String,
    end_time: String,
}

fn validate_slot(request: &ScheduleEntryRequest) -> Result<SlotFields, ApiError> {
    if !is_valid_day_name(&request.day_of_week) {
        return Err(ApiError::BadRequest(format!(
            "Invalid day of week '{}'.",
            request.day_of_week
        )));
    }

    let start = NaiveTime::parse_from_str(&request.start_time, "%H:%M:%S")
        .map_err(|_| ApiError::BadRequest("Invalid start time. Expected HH:MM:SS.".to_string()))?;
    let end = NaiveTime::parse_from_str(&request.end_time, "%H:%M:%S")
        .map_err(|_| ApiError::BadRequest("Invalid end time. Expected HH:MM:SS.".to_string()))?;

    if end <= start {
        return Err(ApiError::BadRequest(
            "End time must be after start time.".to_string(),
        ));
    }
    if request.semester_week < 1 {
        return Err(ApiError::BadRequest(
            "Semester week must be a positive integer.".to_string(),
        ));
    }

    Ok(SlotFields {
        start_time: start.format("%H:%M:%S").to_string(),
        end_time: end.format("%H:%M:%S").to_string(),
    })
}

/// GET /api/schedule?day=&week=
pub async fn list_schedule(
    State(state): State<AppState>,
    Query(filter): Query<ScheduleFilter>,
) -> Result<Json<ApiResponse>, ApiError> {
    let mut qb = QueryBuilder::new(
        "SELECT guid, subject_id, day_of_week, start_time, end_time, semester_week
         FROM schedule WHERE 1=1",
    );
    if let Some(day) = &filter.day {
        qb.push(" AND day_of_week = ").push_bind(day);
    }
    if let Some(week) = filter.week {
        qb.push(" AND semester_week = ").push_bind(week);
    }
    qb.push(" ORDER BY semester_week, day_of_week, start_time");

    let entries: Vec<ScheduleEntry> = qb.build_query_as().fetch_all(&state.db).await?;

    Ok(Json(ApiResponse::success(
        format!("{} schedule entr(ies).", entries.len()),
        json!({ "entries": entries }),
    )))
}

/// POST /api/schedule
pub async fn create_schedule_entry(
    State(state): State<AppState>,
    Json(request): Json<ScheduleEntryRequest>,
) -> Result<(StatusCode, Json<ApiResponse>), ApiError> {
    let slot = validate_slot(&request)?;

    let guid = Uuid::new_v4().to_string();
    let insert = sqlx::query(
        "INSERT INTO schedule (guid, subject_id, day_of_week, start_time, end_time, semester_week)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&guid)
    .bind(&request.subject_id)
    .bind(&request.day_of_week)
    .bind(&slot.start_time)
    .bind(&slot.end_time)
    .bind(request.semester_week)
    .execute(&state.db)
    .await;

    match insert {
        Ok(_) => Ok((
            StatusCode::CREATED,
            Json(ApiResponse::success(
                "Schedule entry created successfully.",
                json!({ "guid": guid }),
            )),
        )),
        Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => Err(
            ApiError::BadRequest("Unknown subject for schedule entry.".to_string()),
        ),
        Err(e) => Err(e.into()),
    }
}

/// PUT /api/schedule/:id
pub async fn update_schedule_entry(
    State(state): State<AppState>,
    Path(entry_id): Path<String>,
    Json(request): Json<ScheduleEntryRequest>,
) -> Result<Json<ApiResponse>, ApiError> {
    let slot = validate_slot(&request)?;

    let update = sqlx::query(
        "UPDATE schedule
         SET subject_id = ?, day_of_week = ?, start_time = ?, end_time = ?, semester_week = ?,
             updated_at = CURRENT_TIMESTAMP
         WHERE guid = ?",
    )
    .bind(&request.subject_id)
    .bind(&request.day_of_week)
    .bind(&slot.start_time)
    .bind(&slot.end_time)
    .bind(request.semester_week)
    .bind(&entry_id)
    .execute(&state.db)
    .await;

    match update {
        Ok(result) if result.rows_affected() == 0 => Err(ApiError::NotFound(format!(
            "No schedule entry with id {}.",
            entry_id
        ))),
        Ok(_) => Ok(Json(ApiResponse::success(
            "Schedule entry updated successfully.",
            json!({ "guid": entry_id }),
        ))),
        Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => Err(
            ApiError::BadRequest("Unknown subject for schedule entry.".to_string()),
        ),
        Err(e) => Err(e.into()),
    }
}

/// DELETE /api/schedule/:id
///
/// No effect on past attendance.
pub async fn delete_schedule_entry(
    State(state): State<AppState>,
    Path(entry_id): Path<String>,
) -> Result<Json<ApiResponse>, ApiError> {
    let result = sqlx::query("DELETE FROM schedule WHERE guid = ?")
        .bind(&entry_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(format!(
            "No schedule entry with id {}.",
            entry_id
        )));
    }

    Ok(Json(ApiResponse::success(
        "Schedule entry deleted successfully.",
        json!({ "guid": entry_id }),
    )))
}
