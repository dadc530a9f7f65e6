//! Semester settings endpoints
//!
//! Both values must validate before either is persisted. There is no
//! implicit default: until an admin configures the semester here,
//! ingestion reports the settings as missing.

use axum::extract::State;
use axum::Json;
use chrono::NaiveDate;
use rollcall_common::db::settings::{
    load_semester_settings, update_semester_settings, MAX_SEMESTER_WEEKS,
};
use serde::Deserialize;
use serde_json::json;

use crate::api::{ApiError, ApiResponse};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SettingsRequest {
    pub semester_weeks: Option<u32>,
    pub semester_start_date: Option<String>,
}

/// GET /api/settings
pub async fn get_settings(State(state): State<AppState>) -> Result<Json<ApiResponse>, ApiError> {
    match load_semester_settings(&state.db).await? {
        Some(settings) => Ok(Json(ApiResponse::success(
            "Semester settings.",
            json!({
                "semester_weeks": settings.semester_weeks,
                "semester_start_date": settings.semester_start_date,
            }),
        ))),
        None => Ok(Json(ApiResponse::warning(
            "Semester settings not configured.",
            json!({}),
        ))),
    }
}

/// PUT /api/settings
pub async fn update_settings(
    State(state): State<AppState>,
    Json(request): Json<SettingsRequest>,
) -> Result<Json<ApiResponse>, ApiError> {
    let (Some(semester_weeks), Some(start_raw)) =
        (request.semester_weeks, request.semester_start_date)
    else {
        return Err(ApiError::BadRequest(
            "Both semester_weeks and semester_start_date are required.".to_string(),
        ));
    };

    if !(1..=MAX_SEMESTER_WEEKS).contains(&semester_weeks) {
        return Err(ApiError::BadRequest(format!(
            "Invalid number of semester weeks. Expected 1 to {}.",
            MAX_SEMESTER_WEEKS
        )));
    }
    let semester_start_date = NaiveDate::parse_from_str(&start_raw, "%Y-%m-%d").map_err(|_| {
        ApiError::BadRequest("Invalid semester start date. Expected YYYY-MM-DD.".to_string())
    })?;

    update_semester_settings(&state.db, semester_weeks, semester_start_date).await?;

    Ok(Json(ApiResponse::success(
        format!("Semester settings updated to {} weeks.", semester_weeks),
        json!({
            "semester_weeks": semester_weeks,
            "semester_start_date": semester_start_date,
        }),
    )))
}
