//! Semester settings accessor
//!
//! The resolver needs two configuration values: how long the semester is
//! and when it starts. These are read-only here; the single write path is
//! `update_semester_settings`, which validates both values and persists
//! them in one transaction.
//!
//! A missing or malformed setting is reported as `None` rather than
//! replaced with a default: ingestion against an unconfigured semester is
//! an operator error that must stay visible.

use crate::{Error, Result};
use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::warn;

pub const KEY_SEMESTER_WEEKS: &str = "semester_weeks";
pub const KEY_SEMESTER_START_DATE: &str = "semester_start_date";

/// Upper sanity bound for semester length
pub const MAX_SEMESTER_WEEKS: u32 = 52;

/// The two settings the scan resolver depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SemesterSettings {
    pub semester_weeks: u32,
    pub semester_start_date: NaiveDate,
}

/// Load the semester settings, `None` if either is absent or malformed
pub async fn load_semester_settings(pool: &SqlitePool) -> Result<Option<SemesterSettings>> {
    let weeks_raw = read_setting(pool, KEY_SEMESTER_WEEKS).await?;
    let start_raw = read_setting(pool, KEY_SEMESTER_START_DATE).await?;

    let (Some(weeks_raw), Some(start_raw)) = (weeks_raw, start_raw) else {
        return Ok(None);
    };

    let semester_weeks = match weeks_raw.parse::<u32>() {
        Ok(w) if (1..=MAX_SEMESTER_WEEKS).contains(&w) => w,
        _ => {
            warn!(
                "Setting '{}' has unusable value '{}', treating as unconfigured",
                KEY_SEMESTER_WEEKS, weeks_raw
            );
            return Ok(None);
        }
    };

    let semester_start_date = match NaiveDate::parse_from_str(&start_raw, "%Y-%m-%d") {
        Ok(d) => d,
        Err(_) => {
            warn!(
                "Setting '{}' has unusable value '{}', treating as unconfigured",
                KEY_SEMESTER_START_DATE, start_raw
            );
            return Ok(None);
        }
    };

    Ok(Some(SemesterSettings {
        semester_weeks,
        semester_start_date,
    }))
}

/// Update both semester settings, all-or-nothing
///
/// Validation happens before the transaction opens; an invalid weeks value
/// leaves both settings untouched.
pub async fn update_semester_settings(
    pool: &SqlitePool,
    semester_weeks: u32,
    semester_start_date: NaiveDate,
) -> Result<()> {
    if !(1..=MAX_SEMESTER_WEEKS).contains(&semester_weeks) {
        return Err(Error::InvalidInput(format!(
            "semester_weeks must be between 1 and {}, got {}",
            MAX_SEMESTER_WEEKS, semester_weeks
        )));
    }

    let mut tx = pool.begin().await?;

    write_setting(&mut tx, KEY_SEMESTER_WEEKS, &semester_weeks.to_string()).await?;
    write_setting(
        &mut tx,
        KEY_SEMESTER_START_DATE,
        &semester_start_date.format("%Y-%m-%d").to_string(),
    )
    .await?;

    tx.commit().await?;
    Ok(())
}

async fn read_setting(pool: &SqlitePool, key: &str) -> Result<Option<String>> {
    let value: Option<Option<String>> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(pool)
            .await?;

    Ok(value.flatten())
}

async fn write_setting(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    key: &str,
    value: &str,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO settings (key, value) VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(key)
    .bind(value)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
