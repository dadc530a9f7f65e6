//! Error type shared across the attendance service

use thiserror::Error;

/// Result alias used throughout the service
pub type Result<T> = std::result::Result<T, Error>;

/// Failures the attendance service propagates
///
/// Expected conditions (unknown tag, duplicate scan, missing settings) are
/// outcome values, not errors; this enum covers the rest.
#[derive(Error, Debug)]
pub enum Error {
    /// Store failure (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data folder or database file access failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Data-folder or settings configuration problem
    #[error("Configuration error: {0}")]
    Config(String),

    /// A value that must never reach the store (bad status string,
    /// out-of-range semester length)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An invariant the store should have upheld did not hold
    #[error("Internal error: {0}")]
    Internal(String),
}
