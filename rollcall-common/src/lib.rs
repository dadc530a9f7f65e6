//! # Rollcall Common Library
//!
//! Shared code for the Rollcall attendance service:
//! - Database initialization, row models and settings accessor
//! - Event types and the notification sink
//! - Semester week calculation
//! - Data folder resolution

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod semester;

pub use error::{Error, Result};
