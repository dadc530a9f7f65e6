//! Database layer: initialization, row models, settings accessor

pub mod init;
pub mod models;
pub mod settings;

pub use init::init_database;
