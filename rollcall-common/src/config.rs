//! Data folder resolution
//!
//! The service keeps its SQLite database in a single data folder, resolved
//! in priority order:
//! 1. Command-line argument (highest priority)
//! 2. `ROLLCALL_DATA` environment variable
//! 3. TOML config file (`root_folder` key)
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Environment variable naming the data folder
pub const DATA_ENV_VAR: &str = "ROLLCALL_DATA";

/// Database file name inside the data folder
pub const DATABASE_FILE: &str = "rollcall.db";

/// Resolve the data folder for the service
pub fn resolve_data_folder(cli_arg: Option<&str>) -> Result<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Ok(PathBuf::from(path));
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(DATA_ENV_VAR) {
        return Ok(PathBuf::from(path));
    }

    // Priority 3: TOML config file
    if let Ok(config_path) = find_config_file() {
        if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                if let Some(root_folder) = config.get("root_folder").and_then(|v| v.as_str()) {
                    return Ok(PathBuf::from(root_folder));
                }
            }
        }
    }

    // Priority 4: OS-dependent compiled default
    Ok(default_data_folder())
}

/// Create the data folder if needed and return the database path inside it
pub fn ensure_data_folder(folder: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(folder)?;
    Ok(folder.join(DATABASE_FILE))
}

/// Find the configuration file for the platform
fn find_config_file() -> Result<PathBuf> {
    if cfg!(target_os = "linux") {
        // Try ~/.config/rollcall/config.toml first, then /etc/rollcall/config.toml
        let user_config = dirs::config_dir().map(|d| d.join("rollcall").join("config.toml"));
        let system_config = PathBuf::from("/etc/rollcall/config.toml");

        if let Some(path) = user_config {
            if path.exists() {
                return Ok(path);
            }
        }
        if system_config.exists() {
            return Ok(system_config);
        }
        return Err(Error::Config("No config file found".to_string()));
    }

    let config_path = dirs::config_dir()
        .map(|d| d.join("rollcall").join("config.toml"))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;

    if config_path.exists() {
        Ok(config_path)
    } else {
        Err(Error::Config(format!(
            "Config file not found: {:?}",
            config_path
        )))
    }
}

/// OS-dependent default data folder path
fn default_data_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        dirs::data_local_dir()
            .map(|d| d.join("rollcall"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/rollcall"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("rollcall"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/rollcall"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("rollcall"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\rollcall"))
    } else {
        PathBuf::from("./rollcall_data")
    }
}
