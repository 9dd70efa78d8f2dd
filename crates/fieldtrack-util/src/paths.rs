//! Default paths for fieldtrack components
//!
//! Paths are user-writable by default:
//! - Config: `$XDG_CONFIG_HOME/fieldtrack/config.toml` or `~/.config/fieldtrack/config.toml`
//! - Data: `$XDG_DATA_HOME/fieldtrack` or `~/.local/share/fieldtrack`

use std::path::PathBuf;

/// Environment variable for overriding the data directory
pub const FIELDTRACK_DATA_DIR_ENV: &str = "FIELDTRACK_DATA_DIR";

/// Environment variable for overriding the config file
pub const FIELDTRACK_CONFIG_ENV: &str = "FIELDTRACK_CONFIG";

/// Application subdirectory name
const APP_DIR: &str = "fieldtrack";

/// Event database filename within the data directory
pub const DATABASE_FILENAME: &str = "fieldtrack.db";

/// Get the default config file path.
///
/// Order of precedence:
/// 1. `$FIELDTRACK_CONFIG` environment variable (if set)
/// 2. `$XDG_CONFIG_HOME/fieldtrack/config.toml` (if XDG_CONFIG_HOME is set)
/// 3. `~/.config/fieldtrack/config.toml` (fallback)
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(FIELDTRACK_CONFIG_ENV) {
        return PathBuf::from(path);
    }

    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join("config.toml");
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join("config.toml");
    }

    PathBuf::from("/etc").join(APP_DIR).join("config.toml")
}

/// Get the default data directory.
///
/// Order of precedence:
/// 1. `$FIELDTRACK_DATA_DIR` environment variable (if set)
/// 2. `$XDG_DATA_HOME/fieldtrack` (if XDG_DATA_HOME is set)
/// 3. `~/.local/share/fieldtrack` (fallback)
pub fn default_data_dir() -> PathBuf {
    if let Ok(path) = std::env::var(FIELDTRACK_DATA_DIR_ENV) {
        return PathBuf::from(path);
    }

    data_dir_without_env()
}

/// Get the data directory without checking FIELDTRACK_DATA_DIR env var.
/// Used for default values in configs where the env var is checked separately.
pub fn data_dir_without_env() -> PathBuf {
    if let Ok(data_home) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(data_home).join(APP_DIR);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR);
    }

    // Last resort
    PathBuf::from("/tmp").join(APP_DIR).join("data")
}
