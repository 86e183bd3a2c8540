//! Default paths for syllabus components
//!
//! Paths are user-writable by default:
//! - Config: `$XDG_CONFIG_HOME/syllabus/config.toml` or `~/.config/syllabus/config.toml`
//! - Data: `$XDG_DATA_HOME/syllabus` or `~/.local/share/syllabus`

use std::path::PathBuf;

/// Environment variable for overriding the config file path
pub const SYLLABUS_CONFIG_ENV: &str = "SYLLABUS_CONFIG";

/// Config filename within the config directory
const CONFIG_FILENAME: &str = "config.toml";

/// Database filename within the data directory
pub const DATABASE_FILENAME: &str = "syllabus.db";

/// Application subdirectory name
const APP_DIR: &str = "syllabus";

/// Get the default config file path.
///
/// Order of precedence:
/// 1. `$SYLLABUS_CONFIG` environment variable (if set)
/// 2. `$XDG_CONFIG_HOME/syllabus/config.toml` (if XDG_CONFIG_HOME is set)
/// 3. `~/.config/syllabus/config.toml` (fallback)
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(SYLLABUS_CONFIG_ENV) {
        return PathBuf::from(path);
    }

    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join(CONFIG_FILENAME);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join(CONFIG_FILENAME);
    }

    PathBuf::from("/etc").join(APP_DIR).join(CONFIG_FILENAME)
}

/// Get the default data directory.
///
/// Order of precedence:
/// 1. `$XDG_DATA_HOME/syllabus` (if XDG_DATA_HOME is set)
/// 2. `~/.local/share/syllabus` (fallback)
///
/// `SYLLABUS_DATA_DIR` is honoured by the CLI flag, not here.
pub fn default_data_dir() -> PathBuf {
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
