//! Default paths for dwelld components
//!
//! Paths are user-writable by default (no root required):
//! - Config: `$XDG_CONFIG_HOME/dwelld/config.toml` or `~/.config/dwelld/config.toml`
//! - Data: `$XDG_DATA_HOME/dwelld` or `~/.local/share/dwelld`

use std::path::PathBuf;

/// Application subdirectory name
const APP_DIR: &str = "dwelld";

/// Config filename within the config directory
const CONFIG_FILENAME: &str = "config.toml";

/// Database filename within the data directory
pub const DATABASE_FILENAME: &str = "dwelld.db";

/// Get the default config file path.
///
/// Order of precedence:
/// 1. `$XDG_CONFIG_HOME/dwelld/config.toml` (if XDG_CONFIG_HOME is set)
/// 2. `~/.config/dwelld/config.toml` (fallback)
pub fn default_config_path() -> PathBuf {
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
/// 1. `$XDG_DATA_HOME/dwelld` (if XDG_DATA_HOME is set)
/// 2. `~/.local/share/dwelld` (fallback)
///
/// The `DWELL_DATA_DIR` override is applied by the service's CLI.
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
