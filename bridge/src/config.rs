//! Process-level configuration for the bridge.
//!
//! Every value has a compile-time default and can be overridden through a
//! dedicated environment variable. Command-line flags take precedence over
//! both; see `main.rs`.

use std::path::PathBuf;

/// Settings file location under `$HOME`.
const DEFAULT_SETTINGS_PATH: &str = ".config/uci-bridge/settings.json";

/// Settings file used when `HOME` is not set.
const DEV_SETTINGS_PATH: &str = "./settings.json";

/// Directory for the rolling log files.
const DEFAULT_LOG_DIR: &str = "logs";

/// Get the path of the settings file.
///
/// Priority:
/// 1. `UCI_BRIDGE_SETTINGS_PATH` env variable if set
/// 2. `$HOME/.config/uci-bridge/settings.json` if HOME is set
/// 3. `./settings.json` as fallback
pub fn get_settings_path() -> PathBuf {
    if let Ok(path) = std::env::var("UCI_BRIDGE_SETTINGS_PATH") {
        return PathBuf::from(path);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(DEFAULT_SETTINGS_PATH);
    }

    PathBuf::from(DEV_SETTINGS_PATH)
}

/// Get the log directory.
///
/// Priority:
/// 1. `UCI_BRIDGE_LOG_DIR` env variable if set
/// 2. `logs` as fallback
pub fn get_log_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("UCI_BRIDGE_LOG_DIR") {
        return PathBuf::from(dir);
    }

    PathBuf::from(DEFAULT_LOG_DIR)
}

/// Get the opening book path, if one is configured through
/// `UCI_BRIDGE_BOOK_PATH`.
pub fn get_book_path() -> Option<PathBuf> {
    std::env::var("UCI_BRIDGE_BOOK_PATH").ok().map(PathBuf::from)
}
