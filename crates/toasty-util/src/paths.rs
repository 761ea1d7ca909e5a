//! Default paths for toastyd components
//!
//! Paths are user-writable by default (no root required):
//! - Socket: `$XDG_RUNTIME_DIR/toastyd/toastyd.sock` or `/tmp/toastyd-$USER/toastyd.sock`
//! - Data: `$XDG_DATA_HOME/toastyd` or `~/.local/share/toastyd`
//! - Config: `$XDG_CONFIG_HOME/toasty/config.toml` or `~/.config/toasty/config.toml`

use std::path::PathBuf;

/// Environment variable for overriding the socket path
pub const TOASTY_SOCKET_ENV: &str = "TOASTY_SOCKET";

/// Environment variable for overriding the data directory
pub const TOASTY_DATA_DIR_ENV: &str = "TOASTY_DATA_DIR";

const SOCKET_FILENAME: &str = "toastyd.sock";

const APP_DIR: &str = "toastyd";

const CONFIG_DIR: &str = "toasty";

const CONFIG_FILENAME: &str = "config.toml";

/// Get the default socket path.
///
/// Order of precedence:
/// 1. `$TOASTY_SOCKET` environment variable (if set)
/// 2. `$XDG_RUNTIME_DIR/toastyd/toastyd.sock` (if XDG_RUNTIME_DIR is set)
/// 3. `/tmp/toastyd-$USER/toastyd.sock` (fallback)
pub fn default_socket_path() -> PathBuf {
    if let Ok(path) = std::env::var(TOASTY_SOCKET_ENV) {
        return PathBuf::from(path);
    }

    socket_path_without_env()
}

/// Get the socket path without checking TOASTY_SOCKET.
pub fn socket_path_without_env() -> PathBuf {
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        return PathBuf::from(runtime_dir).join(APP_DIR).join(SOCKET_FILENAME);
    }

    let username = std::env::var("USER").unwrap_or_else(|_| "unknown".to_string());
    PathBuf::from(format!("/tmp/{}-{}", APP_DIR, username)).join(SOCKET_FILENAME)
}

/// Get the default data directory (holds `toastyd.db`).
///
/// Order of precedence:
/// 1. `$TOASTY_DATA_DIR` environment variable (if set)
/// 2. platform data dir (`$XDG_DATA_HOME` or `~/.local/share`) + `toastyd`
/// 3. `/tmp/toastyd/data`
pub fn default_data_dir() -> PathBuf {
    if let Ok(path) = std::env::var(TOASTY_DATA_DIR_ENV) {
        return PathBuf::from(path);
    }

    data_dir_without_env()
}

/// Get the data directory without checking TOASTY_DATA_DIR.
pub fn data_dir_without_env() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("/tmp").join(APP_DIR).join("data"))
}

/// Get the default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("/etc"))
        .join(CONFIG_DIR)
        .join(CONFIG_FILENAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn socket_path_contains_toastyd() {
        let path = socket_path_without_env();
        assert!(path.to_string_lossy().contains("toastyd"));
        assert!(path.to_string_lossy().ends_with(".sock"));
    }

    #[test]
    fn data_dir_contains_toastyd() {
        let path = data_dir_without_env();
        assert!(path.to_string_lossy().contains("toastyd"));
    }

    #[test]
    fn config_path_is_toml() {
        let path = default_config_path();
        assert!(path.ends_with("toasty/config.toml"));
    }
}
