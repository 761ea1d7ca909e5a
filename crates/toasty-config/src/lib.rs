//! Configuration parsing and validation for toastyd
//!
//! Supports TOML configuration with:
//! - Versioned schema
//! - Admission window lengths
//! - Two-phase actuation settings and the bed driver
//! - Bed definitions registered at startup
//! - Validation with clear error messages

mod policy;
mod schema;
mod validation;

pub use policy::*;
pub use schema::*;
pub use validation::*;

use std::path::Path;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation failed: {errors:?}")]
    ValidationFailed { errors: Vec<ValidationError> },

    #[error("Unsupported config version: {0}")]
    UnsupportedVersion(u32),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Load and validate configuration from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<Policy> {
    let path = path.as_ref();
    tracing::debug!(path = %path.display(), "Loading configuration");
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from a TOML string
pub fn parse_config(content: &str) -> ConfigResult<Policy> {
    let raw: RawConfig = toml::from_str(content)?;

    if raw.config_version != CURRENT_CONFIG_VERSION {
        return Err(ConfigError::UnsupportedVersion(raw.config_version));
    }

    let errors = validate_config(&raw);
    if !errors.is_empty() {
        return Err(ConfigError::ValidationFailed { errors });
    }

    Ok(Policy::from_raw(raw))
}

/// Current supported config version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;
    use toasty_util::BedNum;

    #[test]
    fn parse_minimal_config() {
        let policy = parse_config("config_version = 1").unwrap();
        assert!(policy.beds.is_empty());
        assert_eq!(policy.admission.grace_window, Duration::from_secs(300));
    }

    #[test]
    fn parse_full_config() {
        let config = r#"
            config_version = 1

            [service]
            socket_path = "/tmp/toasty-test.sock"

            [admission]
            grace_window_seconds = 120

            [actuation]
            priming_minutes = 2
            priming_delay_ms = 250
            driver = { type = "command", argv = ["bedctl", "{bed}", "{minutes}"] }

            [[beds]]
            bed_num = 4
            level = 3
            max_time = 15
            name = "Turbo"
        "#;

        let policy = parse_config(config).unwrap();
        assert_eq!(
            policy.service.socket_path,
            std::path::PathBuf::from("/tmp/toasty-test.sock")
        );
        assert_eq!(policy.admission.grace_window, Duration::from_secs(120));
        assert_eq!(policy.admission.rolling_window, Duration::from_secs(43_200));
        assert_eq!(policy.actuation.priming_minutes, 2);
        assert_eq!(policy.actuation.priming_delay, Duration::from_millis(250));
        match &policy.actuation.driver {
            DriverConfig::Command(cmd) => {
                assert_eq!(cmd.timeout, Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SECS));
            }
            other => panic!("unexpected driver: {:?}", other),
        }

        let bed = policy.get_bed(BedNum::new(4)).unwrap();
        assert_eq!(bed.level, 3);
        assert_eq!(bed.max_time, 15);
    }

    #[test]
    fn reject_wrong_version() {
        let result = parse_config("config_version = 99");
        assert!(matches!(result, Err(ConfigError::UnsupportedVersion(99))));
    }

    #[test]
    fn reject_invalid_beds() {
        let config = r#"
            config_version = 1

            [[beds]]
            bed_num = 0
            max_time = 10
            name = "Ghost"
        "#;

        assert!(matches!(
            parse_config(config),
            Err(ConfigError::ValidationFailed { .. })
        ));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "config_version = 1").unwrap();
        writeln!(file, "[actuation]").unwrap();
        writeln!(file, "driver = {{ type = \"mock\" }}").unwrap();

        let policy = load_config(&path).unwrap();
        assert_eq!(policy.actuation.driver, DriverConfig::Mock);

        assert!(matches!(
            load_config(dir.path().join("missing.toml")),
            Err(ConfigError::ReadError(_))
        ));
    }
}
