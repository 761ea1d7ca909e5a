//! Configuration validation

use crate::policy::{
    BED_PLACEHOLDER, DEFAULT_GRACE_WINDOW_SECS, DEFAULT_ROLLING_WINDOW_SECS, MINUTES_PLACEHOLDER,
};
use crate::schema::{RawActuationConfig, RawAdmissionConfig, RawBed, RawConfig, RawDriver};
use std::collections::HashSet;
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Bed {bed_num}: {message}")]
    BedError { bed_num: u32, message: String },

    #[error("Duplicate bed number: {0}")]
    DuplicateBedNum(u32),

    #[error("[admission] {0}")]
    AdmissionError(String),

    #[error("[actuation] {0}")]
    ActuationError(String),
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    errors.extend(validate_admission(&config.admission));
    errors.extend(validate_actuation(&config.actuation));

    let mut seen = HashSet::new();
    for bed in &config.beds {
        if !seen.insert(bed.bed_num) {
            errors.push(ValidationError::DuplicateBedNum(bed.bed_num));
        }
    }

    for bed in &config.beds {
        errors.extend(validate_bed(bed));
    }

    errors
}

fn validate_admission(admission: &RawAdmissionConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let windows = [
        ("grace_window_seconds", admission.grace_window_seconds),
        ("rolling_window_seconds", admission.rolling_window_seconds),
        ("cancel_cooldown_seconds", admission.cancel_cooldown_seconds),
    ];
    for (name, value) in windows {
        if value == Some(0) {
            errors.push(ValidationError::AdmissionError(format!(
                "{} must be greater than zero",
                name
            )));
        }
    }

    let grace = admission
        .grace_window_seconds
        .unwrap_or(DEFAULT_GRACE_WINDOW_SECS);
    let rolling = admission
        .rolling_window_seconds
        .unwrap_or(DEFAULT_ROLLING_WINDOW_SECS);
    if grace >= rolling {
        errors.push(ValidationError::AdmissionError(format!(
            "grace window ({}s) must be shorter than the rolling window ({}s)",
            grace, rolling
        )));
    }

    errors
}

fn validate_actuation(actuation: &RawActuationConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if actuation.priming_minutes == Some(0) {
        errors.push(ValidationError::ActuationError(
            "priming_minutes must be at least 1".into(),
        ));
    }

    if let Some(RawDriver::Command {
        argv,
        timeout_seconds,
        status_argv,
    }) = &actuation.driver
    {
        if argv.is_empty() || argv[0].trim().is_empty() {
            errors.push(ValidationError::ActuationError(
                "command argv cannot be empty".into(),
            ));
        }

        for placeholder in [BED_PLACEHOLDER, MINUTES_PLACEHOLDER] {
            if !argv.iter().any(|arg| arg.contains(placeholder)) {
                errors.push(ValidationError::ActuationError(format!(
                    "command argv must contain a {} placeholder",
                    placeholder
                )));
            }
        }

        if let Some(status_argv) = status_argv {
            if status_argv.is_empty() || status_argv[0].trim().is_empty() {
                errors.push(ValidationError::ActuationError(
                    "status argv cannot be empty".into(),
                ));
            }
            if !status_argv.iter().any(|arg| arg.contains(BED_PLACEHOLDER)) {
                errors.push(ValidationError::ActuationError(format!(
                    "status argv must contain a {} placeholder",
                    BED_PLACEHOLDER
                )));
            }
        }

        if *timeout_seconds == Some(0) {
            errors.push(ValidationError::ActuationError(
                "timeout_seconds must be greater than zero".into(),
            ));
        }
    }

    errors
}

fn validate_bed(bed: &RawBed) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if bed.bed_num == 0 {
        errors.push(ValidationError::BedError {
            bed_num: bed.bed_num,
            message: "bed number 0 is reserved".into(),
        });
    }

    if bed.max_time == 0 {
        errors.push(ValidationError::BedError {
            bed_num: bed.bed_num,
            message: "max_time must be at least 1 minute".into(),
        });
    }

    if bed.level < 0 {
        errors.push(ValidationError::BedError {
            bed_num: bed.bed_num,
            message: "level cannot be negative".into(),
        });
    }

    if bed.name.trim().is_empty() {
        errors.push(ValidationError::BedError {
            bed_num: bed.bed_num,
            message: "name cannot be empty".into(),
        });
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RawServiceConfig;

    fn empty_config() -> RawConfig {
        RawConfig {
            config_version: 1,
            service: RawServiceConfig::default(),
            admission: RawAdmissionConfig::default(),
            actuation: RawActuationConfig::default(),
            beds: vec![],
        }
    }

    fn bed(bed_num: u32, max_time: u32) -> RawBed {
        RawBed {
            bed_num,
            level: 1,
            max_time,
            name: format!("Bed {}", bed_num),
        }
    }

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&empty_config()).is_empty());
    }

    #[test]
    fn detect_duplicate_beds() {
        let mut config = empty_config();
        config.beds = vec![bed(1, 10), bed(1, 12)];

        let errors = validate_config(&config);
        assert!(errors.contains(&ValidationError::DuplicateBedNum(1)));
    }

    #[test]
    fn reject_bed_zero_and_zero_max_time() {
        let mut config = empty_config();
        config.beds = vec![bed(0, 10), bed(3, 0)];

        let errors = validate_config(&config);
        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .all(|e| matches!(e, ValidationError::BedError { .. })));
    }

    #[test]
    fn reject_grace_not_shorter_than_rolling() {
        let mut config = empty_config();
        config.admission.grace_window_seconds = Some(600);
        config.admission.rolling_window_seconds = Some(600);

        let errors = validate_config(&config);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ValidationError::AdmissionError(_)));
    }

    #[test]
    fn reject_zero_windows() {
        let mut config = empty_config();
        config.admission.cancel_cooldown_seconds = Some(0);

        let errors = validate_config(&config);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn reject_zero_priming() {
        let mut config = empty_config();
        config.actuation.priming_minutes = Some(0);

        assert_eq!(validate_config(&config).len(), 1);
    }

    #[test]
    fn command_driver_needs_placeholders() {
        let mut config = empty_config();
        config.actuation.driver = Some(RawDriver::Command {
            argv: vec!["bedctl".into(), "{bed}".into()],
            timeout_seconds: None,
            status_argv: None,
        });

        let errors = validate_config(&config);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("{minutes}"));
    }

    #[test]
    fn command_driver_rejects_empty_argv() {
        let mut config = empty_config();
        config.actuation.driver = Some(RawDriver::Command {
            argv: vec![],
            timeout_seconds: Some(5),
            status_argv: None,
        });

        let errors = validate_config(&config);
        // empty argv, plus both placeholders missing
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn status_argv_needs_bed_placeholder() {
        let mut config = empty_config();
        config.actuation.driver = Some(RawDriver::Command {
            argv: vec!["bedctl".into(), "{bed}".into(), "{minutes}".into()],
            timeout_seconds: None,
            status_argv: Some(vec!["bedctl".into(), "status".into()]),
        });

        let errors = validate_config(&config);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("status argv"));

        config.actuation.driver = Some(RawDriver::Command {
            argv: vec!["bedctl".into(), "{bed}".into(), "{minutes}".into()],
            timeout_seconds: None,
            status_argv: Some(vec!["bedctl".into(), "status".into(), "{bed}".into()]),
        });
        assert!(validate_config(&config).is_empty());
    }
}
