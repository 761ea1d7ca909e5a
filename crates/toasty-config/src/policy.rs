//! Validated policy structures

use crate::schema::{
    RawActuationConfig, RawAdmissionConfig, RawBed, RawConfig, RawDriver, RawServiceConfig,
};
use std::path::PathBuf;
use std::time::Duration;
use toasty_util::{default_data_dir, default_socket_path, BedNum};

/// Cancellation window after a session start
pub const DEFAULT_GRACE_WINDOW_SECS: u64 = 300;

/// Minimum spacing between two admitted starts
pub const DEFAULT_ROLLING_WINDOW_SECS: u64 = 43_200;

/// Minimum spacing between two cancellations
pub const DEFAULT_CANCEL_COOLDOWN_SECS: u64 = 43_200;

/// Shortest duration the bed controller accepts
pub const DEFAULT_PRIMING_MINUTES: u32 = 1;

pub const DEFAULT_PRIMING_DELAY_MS: u64 = 100;

pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 10;

/// Replaced by the bed number in a command driver's argv
pub const BED_PLACEHOLDER: &str = "{bed}";

/// Replaced by the minute count in a command driver's argv
pub const MINUTES_PLACEHOLDER: &str = "{minutes}";

/// Validated policy ready for use by the service
#[derive(Debug, Clone, Default)]
pub struct Policy {
    pub service: ServiceConfig,
    pub admission: AdmissionPolicy,
    pub actuation: ActuationPolicy,
    /// Beds registered at startup
    pub beds: Vec<BedConfig>,
}

impl Policy {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            service: ServiceConfig::from_raw(raw.service),
            admission: AdmissionPolicy::from_raw(raw.admission),
            actuation: ActuationPolicy::from_raw(raw.actuation),
            beds: raw.beds.into_iter().map(BedConfig::from_raw).collect(),
        }
    }

    pub fn get_bed(&self, bed_num: BedNum) -> Option<&BedConfig> {
        self.beds.iter().find(|b| b.bed_num == bed_num)
    }
}

/// Service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub socket_path: PathBuf,
    pub data_dir: PathBuf,
}

impl ServiceConfig {
    fn from_raw(raw: RawServiceConfig) -> Self {
        Self {
            socket_path: raw.socket_path.unwrap_or_else(default_socket_path),
            data_dir: raw.data_dir.unwrap_or_else(default_data_dir),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
            data_dir: default_data_dir(),
        }
    }
}

/// Time windows used by admission and cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionPolicy {
    pub grace_window: Duration,
    pub rolling_window: Duration,
    pub cancel_cooldown: Duration,
}

impl AdmissionPolicy {
    fn from_raw(raw: RawAdmissionConfig) -> Self {
        Self {
            grace_window: Duration::from_secs(
                raw.grace_window_seconds.unwrap_or(DEFAULT_GRACE_WINDOW_SECS),
            ),
            rolling_window: Duration::from_secs(
                raw.rolling_window_seconds
                    .unwrap_or(DEFAULT_ROLLING_WINDOW_SECS),
            ),
            cancel_cooldown: Duration::from_secs(
                raw.cancel_cooldown_seconds
                    .unwrap_or(DEFAULT_CANCEL_COOLDOWN_SECS),
            ),
        }
    }
}

impl Default for AdmissionPolicy {
    fn default() -> Self {
        Self::from_raw(RawAdmissionConfig::default())
    }
}

/// Two-phase actuation settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActuationPolicy {
    pub priming_minutes: u32,
    pub priming_delay: Duration,
    pub driver: DriverConfig,
}

impl ActuationPolicy {
    fn from_raw(raw: RawActuationConfig) -> Self {
        Self {
            priming_minutes: raw.priming_minutes.unwrap_or(DEFAULT_PRIMING_MINUTES),
            priming_delay: Duration::from_millis(
                raw.priming_delay_ms.unwrap_or(DEFAULT_PRIMING_DELAY_MS),
            ),
            driver: raw.driver.map(DriverConfig::from_raw).unwrap_or_default(),
        }
    }
}

impl Default for ActuationPolicy {
    fn default() -> Self {
        Self::from_raw(RawActuationConfig::default())
    }
}

/// How bed commands reach the hardware
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DriverConfig {
    Command(CommandDriver),
    #[default]
    Mock,
}

impl DriverConfig {
    fn from_raw(raw: RawDriver) -> Self {
        match raw {
            RawDriver::Command {
                argv,
                timeout_seconds,
                status_argv,
            } => DriverConfig::Command(CommandDriver {
                argv,
                timeout: Duration::from_secs(
                    timeout_seconds.unwrap_or(DEFAULT_COMMAND_TIMEOUT_SECS),
                ),
                status_argv,
            }),
            RawDriver::Mock => DriverConfig::Mock,
        }
    }
}

/// External device-control command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDriver {
    /// Template argv containing [`BED_PLACEHOLDER`] and [`MINUTES_PLACEHOLDER`]
    pub argv: Vec<String>,
    pub timeout: Duration,
    /// Optional readiness query containing [`BED_PLACEHOLDER`]
    pub status_argv: Option<Vec<String>>,
}

impl CommandDriver {
    /// Expand the readiness query for one bed, if one is configured
    pub fn render_status(&self, bed: BedNum) -> Option<Vec<String>> {
        let bed = bed.to_string();
        self.status_argv.as_ref().map(|argv| {
            argv.iter()
                .map(|arg| arg.replace(BED_PLACEHOLDER, &bed))
                .collect()
        })
    }

    /// Expand the argv template for one actuation
    pub fn render(&self, bed: BedNum, minutes: u32) -> Vec<String> {
        let bed = bed.to_string();
        let minutes = minutes.to_string();
        self.argv
            .iter()
            .map(|arg| {
                arg.replace(BED_PLACEHOLDER, &bed)
                    .replace(MINUTES_PLACEHOLDER, &minutes)
            })
            .collect()
    }
}

/// Validated bed definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BedConfig {
    pub bed_num: BedNum,
    pub level: i64,
    pub max_time: u32,
    pub name: String,
}

impl BedConfig {
    fn from_raw(raw: RawBed) -> Self {
        Self {
            bed_num: BedNum::new(raw.bed_num),
            level: raw.level,
            max_time: raw.max_time,
            name: raw.name,
        }
    }
}
