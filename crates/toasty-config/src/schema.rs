//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Service-level settings
    #[serde(default)]
    pub service: RawServiceConfig,

    /// Admission window lengths
    #[serde(default)]
    pub admission: RawAdmissionConfig,

    /// Bed actuation settings
    #[serde(default)]
    pub actuation: RawActuationConfig,

    /// Beds to register at startup
    #[serde(default)]
    pub beds: Vec<RawBed>,
}

/// Service-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawServiceConfig {
    /// IPC socket path
    pub socket_path: Option<PathBuf>,

    /// Data directory for the store
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawAdmissionConfig {
    /// Seconds after a start during which the customer may cancel
    pub grace_window_seconds: Option<u64>,

    /// Minimum seconds between two admitted starts
    pub rolling_window_seconds: Option<u64>,

    /// Minimum seconds between two cancellations
    pub cancel_cooldown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawActuationConfig {
    /// Duration of the priming pulse (and of the stop command)
    pub priming_minutes: Option<u32>,

    /// Pause between priming and the real command
    pub priming_delay_ms: Option<u64>,

    /// How beds are driven
    pub driver: Option<RawDriver>,
}

/// Raw driver definition
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RawDriver {
    /// Run an external device-control command per actuation
    Command {
        argv: Vec<String>,
        timeout_seconds: Option<u64>,
        /// Readiness query; exit 0 means the bed is idle
        #[serde(default)]
        status_argv: Option<Vec<String>>,
    },
    /// In-memory driver for development
    Mock,
}

/// Raw bed definition
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawBed {
    pub bed_num: u32,

    /// Minimum customer level
    #[serde(default)]
    pub level: i64,

    /// Maximum session length in minutes
    pub max_time: u32,

    pub name: String,
}
