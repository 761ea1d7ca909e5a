//! Shared types for the toastyd API

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use toasty_util::{BedNum, ClientId, CustomerId, SessionId};

/// View of a bed for kiosk display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BedView {
    pub bed_num: BedNum,
    pub name: String,
    /// Minimum customer level required
    pub level: i64,
    /// Longest session the bed accepts, in minutes
    pub max_time: u32,
    /// Whether the controller reports the bed idle
    pub ready: bool,
}

/// View of one session row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
    pub session_id: SessionId,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub bed_num: BedNum,
    /// Start instant, epoch seconds
    pub time_stamp: i64,
    pub started_at: DateTime<Local>,
    /// Short clock time for reports, e.g. `3:04pm`
    pub local_time: String,
    /// Requested duration in minutes
    pub session_time: u32,
    pub cancelled: bool,
}

/// Health status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub live: bool,
    pub store_ok: bool,
    pub actuator_ok: bool,
}

/// Client connection info (set by IPC layer)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub client_id: ClientId,
    /// Unix UID if available
    pub uid: Option<u32>,
    /// Unix PID if available
    pub pid: Option<i32>,
}

impl ClientInfo {
    pub fn new() -> Self {
        Self {
            client_id: ClientId::new(),
            uid: None,
            pid: None,
        }
    }

    pub fn with_uid(mut self, uid: u32) -> Self {
        self.uid = Some(uid);
        self
    }

    pub fn with_pid(mut self, pid: i32) -> Self {
        self.pid = Some(pid);
        self
    }
}

impl Default for ClientInfo {
    fn default() -> Self {
        Self::new()
    }
}
