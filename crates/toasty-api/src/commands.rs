//! Command types for the toastyd protocol

use serde::{Deserialize, Serialize};
use thiserror::Error;
use toasty_util::{BedNum, CustomerId, FobNum};

use crate::{BedView, HealthStatus, SessionView, API_VERSION};

/// Default row count for [`Command::RecentSessions`]
pub const DEFAULT_RECENT_SESSIONS_LIMIT: usize = 500;

/// Request wrapper with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Request ID for correlation
    pub request_id: u64,
    /// API version
    pub api_version: u32,
    /// The command
    pub command: Command,
}

impl Request {
    pub fn new(request_id: u64, command: Command) -> Self {
        Self {
            request_id,
            api_version: API_VERSION,
            command,
        }
    }

    /// Decode one NDJSON line into a validated request.
    ///
    /// Malformed JSON, an unknown command, a missing field, a wrong API
    /// version and out-of-range values are all rejected here, before any
    /// store access happens.
    pub fn parse(line: &str) -> Result<Self, RequestError> {
        let request: Request =
            serde_json::from_str(line).map_err(|e| RequestError::Malformed(e.to_string()))?;

        if request.api_version != API_VERSION {
            return Err(RequestError::UnsupportedVersion {
                got: request.api_version,
                expected: API_VERSION,
            });
        }

        request.command.validate()?;
        Ok(request)
    }
}

/// Reasons a request never reaches the engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("malformed request: {0}")]
    Malformed(String),

    #[error("unsupported api version {got} (expected {expected})")]
    UnsupportedVersion { got: u32, expected: u32 },

    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl RequestError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

/// Response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Corresponding request ID
    pub request_id: u64,
    /// API version
    pub api_version: u32,
    pub error_code: ErrorCode,
    /// Human-readable reason; empty on success
    #[serde(default)]
    pub error_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<ResponsePayload>,
}

impl Response {
    pub fn success(request_id: u64, payload: ResponsePayload) -> Self {
        Self {
            request_id,
            api_version: API_VERSION,
            error_code: ErrorCode::Success,
            error_message: String::new(),
            payload: Some(payload),
        }
    }

    /// Error-free result with nothing to report
    pub fn empty(request_id: u64) -> Self {
        Self {
            request_id,
            api_version: API_VERSION,
            error_code: ErrorCode::Success,
            error_message: String::new(),
            payload: None,
        }
    }

    pub fn error(request_id: u64, error: ErrorInfo) -> Self {
        Self {
            request_id,
            api_version: API_VERSION,
            error_code: error.code,
            error_message: error.message,
            payload: None,
        }
    }

    /// Attach partial data to a rejection (used by session-in-progress)
    pub fn with_payload(mut self, payload: ResponsePayload) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn is_success(&self) -> bool {
        self.error_code == ErrorCode::Success
    }
}

/// Error information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<RequestError> for ErrorInfo {
    fn from(err: RequestError) -> Self {
        ErrorInfo::new(ErrorCode::Indeterminate, err.to_string())
    }
}

/// Numeric result classification; serialized as its number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum ErrorCode {
    Success = 0,
    /// Lookup failure or rejected input; nothing more to tell the caller
    Indeterminate = 1,
    /// Unknown key, or not permitted by timing
    NotFound = 2,
    NotAuthorized = 3,
    AlreadyUsedToday = 4,
    /// Rejected, but the caller may request cancellation
    SessionInProgress = 5,
}

impl From<ErrorCode> for u8 {
    fn from(code: ErrorCode) -> u8 {
        code as u8
    }
}

impl TryFrom<u8> for ErrorCode {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Indeterminate),
            2 => Ok(ErrorCode::NotFound),
            3 => Ok(ErrorCode::NotAuthorized),
            4 => Ok(ErrorCode::AlreadyUsedToday),
            5 => Ok(ErrorCode::SessionInProgress),
            other => Err(format!("unknown error code {}", other)),
        }
    }
}

/// All possible commands from clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Present a fob and ask for admission
    CustomerLogin { fob_num: FobNum },

    /// Cancel the customer's most recent session
    CancelSession { customer_id: CustomerId },

    /// Run a bed for an admitted customer
    StartBed {
        bed_num: BedNum,
        minutes: u32,
        customer_id: CustomerId,
    },

    /// Beds the customer may use, with readiness
    BedStatus { customer_id: CustomerId },

    /// Newest-first session rows for reconciliation
    RecentSessions {
        #[serde(default)]
        limit: Option<usize>,
    },

    /// Get health status
    GetHealth,

    /// Ping for keepalive
    Ping,
}

impl Command {
    /// Short name for logs and the audit trail
    pub fn name(&self) -> &'static str {
        match self {
            Command::CustomerLogin { .. } => "customer_login",
            Command::CancelSession { .. } => "cancel_session",
            Command::StartBed { .. } => "start_bed",
            Command::BedStatus { .. } => "bed_status",
            Command::RecentSessions { .. } => "recent_sessions",
            Command::GetHealth => "get_health",
            Command::Ping => "ping",
        }
    }

    /// Range checks that serde's typing cannot express
    pub fn validate(&self) -> Result<(), RequestError> {
        match self {
            Command::CustomerLogin { fob_num } => {
                if fob_num.get() == 0 {
                    return Err(RequestError::invalid("fob_num", "must be non-zero"));
                }
            }
            Command::CancelSession { customer_id } | Command::BedStatus { customer_id } => {
                check_customer_id(*customer_id)?;
            }
            Command::StartBed {
                bed_num,
                minutes,
                customer_id,
            } => {
                if bed_num.is_none() {
                    return Err(RequestError::invalid("bed_num", "must be non-zero"));
                }
                if *minutes == 0 {
                    return Err(RequestError::invalid("minutes", "must be at least 1"));
                }
                check_customer_id(*customer_id)?;
            }
            Command::RecentSessions { limit: Some(0) } => {
                return Err(RequestError::invalid("limit", "must be at least 1"));
            }
            Command::RecentSessions { .. } | Command::GetHealth | Command::Ping => {}
        }
        Ok(())
    }
}

fn check_customer_id(id: CustomerId) -> Result<(), RequestError> {
    if id.get() <= 0 {
        return Err(RequestError::invalid("customer_id", "must be positive"));
    }
    Ok(())
}

/// Response payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponsePayload {
    /// Admission granted
    Admitted {
        id: CustomerId,
        name: String,
        level: i64,
    },
    /// Partial data returned with error code 5
    SessionInProgress { customer_id: CustomerId },
    Beds { beds: Vec<BedView> },
    Sessions { sessions: Vec<SessionView> },
    Health(HealthStatus),
    Pong,
}
