//! Error types for toastyd

use thiserror::Error;

use crate::{BedNum, CustomerId};

/// Core error type for toastyd request handling
#[derive(Debug, Error)]
pub enum ToastyError {
    #[error("Customer not found: {0}")]
    CustomerNotFound(CustomerId),

    #[error("Bed not found: {0}")]
    BedNotFound(BedNum),

    #[error("Bed {bed} requires level {required}, customer has level {level}")]
    LevelTooLow {
        bed: BedNum,
        required: i64,
        level: i64,
    },

    #[error("Requested {minutes} minutes exceeds bed {bed} maximum of {max_time}")]
    DurationExceedsMax {
        bed: BedNum,
        minutes: u32,
        max_time: u32,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Host error: {0}")]
    HostError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ToastyError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::StoreError(msg.into())
    }

    pub fn host(msg: impl Into<String>) -> Self {
        Self::HostError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether the failure came from reading records rather than from the request itself
    pub fn is_lookup_failure(&self) -> bool {
        matches!(self, Self::StoreError(_) | Self::Internal(_))
    }
}

pub type Result<T> = std::result::Result<T, ToastyError>;
