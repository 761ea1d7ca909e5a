//! Audit event types
//!
//! The audit log doubles as the reconciliation trail: every case where bed
//! hardware and session rows may disagree is recorded here.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use toasty_util::{BedNum, CustomerId, FobNum, SessionId};

/// Which half of the two-phase sequence failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActuationPhase {
    Priming,
    Main,
}

/// Types of audit events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEventType {
    ServiceStarted,

    ServiceStopped,

    /// Admission rejected with a business-rule or lookup code
    AdmissionDenied { fob_num: FobNum, error_code: u8 },

    /// Bed confirmed running and the row written
    SessionRecorded {
        session_id: SessionId,
        customer_id: CustomerId,
        bed_num: BedNum,
        minutes: u32,
    },

    SessionCancelled {
        session_id: SessionId,
        customer_id: CustomerId,
        bed_num: BedNum,
    },

    /// A bed command failed; no row was written
    ActuationFailed {
        bed_num: BedNum,
        minutes: u32,
        phase: ActuationPhase,
        error: String,
    },

    /// The bed runs but the row could not be written
    SessionWriteFailed {
        customer_id: CustomerId,
        bed_num: BedNum,
        minutes: u32,
        error: String,
    },

    /// The row is cancelled but the bed may still be running
    StopFailed { bed_num: BedNum, error: String },

    ClientConnected { client_id: String, uid: Option<u32> },

    ClientDisconnected { client_id: String },
}

/// Full audit event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event ID
    pub id: i64,

    /// Event timestamp
    pub timestamp: DateTime<Local>,

    /// Event type and details
    pub event: AuditEventType,
}

impl AuditEvent {
    pub fn new(event: AuditEventType) -> Self {
        Self {
            id: 0, // Will be set by store
            timestamp: toasty_util::now(),
            event,
        }
    }
}
