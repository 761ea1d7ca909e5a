//! Row types for the record store

use serde::{Deserialize, Serialize};
use toasty_util::{BedNum, CustomerId, FobNum, SessionId};

/// A customer as stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub phone: String,
    /// Authorized to tan
    pub status: bool,
    /// Access tier compared against `Bed::level`
    pub level: i64,
    pub fob_num: FobNum,
}

/// Customer fields supplied at creation; the id is store-assigned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomer {
    pub name: String,
    pub phone: String,
    pub status: bool,
    pub level: i64,
    pub fob_num: FobNum,
}

/// One tanning attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub customer_id: CustomerId,
    pub bed_num: BedNum,
    /// Start instant, epoch seconds. Never rewritten.
    pub time_stamp: i64,
    /// Requested duration in minutes
    pub session_time: u32,
    /// One-way flag
    pub cancelled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSession {
    pub customer_id: CustomerId,
    pub bed_num: BedNum,
    pub time_stamp: i64,
    pub session_time: u32,
}

/// Session row joined with its customer's name, for reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReportRow {
    pub session: Session,
    pub customer_name: String,
}

/// A physical bed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bed {
    pub bed_num: BedNum,
    /// Minimum customer level required
    pub level: i64,
    /// Minutes
    pub max_time: u32,
    pub name: String,
}

/// Registered fob; admin fobs are never handed to customers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyfob {
    pub fob_num: FobNum,
    pub admin: bool,
}
