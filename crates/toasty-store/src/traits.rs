//! Store trait definitions
//!
//! One repository trait per entity. Engine components take the narrowest
//! trait they need; the service wires a single [`Store`] implementation
//! into all of them.

use toasty_util::{BedNum, CustomerId, FobNum, SessionId};

use crate::{
    AuditEvent, Bed, Customer, Keyfob, NewCustomer, NewSession, Session, SessionReportRow,
    StoreResult,
};

pub trait CustomerStore: Send + Sync {
    /// Insert a customer. A fob already held by another customer is a conflict.
    fn create_customer(&self, customer: &NewCustomer) -> StoreResult<CustomerId>;

    fn get_customer(&self, id: CustomerId) -> StoreResult<Option<Customer>>;

    /// Resolve a presented fob to its customer
    fn find_customer_by_fob(&self, fob_num: FobNum) -> StoreResult<Option<Customer>>;

    fn set_customer_status(&self, id: CustomerId, status: bool) -> StoreResult<()>;
}

pub trait KeyfobStore: Send + Sync {
    fn register_keyfob(&self, keyfob: Keyfob) -> StoreResult<()>;

    /// Non-admin fobs not yet assigned to any customer
    fn available_customer_keyfobs(&self) -> StoreResult<Vec<FobNum>>;
}

pub trait SessionStore: Send + Sync {
    fn create_session(&self, session: &NewSession) -> StoreResult<SessionId>;

    /// The customer's newest session that is not cancelled
    fn find_most_recent_session(&self, customer_id: CustomerId) -> StoreResult<Option<Session>>;

    /// Start time of the customer's newest cancelled session
    fn last_cancelled_session_time(&self, customer_id: CustomerId) -> StoreResult<Option<i64>>;

    fn mark_session_cancelled(&self, id: SessionId) -> StoreResult<()>;

    /// Newest-first rows for reconciliation reports
    fn recent_sessions(&self, limit: usize) -> StoreResult<Vec<SessionReportRow>>;
}

pub trait BedStore: Send + Sync {
    fn create_bed(&self, bed: &Bed) -> StoreResult<()>;

    /// Insert or overwrite by bed number
    fn upsert_bed(&self, bed: &Bed) -> StoreResult<()>;

    fn get_bed(&self, bed_num: BedNum) -> StoreResult<Option<Bed>>;

    fn list_beds(&self) -> StoreResult<Vec<Bed>>;

    /// Beds whose required level does not exceed `level`
    fn beds_accessible_at_level(&self, level: i64) -> StoreResult<Vec<Bed>>;

    /// Exchange the slot numbers of two beds
    fn swap_bed_nums(&self, a: BedNum, b: BedNum) -> StoreResult<()>;
}

pub trait AuditStore: Send + Sync {
    /// Append an audit event
    fn append_audit(&self, event: AuditEvent) -> StoreResult<()>;

    /// Get recent audit events, newest first
    fn get_recent_audits(&self, limit: usize) -> StoreResult<Vec<AuditEvent>>;
}

/// Everything the service needs from persistence
pub trait Store: CustomerStore + KeyfobStore + SessionStore + BedStore + AuditStore {
    /// Check if store is healthy
    fn is_healthy(&self) -> bool;
}
