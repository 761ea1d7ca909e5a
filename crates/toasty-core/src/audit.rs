//! Audit appends that never fail the caller

use toasty_store::{AuditEvent, AuditEventType, Store};
use tracing::warn;

/// Append `event`, logging instead of failing when the store refuses it.
///
/// Returns whether the row was written.
pub(crate) fn append_audit(store: &dyn Store, event: AuditEventType) -> bool {
    match store.append_audit(AuditEvent::new(event)) {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Failed to append audit event");
            false
        }
    }
}

/// Store wrapper whose audit log always refuses writes
#[cfg(test)]
pub(crate) mod failing {
    use std::sync::Arc;
    use toasty_store::{
        AuditEvent, AuditStore, Bed, BedStore, Customer, CustomerStore, Keyfob, KeyfobStore,
        NewCustomer, NewSession, Session, SessionReportRow, SessionStore, SqliteStore, Store,
        StoreError, StoreResult,
    };
    use toasty_util::{BedNum, CustomerId, FobNum, SessionId};

    pub struct AuditRefusingStore {
        inner: Arc<SqliteStore>,
    }

    impl AuditRefusingStore {
        pub fn new() -> Self {
            Self {
                inner: Arc::new(SqliteStore::in_memory().unwrap()),
            }
        }
    }

    impl CustomerStore for AuditRefusingStore {
        fn create_customer(&self, customer: &NewCustomer) -> StoreResult<CustomerId> {
            self.inner.create_customer(customer)
        }
        fn get_customer(&self, id: CustomerId) -> StoreResult<Option<Customer>> {
            self.inner.get_customer(id)
        }
        fn find_customer_by_fob(&self, fob_num: FobNum) -> StoreResult<Option<Customer>> {
            self.inner.find_customer_by_fob(fob_num)
        }
        fn set_customer_status(&self, id: CustomerId, status: bool) -> StoreResult<()> {
            self.inner.set_customer_status(id, status)
        }
    }

    impl KeyfobStore for AuditRefusingStore {
        fn register_keyfob(&self, keyfob: Keyfob) -> StoreResult<()> {
            self.inner.register_keyfob(keyfob)
        }
        fn available_customer_keyfobs(&self) -> StoreResult<Vec<FobNum>> {
            self.inner.available_customer_keyfobs()
        }
    }

    impl SessionStore for AuditRefusingStore {
        fn create_session(&self, session: &NewSession) -> StoreResult<SessionId> {
            self.inner.create_session(session)
        }
        fn find_most_recent_session(&self, customer_id: CustomerId) -> StoreResult<Option<Session>> {
            self.inner.find_most_recent_session(customer_id)
        }
        fn last_cancelled_session_time(&self, customer_id: CustomerId) -> StoreResult<Option<i64>> {
            self.inner.last_cancelled_session_time(customer_id)
        }
        fn mark_session_cancelled(&self, id: SessionId) -> StoreResult<()> {
            self.inner.mark_session_cancelled(id)
        }
        fn recent_sessions(&self, limit: usize) -> StoreResult<Vec<SessionReportRow>> {
            self.inner.recent_sessions(limit)
        }
    }

    impl BedStore for AuditRefusingStore {
        fn create_bed(&self, bed: &Bed) -> StoreResult<()> {
            self.inner.create_bed(bed)
        }
        fn upsert_bed(&self, bed: &Bed) -> StoreResult<()> {
            self.inner.upsert_bed(bed)
        }
        fn get_bed(&self, bed_num: BedNum) -> StoreResult<Option<Bed>> {
            self.inner.get_bed(bed_num)
        }
        fn list_beds(&self) -> StoreResult<Vec<Bed>> {
            self.inner.list_beds()
        }
        fn beds_accessible_at_level(&self, level: i64) -> StoreResult<Vec<Bed>> {
            self.inner.beds_accessible_at_level(level)
        }
        fn swap_bed_nums(&self, a: BedNum, b: BedNum) -> StoreResult<()> {
            self.inner.swap_bed_nums(a, b)
        }
    }

    impl AuditStore for AuditRefusingStore {
        fn append_audit(&self, _event: AuditEvent) -> StoreResult<()> {
            Err(StoreError::Database("audit table is read-only".into()))
        }
        fn get_recent_audits(&self, limit: usize) -> StoreResult<Vec<AuditEvent>> {
            self.inner.get_recent_audits(limit)
        }
    }

    impl Store for AuditRefusingStore {
        fn is_healthy(&self) -> bool {
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::failing::AuditRefusingStore;
    use super::*;
    use toasty_store::{AuditStore, SqliteStore};

    #[test]
    fn written_event_is_reported() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(append_audit(&store, AuditEventType::ServiceStarted));
        assert_eq!(store.get_recent_audits(5).unwrap().len(), 1);
    }

    #[test]
    fn refused_event_does_not_panic() {
        let store = AuditRefusingStore::new();
        assert!(!append_audit(&store, AuditEventType::ServiceStarted));
    }
}
