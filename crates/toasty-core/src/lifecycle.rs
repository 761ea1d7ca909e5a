//! Session records: creation on a confirmed start, cancellation inside the
//! grace window.

use chrono::{DateTime, Local};
use std::sync::Arc;
use toasty_api::ErrorCode;
use toasty_store::{AuditEventType, NewSession, Session, Store, StoreResult};
use toasty_util::{seconds_since, BedNum, CustomerId, SessionId};
use tracing::{info, warn};

use crate::audit::append_audit;
use crate::AdmissionRules;

/// Why a cancellation was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelDenial {
    /// A record lookup failed
    StoreFailed,
    /// The newest session started more than the grace window ago
    GraceWindowElapsed,
    /// Another session was cancelled within the cooldown
    CancelledRecently,
}

impl CancelDenial {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            CancelDenial::StoreFailed => ErrorCode::Indeterminate,
            CancelDenial::GraceWindowElapsed | CancelDenial::CancelledRecently => {
                ErrorCode::NotFound
            }
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            CancelDenial::StoreFailed => "Error looking up session",
            CancelDenial::GraceWindowElapsed => "Session can no longer be cancelled",
            CancelDenial::CancelledRecently => "A session was already cancelled recently",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelDecision {
    /// The row is now cancelled; the returned copy reflects that
    Cancelled(Session),
    /// The customer has no session to cancel
    NothingToCancel,
    Denied(CancelDenial),
}

/// Owns every write to session rows
pub struct SessionLifecycle {
    store: Arc<dyn Store>,
    rules: AdmissionRules,
}

impl SessionLifecycle {
    pub fn new(store: Arc<dyn Store>, rules: AdmissionRules) -> Self {
        Self { store, rules }
    }

    /// Record a start the bed has already accepted.
    ///
    /// `now` becomes the row's permanent `time_stamp`.
    pub fn record_start(
        &self,
        customer_id: CustomerId,
        bed_num: BedNum,
        minutes: u32,
        now: &DateTime<Local>,
    ) -> StoreResult<SessionId> {
        let session_id = self.store.create_session(&NewSession {
            customer_id,
            bed_num,
            time_stamp: now.timestamp(),
            session_time: minutes,
        })?;

        append_audit(
            self.store.as_ref(),
            AuditEventType::SessionRecorded {
                session_id,
                customer_id,
                bed_num,
                minutes,
            },
        );

        info!(
            session_id = %session_id,
            customer_id = %customer_id,
            bed = %bed_num,
            minutes = minutes,
            "Session recorded"
        );

        Ok(session_id)
    }

    /// Cancel the customer's newest session if it is still in its grace window
    pub fn cancel(&self, customer_id: CustomerId, now: &DateTime<Local>) -> CancelDecision {
        let session = match self.store.find_most_recent_session(customer_id) {
            Ok(Some(session)) => session,
            Ok(None) => return CancelDecision::NothingToCancel,
            Err(e) => {
                warn!(customer_id = %customer_id, error = %e, "Session lookup failed");
                return CancelDecision::Denied(CancelDenial::StoreFailed);
            }
        };

        if seconds_since(session.time_stamp, now) > self.rules.grace_window_secs {
            return CancelDecision::Denied(CancelDenial::GraceWindowElapsed);
        }

        match self.store.last_cancelled_session_time(customer_id) {
            Ok(Some(t)) if seconds_since(t, now) < self.rules.cancel_cooldown_secs => {
                return CancelDecision::Denied(CancelDenial::CancelledRecently);
            }
            Ok(_) => {}
            Err(e) => {
                warn!(customer_id = %customer_id, error = %e, "Cancelled-session lookup failed");
                return CancelDecision::Denied(CancelDenial::StoreFailed);
            }
        }

        if let Err(e) = self.store.mark_session_cancelled(session.id) {
            warn!(session_id = %session.id, error = %e, "Failed to mark session cancelled");
            return CancelDecision::Denied(CancelDenial::StoreFailed);
        }

        append_audit(
            self.store.as_ref(),
            AuditEventType::SessionCancelled {
                session_id: session.id,
                customer_id,
                bed_num: session.bed_num,
            },
        );

        info!(
            session_id = %session.id,
            customer_id = %customer_id,
            bed = %session.bed_num,
            "Session cancelled"
        );

        CancelDecision::Cancelled(Session {
            cancelled: true,
            ..session
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::failing::AuditRefusingStore;
    use chrono::{Duration, TimeZone};
    use toasty_store::{NewCustomer, SqliteStore};
    use toasty_util::FobNum;

    fn setup() -> (Arc<dyn Store>, SessionLifecycle, CustomerId) {
        let store: Arc<dyn Store> = Arc::new(SqliteStore::in_memory().unwrap());
        let customer_id = store
            .create_customer(&NewCustomer {
                name: "Dana".into(),
                phone: "555-0100".into(),
                status: true,
                level: 2,
                fob_num: FobNum::new(1001),
            })
            .unwrap();
        let lifecycle = SessionLifecycle::new(store.clone(), AdmissionRules::default());
        (store, lifecycle, customer_id)
    }

    fn noon() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn record_start_writes_row_and_audit() {
        let (store, lifecycle, customer_id) = setup();
        let now = noon();

        let id = lifecycle
            .record_start(customer_id, BedNum::new(2), 10, &now)
            .unwrap();

        let session = store.find_most_recent_session(customer_id).unwrap().unwrap();
        assert_eq!(session.id, id);
        assert_eq!(session.time_stamp, now.timestamp());
        assert_eq!(session.session_time, 10);
        assert!(!session.cancelled);

        let audits = store.get_recent_audits(10).unwrap();
        assert!(audits
            .iter()
            .any(|a| matches!(a.event, AuditEventType::SessionRecorded { .. })));
    }

    #[test]
    fn cancel_without_session_is_a_no_op() {
        let (_store, lifecycle, customer_id) = setup();
        assert_eq!(
            lifecycle.cancel(customer_id, &noon()),
            CancelDecision::NothingToCancel
        );
    }

    #[test]
    fn cancel_inside_grace_window() {
        let (store, lifecycle, customer_id) = setup();
        let start = noon();
        lifecycle
            .record_start(customer_id, BedNum::new(3), 10, &start)
            .unwrap();

        let decision = lifecycle.cancel(customer_id, &(start + Duration::seconds(120)));
        let CancelDecision::Cancelled(session) = decision else {
            panic!("expected cancellation, got {:?}", decision);
        };
        assert!(session.cancelled);
        assert_eq!(session.bed_num, BedNum::new(3));
        assert_eq!(session.time_stamp, start.timestamp());

        // Cancelled rows no longer count as the newest session
        assert!(store.find_most_recent_session(customer_id).unwrap().is_none());
        assert_eq!(
            store.last_cancelled_session_time(customer_id).unwrap(),
            Some(start.timestamp())
        );
    }

    #[test]
    fn grace_window_boundary_is_inclusive() {
        let (_store, lifecycle, customer_id) = setup();
        let start = noon();
        lifecycle
            .record_start(customer_id, BedNum::new(1), 10, &start)
            .unwrap();

        let decision = lifecycle.cancel(customer_id, &(start + Duration::seconds(300)));
        assert!(matches!(decision, CancelDecision::Cancelled(_)));
    }

    #[test]
    fn cancel_after_grace_window_is_refused() {
        let (store, lifecycle, customer_id) = setup();
        let start = noon();
        lifecycle
            .record_start(customer_id, BedNum::new(1), 10, &start)
            .unwrap();

        let decision = lifecycle.cancel(customer_id, &(start + Duration::seconds(301)));
        assert_eq!(
            decision,
            CancelDecision::Denied(CancelDenial::GraceWindowElapsed)
        );
        assert_eq!(CancelDenial::GraceWindowElapsed.error_code(), ErrorCode::NotFound);

        let session = store.find_most_recent_session(customer_id).unwrap().unwrap();
        assert!(!session.cancelled);
    }

    #[test]
    fn second_cancel_inside_cooldown_is_refused() {
        let (store, lifecycle, customer_id) = setup();
        let first = noon();
        lifecycle
            .record_start(customer_id, BedNum::new(1), 10, &first)
            .unwrap();
        assert!(matches!(
            lifecycle.cancel(customer_id, &(first + Duration::seconds(60))),
            CancelDecision::Cancelled(_)
        ));

        let second = first + Duration::minutes(30);
        lifecycle
            .record_start(customer_id, BedNum::new(2), 10, &second)
            .unwrap();
        assert_eq!(
            lifecycle.cancel(customer_id, &(second + Duration::seconds(60))),
            CancelDecision::Denied(CancelDenial::CancelledRecently)
        );

        let session = store.find_most_recent_session(customer_id).unwrap().unwrap();
        assert_eq!(session.time_stamp, second.timestamp());
        assert!(!session.cancelled);
    }

    #[test]
    fn refused_audit_does_not_undo_the_record() {
        let store: Arc<dyn Store> = Arc::new(AuditRefusingStore::new());
        let customer_id = store
            .create_customer(&NewCustomer {
                name: "Dana".into(),
                phone: "555-0100".into(),
                status: true,
                level: 2,
                fob_num: FobNum::new(1001),
            })
            .unwrap();
        let lifecycle = SessionLifecycle::new(store.clone(), AdmissionRules::default());
        let start = noon();

        let id = lifecycle
            .record_start(customer_id, BedNum::new(2), 10, &start)
            .unwrap();
        assert_eq!(
            store.find_most_recent_session(customer_id).unwrap().map(|s| s.id),
            Some(id)
        );

        let decision = lifecycle.cancel(customer_id, &(start + Duration::seconds(30)));
        assert!(matches!(decision, CancelDecision::Cancelled(_)));
        assert!(store.get_recent_audits(10).unwrap().is_empty());
    }

    #[test]
    fn cancel_after_cooldown_is_allowed_again() {
        let (_store, lifecycle, customer_id) = setup();
        let first = noon();
        lifecycle
            .record_start(customer_id, BedNum::new(1), 10, &first)
            .unwrap();
        lifecycle.cancel(customer_id, &(first + Duration::seconds(60)));

        let second = first + Duration::hours(13);
        lifecycle
            .record_start(customer_id, BedNum::new(1), 10, &second)
            .unwrap();
        assert!(matches!(
            lifecycle.cancel(customer_id, &(second + Duration::seconds(60))),
            CancelDecision::Cancelled(_)
        ));
    }
}
