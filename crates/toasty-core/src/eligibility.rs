//! Admission rules
//!
//! [`evaluate`] is a pure function of the customer record, that customer's
//! most recent non-cancelled session and the current time. Rules are
//! checked in a fixed order and the first match wins:
//!
//! 1. the store lookup failed
//! 2. no customer holds the presented fob
//! 3. the customer is not authorized
//! 4. a bed session started inside the grace window (cancellable)
//! 5. the last start is inside the rolling window
//! 6. the last start is after local midnight today
//!
//! Rules 5 and 6 overlap on purpose and stay separate checks.

use chrono::{DateTime, Local};
use toasty_api::ErrorCode;
use toasty_config::AdmissionPolicy;
use toasty_store::{Customer, CustomerStore, Session, SessionStore};
use toasty_util::{local_midnight, seconds_since, CustomerId, FobNum};
use tracing::warn;

/// Window lengths in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionRules {
    pub grace_window_secs: i64,
    pub rolling_window_secs: i64,
    pub cancel_cooldown_secs: i64,
}

impl From<&AdmissionPolicy> for AdmissionRules {
    fn from(policy: &AdmissionPolicy) -> Self {
        Self {
            grace_window_secs: policy.grace_window.as_secs() as i64,
            rolling_window_secs: policy.rolling_window.as_secs() as i64,
            cancel_cooldown_secs: policy.cancel_cooldown.as_secs() as i64,
        }
    }
}

impl Default for AdmissionRules {
    fn default() -> Self {
        Self::from(&AdmissionPolicy::default())
    }
}

/// Snapshot returned with an admission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmittedCustomer {
    pub id: CustomerId,
    pub name: String,
    pub level: i64,
}

/// Which same-day check rejected the customer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameDayWindow {
    Rolling,
    Calendar,
}

/// Why admission was refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    LookupFailed,
    UnknownKey,
    NotAuthorized,
    /// The only rejection that still identifies the customer
    SessionInProgress { customer_id: CustomerId },
    AlreadyUsedToday { window: SameDayWindow },
}

impl Denial {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Denial::LookupFailed => ErrorCode::Indeterminate,
            Denial::UnknownKey => ErrorCode::NotFound,
            Denial::NotAuthorized => ErrorCode::NotAuthorized,
            Denial::SessionInProgress { .. } => ErrorCode::SessionInProgress,
            Denial::AlreadyUsedToday { .. } => ErrorCode::AlreadyUsedToday,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Denial::LookupFailed => "Error with customer login",
            Denial::UnknownKey => "Keyfob not found",
            Denial::NotAuthorized => "Customer not authorized",
            Denial::SessionInProgress { .. } => "Session in progress",
            Denial::AlreadyUsedToday { .. } => "Already tanned today",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionDecision {
    Admitted(AdmittedCustomer),
    Denied(Denial),
}

impl AdmissionDecision {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            AdmissionDecision::Admitted(_) => ErrorCode::Success,
            AdmissionDecision::Denied(denial) => denial.error_code(),
        }
    }
}

/// What the store knows about a presented fob
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomerLookup {
    Failed,
    Unknown,
    Found {
        customer: Customer,
        last_session: Option<Session>,
    },
}

impl CustomerLookup {
    /// Read the customer and their most recent non-cancelled session fresh
    pub fn load<S>(store: &S, fob_num: FobNum) -> Self
    where
        S: CustomerStore + SessionStore + ?Sized,
    {
        let customer = match store.find_customer_by_fob(fob_num) {
            Ok(Some(c)) => c,
            Ok(None) => return CustomerLookup::Unknown,
            Err(e) => {
                warn!(fob_num = %fob_num, error = %e, "Customer lookup failed");
                return CustomerLookup::Failed;
            }
        };

        match store.find_most_recent_session(customer.id) {
            Ok(last_session) => CustomerLookup::Found {
                customer,
                last_session,
            },
            Err(e) => {
                warn!(customer_id = %customer.id, error = %e, "Session lookup failed");
                CustomerLookup::Failed
            }
        }
    }
}

/// Classify an admission request
pub fn evaluate(
    lookup: CustomerLookup,
    now: &DateTime<Local>,
    rules: &AdmissionRules,
) -> AdmissionDecision {
    let (customer, last_session) = match lookup {
        CustomerLookup::Failed => return AdmissionDecision::Denied(Denial::LookupFailed),
        CustomerLookup::Unknown => return AdmissionDecision::Denied(Denial::UnknownKey),
        CustomerLookup::Found {
            customer,
            last_session,
        } => (customer, last_session),
    };

    if !customer.status {
        return AdmissionDecision::Denied(Denial::NotAuthorized);
    }

    // No prior session reads as a start at the epoch
    let (last_start, last_bed_is_set) = last_session
        .as_ref()
        .map(|s| (s.time_stamp, !s.bed_num.is_none()))
        .unwrap_or((0, false));
    let elapsed = seconds_since(last_start, now);

    if last_bed_is_set && elapsed < rules.grace_window_secs {
        return AdmissionDecision::Denied(Denial::SessionInProgress {
            customer_id: customer.id,
        });
    }

    if elapsed < rules.rolling_window_secs {
        return AdmissionDecision::Denied(Denial::AlreadyUsedToday {
            window: SameDayWindow::Rolling,
        });
    }

    if last_start > local_midnight(now).timestamp() {
        return AdmissionDecision::Denied(Denial::AlreadyUsedToday {
            window: SameDayWindow::Calendar,
        });
    }

    AdmissionDecision::Admitted(AdmittedCustomer {
        id: customer.id,
        name: customer.name,
        level: customer.level,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use toasty_util::{BedNum, SessionId};

    fn customer(status: bool) -> Customer {
        Customer {
            id: CustomerId::new(7),
            name: "Dana".into(),
            phone: "555-0100".into(),
            status,
            level: 2,
            fob_num: FobNum::new(1001),
        }
    }

    fn session_at(time_stamp: i64, bed: u32) -> Session {
        Session {
            id: SessionId::new(1),
            customer_id: CustomerId::new(7),
            bed_num: BedNum::new(bed),
            time_stamp,
            session_time: 10,
            cancelled: false,
        }
    }

    fn found(status: bool, last_session: Option<Session>) -> CustomerLookup {
        CustomerLookup::Found {
            customer: customer(status),
            last_session,
        }
    }

    // 23:00 leaves room for a >12h gap that is still on the same calendar day
    fn late_evening() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 6, 10, 23, 0, 0).unwrap()
    }

    fn decide(lookup: CustomerLookup, now: DateTime<Local>) -> AdmissionDecision {
        evaluate(lookup, &now, &AdmissionRules::default())
    }

    #[test]
    fn lookup_failure_is_indeterminate() {
        let d = decide(CustomerLookup::Failed, late_evening());
        assert_eq!(d, AdmissionDecision::Denied(Denial::LookupFailed));
        assert_eq!(d.error_code(), ErrorCode::Indeterminate);
    }

    #[test]
    fn unknown_fob_is_not_found() {
        let d = decide(CustomerLookup::Unknown, late_evening());
        assert_eq!(d.error_code(), ErrorCode::NotFound);
    }

    #[test]
    fn unauthorized_regardless_of_history() {
        let now = late_evening();
        let histories = [
            None,
            Some(session_at(now.timestamp() - 60, 2)),
            Some(session_at(now.timestamp() - 1_000, 2)),
            Some(session_at(now.timestamp() - 100_000, 2)),
        ];

        for history in histories {
            let d = decide(found(false, history), now);
            assert_eq!(d, AdmissionDecision::Denied(Denial::NotAuthorized));
            assert_eq!(d.error_code(), ErrorCode::NotAuthorized);
        }
    }

    #[test]
    fn first_visit_is_admitted() {
        let d = decide(found(true, None), late_evening());
        assert_eq!(
            d,
            AdmissionDecision::Admitted(AdmittedCustomer {
                id: CustomerId::new(7),
                name: "Dana".into(),
                level: 2,
            })
        );
    }

    #[test]
    fn recent_start_is_cancellable() {
        let now = late_evening();
        let d = decide(found(true, Some(session_at(now.timestamp() - 200, 3))), now);
        assert_eq!(
            d,
            AdmissionDecision::Denied(Denial::SessionInProgress {
                customer_id: CustomerId::new(7)
            })
        );
        assert_eq!(d.error_code(), ErrorCode::SessionInProgress);
    }

    #[test]
    fn recent_start_without_bed_is_not_cancellable() {
        let now = late_evening();
        let d = decide(found(true, Some(session_at(now.timestamp() - 200, 0))), now);
        assert_eq!(
            d,
            AdmissionDecision::Denied(Denial::AlreadyUsedToday {
                window: SameDayWindow::Rolling
            })
        );
    }

    #[test]
    fn grace_window_boundary() {
        let now = late_evening();

        let d = decide(found(true, Some(session_at(now.timestamp() - 299, 1))), now);
        assert_eq!(d.error_code(), ErrorCode::SessionInProgress);

        let d = decide(found(true, Some(session_at(now.timestamp() - 300, 1))), now);
        assert_eq!(d.error_code(), ErrorCode::AlreadyUsedToday);
    }

    #[test]
    fn rolling_window_rejects() {
        let now = late_evening();
        for elapsed in [300, 3_600, 43_199] {
            let d = decide(
                found(true, Some(session_at(now.timestamp() - elapsed, 1))),
                now,
            );
            assert_eq!(
                d,
                AdmissionDecision::Denied(Denial::AlreadyUsedToday {
                    window: SameDayWindow::Rolling
                }),
                "elapsed {}",
                elapsed
            );
        }
    }

    #[test]
    fn calendar_window_catches_same_day_after_rolling_expires() {
        // 23:00 now, last start 12h10m earlier at 10:50 the same day
        let now = late_evening();
        let last = now.timestamp() - 43_800;
        let d = decide(found(true, Some(session_at(last, 1))), now);
        assert_eq!(
            d,
            AdmissionDecision::Denied(Denial::AlreadyUsedToday {
                window: SameDayWindow::Calendar
            })
        );
    }

    #[test]
    fn previous_day_after_rolling_window_is_admitted() {
        // 09:00 now, last start at 20:00 the previous evening (13h earlier)
        let now = Local.with_ymd_and_hms(2025, 6, 10, 9, 0, 0).unwrap();
        let last = Local.with_ymd_and_hms(2025, 6, 9, 20, 0, 0).unwrap();
        let d = decide(found(true, Some(session_at(last.timestamp(), 1))), now);
        assert!(matches!(d, AdmissionDecision::Admitted(_)));
    }

    #[test]
    fn custom_windows_apply() {
        let rules = AdmissionRules {
            grace_window_secs: 60,
            rolling_window_secs: 120,
            cancel_cooldown_secs: 120,
        };
        let now = late_evening();
        let lookup = found(true, Some(session_at(now.timestamp() - 90, 1)));
        assert_eq!(
            evaluate(lookup, &now, &rules),
            AdmissionDecision::Denied(Denial::AlreadyUsedToday {
                window: SameDayWindow::Rolling
            })
        );
    }

    #[test]
    fn rules_from_policy() {
        let rules = AdmissionRules::from(&AdmissionPolicy::default());
        assert_eq!(rules.grace_window_secs, 300);
        assert_eq!(rules.rolling_window_secs, 43_200);
        assert_eq!(rules.cancel_cooldown_secs, 43_200);
    }
}
