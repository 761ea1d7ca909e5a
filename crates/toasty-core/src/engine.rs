//! Core engine

use chrono::{DateTime, Local};
use std::sync::Arc;
use toasty_api::{BedView, HealthStatus, SessionView};
use toasty_config::{BedConfig, Policy};
use toasty_host_api::BedActuator;
use toasty_store::{AuditEventType, Bed, Store, StoreResult};
use toasty_util::{
    format_report_time, from_epoch_secs, BedNum, CustomerId, FobNum, Result, ToastyError,
};
use tracing::{debug, info, warn};

use crate::audit::append_audit;
use crate::{
    evaluate, ActuationSettings, AdmissionDecision, AdmissionRules, BedController, CancelDecision,
    CustomerLookup, SessionLifecycle, TaskExecutor,
};

/// Entry point for every request the service handles
///
/// All methods take `&self`; the engine is shared behind an `Arc` and holds
/// no in-memory session state. Every decision reads the store fresh.
pub struct CoreEngine {
    store: Arc<dyn Store>,
    actuator: Arc<dyn BedActuator>,
    rules: AdmissionRules,
    lifecycle: Arc<SessionLifecycle>,
    controller: BedController,
}

impl CoreEngine {
    pub fn new(
        policy: &Policy,
        store: Arc<dyn Store>,
        actuator: Arc<dyn BedActuator>,
        executor: Arc<dyn TaskExecutor>,
    ) -> Self {
        let rules = AdmissionRules::from(&policy.admission);
        let lifecycle = Arc::new(SessionLifecycle::new(store.clone(), rules));
        let controller = BedController::new(
            actuator.clone(),
            executor,
            lifecycle.clone(),
            store.clone(),
            ActuationSettings::from(&policy.actuation),
        );

        info!(
            grace_window_secs = rules.grace_window_secs,
            rolling_window_secs = rules.rolling_window_secs,
            bed_count = policy.beds.len(),
            "Core engine initialized"
        );

        Self {
            store,
            actuator,
            rules,
            lifecycle,
            controller,
        }
    }

    /// Make the bed table match the configured beds
    pub fn sync_beds(&self, beds: &[BedConfig]) -> StoreResult<()> {
        for bed in beds {
            self.store.upsert_bed(&Bed {
                bed_num: bed.bed_num,
                level: bed.level,
                max_time: bed.max_time,
                name: bed.name.clone(),
            })?;
        }
        debug!(count = beds.len(), "Configured beds synced");
        Ok(())
    }

    /// Decide whether the holder of `fob_num` may tan now
    pub fn admit(&self, fob_num: FobNum, now: &DateTime<Local>) -> AdmissionDecision {
        let lookup = CustomerLookup::load(self.store.as_ref(), fob_num);
        let decision = evaluate(lookup, now, &self.rules);

        match &decision {
            AdmissionDecision::Admitted(customer) => {
                info!(
                    customer_id = %customer.id,
                    fob_num = %fob_num,
                    level = customer.level,
                    "Customer admitted"
                );
            }
            AdmissionDecision::Denied(denial) => {
                info!(fob_num = %fob_num, reason = ?denial, "Admission denied");
                append_audit(
                    self.store.as_ref(),
                    AuditEventType::AdmissionDenied {
                        fob_num,
                        error_code: denial.error_code().into(),
                    },
                );
            }
        }

        decision
    }

    /// Check a start request and hand the bed sequence to the executor.
    ///
    /// Returns as soon as the sequence is queued; actuation failures are
    /// never reported here.
    pub fn start_bed(&self, bed_num: BedNum, minutes: u32, customer_id: CustomerId) -> Result<()> {
        let bed = self
            .store
            .get_bed(bed_num)
            .map_err(|e| ToastyError::store(e.to_string()))?
            .ok_or(ToastyError::BedNotFound(bed_num))?;

        let customer = self
            .store
            .get_customer(customer_id)
            .map_err(|e| ToastyError::store(e.to_string()))?
            .ok_or(ToastyError::CustomerNotFound(customer_id))?;

        if customer.level < bed.level {
            return Err(ToastyError::LevelTooLow {
                bed: bed_num,
                required: bed.level,
                level: customer.level,
            });
        }

        if minutes > bed.max_time {
            return Err(ToastyError::DurationExceedsMax {
                bed: bed_num,
                minutes,
                max_time: bed.max_time,
            });
        }

        info!(
            customer_id = %customer_id,
            bed = %bed_num,
            minutes = minutes,
            "Bed start accepted"
        );
        self.controller.dispatch_start(customer_id, bed_num, minutes);
        Ok(())
    }

    /// Cancel the customer's session in progress and stop its bed
    pub fn cancel(&self, customer_id: CustomerId, now: &DateTime<Local>) -> CancelDecision {
        let decision = self.lifecycle.cancel(customer_id, now);

        match &decision {
            CancelDecision::Cancelled(session) => self.controller.dispatch_stop(session.bed_num),
            CancelDecision::NothingToCancel => {
                debug!(customer_id = %customer_id, "No session to cancel");
            }
            CancelDecision::Denied(denial) => {
                info!(customer_id = %customer_id, reason = ?denial, "Cancellation refused");
            }
        }

        decision
    }

    /// Beds the customer's level gives access to, with readiness
    pub async fn bed_status(&self, customer_id: CustomerId) -> Result<Vec<BedView>> {
        let customer = self
            .store
            .get_customer(customer_id)
            .map_err(|e| ToastyError::store(e.to_string()))?
            .ok_or(ToastyError::CustomerNotFound(customer_id))?;

        let beds = self
            .store
            .beds_accessible_at_level(customer.level)
            .map_err(|e| ToastyError::store(e.to_string()))?;

        let mut views = Vec::with_capacity(beds.len());
        for bed in beds {
            let ready = match self.actuator.bed_ready(bed.bed_num).await {
                Ok(ready) => ready,
                Err(e) => {
                    warn!(bed = %bed.bed_num, error = %e, "Bed readiness query failed");
                    false
                }
            };
            views.push(BedView {
                bed_num: bed.bed_num,
                name: bed.name,
                level: bed.level,
                max_time: bed.max_time,
                ready,
            });
        }

        Ok(views)
    }

    /// Newest-first session report
    pub fn recent_sessions(&self, limit: usize) -> StoreResult<Vec<SessionView>> {
        let rows = self.store.recent_sessions(limit)?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let started_at = from_epoch_secs(row.session.time_stamp);
                SessionView {
                    session_id: row.session.id,
                    customer_id: row.session.customer_id,
                    customer_name: row.customer_name,
                    bed_num: row.session.bed_num,
                    time_stamp: row.session.time_stamp,
                    local_time: format_report_time(&started_at),
                    started_at,
                    session_time: row.session.session_time,
                    cancelled: row.session.cancelled,
                }
            })
            .collect())
    }

    pub fn health(&self) -> HealthStatus {
        HealthStatus {
            live: true,
            store_ok: self.store.is_healthy(),
            actuator_ok: self.actuator.is_healthy(),
        }
    }
}
