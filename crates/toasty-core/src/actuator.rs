//! Two-phase bed actuation
//!
//! The controllers only reliably accept a session command right after a
//! short "priming" command, and the only way to stop a running bed is to
//! replace its session with the shortest one. So both starting and
//! stopping are the same sequence:
//!
//! ```text
//! run_bed(bed, priming) -> sleep(priming_delay) -> run_bed(bed, minutes)
//! ```
//!
//! A priming failure is logged and the sequence continues; only the second
//! call decides the outcome.

use std::sync::Arc;
use std::time::Duration;
use toasty_config::ActuationPolicy;
use toasty_host_api::{BedActuator, HostResult};
use toasty_store::{ActuationPhase, AuditEventType, Store};
use toasty_util::{BedNum, CustomerId};
use tracing::{debug, error, info, warn};

use crate::audit::append_audit;
use crate::{SessionLifecycle, TaskExecutor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuationSettings {
    pub priming_minutes: u32,
    pub priming_delay: Duration,
}

impl From<&ActuationPolicy> for ActuationSettings {
    fn from(policy: &ActuationPolicy) -> Self {
        Self {
            priming_minutes: policy.priming_minutes,
            priming_delay: policy.priming_delay,
        }
    }
}

impl Default for ActuationSettings {
    fn default() -> Self {
        Self::from(&ActuationPolicy::default())
    }
}

/// Hands bed sequences to the executor and settles their outcome
#[derive(Clone)]
pub struct BedController {
    actuator: Arc<dyn BedActuator>,
    executor: Arc<dyn TaskExecutor>,
    lifecycle: Arc<SessionLifecycle>,
    store: Arc<dyn Store>,
    settings: ActuationSettings,
}

impl BedController {
    pub fn new(
        actuator: Arc<dyn BedActuator>,
        executor: Arc<dyn TaskExecutor>,
        lifecycle: Arc<SessionLifecycle>,
        store: Arc<dyn Store>,
        settings: ActuationSettings,
    ) -> Self {
        Self {
            actuator,
            executor,
            lifecycle,
            store,
            settings,
        }
    }

    /// Start a bed in the background; the session row is written only once
    /// the bed has accepted the main command.
    pub fn dispatch_start(&self, customer_id: CustomerId, bed: BedNum, minutes: u32) {
        let this = self.clone();
        debug!(customer_id = %customer_id, bed = %bed, minutes = minutes, "Dispatching bed start");

        self.executor.submit(Box::pin(async move {
            if let Err(e) = this.run_sequence(bed, minutes).await {
                error!(bed = %bed, minutes = minutes, error = %e, "Bed did not start; no session recorded");
                this.audit(AuditEventType::ActuationFailed {
                    bed_num: bed,
                    minutes,
                    phase: ActuationPhase::Main,
                    error: e.to_string(),
                });
                return;
            }

            let now = toasty_util::now();
            if let Err(e) = this.lifecycle.record_start(customer_id, bed, minutes, &now) {
                // The bed is running with no row behind it
                error!(
                    customer_id = %customer_id,
                    bed = %bed,
                    minutes = minutes,
                    error = %e,
                    "Bed started but session write failed"
                );
                this.audit(AuditEventType::SessionWriteFailed {
                    customer_id,
                    bed_num: bed,
                    minutes,
                    error: e.to_string(),
                });
            }
        }));
    }

    /// Stop a bed in the background by overwriting its session with the
    /// priming duration. Beds never recorded (number 0) are skipped.
    pub fn dispatch_stop(&self, bed: BedNum) {
        if bed.is_none() {
            debug!("Cancelled session has no bed; nothing to stop");
            return;
        }

        let this = self.clone();
        let minutes = self.settings.priming_minutes;
        debug!(bed = %bed, "Dispatching bed stop");

        self.executor.submit(Box::pin(async move {
            match this.run_sequence(bed, minutes).await {
                Ok(()) => info!(bed = %bed, "Bed stopped"),
                Err(e) => {
                    error!(bed = %bed, error = %e, "Bed stop failed; bed may still be running");
                    this.audit(AuditEventType::StopFailed {
                        bed_num: bed,
                        error: e.to_string(),
                    });
                }
            }
        }));
    }

    async fn run_sequence(&self, bed: BedNum, minutes: u32) -> HostResult<()> {
        let priming = self.settings.priming_minutes;

        if let Err(e) = self.actuator.run_bed(bed, priming).await {
            warn!(bed = %bed, error = %e, "Priming command failed; continuing");
            self.audit(AuditEventType::ActuationFailed {
                bed_num: bed,
                minutes: priming,
                phase: ActuationPhase::Priming,
                error: e.to_string(),
            });
        }

        tokio::time::sleep(self.settings.priming_delay).await;

        self.actuator.run_bed(bed, minutes).await
    }

    fn audit(&self, event: AuditEventType) {
        append_audit(self.store.as_ref(), event);
    }
}
