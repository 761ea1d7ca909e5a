//! Mock bed actuator for testing and hardware-free development

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use toasty_util::BedNum;

use crate::{BedActuator, HostError, HostResult};

/// One accepted or rejected `run_bed` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuatorCall {
    pub bed: BedNum,
    pub minutes: u32,
    pub succeeded: bool,
}

/// Mock actuator for unit/integration testing
///
/// Records every call in order. Failure toggles are shared handles so a test
/// can flip them while tasks holding the actuator are in flight.
#[derive(Clone, Default)]
pub struct MockActuator {
    calls: Arc<Mutex<Vec<ActuatorCall>>>,

    /// Configure every call to fail
    pub fail_all: Arc<Mutex<bool>>,

    /// Configure calls for exactly this many minutes to fail
    pub fail_minutes: Arc<Mutex<Option<u32>>>,

    /// Simulated controller latency per call, status queries included
    pub latency: Arc<Mutex<Option<Duration>>>,

    /// Beds that report busy from `bed_ready`
    pub busy_beds: Arc<Mutex<HashSet<BedNum>>>,
}

fn guard<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockActuator {
    pub fn new() -> Self {
        Self::default()
    }

    /// All calls so far, oldest first
    pub fn calls(&self) -> Vec<ActuatorCall> {
        guard(&self.calls).clone()
    }

    /// Calls that succeeded, as `(bed, minutes)`
    pub fn successful_runs(&self) -> Vec<(BedNum, u32)> {
        guard(&self.calls)
            .iter()
            .filter(|c| c.succeeded)
            .map(|c| (c.bed, c.minutes))
            .collect()
    }

    pub fn set_fail_all(&self, fail: bool) {
        *guard(&self.fail_all) = fail;
    }

    pub fn set_fail_minutes(&self, minutes: Option<u32>) {
        *guard(&self.fail_minutes) = minutes;
    }

    pub fn set_latency(&self, latency: Option<Duration>) {
        *guard(&self.latency) = latency;
    }

    async fn simulate_latency(&self) {
        let latency = *guard(&self.latency);
        if let Some(delay) = latency {
            tokio::time::sleep(delay).await;
        }
    }

    pub fn set_busy(&self, bed: BedNum, busy: bool) {
        let mut beds = guard(&self.busy_beds);
        if busy {
            beds.insert(bed);
        } else {
            beds.remove(&bed);
        }
    }
}

#[async_trait]
impl BedActuator for MockActuator {
    async fn run_bed(&self, bed: BedNum, minutes: u32) -> HostResult<()> {
        self.simulate_latency().await;

        let fail = *guard(&self.fail_all) || *guard(&self.fail_minutes) == Some(minutes);

        guard(&self.calls).push(ActuatorCall {
            bed,
            minutes,
            succeeded: !fail,
        });

        if fail {
            return Err(HostError::ActuationFailed(format!(
                "mock failure running bed {} for {} min",
                bed, minutes
            )));
        }
        Ok(())
    }

    async fn bed_ready(&self, bed: BedNum) -> HostResult<bool> {
        self.simulate_latency().await;
        Ok(!guard(&self.busy_beds).contains(&bed))
    }
}
