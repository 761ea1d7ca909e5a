//! Bed actuator traits

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use toasty_util::BedNum;

/// Errors from bed actuation
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Actuation failed: {0}")]
    ActuationFailed(String),

    #[error("Bed controller did not answer within {0:?}")]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type HostResult<T> = Result<T, HostError>;

/// Drives physical beds.
///
/// The hardware has exactly one primitive: run a bed for a number of
/// minutes. There is no stop and no abort once a command is accepted; a
/// call may take several seconds to return.
#[async_trait]
pub trait BedActuator: Send + Sync {
    /// Command `bed` to run for `minutes`
    async fn run_bed(&self, bed: BedNum, minutes: u32) -> HostResult<()>;

    /// Optional: whether the bed reports itself idle
    async fn bed_ready(&self, _bed: BedNum) -> HostResult<bool> {
        Ok(true)
    }

    /// Optional: check if the actuator is healthy
    fn is_healthy(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    #[async_trait]
    impl BedActuator for Noop {
        async fn run_bed(&self, _bed: BedNum, _minutes: u32) -> HostResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn optional_methods_default_to_ready() {
        let actuator = Noop;
        assert!(actuator.bed_ready(BedNum::new(1)).await.unwrap());
        assert!(actuator.is_healthy());
    }

    #[test]
    fn timeout_message() {
        let err = HostError::Timeout(Duration::from_secs(10));
        assert_eq!(err.to_string(), "Bed controller did not answer within 10s");
    }
}
