//! Command-driven bed actuator

use async_trait::async_trait;
use std::borrow::Cow;
use toasty_config::CommandDriver;
use toasty_host_api::{BedActuator, HostResult};
use toasty_util::BedNum;
use tracing::{debug, info, warn};

use crate::process::ControllerProcess;

/// Drives beds by running the configured device-control command
///
/// Each `run_bed` renders the argv template, runs it to completion and
/// maps a non-zero exit or a timeout to an error.
///
/// Readiness comes from the optional status command: exit 0 means idle,
/// any other exit means busy. Without one every bed reports ready.
pub struct CommandActuator {
    driver: CommandDriver,
}

impl CommandActuator {
    pub fn new(driver: CommandDriver) -> Self {
        Self { driver }
    }

    /// Shell-quoted rendering of the argv, for logs
    fn display_command(argv: &[String]) -> String {
        argv.iter()
            .map(|arg| shell_escape::escape(Cow::Borrowed(arg.as_str())))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait]
impl BedActuator for CommandActuator {
    async fn run_bed(&self, bed: BedNum, minutes: u32) -> HostResult<()> {
        let argv = self.driver.render(bed, minutes);
        let command = Self::display_command(&argv);
        debug!(bed = %bed, minutes = minutes, command = %command, "Running bed controller");

        let process = ControllerProcess::spawn(&argv)?;
        match process.finish(self.driver.timeout).await {
            Ok(()) => {
                info!(bed = %bed, minutes = minutes, "Bed controller accepted command");
                Ok(())
            }
            Err(e) => {
                warn!(bed = %bed, minutes = minutes, command = %command, error = %e, "Bed controller failed");
                Err(e)
            }
        }
    }

    async fn bed_ready(&self, bed: BedNum) -> HostResult<bool> {
        let Some(argv) = self.driver.render_status(bed) else {
            return Ok(true);
        };

        let process = ControllerProcess::spawn(&argv)?;
        let ready = process.exited_zero(self.driver.timeout).await?;
        debug!(bed = %bed, ready = ready, "Bed status queried");
        Ok(ready)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use toasty_host_api::HostError;

    fn driver(argv: &[&str]) -> CommandDriver {
        CommandDriver {
            argv: argv.iter().map(|s| s.to_string()).collect(),
            timeout: Duration::from_secs(5),
            status_argv: None,
        }
    }

    #[tokio::test]
    async fn placeholders_reach_the_command() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("calls.log");
        let script = format!("echo \"$0 $1\" >> {}", out.display());

        let actuator = CommandActuator::new(driver(&["sh", "-c", &script, "{bed}", "{minutes}"]));
        actuator.run_bed(BedNum::new(3), 1).await.unwrap();
        actuator.run_bed(BedNum::new(3), 12).await.unwrap();

        let log = std::fs::read_to_string(&out).unwrap();
        assert_eq!(log, "3 1\n3 12\n");
    }

    #[tokio::test]
    async fn non_zero_exit_is_failure() {
        let actuator = CommandActuator::new(driver(&["false", "{bed}", "{minutes}"]));
        let err = actuator.run_bed(BedNum::new(1), 5).await.unwrap_err();
        assert!(matches!(err, HostError::ActuationFailed(_)));
    }

    #[tokio::test]
    async fn missing_program_is_failure() {
        let actuator = CommandActuator::new(driver(&[
            "/nonexistent/bedctl",
            "{bed}",
            "{minutes}",
        ]));
        assert!(actuator.run_bed(BedNum::new(1), 5).await.is_err());
    }

    #[tokio::test]
    async fn ready_without_status_command() {
        let actuator = CommandActuator::new(driver(&["true", "{bed}", "{minutes}"]));
        assert!(actuator.bed_ready(BedNum::new(1)).await.unwrap());
    }

    #[tokio::test]
    async fn status_command_exit_decides_readiness() {
        let mut cfg = driver(&["true", "{bed}", "{minutes}"]);
        // Bed 2 is busy
        cfg.status_argv = Some(vec![
            "sh".into(),
            "-c".into(),
            "test \"$0\" != 2".into(),
            "{bed}".into(),
        ]);
        let actuator = CommandActuator::new(cfg);

        assert!(actuator.bed_ready(BedNum::new(1)).await.unwrap());
        assert!(!actuator.bed_ready(BedNum::new(2)).await.unwrap());
    }

    #[tokio::test]
    async fn unreachable_status_command_is_an_error() {
        let mut cfg = driver(&["true", "{bed}", "{minutes}"]);
        cfg.status_argv = Some(vec!["/nonexistent/bedstat".into(), "{bed}".into()]);
        let actuator = CommandActuator::new(cfg);

        assert!(actuator.bed_ready(BedNum::new(1)).await.is_err());
    }

    #[test]
    fn display_quotes_arguments() {
        let shown = CommandActuator::display_command(&[
            "bedctl".to_string(),
            "two words".to_string(),
        ]);
        assert_eq!(shown, "bedctl 'two words'");
    }
}
