//! Controller process management

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use toasty_host_api::{HostError, HostResult};

/// One run of the device-control command, in its own process group
pub struct ControllerProcess {
    child: Child,
    pub pid: u32,
    pub pgid: u32,
}

impl ControllerProcess {
    /// Spawn the controller command in a new process group
    pub fn spawn(argv: &[String]) -> HostResult<Self> {
        let Some((program, args)) = argv.split_first() else {
            return Err(HostError::ActuationFailed("Empty argv".into()));
        };

        let mut cmd = Command::new(program);
        cmd.args(args);

        // Minimal inherited environment
        cmd.env_clear();
        if let Ok(path) = std::env::var("PATH") {
            cmd.env("PATH", path);
        }
        if let Ok(home) = std::env::var("HOME") {
            cmd.env("HOME", home);
        }

        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        // SAFETY: setsid is async-signal-safe and touches no parent state
        unsafe {
            cmd.pre_exec(|| {
                nix::unistd::setsid().map_err(|e| std::io::Error::other(e.to_string()))?;
                Ok(())
            });
        }

        let child = cmd.spawn().map_err(|e| {
            HostError::ActuationFailed(format!("Failed to spawn {}: {}", program, e))
        })?;

        let pid = child
            .id()
            .ok_or_else(|| HostError::Internal("Controller exited before reporting a pid".into()))?;
        let pgid = pid; // After setsid, pid == pgid

        debug!(pid = pid, pgid = pgid, program = %program, "Controller spawned");

        Ok(Self { child, pid, pgid })
    }

    /// Wait for the controller to exit, killing its group after `limit`.
    ///
    /// A non-zero exit is an actuation failure carrying the command's stderr.
    pub async fn finish(self, limit: Duration) -> HostResult<()> {
        let output = self.wait(limit).await?;
        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        Err(HostError::ActuationFailed(if stderr.is_empty() {
            format!("controller exited with {}", output.status)
        } else {
            format!("controller exited with {}: {}", output.status, stderr)
        }))
    }

    /// Wait for a query command; its exit status is the answer
    pub async fn exited_zero(self, limit: Duration) -> HostResult<bool> {
        Ok(self.wait(limit).await?.status.success())
    }

    async fn wait(self, limit: Duration) -> HostResult<Output> {
        let pgid = self.pgid;

        match tokio::time::timeout(limit, self.child.wait_with_output()).await {
            Err(_) => {
                kill_group(pgid);
                Err(HostError::Timeout(limit))
            }
            Ok(Err(e)) => Err(HostError::Io(e)),
            Ok(Ok(output)) => Ok(output),
        }
    }
}

/// SIGKILL a whole process group; a vanished group is not an error
fn kill_group(pgid: u32) {
    let group = Pid::from_raw(-(pgid as i32)); // Negative for process group

    match signal::kill(group, Signal::SIGKILL) {
        Ok(()) => debug!(pgid = pgid, "Sent SIGKILL to controller group"),
        Err(nix::errno::Errno::ESRCH) => {}
        Err(e) => warn!(pgid = pgid, error = %e, "Failed to kill controller group"),
    }
}
