//! Local service process ownership.
//!
//! The run owns exactly one service process for its lifetime. Teardown is
//! implicit: the child is killed when the run (and with it this handle)
//! drops.

use tokio::process::{Child, Command};
use tracing::info;

use crate::error::SupervisorError;

#[derive(Debug)]
pub struct ServiceProcess {
    child: Child,
}

impl ServiceProcess {
    /// Spawn the service command (program followed by its arguments). The
    /// service inherits stdio so its own logs interleave with the
    /// supervisor's.
    pub fn spawn(command: &[String]) -> Result<Self, SupervisorError> {
        let (program, args) = command.split_first().ok_or(SupervisorError::Config {
            reason: "service command is empty".to_string(),
        })?;

        let child = Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .spawn()
            .map_err(SupervisorError::ServiceSpawn)?;

        info!(pid = ?child.id(), command = %command.join(" "), "service process started");
        Ok(Self { child })
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }
}
