//! Supervisor error types.
//!
//! Only conditions that abort a run live here. Readiness timeouts and
//! unresolved public URLs are soft: they surface as log lines and report
//! fields, never as errors.

use std::path::PathBuf;

use thiserror::Error;
use uplift_tunnel::TunnelError;

#[derive(Debug, Error)]
pub enum SupervisorError {
    /// Another run holds the lock file. The scheduler should not let this
    /// happen; if it does, this run backs off immediately.
    #[error("another run appears to be active (lock file {path} exists)")]
    LockHeld { path: PathBuf },

    /// The lock file could not be created for an unexpected reason.
    #[error("failed to create run lock")]
    Lock(#[source] std::io::Error),

    /// The local service process could not be spawned.
    #[error("failed to start service process")]
    ServiceSpawn(#[source] std::io::Error),

    /// The run configuration is unusable.
    #[error("invalid run configuration: {reason}")]
    Config { reason: String },

    /// Fatal tunnel-side failure (binary fetch, auth config, spawn).
    #[error(transparent)]
    Tunnel(#[from] TunnelError),
}
