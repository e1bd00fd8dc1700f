//! Tunnel-side error types.

use thiserror::Error;

/// Errors raised while preparing or launching a tunnel provider.
///
/// Every variant here is fatal to the run: there is no in-run fallback from
/// one provider to the other once selection has happened. Soft conditions
/// (public URL never appearing in the log) are represented as `Option`s at
/// the call sites, not as errors.
#[derive(Debug, Error)]
pub enum TunnelError {
    /// The provider binary could not be resolved or downloaded.
    #[error("provider binary '{name}' unavailable: {reason}")]
    Fetch { name: String, reason: String },

    /// The stable provider rejected the auth token configuration step.
    #[error("auth token configuration failed: {reason}")]
    AuthConfig { reason: String },

    /// The tunnel subprocess could not be spawned.
    #[error("failed to start tunnel process")]
    Spawn(#[source] std::io::Error),

    /// The log sink file for the tunnel subprocess could not be created.
    #[error("failed to prepare tunnel log sink")]
    LogSink(#[source] std::io::Error),

    /// The configured quick-tunnel domain suffix does not compile into a
    /// scan pattern.
    #[error("invalid quick-tunnel domain suffix '{suffix}'")]
    Pattern { suffix: String },
}
