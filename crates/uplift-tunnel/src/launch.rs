//! Tunnel subprocess launcher.
//!
//! Starts the chosen provider's process with its stdout/stderr redirected to
//! a log file the supervisor can scan. The child is owned by the handle and
//! killed when the handle drops; there is no graceful-shutdown handshake.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, Command};
use tracing::{debug, info};

use crate::credentials::{Credentials, Provider};
use crate::error::TunnelError;

/// Options for one tunnel launch.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Local port the tunnel forwards to.
    pub local_port: u16,
    /// Credentials deciding the provider and, on the stable path, the domain.
    pub credentials: Credentials,
    /// File receiving the tunnel process's stdout and stderr.
    pub log_path: PathBuf,
    /// Fixed delay after spawning the stable provider, letting it attach
    /// before the run moves on. The stable URL needs no log scanning, so this
    /// is the only wait on that path.
    pub settle: Duration,
}

/// A running tunnel subprocess bound to its log sink.
#[derive(Debug)]
pub struct TunnelHandle {
    child: Child,
    provider: Provider,
    log_path: PathBuf,
    public_url: Option<String>,
}

impl TunnelHandle {
    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Known in advance only on the stable path; the quick path discovers its
    /// URL from the log sink.
    pub fn public_url(&self) -> Option<&str> {
        self.public_url.as_deref()
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }
}

/// Argv for the stable provider: forward the local port under the reserved
/// domain, logging to stdout so the sink captures it.
pub fn stable_args(local_port: u16, domain: &str) -> Vec<String> {
    vec![
        "http".to_string(),
        local_port.to_string(),
        format!("--domain={domain}"),
        "--log=stdout".to_string(),
    ]
}

/// Argv for the quick provider: anonymous tunnel to the local port, no
/// self-update so the pinned binary stays put.
pub fn quick_args(local_port: u16) -> Vec<String> {
    vec![
        "tunnel".to_string(),
        "--url".to_string(),
        format!("http://localhost:{local_port}"),
        "--no-autoupdate".to_string(),
    ]
}

/// Launch the provider selected by the credentials. Spawn and auth-config
/// failures are fatal; there is no cross-provider fallback within a run.
pub async fn launch(binary: &Path, opts: &LaunchOptions) -> Result<TunnelHandle, TunnelError> {
    match opts.credentials.provider() {
        Provider::Stable => launch_stable(binary, opts).await,
        Provider::Quick => launch_quick(binary, opts).await,
    }
}

async fn launch_stable(binary: &Path, opts: &LaunchOptions) -> Result<TunnelHandle, TunnelError> {
    // provider() returned Stable, so both halves are present.
    let (Some(token), Some(domain)) = (opts.credentials.auth_token(), opts.credentials.domain())
    else {
        return Err(TunnelError::AuthConfig {
            reason: "stable provider selected without full credentials".to_string(),
        });
    };

    configure_auth_token(binary, token).await?;

    let args = stable_args(opts.local_port, domain);
    debug!(binary = %binary.display(), ?args, "spawning stable tunnel");
    let child = spawn_to_log(binary, &args, &opts.log_path)?;

    // Let the subprocess attach before reporting the precomputed URL.
    tokio::time::sleep(opts.settle).await;

    info!(pid = ?child.id(), domain, "stable tunnel launched");
    Ok(TunnelHandle {
        child,
        provider: Provider::Stable,
        log_path: opts.log_path.clone(),
        public_url: Some(format!("https://{domain}")),
    })
}

async fn launch_quick(binary: &Path, opts: &LaunchOptions) -> Result<TunnelHandle, TunnelError> {
    let args = quick_args(opts.local_port);
    debug!(binary = %binary.display(), ?args, "spawning quick tunnel");
    let child = spawn_to_log(binary, &args, &opts.log_path)?;

    info!(pid = ?child.id(), "quick tunnel launched, URL pending discovery");
    Ok(TunnelHandle {
        child,
        provider: Provider::Quick,
        log_path: opts.log_path.clone(),
        public_url: None,
    })
}

/// Register the auth token with the stable provider's CLI before launching.
async fn configure_auth_token(binary: &Path, token: &str) -> Result<(), TunnelError> {
    let status = Command::new(binary)
        .args(["config", "add-authtoken", token])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map_err(TunnelError::Spawn)?;

    if !status.success() {
        return Err(TunnelError::AuthConfig {
            reason: format!("provider exited with {status}"),
        });
    }
    Ok(())
}

fn spawn_to_log(binary: &Path, args: &[String], log_path: &Path) -> Result<Child, TunnelError> {
    let stdout = std::fs::File::create(log_path).map_err(TunnelError::LogSink)?;
    let stderr = stdout.try_clone().map_err(TunnelError::LogSink)?;

    Command::new(binary)
        .args(args)
        .stdout(Stdio::from(stdout))
        .stderr(Stdio::from(stderr))
        .kill_on_drop(true)
        .spawn()
        .map_err(TunnelError::Spawn)
}
