//! One supervised run, from service start to lifetime-ceiling exit.
//!
//! Ordering guarantees: service start strictly precedes tunnel start, tunnel
//! start strictly precedes URL resolution, URL resolution precedes the hold.
//! Soft failures (readiness timeout, unresolved URL) change log lines and
//! report fields only; the run always reaches the hold unless a fatal step
//! fails first.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use uplift_tunnel::{
    ensure_binary, launch, scan_log_for_url, LaunchOptions, Provider, TunnelHandle, UrlMatcher,
};

use crate::config::RunConfig;
use crate::error::SupervisorError;
use crate::lock::RunLock;
use crate::probe::{wait_ready, Readiness};
use crate::retry::poll_until;
use crate::service::ServiceProcess;

/// Terminal summary of a run, emitted once at exit.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub provider: Provider,
    /// Whether the service answered within the readiness budget.
    pub ready: bool,
    /// Resolved public URL; `None` when discovery timed out (soft failure).
    pub public_url: Option<String>,
    pub held_seconds: u64,
}

pub struct Run {
    config: RunConfig,
}

impl Run {
    pub fn new(config: RunConfig) -> Result<Self, SupervisorError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Execute the whole lifecycle and return the terminal report.
    pub async fn execute(&self) -> Result<RunReport, SupervisorError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let lifetime = self.config.lifetime()?;

        let _lock = RunLock::acquire(&self.config.lock_path)?;
        info!(%run_id, "run admitted");

        let _service = ServiceProcess::spawn(&self.config.service_command)?;

        let readiness = wait_ready(&self.config.liveness_url(), self.config.probe).await;
        match readiness {
            Readiness::Ready => info!("service is ready on port {}", self.config.port),
            Readiness::TimedOut => warn!(
                "service did not answer within the readiness budget; continuing anyway"
            ),
        }

        let provider = self.config.credentials.provider();
        info!(%provider, "tunnel provider selected");

        let binary_spec = match provider {
            Provider::Stable => &self.config.stable_binary,
            Provider::Quick => &self.config.quick_binary,
        };
        let binary = ensure_binary(binary_spec, &self.config.cache_dir).await?;

        let opts = LaunchOptions {
            local_port: self.config.port,
            credentials: self.config.credentials.clone(),
            log_path: std::env::temp_dir().join(format!("uplift-tunnel-{run_id}.log")),
            settle: self.config.settle,
        };
        let tunnel = launch(&binary, &opts).await?;

        let public_url = self.resolve_url(&tunnel).await;
        match &public_url {
            Some(url) => info!("public URL: {url}"),
            None => warn!("public URL could not be determined; the tunnel may still be up"),
        }

        lifetime.hold().await;
        info!("time's up, run complete");

        Ok(RunReport {
            run_id,
            started_at,
            provider,
            ready: readiness == Readiness::Ready,
            public_url,
            held_seconds: lifetime.hold_duration().as_secs(),
        })
    }

    /// Stable path: precomputed, zero scan attempts. Quick path: poll the log
    /// sink through the scan budget. `None` is the soft-failure outcome.
    async fn resolve_url(&self, tunnel: &TunnelHandle) -> Option<String> {
        if let Some(url) = tunnel.public_url() {
            return Some(url.to_string());
        }

        let matcher = match UrlMatcher::for_suffix(&self.config.quick_url_suffix) {
            Ok(matcher) => matcher,
            Err(e) => {
                warn!(error = %e, "cannot scan for the public URL");
                return None;
            }
        };

        let log_path = tunnel.log_path().to_path_buf();
        poll_until(self.config.scan, |attempt| {
            let log_path = log_path.clone();
            let matcher = matcher.clone();
            async move {
                let found = scan_log_for_url(&log_path, &matcher).await;
                if found.is_none() {
                    tracing::debug!(attempt, "public URL not in the tunnel log yet");
                }
                found
            }
        })
        .await
    }
}
