//! Run configuration.
//!
//! Everything timing-related carries the defaults the scheduler contract is
//! built around: a 15 x 1s readiness budget, a 30 x 1s URL-discovery budget,
//! a 3s stable-provider settle delay, and a 5h55m hold under a 6h execution
//! ceiling.

use std::path::PathBuf;
use std::time::Duration;

use uplift_tunnel::{BinarySpec, Credentials, QUICK_URL_SUFFIX};

use crate::error::SupervisorError;
use crate::lifetime::Lifetime;
use crate::retry::RetryPlan;

/// Default local port the service listens on.
pub const DEFAULT_PORT: u16 = 8080;
/// Default readiness budget.
pub const DEFAULT_PROBE: RetryPlan = RetryPlan::new(15, Duration::from_secs(1));
/// Default URL-discovery budget.
pub const DEFAULT_SCAN: RetryPlan = RetryPlan::new(30, Duration::from_secs(1));
/// Default stable-provider settle delay.
pub const DEFAULT_SETTLE: Duration = Duration::from_secs(3);
/// Default hold: 5h55m.
pub const DEFAULT_HOLD: Duration = Duration::from_secs(21_300);
/// Default enclosing execution ceiling: 6h.
pub const DEFAULT_CEILING: Duration = Duration::from_secs(21_600);
/// Default teardown margin kept free under the ceiling.
pub const DEFAULT_MARGIN: Duration = Duration::from_secs(60);

/// Binary name of the stable provider CLI.
pub const STABLE_BINARY: &str = "ngrok";
/// Binary name of the quick provider CLI.
pub const QUICK_BINARY: &str = "cloudflared";
/// The quick provider ships as a single static executable, so it can be
/// fetched at runtime when absent. The stable provider ships as an archive
/// and has no default URL; it must be preinstalled or pointed at explicitly.
pub const QUICK_DOWNLOAD_URL: &str =
    "https://github.com/cloudflare/cloudflared/releases/latest/download/cloudflared-linux-amd64";

/// Full configuration for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Service command: program followed by its arguments.
    pub service_command: Vec<String>,
    /// Local port the service listens on.
    pub port: u16,
    /// Readiness poll budget.
    pub probe: RetryPlan,
    /// URL-discovery poll budget (quick path only).
    pub scan: RetryPlan,
    /// Stable-provider settle delay.
    pub settle: Duration,
    /// Lifetime hold duration.
    pub hold: Duration,
    /// Enclosing execution ceiling.
    pub ceiling: Duration,
    /// Teardown margin kept below the ceiling.
    pub margin: Duration,
    /// Tunnel credentials (token + reserved domain), possibly partial.
    pub credentials: Credentials,
    /// Domain suffix the quick provider assigns URLs under.
    pub quick_url_suffix: String,
    /// Stable provider binary resolution.
    pub stable_binary: BinarySpec,
    /// Quick provider binary resolution.
    pub quick_binary: BinarySpec,
    /// Lock file serializing runs on this host.
    pub lock_path: PathBuf,
    /// Cache directory for fetched provider binaries.
    pub cache_dir: PathBuf,
}

impl RunConfig {
    /// Configuration with default timings for a service command, tunnel
    /// selection driven by `credentials`.
    pub fn new(service_command: Vec<String>, credentials: Credentials) -> Self {
        Self {
            service_command,
            port: DEFAULT_PORT,
            probe: DEFAULT_PROBE,
            scan: DEFAULT_SCAN,
            settle: DEFAULT_SETTLE,
            hold: DEFAULT_HOLD,
            ceiling: DEFAULT_CEILING,
            margin: DEFAULT_MARGIN,
            credentials,
            quick_url_suffix: QUICK_URL_SUFFIX.to_string(),
            stable_binary: BinarySpec::new(STABLE_BINARY),
            quick_binary: BinarySpec::new(QUICK_BINARY)
                .with_download_url(Some(QUICK_DOWNLOAD_URL.to_string())),
            lock_path: std::env::temp_dir().join("uplift.lock"),
            cache_dir: std::env::temp_dir().join("uplift-bin"),
        }
    }

    /// Liveness endpoint: a plain request at the root path.
    pub fn liveness_url(&self) -> String {
        format!("http://127.0.0.1:{}/", self.port)
    }

    /// Build the validated lifetime controller for this config.
    pub fn lifetime(&self) -> Result<Lifetime, SupervisorError> {
        Lifetime::new(self.hold, self.ceiling, self.margin)
    }

    pub fn validate(&self) -> Result<(), SupervisorError> {
        if self.service_command.is_empty() {
            return Err(SupervisorError::Config {
                reason: "service command is empty".to_string(),
            });
        }
        if self.probe.attempts == 0 {
            return Err(SupervisorError::Config {
                reason: "readiness poll budget must allow at least one attempt".to_string(),
            });
        }
        if self.scan.attempts == 0 {
            return Err(SupervisorError::Config {
                reason: "URL discovery budget must allow at least one attempt".to_string(),
            });
        }
        if self.quick_url_suffix.is_empty()
            || !self
                .quick_url_suffix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
        {
            return Err(SupervisorError::Config {
                reason: format!(
                    "quick-tunnel domain suffix '{}' is not a plain domain",
                    self.quick_url_suffix
                ),
            });
        }
        self.lifetime().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> RunConfig {
        RunConfig::new(
            vec!["python3".to_string(), "server.py".to_string()],
            Credentials::default(),
        )
    }

    #[test]
    fn defaults_are_valid() {
        base_config().validate().unwrap();
    }

    #[test]
    fn default_hold_leaves_margin_under_ceiling() {
        let config = base_config();
        assert!(config.hold + config.margin < config.ceiling);
    }

    #[test]
    fn empty_service_command_is_rejected() {
        let mut config = base_config();
        config.service_command.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_attempt_budgets_are_rejected() {
        let mut config = base_config();
        config.probe.attempts = 0;
        assert!(config.validate().is_err());

        let mut config = base_config();
        config.scan.attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn suffix_must_be_a_plain_domain() {
        let mut config = base_config();
        config.quick_url_suffix = "try(cloudflare".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn liveness_endpoint_is_the_root_path() {
        let config = base_config();
        assert_eq!(config.liveness_url(), "http://127.0.0.1:8080/");
    }
}
