//! Uplift - bounded-duration tunnel supervisor
//!
//! Starts a local service, exposes it through a tunnel provider, reports the
//! public URL, and holds the assembly alive until a fixed ceiling so an
//! external scheduler can restart it.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use uplift_supervisor::{config, Run, RunConfig, RetryPlan};
use uplift_tunnel::Credentials;

/// Uplift - keep a local service publicly reachable for one bounded run
#[derive(Parser, Debug)]
#[command(name = "uplift")]
#[command(about = "Expose a local service through a tunnel for a bounded lifetime")]
#[command(version = env!("GIT_TAG"))]
#[command(long_version = concat!(env!("GIT_TAG"), "\nCommit: ", env!("GIT_HASH"), "\nBuilt: ", env!("BUILD_TIME")))]
#[command(long_about = r#"
Uplift runs one supervised lifecycle: start the service command, wait for it
to answer on the local port, launch a tunnel provider, announce the public
URL, then hold everything alive until the lifetime ceiling and exit cleanly.

The stable provider is used when both an auth token and a reserved domain are
configured; anything less silently falls back to the anonymous quick
provider.

EXAMPLES:
  # Quick tunnel, default timings
  uplift -- python3 server.py

  # Stable tunnel on a reserved domain
  TUNNEL_AUTH_TOKEN=... TUNNEL_DOMAIN=demo.example.com \
    uplift --port 8080 -- python3 server.py

ENVIRONMENT VARIABLES:
  TUNNEL_AUTH_TOKEN   Stable provider auth token
  TUNNEL_DOMAIN       Reserved public domain for the stable provider
"#)]
struct Cli {
    /// Local port the service listens on
    #[arg(short, long, default_value_t = config::DEFAULT_PORT)]
    port: u16,

    /// Stable provider auth token
    #[arg(long, env = "TUNNEL_AUTH_TOKEN")]
    token: Option<String>,

    /// Reserved public domain for the stable provider
    #[arg(long, env = "TUNNEL_DOMAIN")]
    domain: Option<String>,

    /// Readiness poll attempts
    #[arg(long, default_value_t = 15)]
    probe_attempts: u32,

    /// Seconds between readiness polls
    #[arg(long, default_value_t = 1)]
    probe_interval: u64,

    /// URL discovery poll attempts (quick provider)
    #[arg(long, default_value_t = 30)]
    scan_attempts: u32,

    /// Seconds between URL discovery polls
    #[arg(long, default_value_t = 1)]
    scan_interval: u64,

    /// Stable provider settle delay in seconds
    #[arg(long, default_value_t = 3)]
    settle: u64,

    /// Lifetime hold in seconds
    #[arg(long, default_value_t = 21_300)]
    hold: u64,

    /// Enclosing execution ceiling in seconds
    #[arg(long, default_value_t = 21_600)]
    ceiling: u64,

    /// Domain suffix the quick provider assigns URLs under
    #[arg(long, default_value = uplift_tunnel::QUICK_URL_SUFFIX)]
    quick_url_suffix: String,

    /// Explicit path to the stable provider binary
    #[arg(long)]
    stable_binary: Option<PathBuf>,

    /// Explicit path to the quick provider binary
    #[arg(long)]
    quick_binary: Option<PathBuf>,

    /// Lock file serializing runs on this host
    #[arg(long)]
    lock_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Service command to supervise (after `--`)
    #[arg(last = true, required = true)]
    service_command: Vec<String>,
}

/// Setup logging with the specified log level
fn setup_logging(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(log_level)
        .with_context(|| format!("Invalid log level: {}", log_level))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(filter)
        .init();

    Ok(())
}

impl Cli {
    fn into_config(self) -> RunConfig {
        let credentials = Credentials::new(self.token, self.domain);
        let mut cfg = RunConfig::new(self.service_command, credentials);

        cfg.port = self.port;
        cfg.probe = RetryPlan::new(self.probe_attempts, Duration::from_secs(self.probe_interval));
        cfg.scan = RetryPlan::new(self.scan_attempts, Duration::from_secs(self.scan_interval));
        cfg.settle = Duration::from_secs(self.settle);
        cfg.hold = Duration::from_secs(self.hold);
        cfg.ceiling = Duration::from_secs(self.ceiling);
        cfg.quick_url_suffix = self.quick_url_suffix;
        cfg.stable_binary = cfg.stable_binary.clone().with_override(self.stable_binary);
        cfg.quick_binary = cfg.quick_binary.clone().with_override(self.quick_binary);
        if let Some(lock) = self.lock_file {
            cfg.lock_path = lock;
        }
        if let Some(home) = dirs::home_dir() {
            cfg.cache_dir = home.join(".uplift").join("bin");
        }

        cfg
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.log_level)?;
    info!(version = env!("GIT_TAG"), "uplift starting");

    let config = cli.into_config();
    let run = Run::new(config).context("run configuration rejected")?;
    let report = run.execute().await.context("run aborted")?;

    // Machine-readable summary next to the human-readable status lines.
    println!("{}", serde_json::to_string(&report)?);
    Ok(())
}
