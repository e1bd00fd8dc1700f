//! Tunnel provider integration for the uplift supervisor.
//!
//! Covers everything between "we have a service on a local port" and "there is
//! a tunnel subprocess writing to a log sink": credential-based provider
//! selection, provider binary resolution, subprocess launch, and public-URL
//! scanning of the tunnel's log output.

pub mod binary;
pub mod credentials;
pub mod error;
pub mod launch;
pub mod scan;

pub use binary::{ensure_binary, BinarySpec};
pub use credentials::{Credentials, Provider};
pub use error::TunnelError;
pub use launch::{launch, LaunchOptions, TunnelHandle};
pub use scan::{scan_log_for_url, UrlMatcher, QUICK_URL_SUFFIX};
