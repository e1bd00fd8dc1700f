//! Bounded-duration supervisor for a local service exposed through a tunnel.
//!
//! One [`Run`] starts the service process, waits for it to answer, launches
//! the tunnel provider picked from the available credentials, resolves the
//! public URL, then holds everything alive until a fixed lifetime ceiling and
//! exits so the external scheduler can start the next run.
//!
//! The scheduler owns the real concurrency contract (one run at a time, no
//! overlap); [`lock::RunLock`] is the local safety net for it.

pub mod config;
pub mod error;
pub mod lifetime;
pub mod lock;
pub mod probe;
pub mod retry;
pub mod run;
pub mod service;

pub use config::RunConfig;
pub use error::SupervisorError;
pub use lifetime::Lifetime;
pub use lock::RunLock;
pub use probe::{wait_ready, Readiness};
pub use retry::{poll_until, RetryPlan};
pub use run::{Run, RunReport};
pub use service::ServiceProcess;
