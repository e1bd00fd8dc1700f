//! Service readiness probing.
//!
//! Readiness is best-effort, not a hard gate: the run proceeds to the tunnel
//! phase even after a timeout, it just says so in the log.

use std::time::Duration;

use tracing::{debug, warn};

use crate::retry::{poll_until, RetryPlan};

/// Outcome of the readiness phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// The service answered the liveness check at least once.
    Ready,
    /// The poll budget ran out without a single answer.
    TimedOut,
}

/// Per-attempt cap on how long one probe request may hang.
const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(2);

/// Poll `GET {url}` until the service answers or the plan is spent. Any HTTP
/// response counts as alive, whatever the status code.
///
/// The whole wait is capped at the plan's budget (attempts x interval), so a
/// service that accepts connections but never answers cannot stretch it past
/// the bound; per-attempt request time comes out of the same budget.
pub async fn wait_ready(url: &str, plan: RetryPlan) -> Readiness {
    let client = match reqwest::Client::builder().timeout(ATTEMPT_TIMEOUT).build() {
        Ok(client) => client,
        Err(e) => {
            warn!(error = %e, "could not build probe client, treating service as not ready");
            return Readiness::TimedOut;
        }
    };

    let poll = poll_until(plan, |attempt| {
        let client = client.clone();
        let url = url.to_string();
        async move {
            match client.get(&url).send().await {
                Ok(response) => {
                    debug!(attempt, status = %response.status(), "service answered");
                    Some(())
                }
                Err(e) => {
                    debug!(attempt, error = %e, "service not ready yet");
                    None
                }
            }
        }
    });

    match tokio::time::timeout(plan.budget(), poll).await {
        Ok(Some(())) => Readiness::Ready,
        Ok(None) => Readiness::TimedOut,
        Err(_) => {
            debug!("readiness budget ran out mid-attempt");
            Readiness::TimedOut
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Minimal HTTP responder, answering every request with 200 OK.
    async fn start_http_server() -> (SocketAddr, tokio::task::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 1024];
                    if socket.read(&mut buf).await.is_ok() {
                        let response = "HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nok";
                        let _ = socket.write_all(response.as_bytes()).await;
                    }
                });
            }
        });

        (addr, handle)
    }

    #[tokio::test]
    async fn live_service_reports_ready() {
        let (addr, server) = start_http_server().await;
        let url = format!("http://{addr}/");

        let readiness = wait_ready(&url, RetryPlan::new(5, Duration::from_millis(100))).await;
        assert_eq!(readiness, Readiness::Ready);

        server.abort();
    }

    /// Accepts connections and then goes silent, never writing a response.
    async fn start_hanging_server() -> (SocketAddr, tokio::task::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        (addr, handle)
    }

    #[tokio::test]
    async fn closed_port_times_out_within_budget() {
        // Bind then drop to get a port nothing is listening on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let plan = RetryPlan::new(3, Duration::from_millis(50));
        let start = std::time::Instant::now();
        let readiness = wait_ready(&format!("http://{addr}/"), plan).await;

        assert_eq!(readiness, Readiness::TimedOut);
        assert!(start.elapsed() < plan.budget() + Duration::from_millis(500));
    }

    #[tokio::test]
    async fn hanging_service_cannot_stretch_the_budget() {
        let (addr, server) = start_hanging_server().await;

        let plan = RetryPlan::new(3, Duration::from_millis(100));
        let start = std::time::Instant::now();
        let readiness = wait_ready(&format!("http://{addr}/"), plan).await;

        assert_eq!(readiness, Readiness::TimedOut);
        assert!(start.elapsed() < plan.budget() + Duration::from_millis(500));

        server.abort();
    }
}
