// src/core/http.rs

//! The one HTTP client shape used by every web-facing component, plus a
//! helper that captures status, headers, body and latency in one go.

use crate::config::ScanConfig;
use crate::core::error::ScanError;
use reqwest::header::HeaderMap;
use reqwest::{Client, RequestBuilder, StatusCode};
use std::time::{Duration, Instant};
use tracing::debug;

/// Body cap for callers without a `ScanConfig` at hand.
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// A read response together with how long it took.
#[derive(Debug, Clone)]
pub struct TimedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
    pub latency: Duration,
    /// The server sent more than the body cap; `body` holds only the prefix.
    pub truncated: bool,
}

/// Builds the shared client. Certificates are not verified: the scanner
/// inspects servers, it does not trust them.
pub fn build_client(config: &ScanConfig) -> Result<Client, ScanError> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.http_timeout())
        .connect_timeout(config.connect_timeout().max(Duration::from_secs(3)))
        .danger_accept_invalid_certs(true)
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| ScanError::Configuration(format!("failed to build HTTP client: {}", e)))
}

/// `send_limited` with [`DEFAULT_MAX_BODY_BYTES`].
pub async fn send_timed(request: RequestBuilder) -> Result<TimedResponse, ScanError> {
    send_limited(request, DEFAULT_MAX_BODY_BYTES).await
}

/// Sends `request` and reads at most `max_body_bytes` of the body, dropping
/// the connection once the cap is hit. Latency covers the whole exchange.
pub async fn send_limited(
    request: RequestBuilder,
    max_body_bytes: usize,
) -> Result<TimedResponse, ScanError> {
    let started = Instant::now();
    let mut response = request.send().await?;
    let status = response.status();
    let headers = response.headers().clone();

    let mut raw = Vec::new();
    let mut truncated = false;
    while let Some(chunk) = response.chunk().await? {
        let room = max_body_bytes.saturating_sub(raw.len());
        if chunk.len() > room {
            raw.extend_from_slice(&chunk[..room]);
            truncated = true;
            break;
        }
        raw.extend_from_slice(&chunk);
    }
    let body = String::from_utf8_lossy(&raw).into_owned();
    let latency = started.elapsed();

    if truncated {
        debug!(%status, cap = max_body_bytes, "Response body truncated.");
    }
    debug!(%status, bytes = body.len(), latency_ms = latency.as_millis() as u64, "HTTP exchange complete.");
    Ok(TimedResponse {
        status,
        headers,
        body,
        latency,
        truncated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::{base_url, spawn_stub, StubResponse};

    #[tokio::test]
    async fn oversized_bodies_are_cut_at_the_cap() {
        let addr = spawn_stub(|_| StubResponse::ok("x".repeat(64 * 1024))).await;
        let client = Client::new();

        let response = send_limited(client.get(base_url(addr)), 1_000).await.unwrap();
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body.len(), 1_000);
        assert!(response.truncated);
    }

    #[tokio::test]
    async fn bodies_under_the_cap_are_read_whole() {
        let addr = spawn_stub(|_| StubResponse::ok("hello")).await;
        let response = send_timed(Client::new().get(base_url(addr))).await.unwrap();
        assert_eq!(response.body, "hello");
        assert!(!response.truncated);
    }
}
