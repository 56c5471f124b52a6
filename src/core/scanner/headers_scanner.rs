// src/core/scanner/headers_scanner.rs

use tracing::{debug, info, warn};
use crate::core::http::send_timed;
use crate::core::knowledge_base::class_profile;
use crate::core::models::{VulnerabilityClass, WebVulnerabilityFinding};
use reqwest::header::HeaderMap;
use reqwest::Client;

/// Headers every response should carry. HSTS only applies to HTTPS targets.
const EXPECTED_HEADERS: &[&str] = &["X-Frame-Options", "X-Content-Type-Options", "X-XSS-Protection"];
const HSTS: &str = "Strict-Transport-Security";

/// Checks for the presence of a specific HTTP header in a `HeaderMap`.
///
/// Returns the header value, or a placeholder when the value is not valid
/// UTF-8. `None` means the header is absent.
fn check_header(headers: &HeaderMap, name: &str) -> Option<String> {
    debug!(header_name = name, "Checking for header.");
    let value = headers.get(name)?;
    match value.to_str() {
        Ok(s) => {
            debug!(header_name = name, value = s, "Header found.");
            Some(s.to_string())
        }
        Err(_) => {
            warn!(header_name = name, "Header found but contained invalid UTF-8.");
            Some("[Invalid UTF-8]".to_string())
        }
    }
}

/// Names of the expected security headers missing from `headers`.
pub fn missing_security_headers(headers: &HeaderMap, https: bool) -> Vec<&'static str> {
    let mut missing: Vec<&'static str> = EXPECTED_HEADERS
        .iter()
        .copied()
        .filter(|name| check_header(headers, name).is_none())
        .collect();
    if https && check_header(headers, HSTS).is_none() {
        missing.push(HSTS);
    }
    missing
}

/// Fetches the base URL and reports missing security headers as one finding.
/// An unreachable target yields no finding.
pub async fn run_headers_scan(client: &Client, base_url: &str) -> Option<WebVulnerabilityFinding> {
    info!(base_url, "Starting headers scan.");

    let response = match send_timed(client.get(base_url)).await {
        Ok(response) => response,
        Err(e) => {
            debug!(base_url, error = %e, "Headers request failed.");
            return None;
        }
    };

    let https = base_url.starts_with("https");
    let missing = missing_security_headers(&response.headers, https);
    info!(missing = missing.len(), "Headers scan finished.");
    if missing.is_empty() {
        return None;
    }

    let profile = class_profile(VulnerabilityClass::SecurityHeaders);
    Some(WebVulnerabilityFinding {
        name: profile.name.to_string(),
        class: VulnerabilityClass::SecurityHeaders,
        severity: profile.severity,
        cvss: profile.cvss,
        description: format!("The following security headers are missing: {}", missing.join(", ")),
        payload: String::new(),
        vulnerable: true,
        evidence: Some(missing.join(", ")),
        target_url: base_url.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScanConfig;
    use crate::core::http::build_client;
    use crate::core::test_support::{base_url, spawn_stub, StubResponse};
    use reqwest::header::HeaderValue;

    #[test]
    fn hsts_is_only_expected_over_https() {
        let mut headers = HeaderMap::new();
        headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
        headers.insert("x-content-type-options", HeaderValue::from_static("nosniff"));
        headers.insert("x-xss-protection", HeaderValue::from_static("1; mode=block"));
        assert!(missing_security_headers(&headers, false).is_empty());
        assert_eq!(missing_security_headers(&headers, true), vec![HSTS]);
    }

    #[tokio::test]
    async fn bare_response_produces_a_headers_finding() {
        let addr = spawn_stub(|_| StubResponse::ok("<html></html>").with_header("X-Frame-Options", "DENY")).await;
        let client = build_client(&ScanConfig::default()).unwrap();

        let finding = run_headers_scan(&client, &base_url(addr)).await.unwrap();
        assert_eq!(finding.class, VulnerabilityClass::SecurityHeaders);
        assert_eq!(finding.evidence.as_deref(), Some("X-Content-Type-Options, X-XSS-Protection"));
        assert!(finding.vulnerable);
    }

    #[tokio::test]
    async fn unreachable_target_yields_nothing() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = build_client(&ScanConfig::default()).unwrap();
        assert!(run_headers_scan(&client, &base_url(addr)).await.is_none());
    }
}
