// src/core/scanner/fingerprint_scanner.rs

use tracing::{debug, info, warn};
use crate::config::ScanConfig;
use crate::core::error::ScanError;
use crate::core::http::send_timed;
use crate::core::models::OpenPort;
use crate::core::scanner::ssl_scanner::inspect_tls;
use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use std::collections::BTreeMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

/// How a port is fingerprinted, decided purely by its number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// HTTP GET and `Server` header parse.
    Web { https: bool },
    /// TLS handshake and certificate inspection.
    Tls,
    /// Name only, plus a greeting read for protocols where the server speaks first.
    Named { name: &'static str, greeting: bool },
    Unknown,
}

/// The port decision table.
pub fn classify_port(port: u16) -> Probe {
    match port {
        80 | 8080 | 8000 => Probe::Web { https: false },
        8443 => Probe::Web { https: true },
        443 => Probe::Tls,
        21 => Probe::Named { name: "ftp", greeting: true },
        22 => Probe::Named { name: "ssh", greeting: true },
        23 => Probe::Named { name: "telnet", greeting: false },
        25 => Probe::Named { name: "smtp", greeting: true },
        3306 => Probe::Named { name: "mysql", greeting: true },
        3389 => Probe::Named { name: "rdp", greeting: false },
        5432 => Probe::Named { name: "postgresql", greeting: false },
        _ => Probe::Unknown,
    }
}

/// A rule that maps a `Server` header to a service name.
struct ServerRule<'a> {
    service: &'a str,
    pattern: &'a Lazy<Regex>,
}

// Each pattern matches the product name and captures an optional version.
static RE_APACHE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bapache(?:/([\d.]+))?").unwrap());
static RE_NGINX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bnginx(?:/([\d.]+))?").unwrap());
static RE_IIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(?:microsoft-)?iis(?:/([\d.]+))?").unwrap());

static SERVER_RULES: &[ServerRule] = &[
    ServerRule { service: "apache", pattern: &RE_APACHE },
    ServerRule { service: "nginx", pattern: &RE_NGINX },
    ServerRule { service: "iis", pattern: &RE_IIS },
];

static RE_OPENSSH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^SSH-[\d.]+-OpenSSH_([\d.]+)").unwrap());
static RE_VERSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+\.\d+(?:\.\d+)*)").unwrap());

/// A helper that applies a regex to an optional string slice.
///
/// Returns `None` when the pattern does not match, `Some(None)` when it matched
/// without a version, and `Some(Some(version))` when a version was captured.
fn check_with_regex(text_option: Option<&str>, re: &Regex) -> Option<Option<String>> {
    text_option.and_then(|text| {
        re.captures(text).map(|caps| {
            caps.get(1)
                .map(|m| m.as_str().trim_end_matches('.').to_string())
                .filter(|s| !s.is_empty())
        })
    })
}

/// Maps a `Server` header to `(service, version)`. Unrecognized products stay `http`.
pub fn parse_server_header(server: &str) -> (String, String) {
    for rule in SERVER_RULES {
        if let Some(version) = check_with_regex(Some(server), rule.pattern) {
            debug!(service = rule.service, version = ?version, "Server header rule matched.");
            return (
                rule.service.to_string(),
                version.unwrap_or_else(|| "unknown".to_string()),
            );
        }
    }
    ("http".to_string(), "unknown".to_string())
}

/// Product identification from a web server's response headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebFingerprint {
    pub service: String,
    pub version: String,
    /// Raw `Server` header, or "unknown" when absent.
    pub server: String,
}

/// Fetches `/` from a web port and classifies the server from its headers.
pub async fn fingerprint_web(client: &Client, url: &str) -> Result<WebFingerprint, ScanError> {
    let response = send_timed(client.get(url)).await?;
    info!(url, status = %response.status, "Received HTTP response for fingerprint.");

    let server = response
        .headers
        .get("server")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();
    let (service, version) = parse_server_header(&server);

    Ok(WebFingerprint { service, version, server })
}

/// Interprets the first bytes a server sends after connect.
///
/// Returns the refined `(service, version, banner)` for `default_name`.
pub fn parse_greeting(default_name: &str, raw: &[u8]) -> (String, String, String) {
    if default_name == "mysql" {
        return parse_mysql_handshake(raw);
    }

    let text = String::from_utf8_lossy(raw);
    let banner = text.lines().next().unwrap_or_default().trim().to_string();

    if let Some(caps) = RE_OPENSSH.captures(&banner) {
        return ("openssh".to_string(), caps[1].to_string(), banner);
    }

    let version = check_with_regex(Some(&banner), &RE_VERSION)
        .flatten()
        .unwrap_or_else(|| "unknown".to_string());
    (default_name.to_string(), version, banner)
}

/// MySQL speaks first with a handshake packet: 3-byte length, sequence id,
/// protocol version (10), then a NUL-terminated server version string.
fn parse_mysql_handshake(raw: &[u8]) -> (String, String, String) {
    let unknown = || ("mysql".to_string(), "unknown".to_string(), String::new());
    if raw.len() < 6 {
        return unknown();
    }
    let payload = &raw[4..];
    match payload[0] {
        0x0a => {
            let end = payload[1..].iter().position(|b| *b == 0).map_or(payload.len(), |i| i + 1);
            let server_version = String::from_utf8_lossy(&payload[1..end]).to_string();
            let version = check_with_regex(Some(&server_version), &RE_VERSION)
                .flatten()
                .unwrap_or_else(|| "unknown".to_string());
            ("mysql".to_string(), version, format!("MySQL {}", server_version))
        }
        0xff => {
            // Error packet: 2-byte code, then a human-readable message.
            let message = payload.get(3..).map(String::from_utf8_lossy).unwrap_or_default();
            ("mysql".to_string(), "unknown".to_string(), message.trim().to_string())
        }
        _ => unknown(),
    }
}

/// Connects and reads whatever the server volunteers within `deadline`.
pub async fn grab_greeting(addr: SocketAddr, deadline: Duration) -> Result<Vec<u8>, ScanError> {
    timeout(deadline, async {
        let mut stream = TcpStream::connect(addr)
            .await
            .map_err(|e| ScanError::Connect { addr: addr.to_string(), reason: e.to_string() })?;
        let mut buf = vec![0u8; 512];
        let n = stream
            .read(&mut buf)
            .await
            .map_err(|e| ScanError::Protocol(format!("greeting read failed: {}", e)))?;
        buf.truncate(n);
        Ok::<_, ScanError>(buf)
    })
    .await
    .map_err(|_| ScanError::Timeout(format!("greeting from {}", addr)))?
}

/// Fingerprints a single open port. Never fails: errors end up in `banner`.
pub async fn fingerprint_port(
    client: &Client,
    ip: Ipv4Addr,
    hostname: &str,
    port: u16,
    config: &ScanConfig,
) -> OpenPort {
    let addr = SocketAddr::from((ip, port));
    let mut open = OpenPort::unidentified(port);

    match classify_port(port) {
        Probe::Web { https } => {
            let scheme = if https { "https" } else { "http" };
            let url = format!("{}://{}:{}/", scheme, ip, port);
            match fingerprint_web(client, &url).await {
                Ok(found) => {
                    open.service = found.service;
                    open.version = found.version;
                    open.banner = found.server;
                }
                Err(e) => {
                    warn!(port, error = %e, "Web fingerprint failed.");
                    open.service = "http".to_string();
                    open.banner = e.to_string();
                }
            }
        }
        Probe::Tls => {
            open.service = "https".to_string();
            match inspect_tls(addr, hostname, config.banner_timeout()).await {
                Ok(info) => {
                    open.version = info.protocol.to_string();
                    open.banner = info.banner();
                }
                Err(e) => {
                    warn!(port, error = %e, "TLS fingerprint failed.");
                    open.banner = e.to_string();
                }
            }
        }
        Probe::Named { name, greeting } => {
            open.service = name.to_string();
            if greeting {
                match grab_greeting(addr, config.banner_timeout()).await {
                    Ok(raw) if !raw.is_empty() => {
                        let (service, version, banner) = parse_greeting(name, &raw);
                        open.service = service;
                        open.version = version;
                        open.banner = banner;
                    }
                    Ok(_) => debug!(port, "Server sent no greeting."),
                    Err(e) => {
                        debug!(port, error = %e, "Greeting read failed.");
                        open.banner = e.to_string();
                    }
                }
            }
        }
        Probe::Unknown => debug!(port, "No fingerprint rule for port."),
    }

    open
}

/// Fingerprints every open port concurrently. Ports whose fingerprint is
/// cancelled keep their unidentified record.
pub async fn run_fingerprint_scan(
    client: &Client,
    ip: Ipv4Addr,
    hostname: &str,
    open_ports: &[u16],
    config: &ScanConfig,
    cancel: &CancellationToken,
) -> BTreeMap<u16, OpenPort> {
    info!(%ip, count = open_ports.len(), "Starting fingerprint scan.");

    let results: Vec<OpenPort> = stream::iter(open_ports.iter().copied())
        .map(|port| async move {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(port, "Fingerprint cancelled.");
                    OpenPort::unidentified(port)
                }
                open = fingerprint_port(client, ip, hostname, port, config) => open,
            }
        })
        .buffer_unordered(config.port_concurrency.max(1))
        .collect()
        .await;

    info!(count = results.len(), "Fingerprint scan finished.");
    results.into_iter().map(|p| (p.port, p)).collect()
}
