// src/core/scanner/ssl_scanner.rs

use tracing::{debug, error, info};

use crate::config::ScanConfig;
use crate::core::error::ScanError;
use crate::core::knowledge_base::class_profile;
use crate::core::models::{VulnerabilityClass, WebVulnerabilityFinding};
use chrono::{DateTime, Utc};
use native_tls::{Protocol, TlsConnector, TlsStream};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;
use tokio::task::spawn_blocking;
use url::Url;
use x509_parser::prelude::*;

/// Protocol bands reported for a TLS endpoint. native-tls cannot expose the
/// exact negotiated version, so the handshake is retried with bounded
/// protocol ranges and the highest band that succeeds is reported.
pub const PROTOCOL_MODERN: &str = "TLSv1.2+";
pub const PROTOCOL_TLS11: &str = "TLSv1.1";
pub const PROTOCOL_TLS10: &str = "TLSv1";

/// Details extracted from the server certificate.
#[derive(Debug, Clone)]
pub struct CertificateInfo {
    pub subject_name: String,
    pub issuer_name: String,
    pub not_after: DateTime<Utc>,
    pub days_until_expiry: i64,
}

/// What a TLS handshake revealed about an endpoint.
#[derive(Debug, Clone)]
pub struct TlsInfo {
    pub protocol: &'static str,
    pub certificate: Option<CertificateInfo>,
}

impl TlsInfo {
    pub fn is_legacy(&self) -> bool {
        self.protocol == PROTOCOL_TLS10 || self.protocol == PROTOCOL_TLS11
    }

    /// One-line banner for the open-port record.
    pub fn banner(&self) -> String {
        match &self.certificate {
            Some(cert) => format!(
                "SSL Certificate: {} (issuer: {}, expires in {} days)",
                cert.subject_name, cert.issuer_name, cert.days_until_expiry
            ),
            None => "SSL Certificate: none presented".to_string(),
        }
    }
}

/// Performs the TLS inspection on a blocking thread.
///
/// `server_name` is sent as SNI. Certificates and hostnames are not verified
/// because the goal is to read them, not to trust them.
pub async fn inspect_tls(
    addr: SocketAddr,
    server_name: &str,
    deadline: Duration,
) -> Result<TlsInfo, ScanError> {
    info!(%addr, server_name, "Starting TLS inspection.");
    let server_name = server_name.to_string();

    debug!("Spawning blocking task for TLS connection.");
    spawn_blocking(move || perform_tls_inspection(addr, &server_name, deadline))
        .await
        .unwrap_or_else(|e| {
            error!(panic = %e, "Blocking TLS task panicked!");
            Err(ScanError::Protocol(format!("TLS task panicked: {}", e)))
        })
}

fn perform_tls_inspection(
    addr: SocketAddr,
    server_name: &str,
    deadline: Duration,
) -> Result<TlsInfo, ScanError> {
    let bands: [(&'static str, Option<Protocol>, Option<Protocol>); 3] = [
        (PROTOCOL_MODERN, Some(Protocol::Tlsv12), None),
        (PROTOCOL_TLS11, Some(Protocol::Tlsv11), Some(Protocol::Tlsv11)),
        (PROTOCOL_TLS10, Some(Protocol::Tlsv10), Some(Protocol::Tlsv10)),
    ];

    let mut first_error = None;
    for (label, min, max) in bands {
        match handshake(addr, server_name, min, max, deadline) {
            Ok(stream) => {
                info!(%addr, protocol = label, "TLS handshake succeeded.");
                return Ok(TlsInfo {
                    protocol: label,
                    certificate: read_certificate(&stream),
                });
            }
            Err(e) => {
                debug!(%addr, protocol = label, error = %e, "TLS handshake failed for band.");
                first_error.get_or_insert(e);
            }
        }
    }

    let error = first_error.unwrap_or_else(|| ScanError::Protocol("TLS handshake failed".to_string()));
    error!(%addr, error = %error, "No TLS protocol band accepted.");
    Err(error)
}

fn handshake(
    addr: SocketAddr,
    server_name: &str,
    min: Option<Protocol>,
    max: Option<Protocol>,
    deadline: Duration,
) -> Result<TlsStream<TcpStream>, ScanError> {
    let connector = TlsConnector::builder()
        .danger_accept_invalid_certs(true)
        .danger_accept_invalid_hostnames(true)
        .min_protocol_version(min)
        .max_protocol_version(max)
        .build()
        .map_err(|e| ScanError::Protocol(format!("TlsConnector error: {}", e)))?;

    debug!(%addr, "Connecting TCP stream.");
    let stream = TcpStream::connect_timeout(&addr, deadline).map_err(|e| {
        if e.kind() == std::io::ErrorKind::TimedOut {
            ScanError::Timeout(format!("TCP connect to {}", addr))
        } else {
            ScanError::Connect { addr: addr.to_string(), reason: e.to_string() }
        }
    })?;
    stream
        .set_read_timeout(Some(deadline))
        .and_then(|_| stream.set_write_timeout(Some(deadline)))
        .map_err(|e| ScanError::Connect { addr: addr.to_string(), reason: e.to_string() })?;

    debug!(%addr, server_name, "Performing TLS handshake.");
    connector
        .connect(server_name, stream)
        .map_err(|e| ScanError::Protocol(format!("TLS handshake error: {}", e)))
}

fn read_certificate(stream: &TlsStream<TcpStream>) -> Option<CertificateInfo> {
    let cert = match stream.peer_certificate() {
        Ok(Some(c)) => c,
        Ok(None) => {
            debug!("TLS connection successful, but no peer certificate provided.");
            return None;
        }
        Err(e) => {
            error!(error = %e, "Failed to retrieve peer certificate from stream");
            return None;
        }
    };

    let der = cert
        .to_der()
        .map_err(|e| error!(error = %e, "Failed to convert certificate to DER format"))
        .ok()?;
    let (_, x509) = parse_x509_certificate(&der)
        .map_err(|e| error!(error = %e, "Failed to parse X.509 certificate"))
        .ok()?;

    info!(subject = %x509.subject(), issuer = %x509.issuer(), "Successfully parsed certificate.");
    let not_after = asn1_time_to_chrono_utc(&x509.validity().not_after);
    Some(CertificateInfo {
        subject_name: x509.subject().to_string(),
        issuer_name: x509.issuer().to_string(),
        not_after,
        days_until_expiry: not_after.signed_duration_since(Utc::now()).num_days(),
    })
}

fn asn1_time_to_chrono_utc(time: &ASN1Time) -> DateTime<Utc> {
    DateTime::from_timestamp(time.timestamp(), 0).unwrap_or_default()
}

/// Reports the web target when it only speaks a deprecated TLS version.
/// Plain-HTTP targets and unreachable hosts yield no finding.
pub async fn run_legacy_tls_check(base_url: &str, config: &ScanConfig) -> Option<WebVulnerabilityFinding> {
    let url = Url::parse(base_url).ok()?;
    if url.scheme() != "https" {
        return None;
    }
    let host = url.host_str()?.to_string();
    let port = url.port_or_known_default().unwrap_or(443);

    let addr = match tokio::net::lookup_host((host.as_str(), port)).await {
        Ok(mut addrs) => addrs.next()?,
        Err(e) => {
            debug!(host = %host, error = %e, "Could not resolve host for TLS check.");
            return None;
        }
    };

    let info = match inspect_tls(addr, &host, config.banner_timeout()).await {
        Ok(info) => info,
        Err(e) => {
            debug!(host = %host, error = %e, "TLS check inconclusive.");
            return None;
        }
    };

    if !info.is_legacy() {
        return None;
    }

    let profile = class_profile(VulnerabilityClass::SslVulnerability);
    Some(WebVulnerabilityFinding {
        name: profile.name.to_string(),
        class: VulnerabilityClass::SslVulnerability,
        severity: profile.severity,
        cvss: profile.cvss,
        description: format!("The server negotiates {}, which has known protocol weaknesses.", info.protocol),
        payload: String::new(),
        vulnerable: true,
        evidence: Some(format!("negotiated {}", info.protocol)),
        target_url: base_url.to_string(),
    })
}
