// src/core/target.rs

use tracing::{debug, info, warn};

use crate::core::error::ScanError;
use crate::core::models::Target;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;
use std::net::{IpAddr, Ipv4Addr};
use url::Url;

/// Splits a raw user string into its target parts without touching the network.
///
/// Accepts a bare host, `host:port`, or a full `http(s)://` URL with path and
/// query. Empty input is a configuration error and is reported before any
/// network I/O happens.
pub fn normalize_target(raw: &str) -> Result<Target, ScanError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ScanError::Configuration("target must not be empty".to_string()));
    }

    let lower = trimmed.to_ascii_lowercase();
    let has_scheme = lower.starts_with("http://") || lower.starts_with("https://");
    let without_scheme = match trimmed.find("://") {
        Some(idx) if has_scheme => &trimmed[idx + 3..],
        _ => trimmed,
    };

    // Everything after the authority: path, query or fragment.
    let (authority, rest) = match without_scheme.find(['/', '?', '#']) {
        Some(idx) => without_scheme.split_at(idx),
        None => (without_scheme, ""),
    };

    let hostname = strip_port(authority);
    if hostname.is_empty() {
        return Err(ScanError::Configuration(format!("no hostname in target '{}'", trimmed)));
    }

    let path = rest
        .split(['?', '#'])
        .next()
        .filter(|p| !p.is_empty() && *p != "/")
        .map(|p| p.trim_end_matches('/').to_string());

    // A trailing slash inside a query value is data, not path.
    let base = if trimmed.contains(['?', '#']) {
        trimmed
    } else {
        trimmed.trim_end_matches('/')
    };
    let base_url = if has_scheme {
        base.to_string()
    } else {
        format!("http://{}", base)
    };
    Url::parse(&base_url)
        .map_err(|e| ScanError::Configuration(format!("invalid target URL '{}': {}", base_url, e)))?;

    Ok(Target {
        raw_input: raw.to_string(),
        hostname: hostname.to_string(),
        path,
        resolved_ip: None,
        base_url,
    })
}

fn strip_port(authority: &str) -> &str {
    // Userinfo is never part of the hostname.
    let authority = authority.rsplit('@').next().unwrap_or(authority);
    if let Some(inner) = authority.strip_prefix('[') {
        return inner.split(']').next().unwrap_or(inner);
    }
    authority.split(':').next().unwrap_or(authority)
}

/// Resolves a hostname to its first IPv4 address. IP literals skip DNS.
pub async fn resolve_ipv4(hostname: &str) -> Result<Ipv4Addr, ScanError> {
    match hostname.parse::<IpAddr>() {
        Ok(IpAddr::V4(ip)) => return Ok(ip),
        Ok(IpAddr::V6(_)) => {
            return Err(ScanError::Resolution {
                host: hostname.to_string(),
                reason: "IPv6 targets are not supported for host-level checks".to_string(),
            });
        }
        Err(_) => {}
    }

    debug!(hostname, "Resolving A record.");
    let resolver = TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default());
    let lookup = resolver.ipv4_lookup(hostname).await.map_err(|e| ScanError::Resolution {
        host: hostname.to_string(),
        reason: e.to_string(),
    })?;

    lookup.iter().next().map(|a| a.0).ok_or_else(|| ScanError::Resolution {
        host: hostname.to_string(),
        reason: "no A records returned".to_string(),
    })
}

/// Normalizes the raw input and attempts DNS resolution.
///
/// A resolution failure is not fatal: the returned target simply has no
/// `resolved_ip`, which tells the pipeline to skip host-level checks and run
/// the web probes against `base_url` only.
pub async fn resolve_target(raw: &str) -> Result<Target, ScanError> {
    let mut target = normalize_target(raw)?;
    match resolve_ipv4(&target.hostname).await {
        Ok(ip) => {
            info!(hostname = %target.hostname, %ip, "Target resolved.");
            target.resolved_ip = Some(ip);
        }
        Err(e) => {
            warn!(hostname = %target.hostname, error = %e, "Resolution failed, continuing with web-only checks.");
        }
    }
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_host_gets_http_base_url() {
        let t = normalize_target("example.com").unwrap();
        assert_eq!(t.hostname, "example.com");
        assert_eq!(t.base_url, "http://example.com");
        assert_eq!(t.path, None);
    }

    #[test]
    fn scheme_path_port_and_query_are_stripped_from_hostname() {
        let t = normalize_target("https://shop.example.com:8443/app/login?next=/").unwrap();
        assert_eq!(t.hostname, "shop.example.com");
        assert_eq!(t.path.as_deref(), Some("/app/login"));
        assert_eq!(t.base_url, "https://shop.example.com:8443/app/login?next=/");
    }

    #[test]
    fn host_port_without_scheme() {
        let t = normalize_target("10.0.0.5:8080/").unwrap();
        assert_eq!(t.hostname, "10.0.0.5");
        assert_eq!(t.base_url, "http://10.0.0.5:8080");
    }

    #[test]
    fn empty_target_is_a_configuration_error() {
        assert!(matches!(normalize_target("   "), Err(ScanError::Configuration(_))));
        assert!(matches!(normalize_target("http://"), Err(ScanError::Configuration(_))));
    }

    #[tokio::test]
    async fn ip_literals_resolve_without_dns() {
        let t = resolve_target("http://127.0.0.1:3000").await.unwrap();
        assert_eq!(t.resolved_ip, Some(Ipv4Addr::LOCALHOST));
    }

    #[tokio::test]
    async fn ipv6_literals_are_a_resolution_error() {
        let err = resolve_ipv4("::1").await.unwrap_err();
        assert!(matches!(err, ScanError::Resolution { .. }));
    }
}
