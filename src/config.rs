// src/config.rs

//! Tunables for a scan. Everything has a default so a missing or partial
//! `config.json` still yields a usable configuration.

use crate::core::error::ScanError;
use crate::core::models::VulnerabilityClass;
use crate::logging::project_directory;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// The well-known ports probed when no explicit list is configured.
pub const DEFAULT_PORTS: [u16; 20] = [
    21, 22, 23, 25, 53, 80, 110, 135, 139, 143, 443, 993, 995, 1723, 3306, 3389, 5432, 5900,
    8080, 8443,
];

/// Sub-types of the follow-up battery run against zero-day candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroDaySubtype {
    BufferOverflow,
    Injection,
    Bypass,
    Advanced,
}

/// Success-rate cutoffs (percent). A batch is exploitable only when its
/// rate is strictly greater than the cutoff for its class.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Thresholds {
    pub sql_injection: u8,
    pub xss: u8,
    pub lfi: u8,
    pub rfi: u8,
    pub command_injection: u8,
    pub generic: u8,
    pub zero_day_buffer_overflow: u8,
    pub zero_day_injection: u8,
    pub zero_day_bypass: u8,
    pub zero_day_advanced: u8,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            sql_injection: 15,
            xss: 10,
            lfi: 10,
            rfi: 5,
            command_injection: 5,
            generic: 10,
            zero_day_buffer_overflow: 30,
            zero_day_injection: 20,
            zero_day_bypass: 25,
            zero_day_advanced: 15,
        }
    }
}

impl Thresholds {
    pub fn for_class(&self, class: VulnerabilityClass) -> u8 {
        match class {
            VulnerabilityClass::SqlInjection => self.sql_injection,
            VulnerabilityClass::Xss => self.xss,
            VulnerabilityClass::Lfi => self.lfi,
            VulnerabilityClass::Rfi => self.rfi,
            VulnerabilityClass::CommandInjection => self.command_injection,
            _ => self.generic,
        }
    }

    pub fn for_zero_day(&self, subtype: ZeroDaySubtype) -> u8 {
        match subtype {
            ZeroDaySubtype::BufferOverflow => self.zero_day_buffer_overflow,
            ZeroDaySubtype::Injection => self.zero_day_injection,
            ZeroDaySubtype::Bypass => self.zero_day_bypass,
            ZeroDaySubtype::Advanced => self.zero_day_advanced,
        }
    }
}

/// Main configuration for one scan invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Ports attempted by the port scanner.
    pub ports: Vec<u16>,
    /// TCP connect deadline per port, in milliseconds.
    pub connect_timeout_ms: u64,
    /// Deadline for each HTTP request, in milliseconds.
    pub http_timeout_ms: u64,
    /// Deadline for greeting-banner reads and the TLS handshake, in milliseconds.
    pub banner_timeout_ms: u64,
    /// Maximum concurrent connection attempts during the port scan.
    pub port_concurrency: usize,
    /// Maximum in-flight payload requests per vulnerability class.
    pub probe_concurrency: usize,
    /// Latency above which a time-based SQL payload counts as a hit.
    pub time_based_threshold_ms: u64,
    /// Latency above which an SSRF payload counts as a hit.
    pub ssrf_latency_threshold_ms: u64,
    /// Response bodies are read up to this many bytes; the rest is dropped.
    pub max_body_bytes: usize,
    /// Web findings above this count raise a density zero-day candidate.
    pub vulnerability_density_limit: usize,
    pub thresholds: Thresholds,
    /// Allows forged POSTs to sensitive paths such as `/delete-account`.
    /// Off unless the operator opts in.
    pub allow_state_changing_probes: bool,
    pub user_agent: String,
    /// Optional JSON file replacing the compiled-in CVE and version tables.
    pub knowledge_base_path: Option<PathBuf>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            ports: DEFAULT_PORTS.to_vec(),
            connect_timeout_ms: 1_000,
            http_timeout_ms: 10_000,
            banner_timeout_ms: 2_000,
            port_concurrency: 64,
            probe_concurrency: 8,
            time_based_threshold_ms: 4_500,
            ssrf_latency_threshold_ms: 5_000,
            max_body_bytes: 1024 * 1024,
            vulnerability_density_limit: 3,
            thresholds: Thresholds::default(),
            allow_state_changing_probes: false,
            user_agent: format!("VanguardProbe/{}", env!("CARGO_PKG_VERSION")),
            knowledge_base_path: None,
        }
    }
}

impl ScanConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }

    pub fn banner_timeout(&self) -> Duration {
        Duration::from_millis(self.banner_timeout_ms)
    }

    pub fn time_based_threshold(&self) -> Duration {
        Duration::from_millis(self.time_based_threshold_ms)
    }

    pub fn ssrf_latency_threshold(&self) -> Duration {
        Duration::from_millis(self.ssrf_latency_threshold_ms)
    }

    /// Rejects settings that would make the scan hang or do nothing.
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.port_concurrency == 0 || self.probe_concurrency == 0 {
            return Err(ScanError::Configuration(
                "concurrency limits must be at least 1".to_string(),
            ));
        }
        if self.connect_timeout_ms == 0 || self.http_timeout_ms == 0 {
            return Err(ScanError::Configuration(
                "network timeouts must be non-zero".to_string(),
            ));
        }
        if self.max_body_bytes == 0 {
            return Err(ScanError::Configuration(
                "max_body_bytes must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ScanError> {
        let config: ScanConfig = serde_json::from_str(raw)
            .map_err(|e| ScanError::Configuration(format!("invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ScanError> {
        debug!(path = %path.display(), "Reading scan configuration.");
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ScanError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&raw)
    }

    /// Loads `config.json` from the project config directory, falling back to defaults
    /// when the file does not exist.
    pub fn load_or_default() -> Result<Self, ScanError> {
        let Some(dirs) = project_directory() else {
            return Ok(Self::default());
        };
        let path = dirs.config_dir().join("config.json");
        if path.exists() {
            info!(path = %path.display(), "Using configuration file.");
            Self::load(&path)
        } else {
            debug!(path = %path.display(), "No configuration file, using defaults.");
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_the_well_known_ports() {
        let config = ScanConfig::default();
        assert_eq!(config.ports.len(), 20);
        assert!(config.ports.contains(&443));
        assert_eq!(config.connect_timeout(), Duration::from_secs(1));
        assert!(!config.allow_state_changing_probes);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_remaining_defaults() {
        let config = ScanConfig::from_json_str(
            r#"{ "ports": [80, 443], "thresholds": { "sql_injection": 40 } }"#,
        )
        .unwrap();
        assert_eq!(config.ports, vec![80, 443]);
        assert_eq!(config.thresholds.sql_injection, 40);
        assert_eq!(config.thresholds.xss, 10);
        assert_eq!(config.http_timeout_ms, 10_000);
    }

    #[test]
    fn zero_concurrency_is_a_configuration_error() {
        let err = ScanConfig::from_json_str(r#"{ "probe_concurrency": 0 }"#).unwrap_err();
        assert!(matches!(err, ScanError::Configuration(_)));
        let err = ScanConfig::from_json_str(r#"{ "max_body_bytes": 0 }"#).unwrap_err();
        assert!(matches!(err, ScanError::Configuration(_)));
    }

    #[test]
    fn malformed_json_is_a_configuration_error() {
        let err = ScanConfig::from_json_str("{ ports: ").unwrap_err();
        assert!(matches!(err, ScanError::Configuration(_)));
    }

    #[test]
    fn class_thresholds_fall_back_to_generic() {
        let t = Thresholds::default();
        assert_eq!(t.for_class(VulnerabilityClass::SqlInjection), 15);
        assert_eq!(t.for_class(VulnerabilityClass::Rfi), 5);
        assert_eq!(t.for_class(VulnerabilityClass::Xxe), 10);
        assert_eq!(t.for_class(VulnerabilityClass::Csrf), 10);
        assert_eq!(t.for_zero_day(ZeroDaySubtype::BufferOverflow), 30);
        assert_eq!(t.for_zero_day(ZeroDaySubtype::Advanced), 15);
    }
}
