// src/core/models.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use strum::{AsRefStr, Display, EnumIter, EnumString};

// --- Core Data Models ---

/// Severity level of a finding, ordered from most to least severe.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

/// Qualitative impact label derived from an exploitability success rate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ImpactLevel {
    Critical,
    High,
    Medium,
    Low,
}

/// Every class of web weakness the scanner knows how to report.
///
/// The first eight variants are driven by the payload probe engine; the last
/// two come from the passive hygiene checks (headers and TLS protocol).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
    EnumIter, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VulnerabilityClass {
    SqlInjection,
    Xss,
    Lfi,
    Rfi,
    Xxe,
    Ssrf,
    Csrf,
    CommandInjection,
    SecurityHeaders,
    SslVulnerability,
}

impl VulnerabilityClass {
    /// Classes that are exercised with payload batches.
    pub const PROBED: [VulnerabilityClass; 8] = [
        VulnerabilityClass::SqlInjection,
        VulnerabilityClass::Xss,
        VulnerabilityClass::Lfi,
        VulnerabilityClass::Rfi,
        VulnerabilityClass::Xxe,
        VulnerabilityClass::Ssrf,
        VulnerabilityClass::Csrf,
        VulnerabilityClass::CommandInjection,
    ];

    pub fn is_probed(self) -> bool {
        Self::PROBED.contains(&self)
    }
}

// --- Target ---

/// A normalized scan target. Built once per scan and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Target {
    /// The string exactly as the caller supplied it.
    pub raw_input: String,
    /// Bare hostname (or IP literal) with scheme, path and port removed.
    pub hostname: String,
    /// Path component of the input, if any (e.g. "/app").
    pub path: Option<String>,
    /// IPv4 address the hostname resolved to. `None` means host-level checks are skipped.
    pub resolved_ip: Option<Ipv4Addr>,
    /// Base URL used by the web probes, without a trailing slash.
    pub base_url: String,
}

// --- Host Scan Models ---

/// A TCP port that accepted a connection, enriched by the fingerprinter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OpenPort {
    pub port: u16,
    pub service: String,
    pub version: String,
    pub banner: String,
    pub vulnerable: bool,
}

impl OpenPort {
    /// A freshly discovered port before any fingerprinting.
    pub fn unidentified(port: u16) -> Self {
        Self {
            port,
            service: "unknown".to_string(),
            version: "unknown".to_string(),
            banner: String::new(),
            vulnerable: false,
        }
    }
}

/// A published CVE entry from the static reference table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CveRecord {
    pub cve_id: String,
    pub name: String,
    pub severity: Severity,
    pub cvss: f32,
    pub description: String,
    pub affected_component: String,
    pub published_date: String,
}

// --- Web Scan Models ---

/// A confirmed web weakness. One per class that produced a positive signal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebVulnerabilityFinding {
    pub name: String,
    #[serde(rename = "type")]
    pub class: VulnerabilityClass,
    pub severity: Severity,
    pub cvss: f32,
    pub description: String,
    pub payload: String,
    pub vulnerable: bool,
    pub evidence: Option<String>,
    pub target_url: String,
}

/// The first payload in a batch that produced a positive signal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProbeHit {
    pub payload: String,
    pub evidence: String,
    pub url: String,
}

/// Raw tally of one payload batch for a single class.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub class: VulnerabilityClass,
    pub successes: usize,
    pub total: usize,
    /// Requests that failed, timed out or were cancelled. Never counted as successes.
    pub inconclusive: usize,
    pub vulnerable_urls: Vec<String>,
    pub first_hit: Option<ProbeHit>,
}

impl ProbeOutcome {
    pub fn empty(class: VulnerabilityClass) -> Self {
        Self {
            class,
            successes: 0,
            total: 0,
            inconclusive: 0,
            vulnerable_urls: Vec::new(),
            first_hit: None,
        }
    }
}

/// Scored result of a payload batch against one finding or candidate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExploitTestResult {
    pub vulnerability_name: String,
    pub exploitable: bool,
    pub success_rate: u8,
    pub impact_level: ImpactLevel,
    pub vulnerable_urls: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

// --- Zero-Day Models ---

/// Which heuristic produced a zero-day candidate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ZeroDayTrigger {
    /// An open service runs a version listed as known-vulnerable.
    VulnerableService,
    /// More confirmed web findings than the density limit.
    VulnerabilityDensity,
}

/// A heuristic risk flag. Never backed by a real CVE lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ZeroDayCandidate {
    pub name: String,
    pub severity: Severity,
    pub description: String,
    pub cvss: f32,
    pub affected_component: String,
    #[serde(rename = "type")]
    pub trigger: ZeroDayTrigger,
    pub cve_id: Option<String>,
    pub port: Option<u16>,
    /// Always true: the candidate is inferred, not verified.
    pub simulated: bool,
}

// --- Main Report ---

/// Aggregate root for one scan. Owns every child record; nothing survives to the next scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub target: Target,
    pub scan_date: DateTime<Utc>,
    pub open_ports: BTreeMap<u16, OpenPort>,
    pub web_vulnerabilities: Vec<WebVulnerabilityFinding>,
    pub known_vulnerabilities: Vec<CveRecord>,
    pub zero_day_potential: Vec<ZeroDayCandidate>,
    pub exploit_assessments: Vec<ExploitTestResult>,
}
