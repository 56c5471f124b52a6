//! Static reference data for the scanner: how each vulnerability class is
//! presented, the CVE table, and the list of service versions known to be
//! vulnerable. The compiled-in tables can be swapped for a JSON file of the
//! same shape without changing any matching behavior.

use crate::core::error::ScanError;
use crate::core::models::{CveRecord, Severity, VulnerabilityClass};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Human-readable presentation of a vulnerability class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassProfile {
    /// Display name used on findings (e.g. "SQL Injection").
    pub name: &'static str,
    pub severity: Severity,
    pub cvss: f32,
    pub description: &'static str,
}

/// Looks up the presentation details for a vulnerability class.
pub fn class_profile(class: VulnerabilityClass) -> ClassProfile {
    match class {
        VulnerabilityClass::SqlInjection => ClassProfile {
            name: "SQL Injection",
            severity: Severity::Critical,
            cvss: 9.8,
            description: "User input reaches a SQL query unsanitized, allowing an attacker to read or modify the database.",
        },
        VulnerabilityClass::Xss => ClassProfile {
            name: "Cross-Site Scripting (XSS)",
            severity: Severity::High,
            cvss: 7.2,
            description: "Input is reflected into the page without encoding, allowing script execution in a victim's browser.",
        },
        VulnerabilityClass::Lfi => ClassProfile {
            name: "Local File Inclusion",
            severity: Severity::High,
            cvss: 8.8,
            description: "A path parameter can be steered to local files, exposing system files such as /etc/passwd.",
        },
        VulnerabilityClass::Rfi => ClassProfile {
            name: "Remote File Inclusion",
            severity: Severity::Critical,
            cvss: 9.9,
            description: "The application fetches and includes attacker-controlled remote resources, enabling code execution.",
        },
        VulnerabilityClass::Xxe => ClassProfile {
            name: "XML External Entity (XXE) Injection",
            severity: Severity::High,
            cvss: 8.2,
            description: "The XML parser resolves external entities, leaking local files or reaching internal hosts.",
        },
        VulnerabilityClass::Ssrf => ClassProfile {
            name: "Server-Side Request Forgery (SSRF)",
            severity: Severity::High,
            cvss: 8.6,
            description: "The server fetches URLs supplied by the client, exposing internal services and cloud metadata.",
        },
        VulnerabilityClass::Csrf => ClassProfile {
            name: "Cross-Site Request Forgery (CSRF)",
            severity: Severity::Medium,
            cvss: 6.5,
            description: "State-changing forms carry no anti-forgery token, so a third-party site can submit them on a user's behalf.",
        },
        VulnerabilityClass::CommandInjection => ClassProfile {
            name: "OS Command Injection",
            severity: Severity::Critical,
            cvss: 9.8,
            description: "Input is passed to a system shell, allowing arbitrary command execution on the host.",
        },
        VulnerabilityClass::SecurityHeaders => ClassProfile {
            name: "Missing Security Headers",
            severity: Severity::Medium,
            cvss: 4.3,
            description: "Browser hardening headers are absent from the response.",
        },
        VulnerabilityClass::SslVulnerability => ClassProfile {
            name: "Legacy SSL/TLS Protocol",
            severity: Severity::High,
            cvss: 7.5,
            description: "The server only negotiates a deprecated TLS protocol version with known weaknesses.",
        },
    }
}

/// CVE records plus the per-service list of known-bad versions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KnowledgeBase {
    pub cves: Vec<CveRecord>,
    /// Service name (lowercase) to the exact version strings known to be vulnerable.
    pub vulnerable_versions: BTreeMap<String, Vec<String>>,
}

static BUILTIN: Lazy<KnowledgeBase> = Lazy::new(|| {
    let cve = |id: &str, name: &str, severity, cvss, description: &str, component: &str, date: &str| CveRecord {
        cve_id: id.to_string(),
        name: name.to_string(),
        severity,
        cvss,
        description: description.to_string(),
        affected_component: component.to_string(),
        published_date: date.to_string(),
    };

    let versions = |list: &[&str]| list.iter().map(|v| v.to_string()).collect::<Vec<_>>();

    KnowledgeBase {
        cves: vec![
            cve(
                "CVE-2023-44487",
                "HTTP/2 Rapid Reset Attack",
                Severity::High,
                7.5,
                "Denial of service through rapid HTTP/2 stream resets.",
                "HTTP/2 servers",
                "2023-10-10",
            ),
            cve(
                "CVE-2023-38545",
                "libcurl SOCKS5 Heap Buffer Overflow",
                Severity::Critical,
                9.8,
                "Heap buffer overflow in libcurl's SOCKS5 proxy handshake.",
                "libcurl",
                "2023-10-11",
            ),
            cve(
                "CVE-2023-20198",
                "Cisco IOS XE Web UI Privilege Escalation",
                Severity::Critical,
                10.0,
                "Privilege escalation through the Cisco IOS XE web interface.",
                "Cisco IOS XE",
                "2023-10-16",
            ),
        ],
        vulnerable_versions: BTreeMap::from([
            ("apache".to_string(), versions(&["2.4.41", "2.4.38", "2.4.37"])),
            ("nginx".to_string(), versions(&["1.15.6", "1.14.0"])),
            ("iis".to_string(), versions(&["7.5", "8.0"])),
            ("openssh".to_string(), versions(&["7.4", "7.2"])),
            ("mysql".to_string(), versions(&["5.7.25", "5.6.45"])),
            ("postgresql".to_string(), versions(&["11.5", "10.10"])),
            ("https".to_string(), versions(&["TLSv1", "TLSv1.1"])),
        ]),
    }
});

impl KnowledgeBase {
    /// The compiled-in reference tables.
    pub fn builtin() -> &'static KnowledgeBase {
        &BUILTIN
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ScanError> {
        let kb: KnowledgeBase = serde_json::from_str(raw)
            .map_err(|e| ScanError::KnowledgeBase(format!("invalid knowledge base JSON: {}", e)))?;
        debug!(cves = kb.cves.len(), services = kb.vulnerable_versions.len(), "Parsed knowledge base.");
        Ok(kb)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ScanError> {
        info!(path = %path.display(), "Loading external knowledge base.");
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ScanError::KnowledgeBase(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_json_str(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn every_class_has_a_named_profile() {
        for class in VulnerabilityClass::iter() {
            let profile = class_profile(class);
            assert!(!profile.name.is_empty());
            assert!(profile.cvss > 0.0 && profile.cvss <= 10.0);
        }
    }

    #[test]
    fn builtin_tables_are_populated() {
        let kb = KnowledgeBase::builtin();
        assert_eq!(kb.cves.len(), 3);
        assert!(kb.vulnerable_versions["apache"].contains(&"2.4.41".to_string()));
    }

    #[test]
    fn json_with_the_same_shape_loads() {
        let raw = serde_json::to_string(KnowledgeBase::builtin()).unwrap();
        let kb = KnowledgeBase::from_json_str(&raw).unwrap();
        assert_eq!(&kb, KnowledgeBase::builtin());
    }

    #[test]
    fn json_with_a_wrong_shape_is_rejected() {
        let err = KnowledgeBase::from_json_str(r#"{ "cves": 3 }"#).unwrap_err();
        assert!(matches!(err, ScanError::KnowledgeBase(_)));
    }
}
