// src/core/scanner/vuln_matcher.rs

//! Known-vulnerability matching. Pure lookups against a `KnowledgeBase`,
//! no I/O, so the same input always yields the same matches.

use crate::core::knowledge_base::KnowledgeBase;
use crate::core::models::{CveRecord, OpenPort};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Returns true when `version` is listed as vulnerable for `service`.
/// An unknown version never matches.
pub fn is_vulnerable_version(kb: &KnowledgeBase, service: &str, version: &str) -> bool {
    if version == "unknown" || version.is_empty() {
        return false;
    }
    kb.vulnerable_versions
        .get(&service.to_lowercase())
        .is_some_and(|bad| bad.iter().any(|v| v == version))
}

/// CVE records whose affected component mentions `service` (case-insensitive).
pub fn match_cves<'a>(kb: &'a KnowledgeBase, service: &str) -> Vec<&'a CveRecord> {
    let needle = service.to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    kb.cves
        .iter()
        .filter(|cve| cve.affected_component.to_lowercase().contains(&needle))
        .collect()
}

/// Sets `vulnerable` on each port and collects the CVEs that apply to any of
/// them, deduplicated by id in first-seen order.
pub fn apply_known_vulnerabilities(
    kb: &KnowledgeBase,
    ports: &mut BTreeMap<u16, OpenPort>,
) -> Vec<CveRecord> {
    let mut seen = HashSet::new();
    let mut matches = Vec::new();

    for open in ports.values_mut() {
        open.vulnerable = is_vulnerable_version(kb, &open.service, &open.version);
        if open.vulnerable {
            debug!(port = open.port, service = %open.service, version = %open.version, "Known vulnerable version.");
        }
        for cve in match_cves(kb, &open.service) {
            if seen.insert(cve.cve_id.clone()) {
                debug!(port = open.port, cve = %cve.cve_id, "CVE matched service.");
                matches.push(cve.clone());
            }
        }
    }

    matches
}
