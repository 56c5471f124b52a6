// src/core/aggregator.rs

use crate::core::models::{
    CveRecord, ExploitTestResult, OpenPort, ScanResult, Target, WebVulnerabilityFinding,
    ZeroDayCandidate,
};
use chrono::Utc;
use std::collections::BTreeMap;

/// Everything the pipeline produced for one target, before merging.
#[derive(Debug, Default)]
pub struct ScanParts {
    pub open_ports: BTreeMap<u16, OpenPort>,
    pub web_vulnerabilities: Vec<WebVulnerabilityFinding>,
    pub known_vulnerabilities: Vec<CveRecord>,
    pub zero_day_potential: Vec<ZeroDayCandidate>,
    pub exploit_assessments: Vec<ExploitTestResult>,
}

/// Merges the component outputs into the final report, stamped with the
/// current time.
pub fn aggregate(target: Target, parts: ScanParts) -> ScanResult {
    ScanResult {
        target,
        scan_date: Utc::now(),
        open_ports: parts.open_ports,
        web_vulnerabilities: parts.web_vulnerabilities,
        known_vulnerabilities: parts.known_vulnerabilities,
        zero_day_potential: parts.zero_day_potential,
        exploit_assessments: parts.exploit_assessments,
    }
}
