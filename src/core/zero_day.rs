// src/core/zero_day.rs

//! Heuristic zero-day flags. Candidates are inferred from the scan results,
//! never looked up, so they carry no CVE identifier and are marked simulated.

use crate::config::{ScanConfig, ZeroDaySubtype};
use crate::core::exploit;
use crate::core::models::{
    ExploitTestResult, ImpactLevel, OpenPort, Severity, WebVulnerabilityFinding, ZeroDayCandidate,
    ZeroDayTrigger,
};
use crate::core::probe::detectors::{self, Detector};
use crate::core::probe::{payloads, Batch, Endpoint, ProbeEngine};
use std::collections::BTreeMap;
use tracing::info;

/// Raises a candidate for every vulnerable open service, plus one when the
/// number of web findings exceeds `density_limit`.
pub fn find_candidates(
    open_ports: &BTreeMap<u16, OpenPort>,
    web_vulnerabilities: &[WebVulnerabilityFinding],
    density_limit: usize,
) -> Vec<ZeroDayCandidate> {
    let mut candidates: Vec<ZeroDayCandidate> = open_ports
        .values()
        .filter(|p| p.vulnerable)
        .map(|p| ZeroDayCandidate {
            name: format!("Potential Zero-Day in {}", p.service),
            severity: Severity::High,
            description: format!(
                "{} {} on port {} is a known-vulnerable release; undisclosed flaws in the same code are likely.",
                p.service, p.version, p.port
            ),
            cvss: 8.5,
            affected_component: p.service.clone(),
            trigger: ZeroDayTrigger::VulnerableService,
            cve_id: None,
            port: Some(p.port),
            simulated: true,
        })
        .collect();

    if web_vulnerabilities.len() > density_limit {
        candidates.push(ZeroDayCandidate {
            name: "High Vulnerability Density - Zero-Day Potential".to_string(),
            severity: Severity::Critical,
            description: format!(
                "{} web vulnerabilities were confirmed (limit {}). Input handling this weak usually hides further flaws.",
                web_vulnerabilities.len(),
                density_limit
            ),
            cvss: 9.0,
            affected_component: "Web Application".to_string(),
            trigger: ZeroDayTrigger::VulnerabilityDensity,
            cve_id: None,
            port: None,
            simulated: true,
        });
    }

    info!(candidates = candidates.len(), "Zero-day heuristic finished.");
    candidates
}

/// Picks the follow-up battery from what the candidate names.
pub fn select_subtype(candidate: &ZeroDayCandidate) -> ZeroDaySubtype {
    let text = format!("{} {}", candidate.affected_component, candidate.name).to_lowercase();
    if text.contains("overflow") {
        ZeroDaySubtype::BufferOverflow
    } else if text.contains("injection") {
        ZeroDaySubtype::Injection
    } else if text.contains("bypass") {
        ZeroDaySubtype::Bypass
    } else {
        ZeroDaySubtype::Advanced
    }
}

fn battery(subtype: ZeroDaySubtype, config: &ScanConfig) -> Batch {
    let (payloads, detector): (Vec<String>, Detector) = match subtype {
        ZeroDaySubtype::BufferOverflow => (payloads::buffer_overflow(), detectors::buffer_overflow),
        ZeroDaySubtype::Injection => (payloads::to_owned(payloads::ZERO_DAY_INJECTION), detectors::zero_day_injection),
        ZeroDaySubtype::Bypass => (payloads::to_owned(payloads::ZERO_DAY_BYPASS), detectors::zero_day_bypass),
        ZeroDaySubtype::Advanced => (payloads::to_owned(payloads::ZERO_DAY_ADVANCED), detectors::zero_day_advanced),
    };
    Batch {
        payloads,
        endpoint: Endpoint::Query { path: "/test", param: "input" },
        detector,
        delay_threshold: config.time_based_threshold(),
    }
}

/// Runs the candidate's battery against the web target and scores it.
/// Impact is always critical; the threshold depends on the sub-type.
pub async fn assess_candidate(
    engine: &ProbeEngine<'_>,
    base_url: &str,
    candidate: &ZeroDayCandidate,
    config: &ScanConfig,
) -> ExploitTestResult {
    let subtype = select_subtype(candidate);
    let tally = engine.run_batch(base_url, &battery(subtype, config)).await;
    info!(candidate = %candidate.name, ?subtype, successes = tally.successes(), total = tally.total, "Zero-day battery finished.");
    exploit::score(
        &candidate.name,
        tally.successes(),
        tally.total,
        config.thresholds.for_zero_day(subtype),
        |_| ImpactLevel::Critical,
        tally.vulnerable_urls(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::http::build_client;
    use crate::core::knowledge_base::class_profile;
    use crate::core::models::VulnerabilityClass;
    use crate::core::test_support::{base_url, spawn_stub, StubResponse};
    use tokio_util::sync::CancellationToken;

    fn findings(n: usize) -> Vec<WebVulnerabilityFinding> {
        let profile = class_profile(VulnerabilityClass::Xss);
        (0..n)
            .map(|i| WebVulnerabilityFinding {
                name: profile.name.to_string(),
                class: VulnerabilityClass::Xss,
                severity: profile.severity,
                cvss: profile.cvss,
                description: String::new(),
                payload: String::new(),
                vulnerable: true,
                evidence: None,
                target_url: format!("http://example.com/{}", i),
            })
            .collect()
    }

    fn vulnerable_ssh() -> BTreeMap<u16, OpenPort> {
        let mut ports = BTreeMap::new();
        ports.insert(
            22,
            OpenPort {
                service: "openssh".to_string(),
                version: "7.4".to_string(),
                vulnerable: true,
                ..OpenPort::unidentified(22)
            },
        );
        ports.insert(80, OpenPort::unidentified(80));
        ports
    }

    #[test]
    fn density_needs_more_than_the_limit() {
        let none = find_candidates(&BTreeMap::new(), &findings(3), 3);
        assert!(none.is_empty());

        let some = find_candidates(&BTreeMap::new(), &findings(4), 3);
        assert_eq!(some.len(), 1);
        assert_eq!(some[0].trigger, ZeroDayTrigger::VulnerabilityDensity);
        assert_eq!(some[0].severity, Severity::Critical);
        assert_eq!(some[0].cvss, 9.0);
    }

    #[test]
    fn vulnerable_services_raise_unverified_candidates() {
        let candidates = find_candidates(&vulnerable_ssh(), &[], 3);
        assert_eq!(candidates.len(), 1);
        let c = &candidates[0];
        assert_eq!(c.name, "Potential Zero-Day in openssh");
        assert_eq!(c.port, Some(22));
        assert_eq!(c.cve_id, None);
        assert!(c.simulated);
        assert_eq!(select_subtype(c), ZeroDaySubtype::Advanced);
    }

    #[test]
    fn subtype_follows_component_keywords() {
        let mut c = find_candidates(&vulnerable_ssh(), &[], 3).remove(0);
        c.affected_component = "Buffer Overflow in parser".to_string();
        assert_eq!(select_subtype(&c), ZeroDaySubtype::BufferOverflow);
        c.affected_component = "Template injection".to_string();
        assert_eq!(select_subtype(&c), ZeroDaySubtype::Injection);
        c.affected_component = "Auth bypass".to_string();
        assert_eq!(select_subtype(&c), ZeroDaySubtype::Bypass);
    }

    #[tokio::test]
    async fn evaluated_templates_make_the_advanced_battery_exploitable() {
        let addr = spawn_stub(|req| {
            let input = req.param("input").unwrap_or_default();
            if input.contains("7*7") {
                StubResponse::ok("result: 49")
            } else {
                StubResponse::ok("nothing here")
            }
        })
        .await;
        let config = ScanConfig::default();
        let client = build_client(&config).unwrap();
        let cancel = CancellationToken::new();
        let engine = ProbeEngine::new(&client, &config, &cancel);
        let candidate = find_candidates(&vulnerable_ssh(), &[], 3).remove(0);

        let result = assess_candidate(&engine, &base_url(addr), &candidate, &config).await;
        // one of ten advanced payloads evaluates a template
        assert_eq!(result.success_rate, 10);
        assert!(!result.exploitable);
        assert_eq!(result.impact_level, ImpactLevel::Critical);
        assert_eq!(result.vulnerable_urls.len(), 1);
    }
}
