// src/core/scanner/mod.rs

// Public interface for the `scanner` module: the host-level scanners and the
// orchestration function that drives a complete scan.
pub mod fingerprint_scanner;
pub mod headers_scanner;
pub mod port_scanner;
pub mod ssl_scanner;
pub mod vuln_matcher;

use crate::config::ScanConfig;
use crate::core::aggregator::{aggregate, ScanParts};
use crate::core::error::ScanError;
use crate::core::exploit::assess_outcome;
use crate::core::http::build_client;
use crate::core::knowledge_base::KnowledgeBase;
use crate::core::models::{
    CveRecord, ExploitTestResult, OpenPort, ScanResult, Target, WebVulnerabilityFinding,
};
use crate::core::probe::{finding_from_outcome, ProbeEngine};
use crate::core::target::resolve_target;
use crate::core::zero_day;
use reqwest::Client;
use std::collections::BTreeMap;
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::info;

use self::fingerprint_scanner::run_fingerprint_scan;
use self::headers_scanner::run_headers_scan;
use self::port_scanner::scan_ports;
use self::ssl_scanner::run_legacy_tls_check;
use self::vuln_matcher::apply_known_vulnerabilities;

/// Executes a complete scan of one target and aggregates the results.
///
/// The host branch (ports, fingerprints, known vulnerabilities) and the web
/// branch (payload probes and hygiene checks) run concurrently with
/// `tokio::join!`. Zero-day candidates are derived from both once they finish.
///
/// # Arguments
///
/// * `raw` - The target as typed by the user (`example.com`, `https://host:8443/app`, an IP).
/// * `config` - Ports, timeouts, concurrency limits and thresholds.
/// * `cancel` - Cancelling stops outstanding work; what was cut short is reported
///   as closed or inconclusive.
///
/// # Errors
///
/// Only invalid input, an invalid configuration or an unreadable knowledge
/// base file fail the scan, and all of these are detected before any
/// network I/O. Network failures are absorbed by the individual components.
pub async fn run_full_scan(
    raw: &str,
    config: &ScanConfig,
    cancel: CancellationToken,
) -> Result<ScanResult, ScanError> {
    config.validate()?;
    let loaded;
    let kb = match &config.knowledge_base_path {
        Some(path) => {
            loaded = KnowledgeBase::from_json_file(path)?;
            &loaded
        }
        None => KnowledgeBase::builtin(),
    };
    let client = build_client(config)?;

    let target = resolve_target(raw).await?;
    info!(base_url = %target.base_url, ip = ?target.resolved_ip, "Starting full scan.");

    let engine = ProbeEngine::new(&client, config, &cancel);
    let ((open_ports, known_vulnerabilities), (web_vulnerabilities, mut exploit_assessments)) = tokio::join!(
        run_host_branch(&client, &target, config, kb, &cancel),
        run_web_branch(&engine, &client, &target.base_url, config, &cancel),
    );

    let zero_day_potential = zero_day::find_candidates(
        &open_ports,
        &web_vulnerabilities,
        config.vulnerability_density_limit,
    );
    let battery_results = futures::future::join_all(
        zero_day_potential
            .iter()
            .map(|candidate| zero_day::assess_candidate(&engine, &target.base_url, candidate, config)),
    )
    .await;
    exploit_assessments.extend(battery_results);

    info!(
        open_ports = open_ports.len(),
        web_vulnerabilities = web_vulnerabilities.len(),
        known_vulnerabilities = known_vulnerabilities.len(),
        zero_day = zero_day_potential.len(),
        cancelled = cancel.is_cancelled(),
        "Full scan finished."
    );

    Ok(aggregate(
        target,
        ScanParts {
            open_ports,
            web_vulnerabilities,
            known_vulnerabilities,
            zero_day_potential,
            exploit_assessments,
        },
    ))
}

/// Port scan, fingerprinting and CVE matching. Skipped when the target did
/// not resolve to an IPv4 address.
async fn run_host_branch(
    client: &Client,
    target: &Target,
    config: &ScanConfig,
    kb: &KnowledgeBase,
    cancel: &CancellationToken,
) -> (BTreeMap<u16, OpenPort>, Vec<CveRecord>) {
    let Some(ip) = target.resolved_ip else {
        info!(hostname = %target.hostname, "No resolved address, skipping host checks.");
        return (BTreeMap::new(), Vec::new());
    };

    let open = scan_ports(ip, &config.ports, config.connect_timeout(), config.port_concurrency, cancel).await;
    let mut ports = run_fingerprint_scan(client, ip, &target.hostname, &open, config, cancel).await;
    let cves = apply_known_vulnerabilities(kb, &mut ports);
    (ports, cves)
}

/// Payload probes plus the header and TLS hygiene checks, all concurrent.
async fn run_web_branch(
    engine: &ProbeEngine<'_>,
    client: &Client,
    base_url: &str,
    config: &ScanConfig,
    cancel: &CancellationToken,
) -> (Vec<WebVulnerabilityFinding>, Vec<ExploitTestResult>) {
    let (outcomes, headers, legacy_tls) = tokio::join!(
        engine.probe_all(base_url),
        unless_cancelled(cancel, run_headers_scan(client, base_url)),
        unless_cancelled(cancel, run_legacy_tls_check(base_url, config)),
    );

    let mut findings: Vec<WebVulnerabilityFinding> =
        outcomes.iter().filter_map(finding_from_outcome).collect();
    findings.extend(headers);
    findings.extend(legacy_tls);

    let assessments = outcomes
        .iter()
        .map(|outcome| assess_outcome(outcome, &config.thresholds))
        .collect();
    (findings, assessments)
}

async fn unless_cancelled<T>(
    cancel: &CancellationToken,
    check: impl Future<Output = Option<T>>,
) -> Option<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        found = check => found,
    }
}
