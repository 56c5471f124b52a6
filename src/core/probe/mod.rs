// src/core/probe/mod.rs

//! The payload probe engine. Each probed vulnerability class is described by
//! one row of a table (endpoint, payload list, detector), and every row runs
//! through the same bounded-concurrency batch runner.

pub mod csrf;
pub mod detectors;
pub mod payloads;

use crate::config::ScanConfig;
use crate::core::error::ScanError;
use crate::core::http::send_limited;
use crate::core::knowledge_base::class_profile;
use crate::core::models::{ProbeHit, ProbeOutcome, VulnerabilityClass, WebVulnerabilityFinding};
use detectors::{Detector, Observation};
use futures::stream::{self, StreamExt};
use reqwest::{Client, RequestBuilder};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

/// Where and how a payload is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// GET `{base}{path}?{param}=<payload>`.
    Query { path: &'static str, param: &'static str },
    /// POST `{base}{path}` with the payload as an XML body.
    XmlPost { path: &'static str },
}

/// One row of the class table.
#[derive(Debug, Clone, Copy)]
pub struct ClassProbe {
    pub class: VulnerabilityClass,
    pub endpoint: Endpoint,
    pub payloads: &'static [&'static str],
    pub detector: Detector,
}

/// The table row for a payload-driven class. CSRF and the passive hygiene
/// classes have no row.
pub fn class_probe(class: VulnerabilityClass) -> Option<ClassProbe> {
    let (endpoint, payloads, detector): (Endpoint, &'static [&'static str], Detector) = match class {
        VulnerabilityClass::SqlInjection => (
            Endpoint::Query { path: "/test", param: "test" },
            payloads::SQL_INJECTION,
            detectors::sql_injection,
        ),
        VulnerabilityClass::Xss => (
            Endpoint::Query { path: "/test", param: "input" },
            payloads::XSS,
            detectors::xss,
        ),
        VulnerabilityClass::Lfi => (
            Endpoint::Query { path: "/test", param: "file" },
            payloads::LFI,
            detectors::lfi,
        ),
        VulnerabilityClass::Rfi => (
            Endpoint::Query { path: "/test", param: "url" },
            payloads::RFI,
            detectors::rfi,
        ),
        VulnerabilityClass::CommandInjection => (
            Endpoint::Query { path: "/test", param: "cmd" },
            payloads::COMMAND_INJECTION,
            detectors::command_injection,
        ),
        VulnerabilityClass::Xxe => (Endpoint::XmlPost { path: "/xml" }, payloads::XXE, detectors::xxe),
        VulnerabilityClass::Ssrf => (
            Endpoint::Query { path: "/fetch", param: "url" },
            payloads::SSRF,
            detectors::ssrf,
        ),
        VulnerabilityClass::Csrf
        | VulnerabilityClass::SecurityHeaders
        | VulnerabilityClass::SslVulnerability => return None,
    };
    Some(ClassProbe { class, endpoint, payloads, detector })
}

/// Appends `path` to the base URL's path and, when given, one query pair.
/// An existing query string on the base URL is kept.
pub fn probe_url(base_url: &str, path: &str, query: Option<(&str, &str)>) -> Result<Url, ScanError> {
    let mut url = Url::parse(base_url)
        .map_err(|e| ScanError::Configuration(format!("invalid base URL {}: {}", base_url, e)))?;
    let joined = format!("{}{}", url.path().trim_end_matches('/'), path);
    url.set_path(&joined);
    url.set_fragment(None);
    if let Some((name, value)) = query {
        url.query_pairs_mut().append_pair(name, value);
    }
    Ok(url)
}

/// A list of payloads sent to one endpoint and judged by one detector.
#[derive(Debug, Clone)]
pub struct Batch {
    pub payloads: Vec<String>,
    pub endpoint: Endpoint,
    pub detector: Detector,
    pub delay_threshold: Duration,
}

/// Counts for a finished batch. `hits` are in payload order.
#[derive(Debug, Clone, Default)]
pub struct BatchTally {
    pub total: usize,
    pub inconclusive: usize,
    pub hits: Vec<ProbeHit>,
}

impl BatchTally {
    pub fn successes(&self) -> usize {
        self.hits.len()
    }

    /// Distinct URLs that produced a hit, first occurrence first.
    pub fn vulnerable_urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = Vec::new();
        for hit in &self.hits {
            if !urls.contains(&hit.url) {
                urls.push(hit.url.clone());
            }
        }
        urls
    }

    pub fn into_outcome(self, class: VulnerabilityClass) -> ProbeOutcome {
        let vulnerable_urls = self.vulnerable_urls();
        ProbeOutcome {
            class,
            successes: self.successes(),
            total: self.total,
            inconclusive: self.inconclusive,
            vulnerable_urls,
            first_hit: self.hits.into_iter().next(),
        }
    }
}

enum Verdict {
    Hit(ProbeHit),
    Miss,
    Inconclusive,
}

/// Sends payload batches for one scan. Holds no state between scans.
pub struct ProbeEngine<'a> {
    client: &'a Client,
    config: &'a ScanConfig,
    cancel: &'a CancellationToken,
}

impl<'a> ProbeEngine<'a> {
    pub fn new(client: &'a Client, config: &'a ScanConfig, cancel: &'a CancellationToken) -> Self {
        Self { client, config, cancel }
    }

    /// Runs every probed class against `base_url`, all classes concurrently.
    pub async fn probe_all(&self, base_url: &str) -> Vec<ProbeOutcome> {
        info!(base_url, "Starting payload probes.");
        let outcomes = futures::future::join_all(
            VulnerabilityClass::PROBED
                .iter()
                .map(|class| self.probe_class(base_url, *class)),
        )
        .await;
        info!(
            positive = outcomes.iter().filter(|o| o.successes > 0).count(),
            "Payload probes finished."
        );
        outcomes
    }

    pub async fn probe_class(&self, base_url: &str, class: VulnerabilityClass) -> ProbeOutcome {
        if class == VulnerabilityClass::Csrf {
            return csrf::probe_csrf(
                self.client,
                base_url,
                self.config.allow_state_changing_probes,
                self.cancel,
            )
            .await;
        }
        let Some(row) = class_probe(class) else {
            return ProbeOutcome::empty(class);
        };

        let delay_threshold = if class == VulnerabilityClass::Ssrf {
            self.config.ssrf_latency_threshold()
        } else {
            self.config.time_based_threshold()
        };
        let batch = Batch {
            payloads: payloads::to_owned(row.payloads),
            endpoint: row.endpoint,
            detector: row.detector,
            delay_threshold,
        };
        let outcome = self.run_batch(base_url, &batch).await.into_outcome(class);
        debug!(%class, successes = outcome.successes, total = outcome.total, inconclusive = outcome.inconclusive, "Class probe finished.");
        outcome
    }

    /// Sends every payload in the batch, at most `probe_concurrency` at a time.
    pub async fn run_batch(&self, base_url: &str, batch: &Batch) -> BatchTally {
        let mut verdicts: Vec<(usize, Verdict)> = stream::iter(batch.payloads.iter().enumerate())
            .map(|(index, payload)| async move { (index, self.send_payload(base_url, batch, payload).await) })
            .buffer_unordered(self.config.probe_concurrency.max(1))
            .collect()
            .await;
        verdicts.sort_by_key(|(index, _)| *index);

        let mut tally = BatchTally { total: verdicts.len(), ..BatchTally::default() };
        for (_, verdict) in verdicts {
            match verdict {
                Verdict::Hit(hit) => tally.hits.push(hit),
                Verdict::Miss => {}
                Verdict::Inconclusive => tally.inconclusive += 1,
            }
        }
        tally
    }

    fn build_request(&self, base_url: &str, endpoint: Endpoint, payload: &str) -> Result<(Url, RequestBuilder), ScanError> {
        match endpoint {
            Endpoint::Query { path, param } => {
                let url = probe_url(base_url, path, Some((param, payload)))?;
                Ok((url.clone(), self.client.get(url)))
            }
            Endpoint::XmlPost { path } => {
                let url = probe_url(base_url, path, None)?;
                let request = self
                    .client
                    .post(url.clone())
                    .header(reqwest::header::CONTENT_TYPE, "application/xml")
                    .body(payload.to_string());
                Ok((url, request))
            }
        }
    }

    async fn send_payload(&self, base_url: &str, batch: &Batch, payload: &str) -> Verdict {
        let (url, request) = match self.build_request(base_url, batch.endpoint, payload) {
            Ok(built) => built,
            Err(e) => {
                debug!(error = %e, "Could not build probe request.");
                return Verdict::Inconclusive;
            }
        };

        let response = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Verdict::Inconclusive,
            response = send_limited(request, self.config.max_body_bytes) => response,
        };
        let response = match response {
            Ok(response) => response,
            Err(e) => {
                debug!(%url, error = %e, "Probe request failed.");
                return Verdict::Inconclusive;
            }
        };

        let observation = Observation {
            payload,
            status: response.status.as_u16(),
            body: &response.body,
            latency: response.latency,
            delay_threshold: batch.delay_threshold,
        };
        match (batch.detector)(&observation) {
            Some(evidence) => Verdict::Hit(ProbeHit {
                payload: payload.to_string(),
                evidence: if response.truncated {
                    format!("{} (body truncated at {} bytes)", evidence, self.config.max_body_bytes)
                } else {
                    evidence
                },
                url: url.to_string(),
            }),
            None => Verdict::Miss,
        }
    }
}

/// The finding reported for a class that produced at least one hit.
pub fn finding_from_outcome(outcome: &ProbeOutcome) -> Option<WebVulnerabilityFinding> {
    let hit = outcome.first_hit.as_ref()?;
    let profile = class_profile(outcome.class);
    Some(WebVulnerabilityFinding {
        name: profile.name.to_string(),
        class: outcome.class,
        severity: profile.severity,
        cvss: profile.cvss,
        description: profile.description.to_string(),
        payload: hit.payload.clone(),
        vulnerable: true,
        evidence: Some(hit.evidence.clone()),
        target_url: hit.url.clone(),
    })
}
