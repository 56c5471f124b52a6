// src/core/probe/csrf.rs

use super::payloads::{CSRF_SENSITIVE_PATHS, CSRF_TOKEN_FIELDS};
use super::probe_url;
use crate::core::http::send_timed;
use crate::core::models::{ProbeHit, ProbeOutcome, VulnerabilityClass};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

const FORGED_ORIGIN: &str = "https://csrf-probe.invalid";

/// Refusal fragments that mean the server rejected a forged request (lowercase).
static REJECTION_MARKERS: &[&str] = &["csrf", "token", "forbidden", "invalid request", "referer", "origin"];

fn is_token_field(name: &str) -> bool {
    let name = name.to_lowercase();
    CSRF_TOKEN_FIELDS.iter().any(|t| name.contains(t))
}

fn form_has_token(form: &ElementRef<'_>) -> bool {
    let Ok(inputs) = Selector::parse("input[name], textarea[name], select[name]") else {
        return false;
    };
    form.select(&inputs)
        .filter_map(|field| field.value().attr("name"))
        .any(is_token_field)
}

/// Inspects every `<form method="post">` on the page.
///
/// Returns how many POST forms were found and a description of each one
/// that carries no recognized anti-CSRF field.
pub fn unprotected_post_forms(html: &str) -> (usize, Vec<String>) {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("form") else {
        return (0, Vec::new());
    };

    let mut post_forms = 0;
    let mut unprotected = Vec::new();
    for form in document.select(&selector) {
        let method = form.value().attr("method").unwrap_or("get");
        if !method.eq_ignore_ascii_case("post") {
            continue;
        }
        post_forms += 1;
        if !form_has_token(&form) {
            let action = form.value().attr("action").unwrap_or("(self)");
            unprotected.push(format!("POST form to {} has no anti-CSRF token field", action));
        }
    }
    (post_forms, unprotected)
}

fn looks_accepted(status: u16, body: &str) -> bool {
    if !(200..300).contains(&status) {
        return false;
    }
    let body = body.to_lowercase();
    !REJECTION_MARKERS.iter().any(|m| body.contains(m))
}

/// Form check on the landing page, plus forged cross-origin POSTs to the
/// sensitive paths when `allow_state_changing` is set.
///
/// Each POST form is one attempt; a page with no POST form counts as a
/// single negative attempt. A page that cannot be fetched is inconclusive.
pub async fn probe_csrf(
    client: &Client,
    base_url: &str,
    allow_state_changing: bool,
    cancel: &CancellationToken,
) -> ProbeOutcome {
    let mut outcome = ProbeOutcome::empty(VulnerabilityClass::Csrf);
    let mut hits: Vec<ProbeHit> = Vec::new();

    let page = tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        response = send_timed(client.get(base_url)) => match response {
            Ok(r) => Some(r),
            Err(e) => {
                debug!(base_url, error = %e, "CSRF page fetch failed.");
                None
            }
        },
    };

    match page {
        Some(page) => {
            let (post_forms, unprotected) = unprotected_post_forms(&page.body);
            debug!(post_forms, unprotected = unprotected.len(), "Parsed forms for CSRF check.");
            outcome.total += post_forms.max(1);
            hits.extend(unprotected.into_iter().map(|evidence| ProbeHit {
                payload: "missing anti-CSRF token".to_string(),
                evidence,
                url: base_url.to_string(),
            }));
        }
        None => {
            outcome.total += 1;
            outcome.inconclusive += 1;
        }
    }

    if allow_state_changing {
        for path in CSRF_SENSITIVE_PATHS {
            outcome.total += 1;
            let Ok(url) = probe_url(base_url, path, None) else {
                outcome.inconclusive += 1;
                continue;
            };
            let request = client
                .post(url.clone())
                .header(reqwest::header::ORIGIN, FORGED_ORIGIN)
                .header(reqwest::header::REFERER, format!("{}/csrf.html", FORGED_ORIGIN))
                .form(&[("confirm", "yes")]);
            let response = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                response = send_timed(request) => response.map_err(|e| debug!(%url, error = %e, "Forged POST failed.")).ok(),
            };
            match response {
                Some(r) if looks_accepted(r.status.as_u16(), &r.body) => hits.push(ProbeHit {
                    payload: format!("forged cross-origin POST {}", path),
                    evidence: format!("accepted with status {}", r.status.as_u16()),
                    url: url.to_string(),
                }),
                Some(_) => {}
                None => outcome.inconclusive += 1,
            }
        }
    }

    outcome.successes = hits.len();
    for hit in &hits {
        if !outcome.vulnerable_urls.contains(&hit.url) {
            outcome.vulnerable_urls.push(hit.url.clone());
        }
    }
    outcome.first_hit = hits.into_iter().next();
    info!(successes = outcome.successes, total = outcome.total, "CSRF probe finished.");
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScanConfig;
    use crate::core::http::build_client;
    use crate::core::test_support::{base_url, spawn_stub, StubResponse};

    const LOGIN_PAGE: &str = r#"
        <html><body>
          <form method="post" action="/login">
            <input name="user"><input type="password" name="pass">
          </form>
          <form method="POST" action="/comment">
            <input type="hidden" name="csrfmiddlewaretoken" value="abc">
            <textarea name="body"></textarea>
          </form>
          <form action="/search"><input name="q"></form>
        </body></html>"#;

    #[test]
    fn only_post_forms_without_tokens_are_reported() {
        let (post_forms, unprotected) = unprotected_post_forms(LOGIN_PAGE);
        assert_eq!(post_forms, 2);
        assert_eq!(unprotected, vec!["POST form to /login has no anti-CSRF token field".to_string()]);
    }

    #[test]
    fn token_names_are_matched_loosely() {
        assert!(is_token_field("authenticity_token"));
        assert!(is_token_field("X-CSRF-Token"));
        assert!(is_token_field("__RequestVerificationToken"));
        assert!(!is_token_field("username"));
    }

    #[tokio::test]
    async fn landing_page_forms_are_counted_per_form() {
        let addr = spawn_stub(|_| StubResponse::ok(LOGIN_PAGE)).await;
        let client = build_client(&ScanConfig::default()).unwrap();
        let base = base_url(addr);

        let outcome = probe_csrf(&client, &base, false, &CancellationToken::new()).await;
        assert_eq!(outcome.total, 2);
        assert_eq!(outcome.successes, 1);
        assert_eq!(outcome.vulnerable_urls, vec![base]);
    }

    #[tokio::test]
    async fn forged_posts_are_sent_only_when_allowed() {
        let addr = spawn_stub(|req| {
            if req.method == "POST" && req.path == "/change-password" {
                StubResponse::ok("password updated")
            } else if req.method == "POST" {
                StubResponse::status(403, "Forbidden")
            } else {
                StubResponse::ok("<html></html>")
            }
        })
        .await;
        let client = build_client(&ScanConfig::default()).unwrap();
        let base = base_url(addr);

        let passive = probe_csrf(&client, &base, false, &CancellationToken::new()).await;
        assert_eq!((passive.successes, passive.total), (0, 1));

        let active = probe_csrf(&client, &base, true, &CancellationToken::new()).await;
        assert_eq!(active.total, 1 + CSRF_SENSITIVE_PATHS.len());
        assert_eq!(active.successes, 1);
        assert_eq!(active.vulnerable_urls, vec![format!("{}/change-password", base)]);
    }
}
