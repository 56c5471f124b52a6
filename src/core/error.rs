// src/core/error.rs

use thiserror::Error;

/// Failures the scan pipeline can produce.
///
/// Only `Configuration` and `KnowledgeBase` ever reach the caller of
/// `run_full_scan`; the others are recovered where they happen and turned
/// into "closed", "inconclusive" or an error string on the record.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("could not resolve {host}: {reason}")]
    Resolution { host: String, reason: String },

    #[error("connection to {addr} failed: {reason}")]
    Connect { addr: String, reason: String },

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("knowledge base error: {0}")]
    KnowledgeBase(String),
}

impl From<reqwest::Error> for ScanError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ScanError::Timeout(e.to_string())
        } else if e.is_connect() {
            ScanError::Connect {
                addr: e.url().map(|u| u.to_string()).unwrap_or_default(),
                reason: e.to_string(),
            }
        } else {
            ScanError::Protocol(e.to_string())
        }
    }
}
