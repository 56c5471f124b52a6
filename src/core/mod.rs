// src/core/mod.rs

// Root of the `core` module. Everything a scan needs lives below here; the
// binary only parses arguments and prints the result.

/// Data structures shared by every component, from `Target` to `ScanResult`.
pub mod models;

pub mod error;

/// CVE table, vulnerable-version list and per-class presentation details.
pub mod knowledge_base;

/// Input normalization and DNS resolution.
pub mod target;

pub mod http;

/// Host-level scanners and the `run_full_scan` orchestrator.
pub mod scanner;

/// Table-driven payload probes for the web vulnerability classes.
pub mod probe;

/// Success-rate scoring and impact labels.
pub mod exploit;

pub mod zero_day;

pub mod aggregator;

#[cfg(test)]
mod test_support;
