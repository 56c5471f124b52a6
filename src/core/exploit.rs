// src/core/exploit.rs

//! Turns probe tallies into an exploitability rating. The model is a
//! heuristic over success rates; it does not prove exploitability.

use crate::config::Thresholds;
use crate::core::knowledge_base::class_profile;
use crate::core::models::{ExploitTestResult, ImpactLevel, ProbeOutcome, VulnerabilityClass};
use chrono::Utc;

/// Percentage of successful payloads, rounded to the nearest integer.
/// A batch with no attempts scores 0.
pub fn success_rate(successes: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let rate = (successes as f64 / total as f64 * 100.0).round();
    rate.clamp(0.0, 100.0) as u8
}

/// Strictly above the threshold; a rate equal to it is not exploitable.
pub fn is_exploitable(rate: u8, threshold: u8) -> bool {
    rate > threshold
}

pub fn impact_level(class: VulnerabilityClass, rate: u8) -> ImpactLevel {
    match class {
        VulnerabilityClass::SqlInjection if rate > 70 => ImpactLevel::High,
        VulnerabilityClass::SqlInjection => ImpactLevel::Medium,
        VulnerabilityClass::Xss => ImpactLevel::Medium,
        VulnerabilityClass::Lfi if rate > 60 => ImpactLevel::High,
        VulnerabilityClass::Lfi => ImpactLevel::Medium,
        VulnerabilityClass::Rfi if rate > 50 => ImpactLevel::Critical,
        VulnerabilityClass::Rfi => ImpactLevel::High,
        VulnerabilityClass::CommandInjection if rate > 40 => ImpactLevel::Critical,
        VulnerabilityClass::CommandInjection => ImpactLevel::High,
        _ if rate > 50 => ImpactLevel::Medium,
        _ => ImpactLevel::Low,
    }
}

/// Builds the scored record from raw counts.
pub fn score(
    vulnerability_name: &str,
    successes: usize,
    total: usize,
    threshold: u8,
    impact_level: impl FnOnce(u8) -> ImpactLevel,
    vulnerable_urls: Vec<String>,
) -> ExploitTestResult {
    let rate = success_rate(successes, total);
    ExploitTestResult {
        vulnerability_name: vulnerability_name.to_string(),
        exploitable: is_exploitable(rate, threshold),
        success_rate: rate,
        impact_level: impact_level(rate),
        vulnerable_urls,
        timestamp: Utc::now(),
    }
}

/// Scores one class batch with that class's threshold and impact mapping.
pub fn assess_outcome(outcome: &ProbeOutcome, thresholds: &Thresholds) -> ExploitTestResult {
    score(
        class_profile(outcome.class).name,
        outcome.successes,
        outcome.total,
        thresholds.for_class(outcome.class),
        |rate| impact_level(outcome.class, rate),
        outcome.vulnerable_urls.clone(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(class: VulnerabilityClass, successes: usize, total: usize) -> ProbeOutcome {
        ProbeOutcome {
            successes,
            total,
            ..ProbeOutcome::empty(class)
        }
    }

    #[test]
    fn rate_is_rounded_and_bounded() {
        assert_eq!(success_rate(0, 0), 0);
        assert_eq!(success_rate(12, 45), 27);
        assert_eq!(success_rate(1, 3), 33);
        assert_eq!(success_rate(2, 3), 67);
        assert_eq!(success_rate(10, 10), 100);
        for total in 1..50 {
            for successes in 0..=total {
                assert!(success_rate(successes, total) <= 100);
            }
        }
    }

    #[test]
    fn threshold_equality_is_not_exploitable() {
        assert!(!is_exploitable(15, 15));
        assert!(is_exploitable(16, 15));
        assert!(!is_exploitable(0, 0));
    }

    #[test]
    fn impact_follows_the_class_mapping() {
        assert_eq!(impact_level(VulnerabilityClass::SqlInjection, 71), ImpactLevel::High);
        assert_eq!(impact_level(VulnerabilityClass::SqlInjection, 70), ImpactLevel::Medium);
        assert_eq!(impact_level(VulnerabilityClass::Xss, 100), ImpactLevel::Medium);
        assert_eq!(impact_level(VulnerabilityClass::Rfi, 51), ImpactLevel::Critical);
        assert_eq!(impact_level(VulnerabilityClass::CommandInjection, 40), ImpactLevel::High);
        assert_eq!(impact_level(VulnerabilityClass::Ssrf, 60), ImpactLevel::Medium);
        assert_eq!(impact_level(VulnerabilityClass::Csrf, 50), ImpactLevel::Low);
    }

    #[test]
    fn xss_full_reflection_is_exploitable() {
        let result = assess_outcome(&outcome(VulnerabilityClass::Xss, 10, 10), &Thresholds::default());
        assert_eq!(result.success_rate, 100);
        assert!(result.exploitable);
        assert_eq!(result.vulnerability_name, "Cross-Site Scripting (XSS)");
    }

    #[test]
    fn rate_at_the_sql_threshold_is_not_exploitable() {
        // 3 of 20 is exactly 15 percent.
        let result = assess_outcome(&outcome(VulnerabilityClass::SqlInjection, 3, 20), &Thresholds::default());
        assert_eq!(result.success_rate, 15);
        assert!(!result.exploitable);
    }

    #[test]
    fn empty_batch_scores_zero() {
        let result = assess_outcome(&ProbeOutcome::empty(VulnerabilityClass::Lfi), &Thresholds::default());
        assert_eq!(result.success_rate, 0);
        assert!(!result.exploitable);
        assert_eq!(result.impact_level, ImpactLevel::Medium);
    }
}
