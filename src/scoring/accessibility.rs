use std::collections::BTreeMap;

use crate::config::SeverityWeights;
use crate::model::{
    A11yFinding, AccessibilityReport, Compliance, ContrastViolation, Severity, Violation,
    ViolationSource, WcagLevel,
};

const CONTRAST_RULE: &str = "color-contrast";

pub fn wcag_level(severity: Severity) -> WcagLevel {
    match severity {
        Severity::Critical => WcagLevel::A,
        Severity::Serious | Severity::Moderate => WcagLevel::AA,
        Severity::Minor => WcagLevel::AAA,
    }
}

/// Fail on any serious/critical violation at or below `level`; warning when
/// only moderate/minor ones remain.
fn compliance_at(violations: &[Violation], level: WcagLevel) -> Compliance {
    let relevant: Vec<&Violation> = violations.iter().filter(|v| v.wcag_level <= level).collect();
    if relevant.iter().any(|v| v.severity >= Severity::Serious) {
        Compliance::Fail
    } else if relevant.is_empty() {
        Compliance::Pass
    } else {
        Compliance::Warning
    }
}

fn finish(
    violations: Vec<Violation>,
    score: Option<f64>,
    rules_checked: u32,
) -> AccessibilityReport {
    let mut by_severity = BTreeMap::new();
    for v in &violations {
        *by_severity.entry(v.severity).or_insert(0) += 1;
    }
    let measured = score.is_some();
    AccessibilityReport {
        level_a: measured.then(|| compliance_at(&violations, WcagLevel::A)),
        level_aa: measured.then(|| compliance_at(&violations, WcagLevel::AA)),
        violations,
        by_severity,
        score,
        rules_checked,
    }
}

/// 100 minus the severity-weighted penalty sum, floored at 0.
pub fn penalty_score(violations: &[Violation], weights: &SeverityWeights) -> f64 {
    let penalty: f64 = violations.iter().map(|v| weights.weight(v.severity)).sum();
    (100.0 - penalty).max(0.0)
}

/// Per-page report. `audit` is the number of rules a probe checked, `None`
/// when no probe ran. Contrast measurements become derived violations unless
/// the probe already reported contrast itself.
pub fn page_report<'a>(
    page: &str,
    findings: impl IntoIterator<Item = &'a A11yFinding>,
    audit: Option<u32>,
    contrast_measured: bool,
    contrast_violations: &[ContrastViolation],
    weights: &SeverityWeights,
) -> AccessibilityReport {
    let mut violations: Vec<Violation> = Vec::new();
    for f in findings {
        // the same node is reported once per viewport
        if violations
            .iter()
            .any(|v| v.rule_id == f.rule_id && v.selector == f.selector)
        {
            continue;
        }
        violations.push(Violation {
            rule_id: f.rule_id.clone(),
            severity: f.impact,
            wcag_level: wcag_level(f.impact),
            description: f.description.clone(),
            selector: f.selector.clone(),
            pages: vec![page.to_string()],
            source: ViolationSource::Probe,
        });
    }

    if !violations.iter().any(|v| v.rule_id == CONTRAST_RULE) {
        for cv in contrast_violations {
            violations.push(Violation {
                rule_id: CONTRAST_RULE.to_string(),
                severity: Severity::Serious,
                wcag_level: WcagLevel::AA,
                description: format!(
                    "contrast {:.2}:1 is below the required {:.1}:1",
                    cv.ratio, cv.required
                ),
                selector: format!("{} on {}", cv.color, cv.background),
                pages: vec![page.to_string()],
                source: ViolationSource::Derived,
            });
        }
    }

    let measured = audit.is_some() || contrast_measured || !violations.is_empty();
    let score = measured.then(|| penalty_score(&violations, weights));
    finish(violations, score, audit.unwrap_or(0))
}

/// Site-level report: identical violations are merged across pages and the
/// score is the mean of the measured page scores.
pub fn merge_reports<'a>(reports: impl IntoIterator<Item = &'a AccessibilityReport>) -> AccessibilityReport {
    let mut merged: Vec<Violation> = Vec::new();
    let mut scores = Vec::new();
    let mut rules_checked = 0;

    for report in reports {
        if let Some(s) = report.score {
            scores.push(s);
        }
        rules_checked = rules_checked.max(report.rules_checked);
        for v in &report.violations {
            match merged.iter_mut().find(|m| {
                m.rule_id == v.rule_id && m.selector == v.selector && m.source == v.source
            }) {
                Some(m) => {
                    for p in &v.pages {
                        if !m.pages.contains(p) {
                            m.pages.push(p.clone());
                        }
                    }
                }
                None => merged.push(v.clone()),
            }
        }
    }

    let score = (!scores.is_empty()).then(|| scores.iter().sum::<f64>() / scores.len() as f64);
    finish(merged, score, rules_checked)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(rule: &str, impact: Severity, selector: &str) -> A11yFinding {
        A11yFinding {
            rule_id: rule.to_string(),
            impact,
            description: String::new(),
            selector: selector.to_string(),
        }
    }

    #[test]
    fn critical_plus_minor_is_55() {
        let findings = vec![
            finding("button-name", Severity::Critical, "#buy"),
            finding("region", Severity::Minor, "main"),
        ];
        let weights = SeverityWeights {
            critical: 40.0,
            minor: 5.0,
            ..Default::default()
        };
        let report = page_report("p", &findings, Some(50), false, &[], &weights);
        assert_eq!(report.score, Some(55.0));
        assert_eq!(report.level_a, Some(Compliance::Fail));
        assert_eq!(report.by_severity[&Severity::Critical], 1);
    }

    #[test]
    fn score_floors_at_zero() {
        let findings: Vec<A11yFinding> = (0..5)
            .map(|i| finding("image-alt", Severity::Critical, &format!("img:nth-of-type({i})")))
            .collect();
        let report = page_report("p", &findings, Some(10), false, &[], &SeverityWeights::default());
        assert_eq!(report.score, Some(0.0));
    }

    #[test]
    fn repeated_viewport_findings_count_once() {
        let findings = vec![
            finding("label", Severity::Serious, "#email"),
            finding("label", Severity::Serious, "#email"),
        ];
        let report = page_report("p", &findings, Some(10), false, &[], &SeverityWeights::default());
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.score, Some(80.0));
        assert_eq!(report.level_a, Some(Compliance::Pass));
        assert_eq!(report.level_aa, Some(Compliance::Fail));
    }

    #[test]
    fn no_audit_no_score() {
        let none: Vec<A11yFinding> = Vec::new();
        let report = page_report("p", &none, None, false, &[], &SeverityWeights::default());
        assert!(report.score.is_none());
        assert!(report.level_a.is_none());
    }

    #[test]
    fn contrast_violations_are_derived() {
        let cv = ContrastViolation {
            color: "#aaaaaa".into(),
            background: "#ffffff".into(),
            ratio: 2.32,
            required: 4.5,
        };
        let none: Vec<A11yFinding> = Vec::new();
        let report = page_report("p", &none, None, true, &[cv], &SeverityWeights::default());
        assert_eq!(report.violations[0].source, ViolationSource::Derived);
        assert_eq!(report.score, Some(80.0));
    }

    #[test]
    fn merge_averages_page_scores() {
        let w = SeverityWeights::default();
        let a = page_report("a", &[finding("x", Severity::Moderate, "div")], Some(5), false, &[], &w);
        let b = page_report("b", &[finding("x", Severity::Moderate, "div")], Some(5), false, &[], &w);
        let c = page_report("c", &Vec::<A11yFinding>::new(), Some(5), false, &[], &w);
        let merged = merge_reports([&a, &b, &c]);
        assert_eq!(merged.violations.len(), 1);
        assert_eq!(merged.violations[0].pages, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(merged.score, Some((90.0 + 90.0 + 100.0) / 3.0));
        assert_eq!(merged.level_aa, Some(Compliance::Warning));
    }
}
