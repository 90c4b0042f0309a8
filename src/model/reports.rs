use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::samples::{PerfMetric, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubScore {
    ColorConsistency,
    TypographyHierarchy,
    SpacingRegularity,
    AccessibilityCompliance,
    PatternConsistency,
    PerformanceOptimization,
    Modernity,
}

impl SubScore {
    pub const ALL: [SubScore; 7] = [
        SubScore::ColorConsistency,
        SubScore::TypographyHierarchy,
        SubScore::SpacingRegularity,
        SubScore::AccessibilityCompliance,
        SubScore::PatternConsistency,
        SubScore::PerformanceOptimization,
        SubScore::Modernity,
    ];
}

/// Sub-scores are `None` when they had no contributing samples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityScore {
    pub overall: Option<f64>,
    pub color_consistency: Option<f64>,
    pub typography_hierarchy: Option<f64>,
    pub spacing_regularity: Option<f64>,
    pub accessibility_compliance: Option<f64>,
    pub pattern_consistency: Option<f64>,
    pub performance_optimization: Option<f64>,
    pub modernity: Option<f64>,
}

impl QualityScore {
    pub fn get(&self, sub: SubScore) -> Option<f64> {
        match sub {
            SubScore::ColorConsistency => self.color_consistency,
            SubScore::TypographyHierarchy => self.typography_hierarchy,
            SubScore::SpacingRegularity => self.spacing_regularity,
            SubScore::AccessibilityCompliance => self.accessibility_compliance,
            SubScore::PatternConsistency => self.pattern_consistency,
            SubScore::PerformanceOptimization => self.performance_optimization,
            SubScore::Modernity => self.modernity,
        }
    }

    pub fn missing(&self) -> Vec<SubScore> {
        SubScore::ALL
            .into_iter()
            .filter(|s| self.get(*s).is_none())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WcagLevel {
    A,
    AA,
    AAA,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compliance {
    Pass,
    Warning,
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationSource {
    Probe,
    /// Synthesized from color contrast measurements.
    Derived,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub rule_id: String,
    pub severity: Severity,
    pub wcag_level: WcagLevel,
    pub description: String,
    pub selector: String,
    pub pages: Vec<String>,
    pub source: ViolationSource,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccessibilityReport {
    pub violations: Vec<Violation>,
    pub by_severity: BTreeMap<Severity, usize>,
    /// 0–100. `None` when no probe ran and nothing was measured.
    pub score: Option<f64>,
    pub level_a: Option<Compliance>,
    pub level_aa: Option<Compliance>,
    pub rules_checked: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricResult {
    pub metric: PerfMetric,
    pub value: f64,
    pub budget: f64,
    pub ratio: f64,
    pub compliance: Compliance,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub metrics: Vec<MetricResult>,
    /// 0–100. `None` without timing samples.
    pub score: Option<f64>,
}

impl PerformanceReport {
    pub fn compliance_of(&self, metric: PerfMetric) -> Option<Compliance> {
        self.metrics
            .iter()
            .find(|m| m.metric == metric)
            .map(|m| m.compliance)
    }
}
