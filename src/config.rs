use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{PerfMetric, Severity};

const ENV_PREFIX: &str = "SITELENS";

/// Tunable thresholds for every stage. All sections fall back to their
/// defaults field by field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub color: ColorConfig,
    pub typography: TypographyConfig,
    pub spacing: SpacingConfig,
    pub patterns: PatternConfig,
    pub scoring: ScoringConfig,
    pub content: ContentConfig,
    pub recommendations: RecommendationConfig,
}

impl ExtractionConfig {
    /// Defaults, then an optional file, then `SITELENS_*` environment
    /// variables (`__` separates sections, e.g. `SITELENS_SPACING__TOLERANCE`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&ExtractionConfig::default())?);
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        let settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HueRange {
    pub from: f64,
    pub to: f64,
}

impl HueRange {
    /// Ranges may wrap past 360°.
    pub fn contains(&self, hue: f64) -> bool {
        if self.from <= self.to {
            hue >= self.from && hue <= self.to
        } else {
            hue >= self.from || hue <= self.to
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    /// CIE76 ΔE below which two samples share a cluster.
    pub delta_e_threshold: f64,
    /// Clusters with fewer samples are outliers.
    pub min_cluster_size: usize,
    pub neutral_max_saturation: f64,
    pub semantic_min_saturation: f64,
    pub error_hue: HueRange,
    pub warning_hue: HueRange,
    pub success_hue: HueRange,
    pub info_hue: HueRange,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            delta_e_threshold: 10.0,
            min_cluster_size: 2,
            neutral_max_saturation: 0.10,
            semantic_min_saturation: 0.35,
            error_hue: HueRange { from: 345.0, to: 15.0 },
            warning_hue: HueRange { from: 30.0, to: 60.0 },
            success_hue: HueRange { from: 90.0, to: 160.0 },
            info_hue: HueRange { from: 190.0, to: 250.0 },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypographyConfig {
    pub size_rounding_px: f64,
    /// Maximum RMS residual of ln(size) accepted for a modular fit.
    pub fit_tolerance: f64,
}

impl Default for TypographyConfig {
    fn default() -> Self {
        Self {
            size_rounding_px: 0.5,
            fit_tolerance: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpacingConfig {
    /// Fraction of the base unit a value may deviate from a multiple.
    pub tolerance: f64,
    pub base_candidates: Vec<f64>,
}

impl Default for SpacingConfig {
    fn default() -> Self {
        Self {
            tolerance: 0.10,
            base_candidates: vec![2.0, 3.0, 4.0, 5.0, 6.0, 8.0, 10.0, 12.0, 16.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    pub min_type_score: f64,
    /// Floor for the published catalog; lower matches still feed scoring.
    pub min_confidence: f64,
    pub min_variant_instances: usize,
    pub max_patterns_per_type: usize,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            min_type_score: 0.4,
            min_confidence: 0.5,
            min_variant_instances: 2,
            max_patterns_per_type: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityWeights {
    pub color_consistency: f64,
    pub typography_hierarchy: f64,
    pub spacing_regularity: f64,
    pub accessibility_compliance: f64,
    pub pattern_consistency: f64,
    pub performance_optimization: f64,
    pub modernity: f64,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            color_consistency: 1.0,
            typography_hierarchy: 1.0,
            spacing_regularity: 1.0,
            accessibility_compliance: 1.0,
            pattern_consistency: 1.0,
            performance_optimization: 1.0,
            modernity: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityWeights {
    pub critical: f64,
    pub serious: f64,
    pub moderate: f64,
    pub minor: f64,
}

impl SeverityWeights {
    pub fn weight(&self, severity: Severity) -> f64 {
        match severity {
            Severity::Critical => self.critical,
            Severity::Serious => self.serious,
            Severity::Moderate => self.moderate,
            Severity::Minor => self.minor,
        }
    }
}

impl Default for SeverityWeights {
    fn default() -> Self {
        Self {
            critical: 40.0,
            serious: 20.0,
            moderate: 10.0,
            minor: 5.0,
        }
    }
}

/// Budgets in milliseconds, except `cls` which is unitless.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceBudgets {
    pub fcp: f64,
    pub lcp: f64,
    pub cls: f64,
    pub tbt: f64,
    pub ttfb: f64,
    pub tti: f64,
    pub speed_index: f64,
}

impl PerformanceBudgets {
    pub fn budget(&self, metric: PerfMetric) -> f64 {
        match metric {
            PerfMetric::Fcp => self.fcp,
            PerfMetric::Lcp => self.lcp,
            PerfMetric::Cls => self.cls,
            PerfMetric::Tbt => self.tbt,
            PerfMetric::Ttfb => self.ttfb,
            PerfMetric::Tti => self.tti,
            PerfMetric::SpeedIndex => self.speed_index,
        }
    }
}

impl Default for PerformanceBudgets {
    fn default() -> Self {
        Self {
            fcp: 1800.0,
            lcp: 2500.0,
            cls: 0.1,
            tbt: 200.0,
            ttfb: 800.0,
            tti: 3800.0,
            speed_index: 3400.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: QualityWeights,
    pub severity: SeverityWeights,
    pub budgets: PerformanceBudgets,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    pub top_keywords_per_page: usize,
    pub site_keywords: usize,
    pub min_cluster_pages: usize,
    /// Share of cluster members a keyword must exceed to join the cluster.
    pub co_occurrence_threshold: f64,
    pub thin_content_words: usize,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            top_keywords_per_page: 10,
            site_keywords: 50,
            min_cluster_pages: 2,
            co_occurrence_threshold: 0.5,
            thin_content_words: 300,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationConfig {
    pub max_recommendations: usize,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            max_recommendations: 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn hue_range_wraps() {
        let red = HueRange { from: 345.0, to: 15.0 };
        assert!(red.contains(350.0));
        assert!(red.contains(5.0));
        assert!(!red.contains(120.0));
    }

    #[test]
    fn load_defaults_without_file() {
        let cfg = ExtractionConfig::load(None).unwrap();
        assert_eq!(cfg.patterns.max_patterns_per_type, 5);
        assert_eq!(cfg.spacing.tolerance, 0.10);
    }

    #[test]
    fn file_overrides_single_field() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[patterns]\nmax_patterns_per_type = 2").unwrap();
        let cfg = ExtractionConfig::load(Some(file.path())).unwrap();
        assert_eq!(cfg.patterns.max_patterns_per_type, 2);
        assert_eq!(cfg.patterns.min_confidence, 0.5);
        assert_eq!(cfg.scoring.severity.critical, 40.0);
    }

    #[test]
    fn env_overrides_nested_field() {
        std::env::set_var("SITELENS_CONTENT__THIN_CONTENT_WORDS", "450");
        let cfg = ExtractionConfig::load(None);
        std::env::remove_var("SITELENS_CONTENT__THIN_CONTENT_WORDS");
        let cfg = cfg.unwrap();
        assert_eq!(cfg.content.thin_content_words, 450);
        assert_eq!(cfg.content.min_cluster_pages, 2);
    }
}
