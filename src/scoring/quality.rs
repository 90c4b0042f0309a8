use std::collections::BTreeSet;

use crate::config::{QualityWeights, TypographyConfig};
use crate::model::{
    AccessibilityReport, ColorSystem, PatternCatalog, PerformanceReport, QualityScore,
    SpacingScale, SubScore, Typography,
};

/// Everything the quality score is derived from, for one page or a whole run.
pub struct QualityInputs<'a> {
    pub colors: &'a ColorSystem,
    pub typography: &'a Typography,
    pub heading_order: Option<f64>,
    pub spacing: &'a SpacingScale,
    pub accessibility: &'a AccessibilityReport,
    pub patterns: &'a PatternCatalog,
    pub performance: &'a PerformanceReport,
    pub modernity: Option<f64>,
}

fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

fn color_consistency(colors: &ColorSystem) -> Option<f64> {
    (colors.sample_count > 0).then(|| colors.clustered_count as f64 / colors.sample_count as f64)
}

/// Fit quality blended with heading size ordering. A residual of twice the
/// tolerance or more scores 0.
fn typography_hierarchy(typo: &Typography, heading_order: Option<f64>, cfg: &TypographyConfig) -> Option<f64> {
    let mut parts = Vec::new();
    if typo.scale.len() >= 2 {
        let residual = typo.fit_residual.unwrap_or(0.0);
        let span = 2.0 * cfg.fit_tolerance;
        let fit = if span > 0.0 {
            (1.0 - residual / span).clamp(0.0, 1.0)
        } else if residual == 0.0 {
            1.0
        } else {
            0.0
        };
        parts.push(fit);
    }
    parts.extend(heading_order);
    mean(&parts)
}

fn spacing_regularity(spacing: &SpacingScale) -> Option<f64> {
    (spacing.sample_count > 0).then(|| spacing.regular_count as f64 / spacing.sample_count as f64)
}

/// Mean instance confidence, reduced when a type fragments into many shapes.
pub fn pattern_consistency(catalog: &PatternCatalog) -> Option<f64> {
    if catalog.instance_count == 0 {
        return None;
    }
    let mut fingerprints = BTreeSet::new();
    let mut confidence_sum = 0.0;
    for (pattern_type, variants) in &catalog.variants {
        for v in variants {
            confidence_sum += v.mean_confidence * v.instances as f64;
            for fp in &v.fingerprints {
                fingerprints.insert((*pattern_type, fp.as_str()));
            }
        }
    }
    let instances = catalog.instance_count as f64;
    let extra_shapes = fingerprints.len().saturating_sub(catalog.variants.len()) as f64;
    let fragmentation = (extra_shapes / instances).min(1.0);
    let mean_confidence = confidence_sum / instances;
    Some((mean_confidence * (1.0 - 0.5 * fragmentation)).clamp(0.0, 1.0))
}

fn weight_of(weights: &QualityWeights, sub: SubScore) -> f64 {
    match sub {
        SubScore::ColorConsistency => weights.color_consistency,
        SubScore::TypographyHierarchy => weights.typography_hierarchy,
        SubScore::SpacingRegularity => weights.spacing_regularity,
        SubScore::AccessibilityCompliance => weights.accessibility_compliance,
        SubScore::PatternConsistency => weights.pattern_consistency,
        SubScore::PerformanceOptimization => weights.performance_optimization,
        SubScore::Modernity => weights.modernity,
    }
}

/// Weighted mean of the sub-scores that have data. Missing sub-scores drop
/// out of both numerator and denominator.
pub fn overall(score: &QualityScore, weights: &QualityWeights) -> Option<f64> {
    let (mut sum, mut total) = (0.0, 0.0);
    for sub in SubScore::ALL {
        let w = weight_of(weights, sub);
        if let Some(v) = score.get(sub).filter(|_| w > 0.0) {
            sum += v * w;
            total += w;
        }
    }
    (total > 0.0).then(|| sum / total)
}

pub fn score_quality(
    inputs: &QualityInputs<'_>,
    weights: &QualityWeights,
    typography: &TypographyConfig,
) -> QualityScore {
    let mut score = QualityScore {
        overall: None,
        color_consistency: color_consistency(inputs.colors),
        typography_hierarchy: typography_hierarchy(inputs.typography, inputs.heading_order, typography),
        spacing_regularity: spacing_regularity(inputs.spacing),
        accessibility_compliance: inputs.accessibility.score.map(|s| s / 100.0),
        pattern_consistency: pattern_consistency(inputs.patterns),
        performance_optimization: inputs.performance.score.map(|s| s / 100.0),
        modernity: inputs.modernity,
    };
    score.overall = overall(&score, weights);
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PatternType, VariantSummary};
    use std::collections::BTreeMap;

    #[test]
    fn missing_subscores_are_excluded() {
        let colors = ColorSystem {
            sample_count: 10,
            clustered_count: 8,
            ..Default::default()
        };
        let accessibility = AccessibilityReport {
            score: Some(60.0),
            ..Default::default()
        };
        let inputs = QualityInputs {
            colors: &colors,
            typography: &Typography::default(),
            heading_order: None,
            spacing: &SpacingScale::default(),
            accessibility: &accessibility,
            patterns: &PatternCatalog::default(),
            performance: &PerformanceReport::default(),
            modernity: None,
        };
        let q = score_quality(&inputs, &QualityWeights::default(), &TypographyConfig::default());
        assert_eq!(q.color_consistency, Some(0.8));
        assert_eq!(q.spacing_regularity, None);
        assert_eq!(q.missing().len(), 5);
        assert!((q.overall.unwrap() - 0.7).abs() < 1e-9);
    }

    #[test]
    fn nothing_measured_no_overall() {
        let q = QualityScore::default();
        assert_eq!(overall(&q, &QualityWeights::default()), None);
    }

    #[test]
    fn weights_shift_overall() {
        let q = QualityScore {
            color_consistency: Some(1.0),
            modernity: Some(0.0),
            ..Default::default()
        };
        let weights = QualityWeights {
            color_consistency: 3.0,
            ..Default::default()
        };
        assert_eq!(overall(&q, &weights), Some(0.75));
    }

    #[test]
    fn fragmented_patterns_score_lower() {
        let variant = |fps: &[&str], instances| VariantSummary {
            name: "v".into(),
            fingerprints: fps.iter().map(|s| s.to_string()).collect(),
            instances,
            mean_confidence: 0.8,
        };
        let tidy = PatternCatalog {
            variants: BTreeMap::from([(PatternType::Cards, vec![variant(&["a"], 4)])]),
            instance_count: 4,
            ..Default::default()
        };
        let messy = PatternCatalog {
            variants: BTreeMap::from([(PatternType::Cards, vec![variant(&["a", "b", "c", "d"], 4)])]),
            instance_count: 4,
            ..Default::default()
        };
        let tidy_score = pattern_consistency(&tidy).unwrap();
        let messy_score = pattern_consistency(&messy).unwrap();
        assert!((tidy_score - 0.8).abs() < 1e-9);
        assert!(messy_score < tidy_score);
    }
}
