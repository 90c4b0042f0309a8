use std::collections::BTreeSet;

use crate::model::PatternCatalog;

const LAYOUT_FEATURES: &[&str] = &["grid", "flex", "flexbox", "container-queries"];
const IMAGE_FEATURES: &[&str] = &["webp", "avif", "srcset", "picture", "lazy-loading"];
const RESPONSIVE_FEATURES: &[&str] = &["media-queries", "viewport-meta"];
const DEPRECATED_FEATURES: &[&str] = &[
    "font-tag",
    "center-tag",
    "marquee",
    "blink",
    "frameset",
    "table-layout",
];

/// What the collector observed about the page technology.
#[derive(Debug, Default)]
pub struct ModernitySignals<'a> {
    /// Lowercased feature probe names.
    pub features: BTreeSet<String>,
    pub custom_property_count: usize,
    pub viewport_count: usize,
    pub patterns: Option<&'a PatternCatalog>,
}

impl ModernitySignals<'_> {
    fn has_any(&self, names: &[&str]) -> bool {
        names.iter().any(|n| self.features.contains(*n))
    }
}

/// Share of checklist items passed. Without any feature probe there is
/// nothing to judge and the result is `None`.
pub fn modernity_score(signals: &ModernitySignals<'_>) -> Option<f64> {
    if signals.features.is_empty() {
        return None;
    }
    let mut checks = vec![
        signals.has_any(LAYOUT_FEATURES),
        signals.custom_property_count > 0 || signals.features.contains("custom-properties"),
        signals.viewport_count >= 2 || signals.has_any(RESPONSIVE_FEATURES),
        signals.has_any(IMAGE_FEATURES),
        !signals.has_any(DEPRECATED_FEATURES),
    ];
    if let Some(catalog) = signals.patterns.filter(|c| !c.patterns.is_empty()) {
        checks.push(catalog.patterns.iter().any(|p| p.signals.semantic_tag));
    }
    let passed = checks.iter().filter(|c| **c).count();
    Some(passed as f64 / checks.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn no_probes_no_score() {
        assert_eq!(modernity_score(&ModernitySignals::default()), None);
    }

    #[test]
    fn modern_stack_scores_full() {
        let signals = ModernitySignals {
            features: features(&["grid", "webp", "media-queries"]),
            custom_property_count: 3,
            viewport_count: 1,
            patterns: None,
        };
        assert_eq!(modernity_score(&signals), Some(1.0));
    }

    #[test]
    fn deprecated_markup_costs_a_check() {
        let signals = ModernitySignals {
            features: features(&["table-layout", "marquee"]),
            custom_property_count: 0,
            viewport_count: 2,
            patterns: None,
        };
        // only the responsive check passes
        assert_eq!(modernity_score(&signals), Some(0.2));
    }
}
