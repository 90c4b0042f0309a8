use std::collections::HashSet;

use crate::config::ExtractionConfig;
use crate::error::Diagnostic;
use crate::model::{
    AccessibilityReport, BrandExtractionResult, BrandProfile, Compliance, ContentInventory,
    DesignTokens, ExtractionResult, InformationArchitecture, PageReport, PatternCatalog,
    PerformanceReport, Priority, QualityScore, Recommendation, RunMetadata, ScaleMethod,
    SeoReport, Severity, ViolationSource,
};

const LOW_CONSISTENCY: f64 = 0.8;
const LOW_PATTERN_CONSISTENCY: f64 = 0.6;
const LOW_MODERNITY: f64 = 0.5;
const DEEP_PAGE: usize = 3;

struct Rule<F> {
    id: &'static str,
    category: &'static str,
    priority: Priority,
    check: F,
}

/// First `max` rules that fire, in rule order, one per id.
fn first_matching<F>(
    rules: &[Rule<F>],
    max: usize,
    mut fire: impl FnMut(&F) -> Option<String>,
) -> Vec<Recommendation> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for rule in rules {
        if out.len() >= max {
            break;
        }
        if seen.contains(rule.id) {
            continue;
        }
        if let Some(message) = fire(&rule.check) {
            seen.insert(rule.id);
            out.push(Recommendation {
                id: rule.id.to_string(),
                category: rule.category.to_string(),
                priority: rule.priority,
                message,
            });
        }
    }
    out
}

/// Scored outputs of a design extraction.
#[derive(Debug, Clone, Default)]
pub struct DesignParts {
    pub tokens: DesignTokens,
    pub patterns: PatternCatalog,
    pub quality: QualityScore,
    pub accessibility: AccessibilityReport,
    pub performance: PerformanceReport,
    pub pages: Vec<PageReport>,
}

type DesignCheck = fn(&DesignParts) -> Option<String>;

fn critical_violations(p: &DesignParts) -> Option<String> {
    let n = p.accessibility.by_severity.get(&Severity::Critical).copied().unwrap_or(0);
    (n > 0).then(|| {
        let rule = p
            .accessibility
            .violations
            .iter()
            .find(|v| v.severity == Severity::Critical)
            .map(|v| v.rule_id.as_str())
            .unwrap_or("unknown");
        format!("Fix {n} critical accessibility violation(s), starting with `{rule}`.")
    })
}

fn contrast_failures(p: &DesignParts) -> Option<String> {
    let n = p.tokens.colors.contrast_violations.len();
    let derived = p
        .accessibility
        .violations
        .iter()
        .any(|v| v.source == ViolationSource::Derived);
    (n > 0 || derived).then(|| {
        format!("Raise text contrast: {n} color pairing(s) fall below the WCAG AA ratio.")
    })
}

fn failing_metrics(p: &DesignParts) -> Option<String> {
    let failing: Vec<String> = p
        .performance
        .metrics
        .iter()
        .filter(|m| m.compliance == Compliance::Fail)
        .map(|m| format!("{:?}", m.metric).to_lowercase())
        .collect();
    (!failing.is_empty()).then(|| format!("Over budget by more than 20%: {}.", failing.join(", ")))
}

fn color_outliers(p: &DesignParts) -> Option<String> {
    let score = p.quality.color_consistency?;
    (score < LOW_CONSISTENCY).then(|| {
        format!(
            "Consolidate the palette: {} one-off color(s) sit outside the token set.",
            p.tokens.colors.outliers.len()
        )
    })
}

fn typography_fallback(p: &DesignParts) -> Option<String> {
    let t = &p.tokens.typography;
    (t.method == ScaleMethod::Raw && t.fallback_reason.is_some()).then(|| {
        format!(
            "Font sizes follow no modular scale ({} distinct sizes); adopt a type ratio.",
            t.scale.len()
        )
    })
}

fn irregular_spacing(p: &DesignParts) -> Option<String> {
    let score = p.quality.spacing_regularity?;
    (score < LOW_CONSISTENCY).then(|| {
        let base = p
            .tokens
            .spacing
            .base_unit
            .map(|b| format!("{b}px"))
            .unwrap_or_else(|| "a base unit".to_string());
        format!(
            "Snap {} irregular spacing value(s) to multiples of {base}.",
            p.tokens.spacing.irregular.len()
        )
    })
}

fn fragmented_patterns(p: &DesignParts) -> Option<String> {
    let score = p.quality.pattern_consistency?;
    (score < LOW_PATTERN_CONSISTENCY)
        .then(|| "Component structure varies widely; unify repeated UI patterns.".to_string())
}

fn dated_stack(p: &DesignParts) -> Option<String> {
    let score = p.quality.modernity?;
    (score < LOW_MODERNITY)
        .then(|| "Adopt modern layout and image primitives; deprecated markup was detected.".to_string())
}

fn warning_metrics(p: &DesignParts) -> Option<String> {
    let warned: Vec<String> = p
        .performance
        .metrics
        .iter()
        .filter(|m| m.compliance == Compliance::Warning)
        .map(|m| format!("{:?}", m.metric).to_lowercase())
        .collect();
    (!warned.is_empty()).then(|| format!("Slightly over budget: {}.", warned.join(", ")))
}

fn missing_data(p: &DesignParts) -> Option<String> {
    let missing = p.quality.missing();
    (!missing.is_empty()).then(|| {
        let names: Vec<String> = missing.iter().map(|s| format!("{s:?}")).collect();
        format!("Collect more samples; no data for {}.", names.join(", "))
    })
}

static DESIGN_RULES: &[Rule<DesignCheck>] = &[
    Rule { id: "a11y-critical", category: "accessibility", priority: Priority::High, check: critical_violations },
    Rule { id: "a11y-contrast", category: "accessibility", priority: Priority::High, check: contrast_failures },
    Rule { id: "perf-budget-fail", category: "performance", priority: Priority::High, check: failing_metrics },
    Rule { id: "color-outliers", category: "design", priority: Priority::Medium, check: color_outliers },
    Rule { id: "type-scale", category: "design", priority: Priority::Medium, check: typography_fallback },
    Rule { id: "spacing-irregular", category: "design", priority: Priority::Medium, check: irregular_spacing },
    Rule { id: "pattern-fragmentation", category: "design", priority: Priority::Low, check: fragmented_patterns },
    Rule { id: "modernity", category: "design", priority: Priority::Low, check: dated_stack },
    Rule { id: "perf-budget-warning", category: "performance", priority: Priority::Low, check: warning_metrics },
    Rule { id: "insufficient-data", category: "data", priority: Priority::Low, check: missing_data },
];

/// Outputs of a brand and architecture extraction.
#[derive(Debug, Clone, Default)]
pub struct BrandParts {
    pub brand: BrandProfile,
    pub content: ContentInventory,
    pub architecture: InformationArchitecture,
    pub seo: SeoReport,
}

struct BrandFacts<'a> {
    parts: &'a BrandParts,
    thin_content_words: usize,
}

type BrandCheck = fn(&BrandFacts<'_>) -> Option<String>;

fn broken_links(f: &BrandFacts<'_>) -> Option<String> {
    let n = f.parts.architecture.broken_links.len();
    (n > 0).then(|| format!("Repair {n} broken internal link(s)."))
}

fn orphan_pages(f: &BrandFacts<'_>) -> Option<String> {
    let n = f.parts.architecture.orphan_pages.len();
    (n > 0).then(|| format!("Link to {n} orphan page(s) from the site navigation."))
}

fn missing_titles(f: &BrandFacts<'_>) -> Option<String> {
    let n = f.parts.seo.missing_titles.len();
    (n > 0).then(|| format!("Add titles to {n} page(s)."))
}

fn unreachable(f: &BrandFacts<'_>) -> Option<String> {
    let n = f.parts.architecture.unreachable_pages.len();
    (n > 0).then(|| format!("{n} page(s) cannot be reached from the home page."))
}

fn duplicate_titles(f: &BrandFacts<'_>) -> Option<String> {
    let n = f.parts.seo.duplicate_titles.len();
    (n > 0).then(|| format!("Make {n} shared page title(s) unique."))
}

fn missing_descriptions(f: &BrandFacts<'_>) -> Option<String> {
    let n = f.parts.seo.missing_descriptions.len();
    (n > 0).then(|| format!("Write meta descriptions for {n} page(s)."))
}

fn heading_structure(f: &BrandFacts<'_>) -> Option<String> {
    let seo = &f.parts.seo;
    let n = seo.missing_h1.len() + seo.multiple_h1.len();
    (n > 0).then(|| format!("Give each page exactly one h1 ({n} page(s) do not)."))
}

fn thin_content(f: &BrandFacts<'_>) -> Option<String> {
    let n = f
        .parts
        .content
        .pages
        .iter()
        .filter(|p| p.word_count < f.thin_content_words)
        .count();
    (n > 0).then(|| {
        format!(
            "Expand {n} page(s) with fewer than {} words.",
            f.thin_content_words
        )
    })
}

fn deep_pages(f: &BrandFacts<'_>) -> Option<String> {
    let max = f.parts.architecture.depth.max?;
    (max > DEEP_PAGE).then(|| format!("Flatten navigation: some pages sit {max} clicks deep."))
}

fn canonical_gaps(f: &BrandFacts<'_>) -> Option<String> {
    let coverage = f.parts.seo.canonical_coverage;
    (f.parts.content.total_pages > 0 && coverage < 1.0).then(|| {
        format!(
            "Declare canonical URLs; only {:.0}% of pages do.",
            coverage * 100.0
        )
    })
}

fn incomplete_crawl(f: &BrandFacts<'_>) -> Option<String> {
    f.parts
        .architecture
        .incomplete
        .then(|| "Re-run the crawl; architecture metrics cover a partial site.".to_string())
}

static BRAND_RULES: &[Rule<BrandCheck>] = &[
    Rule { id: "broken-links", category: "architecture", priority: Priority::High, check: broken_links },
    Rule { id: "orphan-pages", category: "architecture", priority: Priority::High, check: orphan_pages },
    Rule { id: "seo-missing-titles", category: "seo", priority: Priority::High, check: missing_titles },
    Rule { id: "unreachable-pages", category: "architecture", priority: Priority::Medium, check: unreachable },
    Rule { id: "seo-duplicate-titles", category: "seo", priority: Priority::Medium, check: duplicate_titles },
    Rule { id: "seo-missing-descriptions", category: "seo", priority: Priority::Medium, check: missing_descriptions },
    Rule { id: "seo-h1", category: "seo", priority: Priority::Medium, check: heading_structure },
    Rule { id: "thin-content", category: "content", priority: Priority::Medium, check: thin_content },
    Rule { id: "deep-pages", category: "architecture", priority: Priority::Low, check: deep_pages },
    Rule { id: "seo-canonical", category: "seo", priority: Priority::Low, check: canonical_gaps },
    Rule { id: "incomplete-crawl", category: "data", priority: Priority::Low, check: incomplete_crawl },
];

pub fn design_recommendations(parts: &DesignParts, max: usize) -> Vec<Recommendation> {
    first_matching(DESIGN_RULES, max, |check| check(parts))
}

pub fn brand_recommendations(parts: &BrandParts, cfg: &ExtractionConfig) -> Vec<Recommendation> {
    let facts = BrandFacts {
        parts,
        thin_content_words: cfg.content.thin_content_words,
    };
    first_matching(BRAND_RULES, cfg.recommendations.max_recommendations, |check| check(&facts))
}

pub fn assemble_design(
    metadata: RunMetadata,
    parts: DesignParts,
    diagnostics: Vec<Diagnostic>,
    cfg: &ExtractionConfig,
) -> ExtractionResult {
    let recommendations = design_recommendations(&parts, cfg.recommendations.max_recommendations);
    ExtractionResult {
        metadata,
        tokens: parts.tokens,
        patterns: parts.patterns,
        quality: parts.quality,
        accessibility: parts.accessibility,
        performance: parts.performance,
        pages: parts.pages,
        recommendations,
        diagnostics,
    }
}

pub fn assemble_brand(
    metadata: RunMetadata,
    parts: BrandParts,
    diagnostics: Vec<Diagnostic>,
    cfg: &ExtractionConfig,
) -> BrandExtractionResult {
    let recommendations = brand_recommendations(&parts, cfg);
    BrandExtractionResult {
        metadata,
        brand: parts.brand,
        content: parts.content,
        architecture: parts.architecture,
        seo: parts.seo,
        recommendations,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MetricResult, PerfMetric, Violation, WcagLevel};

    fn violation(severity: Severity) -> Violation {
        Violation {
            rule_id: "button-name".into(),
            severity,
            wcag_level: WcagLevel::A,
            description: String::new(),
            selector: "#buy".into(),
            pages: vec![],
            source: ViolationSource::Probe,
        }
    }

    fn scored_parts() -> DesignParts {
        let mut parts = DesignParts::default();
        parts.accessibility.violations = vec![violation(Severity::Critical)];
        parts.accessibility.by_severity.insert(Severity::Critical, 1);
        parts.performance.metrics = vec![MetricResult {
            metric: PerfMetric::Lcp,
            value: 4000.0,
            budget: 2500.0,
            ratio: 1.6,
            compliance: Compliance::Fail,
        }];
        parts.quality.color_consistency = Some(0.5);
        parts
    }

    #[test]
    fn rules_fire_in_order() {
        let recs = design_recommendations(&scored_parts(), 8);
        let ids: Vec<&str> = recs.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a11y-critical", "perf-budget-fail", "color-outliers", "insufficient-data"]);
        assert!(recs[1].message.contains("lcp"));
    }

    #[test]
    fn caps_at_max() {
        let recs = design_recommendations(&scored_parts(), 2);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].priority, Priority::High);
    }

    #[test]
    fn rule_ids_are_unique() {
        let mut ids: Vec<&str> = DESIGN_RULES.iter().map(|r| r.id).collect();
        ids.extend(BRAND_RULES.iter().map(|r| r.id));
        let unique: HashSet<&str> = ids.iter().copied().collect();
        assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn brand_rules_flag_orphans() {
        let mut parts = BrandParts::default();
        parts.architecture.orphan_pages = vec!["https://a.test/lost".into()];
        let recs = brand_recommendations(&parts, &ExtractionConfig::default());
        assert_eq!(recs[0].id, "orphan-pages");
    }
}
