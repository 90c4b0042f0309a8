use crate::model::{AccessibilityReport, ArchitectureQuality, PageContent, Readability, SeoReport};

use super::graph::GraphAnalysis;

/// Mean depth beyond which structure starts losing points.
const COMFORTABLE_DEPTH: f64 = 3.0;

/// Probe rules that speak to keyboard and landmark navigation.
const NAVIGATION_RULES: &[&str] = &[
    "aria", "bypass", "focus", "keyboard", "tabindex", "skip-link", "landmark", "region",
    "link-name",
];

/// Share of audited pages without keyboard/ARIA navigation violations.
/// `None` when no page was audited.
pub fn navigation_signal<'a>(reports: impl IntoIterator<Item = &'a AccessibilityReport>) -> Option<f64> {
    let (mut audited, mut clean) = (0usize, 0usize);
    for r in reports.into_iter().filter(|r| r.rules_checked > 0) {
        audited += 1;
        let blocked = r
            .violations
            .iter()
            .any(|v| NAVIGATION_RULES.iter().any(|rule| v.rule_id.contains(rule)));
        if !blocked {
            clean += 1;
        }
    }
    (audited > 0).then(|| clean as f64 / audited as f64)
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Each sub-score is 0–100.
///
/// - structure: reachable share of pages, scaled down once the mean depth
///   exceeds three clicks.
/// - navigation: 1 − orphan ratio, times 1 − broken-link ratio, times
///   0.5 + 0.5 × navigation signal (1 when no page was audited).
/// - content: 1 − thin-page ratio, blended 70/30 with reading ease when it
///   is measurable.
/// - seo: the SEO report score.
pub fn architecture_quality(
    graph: &GraphAnalysis,
    pages: &[PageContent],
    readability: &Readability,
    seo: &SeoReport,
    nav_signal: Option<f64>,
    thin_content_words: usize,
) -> ArchitectureQuality {
    let nodes = graph.graph.nodes.len();
    if nodes == 0 {
        return ArchitectureQuality::default();
    }
    let n = nodes as f64;

    let reachable = (nodes - graph.unreachable_pages.len()) as f64 / n;
    let depth_factor = match graph.depth.mean {
        Some(mean) if mean > COMFORTABLE_DEPTH => COMFORTABLE_DEPTH / mean,
        _ => 1.0,
    };
    let structure = 100.0 * reachable * depth_factor;

    let orphan_ratio = graph.orphan_pages.len() as f64 / n;
    let link_total = graph.graph.edges.len() + graph.broken_links.len();
    let broken_ratio = if link_total == 0 {
        0.0
    } else {
        graph.broken_links.len() as f64 / link_total as f64
    };
    let nav_factor = 0.5 + 0.5 * nav_signal.unwrap_or(1.0);
    let navigation = 100.0 * (1.0 - orphan_ratio) * (1.0 - broken_ratio) * nav_factor;

    let thin = pages.iter().filter(|p| p.word_count < thin_content_words).count();
    let substance = if pages.is_empty() {
        0.0
    } else {
        1.0 - thin as f64 / pages.len() as f64
    };
    let content = match readability.flesch_reading_ease {
        Some(ease) => 100.0 * (0.7 * substance + 0.3 * ease.clamp(0.0, 100.0) / 100.0),
        None => 100.0 * substance,
    };

    let seo_score = seo.score;
    ArchitectureQuality {
        structure: round1(structure),
        navigation: round1(navigation),
        content: round1(content),
        seo: round1(seo_score),
        overall: round1((structure + navigation + content + seo_score) / 4.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LinkGraph, Severity, Violation, ViolationSource, WcagLevel};

    fn graph(nodes: usize, orphans: usize) -> GraphAnalysis {
        GraphAnalysis {
            graph: LinkGraph {
                nodes: (0..nodes).map(|i| format!("p{i}")).collect(),
                edges: vec![],
            },
            orphan_pages: (0..orphans).map(|i| format!("p{i}")).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn orphans_lower_navigation() {
        let seo = SeoReport {
            score: 100.0,
            ..Default::default()
        };
        let tidy = architecture_quality(&graph(4, 0), &[], &Readability::default(), &seo, None, 300);
        let messy = architecture_quality(&graph(4, 2), &[], &Readability::default(), &seo, None, 300);
        assert_eq!(tidy.navigation, 100.0);
        assert_eq!(messy.navigation, 50.0);
    }

    #[test]
    fn aria_violations_weaken_navigation_signal() {
        let bad = AccessibilityReport {
            rules_checked: 20,
            violations: vec![Violation {
                rule_id: "aria-required-children".into(),
                severity: Severity::Serious,
                wcag_level: WcagLevel::AA,
                description: String::new(),
                selector: "nav ul".into(),
                pages: vec!["a".into()],
                source: ViolationSource::Probe,
            }],
            ..Default::default()
        };
        let good = AccessibilityReport {
            rules_checked: 20,
            ..Default::default()
        };
        let unaudited = AccessibilityReport::default();
        assert_eq!(navigation_signal([&bad, &good, &unaudited]), Some(0.5));
        assert_eq!(navigation_signal([&unaudited]), None);
    }

    #[test]
    fn empty_graph_scores_zero() {
        let q = architecture_quality(
            &GraphAnalysis::default(),
            &[],
            &Readability::default(),
            &SeoReport::default(),
            None,
            300,
        );
        assert_eq!(q.overall, 0.0);
    }
}
