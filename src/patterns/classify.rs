use std::sync::LazyLock;

use regex::Regex;

use crate::config::PatternConfig;
use crate::model::{ChildShape, ContentSummary, DomCandidate, PagePosition, PatternSignals, PatternType};

static PRICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([$€£¥]\s?\d)|(\d+\s?(/\s?mo\b|/\s?month|/\s?year|per month|per year))").unwrap()
});

const HEADLINE_CHARS: usize = 80;

/// A candidate with its winning type, before variant assignment.
#[derive(Debug, Clone)]
pub struct Classified {
    pub pattern_type: PatternType,
    pub score: f64,
    pub confidence: f64,
    /// Global document order across the run (page order, then DOM order).
    pub seq: usize,
    pub page: String,
    pub selector: String,
    pub fingerprint: String,
    pub signals: PatternSignals,
    pub content: ContentSummary,
}

fn shape_key(c: &ChildShape) -> String {
    let mut key = c.tag.to_ascii_lowercase();
    if c.has_image {
        key.push_str("+img");
    }
    if c.has_heading {
        key.push_str("+h");
    }
    if c.has_link {
        key.push_str("+a");
    }
    key
}

/// Share of children matching the most common child shape.
fn child_uniformity(children: &[ChildShape]) -> f64 {
    if children.is_empty() {
        return 0.0;
    }
    let keys: Vec<String> = children.iter().map(shape_key).collect();
    let best = keys
        .iter()
        .map(|k| keys.iter().filter(|o| *o == k).count())
        .max()
        .unwrap_or(0);
    best as f64 / children.len() as f64
}

fn count_bucket(n: usize) -> &'static str {
    match n {
        1 => "",
        2..=3 => "*2",
        4..=6 => "*4",
        _ => "*7",
    }
}

/// Shape signature that ignores text: tag plus run-length collapsed children.
pub fn fingerprint(candidate: &DomCandidate) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut run: Option<(String, usize)> = None;
    for child in &candidate.children {
        let key = shape_key(child);
        match run.as_mut() {
            Some((k, n)) if *k == key => *n += 1,
            _ => {
                if let Some((k, n)) = run.take() {
                    parts.push(format!("{}{}", k, count_bucket(n)));
                }
                run = Some((key, 1));
            }
        }
    }
    if let Some((k, n)) = run {
        parts.push(format!("{}{}", k, count_bucket(n)));
    }
    format!("{}[{}]", candidate.tag.to_ascii_lowercase(), parts.join(","))
}

fn expected_tags(t: PatternType) -> &'static [&'static str] {
    match t {
        PatternType::Navigation => &["nav"],
        PatternType::Hero => &["header", "section"],
        PatternType::Cards => &["ul", "ol", "section"],
        PatternType::Form => &["form"],
        PatternType::Table => &["table"],
        PatternType::Pricing => &["section"],
        PatternType::Footer => &["footer"],
    }
}

fn expected_roles(t: PatternType) -> &'static [&'static str] {
    match t {
        PatternType::Navigation => &["navigation"],
        PatternType::Hero => &["banner", "region"],
        PatternType::Cards => &["list", "region", "feed"],
        PatternType::Form => &["form", "search"],
        PatternType::Table => &["table", "grid"],
        PatternType::Pricing => &["region", "list"],
        PatternType::Footer => &["contentinfo"],
    }
}

/// Weighted structural predicates per type; weights sum to 1. Only tag and
/// shape are consulted here so ARIA can never change the winning type.
fn predicates(c: &DomCandidate, t: PatternType) -> Vec<(f64, bool)> {
    let tag = c.tag.to_ascii_lowercase();
    let n_children = c.children.len();
    let uniform = n_children >= 2 && child_uniformity(&c.children) >= 0.75;
    match t {
        PatternType::Navigation => vec![
            (0.4, tag == "nav"),
            (0.3, c.link_count >= 3),
            (0.15, c.position == Some(PagePosition::Top)),
            (0.15, c.input_count == 0 && c.heading_levels.is_empty()),
        ],
        PatternType::Hero => vec![
            (0.3, c.heading_levels.contains(&1)),
            (0.2, c.position == Some(PagePosition::Top)),
            (0.2, c.button_count >= 1 || (1..=3).contains(&c.link_count)),
            (0.15, c.image_count >= 1),
            (0.15, n_children <= 4 && c.input_count == 0),
        ],
        PatternType::Cards => vec![
            (0.3, n_children >= 3),
            (0.35, n_children >= 3 && uniform),
            (
                0.2,
                n_children > 0
                    && c.children.iter().filter(|ch| ch.has_heading || ch.has_image).count() * 2
                        > n_children,
            ),
            (0.15, !PRICE_RE.is_match(&c.text)),
        ],
        PatternType::Form => vec![
            (0.4, tag == "form"),
            (0.4, c.input_count >= 1),
            (0.2, c.button_count >= 1),
        ],
        PatternType::Table => vec![
            (0.6, tag == "table"),
            (
                0.4,
                n_children >= 2
                    && c.children
                        .iter()
                        .all(|ch| matches!(ch.tag.as_str(), "tr" | "thead" | "tbody" | "tfoot")),
            ),
        ],
        PatternType::Pricing => vec![
            (0.45, PRICE_RE.is_match(&c.text)),
            (0.3, uniform),
            (0.25, c.button_count >= 1 || (n_children > 0 && c.link_count as usize >= n_children)),
        ],
        PatternType::Footer => vec![
            (0.5, tag == "footer"),
            (0.25, c.position == Some(PagePosition::Bottom)),
            (0.25, c.link_count >= 3),
        ],
    }
}

pub fn type_score(candidate: &DomCandidate, t: PatternType) -> f64 {
    let preds = predicates(candidate, t);
    let total: f64 = preds.iter().map(|(w, _)| w).sum();
    if total == 0.0 {
        return 0.0;
    }
    preds.iter().filter(|(_, hit)| *hit).map(|(w, _)| w).sum::<f64>() / total
}

fn signals_for(c: &DomCandidate, t: PatternType) -> PatternSignals {
    let tag = c.tag.to_ascii_lowercase();
    let role = c.role.as_deref().map(str::to_ascii_lowercase);
    PatternSignals {
        semantic_tag: expected_tags(t).contains(&tag.as_str()),
        landmark_role: role
            .as_deref()
            .is_some_and(|r| expected_roles(t).contains(&r)),
        aria_labelled: c.aria.keys().any(|k| k == "label" || k == "labelledby"),
        aria_attribute_count: c.aria.len(),
        interactive_count: c.link_count + c.button_count + c.input_count,
    }
}

/// Confidence multiplier in [0.55, 1.0]; every missing signal lowers it.
fn completeness(s: &PatternSignals) -> f64 {
    let present = [s.semantic_tag, s.landmark_role, s.aria_labelled]
        .iter()
        .filter(|b| **b)
        .count();
    (11 + 3 * present) as f64 / 20.0
}

fn summarize(c: &DomCandidate) -> ContentSummary {
    let headline = c
        .text
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(|l| l.chars().take(HEADLINE_CHARS).collect::<String>());
    ContentSummary {
        headline,
        word_count: c.text.split_whitespace().count(),
        link_count: c.link_count,
    }
}

/// Pick the best-scoring type. Ties keep the earlier declared type.
pub fn classify(
    candidate: &DomCandidate,
    page: &str,
    seq: usize,
    cfg: &PatternConfig,
) -> Option<Classified> {
    let mut best: Option<(PatternType, f64)> = None;
    for t in PatternType::ALL {
        let score = type_score(candidate, t);
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((t, score));
        }
    }
    let (pattern_type, score) = best.filter(|(_, s)| *s >= cfg.min_type_score)?;

    let signals = signals_for(candidate, pattern_type);
    let confidence = (score * completeness(&signals)).clamp(0.0, 1.0);
    Some(Classified {
        pattern_type,
        score,
        confidence,
        seq,
        page: page.to_string(),
        selector: candidate.selector.clone(),
        fingerprint: fingerprint(candidate),
        signals,
        content: summarize(candidate),
    })
}
