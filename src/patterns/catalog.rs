use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use super::classify::Classified;
use crate::config::PatternConfig;
use crate::model::{PatternCatalog, PatternType, UIPattern, VariantSummary};

const DEFAULT_VARIANT: &str = "default";
const OTHER_VARIANT: &str = "other";

struct Group<'a> {
    fingerprint: &'a str,
    members: Vec<&'a Classified>,
}

fn mean_confidence(members: &[&Classified]) -> f64 {
    if members.is_empty() {
        return 0.0;
    }
    members.iter().map(|c| c.confidence).sum::<f64>() / members.len() as f64
}

/// Group one type's instances by fingerprint and name the variants.
/// Returns the summaries and a fingerprint -> variant name lookup.
fn variants_for<'a>(
    instances: &[&'a Classified],
    cfg: &PatternConfig,
) -> (Vec<VariantSummary>, HashMap<&'a str, String>) {
    let mut groups: Vec<Group<'a>> = Vec::new();
    for &inst in instances {
        match groups.iter_mut().find(|g| g.fingerprint == inst.fingerprint) {
            Some(g) => g.members.push(inst),
            None => groups.push(Group {
                fingerprint: &inst.fingerprint,
                members: vec![inst],
            }),
        }
    }

    let mut names: HashMap<&'a str, String> = HashMap::new();
    if groups.len() == 1 {
        let g = &groups[0];
        names.insert(g.fingerprint, DEFAULT_VARIANT.to_string());
        let summary = VariantSummary {
            name: DEFAULT_VARIANT.to_string(),
            fingerprints: vec![g.fingerprint.to_string()],
            instances: g.members.len(),
            mean_confidence: mean_confidence(&g.members),
        };
        return (vec![summary], names);
    }

    let (mut kept, small): (Vec<Group>, Vec<Group>) = groups
        .into_iter()
        .partition(|g| g.members.len() >= cfg.min_variant_instances);
    // stable: equal sizes keep first-seen order
    kept.sort_by(|a, b| b.members.len().cmp(&a.members.len()));

    let mut summaries = Vec::new();
    for (i, g) in kept.iter().enumerate() {
        let name = format!("variant-{}", i + 1);
        names.insert(g.fingerprint, name.clone());
        summaries.push(VariantSummary {
            name,
            fingerprints: vec![g.fingerprint.to_string()],
            instances: g.members.len(),
            mean_confidence: mean_confidence(&g.members),
        });
    }

    if !small.is_empty() {
        let members: Vec<&Classified> = small.iter().flat_map(|g| g.members.iter().copied()).collect();
        for g in &small {
            names.insert(g.fingerprint, OTHER_VARIANT.to_string());
        }
        summaries.push(VariantSummary {
            name: OTHER_VARIANT.to_string(),
            fingerprints: small.iter().map(|g| g.fingerprint.to_string()).collect(),
            instances: members.len(),
            mean_confidence: mean_confidence(&members),
        });
    }

    (summaries, names)
}

/// Build the published catalog from every classified instance of a run (or
/// page). Instances below the confidence floor shape the variant statistics
/// but are never published.
pub fn build_catalog(instances: &[Classified], cfg: &PatternConfig) -> PatternCatalog {
    let mut by_type: BTreeMap<PatternType, Vec<&Classified>> = BTreeMap::new();
    for inst in instances {
        by_type.entry(inst.pattern_type).or_default().push(inst);
    }

    let mut catalog = PatternCatalog {
        instance_count: instances.len(),
        low_confidence_count: instances
            .iter()
            .filter(|c| c.confidence < cfg.min_confidence)
            .count(),
        ..Default::default()
    };

    for (pattern_type, mut members) in by_type {
        members.sort_by_key(|c| c.seq);
        let (summaries, names) = variants_for(&members, cfg);

        let mut published: Vec<&Classified> = members
            .iter()
            .copied()
            .filter(|c| c.confidence >= cfg.min_confidence)
            .collect();
        published.sort_by(|a, b| b.confidence.total_cmp(&a.confidence).then(a.seq.cmp(&b.seq)));
        published.truncate(cfg.max_patterns_per_type);

        for c in published {
            catalog.patterns.push(UIPattern {
                pattern_type,
                variant: names
                    .get(c.fingerprint.as_str())
                    .cloned()
                    .unwrap_or_else(|| OTHER_VARIANT.to_string()),
                confidence: c.confidence,
                page: c.page.clone(),
                selector: c.selector.clone(),
                fingerprint: c.fingerprint.clone(),
                signals: c.signals.clone(),
                content: c.content.clone(),
            });
        }
        catalog.variants.insert(pattern_type, summaries);
    }

    debug!(
        instances = catalog.instance_count,
        published = catalog.patterns.len(),
        "built pattern catalog"
    );
    catalog
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContentSummary, PatternSignals};

    fn inst(t: PatternType, fp: &str, confidence: f64, seq: usize) -> Classified {
        Classified {
            pattern_type: t,
            score: confidence,
            confidence,
            seq,
            page: "https://a.test/".to_string(),
            selector: format!("#el{seq}"),
            fingerprint: fp.to_string(),
            signals: PatternSignals::default(),
            content: ContentSummary::default(),
        }
    }

    #[test]
    fn single_fingerprint_is_default_variant() {
        let all = vec![inst(PatternType::Navigation, "nav[ul]", 0.9, 0)];
        let catalog = build_catalog(&all, &PatternConfig::default());
        assert_eq!(catalog.patterns.len(), 1);
        assert_eq!(catalog.patterns[0].variant, "default");
    }

    #[test]
    fn singleton_variants_merge_into_other() {
        let all = vec![
            inst(PatternType::Cards, "div[article*4]", 0.9, 0),
            inst(PatternType::Cards, "div[article*4]", 0.8, 1),
            inst(PatternType::Cards, "ul[li*2]", 0.7, 2),
            inst(PatternType::Cards, "section[div*7]", 0.6, 3),
        ];
        let catalog = build_catalog(&all, &PatternConfig::default());
        let variants = &catalog.variants[&PatternType::Cards];
        assert_eq!(variants.len(), 2);
        assert_eq!(variants[0].name, "variant-1");
        assert_eq!(variants[0].instances, 2);
        assert_eq!(variants[1].name, "other");
        assert_eq!(variants[1].fingerprints.len(), 2);
    }

    #[test]
    fn low_confidence_excluded_from_catalog_only() {
        let all = vec![
            inst(PatternType::Form, "form[input*2]", 0.9, 0),
            inst(PatternType::Form, "form[input*2]", 0.2, 1),
        ];
        let catalog = build_catalog(&all, &PatternConfig::default());
        assert_eq!(catalog.patterns.len(), 1);
        assert_eq!(catalog.instance_count, 2);
        assert_eq!(catalog.low_confidence_count, 1);
        assert_eq!(catalog.variants[&PatternType::Form][0].instances, 2);
    }

    #[test]
    fn cap_ranks_by_confidence_then_order() {
        let cfg = PatternConfig {
            max_patterns_per_type: 2,
            ..Default::default()
        };
        let all = vec![
            inst(PatternType::Hero, "header[div]", 0.7, 0),
            inst(PatternType::Hero, "header[div]", 0.9, 1),
            inst(PatternType::Hero, "header[div]", 0.7, 2),
        ];
        let catalog = build_catalog(&all, &cfg);
        let selectors: Vec<&str> = catalog.patterns.iter().map(|p| p.selector.as_str()).collect();
        assert_eq!(selectors, vec!["#el1", "#el0"]);
    }
}
