pub mod catalog;
pub mod classify;

pub use catalog::build_catalog;
pub use classify::{classify, Classified};

use std::collections::HashSet;

use crate::config::PatternConfig;
use crate::model::DomCandidate;

/// Classify a page's candidates in document order. `seq_base` offsets the
/// page into the run-wide ordering. A candidate reported by several
/// viewports is classified once.
pub fn classify_page<'a>(
    page: &str,
    candidates: impl IntoIterator<Item = &'a DomCandidate>,
    seq_base: usize,
    cfg: &PatternConfig,
) -> Vec<Classified> {
    let mut seen = HashSet::new();
    let mut sorted: Vec<&DomCandidate> = candidates
        .into_iter()
        .filter(|c| seen.insert((c.order, c.selector.as_str())))
        .collect();
    sorted.sort_by_key(|c| c.order);
    sorted
        .into_iter()
        .enumerate()
        .filter_map(|(i, c)| classify(c, page, seq_base + i, cfg))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChildShape, PagePosition, PatternType};
    use std::collections::BTreeMap;

    fn nav(order: usize, selector: &str) -> DomCandidate {
        DomCandidate {
            order,
            selector: selector.to_string(),
            tag: "nav".to_string(),
            role: Some("navigation".to_string()),
            aria: BTreeMap::from([("label".to_string(), "Main".to_string())]),
            children: vec![ChildShape {
                tag: "ul".to_string(),
                child_count: 5,
                has_image: false,
                has_heading: false,
                has_link: true,
            }],
            link_count: 5,
            heading_levels: vec![],
            input_count: 0,
            button_count: 0,
            image_count: 0,
            position: Some(PagePosition::Top),
            text: "Home Pricing About Blog Contact".to_string(),
        }
    }

    #[test]
    fn same_candidate_from_two_viewports_counts_once() {
        let desktop = nav(0, "body > nav");
        let mobile = nav(0, "body > nav");
        let footer_nav = nav(9, "footer > nav");
        let classified = classify_page(
            "https://a.test/",
            [&desktop, &mobile, &footer_nav],
            10,
            &PatternConfig::default(),
        );
        let selectors: Vec<&str> = classified.iter().map(|c| c.selector.as_str()).collect();
        assert_eq!(selectors, vec!["body > nav", "footer > nav"]);
        assert_eq!(classified[0].pattern_type, PatternType::Navigation);
        assert_eq!(classified[1].seq, 11);
    }
}
