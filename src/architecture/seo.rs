use std::collections::BTreeMap;

use crate::model::{PageContent, SeoReport};

/// Per page: unique title, description, exactly one h1, canonical link.
const CHECKS_PER_PAGE: usize = 4;

fn non_empty(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

pub fn seo_report(pages: &[PageContent]) -> SeoReport {
    let mut report = SeoReport::default();
    if pages.is_empty() {
        return report;
    }

    let mut by_title: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for page in pages {
        match non_empty(&page.title) {
            Some(title) => by_title.entry(title.to_string()).or_default().push(page.url.clone()),
            None => report.missing_titles.push(page.url.clone()),
        }
        if non_empty(&page.description).is_none() {
            report.missing_descriptions.push(page.url.clone());
        }
        match page.h1_count {
            0 => report.missing_h1.push(page.url.clone()),
            1 => {}
            _ => report.multiple_h1.push(page.url.clone()),
        }
    }
    report.duplicate_titles = by_title.into_iter().filter(|(_, urls)| urls.len() > 1).collect();

    let duplicated: usize = report.duplicate_titles.values().map(Vec::len).sum();
    let with_canonical = pages.iter().filter(|p| non_empty(&p.canonical).is_some()).count();
    let failures = report.missing_titles.len()
        + duplicated
        + report.missing_descriptions.len()
        + report.missing_h1.len()
        + report.multiple_h1.len()
        + (pages.len() - with_canonical);

    let total = (pages.len() * CHECKS_PER_PAGE) as f64;
    report.canonical_coverage = with_canonical as f64 / pages.len() as f64;
    report.score = 100.0 * (total - failures as f64) / total;
    report
}
