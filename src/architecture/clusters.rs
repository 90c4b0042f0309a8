use std::collections::BTreeMap;

use super::graph::normalize_url;
use crate::config::ContentConfig;
use crate::model::{ContentCluster, PageContent};

const MAX_CLUSTER_KEYWORDS: usize = 5;

/// Group pages by shared keywords. Seeds are keywords in descending document
/// frequency; each seed claims the not-yet-clustered pages that carry it,
/// then gathers the keywords present on more than the co-occurrence share
/// of its pages. Authority favors clusters with many inbound links and shallow
/// pages, normalized so the strongest cluster scores 100.
pub fn cluster_pages(
    pages: &[PageContent],
    depth: &BTreeMap<String, usize>,
    inbound: &BTreeMap<String, usize>,
    cfg: &ContentConfig,
) -> (Vec<ContentCluster>, Vec<String>) {
    let page_keywords: Vec<Vec<&str>> = pages
        .iter()
        .map(|p| p.keywords.iter().map(|k| k.keyword.as_str()).collect())
        .collect();

    let mut doc_freq: BTreeMap<&str, usize> = BTreeMap::new();
    for kws in &page_keywords {
        for kw in kws {
            *doc_freq.entry(*kw).or_insert(0) += 1;
        }
    }
    let mut seeds: Vec<(&str, usize)> = doc_freq
        .iter()
        .filter(|(_, df)| **df >= cfg.min_cluster_pages)
        .map(|(k, df)| (*k, *df))
        .collect();
    seeds.sort_by(|a, b| b.1.cmp(&a.1));

    let mut assigned = vec![false; pages.len()];
    let mut clusters: Vec<(ContentCluster, f64)> = Vec::new();
    let max_depth = depth.values().copied().max().unwrap_or(0);

    for (seed, _) in seeds {
        let members: Vec<usize> = (0..pages.len())
            .filter(|&i| !assigned[i] && page_keywords[i].contains(&seed))
            .collect();
        if members.len() < cfg.min_cluster_pages.max(1) {
            continue;
        }

        let mut shared: BTreeMap<&str, usize> = BTreeMap::new();
        for &i in &members {
            for kw in &page_keywords[i] {
                *shared.entry(*kw).or_insert(0) += 1;
            }
        }
        let needed = cfg.co_occurrence_threshold * members.len() as f64;
        let mut keywords: Vec<(&str, usize)> = shared
            .into_iter()
            .filter(|(k, n)| *k != seed && *n as f64 > needed)
            .collect();
        keywords.sort_by(|a, b| b.1.cmp(&a.1));
        let mut names = vec![seed.to_string()];
        names.extend(
            keywords
                .into_iter()
                .take(MAX_CLUSTER_KEYWORDS - 1)
                .map(|(k, _)| k.to_string()),
        );

        let mut raw_authority = 0.0;
        let mut urls = Vec::new();
        for &i in &members {
            assigned[i] = true;
            let url = normalize_url(&pages[i].url);
            let links_in = inbound.get(&url).copied().unwrap_or(0) as f64;
            // unreachable pages count as one level below the deepest page
            let d = depth.get(&url).copied().unwrap_or(max_depth + 1) as f64;
            raw_authority += (links_in + 1.0) / (d + 1.0);
            urls.push(pages[i].url.clone());
        }

        clusters.push((
            ContentCluster {
                name: seed.to_string(),
                keywords: names,
                pages: urls,
                authority: 0.0,
            },
            raw_authority,
        ));
    }

    let strongest = clusters.iter().map(|(_, a)| *a).fold(0.0, f64::max);
    let clusters = clusters
        .into_iter()
        .map(|(mut c, raw)| {
            c.authority = if strongest > 0.0 {
                (raw / strongest * 1000.0).round() / 10.0
            } else {
                0.0
            };
            c
        })
        .collect();
    let unclustered = pages
        .iter()
        .zip(&assigned)
        .filter(|(_, a)| !**a)
        .map(|(p, _)| p.url.clone())
        .collect();
    (clusters, unclustered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::KeywordCount;

    fn page(url: &str, keywords: &[&str]) -> PageContent {
        PageContent {
            url: url.to_string(),
            keywords: keywords
                .iter()
                .map(|k| KeywordCount {
                    keyword: k.to_string(),
                    count: 1,
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn groups_by_shared_keywords() {
        let pages = vec![
            page("https://a.test/", &["widgets", "home"]),
            page("https://a.test/pricing", &["pricing", "plans", "teams"]),
            page("https://a.test/pricing/faq", &["pricing", "plans", "billing"]),
            page("https://a.test/blog", &["release", "notes"]),
        ];
        let depth = BTreeMap::from([
            ("https://a.test/".to_string(), 0),
            ("https://a.test/pricing".to_string(), 1),
            ("https://a.test/pricing/faq".to_string(), 2),
        ]);
        let inbound = BTreeMap::from([
            ("https://a.test/pricing".to_string(), 1),
            ("https://a.test/pricing/faq".to_string(), 1),
        ]);
        let (clusters, unclustered) = cluster_pages(&pages, &depth, &inbound, &ContentConfig::default());
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].name, "plans");
        assert_eq!(clusters[0].keywords, vec!["plans", "pricing"]);
        assert_eq!(clusters[0].pages.len(), 2);
        assert_eq!(clusters[0].authority, 100.0);
        assert_eq!(unclustered.len(), 2);
    }

    #[test]
    fn shallow_linked_clusters_rank_higher() {
        let pages = vec![
            page("https://a.test/x1", &["alpha"]),
            page("https://a.test/x2", &["alpha"]),
            page("https://a.test/y1", &["beta"]),
            page("https://a.test/y2", &["beta"]),
        ];
        let depth = BTreeMap::from([
            ("https://a.test/x1".to_string(), 1),
            ("https://a.test/x2".to_string(), 1),
            ("https://a.test/y1".to_string(), 3),
            ("https://a.test/y2".to_string(), 3),
        ]);
        let inbound = BTreeMap::from([
            ("https://a.test/x1".to_string(), 3),
            ("https://a.test/x2".to_string(), 3),
        ]);
        let (clusters, _) = cluster_pages(&pages, &depth, &inbound, &ContentConfig::default());
        let alpha = clusters.iter().find(|c| c.name == "alpha").unwrap();
        let beta = clusters.iter().find(|c| c.name == "beta").unwrap();
        assert_eq!(alpha.authority, 100.0);
        assert!(beta.authority < alpha.authority);
    }
}
