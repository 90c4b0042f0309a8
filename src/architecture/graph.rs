use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use crate::model::{
    BrokenLink, DepthMetrics, FetchOutcome, GraphEdge, LinkEdge, LinkGraph, LinkingDepth,
};

/// Comparable form of a page URL: no fragment, lowercase scheme and host,
/// no trailing slash except on the root path.
pub fn normalize_url(url: &str) -> String {
    let url = url.trim();
    let url = url.split('#').next().unwrap_or(url);
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.trim_end_matches('/').to_string();
    };
    let (host, path) = match rest.find(['/', '?']) {
        Some(i) => rest.split_at(i),
        None => (rest, ""),
    };
    let (path, query) = match path.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (path, None),
    };
    let path = match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    };
    let mut out = format!(
        "{}://{}{}",
        scheme.to_ascii_lowercase(),
        host.to_ascii_lowercase(),
        path
    );
    if let Some(q) = query.filter(|q| !q.is_empty()) {
        out.push('?');
        out.push_str(q);
    }
    out
}

/// Host without `www.`, for classifying external links.
pub fn domain_of(url: &str) -> String {
    url.split("//")
        .nth(1)
        .unwrap_or(url)
        .split(['/', '?', '#'])
        .next()
        .unwrap_or("")
        .trim_start_matches("www.")
        .to_ascii_lowercase()
}

fn broken_reason(outcome: &FetchOutcome) -> String {
    match outcome {
        FetchOutcome::Ok { code } | FetchOutcome::Http { code } => format!("http {code}"),
        FetchOutcome::Failed { reason } => reason.clone(),
        FetchOutcome::NotFetched => "not fetched".to_string(),
    }
}

#[derive(Debug, Default)]
pub struct GraphAnalysis {
    pub graph: LinkGraph,
    pub depth: DepthMetrics,
    pub unreachable_pages: Vec<String>,
    pub orphan_pages: Vec<String>,
    pub broken_links: Vec<BrokenLink>,
    pub linking: LinkingDepth,
    pub inbound: BTreeMap<String, usize>,
}

fn depth_metrics(depths: &BTreeMap<String, usize>) -> DepthMetrics {
    let mut values: Vec<usize> = depths.values().copied().collect();
    values.sort_unstable();
    let n = values.len();
    let median = match n {
        0 => None,
        n if n % 2 == 0 => Some((values[n / 2 - 1] + values[n / 2]) as f64 / 2.0),
        n => Some(values[n / 2] as f64),
    };
    DepthMetrics {
        mean: (n > 0).then(|| values.iter().sum::<usize>() as f64 / n as f64),
        median,
        min: values.first().copied(),
        max: values.last().copied(),
        per_page: depths.clone(),
    }
}

/// Build the internal link graph over the crawled pages and derive depth,
/// orphan, broken-link and outbound metrics. Broken edges and self links
/// never count as inbound links. Links to pages outside the crawl are ignored.
pub fn analyze_graph(root: &str, pages: &[String], links: &[(String, LinkEdge)]) -> GraphAnalysis {
    let root = normalize_url(root);
    let mut nodes: Vec<String> = Vec::new();
    for p in pages {
        let p = normalize_url(p);
        if !nodes.contains(&p) {
            nodes.push(p);
        }
    }
    let node_set: HashSet<&str> = nodes.iter().map(String::as_str).collect();

    let mut edges: Vec<GraphEdge> = Vec::new();
    let mut edge_set: HashSet<(String, String)> = HashSet::new();
    let mut broken: Vec<BrokenLink> = Vec::new();
    for (source, link) in links.iter().filter(|(_, l)| l.internal) {
        let source = normalize_url(source);
        let target = normalize_url(&link.target);
        if !node_set.contains(source.as_str()) {
            continue;
        }
        if link.outcome.is_broken() {
            if !broken.iter().any(|b| b.source == source && b.target == target) {
                broken.push(BrokenLink {
                    source,
                    target,
                    reason: broken_reason(&link.outcome),
                });
            }
            continue;
        }
        if source == target || !node_set.contains(target.as_str()) {
            continue;
        }
        if edge_set.insert((source.clone(), target.clone())) {
            edges.push(GraphEdge { source, target });
        }
    }

    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut inbound: BTreeMap<String, usize> = nodes.iter().map(|n| (n.clone(), 0)).collect();
    let mut outbound: BTreeMap<String, usize> = nodes.iter().map(|n| (n.clone(), 0)).collect();
    for e in &edges {
        adjacency.entry(e.source.as_str()).or_default().push(e.target.as_str());
        *inbound.entry(e.target.clone()).or_insert(0) += 1;
        *outbound.entry(e.source.clone()).or_insert(0) += 1;
    }

    let mut depths: BTreeMap<String, usize> = BTreeMap::new();
    if node_set.contains(root.as_str()) {
        let mut queue = VecDeque::from([(root.as_str(), 0usize)]);
        depths.insert(root.clone(), 0);
        while let Some((node, d)) = queue.pop_front() {
            for next in adjacency.get(node).into_iter().flatten() {
                if !depths.contains_key(*next) {
                    depths.insert(next.to_string(), d + 1);
                    queue.push_back((*next, d + 1));
                }
            }
        }
    }

    let unreachable_pages = nodes.iter().filter(|n| !depths.contains_key(*n)).cloned().collect();
    let orphan_pages = nodes
        .iter()
        .filter(|n| **n != root && inbound.get(*n).copied().unwrap_or(0) == 0)
        .cloned()
        .collect();

    let linking = LinkingDepth {
        average_outbound: if nodes.is_empty() {
            0.0
        } else {
            edges.len() as f64 / nodes.len() as f64
        },
        max_outbound: outbound.values().copied().max().unwrap_or(0),
        per_page: outbound,
    };

    GraphAnalysis {
        depth: depth_metrics(&depths),
        graph: LinkGraph { nodes, edges },
        unreachable_pages,
        orphan_pages,
        broken_links: broken,
        linking,
        inbound,
    }
}
