pub mod brand;
pub mod clusters;
pub mod content;
pub mod graph;
pub mod quality;
pub mod readability;
pub mod seo;

pub use brand::{brand_profile, BrandInputs};
pub use content::{build_inventory, page_content};
pub use graph::{analyze_graph, normalize_url};
pub use quality::navigation_signal;

use tracing::{debug, warn};

use crate::config::ContentConfig;
use crate::model::{ContentInventory, InformationArchitecture, LinkEdge, PageContent, SeoReport};

/// Cross-page input. Only pages whose local pipelines completed are present.
pub struct SiteInput<'a> {
    pub root: &'a str,
    pub pages: Vec<PageContent>,
    /// Internal and external links keyed by their source page.
    pub links: &'a [(String, LinkEdge)],
    pub navigation_signal: Option<f64>,
    /// Set when the crawl was partial or some pages faulted.
    pub incomplete: bool,
}

/// Synchronization point of a run: needs every page to build the graph.
pub fn aggregate(
    input: SiteInput<'_>,
    cfg: &ContentConfig,
) -> (ContentInventory, InformationArchitecture, SeoReport) {
    let urls: Vec<String> = input.pages.iter().map(|p| p.url.clone()).collect();
    let analysis = analyze_graph(input.root, &urls, input.links);
    let (clusters, unclustered_pages) =
        clusters::cluster_pages(&input.pages, &analysis.depth.per_page, &analysis.inbound, cfg);

    let inventory = build_inventory(input.pages, cfg);
    let seo = seo::seo_report(&inventory.pages);
    let quality = quality::architecture_quality(
        &analysis,
        &inventory.pages,
        &inventory.readability,
        &seo,
        input.navigation_signal,
        cfg.thin_content_words,
    );

    if !analysis.unreachable_pages.is_empty() {
        warn!(
            count = analysis.unreachable_pages.len(),
            "pages unreachable from the root"
        );
    }
    debug!(
        nodes = analysis.graph.nodes.len(),
        edges = analysis.graph.edges.len(),
        clusters = clusters.len(),
        "aggregated site architecture"
    );

    let architecture = InformationArchitecture {
        root: normalize_url(input.root),
        graph: analysis.graph,
        depth: analysis.depth,
        unreachable_pages: analysis.unreachable_pages,
        orphan_pages: analysis.orphan_pages,
        broken_links: analysis.broken_links,
        linking: analysis.linking,
        clusters,
        unclustered_pages,
        quality,
        incomplete: input.incomplete,
    };
    (inventory, architecture, seo)
}
