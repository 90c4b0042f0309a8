use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordCount {
    pub keyword: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageContent {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub canonical: Option<String>,
    pub h1_count: usize,
    pub word_count: usize,
    pub sentence_count: usize,
    pub syllable_count: usize,
    pub paragraph_count: usize,
    pub keywords: Vec<KeywordCount>,
    #[serde(default)]
    pub heading_keywords: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Readability {
    pub flesch_kincaid_grade: Option<f64>,
    pub flesch_reading_ease: Option<f64>,
    pub average_words_per_sentence: f64,
    pub average_syllables_per_word: f64,
    pub average_words_per_page: f64,
    pub average_sentences_per_paragraph: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentInventory {
    pub total_pages: usize,
    pub total_words: usize,
    pub pages: Vec<PageContent>,
    pub keywords: Vec<KeywordCount>,
    pub topics: Vec<KeywordCount>,
    pub readability: Readability,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DepthMetrics {
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub min: Option<usize>,
    pub max: Option<usize>,
    pub per_page: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokenLink {
    pub source: String,
    pub target: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkGraph {
    pub nodes: Vec<String>,
    pub edges: Vec<GraphEdge>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkingDepth {
    pub average_outbound: f64,
    pub max_outbound: usize,
    pub per_page: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentCluster {
    pub name: String,
    pub keywords: Vec<String>,
    pub pages: Vec<String>,
    /// 0–100, relative to the strongest cluster of the run.
    pub authority: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArchitectureQuality {
    pub structure: f64,
    pub navigation: f64,
    pub content: f64,
    pub seo: f64,
    pub overall: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InformationArchitecture {
    pub root: String,
    pub graph: LinkGraph,
    pub depth: DepthMetrics,
    pub unreachable_pages: Vec<String>,
    pub orphan_pages: Vec<String>,
    pub broken_links: Vec<BrokenLink>,
    pub linking: LinkingDepth,
    pub clusters: Vec<ContentCluster>,
    pub unclustered_pages: Vec<String>,
    pub quality: ArchitectureQuality,
    pub incomplete: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeoReport {
    pub missing_titles: Vec<String>,
    pub duplicate_titles: BTreeMap<String, Vec<String>>,
    pub missing_descriptions: Vec<String>,
    pub missing_h1: Vec<String>,
    pub multiple_h1: Vec<String>,
    pub canonical_coverage: f64,
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrandProfile {
    pub name: Option<String>,
    pub tagline: Option<String>,
    pub logo: Option<String>,
    pub colors: Vec<String>,
    pub fonts: Vec<String>,
    pub social: BTreeMap<String, String>,
    pub keywords: Vec<String>,
}
