use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use super::readability::syllables;
use crate::config::ContentConfig;
use crate::model::{ContentInventory, KeywordCount, PageContent, TextBlock, TextKind};

static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Za-z][A-Za-z'’-]*").unwrap());
static SENTENCE_END_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]+(\s|$)").unwrap());

const MIN_KEYWORD_LEN: usize = 3;

const STOPWORDS: &[&str] = &[
    "about", "after", "all", "also", "and", "any", "are", "because", "been", "before", "being",
    "between", "both", "but", "can", "could", "did", "does", "each", "for", "from", "get", "had",
    "has", "have", "her", "here", "his", "how", "into", "it's", "its", "just", "more", "most", "not",
    "now", "only", "other", "our", "out", "over", "own", "same", "she", "should", "some", "such",
    "than", "that", "the", "their", "them", "then", "there", "these", "they", "this", "those",
    "through", "too", "under", "very", "was", "way", "were", "what", "when", "where", "which",
    "while", "who", "why", "will", "with", "would", "you", "your",
];

/// Lowercased content words, stopwords removed.
pub fn keywords_in(text: &str) -> impl Iterator<Item = String> + '_ {
    WORD_RE
        .find_iter(text)
        .map(|m| m.as_str().trim_matches(|c| c == '\'' || c == '’' || c == '-').to_lowercase())
        .filter(|w| w.chars().count() >= MIN_KEYWORD_LEN && !STOPWORDS.contains(&w.as_str()))
}

fn words_in(text: &str) -> impl Iterator<Item = &str> {
    WORD_RE.find_iter(text).map(|m| m.as_str())
}

/// Terminal punctuation runs; unterminated text still counts as one.
fn sentences_in(text: &str) -> usize {
    if words_in(text).next().is_none() {
        return 0;
    }
    SENTENCE_END_RE.find_iter(text.trim()).count().max(1)
}

fn top_counts(counts: BTreeMap<String, usize>, limit: usize) -> Vec<KeywordCount> {
    let mut ranked: Vec<KeywordCount> = counts
        .into_iter()
        .map(|(keyword, count)| KeywordCount { keyword, count })
        .collect();
    // BTreeMap order makes ties alphabetical
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(limit);
    ranked
}

/// Everything a page's text and meta observations say about its content.
/// The same block captured at several viewports is counted once.
pub fn page_content<'a>(
    url: &str,
    blocks: impl IntoIterator<Item = &'a TextBlock>,
    meta: &BTreeMap<String, String>,
    cfg: &ContentConfig,
) -> PageContent {
    let mut seen: HashSet<(TextKind, Option<u8>, &str)> = HashSet::new();
    let mut page = PageContent {
        url: url.to_string(),
        description: meta
            .get("description")
            .or_else(|| meta.get("og:description"))
            .cloned(),
        canonical: meta.get("canonical").cloned(),
        ..Default::default()
    };
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut heading_words: Vec<String> = Vec::new();

    for block in blocks {
        if !seen.insert((block.text_kind, block.level, block.content.as_str())) {
            continue;
        }
        let text = block.content.trim();
        if block.text_kind == TextKind::Title {
            if page.title.is_none() && !text.is_empty() {
                page.title = Some(text.to_string());
            }
            continue;
        }
        match block.text_kind {
            TextKind::Heading => {
                if block.level == Some(1) {
                    page.h1_count += 1;
                }
                for kw in keywords_in(text) {
                    if !heading_words.contains(&kw) {
                        heading_words.push(kw);
                    }
                }
            }
            TextKind::Paragraph => page.paragraph_count += 1,
            _ => {}
        }
        for word in words_in(text) {
            page.word_count += 1;
            page.syllable_count += syllables(word);
        }
        page.sentence_count += sentences_in(text);
        for kw in keywords_in(text) {
            *counts.entry(kw).or_insert(0) += 1;
        }
    }

    if page.title.is_none() {
        page.title = meta.get("og:title").cloned();
    }
    page.keywords = top_counts(counts, cfg.top_keywords_per_page);
    page.heading_keywords = heading_words;
    page
}

/// Site-level keyword and topic tables. Topics count the pages whose
/// headings mention a keyword.
pub fn build_inventory(pages: Vec<PageContent>, cfg: &ContentConfig) -> ContentInventory {
    let mut keywords: BTreeMap<String, usize> = BTreeMap::new();
    let mut topics: BTreeMap<String, usize> = BTreeMap::new();
    for page in &pages {
        for kw in &page.keywords {
            *keywords.entry(kw.keyword.clone()).or_insert(0) += kw.count;
        }
        for topic in &page.heading_keywords {
            *topics.entry(topic.clone()).or_insert(0) += 1;
        }
    }
    ContentInventory {
        total_pages: pages.len(),
        total_words: pages.iter().map(|p| p.word_count).sum(),
        keywords: top_counts(keywords, cfg.site_keywords),
        topics: top_counts(topics, cfg.site_keywords),
        readability: super::readability::readability(&pages),
        pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(kind: TextKind, level: Option<u8>, content: &str) -> TextBlock {
        TextBlock {
            text_kind: kind,
            level,
            content: content.to_string(),
        }
    }

    #[test]
    fn keywords_skip_stopwords_and_short_words() {
        let kws: Vec<String> = keywords_in("The fast API for your data, and it's free").collect();
        assert_eq!(kws, vec!["fast", "api", "data", "free"]);
    }

    #[test]
    fn counts_page_text_once_per_block() {
        let blocks = vec![
            block(TextKind::Title, None, "Acme | Widgets"),
            block(TextKind::Heading, Some(1), "Widgets for teams"),
            block(TextKind::Paragraph, None, "Widgets ship fast. Teams love widgets!"),
            block(TextKind::Paragraph, None, "Widgets ship fast. Teams love widgets!"),
        ];
        let meta = BTreeMap::from([("description".to_string(), "Widgets".to_string())]);
        let page = page_content("https://acme.test/", &blocks, &meta, &ContentConfig::default());
        assert_eq!(page.title.as_deref(), Some("Acme | Widgets"));
        assert_eq!(page.h1_count, 1);
        assert_eq!(page.paragraph_count, 1);
        assert_eq!(page.word_count, 9);
        assert_eq!(page.sentence_count, 3);
        assert_eq!(page.keywords[0].keyword, "widgets");
        assert_eq!(page.keywords[0].count, 3);
        assert_eq!(page.heading_keywords, vec!["widgets", "teams"]);
    }

    #[test]
    fn inventory_sums_pages() {
        let cfg = ContentConfig::default();
        let a = page_content(
            "a",
            &[block(TextKind::Heading, Some(2), "Pricing plans")],
            &BTreeMap::new(),
            &cfg,
        );
        let b = page_content(
            "b",
            &[block(TextKind::Heading, Some(2), "Pricing faq")],
            &BTreeMap::new(),
            &cfg,
        );
        let inv = build_inventory(vec![a, b], &cfg);
        assert_eq!(inv.total_pages, 2);
        assert_eq!(inv.total_words, 4);
        assert_eq!(inv.topics[0].keyword, "pricing");
        assert_eq!(inv.topics[0].count, 2);
    }
}
