use std::collections::BTreeMap;

use super::graph::domain_of;
use crate::model::{BrandProfile, ColorSystem, KeywordCount, LinkEdge, Typography};

const BRAND_KEYWORDS: usize = 10;
const TITLE_SEPARATORS: &[&str] = &[" | ", " - ", " – ", " — ", " · ", ": "];

/// `domain` is `base` or one of its subdomains.
fn on_host(domain: &str, base: &str) -> bool {
    domain
        .strip_suffix(base)
        .is_some_and(|rest| rest.is_empty() || rest.ends_with('.'))
}

fn classify_domain(domain: &str) -> Option<&'static str> {
    match domain {
        d if on_host(d, "linkedin.com") => Some("linkedin"),
        d if on_host(d, "twitter.com") || d == "x.com" => Some("twitter"),
        d if on_host(d, "facebook.com") => Some("facebook"),
        d if on_host(d, "github.com") => Some("github"),
        d if on_host(d, "youtube.com") || d == "youtu.be" => Some("youtube"),
        d if on_host(d, "instagram.com") => Some("instagram"),
        _ => None,
    }
}

/// Leading segment of a page title, e.g. `Acme` from `Acme | Widgets`.
fn name_from_title(title: &str) -> Option<String> {
    let head = TITLE_SEPARATORS
        .iter()
        .filter_map(|sep| title.split_once(sep).map(|(head, _)| head))
        .min_by_key(|head| head.len())
        .unwrap_or(title)
        .trim();
    (!head.is_empty()).then(|| head.to_string())
}

pub struct BrandInputs<'a> {
    /// Meta of the root page (or the first page when the root is missing).
    pub meta: &'a BTreeMap<String, String>,
    pub title: Option<&'a str>,
    pub colors: &'a ColorSystem,
    pub typography: &'a Typography,
    pub external_links: Vec<&'a LinkEdge>,
    pub keywords: &'a [KeywordCount],
}

/// `og:site_name` owns the brand name; the title is only a fallback.
pub fn brand_profile(inputs: &BrandInputs<'_>) -> BrandProfile {
    let meta = |key: &str| {
        inputs
            .meta
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let mut social = BTreeMap::new();
    for link in &inputs.external_links {
        if let Some(network) = classify_domain(&domain_of(&link.target)) {
            social
                .entry(network.to_string())
                .or_insert_with(|| link.target.clone());
        }
    }

    let colors = inputs
        .colors
        .primary
        .iter()
        .chain(inputs.colors.secondary.iter())
        .chain(inputs.colors.accent.iter())
        .map(|t| t.value.clone())
        .collect();

    BrandProfile {
        name: meta("og:site_name").or_else(|| inputs.title.and_then(name_from_title)),
        tagline: meta("description").or_else(|| meta("og:description")),
        logo: meta("logo").or_else(|| meta("og:image")),
        colors,
        fonts: inputs
            .typography
            .families
            .iter()
            .map(|f| f.family.clone())
            .collect(),
        social,
        keywords: inputs
            .keywords
            .iter()
            .take(BRAND_KEYWORDS)
            .map(|k| k.keyword.clone())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ColorRole, ColorToken, FetchOutcome};

    fn external(target: &str) -> LinkEdge {
        LinkEdge {
            target: target.to_string(),
            internal: false,
            text: String::new(),
            outcome: FetchOutcome::NotFetched,
        }
    }

    #[test]
    fn lookalike_hosts_are_not_social() {
        assert_eq!(classify_domain("linkedin.com"), Some("linkedin"));
        assert_eq!(classify_domain("uk.linkedin.com"), Some("linkedin"));
        assert_eq!(classify_domain("notlinkedin.com"), None);
        assert_eq!(classify_domain("mygithub.com"), None);
        assert_eq!(classify_domain("m.facebook.com"), Some("facebook"));
    }

    #[test]
    fn site_name_wins_over_title() {
        let meta = BTreeMap::from([
            ("og:site_name".to_string(), "Acme Corp".to_string()),
            ("description".to_string(), "Widgets for teams".to_string()),
        ]);
        let inputs = BrandInputs {
            meta: &meta,
            title: Some("Acme | Home"),
            colors: &ColorSystem::default(),
            typography: &Typography::default(),
            external_links: vec![],
            keywords: &[],
        };
        let brand = brand_profile(&inputs);
        assert_eq!(brand.name.as_deref(), Some("Acme Corp"));
        assert_eq!(brand.tagline.as_deref(), Some("Widgets for teams"));
    }

    #[test]
    fn falls_back_to_title_and_classifies_socials() {
        let meta = BTreeMap::new();
        let links = [
            external("https://www.linkedin.com/company/acme"),
            external("https://x.com/acme"),
            external("https://twitter.com/acme-old"),
            external("https://example.org/"),
        ];
        let colors = ColorSystem {
            primary: Some(ColorToken {
                value: "#1a73e8".into(),
                role: ColorRole::Primary,
                usage_count: 10,
                prominence: 10.0,
                contrast: None,
            }),
            ..Default::default()
        };
        let inputs = BrandInputs {
            meta: &meta,
            title: Some("Acme - Widgets for teams"),
            colors: &colors,
            typography: &Typography::default(),
            external_links: links.iter().collect(),
            keywords: &[],
        };
        let brand = brand_profile(&inputs);
        assert_eq!(brand.name.as_deref(), Some("Acme"));
        assert_eq!(brand.social["twitter"], "https://x.com/acme");
        assert!(brand.social.contains_key("linkedin"));
        assert_eq!(brand.social.len(), 2);
        assert_eq!(brand.colors, vec!["#1a73e8".to_string()]);
    }
}
