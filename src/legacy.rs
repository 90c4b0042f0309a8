//! Conversion between the current output shapes and the v1 legacy schema.
//!
//! Forward conversion drops what v1 cannot hold and fills what v1 requires
//! but the current value lacks; both are listed on the [`Conversion`]. Values
//! that originated in v1 survive `legacy -> current -> legacy` unchanged.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Diagnostic, Error, Result};
use crate::model::{
    BrandProfile, ColorRole, ColorSystem, ColorToken, ContentInventory, DesignTokens,
    FontFamilyUsage, KeywordCount, PageContent, Readability, ScaleMethod, ScaleStep, SemanticCue,
    SpacingScale, Typography,
};

/// Filled into v1 fields the current value cannot supply.
pub const DEFAULT_PRIMARY: &str = "#000000";
pub const DEFAULT_SECONDARY: &str = "#ffffff";
pub const DEFAULT_FONT_FAMILY: &str = "sans-serif";
pub const DEFAULT_SCALE_RATIO: f64 = 1.0;
pub const DEFAULT_READABILITY: f64 = 0.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegacySchema {
    V1,
}

impl FromStr for LegacySchema {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v1" | "1" => Ok(LegacySchema::V1),
            other => Err(Error::UnknownSchema(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversion<T> {
    pub value: T,
    pub dropped: Vec<String>,
    pub defaulted: Vec<String>,
}

impl<T> Conversion<T> {
    fn exact(value: T) -> Self {
        Conversion {
            value,
            dropped: Vec::new(),
            defaulted: Vec::new(),
        }
    }

    pub fn is_lossy(&self) -> bool {
        !self.dropped.is_empty() || !self.defaulted.is_empty()
    }

    pub fn diagnostic(&self) -> Option<Diagnostic> {
        self.is_lossy().then(|| Diagnostic::SchemaBridgeLossy {
            dropped: self.dropped.clone(),
            defaulted: self.defaulted.clone(),
        })
    }
}

/// A current-shape value with a legacy counterpart.
pub trait LegacyBridge: Sized {
    type Legacy;

    fn to_legacy(&self, schema: LegacySchema) -> Conversion<Self::Legacy>;

    fn from_legacy(legacy: &Self::Legacy, schema: LegacySchema) -> Result<Conversion<Self>>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyColors {
    pub primary: String,
    pub secondary: String,
    #[serde(default)]
    pub accent: Vec<String>,
    #[serde(default)]
    pub neutral: BTreeMap<String, String>,
    #[serde(default)]
    pub semantic: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyFontFamily {
    pub primary: String,
    #[serde(default)]
    pub secondary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyTypography {
    pub font_family: LegacyFontFamily,
    /// Step name to a `<n>px` string.
    pub font_sizes: BTreeMap<String, String>,
    #[serde(default)]
    pub font_weights: Vec<u16>,
    pub scale_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyDesignTokens {
    pub colors: LegacyColors,
    pub typography: LegacyTypography,
    pub spacing: BTreeMap<String, String>,
}

fn format_px(px: f64) -> String {
    format!("{px}px")
}

/// Only the canonical `<n>px` form is accepted, so it can be reproduced
/// exactly on the way back.
fn parse_px(field: &str, raw: &str) -> Result<f64> {
    let invalid = || Error::InvalidLegacyValue {
        field: field.to_string(),
        value: raw.to_string(),
    };
    let px: f64 = raw
        .strip_suffix("px")
        .and_then(|n| n.parse().ok())
        .filter(|n: &f64| n.is_finite() && *n >= 0.0)
        .ok_or_else(invalid)?;
    if format_px(px) != raw {
        return Err(invalid());
    }
    Ok(px)
}

fn cue_key(cue: SemanticCue) -> &'static str {
    match cue {
        SemanticCue::Error => "error",
        SemanticCue::Success => "success",
        SemanticCue::Warning => "warning",
        SemanticCue::Info => "info",
    }
}

fn parse_cue(key: &str) -> Option<SemanticCue> {
    match key {
        "error" => Some(SemanticCue::Error),
        "success" => Some(SemanticCue::Success),
        "warning" => Some(SemanticCue::Warning),
        "info" => Some(SemanticCue::Info),
        _ => None,
    }
}

fn token(value: &str, role: ColorRole) -> ColorToken {
    ColorToken {
        value: value.to_string(),
        role,
        usage_count: 0,
        prominence: 0.0,
        contrast: None,
    }
}

fn steps_from_legacy(field: &str, map: &BTreeMap<String, String>) -> Result<Vec<ScaleStep>> {
    let mut steps = map
        .iter()
        .map(|(name, raw)| {
            Ok(ScaleStep {
                name: name.clone(),
                px: parse_px(&format!("{field}.{name}"), raw)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    steps.sort_by(|a, b| a.px.total_cmp(&b.px));
    Ok(steps)
}

fn steps_to_legacy(steps: &[ScaleStep]) -> BTreeMap<String, String> {
    steps.iter().map(|s| (s.name.clone(), format_px(s.px))).collect()
}

impl LegacyBridge for DesignTokens {
    type Legacy = LegacyDesignTokens;

    fn to_legacy(&self, schema: LegacySchema) -> Conversion<LegacyDesignTokens> {
        let LegacySchema::V1 = schema;
        let mut dropped = Vec::new();
        let mut defaulted = Vec::new();
        let colors = &self.colors;
        let typo = &self.typography;

        let primary = match &colors.primary {
            Some(t) => t.value.clone(),
            None => {
                defaulted.push("colors.primary".to_string());
                DEFAULT_PRIMARY.to_string()
            }
        };
        let secondary = match &colors.secondary {
            Some(t) => t.value.clone(),
            None => {
                defaulted.push("colors.secondary".to_string());
                DEFAULT_SECONDARY.to_string()
            }
        };
        let font_primary = match typo.families.first() {
            Some(f) => f.family.clone(),
            None => {
                defaulted.push("typography.fontFamily.primary".to_string());
                DEFAULT_FONT_FAMILY.to_string()
            }
        };
        let scale_ratio = typo.ratio.unwrap_or_else(|| {
            defaulted.push("typography.scaleRatio".to_string());
            DEFAULT_SCALE_RATIO
        });

        let all_tokens = colors
            .primary
            .iter()
            .chain(&colors.secondary)
            .chain(&colors.accent)
            .chain(colors.neutral.values())
            .chain(colors.semantic.values());
        let mut has_usage = false;
        let mut has_contrast = false;
        for t in all_tokens {
            has_usage |= t.usage_count > 0 || t.prominence > 0.0;
            has_contrast |= t.contrast.is_some();
        }
        let mut drop_if = |cond: bool, field: &str| {
            if cond {
                dropped.push(field.to_string());
            }
        };
        drop_if(has_usage, "colors.usage");
        drop_if(has_contrast, "colors.contrast");
        drop_if(!colors.outliers.is_empty(), "colors.outliers");
        drop_if(!colors.contrast_violations.is_empty(), "colors.contrast_violations");
        drop_if(typo.families.len() > 2, "typography.families");
        drop_if(typo.families.iter().any(|f| f.usage_count > 0), "typography.families.usage_count");
        drop_if(typo.base_size.is_some(), "typography.base_size");
        drop_if(typo.fit_residual.is_some(), "typography.fit_residual");
        drop_if(typo.fallback_reason.is_some(), "typography.fallback_reason");
        drop_if(self.spacing.base_unit.is_some(), "spacing.base_unit");
        drop_if(!self.spacing.irregular.is_empty(), "spacing.irregular");
        drop_if(!self.custom.is_empty(), "custom");

        let value = LegacyDesignTokens {
            colors: LegacyColors {
                primary,
                secondary,
                accent: colors.accent.iter().map(|t| t.value.clone()).collect(),
                neutral: colors
                    .neutral
                    .iter()
                    .map(|(k, t)| (k.clone(), t.value.clone()))
                    .collect(),
                semantic: colors
                    .semantic
                    .iter()
                    .map(|(cue, t)| (cue_key(*cue).to_string(), t.value.clone()))
                    .collect(),
            },
            typography: LegacyTypography {
                font_family: LegacyFontFamily {
                    primary: font_primary,
                    secondary: typo.families.get(1).map(|f| f.family.clone()),
                },
                font_sizes: steps_to_legacy(&typo.scale),
                font_weights: typo.weights.clone(),
                scale_ratio,
            },
            spacing: steps_to_legacy(&self.spacing.steps),
        };
        let conversion = Conversion {
            value,
            dropped,
            defaulted,
        };
        if conversion.is_lossy() {
            warn!(
                dropped = ?conversion.dropped,
                defaulted = ?conversion.defaulted,
                "lossy conversion of design tokens to legacy schema"
            );
        }
        conversion
    }

    fn from_legacy(legacy: &LegacyDesignTokens, schema: LegacySchema) -> Result<Conversion<Self>> {
        let LegacySchema::V1 = schema;
        let c = &legacy.colors;
        let mut semantic = BTreeMap::new();
        for (key, value) in &c.semantic {
            let cue = parse_cue(key).ok_or_else(|| Error::InvalidLegacyValue {
                field: "colors.semantic".to_string(),
                value: key.clone(),
            })?;
            semantic.insert(cue, token(value, ColorRole::Semantic));
        }
        let colors = ColorSystem {
            primary: Some(token(&c.primary, ColorRole::Primary)),
            secondary: Some(token(&c.secondary, ColorRole::Secondary)),
            accent: c.accent.iter().map(|v| token(v, ColorRole::Accent)).collect(),
            neutral: c
                .neutral
                .iter()
                .map(|(k, v)| (k.clone(), token(v, ColorRole::Neutral)))
                .collect(),
            semantic,
            ..Default::default()
        };

        let t = &legacy.typography;
        let families = std::iter::once(&t.font_family.primary)
            .chain(&t.font_family.secondary)
            .map(|family| FontFamilyUsage {
                family: family.clone(),
                usage_count: 0,
            })
            .collect();
        let typography = Typography {
            families,
            weights: t.font_weights.clone(),
            scale: steps_from_legacy("typography.fontSizes", &t.font_sizes)?,
            method: ScaleMethod::Modular,
            ratio: Some(t.scale_ratio),
            ..Default::default()
        };
        let spacing = SpacingScale {
            steps: steps_from_legacy("spacing", &legacy.spacing)?,
            ..Default::default()
        };

        Ok(Conversion::exact(DesignTokens {
            colors,
            typography,
            spacing,
            custom: BTreeMap::new(),
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyBrandProfile {
    pub name: String,
    pub tagline: String,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub brand_colors: Vec<String>,
    #[serde(default)]
    pub fonts: Vec<String>,
    #[serde(default)]
    pub social_media: BTreeMap<String, String>,
}

fn required_text(value: &Option<String>, field: &str, defaulted: &mut Vec<String>) -> String {
    match value {
        Some(v) => v.clone(),
        None => {
            defaulted.push(field.to_string());
            String::new()
        }
    }
}

impl LegacyBridge for BrandProfile {
    type Legacy = LegacyBrandProfile;

    fn to_legacy(&self, schema: LegacySchema) -> Conversion<LegacyBrandProfile> {
        let LegacySchema::V1 = schema;
        let mut defaulted = Vec::new();
        let mut dropped = Vec::new();
        if !self.keywords.is_empty() {
            dropped.push("keywords".to_string());
        }
        let value = LegacyBrandProfile {
            name: required_text(&self.name, "name", &mut defaulted),
            tagline: required_text(&self.tagline, "tagline", &mut defaulted),
            logo: self.logo.clone(),
            brand_colors: self.colors.clone(),
            fonts: self.fonts.clone(),
            social_media: self.social.clone(),
        };
        Conversion {
            value,
            dropped,
            defaulted,
        }
    }

    fn from_legacy(legacy: &LegacyBrandProfile, schema: LegacySchema) -> Result<Conversion<Self>> {
        let LegacySchema::V1 = schema;
        Ok(Conversion::exact(BrandProfile {
            // kept verbatim, even when empty, so the way back reports no default
            name: Some(legacy.name.clone()),
            tagline: Some(legacy.tagline.clone()),
            logo: legacy.logo.clone(),
            colors: legacy.brand_colors.clone(),
            fonts: legacy.fonts.clone(),
            social: legacy.social_media.clone(),
            keywords: Vec::new(),
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyPage {
    pub url: String,
    pub title: String,
    pub word_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyContentInventory {
    pub total_pages: usize,
    pub total_words: usize,
    pub pages: Vec<LegacyPage>,
    #[serde(default)]
    pub top_keywords: Vec<String>,
    pub readability_score: f64,
}

impl LegacyBridge for ContentInventory {
    type Legacy = LegacyContentInventory;

    fn to_legacy(&self, schema: LegacySchema) -> Conversion<LegacyContentInventory> {
        let LegacySchema::V1 = schema;
        let mut defaulted = Vec::new();
        let mut dropped = Vec::new();

        let readability_score = self.readability.flesch_reading_ease.unwrap_or_else(|| {
            defaulted.push("readabilityScore".to_string());
            DEFAULT_READABILITY
        });
        if self.pages.iter().any(|p| p.title.is_none()) {
            defaulted.push("pages.title".to_string());
        }
        if self.keywords.iter().any(|k| k.count > 0) {
            dropped.push("keywords.count".to_string());
        }
        if !self.topics.is_empty() {
            dropped.push("topics".to_string());
        }
        if self.readability.flesch_kincaid_grade.is_some() {
            dropped.push("readability.flesch_kincaid_grade".to_string());
        }
        if self.pages.iter().any(|p| !p.keywords.is_empty() || p.sentence_count > 0) {
            dropped.push("pages.details".to_string());
        }

        let value = LegacyContentInventory {
            total_pages: self.total_pages,
            total_words: self.total_words,
            pages: self
                .pages
                .iter()
                .map(|p| LegacyPage {
                    url: p.url.clone(),
                    title: p.title.clone().unwrap_or_default(),
                    word_count: p.word_count,
                })
                .collect(),
            top_keywords: self.keywords.iter().map(|k| k.keyword.clone()).collect(),
            readability_score,
        };
        Conversion {
            value,
            dropped,
            defaulted,
        }
    }

    fn from_legacy(legacy: &LegacyContentInventory, schema: LegacySchema) -> Result<Conversion<Self>> {
        let LegacySchema::V1 = schema;
        Ok(Conversion::exact(ContentInventory {
            total_pages: legacy.total_pages,
            total_words: legacy.total_words,
            pages: legacy
                .pages
                .iter()
                .map(|p| PageContent {
                    url: p.url.clone(),
                    title: Some(p.title.clone()),
                    word_count: p.word_count,
                    ..Default::default()
                })
                .collect(),
            keywords: legacy
                .top_keywords
                .iter()
                .map(|k| KeywordCount {
                    keyword: k.clone(),
                    count: 0,
                })
                .collect(),
            topics: Vec::new(),
            readability: Readability {
                flesch_reading_ease: Some(legacy.readability_score),
                ..Default::default()
            },
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legacy_tokens() -> LegacyDesignTokens {
        LegacyDesignTokens {
            colors: LegacyColors {
                primary: "#1A73E8".into(),
                secondary: "rgb(52, 168, 83)".into(),
                accent: vec!["#fbbc05".into()],
                neutral: BTreeMap::from([("100".into(), "#f1f3f4".into()), ("900".into(), "#202124".into())]),
                semantic: BTreeMap::from([("error".into(), "#d93025".into())]),
            },
            typography: LegacyTypography {
                font_family: LegacyFontFamily {
                    primary: "Inter".into(),
                    secondary: Some("Georgia".into()),
                },
                font_sizes: BTreeMap::from([
                    ("base".into(), "16px".into()),
                    ("lg".into(), "20px".into()),
                    ("sm".into(), "12.8px".into()),
                ]),
                font_weights: vec![400, 700],
                scale_ratio: 1.25,
            },
            spacing: BTreeMap::from([("sm".into(), "8px".into()), ("xs".into(), "4px".into())]),
        }
    }

    #[test]
    fn schema_tags() {
        assert_eq!("v1".parse::<LegacySchema>().unwrap(), LegacySchema::V1);
        assert!(matches!("v7".parse::<LegacySchema>(), Err(Error::UnknownSchema(_))));
    }

    #[test]
    fn design_tokens_round_trip() {
        let original = legacy_tokens();
        let current = DesignTokens::from_legacy(&original, LegacySchema::V1).unwrap();
        assert!(!current.is_lossy());
        let steps: Vec<f64> = current.value.typography.scale.iter().map(|s| s.px).collect();
        assert_eq!(steps, vec![12.8, 16.0, 20.0]);

        let back = current.value.to_legacy(LegacySchema::V1);
        assert_eq!(back.value, original);
        assert!(back.dropped.is_empty());
        assert!(back.defaulted.is_empty());
    }

    #[test]
    fn forward_conversion_reports_losses() {
        let mut tokens = DesignTokens::default();
        tokens.spacing.base_unit = Some(4.0);
        tokens.colors.outliers = vec!["#123456".into()];
        let conv = tokens.to_legacy(LegacySchema::V1);
        assert_eq!(conv.value.colors.primary, DEFAULT_PRIMARY);
        assert!(conv.defaulted.contains(&"colors.primary".to_string()));
        assert!(conv.defaulted.contains(&"typography.scaleRatio".to_string()));
        assert!(conv.dropped.contains(&"spacing.base_unit".to_string()));
        assert!(conv.dropped.contains(&"colors.outliers".to_string()));
        assert!(matches!(conv.diagnostic(), Some(Diagnostic::SchemaBridgeLossy { .. })));
    }

    #[test]
    fn rejects_non_canonical_dimensions() {
        let mut legacy = legacy_tokens();
        legacy.spacing.insert("md".into(), "1rem".into());
        assert!(matches!(
            DesignTokens::from_legacy(&legacy, LegacySchema::V1),
            Err(Error::InvalidLegacyValue { .. })
        ));
        let mut legacy = legacy_tokens();
        legacy.spacing.insert("md".into(), "16.0px".into());
        assert!(DesignTokens::from_legacy(&legacy, LegacySchema::V1).is_err());
    }

    #[test]
    fn rejects_unknown_semantic_keys() {
        let mut legacy = legacy_tokens();
        legacy.colors.semantic.insert("danger".into(), "#f00".into());
        assert!(DesignTokens::from_legacy(&legacy, LegacySchema::V1).is_err());
    }

    #[test]
    fn brand_round_trip() {
        let original = LegacyBrandProfile {
            name: "Acme".into(),
            tagline: String::new(),
            logo: Some("https://acme.test/logo.svg".into()),
            brand_colors: vec!["#1a73e8".into()],
            fonts: vec!["Inter".into()],
            social_media: BTreeMap::from([("github".into(), "https://github.com/acme".into())]),
        };
        let current = BrandProfile::from_legacy(&original, LegacySchema::V1).unwrap().value;
        assert_eq!(current.tagline.as_deref(), Some(""));
        let back = current.to_legacy(LegacySchema::V1);
        assert_eq!(back.value, original);
        assert!(back.defaulted.is_empty());
        assert!(!back.is_lossy());
    }

    #[test]
    fn missing_brand_fields_are_defaulted() {
        let brand = BrandProfile {
            name: Some("Acme".into()),
            keywords: vec!["widgets".into()],
            ..Default::default()
        };
        let legacy = brand.to_legacy(LegacySchema::V1);
        assert_eq!(legacy.value.tagline, "");
        assert_eq!(legacy.defaulted, vec!["tagline".to_string()]);
        assert_eq!(legacy.dropped, vec!["keywords".to_string()]);
    }

    #[test]
    fn content_round_trip() {
        let original = LegacyContentInventory {
            total_pages: 2,
            total_words: 740,
            pages: vec![
                LegacyPage {
                    url: "https://acme.test/".into(),
                    title: "Acme".into(),
                    word_count: 420,
                },
                LegacyPage {
                    url: "https://acme.test/about".into(),
                    title: String::new(),
                    word_count: 320,
                },
            ],
            top_keywords: vec!["widgets".into(), "teams".into()],
            readability_score: 61.2,
        };
        let current = ContentInventory::from_legacy(&original, LegacySchema::V1).unwrap().value;
        let back = current.to_legacy(LegacySchema::V1);
        assert_eq!(back.value, original);
        assert!(back.dropped.is_empty());
        assert!(back.defaulted.is_empty());
    }
}
