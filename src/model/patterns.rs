use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    Navigation,
    Hero,
    Cards,
    Form,
    Table,
    Pricing,
    Footer,
}

impl PatternType {
    /// Declaration order; also the tie-break order between types.
    pub const ALL: [PatternType; 7] = [
        PatternType::Navigation,
        PatternType::Hero,
        PatternType::Cards,
        PatternType::Form,
        PatternType::Table,
        PatternType::Pricing,
        PatternType::Footer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PatternType::Navigation => "navigation",
            PatternType::Hero => "hero",
            PatternType::Cards => "cards",
            PatternType::Form => "form",
            PatternType::Table => "table",
            PatternType::Pricing => "pricing",
            PatternType::Footer => "footer",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternSignals {
    pub semantic_tag: bool,
    pub landmark_role: bool,
    pub aria_labelled: bool,
    pub aria_attribute_count: usize,
    pub interactive_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentSummary {
    pub headline: Option<String>,
    pub word_count: usize,
    pub link_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UIPattern {
    #[serde(rename = "type")]
    pub pattern_type: PatternType,
    pub variant: String,
    pub confidence: f64,
    pub page: String,
    pub selector: String,
    pub fingerprint: String,
    pub signals: PatternSignals,
    pub content: ContentSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantSummary {
    pub name: String,
    pub fingerprints: Vec<String>,
    pub instances: usize,
    pub mean_confidence: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternCatalog {
    /// Published patterns: above the confidence floor, capped per type.
    pub patterns: Vec<UIPattern>,
    pub variants: BTreeMap<PatternType, Vec<VariantSummary>>,
    /// Every classified instance, including those below the floor.
    pub instance_count: usize,
    pub low_confidence_count: usize,
}
