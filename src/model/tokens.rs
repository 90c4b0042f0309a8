use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::samples::SemanticCue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorRole {
    Primary,
    Secondary,
    Accent,
    Neutral,
    Semantic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contrast {
    pub background: String,
    pub ratio: f64,
    pub required: f64,
    pub passes_aa: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorToken {
    /// Mode of the cluster, exactly as observed.
    #[serde(rename = "$value")]
    pub value: String,
    pub role: ColorRole,
    pub usage_count: usize,
    pub prominence: f64,
    #[serde(default)]
    pub contrast: Option<Contrast>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContrastViolation {
    pub color: String,
    pub background: String,
    pub ratio: f64,
    pub required: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColorSystem {
    pub primary: Option<ColorToken>,
    pub secondary: Option<ColorToken>,
    #[serde(default)]
    pub accent: Vec<ColorToken>,
    #[serde(default)]
    pub neutral: BTreeMap<String, ColorToken>,
    #[serde(default)]
    pub semantic: BTreeMap<SemanticCue, ColorToken>,
    /// Canonical values of clusters below the recognized-cluster minimum.
    #[serde(default)]
    pub outliers: Vec<String>,
    #[serde(default)]
    pub contrast_violations: Vec<ContrastViolation>,
    pub sample_count: usize,
    pub clustered_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleStep {
    pub name: String,
    pub px: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleMethod {
    /// Geometric progression fitted by least squares on ln(size).
    Modular,
    /// Observed sizes reported as-is.
    Raw,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontFamilyUsage {
    pub family: String,
    pub usage_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Typography {
    pub families: Vec<FontFamilyUsage>,
    pub weights: Vec<u16>,
    /// Ascending in `px`.
    pub scale: Vec<ScaleStep>,
    pub method: ScaleMethod,
    pub ratio: Option<f64>,
    pub base_size: Option<f64>,
    pub fit_residual: Option<f64>,
    /// Set when a fit was attempted and rejected.
    #[serde(default)]
    pub fallback_reason: Option<String>,
    pub sample_count: usize,
}

impl Default for Typography {
    fn default() -> Self {
        Typography {
            families: Vec::new(),
            weights: Vec::new(),
            scale: Vec::new(),
            method: ScaleMethod::Raw,
            ratio: None,
            base_size: None,
            fit_residual: None,
            fallback_reason: None,
            sample_count: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpacingScale {
    pub base_unit: Option<f64>,
    /// Ascending in `px`, every step an integer multiple of `base_unit`.
    pub steps: Vec<ScaleStep>,
    #[serde(default)]
    pub irregular: Vec<f64>,
    pub sample_count: usize,
    pub regular_count: usize,
}

/// Passthrough value for tokens outside the typed surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CustomValue {
    Number(f64),
    Text(String),
    Group(BTreeMap<String, CustomValue>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesignTokens {
    pub colors: ColorSystem,
    pub typography: Typography,
    pub spacing: SpacingScale,
    #[serde(default)]
    pub custom: BTreeMap<String, CustomValue>,
}
