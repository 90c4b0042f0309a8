use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One crawl run as delivered by the collector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlRun {
    pub root_url: String,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    /// Set by the caller when in-flight pages were discarded.
    #[serde(default)]
    pub partial: bool,
    pub pages: Vec<PageCapture>,
}

/// Ordered sample batch for a single page (all viewports).
///
/// Samples are decoded one by one: an entry that does not match the
/// `RawSample` shape is counted in `malformed_samples` instead of failing
/// the whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "PageCaptureWire")]
pub struct PageCapture {
    pub url: String,
    pub fault: Option<String>,
    pub samples: Vec<RawSample>,
    #[serde(skip_serializing)]
    pub malformed_samples: usize,
}

#[derive(Deserialize)]
struct PageCaptureWire {
    url: String,
    #[serde(default)]
    fault: Option<String>,
    #[serde(default)]
    samples: Vec<serde_json::Value>,
}

impl From<PageCaptureWire> for PageCapture {
    fn from(wire: PageCaptureWire) -> Self {
        let mut samples = Vec::with_capacity(wire.samples.len());
        let mut malformed_samples = 0;
        for value in wire.samples {
            match serde_json::from_value::<RawSample>(value) {
                Ok(sample) => samples.push(sample),
                Err(err) => {
                    debug!(url = %wire.url, %err, "undecodable sample");
                    malformed_samples += 1;
                }
            }
        }
        PageCapture {
            url: wire.url,
            fault: wire.fault,
            samples,
            malformed_samples,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSample {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub viewport: Option<Viewport>,
    pub captured_at: DateTime<Utc>,
    #[serde(flatten)]
    pub observation: Observation,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Viewport {
    pub name: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Observation {
    Color(ColorSample),
    Font(FontSample),
    Spacing(SpacingSample),
    DomCandidate(DomCandidate),
    A11yFinding(A11yFinding),
    A11yAudit { rules_checked: u32 },
    Timing(TimingSample),
    Link(LinkEdge),
    Text(TextBlock),
    Meta { name: String, content: String },
    Feature { name: String },
    CustomToken { name: String, value: String },
}

impl Observation {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Observation::Color(_) => "color",
            Observation::Font(_) => "font",
            Observation::Spacing(_) => "spacing",
            Observation::DomCandidate(_) => "dom_candidate",
            Observation::A11yFinding(_) => "a11y_finding",
            Observation::A11yAudit { .. } => "a11y_audit",
            Observation::Timing(_) => "timing",
            Observation::Link(_) => "link",
            Observation::Text(_) => "text",
            Observation::Meta { .. } => "meta",
            Observation::Feature { .. } => "feature",
            Observation::CustomToken { .. } => "custom_token",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorProperty {
    Text,
    Background,
    Border,
    Fill,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticCue {
    Error,
    Success,
    Warning,
    Info,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorSample {
    /// Raw CSS value: `#rgb`, `#rrggbb`, `rgb()`, `rgba()` or a basic keyword.
    pub value: String,
    pub property: ColorProperty,
    /// Rendered area in px²; used as prominence weight.
    #[serde(default = "default_area")]
    pub area: f64,
    /// Effective background behind a text color.
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default)]
    pub font_size_px: Option<f64>,
    #[serde(default)]
    pub font_weight: Option<u16>,
    /// Alert role / validation context the element sits in.
    #[serde(default)]
    pub semantic_cue: Option<SemanticCue>,
}

fn default_area() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontSample {
    pub family: String,
    pub size_px: f64,
    #[serde(default = "default_weight")]
    pub weight: u16,
    #[serde(default)]
    pub line_height: Option<f64>,
    /// Element tag the font was computed on (`h1`, `p`, `button`, ...).
    #[serde(default)]
    pub element: String,
}

fn default_weight() -> u16 {
    400
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpacingProperty {
    Margin,
    Padding,
    Gap,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpacingSample {
    pub value_px: f64,
    pub property: SpacingProperty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PagePosition {
    Top,
    Middle,
    Bottom,
}

/// Shape of one direct child of a DOM candidate. Text is never part of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildShape {
    pub tag: String,
    #[serde(default)]
    pub child_count: u32,
    #[serde(default)]
    pub has_image: bool,
    #[serde(default)]
    pub has_heading: bool,
    #[serde(default)]
    pub has_link: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomCandidate {
    /// Document order within the page.
    pub order: usize,
    #[serde(default)]
    pub selector: String,
    pub tag: String,
    #[serde(default)]
    pub role: Option<String>,
    /// `aria-*` attributes, keyed without the prefix.
    #[serde(default)]
    pub aria: BTreeMap<String, String>,
    #[serde(default)]
    pub children: Vec<ChildShape>,
    #[serde(default)]
    pub link_count: u32,
    #[serde(default)]
    pub heading_levels: Vec<u8>,
    #[serde(default)]
    pub input_count: u32,
    #[serde(default)]
    pub button_count: u32,
    #[serde(default)]
    pub image_count: u32,
    #[serde(default)]
    pub position: Option<PagePosition>,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Minor,
    Moderate,
    Serious,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct A11yFinding {
    pub rule_id: String,
    pub impact: Severity,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub selector: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerfMetric {
    Fcp,
    Lcp,
    Cls,
    Tbt,
    Ttfb,
    Tti,
    SpeedIndex,
}

impl PerfMetric {
    pub const ALL: [PerfMetric; 7] = [
        PerfMetric::Fcp,
        PerfMetric::Lcp,
        PerfMetric::Cls,
        PerfMetric::Tbt,
        PerfMetric::Ttfb,
        PerfMetric::Tti,
        PerfMetric::SpeedIndex,
    ];
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingSample {
    pub metric: PerfMetric,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FetchOutcome {
    Ok { code: u16 },
    Http { code: u16 },
    Failed { reason: String },
    NotFetched,
}

impl FetchOutcome {
    /// Not-fetched targets are unknown, not broken.
    pub fn is_broken(&self) -> bool {
        match self {
            FetchOutcome::Ok { code } | FetchOutcome::Http { code } => *code >= 400,
            FetchOutcome::Failed { .. } => true,
            FetchOutcome::NotFetched => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkEdge {
    pub target: String,
    pub internal: bool,
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_outcome")]
    pub outcome: FetchOutcome,
}

fn default_outcome() -> FetchOutcome {
    FetchOutcome::NotFetched
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextKind {
    Title,
    Heading,
    Paragraph,
    ListItem,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBlock {
    pub text_kind: TextKind,
    #[serde(default)]
    pub level: Option<u8>,
    pub content: String,
}
