use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::config::ColorConfig;
use crate::model::{
    ColorProperty, ColorRole, ColorSample, ColorSystem, ColorToken, Contrast, ContrastViolation,
    SemanticCue,
};

static HEX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#([0-9a-fA-F]{3,8})$").unwrap());
static RGB_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^rgba?\(\s*(\d{1,3})\s*[,\s]\s*(\d{1,3})\s*[,\s]\s*(\d{1,3})\s*(?:[,/]\s*([0-9.]+)(%?))?\s*\)$")
        .unwrap()
});

const AA_NORMAL: f64 = 4.5;
const AA_LARGE: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    fn channels(&self) -> [f64; 3] {
        [self.r, self.g, self.b].map(|c| c as f64 / 255.0)
    }

    /// WCAG 2.x relative luminance.
    pub fn luminance(&self) -> f64 {
        let [r, g, b] = self.channels().map(linearize);
        0.2126 * r + 0.7152 * g + 0.0722 * b
    }

    /// CIE L*a*b* under D65.
    pub fn lab(&self) -> [f64; 3] {
        let [r, g, b] = self.channels().map(linearize);
        let x = (0.4124 * r + 0.3576 * g + 0.1805 * b) / 0.95047;
        let y = 0.2126 * r + 0.7152 * g + 0.0722 * b;
        let z = (0.0193 * r + 0.1192 * g + 0.9505 * b) / 1.08883;
        let f = |t: f64| {
            if t > 0.008856 {
                t.cbrt()
            } else {
                7.787 * t + 16.0 / 116.0
            }
        };
        let (fx, fy, fz) = (f(x), f(y), f(z));
        [116.0 * fy - 16.0, 500.0 * (fx - fy), 200.0 * (fy - fz)]
    }

    /// (hue degrees, saturation, lightness).
    pub fn hsl(&self) -> (f64, f64, f64) {
        let [r, g, b] = self.channels();
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;
        let d = max - min;
        if d == 0.0 {
            return (0.0, 0.0, l);
        }
        let s = d / (1.0 - (2.0 * l - 1.0).abs());
        let h = if max == r {
            60.0 * (((g - b) / d).rem_euclid(6.0))
        } else if max == g {
            60.0 * ((b - r) / d + 2.0)
        } else {
            60.0 * ((r - g) / d + 4.0)
        };
        (h, s, l)
    }
}

fn linearize(c: f64) -> f64 {
    if c <= 0.03928 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Euclidean distance in Lab (CIE76).
pub fn delta_e(a: &Rgb, b: &Rgb) -> f64 {
    let (la, lb) = (a.lab(), b.lab());
    la.iter()
        .zip(lb.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

pub fn contrast_ratio(a: &Rgb, b: &Rgb) -> f64 {
    let (la, lb) = (a.luminance(), b.luminance());
    let (hi, lo) = if la >= lb { (la, lb) } else { (lb, la) };
    (hi + 0.05) / (lo + 0.05)
}

/// Parse a computed CSS color. Fully transparent values yield `None`.
pub fn parse_color(raw: &str) -> Option<Rgb> {
    let value = raw.trim().to_ascii_lowercase();
    match value.as_str() {
        "white" => return Some(Rgb { r: 255, g: 255, b: 255 }),
        "black" => return Some(Rgb { r: 0, g: 0, b: 0 }),
        "red" => return Some(Rgb { r: 255, g: 0, b: 0 }),
        "green" => return Some(Rgb { r: 0, g: 128, b: 0 }),
        "blue" => return Some(Rgb { r: 0, g: 0, b: 255 }),
        "gray" | "grey" => return Some(Rgb { r: 128, g: 128, b: 128 }),
        "transparent" => return None,
        _ => {}
    }

    if let Some(caps) = HEX_RE.captures(&value) {
        let digits = &caps[1];
        let expanded: String = match digits.len() {
            3 | 4 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 | 8 => digits.to_string(),
            _ => return None,
        };
        let byte = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).ok();
        if expanded.len() == 8 && byte(6)? == 0 {
            return None;
        }
        return Some(Rgb {
            r: byte(0)?,
            g: byte(2)?,
            b: byte(4)?,
        });
    }

    let caps = RGB_RE.captures(&value)?;
    let channel = |i: usize| caps[i].parse::<u16>().ok().filter(|v| *v <= 255).map(|v| v as u8);
    if let Some(alpha) = caps.get(4) {
        let a: f64 = alpha.as_str().parse().ok()?;
        if a == 0.0 {
            return None;
        }
    }
    Some(Rgb {
        r: channel(1)?,
        g: channel(2)?,
        b: channel(3)?,
    })
}

/// Per exact (normalized) value.
#[derive(Debug, Clone)]
struct ExactColor {
    rgb: Rgb,
    hex: String,
    count: usize,
    prominence: f64,
    first_seen: usize,
    text_count: usize,
    small_text: bool,
    backgrounds: BTreeMap<String, usize>,
    cues: BTreeMap<SemanticCue, usize>,
}

#[derive(Debug, Clone)]
struct Cluster {
    seed: ExactColor,
    members: usize,
    count: usize,
    prominence: f64,
    text_count: usize,
    small_text: bool,
    backgrounds: BTreeMap<String, usize>,
    cues: BTreeMap<SemanticCue, usize>,
}

impl Cluster {
    fn new(seed: ExactColor) -> Self {
        let mut cluster = Cluster {
            members: 0,
            count: 0,
            prominence: 0.0,
            text_count: 0,
            small_text: false,
            backgrounds: BTreeMap::new(),
            cues: BTreeMap::new(),
            seed: seed.clone(),
        };
        cluster.absorb(seed);
        cluster
    }

    fn absorb(&mut self, color: ExactColor) {
        self.members += 1;
        self.count += color.count;
        self.prominence += color.prominence;
        self.text_count += color.text_count;
        self.small_text |= color.small_text;
        for (bg, n) in color.backgrounds {
            *self.backgrounds.entry(bg).or_default() += n;
        }
        for (cue, n) in color.cues {
            *self.cues.entry(cue).or_default() += n;
        }
    }

    fn token(&self, role: ColorRole) -> ColorToken {
        ColorToken {
            value: self.seed.hex.clone(),
            role,
            usage_count: self.count,
            prominence: round2(self.prominence),
            contrast: None,
        }
    }

    /// Most frequent paired background; ties go to the lexically smaller value.
    fn dominant_background(&self) -> Option<&String> {
        self.backgrounds
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(bg, _)| bg)
    }
}

fn is_large_text(size: Option<f64>, weight: Option<u16>) -> bool {
    match size {
        Some(s) => s >= 24.0 || (s >= 18.66 && weight.unwrap_or(400) >= 700),
        None => false,
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Group exact values, ordered by count desc then first appearance.
fn tally<'a>(samples: impl IntoIterator<Item = &'a ColorSample>) -> (Vec<ExactColor>, usize) {
    let mut order: Vec<ExactColor> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut total = 0;

    for sample in samples {
        let Some(rgb) = parse_color(&sample.value) else {
            continue;
        };
        total += 1;
        let hex = rgb.hex();
        let slot = *index.entry(hex.clone()).or_insert_with(|| {
            order.push(ExactColor {
                rgb,
                hex: hex.clone(),
                count: 0,
                prominence: 0.0,
                first_seen: order.len(),
                text_count: 0,
                small_text: false,
                backgrounds: BTreeMap::new(),
                cues: BTreeMap::new(),
            });
            order.len() - 1
        });
        let exact = &mut order[slot];
        exact.count += 1;
        exact.prominence += sample.area.max(0.0);
        if let Some(cue) = sample.semantic_cue {
            *exact.cues.entry(cue).or_default() += 1;
        }
        if sample.property == ColorProperty::Text {
            exact.text_count += 1;
            if !is_large_text(sample.font_size_px, sample.font_weight) {
                exact.small_text = true;
            }
            if let Some(bg) = sample.background.as_deref().and_then(parse_color) {
                *exact.backgrounds.entry(bg.hex()).or_default() += 1;
            }
        }
    }

    order.sort_by(|a, b| b.count.cmp(&a.count).then(a.first_seen.cmp(&b.first_seen)));
    (order, total)
}

/// Greedy clustering against each cluster's seed. Seeds are visited in
/// descending frequency, so every seed is the mode of its cluster.
fn cluster(exacts: Vec<ExactColor>, threshold: f64) -> Vec<Cluster> {
    let mut clusters: Vec<Cluster> = Vec::new();
    for exact in exacts {
        match clusters
            .iter_mut()
            .find(|c| delta_e(&c.seed.rgb, &exact.rgb) < threshold)
        {
            Some(c) => c.absorb(exact),
            None => clusters.push(Cluster::new(exact)),
        }
    }
    clusters
}

fn semantic_hue(rgb: &Rgb, cfg: &ColorConfig) -> Option<SemanticCue> {
    let (h, s, l) = rgb.hsl();
    if s < cfg.semantic_min_saturation || !(0.15..=0.85).contains(&l) {
        return None;
    }
    [
        (SemanticCue::Error, cfg.error_hue),
        (SemanticCue::Warning, cfg.warning_hue),
        (SemanticCue::Success, cfg.success_hue),
        (SemanticCue::Info, cfg.info_hue),
    ]
    .into_iter()
    .find(|(_, range)| range.contains(h))
    .map(|(cue, _)| cue)
}

fn neutral_key(rgb: &Rgb, taken: &BTreeMap<String, ColorToken>) -> String {
    let (_, _, l) = rgb.hsl();
    let step = (((1.0 - l) * 10.0).round() * 100.0).clamp(50.0, 950.0) as u32;
    let base = step.to_string();
    if !taken.contains_key(&base) {
        return base;
    }
    (2..)
        .map(|n| format!("{base}-{n}"))
        .find(|k| !taken.contains_key(k))
        .unwrap_or(base)
}

fn contrast_for(cluster: &Cluster) -> Option<Contrast> {
    if cluster.text_count == 0 {
        return None;
    }
    let bg_hex = cluster.dominant_background()?;
    let bg = parse_color(bg_hex)?;
    let ratio = round2(contrast_ratio(&cluster.seed.rgb, &bg));
    let required = if cluster.small_text { AA_NORMAL } else { AA_LARGE };
    Some(Contrast {
        background: bg_hex.clone(),
        ratio,
        required,
        passes_aa: ratio >= required,
    })
}

fn violation(cluster: &Cluster, contrast: &Contrast) -> ContrastViolation {
    ContrastViolation {
        color: cluster.seed.hex.clone(),
        background: contrast.background.clone(),
        ratio: contrast.ratio,
        required: contrast.required,
    }
}

/// Cluster raw color observations into a role-assigned token set.
pub fn normalize_colors<'a>(
    samples: impl IntoIterator<Item = &'a ColorSample>,
    cfg: &ColorConfig,
) -> ColorSystem {
    let (exacts, total) = tally(samples);
    let clusters = cluster(exacts, cfg.delta_e_threshold);

    let (mut recognized, outliers): (Vec<Cluster>, Vec<Cluster>) = clusters
        .into_iter()
        .partition(|c| c.count >= cfg.min_cluster_size);
    recognized.sort_by(|a, b| {
        b.prominence
            .total_cmp(&a.prominence)
            .then(a.seed.first_seen.cmp(&b.seed.first_seen))
    });

    let mut system = ColorSystem {
        sample_count: total,
        clustered_count: recognized.iter().map(|c| c.count).sum(),
        outliers: outliers.iter().map(|c| c.seed.hex.clone()).collect(),
        ..Default::default()
    };

    for c in &recognized {
        let (_, saturation, _) = c.seed.rgb.hsl();
        let contrast = contrast_for(c);
        if let Some(ct) = contrast.as_ref().filter(|ct| !ct.passes_aa) {
            system.contrast_violations.push(violation(c, ct));
        }

        if saturation <= cfg.neutral_max_saturation {
            let key = neutral_key(&c.seed.rgb, &system.neutral);
            let mut token = c.token(ColorRole::Neutral);
            token.contrast = contrast;
            system.neutral.insert(key, token);
            continue;
        }

        let confirmed = semantic_hue(&c.seed.rgb, cfg).filter(|cue| c.cues.contains_key(cue));
        if let Some(cue) = confirmed {
            if !system.semantic.contains_key(&cue) {
                let mut token = c.token(ColorRole::Semantic);
                token.contrast = contrast;
                system.semantic.insert(cue, token);
                continue;
            }
        }

        let role = if system.primary.is_none() && confirmed.is_none() {
            ColorRole::Primary
        } else if system.secondary.is_none() && confirmed.is_none() {
            ColorRole::Secondary
        } else {
            ColorRole::Accent
        };
        let mut token = c.token(role);
        token.contrast = contrast;
        match role {
            ColorRole::Primary => system.primary = Some(token),
            ColorRole::Secondary => system.secondary = Some(token),
            _ => system.accent.push(token),
        }
    }

    // outliers get no token but their text contrast still counts
    for c in &outliers {
        if let Some(ct) = contrast_for(c).filter(|ct| !ct.passes_aa) {
            system.contrast_violations.push(violation(c, &ct));
        }
    }

    debug!(
        samples = total,
        clusters = recognized.len(),
        merged_values = recognized.iter().map(|c| c.members).sum::<usize>(),
        outliers = system.outliers.len(),
        "normalized colors"
    );
    system
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(value: &str, property: ColorProperty, area: f64) -> ColorSample {
        ColorSample {
            value: value.to_string(),
            property,
            area,
            background: None,
            font_size_px: None,
            font_weight: None,
            semantic_cue: None,
        }
    }

    fn text_on(value: &str, bg: &str, size: f64) -> ColorSample {
        ColorSample {
            background: Some(bg.to_string()),
            font_size_px: Some(size),
            ..sample(value, ColorProperty::Text, 1.0)
        }
    }

    #[test]
    fn parses_css_forms() {
        assert_eq!(parse_color("#FFF").unwrap().hex(), "#ffffff");
        assert_eq!(parse_color("rgb(255, 0, 0)").unwrap().hex(), "#ff0000");
        assert_eq!(parse_color("rgba(0, 0, 255, 0.5)").unwrap().hex(), "#0000ff");
        assert!(parse_color("rgba(0, 0, 0, 0)").is_none());
        assert!(parse_color("transparent").is_none());
        assert!(parse_color("#12345").is_none());
    }

    #[test]
    fn contrast_black_on_white() {
        let black = Rgb { r: 0, g: 0, b: 0 };
        let white = Rgb { r: 255, g: 255, b: 255 };
        assert!((contrast_ratio(&black, &white) - 21.0).abs() < 0.01);
    }

    #[test]
    fn canonical_value_is_cluster_mode() {
        let samples = vec![
            sample("#1e40af", ColorProperty::Background, 10.0),
            sample("#1f41b0", ColorProperty::Background, 10.0),
            sample("#1f41b0", ColorProperty::Background, 10.0),
            sample("#1e40af", ColorProperty::Fill, 10.0),
            sample("#1f41b0", ColorProperty::Fill, 10.0),
        ];
        let system = normalize_colors(&samples, &ColorConfig::default());
        let primary = system.primary.unwrap();
        assert_eq!(primary.value, "#1f41b0");
        assert_eq!(primary.usage_count, 5);
        assert!(system.secondary.is_none());
    }

    #[test]
    fn singletons_are_outliers() {
        let samples = vec![
            sample("#1e40af", ColorProperty::Background, 5.0),
            sample("#1e40af", ColorProperty::Background, 5.0),
            sample("#f97316", ColorProperty::Fill, 1.0),
        ];
        let system = normalize_colors(&samples, &ColorConfig::default());
        assert_eq!(system.outliers, vec!["#f97316".to_string()]);
        assert_eq!(system.sample_count, 3);
        assert_eq!(system.clustered_count, 2);
    }

    #[test]
    fn semantic_requires_dom_cue() {
        let mut red_alert = sample("#dc2626", ColorProperty::Text, 1.0);
        red_alert.semantic_cue = Some(SemanticCue::Error);
        let samples = vec![
            sample("#7c3aed", ColorProperty::Background, 100.0),
            sample("#7c3aed", ColorProperty::Background, 100.0),
            red_alert.clone(),
            red_alert,
            sample("#16a34a", ColorProperty::Fill, 2.0),
            sample("#16a34a", ColorProperty::Fill, 2.0),
        ];
        let system = normalize_colors(&samples, &ColorConfig::default());
        assert_eq!(system.primary.as_ref().unwrap().value, "#7c3aed");
        assert_eq!(system.semantic[&SemanticCue::Error].value, "#dc2626");
        // green without a success cue is a plain brand color
        assert_eq!(system.secondary.as_ref().unwrap().value, "#16a34a");
        assert!(!system.semantic.contains_key(&SemanticCue::Success));
    }

    #[test]
    fn neutrals_keyed_by_lightness() {
        let samples = vec![
            sample("#ffffff", ColorProperty::Background, 500.0),
            sample("#ffffff", ColorProperty::Background, 500.0),
            sample("#111111", ColorProperty::Text, 1.0),
            sample("#111111", ColorProperty::Text, 1.0),
        ];
        let system = normalize_colors(&samples, &ColorConfig::default());
        assert!(system.primary.is_none());
        assert_eq!(system.neutral["50"].value, "#ffffff");
        assert_eq!(system.neutral["900"].value, "#111111");
    }

    #[test]
    fn low_contrast_text_is_flagged() {
        let samples = vec![
            text_on("#aaaaaa", "#ffffff", 14.0),
            text_on("#aaaaaa", "#ffffff", 14.0),
        ];
        let system = normalize_colors(&samples, &ColorConfig::default());
        assert_eq!(system.contrast_violations.len(), 1);
        let v = &system.contrast_violations[0];
        assert_eq!(v.required, 4.5);
        assert!(v.ratio < 4.5);
    }

    #[test]
    fn one_off_text_color_still_checked_for_contrast() {
        let samples = vec![
            sample("#1a73e8", ColorProperty::Background, 500.0),
            sample("#1a73e8", ColorProperty::Background, 500.0),
            text_on("#eeeeee", "#ffffff", 14.0),
        ];
        let system = normalize_colors(&samples, &ColorConfig::default());
        assert_eq!(system.outliers, vec!["#eeeeee".to_string()]);
        assert_eq!(system.contrast_violations.len(), 1);
        assert_eq!(system.contrast_violations[0].color, "#eeeeee");
        assert_eq!(system.contrast_violations[0].required, 4.5);
    }

    #[test]
    fn large_text_uses_relaxed_threshold() {
        let samples = vec![
            text_on("#888888", "#ffffff", 32.0),
            text_on("#888888", "#ffffff", 28.0),
        ];
        let system = normalize_colors(&samples, &ColorConfig::default());
        let token = system.neutral.values().next().unwrap();
        let contrast = token.contrast.as_ref().unwrap();
        assert_eq!(contrast.required, 3.0);
        assert!(contrast.passes_aa);
    }
}
