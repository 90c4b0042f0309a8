use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::config::TypographyConfig;
use crate::model::{FontFamilyUsage, FontSample, ScaleMethod, ScaleStep, Typography};

/// Step name relative to the body size (offset 0).
fn step_name(offset: i64) -> String {
    match offset {
        0 => "base".to_string(),
        -1 => "sm".to_string(),
        -2 => "xs".to_string(),
        1 => "lg".to_string(),
        2 => "xl".to_string(),
        o if o < 0 => format!("{}xs", -o - 1),
        o => format!("{}xl", o - 1),
    }
}

/// First family of a font stack, unquoted.
fn primary_family(stack: &str) -> String {
    stack
        .split(',')
        .next()
        .unwrap_or("")
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string()
}

fn round_to(value: f64, step: f64) -> f64 {
    if step <= 0.0 {
        value
    } else {
        (value / step).round() * step
    }
}

fn round_places(v: f64, places: i32) -> f64 {
    let f = 10f64.powi(places);
    (v * f).round() / f
}

struct Fit {
    intercept: f64,
    slope: f64,
    rms: f64,
}

/// Least squares of ln(size) against rank.
fn fit_log_linear(sizes: &[f64]) -> Fit {
    let n = sizes.len() as f64;
    let ys: Vec<f64> = sizes.iter().map(|s| s.ln()).collect();
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = ys.iter().sum::<f64>() / n;
    let (mut sxy, mut sxx) = (0.0, 0.0);
    for (i, y) in ys.iter().enumerate() {
        let dx = i as f64 - x_mean;
        sxy += dx * (y - y_mean);
        sxx += dx * dx;
    }
    let slope = if sxx == 0.0 { 0.0 } else { sxy / sxx };
    let intercept = y_mean - slope * x_mean;
    let sse: f64 = ys
        .iter()
        .enumerate()
        .map(|(i, y)| (y - (intercept + slope * i as f64)).powi(2))
        .sum();
    Fit {
        intercept,
        slope,
        rms: (sse / n).sqrt(),
    }
}

pub fn normalize_typography<'a>(
    samples: impl IntoIterator<Item = &'a FontSample>,
    cfg: &TypographyConfig,
) -> Typography {
    let mut size_counts: BTreeMap<i64, (f64, usize)> = BTreeMap::new();
    let mut family_counts: Vec<(String, usize)> = Vec::new();
    let mut weights: Vec<u16> = Vec::new();
    let mut sample_count = 0;

    for s in samples {
        if !(s.size_px.is_finite() && s.size_px > 0.0) {
            continue;
        }
        sample_count += 1;
        let size = round_to(s.size_px, cfg.size_rounding_px);
        size_counts.entry((size * 100.0).round() as i64).or_insert((size, 0)).1 += 1;

        let family = primary_family(&s.family);
        if !family.is_empty() {
            match family_counts.iter_mut().find(|(f, _)| *f == family) {
                Some(entry) => entry.1 += 1,
                None => family_counts.push((family, 1)),
            }
        }
        if !weights.contains(&s.weight) {
            weights.push(s.weight);
        }
    }

    // stable sort keeps first-seen order among equal counts
    family_counts.sort_by(|a, b| b.1.cmp(&a.1));
    weights.sort_unstable();

    let mut typo = Typography {
        families: family_counts
            .into_iter()
            .map(|(family, usage_count)| FontFamilyUsage { family, usage_count })
            .collect(),
        weights,
        sample_count,
        ..Default::default()
    };

    let sizes: Vec<(f64, usize)> = size_counts.into_values().collect();
    if sizes.is_empty() {
        return typo;
    }

    // body size = most frequent; ties go to the smaller size
    let body = sizes
        .iter()
        .enumerate()
        .max_by(|a, b| a.1 .1.cmp(&b.1 .1).then(b.0.cmp(&a.0)))
        .map(|(i, _)| i)
        .unwrap_or(0);
    let raw: Vec<f64> = sizes.iter().map(|(s, _)| *s).collect();

    let raw_scale = |values: &[f64]| -> Vec<ScaleStep> {
        values
            .iter()
            .enumerate()
            .map(|(i, px)| ScaleStep {
                name: step_name(i as i64 - body as i64),
                px: *px,
            })
            .collect()
    };

    typo.base_size = Some(raw[body]);
    if raw.len() < 2 {
        typo.scale = raw_scale(&raw);
        return typo;
    }

    let fit = fit_log_linear(&raw);
    typo.fit_residual = Some(round_places(fit.rms, 4));

    if raw.len() > 2 && fit.rms > cfg.fit_tolerance {
        let reason = format!(
            "rms residual {:.4} exceeds tolerance {:.4}",
            fit.rms, cfg.fit_tolerance
        );
        warn!("modular scale rejected: {}", reason);
        typo.method = ScaleMethod::Raw;
        typo.fallback_reason = Some(reason);
        typo.scale = raw_scale(&raw);
        return typo;
    }

    let fitted: Vec<f64> = (0..raw.len())
        .map(|i| round_places((fit.intercept + fit.slope * i as f64).exp(), 2))
        .collect();
    typo.method = ScaleMethod::Modular;
    typo.ratio = Some(round_places(fit.slope.exp(), 3));
    typo.base_size = Some(fitted[body]);
    typo.scale = raw_scale(&fitted);
    debug!(ratio = ?typo.ratio, steps = typo.scale.len(), "fitted modular scale");
    typo
}

/// Fraction of adjacent observed heading levels whose mean size does not
/// grow with the level number. `None` with fewer than two heading levels.
pub fn heading_monotonicity<'a>(samples: impl IntoIterator<Item = &'a FontSample>) -> Option<f64> {
    let mut levels: BTreeMap<u8, (f64, usize)> = BTreeMap::new();
    for s in samples {
        let level = s
            .element
            .strip_prefix('h')
            .and_then(|l| l.parse::<u8>().ok())
            .filter(|l| (1..=6).contains(l));
        if let Some(level) = level {
            let entry = levels.entry(level).or_insert((0.0, 0));
            entry.0 += s.size_px;
            entry.1 += 1;
        }
    }
    let means: Vec<f64> = levels.values().map(|(sum, n)| sum / *n as f64).collect();
    if means.len() < 2 {
        return None;
    }
    let ordered = means.windows(2).filter(|w| w[0] >= w[1]).count();
    Some(ordered as f64 / (means.len() - 1) as f64)
}
