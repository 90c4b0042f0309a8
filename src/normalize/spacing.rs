use std::collections::BTreeMap;

use tracing::debug;

use crate::config::SpacingConfig;
use crate::model::{ScaleStep, SpacingSample, SpacingScale};

const NAMED_STEPS: [&str; 6] = ["xs", "sm", "md", "lg", "xl", "xxl"];

fn key(v: f64) -> i64 {
    (v * 100.0).round() as i64
}

/// Multiple of `base` that `value` rounds to, if within tolerance.
fn fit_multiple(value: f64, base: f64, tolerance: f64) -> Option<u32> {
    let multiple = (value / base).round();
    if multiple < 1.0 {
        return None;
    }
    ((value - multiple * base).abs() <= tolerance * base).then_some(multiple as u32)
}

/// Candidate dividing the most distinct values; ties go to the larger unit.
fn pick_base_unit(distinct: &[f64], cfg: &SpacingConfig) -> Option<f64> {
    cfg.base_candidates
        .iter()
        .copied()
        .filter(|c| *c > 0.0)
        .map(|c| {
            let fits = distinct
                .iter()
                .filter(|v| fit_multiple(**v, c, cfg.tolerance).is_some())
                .count();
            (c, fits)
        })
        .filter(|(_, fits)| *fits > 0)
        .max_by(|a, b| a.1.cmp(&b.1).then(a.0.total_cmp(&b.0)))
        .map(|(c, _)| c)
}

pub fn normalize_spacing<'a>(
    samples: impl IntoIterator<Item = &'a SpacingSample>,
    cfg: &SpacingConfig,
) -> SpacingScale {
    let mut counts: BTreeMap<i64, (f64, usize)> = BTreeMap::new();
    for s in samples {
        if s.value_px.is_finite() && s.value_px > 0.0 {
            let v = (s.value_px * 2.0).round() / 2.0;
            counts.entry(key(v)).or_insert((v, 0)).1 += 1;
        }
    }
    let sample_count: usize = counts.values().map(|(_, n)| n).sum();
    let distinct: Vec<f64> = counts.values().map(|(v, _)| *v).collect();

    let Some(base) = pick_base_unit(&distinct, cfg) else {
        return SpacingScale {
            irregular: distinct,
            sample_count,
            ..Default::default()
        };
    };

    // multiple -> (sum of values, samples) for the cluster centroid
    let mut multiples: BTreeMap<u32, (f64, usize)> = BTreeMap::new();
    let mut irregular = Vec::new();
    let mut regular_count = 0;
    for (v, n) in counts.values() {
        match fit_multiple(*v, base, cfg.tolerance) {
            Some(m) => {
                let entry = multiples.entry(m).or_insert((0.0, 0));
                entry.0 += v * *n as f64;
                entry.1 += n;
                regular_count += n;
            }
            None => irregular.push(*v),
        }
    }

    let named = multiples.len() <= NAMED_STEPS.len();
    let steps = multiples
        .iter()
        .enumerate()
        .map(|(i, (m, _))| ScaleStep {
            name: if named {
                NAMED_STEPS[i].to_string()
            } else {
                m.to_string()
            },
            px: *m as f64 * base,
        })
        .collect();

    debug!(
        base,
        steps = multiples.len(),
        irregular = irregular.len(),
        "derived spacing scale"
    );

    SpacingScale {
        base_unit: Some(base),
        steps,
        irregular,
        sample_count,
        regular_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SpacingProperty;

    fn samples(values: &[f64]) -> Vec<SpacingSample> {
        values
            .iter()
            .map(|v| SpacingSample {
                value_px: *v,
                property: SpacingProperty::Padding,
            })
            .collect()
    }

    #[test]
    fn four_eight_fifteen() {
        let scale = normalize_spacing(&samples(&[4.0, 8.0, 15.0]), &SpacingConfig::default());
        assert_eq!(scale.base_unit, Some(4.0));
        assert_eq!(
            scale.steps,
            vec![
                ScaleStep { name: "xs".into(), px: 4.0 },
                ScaleStep { name: "sm".into(), px: 8.0 },
            ]
        );
        assert_eq!(scale.irregular, vec![15.0]);
        assert_eq!(scale.regular_count, 2);
        assert_eq!(scale.sample_count, 3);
    }

    #[test]
    fn near_multiples_snap_to_step() {
        let scale = normalize_spacing(
            &samples(&[8.0, 8.0, 16.0, 15.8, 24.0, 32.0]),
            &SpacingConfig::default(),
        );
        assert_eq!(scale.base_unit, Some(8.0));
        let px: Vec<f64> = scale.steps.iter().map(|s| s.px).collect();
        assert_eq!(px, vec![8.0, 16.0, 24.0, 32.0]);
        assert!(scale.irregular.is_empty());
        assert_eq!(scale.regular_count, 6);
    }

    #[test]
    fn long_scales_use_numeric_names() {
        let scale = normalize_spacing(
            &samples(&[4.0, 8.0, 12.0, 16.0, 20.0, 24.0, 32.0]),
            &SpacingConfig::default(),
        );
        assert_eq!(scale.base_unit, Some(4.0));
        assert_eq!(scale.steps.len(), 7);
        assert_eq!(scale.steps[6].name, "8");
    }

    #[test]
    fn zero_and_empty_input() {
        let scale = normalize_spacing(&samples(&[0.0]), &SpacingConfig::default());
        assert_eq!(scale.sample_count, 0);
        assert!(scale.base_unit.is_none());
    }
}
