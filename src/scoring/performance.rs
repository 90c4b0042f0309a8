use std::collections::BTreeMap;

use crate::config::PerformanceBudgets;
use crate::model::{Compliance, MetricResult, PerfMetric, PerformanceReport, TimingSample};

/// Warning band above the budget.
const WARNING_FACTOR: f64 = 1.2;

pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    })
}

pub fn compliance(value: f64, budget: f64) -> Compliance {
    if value <= budget {
        Compliance::Pass
    } else if value <= budget * WARNING_FACTOR {
        Compliance::Warning
    } else {
        Compliance::Fail
    }
}

fn metric_score(m: &MetricResult) -> f64 {
    let headroom = if m.value <= 0.0 {
        1.0
    } else {
        (m.budget / m.value).min(1.0)
    };
    let factor = match m.compliance {
        Compliance::Pass => 1.0,
        Compliance::Warning => 0.8,
        Compliance::Fail => 0.5,
    };
    headroom * factor
}

fn report_from(values: BTreeMap<PerfMetric, Vec<f64>>, budgets: &PerformanceBudgets) -> PerformanceReport {
    let mut metrics = Vec::new();
    for metric in PerfMetric::ALL {
        let Some(mut observed) = values.get(&metric).cloned() else {
            continue;
        };
        let Some(value) = median(&mut observed) else {
            continue;
        };
        let budget = budgets.budget(metric);
        if budget <= 0.0 {
            continue;
        }
        metrics.push(MetricResult {
            metric,
            value,
            budget,
            ratio: value / budget,
            compliance: compliance(value, budget),
        });
    }

    let score = (!metrics.is_empty()).then(|| {
        let mean = metrics.iter().map(metric_score).sum::<f64>() / metrics.len() as f64;
        (mean * 100.0).clamp(0.0, 100.0)
    });
    PerformanceReport { metrics, score }
}

/// Median of each metric across viewports, checked against its budget.
pub fn page_report<'a>(
    timings: impl IntoIterator<Item = &'a TimingSample>,
    budgets: &PerformanceBudgets,
) -> PerformanceReport {
    let mut values: BTreeMap<PerfMetric, Vec<f64>> = BTreeMap::new();
    for t in timings {
        if t.value.is_finite() && t.value >= 0.0 {
            values.entry(t.metric).or_default().push(t.value);
        }
    }
    report_from(values, budgets)
}

/// Site-level report from the per-page medians.
pub fn merge_reports<'a>(
    reports: impl IntoIterator<Item = &'a PerformanceReport>,
    budgets: &PerformanceBudgets,
) -> PerformanceReport {
    let mut values: BTreeMap<PerfMetric, Vec<f64>> = BTreeMap::new();
    for report in reports {
        for m in &report.metrics {
            values.entry(m.metric).or_default().push(m.value);
        }
    }
    report_from(values, budgets)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing(metric: PerfMetric, value: f64) -> TimingSample {
        TimingSample { metric, value }
    }

    #[test]
    fn budget_bands() {
        assert_eq!(compliance(2500.0, 2500.0), Compliance::Pass);
        assert_eq!(compliance(2900.0, 2500.0), Compliance::Warning);
        assert_eq!(compliance(3100.0, 2500.0), Compliance::Fail);
    }

    #[test]
    fn uses_median_across_viewports() {
        let samples = vec![
            timing(PerfMetric::Lcp, 2000.0),
            timing(PerfMetric::Lcp, 4000.0),
            timing(PerfMetric::Lcp, 2400.0),
        ];
        let report = page_report(&samples, &PerformanceBudgets::default());
        assert_eq!(report.metrics.len(), 1);
        assert_eq!(report.metrics[0].value, 2400.0);
        assert_eq!(report.compliance_of(PerfMetric::Lcp), Some(Compliance::Pass));
        assert_eq!(report.score, Some(100.0));
    }

    #[test]
    fn failing_metric_drags_score() {
        let samples = vec![timing(PerfMetric::Fcp, 900.0), timing(PerfMetric::Tbt, 400.0)];
        let report = page_report(&samples, &PerformanceBudgets::default());
        // tbt: 200/400 * 0.5 = 0.25
        assert_eq!(report.score, Some(62.5));
        assert_eq!(report.compliance_of(PerfMetric::Tbt), Some(Compliance::Fail));
    }

    #[test]
    fn no_timings_no_score() {
        let report = page_report(&Vec::<TimingSample>::new(), &PerformanceBudgets::default());
        assert!(report.score.is_none());
        assert!(report.metrics.is_empty());
    }

    #[test]
    fn merge_takes_median_of_pages() {
        let budgets = PerformanceBudgets::default();
        let pages: Vec<PerformanceReport> = [100.0, 300.0, 900.0]
            .into_iter()
            .map(|v| page_report(&[timing(PerfMetric::Ttfb, v)], &budgets))
            .collect();
        let site = merge_reports(&pages, &budgets);
        assert_eq!(site.metrics[0].value, 300.0);
    }
}
