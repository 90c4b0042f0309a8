use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::architecture::{self, BrandInputs, SiteInput};
use crate::assemble::{self, BrandParts, DesignParts};
use crate::config::ExtractionConfig;
use crate::error::Diagnostic;
use crate::model::{
    A11yFinding, AccessibilityReport, BrandExtractionResult, ColorSample, ColorSystem, CrawlRun,
    DesignTokens, DomCandidate, ExtractionResult, FontSample, LinkEdge, Observation, PageCapture,
    PageContent, PageReport, PerformanceReport, RawSample, RunMetadata, SpacingSample, SubScore,
    TextBlock, TimingSample,
};
use crate::normalize::{
    collect_custom_tokens, heading_monotonicity, normalize_colors, normalize_spacing,
    normalize_typography,
};
use crate::patterns::{build_catalog, classify_page, Classified};
use crate::scoring::{
    accessibility, modernity_score, performance, score_quality, ModernitySignals, QualityInputs,
};

/// Both artifacts of one run.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub design: ExtractionResult,
    pub brand: BrandExtractionResult,
}

/// A page whose samples passed validation.
struct ValidPage<'a> {
    url: &'a str,
    samples: Vec<&'a RawSample>,
}

impl<'a> ValidPage<'a> {
    fn pick<'b, T: 'a>(
        &'b self,
        f: impl Fn(&'a Observation) -> Option<&'a T> + 'b,
    ) -> impl Iterator<Item = &'a T> + 'b {
        self.samples.iter().copied().filter_map(move |s| f(&s.observation))
    }

    fn colors(&self) -> impl Iterator<Item = &'a ColorSample> + '_ {
        self.pick(|o| match o {
            Observation::Color(c) => Some(c),
            _ => None,
        })
    }

    fn fonts(&self) -> impl Iterator<Item = &'a FontSample> + '_ {
        self.pick(|o| match o {
            Observation::Font(f) => Some(f),
            _ => None,
        })
    }

    fn spacing(&self) -> impl Iterator<Item = &'a SpacingSample> + '_ {
        self.pick(|o| match o {
            Observation::Spacing(s) => Some(s),
            _ => None,
        })
    }

    fn candidates(&self) -> impl Iterator<Item = &'a DomCandidate> + '_ {
        self.pick(|o| match o {
            Observation::DomCandidate(c) => Some(c),
            _ => None,
        })
    }

    fn findings(&self) -> impl Iterator<Item = &'a A11yFinding> + '_ {
        self.pick(|o| match o {
            Observation::A11yFinding(f) => Some(f),
            _ => None,
        })
    }

    fn timings(&self) -> impl Iterator<Item = &'a TimingSample> + '_ {
        self.pick(|o| match o {
            Observation::Timing(t) => Some(t),
            _ => None,
        })
    }

    fn links(&self) -> impl Iterator<Item = &'a LinkEdge> + '_ {
        self.pick(|o| match o {
            Observation::Link(l) => Some(l),
            _ => None,
        })
    }

    fn texts(&self) -> impl Iterator<Item = &'a TextBlock> + '_ {
        self.pick(|o| match o {
            Observation::Text(t) => Some(t),
            _ => None,
        })
    }

    /// Rules checked by the largest probe run, `None` when no probe ran.
    fn audit(&self) -> Option<u32> {
        self.samples
            .iter()
            .filter_map(|s| match s.observation {
                Observation::A11yAudit { rules_checked } => Some(rules_checked),
                _ => None,
            })
            .max()
    }

    /// First value per name wins.
    fn meta(&self) -> BTreeMap<String, String> {
        let mut meta = BTreeMap::new();
        for s in &self.samples {
            if let Observation::Meta { name, content } = &s.observation {
                meta.entry(name.to_ascii_lowercase())
                    .or_insert_with(|| content.clone());
            }
        }
        meta
    }

    fn features(&self) -> impl Iterator<Item = String> + '_ {
        self.samples.iter().filter_map(|s| match &s.observation {
            Observation::Feature { name } => Some(name.trim().to_ascii_lowercase()),
            _ => None,
        })
    }

    fn custom_tokens(&self) -> impl Iterator<Item = (&'a str, &'a str)> + '_ {
        self.samples.iter().copied().filter_map(|s| match &s.observation {
            Observation::CustomToken { name, value } => Some((name.as_str(), value.as_str())),
            _ => None,
        })
    }

    fn viewports(&self) -> BTreeSet<&'a str> {
        self.samples
            .iter()
            .copied()
            .filter_map(|s| s.viewport.as_ref().map(|v| v.name.as_str()))
            .collect()
    }
}

fn is_valid(sample: &RawSample) -> bool {
    let has_url = sample.url.as_deref().is_some_and(|u| !u.trim().is_empty());
    let has_viewport = sample
        .viewport
        .as_ref()
        .is_some_and(|v| !v.name.trim().is_empty());
    has_url && has_viewport
}

struct Validated<'a> {
    pages: Vec<ValidPage<'a>>,
    diagnostics: Vec<Diagnostic>,
    rejected: usize,
    faulted: usize,
}

/// Drop malformed samples and faulted pages, reporting both.
fn validate(pages: &[PageCapture]) -> Validated<'_> {
    let mut out = Validated {
        pages: Vec::new(),
        diagnostics: Vec::new(),
        rejected: 0,
        faulted: 0,
    };
    for page in pages {
        if let Some(reason) = &page.fault {
            warn!(url = %page.url, %reason, "collector fault, page excluded");
            out.faulted += 1;
            out.diagnostics.push(Diagnostic::CollectorFault {
                url: page.url.clone(),
                reason: reason.clone(),
            });
            continue;
        }
        let (samples, bad): (Vec<&RawSample>, Vec<&RawSample>) =
            page.samples.iter().partition(|s| is_valid(s));
        let rejected = bad.len() + page.malformed_samples;
        if rejected > 0 {
            warn!(url = %page.url, count = rejected, "rejected malformed samples");
            out.rejected += rejected;
            out.diagnostics.push(Diagnostic::RejectedSamples {
                url: page.url.clone(),
                count: rejected,
            });
        }
        if samples.is_empty() {
            warn!(url = %page.url, "no valid samples, page excluded");
            out.faulted += 1;
            out.diagnostics.push(Diagnostic::CollectorFault {
                url: page.url.clone(),
                reason: "no valid samples delivered".to_string(),
            });
            continue;
        }
        out.pages.push(ValidPage {
            url: &page.url,
            samples,
        });
    }
    out
}

/// Output of one page-local pipeline.
struct PageOutcome {
    report: PageReport,
    classified: Vec<Classified>,
    accessibility: AccessibilityReport,
    performance: PerformanceReport,
    content: PageContent,
    meta: BTreeMap<String, String>,
    links: Vec<(String, LinkEdge)>,
}

fn contrast_measured(colors: &ColorSystem) -> bool {
    colors
        .primary
        .iter()
        .chain(&colors.secondary)
        .chain(&colors.accent)
        .chain(colors.neutral.values())
        .chain(colors.semantic.values())
        .any(|t| t.contrast.is_some())
}

/// Normalize, detect and score a single page. Stages run in order and each
/// consumes only what the previous one produced.
fn page_pipeline(page: &ValidPage<'_>, cfg: &ExtractionConfig) -> PageOutcome {
    debug!(url = page.url, samples = page.samples.len(), "page pipeline");

    let colors = normalize_colors(page.colors(), &cfg.color);
    let typography = normalize_typography(page.fonts(), &cfg.typography);
    let spacing = normalize_spacing(page.spacing(), &cfg.spacing);

    let classified = classify_page(page.url, page.candidates(), 0, &cfg.patterns);
    let catalog = build_catalog(&classified, &cfg.patterns);

    let accessibility = accessibility::page_report(
        page.url,
        page.findings(),
        page.audit(),
        contrast_measured(&colors),
        &colors.contrast_violations,
        &cfg.scoring.severity,
    );
    let performance = performance::page_report(page.timings(), &cfg.scoring.budgets);
    let modernity = modernity_score(&ModernitySignals {
        features: page.features().collect(),
        custom_property_count: page.custom_tokens().count(),
        viewport_count: page.viewports().len(),
        patterns: Some(&catalog),
    });
    let quality = score_quality(
        &QualityInputs {
            colors: &colors,
            typography: &typography,
            heading_order: heading_monotonicity(page.fonts()),
            spacing: &spacing,
            accessibility: &accessibility,
            patterns: &catalog,
            performance: &performance,
            modernity,
        },
        &cfg.scoring.weights,
        &cfg.typography,
    );

    let meta = page.meta();
    let content = architecture::page_content(page.url, page.texts(), &meta, &cfg.content);
    let links = page
        .links()
        .map(|l| (page.url.to_string(), l.clone()))
        .collect();

    PageOutcome {
        report: PageReport {
            url: page.url.to_string(),
            quality,
            accessibility_score: accessibility.score,
            performance_score: performance.score,
            pattern_count: catalog.patterns.len(),
        },
        classified,
        accessibility,
        performance,
        content,
        meta,
        links,
    }
}

#[cfg(feature = "rayon")]
fn run_pages(pages: &[ValidPage<'_>], cfg: &ExtractionConfig) -> Vec<PageOutcome> {
    pages.par_iter().map(|p| page_pipeline(p, cfg)).collect()
}

#[cfg(not(feature = "rayon"))]
fn run_pages(pages: &[ValidPage<'_>], cfg: &ExtractionConfig) -> Vec<PageOutcome> {
    pages.iter().map(|p| page_pipeline(p, cfg)).collect()
}

fn sub_score_scope(sub: SubScore) -> &'static str {
    match sub {
        SubScore::ColorConsistency => "color_consistency",
        SubScore::TypographyHierarchy => "typography_hierarchy",
        SubScore::SpacingRegularity => "spacing_regularity",
        SubScore::AccessibilityCompliance => "accessibility_compliance",
        SubScore::PatternConsistency => "pattern_consistency",
        SubScore::PerformanceOptimization => "performance_optimization",
        SubScore::Modernity => "modernity",
    }
}

fn finished_at(run: &CrawlRun) -> DateTime<Utc> {
    run.finished_at.unwrap_or_else(|| {
        run.pages
            .iter()
            .flat_map(|p| &p.samples)
            .map(|s| s.captured_at)
            .max()
            .unwrap_or(run.started_at)
            .max(run.started_at)
    })
}

/// Run every page pipeline, then merge at the site level. Never fails: bad
/// input narrows the result and is reported in `diagnostics`.
pub fn run_extraction(run: &CrawlRun, cfg: &ExtractionConfig) -> Extraction {
    info!(root = %run.root_url, pages = run.pages.len(), "starting extraction");
    let validated = validate(&run.pages);
    let pages = &validated.pages;
    let outcomes = run_pages(pages, cfg);

    // everything below needs every page
    let colors = normalize_colors(pages.iter().flat_map(|p| p.colors()), &cfg.color);
    let typography = normalize_typography(pages.iter().flat_map(|p| p.fonts()), &cfg.typography);
    let spacing = normalize_spacing(pages.iter().flat_map(|p| p.spacing()), &cfg.spacing);
    let custom = collect_custom_tokens(pages.iter().flat_map(|p| p.custom_tokens()));

    let mut classified: Vec<Classified> = Vec::new();
    for outcome in &outcomes {
        for inst in &outcome.classified {
            let mut inst = inst.clone();
            inst.seq = classified.len();
            classified.push(inst);
        }
    }
    let catalog = build_catalog(&classified, &cfg.patterns);

    let site_accessibility =
        accessibility::merge_reports(outcomes.iter().map(|o| &o.accessibility));
    let site_performance =
        performance::merge_reports(outcomes.iter().map(|o| &o.performance), &cfg.scoring.budgets);

    let features: BTreeSet<String> = pages.iter().flat_map(|p| p.features()).collect();
    let viewports: BTreeSet<&str> = pages.iter().flat_map(|p| p.viewports()).collect();
    let modernity = modernity_score(&ModernitySignals {
        features,
        custom_property_count: custom.len(),
        viewport_count: viewports.len(),
        patterns: Some(&catalog),
    });
    let quality = score_quality(
        &QualityInputs {
            colors: &colors,
            typography: &typography,
            heading_order: heading_monotonicity(pages.iter().flat_map(|p| p.fonts())),
            spacing: &spacing,
            accessibility: &site_accessibility,
            patterns: &catalog,
            performance: &site_performance,
            modernity,
        },
        &cfg.scoring.weights,
        &cfg.typography,
    );

    let incomplete = run.partial || validated.faulted > 0;
    let finished = finished_at(run);
    let metadata = RunMetadata {
        extractor_version: env!("CARGO_PKG_VERSION").to_string(),
        root_url: run.root_url.clone(),
        started_at: run.started_at,
        finished_at: finished,
        duration_ms: (finished - run.started_at).num_milliseconds().max(0),
        viewports_tested: viewports.iter().map(|v| v.to_string()).collect(),
        pages_crawled: pages.len(),
        pages_failed: validated.faulted,
        samples_rejected: validated.rejected,
        incomplete,
    };

    let mut design_diagnostics = validated.diagnostics.clone();
    if let Some(reason) = &typography.fallback_reason {
        design_diagnostics.push(Diagnostic::StructuralFitFailure {
            scope: "typography".to_string(),
            detail: reason.clone(),
        });
    }
    design_diagnostics.extend(
        quality
            .missing()
            .into_iter()
            .map(|sub| Diagnostic::insufficient(sub_score_scope(sub))),
    );

    let page_reports: Vec<PageReport> = outcomes.iter().map(|o| o.report.clone()).collect();
    let design_parts = DesignParts {
        tokens: DesignTokens {
            colors,
            typography,
            spacing,
            custom,
        },
        patterns: catalog,
        quality,
        accessibility: site_accessibility,
        performance: site_performance,
        pages: page_reports,
    };

    let mut brand_diagnostics = validated.diagnostics;
    if incomplete {
        let reason = if run.partial {
            "run marked partial by the caller".to_string()
        } else {
            format!("{} page(s) missing from the graph", validated.faulted)
        };
        warn!(%reason, "link graph incomplete");
        brand_diagnostics.push(Diagnostic::GraphIncomplete { reason });
    }

    let links: Vec<(String, LinkEdge)> = outcomes
        .iter()
        .flat_map(|o| o.links.iter().cloned())
        .collect();
    let nav_signal = architecture::navigation_signal(outcomes.iter().map(|o| &o.accessibility));
    let root_key = architecture::normalize_url(&run.root_url);
    let root_outcome = outcomes
        .iter()
        .find(|o| architecture::normalize_url(&o.report.url) == root_key)
        .or_else(|| outcomes.first());
    let empty_meta = BTreeMap::new();

    let (content, architecture, seo) = architecture::aggregate(
        SiteInput {
            root: &run.root_url,
            pages: outcomes.iter().map(|o| o.content.clone()).collect(),
            links: &links,
            navigation_signal: nav_signal,
            incomplete,
        },
        &cfg.content,
    );
    if content.total_words == 0 {
        brand_diagnostics.push(Diagnostic::insufficient("content"));
    }

    let brand = architecture::brand_profile(&BrandInputs {
        meta: root_outcome.map(|o| &o.meta).unwrap_or(&empty_meta),
        title: root_outcome.and_then(|o| o.content.title.as_deref()),
        colors: &design_parts.tokens.colors,
        typography: &design_parts.tokens.typography,
        external_links: links.iter().map(|(_, l)| l).filter(|l| !l.internal).collect(),
        keywords: &content.keywords,
    });
    let brand_parts = BrandParts {
        brand,
        content,
        architecture,
        seo,
    };

    info!(
        pages = pages.len(),
        failed = validated.faulted,
        rejected = validated.rejected,
        patterns = design_parts.patterns.patterns.len(),
        "extraction finished"
    );

    Extraction {
        design: assemble::assemble_design(metadata.clone(), design_parts, design_diagnostics, cfg),
        brand: assemble::assemble_brand(metadata, brand_parts, brand_diagnostics, cfg),
    }
}
