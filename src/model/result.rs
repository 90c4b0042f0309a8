use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::content::{BrandProfile, ContentInventory, InformationArchitecture, SeoReport};
use super::patterns::PatternCatalog;
use super::reports::{AccessibilityReport, PerformanceReport, QualityScore};
use super::tokens::DesignTokens;
use crate::error::Diagnostic;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub extractor_version: String,
    pub root_url: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: i64,
    pub viewports_tested: Vec<String>,
    pub pages_crawled: usize,
    pub pages_failed: usize,
    pub samples_rejected: usize,
    pub incomplete: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: String,
    pub category: String,
    pub priority: Priority,
    pub message: String,
}

/// Output of one page-local pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageReport {
    pub url: String,
    pub quality: QualityScore,
    pub accessibility_score: Option<f64>,
    pub performance_score: Option<f64>,
    pub pattern_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub metadata: RunMetadata,
    pub tokens: DesignTokens,
    pub patterns: PatternCatalog,
    pub quality: QualityScore,
    pub accessibility: AccessibilityReport,
    pub performance: PerformanceReport,
    pub pages: Vec<PageReport>,
    pub recommendations: Vec<Recommendation>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandExtractionResult {
    pub metadata: RunMetadata,
    pub brand: BrandProfile,
    pub content: ContentInventory,
    pub architecture: InformationArchitecture,
    pub seo: SeoReport,
    pub recommendations: Vec<Recommendation>,
    pub diagnostics: Vec<Diagnostic>,
}
