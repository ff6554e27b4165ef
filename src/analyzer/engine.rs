//! Analysis engine - runs the three category analyzers and aggregates them

use super::aggregator::Aggregator;
use super::clock::{Clock, SystemClock};
use super::rules::{AccessibilityAnalyzer, CategoryAnalyzer, PerformanceAnalyzer, SeoAnalyzer};
use crate::source::{self, SnapshotError};
use crate::{AnalysisResult, PageSnapshot};
use std::path::{Path, PathBuf};

/// A local page and the URL it is considered served from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTarget {
    pub path: PathBuf,
    pub url: String,
}

impl PageTarget {
    pub fn new(path: impl Into<PathBuf>, url: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            url: url.into(),
        }
    }
}

/// Main analysis engine.
///
/// Analysis is pure over the snapshot apart from the clock, so two analyses of
/// the same snapshot under a fixed clock are equal.
pub struct QualityEngine {
    clock: Box<dyn Clock>,
    accessibility: AccessibilityAnalyzer,
    seo: SeoAnalyzer,
    performance: PerformanceAnalyzer,
}

impl QualityEngine {
    /// Engine stamping results with wall-clock time
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }

    pub fn with_clock(clock: impl Clock + 'static) -> Self {
        Self {
            clock: Box::new(clock),
            accessibility: AccessibilityAnalyzer::new(),
            seo: SeoAnalyzer::new(),
            performance: PerformanceAnalyzer::new(),
        }
    }

    /// Analyze one page snapshot
    pub fn analyze(&self, page: &PageSnapshot) -> AnalysisResult {
        let accessibility = self.accessibility.analyze(page);
        let seo = self.seo.analyze(page);
        let performance = self.performance.analyze(page);

        let result = Aggregator::compose(page, accessibility, seo, performance, self.clock.as_ref());
        tracing::debug!(
            url = %result.page_info.url,
            score = result.score,
            issues = result.issue_count(),
            "page analyzed"
        );
        result
    }

    /// Parse and analyze an HTML string served from `url`
    pub fn analyze_html(&self, html: &str, url: &str) -> AnalysisResult {
        self.analyze(&PageSnapshot::parse(html, url))
    }

    /// Read and analyze a local page
    pub fn analyze_file(&self, path: &Path, url: &str) -> Result<AnalysisResult, SnapshotError> {
        let page = source::load_file(path, url)?;
        Ok(self.analyze(&page))
    }

    /// Fetch and analyze a live page (requires the `fetch` feature)
    pub fn analyze_url(&self, url: &str) -> Result<AnalysisResult, SnapshotError> {
        let page = source::fetch_page(url)?;
        Ok(self.analyze(&page))
    }

    /// Analyze local pages sequentially
    pub fn analyze_many(&self, targets: &[PageTarget]) -> Vec<Result<AnalysisResult, SnapshotError>> {
        targets
            .iter()
            .map(|t| self.analyze_file(&t.path, &t.url))
            .collect()
    }

    /// Analyze local pages in parallel using rayon. Each task reads and parses
    /// its own page; results keep the order of `targets`.
    pub fn analyze_parallel(
        &self,
        targets: &[PageTarget],
    ) -> Vec<Result<AnalysisResult, SnapshotError>> {
        use rayon::prelude::*;

        targets
            .par_iter()
            .map(|t| self.analyze_file(&t.path, &t.url))
            .collect()
    }

    /// Get aggregate stats from multiple results
    pub fn aggregate_stats(results: &[AnalysisResult]) -> AggregateStats {
        if results.is_empty() {
            return AggregateStats::default();
        }

        let mean = |score: fn(&AnalysisResult) -> u8| -> u8 {
            let total: usize = results.iter().map(|r| score(r) as usize).sum();
            // Half rounds up, like the overall score
            ((2 * total + results.len()) / (2 * results.len())) as u8
        };

        AggregateStats {
            pages_analyzed: results.len(),
            average_score: mean(|r| r.score),
            total_issues: results.iter().map(AnalysisResult::issue_count).sum(),
            accessibility_average: mean(|r| r.categories.accessibility.score),
            seo_average: mean(|r| r.categories.seo.score),
            performance_average: mean(|r| r.categories.performance.score),
        }
    }
}

impl Default for QualityEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Aggregate statistics from a multi-page run
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStats {
    pub pages_analyzed: usize,
    /// Mean overall score, rounded
    pub average_score: u8,
    pub total_issues: usize,
    pub accessibility_average: u8,
    pub seo_average: u8,
    pub performance_average: u8,
}
