//! pagescore: heuristic page quality auditor
//!
//! Scores an HTML page on three independent dimensions (accessibility, SEO,
//! performance), each 0-100 with discrete issues and suggestions, and combines
//! them into an overall score.

pub mod analyzer;
pub mod cache;
pub mod config;
pub mod document;
pub mod export;
pub mod lifecycle;
pub mod reporter;
pub mod source;
pub mod transport;
pub mod watcher;

use serde::{Deserialize, Serialize};

pub use analyzer::{Clock, FixedClock, QualityEngine, SystemClock};
pub use document::{Element, PageSnapshot, QueryId};

/// Top-level report for one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Overall score: rounded mean of the three category scores (0-100)
    pub score: u8,
    /// Page metadata captured at analysis time
    pub page_info: PageInfo,
    /// One result per quality dimension
    pub categories: Categories,
}

impl AnalysisResult {
    /// Total issues across all categories
    pub fn issue_count(&self) -> usize {
        self.categories.iter().map(|(_, c)| c.issues.len()).sum()
    }

    /// Tier for the overall score
    pub fn tier(&self) -> ScoreTier {
        ScoreTier::from_score(self.score)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub url: String,
    pub title: String,
    /// ISO-8601 instant, millisecond precision, UTC
    pub timestamp: String,
}

/// Exactly one result per dimension, all always present
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Categories {
    pub accessibility: CategoryResult,
    pub seo: CategoryResult,
    pub performance: CategoryResult,
}

impl Categories {
    /// Iterate categories in report order
    pub fn iter(&self) -> impl Iterator<Item = (Category, &CategoryResult)> {
        [
            (Category::Accessibility, &self.accessibility),
            (Category::Seo, &self.seo),
            (Category::Performance, &self.performance),
        ]
        .into_iter()
    }

    pub fn get(&self, category: Category) -> &CategoryResult {
        match category {
            Category::Accessibility => &self.accessibility,
            Category::Seo => &self.seo,
            Category::Performance => &self.performance,
        }
    }
}

/// Output of one analyzer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResult {
    /// Score 0-100 (starts at 100, floor-clamped at 0)
    pub score: u8,
    /// Issues in rule evaluation order
    pub issues: Vec<Issue>,
    /// Suggestions in rule evaluation order, advisory entries included
    pub suggestions: Vec<String>,
}

impl CategoryResult {
    pub fn tier(&self) -> ScoreTier {
        ScoreTier::from_score(self.score)
    }

    /// First issue with the given type label, if any
    pub fn issue(&self, kind: IssueKind) -> Option<&Issue> {
        self.issues.iter().find(|i| i.kind == kind)
    }
}

/// One detected problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    /// Category label ("Missing Alt Text", "Page Title", ...)
    #[serde(rename = "type")]
    pub kind: IssueKind,
    /// Human-readable message
    pub message: String,
    pub severity: Severity,
    /// Locator of one representative offender (resource URL or tag hint)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
}

impl Issue {
    pub fn new(kind: IssueKind, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            severity,
            element: None,
        }
    }

    pub fn with_element(mut self, element: impl Into<String>) -> Self {
        self.element = Some(element.into());
        self
    }
}

/// Severity labels. Presentation only: deductions never depend on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::High => write!(f, "high"),
            Severity::Medium => write!(f, "medium"),
            Severity::Low => write!(f, "low"),
        }
    }
}

/// Issue type vocabulary, serialized as the human label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueKind {
    // accessibility
    #[serde(rename = "Missing Alt Text")]
    MissingAltText,
    #[serde(rename = "Form Accessibility")]
    FormAccessibility,
    #[serde(rename = "Heading Hierarchy")]
    HeadingHierarchy,
    // seo
    #[serde(rename = "Page Title")]
    PageTitle,
    #[serde(rename = "Meta Description")]
    MetaDescription,
    #[serde(rename = "H1 Heading")]
    H1Heading,
    // performance
    #[serde(rename = "Image Optimization")]
    ImageOptimization,
    #[serde(rename = "Lazy Loading")]
    LazyLoading,
    #[serde(rename = "External Resources")]
    ExternalResources,
    #[serde(rename = "Inline Styles")]
    InlineStyles,
    #[serde(rename = "External Links")]
    ExternalLinks,
}

impl IssueKind {
    /// Category this issue type belongs to
    pub fn category(&self) -> Category {
        use IssueKind::*;
        match self {
            MissingAltText | FormAccessibility | HeadingHierarchy => Category::Accessibility,
            PageTitle | MetaDescription | H1Heading => Category::Seo,
            ImageOptimization | LazyLoading | ExternalResources | InlineStyles
            | ExternalLinks => Category::Performance,
        }
    }
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            IssueKind::MissingAltText => "Missing Alt Text",
            IssueKind::FormAccessibility => "Form Accessibility",
            IssueKind::HeadingHierarchy => "Heading Hierarchy",
            IssueKind::PageTitle => "Page Title",
            IssueKind::MetaDescription => "Meta Description",
            IssueKind::H1Heading => "H1 Heading",
            IssueKind::ImageOptimization => "Image Optimization",
            IssueKind::LazyLoading => "Lazy Loading",
            IssueKind::ExternalResources => "External Resources",
            IssueKind::InlineStyles => "Inline Styles",
            IssueKind::ExternalLinks => "External Links",
        };
        write!(f, "{}", label)
    }
}

/// Quality dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Accessibility,
    Seo,
    Performance,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Accessibility => write!(f, "Accessibility"),
            Category::Seo => write!(f, "SEO"),
            Category::Performance => write!(f, "Performance"),
        }
    }
}

/// Presentational score tier. Never feeds back into scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreTier {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl ScoreTier {
    pub fn from_score(score: u8) -> Self {
        match score {
            90..=u8::MAX => ScoreTier::Excellent,
            80..=89 => ScoreTier::Good,
            60..=79 => ScoreTier::Fair,
            _ => ScoreTier::Poor,
        }
    }
}

impl std::fmt::Display for ScoreTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScoreTier::Excellent => write!(f, "excellent"),
            ScoreTier::Good => write!(f, "good"),
            ScoreTier::Fair => write!(f, "fair"),
            ScoreTier::Poor => write!(f, "poor"),
        }
    }
}

/// Public API: analyze an HTML string as if served from `url`, using the system clock.
pub fn analyze_html(html: &str, url: &str) -> AnalysisResult {
    let page = PageSnapshot::parse(html, url);
    QualityEngine::new().analyze(&page)
}
