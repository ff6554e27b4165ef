//! Category analyzers: one rule set per quality dimension

pub mod accessibility;
pub mod performance;
pub mod seo;

pub use accessibility::AccessibilityAnalyzer;
pub use performance::PerformanceAnalyzer;
pub use seo::SeoAnalyzer;

use crate::{Category, CategoryResult, PageSnapshot};

/// Trait for category analyzers
pub trait CategoryAnalyzer: Send + Sync {
    /// Dimension this analyzer scores
    fn category(&self) -> Category;

    /// Evaluate every rule against the snapshot, in fixed order
    fn analyze(&self, page: &PageSnapshot) -> CategoryResult;
}
