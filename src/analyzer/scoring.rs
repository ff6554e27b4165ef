//! Score arithmetic shared by the category analyzers

use crate::{CategoryResult, Issue, ScoreTier};

/// Every category starts here and only goes down
pub const MAX_SCORE: u32 = 100;

/// Per-item deduction capped at `cap` (e.g. 3 points per image, at most 25)
pub fn capped_deduction(count: usize, per_item: u32, cap: u32) -> u32 {
    let count = u32::try_from(count).unwrap_or(u32::MAX);
    count.saturating_mul(per_item).min(cap)
}

/// Accumulates one category's findings in rule evaluation order.
///
/// Deductions add up across rules; the floor clamp is applied once, in `finish`.
#[derive(Debug, Default)]
pub struct CategoryScorer {
    deductions: u32,
    issues: Vec<Issue>,
    suggestions: Vec<String>,
}

impl CategoryScorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A triggered rule: one issue, one suggestion, one deduction
    pub fn flag(&mut self, issue: Issue, suggestion: &str, deduction: u32) {
        tracing::debug!(issue = %issue.kind, deduction, "rule triggered");
        self.deductions = self.deductions.saturating_add(deduction);
        self.issues.push(issue);
        self.suggestions.push(suggestion.to_string());
    }

    /// Advisory suggestion with no issue and no deduction
    pub fn advise(&mut self, suggestion: &str) {
        self.suggestions.push(suggestion.to_string());
    }

    pub fn total_deductions(&self) -> u32 {
        self.deductions
    }

    pub fn finish(self) -> CategoryResult {
        let score = MAX_SCORE.saturating_sub(self.deductions) as u8;
        CategoryResult {
            score,
            issues: self.issues,
            suggestions: self.suggestions,
        }
    }
}

/// Calculator for overall scores
pub struct ScoreCalculator;

impl ScoreCalculator {
    /// Rounded arithmetic mean of the three category scores (half rounds up)
    pub fn overall(accessibility: u8, seo: u8, performance: u8) -> u8 {
        let sum = accessibility as u32 + seo as u32 + performance as u32;
        // round(sum / 3) == floor((2 * sum + 3) / 6)
        ((2 * sum + 3) / 6) as u8
    }

    /// Get a description of the tier
    pub fn tier_description(tier: ScoreTier) -> &'static str {
        match tier {
            ScoreTier::Excellent => "Excellent - no significant problems found",
            ScoreTier::Good => "Good - a few improvements available",
            ScoreTier::Fair => "Fair - several issues worth fixing",
            ScoreTier::Poor => "Poor - the page needs attention",
        }
    }
}
