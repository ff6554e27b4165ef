//! Accessibility rules: alt text, form labels, heading order, plus two advisories.

use super::CategoryAnalyzer;
use crate::analyzer::scoring::{capped_deduction, CategoryScorer};
use crate::{Category, CategoryResult, Issue, IssueKind, PageSnapshot, QueryId, Severity};
use std::collections::HashSet;

/// Locator used when the first image without alt text has no `src`
const UNKNOWN_SOURCE: &str = "unknown";

const ALT_TEXT_SUGGESTION: &str =
    "Add descriptive alt text to images so screen readers can convey their content";
const FORM_LABEL_SUGGESTION: &str =
    "Associate every form control with a <label for=\"...\"> or an aria-label attribute";
const CONTRAST_SUGGESTION: &str =
    "Check that inline text colors keep a contrast ratio of at least 4.5:1 against their background";
const FOCUS_SUGGESTION: &str =
    "Make sure buttons, links and form fields show a visible focus indicator for keyboard users";
const HEADING_SUGGESTION: &str =
    "Use headings in sequential order (h1, then h2, then h3) without skipping levels";

pub struct AccessibilityAnalyzer;

impl AccessibilityAnalyzer {
    pub fn new() -> Self {
        Self
    }

    fn check_alt_text(&self, page: &PageSnapshot, scorer: &mut CategoryScorer) {
        let missing: Vec<_> = page
            .query(QueryId::Images)
            .into_iter()
            .filter(|img| img.attr("alt").map_or(true, |alt| alt.trim().is_empty()))
            .collect();

        let Some(first) = missing.first() else {
            return;
        };
        let count = missing.len();
        scorer.flag(
            Issue::new(
                IssueKind::MissingAltText,
                Severity::High,
                format!("{} images missing alt text", count),
            )
            .with_element(first.src().unwrap_or(UNKNOWN_SOURCE)),
            ALT_TEXT_SUGGESTION,
            capped_deduction(count, 3, 25),
        );
    }

    fn check_form_labels(&self, page: &PageSnapshot, scorer: &mut CategoryScorer) {
        let labelled_ids: HashSet<&str> = page
            .query(QueryId::LabelsWithFor)
            .iter()
            .filter_map(|label| label.attr("for"))
            .collect();

        let unlabelled: Vec<_> = page
            .query(QueryId::FormControls)
            .into_iter()
            .filter(|control| {
                let has_label = control
                    .id()
                    .filter(|id| !id.is_empty())
                    .is_some_and(|id| labelled_ids.contains(id));
                !has_label && !control.has_attr("aria-label")
            })
            .collect();

        let Some(first) = unlabelled.first() else {
            return;
        };
        let count = unlabelled.len();
        scorer.flag(
            Issue::new(
                IssueKind::FormAccessibility,
                Severity::High,
                format!("{} form inputs without labels", count),
            )
            .with_element(format!("{} element", first.tag_name())),
            FORM_LABEL_SUGGESTION,
            capped_deduction(count, 4, 20),
        );
    }

    fn check_heading_order(&self, page: &PageSnapshot, scorer: &mut CategoryScorer) {
        let levels: Vec<u8> = page
            .query(QueryId::Headings)
            .iter()
            .filter_map(|h| h.heading_level())
            .collect();

        // One flag per document, however many skips there are
        if has_skipped_level(&levels) {
            scorer.flag(
                Issue::new(
                    IssueKind::HeadingHierarchy,
                    Severity::Medium,
                    "Heading levels are not in proper order",
                ),
                HEADING_SUGGESTION,
                10,
            );
        }
    }
}

/// True when some heading is more than one level deeper than the heading before it
fn has_skipped_level(levels: &[u8]) -> bool {
    levels.windows(2).any(|pair| pair[1] > pair[0] + 1)
}

impl Default for AccessibilityAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl CategoryAnalyzer for AccessibilityAnalyzer {
    fn category(&self) -> Category {
        Category::Accessibility
    }

    fn analyze(&self, page: &PageSnapshot) -> CategoryResult {
        let mut scorer = CategoryScorer::new();

        self.check_alt_text(page, &mut scorer);
        self.check_form_labels(page, &mut scorer);

        if page.exists(QueryId::ColorStyled) {
            scorer.advise(CONTRAST_SUGGESTION);
        }
        if page.exists(QueryId::Interactive) {
            scorer.advise(FOCUS_SUGGESTION);
        }

        self.check_heading_order(page, &mut scorer);

        scorer.finish()
    }
}
