//! SEO rules: title length, meta description length, H1 count, plus two advisories.

use super::CategoryAnalyzer;
use crate::analyzer::scoring::CategoryScorer;
use crate::{Category, CategoryResult, Issue, IssueKind, PageSnapshot, QueryId, Severity};

pub const TITLE_MIN_CHARS: usize = 10;
pub const TITLE_MAX_CHARS: usize = 60;
pub const DESCRIPTION_MIN_CHARS: usize = 120;
pub const DESCRIPTION_MAX_CHARS: usize = 160;

const TITLE_MISSING_SUGGESTION: &str = "Add a descriptive <title> between 10 and 60 characters";
const TITLE_SHORT_SUGGESTION: &str =
    "Expand the page title to at least 10 characters so it describes the page";
const TITLE_LONG_SUGGESTION: &str =
    "Shorten the page title to 60 characters or fewer so search results do not truncate it";
const DESCRIPTION_MISSING_SUGGESTION: &str =
    "Add a <meta name=\"description\"> summarizing the page in 120-160 characters";
const DESCRIPTION_SHORT_SUGGESTION: &str =
    "Expand the meta description to at least 120 characters";
const DESCRIPTION_LONG_SUGGESTION: &str =
    "Trim the meta description to 160 characters or fewer";
const H1_MISSING_SUGGESTION: &str = "Add a single H1 heading that states the page topic";
const H1_MULTIPLE_SUGGESTION: &str = "Keep exactly one H1 per page; demote the others to H2";
const CANONICAL_SUGGESTION: &str =
    "Add a <link rel=\"canonical\"> to avoid duplicate-content ambiguity";
const OPEN_GRAPH_SUGGESTION: &str =
    "Add og:title and og:description meta tags for richer social sharing previews";

pub struct SeoAnalyzer;

impl SeoAnalyzer {
    pub fn new() -> Self {
        Self
    }

    fn check_title(&self, page: &PageSnapshot, scorer: &mut CategoryScorer) {
        let title = page.title();
        let length = title.chars().count();

        if title.is_empty() {
            scorer.flag(
                Issue::new(IssueKind::PageTitle, Severity::High, "Page has no title"),
                TITLE_MISSING_SUGGESTION,
                25,
            );
        } else if length < TITLE_MIN_CHARS {
            scorer.flag(
                Issue::new(IssueKind::PageTitle, Severity::Medium, "Page title is too short"),
                TITLE_SHORT_SUGGESTION,
                15,
            );
        } else if length > TITLE_MAX_CHARS {
            scorer.flag(
                Issue::new(IssueKind::PageTitle, Severity::Low, "Page title is too long"),
                TITLE_LONG_SUGGESTION,
                5,
            );
        }
    }

    fn check_meta_description(&self, page: &PageSnapshot, scorer: &mut CategoryScorer) {
        let content = page
            .first(QueryId::MetaDescription)
            .and_then(|meta| meta.attr("content"))
            .filter(|content| !content.is_empty());

        let Some(content) = content else {
            scorer.flag(
                Issue::new(
                    IssueKind::MetaDescription,
                    Severity::High,
                    "Missing meta description",
                ),
                DESCRIPTION_MISSING_SUGGESTION,
                20,
            );
            return;
        };

        let length = content.chars().count();
        if length < DESCRIPTION_MIN_CHARS {
            scorer.flag(
                Issue::new(
                    IssueKind::MetaDescription,
                    Severity::Medium,
                    "Meta description is too short",
                ),
                DESCRIPTION_SHORT_SUGGESTION,
                10,
            );
        } else if length > DESCRIPTION_MAX_CHARS {
            scorer.flag(
                Issue::new(
                    IssueKind::MetaDescription,
                    Severity::Low,
                    "Meta description is too long",
                ),
                DESCRIPTION_LONG_SUGGESTION,
                5,
            );
        }
    }

    fn check_h1(&self, page: &PageSnapshot, scorer: &mut CategoryScorer) {
        match page.count(QueryId::H1) {
            0 => scorer.flag(
                Issue::new(IssueKind::H1Heading, Severity::High, "No H1 heading found"),
                H1_MISSING_SUGGESTION,
                20,
            ),
            1 => {}
            n => scorer.flag(
                Issue::new(
                    IssueKind::H1Heading,
                    Severity::Medium,
                    format!("Multiple H1 headings found ({})", n),
                ),
                H1_MULTIPLE_SUGGESTION,
                15,
            ),
        }
    }
}

impl Default for SeoAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl CategoryAnalyzer for SeoAnalyzer {
    fn category(&self) -> Category {
        Category::Seo
    }

    fn analyze(&self, page: &PageSnapshot) -> CategoryResult {
        let mut scorer = CategoryScorer::new();

        self.check_title(page, &mut scorer);
        self.check_meta_description(page, &mut scorer);
        self.check_h1(page, &mut scorer);

        if !page.exists(QueryId::CanonicalLink) {
            scorer.advise(CANONICAL_SUGGESTION);
        }
        if !page.exists(QueryId::OgTitle) || !page.exists(QueryId::OgDescription) {
            scorer.advise(OPEN_GRAPH_SUGGESTION);
        }

        scorer.finish()
    }
}
