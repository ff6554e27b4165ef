//! Performance rules: image size and loading, external resources, inline styles,
//! and external links without `rel`.

use super::CategoryAnalyzer;
use crate::analyzer::scoring::{capped_deduction, CategoryScorer};
use crate::document::host_of;
use crate::{Category, CategoryResult, Issue, IssueKind, PageSnapshot, QueryId, Severity};

pub const MAX_IMAGE_WIDTH: u32 = 1920;
pub const MAX_IMAGE_HEIGHT: u32 = 1080;
/// Images without `loading` tolerated before the rule triggers
pub const EAGER_IMAGE_ALLOWANCE: usize = 3;
pub const EXTERNAL_RESOURCE_ALLOWANCE: usize = 10;
pub const INLINE_STYLE_ALLOWANCE: usize = 20;

const UNKNOWN_SOURCE: &str = "unknown";

const IMAGE_SIZE_SUGGESTION: &str =
    "Resize and compress large images, or serve responsive variants with srcset";
const LAZY_LOADING_SUGGESTION: &str =
    "Add loading=\"lazy\" to images below the fold";
const EXTERNAL_RESOURCES_SUGGESTION: &str =
    "Reduce the number of third-party scripts and stylesheets, or bundle them";
const INLINE_STYLES_SUGGESTION: &str =
    "Move inline styles into a stylesheet so they can be cached";
const EXTERNAL_LINKS_SUGGESTION: &str =
    "Add rel=\"noopener noreferrer\" to links that point to other sites";

/// Tips appended on every run, after the rule suggestions
pub const BOILERPLATE_SUGGESTIONS: [&str; 3] = [
    "Serve static assets from a CDN",
    "Enable gzip or brotli compression on the server",
    "Minify CSS, JavaScript and HTML",
];

pub struct PerformanceAnalyzer;

impl PerformanceAnalyzer {
    pub fn new() -> Self {
        Self
    }

    fn check_image_size(&self, page: &PageSnapshot, scorer: &mut CategoryScorer) {
        let large: Vec<_> = page
            .query(QueryId::Images)
            .into_iter()
            .filter(|img| {
                img.intrinsic_size()
                    .is_some_and(|(w, h)| w > MAX_IMAGE_WIDTH || h > MAX_IMAGE_HEIGHT)
            })
            .collect();

        let Some(first) = large.first() else {
            return;
        };
        let count = large.len();
        scorer.flag(
            Issue::new(
                IssueKind::ImageOptimization,
                Severity::Medium,
                format!(
                    "{} images larger than {}x{}",
                    count, MAX_IMAGE_WIDTH, MAX_IMAGE_HEIGHT
                ),
            )
            .with_element(first.src().unwrap_or(UNKNOWN_SOURCE)),
            IMAGE_SIZE_SUGGESTION,
            capped_deduction(count, 3, 20),
        );
    }

    fn check_lazy_loading(&self, page: &PageSnapshot, scorer: &mut CategoryScorer) {
        let eager = page
            .query(QueryId::Images)
            .iter()
            .filter(|img| !img.has_attr("loading"))
            .count();

        if eager > EAGER_IMAGE_ALLOWANCE {
            scorer.flag(
                Issue::new(
                    IssueKind::LazyLoading,
                    Severity::Low,
                    format!("{} images without lazy loading", eager),
                ),
                LAZY_LOADING_SUGGESTION,
                10,
            );
        }
    }

    fn check_external_resources(&self, page: &PageSnapshot, scorer: &mut CategoryScorer) {
        let scripts = page
            .query(QueryId::ScriptsWithSrc)
            .iter()
            .filter(|s| s.src().is_some_and(|src| src.starts_with("http")))
            .count();
        let links = page
            .query(QueryId::LinksWithHref)
            .iter()
            .filter(|l| l.href().is_some_and(|href| href.starts_with("http")))
            .count();
        let total = scripts + links;

        if total > EXTERNAL_RESOURCE_ALLOWANCE {
            scorer.flag(
                Issue::new(
                    IssueKind::ExternalResources,
                    Severity::Medium,
                    format!("{} external resources detected", total),
                ),
                EXTERNAL_RESOURCES_SUGGESTION,
                capped_deduction(total - EXTERNAL_RESOURCE_ALLOWANCE, 2, 15),
            );
        }
    }

    fn check_inline_styles(&self, page: &PageSnapshot, scorer: &mut CategoryScorer) {
        let count = page.count(QueryId::InlineStyled);
        if count > INLINE_STYLE_ALLOWANCE {
            scorer.flag(
                Issue::new(
                    IssueKind::InlineStyles,
                    Severity::Low,
                    format!("{} elements with inline styles", count),
                ),
                INLINE_STYLES_SUGGESTION,
                5,
            );
        }
    }

    fn check_external_links(&self, page: &PageSnapshot, scorer: &mut CategoryScorer) {
        let page_host = page.hostname();
        let missing_rel = page
            .query(QueryId::Anchors)
            .iter()
            .filter(|a| a.href().is_some_and(|href| is_external(href, page_host)))
            .filter(|a| !a.has_attr("rel"))
            .count();

        if missing_rel > 0 {
            scorer.flag(
                Issue::new(
                    IssueKind::ExternalLinks,
                    Severity::Low,
                    format!("{} external links without rel attributes", missing_rel),
                ),
                EXTERNAL_LINKS_SUGGESTION,
                capped_deduction(missing_rel, 1, 10),
            );
        }
    }
}

/// An absolute http(s) link whose host differs from the page host.
/// A link whose host cannot be read counts as external.
fn is_external(href: &str, page_host: &str) -> bool {
    if !href.starts_with("http") {
        return false;
    }
    host_of(href)
        .filter(|host| !host.is_empty())
        .is_some_and(|host| !host.eq_ignore_ascii_case(page_host))
}

impl Default for PerformanceAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl CategoryAnalyzer for PerformanceAnalyzer {
    fn category(&self) -> Category {
        Category::Performance
    }

    fn analyze(&self, page: &PageSnapshot) -> CategoryResult {
        let mut scorer = CategoryScorer::new();

        self.check_image_size(page, &mut scorer);
        self.check_lazy_loading(page, &mut scorer);
        self.check_external_resources(page, &mut scorer);
        self.check_inline_styles(page, &mut scorer);
        self.check_external_links(page, &mut scorer);

        for tip in BOILERPLATE_SUGGESTIONS {
            scorer.advise(tip);
        }

        scorer.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze_at(body: &str, url: &str) -> CategoryResult {
        let html = format!("<html><head><title>Test</title></head><body>{}</body></html>", body);
        PerformanceAnalyzer::new().analyze(&PageSnapshot::parse(&html, url))
    }

    fn analyze(body: &str) -> CategoryResult {
        analyze_at(body, "https://example.com/")
    }

    fn lazy_img(attrs: &str) -> String {
        format!(r#"<img loading="lazy" {}>"#, attrs)
    }

    #[test]
    fn empty_page_has_only_boilerplate() {
        let result = analyze("");
        assert_eq!(result.score, 100);
        assert!(result.issues.is_empty());
        assert_eq!(result.suggestions, BOILERPLATE_SUGGESTIONS.to_vec());
    }

    #[test]
    fn image_size_boundaries() {
        let exact = analyze(&lazy_img(r#"src="a.png" width="1920" height="1080""#));
        assert!(exact.issue(IssueKind::ImageOptimization).is_none());

        let wide = analyze(&lazy_img(r#"src="wide.png" width="1921" height="1080""#));
        let issue = wide.issue(IssueKind::ImageOptimization).unwrap();
        assert_eq!(issue.message, "1 images larger than 1920x1080");
        assert_eq!(issue.severity, Severity::Medium);
        assert_eq!(issue.element.as_deref(), Some("wide.png"));
        assert_eq!(wide.score, 97);

        let tall = analyze(&lazy_img(r#"src="tall.png" width="1920" height="1081""#));
        assert!(tall.issue(IssueKind::ImageOptimization).is_some());
    }

    #[test]
    fn image_size_deduction_caps_at_20() {
        let body = lazy_img(r#"width="4000" height="3000""#).repeat(8);
        let result = analyze(&body);
        let issue = result.issue(IssueKind::ImageOptimization).unwrap();
        assert_eq!(issue.message, "8 images larger than 1920x1080");
        assert_eq!(issue.element.as_deref(), Some(UNKNOWN_SOURCE));
        assert_eq!(result.score, 80);
    }

    #[test]
    fn images_without_dimensions_are_not_large() {
        let result = analyze(&lazy_img(r#"src="a.png""#));
        assert!(result.issue(IssueKind::ImageOptimization).is_none());
    }

    #[test]
    fn lazy_loading_threshold() {
        let three = analyze(&r#"<img src="a.png">"#.repeat(3));
        assert!(three.issue(IssueKind::LazyLoading).is_none());

        let four = analyze(&r#"<img src="a.png">"#.repeat(4));
        let issue = four.issue(IssueKind::LazyLoading).unwrap();
        assert_eq!(issue.message, "4 images without lazy loading");
        assert_eq!(issue.severity, Severity::Low);
        assert_eq!(four.score, 90);

        let forty = analyze(&r#"<img src="a.png">"#.repeat(40));
        assert_eq!(forty.score, 90);
    }

    #[test]
    fn any_loading_value_counts_as_set() {
        let body = r#"<img loading="eager">"#.repeat(5);
        let result = analyze(&body);
        assert!(result.issue(IssueKind::LazyLoading).is_none());
    }

    fn external_resources(n: usize) -> String {
        (0..n)
            .map(|i| {
                if i % 2 == 0 {
                    format!(r#"<script src="https://cdn.example.net/{}.js"></script>"#, i)
                } else {
                    format!(r#"<link rel="stylesheet" href="http://cdn.example.net/{}.css">"#, i)
                }
            })
            .collect()
    }

    #[test]
    fn external_resource_thresholds() {
        assert!(analyze(&external_resources(10))
            .issue(IssueKind::ExternalResources)
            .is_none());

        let eleven = analyze(&external_resources(11));
        let issue = eleven.issue(IssueKind::ExternalResources).unwrap();
        assert_eq!(issue.message, "11 external resources detected");
        assert_eq!(issue.severity, Severity::Medium);
        assert_eq!(eleven.score, 98);

        assert_eq!(analyze(&external_resources(20)).score, 85);
    }

    #[test]
    fn relative_resources_are_not_external() {
        let body = r#"<script src="/app.js"></script><link rel="stylesheet" href="site.css">"#
            .repeat(12);
        let result = analyze(&body);
        assert!(result.issue(IssueKind::ExternalResources).is_none());
    }

    #[test]
    fn inline_style_threshold() {
        let twenty = analyze(&r#"<p style="margin:0">x</p>"#.repeat(20));
        assert!(twenty.issue(IssueKind::InlineStyles).is_none());

        let many = analyze(&r#"<p style="margin:0">x</p>"#.repeat(21));
        let issue = many.issue(IssueKind::InlineStyles).unwrap();
        assert_eq!(issue.message, "21 elements with inline styles");
        assert_eq!(many.score, 95);
    }

    #[test]
    fn external_links_without_rel() {
        let body = r#"
            <a href="https://other.org/a">a</a>
            <a href="https://other.org/b" rel="noopener">b</a>
            <a href="https://example.com/c">c</a>
            <a href="/d">d</a>
            <a href="http://third.net">e</a>"#;
        let result = analyze(body);
        let issue = result.issue(IssueKind::ExternalLinks).unwrap();
        assert_eq!(issue.message, "2 external links without rel attributes");
        assert_eq!(issue.severity, Severity::Low);
        assert_eq!(result.score, 98);
    }

    #[test]
    fn external_link_deduction_caps_at_10() {
        let body = r#"<a href="https://other.org">x</a>"#.repeat(14);
        assert_eq!(analyze(&body).score, 90);
    }

    #[test]
    fn host_comparison_is_literal() {
        // www and port are not normalized; case is
        let body = r#"<a href="https://www.example.com/">a</a><a href="https://EXAMPLE.com/">b</a>"#;
        let result = analyze(body);
        assert_eq!(
            result.issue(IssueKind::ExternalLinks).unwrap().message,
            "1 external links without rel attributes"
        );
    }

    #[test]
    fn local_file_pages_treat_every_http_link_as_external() {
        let body = r#"<a href="https://example.com/">a</a>"#;
        let result = analyze_at(body, "file:///srv/site/index.html");
        assert!(result.issue(IssueKind::ExternalLinks).is_some());
    }

    #[test]
    fn is_external_cases() {
        assert!(is_external("https://other.org", "example.com"));
        assert!(!is_external("https://example.com/x", "example.com"));
        assert!(!is_external("mailto:someone@other.org", "example.com"));
        assert!(!is_external("//other.org/x", "example.com"));
        assert!(!is_external("httpfoo", "example.com"));
        assert!(!is_external("http-status.html", "example.com"));
        assert!(!is_external("https://", "example.com"));
    }

    #[test]
    fn rule_order_is_fixed() {
        let mut body = lazy_img(r#"src="big.png" width="3000""#);
        body.push_str(&r#"<img src="x.png">"#.repeat(4));
        body.push_str(&external_resources(11));
        body.push_str(&r#"<span style="color:red">x</span>"#.repeat(21));
        body.push_str(r#"<a href="https://other.org">x</a>"#);
        let result = analyze(&body);
        let kinds: Vec<_> = result.issues.iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            vec![
                IssueKind::ImageOptimization,
                IssueKind::LazyLoading,
                IssueKind::ExternalResources,
                IssueKind::InlineStyles,
                IssueKind::ExternalLinks,
            ]
        );
        assert_eq!(result.suggestions.len(), 8);
        assert_eq!(&result.suggestions[5..], &BOILERPLATE_SUGGESTIONS.map(String::from));
        // 3 + 10 + 2 + 5 + 1
        assert_eq!(result.score, 79);
    }
}
