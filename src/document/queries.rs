//! Shared selector library for the analyzers.
//!
//! Every element query an analyzer performs is a `QueryId`. Selectors are compiled
//! once per process and reused for every page.

use scraper::Selector;
use std::collections::HashMap;
use std::sync::OnceLock;

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum QueryId {
    /// The document `<title>`
    Title,
    /// Every `<img>`
    Images,
    /// Text-like inputs, textareas and selects (candidates for a label)
    FormControls,
    /// `<label for=...>`
    LabelsWithFor,
    /// Elements carrying any inline `style`
    InlineStyled,
    /// Elements whose inline style mentions a color
    ColorStyled,
    /// Focusable controls that need a visible focus indicator
    Interactive,
    /// h1..h6 in document order
    Headings,
    H1,
    MetaDescription,
    CanonicalLink,
    OgTitle,
    OgDescription,
    /// `<script src=...>`
    ScriptsWithSrc,
    /// `<link href=...>`
    LinksWithHref,
    /// `<a href=...>`
    Anchors,
}

impl QueryId {
    pub const ALL: [QueryId; 16] = [
        QueryId::Title,
        QueryId::Images,
        QueryId::FormControls,
        QueryId::LabelsWithFor,
        QueryId::InlineStyled,
        QueryId::ColorStyled,
        QueryId::Interactive,
        QueryId::Headings,
        QueryId::H1,
        QueryId::MetaDescription,
        QueryId::CanonicalLink,
        QueryId::OgTitle,
        QueryId::OgDescription,
        QueryId::ScriptsWithSrc,
        QueryId::LinksWithHref,
        QueryId::Anchors,
    ];

    /// CSS selector text for this query
    pub fn css(self) -> &'static str {
        match self {
            QueryId::Title => "title",
            QueryId::Images => "img",
            QueryId::FormControls => {
                r#"input[type="text"], input[type="email"], input[type="password"], textarea, select"#
            }
            QueryId::LabelsWithFor => "label[for]",
            QueryId::InlineStyled => "[style]",
            QueryId::ColorStyled => r#"[style*="color"]"#,
            QueryId::Interactive => "button, a, input, select, textarea",
            QueryId::Headings => "h1, h2, h3, h4, h5, h6",
            QueryId::H1 => "h1",
            QueryId::MetaDescription => r#"meta[name="description"]"#,
            QueryId::CanonicalLink => r#"link[rel="canonical"]"#,
            QueryId::OgTitle => r#"meta[property="og:title"]"#,
            QueryId::OgDescription => r#"meta[property="og:description"]"#,
            QueryId::ScriptsWithSrc => "script[src]",
            QueryId::LinksWithHref => "link[href]",
            QueryId::Anchors => "a[href]",
        }
    }
}

/// Compiled selectors keyed by query id
pub struct SelectorCache {
    selectors: HashMap<QueryId, Selector>,
}

impl SelectorCache {
    pub fn new() -> Self {
        let selectors = QueryId::ALL
            .iter()
            .map(|&id| {
                let selector = Selector::parse(id.css()).expect("valid selector");
                (id, selector)
            })
            .collect();
        Self { selectors }
    }

    pub fn get(&self, id: QueryId) -> &Selector {
        &self.selectors[&id]
    }
}

impl Default for SelectorCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Global selector cache (compile once per process).
pub fn global_selector_cache() -> &'static SelectorCache {
    static CACHE: OnceLock<SelectorCache> = OnceLock::new();
    CACHE.get_or_init(SelectorCache::new)
}
