//! Parsed page snapshot and typed element handles

use super::queries::{global_selector_cache, QueryId};
use scraper::{ElementRef, Html};

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Read-only snapshot of a page: its element tree and the URL it was served from.
///
/// The URL stands in for the page location: the page hostname used by the
/// external-link rule is derived from it.
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    html: Html,
    url: String,
}

impl PageSnapshot {
    /// Parse an HTML document served from `url`. Never fails; malformed markup is
    /// recovered the way browsers recover it.
    pub fn parse(html: &str, url: impl Into<String>) -> Self {
        Self {
            html: Html::parse_document(html),
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Host part of the page URL, or "" when the URL has none (e.g. `file://`)
    pub fn hostname(&self) -> &str {
        host_of(&self.url).unwrap_or("")
    }

    /// Document title: text of the first HTML `<title>`, whitespace collapsed and
    /// trimmed. `<title>` inside inline SVG is skipped.
    pub fn title(&self) -> String {
        self.html
            .select(global_selector_cache().get(QueryId::Title))
            .map(Element::new)
            .find(Element::is_html)
            .map(|t| collapse_whitespace(&t.text()))
            .unwrap_or_default()
    }

    /// All elements matching the query, in document order
    pub fn query(&self, id: QueryId) -> Vec<Element<'_>> {
        self.html
            .select(global_selector_cache().get(id))
            .map(Element::new)
            .collect()
    }

    pub fn first(&self, id: QueryId) -> Option<Element<'_>> {
        self.html
            .select(global_selector_cache().get(id))
            .next()
            .map(Element::new)
    }

    pub fn count(&self, id: QueryId) -> usize {
        self.html.select(global_selector_cache().get(id)).count()
    }

    pub fn exists(&self, id: QueryId) -> bool {
        self.first(id).is_some()
    }
}

/// Handle to one element of a snapshot
#[derive(Debug, Clone, Copy)]
pub struct Element<'a> {
    inner: ElementRef<'a>,
}

impl<'a> Element<'a> {
    fn new(inner: ElementRef<'a>) -> Self {
        Self { inner }
    }

    /// Whether the element lives in the HTML namespace (not SVG or MathML)
    pub fn is_html(&self) -> bool {
        &*self.inner.value().name.ns == HTML_NAMESPACE
    }

    /// Lowercase local tag name ("img", "input", ...)
    pub fn tag_name(&self) -> &'a str {
        self.inner.value().name()
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.inner.value().attr(name)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    pub fn id(&self) -> Option<&'a str> {
        self.inner.value().id()
    }

    pub fn src(&self) -> Option<&'a str> {
        self.attr("src")
    }

    pub fn href(&self) -> Option<&'a str> {
        self.attr("href")
    }

    /// Concatenated descendant text
    pub fn text(&self) -> String {
        self.inner.text().collect()
    }

    /// 1-6 for h1..h6, None for anything else
    pub fn heading_level(&self) -> Option<u8> {
        let rest = self.tag_name().strip_prefix('h')?;
        match rest.parse::<u8>() {
            Ok(level @ 1..=6) => Some(level),
            _ => None,
        }
    }

    /// Intrinsic (width, height) as recorded on the element's `width`/`height`
    /// attributes. A missing or unparsable dimension counts as 0; None when
    /// neither is present.
    pub fn intrinsic_size(&self) -> Option<(u32, u32)> {
        let width = self.attr("width").and_then(parse_dimension);
        let height = self.attr("height").and_then(parse_dimension);
        if width.is_none() && height.is_none() {
            return None;
        }
        Some((width.unwrap_or(0), height.unwrap_or(0)))
    }
}

fn parse_dimension(value: &str) -> Option<u32> {
    let value = value.trim();
    let digits = value
        .find(|c: char| !c.is_ascii_digit())
        .map_or(value, |end| &value[..end]);
    digits.parse().ok()
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Host of an absolute URL (`scheme://[user@]host[:port]/...`), without port.
/// No normalization beyond that: `www.` prefixes and case are kept as written.
pub fn host_of(url: &str) -> Option<&str> {
    let (_, rest) = url.split_once("://")?;
    let authority = rest.split(['/', '?', '#']).next().unwrap_or("");
    let host_port = authority.rsplit('@').next().unwrap_or(authority);
    let host = if host_port.starts_with('[') {
        // IPv6 literal: keep the brackets, drop the port
        host_port
            .find(']')
            .map_or(host_port, |end| &host_port[..=end])
    } else {
        host_port.split(':').next().unwrap_or(host_port)
    };
    Some(host)
}
