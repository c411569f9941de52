//! Parsing of fetched page documents.
//!
//! A fetched page is reduced to what the router needs: the body markup to
//! swap in, the external scripts it references (document order, no
//! duplicates) and a count of the inline blocks that are not executed.

use scraper::{Html, Selector};
use std::collections::HashSet;

use bizdesk_core::Error;

/// A fetched page reduced to its swappable parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPage {
    /// Inner markup of `<body>`.
    pub body: String,
    /// `src` of every external script, in document order.
    pub scripts: Vec<String>,
    /// Number of non-empty inline script blocks.
    pub inline_scripts: usize,
}

/// Parse a CSS selector, reporting failures as invalid input.
pub fn selector(css: &str) -> Result<Selector, Error> {
    Selector::parse(css).map_err(|e| Error::InvalidInput(format!("invalid selector {css:?}: {e}")))
}

/// Parse a full HTML document.
pub fn parse_page(html: &str) -> ParsedPage {
    let document = Html::parse_document(html);
    let body_selector = Selector::parse("body").expect("invalid selector");
    let external = Selector::parse("script[src]").expect("invalid selector");
    let inline = Selector::parse("script:not([src])").expect("invalid selector");

    let body = document
        .select(&body_selector)
        .next()
        .map(|b| b.inner_html())
        .unwrap_or_else(|| document.root_element().inner_html());

    let mut seen = HashSet::new();
    let mut scripts = Vec::new();
    for element in document.select(&external) {
        let src = match element.value().attr("src").map(str::trim) {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => continue,
        };
        if seen.insert(src.clone()) {
            scripts.push(src);
        }
    }

    let inline_scripts = document
        .select(&inline)
        .filter(|s| !s.text().collect::<String>().trim().is_empty())
        .count();

    ParsedPage { body, scripts, inline_scripts }
}

/// Normalize a markup fragment through the parser's serializer.
pub fn normalize_fragment(markup: &str) -> String {
    Html::parse_fragment(markup).root_element().inner_html()
}

/// Outer markup of the first element in `markup` matching `selector`.
pub fn select_outer(markup: &str, selector: &Selector) -> Option<String> {
    let fragment = Html::parse_fragment(markup);
    fragment.select(selector).next().map(|element| element.html())
}

/// `src` of every external script in a fragment.
pub fn script_sources(markup: &str) -> Vec<String> {
    let fragment = Html::parse_fragment(markup);
    let external = Selector::parse("script[src]").expect("invalid selector");
    fragment
        .select(&external)
        .filter_map(|s| s.value().attr("src"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
