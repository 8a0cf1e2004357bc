// src/extract/html.rs
// =============================================================================
// This module turns an HTML page into plain text, outbound links and
// headings.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (built on html5ever, Mozilla's HTML parser)
// - Supports CSS selectors for finding elements
//
// Text extraction keeps only a fixed set of text-bearing tags. Anything
// else (script, style, nav, header, form, ...) is dropped together with
// its whole subtree. Links outside a <p> are treated as navigation and
// dropped from the text too, but they are still returned as links.
// =============================================================================

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

use super::{ExtractionResult, PageHeadings};
use crate::crawl::filter::{is_http, normalize};
use crate::error::ExtractError;

// Tags whose text ends up in the extracted body
const TEXT_TAGS: &[&str] = &[
    // text
    "div", "dl", "dt", "li", "menu", "ol", "p", "ul", "b", "span", "hgroup", "h1", "h2", "h3",
    "h4", "h5", "h6", "title",
    // tables
    "caption", "col", "colgroup", "table", "tbody", "td", "tfoot", "th", "thead", "tr",
    // inline semantics
    "abbr", "bdi", "cite", "code", "data", "dfn", "em", "i", "kbd", "mark", "q", "blockquote",
    "samp", "small", "strong", "sub", "time", "u",
    // old sites still use these
    "big", "center", "font",
];

// Selectors are constants and known to be valid, so parsing can't fail
static BODY: Lazy<Selector> = Lazy::new(|| Selector::parse("body").unwrap());
static LINKS: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static HEADINGS: Lazy<[Selector; 6]> = Lazy::new(|| {
    ["h1", "h2", "h3", "h4", "h5", "h6"].map(|tag| Selector::parse(tag).unwrap())
});

static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\s){2,}").unwrap());

/// Extracts text, links and headings from an HTML document.
///
/// In only-urls mode the text is left empty.
pub fn extract_html(
    html: &str,
    page_url: &Url,
    only_urls: bool,
) -> Result<ExtractionResult, ExtractError> {
    let document = Html::parse_document(html);
    let body = document.select(&BODY).next().ok_or(ExtractError::EmptyBody)?;

    let links = extract_links(body, page_url);
    let headings = extract_headings(&document, body);
    let text = if only_urls {
        String::new()
    } else {
        extract_text(body)
    };

    Ok(ExtractionResult {
        text,
        links,
        headings,
    })
}

// Returns (url, anchor text) pairs for every crawlable link in the body.
// The first occurrence of a URL wins.
fn extract_links(body: ElementRef, page_url: &Url) -> Vec<(String, String)> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in body.select(&LINKS) {
        let href = match element.value().attr("href") {
            Some(href) if !href.trim().is_empty() => href,
            _ => continue,
        };
        let url = match normalize(href, page_url) {
            Some(url) if is_http(&url) => url,
            _ => continue,
        };
        if seen.insert(url.clone()) {
            let name = element.text().collect::<String>().trim().to_string();
            links.push((url, name));
        }
    }

    links
}

fn extract_headings(document: &Html, body: ElementRef) -> PageHeadings {
    let title = document
        .select(&TITLE)
        .next()
        .or_else(|| body.select(&TITLE).next())
        .and_then(element_text);

    let mut levels: [Option<String>; 6] = Default::default();
    for (slot, selector) in levels.iter_mut().zip(HEADINGS.iter()) {
        *slot = body.select(selector).next().and_then(element_text);
    }

    PageHeadings { title, levels }
}

fn element_text(element: ElementRef) -> Option<String> {
    let text = element.text().collect::<String>();
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn extract_text(body: ElementRef) -> String {
    let mut raw = String::new();
    collect_text(body, false, &mut raw);
    clean_whitespace(&raw).trim().to_string()
}

// Walks the tree and appends text of allowed elements only.
// `in_paragraph` is true once any ancestor is a <p>.
fn collect_text(element: ElementRef, in_paragraph: bool, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                let Some(child) = ElementRef::wrap(child) else {
                    continue;
                };
                let name = child.value().name();
                if name == "a" {
                    if in_paragraph {
                        collect_text(child, in_paragraph, out);
                    }
                } else if TEXT_TAGS.contains(&name) {
                    collect_text(child, in_paragraph || name == "p", out);
                }
            }
            _ => {}
        }
    }
}

// NBSP and tabs become spaces; each run of whitespace collapses to its
// last character so line breaks between blocks survive.
fn clean_whitespace(text: &str) -> String {
    let text = text.replace(['\u{a0}', '\t'], " ");
    MULTI_SPACE.replace_all(&text, "$1").into_owned()
}
