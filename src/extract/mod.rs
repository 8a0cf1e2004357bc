// src/extract/mod.rs
// =============================================================================
// Content extraction: raw bytes in, plain text (and links) out.
//
// Submodules:
// - html: text, outbound links and headings of an HTML page (scraper)
// - pdf: page-by-page text of a PDF document (lopdf)
//
// extract() is the single entry point the crawl worker uses. Any parse
// failure comes back as an ExtractError; the worker decides what to do.
// =============================================================================

mod html;
mod pdf;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::crawl::filter::url_extension;
use crate::error::ExtractError;

pub use html::extract_html;
pub use pdf::extract_pdf;

#[cfg(test)]
pub(crate) use pdf::sample_pdf;

/// The formats the crawler knows how to turn into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocFormat {
    Html,
    Pdf,
}

impl DocFormat {
    /// Picks the format from the URL's file extension; anything that is not
    /// a known document format is treated as a web page.
    pub fn from_url(url: &str) -> Self {
        match url_extension(url).as_deref() {
            Some("pdf") => DocFormat::Pdf,
            _ => DocFormat::Html,
        }
    }

    /// Documents are leaves: they are never scanned for links.
    pub fn is_document(&self) -> bool {
        !matches!(self, DocFormat::Html)
    }
}

/// Knobs that change what extract() returns.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractOptions {
    /// Return links (and headings) but no text
    pub only_urls: bool,
    /// Document text shorter than this (in chars, trimmed) is dropped
    pub min_content_size: usize,
}

/// Title and first heading of each level found on a page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageHeadings {
    pub title: Option<String>,
    /// h1..h6, index 0 is h1
    pub levels: [Option<String>; 6],
}

/// Output of one extraction.
#[derive(Debug, Clone, Default)]
pub struct ExtractionResult {
    pub text: String,
    /// (resolved url, trimmed anchor text), unique by url
    pub links: Vec<(String, String)>,
    pub headings: PageHeadings,
}

/// Extracts text (and for HTML, links and headings) from fetched bytes.
pub fn extract(
    raw: &[u8],
    format: DocFormat,
    page_url: &Url,
    options: ExtractOptions,
) -> Result<ExtractionResult, ExtractError> {
    match format {
        DocFormat::Html => {
            // fetch() already decoded the page to UTF-8 using its declared charset
            let html = String::from_utf8_lossy(raw);
            extract_html(&html, page_url, options.only_urls)
        }
        DocFormat::Pdf => {
            if options.only_urls {
                return Ok(ExtractionResult::default());
            }
            let text = extract_pdf(raw, options.min_content_size)?;
            Ok(ExtractionResult {
                text,
                ..Default::default()
            })
        }
    }
}
