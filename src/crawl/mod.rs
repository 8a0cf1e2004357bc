// src/crawl/mod.rs
// =============================================================================
// This module handles website crawling.
//
// Features:
// - Breadth-first crawling from a seed URL, batch by batch
// - Depth limit and URL quota
// - Ignored / required domain filters, exclude set, plain-http rejection
// - Concurrent fetch-and-extract workers, joined at every batch boundary
//
// Submodules:
// - filter: URL normalization and accept/reject rules
// - fetch: HTTP download with a single redirect hop
// - worker: processes one UrlTask into an outcome
// - frontier: the queue, the seen set and the crawl loop
// =============================================================================

pub mod fetch;
pub mod filter;
mod frontier;
mod worker;

use crate::settings::Settings;

pub use frontier::{CrawlReport, Crawler, Frontier, BATCH_SIZE};
pub use worker::{TaskOutcome, Worker};

/// One URL waiting to be crawled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTask {
    pub url: String,
    /// 1 for the seed, parent depth + 1 for discovered links
    pub depth: usize,
    /// Text of the link this URL was found through
    pub anchor_text: Option<String>,
}

impl UrlTask {
    pub fn seed(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            depth: 1,
            anchor_text: None,
        }
    }

    pub fn child(&self, url: String, anchor_text: String) -> Self {
        Self {
            url,
            depth: self.depth + 1,
            anchor_text: if anchor_text.is_empty() {
                None
            } else {
                Some(anchor_text)
            },
        }
    }
}

/// Per-crawl knobs the worker and the loop consult.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlOptions {
    pub max_depth: usize,
    pub max_urls: usize,
    pub only_urls: bool,
    pub load_pdf: bool,
    pub min_content_size: usize,
}

impl CrawlOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            max_depth: settings.launch.depth,
            max_urls: settings.launch.max_urls,
            only_urls: settings.urls_policy.only_urls,
            load_pdf: settings.load_pdf,
            min_content_size: settings.min_content_size,
        }
    }
}
