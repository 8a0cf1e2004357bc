// src/crawl/worker.rs
// =============================================================================
// The fetch-and-extract worker: one UrlTask in, one TaskOutcome out.
//
// What a worker does with a task:
// 1. Prune it if it is too deep or uses a rejected scheme
// 2. Documents (pdf): fetch, extract, save; documents have no children
// 3. Media (images, archives, ...): skip
// 4. Everything else is a web page: fetch, extract, save, and turn the
//    page's links into child tasks one level deeper
//
// A worker never touches the frontier, the metadata map or the publisher.
// It only reads the seen set and writes text files; everything else goes
// back to the crawl loop inside the TaskOutcome. Every failure is logged
// here and turns into an empty outcome, so one bad URL never stops a batch.
// =============================================================================

use reqwest::Client;
use std::collections::HashSet;
use std::path::PathBuf;
use url::Url;

use super::fetch::fetch;
use super::filter::{UrlFilter, Verdict};
use super::{CrawlOptions, UrlTask};
use crate::extract::{extract, DocFormat, ExtractOptions, PageHeadings};
use crate::sink::{ContentSink, DocumentMetadata};

/// What the crawl loop needs to know about one finished task.
#[derive(Debug, Default)]
pub struct TaskOutcome {
    /// Accepted links, one level deeper than the task
    pub children: Vec<UrlTask>,
    /// Set whenever extraction was attempted
    pub metadata: Option<DocumentMetadata>,
    /// Text file written for this URL, if any
    pub written: Option<PathBuf>,
    /// Counts toward the URL quota
    pub attempted: bool,
}

impl TaskOutcome {
    fn pruned() -> Self {
        Self::default()
    }

    fn attempted(metadata: DocumentMetadata, written: Option<PathBuf>) -> Self {
        Self {
            children: Vec::new(),
            metadata: Some(metadata),
            written,
            attempted: true,
        }
    }
}

pub struct Worker {
    client: Client,
    filter: UrlFilter,
    options: CrawlOptions,
}

impl Worker {
    pub fn new(client: Client, filter: UrlFilter, options: CrawlOptions) -> Self {
        Self {
            client,
            filter,
            options,
        }
    }

    pub fn options(&self) -> &CrawlOptions {
        &self.options
    }

    /// Processes one task.
    ///
    /// `seen` is the frontier's seen set as of the start of the batch; it is
    /// only read. The quota is enforced by the caller when it sizes batches.
    pub async fn process(
        &self,
        task: UrlTask,
        seen: &HashSet<String>,
        sink: &ContentSink,
    ) -> TaskOutcome {
        if task.depth > self.options.max_depth || self.filter.is_rejected_scheme(&task.url) {
            log::debug!("[{}] {} pruned", task.depth, task.url);
            return TaskOutcome::pruned();
        }

        let format = DocFormat::from_url(&task.url);
        if format.is_document() {
            return self.process_document(task, format, sink).await;
        }
        if self.filter.is_media(&task.url) {
            log::debug!("[{}] {} is media, skipped", task.depth, task.url);
            return TaskOutcome::pruned();
        }
        self.process_page(task, seen, sink).await
    }

    async fn process_document(
        &self,
        task: UrlTask,
        format: DocFormat,
        sink: &ContentSink,
    ) -> TaskOutcome {
        if !self.options.load_pdf {
            return TaskOutcome::pruned();
        }

        let metadata = DocumentMetadata::new(
            &task.url,
            task.anchor_text.clone(),
            format,
            PageHeadings::default(),
        );
        if self.options.only_urls {
            return TaskOutcome::attempted(metadata, None);
        }

        let (page_url, raw) = match self.download(&task, format).await {
            Some(downloaded) => downloaded,
            None => return TaskOutcome::pruned(),
        };
        let extracted = match extract(&raw, format, &page_url, self.extract_options()) {
            Ok(extracted) => extracted,
            Err(e) => {
                log::warn!("invalid doc for text extraction from url={}: {}", task.url, e);
                return TaskOutcome::pruned();
            }
        };

        let written = self.save(&extracted.text, &task.url, sink).await;
        log::info!("[{}] {} is processed", task.depth, task.url);
        TaskOutcome::attempted(metadata, written)
    }

    async fn process_page(
        &self,
        task: UrlTask,
        seen: &HashSet<String>,
        sink: &ContentSink,
    ) -> TaskOutcome {
        let (page_url, raw) = match self.download(&task, DocFormat::Html).await {
            Some(downloaded) => downloaded,
            None => return TaskOutcome::pruned(),
        };
        let extracted = match extract(&raw, DocFormat::Html, &page_url, self.extract_options()) {
            Ok(extracted) => extracted,
            Err(e) => {
                log::warn!("can't parse text from url={}: {}", task.url, e);
                return TaskOutcome::pruned();
            }
        };

        let metadata = DocumentMetadata::new(
            &task.url,
            task.anchor_text.clone(),
            DocFormat::Html,
            extracted.headings,
        );

        let written = if self.options.only_urls {
            None
        } else {
            self.save(&extracted.text, &task.url, sink).await
        };

        // Links one level past max_depth would only be pruned later
        let mut children = Vec::new();
        if task.depth < self.options.max_depth {
            for (url, name) in extracted.links {
                match self.filter.classify(&url, seen) {
                    Verdict::Accept => children.push(task.child(url, name)),
                    Verdict::Reject(reason) => log::debug!("{} rejected: {:?}", url, reason),
                }
            }
        }

        log::info!(
            "[{}] {} is processed ({} new link(s))",
            task.depth,
            task.url,
            children.len()
        );

        let mut outcome = TaskOutcome::attempted(metadata, written);
        outcome.children = children;
        outcome
    }

    // Fetches the task URL; failures are logged and yield None
    async fn download(&self, task: &UrlTask, format: DocFormat) -> Option<(Url, Vec<u8>)> {
        let page_url = match Url::parse(&task.url) {
            Ok(url) => url,
            Err(e) => {
                log::warn!("invalid url={}: {}", task.url, e);
                return None;
            }
        };

        match fetch(&self.client, &task.url, format).await {
            // Relative links resolve against where the body was served from
            Ok(fetched) => {
                let base = Url::parse(&fetched.final_url).unwrap_or(page_url);
                Some((base, fetched.body))
            }
            Err(e) => {
                log::warn!("{}", e);
                None
            }
        }
    }

    // Save failures are logged; the task still counts as attempted
    async fn save(&self, text: &str, url: &str, sink: &ContentSink) -> Option<PathBuf> {
        match sink.save(text, url).await {
            Ok(written) => written,
            Err(e) => {
                log::warn!("I/O exception while saving {} content: {}", url, e);
                None
            }
        }
    }

    fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            only_urls: self.options.only_urls,
            min_content_size: self.options.min_content_size,
        }
    }
}
