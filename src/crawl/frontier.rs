// src/crawl/frontier.rs
// =============================================================================
// This module implements the crawl loop with a breadth-first approach.
//
// How it works:
// 1. Start with the seed URL in the queue (and in the seen set)
// 2. Pop a batch: min(remaining quota, queue length, BATCH_SIZE) tasks
// 3. Run one worker per task concurrently and wait for all of them
// 4. Apply the outcomes: count, record metadata, publish written files
// 5. Append the new, never-seen children to the queue and the seen set
// 6. Repeat until the queue is empty or the quota is met
//
// Only this loop mutates the frontier, the metadata map and the publisher.
// Workers get read-only borrows for the length of a batch, so no locking is
// needed. Because a batch never exceeds the remaining quota, the processed
// count never exceeds max_urls.
// =============================================================================

use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;

use super::filter::normalize_seed;
use super::worker::{TaskOutcome, Worker};
use super::UrlTask;
use crate::error::CrawlError;
use crate::pipeline::Publisher;
use crate::sink::{ContentSink, MergePolicy};

/// Upper bound on tasks in flight at once.
pub const BATCH_SIZE: usize = 25;

/// The BFS queue plus everything ever enqueued.
#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<UrlTask>,
    seen: HashSet<String>,
    processed: usize,
}

impl Frontier {
    pub fn new(seed: UrlTask) -> Self {
        let mut frontier = Self::default();
        frontier.seen.insert(seed.url.clone());
        frontier.queue.push_back(seed);
        frontier
    }

    pub fn seen(&self) -> &HashSet<String> {
        &self.seen
    }

    pub fn processed(&self) -> usize {
        self.processed
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn quota_met(&self, max_urls: usize) -> bool {
        self.processed >= max_urls
    }

    pub fn is_done(&self, max_urls: usize) -> bool {
        self.queue.is_empty() || self.quota_met(max_urls)
    }

    /// Pops the next batch from the front of the queue.
    pub fn next_batch(&mut self, max_urls: usize, batch_size: usize) -> Vec<UrlTask> {
        let remaining = max_urls.saturating_sub(self.processed);
        let size = remaining.min(self.queue.len()).min(batch_size);
        self.queue.drain(..size).collect()
    }

    pub fn mark_processed(&mut self) {
        self.processed += 1;
    }

    /// Enqueues children that were never seen before.
    ///
    /// Two pages in the same batch can both link the same URL; only the
    /// first copy gets in. Nothing is accepted once the quota is met.
    /// Returns how many tasks were added.
    pub fn merge(&mut self, children: Vec<UrlTask>, max_urls: usize) -> usize {
        if self.quota_met(max_urls) {
            return 0;
        }

        let mut added = 0;
        for child in children {
            if self.seen.insert(child.url.clone()) {
                self.queue.push_back(child);
                added += 1;
            }
        }
        added
    }
}

/// Summary of a finished crawl.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CrawlReport {
    /// Every URL handed to a worker, seed first
    pub visited: Vec<String>,
    /// Tasks whose extraction was attempted (the quota counter)
    pub processed: usize,
    pub files_written: usize,
    pub published: usize,
    pub store_path: PathBuf,
}

/// Owns everything one crawl needs and runs it to completion.
pub struct Crawler {
    worker: Worker,
    sink: ContentSink,
    publisher: Publisher,
    merge_policy: MergePolicy,
}

impl Crawler {
    pub fn new(
        worker: Worker,
        sink: ContentSink,
        publisher: Publisher,
        merge_policy: MergePolicy,
    ) -> Self {
        Self {
            worker,
            sink,
            publisher,
            merge_policy,
        }
    }

    pub fn sink(&self) -> &ContentSink {
        &self.sink
    }

    /// Crawls from `seed` and flushes the metadata store at the end.
    ///
    /// Only publisher and metadata store failures end the crawl early;
    /// everything that goes wrong for a single URL is logged and skipped.
    pub async fn run(&mut self, seed: &str) -> Result<CrawlReport, CrawlError> {
        let max_urls = self.worker.options().max_urls;
        let seed = normalize_seed(seed);
        log::info!("crawling {} (max urls: {})", seed, max_urls);
        if self.publisher.is_enabled() {
            log::info!("written files are announced on the pipeline queue");
        }

        let mut frontier = Frontier::new(UrlTask::seed(seed.clone()));
        let mut report = CrawlReport::default();

        while !frontier.is_done(max_urls) {
            let batch = frontier.next_batch(max_urls, BATCH_SIZE);
            report.visited.extend(batch.iter().map(|task| task.url.clone()));
            log::debug!(
                "dispatching {} task(s), {} queued, {} processed",
                batch.len(),
                frontier.queued(),
                frontier.processed()
            );

            let outcomes = self.run_batch(batch, frontier.seen()).await;

            let mut children = Vec::new();
            for outcome in outcomes {
                children.extend(self.apply(outcome, &mut frontier, &mut report).await?);
            }
            let added = frontier.merge(children, max_urls);
            log::debug!("{} new url(s) queued", added);
        }

        if !report.visited.contains(&seed) {
            report.visited.insert(0, seed);
        }
        report.processed = frontier.processed();
        report.store_path = self.sink.flush(self.merge_policy).await?;

        log::info!(
            "crawl finished: {} url(s) processed, {} file(s) written, {} published",
            report.processed,
            report.files_written,
            report.published
        );
        Ok(report)
    }

    // Runs every task of the batch concurrently and waits for all of them
    async fn run_batch(&self, batch: Vec<UrlTask>, seen: &HashSet<String>) -> Vec<TaskOutcome> {
        let width = batch.len().max(1);
        let worker = &self.worker;
        let sink = &self.sink;

        stream::iter(batch)
            .map(|task| worker.process(task, seen, sink))
            .buffer_unordered(width)
            .collect()
            .await
    }

    // Folds one outcome into the crawl state; returns its children
    async fn apply(
        &mut self,
        outcome: TaskOutcome,
        frontier: &mut Frontier,
        report: &mut CrawlReport,
    ) -> Result<Vec<UrlTask>, CrawlError> {
        if outcome.attempted {
            frontier.mark_processed();
        }
        if let Some(metadata) = outcome.metadata {
            self.sink.record(metadata);
        }
        if let Some(path) = outcome.written {
            report.files_written += 1;
            if self.publisher.publish(&path).await? {
                report.published += 1;
            }
        }
        Ok(outcome.children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawl::fetch::build_client;
    use crate::crawl::filter::UrlFilter;
    use crate::crawl::CrawlOptions;
    use crate::extract::sample_pdf;
    use crate::pipeline::{MemoryChannel, PublishEnvelope, SCRAPER_QUEUE};
    use serde_json::{Map, Value};

    const TEXT: &str = "Enough words in this paragraph to clear the minimum content size.";

    fn options(max_depth: usize, max_urls: usize) -> CrawlOptions {
        CrawlOptions {
            max_depth,
            max_urls,
            only_urls: false,
            load_pdf: true,
            min_content_size: 10,
        }
    }

    fn crawler(
        dir: &std::path::Path,
        filter: UrlFilter,
        options: CrawlOptions,
        publisher: Publisher,
        merge_policy: MergePolicy,
    ) -> Crawler {
        let worker = Worker::new(build_client().unwrap(), filter, options);
        let sink = ContentSink::new(dir, options.min_content_size, "urls.json").unwrap();
        Crawler::new(worker, sink, publisher, merge_policy)
    }

    fn replace_store() -> MergePolicy {
        MergePolicy {
            add_urls: false,
            update_old_urls: true,
        }
    }

    fn page_with_links(links: &[String]) -> String {
        let anchors: String = links
            .iter()
            .map(|l| format!(r#"<a href="{}">{}</a>"#, l, l))
            .collect();
        format!("<html><body><p>{}</p>{}</body></html>", TEXT, anchors)
    }

    fn read_store(path: &std::path::Path) -> Map<String, Value> {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    fn task(url: &str, depth: usize) -> UrlTask {
        UrlTask {
            url: url.to_string(),
            depth,
            anchor_text: None,
        }
    }

    #[test]
    fn test_batch_is_bounded_by_quota_queue_and_size() {
        let mut frontier = Frontier::new(task("s", 1));
        let children: Vec<_> = (0..40).map(|i| task(&format!("u{}", i), 2)).collect();
        assert_eq!(frontier.merge(children, 100), 40);

        assert_eq!(frontier.next_batch(100, BATCH_SIZE).len(), 25);
        assert_eq!(frontier.next_batch(3, BATCH_SIZE).len(), 3);
        for _ in 0..3 {
            frontier.mark_processed();
        }
        assert!(frontier.quota_met(3));
        assert!(frontier.next_batch(3, BATCH_SIZE).is_empty());
    }

    #[test]
    fn test_merge_drops_duplicates_and_seen() {
        let mut frontier = Frontier::new(task("s", 1));
        let added = frontier.merge(vec![task("a", 2), task("a", 2), task("s", 2), task("b", 2)], 10);
        assert_eq!(added, 2);
        assert_eq!(frontier.seen().len(), 3);
        assert_eq!(frontier.queued(), 3);
    }

    #[test]
    fn test_merge_refused_after_quota() {
        let mut frontier = Frontier::new(task("s", 1));
        frontier.next_batch(1, BATCH_SIZE);
        frontier.mark_processed();
        assert_eq!(frontier.merge(vec![task("a", 2)], 1), 0);
        assert!(frontier.is_done(1));
    }

    #[test]
    fn test_batches_follow_depth_order() {
        let mut frontier = Frontier::new(task("s", 1));
        frontier.next_batch(100, 2);
        frontier.merge(vec![task("a", 2), task("b", 2), task("c", 2)], 100);
        let first = frontier.next_batch(100, 2);
        frontier.merge(vec![task("d", 3)], 100);
        let second = frontier.next_batch(100, 2);

        assert!(first.iter().all(|t| t.depth == 2));
        assert_eq!(second[0].url, "c");
        assert_eq!(second[1].depth, 3);
    }

    #[tokio::test]
    async fn test_crawl_respects_quota() {
        let mut server = mockito::Server::new_async().await;
        let base = server.url();
        let links: Vec<String> = (0..10).map(|i| format!("{}/p{}", base, i)).collect();
        let _root = server
            .mock("GET", "/")
            .with_status(200)
            .with_body(page_with_links(&links))
            .create_async()
            .await;
        let _pages = server
            .mock("GET", mockito::Matcher::Regex(r"^/p\d+$".to_string()))
            .with_status(200)
            .with_body(page_with_links(&[]))
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut crawler = crawler(
            dir.path(),
            UrlFilter::default(),
            options(2, 5),
            Publisher::disabled(),
            replace_store(),
        );
        let report = crawler.run(&format!("{}/", base)).await.unwrap();

        assert_eq!(report.processed, 5);
        assert_eq!(report.visited.len(), 5);
        assert_eq!(report.visited[0], format!("{}/", base));
        assert_eq!(report.files_written, 5);

        let store = read_store(&report.store_path);
        assert_eq!(store.len(), 5);
        // 5 text files + the metadata store
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 6);
    }

    #[tokio::test]
    async fn test_shared_link_is_visited_once() {
        let mut server = mockito::Server::new_async().await;
        let base = server.url();
        let _root = server
            .mock("GET", "/")
            .with_status(200)
            .with_body(page_with_links(&[format!("{}/a", base), format!("{}/b", base)]))
            .create_async()
            .await;
        let _a = server
            .mock("GET", "/a")
            .with_status(200)
            .with_body(page_with_links(&[format!("{}/shared", base)]))
            .create_async()
            .await;
        let _b = server
            .mock("GET", "/b")
            .with_status(200)
            .with_body(page_with_links(&[format!("{}/shared#frag", base)]))
            .create_async()
            .await;
        let shared = server
            .mock("GET", "/shared")
            .with_status(200)
            .with_body(page_with_links(&[]))
            .expect(1)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut crawler = crawler(
            dir.path(),
            UrlFilter::default(),
            options(3, 100),
            Publisher::disabled(),
            replace_store(),
        );
        let report = crawler.run(&format!("{}/", base)).await.unwrap();

        let shared_url = format!("{}/shared", base);
        assert_eq!(report.visited.iter().filter(|u| **u == shared_url).count(), 1);
        assert_eq!(report.processed, 4);
        shared.assert_async().await;
    }

    #[tokio::test]
    async fn test_ignored_domain_is_never_fetched() {
        let mut server = mockito::Server::new_async().await;
        let base = server.url();
        let _root = server
            .mock("GET", "/")
            .with_status(200)
            .with_body(page_with_links(&[
                format!("{}/private/x", base),
                format!("{}/public", base),
            ]))
            .create_async()
            .await;
        let private = server.mock("GET", "/private/x").expect(0).create_async().await;
        let public = server
            .mock("GET", "/public")
            .with_status(200)
            .with_body(page_with_links(&[]))
            .expect(1)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let filter = UrlFilter::new(vec!["/private".to_string()], vec![], HashSet::new(), false, &[]);
        let mut crawler = crawler(
            dir.path(),
            filter,
            options(2, 10),
            Publisher::disabled(),
            replace_store(),
        );
        crawler.run(&format!("{}/", base)).await.unwrap();

        private.assert_async().await;
        public.assert_async().await;
    }

    #[tokio::test]
    async fn test_required_domain_limits_fetches() {
        let mut server = mockito::Server::new_async().await;
        let base = server.url();
        let _root = server
            .mock("GET", "/docs/")
            .with_status(200)
            .with_body(page_with_links(&[
                format!("{}/docs/intro", base),
                format!("{}/blog/post", base),
            ]))
            .create_async()
            .await;
        let intro = server
            .mock("GET", "/docs/intro")
            .with_status(200)
            .with_body(page_with_links(&[]))
            .expect(1)
            .create_async()
            .await;
        let blog = server.mock("GET", "/blog/post").expect(0).create_async().await;

        let dir = tempfile::tempdir().unwrap();
        let filter = UrlFilter::new(vec![], vec!["/docs/".to_string()], HashSet::new(), false, &[]);
        let mut crawler = crawler(
            dir.path(),
            filter,
            options(2, 10),
            Publisher::disabled(),
            replace_store(),
        );
        let report = crawler.run(&format!("{}/docs/", base)).await.unwrap();

        assert_eq!(report.processed, 2);
        intro.assert_async().await;
        blog.assert_async().await;
    }

    #[tokio::test]
    async fn test_pdf_is_published_once() {
        let mut server = mockito::Server::new_async().await;
        let base = server.url();
        let _pdf = server
            .mock("GET", "/report.pdf")
            .with_status(200)
            .with_body(sample_pdf(&["Quarterly report with plenty of text inside"]))
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let channel = MemoryChannel::new();
        let mut crawler = crawler(
            dir.path(),
            UrlFilter::default(),
            options(2, 10),
            Publisher::new(Box::new(channel.clone())),
            replace_store(),
        );
        let report = crawler.run(&format!("{}/report.pdf", base)).await.unwrap();

        assert_eq!(report.files_written, 1);
        assert_eq!(report.published, 1);

        let store = read_store(&report.store_path);
        assert_eq!(store.len(), 1);
        let entry = store.values().next().unwrap();
        assert_eq!(entry["format"], "pdf");

        let messages = channel.drain(SCRAPER_QUEUE);
        assert_eq!(messages.len(), 1);
        let envelope: PublishEnvelope = serde_json::from_slice(&messages[0]).unwrap();
        let path = std::path::Path::new(&envelope.file_path);
        assert!(path.is_absolute());
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_redirected_page_is_crawled() {
        let mut server = mockito::Server::new_async().await;
        let base = server.url();
        let _old = server
            .mock("GET", "/old")
            .with_status(301)
            .with_header("location", "/new")
            .create_async()
            .await;
        let _new = server
            .mock("GET", "/new")
            .with_status(200)
            .with_body(page_with_links(&[]))
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut crawler = crawler(
            dir.path(),
            UrlFilter::default(),
            options(1, 10),
            Publisher::disabled(),
            replace_store(),
        );
        let report = crawler.run(&format!("{}/old", base)).await.unwrap();

        assert_eq!(report.files_written, 1);
        // the file is named after the requested URL
        let written = crawler.sink().path_for(&format!("{}/old", base));
        assert!(std::fs::read_to_string(written).unwrap().contains(TEXT));
    }

    #[tokio::test]
    async fn test_failing_seed_still_reported() {
        let mut server = mockito::Server::new_async().await;
        let _m = server.mock("GET", "/").with_status(503).create_async().await;

        let dir = tempfile::tempdir().unwrap();
        let mut crawler = crawler(
            dir.path(),
            UrlFilter::default(),
            options(2, 10),
            Publisher::disabled(),
            replace_store(),
        );
        let seed = format!("{}/", server.url());
        let report = crawler.run(&seed).await.unwrap();

        assert_eq!(report.visited, vec![seed]);
        assert_eq!(report.processed, 0);
        assert!(read_store(&report.store_path).is_empty());
    }

    #[tokio::test]
    async fn test_rerun_keeps_old_metadata() {
        let mut server = mockito::Server::new_async().await;
        let seed = format!("{}/", server.url());
        let _m = server
            .mock("GET", "/")
            .with_status(200)
            .with_body(page_with_links(&[]))
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let old_entry = serde_json::json!({"url": seed, "title": "from an earlier run"});
        let mut prior = Map::new();
        prior.insert(seed.clone(), old_entry.clone());
        std::fs::write(dir.path().join("urls.json"), Value::Object(prior).to_string()).unwrap();

        let keep = MergePolicy {
            add_urls: true,
            update_old_urls: false,
        };
        let mut crawler = crawler(
            dir.path(),
            UrlFilter::default(),
            options(1, 10),
            Publisher::disabled(),
            keep,
        );
        let report = crawler.run(&seed).await.unwrap();

        assert_eq!(report.processed, 1);
        let store = read_store(&report.store_path);
        assert_eq!(store[&seed], old_entry);
    }

    #[tokio::test]
    async fn test_save_failure_is_counted_but_not_published() {
        let mut server = mockito::Server::new_async().await;
        let seed = format!("{}/", server.url());
        let _m = server
            .mock("GET", "/")
            .with_status(200)
            .with_body(page_with_links(&[]))
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let channel = MemoryChannel::new();
        let mut crawler = crawler(
            dir.path(),
            UrlFilter::default(),
            options(1, 10),
            Publisher::new(Box::new(channel.clone())),
            replace_store(),
        );
        std::fs::create_dir(crawler.sink().path_for(&seed)).unwrap();

        let report = crawler.run(&seed).await.unwrap();

        assert_eq!(report.processed, 1);
        assert_eq!(report.files_written, 0);
        assert_eq!(report.published, 0);
        assert_eq!(channel.len(SCRAPER_QUEUE), 0);
        let store = read_store(&report.store_path);
        assert!(store.contains_key(&seed));
    }
}
