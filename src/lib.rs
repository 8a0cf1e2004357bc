// src/lib.rs
// =============================================================================
// site-harvester: crawl a website breadth-first, extract page and document
// text, and hand each written file to a downstream pipeline.
//
// Modules:
// - crawl: frontier, fetch-and-extract workers, URL filtering
// - extract: HTML and PDF text extraction
// - sink: text files and the metadata store
// - pipeline: publishing {"file_path": ...} envelopes
// - settings / logging / error: configuration, log setup, error types
//
// The binary in main.rs wires these together from the settings file and
// CLI flags; embedders can build a Crawler directly.
// =============================================================================

pub mod crawl;
pub mod error;
pub mod extract;
pub mod logging;
pub mod pipeline;
pub mod settings;
pub mod sink;

pub use crawl::{CrawlOptions, CrawlReport, Crawler, UrlTask, Worker};
pub use error::{CrawlError, ExtractError, FetchError, PublishError, SinkError};
pub use settings::Settings;
