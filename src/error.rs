// src/error.rs
// =============================================================================
// Error types for the crawl core.
//
// Every failure a single task can hit (fetch, extract, save) has its own
// enum so the worker can log it and move on. Only publisher and metadata
// store failures escape the crawl loop as a CrawlError.
//
// The application edge (main.rs, settings.rs) keeps using anyhow.
// =============================================================================

use std::path::PathBuf;
use thiserror::Error;

/// Failure while fetching a URL over HTTP.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request error for url='{url}': {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("error response for url='{url}': status={status}")]
    Status { url: String, status: u16 },

    #[error("second redirect for url='{url}' (to '{location}')")]
    TooManyRedirects { url: String, location: String },

    #[error("redirect without a usable Location header for url='{url}'")]
    MissingLocation { url: String },

    #[error("failed to read body of url='{url}': {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Failure while turning fetched bytes into text and links.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("empty body in html document")]
    EmptyBody,

    #[error("unreadable pdf: {0}")]
    Pdf(#[from] lopdf::Error),
}

/// Failure while persisting text files or the metadata store.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid metadata store '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure while announcing a written file downstream.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("pipeline mode is enabled but no channel was initialized")]
    NotInitialized,

    #[error("channel error on queue '{queue}': {message}")]
    Channel { queue: String, message: String },

    #[error("failed to encode envelope: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Failure that stops the whole crawl.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}
