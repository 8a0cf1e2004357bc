// src/crawl/fetch.rs
// =============================================================================
// This module downloads one URL for the crawl worker.
//
// Redirect handling is manual: the client never follows redirects by
// itself. A 3xx answer is followed exactly one hop to its Location; the
// second answer must be a success. A redirect chain longer than that, or
// any non-2xx status, is a FetchError.
//
// Web pages are decoded to UTF-8 using the charset the server declares in
// Content-Type (UTF-8 when none is given). Documents keep their raw bytes.
//
// There are no retries. A failed fetch costs only that one task.
// =============================================================================

use reqwest::header::LOCATION;
use reqwest::{redirect, Client, Response};
use std::time::Duration;
use url::Url;

use crate::error::FetchError;
use crate::extract::DocFormat;

/// Per-request timeout, connect + body.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// A successful download.
#[derive(Debug, Clone)]
pub struct Fetched {
    /// URL the body was finally served from (differs after a redirect)
    pub final_url: String,
    /// UTF-8 text for web pages, raw bytes for documents
    pub body: Vec<u8>,
}

/// Builds the shared HTTP client used by all workers.
///
/// Cloning a reqwest Client is cheap (it's an Arc internally), so one
/// client keeps one connection pool for the whole crawl.
pub fn build_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(FETCH_TIMEOUT)
        .redirect(redirect::Policy::none())
        .build()
}

/// Fetches `url`, following at most one redirect.
pub async fn fetch(client: &Client, url: &str, format: DocFormat) -> Result<Fetched, FetchError> {
    let mut final_url = url.to_string();
    let mut response = send(client, url).await?;

    if response.status().is_redirection() {
        let location = redirect_target(&response, url)?;
        log::debug!("{} redirects to {}", url, location);

        response = send(client, &location).await?;
        if response.status().is_redirection() {
            return Err(FetchError::TooManyRedirects {
                url: url.to_string(),
                location,
            });
        }
        final_url = location;
    }

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: final_url,
            status: status.as_u16(),
        });
    }

    let body = match format {
        DocFormat::Html => response.text().await.map(String::into_bytes),
        DocFormat::Pdf => response.bytes().await.map(|bytes| bytes.to_vec()),
    }
    .map_err(|source| FetchError::Body {
        url: final_url.clone(),
        source,
    })?;

    Ok(Fetched { final_url, body })
}

async fn send(client: &Client, url: &str) -> Result<Response, FetchError> {
    client
        .get(url)
        .send()
        .await
        .map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })
}

// Reads the Location header and resolves it against the request URL,
// since servers often send relative locations like "/new-page"
fn redirect_target(response: &Response, url: &str) -> Result<String, FetchError> {
    let missing = || FetchError::MissingLocation {
        url: url.to_string(),
    };

    let location = response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(missing)?;

    let base = Url::parse(url).map_err(|_| missing())?;
    let target = base.join(location).map_err(|_| missing())?;
    Ok(target.to_string())
}
