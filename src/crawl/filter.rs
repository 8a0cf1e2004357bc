// src/crawl/filter.rs
// =============================================================================
// URL normalization and filtering.
//
// Every link found on a page passes through here before it can become a
// crawl task:
// 1. normalize(): resolve against the page URL, percent-decode, drop #fragment
// 2. is_http(): only http/https links are crawlable
// 3. classify(): ignored domains, required domains, excluded output files
//    and already-seen URLs are rejected
//
// Domain checks are plain substring matches on the whole URL, not hostname
// comparisons. Ignoring "t.me" therefore also ignores "target.me".
// =============================================================================

use std::collections::HashSet;
use url::Url;

use crate::sink::output_file_name;

/// Why a discovered URL was not accepted into the frontier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    IgnoredDomain,
    MissingRequiredDomain,
    Excluded,
    AlreadySeen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject(RejectReason),
}

impl Verdict {
    pub fn is_accept(&self) -> bool {
        matches!(self, Verdict::Accept)
    }
}

/// Resolves `href` against `base`, percent-decodes it and strips any fragment.
///
/// Returns None when the reference cannot be resolved to a URL at all.
///
/// Example:
///   base = "https://example.com/docs/"
///   href = "intro%20page#top" -> Some("https://example.com/docs/intro page")
pub fn normalize(href: &str, base: &Url) -> Option<String> {
    let joined = base.join(href.trim()).ok()?;
    Some(strip_fragment(&decode(joined.as_str())))
}

/// Normalizes the seed URL given on the command line.
///
/// Adds "https://" when no http(s) scheme is present, then applies the same
/// decoding and fragment stripping as normalize().
pub fn normalize_seed(seed: &str) -> String {
    let seed = decode(seed.trim());
    let seed = if seed.starts_with("http://") || seed.starts_with("https://") {
        seed
    } else {
        format!("https://{}", seed)
    };

    match Url::parse(&seed) {
        Ok(url) => strip_fragment(&decode(url.as_str())),
        Err(_) => strip_fragment(&seed),
    }
}

/// True for http and https URLs.
pub fn is_http(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

/// Lowercased file extension of the URL's last path segment, if any.
pub fn url_extension(url: &str) -> Option<String> {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        // Fall back to the raw string minus any query
        Err(_) => url.split(['?', '#']).next().unwrap_or(url).to_string(),
    };
    let segment = path.rsplit('/').next()?;
    let (_, ext) = segment.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

fn decode(url: &str) -> String {
    // Invalid UTF-8 after decoding: keep the encoded form
    match urlencoding::decode(url) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => url.to_string(),
    }
}

fn strip_fragment(url: &str) -> String {
    match url.find('#') {
        Some(idx) => url[..idx].to_string(),
        None => url.to_string(),
    }
}

/// The filtering rules of one crawl.
#[derive(Debug, Clone, Default)]
pub struct UrlFilter {
    ignored_domains: Vec<String>,
    required_domains: Vec<String>,
    excluded_files: HashSet<String>,
    reject_http: bool,
    medias: HashSet<String>,
}

impl UrlFilter {
    pub fn new(
        ignored_domains: Vec<String>,
        required_domains: Vec<String>,
        excluded_files: HashSet<String>,
        reject_http: bool,
        medias: &[String],
    ) -> Self {
        Self {
            ignored_domains,
            required_domains,
            excluded_files,
            reject_http,
            medias: medias.iter().map(|m| m.to_ascii_lowercase()).collect(),
        }
    }

    /// Decides whether a normalized URL may enter the frontier.
    pub fn classify(&self, url: &str, seen: &HashSet<String>) -> Verdict {
        if self.ignored_domains.iter().any(|d| url.contains(d.as_str())) {
            return Verdict::Reject(RejectReason::IgnoredDomain);
        }
        if !self.required_domains.is_empty()
            && !self.required_domains.iter().any(|d| url.contains(d.as_str()))
        {
            return Verdict::Reject(RejectReason::MissingRequiredDomain);
        }
        if self.excluded_files.contains(&output_file_name(url)) {
            return Verdict::Reject(RejectReason::Excluded);
        }
        if seen.contains(url) {
            return Verdict::Reject(RejectReason::AlreadySeen);
        }
        Verdict::Accept
    }

    /// Plain-http URLs are dropped when reject_http is on.
    pub fn is_rejected_scheme(&self, url: &str) -> bool {
        self.reject_http && url.starts_with("http://")
    }

    pub fn is_media(&self, url: &str) -> bool {
        match url_extension(url) {
            Some(ext) => self.medias.contains(&ext),
            None => false,
        }
    }
}
