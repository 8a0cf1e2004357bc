// src/sink/metadata.rs
// =============================================================================
// Per-URL metadata records and the merge rules of the metadata store.
//
// The store is a JSON object: url -> record. Old stores written by earlier
// versions may carry fewer fields, so merging works on raw JSON values and
// never rewrites an entry it keeps.
// =============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::extract::{DocFormat, PageHeadings};

/// What we know about one processed URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub url: String,
    pub title: Option<String>,
    pub h1: Option<String>,
    pub h2: Option<String>,
    pub h3: Option<String>,
    pub h4: Option<String>,
    pub h5: Option<String>,
    pub h6: Option<String>,
    /// Anchor text of the link this URL was discovered through
    #[serde(rename = "input_url_name")]
    pub input_anchor_name: Option<String>,
    pub format: DocFormat,
}

impl DocumentMetadata {
    pub fn new(
        url: &str,
        input_anchor_name: Option<String>,
        format: DocFormat,
        headings: PageHeadings,
    ) -> Self {
        let [h1, h2, h3, h4, h5, h6] = headings.levels;
        Self {
            url: url.to_string(),
            title: headings.title,
            h1,
            h2,
            h3,
            h4,
            h5,
            h6,
            input_anchor_name,
            format,
        }
    }
}

/// How the current run's records combine with an existing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergePolicy {
    /// Keep the existing store's records (otherwise it is replaced)
    pub add_urls: bool,
    /// On a key collision the current run wins (otherwise the old record stays)
    pub update_old_urls: bool,
}

/// Combines an existing store with the current run's records.
pub fn merge_store(
    existing: Map<String, Value>,
    current: Map<String, Value>,
    policy: MergePolicy,
) -> Map<String, Value> {
    if !policy.add_urls {
        return current;
    }

    if policy.update_old_urls {
        let mut merged = existing;
        merged.extend(current);
        merged
    } else {
        let mut merged = current;
        merged.extend(existing);
        merged
    }
}
