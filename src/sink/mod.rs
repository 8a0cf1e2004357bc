// src/sink/mod.rs
// =============================================================================
// The content sink: where extracted text and metadata end up.
//
// - save(): writes one text file per URL under the output directory, named
//   by a fixed URL -> filename transform, so the same URL always lands in
//   the same file
// - record(): remembers metadata for every URL whose extraction was tried
// - flush(): writes the metadata store once at the end of a crawl
//
// save() only reads &self so workers in the same batch can share the sink;
// record() and flush() are called by the crawl loop between batches.
// =============================================================================

mod metadata;

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::SinkError;

pub use metadata::{merge_store, DocumentMetadata, MergePolicy};

const TEXT_EXTENSION: &str = ".txt";

/// Maps a URL to the name of its text file.
///
/// Example:
///   "https://www.example.com/docs/page.html?x=1" -> "examplecomdocspagehtmlx=1.txt"
///   "http://localhost:8080/a" -> "localhost_8080a.txt"
pub fn output_file_name(url: &str) -> String {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    let rest = rest.strip_prefix("www.").unwrap_or(rest);

    let mut name: String = rest
        .chars()
        .filter(|c| !matches!(c, '/' | '.' | '?'))
        .map(|c| if c == ':' { '_' } else { c })
        .collect();
    name.push_str(TEXT_EXTENSION);
    name
}

pub struct ContentSink {
    output_dir: PathBuf,
    min_content_size: usize,
    store_name: String,
    metadata: BTreeMap<String, DocumentMetadata>,
}

impl ContentSink {
    /// Creates the output directory if needed.
    pub fn new(
        output_dir: &Path,
        min_content_size: usize,
        store_name: &str,
    ) -> Result<Self, SinkError> {
        std::fs::create_dir_all(output_dir).map_err(|source| SinkError::Io {
            path: output_dir.to_path_buf(),
            source,
        })?;
        // Envelopes carry absolute paths
        let output_dir = output_dir.canonicalize().map_err(|source| SinkError::Io {
            path: output_dir.to_path_buf(),
            source,
        })?;

        Ok(Self {
            output_dir,
            min_content_size,
            store_name: store_name.to_string(),
            metadata: BTreeMap::new(),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn path_for(&self, url: &str) -> PathBuf {
        self.output_dir.join(output_file_name(url))
    }

    pub fn store_path(&self) -> PathBuf {
        self.output_dir.join(&self.store_name)
    }

    /// Writes the trimmed text for `url`, overwriting any previous file.
    ///
    /// Returns the written path, or None when the text is too short to keep.
    pub async fn save(&self, text: &str, url: &str) -> Result<Option<PathBuf>, SinkError> {
        let text = text.trim();
        if text.chars().count() < self.min_content_size {
            return Ok(None);
        }

        let path = self.path_for(url);
        tokio::fs::write(&path, text)
            .await
            .map_err(|source| SinkError::Io {
                path: path.clone(),
                source,
            })?;
        Ok(Some(path))
    }

    /// Remembers metadata for a URL; a later record for the same URL replaces it.
    pub fn record(&mut self, metadata: DocumentMetadata) {
        self.metadata.insert(metadata.url.clone(), metadata);
    }

    /// Writes this run's metadata into the store according to `policy`.
    pub async fn flush(&self, policy: MergePolicy) -> Result<PathBuf, SinkError> {
        let path = self.store_path();

        let existing = if policy.add_urls {
            self.read_store(&path).await?
        } else {
            Map::new()
        };

        let mut current = Map::new();
        for (url, meta) in &self.metadata {
            let value = serde_json::to_value(meta).map_err(|source| SinkError::Json {
                path: path.clone(),
                source,
            })?;
            current.insert(url.clone(), value);
        }

        let merged = merge_store(existing, current, policy);
        let json = serde_json::to_string(&Value::Object(merged)).map_err(|source| {
            SinkError::Json {
                path: path.clone(),
                source,
            }
        })?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|source| SinkError::Io {
                path: path.clone(),
                source,
            })?;

        log::info!(
            "saved metadata for {} url(s) to {}",
            self.metadata.len(),
            path.display()
        );
        Ok(path)
    }

    async fn read_store(&self, path: &Path) -> Result<Map<String, Value>, SinkError> {
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(source) => {
                return Err(SinkError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        serde_json::from_str(&raw).map_err(|source| SinkError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}
