// src/settings.rs
// =============================================================================
// Crawl settings loaded from a JSON file.
//
// The file mirrors what the crawl core needs:
// - urls_policy: only-urls mode and how the metadata store is merged
// - filters: reject plain http, media extensions, ignored/required domains
// - pipeline_settings: whether to announce files and where the spool lives
// - launch: defaults for the CLI flags (seed, quota, depth, output dir)
//
// Every field has a default so a partial (or missing) file still works.
// CLI flags are applied on top in main.rs.
// =============================================================================

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// How the run treats URLs and the metadata store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UrlsPolicy {
    /// Discover links only; never write page text
    pub only_urls: bool,
    /// Merge this run's metadata into the existing store instead of replacing it
    pub add_urls: bool,
    /// File name of the metadata store inside the output directory
    pub urls_file_name: String,
    /// On a merge, let this run's entries replace existing ones
    pub update_old_urls: bool,
}

impl Default for UrlsPolicy {
    fn default() -> Self {
        Self {
            only_urls: false,
            add_urls: false,
            urls_file_name: "urls.json".to_string(),
            update_old_urls: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub use_pipeline: bool,
    /// Directory holding the outbound queue spool files
    pub spool_dir: PathBuf,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            use_pipeline: false,
            spool_dir: PathBuf::from("queue"),
        }
    }
}

/// Defaults for the launch flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchSettings {
    pub base_url: String,
    pub max_urls: usize,
    pub depth: usize,
    pub output: PathBuf,
    pub log: bool,
}

impl Default for LaunchSettings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            max_urls: 100,
            depth: 2,
            output: PathBuf::from("data"),
            log: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub urls_policy: UrlsPolicy,
    pub reject_http: bool,
    pub load_pdf: bool,
    pub medias: Vec<String>,
    pub ignored_domains: Vec<String>,
    pub required_domains: Vec<String>,
    pub min_content_size: usize,
    pub pipeline_settings: PipelineSettings,
    pub launch: LaunchSettings,
    pub exclude_dirs: Vec<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            urls_policy: UrlsPolicy::default(),
            reject_http: false,
            load_pdf: true,
            medias: ["png", "jpg", "jpeg", "gif", "svg", "webp", "ico", "mp3", "mp4", "avi", "zip", "rar", "gz", "tar", "7z", "exe", "dmg"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            ignored_domains: Vec::new(),
            required_domains: Vec::new(),
            min_content_size: 50,
            pipeline_settings: PipelineSettings::default(),
            launch: LaunchSettings::default(),
            exclude_dirs: Vec::new(),
        }
    }
}

impl Settings {
    /// Loads settings from a JSON file.
    ///
    /// A missing file is not an error: the defaults are used instead.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("invalid settings file {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(raw)?;
        Ok(settings)
    }

    /// Checks the launch parameters before a crawl starts.
    pub fn validate(&self) -> Result<()> {
        if self.launch.depth < 1 {
            return Err(anyhow!(
                "invalid depth={}, should be a positive value",
                self.launch.depth
            ));
        }
        if self.launch.max_urls < 1 {
            return Err(anyhow!(
                "invalid max_urls={}, should be a positive value",
                self.launch.max_urls
            ));
        }
        if self.launch.base_url.trim().is_empty() {
            return Err(anyhow!("base url is empty"));
        }
        for dir in &self.exclude_dirs {
            fs::read_dir(dir)
                .with_context(|| format!("invalid exclude directory={}", dir.display()))?;
        }
        Ok(())
    }

    /// Collects the file names already produced in the exclude directories.
    pub fn excluded_files(&self) -> Result<HashSet<String>> {
        let mut files = HashSet::new();
        for dir in &self.exclude_dirs {
            let entries = fs::read_dir(dir)
                .with_context(|| format!("invalid exclude directory={}", dir.display()))?;
            for entry in entries {
                let entry = entry?;
                files.insert(entry.file_name().to_string_lossy().into_owned());
            }
        }
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let settings = Settings::from_json(r#"{"reject_http": true, "urls_policy": {"only_urls": true}}"#).unwrap();
        assert!(settings.reject_http);
        assert!(settings.urls_policy.only_urls);
        assert_eq!(settings.urls_policy.urls_file_name, "urls.json");
        assert_eq!(settings.min_content_size, 50);
        assert!(settings.medias.contains(&"png".to_string()));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_validate_rejects_zero_depth() {
        let mut settings = Settings::default();
        settings.launch.base_url = "example.com".to_string();
        settings.launch.depth = 0;
        assert!(settings.validate().is_err());

        settings.launch.depth = 1;
        settings.launch.max_urls = 0;
        assert!(settings.validate().is_err());

        settings.launch.max_urls = 3;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unreadable_exclude_dir() {
        let mut settings = Settings::default();
        settings.launch.base_url = "example.com".to_string();
        settings.exclude_dirs = vec![PathBuf::from("/definitely/not/here")];
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_excluded_files_unions_directories() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        fs::write(a.path().join("examplecom.txt"), "x").unwrap();
        fs::write(b.path().join("examplecomdocs.txt"), "y").unwrap();

        let mut settings = Settings::default();
        settings.exclude_dirs = vec![a.path().to_path_buf(), b.path().to_path_buf()];
        let files = settings.excluded_files().unwrap();

        assert_eq!(files.len(), 2);
        assert!(files.contains("examplecom.txt"));
        assert!(files.contains("examplecomdocs.txt"));
    }
}
