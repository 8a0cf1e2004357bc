// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Every flag is optional: the settings file provides the defaults and a
// flag given on the command line overrides the matching setting.
// =============================================================================

use clap::{ArgAction, Parser};
use std::path::PathBuf;

use site_harvester::Settings;

#[derive(Parser, Debug)]
#[command(
    name = "site-harvester",
    version = "0.1.0",
    about = "Crawl a website and extract page and document text",
    long_about = "site-harvester crawls a website breadth-first from a base URL, saves the text of \
                  every page and PDF it finds, and optionally announces each file to a downstream \
                  pipeline queue."
)]
pub struct Cli {
    /// Settings file (JSON); missing files fall back to defaults
    #[arg(long, default_value = "settings.json")]
    pub settings: PathBuf,

    /// Base url to start extracting content from
    #[arg(long)]
    pub base_url: Option<String>,

    /// Maximum count of urls to extract content from
    #[arg(long)]
    pub max_urls: Option<usize>,

    /// Maximum depth of passage through child urls (1 = just the base url)
    #[arg(long)]
    pub depth: Option<usize>,

    /// Directory to store the generated documents
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Enable progress logging (true/false)
    #[arg(long, action = ArgAction::Set)]
    pub log: Option<bool>,

    /// Directories with already processed files; urls mapping to them are skipped
    #[arg(long, num_args = 0..)]
    pub exclude_dirs: Option<Vec<PathBuf>>,

    /// Urls containing any of these strings are ignored (added to the settings list)
    #[arg(long, num_args = 0..)]
    pub ignored_domains: Option<Vec<String>>,

    /// Only urls containing at least one of these strings are crawled
    #[arg(long, num_args = 0..)]
    pub required_domains: Option<Vec<String>>,

    /// Announce written files on the pipeline queue (true/false)
    #[arg(long, action = ArgAction::Set)]
    pub use_pipeline: Option<bool>,

    /// Print the crawl report as JSON
    #[arg(long)]
    pub json: bool,

    /// Debug-level logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Applies command-line overrides on top of the loaded settings.
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(base_url) = &self.base_url {
            settings.launch.base_url = base_url.clone();
        }
        if let Some(max_urls) = self.max_urls {
            settings.launch.max_urls = max_urls;
        }
        if let Some(depth) = self.depth {
            settings.launch.depth = depth;
        }
        if let Some(output) = &self.output {
            settings.launch.output = output.clone();
        }
        if let Some(log) = self.log {
            settings.launch.log = log;
        }
        if let Some(dirs) = &self.exclude_dirs {
            settings.exclude_dirs = dirs.clone();
        }
        if let Some(domains) = &self.ignored_domains {
            for domain in domains {
                if !settings.ignored_domains.contains(domain) {
                    settings.ignored_domains.push(domain.clone());
                }
            }
        }
        if let Some(domains) = &self.required_domains {
            settings.required_domains = domains.clone();
        }
        if let Some(use_pipeline) = self.use_pipeline {
            settings.pipeline_settings.use_pipeline = use_pipeline;
        }
    }
}
