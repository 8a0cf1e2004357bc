// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Load the settings file and apply the flag overrides
// 3. Build the filter, worker, sink and publisher, then run the crawl
// 4. Print a summary and exit (0 = crawl finished, 2 = error)
// =============================================================================

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use std::path::Path;

use site_harvester::crawl::fetch::build_client;
use site_harvester::crawl::filter::UrlFilter;
use site_harvester::logging::init_logging;
use site_harvester::pipeline::{Channel, Publisher, SpoolChannel};
use site_harvester::sink::{ContentSink, MergePolicy};
use site_harvester::{CrawlOptions, CrawlReport, Crawler, Settings, Worker};

// A single-threaded runtime is enough: workers spend their time waiting on
// the network, and the batch join keeps the shared state on one task.
#[tokio::main(flavor = "current_thread")]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // {:#} prints the whole context chain on one line
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    let mut settings = Settings::load(&cli.settings)?;
    cli.apply(&mut settings);
    init_logging(settings.launch.log, cli.verbose);
    if !cli.settings.exists() {
        log::info!(
            "settings file {} not found, using defaults",
            cli.settings.display()
        );
    }
    settings.validate()?;

    let excluded_files = settings.excluded_files()?;
    let filter = UrlFilter::new(
        settings.ignored_domains.clone(),
        settings.required_domains.clone(),
        excluded_files,
        settings.reject_http,
        &settings.medias,
    );
    let options = CrawlOptions::from_settings(&settings);
    let client = build_client().context("failed to build the HTTP client")?;
    let worker = Worker::new(client, filter, options);

    let sink = ContentSink::new(
        &settings.launch.output,
        settings.min_content_size,
        &settings.urls_policy.urls_file_name,
    )?;

    let use_pipeline = settings.pipeline_settings.use_pipeline;
    let channel: Option<Box<dyn Channel>> = if use_pipeline {
        let spool = SpoolChannel::open(&settings.pipeline_settings.spool_dir).await?;
        Some(Box::new(spool))
    } else {
        None
    };
    let publisher = Publisher::from_settings(use_pipeline, channel)?;

    let merge_policy = MergePolicy {
        add_urls: settings.urls_policy.add_urls,
        update_old_urls: settings.urls_policy.update_old_urls,
    };

    println!("🔍 Crawling: {}", settings.launch.base_url);
    println!(
        "📊 Max depth: {}, max urls: {}",
        settings.launch.depth, settings.launch.max_urls
    );

    let mut crawler = Crawler::new(worker, sink, publisher, merge_policy);
    let report = crawler
        .run(&settings.launch.base_url)
        .await
        .context("crawl aborted")?;

    print_report(&report, crawler.sink().output_dir(), cli.json)?;
    Ok(0)
}

// Prints the crawl summary either as text or JSON
fn print_report(report: &CrawlReport, output_dir: &Path, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("📄 Processed {} url(s)", report.processed);
    println!(
        "💾 Wrote {} file(s) to {}",
        report.files_written,
        output_dir.display()
    );
    if report.published > 0 {
        println!("📨 Published {} file(s)", report.published);
    }
    println!("🗂  Metadata: {}", report.store_path.display());
    Ok(())
}
