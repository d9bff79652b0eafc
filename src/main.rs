use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::sync::Arc;

use download_bucket::cli::{Cli, CloneArgs, Command};
use download_bucket::config::{mask_key, Config};
use download_bucket::download::{DownloadResult, Downloader, ProgressEvent};
use download_bucket::error::EngineError;
use download_bucket::logging;
use download_bucket::providers::create_provider;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Command::Clone(args) => clone(&config, args).await,
        Command::Providers => {
            list_providers(&config);
            Ok(())
        }
    }
}

async fn clone(config: &Config, args: CloneArgs) -> Result<()> {
    let provider_config = config.resolve(&args.overrides())?;
    let provider = create_provider(&provider_config)?;

    let downloader = Downloader::new(Arc::from(provider), args.downloader_options());

    let cancel = downloader.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling download");
            cancel.cancel();
        }
    });

    if !args.json {
        println!(
            "Downloading {}/{} to {} with {} workers",
            provider_config.bucket,
            args.prefix,
            args.destination.display(),
            downloader.concurrency()
        );
    }

    let outcome = downloader
        .download_folder_with_progress(&args.prefix, &args.destination, report_progress)
        .await;

    if let Err(e) = downloader.close().await {
        warn!("failed to close provider: {}", e);
    }

    match outcome {
        Ok(result) => {
            print_summary(&result, args.json)?;
            Ok(())
        }
        Err(EngineError::PartialFailure(result)) => {
            print_summary(&result, args.json)?;
            anyhow::bail!("download completed with {} errors", result.errors.len())
        }
        Err(e) => Err(e).context("download failed"),
    }
}

fn report_progress(event: &ProgressEvent) {
    match &event.error {
        None => info!("downloaded {} ({} bytes)", event.key, event.bytes_downloaded),
        Some(e) => warn!("failed {}: {}", event.key, e),
    }
}

fn print_summary(result: &DownloadResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&result.summary())?);
        return Ok(());
    }

    println!();
    println!("Download completed:");
    println!("  Files: {} total", result.total_files);
    println!("  Successful: {}", result.successful_files);
    println!("  Failed: {}", result.failed_files);
    println!(
        "  Size: {:.2} MB",
        result.total_bytes as f64 / (1024.0 * 1024.0)
    );
    println!("  Duration: {:.2?}", result.duration);

    if result.has_errors() {
        println!();
        println!("Errors:");
        for e in &result.errors {
            println!("  - {}", e);
        }
    }
    Ok(())
}

fn list_providers(config: &Config) {
    if config.providers.is_empty() {
        println!("No providers configured");
        return;
    }

    println!("Configured providers:");
    for (name, provider) in &config.providers {
        println!();
        println!("  {}:", name);
        println!("    Type: {}", provider.provider_type);
        println!("    Region: {}", provider.region);
        if let Some(endpoint) = &provider.endpoint {
            println!("    Endpoint: {}", endpoint);
        }
        if !provider.bucket.is_empty() {
            println!("    Bucket: {}", provider.bucket);
        }
        println!("    Access Key: {}", mask_key(&provider.access_key));
    }
}
