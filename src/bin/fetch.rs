use anyhow::{Context, Result};
use clap::Parser;
use ownergraph::fetch::PageFetcher;
use ownergraph::Config;
use std::path::PathBuf;
use std::time::Instant;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "fetch")]
#[command(about = "Download owner detail pages into the input directory")]
struct Args {
    /// Listing page to start from (overrides fetch.listing_url)
    #[arg(long)]
    listing_url: Option<String>,

    /// Where to store pages (overrides input.html_dir)
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Re-download pages already recorded in the manifest
    #[arg(short, long)]
    force: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", "info")
    ).init();

    let args = Args::parse();
    let config = Config::load()?;

    let listing = args
        .listing_url
        .unwrap_or_else(|| config.fetch.listing_url.clone());
    let listing = Url::parse(&listing)
        .with_context(|| format!("Invalid listing URL: {}", listing))?;
    let out_dir = args.out_dir.unwrap_or_else(|| config.html_dir().to_path_buf());

    log::info!("Fetching owner pages from {}", listing);
    log::info!("Output directory: {}", out_dir.display());
    if args.force {
        log::info!("Mode: forced re-download");
    }

    let start = Instant::now();
    let fetcher = PageFetcher::new(&config.fetch)?;
    let report = fetcher
        .fetch_all(&listing, &config.fetch.link_pattern, &out_dir, args.force)
        .await
        .context("Fetch failed")?;

    log::info!("=== Fetch Summary ===");
    log::info!("Detail pages found: {}", report.discovered);
    log::info!("Written: {}", report.written);
    log::info!("Skipped (already fetched): {}", report.skipped);
    log::info!("Unchanged: {}", report.unchanged);
    log::info!("Failed: {}", report.failed.len());
    for (url, e) in &report.failed {
        log::warn!("  {}: {}", url, e);
    }
    log::info!("Done in {:.2}s", start.elapsed().as_secs_f64());

    Ok(())
}
