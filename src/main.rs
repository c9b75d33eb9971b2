use anyhow::{Context, Result};
use clap::Parser;
use ownergraph::extract::{ingest_directory, KeywordAffiliationParser};
use ownergraph::{export, Config, Network, RelationType};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "ownergraph")]
#[command(about = "Build the media ownership network from saved owner pages and export it")]
struct Args {
    /// Directory of owner pages (overrides input.html_dir)
    #[arg(long)]
    html_dir: Option<PathBuf>,

    /// Export directory (overrides output.out_dir)
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load()?;

    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", config.input.log_level.as_str())
    ).init();

    if let Some(dir) = args.html_dir {
        config.input.html_dir = dir;
    }
    if let Some(dir) = args.out_dir {
        config.output.out_dir = dir;
    }

    log::info!("Starting Ownergraph v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Owner pages: {}", config.html_dir().display());
    log::info!("Export directory: {}", config.out_dir().display());

    if !config.html_dir().is_dir() {
        anyhow::bail!(
            "Owner page directory not found: {}. Run `fetch` first or set input.html_dir in config.toml.",
            config.html_dir().display()
        );
    }

    let start = Instant::now();
    let mut network = Network::new();

    let report = ingest_directory(&mut network, config.html_dir(), &KeywordAffiliationParser)
        .with_context(|| format!("Failed to ingest {}", config.html_dir().display()))?;

    if report.files_seen == 0 {
        log::warn!("No owner pages found. Check input.html_dir in config.toml.");
    }

    let options = config.analysis.indirect_options();
    log::info!(
        "Computing indirect ownership (max {} hops, threshold {}%)",
        options.max_hops,
        options.materiality_threshold
    );
    let indirect = network.apply_indirect_ownership(&options);

    let assembled = network.assemble();
    let summary = export::write_all(&assembled, &config.output)
        .with_context(|| format!("Failed to export to {}", config.out_dir().display()))?;

    let relationships = network.relationships();
    log::info!("=== Extraction Summary ===");
    log::info!(
        "Pages: {} seen, {} ingested, {} failed",
        report.files_seen,
        report.files_ingested,
        report.failed_files.len()
    );
    log::info!("Owners: {}", summary.owners);
    log::info!("Companies and outlets: {}", summary.entities);
    log::info!(
        "Relationships: {} ({} direct, {} indirect, {} family)",
        summary.relationships,
        relationships.count_of(RelationType::Owns),
        relationships.count_of(RelationType::IndirectOwns),
        summary.relationships
            - relationships.count_of(RelationType::Owns)
            - relationships.count_of(RelationType::IndirectOwns)
    );
    log::info!(
        "Indirect pass: {} pairs evaluated, {} failures",
        indirect.pairs_evaluated,
        indirect.failures.len()
    );
    log::info!("Skipped or degraded records: {}", report.issues.len());
    for (path, e) in &report.failed_files {
        log::warn!("  {}: {}", path, e);
    }
    log::info!("Done in {:.2}s", start.elapsed().as_secs_f64());

    Ok(())
}
