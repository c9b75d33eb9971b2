use anyhow::{Context, Result};
use clap::Parser;
use ownergraph::extract::{ingest_directory, KeywordAffiliationParser};
use ownergraph::{Config, Network, RelationType};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Parser, Debug)]
#[command(name = "stats")]
#[command(about = "Show the owners with the largest media holdings")]
struct Args {
    /// Number of owners to list
    #[arg(short, long, default_value_t = 20)]
    top: usize,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Default, Serialize)]
struct OwnerStats {
    id: String,
    name: String,
    direct_holdings: usize,
    direct_stake_total: f64,
    indirect_holdings: usize,
    indirect_stake_total: f64,
    family_ties: usize,
}

impl OwnerStats {
    fn holdings(&self) -> usize {
        self.direct_holdings + self.indirect_holdings
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let config = Config::load()?;

    let mut network = Network::new();
    ingest_directory(&mut network, config.html_dir(), &KeywordAffiliationParser)
        .with_context(|| format!("Failed to ingest {}", config.html_dir().display()))?;
    network.apply_indirect_ownership(&config.analysis.indirect_options());

    let mut stats: BTreeMap<&str, OwnerStats> = network
        .registry()
        .owners()
        .map(|owner| {
            (
                owner.id.as_str(),
                OwnerStats {
                    id: owner.id.clone(),
                    name: owner.name.clone(),
                    ..OwnerStats::default()
                },
            )
        })
        .collect();

    for rel in network.relationships().all() {
        let Some(entry) = stats.get_mut(rel.source_id.as_str()) else {
            continue;
        };
        match rel.relation_type {
            RelationType::Owns => {
                entry.direct_holdings += 1;
                entry.direct_stake_total += rel.percentage;
            }
            RelationType::IndirectOwns => {
                entry.indirect_holdings += 1;
                entry.indirect_stake_total += rel.percentage;
            }
            _ => entry.family_ties += 1,
        }
    }

    let mut ranked: Vec<OwnerStats> = stats.into_values().collect();
    ranked.sort_by(|a, b| {
        b.holdings()
            .cmp(&a.holdings())
            .then_with(|| b.direct_stake_total.total_cmp(&a.direct_stake_total))
            .then_with(|| a.id.cmp(&b.id))
    });
    ranked.truncate(args.top);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&ranked)?);
        return Ok(());
    }

    if ranked.is_empty() {
        println!("No owners found in {}.", config.html_dir().display());
        println!("\nRun `fetch` to download owner pages first.");
        return Ok(());
    }

    println!("\n=== Ownergraph Owner Statistics ===\n");
    println!(
        "Owners: {}  Companies/outlets: {}  Relationships: {}\n",
        network.registry().owner_count(),
        network.registry().entity_count(),
        network.relationships().len()
    );
    println!("{:-<96}", "");
    println!(
        "{:<36} {:>8} {:>12} {:>10} {:>14} {:>10}",
        "Owner", "Direct", "Direct %", "Indirect", "Indirect %", "Family"
    );
    println!("{:-<96}", "");
    for s in &ranked {
        println!(
            "{:<36} {:>8} {:>12.2} {:>10} {:>14.2} {:>10}",
            truncate(&s.name, 36),
            s.direct_holdings,
            s.direct_stake_total,
            s.indirect_holdings,
            s.indirect_stake_total,
            s.family_ties
        );
    }
    println!("{:-<96}", "");

    Ok(())
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let cut: String = text.chars().take(width.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}
