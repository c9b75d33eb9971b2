//! File export of an assembled network.

pub mod graphml;
pub mod tables;

pub use graphml::write_graphml;
pub use tables::{write_adjacency, write_entities, write_relationships};

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::config::OutputConfig;
use crate::error::Result;
use crate::network::AssembledNetwork;

/// Paths written by [`write_all`] plus the row counts behind them.
#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub files: Vec<PathBuf>,
    pub relationships: usize,
    pub owners: usize,
    pub entities: usize,
    pub nodes: usize,
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    Ok(BufWriter::new(File::create(path)?))
}

/// Write all five artifacts into `output.out_dir`, creating it if needed.
pub fn write_all(network: &AssembledNetwork, output: &OutputConfig) -> Result<ExportSummary> {
    std::fs::create_dir_all(&output.out_dir)?;
    let dir = output.out_dir.as_path();

    let relationships_path = dir.join(&output.relationships_file);
    write_relationships(create(&relationships_path)?, &network.relationships)?;
    log::info!(
        "Wrote {} relationships to {}",
        network.relationships.len(),
        relationships_path.display()
    );

    let owners_path = dir.join(&output.owners_file);
    write_entities(create(&owners_path)?, &network.owners)?;
    log::info!("Wrote {} owners to {}", network.owners.len(), owners_path.display());

    let entities_path = dir.join(&output.entities_file);
    write_entities(create(&entities_path)?, &network.entities)?;
    log::info!("Wrote {} entities to {}", network.entities.len(), entities_path.display());

    let adjacency_path = dir.join(&output.adjacency_file);
    write_adjacency(create(&adjacency_path)?, &network.adjacency)?;
    log::info!(
        "Wrote {}x{} adjacency matrix to {}",
        network.adjacency.len(),
        network.adjacency.len(),
        adjacency_path.display()
    );

    let graphml_path = dir.join(&output.graphml_file);
    write_graphml(create(&graphml_path)?, &network.graph)?;
    log::info!(
        "Wrote network graph ({} nodes, {} edges) to {}",
        network.graph.node_count(),
        network.graph.edge_count(),
        graphml_path.display()
    );

    Ok(ExportSummary {
        files: vec![
            relationships_path,
            owners_path,
            entities_path,
            adjacency_path,
            graphml_path,
        ],
        relationships: network.relationships.len(),
        owners: network.owners.len(),
        entities: network.entities.len(),
        nodes: network.graph.node_count(),
    })
}
