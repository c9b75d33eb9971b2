use super::Network;
use crate::graph::RelationGraph;
use crate::model::{Entity, Relationship};

/// Square percentage matrix over every node.
#[derive(Debug, Clone, PartialEq)]
pub struct AdjacencyMatrix {
    /// Row and column labels, sorted.
    pub ids: Vec<String>,
    /// `cells[i][j]` is the percentage of the latest edge from `ids[i]` to
    /// `ids[j]`, `None` when the pair has no edge.
    pub cells: Vec<Vec<Option<f64>>>,
}

impl AdjacencyMatrix {
    pub fn from_graph(graph: &RelationGraph) -> Self {
        let ids = graph.node_ids();
        let cells = ids
            .iter()
            .map(|source| {
                ids.iter()
                    .map(|target| graph.latest_edge(source, target).map(|e| e.percentage))
                    .collect()
            })
            .collect();
        Self { ids, cells }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn get(&self, source: &str, target: &str) -> Option<f64> {
        let i = self.ids.binary_search_by(|id| id.as_str().cmp(source)).ok()?;
        let j = self.ids.binary_search_by(|id| id.as_str().cmp(target)).ok()?;
        self.cells[i][j]
    }
}

/// Everything the exporters need, detached from the live network.
#[derive(Debug, Clone)]
pub struct AssembledNetwork {
    pub graph: RelationGraph,
    pub adjacency: AdjacencyMatrix,
    /// Store order: direct relationships as ingested, then indirect ones.
    pub relationships: Vec<Relationship>,
    /// Sorted by id.
    pub owners: Vec<Entity>,
    /// Sorted by id.
    pub entities: Vec<Entity>,
}

pub fn assemble(network: &Network) -> AssembledNetwork {
    let graph = network.graph().clone();
    let adjacency = AdjacencyMatrix::from_graph(&graph);
    AssembledNetwork {
        adjacency,
        relationships: network.relationships().all().to_vec(),
        owners: network.registry().owners().cloned().collect(),
        entities: network.registry().entities().cloned().collect(),
        graph,
    }
}
