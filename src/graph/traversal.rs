//! Owns-only graph and bounded simple-path enumeration.

use petgraph::algo::{all_simple_paths, has_path_connecting};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

/// Directed graph of direct `owns` edges weighted by percentage.
#[derive(Debug, Clone, Default)]
pub struct OwnershipGraph {
    graph: DiGraph<String, f64>,
    index: HashMap<String, NodeIndex>,
}

impl OwnershipGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn node(&mut self, id: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(id) {
            return idx;
        }
        let idx = self.graph.add_node(id.to_string());
        self.index.insert(id.to_string(), idx);
        idx
    }

    /// Add an ownership edge, replacing any earlier stake for the pair.
    pub fn add_edge(&mut self, source: &str, target: &str, percentage: f64) {
        let a = self.node(source);
        let b = self.node(target);
        self.graph.update_edge(a, b, percentage);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    fn endpoints(&self, source: &str, target: &str) -> Option<(NodeIndex, NodeIndex)> {
        Some((*self.index.get(source)?, *self.index.get(target)?))
    }

    pub fn has_edge(&self, source: &str, target: &str) -> bool {
        self.endpoints(source, target)
            .map(|(a, b)| self.graph.find_edge(a, b).is_some())
            .unwrap_or(false)
    }

    /// Stake held by `source` directly in `target`.
    pub fn percentage(&self, source: &str, target: &str) -> Option<f64> {
        let (a, b) = self.endpoints(source, target)?;
        self.graph.find_edge(a, b).map(|edge| self.graph[edge])
    }

    /// Whether any directed path of any length leads from `source` to `target`.
    pub fn has_path(&self, source: &str, target: &str) -> bool {
        match self.endpoints(source, target) {
            Some((a, b)) => has_path_connecting(&self.graph, a, b, None),
            None => false,
        }
    }

    /// Lazily enumerate simple paths from `source` to `target` with at most
    /// `max_hops` edges. Each path lists node ids from source to target.
    pub fn simple_paths<'a>(
        &'a self,
        source: &str,
        target: &str,
        max_hops: usize,
    ) -> Box<dyn Iterator<Item = Vec<String>> + 'a> {
        let ends = self
            .endpoints(source, target)
            .filter(|(a, b)| a != b && max_hops > 0);

        let Some((a, b)) = ends else {
            return Box::new(std::iter::empty());
        };

        let paths = all_simple_paths::<Vec<NodeIndex>, _>(&self.graph, a, b, 0, Some(max_hops - 1));
        Box::new(paths.map(move |path| {
            path.into_iter()
                .map(|idx| self.graph[idx].clone())
                .collect()
        }))
    }
}
