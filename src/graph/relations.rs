//! Directed relation graph over all entities.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{BTreeSet, HashMap};

use super::OwnershipGraph;
use crate::error::{OwnergraphError, Result};
use crate::model::{Entity, RelationType};

/// Attributes of one typed edge.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeAttrs {
    pub relation_type: RelationType,
    pub percentage: f64,
    pub description: String,
}

/// All typed edges between one ordered pair, oldest write first.
#[derive(Debug, Clone, Default)]
struct PairEdges {
    edges: Vec<EdgeAttrs>,
}

impl PairEdges {
    fn upsert(&mut self, attrs: EdgeAttrs) {
        self.edges.retain(|e| e.relation_type != attrs.relation_type);
        self.edges.push(attrs);
    }

    fn get(&self, relation_type: RelationType) -> Option<&EdgeAttrs> {
        self.edges.iter().find(|e| e.relation_type == relation_type)
    }

    fn latest(&self) -> Option<&EdgeAttrs> {
        self.edges.last()
    }
}

/// Entities as nodes, relationships as edges.
///
/// A pair holds at most one edge per [`RelationType`]; adding the same type
/// again overwrites its attributes and marks it as the pair's latest write.
#[derive(Debug, Clone, Default)]
pub struct RelationGraph {
    graph: DiGraph<Entity, PairEdges>,
    index: HashMap<String, NodeIndex>,
}

impl RelationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node, or overwrite the attributes of the node with the same id.
    pub fn upsert_node(&mut self, entity: Entity) {
        let existing = self.index.get(&entity.id).copied();
        match existing {
            Some(idx) => self.graph[idx] = entity,
            None => {
                let id = entity.id.clone();
                let idx = self.graph.add_node(entity);
                self.index.insert(id, idx);
            }
        }
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&Entity> {
        self.index.get(id).map(|&idx| &self.graph[idx])
    }

    /// Node ids in sorted order.
    pub fn node_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.index.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of typed edges (a pair with two types counts twice).
    pub fn edge_count(&self) -> usize {
        self.graph.edge_weights().map(|pair| pair.edges.len()).sum()
    }

    /// Add or overwrite the `relation_type` edge from `source` to `target`.
    ///
    /// Both endpoints must already be nodes.
    pub fn add_edge(
        &mut self,
        source: &str,
        target: &str,
        relation_type: RelationType,
        percentage: f64,
        description: impl Into<String>,
    ) -> Result<()> {
        let (a, b) = match (self.index.get(source), self.index.get(target)) {
            (Some(&a), Some(&b)) => (a, b),
            _ => {
                return Err(OwnergraphError::MalformedEntityReference {
                    source_id: source.to_string(),
                    target_id: target.to_string(),
                })
            }
        };

        let attrs = EdgeAttrs {
            relation_type,
            percentage,
            description: description.into(),
        };

        match self.graph.find_edge(a, b) {
            Some(edge) => self.graph[edge].upsert(attrs),
            None => {
                self.graph.add_edge(a, b, PairEdges { edges: vec![attrs] });
            }
        }
        Ok(())
    }

    fn pair(&self, source: &str, target: &str) -> Option<&PairEdges> {
        let a = *self.index.get(source)?;
        let b = *self.index.get(target)?;
        self.graph.find_edge(a, b).map(|edge| &self.graph[edge])
    }

    pub fn has_edge(&self, source: &str, target: &str, relation_type: RelationType) -> bool {
        self.edge(source, target, relation_type).is_some()
    }

    pub fn edge(&self, source: &str, target: &str, relation_type: RelationType) -> Option<&EdgeAttrs> {
        self.pair(source, target)?.get(relation_type)
    }

    /// The most recently written edge between the pair, of any type.
    pub fn latest_edge(&self, source: &str, target: &str) -> Option<&EdgeAttrs> {
        self.pair(source, target)?.latest()
    }

    /// Targets reachable from `node` over one edge of `relation_type`.
    pub fn out_neighbors_of_type(&self, node: &str, relation_type: RelationType) -> BTreeSet<String> {
        let Some(&idx) = self.index.get(node) else {
            return BTreeSet::new();
        };
        self.graph
            .edges(idx)
            .filter(|edge| edge.weight().get(relation_type).is_some())
            .map(|edge| self.graph[edge.target()].id.clone())
            .collect()
    }

    /// Every typed edge as `(source_id, target_id, attrs)`, pairs in insertion
    /// order and types in write order within a pair.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, &EdgeAttrs)> + '_ {
        self.graph.edge_references().flat_map(move |edge| {
            let source = self.graph[edge.source()].id.as_str();
            let target = self.graph[edge.target()].id.as_str();
            edge.weight()
                .edges
                .iter()
                .map(move |attrs| (source, target, attrs))
        })
    }

    /// Owns-only view used for indirect ownership.
    pub fn ownership_graph(&self) -> OwnershipGraph {
        let mut ownership = OwnershipGraph::new();
        for (source, target, attrs) in self.edges() {
            if attrs.relation_type == RelationType::Owns {
                ownership.add_edge(source, target, attrs.percentage);
            }
        }
        ownership
    }
}
