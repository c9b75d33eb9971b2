//! The ownership network context: registry, relationship store and graph
//! kept in step behind one mutable handle.

mod assemble;
mod registry;
mod store;

pub use assemble::{assemble, AdjacencyMatrix, AssembledNetwork};
pub use registry::EntityRegistry;
pub use store::RelationshipStore;

use crate::error::{OwnergraphError, Result};
use crate::graph::{compute_indirect_ownership, IndirectOptions, IndirectOutcome, RelationGraph};
use crate::model::{Entity, RelationType, Relationship};

/// All mutable state of one extraction run.
///
/// Every mutation goes through `&mut Network`, so a single writer is
/// enforced by the borrow checker. Indirect ownership assumes all direct
/// relationships are in place when [`Network::apply_indirect_ownership`] runs.
#[derive(Debug, Clone, Default)]
pub struct Network {
    registry: EntityRegistry,
    relationships: RelationshipStore,
    graph: RelationGraph,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite an entity and its graph node.
    pub fn upsert_entity(&mut self, entity: Entity) {
        self.graph.upsert_node(entity.clone());
        self.registry.upsert(entity);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.registry.contains(id)
    }

    /// Append a relationship to the store and write its graph edge.
    ///
    /// Fails with [`OwnergraphError::MalformedEntityReference`] when either
    /// endpoint is not registered; nothing is stored in that case.
    pub fn add_relationship(&mut self, relationship: Relationship) -> Result<()> {
        if !self.registry.contains(&relationship.source_id)
            || !self.registry.contains(&relationship.target_id)
        {
            return Err(OwnergraphError::MalformedEntityReference {
                source_id: relationship.source_id,
                target_id: relationship.target_id,
            });
        }

        self.graph.add_edge(
            &relationship.source_id,
            &relationship.target_id,
            relationship.relation_type,
            relationship.percentage,
            relationship.description.clone(),
        )?;
        self.relationships.add(relationship);
        Ok(())
    }

    /// Run the indirect ownership pass over the current `owns` edges and add
    /// the results to the store and graph.
    ///
    /// Pairs that already carry an `indirect_owns` edge are left alone, so a
    /// second call adds nothing.
    pub fn apply_indirect_ownership(&mut self, options: &IndirectOptions) -> IndirectOutcome {
        let ownership = self.graph.ownership_graph();
        let mut outcome = compute_indirect_ownership(
            &ownership,
            self.registry.owners(),
            self.registry.entities(),
            options,
        );

        let graph = &self.graph;
        outcome.relationships.retain(|rel| {
            let exists = graph.has_edge(&rel.source_id, &rel.target_id, RelationType::IndirectOwns);
            if exists {
                log::debug!(
                    "Indirect ownership {} -> {} already recorded",
                    rel.source_id,
                    rel.target_id
                );
            }
            !exists
        });

        let mut added = Vec::with_capacity(outcome.relationships.len());
        for rel in outcome.relationships.drain(..) {
            match self.add_relationship(rel.clone()) {
                Ok(()) => added.push(rel),
                Err(e) => {
                    log::warn!("Dropping indirect relationship: {}", e);
                    outcome.failures.push(e);
                }
            }
        }
        outcome.relationships = added;
        outcome
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn relationships(&self) -> &RelationshipStore {
        &self.relationships
    }

    pub fn graph(&self) -> &RelationGraph {
        &self.graph
    }

    /// Build the export bundle.
    pub fn assemble(&self) -> AssembledNetwork {
        assemble(self)
    }
}
