use crate::model::{RelationType, Relationship};

/// Relationships in insertion order. No deduplication happens here.
#[derive(Debug, Clone, Default)]
pub struct RelationshipStore {
    relationships: Vec<Relationship>,
}

impl RelationshipStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, relationship: Relationship) {
        self.relationships.push(relationship);
    }

    pub fn all(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn len(&self) -> usize {
        self.relationships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relationships.is_empty()
    }

    pub fn count_of(&self, relation_type: RelationType) -> usize {
        self.relationships
            .iter()
            .filter(|r| r.relation_type == relation_type)
            .count()
    }
}
