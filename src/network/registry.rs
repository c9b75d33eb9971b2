use std::collections::BTreeMap;

use crate::model::Entity;

/// Owners and owned entities keyed by normalized id.
///
/// Both collections iterate in id order so exports are reproducible.
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    owners: BTreeMap<String, Entity>,
    entities: BTreeMap<String, Entity>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite by id. Returns the entity previously stored under
    /// the same id in the same collection.
    pub fn upsert(&mut self, entity: Entity) -> Option<Entity> {
        let collection = if entity.is_owner() {
            &mut self.owners
        } else {
            &mut self.entities
        };
        collection.insert(entity.id.clone(), entity)
    }

    /// Whether the id is known as an owner or as an entity.
    pub fn contains(&self, id: &str) -> bool {
        self.owners.contains_key(id) || self.entities.contains_key(id)
    }

    pub fn owner(&self, id: &str) -> Option<&Entity> {
        self.owners.get(id)
    }

    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn owners(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.owners.values()
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.values()
    }

    /// Owners then entities, each in id order.
    pub fn all(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.owners().chain(self.entities())
    }

    pub fn owner_count(&self) -> usize {
        self.owners.len()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty() && self.entities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_routes_by_kind() {
        let mut registry = EntityRegistry::new();
        registry.upsert(Entity::owner("Alice"));
        registry.upsert(Entity::company("Acme Media"));
        registry.upsert(Entity::media_outlet("Daily Star").with_media_type("print"));

        assert_eq!(registry.owner_count(), 1);
        assert_eq!(registry.entity_count(), 2);
        assert!(registry.contains("alice"));
        assert!(registry.contains("daily_star"));
        assert!(registry.owner("acme_media").is_none());
        assert!(registry.entity("acme_media").is_some());
    }

    #[test]
    fn test_upsert_overwrites() {
        let mut registry = EntityRegistry::new();
        assert!(registry.upsert(Entity::company("Acme")).is_none());
        let previous = registry.upsert(Entity::company("ACME").with_image_url("a.png"));
        assert_eq!(previous.unwrap().name, "Acme");
        assert_eq!(registry.entity_count(), 1);
        assert_eq!(registry.entity("acme").unwrap().name, "ACME");
    }

    #[test]
    fn test_iteration_sorted_by_id() {
        let mut registry = EntityRegistry::new();
        registry.upsert(Entity::company("Zeta"));
        registry.upsert(Entity::company("Alpha"));
        registry.upsert(Entity::owner("Mona"));
        registry.upsert(Entity::owner("Bea"));

        let ids: Vec<_> = registry.all().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["bea", "mona", "alpha", "zeta"]);
    }

    #[test]
    fn test_empty() {
        let registry = EntityRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.all().count(), 0);
    }
}
