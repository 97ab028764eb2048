//! Live entities of one scene, in spawn order, with a name index.
//!
//! The scene updates entities one at a time by taking each out of the store
//! ([`take`](EntityStore::take)), running its hooks while the rest of the
//! store stays readable, and putting it back ([`restore`](EntityStore::restore)).
//! A taken entity keeps its place in the spawn order and its name.

use std::collections::{HashMap, HashSet};

use super::{Entity, EntityId};

#[derive(Default)]
pub struct EntityStore {
    entities: HashMap<EntityId, Entity>,
    order: Vec<EntityId>,
    names: HashMap<String, EntityId>,
    taken: HashSet<EntityId>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a live entity. Fails (giving the entity back) if the name is taken.
    pub(crate) fn insert(&mut self, entity: Entity) -> Result<EntityId, Entity> {
        if self.names.contains_key(entity.name()) {
            return Err(entity);
        }
        let id = entity.id();
        self.names.insert(entity.name().to_string(), id);
        self.order.push(id);
        self.entities.insert(id, entity);
        Ok(id)
    }

    /// Remove a live entity for good.
    pub(crate) fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let entity = self.entities.remove(&id)?;
        self.order.retain(|e| *e != id);
        if self.names.get(entity.name()) == Some(&id) {
            self.names.remove(entity.name());
        }
        Some(entity)
    }

    /// Temporarily take an entity out, keeping its order and name reserved.
    pub(crate) fn take(&mut self, id: EntityId) -> Option<Entity> {
        let entity = self.entities.remove(&id)?;
        self.taken.insert(id);
        Some(entity)
    }

    pub(crate) fn restore(&mut self, entity: Entity) {
        self.taken.remove(&entity.id());
        self.entities.insert(entity.id(), entity);
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Whether `id` is live, including while it is taken out.
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id) || self.taken.contains(&id)
    }

    pub fn by_name(&self, name: &str) -> Option<&Entity> {
        self.names.get(name).and_then(|id| self.entities.get(id))
    }

    pub fn id_of(&self, name: &str) -> Option<EntityId> {
        self.names.get(name).copied()
    }

    /// Ids in spawn order.
    pub fn ids(&self) -> &[EntityId] {
        &self.order
    }

    /// Entities in spawn order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.order.iter().filter_map(|id| self.entities.get(id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::Runtime;

    #[test]
    fn names_are_unique() {
        let runtime = Runtime::with_builtins();
        let mut store = EntityStore::new();
        let a = store.insert(runtime.entity("hero")).unwrap();
        let rejected = store.insert(runtime.entity("hero")).unwrap_err();

        assert_eq!(rejected.name(), "hero");
        assert_eq!(store.len(), 1);
        assert_eq!(store.id_of("hero"), Some(a));
    }

    #[test]
    fn take_keeps_order_and_name() {
        let runtime = Runtime::with_builtins();
        let mut store = EntityStore::new();
        let a = store.insert(runtime.entity("a")).unwrap();
        let b = store.insert(runtime.entity("b")).unwrap();

        let taken = store.take(a).unwrap();
        assert!(store.get(a).is_none());
        assert!(store.contains(a));
        assert!(store.by_name("a").is_none());
        assert_eq!(store.ids(), &[a, b]);
        assert!(store.insert(runtime.entity("a")).is_err());

        store.restore(taken);
        assert_eq!(store.iter().map(Entity::id).collect::<Vec<_>>(), vec![a, b]);
    }

    #[test]
    fn remove_frees_name() {
        let runtime = Runtime::with_builtins();
        let mut store = EntityStore::new();
        let a = store.insert(runtime.entity("a")).unwrap();
        assert!(store.remove(a).is_some());
        assert!(store.is_empty());
        assert!(!store.contains(a));
        assert!(store.insert(runtime.entity("a")).is_ok());
    }
}
