//! Shared engine context: id generator plus module registry.
//!
//! A [`Runtime`] is a cheap clonable handle. The [`Engine`](crate::engine::Engine)
//! owns the original; every entity and scene it creates holds a clone. Tests
//! can build a fresh runtime per case and never share state.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use super::id::IdGenerator;
use super::registry::{ModuleCatalog, ModuleDescriptor, ModuleMeta, ModuleRegistry};
use super::{Entity, ModuleType};

#[derive(Clone)]
pub struct Runtime {
    ids: IdGenerator,
    registry: Rc<RefCell<ModuleRegistry>>,
}

impl Runtime {
    /// Create a runtime whose registry is built from `catalog`.
    pub fn new(catalog: &ModuleCatalog) -> Self {
        let mut registry = ModuleRegistry::new();
        registry.build(catalog);
        Self {
            ids: IdGenerator::new(),
            registry: Rc::new(RefCell::new(registry)),
        }
    }

    /// A runtime knowing only the engine's built-in module types.
    pub fn with_builtins() -> Self {
        Self::new(&ModuleCatalog::builtin())
    }

    pub fn ids(&self) -> &IdGenerator {
        &self.ids
    }

    pub fn registry(&self) -> Ref<'_, ModuleRegistry> {
        self.registry.borrow()
    }

    /// Rebuild the registry from a new catalog.
    pub fn rebuild(&self, catalog: &ModuleCatalog) {
        self.registry.borrow_mut().build(catalog);
    }

    /// Create an empty entity with a plain transform.
    pub fn entity(&self, name: impl Into<String>) -> Entity {
        Entity::new(self, name)
    }

    /// Make sure `M` is known to the registry. Types first seen at attach time
    /// are registered from their own declarations.
    pub(crate) fn ensure_registered<M: ModuleMeta>(&self) {
        let ty = ModuleType::of::<M>();
        if self.registry.borrow().contains(ty.id()) {
            return;
        }
        log::debug!("Registering module type {ty} on first use");
        self.registry
            .borrow_mut()
            .insert(&ModuleDescriptor::of::<M>());
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::with_builtins()
    }
}
