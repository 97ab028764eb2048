//! # Entity — A Named Container of Modules
//!
//! An [`Entity`] owns a [`Transform`] and any number of [`Module`]s, including
//! several instances of the same type. Modules are indexed three ways:
//!
//! ```text
//! slots:         ModuleId → (type, priority, capabilities, Box<dyn Module>)
//! by_type:       TypeId   → [ModuleId, ...]   attachment order
//! by_priority:   i32      → [ModuleId, ...]   BTreeMap, ascending
//! by_capability: Capability → [ModuleId, ...]
//! ```
//!
//! Every attached module appears in exactly one type bucket and exactly one
//! priority bucket. [`add_module`](Entity::add_module) and
//! [`remove_module`](Entity::remove_module) are the only places that touch
//! the indices, and they always update all of them together. Empty buckets
//! are deleted.
//!
//! ## Lifecycle
//!
//! Hooks run in priority-bucket order. To call a hook, the module is taken
//! out of its slot, handed a [`ModuleContext`] with the entity borrowed
//! mutably, and put back afterwards. A module removed during its own hook is
//! dropped instead of being put back.
//!
//! [`init`](Entity::init) runs once. Before calling any init hook it checks
//! each module type's declared requirements; a type whose requirement is
//! missing is dropped with all its instances and a warning. Dropping can make
//! another type's requirement fail, so the check repeats until nothing else
//! changes.
//!
//! ## Events
//!
//! Structural changes are not pushed to listeners directly. The entity
//! records them in an outbox that the owning scene drains after each hook
//! pass; see [`EntityEvent`].

use std::any::TypeId;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::context::{ModuleContext, SceneAccess};
use crate::math::Vec2;

use super::id::{EntityId, ModuleId, SceneId};
use super::module::{Capability, HookResult, Module};
use super::registry::{ModuleMeta, ModuleType, Requirement};
use super::runtime::Runtime;
use super::transform::Transform;

/// Something about an entity changed that the scene's subsystems track.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityEvent {
    /// The world position changed. `previous` is where it was before the
    /// first change since the last drain.
    Moved { previous: Vec2 },
    /// A module was attached (`added == true`) or detached.
    ModuleChanged {
        module: ModuleId,
        ty: ModuleType,
        capabilities: Vec<Capability>,
        added: bool,
    },
}

struct ModuleSlot {
    ty: ModuleType,
    priority: i32,
    capabilities: Vec<Capability>,
    /// `None` while the module's own hook is running.
    module: Option<Box<dyn Module>>,
}

#[derive(Clone, Copy)]
enum Hook {
    Init,
    Load,
    Update,
    Unload,
}

pub struct Entity {
    id: EntityId,
    name: String,
    runtime: Runtime,
    transform: Transform,
    slots: HashMap<ModuleId, ModuleSlot>,
    by_type: HashMap<TypeId, Vec<ModuleId>>,
    by_priority: BTreeMap<i32, Vec<ModuleId>>,
    by_capability: HashMap<Capability, Vec<ModuleId>>,
    initialized: bool,
    scene: Option<SceneId>,
    pub(crate) pending_children: Vec<Entity>,
    events: Vec<EntityEvent>,
}

impl Entity {
    pub fn new(runtime: &Runtime, name: impl Into<String>) -> Self {
        Self {
            id: runtime.ids().entity(),
            name: name.into(),
            runtime: runtime.clone(),
            transform: Transform::new(),
            slots: HashMap::new(),
            by_type: HashMap::new(),
            by_priority: BTreeMap::new(),
            by_capability: HashMap::new(),
            initialized: false,
            scene: None,
            pending_children: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename. Has no effect on the scene's name lookup once spawned.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn scene(&self) -> Option<SceneId> {
        self.scene
    }

    pub(crate) fn set_scene(&mut self, scene: Option<SceneId>) {
        self.scene = scene;
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    // ── Transform ──

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    pub fn position(&self) -> Vec2 {
        self.transform.position()
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.transform.set_position(position);
    }

    /// Builder: set the initial (local) position.
    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.transform.set_local_position(Vec2::new(x, y));
        self.transform.take_moved_from();
        self
    }

    /// Builder: replace the transform. Parent and children links of the
    /// current transform are kept.
    pub fn with_transform(mut self, transform: Transform) -> Self {
        let parent = self.transform.parent.take();
        let children = std::mem::take(&mut self.transform.children);
        self.transform = transform;
        self.transform.parent = parent;
        self.transform.children = children;
        self
    }

    // ── Children before spawn ──

    /// Builder: attach a child that spawns together with this entity.
    pub fn with_child(mut self, child: Entity) -> Self {
        self.add_child(child);
        self
    }

    /// Attach a child that spawns together with this entity.
    pub fn add_child(&mut self, child: Entity) {
        self.pending_children.push(child);
    }

    // ── Modules ──

    /// Builder form of [`add_module`](Self::add_module).
    pub fn with_module<M: ModuleMeta>(mut self, module: M) -> Self {
        self.add_module(module);
        self
    }

    /// Attach a module and return its id.
    ///
    /// If `M` requires a rectangle transform, the entity's transform is
    /// converted in place first.
    pub fn add_module<M: ModuleMeta>(&mut self, module: M) -> ModuleId {
        self.runtime.ensure_registered::<M>();
        let ty = ModuleType::of::<M>();
        let (priority, needs_rect) = {
            let registry = self.runtime.registry();
            (
                registry.priority(ty.id()),
                registry.requires_rect_transform(ty.id()),
            )
        };

        if needs_rect && !self.transform.is_rect() {
            log::debug!("Entity {} ({}): {ty} needs a rect transform, converting", self.id, self.name);
            self.transform.make_rect();
        }

        let id = self.runtime.ids().module();
        let mut module: Box<dyn Module> = Box::new(module);
        let capabilities = module.capabilities();

        self.by_type.entry(ty.id()).or_default().push(id);
        self.by_priority.entry(priority).or_default().push(id);
        for cap in &capabilities {
            self.by_capability.entry(*cap).or_default().push(id);
        }
        self.slots.insert(
            id,
            ModuleSlot {
                ty,
                priority,
                capabilities: capabilities.clone(),
                module: Some(module),
            },
        );

        self.events.push(EntityEvent::ModuleChanged {
            module: id,
            ty,
            capabilities,
            added: true,
        });
        id
    }

    /// Detach a module. Returns `false` if it was not attached.
    pub fn remove_module(&mut self, id: ModuleId) -> bool {
        let Some(slot) = self.slots.remove(&id) else {
            return false;
        };

        remove_from_bucket(&mut self.by_type, &slot.ty.id(), id);
        if let Some(bucket) = self.by_priority.get_mut(&slot.priority) {
            bucket.retain(|m| *m != id);
            if bucket.is_empty() {
                self.by_priority.remove(&slot.priority);
            }
        }
        for cap in &slot.capabilities {
            remove_from_bucket(&mut self.by_capability, cap, id);
        }

        self.events.push(EntityEvent::ModuleChanged {
            module: id,
            ty: slot.ty,
            capabilities: slot.capabilities,
            added: false,
        });
        true
    }

    /// The `index`-th attached module of type `T`.
    pub fn module<T: Module>(&self, index: usize) -> Option<&T> {
        let id = *self.by_type.get(&TypeId::of::<T>())?.get(index)?;
        self.module_dyn(id)?.downcast_ref::<T>()
    }

    pub fn module_mut<T: Module>(&mut self, index: usize) -> Option<&mut T> {
        let id = *self.by_type.get(&TypeId::of::<T>())?.get(index)?;
        self.module_dyn_mut(id)?.downcast_mut::<T>()
    }

    /// All attached modules of type `T`, in attachment order.
    pub fn modules<T: Module>(&self) -> Vec<&T> {
        self.module_ids::<T>()
            .iter()
            .filter_map(|id| self.module_dyn(*id)?.downcast_ref::<T>())
            .collect()
    }

    /// Ids of all attached modules of type `T`, in attachment order.
    pub fn module_ids<T: Module>(&self) -> &[ModuleId] {
        self.by_type
            .get(&TypeId::of::<T>())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has_module<T: Module>(&self) -> bool {
        !self.module_ids::<T>().is_empty()
    }

    /// The module with this id, unless its own hook is currently running.
    pub fn module_dyn(&self, id: ModuleId) -> Option<&(dyn Module + 'static)> {
        self.slots.get(&id)?.module.as_deref()
    }

    pub fn module_dyn_mut(&mut self, id: ModuleId) -> Option<&mut (dyn Module + 'static)> {
        self.slots.get_mut(&id)?.module.as_deref_mut()
    }

    pub fn module_type(&self, id: ModuleId) -> Option<ModuleType> {
        self.slots.get(&id).map(|slot| slot.ty)
    }

    pub fn module_priority(&self, id: ModuleId) -> Option<i32> {
        self.slots.get(&id).map(|slot| slot.priority)
    }

    /// Modules providing `cap`, in attachment order.
    pub fn capability(&self, cap: Capability) -> &[ModuleId] {
        self.by_capability
            .get(&cap)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All module ids in hook order: ascending priority, then attachment.
    pub fn hook_order(&self) -> Vec<ModuleId> {
        self.by_priority.values().flatten().copied().collect()
    }

    pub fn module_count(&self) -> usize {
        self.slots.len()
    }

    // ── Lifecycle ──

    /// Check requirements, then run every init hook. Runs once; later calls
    /// do nothing and return an empty list.
    ///
    /// Returns the module types that were dropped for missing requirements.
    pub fn init(&mut self, scene: &mut SceneAccess<'_>) -> Vec<ModuleType> {
        if self.initialized {
            return Vec::new();
        }
        let dropped = self.resolve_dependencies();
        // Init and load hooks are infallible.
        let _ = self.run_hook(scene, Hook::Init);
        self.initialized = true;
        dropped
    }

    pub fn load(&mut self, scene: &mut SceneAccess<'_>) {
        let _ = self.run_hook(scene, Hook::Load);
    }

    /// Run every update hook. Stops at the first error and returns it.
    pub fn update(&mut self, scene: &mut SceneAccess<'_>) -> HookResult {
        self.run_hook(scene, Hook::Update)
    }

    pub fn unload(&mut self, scene: &mut SceneAccess<'_>) {
        let _ = self.run_hook(scene, Hook::Unload);
    }

    fn run_hook(&mut self, scene: &mut SceneAccess<'_>, hook: Hook) -> HookResult {
        for id in self.hook_order() {
            let Some(mut module) = self.slots.get_mut(&id).and_then(|slot| slot.module.take())
            else {
                continue;
            };

            let result = {
                let mut ctx = ModuleContext::new(self, id, scene.reborrow());
                match hook {
                    Hook::Init => {
                        module.init(&mut ctx);
                        Ok(())
                    }
                    Hook::Load => {
                        module.load(&mut ctx);
                        Ok(())
                    }
                    Hook::Update => module.update(&mut ctx),
                    Hook::Unload => {
                        module.unload(&mut ctx);
                        Ok(())
                    }
                }
            };

            if let Some(slot) = self.slots.get_mut(&id) {
                slot.module = Some(module);
            }
            result?;
        }
        Ok(())
    }

    fn resolve_dependencies(&mut self) -> Vec<ModuleType> {
        let mut dropped = Vec::new();
        loop {
            let missing = {
                let registry = self.runtime.registry();
                self.by_type.iter().find_map(|(ty, ids)| {
                    registry
                        .dependencies(*ty)
                        .into_iter()
                        .find(|req| !self.satisfies(req))
                        .map(|req| (ids.clone(), req))
                })
            };
            let Some((ids, requirement)) = missing else {
                break;
            };
            let Some(ty) = ids.first().and_then(|id| self.module_type(*id)) else {
                break;
            };

            log::warn!(
                "Entity {} ({}): dropping {} {ty} module(s), missing {requirement}",
                self.id,
                self.name,
                ids.len()
            );
            for id in ids {
                self.remove_module(id);
            }
            dropped.push(ty);
        }
        dropped
    }

    fn satisfies(&self, requirement: &Requirement) -> bool {
        match requirement {
            Requirement::Module(ty) => self.by_type.get(&ty.id()).is_some_and(|b| !b.is_empty()),
            Requirement::Capability(cap) => !self.capability(*cap).is_empty(),
            Requirement::RectTransform => self.transform.is_rect(),
        }
    }

    // ── Events ──

    /// Take every event recorded since the last drain. Module changes come
    /// first, in the order they happened; a move comes last.
    pub fn drain_events(&mut self) -> Vec<EntityEvent> {
        let mut events = std::mem::take(&mut self.events);
        if let Some(previous) = self.transform.take_moved_from() {
            events.push(EntityEvent::Moved { previous });
        }
        events
    }

    pub(crate) fn discard_events(&mut self) {
        self.events.clear();
        self.transform.take_moved_from();
    }

    #[cfg(test)]
    pub(crate) fn assert_indices_consistent(&self) {
        let mut from_types: Vec<ModuleId> = self.by_type.values().flatten().copied().collect();
        let mut from_priorities = self.hook_order();
        from_types.sort();
        from_priorities.sort();
        assert_eq!(from_types, from_priorities, "type and priority buckets diverged");

        let mut from_slots: Vec<ModuleId> = self.slots.keys().copied().collect();
        from_slots.sort();
        assert_eq!(from_types, from_slots, "bucket and slot sets diverged");

        assert!(self.by_type.values().all(|b| !b.is_empty()));
        assert!(self.by_priority.values().all(|b| !b.is_empty()));
        for (id, slot) in &self.slots {
            assert!(self.by_priority[&slot.priority].contains(id));
            assert!(self.by_type[&slot.ty.id()].contains(id));
        }
    }
}

fn remove_from_bucket<K: std::hash::Hash + Eq>(
    buckets: &mut HashMap<K, Vec<ModuleId>>,
    key: &K,
    id: ModuleId,
) {
    if let Some(bucket) = buckets.get_mut(key) {
        bucket.retain(|m| *m != id);
        if bucket.is_empty() {
            buckets.remove(key);
        }
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Entity {}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("modules", &self.slots.len())
            .field("position", &self.transform.position())
            .finish()
    }
}
