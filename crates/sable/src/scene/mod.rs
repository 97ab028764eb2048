//! # Scene — Entity Lifecycle and the Frame Pipeline
//!
//! A [`Scene`] owns its live entities together with every structure that
//! indexes them: the spatial grid, the render order, the UI pass and the
//! physics pass. Entities move through four states:
//!
//! ```text
//!   spawn()            flush               remove()            flush
//! ──────────▶ Queued ─────────▶ Live ─────────────▶ Removing ─────────▶ gone
//!               │                                     (subtree too)
//!               └── remove() before the flush: dropped, never live
//! ```
//!
//! Transitions only happen when the queues are flushed, at the start of
//! [`update`](Scene::update) or in [`load`](Scene::load). Game code, including
//! module hooks, only ever *requests* them.
//!
//! ## Frame order
//!
//! 1. flush queues (removals, then spawns; new entities init, then load)
//! 2. update every live entity; a failing entity is logged and skipped
//! 3. refresh the camera view if the camera or viewport changed
//! 4. physics pass
//! 5. UI pass
//! 6. evict empty grid cells
//! 7. draw the world list, then the screen list
//!
//! After every hook pass the entity's event outbox is drained: moves update
//! the grid, physics and render order and are propagated to children; module
//! changes update the render order, UI and physics incrementally.

pub mod manager;

pub use manager::SceneManager;

use std::collections::VecDeque;

use crate::camera::{Camera, CameraView};
use crate::config::SceneSettings;
use crate::context::{Command, Commands, Frame, SceneAccess};
use crate::ecs::{Entity, EntityEvent, EntityId, EntityStore, Module, ModuleType, Runtime, SceneId};
use crate::grid::Grid;
use crate::math::Vec2;
use crate::physics2d::{BoxCollider, Physics};
use crate::render::{RenderMode, RenderOrder, Surface};
use crate::ui::UiHandler;

/// Name of the camera entity every scene spawns.
pub const CAMERA_NAME: &str = "Camera";

pub struct Scene {
    id: SceneId,
    name: String,
    settings: SceneSettings,
    entities: EntityStore,
    spawn_queue: VecDeque<(Entity, Option<EntityId>)>,
    remove_queue: VecDeque<EntityId>,
    commands: Commands,
    grid: Grid,
    render: RenderOrder,
    ui: UiHandler,
    physics: Physics,
    camera: EntityId,
    view: CameraView,
    camera_dirty: bool,
    loaded: bool,
}

impl Scene {
    /// Create a scene and queue its camera entity.
    ///
    /// # Panics
    ///
    /// Panics if `settings.cell_size` is not positive.
    pub fn new(runtime: &Runtime, name: impl Into<String>, settings: SceneSettings) -> Self {
        let camera = runtime.entity(CAMERA_NAME).with_module(Camera::new());
        let viewport = Vec2::new(settings.viewport.0, settings.viewport.1);
        let mut scene = Self {
            id: runtime.ids().scene(),
            name: name.into(),
            settings,
            entities: EntityStore::new(),
            spawn_queue: VecDeque::new(),
            remove_queue: VecDeque::new(),
            commands: Commands::new(),
            grid: Grid::new(settings.cell_size),
            render: RenderOrder::new(settings.y_sort),
            ui: UiHandler::new(),
            physics: Physics::new(settings.cell_size),
            camera: camera.id(),
            view: CameraView::new(Vec2::ZERO, &Camera::new(), viewport, settings.pixels_per_unit),
            camera_dirty: true,
            loaded: false,
        };
        scene.spawn(camera);
        scene
    }

    pub fn id(&self) -> SceneId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn settings(&self) -> &SceneSettings {
        &self.settings
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    // ── Spawning and removal ──

    /// Queue `entity` (and any children built with
    /// [`Entity::with_child`]) for spawning at the next flush.
    ///
    /// Returns `None`, logging an error, if the entity already belongs to a
    /// scene.
    pub fn spawn(&mut self, entity: Entity) -> Option<EntityId> {
        self.enqueue(entity, None)
    }

    /// Queue `entity` as a child of `parent`. Its position is relative to
    /// the parent.
    pub fn spawn_child(&mut self, parent: EntityId, entity: Entity) -> Option<EntityId> {
        self.enqueue(entity, Some(parent))
    }

    fn enqueue(&mut self, mut entity: Entity, parent: Option<EntityId>) -> Option<EntityId> {
        if let Some(other) = entity.scene() {
            log::error!(
                "Cannot spawn entity {} ({}) into scene '{}': already in scene {other}",
                entity.id(),
                entity.name(),
                self.name
            );
            return None;
        }
        entity.set_scene(Some(self.id));
        let id = entity.id();
        self.spawn_queue.push_back((entity, parent));
        Some(id)
    }

    /// Queue a live entity and its subtree for removal at the next flush.
    /// An entity still waiting to spawn, including a child queued inside
    /// another entity's subtree, is dropped right away.
    pub fn remove(&mut self, id: EntityId) {
        if let Some(mut entity) = self.take_queued(id) {
            entity.set_scene(None);
            log::debug!("Entity {id} ({}) removed before spawning", entity.name());
            return;
        }

        let Some(entity) = self.entities.get_mut(id) else {
            log::error!("Cannot remove entity {id}: not in scene '{}'", self.name);
            return;
        };
        entity.set_scene(None);
        if !self.remove_queue.contains(&id) {
            self.remove_queue.push_back(id);
        }
    }

    /// Splice a queued entity, with its pending subtree, out of the spawn
    /// queue.
    fn take_queued(&mut self, id: EntityId) -> Option<Entity> {
        if let Some(index) = self.spawn_queue.iter().position(|(e, _)| e.id() == id) {
            return self.spawn_queue.remove(index).map(|(entity, _)| entity);
        }
        self.spawn_queue
            .iter_mut()
            .find_map(|(root, _)| take_pending(&mut root.pending_children, id))
    }

    /// Take a live entity and its subtree out of the scene immediately, for
    /// moving into another scene. Children come back as pending children, so
    /// spawning the result elsewhere recreates the hierarchy.
    ///
    /// Must not be called while the scene is updating.
    pub fn detach(&mut self, id: EntityId) -> Option<Entity> {
        let mut entity = self.unlink(id)?;
        entity.transform_mut().rebase(Vec2::ZERO);
        entity.discard_events();
        Some(entity)
    }

    fn unlink(&mut self, id: EntityId) -> Option<Entity> {
        let mut entity = self.entities.remove(id)?;
        self.remove_queue.retain(|queued| *queued != id);
        self.detach_from_parent(&mut entity);
        self.unregister(id);

        let children = std::mem::take(&mut entity.transform_mut().children);
        for child in children {
            if let Some(mut child) = self.unlink(child) {
                child.transform_mut().parent = None;
                entity.pending_children.push(child);
            }
        }
        entity.set_scene(None);
        if id == self.camera {
            self.camera_dirty = true;
        }
        Some(entity)
    }

    fn detach_from_parent(&mut self, entity: &mut Entity) {
        if let Some(parent) = entity.transform_mut().parent.take() {
            if let Some(parent) = self.entities.get_mut(parent) {
                parent.transform_mut().children.retain(|c| *c != entity.id());
            }
        }
    }

    fn unregister(&mut self, id: EntityId) {
        self.grid.remove(id);
        self.render.remove_entity(id);
        self.ui.remove_entity(id);
        self.physics.remove_entity(id);
    }

    /// Apply pending removals and spawns. Unless `loading`, freshly spawned
    /// entities are initialized and then loaded once the whole batch is
    /// registered.
    pub fn process_queues(&mut self, frame: &mut Frame<'_>, loading: bool) {
        while let Some(id) = self.remove_queue.pop_front() {
            self.despawn(id);
        }

        let mut spawned = Vec::new();
        while let Some((entity, parent)) = self.spawn_queue.pop_front() {
            self.register(entity, parent, &mut spawned);
        }

        if loading || spawned.is_empty() {
            return;
        }
        for id in &spawned {
            self.init_entity(frame, *id);
        }
        for id in &spawned {
            self.with_entity(frame, *id, |entity, access| entity.load(access));
        }
    }

    fn despawn(&mut self, id: EntityId) {
        let Some(mut entity) = self.entities.remove(id) else {
            return;
        };
        self.detach_from_parent(&mut entity);
        self.unregister(id);
        entity.set_scene(None);
        if id == self.camera {
            self.camera_dirty = true;
        }
        log::debug!("Removed entity {id} ({}) from scene '{}'", entity.name(), self.name);

        for child in entity.transform().children().to_vec() {
            self.despawn(child);
        }
    }

    fn register(&mut self, mut entity: Entity, parent: Option<EntityId>, spawned: &mut Vec<EntityId>) {
        if self.entities.id_of(entity.name()).is_some() {
            log::error!(
                "Cannot spawn entity {} into scene '{}': name '{}' is taken",
                entity.id(),
                self.name,
                entity.name()
            );
            log_dropped_children(&entity.pending_children, &self.name);
            return;
        }

        let children = std::mem::take(&mut entity.pending_children);
        entity.set_scene(Some(self.id));

        match parent.map(|p| (p, self.entities.get_mut(p))) {
            Some((parent, Some(parent_entity))) => {
                parent_entity.transform_mut().children.push(entity.id());
                let origin = parent_entity.position();
                entity.transform_mut().parent = Some(parent);
                entity.transform_mut().set_origin(origin);
            }
            Some((parent, None)) => {
                log::warn!(
                    "Parent {parent} of entity {} ({}) is not live, spawning as root",
                    entity.id(),
                    entity.name()
                );
            }
            None => {}
        }
        entity.discard_events();

        let id = entity.id();
        if let Err(entity) = self.entities.insert(entity) {
            log::error!("Entity {id} ({}) could not be stored", entity.name());
            return;
        }
        if let Some(entity) = self.entities.get(id) {
            self.grid.insert(id, entity.position());
            self.render.add_entity(entity);
            self.ui.add_entity(entity);
            self.physics.sync_entity(entity);
        }
        spawned.push(id);

        for child in children {
            self.register(child, Some(id), spawned);
        }
    }

    // ── Lifecycle ──

    /// Activate the scene: flush the queues, then init and load every live
    /// entity.
    pub fn load(&mut self, frame: &mut Frame<'_>) {
        self.process_queues(frame, true);
        let ids = self.entities.ids().to_vec();
        for id in &ids {
            self.init_entity(frame, *id);
        }
        for id in &ids {
            self.with_entity(frame, *id, |entity, access| entity.load(access));
        }
        self.loaded = true;
        log::info!("Loaded scene '{}' ({} entities)", self.name, self.entities.len());
    }

    /// Deactivate the scene: run every unload hook, then apply what the
    /// hooks queued without initializing new entities. Other entities stay
    /// live.
    pub fn unload(&mut self, frame: &mut Frame<'_>) {
        for id in self.entities.ids().to_vec() {
            self.with_entity(frame, id, |entity, access| entity.unload(access));
        }
        self.process_queues(frame, true);
        self.loaded = false;
        log::info!("Unloaded scene '{}'", self.name);
    }

    /// Run one frame. See the module docs for the order of passes.
    pub fn update(&mut self, frame: &mut Frame<'_>, surface: &mut dyn Surface) {
        self.process_queues(frame, false);

        for id in self.entities.ids().to_vec() {
            self.with_entity(frame, id, |entity, access| {
                if let Err(err) = entity.update(access) {
                    log::error!("Entity {} ({}) failed to update: {err}", entity.id(), entity.name());
                }
            });
        }

        self.refresh_camera(surface.viewport());

        for id in self.physics.step(&mut self.entities) {
            self.dispatch_events(id);
        }

        self.ui.update(&mut self.entities, frame.input, &self.view);
        self.grid.process_removal();

        self.render.draw(RenderMode::World, &self.entities, &self.view, surface);
        self.render.draw(RenderMode::Screen, &self.entities, &self.view, surface);
    }

    fn init_entity(&mut self, frame: &mut Frame<'_>, id: EntityId) {
        self.with_entity(frame, id, |entity, access| {
            entity.init(access);
        });
    }

    /// Take `id` out of the store, run `f` with scene access, put it back,
    /// then dispatch its events and apply queued commands.
    fn with_entity<R>(
        &mut self,
        frame: &mut Frame<'_>,
        id: EntityId,
        f: impl FnOnce(&mut Entity, &mut SceneAccess<'_>) -> R,
    ) -> Option<R> {
        let mut entity = self.entities.take(id)?;
        let result = {
            let mut access = SceneAccess {
                time: frame.time,
                input: frame.input,
                tasks: &mut *frame.tasks,
                view: &self.view,
                entities: &self.entities,
                grid: &self.grid,
                commands: &mut self.commands,
            };
            f(&mut entity, &mut access)
        };
        self.entities.restore(entity);
        self.dispatch_events(id);
        self.apply_commands();
        Some(result)
    }

    fn apply_commands(&mut self) {
        while let Some(command) = self.commands.pop() {
            match command {
                Command::Spawn { entity, parent } => {
                    self.enqueue(entity, parent);
                }
                Command::Remove(id) => self.remove(id),
                Command::Modify(id, edit) => {
                    self.modify(id, edit);
                }
            }
        }
    }

    fn refresh_camera(&mut self, viewport: Vec2) {
        let Some(entity) = self.entities.get_mut(self.camera) else {
            return;
        };
        let target = entity.position();
        let Some(camera) = entity.module_mut::<Camera>(0) else {
            return;
        };
        let changed = camera.take_changed();
        if !(changed || self.camera_dirty || viewport != self.view.viewport) {
            return;
        }
        self.view = CameraView::new(target, camera, viewport, self.settings.pixels_per_unit);
        self.camera_dirty = false;
    }

    // ── Events ──

    fn dispatch_events(&mut self, id: EntityId) {
        let Some(entity) = self.entities.get_mut(id) else {
            return;
        };
        for event in entity.drain_events() {
            match event {
                EntityEvent::Moved { previous } => self.on_moved(id, previous),
                EntityEvent::ModuleChanged {
                    module,
                    ty,
                    capabilities,
                    added,
                } => {
                    self.render.module_changed(id, module, &capabilities, added);
                    self.ui.module_changed(id, module, ty, added);
                    if ty == ModuleType::of::<BoxCollider>() {
                        if let Some(entity) = self.entities.get(id) {
                            self.physics.sync_entity(entity);
                        }
                    }
                    if id == self.camera {
                        self.camera_dirty = true;
                    }
                }
            }
        }
    }

    fn on_moved(&mut self, id: EntityId, previous: Vec2) {
        let Some(entity) = self.entities.get(id) else {
            return;
        };
        let current = entity.position();
        let children = entity.transform().children().to_vec();

        self.grid.relocate(id, current);
        self.physics.entity_moved(id, current);
        self.render.entity_moved(id, previous, current);
        if id == self.camera {
            self.camera_dirty = true;
        }

        for child in children {
            if let Some(child_entity) = self.entities.get_mut(child) {
                child_entity.transform_mut().set_origin(current);
            }
            self.dispatch_events(child);
        }
    }

    // ── Access ──

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Mutable access outside a frame. Moves and module changes are picked
    /// up after the entity's next hook pass; use [`modify`](Self::modify) to
    /// apply them immediately.
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    /// Edit a live entity and dispatch the resulting events right away.
    pub fn modify(&mut self, id: EntityId, edit: impl FnOnce(&mut Entity)) -> bool {
        let Some(entity) = self.entities.get_mut(id) else {
            log::warn!("Cannot modify entity {id}: not in scene '{}'", self.name);
            return false;
        };
        edit(entity);
        self.dispatch_events(id);
        true
    }

    pub fn find(&self, name: &str) -> Option<&Entity> {
        self.entities.by_name(name)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains(id)
    }

    /// Live entity ids in spawn order.
    pub fn live_entities(&self) -> &[EntityId] {
        self.entities.ids()
    }

    pub fn entities(&self) -> &EntityStore {
        &self.entities
    }

    /// Whether `id` is waiting in the spawn queue, either as a queued root
    /// or inside a queued subtree.
    pub fn is_queued(&self, id: EntityId) -> bool {
        self.spawn_queue
            .iter()
            .any(|(e, _)| e.id() == id || pending_contains(&e.pending_children, id))
    }

    /// Every live module of type `T` with its entity.
    pub fn find_modules<T: Module>(&self) -> Vec<(EntityId, &T)> {
        self.entities
            .iter()
            .flat_map(|e| e.modules::<T>().into_iter().map(move |m| (e.id(), m)))
            .collect()
    }

    pub fn query_box(&self, min: Vec2, max: Vec2) -> Vec<EntityId> {
        self.grid.query_box(min, max)
    }

    pub fn query_radius(&self, center: Vec2, radius: f32) -> Vec<EntityId> {
        self.grid.query_radius(center, radius)
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn render_order(&self) -> &RenderOrder {
        &self.render
    }

    pub fn ui(&self) -> &UiHandler {
        &self.ui
    }

    /// The camera entity's id.
    pub fn camera(&self) -> EntityId {
        self.camera
    }

    pub fn view(&self) -> &CameraView {
        &self.view
    }

    // ── Hierarchy ──

    /// Children of a live entity, in sibling order.
    pub fn children(&self, id: EntityId) -> &[EntityId] {
        self.entities
            .get(id)
            .map(|e| e.transform().children())
            .unwrap_or(&[])
    }

    /// Reparent a live entity, keeping its world position. Returns `false`,
    /// logging an error, for unknown ids, self-parenting and cycles.
    pub fn set_parent(&mut self, child: EntityId, parent: EntityId) -> bool {
        if child == parent {
            log::error!("Cannot parent entity {child} to itself");
            return false;
        }
        if !self.entities.contains(child) || !self.entities.contains(parent) {
            log::error!("Cannot parent {child} to {parent}: both must be live in scene '{}'", self.name);
            return false;
        }
        let mut cursor = Some(parent);
        while let Some(ancestor) = cursor {
            if ancestor == child {
                log::error!("Cannot parent {child} to {parent}: it would create a cycle");
                return false;
            }
            cursor = self.entities.get(ancestor).and_then(|e| e.transform().parent());
        }

        let Some(origin) = self.entities.get(parent).map(Entity::position) else {
            return false;
        };
        let Some(mut entity) = self.entities.take(child) else {
            return false;
        };
        self.detach_from_parent(&mut entity);
        entity.transform_mut().parent = Some(parent);
        entity.transform_mut().rebase(origin);
        self.entities.restore(entity);

        if let Some(parent) = self.entities.get_mut(parent) {
            parent.transform_mut().children.push(child);
        }
        true
    }

    /// Make `child` a root, keeping its world position.
    pub fn clear_parent(&mut self, child: EntityId) -> bool {
        let Some(mut entity) = self.entities.take(child) else {
            return false;
        };
        self.detach_from_parent(&mut entity);
        entity.transform_mut().rebase(Vec2::ZERO);
        self.entities.restore(entity);
        true
    }

    /// Position among the parent's children. `None` for roots.
    pub fn sibling_index(&self, id: EntityId) -> Option<usize> {
        let parent = self.entities.get(id)?.transform().parent()?;
        self.children(parent).iter().position(|c| *c == id)
    }

    /// Move `id` to `index` among its siblings (clamped to the last place).
    pub fn set_sibling_index(&mut self, id: EntityId, index: usize) -> bool {
        let Some(parent) = self.entities.get(id).and_then(|e| e.transform().parent()) else {
            return false;
        };
        let Some(parent) = self.entities.get_mut(parent) else {
            return false;
        };
        let children = &mut parent.transform_mut().children;
        let Some(current) = children.iter().position(|c| *c == id) else {
            return false;
        };
        children.remove(current);
        let index = index.min(children.len());
        children.insert(index, id);
        true
    }
}

fn take_pending(children: &mut Vec<Entity>, id: EntityId) -> Option<Entity> {
    if let Some(index) = children.iter().position(|c| c.id() == id) {
        return Some(children.remove(index));
    }
    children
        .iter_mut()
        .find_map(|child| take_pending(&mut child.pending_children, id))
}

fn pending_contains(children: &[Entity], id: EntityId) -> bool {
    children
        .iter()
        .any(|c| c.id() == id || pending_contains(&c.pending_children, id))
}

fn log_dropped_children(children: &[Entity], scene: &str) {
    for child in children {
        log::error!(
            "Dropping child entity {} ({}) of a rejected entity in scene '{scene}'",
            child.id(),
            child.name()
        );
        log_dropped_children(&child.pending_children, scene);
    }
}
