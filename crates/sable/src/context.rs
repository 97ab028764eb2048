//! Per-call context handed to module hooks.
//!
//! Module hooks never see the [`Scene`](crate::scene::Scene) directly: the
//! scene is in the middle of iterating its entities when a hook runs. Instead
//! a hook gets a [`ModuleContext`] that bundles
//!
//! - the owning entity (mutable),
//! - read access to the frame clock, input, camera and every *other* entity,
//! - the spatial grid for proximity queries,
//! - the task scheduler,
//! - a [`Commands`] buffer for structural changes (spawn, remove, edit
//!   another entity).
//!
//! Commands are applied by the scene right after the current entity has
//! finished its hook, so no live iteration structure changes underneath a
//! running module.

use std::collections::VecDeque;

use crate::camera::CameraView;
use crate::ecs::{Entity, EntityId, EntityStore, ModuleId};
use crate::grid::Grid;
use crate::input::InputState;
use crate::math::Vec2;
use crate::task::{Task, TaskHandle, TaskScheduler};
use crate::time::Time;

// ── Frame ───────────────────────────────────────────────────────────────

/// Per-frame engine state passed into scene updates.
pub struct Frame<'a> {
    pub time: &'a Time,
    pub input: &'a InputState,
    pub tasks: &'a mut TaskScheduler,
}

impl<'a> Frame<'a> {
    pub fn new(time: &'a Time, input: &'a InputState, tasks: &'a mut TaskScheduler) -> Self {
        Self { time, input, tasks }
    }
}

// ── Commands ────────────────────────────────────────────────────────────

pub(crate) enum Command {
    Spawn {
        entity: Entity,
        parent: Option<EntityId>,
    },
    Remove(EntityId),
    Modify(EntityId, Box<dyn FnOnce(&mut Entity)>),
}

/// Structural changes requested from inside a hook.
#[derive(Default)]
pub struct Commands {
    queue: VecDeque<Command>,
}

impl Commands {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `entity` for spawning into the current scene.
    pub fn spawn(&mut self, entity: Entity) -> EntityId {
        let id = entity.id();
        self.queue.push_back(Command::Spawn {
            entity,
            parent: None,
        });
        id
    }

    pub fn spawn_child(&mut self, parent: EntityId, entity: Entity) -> EntityId {
        let id = entity.id();
        self.queue.push_back(Command::Spawn {
            entity,
            parent: Some(parent),
        });
        id
    }

    pub fn remove(&mut self, id: EntityId) {
        self.queue.push_back(Command::Remove(id));
    }

    /// Edit another entity once the current hook has returned.
    pub fn modify(&mut self, id: EntityId, edit: impl FnOnce(&mut Entity) + 'static) {
        self.queue.push_back(Command::Modify(id, Box::new(edit)));
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub(crate) fn pop(&mut self) -> Option<Command> {
        self.queue.pop_front()
    }
}

// ── SceneAccess ─────────────────────────────────────────────────────────

/// Borrowed view of the scene around the entity currently running hooks.
pub struct SceneAccess<'a> {
    pub(crate) time: &'a Time,
    pub(crate) input: &'a InputState,
    pub(crate) tasks: &'a mut TaskScheduler,
    pub(crate) view: &'a CameraView,
    pub(crate) entities: &'a EntityStore,
    pub(crate) grid: &'a Grid,
    pub(crate) commands: &'a mut Commands,
}

impl SceneAccess<'_> {
    /// Shorter-lived copy, so one access can serve several hooks in a row.
    pub(crate) fn reborrow(&mut self) -> SceneAccess<'_> {
        SceneAccess {
            time: self.time,
            input: self.input,
            tasks: &mut *self.tasks,
            view: self.view,
            entities: self.entities,
            grid: self.grid,
            commands: &mut *self.commands,
        }
    }
}

// ── ModuleContext ───────────────────────────────────────────────────────

/// What a module hook can reach.
pub struct ModuleContext<'a> {
    entity: &'a mut Entity,
    module: ModuleId,
    scene: SceneAccess<'a>,
}

impl<'a> ModuleContext<'a> {
    pub(crate) fn new(entity: &'a mut Entity, module: ModuleId, scene: SceneAccess<'a>) -> Self {
        Self {
            entity,
            module,
            scene,
        }
    }

    /// The entity this module is attached to.
    pub fn entity(&self) -> &Entity {
        &*self.entity
    }

    pub fn entity_mut(&mut self) -> &mut Entity {
        &mut *self.entity
    }

    /// Id of the module whose hook is running.
    pub fn module_id(&self) -> ModuleId {
        self.module
    }

    pub fn time(&self) -> &Time {
        self.scene.time
    }

    pub fn input(&self) -> &InputState {
        self.scene.input
    }

    pub fn camera(&self) -> &CameraView {
        self.scene.view
    }

    pub fn position(&self) -> Vec2 {
        self.entity.transform().position()
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.entity.transform_mut().set_position(position);
    }

    /// Another live entity by id. The entity running this hook is not
    /// reachable here; use [`entity`](Self::entity).
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.scene.entities.get(id)
    }

    /// Another live entity by name.
    pub fn find(&self, name: &str) -> Option<&Entity> {
        self.scene.entities.by_name(name)
    }

    /// Entities in grid cells overlapping the box.
    pub fn query_box(&self, min: Vec2, max: Vec2) -> Vec<EntityId> {
        self.scene.grid.query_box(min, max)
    }

    /// Entities in grid cells overlapping the square around `center`.
    pub fn query_radius(&self, center: Vec2, radius: f32) -> Vec<EntityId> {
        self.scene.grid.query_radius(center, radius)
    }

    pub fn start_task(&mut self, task: impl Task + 'static) -> TaskHandle {
        self.scene.tasks.start(task)
    }

    pub fn stop_task(&mut self, handle: TaskHandle) -> bool {
        self.scene.tasks.stop(handle)
    }

    pub fn commands(&mut self) -> &mut Commands {
        &mut *self.scene.commands
    }

    pub fn spawn(&mut self, entity: Entity) -> EntityId {
        self.scene.commands.spawn(entity)
    }

    pub fn remove(&mut self, id: EntityId) {
        self.scene.commands.remove(id);
    }

    /// Remove the owning entity at the end of its hook.
    pub fn remove_self(&mut self) {
        let id = self.entity.id();
        self.scene.commands.remove(id);
    }
}

// ── Test harness ────────────────────────────────────────────────────────

/// Owns everything a [`SceneAccess`] borrows, for exercising entities outside
/// a scene.
#[cfg(test)]
pub(crate) struct Harness {
    pub time: Time,
    pub input: InputState,
    pub tasks: TaskScheduler,
    pub view: CameraView,
    pub entities: EntityStore,
    pub grid: Grid,
    pub commands: Commands,
}

#[cfg(test)]
impl Harness {
    pub fn new() -> Self {
        Self {
            time: Time::new(),
            input: InputState::new(),
            tasks: TaskScheduler::new(),
            view: CameraView::default(),
            entities: EntityStore::new(),
            grid: Grid::new(8.0),
            commands: Commands::new(),
        }
    }

    pub fn access(&mut self) -> SceneAccess<'_> {
        SceneAccess {
            time: &self.time,
            input: &self.input,
            tasks: &mut self.tasks,
            view: &self.view,
            entities: &self.entities,
            grid: &self.grid,
            commands: &mut self.commands,
        }
    }
}
