//! # Render Order — Two Lazily Sorted Draw Lists
//!
//! The scene keeps one list of screen-space renderables and one of
//! world-space renderables. Each entry names an entity and one of its modules:
//!
//! ```text
//! RenderEntry { seq, entity, module }
//! ```
//!
//! ## Sort Key
//!
//! Ascending by:
//!
//! 1. the renderable's layer,
//! 2. world list with Y-sort enabled: the entity's Y position, **descending**
//!    (things higher up the screen are further away and drawn first),
//! 3. entity id,
//! 4. entry sequence number.
//!
//! The last two make the order total, so re-sorting an unchanged list never
//! shuffles ties.
//!
//! ## Dirty Flags
//!
//! Adding or removing an entry, or moving an entity vertically while Y-sort
//! is on, only marks the affected list dirty. The list is sorted once, right
//! before its next draw pass.

use std::cmp::Ordering;
use std::collections::HashMap;

use super::{RenderMode, Renderable, Surface};
use crate::camera::CameraView;
use crate::ecs::{Capability, Entity, EntityId, EntityStore, Module, ModuleId};
use crate::math::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderEntry {
    pub seq: u64,
    pub entity: EntityId,
    pub module: ModuleId,
}

#[derive(Debug, Default)]
pub struct RenderList {
    entries: Vec<RenderEntry>,
    dirty: bool,
}

impl RenderList {
    pub fn entries(&self) -> &[RenderEntry] {
        &self.entries
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub struct RenderOrder {
    screen: RenderList,
    world: RenderList,
    /// World entries per entity, to skip move events for entities that
    /// draw nothing in the world pass.
    world_counts: HashMap<EntityId, usize>,
    next_seq: u64,
    y_sort: bool,
}

fn capability_of(mode: RenderMode) -> Capability {
    match mode {
        RenderMode::Screen => Capability::RenderScreen,
        RenderMode::World => Capability::RenderWorld,
    }
}

fn renderable(module: &dyn Module, mode: RenderMode) -> Option<&dyn Renderable> {
    match mode {
        RenderMode::Screen => module.render_screen(),
        RenderMode::World => module.render_world(),
    }
}

struct SortKey {
    layer: i32,
    y: f32,
    entity: EntityId,
    seq: u64,
}

impl RenderOrder {
    pub fn new(y_sort: bool) -> Self {
        Self {
            screen: RenderList::default(),
            world: RenderList::default(),
            world_counts: HashMap::new(),
            next_seq: 0,
            y_sort,
        }
    }

    pub fn y_sort(&self) -> bool {
        self.y_sort
    }

    pub fn set_y_sort(&mut self, y_sort: bool) {
        if self.y_sort != y_sort {
            self.y_sort = y_sort;
            self.world.dirty = true;
        }
    }

    pub fn list(&self, mode: RenderMode) -> &RenderList {
        match mode {
            RenderMode::Screen => &self.screen,
            RenderMode::World => &self.world,
        }
    }

    fn list_mut(&mut self, mode: RenderMode) -> &mut RenderList {
        match mode {
            RenderMode::Screen => &mut self.screen,
            RenderMode::World => &mut self.world,
        }
    }

    /// Entity ids of the list in its current order.
    pub fn entities(&self, mode: RenderMode) -> Vec<EntityId> {
        self.list(mode).entries.iter().map(|e| e.entity).collect()
    }

    /// Register every renderable module of a freshly spawned entity.
    pub fn add_entity(&mut self, entity: &Entity) {
        for mode in [RenderMode::Screen, RenderMode::World] {
            for module in entity.capability(capability_of(mode)) {
                self.push(mode, entity.id(), *module);
            }
        }
    }

    pub fn remove_entity(&mut self, entity: EntityId) {
        for mode in [RenderMode::Screen, RenderMode::World] {
            let list = self.list_mut(mode);
            let before = list.entries.len();
            list.entries.retain(|e| e.entity != entity);
            if list.entries.len() != before {
                list.dirty = true;
            }
        }
        self.world_counts.remove(&entity);
    }

    /// A module was attached to or detached from a live entity.
    pub fn module_changed(
        &mut self,
        entity: EntityId,
        module: ModuleId,
        capabilities: &[Capability],
        added: bool,
    ) {
        for mode in [RenderMode::Screen, RenderMode::World] {
            if !capabilities.contains(&capability_of(mode)) {
                continue;
            }
            if added {
                self.push(mode, entity, module);
            } else {
                self.remove_entry(mode, entity, module);
            }
        }
    }

    /// An entity's world position changed.
    pub fn entity_moved(&mut self, entity: EntityId, previous: Vec2, current: Vec2) {
        if self.y_sort && previous.y != current.y && self.world_counts.contains_key(&entity) {
            self.world.dirty = true;
        }
    }

    fn push(&mut self, mode: RenderMode, entity: EntityId, module: ModuleId) {
        let seq = self.next_seq;
        self.next_seq += 1;
        let list = self.list_mut(mode);
        list.entries.push(RenderEntry { seq, entity, module });
        list.dirty = true;
        if mode == RenderMode::World {
            *self.world_counts.entry(entity).or_default() += 1;
        }
    }

    fn remove_entry(&mut self, mode: RenderMode, entity: EntityId, module: ModuleId) {
        let list = self.list_mut(mode);
        let before = list.entries.len();
        list.entries.retain(|e| e.module != module);
        let removed = before - list.entries.len();
        if removed == 0 {
            return;
        }
        list.dirty = true;
        if mode == RenderMode::World {
            if let Some(count) = self.world_counts.get_mut(&entity) {
                *count = count.saturating_sub(removed);
                if *count == 0 {
                    self.world_counts.remove(&entity);
                }
            }
        }
    }

    /// Sort a list if it is dirty.
    pub fn sort(&mut self, mode: RenderMode, entities: &EntityStore) {
        let y_sort = self.y_sort && mode == RenderMode::World;
        let list = self.list_mut(mode);
        if !list.dirty {
            return;
        }

        let mut keyed: Vec<(SortKey, RenderEntry)> = list
            .entries
            .drain(..)
            .map(|entry| {
                let entity = entities.get(entry.entity);
                let layer = entity
                    .and_then(|e| e.module_dyn(entry.module))
                    .and_then(|m| renderable(m, mode))
                    .map_or(i32::MAX, |r| r.layer());
                let y = entity.map_or(0.0, |e| e.position().y);
                let key = SortKey {
                    layer,
                    y,
                    entity: entry.entity,
                    seq: entry.seq,
                };
                (key, entry)
            })
            .collect();

        keyed.sort_by(|(a, _), (b, _)| {
            a.layer
                .cmp(&b.layer)
                .then_with(|| if y_sort { b.y.total_cmp(&a.y) } else { Ordering::Equal })
                .then_with(|| a.entity.cmp(&b.entity))
                .then_with(|| a.seq.cmp(&b.seq))
        });

        list.entries = keyed.into_iter().map(|(_, entry)| entry).collect();
        list.dirty = false;
    }

    /// Sort if needed, then draw every visible entry. Returns how many were
    /// drawn.
    pub fn draw(
        &mut self,
        mode: RenderMode,
        entities: &EntityStore,
        view: &CameraView,
        surface: &mut dyn Surface,
    ) -> usize {
        self.sort(mode, entities);

        let mut drawn = 0;
        for entry in &self.list(mode).entries {
            let Some(entity) = entities.get(entry.entity) else {
                continue;
            };
            let Some(r) = entity
                .module_dyn(entry.module)
                .and_then(|m| renderable(m, mode))
            else {
                continue;
            };
            if !r.is_visible(entity.transform(), view) {
                continue;
            }

            match r.shader() {
                Some(shader) => {
                    surface.begin_shader(shader);
                    r.draw(entity.transform(), view, surface);
                    surface.end_shader();
                }
                None => r.draw(entity.transform(), view, surface),
            }
            drawn += 1;
        }
        drawn
    }

    pub fn clear(&mut self) {
        self.screen = RenderList::default();
        self.world = RenderList::default();
        self.world_counts.clear();
    }
}
