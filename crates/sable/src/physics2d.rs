//! # Physics2d — AABB Push-Out
//!
//! Not a rigid-body simulation. Colliders are axis-aligned boxes; each frame
//! overlapping pairs are separated along the axis of least penetration and
//! nothing else happens: no velocities, no restitution, no sleeping.
//!
//! ```text
//!    ┌──────┐                       ┌──────┐
//!    │  A ┌─┼────┐    overlap x=1   │  A   │┌──────┐
//!    │    │ │ B  │    overlap y=3   │      ││  B   │   B pushed +x by 1
//!    └────┼─┘    │  ─────────────▶  └──────┘│      │
//!         └──────┘                          └──────┘
//! ```
//!
//! ## Who moves
//!
//! For a pair (me, other) where `me` is the entity being iterated:
//!
//! - both static: nothing
//! - `other` static: `me` is pushed out of `other`
//! - otherwise: `other` is pushed out of `me`
//!
//! Candidates come from the pass's own [`Grid`], queried with a radius of
//! twice the cell size around each collider entity. Colliders larger than
//! that can miss each other.

use crate::ecs::{Entity, EntityId, EntityStore, Module, ModuleMeta};
use crate::grid::Grid;
use crate::math::{BoundingBox, Vec2};

/// An axis-aligned box collider centered on its entity plus `offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxCollider {
    pub size: Vec2,
    pub offset: Vec2,
    /// Static colliders push others but are never pushed.
    pub is_static: bool,
}

impl BoxCollider {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Vec2::new(width, height),
            offset: Vec2::ZERO,
            is_static: false,
        }
    }

    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    pub fn fixed(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// World-space box for an entity at `position`.
    pub fn bounds(&self, position: Vec2) -> BoundingBox {
        BoundingBox::from_center(position + self.offset, self.size)
    }
}

impl Module for BoxCollider {}

impl ModuleMeta for BoxCollider {}

/// Displacement that moves `moving` out of `fixed`, or `None` if they do not
/// overlap.
pub fn push_out(moving: &BoundingBox, fixed: &BoundingBox) -> Option<Vec2> {
    if !moving.intersects(fixed) {
        return None;
    }

    let overlap_x = (moving.right() - fixed.left()).min(fixed.right() - moving.left());
    let overlap_y = (moving.top() - fixed.bottom()).min(fixed.top() - moving.bottom());

    let adjustment = if overlap_x < overlap_y {
        let dx = if moving.left() < fixed.left() { -overlap_x } else { overlap_x };
        Vec2::new(dx, 0.0)
    } else {
        let dy = if moving.bottom() < fixed.bottom() { -overlap_y } else { overlap_y };
        Vec2::new(0.0, dy)
    };
    Some(adjustment)
}

/// The per-scene collision pass.
pub struct Physics {
    grid: Grid,
}

impl Physics {
    pub fn new(cell_size: f32) -> Self {
        Self {
            grid: Grid::new(cell_size),
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Track `entity` if it carries a collider, stop tracking it otherwise.
    pub fn sync_entity(&mut self, entity: &Entity) {
        if entity.has_module::<BoxCollider>() {
            if !self.grid.contains(entity.id()) {
                self.grid.insert(entity.id(), entity.position());
                log::debug!("Registered entity {} ({}) with physics", entity.id(), entity.name());
            }
        } else if self.grid.remove(entity.id()) {
            log::debug!("Unregistered entity {} ({}) from physics", entity.id(), entity.name());
        }
    }

    pub fn remove_entity(&mut self, entity: EntityId) {
        self.grid.remove(entity);
    }

    pub fn entity_moved(&mut self, entity: EntityId, position: Vec2) {
        self.grid.relocate(entity, position);
    }

    /// Resolve overlaps once. Returns the entities that were pushed, in the
    /// order they were first pushed.
    pub fn step(&mut self, entities: &mut EntityStore) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self.grid.members().collect();
        ids.sort();

        let radius = self.grid.cell_size() * 2.0;
        let mut moved = Vec::new();

        for me in ids {
            let Some(center) = entities.get(me).map(Entity::position) else {
                continue;
            };
            for other in self.grid.query_radius(center, radius) {
                if other == me {
                    continue;
                }
                self.resolve_pair(entities, me, other, &mut moved);
            }
        }

        self.grid.process_removal();
        moved
    }

    fn resolve_pair(
        &mut self,
        entities: &mut EntityStore,
        me: EntityId,
        other: EntityId,
        moved: &mut Vec<EntityId>,
    ) {
        let (Some(mine), Some(theirs)) = (colliders(entities, me), colliders(entities, other))
        else {
            return;
        };

        for a in &mine {
            for b in &theirs {
                if a.is_static && b.is_static {
                    continue;
                }
                let (target, moving, fixed, fixed_owner) = if b.is_static {
                    (me, a, b, other)
                } else {
                    (other, b, a, me)
                };
                self.push(entities, target, moving, fixed_owner, fixed, moved);
            }
        }
    }

    fn push(
        &mut self,
        entities: &mut EntityStore,
        target: EntityId,
        moving: &BoxCollider,
        fixed_owner: EntityId,
        fixed: &BoxCollider,
        moved: &mut Vec<EntityId>,
    ) {
        let Some(fixed_at) = entities.get(fixed_owner).map(Entity::position) else {
            return;
        };
        let Some(entity) = entities.get_mut(target) else {
            return;
        };
        let Some(adjustment) = push_out(&moving.bounds(entity.position()), &fixed.bounds(fixed_at))
        else {
            return;
        };
        if adjustment == Vec2::ZERO {
            return;
        }

        let position = entity.position() + adjustment;
        entity.set_position(position);
        self.grid.relocate(target, position);
        if !moved.contains(&target) {
            moved.push(target);
        }
    }
}

fn colliders(entities: &EntityStore, id: EntityId) -> Option<Vec<BoxCollider>> {
    let entity = entities.get(id)?;
    let colliders: Vec<BoxCollider> = entity.modules::<BoxCollider>().into_iter().copied().collect();
    (!colliders.is_empty()).then_some(colliders)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::Runtime;

    fn store_with(entities: Vec<Entity>) -> EntityStore {
        let mut store = EntityStore::new();
        for e in entities {
            assert!(store.insert(e).is_ok());
        }
        store
    }

    #[test]
    fn pushes_along_least_overlap() {
        let a = BoundingBox::new(Vec2::new(0.0, 0.0), Vec2::new(4.0, 4.0));
        let b = BoundingBox::new(Vec2::new(3.0, 1.0), Vec2::new(7.0, 5.0));
        assert_eq!(push_out(&b, &a), Some(Vec2::new(1.0, 0.0)));
        assert_eq!(push_out(&a, &b), Some(Vec2::new(-1.0, 0.0)));

        let c = BoundingBox::new(Vec2::new(1.0, 3.5), Vec2::new(3.0, 7.5));
        assert_eq!(push_out(&c, &a), Some(Vec2::new(0.0, 0.5)));
    }

    #[test]
    fn separated_boxes_do_not_move() {
        let a = BoundingBox::new(Vec2::ZERO, Vec2::ONE);
        let b = BoundingBox::new(Vec2::new(5.0, 5.0), Vec2::new(6.0, 6.0));
        assert_eq!(push_out(&a, &b), None);
    }

    #[test]
    fn dynamic_collider_is_pushed_off_static_one() {
        let runtime = Runtime::with_builtins();
        let wall = runtime.entity("wall").at(0.0, 0.0).with_module(BoxCollider::new(4.0, 4.0).fixed());
        let player = runtime.entity("player").at(3.0, 0.5).with_module(BoxCollider::new(4.0, 4.0));
        let (wall_id, player_id) = (wall.id(), player.id());

        let mut physics = Physics::new(8.0);
        physics.sync_entity(&wall);
        physics.sync_entity(&player);
        let mut store = store_with(vec![wall, player]);

        let moved = physics.step(&mut store);

        assert_eq!(moved, vec![player_id]);
        assert_eq!(store.get(player_id).unwrap().position(), Vec2::new(4.0, 0.5));
        assert_eq!(store.get(wall_id).unwrap().position(), Vec2::ZERO);
    }

    #[test]
    fn static_pairs_never_resolve() {
        let runtime = Runtime::with_builtins();
        let a = runtime.entity("a").with_module(BoxCollider::new(2.0, 2.0).fixed());
        let b = runtime.entity("b").at(1.0, 0.0).with_module(BoxCollider::new(2.0, 2.0).fixed());
        let mut physics = Physics::new(8.0);
        physics.sync_entity(&a);
        physics.sync_entity(&b);
        let mut store = store_with(vec![a, b]);

        assert!(physics.step(&mut store).is_empty());
    }

    #[test]
    fn entities_without_colliders_are_not_tracked() {
        let runtime = Runtime::with_builtins();
        let mut e = runtime.entity("e");
        let mut physics = Physics::new(8.0);
        physics.sync_entity(&e);
        assert!(physics.grid().is_empty());

        let collider = e.add_module(BoxCollider::new(1.0, 1.0));
        physics.sync_entity(&e);
        assert!(physics.grid().contains(e.id()));

        e.remove_module(collider);
        physics.sync_entity(&e);
        assert!(!physics.grid().contains(e.id()));
    }
}
