//! # Spatial Grid — Proximity Queries over Moving Entities
//!
//! Entities are bucketed into square cells of a fixed size, keyed by
//! `floor(position / cell_size)`:
//!
//! ```text
//!        x: -1       0        1
//!      ┌────────┬────────┬────────┐
//!  y 0 │        │  a  b  │        │   a at (2, 3), b at (7, 1)  → cell (0, 0)
//!      ├────────┼────────┼────────┤   c at (9, -2)              → cell (1, -1)
//! y -1 │        │        │   c    │
//!      └────────┴────────┴────────┘
//! ```
//!
//! Range queries enumerate every existing cell whose key falls in the query's
//! key range and flatten their members. Each tracked entity lives in exactly
//! one cell, so results need no deduplication.
//!
//! ## Deferred Eviction
//!
//! When a cell loses its last member it is not deleted right away but
//! marked. [`process_removal`](Grid::process_removal), called once per frame,
//! deletes marked cells that are still empty. An entity oscillating across a
//! cell boundary within one frame therefore reuses the existing cell instead
//! of freeing and reallocating it.
//!
//! The grid remembers each member's cell, so a move only needs the new
//! position.

use std::collections::{HashMap, HashSet};

use crate::ecs::EntityId;
use crate::math::{BoundingBox, Vec2};

/// Integer cell coordinates.
pub type CellKey = (i32, i32);

/// One bucket of the grid.
#[derive(Debug, Default)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
    entities: HashSet<EntityId>,
}

impl Cell {
    fn new((x, y): CellKey) -> Self {
        Self {
            x,
            y,
            entities: HashSet::new(),
        }
    }

    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

pub struct Grid {
    cell_size: f32,
    cells: HashMap<CellKey, Cell>,
    members: HashMap<EntityId, CellKey>,
    pending_removal: HashSet<CellKey>,
}

impl Grid {
    /// # Panics
    ///
    /// Panics if `cell_size` is not a positive finite number.
    pub fn new(cell_size: f32) -> Self {
        assert!(
            cell_size.is_finite() && cell_size > 0.0,
            "Grid cell size must be positive, got {cell_size}"
        );
        Self {
            cell_size,
            cells: HashMap::new(),
            members: HashMap::new(),
            pending_removal: HashSet::new(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn key(&self, position: Vec2) -> CellKey {
        (
            (position.x / self.cell_size).floor() as i32,
            (position.y / self.cell_size).floor() as i32,
        )
    }

    /// Start tracking `entity` at `position`. Re-inserting an already tracked
    /// entity moves it.
    pub fn insert(&mut self, entity: EntityId, position: Vec2) {
        if self.members.contains_key(&entity) {
            self.relocate(entity, position);
            return;
        }
        let key = self.key(position);
        self.add_to_cell(entity, key);
    }

    /// Stop tracking `entity`. Returns `false` if it was not tracked.
    pub fn remove(&mut self, entity: EntityId) -> bool {
        let Some(key) = self.members.remove(&entity) else {
            return false;
        };
        self.remove_from_cell(entity, key);
        true
    }

    /// Update a tracked entity's cell after it moved to `position`.
    /// Untracked entities are ignored.
    pub fn relocate(&mut self, entity: EntityId, position: Vec2) {
        let Some(&old) = self.members.get(&entity) else {
            return;
        };
        let new = self.key(position);
        if old == new {
            return;
        }
        self.remove_from_cell(entity, old);
        self.add_to_cell(entity, new);
    }

    fn add_to_cell(&mut self, entity: EntityId, key: CellKey) {
        self.cells
            .entry(key)
            .or_insert_with(|| Cell::new(key))
            .entities
            .insert(entity);
        self.pending_removal.remove(&key);
        self.members.insert(entity, key);
    }

    fn remove_from_cell(&mut self, entity: EntityId, key: CellKey) {
        if let Some(cell) = self.cells.get_mut(&key) {
            cell.entities.remove(&entity);
            if cell.entities.is_empty() {
                self.pending_removal.insert(key);
            }
        }
    }

    /// Delete every marked cell that is still empty.
    pub fn process_removal(&mut self) {
        for key in self.pending_removal.drain() {
            if self.cells.get(&key).is_some_and(Cell::is_empty) {
                self.cells.remove(&key);
            }
        }
    }

    /// Keys of existing cells overlapping the box, including empty cells
    /// that are waiting for eviction. Boxes spanning more keys than there
    /// are cells scan the cell map instead of the key range.
    pub fn query_cells(&self, min: Vec2, max: Vec2) -> Vec<CellKey> {
        let (x0, y0) = self.key(min);
        let (x1, y1) = self.key(max);
        if x0 > x1 || y0 > y1 {
            return Vec::new();
        }
        let width = i64::from(x1) - i64::from(x0) + 1;
        let height = i64::from(y1) - i64::from(y0) + 1;
        let span = width.saturating_mul(height);
        if span > self.cells.len() as i64 {
            return self
                .cells
                .keys()
                .filter(|(x, y)| (x0..=x1).contains(x) && (y0..=y1).contains(y))
                .copied()
                .collect();
        }

        let mut keys = Vec::new();
        for x in x0..=x1 {
            for y in y0..=y1 {
                if self.cells.contains_key(&(x, y)) {
                    keys.push((x, y));
                }
            }
        }
        keys
    }

    /// Members of every cell overlapping the box.
    pub fn query_box(&self, min: Vec2, max: Vec2) -> Vec<EntityId> {
        self.query_cells(min, max)
            .into_iter()
            .filter_map(|key| self.cells.get(&key))
            .flat_map(|cell| cell.entities.iter().copied())
            .collect()
    }

    pub fn query_bounds(&self, bounds: &BoundingBox) -> Vec<EntityId> {
        self.query_box(bounds.min, bounds.max)
    }

    /// Members of every cell overlapping the square of half-size `radius`
    /// around `center`. Callers needing a true circle filter the result.
    pub fn query_radius(&self, center: Vec2, radius: f32) -> Vec<EntityId> {
        let r = Vec2::splat(radius.abs());
        self.query_box(center - r, center + r)
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.members.contains_key(&entity)
    }

    /// Every tracked entity, in no particular order.
    pub fn members(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.members.keys().copied()
    }

    /// The cell `entity` is tracked in.
    pub fn cell_of(&self, entity: EntityId) -> Option<CellKey> {
        self.members.get(&entity).copied()
    }

    pub fn cell(&self, key: CellKey) -> Option<&Cell> {
        self.cells.get(&key)
    }

    pub fn has_cell(&self, key: CellKey) -> bool {
        self.cells.contains_key(&key)
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Number of tracked entities.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.members.clear();
        self.pending_removal.clear();
    }
}
