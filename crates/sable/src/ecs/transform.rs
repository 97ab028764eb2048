//! # Transform — Position in the Entity Hierarchy
//!
//! Every [`Entity`](super::Entity) owns exactly one [`Transform`]. Its world
//! position is the parent's world position plus the local offset:
//!
//! ```text
//! root   local (10, 0)  origin (0, 0)   → world (10, 0)
//!  └ child local (2, 3) origin (10, 0)  → world (12, 3)
//! ```
//!
//! The transform stores the parent's world position as `origin`, so changing
//! the local offset never has to look the parent up. When a parent moves, the
//! scene walks the children and refreshes their origin.
//!
//! ## Kinds
//!
//! [`TransformKind::Plain`] is a point. [`TransformKind::Rect`] additionally
//! carries a size, used by UI elements for layout and hit-testing. Attaching
//! a module that requires a rectangle converts the transform in place:
//! position, parent and children are kept.
//!
//! ## Move tracking
//!
//! Whenever the world position actually changes, the transform remembers the
//! position it had before the *first* change since the scene last looked.
//! The scene turns that into a moved event for the spatial grid and the
//! render-order layer.

use crate::ecs::EntityId;
use crate::math::{BoundingBox, Vec2};

/// Plain point transform or rectangle-bearing transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransformKind {
    Plain,
    Rect { size: Vec2 },
}

#[derive(Debug, Clone)]
pub struct Transform {
    local: Vec2,
    origin: Vec2,
    pub rotation: f32,
    pub scale: Vec2,
    kind: TransformKind,
    pub(crate) parent: Option<EntityId>,
    pub(crate) children: Vec<EntityId>,
    moved_from: Option<Vec2>,
}

impl Transform {
    pub fn new() -> Self {
        Self {
            local: Vec2::ZERO,
            origin: Vec2::ZERO,
            rotation: 0.0,
            scale: Vec2::ONE,
            kind: TransformKind::Plain,
            parent: None,
            children: Vec::new(),
            moved_from: None,
        }
    }

    /// World-space position.
    pub fn position(&self) -> Vec2 {
        self.origin + self.local
    }

    /// Position relative to the parent (equal to the world position for roots).
    pub fn local_position(&self) -> Vec2 {
        self.local
    }

    /// Move to a world-space position.
    pub fn set_position(&mut self, position: Vec2) {
        self.set_local_position(position - self.origin);
    }

    pub fn set_local_position(&mut self, local: Vec2) {
        let before = self.position();
        self.local = local;
        self.note_move(before);
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.set_local_position(self.local + delta);
    }

    /// The parent moved, or this transform was attached under a new parent.
    pub(crate) fn set_origin(&mut self, origin: Vec2) {
        let before = self.position();
        self.origin = origin;
        self.note_move(before);
    }

    /// Reparent while keeping the world position.
    pub(crate) fn rebase(&mut self, origin: Vec2) {
        let world = self.position();
        self.origin = origin;
        self.local = world - origin;
    }

    fn note_move(&mut self, before: Vec2) {
        if self.position() != before && self.moved_from.is_none() {
            self.moved_from = Some(before);
        }
    }

    /// The world position before the first unobserved move, if any.
    pub(crate) fn take_moved_from(&mut self) -> Option<Vec2> {
        let previous = self.moved_from.take()?;
        (previous != self.position()).then_some(previous)
    }

    pub fn kind(&self) -> TransformKind {
        self.kind
    }

    pub fn is_rect(&self) -> bool {
        matches!(self.kind, TransformKind::Rect { .. })
    }

    /// Convert to a rectangle transform, keeping position and links.
    /// An existing rectangle keeps its size.
    pub fn make_rect(&mut self) {
        if !self.is_rect() {
            self.kind = TransformKind::Rect { size: Vec2::ZERO };
        }
    }

    /// Set the rectangle size, converting to a rectangle transform if needed.
    pub fn set_size(&mut self, size: Vec2) {
        self.kind = TransformKind::Rect { size };
    }

    pub fn size(&self) -> Option<Vec2> {
        match self.kind {
            TransformKind::Rect { size } => Some(size * self.scale),
            TransformKind::Plain => None,
        }
    }

    /// The scaled rectangle centered on the world position.
    pub fn rect(&self) -> Option<BoundingBox> {
        self.size().map(|size| BoundingBox::from_center(self.position(), size))
    }

    pub fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    pub fn children(&self) -> &[EntityId] {
        &self.children
    }

    // ── Builder helpers ──

    pub fn at(mut self, position: Vec2) -> Self {
        self.local = position;
        self
    }

    pub fn with_size(mut self, size: Vec2) -> Self {
        self.kind = TransformKind::Rect { size };
        self
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}
