//! Math types and glam re-exports.
//!
//! We re-export [glam](https://docs.rs/glam) types so users don't need to
//! depend on it directly. [`BoundingBox`] is the axis-aligned box used by the
//! spatial grid, the camera's visibility tests, colliders and UI hit-testing.
//! [`Rect`] selects a sub-region of a texture.
//!
//! World space is Y-up. Screen space is Y-down with the origin in the top-left
//! corner of the viewport.

use std::ops::{Add, Sub};

pub use glam::{Mat4, Vec2, Vec3, Vec4};

use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box given by its minimum and maximum corners.
///
/// Edges are inclusive: two boxes that only touch still intersect.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Vec2,
    pub max: Vec2,
}

impl BoundingBox {
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// A box of `size` centered on `center`.
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn left(&self) -> f32 {
        self.min.x
    }

    pub fn right(&self) -> f32 {
        self.max.x
    }

    pub fn bottom(&self) -> f32 {
        self.min.y
    }

    pub fn top(&self) -> f32 {
        self.max.y
    }

    /// Returns `true` if the point lies inside or on the edge of the box.
    pub fn contains_point(&self, point: Vec2) -> bool {
        self.min.x <= point.x && self.max.x >= point.x && self.min.y <= point.y && self.max.y >= point.y
    }

    /// Returns `true` if `other` lies entirely within this box.
    pub fn contains(&self, other: &BoundingBox) -> bool {
        self.min.x <= other.min.x
            && self.max.x >= other.max.x
            && self.min.y <= other.min.y
            && self.max.y >= other.max.y
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }
}

impl Add<Vec2> for BoundingBox {
    type Output = BoundingBox;

    fn add(self, offset: Vec2) -> BoundingBox {
        BoundingBox::new(self.min + offset, self.max + offset)
    }
}

impl Sub<Vec2> for BoundingBox {
    type Output = BoundingBox;

    fn sub(self, offset: Vec2) -> BoundingBox {
        BoundingBox::new(self.min - offset, self.max - offset)
    }
}

/// A normalized rectangle within a texture (UV space, 0.0–1.0).
///
/// Used to select a sub-region of a texture for rendering, for example a
/// single frame from a sprite sheet. (0,0) is the top-left corner of the
/// texture and (1,1) the bottom-right.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    /// The full texture (0,0) to (1,1).
    pub const FULL: Self = Self {
        min: Vec2::ZERO,
        max: Vec2::ONE,
    };

    /// Build from pixel coordinates and texture dimensions.
    pub fn from_pixels(x: f32, y: f32, w: f32, h: f32, tex_w: f32, tex_h: f32) -> Self {
        Self {
            min: Vec2::new(x / tex_w, y / tex_h),
            max: Vec2::new((x + w) / tex_w, (y + h) / tex_h),
        }
    }

    /// Mirror the region horizontally.
    pub fn flipped_x(self) -> Self {
        Self {
            min: Vec2::new(self.max.x, self.min.y),
            max: Vec2::new(self.min.x, self.max.y),
        }
    }
}

impl Default for Rect {
    fn default() -> Self {
        Self::FULL
    }
}
