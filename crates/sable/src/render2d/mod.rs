//! # Render2d — Sprites
//!
//! [`SpriteDisplay`] is the basic world-space renderable: a textured (or
//! solid-colored) quad centered on its entity. It converts its world rectangle
//! to pixels through the scene's [`CameraView`] and hands a [`Quad`] to the
//! backend.
//!
//! Culling is a single AABB test against the camera's world bounds; sprites
//! entirely outside the view are never submitted.
//!
//! The [`Pivot`] says which point of the sprite sits on the entity position:
//!
//! ```text
//!  (0,1)──(0.5,1)──(1,1)
//!    │               │
//!  (0,0.5)  CENTER (1,0.5)
//!    │               │
//!  (0,0)──(0.5,0)──(1,0)      BOTTOM_CENTER = feet on the position
//! ```
//!
//! [`animation`] adds sprite-sheet playback on top, [`composite`] layers
//! several parts on one entity and [`tilemap`] draws tile grids.

pub mod animation;
pub mod composite;
pub mod tilemap;

pub use animation::{AnimationClip, Animator, SpriteSheet};
pub use composite::{CompositeSpriteDisplay, SpritePart};
pub use tilemap::TileMap;

use crate::camera::CameraView;
use crate::ecs::{Module, ModuleMeta, Transform};
use crate::math::{BoundingBox, Rect, Vec2};
use crate::render::{Color, Quad, Renderable, ShaderHandle, Surface, TextureHandle};

/// Named anchor points, as fractions of a sprite's size from its
/// bottom-left corner.
pub struct Pivot;

impl Pivot {
    pub const TOP_LEFT: Vec2 = Vec2::new(0.0, 1.0);
    pub const TOP_CENTER: Vec2 = Vec2::new(0.5, 1.0);
    pub const TOP_RIGHT: Vec2 = Vec2::new(1.0, 1.0);
    pub const CENTER: Vec2 = Vec2::new(0.5, 0.5);
    pub const BOTTOM_LEFT: Vec2 = Vec2::new(0.0, 0.0);
    pub const BOTTOM_CENTER: Vec2 = Vec2::new(0.5, 0.0);
    pub const BOTTOM_RIGHT: Vec2 = Vec2::new(1.0, 0.0);
}

/// World rectangle of a `size` sprite whose `pivot` sits on `anchor`.
pub(crate) fn pivot_bounds(anchor: Vec2, size: Vec2, pivot: Vec2) -> BoundingBox {
    let min = anchor - size * pivot;
    BoundingBox::new(min, min + size)
}

/// A sprite drawn in the world pass.
///
/// Without a texture, the sprite renders as a solid colored quad using the
/// built-in 1x1 white texture.
#[derive(Debug, Clone)]
pub struct SpriteDisplay {
    pub texture: TextureHandle,
    /// UV sub-region of the texture. Defaults to the full texture.
    pub region: Rect,
    /// Size in world units.
    pub size: Vec2,
    /// Tint color multiplied with the texture sample.
    pub tint: Color,
    pub flip_x: bool,
    /// The point placed on the entity position. See [`Pivot`].
    pub pivot: Vec2,
    pub layer: i32,
    pub shader: Option<ShaderHandle>,
}

impl SpriteDisplay {
    /// A white 1x1 world-unit sprite.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn texture(mut self, texture: TextureHandle) -> Self {
        self.texture = texture;
        self
    }

    pub fn region(mut self, region: Rect) -> Self {
        self.region = region;
        self
    }

    pub fn size(mut self, width: f32, height: f32) -> Self {
        self.size = Vec2::new(width, height);
        self
    }

    pub fn color(mut self, tint: Color) -> Self {
        self.tint = tint;
        self
    }

    pub fn pivot(mut self, pivot: Vec2) -> Self {
        self.pivot = pivot;
        self
    }

    pub fn layer(mut self, layer: i32) -> Self {
        self.layer = layer;
        self
    }

    pub fn shader(mut self, shader: ShaderHandle) -> Self {
        self.shader = Some(shader);
        self
    }

    /// World-space rectangle covered by the sprite.
    pub fn bounds(&self, transform: &Transform) -> BoundingBox {
        pivot_bounds(transform.position(), self.size * transform.scale, self.pivot)
    }
}

impl Default for SpriteDisplay {
    fn default() -> Self {
        Self {
            texture: TextureHandle::WHITE,
            region: Rect::FULL,
            size: Vec2::ONE,
            tint: Color::WHITE,
            flip_x: false,
            pivot: Pivot::CENTER,
            layer: 0,
            shader: None,
        }
    }
}

impl Renderable for SpriteDisplay {
    fn layer(&self) -> i32 {
        self.layer
    }

    fn is_visible(&self, transform: &Transform, view: &CameraView) -> bool {
        self.bounds(transform).intersects(&view.world_bounds)
    }

    fn draw(&self, transform: &Transform, view: &CameraView, surface: &mut dyn Surface) {
        let region = if self.flip_x {
            self.region.flipped_x()
        } else {
            self.region
        };
        let bounds = self.bounds(transform);
        surface.draw_quad(&Quad {
            texture: self.texture,
            region,
            position: view.world_to_screen(bounds.center()),
            size: view.world_size_to_screen(bounds.size()),
            rotation: transform.rotation + view.rotation,
            tint: self.tint,
        });
    }

    fn shader(&self) -> Option<ShaderHandle> {
        self.shader
    }
}

impl Module for SpriteDisplay {
    fn render_world(&self) -> Option<&dyn Renderable> {
        Some(self)
    }
}

impl ModuleMeta for SpriteDisplay {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::HeadlessSurface;

    #[test]
    fn culled_outside_view() {
        let sprite = SpriteDisplay::new().size(2.0, 2.0);
        let view = CameraView::default();
        let inside = Transform::new().at(Vec2::new(10.0, 10.0));
        let outside = Transform::new().at(Vec2::new(100.0, 0.0));
        let edge = Transform::new().at(Vec2::new(25.5, 0.0));

        assert!(sprite.is_visible(&inside, &view));
        assert!(!sprite.is_visible(&outside, &view));
        assert!(sprite.is_visible(&edge, &view));
    }

    #[test]
    fn draws_in_pixels() {
        let sprite = SpriteDisplay::new().size(2.0, 1.0).color(Color::RED);
        let view = CameraView::default();
        let mut surface = HeadlessSurface::default();
        sprite.draw(&Transform::new().at(Vec2::new(1.0, 1.0)), &view, &mut surface);

        let quad = surface.quads().next().copied().unwrap();
        assert_eq!(quad.position, Vec2::new(416.0, 284.0));
        assert_eq!(quad.size, Vec2::new(32.0, 16.0));
        assert_eq!(quad.tint, Color::RED);
        assert_eq!(quad.texture, TextureHandle::WHITE);
    }

    #[test]
    fn pivot_moves_the_sprite_off_its_position() {
        let sprite = SpriteDisplay::new().size(2.0, 4.0).pivot(Pivot::BOTTOM_CENTER);
        let transform = Transform::new().at(Vec2::new(1.0, 0.0));

        let bounds = sprite.bounds(&transform);
        assert_eq!(bounds, BoundingBox::new(Vec2::new(0.0, 0.0), Vec2::new(2.0, 4.0)));

        let mut surface = HeadlessSurface::default();
        sprite.draw(&transform, &CameraView::default(), &mut surface);
        let quad = surface.quads().next().copied().unwrap();
        // Center (1, 2) in pixels.
        assert_eq!(quad.position, Vec2::new(416.0, 268.0));
    }
}
