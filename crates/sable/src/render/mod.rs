//! # Render — Draw Surface and Render Ordering
//!
//! The engine does not talk to a GPU itself. A backend implements
//! [`Surface`], a handful of immediate-mode primitives in screen pixels, and
//! the engine decides *what* to draw and *in which order*.
//!
//! ```text
//!  Module::render_world()  ──►  RenderOrder (world list)  ──┐
//!  Module::render_screen() ──►  RenderOrder (screen list) ──┤ sort if dirty
//!                                                           ▼
//!                                     visible? ──► Renderable::draw(surface)
//! ```
//!
//! Each frame the scene draws the world list first and the screen list on
//! top. Within a list, entries are drawn back to front (painter's
//! algorithm); see [`order`] for the sort key.
//!
//! - [`order`] — the two sorted draw lists
//! - [`headless`] — a recording surface for tests and tools

pub mod headless;
pub mod order;

pub use headless::{DrawCall, HeadlessSurface};
pub use order::{RenderEntry, RenderList, RenderOrder};

use serde::{Deserialize, Serialize};

use crate::camera::CameraView;
use crate::ecs::Transform;
use crate::math::{BoundingBox, Rect, Vec2};

/// An RGBA color with floating-point components in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Self = Self { r: 1.0, g: 1.0, b: 1.0, a: 1.0 };
    pub const BLACK: Self = Self { r: 0.0, g: 0.0, b: 0.0, a: 1.0 };
    pub const RED: Self = Self { r: 1.0, g: 0.0, b: 0.0, a: 1.0 };
    pub const GREEN: Self = Self { r: 0.0, g: 1.0, b: 0.0, a: 1.0 };
    pub const BLUE: Self = Self { r: 0.0, g: 0.0, b: 1.0, a: 1.0 };
    pub const TRANSPARENT: Self = Self { r: 0.0, g: 0.0, b: 0.0, a: 0.0 };

    /// Create a color from RGB (alpha = 1).
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Create a color from RGBA.
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Opaque handle to a texture owned by the backend or the asset store.
/// Handle 0 is the built-in 1x1 white texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureHandle(pub u32);

impl TextureHandle {
    pub const WHITE: Self = Self(0);
}

/// Opaque handle to a backend shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub u32);

/// Which pass a renderable draws in.
///
/// The order of the variants is the order UI canvases are hit-tested in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RenderMode {
    /// Screen pixels, Y down, unaffected by the camera.
    Screen,
    /// World units through the camera.
    World,
}

/// One textured quad, in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    pub texture: TextureHandle,
    /// Sub-region of the texture.
    pub region: Rect,
    /// Center of the quad.
    pub position: Vec2,
    pub size: Vec2,
    /// Radians, clockwise on screen.
    pub rotation: f32,
    pub tint: Color,
}

/// The drawing primitives a graphics backend provides.
pub trait Surface {
    /// Current viewport size in pixels.
    fn viewport(&self) -> Vec2;

    fn draw_quad(&mut self, quad: &Quad);

    fn draw_rect(&mut self, bounds: BoundingBox, color: Color, filled: bool);

    fn begin_shader(&mut self, _shader: ShaderHandle) {}

    fn end_shader(&mut self) {}
}

/// Something a module can draw. Returned from
/// [`Module::render_world`](crate::ecs::Module::render_world) or
/// [`Module::render_screen`](crate::ecs::Module::render_screen).
pub trait Renderable {
    /// Lower layers are drawn first.
    fn layer(&self) -> i32 {
        0
    }

    /// Cheap culling test against the camera.
    fn is_visible(&self, _transform: &Transform, _view: &CameraView) -> bool {
        true
    }

    fn draw(&self, transform: &Transform, view: &CameraView, surface: &mut dyn Surface);

    /// A shader to wrap this renderable's draw call in.
    fn shader(&self) -> Option<ShaderHandle> {
        None
    }
}
