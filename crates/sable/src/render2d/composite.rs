//! Multi-part sprites.
//!
//! A [`CompositeSpriteDisplay`] draws several named [`SpritePart`]s for one
//! entity, such as a body with a separately animated head and weapon. Parts
//! draw in layer order; parts on the same layer keep the order they were
//! added in.
//!
//! ```text
//!  "weapon"  layer 2   ──▶ drawn last
//!  "head"    layer 1
//!  "body"    layer 0   ──▶ drawn first
//! ```

use crate::camera::CameraView;
use crate::ecs::{Module, ModuleMeta, Transform};
use crate::math::{BoundingBox, Rect, Vec2};
use crate::render::{Color, Quad, Renderable, ShaderHandle, Surface, TextureHandle};

use super::{Pivot, pivot_bounds};

/// One layer of a [`CompositeSpriteDisplay`].
#[derive(Debug, Clone)]
pub struct SpritePart {
    pub texture: TextureHandle,
    pub region: Rect,
    /// Position of the pivot, relative to the entity unless the display is
    /// absolute.
    pub offset: Vec2,
    pub size: Vec2,
    pub pivot: Vec2,
    pub tint: Color,
    pub rotation: f32,
    pub scale: f32,
    pub shader: Option<ShaderHandle>,
    layer: i32,
}

impl SpritePart {
    pub fn new(texture: TextureHandle) -> Self {
        Self {
            texture,
            region: Rect::FULL,
            offset: Vec2::ZERO,
            size: Vec2::ONE,
            pivot: Pivot::CENTER,
            tint: Color::WHITE,
            rotation: 0.0,
            scale: 1.0,
            shader: None,
            layer: 0,
        }
    }

    pub fn region(mut self, region: Rect) -> Self {
        self.region = region;
        self
    }

    pub fn offset(mut self, x: f32, y: f32) -> Self {
        self.offset = Vec2::new(x, y);
        self
    }

    pub fn size(mut self, width: f32, height: f32) -> Self {
        self.size = Vec2::new(width, height);
        self
    }

    pub fn pivot(mut self, pivot: Vec2) -> Self {
        self.pivot = pivot;
        self
    }

    pub fn tint(mut self, tint: Color) -> Self {
        self.tint = tint;
        self
    }

    pub fn shader(mut self, shader: ShaderHandle) -> Self {
        self.shader = Some(shader);
        self
    }

    /// Set at construction only; the display sorts parts when they are
    /// added.
    pub fn on_layer(mut self, layer: i32) -> Self {
        self.layer = layer;
        self
    }

    pub fn layer(&self) -> i32 {
        self.layer
    }
}

#[derive(Debug, Clone)]
pub struct CompositeSpriteDisplay {
    pub layer: i32,
    pub shader: Option<ShaderHandle>,
    /// Offsets are relative to the entity position. When `false` they are
    /// world positions.
    pub relative: bool,
    /// Mirror every part, offsets included, around the entity.
    pub flip_x: bool,
    pub rotation: f32,
    pub scale: f32,
    parts: Vec<(String, SpritePart)>,
}

impl CompositeSpriteDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`add`](Self::add).
    pub fn with_part(mut self, name: impl Into<String>, part: SpritePart) -> Self {
        self.add(name, part);
        self
    }

    /// Add a part, replacing any part with the same name.
    pub fn add(&mut self, name: impl Into<String>, part: SpritePart) {
        let name = name.into();
        self.remove(&name);
        let index = self
            .parts
            .iter()
            .position(|(_, p)| p.layer > part.layer)
            .unwrap_or(self.parts.len());
        self.parts.insert(index, (name, part));
    }

    pub fn remove(&mut self, name: &str) -> Option<SpritePart> {
        let index = self.parts.iter().position(|(n, _)| n == name)?;
        Some(self.parts.remove(index).1)
    }

    pub fn get(&self, name: &str) -> Option<&SpritePart> {
        self.parts.iter().find(|(n, _)| n == name).map(|(_, p)| p)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut SpritePart> {
        self.parts.iter_mut().find(|(n, _)| n == name).map(|(_, p)| p)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn clear(&mut self) {
        self.parts.clear();
    }

    /// Part names in draw order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    fn part_bounds(&self, part: &SpritePart, transform: &Transform) -> BoundingBox {
        let mut offset = part.offset;
        let mut pivot = part.pivot;
        if self.flip_x {
            offset.x = -offset.x;
            pivot.x = 1.0 - pivot.x;
        }
        let (anchor, scale) = if self.relative {
            (transform.position() + offset, transform.scale)
        } else {
            (offset, Vec2::ONE)
        };
        pivot_bounds(anchor, part.size * part.scale * self.scale * scale, pivot)
    }

    /// World rectangle around every part. `None` without parts.
    pub fn bounds(&self, transform: &Transform) -> Option<BoundingBox> {
        self.parts
            .iter()
            .map(|(_, part)| self.part_bounds(part, transform))
            .reduce(|a, b| BoundingBox::new(a.min.min(b.min), a.max.max(b.max)))
    }
}

impl Default for CompositeSpriteDisplay {
    fn default() -> Self {
        Self {
            layer: 0,
            shader: None,
            relative: true,
            flip_x: false,
            rotation: 0.0,
            scale: 1.0,
            parts: Vec::new(),
        }
    }
}

impl Renderable for CompositeSpriteDisplay {
    fn layer(&self) -> i32 {
        self.layer
    }

    fn is_visible(&self, transform: &Transform, view: &CameraView) -> bool {
        self.parts
            .iter()
            .any(|(_, part)| self.part_bounds(part, transform).intersects(&view.world_bounds))
    }

    fn draw(&self, transform: &Transform, view: &CameraView, surface: &mut dyn Surface) {
        for (_, part) in &self.parts {
            let bounds = self.part_bounds(part, transform);
            if !bounds.intersects(&view.world_bounds) {
                continue;
            }
            if let Some(shader) = part.shader {
                surface.begin_shader(shader);
            }
            surface.draw_quad(&Quad {
                texture: part.texture,
                region: if self.flip_x { part.region.flipped_x() } else { part.region },
                position: view.world_to_screen(bounds.center()),
                size: view.world_size_to_screen(bounds.size()),
                rotation: transform.rotation + self.rotation + part.rotation + view.rotation,
                tint: part.tint,
            });
            if part.shader.is_some() {
                surface.end_shader();
            }
        }
    }

    fn shader(&self) -> Option<ShaderHandle> {
        self.shader
    }
}

impl Module for CompositeSpriteDisplay {
    fn render_world(&self) -> Option<&dyn Renderable> {
        Some(self)
    }
}

impl ModuleMeta for CompositeSpriteDisplay {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{DrawCall, HeadlessSurface};

    fn part(texture: u32, layer: i32) -> SpritePart {
        SpritePart::new(TextureHandle(texture)).on_layer(layer)
    }

    #[test]
    fn parts_sort_by_layer_then_insertion() {
        let display = CompositeSpriteDisplay::new()
            .with_part("weapon", part(1, 2))
            .with_part("body", part(2, 0))
            .with_part("head", part(3, 1))
            .with_part("shadow", part(4, 0));

        assert_eq!(display.names().collect::<Vec<_>>(), vec!["body", "shadow", "head", "weapon"]);
    }

    #[test]
    fn adding_an_existing_name_replaces_it() {
        let mut display = CompositeSpriteDisplay::new().with_part("head", part(1, 1));
        display.add("head", part(9, 5));

        assert_eq!(display.len(), 1);
        assert_eq!(display.get("head").unwrap().texture, TextureHandle(9));
        assert_eq!(display.get("head").unwrap().layer(), 5);

        assert!(display.remove("head").is_some());
        assert!(display.remove("head").is_none());
        assert!(display.is_empty());
    }

    #[test]
    fn draws_parts_in_order_at_their_offsets() {
        let display = CompositeSpriteDisplay::new()
            .with_part("head", part(2, 1).offset(0.0, 1.0))
            .with_part("body", part(1, 0));
        let mut surface = HeadlessSurface::default();
        display.draw(&Transform::new().at(Vec2::new(1.0, 0.0)), &CameraView::default(), &mut surface);

        let quads: Vec<Quad> = surface.quads().copied().collect();
        assert_eq!(quads.len(), 2);
        assert_eq!(quads[0].texture, TextureHandle(1));
        assert_eq!(quads[0].position, Vec2::new(416.0, 300.0));
        assert_eq!(quads[1].texture, TextureHandle(2));
        assert_eq!(quads[1].position, Vec2::new(416.0, 284.0));
    }

    #[test]
    fn absolute_parts_ignore_the_entity() {
        let mut display = CompositeSpriteDisplay::new().with_part("mark", part(1, 0).offset(2.0, 0.0));
        display.relative = false;
        let transform = Transform::new().at(Vec2::new(100.0, 100.0));

        assert_eq!(
            display.bounds(&transform),
            Some(BoundingBox::new(Vec2::new(1.5, -0.5), Vec2::new(2.5, 0.5)))
        );
        assert!(display.is_visible(&transform, &CameraView::default()));
    }

    #[test]
    fn flipping_mirrors_offsets_and_pivots() {
        let mut display = CompositeSpriteDisplay::new()
            .with_part("arm", part(1, 0).offset(1.0, 0.0).pivot(Pivot::BOTTOM_LEFT));
        display.flip_x = true;

        assert_eq!(
            display.bounds(&Transform::new()),
            Some(BoundingBox::new(Vec2::new(-2.0, 0.0), Vec2::new(-1.0, 1.0)))
        );
    }

    #[test]
    fn part_shaders_wrap_only_that_part() {
        let display = CompositeSpriteDisplay::new()
            .with_part("body", part(1, 0))
            .with_part("glow", part(2, 1).shader(ShaderHandle(7)));
        let mut surface = HeadlessSurface::default();
        display.draw(&Transform::new(), &CameraView::default(), &mut surface);

        let calls = surface.calls();
        assert_eq!(calls.len(), 4);
        assert!(matches!(&calls[0], DrawCall::Quad(q) if q.texture == TextureHandle(1)));
        assert_eq!(calls[1], DrawCall::BeginShader(ShaderHandle(7)));
        assert!(matches!(&calls[2], DrawCall::Quad(q) if q.texture == TextureHandle(2)));
        assert_eq!(calls[3], DrawCall::EndShader);
    }

    #[test]
    fn off_camera_parts_are_skipped() {
        let display = CompositeSpriteDisplay::new()
            .with_part("near", part(1, 0))
            .with_part("far", part(2, 0).offset(200.0, 0.0));
        let mut surface = HeadlessSurface::default();
        display.draw(&Transform::new(), &CameraView::default(), &mut surface);
        assert_eq!(surface.quads().count(), 1);
    }
}
