//! # Tile Maps
//!
//! A [`TileMap`] is a fixed-size grid of sprite-sheet frames anchored at its
//! entity's position. Tile `(x, y)` covers one world unit:
//!
//! ```text
//!  y
//!  2 ┌───┬───┬───┐
//!    │ 4 │ · │ 4 │     · = empty
//!  1 ├───┼───┼───┤     n = frame n of the sheet
//!    │ 0 │ 1 │ 1 │
//!  0 └───┴───┴───┘
//!    0   1   2   3  x   (relative to the entity position)
//! ```
//!
//! Drawing only walks the tiles under the camera's world bounds, so a large
//! map costs as much as the visible part of it.

use std::ops::Range;

use crate::camera::CameraView;
use crate::ecs::{Module, ModuleMeta, Transform};
use crate::math::{BoundingBox, Vec2};
use crate::render::{Color, Quad, Renderable, ShaderHandle, Surface, TextureHandle};

use super::SpriteSheet;

pub struct TileMap {
    pub texture: TextureHandle,
    pub sheet: SpriteSheet,
    pub tint: Color,
    pub layer: i32,
    pub shader: Option<ShaderHandle>,
    width: u32,
    height: u32,
    tiles: Vec<Option<u32>>,
}

impl TileMap {
    /// An empty `width` x `height` map drawn on layer -1, below sprites.
    pub fn new(texture: TextureHandle, sheet: SpriteSheet, width: u32, height: u32) -> Self {
        Self {
            texture,
            sheet,
            tint: Color::WHITE,
            layer: -1,
            shader: None,
            width,
            height,
            tiles: vec![None; width as usize * height as usize],
        }
    }

    pub fn layer(mut self, layer: i32) -> Self {
        self.layer = layer;
        self
    }

    pub fn shader(mut self, shader: ShaderHandle) -> Self {
        self.shader = Some(shader);
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y as usize * self.width as usize + x as usize)
    }

    /// Set tile `(x, y)` to a sheet frame. Returns `false` outside the map.
    pub fn set_tile(&mut self, x: u32, y: u32, frame: u32) -> bool {
        self.replace(x, y, Some(frame))
    }

    pub fn clear_tile(&mut self, x: u32, y: u32) -> bool {
        self.replace(x, y, None)
    }

    fn replace(&mut self, x: u32, y: u32, tile: Option<u32>) -> bool {
        let Some(index) = self.index(x, y) else {
            log::warn!("Tile ({x}, {y}) is outside the {}x{} map", self.width, self.height);
            return false;
        };
        self.tiles[index] = tile;
        true
    }

    pub fn fill(&mut self, frame: u32) {
        self.tiles.fill(Some(frame));
    }

    pub fn clear(&mut self) {
        self.tiles.fill(None);
    }

    /// The frame at `(x, y)`. `None` for empty tiles and positions outside
    /// the map.
    pub fn tile(&self, x: u32, y: u32) -> Option<u32> {
        self.index(x, y).and_then(|i| self.tiles[i])
    }

    /// World rectangle covered by the whole map.
    pub fn bounds(&self, transform: &Transform) -> BoundingBox {
        let origin = transform.position();
        BoundingBox::new(origin, origin + Vec2::new(self.width as f32, self.height as f32))
    }

    /// Tile columns and rows under `view`, clamped to the map.
    pub fn visible_range(&self, transform: &Transform, view: &CameraView) -> (Range<u32>, Range<u32>) {
        let origin = transform.position();
        let bounds = view.world_bounds;
        let clamp = |v: f32, limit: u32| v.clamp(0.0, limit as f32) as u32;
        let xs = clamp((bounds.min.x - origin.x).floor(), self.width)
            ..clamp((bounds.max.x - origin.x).ceil(), self.width);
        let ys = clamp((bounds.min.y - origin.y).floor(), self.height)
            ..clamp((bounds.max.y - origin.y).ceil(), self.height);
        (xs, ys)
    }
}

impl Renderable for TileMap {
    fn layer(&self) -> i32 {
        self.layer
    }

    fn is_visible(&self, transform: &Transform, view: &CameraView) -> bool {
        self.bounds(transform).intersects(&view.world_bounds)
    }

    fn draw(&self, transform: &Transform, view: &CameraView, surface: &mut dyn Surface) {
        let origin = transform.position();
        let size = view.world_size_to_screen(Vec2::ONE);
        let frames = self.sheet.frame_count();
        let (xs, ys) = self.visible_range(transform, view);

        for y in ys {
            for x in xs.clone() {
                // Frames past the end of the sheet are skipped.
                let Some(frame) = self.tile(x, y).filter(|f| *f < frames) else {
                    continue;
                };
                let center = origin + Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                surface.draw_quad(&Quad {
                    texture: self.texture,
                    region: self.sheet.frame_rect(frame),
                    position: view.world_to_screen(center),
                    size,
                    rotation: view.rotation,
                    tint: self.tint,
                });
            }
        }
    }

    fn shader(&self) -> Option<ShaderHandle> {
        self.shader
    }
}

impl Module for TileMap {
    fn render_world(&self) -> Option<&dyn Renderable> {
        Some(self)
    }
}

impl ModuleMeta for TileMap {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::render::HeadlessSurface;

    fn sheet() -> SpriteSheet {
        SpriteSheet::new(4, 2, Vec2::new(64.0, 32.0))
    }

    fn map(width: u32, height: u32) -> TileMap {
        TileMap::new(TextureHandle(3), sheet(), width, height)
    }

    #[test]
    fn tiles_start_empty_and_fill() {
        let mut tiles = map(3, 2);
        assert_eq!(tiles.tile(0, 0), None);

        tiles.fill(5);
        assert_eq!(tiles.tile(2, 1), Some(5));

        assert!(tiles.set_tile(1, 1, 2));
        assert!(tiles.clear_tile(0, 0));
        assert_eq!(tiles.tile(1, 1), Some(2));
        assert_eq!(tiles.tile(0, 0), None);
    }

    #[test]
    fn outside_the_map_is_rejected() {
        let mut tiles = map(3, 2);
        assert!(!tiles.set_tile(3, 0, 1));
        assert!(!tiles.set_tile(0, 2, 1));
        assert_eq!(tiles.tile(3, 0), None);
    }

    #[test]
    fn draw_is_clamped_to_the_camera() {
        // Sees x in -24.7..25.3 and y in -18.55..18.95.
        let mut tiles = map(100, 100);
        tiles.fill(0);
        let view = CameraView::new(Vec2::new(0.3, 0.2), &Camera::new(), Vec2::new(800.0, 600.0), 16.0);
        let transform = Transform::new();

        let (xs, ys) = tiles.visible_range(&transform, &view);
        assert_eq!((xs, ys), (0..26, 0..19));

        let mut surface = HeadlessSurface::default();
        tiles.draw(&transform, &view, &mut surface);
        assert_eq!(surface.quads().count(), 26 * 19);
    }

    #[test]
    fn tiles_are_placed_from_the_entity_position() {
        let mut tiles = map(2, 2);
        tiles.set_tile(1, 0, 6);
        let view = CameraView::default();
        let mut surface = HeadlessSurface::default();
        tiles.draw(&Transform::new().at(Vec2::new(-2.0, 0.0)), &view, &mut surface);

        let quad = surface.quads().next().copied().unwrap();
        assert_eq!(surface.quads().count(), 1);
        // Center (-0.5, 0.5) at 16 pixels per unit around (400, 300).
        assert_eq!(quad.position, Vec2::new(392.0, 292.0));
        assert_eq!(quad.size, Vec2::new(16.0, 16.0));
        assert_eq!(quad.region, sheet().frame_rect(6));
        assert_eq!(quad.texture, TextureHandle(3));
    }

    #[test]
    fn frames_past_the_sheet_are_skipped() {
        let mut tiles = map(2, 1);
        tiles.set_tile(0, 0, 1);
        tiles.set_tile(1, 0, 8);
        let mut surface = HeadlessSurface::default();
        tiles.draw(&Transform::new(), &CameraView::default(), &mut surface);
        assert_eq!(surface.quads().count(), 1);
    }

    #[test]
    fn map_off_camera_is_culled() {
        let tiles = map(4, 4);
        let view = CameraView::default();
        assert!(!tiles.is_visible(&Transform::new().at(Vec2::new(100.0, 0.0)), &view));
        assert!(tiles.is_visible(&Transform::new().at(Vec2::new(-27.0, 0.0)), &view));

        let (xs, _) = tiles.visible_range(&Transform::new().at(Vec2::new(100.0, 0.0)), &view);
        assert!(xs.is_empty());
    }
}
