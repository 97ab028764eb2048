//! # Camera — World-to-Screen Mapping
//!
//! Every scene spawns an entity named `"Camera"` carrying a [`Camera`]
//! module. The entity's position is the point the camera looks at; the
//! module holds zoom, rotation and a pixel offset.
//!
//! The scene condenses camera, viewport and `pixels_per_unit` into a
//! [`CameraView`], recomputed only when one of them changes. Renderables and
//! the UI pass use the view for culling and coordinate conversion.
//!
//! ```text
//!  world (units, Y up)                 screen (pixels, Y down)
//!        ▲ y                           (0,0) ┌──────────────► x
//!        │    target ●                       │        ● viewport/2 + offset
//!        └──────► x                          ▼ y
//!
//!  screen = viewport/2 + offset + (s, -s) * rotate(r) * (world - target),  s = ppu * zoom
//! ```

use crate::ecs::{Module, ModuleMeta};
use crate::math::{BoundingBox, Mat4, Vec2, Vec3};

/// Camera settings. Attach to the scene's camera entity.
#[derive(Debug, Clone)]
pub struct Camera {
    zoom: f32,
    offset: Vec2,
    rotation: f32,
    changed: bool,
}

impl Camera {
    pub fn new() -> Self {
        Self {
            zoom: 1.0,
            offset: Vec2::ZERO,
            rotation: 0.0,
            changed: true,
        }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// # Panics
    ///
    /// Panics if `zoom` is not positive.
    pub fn set_zoom(&mut self, zoom: f32) {
        assert!(zoom > 0.0, "Camera zoom must be positive, got {zoom}");
        self.zoom = zoom;
        self.changed = true;
    }

    /// Pixel offset of the target from the center of the viewport.
    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn set_offset(&mut self, offset: Vec2) {
        self.offset = offset;
        self.changed = true;
    }

    /// Radians.
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: f32) {
        self.rotation = rotation;
        self.changed = true;
    }

    pub fn with_zoom(mut self, zoom: f32) -> Self {
        self.set_zoom(zoom);
        self
    }

    /// Returns whether settings changed since the last call.
    pub(crate) fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

impl Module for Camera {}

impl ModuleMeta for Camera {}

/// Snapshot of the active camera used for one or more frames.
#[derive(Debug, Clone)]
pub struct CameraView {
    pub target: Vec2,
    pub zoom: f32,
    pub rotation: f32,
    pub offset: Vec2,
    pub viewport: Vec2,
    pub pixels_per_unit: f32,
    /// The visible part of the world.
    pub world_bounds: BoundingBox,
    /// The viewport in pixels.
    pub screen_bounds: BoundingBox,
    view: Mat4,
    inverse: Mat4,
}

impl CameraView {
    pub fn new(target: Vec2, camera: &Camera, viewport: Vec2, pixels_per_unit: f32) -> Self {
        let scale = pixels_per_unit * camera.zoom;
        let view = Mat4::from_translation((viewport * 0.5 + camera.offset).extend(0.0))
            * Mat4::from_scale(Vec3::new(scale, -scale, 1.0))
            * Mat4::from_rotation_z(camera.rotation)
            * Mat4::from_translation((-target).extend(0.0));
        let inverse = view.inverse();

        let corners = [
            Vec2::ZERO,
            Vec2::new(viewport.x, 0.0),
            Vec2::new(0.0, viewport.y),
            viewport,
        ]
        .map(|c| inverse.transform_point3(c.extend(0.0)).truncate());
        let min = corners.iter().fold(Vec2::splat(f32::MAX), |m, c| m.min(*c));
        let max = corners.iter().fold(Vec2::splat(f32::MIN), |m, c| m.max(*c));

        Self {
            target,
            zoom: camera.zoom,
            rotation: camera.rotation,
            offset: camera.offset,
            viewport,
            pixels_per_unit,
            world_bounds: BoundingBox::new(min, max),
            screen_bounds: BoundingBox::new(Vec2::ZERO, viewport),
            view,
            inverse,
        }
    }

    /// Pixels per world unit at the current zoom.
    pub fn scale(&self) -> f32 {
        self.pixels_per_unit * self.zoom
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        self.view.transform_point3(world.extend(0.0)).truncate()
    }

    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        self.inverse.transform_point3(screen.extend(0.0)).truncate()
    }

    /// Pixel size of a world-space size.
    pub fn world_size_to_screen(&self, size: Vec2) -> Vec2 {
        size * self.scale()
    }
}

impl Default for CameraView {
    fn default() -> Self {
        Self::new(Vec2::ZERO, &Camera::new(), Vec2::new(800.0, 600.0), 16.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-3
    }

    #[test]
    fn target_maps_to_viewport_center() {
        let view = CameraView::new(Vec2::new(5.0, 5.0), &Camera::new(), Vec2::new(800.0, 600.0), 16.0);
        assert!(close(view.world_to_screen(Vec2::new(5.0, 5.0)), Vec2::new(400.0, 300.0)));
    }

    #[test]
    fn world_y_up_is_screen_y_down() {
        let view = CameraView::default();
        let above = view.world_to_screen(Vec2::new(0.0, 1.0));
        assert!(close(above, Vec2::new(400.0, 284.0)));
    }

    #[test]
    fn conversions_round_trip() {
        let camera = Camera::new().with_zoom(2.0);
        let view = CameraView::new(Vec2::new(-3.0, 7.0), &camera, Vec2::new(640.0, 480.0), 16.0);
        let p = Vec2::new(12.5, -4.0);
        assert!(close(view.screen_to_world(view.world_to_screen(p)), p));
    }

    #[test]
    fn world_bounds_follow_zoom() {
        let view = CameraView::default();
        assert!(close(view.world_bounds.min, Vec2::new(-25.0, -18.75)));
        assert!(close(view.world_bounds.max, Vec2::new(25.0, 18.75)));

        let zoomed = CameraView::new(Vec2::ZERO, &Camera::new().with_zoom(2.0), Vec2::new(800.0, 600.0), 16.0);
        assert!(close(zoomed.world_bounds.max, Vec2::new(12.5, 9.375)));
    }

    #[test]
    fn settings_mark_changed() {
        let mut camera = Camera::new();
        assert!(camera.take_changed());
        assert!(!camera.take_changed());
        camera.set_rotation(0.5);
        assert!(camera.take_changed());
    }
}
