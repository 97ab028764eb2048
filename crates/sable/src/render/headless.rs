//! A [`Surface`] that records draw calls instead of rasterizing them.

use super::{Color, Quad, ShaderHandle, Surface};
use crate::math::{BoundingBox, Vec2};

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Quad(Quad),
    Rect {
        bounds: BoundingBox,
        color: Color,
        filled: bool,
    },
    BeginShader(ShaderHandle),
    EndShader,
}

pub struct HeadlessSurface {
    viewport: Vec2,
    calls: Vec<DrawCall>,
}

impl HeadlessSurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            viewport: Vec2::new(width, height),
            calls: Vec::new(),
        }
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.viewport = Vec2::new(width, height);
    }

    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    /// Take the recorded calls, leaving the log empty for the next frame.
    pub fn take_calls(&mut self) -> Vec<DrawCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn quads(&self) -> impl Iterator<Item = &Quad> {
        self.calls.iter().filter_map(|call| match call {
            DrawCall::Quad(quad) => Some(quad),
            _ => None,
        })
    }
}

impl Default for HeadlessSurface {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

impl Surface for HeadlessSurface {
    fn viewport(&self) -> Vec2 {
        self.viewport
    }

    fn draw_quad(&mut self, quad: &Quad) {
        self.calls.push(DrawCall::Quad(*quad));
    }

    fn draw_rect(&mut self, bounds: BoundingBox, color: Color, filled: bool) {
        self.calls.push(DrawCall::Rect {
            bounds,
            color,
            filled,
        });
    }

    fn begin_shader(&mut self, shader: ShaderHandle) {
        self.calls.push(DrawCall::BeginShader(shader));
    }

    fn end_shader(&mut self) {
        self.calls.push(DrawCall::EndShader);
    }
}
