//! # Animation — Sprite Sheet Playback
//!
//! A sprite sheet is a single texture holding a grid of frames. [`SpriteSheet`]
//! describes the grid, [`AnimationClip`] says which frames to play and how
//! fast, and the [`Animator`] module advances playback every frame and writes
//! the current frame into the entity's [`SpriteDisplay`].
//!
//! ```text
//!  ┌────┬────┬────┬────┐
//!  │ 0  │ 1  │ 2  │ 3  │   4-column, 2-row sprite sheet
//!  ├────┼────┼────┼────┤   frame index = row * columns + column
//!  │ 4  │ 5  │ 6  │ 7  │
//!  └────┴────┴────┴────┘
//! ```
//!
//! An `Animator` requires a `SpriteDisplay` on the same entity; without one it
//! is dropped when the entity initializes.

use crate::context::ModuleContext;
use crate::ecs::{HookResult, Module, ModuleMeta, Requirement};
use crate::math::{Rect, Vec2};

use super::SpriteDisplay;

/// A uniform grid of frames inside one texture.
#[derive(Debug, Clone)]
pub struct SpriteSheet {
    pub columns: u32,
    pub rows: u32,
    /// Size of one frame in pixels.
    pub tile_size: Vec2,
    /// Total texture dimensions in pixels.
    pub texture_size: Vec2,
}

impl SpriteSheet {
    /// Frame size is `texture_size / grid`.
    pub fn new(columns: u32, rows: u32, texture_size: Vec2) -> Self {
        Self {
            columns,
            rows,
            tile_size: Vec2::new(texture_size.x / columns as f32, texture_size.y / rows as f32),
            texture_size,
        }
    }

    /// UV rectangle of a frame (row-major, 0-based).
    pub fn frame_rect(&self, index: u32) -> Rect {
        let col = index % self.columns;
        let row = index / self.columns;
        Rect::from_pixels(
            col as f32 * self.tile_size.x,
            row as f32 * self.tile_size.y,
            self.tile_size.x,
            self.tile_size.y,
            self.texture_size.x,
            self.texture_size.y,
        )
    }

    pub fn frame_count(&self) -> u32 {
        self.columns * self.rows
    }
}

/// A sequence of frames with playback settings.
#[derive(Debug, Clone)]
pub struct AnimationClip {
    pub frames: Vec<u32>,
    /// Seconds per frame.
    pub frame_time: f32,
    pub looping: bool,
}

impl AnimationClip {
    /// Play frames `first..=last` once.
    pub fn from_range(first: u32, last: u32, frame_time: f32) -> Self {
        Self {
            frames: (first..=last).collect(),
            frame_time,
            looping: false,
        }
    }

    pub fn looping(mut self) -> Self {
        self.looping = true;
        self
    }
}

/// Drives sprite-sheet playback on the entity's first [`SpriteDisplay`].
#[derive(Debug)]
pub struct Animator {
    pub sheet: SpriteSheet,
    clip: AnimationClip,
    timer: f32,
    current: usize,
    finished: bool,
    pub speed: f32,
}

impl Animator {
    pub fn new(sheet: SpriteSheet, clip: AnimationClip) -> Self {
        Self {
            sheet,
            clip,
            timer: 0.0,
            current: 0,
            finished: false,
            speed: 1.0,
        }
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// Replace the clip and restart playback.
    pub fn play(&mut self, clip: AnimationClip) {
        self.clip = clip;
        self.timer = 0.0;
        self.current = 0;
        self.finished = false;
    }

    /// Whether a non-looping clip has reached its last frame.
    pub fn finished(&self) -> bool {
        self.finished
    }

    pub fn current_frame(&self) -> Option<u32> {
        self.clip.frames.get(self.current).copied()
    }

    pub fn current_rect(&self) -> Option<Rect> {
        self.current_frame().map(|f| self.sheet.frame_rect(f))
    }

    /// Advance playback by `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        if self.finished || self.clip.frames.is_empty() || self.clip.frame_time <= 0.0 {
            return;
        }

        self.timer += dt * self.speed;
        while self.timer >= self.clip.frame_time {
            self.timer -= self.clip.frame_time;
            self.current += 1;

            if self.current >= self.clip.frames.len() {
                if self.clip.looping {
                    self.current = 0;
                } else {
                    self.current = self.clip.frames.len() - 1;
                    self.finished = true;
                    break;
                }
            }
        }
    }
}

impl Module for Animator {
    fn init(&mut self, ctx: &mut ModuleContext<'_>) {
        if let (Some(rect), Some(sprite)) = (
            self.current_rect(),
            ctx.entity_mut().module_mut::<SpriteDisplay>(0),
        ) {
            sprite.region = rect;
        }
    }

    fn update(&mut self, ctx: &mut ModuleContext<'_>) -> HookResult {
        self.advance(ctx.time().delta_secs());
        if let (Some(rect), Some(sprite)) = (
            self.current_rect(),
            ctx.entity_mut().module_mut::<SpriteDisplay>(0),
        ) {
            sprite.region = rect;
        }
        Ok(())
    }
}

impl ModuleMeta for Animator {
    // After gameplay modules have picked a clip for this frame.
    const PRIORITY: i32 = 100;

    fn requirements() -> Vec<Requirement> {
        vec![Requirement::module::<SpriteDisplay>()]
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::context::Harness;
    use crate::ecs::Runtime;

    fn sheet() -> SpriteSheet {
        SpriteSheet::new(4, 2, Vec2::new(64.0, 32.0))
    }

    #[test]
    fn frame_rects_are_row_major() {
        let rect = sheet().frame_rect(5);
        assert_eq!(rect.min, Vec2::new(0.25, 0.5));
        assert_eq!(rect.max, Vec2::new(0.5, 1.0));
        assert_eq!(sheet().frame_count(), 8);
    }

    #[test]
    fn non_looping_clip_stops_on_last_frame() {
        let mut animator = Animator::new(sheet(), AnimationClip::from_range(0, 2, 0.1));
        animator.advance(1.0);
        assert!(animator.finished());
        assert_eq!(animator.current_frame(), Some(2));
    }

    #[test]
    fn looping_clip_wraps() {
        let mut animator = Animator::new(sheet(), AnimationClip::from_range(4, 5, 0.5).looping());
        animator.advance(0.6);
        assert_eq!(animator.current_frame(), Some(5));
        animator.advance(0.5);
        assert_eq!(animator.current_frame(), Some(4));
        assert!(!animator.finished());
    }

    #[test]
    fn update_writes_region_into_sprite() {
        let runtime = Runtime::with_builtins();
        let mut harness = Harness::new();
        harness.time.advance(Duration::from_millis(150));
        let mut entity = runtime
            .entity("hero")
            .with_module(SpriteDisplay::new())
            .with_module(Animator::new(sheet(), AnimationClip::from_range(0, 3, 0.1)));

        entity.init(&mut harness.access());
        entity.update(&mut harness.access()).unwrap();

        let sprite = entity.module::<SpriteDisplay>(0).unwrap();
        assert_eq!(sprite.region, sheet().frame_rect(1));
    }

    #[test]
    fn dropped_without_sprite() {
        let runtime = Runtime::with_builtins();
        let mut harness = Harness::new();
        let mut entity = runtime
            .entity("ghost")
            .with_module(Animator::new(sheet(), AnimationClip::from_range(0, 3, 0.1)));

        entity.init(&mut harness.access());
        assert!(!entity.has_module::<Animator>());
    }
}
