//! The top-level engine instance.
//!
//! [`Engine`] owns everything that used to be process-wide: the id
//! generator and module registry (through its [`Runtime`]), the scene
//! manager, the task scheduler, the clock and the input state. Two engines
//! never share state, which is what tests rely on.
//!
//! # Example
//!
//! ```ignore
//! use sable::prelude::*;
//!
//! let mut engine = Engine::new(EngineConfig::default());
//! let mut level = engine.create_scene("level");
//! level.spawn(engine.entity("hero").with_module(SpriteDisplay::new()));
//! engine.scenes_mut().add_scene(level)?;
//! engine.scenes_mut().load_scene("level");
//!
//! let mut surface = HeadlessSurface::default();
//! engine.frame(&mut surface);
//! ```
//!
//! ## Frame
//!
//! ```text
//! frame(surface)
//!   1. time.update()          (or advance(dt) in frame_with_delta)
//!   2. tasks.tick(time)
//!   3. scenes.update()        active scene frame, then any pending switch
//!   4. input.end_frame()
//! ```

use std::time::{Duration, Instant};

use crate::config::EngineConfig;
use crate::context::Frame;
use crate::ecs::{Entity, ModuleCatalog, ModuleMeta, Runtime};
use crate::input::InputState;
use crate::render::Surface;
use crate::scene::{Scene, SceneManager};
use crate::task::{Task, TaskHandle, TaskScheduler};
use crate::time::Time;

/// What [`Engine::run`] drives: an event source plus a drawing surface.
pub trait Platform {
    /// Pump pending events into `input`. Returns `false` to stop the loop.
    fn poll(&mut self, input: &mut InputState) -> bool;

    fn surface(&mut self) -> &mut dyn Surface;

    /// Called once after the loop ends.
    fn shutdown(&mut self) {}
}

pub struct Engine {
    config: EngineConfig,
    catalog: ModuleCatalog,
    runtime: Runtime,
    scenes: SceneManager,
    tasks: TaskScheduler,
    time: Time,
    input: InputState,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let catalog = ModuleCatalog::builtin();
        let runtime = Runtime::new(&catalog);
        log::info!("Starting '{}' ({}x{})", config.title, config.width, config.height);
        Self {
            config,
            catalog,
            runtime,
            scenes: SceneManager::new(),
            tasks: TaskScheduler::new(),
            time: Time::new(),
            input: InputState::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// Add a module type to the catalog and rebuild the registry.
    pub fn register_module<T: ModuleMeta>(&mut self) -> &mut Self {
        self.catalog.register::<T>();
        self.runtime.rebuild(&self.catalog);
        self
    }

    pub fn entity(&self, name: impl Into<String>) -> Entity {
        self.runtime.entity(name)
    }

    /// A new scene using this engine's settings. Register it with
    /// [`SceneManager::add_scene`].
    pub fn create_scene(&self, name: impl Into<String>) -> Scene {
        Scene::new(&self.runtime, name, self.config.scene_settings())
    }

    pub fn scenes(&self) -> &SceneManager {
        &self.scenes
    }

    pub fn scenes_mut(&mut self) -> &mut SceneManager {
        &mut self.scenes
    }

    pub fn time(&self) -> &Time {
        &self.time
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    /// Start a task outside any module hook.
    pub fn start_task(&mut self, task: impl Task + 'static) -> TaskHandle {
        self.tasks.start(task)
    }

    pub fn tasks(&self) -> &TaskScheduler {
        &self.tasks
    }

    /// Run one frame on the wall clock.
    pub fn frame(&mut self, surface: &mut dyn Surface) {
        self.time.update();
        self.step(surface);
    }

    /// Run one frame advancing the clock by exactly `dt`.
    pub fn frame_with_delta(&mut self, surface: &mut dyn Surface, dt: Duration) {
        self.time.advance(dt);
        self.step(surface);
    }

    fn step(&mut self, surface: &mut dyn Surface) {
        self.tasks.tick(&self.time);
        let mut frame = Frame::new(&self.time, &self.input, &mut self.tasks);
        self.scenes.update(&mut frame, surface);
        self.input.end_frame();
    }

    /// Drive frames until the platform asks to stop, sleeping off the rest of
    /// each frame when `target_fps` is set.
    pub fn run(&mut self, platform: &mut impl Platform) {
        let budget = match self.config.target_fps {
            0 => None,
            fps => Some(Duration::from_secs_f64(1.0 / f64::from(fps))),
        };

        while platform.poll(&mut self.input) {
            let started = Instant::now();
            self.frame(platform.surface());
            if let Some(budget) = budget {
                if let Some(rest) = budget.checked_sub(started.elapsed()) {
                    std::thread::sleep(rest);
                }
            }
        }

        log::info!("Shutting down after {} frames", self.time.frame_count());
        platform.shutdown();
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
