//! # Sable — Entity/Module 2D Engine Core
//!
//! Entities are named containers of pluggable modules. A [`Scene`](scene::Scene)
//! owns its live entities together with the structures that index them: a
//! spatial grid, a two-list render order, and the physics and UI passes.
//!
//! ```text
//! Engine ─▶ SceneManager ─▶ active Scene ─┬─▶ Entity ─▶ Module hooks
//!                                         ├─▶ Grid (spatial queries)
//!                                         ├─▶ Physics / UI passes
//!                                         └─▶ RenderOrder ─▶ Surface
//! ```
//!
//! Start with `use sable::prelude::*` and build an [`Engine`](engine::Engine).

pub mod camera;
pub mod config;
pub mod context;
pub mod ecs;
pub mod engine;
pub mod error;
pub mod grid;
pub mod input;
pub mod logging;
pub mod math;
pub mod persistence;
pub mod physics2d;
pub mod prelude;
pub mod render;
pub mod render2d;
pub mod scene;
pub mod task;
pub mod time;
pub mod ui;

#[cfg(feature = "assets")]
pub mod asset;
