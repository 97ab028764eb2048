//! Convenience re-exports: `use sable::prelude::*` for the common items.

pub use crate::camera::{Camera, CameraView};
pub use crate::config::{EngineConfig, SceneSettings};
pub use crate::context::{Commands, ModuleContext};
pub use crate::ecs::{
    Capability, Clickable, Entity, EntityId, HookResult, Module, ModuleId, ModuleMeta, Requirement,
    Runtime, Transform,
};
pub use crate::engine::{Engine, Platform};
pub use crate::error::EngineError;
pub use crate::input::{Binding, GamepadAxis, GamepadButton, InputLayout, InputState, KeyCode, MouseButton};
pub use crate::logging::init_logger;
pub use crate::math::{BoundingBox, Rect, Vec2};
pub use crate::persistence::{DataFile, XorCipher};
pub use crate::physics2d::BoxCollider;
pub use crate::render::{Color, HeadlessSurface, RenderMode, Renderable, Surface, TextureHandle};
pub use crate::render2d::{
    AnimationClip, Animator, CompositeSpriteDisplay, Pivot, SpriteDisplay, SpritePart, SpriteSheet, TileMap,
};
pub use crate::scene::{Scene, SceneManager};
pub use crate::task::{Task, TaskHandle, TaskStatus, WaitSeconds};
pub use crate::time::Time;
pub use crate::ui::{Button, Canvas, Image};

#[cfg(feature = "assets")]
pub use crate::asset::AssetStore;
