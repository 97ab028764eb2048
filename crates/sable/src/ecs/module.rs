//! # Module — Pluggable Behavior on an Entity
//!
//! A module is a unit of behavior owned by exactly one [`Entity`](super::Entity).
//! Implement [`Module`] and override only the hooks you need; every hook has a
//! no-op default.
//!
//! ```text
//! spawn ──► init ──► load ──► update, update, ... ──► unload
//!           (once)   (scene activation)                 (scene deactivation)
//! ```
//!
//! Within one entity, hooks run in ascending [`ModuleMeta::PRIORITY`]
//! order, ties in attachment order.
//!
//! ## Capabilities
//!
//! Some parts of the engine care about *what a module can do* rather than
//! what type it is: the render-order layer wants every screen- or
//! world-space renderable, the UI pass wants every clickable. A module
//! advertises these through the capability accessors below. They are read
//! once, when the module is attached, to build the entity's capability index.
//!
//! [`ModuleMeta::PRIORITY`]: super::ModuleMeta::PRIORITY

use std::any::Any;
use std::error::Error;

use crate::context::ModuleContext;
use crate::render::Renderable;

/// Result of a fallible hook. An `Err` from `update` is logged by the scene
/// with the entity's identity; other entities keep running.
pub type HookResult = Result<(), Box<dyn Error>>;

/// Upcast helper so boxed modules can be downcast to their concrete type.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A capability a module can provide to the engine's subsystems.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Drawn in the screen pass.
    RenderScreen,
    /// Drawn in the world pass (camera space).
    RenderWorld,
    /// Receives clicks from the UI pass.
    Clickable,
}

/// Something the UI pass can click.
pub trait Clickable {
    fn click(&mut self);
}

/// Behavior attached to an entity.
pub trait Module: AsAny {
    /// Called once, after the entity has been spawned and its dependencies
    /// have been checked.
    fn init(&mut self, _ctx: &mut ModuleContext<'_>) {}

    /// Called when the entity's scene becomes active, or right after `init`
    /// for entities spawned into an already active scene.
    fn load(&mut self, _ctx: &mut ModuleContext<'_>) {}

    /// Called every frame.
    fn update(&mut self, _ctx: &mut ModuleContext<'_>) -> HookResult {
        Ok(())
    }

    /// Called when the entity's scene is deactivated.
    fn unload(&mut self, _ctx: &mut ModuleContext<'_>) {}

    fn render_screen(&self) -> Option<&dyn Renderable> {
        None
    }

    fn render_world(&self) -> Option<&dyn Renderable> {
        None
    }

    fn clickable_mut(&mut self) -> Option<&mut dyn Clickable> {
        None
    }
}

impl dyn Module {
    pub fn downcast_ref<T: Module>(&self) -> Option<&T> {
        AsAny::as_any(self).downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Module>(&mut self) -> Option<&mut T> {
        AsAny::as_any_mut(self).downcast_mut::<T>()
    }

    pub fn is<T: Module>(&self) -> bool {
        AsAny::as_any(self).is::<T>()
    }

    /// Probe the capability accessors.
    pub(crate) fn capabilities(&mut self) -> Vec<Capability> {
        let mut caps = Vec::new();
        if self.render_screen().is_some() {
            caps.push(Capability::RenderScreen);
        }
        if self.render_world().is_some() {
            caps.push(Capability::RenderWorld);
        }
        if self.clickable_mut().is_some() {
            caps.push(Capability::Clickable);
        }
        caps
    }
}
