//! # Entity–Module Core
//!
//! Game objects are [`Entity`]s assembled from pluggable [`Module`]s. Unlike an
//! archetype ECS, an entity here *owns* its modules: it is a small container
//! with a transform, a name, and behavior objects that run lifecycle hooks.
//!
//! ## Module Overview
//!
//! - [`id`] — Monotonic ids for entities, modules and scenes
//! - [`registry`] — Static per-type metadata: priorities and requirements
//! - [`runtime`] — Shared handle to the id generator and registry
//! - [`module`] — The [`Module`] trait and capability accessors
//! - [`transform`] — Position, hierarchy links, plain vs. rectangle kind
//! - [`entity`] — Module storage, queries and lifecycle orchestration
//! - [`store`] — A scene's live entities in spawn order
//!
//! ## Comparison
//!
//! - **bevy / hecs**: components are plain data, behavior lives in systems.
//! - **Unity / Godot**: behavior lives on the object. This core follows that
//!   model, with priorities instead of an execution-order settings file.

pub mod entity;
pub mod id;
pub mod module;
pub mod registry;
pub mod runtime;
pub mod store;
pub mod transform;

pub use entity::{Entity, EntityEvent};
pub use id::{EntityId, IdGenerator, ModuleId, SceneId};
pub use module::{AsAny, Capability, Clickable, HookResult, Module};
pub use registry::{ModuleCatalog, ModuleDescriptor, ModuleMeta, ModuleRegistry, ModuleType, Requirement};
pub use runtime::Runtime;
pub use store::EntityStore;
pub use transform::{Transform, TransformKind};
