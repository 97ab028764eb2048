//! # Module Registry — Static Capability Graph
//!
//! Every module type can declare two pieces of static metadata through
//! [`ModuleMeta`]:
//!
//! - a **priority** (default 0): lifecycle hooks run in ascending priority,
//!   ties in attachment order;
//! - a set of **requirements**: other module types, capabilities, or the
//!   rectangle transform that must be present on the same entity.
//!
//! At startup the engine collects descriptors into a [`ModuleCatalog`] and
//! builds a [`ModuleRegistry`] from it. Entities consult the registry when a
//! module is attached (priority, rectangle transform) and when they initialize
//! (dependency check).
//!
//! ```text
//! ModuleCatalog ──build()──► ModuleRegistry
//!   [Camera, SpriteDisplay,      dependencies: TypeId → {Requirement}
//!    Animator, Button, ...]      priorities:   TypeId → i32
//! ```
//!
//! Only a type's own declarations count. Nothing is inherited from other
//! module types, and absence of metadata is not an error: an unknown type has
//! no requirements and priority 0.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::fmt;

use super::module::{Capability, Module};

// ── ModuleType ──────────────────────────────────────────────────────────

/// Runtime identity of a concrete module type.
#[derive(Clone, Copy)]
pub struct ModuleType {
    id: TypeId,
    name: &'static str,
}

impl ModuleType {
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: short_type_name(std::any::type_name::<T>()),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Short type name (module path stripped), for diagnostics.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for ModuleType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ModuleType {}

impl std::hash::Hash for ModuleType {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// `my_game::player::Player<f32>` → `Player`.
fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

// ── Requirement ─────────────────────────────────────────────────────────

/// Something a module needs on its entity to work.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Requirement {
    /// At least one instance of this exact module type.
    Module(ModuleType),
    /// At least one module providing this capability.
    Capability(Capability),
    /// The entity's transform must carry a rectangle.
    RectTransform,
}

impl Requirement {
    pub fn module<T: Module>() -> Self {
        Requirement::Module(ModuleType::of::<T>())
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirement::Module(ty) => write!(f, "module {ty}"),
            Requirement::Capability(cap) => write!(f, "capability {cap:?}"),
            Requirement::RectTransform => f.write_str("rect transform"),
        }
    }
}

// ── ModuleMeta ──────────────────────────────────────────────────────────

/// Static metadata for a concrete module type.
///
/// ```ignore
/// struct Follow { speed: f32 }
/// impl Module for Follow { /* hooks */ }
/// impl ModuleMeta for Follow {
///     const PRIORITY: i32 = 10;
///     fn requirements() -> Vec<Requirement> {
///         vec![Requirement::module::<SpriteDisplay>()]
///     }
/// }
/// ```
pub trait ModuleMeta: Module + Sized {
    /// Lower runs first.
    const PRIORITY: i32 = 0;

    fn requirements() -> Vec<Requirement> {
        Vec::new()
    }
}

/// The metadata of one module type, captured without the type parameter.
#[derive(Clone, Debug)]
pub struct ModuleDescriptor {
    pub ty: ModuleType,
    pub priority: i32,
    pub requirements: Vec<Requirement>,
}

impl ModuleDescriptor {
    pub fn of<T: ModuleMeta>() -> Self {
        Self {
            ty: ModuleType::of::<T>(),
            priority: T::PRIORITY,
            requirements: T::requirements(),
        }
    }
}

// ── ModuleCatalog ───────────────────────────────────────────────────────

/// The list of module types known at startup.
#[derive(Clone, Default)]
pub struct ModuleCatalog {
    descriptors: Vec<ModuleDescriptor>,
}

impl ModuleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The engine's own module types.
    pub fn builtin() -> Self {
        Self::new()
            .with::<crate::camera::Camera>()
            .with::<crate::render2d::SpriteDisplay>()
            .with::<crate::render2d::Animator>()
            .with::<crate::render2d::TileMap>()
            .with::<crate::render2d::CompositeSpriteDisplay>()
            .with::<crate::physics2d::BoxCollider>()
            .with::<crate::ui::Canvas>()
            .with::<crate::ui::Button>()
            .with::<crate::ui::Image>()
    }

    /// Builder form of [`register`](Self::register).
    pub fn with<T: ModuleMeta>(mut self) -> Self {
        self.register::<T>();
        self
    }

    /// Add a module type. Registering the same type twice keeps one entry.
    pub fn register<T: ModuleMeta>(&mut self) {
        let descriptor = ModuleDescriptor::of::<T>();
        if let Some(existing) = self.descriptors.iter_mut().find(|d| d.ty == descriptor.ty) {
            *existing = descriptor;
        } else {
            self.descriptors.push(descriptor);
        }
    }

    pub fn descriptors(&self) -> &[ModuleDescriptor] {
        &self.descriptors
    }
}

// ── ModuleRegistry ──────────────────────────────────────────────────────

/// Dependency and priority lookup built from a [`ModuleCatalog`].
#[derive(Default)]
pub struct ModuleRegistry {
    dependencies: HashMap<TypeId, HashSet<Requirement>>,
    priorities: HashMap<TypeId, i32>,
    types: HashMap<TypeId, ModuleType>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan the catalog and populate the lookup tables.
    ///
    /// Calling this again rebuilds from scratch, so the result only depends on
    /// the catalog passed last.
    pub fn build(&mut self, catalog: &ModuleCatalog) {
        self.dependencies.clear();
        self.priorities.clear();
        self.types.clear();
        for descriptor in catalog.descriptors() {
            self.insert(descriptor);
        }
        log::debug!("Module registry built with {} types", self.types.len());
    }

    pub(crate) fn insert(&mut self, descriptor: &ModuleDescriptor) {
        let id = descriptor.ty.id();
        if !descriptor.requirements.is_empty() {
            self.dependencies
                .insert(id, descriptor.requirements.iter().copied().collect());
        }
        if descriptor.priority != 0 {
            self.priorities.insert(id, descriptor.priority);
        }
        self.types.insert(id, descriptor.ty);
    }

    /// The requirements declared by `ty`. Returns a fresh set each call.
    pub fn dependencies(&self, ty: TypeId) -> HashSet<Requirement> {
        self.dependencies.get(&ty).cloned().unwrap_or_default()
    }

    /// Declared priority of `ty`, 0 when undeclared.
    pub fn priority(&self, ty: TypeId) -> i32 {
        self.priorities.get(&ty).copied().unwrap_or(0)
    }

    pub fn requires_rect_transform(&self, ty: TypeId) -> bool {
        self.dependencies
            .get(&ty)
            .is_some_and(|deps| deps.contains(&Requirement::RectTransform))
    }

    pub fn contains(&self, ty: TypeId) -> bool {
        self.types.contains_key(&ty)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain;
    impl Module for Plain {}
    impl ModuleMeta for Plain {}

    struct Heavy;
    impl Module for Heavy {}
    impl ModuleMeta for Heavy {
        const PRIORITY: i32 = -4;
        fn requirements() -> Vec<Requirement> {
            vec![Requirement::module::<Plain>(), Requirement::RectTransform]
        }
    }

    #[test]
    fn unknown_type_has_defaults() {
        let registry = ModuleRegistry::new();
        assert!(registry.dependencies(TypeId::of::<Plain>()).is_empty());
        assert_eq!(registry.priority(TypeId::of::<Plain>()), 0);
    }

    #[test]
    fn build_reads_declarations() {
        let mut registry = ModuleRegistry::new();
        registry.build(&ModuleCatalog::new().with::<Plain>().with::<Heavy>());

        let deps = registry.dependencies(TypeId::of::<Heavy>());
        assert_eq!(deps.len(), 2);
        assert!(deps.contains(&Requirement::module::<Plain>()));
        assert_eq!(registry.priority(TypeId::of::<Heavy>()), -4);
        assert!(registry.requires_rect_transform(TypeId::of::<Heavy>()));
        assert!(!registry.requires_rect_transform(TypeId::of::<Plain>()));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn dependencies_returns_a_copy() {
        let mut registry = ModuleRegistry::new();
        registry.build(&ModuleCatalog::new().with::<Heavy>());

        let mut deps = registry.dependencies(TypeId::of::<Heavy>());
        deps.clear();
        assert_eq!(registry.dependencies(TypeId::of::<Heavy>()).len(), 2);
    }

    #[test]
    fn rebuild_overwrites() {
        let mut registry = ModuleRegistry::new();
        registry.build(&ModuleCatalog::new().with::<Heavy>());
        registry.build(&ModuleCatalog::new().with::<Plain>());

        assert!(!registry.contains(TypeId::of::<Heavy>()));
        assert_eq!(registry.priority(TypeId::of::<Heavy>()), 0);
        assert!(registry.contains(TypeId::of::<Plain>()));
    }

    #[test]
    fn short_names() {
        assert_eq!(ModuleType::of::<Heavy>().name(), "Heavy");
        assert_eq!(short_type_name("a::b::Thing<c::D>"), "Thing");
    }
}
