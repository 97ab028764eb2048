//! # Identity — Stable Ids for Engine Objects
//!
//! Every addressable object (entity, module instance, scene) gets a `u64` from
//! an [`IdGenerator`] when it is constructed. Ids are never recycled, so a
//! stale id simply fails to resolve instead of aliasing a newer object.
//!
//! ## Design: Counter, Not Generations
//!
//! The generator is a plain monotonically increasing counter. With 64 bits
//! there is no realistic way to wrap, which makes generational indices
//! unnecessary for this engine: lookups go through hash maps keyed by id, not
//! through dense slot arrays.
//!
//! The generator is a cheap handle (`Rc<Cell<u64>>`). Clones share one counter,
//! and separate [`Runtime`](super::Runtime)s own separate counters, so two
//! engines in the same process (or two tests) never interfere.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Identifies an entity within its engine instance.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub(crate) u64);

/// Identifies one attached module instance.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(pub(crate) u64);

/// Identifies a scene.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SceneId(pub(crate) u64);

macro_rules! id_formatting {
    ($ty:ident, $label:literal) => {
        impl $ty {
            /// Returns the raw id value.
            pub fn raw(self) -> u64 {
                self.0
            }
        }

        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "({})"), self.0)
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_formatting!(EntityId, "Entity");
id_formatting!(ModuleId, "Module");
id_formatting!(SceneId, "Scene");

/// Hands out unique ids. The first id issued is 1.
#[derive(Clone, Default)]
pub struct IdGenerator {
    last: Rc<Cell<u64>>,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_raw(&self) -> u64 {
        let id = self.last.get() + 1;
        self.last.set(id);
        id
    }

    pub fn entity(&self) -> EntityId {
        EntityId(self.next_raw())
    }

    pub fn module(&self) -> ModuleId {
        ModuleId(self.next_raw())
    }

    pub fn scene(&self) -> SceneId {
        SceneId(self.next_raw())
    }

    /// The most recently issued id, or 0 if none has been issued.
    pub fn last(&self) -> u64 {
        self.last.get()
    }
}
