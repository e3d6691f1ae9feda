//! Component identification keys.
//!
//! [`ComponentId`] uniquely identifies a component or an interface
//! contract within the container. It wraps a [`TypeId`] together with
//! the human-readable type name used in diagnostics.

use std::any::{TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem::size_of;

use anbar_support::rendering::shorten_type_name;

/// Uniquely identifies a component or interface in the container.
///
/// Every level of indirection produces a distinct id: `Config` and
/// `Box<Config>` are different components, even though they share the
/// same bare name.
///
/// # Examples
/// ```
/// use anbar_container::key::ComponentId;
///
/// let id = ComponentId::of::<String>();
/// assert_eq!(id.type_name(), "alloc::string::String");
/// assert!(!id.is_contract());
///
/// trait Greeter {}
/// assert!(ComponentId::of::<dyn Greeter>().is_contract());
/// ```
#[derive(Clone, Copy)]
pub struct ComponentId {
    type_id: TypeId,
    type_name: &'static str,
    sized: bool,
    contract: bool,
}

impl ComponentId {
    /// Creates an id for type `T`.
    ///
    /// `T` may be unsized: `dyn Trait` ids identify interface contracts.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        let type_name = type_name::<T>();
        let sized = !is_unsized::<T>();
        Self {
            type_id: TypeId::of::<T>(),
            type_name,
            sized,
            contract: !sized && type_name.starts_with("dyn "),
        }
    }

    /// Returns the [`TypeId`] behind this id.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the fully qualified type name.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if the id names an interface contract (`dyn Trait`).
    ///
    /// `str` and slices are unsized too, but they are not contracts.
    #[inline]
    pub fn is_contract(&self) -> bool {
        self.contract
    }

    /// Returns `false` for `dyn Trait`, `str` and slice types.
    #[inline]
    pub fn is_sized(&self) -> bool {
        self.sized
    }

    /// Returns the type name without module paths.
    pub fn short_name(&self) -> String {
        shorten_type_name(self.type_name)
    }
}

/// Pointers to unsized types carry metadata and are wider than thin pointers.
fn is_unsized<T: ?Sized>() -> bool {
    size_of::<*const T>() != size_of::<*const ()>()
}

impl PartialEq for ComponentId {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ComponentId {}

impl Hash for ComponentId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentId({})", self.type_name)
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name)
    }
}
