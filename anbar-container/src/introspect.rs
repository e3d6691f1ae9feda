//! Type-introspection capability.
//!
//! The container never inspects Rust types itself. Everything it needs to
//! know about a component (its fields and their tags, how to allocate it,
//! which contracts it satisfies) comes through the types in this module.
//! `#[derive(Injectable)]` produces them for ordinary structs; they can also
//! be written by hand.
//!
//! # Shapes
//! ```text
//! Injectable (typed) ──TypeHandle::of──> TypeHandle (erased) ──> Registry
//! Fn(Arc<A>..) -> T ──FactoryHandle──────────────────────────> Registry
//! Implements<dyn I> ──Implementation::of─────────────────────> Binder
//! ```

use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

use anbar_support::rendering::shorten_type_name;

use crate::error::ArgError;
use crate::key::ComponentId;
use crate::literal::{Literal, PrimitiveKind};

/// A constructed component, shared between every consumer that holds it.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// One argument slot handed to a constructor.
pub type Value = Box<dyn Any>;

/// Error reported by a fallible factory.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Turns an [`Instance`] of a component into a [`Value`] holding `Arc<T>`.
pub type ShareFn = fn(&Instance) -> Option<Value>;

/// Turns an [`Instance`] of an implementation into a [`Value`] holding `Arc<dyn I>`.
pub type CastFn = fn(&Instance) -> Option<Value>;

/// Allocates a component and assigns its injectable fields.
pub type AssembleFn = Arc<dyn Fn(&mut Args) -> Result<Instance, ArgError> + Send + Sync>;

/// Invokes a factory. The outer error reports argument extraction, the
/// inner one is the factory's own failure.
pub type CallFn =
    Arc<dyn Fn(&mut Args) -> Result<Result<Instance, BoxError>, ArgError> + Send + Sync>;

/// [`ShareFn`] for component type `T`.
pub fn share<T: Send + Sync + 'static>(instance: &Instance) -> Option<Value> {
    let concrete = Arc::clone(instance).downcast::<T>().ok()?;
    Some(Box::new(concrete) as Value)
}

// ============================================================
// Fields
// ============================================================

/// Injection tags attached to one field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldTags {
    /// Literal to parse into the field (`#[inject(value = "...")]`).
    pub value: Option<&'static str>,
    /// The field is filled with another component (`#[inject]`).
    pub auto_wire: bool,
    /// Friendly name of the wanted implementation.
    pub qualifier: Option<&'static str>,
}

/// One field of a structural type, in declaration order.
#[derive(Debug, Clone)]
pub struct FieldInfo {
    pub name: &'static str,
    /// `true` for `pub` fields.
    pub exported: bool,
    /// The field's type, or the `T` of an `Arc<T>` dependency.
    pub target: ComponentId,
    /// Set when the field's type can hold a literal.
    pub literal_kind: Option<PrimitiveKind>,
    pub tags: FieldTags,
}

impl FieldInfo {
    /// A field filled from a literal tag.
    pub fn literal<T: Literal>(name: &'static str, exported: bool, raw: &'static str) -> Self {
        Self {
            name,
            exported,
            target: ComponentId::of::<T>(),
            literal_kind: Some(T::KIND),
            tags: FieldTags { value: Some(raw), ..FieldTags::default() },
        }
    }

    /// An `Arc<T>` field filled with another component.
    ///
    /// `T` is either a component type or a `dyn Trait` contract.
    pub fn wired<T: ?Sized + 'static>(
        name: &'static str,
        exported: bool,
        qualifier: Option<&'static str>,
    ) -> Self {
        Self {
            name,
            exported,
            target: ComponentId::of::<T>(),
            literal_kind: None,
            tags: FieldTags { auto_wire: true, qualifier, ..FieldTags::default() },
        }
    }

    /// A field left at its default value.
    pub fn plain<T: ?Sized + 'static>(name: &'static str, exported: bool) -> Self {
        Self {
            name,
            exported,
            target: ComponentId::of::<T>(),
            literal_kind: None,
            tags: FieldTags::default(),
        }
    }

    /// Returns `true` if the container assigns this field.
    pub fn is_injected(&self) -> bool {
        self.tags.value.is_some() || self.tags.auto_wire
    }
}

// ============================================================
// Injectable
// ============================================================

/// Compile-time description of a structural component.
///
/// Usually derived:
///
/// ```rust,ignore
/// #[derive(Injectable)]
/// pub struct Service {
///     #[inject(qualifier = "Console")]
///     pub greeter: Arc<dyn Greeter>,
///     #[inject(value = "3")]
///     pub retries: u32,
///     hits: AtomicU64,
/// }
/// ```
///
/// `assemble` must consume one argument per injected field, in the same
/// order `fields` lists them. Fields that are not injected keep their
/// `Default` value.
pub trait Injectable: Sized + Send + Sync + 'static {
    /// Bare type name, the default friendly name.
    fn name() -> String {
        shorten_type_name(type_name::<Self>())
    }

    /// Number of allocation levels above the record itself.
    fn depth() -> usize {
        0
    }

    /// Returns `false` for types that have no fields to inject into.
    fn structural() -> bool {
        true
    }

    fn fields() -> Vec<FieldInfo>;

    fn assemble(args: &mut Args) -> Result<Self, ArgError>;
}

/// A boxed component is a separate component one level deeper.
///
/// Allocation is staged: the record is assembled first, then boxed.
impl<T: Injectable> Injectable for Box<T> {
    fn name() -> String {
        T::name()
    }

    fn depth() -> usize {
        T::depth() + 1
    }

    fn structural() -> bool {
        T::structural()
    }

    fn fields() -> Vec<FieldInfo> {
        T::fields()
    }

    fn assemble(args: &mut Args) -> Result<Self, ArgError> {
        Ok(Box::new(T::assemble(args)?))
    }
}

/// Erased description of a structural component, as the registry sees it.
#[derive(Clone)]
pub struct TypeHandle {
    pub id: ComponentId,
    pub name: String,
    pub depth: usize,
    pub structural: bool,
    pub fields: Vec<FieldInfo>,
    pub assemble: AssembleFn,
    pub share: ShareFn,
}

impl TypeHandle {
    pub fn of<T: Injectable>() -> Self {
        Self {
            id: ComponentId::of::<T>(),
            name: T::name(),
            depth: T::depth(),
            structural: T::structural(),
            fields: T::fields(),
            assemble: Arc::new(|args: &mut Args| {
                T::assemble(args).map(|value| Arc::new(value) as Instance)
            }),
            share: share::<T>,
        }
    }
}

impl fmt::Debug for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeHandle")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("depth", &self.depth)
            .field("fields", &self.fields)
            .finish()
    }
}

// ============================================================
// Args
// ============================================================

/// Positional arguments for one constructor call.
///
/// Values arrive in dependency order: field declaration order for derived
/// components, parameter order for factories.
pub struct Args {
    values: std::vec::IntoIter<Value>,
    position: usize,
}

impl Args {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values: values.into_iter(), position: 0 }
    }

    /// Takes the next argument as a shared component or contract.
    pub fn shared<T: ?Sized + 'static>(&mut self) -> Result<Arc<T>, ArgError> {
        let (position, value) = self.next(type_name::<Arc<T>>())?;
        value
            .downcast::<Arc<T>>()
            .map(|boxed| *boxed)
            .map_err(|_| ArgError::Mismatch { position, expected: type_name::<Arc<T>>() })
    }

    /// Takes the next argument as a literal.
    pub fn literal<T: Literal>(&mut self) -> Result<T, ArgError> {
        let (position, value) = self.next(type_name::<T>())?;
        T::from_value(value).map_err(|_| ArgError::Mismatch { position, expected: type_name::<T>() })
    }

    /// Number of arguments not consumed yet.
    pub fn remaining(&self) -> usize {
        self.values.len()
    }

    fn next(&mut self, expected: &'static str) -> Result<(usize, Value), ArgError> {
        let position = self.position;
        let value = self
            .values
            .next()
            .ok_or(ArgError::Missing { position, expected })?;
        self.position += 1;
        Ok((position, value))
    }
}

impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Args")
            .field("position", &self.position)
            .field("remaining", &self.remaining())
            .finish()
    }
}

// ============================================================
// Contracts
// ============================================================

/// Declares that a component satisfies contract `I`.
///
/// Use [`implements!`](crate::implements) rather than writing the impl:
///
/// ```
/// use anbar_container::implements;
///
/// trait Greeter: Send + Sync {}
/// struct Console;
/// impl Greeter for Console {}
///
/// implements!(Console => dyn Greeter);
/// ```
pub trait Implements<I: ?Sized + 'static>: Send + Sync + 'static {
    fn upcast(self: Arc<Self>) -> Arc<I>;
}

/// Implements [`Implements`] for one or more types by unsizing coercion.
#[macro_export]
macro_rules! implements {
    ($($ty:ty),+ => $contract:ty) => {
        $(
            impl $crate::introspect::Implements<$contract> for $ty {
                fn upcast(self: ::std::sync::Arc<Self>) -> ::std::sync::Arc<$contract> {
                    self
                }
            }
        )+
    };
}

/// A component together with the contract it was proven to satisfy.
#[derive(Clone, Copy)]
pub struct Implementation {
    id: ComponentId,
    contract: ComponentId,
    cast: CastFn,
}

impl Implementation {
    /// `P` as an implementation of `I`.
    pub fn of<I: ?Sized + 'static, P: Implements<I>>() -> Self {
        Self {
            id: ComponentId::of::<P>(),
            contract: ComponentId::of::<I>(),
            cast: cast::<I, P>,
        }
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// The contract this implementation was checked against.
    pub fn contract(&self) -> ComponentId {
        self.contract
    }

    pub(crate) fn cast_fn(&self) -> CastFn {
        self.cast
    }
}

impl fmt::Debug for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Implementation({} as {})", self.id, self.contract)
    }
}

fn cast<I: ?Sized + 'static, P: Implements<I>>(instance: &Instance) -> Option<Value> {
    let concrete = Arc::clone(instance).downcast::<P>().ok()?;
    Some(Box::new(concrete.upcast()) as Value)
}
