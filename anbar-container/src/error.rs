//! Error types for Anbar container operations.
//!
//! Errors come in two families:
//! - [`ConfigError`]: the composition itself is wrong (duplicate ids,
//!   missing bindings, cycles...). Raised by registration, binding and
//!   finalize. Retrying cannot help; fix the registrations.
//! - [`ResolveError`]: a single lookup failed at runtime (unknown id, a
//!   factory reported an error). The caller decides what to do.

use std::fmt;

use anbar_support::rendering::{render_chain, render_reliance};

use crate::introspect::BoxError;
use crate::key::ComponentId;
use crate::literal::LiteralError;

/// Errors detected while composing the container.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Field injection was requested for a type without fields.
    #[error("{id} is not a structural type and cannot be registered for field injection")]
    NotStructural { id: ComponentId },

    /// The component id is already taken.
    #[error("{}", .0)]
    AlreadyRegistered(AlreadyRegisteredError),

    /// A tagged field is not `pub`.
    #[error("Field `{field}` of {component} is tagged for injection but is not public")]
    UnexportedField {
        component: ComponentId,
        field: &'static str,
    },

    /// A literal tag sits on a field whose type cannot hold a literal.
    #[error("Field `{field}` of {component} has type {target}, which cannot hold a literal value")]
    UnsupportedLiteral {
        component: ComponentId,
        field: &'static str,
        target: ComponentId,
    },

    /// A literal tag could not be parsed into its field's type.
    #[error("Invalid literal {raw:?} for field `{field}` of {component}: {source}")]
    InvalidLiteral {
        component: ComponentId,
        field: &'static str,
        raw: &'static str,
        #[source]
        source: LiteralError,
    },

    /// An `Arc<str>` or `Arc<[T]>` dependency. Only sized components and
    /// `dyn Trait` contracts can be injected.
    #[error("{component} depends on {dependency}, which is neither a component nor an interface contract")]
    UnsizedDependency {
        component: ComponentId,
        dependency: ComponentId,
    },

    /// A factory must return a value, optionally paired with an error.
    #[error("A factory must return one value or a (value, error) pair, found {found} return values")]
    ReturnArity { found: usize },

    /// The second return value of a factory is not an error type.
    #[error("The second return value of the factory for {component} must be an error type, found {found}")]
    NotErrorLike {
        component: ComponentId,
        found: ComponentId,
    },

    /// Only `dyn Trait` contracts can be bound.
    #[error("{interface} is not an interface contract")]
    NotAnInterface { interface: ComponentId },

    /// The interface already has a binding.
    #[error("Interface {interface} is already bound")]
    AlreadyBound { interface: ComponentId },

    /// The implementation was checked against a different contract.
    #[error("{implementation} does not implement {interface}")]
    DoesNotImplement {
        interface: ComponentId,
        implementation: ComponentId,
    },

    /// The same implementation appears twice in one binding.
    #[error("{implementation} is bound to {interface} more than once")]
    DuplicateImplementation {
        interface: ComponentId,
        implementation: ComponentId,
    },

    /// A bound implementation was never registered.
    #[error("{implementation} is bound to {interface} but was never registered")]
    UnregisteredImplementation {
        interface: ComponentId,
        implementation: ComponentId,
    },

    /// Two implementations of one interface share a friendly name.
    #[error("{first} and {second} share the name {name:?} in the binding of {interface}")]
    QualifierCollision {
        interface: ComponentId,
        name: String,
        first: ComponentId,
        second: ComponentId,
    },

    /// A dependency names a component that was never registered.
    #[error("{}", .0)]
    MissingDependency(NotRegisteredError),

    /// A dependency names an interface without a binding.
    #[error("No binding for interface {interface}, required by {required_by}")]
    Unbound {
        interface: ComponentId,
        required_by: ComponentId,
    },

    /// A qualifier names no implementation of the interface.
    #[error("Qualifier {qualifier:?} not found among implementations of {interface}, required by {required_by}")]
    QualifierNotFound {
        interface: ComponentId,
        qualifier: String,
        required_by: ComponentId,
    },

    /// The resolved dependency graph contains a cycle.
    #[error("{}", .0)]
    Cycle(CycleError),

    /// Registration or binding after finalize.
    #[error("Container is finalized. Register components before calling .finalize()")]
    Frozen,

    /// Finalize was called a second time.
    #[error("Container is already finalized, .finalize() must be called exactly once")]
    AlreadyFinalized,
}

/// Errors returned by a single resolve call.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// Resolve was called before finalize.
    #[error("Container is not finalized yet. Call .finalize() before resolving")]
    NotFinalized,

    /// The requested id was never registered.
    #[error("{}", .0)]
    NotFound(NotRegisteredError),

    /// No implementation of the interface carries this friendly name.
    #[error("Qualifier {qualifier:?} not found among implementations of {interface}")]
    QualifierNotFound {
        interface: ComponentId,
        qualifier: String,
    },

    /// A factory reported a failure.
    #[error("Failed to construct {component}: {source}")]
    Factory {
        component: ComponentId,
        #[source]
        source: BoxError,
    },

    /// Constructor arguments did not line up with the dependencies.
    #[error("Failed to construct {component}: {source}")]
    Argument {
        component: ComponentId,
        #[source]
        source: ArgError,
    },

    /// The built value could not be handed out as the requested type.
    #[error("Type mismatch: {component} cannot be provided as {expected}")]
    TypeMismatch {
        component: ComponentId,
        expected: &'static str,
    },
}

/// A constructor argument was missing or of the wrong type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgError {
    #[error("missing argument {position}, expected {expected}")]
    Missing {
        position: usize,
        expected: &'static str,
    },

    #[error("argument {position} is not a {expected}")]
    Mismatch {
        position: usize,
        expected: &'static str,
    },
}

/// Error when a component id is not registered.
///
/// Includes helpful hints about what went wrong.
#[derive(Debug)]
pub struct NotRegisteredError {
    /// The id that was requested
    pub requested: ComponentId,
    /// What required this component (if known)
    pub required_by: Option<ComponentId>,
    /// Similar names that ARE registered (for "did you mean?" suggestions)
    pub suggestions: Vec<String>,
}

impl fmt::Display for NotRegisteredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Component not registered: {}", self.requested)?;

        if let Some(ref parent) = self.required_by {
            write!(f, "\n  Required by: {parent}")?;
        }

        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean one of:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n    - {suggestion}")?;
            }
        }

        write!(
            f,
            "\n  Hint: Did you forget to register {}?",
            self.requested.short_name()
        )
    }
}

/// Error when a component id is registered twice.
#[derive(Debug)]
pub struct AlreadyRegisteredError {
    pub id: ComponentId,
}

impl fmt::Display for AlreadyRegisteredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Component already registered: {}", self.id)?;
        write!(
            f,
            "\n  Hint: Register it once, or wrap it in Box<_> for a second, distinct component"
        )
    }
}

/// One step along a dependency path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hop {
    /// A component, reached directly.
    Component(ComponentId),
    /// An interface dependency and the implementation it resolved to.
    Interface {
        interface: ComponentId,
        implementation: ComponentId,
    },
}

impl Hop {
    /// The component this hop lands on.
    pub fn target(&self) -> ComponentId {
        match self {
            Hop::Component(id) => *id,
            Hop::Interface { implementation, .. } => *implementation,
        }
    }
}

impl fmt::Display for Hop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hop::Component(id) => write!(f, "{}", id.short_name()),
            Hop::Interface { interface, implementation } => write!(
                f,
                "{}({})",
                interface.short_name(),
                implementation.short_name()
            ),
        }
    }
}

/// Error when a circular dependency is detected.
///
/// Shows the full dependency path, from the component where the traversal
/// started to the hop that closed the loop.
#[derive(Debug)]
pub struct CycleError {
    pub path: Vec<Hop>,
}

impl CycleError {
    /// The looping part of the path: from the first visit of the repeated
    /// component to its second one.
    pub fn cycle(&self) -> &[Hop] {
        let Some(last) = self.path.last() else {
            return &[];
        };
        let repeated = last.target();
        let start = self
            .path
            .iter()
            .position(|hop| hop.target() == repeated)
            .unwrap_or(0);
        &self.path[start..]
    }

    /// Returns `true` if `id` lies on the loop.
    pub fn contains(&self, id: ComponentId) -> bool {
        self.cycle().iter().any(|hop| hop.target() == id)
    }
}

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<String> = self.path.iter().map(Hop::to_string).collect();
        write!(f, "Circular dependency detected:\n  {}", render_chain(&labels))?;
        write!(f, "\n{}", render_reliance(&labels))?;
        write!(
            f,
            "  Hint: Circular dependencies are never broken lazily, restructure the components"
        )
    }
}

/// Any Anbar error, for composition roots that handle both families.
#[derive(Debug, thiserror::Error)]
pub enum AnbarError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// Convenient Result type for composition roots.
pub type Result<T> = std::result::Result<T, AnbarError>;
