//! Core container implementation for Anbar DI.

pub mod binder;
pub mod container;
pub mod error;
pub mod factory;
mod graph;
pub mod introspect;
pub mod key;
pub mod lifecycle;
pub mod literal;
pub mod provider;
pub mod registry;
mod resolver;
pub mod scope;

pub use container::{Binding, Container, prelude};
pub use error::{AnbarError, ArgError, ConfigError, CycleError, Hop, ResolveError, Result};
pub use factory::{Constructor, FactoryHandle, ReturnInfo};
pub use introspect::{Args, FieldInfo, Implementation, Implements, Injectable, Instance, TypeHandle};
pub use key::ComponentId;
pub use lifecycle::SingletonState;
pub use literal::{Complex, Complex32, Complex64, Literal, LiteralValue, PrimitiveKind};
pub use provider::Provider;
pub use registry::{ComponentDescriptor, Construction, DependencyDescriptor, DependencyKind};
pub use scope::{Options, Scope, Settings};
