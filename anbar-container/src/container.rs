//! # Container
//!
//! The dependency injection container that wires components together
//! and manages the lifecycle of singletons.
//!
//! # Phases
//! ```text
//! Container::new() ──component / factory / binding──> (registering)
//!                                                        │
//!                                                   finalize()
//!                                                        │
//!                                                        ▼
//!                                    (finalized) ──resolve──> Arc<T>
//! ```
//!
//! Registration and binding take `&mut self` and only succeed before
//! [`finalize`](Container::finalize). Resolving takes `&self` and only
//! succeeds after it, so a finalized container can be shared between
//! threads.
//!
//! # Examples
//! ```rust
//! use anbar_container::prelude::*;
//! use anbar_container::introspect::{Args, FieldInfo};
//! use anbar_container::error::ArgError;
//! use std::sync::Arc;
//!
//! trait Logger: Send + Sync {
//!     fn log(&self, msg: &str) -> String;
//! }
//!
//! struct ConsoleLogger;
//! impl Logger for ConsoleLogger {
//!     fn log(&self, msg: &str) -> String { format!("[console] {msg}") }
//! }
//! implements!(ConsoleLogger => dyn Logger);
//!
//! impl Injectable for ConsoleLogger {
//!     fn fields() -> Vec<FieldInfo> { vec![] }
//!     fn assemble(_: &mut Args) -> std::result::Result<Self, ArgError> { Ok(ConsoleLogger) }
//! }
//!
//! struct UserService {
//!     logger: Arc<dyn Logger>,
//! }
//!
//! let mut container = Container::new();
//! container
//!     .component::<ConsoleLogger>(Options::default())?
//!     .binding(Binding::<dyn Logger>::to::<ConsoleLogger>())?
//!     .factory(|logger: Arc<dyn Logger>| UserService { logger }, Options::prototype())?;
//! container.finalize()?;
//!
//! let service = container.resolve::<UserService>()?;
//! assert_eq!(service.logger.log("hi"), "[console] hi");
//! # Ok::<(), AnbarError>(())
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{debug, info, instrument, trace, warn};

use crate::binder::{Binder, InterfaceBinding};
use crate::error::{ConfigError, NotRegisteredError, ResolveError};
use crate::factory::{Constructor, FactoryHandle};
use crate::graph::GraphValidator;
use crate::introspect::{Implementation, Implements, Injectable, Instance, TypeHandle};
use crate::key::ComponentId;
use crate::lifecycle::{LifecycleCache, SingletonState};
use crate::provider::Provider;
use crate::registry::{ComponentDescriptor, Registry};
use crate::resolver::Resolver;
use crate::scope::{Options, Settings};

// ═══════════════════════════════════════════
// Binding
// ═══════════════════════════════════════════

/// Typed description of an interface binding.
///
/// ```rust,ignore
/// container.binding(Binding::<dyn Greeter>::to::<Console>().or::<Remote>())?;
/// ```
pub struct Binding<I: ?Sized + 'static> {
    primary: Implementation,
    alternatives: Vec<Implementation>,
    _contract: PhantomData<fn(&I)>,
}

impl<I: ?Sized + 'static> Binding<I> {
    /// Binds `I` with `P` as its primary implementation.
    pub fn to<P: Implements<I>>() -> Self {
        Self {
            primary: Implementation::of::<I, P>(),
            alternatives: Vec::new(),
            _contract: PhantomData,
        }
    }

    /// Adds `P` as an alternative, reachable by qualifier.
    pub fn or<P: Implements<I>>(mut self) -> Self {
        self.alternatives.push(Implementation::of::<I, P>());
        self
    }
}

impl<I: ?Sized + 'static> fmt::Debug for Binding<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("interface", &ComponentId::of::<I>())
            .field("primary", &self.primary)
            .field("alternatives", &self.alternatives)
            .finish()
    }
}

// ═══════════════════════════════════════════
// Container
// ═══════════════════════════════════════════

/// Dependency injection container.
///
/// Created empty by [`Container::new`], filled, then frozen by
/// [`finalize`](Container::finalize).
pub struct Container {
    settings: Settings,
    registry: Registry,
    binder: Binder,
    /// Present once finalized.
    cache: Option<LifecycleCache>,
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Container {
    /// Creates an empty container with default [`Settings`].
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self {
            settings,
            registry: Registry::new(),
            binder: Binder::new(),
            cache: None,
        }
    }

    // ── Registration ──

    /// Registers `T` for field injection.
    ///
    /// ```rust,ignore
    /// container.component::<Database>(Options::default())?;
    /// container.component::<Box<Database>>(Options::prototype())?; // distinct component
    /// ```
    pub fn component<T: Injectable>(&mut self, options: Options) -> Result<&mut Self, ConfigError> {
        self.register_component(TypeHandle::of::<T>(), options)
    }

    /// Registers a factory. Its parameters are its dependencies, its return
    /// type is the component.
    pub fn factory<F, P>(&mut self, factory: F, options: Options) -> Result<&mut Self, ConfigError>
    where
        F: Constructor<P>,
    {
        self.register_factory(FactoryHandle::infallible(factory), options)
    }

    /// Registers a factory returning `Result<T, E>`; the component is `T`.
    pub fn try_factory<F, P, T, E>(
        &mut self,
        factory: F,
        options: Options,
    ) -> Result<&mut Self, ConfigError>
    where
        F: Constructor<P, Output = std::result::Result<T, E>>,
        T: Send + Sync + 'static,
        E: std::error::Error + Send + Sync + 'static,
    {
        self.register_factory(FactoryHandle::fallible(factory), options)
    }

    /// Binds an interface to its implementations.
    pub fn binding<I: ?Sized + 'static>(&mut self, binding: Binding<I>) -> Result<&mut Self, ConfigError> {
        self.bind(ComponentId::of::<I>(), binding.primary, binding.alternatives)
    }

    /// Runs a [`Provider`] module against this container.
    pub fn install(&mut self, provider: &dyn Provider) -> Result<&mut Self, ConfigError> {
        debug!(provider = provider.name(), "Installing provider");
        provider.register(self).inspect_err(|err| {
            warn!(provider = provider.name(), error = %err, "Provider registration failed");
        })?;
        Ok(self)
    }

    /// Registers a component from an erased [`TypeHandle`].
    pub fn register_component(
        &mut self,
        handle: TypeHandle,
        options: Options,
    ) -> Result<&mut Self, ConfigError> {
        self.ensure_registering()?;
        let scope = options.scope.unwrap_or(self.settings.default_scope);
        self.registry.register_component(handle, scope, options.name)?;
        Ok(self)
    }

    /// Registers a factory from an erased [`FactoryHandle`].
    pub fn register_factory(
        &mut self,
        handle: FactoryHandle,
        options: Options,
    ) -> Result<&mut Self, ConfigError> {
        self.ensure_registering()?;
        let scope = options.scope.unwrap_or(self.settings.default_scope);
        self.registry.register_factory(handle, scope, options.name)?;
        Ok(self)
    }

    /// Binds `interface` to a primary implementation and alternatives.
    pub fn bind(
        &mut self,
        interface: ComponentId,
        primary: Implementation,
        alternatives: Vec<Implementation>,
    ) -> Result<&mut Self, ConfigError> {
        self.ensure_registering()?;
        self.binder.bind(interface, primary, alternatives)?;
        Ok(self)
    }

    // ── Finalize ──

    /// Validates the whole composition and freezes the container.
    ///
    /// Checks: every implementation registered, qualifiers unique, every
    /// dependency satisfiable, no cycles. A failed finalize leaves the
    /// container open for registration, so it can be fixed and retried.
    #[instrument(skip(self), name = "container_finalize")]
    pub fn finalize(&mut self) -> Result<(), ConfigError> {
        if self.cache.is_some() {
            return Err(ConfigError::AlreadyFinalized);
        }
        info!(
            components = self.registry.len(),
            interfaces = self.binder.len(),
            "Finalizing container"
        );

        self.binder.index_qualifiers(&self.registry)?;
        let resolved = GraphValidator::new(&self.registry, &self.binder).validate()?;
        self.registry.apply_resolutions(resolved);

        let cache = LifecycleCache::new(self.registry.singletons());
        debug!(singletons = cache.len(), "Singleton cache ready");
        self.cache = Some(cache);

        info!("Container finalized ✓");
        Ok(())
    }

    pub fn is_finalized(&self) -> bool {
        self.cache.is_some()
    }

    // ── Resolve ──

    /// Resolve a component by type.
    ///
    /// ```rust,ignore
    /// let db: Arc<Database> = container.resolve()?;
    /// ```
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ResolveError> {
        let id = ComponentId::of::<T>();
        trace!(id = %id, "Resolving");
        self.resolve_id(&id)?
            .downcast::<T>()
            .map_err(|_| ResolveError::TypeMismatch {
                component: id,
                expected: std::any::type_name::<T>(),
            })
    }

    /// Resolve the primary implementation of interface `I`.
    pub fn resolve_interface<I: ?Sized + 'static>(&self) -> Result<Arc<I>, ResolveError> {
        let binding = self.interface_binding::<I>()?;
        self.cast(binding, binding.primary())
    }

    /// Resolve the implementation of interface `I` whose friendly name is `name`.
    pub fn resolve_qualified<I: ?Sized + 'static>(&self, name: &str) -> Result<Arc<I>, ResolveError> {
        let binding = self.interface_binding::<I>()?;
        let implementation =
            binding
                .qualified(name)
                .ok_or_else(|| ResolveError::QualifierNotFound {
                    interface: binding.interface(),
                    qualifier: name.to_string(),
                })?;
        self.cast(binding, implementation)
    }

    /// Resolve by erased id. An interface id resolves to its primary
    /// implementation.
    pub fn resolve_id(&self, id: &ComponentId) -> Result<Instance, ResolveError> {
        let cache = self.cache.as_ref().ok_or(ResolveError::NotFinalized)?;
        Resolver::new(&self.registry, &self.binder, cache).resolve_id(id)
    }

    // ── Diagnostics ──

    /// Read-only view of a registration.
    pub fn describe(&self, id: &ComponentId) -> Option<&ComponentDescriptor> {
        self.registry.get(id)
    }

    /// Lifecycle state of a singleton. `None` for prototypes, unknown ids
    /// and before finalize.
    pub fn singleton_state(&self, id: &ComponentId) -> Option<SingletonState> {
        self.cache.as_ref()?.state(id)
    }

    /// Number of registered components.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    // ── Internal ──

    fn ensure_registering(&self) -> Result<(), ConfigError> {
        if self.cache.is_some() {
            return Err(ConfigError::Frozen);
        }
        Ok(())
    }

    fn interface_binding<I: ?Sized + 'static>(&self) -> Result<&InterfaceBinding, ResolveError> {
        if self.cache.is_none() {
            return Err(ResolveError::NotFinalized);
        }
        let interface = ComponentId::of::<I>();
        self.binder.get(&interface).ok_or_else(|| {
            ResolveError::NotFound(NotRegisteredError {
                requested: interface,
                required_by: None,
                suggestions: Vec::new(),
            })
        })
    }

    fn cast<I: ?Sized + 'static>(
        &self,
        binding: &InterfaceBinding,
        implementation: ComponentId,
    ) -> Result<Arc<I>, ResolveError> {
        let instance = self.resolve_id(&implementation)?;
        let mismatch = || ResolveError::TypeMismatch {
            component: implementation,
            expected: std::any::type_name::<Arc<I>>(),
        };
        let value = binding.cast(&implementation, &instance).ok_or_else(mismatch)?;
        value.downcast::<Arc<I>>().map(|boxed| *boxed).map_err(|_| mismatch())
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("registered", &self.registry.len())
            .field("bound", &self.binder.len())
            .field("finalized", &self.is_finalized())
            .finish()
    }
}

// ═══════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════

pub mod prelude {
    pub use super::{Binding, Container};
    pub use crate::error::{AnbarError, ConfigError, ResolveError, Result};
    pub use crate::implements;
    pub use crate::introspect::{Implements, Injectable};
    pub use crate::key::ComponentId;
    pub use crate::provider::Provider;
    pub use crate::scope::{Options, Scope, Settings};
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════
