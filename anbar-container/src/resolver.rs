//! Runtime resolution of a finalized container.
//!
//! The resolver only walks what finalize already proved: every dependency
//! has a resolved target and the graph is acyclic. It builds components
//! bottom-up, caching singletons in the [`LifecycleCache`].

use tracing::{debug, trace, warn};

use crate::binder::Binder;
use crate::error::{NotRegisteredError, ResolveError};
use crate::introspect::{Args, Instance, Value};
use crate::key::ComponentId;
use crate::lifecycle::LifecycleCache;
use crate::registry::{ComponentDescriptor, Construction, DependencyDescriptor, DependencyKind, Registry};

/// Read-only view used by resolve calls.
pub(crate) struct Resolver<'a> {
    registry: &'a Registry,
    binder: &'a Binder,
    cache: &'a LifecycleCache,
}

impl<'a> Resolver<'a> {
    pub fn new(registry: &'a Registry, binder: &'a Binder, cache: &'a LifecycleCache) -> Self {
        Self { registry, binder, cache }
    }

    /// Resolves a component id, or an interface id to its primary.
    pub fn resolve_id(&self, id: &ComponentId) -> Result<Instance, ResolveError> {
        if let Some(binding) = self.binder.get(id) {
            return self.resolve(&binding.primary());
        }
        self.resolve(id)
    }

    /// Resolves a registered component, honouring its scope.
    pub fn resolve(&self, id: &ComponentId) -> Result<Instance, ResolveError> {
        let component = self.registry.get(id).ok_or_else(|| {
            ResolveError::NotFound(NotRegisteredError {
                requested: *id,
                required_by: None,
                suggestions: self.registry.suggestions_for(id),
            })
        })?;

        trace!(component = %id, "Resolving");
        match self.cache.entry(id) {
            Some(entry) => entry.get_or_build(|| self.build(component)).inspect_err(|err| {
                warn!(component = %id, error = %err, "Singleton build failed, will retry on next resolve");
            }),
            None => self.build(component),
        }
    }

    fn build(&self, component: &ComponentDescriptor) -> Result<Instance, ResolveError> {
        let id = component.id();
        debug!(component = %id, scope = %component.scope(), "Building component");

        let mut values = Vec::with_capacity(component.dependencies().len());
        for dependency in component.dependencies() {
            values.push(self.argument(id, dependency)?);
        }
        let mut args = Args::new(values);

        let instance = match component.construction() {
            Construction::FieldInjection { assemble, .. } => assemble(&mut args)
                .map_err(|source| ResolveError::Argument { component: id, source })?,
            Construction::FactoryCall { call, .. } => call(&mut args)
                .map_err(|source| ResolveError::Argument { component: id, source })?
                .map_err(|source| ResolveError::Factory { component: id, source })?,
        };

        trace!(component = %id, "Built component");
        Ok(instance)
    }

    /// Produces the constructor argument for one dependency of `consumer`.
    fn argument(
        &self,
        consumer: ComponentId,
        dependency: &DependencyDescriptor,
    ) -> Result<Value, ResolveError> {
        let declared = dependency.declared();
        if let Some(literal) = dependency.literal() {
            return Ok(literal.to_value());
        }

        let target = dependency.resolved().unwrap_or(declared);
        let instance = self.resolve(&target)?;
        let mismatch = || ResolveError::TypeMismatch {
            component: target,
            expected: declared.type_name(),
        };

        match dependency.kind() {
            DependencyKind::Interface => {
                let binding = self.binder.get(&declared).ok_or_else(mismatch)?;
                binding.cast(&target, &instance).ok_or_else(mismatch)
            }
            DependencyKind::Concrete | DependencyKind::Literal => {
                let component = self.registry.get(&target).ok_or_else(mismatch)?;
                trace!(consumer = %consumer, dependency = %target, "Wiring dependency");
                (component.share_fn())(&instance).ok_or_else(mismatch)
            }
        }
    }
}
