//! Component registry. Stores every registration for a container.
//!
//! The registry turns introspection handles into [`ComponentDescriptor`]s.
//! It is populated during the registration phase, annotated once by
//! finalize (resolved dependency targets) and read-only afterwards.

use std::collections::HashMap;
use std::fmt;

use anbar_support::rendering::suggest_similar;
use tracing::{debug, trace};

use crate::error::{AlreadyRegisteredError, ConfigError};
use crate::factory::FactoryHandle;
use crate::introspect::{AssembleFn, CallFn, ShareFn, TypeHandle};
use crate::key::ComponentId;
use crate::literal::LiteralValue;
use crate::scope::Scope;

/// How a dependency is satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyKind {
    /// A pre-parsed literal.
    Literal,
    /// Another component, by its own id.
    Concrete,
    /// An interface contract, resolved to one of its implementations.
    Interface,
}

/// One injectable field or factory parameter.
#[derive(Debug, Clone)]
pub struct DependencyDescriptor {
    declared: ComponentId,
    kind: DependencyKind,
    qualifier: Option<String>,
    literal: Option<LiteralValue>,
    resolved: Option<ComponentId>,
    field: Option<&'static str>,
}

impl DependencyDescriptor {
    /// The id or interface id as declared by the field or parameter.
    pub fn declared(&self) -> ComponentId {
        self.declared
    }

    pub fn kind(&self) -> DependencyKind {
        self.kind
    }

    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    pub fn literal(&self) -> Option<&LiteralValue> {
        self.literal.as_ref()
    }

    /// The component that satisfies this dependency. Empty before finalize
    /// and for literals.
    pub fn resolved(&self) -> Option<ComponentId> {
        self.resolved
    }

    /// Field name, for field-injected components.
    pub fn field(&self) -> Option<&'static str> {
        self.field
    }

    fn wired(
        component: ComponentId,
        declared: ComponentId,
        qualifier: Option<String>,
        field: Option<&'static str>,
    ) -> Result<Self, ConfigError> {
        let kind = if declared.is_contract() {
            DependencyKind::Interface
        } else if declared.is_sized() {
            DependencyKind::Concrete
        } else {
            return Err(ConfigError::UnsizedDependency { component, dependency: declared });
        };
        Ok(Self {
            declared,
            kind,
            qualifier,
            literal: None,
            resolved: None,
            field,
        })
    }
}

/// Construction strategy of a component.
#[derive(Clone)]
pub enum Construction {
    /// Allocate at `depth` and assign the injectable fields.
    FieldInjection { depth: usize, assemble: AssembleFn },
    /// Call a factory with the dependencies as arguments.
    FactoryCall { fallible: bool, call: CallFn },
}

impl Construction {
    pub fn is_factory(&self) -> bool {
        matches!(self, Construction::FactoryCall { .. })
    }
}

impl fmt::Debug for Construction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Construction::FieldInjection { depth, .. } => f
                .debug_struct("FieldInjection")
                .field("depth", depth)
                .finish(),
            Construction::FactoryCall { fallible, .. } => f
                .debug_struct("FactoryCall")
                .field("fallible", fallible)
                .finish(),
        }
    }
}

/// Everything the container knows about one registered component.
#[derive(Debug, Clone)]
pub struct ComponentDescriptor {
    id: ComponentId,
    name: String,
    scope: Scope,
    construction: Construction,
    share: ShareFn,
    dependencies: Vec<DependencyDescriptor>,
}

impl ComponentDescriptor {
    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// Friendly name used by qualifiers.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn construction(&self) -> &Construction {
        &self.construction
    }

    /// Dependencies in field or parameter order.
    pub fn dependencies(&self) -> &[DependencyDescriptor] {
        &self.dependencies
    }

    pub(crate) fn share_fn(&self) -> ShareFn {
        self.share
    }
}

/// Stores all component registrations.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    components: HashMap<ComponentId, ComponentDescriptor>,
    order: Vec<ComponentId>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a structural component for field injection.
    ///
    /// # Errors
    /// - [`ConfigError::NotStructural`]: the type has no fields to fill
    /// - [`ConfigError::AlreadyRegistered`]: the id is taken
    /// - [`ConfigError::UnexportedField`]: a tagged field is not `pub`
    /// - [`ConfigError::UnsupportedLiteral`] / [`ConfigError::InvalidLiteral`]
    /// - [`ConfigError::UnsizedDependency`]: a wired field is `Arc<str>` or `Arc<[T]>`
    pub fn register_component(
        &mut self,
        handle: TypeHandle,
        scope: Scope,
        name: Option<String>,
    ) -> Result<(), ConfigError> {
        let id = handle.id;
        if !handle.structural {
            return Err(ConfigError::NotStructural { id });
        }
        self.ensure_vacant(id)?;

        let mut dependencies = Vec::new();
        for field in &handle.fields {
            if let Some(raw) = field.tags.value {
                if !field.exported {
                    return Err(ConfigError::UnexportedField { component: id, field: field.name });
                }
                let kind = field.literal_kind.ok_or(ConfigError::UnsupportedLiteral {
                    component: id,
                    field: field.name,
                    target: field.target,
                })?;
                let value = kind.parse(raw).map_err(|source| ConfigError::InvalidLiteral {
                    component: id,
                    field: field.name,
                    raw,
                    source,
                })?;
                trace!(component = %id, field = field.name, literal = ?value, "Parsed literal");
                dependencies.push(DependencyDescriptor {
                    declared: field.target,
                    kind: DependencyKind::Literal,
                    qualifier: None,
                    literal: Some(value),
                    resolved: None,
                    field: Some(field.name),
                });
            } else if field.tags.auto_wire {
                if !field.exported {
                    return Err(ConfigError::UnexportedField { component: id, field: field.name });
                }
                dependencies.push(DependencyDescriptor::wired(
                    id,
                    field.target,
                    field.tags.qualifier.map(str::to_string),
                    Some(field.name),
                )?);
            }
        }

        self.insert(ComponentDescriptor {
            id,
            name: name.unwrap_or(handle.name),
            scope,
            construction: Construction::FieldInjection {
                depth: handle.depth,
                assemble: handle.assemble,
            },
            share: handle.share,
            dependencies,
        });
        Ok(())
    }

    /// Registers a factory; the component id is the factory's first return type.
    ///
    /// # Errors
    /// - [`ConfigError::ReturnArity`]: not one or two return values
    /// - [`ConfigError::NotErrorLike`]: second return value is not an error
    /// - [`ConfigError::AlreadyRegistered`]: the id is taken
    /// - [`ConfigError::UnsizedDependency`]: a parameter is `Arc<str>` or `Arc<[T]>`
    pub fn register_factory(
        &mut self,
        handle: FactoryHandle,
        scope: Scope,
        name: Option<String>,
    ) -> Result<(), ConfigError> {
        let (output, error) = match handle.returns.as_slice() {
            [output] => (output, None),
            [output, error] => (output, Some(error)),
            returns => return Err(ConfigError::ReturnArity { found: returns.len() }),
        };
        let id = output.id;
        if let Some(error) = error {
            if !error.error_like {
                return Err(ConfigError::NotErrorLike { component: id, found: error.id });
            }
        }
        self.ensure_vacant(id)?;

        let dependencies = handle
            .params
            .iter()
            .map(|param| DependencyDescriptor::wired(id, *param, None, None))
            .collect::<Result<Vec<_>, _>>()?;

        self.insert(ComponentDescriptor {
            id,
            name: name.unwrap_or_else(|| output.name.clone()),
            scope,
            construction: Construction::FactoryCall {
                fallible: error.is_some(),
                call: handle.call,
            },
            share: handle.share,
            dependencies,
        });
        Ok(())
    }

    /// Looks up a registration by id.
    pub fn get(&self, id: &ComponentId) -> Option<&ComponentDescriptor> {
        self.components.get(id)
    }

    pub fn contains(&self, id: &ComponentId) -> bool {
        self.components.contains_key(id)
    }

    /// Component ids in registration order.
    pub fn ids(&self) -> &[ComponentId] {
        &self.order
    }

    /// Returns the number of registered components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Returns true if no components are registered.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Ids of every singleton-scoped component.
    pub fn singletons(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.order
            .iter()
            .filter(|id| self.components.get(id).is_some_and(|c| c.scope.is_cached()))
            .copied()
    }

    /// Writes the targets chosen by the graph validator back into the
    /// dependencies. Concrete dependencies resolve to themselves.
    pub fn apply_resolutions(&mut self, resolved: HashMap<ComponentId, Vec<Option<ComponentId>>>) {
        for (id, targets) in resolved {
            let Some(component) = self.components.get_mut(&id) else {
                continue;
            };
            for (dependency, target) in component.dependencies.iter_mut().zip(targets) {
                dependency.resolved = target;
            }
        }
    }

    /// Registered type names close to `id`, best match first.
    pub fn suggestions_for(&self, id: &ComponentId) -> Vec<String> {
        let names: Vec<&str> = self.order.iter().map(|id| id.type_name()).collect();
        suggest_similar(id.type_name(), &names, 3)
    }

    fn ensure_vacant(&self, id: ComponentId) -> Result<(), ConfigError> {
        if self.components.contains_key(&id) {
            return Err(ConfigError::AlreadyRegistered(AlreadyRegisteredError { id }));
        }
        Ok(())
    }

    fn insert(&mut self, descriptor: ComponentDescriptor) {
        debug!(
            id = %descriptor.id,
            name = %descriptor.name,
            scope = %descriptor.scope,
            dependencies = descriptor.dependencies.len(),
            factory = descriptor.construction.is_factory(),
            "Registered component"
        );
        self.order.push(descriptor.id);
        self.components.insert(descriptor.id, descriptor);
    }
}
