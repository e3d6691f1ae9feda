//! Interface bindings.
//!
//! Each `dyn Trait` contract is bound at most once, to a primary
//! implementation plus optional alternatives. The primary answers
//! unqualified lookups; qualifiers select any member by its friendly name.

use std::collections::HashMap;

use tracing::debug;

use crate::error::ConfigError;
use crate::introspect::{CastFn, Implementation, Instance, Value};
use crate::key::ComponentId;
use crate::registry::Registry;

/// The binding of one interface.
#[derive(Debug, Clone)]
pub(crate) struct InterfaceBinding {
    interface: ComponentId,
    primary: ComponentId,
    alternatives: Vec<ComponentId>,
    casts: HashMap<ComponentId, CastFn>,
    qualifiers: HashMap<String, ComponentId>,
}

impl InterfaceBinding {
    pub fn interface(&self) -> ComponentId {
        self.interface
    }

    pub fn primary(&self) -> ComponentId {
        self.primary
    }

    /// Primary first, then the alternatives.
    pub fn members(&self) -> impl Iterator<Item = ComponentId> + '_ {
        std::iter::once(self.primary).chain(self.alternatives.iter().copied())
    }

    /// Implementation registered under a friendly name. Empty until finalize.
    pub fn qualified(&self, name: &str) -> Option<ComponentId> {
        self.qualifiers.get(name).copied()
    }

    /// Hands out an instance of `implementation` as `Arc<dyn Interface>`.
    pub(crate) fn cast(&self, implementation: &ComponentId, instance: &Instance) -> Option<Value> {
        let cast = self.casts.get(implementation)?;
        cast(instance)
    }
}

/// Stores every interface binding for a container.
#[derive(Debug, Default)]
pub(crate) struct Binder {
    bindings: HashMap<ComponentId, InterfaceBinding>,
    order: Vec<ComponentId>,
}

impl Binder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `interface` to a primary implementation and alternatives.
    ///
    /// # Errors
    /// - [`ConfigError::NotAnInterface`]: `interface` is not a `dyn Trait`
    /// - [`ConfigError::AlreadyBound`]
    /// - [`ConfigError::DoesNotImplement`]: an implementation was checked
    ///   against another contract
    /// - [`ConfigError::DuplicateImplementation`]
    pub fn bind(
        &mut self,
        interface: ComponentId,
        primary: Implementation,
        alternatives: Vec<Implementation>,
    ) -> Result<(), ConfigError> {
        if !interface.is_contract() {
            return Err(ConfigError::NotAnInterface { interface });
        }
        if self.bindings.contains_key(&interface) {
            return Err(ConfigError::AlreadyBound { interface });
        }

        let mut casts = HashMap::new();
        let mut members = Vec::with_capacity(alternatives.len());
        for implementation in std::iter::once(&primary).chain(&alternatives) {
            if implementation.contract() != interface {
                return Err(ConfigError::DoesNotImplement {
                    interface,
                    implementation: implementation.id(),
                });
            }
            if casts.insert(implementation.id(), implementation.cast_fn()).is_some() {
                return Err(ConfigError::DuplicateImplementation {
                    interface,
                    implementation: implementation.id(),
                });
            }
            members.push(implementation.id());
        }

        debug!(
            interface = %interface,
            primary = %primary.id(),
            alternatives = alternatives.len(),
            "Bound interface"
        );
        self.order.push(interface);
        self.bindings.insert(
            interface,
            InterfaceBinding {
                interface,
                primary: primary.id(),
                alternatives: members.split_off(1),
                casts,
                qualifiers: HashMap::new(),
            },
        );
        Ok(())
    }

    pub fn get(&self, interface: &ComponentId) -> Option<&InterfaceBinding> {
        self.bindings.get(interface)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Rebuilds the friendly-name index of every binding.
    ///
    /// # Errors
    /// - [`ConfigError::UnregisteredImplementation`]: a member was never
    ///   registered
    /// - [`ConfigError::QualifierCollision`]: two members share a name
    pub fn index_qualifiers(&mut self, registry: &Registry) -> Result<(), ConfigError> {
        for interface in &self.order {
            let Some(binding) = self.bindings.get_mut(interface) else {
                continue;
            };
            binding.qualifiers.clear();

            let members: Vec<ComponentId> = binding.members().collect();
            for implementation in members {
                let Some(component) = registry.get(&implementation) else {
                    return Err(ConfigError::UnregisteredImplementation {
                        interface: *interface,
                        implementation,
                    });
                };
                if let Some(first) = binding
                    .qualifiers
                    .insert(component.name().to_string(), implementation)
                {
                    return Err(ConfigError::QualifierCollision {
                        interface: *interface,
                        name: component.name().to_string(),
                        first,
                        second: implementation,
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ArgError;
    use crate::introspect::{Args, FieldInfo, Injectable, TypeHandle};
    use crate::scope::Scope;
    use std::sync::Arc;

    trait Greeter: Send + Sync {
        fn greet(&self) -> &'static str;
    }

    trait Sink: Send + Sync {}

    struct Console;
    struct Remote;

    impl Greeter for Console {
        fn greet(&self) -> &'static str {
            "console"
        }
    }

    impl Greeter for Remote {
        fn greet(&self) -> &'static str {
            "remote"
        }
    }

    impl Sink for Console {}

    crate::implements!(Console, Remote => dyn Greeter);
    crate::implements!(Console => dyn Sink);

    impl Injectable for Console {
        fn fields() -> Vec<FieldInfo> {
            vec![]
        }

        fn assemble(_: &mut Args) -> Result<Self, ArgError> {
            Ok(Console)
        }
    }

    impl Injectable for Remote {
        fn fields() -> Vec<FieldInfo> {
            vec![]
        }

        fn assemble(_: &mut Args) -> Result<Self, ArgError> {
            Ok(Remote)
        }
    }

    fn greeter() -> ComponentId {
        ComponentId::of::<dyn Greeter>()
    }

    #[test]
    fn bind_keeps_primary_and_alternatives_apart() {
        let mut binder = Binder::new();
        binder
            .bind(
                greeter(),
                Implementation::of::<dyn Greeter, Console>(),
                vec![Implementation::of::<dyn Greeter, Remote>()],
            )
            .unwrap();

        let binding = binder.get(&greeter()).unwrap();
        assert_eq!(binding.primary(), ComponentId::of::<Console>());
        let members: Vec<_> = binding.members().collect();
        assert_eq!(members, vec![ComponentId::of::<Console>(), ComponentId::of::<Remote>()]);
    }

    #[test]
    fn cast_returns_contract_object() {
        let mut binder = Binder::new();
        binder
            .bind(greeter(), Implementation::of::<dyn Greeter, Remote>(), vec![])
            .unwrap();
        let instance: Instance = Arc::new(Remote);
        let value = binder
            .get(&greeter())
            .unwrap()
            .cast(&ComponentId::of::<Remote>(), &instance)
            .unwrap();
        let greeter = value.downcast::<Arc<dyn Greeter>>().unwrap();
        assert_eq!(greeter.greet(), "remote");
    }

    #[test]
    fn concrete_type_is_not_an_interface() {
        let mut binder = Binder::new();
        let result = binder.bind(
            ComponentId::of::<Console>(),
            Implementation::of::<dyn Greeter, Console>(),
            vec![],
        );
        assert!(matches!(result, Err(ConfigError::NotAnInterface { .. })));
    }

    #[test]
    fn second_bind_fails() {
        let mut binder = Binder::new();
        binder
            .bind(greeter(), Implementation::of::<dyn Greeter, Console>(), vec![])
            .unwrap();
        let result = binder.bind(greeter(), Implementation::of::<dyn Greeter, Remote>(), vec![]);
        assert!(matches!(result, Err(ConfigError::AlreadyBound { .. })));
        assert_eq!(binder.len(), 1);
    }

    #[test]
    fn implementation_of_other_contract_fails() {
        let mut binder = Binder::new();
        let result = binder.bind(greeter(), Implementation::of::<dyn Sink, Console>(), vec![]);
        match result {
            Err(ConfigError::DoesNotImplement { implementation, .. }) => {
                assert_eq!(implementation, ComponentId::of::<Console>());
            }
            other => panic!("Expected DoesNotImplement, got: {other:?}"),
        }
    }

    #[test]
    fn primary_repeated_as_alternative_fails() {
        let mut binder = Binder::new();
        let result = binder.bind(
            greeter(),
            Implementation::of::<dyn Greeter, Console>(),
            vec![Implementation::of::<dyn Greeter, Console>()],
        );
        assert!(matches!(result, Err(ConfigError::DuplicateImplementation { .. })));
        assert!(binder.get(&greeter()).is_none());
    }

    #[test]
    fn qualifiers_use_friendly_names() {
        let mut registry = Registry::new();
        registry
            .register_component(TypeHandle::of::<Console>(), Scope::Singleton, None)
            .unwrap();
        registry
            .register_component(TypeHandle::of::<Remote>(), Scope::Singleton, Some("Cloud".into()))
            .unwrap();

        let mut binder = Binder::new();
        binder
            .bind(
                greeter(),
                Implementation::of::<dyn Greeter, Console>(),
                vec![Implementation::of::<dyn Greeter, Remote>()],
            )
            .unwrap();
        binder.index_qualifiers(&registry).unwrap();

        let binding = binder.get(&greeter()).unwrap();
        assert_eq!(binding.qualified("Console"), Some(ComponentId::of::<Console>()));
        assert_eq!(binding.qualified("Cloud"), Some(ComponentId::of::<Remote>()));
        assert_eq!(binding.qualified("Remote"), None);
    }

    #[test]
    fn shared_friendly_name_collides() {
        let mut registry = Registry::new();
        registry
            .register_component(TypeHandle::of::<Console>(), Scope::Singleton, Some("Main".into()))
            .unwrap();
        registry
            .register_component(TypeHandle::of::<Remote>(), Scope::Singleton, Some("Main".into()))
            .unwrap();

        let mut binder = Binder::new();
        binder
            .bind(
                greeter(),
                Implementation::of::<dyn Greeter, Console>(),
                vec![Implementation::of::<dyn Greeter, Remote>()],
            )
            .unwrap();
        match binder.index_qualifiers(&registry) {
            Err(ConfigError::QualifierCollision { name, first, second, .. }) => {
                assert_eq!(name, "Main");
                assert_eq!(first, ComponentId::of::<Console>());
                assert_eq!(second, ComponentId::of::<Remote>());
            }
            other => panic!("Expected QualifierCollision, got: {other:?}"),
        }
    }

    #[test]
    fn unregistered_member_is_reported() {
        let registry = Registry::new();
        let mut binder = Binder::new();
        binder
            .bind(greeter(), Implementation::of::<dyn Greeter, Console>(), vec![])
            .unwrap();
        assert!(matches!(
            binder.index_qualifiers(&registry),
            Err(ConfigError::UnregisteredImplementation { .. })
        ));
    }
}
