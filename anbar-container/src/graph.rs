//! Dependency graph validation.
//!
//! Runs once, inside [`Container::finalize`](crate::container::Container::finalize),
//! BEFORE the first `resolve()` call:
//! - Every concrete dependency is registered
//! - Every interface dependency has a binding, and its qualifier (if any)
//!   names one of the bound implementations
//! - The graph, with interfaces replaced by their chosen implementations,
//!   has no cycles
//!
//! The implementation chosen for each dependency is recorded so the
//! resolver never has to look it up again.

use std::collections::HashMap;

use tracing::{debug, instrument, warn};

use crate::binder::Binder;
use crate::error::{ConfigError, CycleError, Hop, NotRegisteredError};
use crate::key::ComponentId;
use crate::registry::{DependencyDescriptor, DependencyKind, Registry};

/// Resolved target per dependency, keyed by consumer. `None` for literals.
pub(crate) type Resolutions = HashMap<ComponentId, Vec<Option<ComponentId>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

/// Validates the dependency graph for correctness.
///
/// # Algorithm
/// Depth-first search from every component in registration order. A
/// component met again while still in progress closes a cycle; the hops
/// on the current path form the error report.
pub(crate) struct GraphValidator<'a> {
    registry: &'a Registry,
    binder: &'a Binder,
    marks: HashMap<ComponentId, Mark>,
    /// Current DFS path (for error reporting)
    path: Vec<Hop>,
    resolved: Resolutions,
}

impl<'a> GraphValidator<'a> {
    pub fn new(registry: &'a Registry, binder: &'a Binder) -> Self {
        Self {
            registry,
            binder,
            marks: HashMap::new(),
            path: Vec::new(),
            resolved: HashMap::new(),
        }
    }

    /// Validates the entire graph and returns the chosen targets.
    ///
    /// # Errors
    /// - [`ConfigError::MissingDependency`]: concrete dependency not registered
    /// - [`ConfigError::Unbound`]: interface dependency without a binding
    /// - [`ConfigError::QualifierNotFound`]: qualifier names no implementation
    /// - [`ConfigError::Cycle`]: cycle detected
    #[instrument(skip(self), name = "graph_validation")]
    pub fn validate(mut self) -> Result<Resolutions, ConfigError> {
        let registry = self.registry;
        debug!(
            component_count = registry.len(),
            "Starting dependency graph validation"
        );

        for &root in registry.ids() {
            if self.marks.contains_key(&root) {
                continue;
            }
            self.path.push(Hop::Component(root));
            self.visit(root)?;
            self.path.pop();
        }

        debug!("Dependency graph validation passed ✓");
        Ok(self.resolved)
    }

    /// Visits a registered component. The hop leading to it is already on
    /// the path.
    fn visit(&mut self, id: ComponentId) -> Result<(), ConfigError> {
        match self.marks.get(&id) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::InProgress) => {
                let err = CycleError { path: self.path.clone() };
                let cycle: Vec<String> = err.cycle().iter().map(Hop::to_string).collect();
                warn!(cycle = ?cycle, "Circular dependency detected!");
                return Err(ConfigError::Cycle(err));
            }
            None => {}
        }

        let registry = self.registry;
        let Some(component) = registry.get(&id) else {
            return Ok(());
        };

        self.marks.insert(id, Mark::InProgress);

        let mut targets = Vec::with_capacity(component.dependencies().len());
        for dependency in component.dependencies() {
            let Some(hop) = self.choose(id, dependency)? else {
                targets.push(None);
                continue;
            };
            self.path.push(hop);
            self.visit(hop.target())?;
            self.path.pop();
            targets.push(Some(hop.target()));
        }

        self.marks.insert(id, Mark::Done);
        self.resolved.insert(id, targets);
        Ok(())
    }

    /// Picks the component that satisfies `dependency` of `consumer`.
    fn choose(
        &self,
        consumer: ComponentId,
        dependency: &DependencyDescriptor,
    ) -> Result<Option<Hop>, ConfigError> {
        let declared = dependency.declared();
        match dependency.kind() {
            DependencyKind::Literal => Ok(None),
            DependencyKind::Concrete => {
                if !self.registry.contains(&declared) {
                    return Err(ConfigError::MissingDependency(NotRegisteredError {
                        requested: declared,
                        required_by: Some(consumer),
                        suggestions: self.registry.suggestions_for(&declared),
                    }));
                }
                Ok(Some(Hop::Component(declared)))
            }
            DependencyKind::Interface => {
                let binding = self.binder.get(&declared).ok_or(ConfigError::Unbound {
                    interface: declared,
                    required_by: consumer,
                })?;
                let implementation = match dependency.qualifier() {
                    Some(qualifier) => binding.qualified(qualifier).ok_or_else(|| {
                        ConfigError::QualifierNotFound {
                            interface: declared,
                            qualifier: qualifier.to_string(),
                            required_by: consumer,
                        }
                    })?,
                    None => binding.primary(),
                };
                Ok(Some(Hop::Interface { interface: declared, implementation }))
            }
        }
    }
}
