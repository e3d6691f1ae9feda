//! Component lifecycle scopes and registration options.
//!
//! Scopes determine how long a resolved component lives:
//! - [`Scope::Singleton`]: one instance for the lifetime of the container
//! - [`Scope::Prototype`]: new instance every time
use std::fmt;

use serde::{Deserialize, Serialize};

/// Defines the lifetime of a component within the container.
///
/// # Examples
/// ```
/// use anbar_container::scope::Scope;
///
/// assert_eq!(Scope::default(), Scope::Singleton);
/// assert!(Scope::Singleton.is_cached());
/// assert!(!Scope::Prototype.is_cached());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// One instance shared by every consumer.
    ///
    /// Built on first resolve, lives until the container is dropped.
    ///
    /// # When to use
    /// - Connection pools
    /// - Configuration objects
    /// - Shared caches
    #[default]
    Singleton,

    /// New instance built on every resolve call.
    ///
    /// Never cached. Every dependency subtree is rebuilt too, except for
    /// singletons inside it.
    ///
    /// # When to use
    /// - Objects with mutable state that shouldn't be shared
    /// - Request handlers
    Prototype,
}

impl Scope {
    /// Returns `true` if this scope caches instances.
    #[inline]
    pub fn is_cached(&self) -> bool {
        matches!(self, Scope::Singleton)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Singleton => write!(f, "Singleton"),
            Scope::Prototype => write!(f, "Prototype"),
        }
    }
}

/// Per-registration options.
///
/// Unset fields fall back to the container [`Settings`] (scope) or to the
/// bare type name (name).
///
/// ```
/// use anbar_container::scope::{Options, Scope};
///
/// let options = Options::prototype().named("Primary");
/// assert_eq!(options.scope, Some(Scope::Prototype));
/// assert_eq!(options.name.as_deref(), Some("Primary"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    pub scope: Option<Scope>,
    pub name: Option<String>,
}

impl Options {
    pub fn singleton() -> Self {
        Self { scope: Some(Scope::Singleton), name: None }
    }

    pub fn prototype() -> Self {
        Self { scope: Some(Scope::Prototype), name: None }
    }

    /// Overrides the friendly name used for qualifier lookups.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Container-wide defaults.
///
/// Deserializable so a composition root can keep them next to the rest of
/// its configuration:
///
/// ```
/// use anbar_container::scope::{Scope, Settings};
///
/// let settings: Settings = serde_json::from_str(r#"{ "default-scope": "prototype" }"#).unwrap();
/// assert_eq!(settings.default_scope, Scope::Prototype);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Settings {
    /// Scope applied when a registration does not choose one.
    pub default_scope: Scope,
}
