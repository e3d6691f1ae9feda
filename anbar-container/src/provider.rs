//! Provider trait: a module of related registrations.
//!
//! Providers group the components and bindings of one concern so a
//! composition root can install them with one call.
//!
//! # Examples
//! ```rust,ignore
//! struct StorageProvider;
//!
//! impl Provider for StorageProvider {
//!     fn register(&self, container: &mut Container) -> Result<(), ConfigError> {
//!         container
//!             .component::<PostgresRepository>(Options::default())?
//!             .binding(Binding::<dyn Repository>::to::<PostgresRepository>())?;
//!         Ok(())
//!     }
//! }
//!
//! container.install(&StorageProvider)?.install(&MailProvider)?;
//! ```

use crate::container::Container;
use crate::error::ConfigError;

/// A module that registers related components into a container.
///
/// Split registrations by domain instead of keeping one giant block:
///
/// ```rust,ignore
/// container.install(&DatabaseProvider)?;
/// container.install(&AuthProvider)?;
/// container.install(&EmailProvider)?;
/// ```
pub trait Provider: Send + Sync {
    /// Registers components and bindings.
    ///
    /// Called once, from [`Container::install`], before finalize.
    fn register(&self, container: &mut Container) -> Result<(), ConfigError>;

    /// Human-readable name for logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
