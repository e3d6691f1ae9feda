//! # Anbar: dependency injection container for Rust
//!
//! Register components (structs filled field by field, or factory
//! functions), bind `dyn Trait` contracts to implementations, validate the
//! whole graph once with `finalize`, then resolve fully wired instances from
//! any thread.
//!
//! ```rust
//! use std::sync::Arc;
//! use anbar::{Binding, Container, Injectable, Options, implements};
//!
//! pub trait Greeter: Send + Sync {
//!     fn greet(&self) -> String;
//! }
//!
//! #[derive(Injectable)]
//! pub struct Console {
//!     #[inject(value = "hello")]
//!     pub word: String,
//! }
//!
//! impl Greeter for Console {
//!     fn greet(&self) -> String {
//!         self.word.clone()
//!     }
//! }
//!
//! implements!(Console => dyn Greeter);
//!
//! #[derive(Injectable)]
//! pub struct App {
//!     #[inject]
//!     pub greeter: Arc<dyn Greeter>,
//! }
//!
//! let mut container = Container::new();
//! container
//!     .component::<Console>(Options::default())?
//!     .component::<App>(Options::prototype())?
//!     .binding(Binding::<dyn Greeter>::to::<Console>())?;
//! container.finalize()?;
//!
//! let app = container.resolve::<App>()?;
//! assert_eq!(app.greeter.greet(), "hello");
//! # Ok::<(), anbar::AnbarError>(())
//! ```

pub use anbar_container::*;
pub use anbar_derive::*;
pub use anbar_support::*;
