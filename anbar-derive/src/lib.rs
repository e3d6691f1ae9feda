//! Derive macros for Anbar.
//!
//! Re-exported by the `anbar` facade; depend on `anbar` rather than on
//! this crate directly, the generated code refers to `::anbar` paths.

pub use anbar_macros::Injectable;
