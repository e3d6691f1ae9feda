//! # Anbar Support
//!
//! Shared utilities for the Anbar DI framework.
//!
//! This crate provides:
//! - Text rendering for dependency paths in diagnostics
//! - Short type names used as default component names
//! - "Did you mean?" suggestions for unknown ids

pub mod rendering;
