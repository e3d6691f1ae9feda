//! Procedural macros for Anbar.
//!
//! * `#[derive(Injectable)]` - field-injection introspection for structs

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Injectable derive implementation.
mod injectable;

/// Derives `anbar::Injectable` for a struct with named fields.
///
/// Field attributes:
/// * `#[inject]` - auto-wire an `Arc<T>` or `Arc<dyn Trait>` field
/// * `#[inject(qualifier = "Name")]` - pick an interface implementation by name
/// * `#[inject(value = "29")]` - parse a literal into a primitive field
///
/// Untagged fields are filled with `Default::default()`.
///
/// ```ignore
/// #[derive(Injectable)]
/// pub struct Checkout {
///     #[inject]
///     pub repo: Arc<OrderRepository>,
///     #[inject(qualifier = "Stripe")]
///     pub payments: Arc<dyn PaymentGateway>,
///     #[inject(value = "3")]
///     pub retries: u32,
///     attempts: AtomicU32,
/// }
/// ```
#[proc_macro_derive(Injectable, attributes(inject))]
pub fn derive_injectable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    injectable::expand(&input)
        .unwrap_or_else(|err| err.write_errors())
        .into()
}
