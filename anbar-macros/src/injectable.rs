//! `#[derive(Injectable)]` expansion.

use darling::{Error, FromDeriveInput, FromMeta, ast, util};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Field, GenericArgument, Meta, PathArguments, Type, Visibility, parse_quote};

#[derive(FromDeriveInput)]
#[darling(supports(struct_named, struct_unit))]
struct InjectableInput {
    ident: syn::Ident,
    generics: syn::Generics,
    data: ast::Data<util::Ignored, Field>,
}

/// Arguments of `#[inject(...)]`.
#[derive(Debug, Default, FromMeta)]
#[darling(default)]
struct InjectArgs {
    value: Option<String>,
    qualifier: Option<String>,
}

/// What the container does with one field.
enum FieldRole<'a> {
    Literal { raw: String },
    Wired { target: &'a Type, qualifier: Option<String> },
    Plain,
}

pub fn expand(input: &DeriveInput) -> darling::Result<TokenStream> {
    let parsed = InjectableInput::from_derive_input(input)?;
    let fields = parsed
        .data
        .take_struct()
        .map(|fields| fields.fields)
        .unwrap_or_default();

    let mut errors = Error::accumulator();
    let mut infos = Vec::with_capacity(fields.len());
    let mut inits = Vec::with_capacity(fields.len());

    for field in &fields {
        let Some(role) = errors.handle(field_role(field)) else {
            continue;
        };
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let name = ident.to_string();
        let exported = matches!(field.vis, Visibility::Public(_));
        let ty = &field.ty;

        match role {
            FieldRole::Literal { raw } => {
                infos.push(quote! {
                    ::anbar::FieldInfo::literal::<#ty>(#name, #exported, #raw)
                });
                inits.push(quote! { #ident: args.literal::<#ty>()? });
            }
            FieldRole::Wired { target, qualifier } => {
                let qualifier = match qualifier {
                    Some(name) => quote! { ::std::option::Option::Some(#name) },
                    None => quote! { ::std::option::Option::None },
                };
                infos.push(quote! {
                    ::anbar::FieldInfo::wired::<#target>(#name, #exported, #qualifier)
                });
                inits.push(quote! { #ident: args.shared::<#target>()? });
            }
            FieldRole::Plain => {
                infos.push(quote! {
                    ::anbar::FieldInfo::plain::<#ty>(#name, #exported)
                });
                inits.push(quote! { #ident: ::std::default::Default::default() });
            }
        }
    }
    errors.finish()?;

    let ident = &parsed.ident;
    let mut generics = parsed.generics.clone();
    let params: Vec<syn::Ident> = generics.type_params().map(|param| param.ident.clone()).collect();
    let where_clause = generics.make_where_clause();
    for param in params {
        where_clause.predicates.push(parse_quote! {
            #param: ::std::marker::Send + ::std::marker::Sync + 'static
        });
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::anbar::Injectable for #ident #ty_generics #where_clause {
            fn fields() -> ::std::vec::Vec<::anbar::FieldInfo> {
                ::std::vec![#(#infos),*]
            }

            fn assemble(
                args: &mut ::anbar::Args,
            ) -> ::std::result::Result<Self, ::anbar::ArgError> {
                ::std::result::Result::Ok(Self { #(#inits),* })
            }
        }
    })
}

/// Reads the `#[inject]` attribute of a field, if any.
fn field_role(field: &Field) -> darling::Result<FieldRole<'_>> {
    let Some(attr) = field.attrs.iter().find(|attr| attr.path().is_ident("inject")) else {
        return Ok(FieldRole::Plain);
    };

    let args = match &attr.meta {
        Meta::Path(_) => InjectArgs::default(),
        meta @ Meta::List(_) => InjectArgs::from_meta(meta).map_err(|err| err.with_span(attr))?,
        Meta::NameValue(_) => {
            return Err(Error::custom("expected `#[inject]` or `#[inject(...)]`").with_span(attr));
        }
    };

    match args {
        InjectArgs { value: Some(_), qualifier: Some(_) } => {
            Err(Error::custom("`value` and `qualifier` cannot be combined").with_span(attr))
        }
        InjectArgs { value: Some(raw), qualifier: None } => Ok(FieldRole::Literal { raw }),
        InjectArgs { value: None, qualifier } => {
            let target = arc_inner(&field.ty).ok_or_else(|| {
                Error::custom("an injected field must have type `Arc<T>` or `Arc<dyn Trait>`")
                    .with_span(&field.ty)
            })?;
            Ok(FieldRole::Wired { target, qualifier })
        }
    }
}

/// Extracts `T` from `Arc<T>` (or any path ending in `Arc<T>`).
fn arc_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != "Arc" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}
