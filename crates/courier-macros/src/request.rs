//! `Command`, `Query` and `Event` derive implementation.
//!
//! Each derive emits two impls for the annotated type:
//!
//! 1. `impl ::courier::__private::Request` with the family's `KIND` and `Output`
//! 2. the family marker (`Command`, `Query` or `Event`)
//!
//! Deriving two families on one type yields conflicting `Request` impls, so a
//! type can only ever belong to one family.
//!
//! | Derive | Attribute | `Output` |
//! |--------|-----------|----------|
//! | `Command` | `#[command(output = T)]` | `T`, default `()` |
//! | `Query` | `#[query(output = T)]` | `T`, default `()` |
//! | `Event` | none | always `()` |

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Attribute, Data, DeriveInput, Type, spanned::Spanned};

/// The request family a derive targets.
#[derive(Clone, Copy)]
pub enum Family {
    Command,
    Query,
    Event,
}

impl Family {
    fn name(self) -> &'static str {
        match self {
            Self::Command => "Command",
            Self::Query => "Query",
            Self::Event => "Event",
        }
    }

    /// The helper attribute carrying `output = T`, if the family has one.
    fn attribute(self) -> Option<&'static str> {
        match self {
            Self::Command => Some("command"),
            Self::Query => Some("query"),
            Self::Event => None,
        }
    }
}

pub fn derive_request(input: &DeriveInput, family: Family) -> syn::Result<TokenStream> {
    if let Data::Union(_) = input.data {
        return Err(syn::Error::new(
            input.span(),
            format!("{} cannot be derived for unions", family.name()),
        ));
    }

    let output = match family.attribute() {
        Some(attr_name) => parse_output(&input.attrs, attr_name)?,
        None => None,
    };
    let output = output.map_or_else(|| quote!(()), |ty| quote!(#ty));

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let marker = format_ident!("{}", family.name());

    Ok(quote! {
        impl #impl_generics ::courier::__private::Request for #name #ty_generics #where_clause {
            type Output = #output;
            const KIND: ::courier::__private::RequestKind =
                ::courier::__private::RequestKind::#marker;
        }

        impl #impl_generics ::courier::__private::#marker for #name #ty_generics #where_clause {}
    })
}

fn parse_output(attrs: &[Attribute], attr_name: &str) -> syn::Result<Option<Type>> {
    let mut output: Option<Type> = None;

    for attr in attrs {
        if !attr.path().is_ident(attr_name) {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("output") {
                if output.is_some() {
                    return Err(meta.error("duplicate `output`"));
                }
                output = Some(meta.value()?.parse::<Type>()?);
                Ok(())
            } else {
                Err(meta.error(format!(
                    "unknown #[{attr_name}] key, expected `output = Type`"
                )))
            }
        })?;
    }

    Ok(output)
}
