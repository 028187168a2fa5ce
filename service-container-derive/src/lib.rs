//! Derive macros for service-container
//!
//! - `#[derive(Constructible)]` - Generate a `Describe` impl whose
//!   constructor parameters come from the struct's fields
//!
//! # Example
//!
//! ```rust,ignore
//! use service_container::{Constructible, Container};
//! use std::sync::Arc;
//!
//! #[derive(Constructible)]
//! struct UserService {
//!     #[inject]
//!     db: Arc<Database>,
//!     #[inject(key = "cache")]
//!     cache: Arc<Cache>,
//!     #[param(default = 30_u64)]
//!     timeout_secs: u64,
//!     // Unannotated fields use Default
//!     request_count: u64,
//! }
//!
//! let container = Container::new();
//! container.register::<UserService>();
//! let users = container.make_type::<UserService>()?;
//! ```

use proc_macro::TokenStream;
use proc_macro2::Literal;
use quote::quote;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Expr, Fields, LitStr, Meta, Type};

/// Derive macro for the `Describe` trait.
///
/// The generated descriptor names the type by `type_key::<Self>()` and has a
/// declared constructor with one parameter per annotated field, in field
/// order.
///
/// # Attributes
///
/// - `#[inject]` - Class-shaped parameter. The field must be `Arc<T>`; the
///   parameter's type name is `type_key::<T>()`.
/// - `#[inject(key = "name")]` - Class-shaped parameter with an explicit type name.
/// - `#[param]` - Plain parameter with no default (resolution fails with
///   `MissingDefault`). The field type must be `Clone`.
/// - `#[param(default = expr)]` - Plain parameter with a declared default.
///
/// Fields without an attribute are not parameters and use `Default::default()`.
#[proc_macro_derive(Constructible, attributes(inject, param))]
pub fn derive_constructible(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let name = &input.ident;
    let generics = &input.generics;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    // Only support structs with named fields
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return syn::Error::new_spanned(
                    &input,
                    "Constructible can only be derived for structs with named fields",
                )
                .to_compile_error()
                .into();
            }
        },
        _ => {
            return syn::Error::new_spanned(&input, "Constructible can only be derived for structs")
                .to_compile_error()
                .into();
        }
    };

    let mut params = Vec::new();
    let mut field_inits = Vec::new();

    for field in fields.iter() {
        let Some(field_name) = field.ident.as_ref() else {
            continue;
        };
        let field_type = &field.ty;
        let label = field_name.to_string();
        let position = Literal::usize_unsuffixed(params.len());

        let role = match field_role(&field.attrs) {
            Ok(role) => role,
            Err(err) => return err.to_compile_error().into(),
        };

        match role {
            Some(FieldRole::Inject { key }) => {
                let Some(inner_type) = extract_arc_inner_type(field_type) else {
                    return syn::Error::new_spanned(
                        field_type,
                        "Fields marked with #[inject] must have type Arc<T>",
                    )
                    .to_compile_error()
                    .into();
                };
                let type_name = match key {
                    Some(key) => quote! { #key },
                    None => quote! { ::service_container::type_key::<#inner_type>() },
                };
                params.push(quote! {
                    ::service_container::Param::class(#label, #type_name)
                });
                field_inits.push(quote! {
                    #field_name: __args.get::<#inner_type>(#position)?
                });
            }
            Some(FieldRole::Param { default }) => {
                let param = match default {
                    Some(expr) => quote! {
                        ::service_container::Param::value(#label).with_default::<#field_type>(#expr)
                    },
                    None => quote! { ::service_container::Param::value(#label) },
                };
                params.push(param);
                field_inits.push(quote! {
                    #field_name: __args.value::<#field_type>(#position)?
                });
            }
            None => {
                field_inits.push(quote! {
                    #field_name: ::std::default::Default::default()
                });
            }
        }
    }

    let expanded = quote! {
        impl #impl_generics ::service_container::Describe for #name #ty_generics #where_clause {
            fn describe() -> ::service_container::TypeDescriptor {
                ::service_container::TypeDescriptor::new(::service_container::type_key::<Self>())
                    .constructor(
                        ::std::vec![#(#params),*],
                        |__args: &::service_container::Args| {
                            ::std::result::Result::Ok(Self {
                                #(#field_inits),*
                            })
                        },
                    )
            }
        }
    };

    TokenStream::from(expanded)
}

/// How a field takes part in construction
enum FieldRole {
    Inject { key: Option<LitStr> },
    Param { default: Option<Expr> },
}

/// Find and parse the #[inject] or #[param] attribute
fn field_role(attrs: &[Attribute]) -> syn::Result<Option<FieldRole>> {
    for attr in attrs {
        if attr.path().is_ident("inject") {
            let mut key = None;
            if !matches!(attr.meta, Meta::Path(_)) {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("key") {
                        key = Some(meta.value()?.parse::<LitStr>()?);
                        Ok(())
                    } else {
                        Err(meta.error("expected `key = \"...\"`"))
                    }
                })?;
            }
            return Ok(Some(FieldRole::Inject { key }));
        }

        if attr.path().is_ident("param") {
            let mut default = None;
            if !matches!(attr.meta, Meta::Path(_)) {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("default") {
                        default = Some(meta.value()?.parse::<Expr>()?);
                        Ok(())
                    } else {
                        Err(meta.error("expected `default = <expr>`"))
                    }
                })?;
            }
            return Ok(Some(FieldRole::Param { default }));
        }
    }
    Ok(None)
}

/// Extract T from Arc<T>
fn extract_arc_inner_type(ty: &Type) -> Option<&Type> {
    if let Type::Path(type_path) = ty {
        let segment = type_path.path.segments.last()?;
        if segment.ident == "Arc" {
            if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
                if let Some(syn::GenericArgument::Type(inner)) = args.args.first() {
                    return Some(inner);
                }
            }
        }
    }
    None
}
