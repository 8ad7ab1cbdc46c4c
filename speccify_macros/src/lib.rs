//! Derive macro backing `speccify::Dataclass`.
//!
//! `#[derive(Dataclass)]` records the serialized name, type, default-ness and doc
//! comment of every field so that request validation and OpenAPI generation can
//! walk the struct without a value in hand. It reads the subset of `#[serde(...)]`
//! attributes that change the wire shape of a field: `default`, `rename`,
//! `skip`/`skip_deserializing` and `skip_serializing`/`skip_serializing_if`.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse_macro_input, Attribute, Data, DeriveInput, Expr, ExprLit, Fields, Lit, LitStr, Meta,
    Result as SynResult, Token,
};

#[derive(Default)]
struct SerdeAttrs {
    default: bool,
    rename: Option<String>,
    skip: bool,
    skip_serializing: bool,
    skip_serializing_if: bool,
}

fn parse_serde_attrs(attrs: &[Attribute]) -> SynResult<SerdeAttrs> {
    let mut out = SerdeAttrs::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("serde")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("default") {
                out.default = true;
                if meta.input.peek(Token![=]) {
                    let _: LitStr = meta.value()?.parse()?;
                }
            } else if meta.path.is_ident("rename") {
                if meta.input.peek(Token![=]) {
                    let lit: LitStr = meta.value()?.parse()?;
                    out.rename = Some(lit.value());
                } else {
                    return Err(meta.error(
                        "Dataclass only understands `rename = \"...\"`; split serialize/deserialize names are not supported",
                    ));
                }
            } else if meta.path.is_ident("skip") || meta.path.is_ident("skip_deserializing") {
                out.skip = true;
            } else if meta.path.is_ident("skip_serializing") {
                out.skip_serializing = true;
            } else if meta.path.is_ident("skip_serializing_if") {
                out.skip_serializing_if = true;
                let _: LitStr = meta.value()?.parse()?;
            } else if meta.path.is_ident("rename_all") || meta.path.is_ident("flatten") {
                return Err(meta.error(
                    "Dataclass does not support `rename_all` or `flatten`; rename fields individually",
                ));
            } else if meta.input.peek(Token![=]) {
                let _: Expr = meta.value()?.parse()?;
            } else if meta.input.peek(syn::token::Paren) {
                let content;
                syn::parenthesized!(content in meta.input);
                let _: TokenStream2 = content.parse()?;
            }
            Ok(())
        })?;
    }
    Ok(out)
}

fn doc_text(attrs: &[Attribute]) -> Option<String> {
    let lines: Vec<String> = attrs
        .iter()
        .filter(|a| a.path().is_ident("doc"))
        .filter_map(|a| match &a.meta {
            Meta::NameValue(nv) => match &nv.value {
                Expr::Lit(ExprLit {
                    lit: Lit::Str(s), ..
                }) => Some(s.value().trim().to_string()),
                _ => None,
            },
            _ => None,
        })
        .collect();
    let text = lines.join("\n").trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn optional_str(value: Option<String>) -> TokenStream2 {
    match value {
        Some(s) => quote! { ::std::option::Option::Some(#s) },
        None => quote! { ::std::option::Option::None },
    }
}

fn expand(input: DeriveInput) -> SynResult<TokenStream2> {
    let ident = &input.ident;
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Dataclass cannot be derived for generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            Fields::Unit | Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(
                    ident,
                    "Dataclass requires a struct with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                ident,
                "Dataclass can only be derived for structs",
            ))
        }
    };

    let container = parse_serde_attrs(&input.attrs)?;
    let mut field_infos = Vec::with_capacity(fields.len());
    for field in fields {
        let attrs = parse_serde_attrs(&field.attrs)?;
        if attrs.skip {
            continue;
        }
        let Some(field_ident) = field.ident.as_ref() else {
            continue;
        };
        let raw = field_ident.to_string();
        let name = attrs
            .rename
            .unwrap_or_else(|| raw.strip_prefix("r#").unwrap_or(&raw).to_string());
        let has_default = attrs.default || container.default;
        let ty = &field.ty;
        let description = optional_str(doc_text(&field.attrs));
        let output = if attrs.skip_serializing {
            quote! { ::speccify::FieldOutput::Never }
        } else if attrs.skip_serializing_if {
            quote! { ::speccify::FieldOutput::Conditional }
        } else {
            quote! { ::speccify::FieldOutput::Always }
        };
        field_infos.push(quote! {
            ::speccify::FieldInfo {
                name: #name,
                ty: <#ty as ::speccify::Schema>::field_type(),
                has_default: #has_default,
                output: #output,
                description: #description,
            }
        });
    }

    let name = container.rename.unwrap_or_else(|| ident.to_string());
    let description = optional_str(doc_text(&input.attrs));

    Ok(quote! {
        impl ::speccify::Dataclass for #ident {
            fn dataclass_info() -> ::speccify::DataclassInfo {
                ::speccify::DataclassInfo {
                    name: #name,
                    type_name: ::std::any::type_name::<#ident>(),
                    description: #description,
                    fields: ::std::vec![#(#field_infos),*],
                }
            }
        }

        impl ::speccify::Schema for #ident {
            fn field_type() -> ::speccify::FieldType {
                ::speccify::FieldType::Dataclass(<#ident as ::speccify::Dataclass>::dataclass_info)
            }
        }
    })
}

#[proc_macro_derive(Dataclass, attributes(serde))]
pub fn derive_dataclass(item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    match expand(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
