//! `#[hazelcast(...)]` attribute parsing shared by the derives.

use quote::quote;
use syn::{Attribute, Data, DeriveInput, Field, Fields, Lit};

/// Struct-level settings.
#[derive(Default)]
pub struct StructAttrs {
    pub factory_id: Option<i32>,
    pub class_id: Option<i32>,
    pub version: Option<i32>,
    pub type_name: Option<String>,
}

/// Field-level settings.
#[derive(Default)]
pub struct FieldAttrs {
    pub field_name: Option<String>,
    pub skip: bool,
}

pub fn parse_struct_attrs(attrs: &[Attribute]) -> syn::Result<StructAttrs> {
    let mut parsed = StructAttrs::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("hazelcast")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("factory_id") {
                parsed.factory_id = Some(parse_int(&meta)?);
            } else if meta.path.is_ident("class_id") {
                parsed.class_id = Some(parse_int(&meta)?);
            } else if meta.path.is_ident("version") {
                parsed.version = Some(parse_int(&meta)?);
            } else if meta.path.is_ident("type_name") {
                parsed.type_name = Some(parse_str(&meta)?);
            } else {
                return Err(meta.error("unknown hazelcast attribute"));
            }
            Ok(())
        })?;
    }
    Ok(parsed)
}

pub fn parse_field_attrs(field: &Field) -> syn::Result<FieldAttrs> {
    let mut parsed = FieldAttrs::default();
    for attr in field.attrs.iter().filter(|a| a.path().is_ident("hazelcast")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                parsed.skip = true;
            } else if meta.path.is_ident("field_name") {
                parsed.field_name = Some(parse_str(&meta)?);
            } else {
                return Err(meta.error("unknown hazelcast field attribute"));
            }
            Ok(())
        })?;
    }
    Ok(parsed)
}

fn parse_int(meta: &syn::meta::ParseNestedMeta<'_>) -> syn::Result<i32> {
    match meta.value()?.parse::<Lit>()? {
        Lit::Int(lit) => lit.base10_parse(),
        other => Err(syn::Error::new(other.span(), "expected an integer")),
    }
}

fn parse_str(meta: &syn::meta::ParseNestedMeta<'_>) -> syn::Result<String> {
    match meta.value()?.parse::<Lit>()? {
        Lit::Str(lit) => Ok(lit.value()),
        other => Err(syn::Error::new(other.span(), "expected a string")),
    }
}

/// Returns the named fields of a struct, or an error naming the derive.
pub fn named_fields<'a>(
    input: &'a DeriveInput,
    derive: &str,
) -> syn::Result<impl Iterator<Item = &'a Field>> {
    match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => Ok(fields.named.iter()),
            _ => Err(syn::Error::new_spanned(
                &input.ident,
                format!("{} only supports structs with named fields", derive),
            )),
        },
        _ => Err(syn::Error::new_spanned(
            &input.ident,
            format!("{} can only be derived for structs", derive),
        )),
    }
}

/// Renders a type without whitespace, for matching against supported types.
pub fn type_to_string(ty: &syn::Type) -> String {
    quote!(#ty).to_string().replace(' ', "")
}

pub fn unsupported(field: &Field, derive: &str) -> syn::Error {
    let ty = &field.ty;
    syn::Error::new_spanned(
        ty,
        format!(
            "{} does not support field type `{}`; mark it #[hazelcast(skip)]",
            derive,
            type_to_string(ty)
        ),
    )
}
