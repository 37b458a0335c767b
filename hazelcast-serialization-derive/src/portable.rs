//! Derive macro implementation for `HazelcastPortable`.

use proc_macro2::TokenStream;
use quote::quote;
use syn::DeriveInput;

use crate::attrs::{named_fields, parse_field_attrs, parse_struct_attrs, type_to_string, unsupported};

const DERIVE: &str = "HazelcastPortable";

pub fn derive_portable_impl(input: DeriveInput) -> syn::Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let attrs = parse_struct_attrs(&input.attrs)?;
    let factory_id = attrs.factory_id.ok_or_else(|| {
        syn::Error::new_spanned(name, "HazelcastPortable requires #[hazelcast(factory_id = N)]")
    })?;
    let class_id = attrs.class_id.ok_or_else(|| {
        syn::Error::new_spanned(name, "HazelcastPortable requires #[hazelcast(class_id = N)]")
    })?;
    let version = attrs.version.map(|version| {
        quote! {
            fn version(&self) -> Option<i32> {
                Some(#version)
            }
        }
    });

    let mut write_stmts = Vec::new();
    let mut read_stmts = Vec::new();

    for field in named_fields(&input, DERIVE)? {
        let Some(field_ident) = field.ident.as_ref() else {
            continue;
        };
        let field_attrs = parse_field_attrs(field)?;
        if field_attrs.skip {
            read_stmts.push(quote! { self.#field_ident = ::core::default::Default::default(); });
            continue;
        }
        let wire_name = field_attrs
            .field_name
            .unwrap_or_else(|| field_ident.to_string());

        let (write, read) = match type_to_string(&field.ty).as_str() {
            "bool" => scalar(field_ident, quote!(write_bool), quote!(read_bool)),
            "i8" => scalar(field_ident, quote!(write_byte), quote!(read_byte)),
            "i16" => scalar(field_ident, quote!(write_short), quote!(read_short)),
            "i32" => scalar(field_ident, quote!(write_int), quote!(read_int)),
            "i64" => scalar(field_ident, quote!(write_long), quote!(read_long)),
            "f32" => scalar(field_ident, quote!(write_float), quote!(read_float)),
            "f64" => scalar(field_ident, quote!(write_double), quote!(read_double)),
            "char" => scalar(field_ident, quote!(write_char), quote!(read_char)),
            "String" => (
                quote! { writer.write_string(name, Some(self.#field_ident.as_str()))?; },
                quote! { reader.read_string(name)?.unwrap_or_default() },
            ),
            "Option<String>" => (
                quote! { writer.write_string(name, self.#field_ident.as_deref())?; },
                quote! { reader.read_string(name)? },
            ),
            "Vec<u8>" => array(field_ident, quote!(write_byte_array), quote!(read_byte_array)),
            "Vec<bool>" => array(field_ident, quote!(write_bool_array), quote!(read_bool_array)),
            "Vec<char>" => array(field_ident, quote!(write_char_array), quote!(read_char_array)),
            "Vec<i16>" => array(field_ident, quote!(write_short_array), quote!(read_short_array)),
            "Vec<i32>" => array(field_ident, quote!(write_int_array), quote!(read_int_array)),
            "Vec<i64>" => array(field_ident, quote!(write_long_array), quote!(read_long_array)),
            "Vec<f32>" => array(field_ident, quote!(write_float_array), quote!(read_float_array)),
            "Vec<f64>" => array(field_ident, quote!(write_double_array), quote!(read_double_array)),
            "Vec<String>" => array(field_ident, quote!(write_string_array), quote!(read_string_array)),
            _ => return Err(unsupported(field, DERIVE)),
        };
        write_stmts.push(quote! {
            let name = #wire_name;
            #write
        });
        // fields missing from an older class version keep their zero value
        read_stmts.push(quote! {
            let name = #wire_name;
            self.#field_ident = if reader.has_field(name) {
                #read
            } else {
                ::core::default::Default::default()
            };
        });
    }

    Ok(quote! {
        impl #impl_generics ::hazelcast_serialization::serialization::Portable
            for #name #ty_generics #where_clause
        {
            fn factory_id(&self) -> i32 {
                #factory_id
            }

            fn class_id(&self) -> i32 {
                #class_id
            }

            fn write_portable(
                &self,
                writer: &mut dyn ::hazelcast_serialization::serialization::PortableWriter,
            ) -> ::hazelcast_serialization::Result<()> {
                #(#write_stmts)*
                Ok(())
            }

            fn read_portable(
                &mut self,
                reader: &mut dyn ::hazelcast_serialization::serialization::PortableReader,
            ) -> ::hazelcast_serialization::Result<()> {
                #(#read_stmts)*
                Ok(())
            }

            #version
        }
    })
}

fn scalar(field: &syn::Ident, write: TokenStream, read: TokenStream) -> (TokenStream, TokenStream) {
    (
        quote! { writer.#write(name, self.#field)?; },
        quote! { reader.#read(name)? },
    )
}

fn array(field: &syn::Ident, write: TokenStream, read: TokenStream) -> (TokenStream, TokenStream) {
    (
        quote! { writer.#write(name, Some(&self.#field[..]))?; },
        quote! { reader.#read(name)?.unwrap_or_default() },
    )
}
