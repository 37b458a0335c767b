//! Derive macro implementation for `IdentifiedDataSerializable`.

use proc_macro2::TokenStream;
use quote::quote;
use syn::DeriveInput;

use crate::attrs::{named_fields, parse_field_attrs, parse_struct_attrs, type_to_string, unsupported};

const DERIVE: &str = "IdentifiedDataSerializable";

pub fn derive_identified_impl(input: DeriveInput) -> syn::Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let attrs = parse_struct_attrs(&input.attrs)?;
    let factory_id = attrs.factory_id.ok_or_else(|| {
        syn::Error::new_spanned(name, "IdentifiedDataSerializable requires #[hazelcast(factory_id = N)]")
    })?;
    let class_id = attrs.class_id.ok_or_else(|| {
        syn::Error::new_spanned(name, "IdentifiedDataSerializable requires #[hazelcast(class_id = N)]")
    })?;

    let mut write_stmts = Vec::new();
    let mut read_stmts = Vec::new();

    for field in named_fields(&input, DERIVE)? {
        let Some(field_ident) = field.ident.as_ref() else {
            continue;
        };
        if parse_field_attrs(field)?.skip {
            read_stmts.push(quote! { self.#field_ident = ::core::default::Default::default(); });
            continue;
        }

        let (write, read) = match type_to_string(&field.ty).as_str() {
            "bool" => (quote! { output.write_bool(self.#field_ident)?; }, quote! { input.read_bool()? }),
            "i8" => (quote! { output.write_byte(self.#field_ident)?; }, quote! { input.read_byte()? }),
            "i16" => (quote! { output.write_short(self.#field_ident)?; }, quote! { input.read_short()? }),
            "i32" => (quote! { output.write_int(self.#field_ident)?; }, quote! { input.read_int()? }),
            "i64" => (quote! { output.write_long(self.#field_ident)?; }, quote! { input.read_long()? }),
            "f32" => (quote! { output.write_float(self.#field_ident)?; }, quote! { input.read_float()? }),
            "f64" => (quote! { output.write_double(self.#field_ident)?; }, quote! { input.read_double()? }),
            "char" => (quote! { output.write_char(self.#field_ident)?; }, quote! { input.read_char()? }),
            "String" => (
                quote! { output.write_string(&self.#field_ident)?; },
                quote! { input.read_string()? },
            ),
            "Option<String>" => (
                quote! { output.write_nullable_string(self.#field_ident.as_deref())?; },
                quote! { input.read_nullable_string()? },
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
        write_stmts.push(write);
        read_stmts.push(quote! { self.#field_ident = #read; });
    }

    Ok(quote! {
        impl #impl_generics ::hazelcast_serialization::serialization::IdentifiedDataSerializable
            for #name #ty_generics #where_clause
        {
            fn factory_id(&self) -> i32 {
                #factory_id
            }

            fn class_id(&self) -> i32 {
                #class_id
            }

            fn write_data(
                &self,
                output: &mut dyn ::hazelcast_serialization::DataOutput,
            ) -> ::hazelcast_serialization::Result<()> {
                #(#write_stmts)*
                Ok(())
            }

            fn read_data(
                &mut self,
                input: &mut dyn ::hazelcast_serialization::DataInput,
            ) -> ::hazelcast_serialization::Result<()> {
                #(#read_stmts)*
                Ok(())
            }
        }
    })
}

/// Arrays are written non-null; a null array reads back empty.
fn array(field: &syn::Ident, write: TokenStream, read: TokenStream) -> (TokenStream, TokenStream) {
    (
        quote! { output.#write(Some(&self.#field[..]))?; },
        quote! { input.#read()?.unwrap_or_default() },
    )
}
