//! Derive macro implementation for `HazelcastCompact`.

use proc_macro2::TokenStream;
use quote::quote;
use syn::DeriveInput;

use crate::attrs::{named_fields, parse_field_attrs, parse_struct_attrs, type_to_string, unsupported};

const DERIVE: &str = "HazelcastCompact";

pub fn derive_compact_impl(input: DeriveInput) -> syn::Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let type_name = parse_struct_attrs(&input.attrs)?
        .type_name
        .unwrap_or_else(|| name.to_string());

    let mut write_stmts = Vec::new();
    let mut field_inits = Vec::new();

    for field in named_fields(&input, DERIVE)? {
        let Some(field_ident) = field.ident.as_ref() else {
            continue;
        };
        let field_attrs = parse_field_attrs(field)?;
        if field_attrs.skip {
            field_inits.push(quote! { #field_ident: ::core::default::Default::default() });
            continue;
        }
        let wire_name = field_attrs
            .field_name
            .unwrap_or_else(|| field_ident.to_string());

        let Some((write, read)) = generate_field(field_ident, &type_to_string(&field.ty)) else {
            return Err(unsupported(field, DERIVE));
        };
        write_stmts.push(quote! {
            let name = #wire_name;
            #write
        });
        // fields absent from an older schema read as their zero value
        field_inits.push(quote! {
            #field_ident: {
                let name = #wire_name;
                if reader.has_field(name) {
                    #read
                } else {
                    ::core::default::Default::default()
                }
            }
        });
    }

    Ok(quote! {
        impl #impl_generics ::hazelcast_serialization::serialization::compact::Compact
            for #name #ty_generics #where_clause
        {
            fn type_name() -> &'static str {
                #type_name
            }

            fn write(
                &self,
                writer: &mut dyn ::hazelcast_serialization::serialization::compact::CompactWriter,
            ) -> ::hazelcast_serialization::Result<()> {
                #(#write_stmts)*
                Ok(())
            }

            fn read(
                reader: &mut dyn ::hazelcast_serialization::serialization::compact::CompactReader,
            ) -> ::hazelcast_serialization::Result<Self> {
                Ok(Self {
                    #(#field_inits,)*
                })
            }
        }
    })
}

fn generate_field(field: &syn::Ident, ty: &str) -> Option<(TokenStream, TokenStream)> {
    let by_value = |write: TokenStream, read: TokenStream| {
        (
            quote! { writer.#write(name, self.#field)?; },
            quote! { reader.#read(name)? },
        )
    };
    let by_ref = |write: TokenStream, read: TokenStream| {
        (
            quote! { writer.#write(name, self.#field.as_ref())?; },
            quote! { reader.#read(name)? },
        )
    };
    let array = |write: TokenStream, read: TokenStream| {
        (
            quote! { writer.#write(name, Some(&self.#field[..]))?; },
            quote! { reader.#read(name)?.unwrap_or_default() },
        )
    };

    Some(match ty {
        "bool" => by_value(quote!(write_boolean), quote!(read_boolean)),
        "i8" => by_value(quote!(write_int8), quote!(read_int8)),
        "i16" => by_value(quote!(write_int16), quote!(read_int16)),
        "i32" => by_value(quote!(write_int32), quote!(read_int32)),
        "i64" => by_value(quote!(write_int64), quote!(read_int64)),
        "f32" => by_value(quote!(write_float32), quote!(read_float32)),
        "f64" => by_value(quote!(write_float64), quote!(read_float64)),
        "String" => (
            quote! { writer.write_string(name, Some(self.#field.as_str()))?; },
            quote! { reader.read_string(name)?.unwrap_or_default() },
        ),
        "Option<String>" => (
            quote! { writer.write_string(name, self.#field.as_deref())?; },
            quote! { reader.read_string(name)? },
        ),
        "Option<bool>" => by_value(quote!(write_nullable_boolean), quote!(read_nullable_boolean)),
        "Option<i8>" => by_value(quote!(write_nullable_int8), quote!(read_nullable_int8)),
        "Option<i16>" => by_value(quote!(write_nullable_int16), quote!(read_nullable_int16)),
        "Option<i32>" => by_value(quote!(write_nullable_int32), quote!(read_nullable_int32)),
        "Option<i64>" => by_value(quote!(write_nullable_int64), quote!(read_nullable_int64)),
        "Option<f32>" => by_value(quote!(write_nullable_float32), quote!(read_nullable_float32)),
        "Option<f64>" => by_value(quote!(write_nullable_float64), quote!(read_nullable_float64)),
        "Option<Decimal>" => by_ref(quote!(write_decimal), quote!(read_decimal)),
        "Option<NaiveTime>" => by_ref(quote!(write_time), quote!(read_time)),
        "Option<NaiveDate>" => by_ref(quote!(write_date), quote!(read_date)),
        "Option<NaiveDateTime>" => by_ref(quote!(write_timestamp), quote!(read_timestamp)),
        "Option<DateTime<FixedOffset>>" => by_ref(
            quote!(write_timestamp_with_timezone),
            quote!(read_timestamp_with_timezone),
        ),
        "Vec<bool>" => array(quote!(write_array_of_boolean), quote!(read_array_of_boolean)),
        "Vec<i8>" => array(quote!(write_array_of_int8), quote!(read_array_of_int8)),
        "Vec<i16>" => array(quote!(write_array_of_int16), quote!(read_array_of_int16)),
        "Vec<i32>" => array(quote!(write_array_of_int32), quote!(read_array_of_int32)),
        "Vec<i64>" => array(quote!(write_array_of_int64), quote!(read_array_of_int64)),
        "Vec<f32>" => array(quote!(write_array_of_float32), quote!(read_array_of_float32)),
        "Vec<f64>" => array(quote!(write_array_of_float64), quote!(read_array_of_float64)),
        "Vec<Option<String>>" => array(quote!(write_array_of_string), quote!(read_array_of_string)),
        "Vec<String>" => (
            quote! {
                let items: ::std::vec::Vec<::core::option::Option<::std::string::String>> =
                    self.#field.iter().cloned().map(Some).collect();
                writer.write_array_of_string(name, Some(&items[..]))?;
            },
            quote! {
                reader
                    .read_array_of_string(name)?
                    .unwrap_or_default()
                    .into_iter()
                    .map(::core::option::Option::unwrap_or_default)
                    .collect()
            },
        ),
        _ => return None,
    })
}
