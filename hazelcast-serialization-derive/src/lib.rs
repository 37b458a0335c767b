//! Derive macros for Hazelcast serialization formats.
//!
//! This crate provides three derive macros:
//!
//! - [`HazelcastCompact`] generates a `Compact` implementation; the schema is
//!   derived from the fields the first time a value is written.
//! - [`HazelcastPortable`] generates a `Portable` implementation for the
//!   versioned, class-definition based format.
//! - [`IdentifiedDataSerializable`] generates an `IdentifiedDataSerializable`
//!   implementation for the factory-based format.
//!
//! # Example
//!
//! ```ignore
//! use hazelcast_serialization_derive::HazelcastCompact;
//!
//! #[derive(HazelcastCompact)]
//! #[hazelcast(type_name = "com.example.Person")]
//! struct Person {
//!     name: String,
//!     age: i32,
//!     #[hazelcast(field_name = "emailAddress")]
//!     email: Option<String>,
//! }
//! ```

extern crate proc_macro;

mod attrs;
mod compact;
mod identified;
mod portable;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Derives the `Compact` trait for a struct.
///
/// # Attributes
///
/// ## Struct-level
/// - `#[hazelcast(type_name = "...")]` sets the compact type name (defaults to
///   the Rust struct name).
///
/// ## Field-level
/// - `#[hazelcast(field_name = "...")]` overrides the wire field name (defaults
///   to the Rust field name).
/// - `#[hazelcast(skip)]` skips this field; it reads back as its default.
///
/// # Supported Field Types
///
/// `bool`, `i8`, `i16`, `i32`, `i64`, `f32`, `f64`, `String`, `Option` of
/// those (nullable kinds), `Option<Decimal>`, `Option<NaiveDate>`,
/// `Option<NaiveTime>`, `Option<NaiveDateTime>`,
/// `Option<DateTime<FixedOffset>>`, and `Vec` of the primitives or strings.
#[proc_macro_derive(HazelcastCompact, attributes(hazelcast))]
pub fn derive_compact(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    compact::derive_compact_impl(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Derives the `Portable` trait for a struct.
///
/// # Attributes
///
/// ## Struct-level
/// - `#[hazelcast(factory_id = N)]`: **required**. The portable factory ID.
/// - `#[hazelcast(class_id = N)]`: **required**. The portable class ID.
/// - `#[hazelcast(version = N)]`: the class version (defaults to the
///   configured portable version).
///
/// ## Field-level
/// - `#[hazelcast(field_name = "...")]` overrides the wire field name.
/// - `#[hazelcast(skip)]` skips this field during serialization.
#[proc_macro_derive(HazelcastPortable, attributes(hazelcast))]
pub fn derive_portable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    portable::derive_portable_impl(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Derives the `IdentifiedDataSerializable` trait for a struct.
///
/// # Attributes
///
/// ## Struct-level
/// - `#[hazelcast(factory_id = N)]`: **required**. The factory ID.
/// - `#[hazelcast(class_id = N)]`: **required**. The class ID.
///
/// ## Field-level
/// - `#[hazelcast(skip)]` skips this field during serialization.
#[proc_macro_derive(IdentifiedDataSerializable, attributes(hazelcast))]
pub fn derive_identified(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    identified::derive_identified_impl(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
