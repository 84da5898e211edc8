#![warn(missing_docs)]

//! Procedural macros for the uaserve OPC UA stack.
//!
//! Everything here generates implementations of the binary codec traits in
//! `uaserve-types`. The macros emit paths of the form `uaserve::types::...`,
//! so any file using them must make that path resolve, typically with
//!
//! ```ignore
//! mod uaserve {
//!     pub use crate as types;
//! }
//! ```
//!
//! inside the types crate itself, or `use uaserve_types as ...` re-exports
//! elsewhere.

mod encoding;
mod utils;

use encoding::{derive_all_inner, generate_encoding_impl, EncodingToImpl};
use proc_macro::TokenStream;
use syn::parse_macro_input;

#[proc_macro_derive(BinaryEncodable, attributes(uaserve))]
/// Derive the `BinaryEncodable` trait on this struct or enum, creating code
/// to write the value to an OPC UA binary stream.
///
/// All fields must be marked with `uaserve(ignore)` or implement
/// `BinaryEncodable`.
pub fn derive_binary_encodable(item: TokenStream) -> TokenStream {
    match generate_encoding_impl(parse_macro_input!(item), EncodingToImpl::BinaryEncode) {
        Ok(r) => r.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

#[proc_macro_derive(BinaryDecodable, attributes(uaserve))]
/// Derive the `BinaryDecodable` trait on this struct or enum, creating code
/// to read the value from an OPC UA binary stream.
///
/// All fields must be marked with `uaserve(ignore)` or implement
/// `BinaryDecodable`.
pub fn derive_binary_decodable(item: TokenStream) -> TokenStream {
    match generate_encoding_impl(parse_macro_input!(item), EncodingToImpl::BinaryDecode) {
        Ok(r) => r.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

#[proc_macro_derive(UaEnum, attributes(uaserve))]
/// Derive conversions for a simple OPC UA enum: `TryFrom<[repr]>`,
/// `From<Self> for [repr]`, `IntoVariant`, and `Default` if a variant is
/// labeled with `#[uaserve(default)]`.
///
/// The enum must have an explicit `repr([int])` attribute and explicit
/// discriminants on every variant.
pub fn derive_ua_enum(item: TokenStream) -> TokenStream {
    match generate_encoding_impl(parse_macro_input!(item), EncodingToImpl::UaEnum) {
        Ok(r) => r.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

#[proc_macro_attribute]
/// Derive all the standard codec traits on this struct or enum:
/// `BinaryEncodable` and `BinaryDecodable`, plus the `UaEnum` conversions
/// if the type is a simple enum. Normal attributes for those still apply.
pub fn ua_encodable(_attr: TokenStream, item: TokenStream) -> TokenStream {
    match derive_all_inner(parse_macro_input!(item)) {
        Ok(r) => r.into(),
        Err(e) => e.to_compile_error().into(),
    }
}
