use attribute::EncodingFieldAttribute;
use binary::{
    generate_binary_decode_impl, generate_binary_encode_impl,
    generate_simple_enum_binary_decode_impl, generate_simple_enum_binary_encode_impl,
};
use enums::{derive_ua_enum_impl, SimpleEnum};
use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::{DeriveInput, Item};

use crate::utils::StructItem;

mod attribute;
mod binary;
mod enums;

pub(crate) type EncodingStruct = StructItem<EncodingFieldAttribute>;

pub(crate) enum EncodingInput {
    Struct(EncodingStruct),
    SimpleEnum(SimpleEnum),
}

impl EncodingInput {
    pub fn from_derive_input(input: DeriveInput) -> syn::Result<Self> {
        match input.data {
            syn::Data::Struct(data_struct) => Ok(Self::Struct(EncodingStruct::from_input(
                data_struct,
                input.ident,
            )?)),
            syn::Data::Enum(data_enum) => Ok(Self::SimpleEnum(SimpleEnum::from_input(
                data_enum,
                input.attrs,
                input.ident,
            )?)),
            syn::Data::Union(_) => Err(syn::Error::new_spanned(
                input.ident,
                "Unions are not supported",
            )),
        }
    }
}

pub enum EncodingToImpl {
    BinaryEncode,
    BinaryDecode,
    UaEnum,
}

pub fn generate_encoding_impl(
    input: DeriveInput,
    target: EncodingToImpl,
) -> syn::Result<TokenStream> {
    let input = EncodingInput::from_derive_input(input)?;

    match (target, input) {
        (EncodingToImpl::BinaryEncode, EncodingInput::Struct(s)) => generate_binary_encode_impl(s),
        (EncodingToImpl::BinaryEncode, EncodingInput::SimpleEnum(s)) => {
            generate_simple_enum_binary_encode_impl(s)
        }
        (EncodingToImpl::BinaryDecode, EncodingInput::Struct(s)) => generate_binary_decode_impl(s),
        (EncodingToImpl::BinaryDecode, EncodingInput::SimpleEnum(s)) => {
            generate_simple_enum_binary_decode_impl(s)
        }
        (EncodingToImpl::UaEnum, EncodingInput::SimpleEnum(s)) => derive_ua_enum_impl(s),
        (EncodingToImpl::UaEnum, _) => Err(syn::Error::new(
            Span::call_site(),
            "UaEnum derive macro is only supported on simple enums",
        )),
    }
}

/// Expand the `ua_encodable` attribute: re-emit the item with the binary
/// codec derives attached, plus the `UaEnum` conversions for simple enums.
pub fn derive_all_inner(item: Item) -> syn::Result<TokenStream> {
    let is_simple_enum = match &item {
        Item::Enum(_) => true,
        Item::Struct(_) => false,
        _ => {
            return Err(syn::Error::new_spanned(
                item,
                "ua_encodable is only applicable to structs and enums",
            ))
        }
    };

    let enum_derive = if is_simple_enum {
        quote! { #[derive(uaserve::types::UaEnum)] }
    } else {
        quote! {}
    };

    Ok(quote! {
        #[derive(uaserve::types::BinaryEncodable, uaserve::types::BinaryDecodable)]
        #enum_derive
        #item
    })
}
