use syn::{parse::Parse, Ident, Token};

use crate::utils::ItemAttr;

#[derive(Debug, Default)]
pub(crate) struct EncodingFieldAttribute {
    pub ignore: bool,
    pub optional: bool,
}

impl Parse for EncodingFieldAttribute {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        let mut slf = Self::default();

        loop {
            let ident: Ident = input.parse()?;
            match ident.to_string().as_str() {
                "ignore" => {
                    slf.ignore = true;
                }
                "optional" => {
                    slf.optional = true;
                }
                _ => return Err(syn::Error::new_spanned(ident, "Unknown attribute value")),
            }
            if !input.peek(Token![,]) {
                break;
            }
            input.parse::<Token![,]>()?;
        }
        Ok(slf)
    }
}

impl ItemAttr for EncodingFieldAttribute {
    fn combine(&mut self, other: Self) {
        self.ignore |= other.ignore;
        self.optional |= other.optional;
    }
}

#[derive(Debug, Default)]
pub(crate) struct EncodingVariantAttribute {
    pub default: bool,
}

impl ItemAttr for EncodingVariantAttribute {
    fn combine(&mut self, other: Self) {
        self.default |= other.default;
    }
}

impl Parse for EncodingVariantAttribute {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        let mut slf = Self::default();

        loop {
            let ident: Ident = input.parse()?;
            match ident.to_string().as_str() {
                "default" => {
                    slf.default = true;
                }
                _ => return Err(syn::Error::new_spanned(ident, "Unknown attribute value")),
            }
            if !input.peek(Token![,]) {
                break;
            }
            input.parse::<Token![,]>()?;
        }
        Ok(slf)
    }
}
