//! The [`IntoVariant`] trait, a by-value conversion used where generic
//! bounds on `Into<Variant>` would be awkward, such as in derive macros.

use super::Variant;

/// Conversion into a [`Variant`].
pub trait IntoVariant {
    /// Convert self into a variant.
    fn into_variant(self) -> Variant;
}

impl<T> IntoVariant for T
where
    T: Into<Variant>,
{
    fn into_variant(self) -> Variant {
        self.into()
    }
}
