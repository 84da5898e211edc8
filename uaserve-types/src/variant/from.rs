//! Conversions into [`Variant`] from the built-in types, and the
//! [`TryFromVariant`] trait for going the other way.

use crate::{
    array::Array,
    byte_string::ByteString,
    data_value::DataValue,
    date_time::DateTime,
    diagnostic_info::DiagnosticInfo,
    expanded_node_id::ExpandedNodeId,
    extension_object::ExtensionObject,
    guid::Guid,
    localized_text::LocalizedText,
    node_id::NodeId,
    qualified_name::QualifiedName,
    status_code::StatusCode,
    string::UAString,
};

use super::{Variant, VariantScalarTypeId, VariantType};

macro_rules! impl_from_for {
    ($tp:ty, $variant:ident) => {
        impl From<$tp> for Variant {
            fn from(value: $tp) -> Self {
                Variant::$variant(value)
            }
        }
    };
}

macro_rules! impl_from_boxed_for {
    ($tp:ty, $variant:ident) => {
        impl From<$tp> for Variant {
            fn from(value: $tp) -> Self {
                Variant::$variant(Box::new(value))
            }
        }
    };
}

impl_from_for!(bool, Boolean);
impl_from_for!(i8, SByte);
impl_from_for!(u8, Byte);
impl_from_for!(i16, Int16);
impl_from_for!(u16, UInt16);
impl_from_for!(i32, Int32);
impl_from_for!(u32, UInt32);
impl_from_for!(i64, Int64);
impl_from_for!(u64, UInt64);
impl_from_for!(f32, Float);
impl_from_for!(f64, Double);
impl_from_for!(UAString, String);
impl_from_for!(StatusCode, StatusCode);
impl_from_for!(ByteString, ByteString);
impl_from_for!(ExtensionObject, ExtensionObject);

impl_from_boxed_for!(DateTime, DateTime);
impl_from_boxed_for!(Guid, Guid);
impl_from_boxed_for!(QualifiedName, QualifiedName);
impl_from_boxed_for!(LocalizedText, LocalizedText);
impl_from_boxed_for!(NodeId, NodeId);
impl_from_boxed_for!(ExpandedNodeId, ExpandedNodeId);
impl_from_boxed_for!(DataValue, DataValue);
impl_from_boxed_for!(DiagnosticInfo, DiagnosticInfo);

impl From<&str> for Variant {
    fn from(value: &str) -> Self {
        Variant::String(UAString::from(value))
    }
}

impl From<String> for Variant {
    fn from(value: String) -> Self {
        Variant::String(UAString::from(value))
    }
}

impl From<Array> for Variant {
    fn from(value: Array) -> Self {
        Variant::Array(Box::new(value))
    }
}

impl<T> From<Vec<T>> for Variant
where
    T: Into<Variant> + VariantType,
{
    fn from(values: Vec<T>) -> Self {
        let value_type = T::variant_type_id();
        let values: Vec<Variant> = values.into_iter().map(|v| v.into()).collect();
        // Cannot fail: every element carries the advertised type.
        Variant::Array(Box::new(
            Array::new(value_type, values).expect("array content must match its element type"),
        ))
    }
}

impl From<&NodeId> for Variant {
    fn from(value: &NodeId) -> Self {
        Variant::NodeId(Box::new(value.clone()))
    }
}

/// Trait for extracting a typed value out of a variant.
pub trait TryFromVariant: Sized {
    /// Try to convert the variant to this type, failing with
    /// `BadTypeMismatch` if it holds something else.
    fn try_from_variant(variant: Variant) -> Result<Self, StatusCode>;
}

macro_rules! impl_try_from_variant {
    ($tp:ty, $variant:ident) => {
        impl TryFromVariant for $tp {
            fn try_from_variant(variant: Variant) -> Result<Self, StatusCode> {
                match variant {
                    Variant::$variant(v) => Ok(v),
                    _ => Err(StatusCode::BadTypeMismatch),
                }
            }
        }
    };
}

macro_rules! impl_try_from_variant_boxed {
    ($tp:ty, $variant:ident) => {
        impl TryFromVariant for $tp {
            fn try_from_variant(variant: Variant) -> Result<Self, StatusCode> {
                match variant {
                    Variant::$variant(v) => Ok(*v),
                    _ => Err(StatusCode::BadTypeMismatch),
                }
            }
        }
    };
}

impl_try_from_variant!(bool, Boolean);
impl_try_from_variant!(i8, SByte);
impl_try_from_variant!(u8, Byte);
impl_try_from_variant!(i16, Int16);
impl_try_from_variant!(u16, UInt16);
impl_try_from_variant!(i32, Int32);
impl_try_from_variant!(u32, UInt32);
impl_try_from_variant!(i64, Int64);
impl_try_from_variant!(u64, UInt64);
impl_try_from_variant!(f32, Float);
impl_try_from_variant!(f64, Double);
impl_try_from_variant!(UAString, String);
impl_try_from_variant!(StatusCode, StatusCode);
impl_try_from_variant!(ByteString, ByteString);
impl_try_from_variant_boxed!(DateTime, DateTime);
impl_try_from_variant_boxed!(Guid, Guid);
impl_try_from_variant_boxed!(QualifiedName, QualifiedName);
impl_try_from_variant_boxed!(LocalizedText, LocalizedText);
impl_try_from_variant_boxed!(NodeId, NodeId);
impl_try_from_variant_boxed!(ExpandedNodeId, ExpandedNodeId);

impl TryFromVariant for String {
    fn try_from_variant(variant: Variant) -> Result<Self, StatusCode> {
        match variant {
            Variant::String(v) => Ok(v.as_ref().to_owned()),
            _ => Err(StatusCode::BadTypeMismatch),
        }
    }
}

impl<T> TryFromVariant for Vec<T>
where
    T: TryFromVariant + VariantType,
{
    fn try_from_variant(variant: Variant) -> Result<Self, StatusCode> {
        let Variant::Array(array) = variant else {
            return Err(StatusCode::BadTypeMismatch);
        };
        if array.value_type != T::variant_type_id() {
            return Err(StatusCode::BadTypeMismatch);
        }
        array
            .values
            .into_iter()
            .map(T::try_from_variant)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{TryFromVariant, Variant};
    use crate::VariantScalarTypeId;

    #[test]
    fn typed_array_conversion() {
        let v = Variant::from(vec![1i32, 2, 3]);
        let Variant::Array(ref a) = v else {
            panic!("expected array");
        };
        assert_eq!(a.value_type, VariantScalarTypeId::Int32);
        let back: Vec<i32> = Vec::try_from_variant(v).unwrap();
        assert_eq!(back, vec![1, 2, 3]);
    }
}
