//! The [`Variant`] type, a tagged value holding any built-in OPC UA type,
//! scalar or array.

mod from;
mod into;
mod type_id;

pub use from::TryFromVariant;
pub use into::IntoVariant;
pub use type_id::*;

use std::{
    fmt,
    io::{Read, Write},
};

use crate::{
    array::Array,
    byte_string::ByteString,
    data_value::DataValue,
    date_time::DateTime,
    diagnostic_info::DiagnosticInfo,
    encoding::{BinaryDecodable, BinaryEncodable, EncodingResult, Error},
    expanded_node_id::ExpandedNodeId,
    extension_object::ExtensionObject,
    guid::Guid,
    localized_text::LocalizedText,
    node_id::NodeId,
    node_ids::DataTypeId,
    numeric_range::NumericRange,
    qualified_name::QualifiedName,
    status_code::StatusCode,
    string::UAString,
    write_i32, write_u8,
};

/// A `Variant` holds built-in OPC UA data types, including single and multi
/// dimensional arrays.
///
/// Variants are passed around a lot on the stack, so larger payloads are
/// boxed to keep the size of the type down.
#[derive(PartialEq, Debug, Clone, Default)]
pub enum Variant {
    /// Empty type has no value. Equivalent to a null value.
    #[default]
    Empty,
    /// Boolean
    Boolean(bool),
    /// Signed byte
    SByte(i8),
    /// Unsigned byte
    Byte(u8),
    /// Signed 16-bit int
    Int16(i16),
    /// Unsigned 16-bit int
    UInt16(u16),
    /// Signed 32-bit int
    Int32(i32),
    /// Unsigned 32-bit int
    UInt32(u32),
    /// Signed 64-bit int
    Int64(i64),
    /// Unsigned 64-bit int
    UInt64(u64),
    /// Float
    Float(f32),
    /// Double
    Double(f64),
    /// String
    String(UAString),
    /// DateTime
    DateTime(Box<DateTime>),
    /// Guid
    Guid(Box<Guid>),
    /// StatusCode
    StatusCode(StatusCode),
    /// ByteString
    ByteString(ByteString),
    /// XmlElement
    XmlElement(UAString),
    /// QualifiedName
    QualifiedName(Box<QualifiedName>),
    /// LocalizedText
    LocalizedText(Box<LocalizedText>),
    /// NodeId
    NodeId(Box<NodeId>),
    /// ExpandedNodeId
    ExpandedNodeId(Box<ExpandedNodeId>),
    /// ExtensionObject
    ExtensionObject(ExtensionObject),
    /// Nested variant
    Variant(Box<Variant>),
    /// DataValue
    DataValue(Box<DataValue>),
    /// DiagnosticInfo
    DiagnosticInfo(Box<DiagnosticInfo>),
    /// Single or multi dimension array of a single scalar type.
    Array(Box<Array>),
}

/// Trait for types representable by a variant. The type id returned _must_
/// be the type id of the variant produced by the corresponding `From` impl.
pub trait VariantType {
    /// The scalar type this type is represented as.
    fn variant_type_id() -> VariantScalarTypeId;
}

macro_rules! impl_variant_type_for {
    ($tp: ty, $vt: expr) => {
        impl VariantType for $tp {
            fn variant_type_id() -> VariantScalarTypeId {
                $vt
            }
        }
    };
}
impl_variant_type_for!(bool, VariantScalarTypeId::Boolean);
impl_variant_type_for!(i8, VariantScalarTypeId::SByte);
impl_variant_type_for!(u8, VariantScalarTypeId::Byte);
impl_variant_type_for!(i16, VariantScalarTypeId::Int16);
impl_variant_type_for!(u16, VariantScalarTypeId::UInt16);
impl_variant_type_for!(i32, VariantScalarTypeId::Int32);
impl_variant_type_for!(u32, VariantScalarTypeId::UInt32);
impl_variant_type_for!(i64, VariantScalarTypeId::Int64);
impl_variant_type_for!(u64, VariantScalarTypeId::UInt64);
impl_variant_type_for!(f32, VariantScalarTypeId::Float);
impl_variant_type_for!(f64, VariantScalarTypeId::Double);
impl_variant_type_for!(UAString, VariantScalarTypeId::String);
impl_variant_type_for!(String, VariantScalarTypeId::String);
impl_variant_type_for!(&str, VariantScalarTypeId::String);
impl_variant_type_for!(DateTime, VariantScalarTypeId::DateTime);
impl_variant_type_for!(Guid, VariantScalarTypeId::Guid);
impl_variant_type_for!(StatusCode, VariantScalarTypeId::StatusCode);
impl_variant_type_for!(ByteString, VariantScalarTypeId::ByteString);
impl_variant_type_for!(QualifiedName, VariantScalarTypeId::QualifiedName);
impl_variant_type_for!(LocalizedText, VariantScalarTypeId::LocalizedText);
impl_variant_type_for!(NodeId, VariantScalarTypeId::NodeId);
impl_variant_type_for!(ExpandedNodeId, VariantScalarTypeId::ExpandedNodeId);
impl_variant_type_for!(ExtensionObject, VariantScalarTypeId::ExtensionObject);
impl_variant_type_for!(Variant, VariantScalarTypeId::Variant);
impl_variant_type_for!(DataValue, VariantScalarTypeId::DataValue);
impl_variant_type_for!(DiagnosticInfo, VariantScalarTypeId::DiagnosticInfo);

macro_rules! match_value {
    ($slf:expr, $v:ident => $action:expr, $array:ident => $array_action:expr, $empty:expr) => {
        match $slf {
            Variant::Empty => $empty,
            Variant::Boolean($v) => $action,
            Variant::SByte($v) => $action,
            Variant::Byte($v) => $action,
            Variant::Int16($v) => $action,
            Variant::UInt16($v) => $action,
            Variant::Int32($v) => $action,
            Variant::UInt32($v) => $action,
            Variant::Int64($v) => $action,
            Variant::UInt64($v) => $action,
            Variant::Float($v) => $action,
            Variant::Double($v) => $action,
            Variant::String($v) => $action,
            Variant::DateTime($v) => $action,
            Variant::Guid($v) => $action,
            Variant::StatusCode($v) => $action,
            Variant::ByteString($v) => $action,
            Variant::XmlElement($v) => $action,
            Variant::QualifiedName($v) => $action,
            Variant::LocalizedText($v) => $action,
            Variant::NodeId($v) => $action,
            Variant::ExpandedNodeId($v) => $action,
            Variant::ExtensionObject($v) => $action,
            Variant::Variant($v) => $action,
            Variant::DataValue($v) => $action,
            Variant::DiagnosticInfo($v) => $action,
            Variant::Array($array) => $array_action,
        }
    };
}

impl Variant {
    /// The byte length of the _contents_ of this variant, excluding the
    /// encoding mask byte.
    pub fn value_byte_len(&self, ctx: &crate::Context<'_>) -> usize {
        match_value!(
            self,
            v => v.byte_len(ctx),
            array => {
                let mut size = 4;
                size += array
                    .values
                    .iter()
                    .map(|v| v.value_byte_len(ctx))
                    .sum::<usize>();
                if let Some(ref dimensions) = array.dimensions {
                    size += 4 + dimensions.len() * 4;
                }
                size
            },
            0
        )
    }

    /// Encode just the value of this variant, not the encoding mask.
    pub fn encode_value<S: Write + ?Sized>(
        &self,
        stream: &mut S,
        ctx: &crate::Context<'_>,
    ) -> EncodingResult<()> {
        match_value!(
            self,
            v => v.encode(stream, ctx),
            array => {
                write_i32(stream, array.values.len() as i32)?;
                for value in array.values.iter() {
                    // Nested arrays are rejected on construction, so every
                    // element writes as a plain scalar here.
                    value.encode_value(stream, ctx)?;
                }
                if let Some(ref dimensions) = array.dimensions {
                    // Dimensions are encoded as Int32 even though they are
                    // presented as UInt32 through the attribute.
                    write_i32(stream, dimensions.len() as i32)?;
                    for dimension in dimensions {
                        write_i32(stream, *dimension as i32)?;
                    }
                }
                Ok(())
            },
            Ok(())
        )
    }

    /// The encoding mask byte for this variant.
    pub fn encoding_mask(&self) -> u8 {
        self.type_id().encoding_mask()
    }

    /// The type of this variant, without the payload.
    pub fn type_id(&self) -> VariantTypeId<'_> {
        match self {
            Variant::Empty => VariantTypeId::Empty,
            Variant::Boolean(_) => VariantScalarTypeId::Boolean.into(),
            Variant::SByte(_) => VariantScalarTypeId::SByte.into(),
            Variant::Byte(_) => VariantScalarTypeId::Byte.into(),
            Variant::Int16(_) => VariantScalarTypeId::Int16.into(),
            Variant::UInt16(_) => VariantScalarTypeId::UInt16.into(),
            Variant::Int32(_) => VariantScalarTypeId::Int32.into(),
            Variant::UInt32(_) => VariantScalarTypeId::UInt32.into(),
            Variant::Int64(_) => VariantScalarTypeId::Int64.into(),
            Variant::UInt64(_) => VariantScalarTypeId::UInt64.into(),
            Variant::Float(_) => VariantScalarTypeId::Float.into(),
            Variant::Double(_) => VariantScalarTypeId::Double.into(),
            Variant::String(_) => VariantScalarTypeId::String.into(),
            Variant::DateTime(_) => VariantScalarTypeId::DateTime.into(),
            Variant::Guid(_) => VariantScalarTypeId::Guid.into(),
            Variant::StatusCode(_) => VariantScalarTypeId::StatusCode.into(),
            Variant::ByteString(_) => VariantScalarTypeId::ByteString.into(),
            Variant::XmlElement(_) => VariantScalarTypeId::XmlElement.into(),
            Variant::QualifiedName(_) => VariantScalarTypeId::QualifiedName.into(),
            Variant::LocalizedText(_) => VariantScalarTypeId::LocalizedText.into(),
            Variant::NodeId(_) => VariantScalarTypeId::NodeId.into(),
            Variant::ExpandedNodeId(_) => VariantScalarTypeId::ExpandedNodeId.into(),
            Variant::ExtensionObject(_) => VariantScalarTypeId::ExtensionObject.into(),
            Variant::Variant(_) => VariantScalarTypeId::Variant.into(),
            Variant::DataValue(_) => VariantScalarTypeId::DataValue.into(),
            Variant::DiagnosticInfo(_) => VariantScalarTypeId::DiagnosticInfo.into(),
            Variant::Array(a) => {
                VariantTypeId::Array(a.value_type, a.dimensions.as_deref())
            }
        }
    }

    /// The scalar element type: the type itself for a scalar, the element
    /// type for an array, `None` when empty.
    pub fn scalar_type_id(&self) -> Option<VariantScalarTypeId> {
        match self.type_id() {
            VariantTypeId::Empty => None,
            VariantTypeId::Scalar(s) => Some(s),
            VariantTypeId::Array(s, _) => Some(s),
        }
    }

    /// The data type node id of the variant content, `None` when empty.
    pub fn data_type(&self) -> Option<DataTypeId> {
        self.scalar_type_id().map(|s| s.data_type_id())
    }

    /// `true` if the variant holds no value.
    pub fn is_empty(&self) -> bool {
        matches!(self, Variant::Empty)
    }

    /// `true` if the variant holds an array.
    pub fn is_array(&self) -> bool {
        matches!(self, Variant::Array(_))
    }

    /// Apply an index range to this variant, returning the selected
    /// sub-array. `BadIndexRangeInvalid` if the value is not an array,
    /// `BadIndexRangeNoData` if the range selects nothing.
    pub fn range_of(&self, range: &NumericRange) -> Result<Variant, StatusCode> {
        if range.is_none() {
            return Ok(self.clone());
        }
        let Variant::Array(array) = self else {
            return Err(StatusCode::BadIndexRangeInvalid);
        };
        let Some((min, max)) = range.as_min_max() else {
            return Ok(self.clone());
        };
        if min >= array.values.len() {
            return Err(StatusCode::BadIndexRangeNoData);
        }
        let max = max.min(array.values.len() - 1);
        let values = array.values[min..=max].to_vec();
        Array::new(array.value_type, values)
            .map(Variant::from)
            .map_err(|_| StatusCode::BadIndexRangeNoData)
    }

    /// Write `value` over the sub-range `range` of this variant in place.
    /// The replacement must have the same element type.
    pub fn set_range_of(
        &mut self,
        range: &NumericRange,
        value: &Variant,
    ) -> Result<(), StatusCode> {
        let Variant::Array(array) = self else {
            return Err(StatusCode::BadIndexRangeInvalid);
        };
        let Variant::Array(subset) = value else {
            return Err(StatusCode::BadTypeMismatch);
        };
        if subset.value_type != array.value_type {
            return Err(StatusCode::BadTypeMismatch);
        }
        let Some((min, max)) = range.as_min_max() else {
            return Err(StatusCode::BadIndexRangeInvalid);
        };
        if min >= array.values.len() || max >= array.values.len() {
            return Err(StatusCode::BadIndexRangeNoData);
        }
        if max - min + 1 != subset.values.len() {
            return Err(StatusCode::BadIndexRangeInvalid);
        }
        array.values[min..=max].clone_from_slice(&subset.values);
        Ok(())
    }

    /// Reads just the variant value, without the encoding mask, from the
    /// stream.
    fn decode_variant_value<S: Read + ?Sized>(
        stream: &mut S,
        encoding_mask: u8,
        ctx: &crate::Context<'_>,
    ) -> EncodingResult<Self> {
        let Some(type_id) = (encoding_mask != 0)
            .then(|| VariantScalarTypeId::from_encoding_mask(encoding_mask))
            .flatten()
        else {
            return if encoding_mask == 0 {
                Ok(Variant::Empty)
            } else {
                Err(Error::decoding(format!(
                    "Unrecognized variant encoding mask: {encoding_mask}"
                )))
            };
        };
        Ok(match type_id {
            VariantScalarTypeId::Boolean => Self::from(bool::decode(stream, ctx)?),
            VariantScalarTypeId::SByte => Self::from(i8::decode(stream, ctx)?),
            VariantScalarTypeId::Byte => Self::from(u8::decode(stream, ctx)?),
            VariantScalarTypeId::Int16 => Self::from(i16::decode(stream, ctx)?),
            VariantScalarTypeId::UInt16 => Self::from(u16::decode(stream, ctx)?),
            VariantScalarTypeId::Int32 => Self::from(i32::decode(stream, ctx)?),
            VariantScalarTypeId::UInt32 => Self::from(u32::decode(stream, ctx)?),
            VariantScalarTypeId::Int64 => Self::from(i64::decode(stream, ctx)?),
            VariantScalarTypeId::UInt64 => Self::from(u64::decode(stream, ctx)?),
            VariantScalarTypeId::Float => Self::from(f32::decode(stream, ctx)?),
            VariantScalarTypeId::Double => Self::from(f64::decode(stream, ctx)?),
            VariantScalarTypeId::String => Self::from(UAString::decode(stream, ctx)?),
            VariantScalarTypeId::DateTime => Self::from(DateTime::decode(stream, ctx)?),
            VariantScalarTypeId::Guid => Self::from(Guid::decode(stream, ctx)?),
            VariantScalarTypeId::StatusCode => Self::from(StatusCode::decode(stream, ctx)?),
            VariantScalarTypeId::ByteString => Self::from(ByteString::decode(stream, ctx)?),
            // Force the variant kind, XmlElement is typedefed to UAString
            VariantScalarTypeId::XmlElement => {
                Variant::XmlElement(UAString::decode(stream, ctx)?)
            }
            VariantScalarTypeId::QualifiedName => Self::from(QualifiedName::decode(stream, ctx)?),
            VariantScalarTypeId::LocalizedText => Self::from(LocalizedText::decode(stream, ctx)?),
            VariantScalarTypeId::NodeId => Self::from(NodeId::decode(stream, ctx)?),
            VariantScalarTypeId::ExpandedNodeId => {
                Self::from(ExpandedNodeId::decode(stream, ctx)?)
            }
            // Extension objects and nested variants are depth checked to
            // prevent unbounded recursion from malicious data.
            VariantScalarTypeId::ExtensionObject => {
                let _depth_lock = ctx.options().depth_lock()?;
                Self::from(ExtensionObject::decode(stream, ctx)?)
            }
            VariantScalarTypeId::Variant => {
                let _depth_lock = ctx.options().depth_lock()?;
                Variant::Variant(Box::new(Variant::decode(stream, ctx)?))
            }
            VariantScalarTypeId::DataValue => Self::from(DataValue::decode(stream, ctx)?),
            VariantScalarTypeId::DiagnosticInfo => {
                let _depth_lock = ctx.options().depth_lock()?;
                Self::from(DiagnosticInfo::decode(stream, ctx)?)
            }
        })
    }
}

impl BinaryEncodable for Variant {
    fn byte_len(&self, ctx: &crate::Context<'_>) -> usize {
        // Encoding mask + value
        1 + self.value_byte_len(ctx)
    }

    fn encode<S: Write + ?Sized>(
        &self,
        stream: &mut S,
        ctx: &crate::Context<'_>,
    ) -> EncodingResult<()> {
        write_u8(stream, self.encoding_mask())?;
        self.encode_value(stream, ctx)
    }
}

impl BinaryDecodable for Variant {
    fn decode<S: Read + ?Sized>(stream: &mut S, ctx: &crate::Context<'_>) -> EncodingResult<Self> {
        let encoding_mask = u8::decode(stream, ctx)?;
        let element_encoding_mask = encoding_mask & !EncodingMask::ARRAY_MASK;

        if encoding_mask & EncodingMask::ARRAY_VALUES_BIT == 0 {
            if encoding_mask & EncodingMask::ARRAY_DIMENSIONS_BIT != 0 {
                return Err(Error::decoding(
                    "Array dimensions bit specified without any values",
                ));
            }
            // A single scalar value
            return Variant::decode_variant_value(stream, element_encoding_mask, ctx);
        }

        // Arrays are constructed through Array::new / Array::new_multi so
        // that inconsistent content from the network fails cleanly.
        let value_type = VariantScalarTypeId::from_encoding_mask(element_encoding_mask)
            .ok_or_else(|| {
                Error::decoding(format!(
                    "Unrecognized variant encoding mask: {element_encoding_mask}"
                ))
            })?;

        let array_length = i32::decode(stream, ctx)?;
        if array_length < -1 {
            return Err(Error::decoding(format!(
                "Invalid array length {array_length}"
            )));
        }
        if array_length <= 0 {
            // Null or empty array of the type
            return Array::new(value_type, Vec::new())
                .map(Variant::from)
                .map_err(Error::decoding);
        }

        let array_length = array_length as usize;
        if array_length > ctx.options().max_array_length {
            return Err(Error::new(
                StatusCode::BadEncodingLimitsExceeded,
                format!(
                    "Variant array has length {} which exceeds the limit {}",
                    array_length,
                    ctx.options().max_array_length
                ),
            ));
        }

        let mut values: Vec<Variant> = Vec::with_capacity(array_length);
        for _ in 0..array_length {
            values.push(Variant::decode_variant_value(
                stream,
                element_encoding_mask,
                ctx,
            )?);
        }

        if encoding_mask & EncodingMask::ARRAY_DIMENSIONS_BIT != 0 {
            let Some(dimensions) = <Option<Vec<u32>>>::decode(stream, ctx)? else {
                return Err(Error::decoding(
                    "No array dimensions despite the bit flag being set",
                ));
            };
            if dimensions.iter().any(|d| *d == 0) {
                return Err(Error::decoding(
                    "Invalid variant array dimensions, one or more dimensions are 0",
                ));
            }
            // Checked multiply so malicious dimensions cannot overflow
            let mut total = 1u32;
            for d in &dimensions {
                total = total
                    .checked_mul(*d)
                    .ok_or_else(|| Error::decoding("Array dimension overflow"))?;
            }
            if total as usize != array_length {
                return Err(Error::decoding(format!(
                    "Array dimensions do not match array length {array_length}"
                )));
            }
            Array::new_multi(value_type, values, dimensions)
                .map(Variant::from)
                .map_err(Error::decoding)
        } else {
            Array::new(value_type, values)
                .map(Variant::from)
                .map_err(Error::decoding)
        }
    }
}

/// A friendlier rendering than the Debug trait for common scalar types.
impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Variant::SByte(v) => write!(f, "{}", v),
            Variant::Byte(v) => write!(f, "{}", v),
            Variant::Int16(v) => write!(f, "{}", v),
            Variant::UInt16(v) => write!(f, "{}", v),
            Variant::Int32(v) => write!(f, "{}", v),
            Variant::UInt32(v) => write!(f, "{}", v),
            Variant::Int64(v) => write!(f, "{}", v),
            Variant::UInt64(v) => write!(f, "{}", v),
            Variant::Float(v) => write!(f, "{}", v),
            Variant::Double(v) => write!(f, "{}", v),
            Variant::Boolean(v) => write!(f, "{}", v),
            Variant::String(ref v) => write!(f, "{}", v),
            Variant::Guid(ref v) => write!(f, "{}", v),
            Variant::DateTime(ref v) => write!(f, "{}", v),
            Variant::NodeId(ref v) => write!(f, "{}", v),
            Variant::ExpandedNodeId(ref v) => write!(f, "{}", v),
            Variant::Variant(ref v) => write!(f, "Variant({})", v),
            value => write!(f, "{:?}", value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Variant, VariantScalarTypeId};
    use crate::{
        array::Array,
        context::ContextOwned,
        encoding::{BinaryDecodable, BinaryEncodable},
        numeric_range::NumericRange,
        LocalizedText, NodeId, QualifiedName, StatusCode, UAString,
    };

    fn round_trip(v: &Variant) {
        let ctx_owned = ContextOwned::new_default();
        let ctx = ctx_owned.context();
        let buf = v.encode_to_vec(&ctx);
        assert_eq!(buf.len(), v.byte_len(&ctx), "byte_len mismatch for {v:?}");
        let mut stream = buf.as_slice();
        assert_eq!(&Variant::decode(&mut stream, &ctx).unwrap(), v);
    }

    #[test]
    fn scalar_round_trips() {
        round_trip(&Variant::Empty);
        round_trip(&Variant::Boolean(true));
        round_trip(&Variant::SByte(-9));
        round_trip(&Variant::Byte(200));
        round_trip(&Variant::Int16(-12345));
        round_trip(&Variant::UInt16(54321));
        round_trip(&Variant::Int32(123456));
        round_trip(&Variant::UInt32(654321));
        round_trip(&Variant::Int64(-1234567890));
        round_trip(&Variant::UInt64(9876543210));
        round_trip(&Variant::Float(123.5));
        round_trip(&Variant::Double(-0.25));
        round_trip(&Variant::from("hello"));
        round_trip(&Variant::from(crate::DateTime::now()));
        round_trip(&Variant::from(crate::Guid::new()));
        round_trip(&Variant::StatusCode(StatusCode::BadTypeMismatch));
        round_trip(&Variant::from(crate::ByteString::from(vec![1u8, 2, 3])));
        round_trip(&Variant::from(QualifiedName::new(1, "qn")));
        round_trip(&Variant::from(LocalizedText::new("en", "text")));
        round_trip(&Variant::from(NodeId::new(1, "n")));
        round_trip(&Variant::XmlElement(UAString::from("<a/>")));
    }

    #[test]
    fn array_round_trips() {
        round_trip(&Variant::from(vec![1i32, 2, 3]));
        round_trip(&Variant::from(vec!["a".to_owned(), "b".to_owned()]));
        let matrix = Array::new_multi(
            VariantScalarTypeId::Int32,
            vec![1i32.into(), 2i32.into(), 3i32.into(), 4i32.into()],
            vec![2u32, 2],
        )
        .unwrap();
        round_trip(&Variant::from(matrix));
    }

    #[test]
    fn invalid_array_dimensions_rejected() {
        assert!(Array::new_multi(
            VariantScalarTypeId::Int32,
            vec![1i32.into(), 2i32.into(), 3i32.into()],
            vec![2u32, 2]
        )
        .is_err());
    }

    #[test]
    fn range_of() {
        let v = Variant::from(vec![10i32, 11, 12, 13, 14]);
        let sub = v.range_of(&NumericRange::Range(1, 3)).unwrap();
        assert_eq!(sub, Variant::from(vec![11i32, 12, 13]));
        assert_eq!(
            v.range_of(&NumericRange::Index(17)).unwrap_err(),
            StatusCode::BadIndexRangeNoData
        );
        assert_eq!(
            Variant::Int32(5).range_of(&NumericRange::Index(0)).unwrap_err(),
            StatusCode::BadIndexRangeInvalid
        );
    }

    #[test]
    fn set_range_of() {
        let mut v = Variant::from(vec![10i32, 11, 12, 13, 14]);
        v.set_range_of(&NumericRange::Range(1, 2), &Variant::from(vec![21i32, 22]))
            .unwrap();
        assert_eq!(v, Variant::from(vec![10i32, 21, 22, 13, 14]));
    }
}
