//! The [`VariantTypeId`] type, the type of a variant without its payload.

use std::fmt::Display;

use crate::{
    node_id::{NodeId, NodeIdError},
    node_ids::DataTypeId,
    status_code::StatusCode,
};

/// The type of a variant, without the payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VariantTypeId<'a> {
    /// The variant is empty.
    Empty,
    /// The variant is a scalar with this inner type.
    Scalar(VariantScalarTypeId),
    /// The variant is an array with this inner type and optionally these
    /// array dimensions.
    Array(VariantScalarTypeId, Option<&'a [u32]>),
}

impl From<VariantScalarTypeId> for VariantTypeId<'_> {
    fn from(value: VariantScalarTypeId) -> Self {
        Self::Scalar(value)
    }
}

/// The scalar type of a variant. The discriminants double as the built-in
/// type ids of part 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
#[allow(missing_docs)]
pub enum VariantScalarTypeId {
    Boolean = 1,
    SByte = 2,
    Byte = 3,
    Int16 = 4,
    UInt16 = 5,
    Int32 = 6,
    UInt32 = 7,
    Int64 = 8,
    UInt64 = 9,
    Float = 10,
    Double = 11,
    String = 12,
    DateTime = 13,
    Guid = 14,
    ByteString = 15,
    XmlElement = 16,
    NodeId = 17,
    ExpandedNodeId = 18,
    StatusCode = 19,
    QualifiedName = 20,
    LocalizedText = 21,
    ExtensionObject = 22,
    DataValue = 23,
    Variant = 24,
    DiagnosticInfo = 25,
}

impl Display for VariantScalarTypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl TryFrom<u32> for VariantScalarTypeId {
    type Error = StatusCode;
    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Ok(match value {
            1 => Self::Boolean,
            2 => Self::SByte,
            3 => Self::Byte,
            4 => Self::Int16,
            5 => Self::UInt16,
            6 => Self::Int32,
            7 => Self::UInt32,
            8 => Self::Int64,
            9 => Self::UInt64,
            10 => Self::Float,
            11 => Self::Double,
            12 => Self::String,
            13 => Self::DateTime,
            14 => Self::Guid,
            15 => Self::ByteString,
            16 => Self::XmlElement,
            17 => Self::NodeId,
            18 => Self::ExpandedNodeId,
            19 => Self::StatusCode,
            20 => Self::QualifiedName,
            21 => Self::LocalizedText,
            22 => Self::ExtensionObject,
            23 => Self::DataValue,
            24 => Self::Variant,
            25 => Self::DiagnosticInfo,
            r => {
                log::error!("Got unexpected value for variant scalar type: {r}");
                return Err(StatusCode::BadDecodingError);
            }
        })
    }
}

impl TryFrom<&NodeId> for VariantScalarTypeId {
    type Error = NodeIdError;
    fn try_from(value: &NodeId) -> Result<Self, NodeIdError> {
        let type_id = value.as_data_type_id()?;

        Ok(match type_id {
            DataTypeId::Boolean => Self::Boolean,
            DataTypeId::SByte => Self::SByte,
            DataTypeId::Byte => Self::Byte,
            DataTypeId::Int16 => Self::Int16,
            DataTypeId::UInt16 => Self::UInt16,
            DataTypeId::Int32 => Self::Int32,
            DataTypeId::UInt32 => Self::UInt32,
            DataTypeId::Int64 => Self::Int64,
            DataTypeId::UInt64 => Self::UInt64,
            DataTypeId::Float => Self::Float,
            DataTypeId::Double => Self::Double,
            DataTypeId::String => Self::String,
            DataTypeId::DateTime => Self::DateTime,
            DataTypeId::Guid => Self::Guid,
            DataTypeId::ByteString => Self::ByteString,
            DataTypeId::XmlElement => Self::XmlElement,
            DataTypeId::NodeId => Self::NodeId,
            DataTypeId::ExpandedNodeId => Self::ExpandedNodeId,
            DataTypeId::StatusCode => Self::StatusCode,
            DataTypeId::QualifiedName => Self::QualifiedName,
            DataTypeId::LocalizedText => Self::LocalizedText,
            DataTypeId::DataValue => Self::DataValue,
            DataTypeId::BaseDataType => Self::Variant,
            DataTypeId::DiagnosticInfo => Self::DiagnosticInfo,
            _ => return Err(NodeIdError),
        })
    }
}

impl VariantScalarTypeId {
    /// The data type node id corresponding to this scalar type.
    pub fn data_type_id(&self) -> DataTypeId {
        match self {
            Self::Boolean => DataTypeId::Boolean,
            Self::SByte => DataTypeId::SByte,
            Self::Byte => DataTypeId::Byte,
            Self::Int16 => DataTypeId::Int16,
            Self::UInt16 => DataTypeId::UInt16,
            Self::Int32 => DataTypeId::Int32,
            Self::UInt32 => DataTypeId::UInt32,
            Self::Int64 => DataTypeId::Int64,
            Self::UInt64 => DataTypeId::UInt64,
            Self::Float => DataTypeId::Float,
            Self::Double => DataTypeId::Double,
            Self::String => DataTypeId::String,
            Self::DateTime => DataTypeId::DateTime,
            Self::Guid => DataTypeId::Guid,
            Self::ByteString => DataTypeId::ByteString,
            Self::XmlElement => DataTypeId::XmlElement,
            Self::NodeId => DataTypeId::NodeId,
            Self::ExpandedNodeId => DataTypeId::ExpandedNodeId,
            Self::StatusCode => DataTypeId::StatusCode,
            Self::QualifiedName => DataTypeId::QualifiedName,
            Self::LocalizedText => DataTypeId::LocalizedText,
            Self::ExtensionObject => DataTypeId::Structure,
            Self::DataValue => DataTypeId::DataValue,
            Self::Variant => DataTypeId::BaseDataType,
            Self::DiagnosticInfo => DataTypeId::DiagnosticInfo,
        }
    }

    /// The encoding mask corresponding to this type id.
    pub fn encoding_mask(&self) -> u8 {
        *self as u32 as u8
    }

    /// Try to get a scalar type from an encoding mask.
    pub fn from_encoding_mask(encoding_mask: u8) -> Option<Self> {
        Self::try_from((encoding_mask & !EncodingMask::ARRAY_MASK) as u32).ok()
    }

    /// `true` if this is a numeric type.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::SByte
                | Self::Byte
                | Self::Int16
                | Self::UInt16
                | Self::Int32
                | Self::UInt32
                | Self::Int64
                | Self::UInt64
                | Self::Float
                | Self::Double
        )
    }
}

impl VariantTypeId<'_> {
    /// The encoding mask, including the array bits where applicable.
    pub fn encoding_mask(&self) -> u8 {
        match self {
            VariantTypeId::Empty => 0u8,
            VariantTypeId::Scalar(s) => s.encoding_mask(),
            VariantTypeId::Array(s, dims) => {
                let mask = s.encoding_mask() | EncodingMask::ARRAY_VALUES_BIT;
                if dims.is_some() {
                    mask | EncodingMask::ARRAY_DIMENSIONS_BIT
                } else {
                    mask
                }
            }
        }
    }
}

/// Bit layout of the variant encoding mask byte: the low six bits select the
/// built-in type, the top two flag array values and array dimensions.
pub(crate) struct EncodingMask;

impl EncodingMask {
    pub const ARRAY_DIMENSIONS_BIT: u8 = 1 << 6;
    pub const ARRAY_VALUES_BIT: u8 = 1 << 7;
    pub const ARRAY_MASK: u8 = Self::ARRAY_DIMENSIONS_BIT | Self::ARRAY_VALUES_BIT;
}
