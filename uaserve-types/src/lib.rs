#![warn(missing_docs)]

//! Built-in OPC UA types and the UA-Binary codec.
//!
//! This crate contains the built-in data types from part 3 of the OPC UA
//! standard, the binary encoding and decoding machinery from part 6, numeric
//! node id constants for the subset of namespace 0 the server uses, and the
//! request/response structures of the services the server implements.

pub mod argument;
pub mod array;
pub mod attribute;
pub mod basic_types;
pub mod byte_string;
pub mod constants;
pub mod context;
pub mod data_value;
pub mod date_time;
pub mod diagnostic_info;
pub mod encoding;
pub mod expanded_node_id;
pub mod extension_object;
pub mod guid;
pub mod localized_text;
pub mod namespaces;
pub mod node_id;
pub mod node_ids;
pub mod numeric_range;
pub mod qualified_name;
pub mod request_header;
pub mod response_header;
pub mod service_types;
pub mod status_code;
pub mod string;
pub mod variant;
pub mod write_mask;

pub use argument::Argument;
pub use array::{Array, ArrayError};
pub use attribute::AttributeId;
pub use byte_string::ByteString;
pub use context::{Context, ContextOwned};
pub use data_value::DataValue;
pub use date_time::DateTime;
pub use diagnostic_info::DiagnosticInfo;
pub use encoding::{
    process_decode_io_result, process_encode_io_result, read_bytes, read_f32, read_f64, read_i16,
    read_i32, read_i64, read_u16, read_u32, read_u64, read_u8, write_bytes, write_f32, write_f64,
    write_i16, write_i32, write_i64, write_u16, write_u32, write_u64, write_u8, BinaryDecodable,
    BinaryEncodable, DataEncoding, DecodingOptions, DepthGauge, DepthLock, EncodingResult, Error,
    SimpleBinaryDecodable, SimpleBinaryEncodable,
};
pub use expanded_node_id::ExpandedNodeId;
pub use extension_object::ExtensionObject;
pub use guid::Guid;
pub use localized_text::LocalizedText;
pub use namespaces::NamespaceMap;
pub use node_id::{Identifier, NodeId, NodeIdError};
pub use node_ids::{
    DataTypeId, ObjectId, ObjectTypeId, ReferenceTypeId, VariableId, VariableTypeId,
};
pub use numeric_range::NumericRange;
pub use qualified_name::QualifiedName;
pub use request_header::RequestHeader;
pub use response_header::ResponseHeader;
pub use service_types::*;
pub use status_code::StatusCode;
pub use string::{UAString, XmlElement};
pub use variant::{IntoVariant, TryFromVariant, Variant, VariantScalarTypeId, VariantTypeId};
pub use write_mask::WriteMask;

// The codec derive macros emit `uaserve::types::...` paths; within this
// crate that path is provided by the alias below.
pub use uaserve_macros::{ua_encodable, BinaryDecodable, BinaryEncodable, UaEnum};

#[allow(unused)]
mod uaserve {
    pub use crate as types;
}
