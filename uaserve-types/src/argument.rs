//! The [`Argument`] type describing one input or output argument of a
//! method.

use crate::{localized_text::LocalizedText, node_id::NodeId, node_ids::ObjectId, string::UAString};

#[allow(unused)]
mod uaserve {
    pub use crate as types;
}

/// Description of one argument of a method, stored in the InputArguments
/// and OutputArguments properties of method nodes.
#[uaserve::types::ua_encodable]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Argument {
    /// The name of the argument.
    pub name: UAString,
    /// The data type of the argument value.
    pub data_type: NodeId,
    /// The value rank: scalar, a specific number of dimensions, or any.
    pub value_rank: i32,
    /// Fixed array dimensions, when the value rank requires them.
    pub array_dimensions: Option<Vec<u32>>,
    /// Human readable description.
    pub description: LocalizedText,
}

impl crate::service_types::MessageInfo for Argument {
    fn type_id(&self) -> ObjectId {
        ObjectId::Argument_Encoding_DefaultBinary
    }
}
