//! The `DataType` node class.

use uaserve_types::{
    AttributeId, DataEncoding, DataValue, NumericRange, StatusCode, TimestampsToReturn, Variant,
};

use crate::{node_base_impl, node_builder_impl, node_builder_impl_subtype, Base, Node};

/// A data type node.
#[derive(Debug, Clone)]
pub struct DataType {
    pub(crate) base: Base,
    is_abstract: bool,
}

impl Default for DataType {
    fn default() -> Self {
        DataType {
            base: Base {
                node_class: uaserve_types::NodeClass::DataType,
                ..Default::default()
            },
            is_abstract: false,
        }
    }
}

node_base_impl!(DataType);

impl Node for DataType {
    fn get_attribute(
        &self,
        timestamps_to_return: TimestampsToReturn,
        attribute_id: AttributeId,
        index_range: &NumericRange,
        data_encoding: &DataEncoding,
    ) -> Option<DataValue> {
        match attribute_id {
            AttributeId::IsAbstract => Some(self.is_abstract.into()),
            _ => self.base.get_attribute(
                timestamps_to_return,
                attribute_id,
                index_range,
                data_encoding,
            ),
        }
    }

    fn set_attribute(
        &mut self,
        attribute_id: AttributeId,
        value: Variant,
    ) -> Result<(), StatusCode> {
        match attribute_id {
            AttributeId::IsAbstract => {
                if let Variant::Boolean(v) = value {
                    self.is_abstract = v;
                    Ok(())
                } else {
                    Err(StatusCode::BadTypeMismatch)
                }
            }
            _ => self.base.set_attribute(attribute_id, value),
        }
    }
}

impl DataType {
    /// Create a data type node.
    pub fn new(
        node_id: &NodeId,
        browse_name: impl Into<QualifiedName>,
        display_name: impl Into<LocalizedText>,
        is_abstract: bool,
    ) -> DataType {
        DataType {
            base: Base::new(NodeClass::DataType, node_id, browse_name, display_name),
            is_abstract,
        }
    }

    /// `true` if the node is valid for insertion.
    pub fn is_valid(&self) -> bool {
        self.base.is_valid()
    }

    /// Whether the type is abstract.
    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// Set whether the type is abstract.
    pub fn set_is_abstract(&mut self, is_abstract: bool) {
        self.is_abstract = is_abstract;
    }
}

node_builder_impl!(DataTypeBuilder, DataType);
node_builder_impl_subtype!(DataTypeBuilder);
