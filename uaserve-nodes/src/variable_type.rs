//! The `VariableType` node class.

use uaserve_types::{
    AttributeId, DataEncoding, DataTypeId, DataValue, NumericRange, StatusCode,
    TimestampsToReturn, Variant,
};

use crate::{
    node_base_impl, node_builder_impl, node_builder_impl_subtype, variable::VALUE_RANK_SCALAR,
    Base, Node,
};

/// A variable type node.
#[derive(Debug, Clone)]
pub struct VariableType {
    pub(crate) base: Base,
    value: Option<DataValue>,
    data_type: uaserve_types::NodeId,
    value_rank: i32,
    array_dimensions: Option<Vec<u32>>,
    is_abstract: bool,
}

impl Default for VariableType {
    fn default() -> Self {
        VariableType {
            base: Base {
                node_class: uaserve_types::NodeClass::VariableType,
                ..Default::default()
            },
            value: None,
            data_type: DataTypeId::BaseDataType.into(),
            value_rank: VALUE_RANK_SCALAR,
            array_dimensions: None,
            is_abstract: false,
        }
    }
}

node_base_impl!(VariableType);

impl Node for VariableType {
    fn get_attribute(
        &self,
        timestamps_to_return: TimestampsToReturn,
        attribute_id: AttributeId,
        index_range: &NumericRange,
        data_encoding: &DataEncoding,
    ) -> Option<DataValue> {
        match attribute_id {
            AttributeId::Value => self.value.clone(),
            AttributeId::DataType => Some(self.data_type.clone().into()),
            AttributeId::ValueRank => Some(self.value_rank.into()),
            AttributeId::ArrayDimensions => self
                .array_dimensions
                .clone()
                .map(|dims| Variant::from(dims).into()),
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
            AttributeId::Value => {
                self.value = Some(DataValue::new_now(value));
                Ok(())
            }
            AttributeId::DataType => {
                if let Variant::NodeId(v) = value {
                    self.data_type = *v;
                    Ok(())
                } else {
                    Err(StatusCode::BadTypeMismatch)
                }
            }
            AttributeId::ValueRank => {
                if let Variant::Int32(v) = value {
                    self.value_rank = v;
                    Ok(())
                } else {
                    Err(StatusCode::BadTypeMismatch)
                }
            }
            AttributeId::ArrayDimensions => {
                let dims = <Vec<u32> as uaserve_types::TryFromVariant>::try_from_variant(value)?;
                self.array_dimensions = Some(dims);
                Ok(())
            }
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

impl VariableType {
    /// Create a variable type node.
    pub fn new(
        node_id: &NodeId,
        browse_name: impl Into<QualifiedName>,
        display_name: impl Into<LocalizedText>,
        is_abstract: bool,
    ) -> VariableType {
        VariableType {
            base: Base::new(NodeClass::VariableType, node_id, browse_name, display_name),
            is_abstract,
            ..Default::default()
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

    /// The data type instances will hold.
    pub fn data_type(&self) -> &uaserve_types::NodeId {
        &self.data_type
    }

    /// Set the data type instances will hold.
    pub fn set_data_type(&mut self, data_type: impl Into<uaserve_types::NodeId>) {
        self.data_type = data_type.into();
    }
}

node_builder_impl!(VariableTypeBuilder, VariableType);
node_builder_impl_subtype!(VariableTypeBuilder);

impl VariableTypeBuilder {
    /// Set the data type of instances of this type.
    pub fn data_type(mut self, data_type: impl Into<BuilderNodeId>) -> Self {
        self.node.set_data_type(data_type.into());
        self
    }
}
