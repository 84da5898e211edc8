//! The `ReferenceType` node class.

use uaserve_types::{
    AttributeId, DataEncoding, DataValue, NumericRange, StatusCode, TimestampsToReturn, Variant,
};

use crate::{node_base_impl, node_builder_impl, node_builder_impl_subtype, Base, Node};

/// A reference type node.
#[derive(Debug, Clone)]
pub struct ReferenceType {
    pub(crate) base: Base,
    symmetric: bool,
    is_abstract: bool,
    inverse_name: Option<LocalizedText>,
}

impl Default for ReferenceType {
    fn default() -> Self {
        ReferenceType {
            base: Base {
                node_class: uaserve_types::NodeClass::ReferenceType,
                ..Default::default()
            },
            symmetric: false,
            is_abstract: false,
            inverse_name: None,
        }
    }
}

node_base_impl!(ReferenceType);

impl Node for ReferenceType {
    fn get_attribute(
        &self,
        timestamps_to_return: TimestampsToReturn,
        attribute_id: AttributeId,
        index_range: &NumericRange,
        data_encoding: &DataEncoding,
    ) -> Option<DataValue> {
        match attribute_id {
            AttributeId::Symmetric => Some(self.symmetric.into()),
            AttributeId::IsAbstract => Some(self.is_abstract.into()),
            AttributeId::InverseName => self.inverse_name.clone().map(|v| v.into()),
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
            AttributeId::Symmetric => {
                if let Variant::Boolean(v) = value {
                    self.symmetric = v;
                    Ok(())
                } else {
                    Err(StatusCode::BadTypeMismatch)
                }
            }
            AttributeId::IsAbstract => {
                if let Variant::Boolean(v) = value {
                    self.is_abstract = v;
                    Ok(())
                } else {
                    Err(StatusCode::BadTypeMismatch)
                }
            }
            AttributeId::InverseName => {
                if let Variant::LocalizedText(v) = value {
                    self.inverse_name = Some(*v);
                    Ok(())
                } else {
                    Err(StatusCode::BadTypeMismatch)
                }
            }
            _ => self.base.set_attribute(attribute_id, value),
        }
    }
}

impl ReferenceType {
    /// Create a reference type node.
    pub fn new(
        node_id: &NodeId,
        browse_name: impl Into<QualifiedName>,
        display_name: impl Into<LocalizedText>,
        symmetric: bool,
        is_abstract: bool,
        inverse_name: Option<LocalizedText>,
    ) -> ReferenceType {
        ReferenceType {
            base: Base::new(NodeClass::ReferenceType, node_id, browse_name, display_name),
            symmetric,
            is_abstract,
            inverse_name,
        }
    }

    /// `true` if the node is valid for insertion.
    pub fn is_valid(&self) -> bool {
        self.base.is_valid()
    }

    /// Whether the reference reads the same in both directions.
    pub fn symmetric(&self) -> bool {
        self.symmetric
    }

    /// Set whether the reference is symmetric.
    pub fn set_symmetric(&mut self, symmetric: bool) {
        self.symmetric = symmetric;
    }

    /// Whether the type is abstract.
    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// Set whether the type is abstract.
    pub fn set_is_abstract(&mut self, is_abstract: bool) {
        self.is_abstract = is_abstract;
    }

    /// The name of the reference followed in inverse direction.
    pub fn inverse_name(&self) -> Option<&LocalizedText> {
        self.inverse_name.as_ref()
    }

    /// Set the inverse name.
    pub fn set_inverse_name(&mut self, inverse_name: LocalizedText) {
        self.inverse_name = Some(inverse_name);
    }
}

node_builder_impl!(ReferenceTypeBuilder, ReferenceType);
node_builder_impl_subtype!(ReferenceTypeBuilder);

impl ReferenceTypeBuilder {
    /// Set whether the reference is symmetric.
    pub fn symmetric(mut self, symmetric: bool) -> Self {
        self.node.set_symmetric(symmetric);
        self
    }

    /// Set the inverse name of the reference.
    pub fn inverse_name(mut self, inverse_name: impl Into<BuilderLocalizedText>) -> Self {
        self.node.set_inverse_name(inverse_name.into());
        self
    }
}
