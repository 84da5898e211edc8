use uaserve_types::{
    AttributeId, DataEncoding, DataValue, LocalizedText, NodeClass, NodeId, NumericRange,
    QualifiedName, StatusCode, TimestampsToReturn, Variant, WriteMask,
};

use super::node::{Node, NodeBase};

/// The attributes every node class has. Part 3, diagram B.4.
#[derive(Debug, Clone)]
pub struct Base {
    /// The node id of this node.
    pub(crate) node_id: NodeId,
    /// The node class of this node.
    pub(crate) node_class: NodeClass,
    /// The node's browse name, unique among its siblings.
    pub(crate) browse_name: QualifiedName,
    /// The human readable display name.
    pub(crate) display_name: LocalizedText,
    /// The description of the node (optional).
    pub(crate) description: Option<LocalizedText>,
    /// Write mask bits (optional).
    pub(crate) write_mask: Option<u32>,
    /// User write mask bits (optional).
    pub(crate) user_write_mask: Option<u32>,
}

impl Default for Base {
    fn default() -> Self {
        Base {
            node_id: NodeId::null(),
            node_class: NodeClass::Unspecified,
            browse_name: QualifiedName::null(),
            display_name: LocalizedText::null(),
            description: None,
            write_mask: None,
            user_write_mask: None,
        }
    }
}

impl NodeBase for Base {
    fn node_class(&self) -> NodeClass {
        self.node_class
    }

    fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    fn browse_name(&self) -> &QualifiedName {
        &self.browse_name
    }

    fn display_name(&self) -> &LocalizedText {
        &self.display_name
    }

    fn set_display_name(&mut self, display_name: LocalizedText) {
        self.display_name = display_name;
    }

    fn description(&self) -> Option<&LocalizedText> {
        self.description.as_ref()
    }

    fn set_description(&mut self, description: LocalizedText) {
        self.description = Some(description)
    }

    fn write_mask(&self) -> Option<WriteMask> {
        self.write_mask.map(WriteMask::from_bits_truncate)
    }

    fn set_write_mask(&mut self, write_mask: WriteMask) {
        self.write_mask = Some(write_mask.bits());
    }

    fn user_write_mask(&self) -> Option<WriteMask> {
        self.user_write_mask.map(WriteMask::from_bits_truncate)
    }

    fn set_user_write_mask(&mut self, user_write_mask: WriteMask) {
        self.user_write_mask = Some(user_write_mask.bits());
    }
}

impl Node for Base {
    fn get_attribute(
        &self,
        _timestamps_to_return: TimestampsToReturn,
        attribute_id: AttributeId,
        _index_range: &NumericRange,
        _data_encoding: &DataEncoding,
    ) -> Option<DataValue> {
        match attribute_id {
            AttributeId::NodeClass => Some((self.node_class as i32).into()),
            AttributeId::NodeId => Some(self.node_id.clone().into()),
            AttributeId::BrowseName => Some(self.browse_name.clone().into()),
            AttributeId::DisplayName => Some(self.display_name.clone().into()),
            AttributeId::Description => self
                .description
                .clone()
                .map(|description| description.into()),
            AttributeId::WriteMask => self.write_mask.map(|v| v.into()),
            AttributeId::UserWriteMask => self.user_write_mask.map(|v| v.into()),
            _ => None,
        }
    }

    /// Sets the attribute if it is one of the common attributes, otherwise
    /// returns `BadAttributeIdInvalid` for the subclass to handle.
    fn set_attribute(
        &mut self,
        attribute_id: AttributeId,
        value: Variant,
    ) -> Result<(), StatusCode> {
        match attribute_id {
            AttributeId::BrowseName => {
                if let Variant::QualifiedName(v) = value {
                    self.browse_name = *v;
                    Ok(())
                } else {
                    Err(StatusCode::BadTypeMismatch)
                }
            }
            AttributeId::DisplayName => {
                if let Variant::LocalizedText(v) = value {
                    self.display_name = *v;
                    Ok(())
                } else {
                    Err(StatusCode::BadTypeMismatch)
                }
            }
            AttributeId::Description => {
                if let Variant::LocalizedText(v) = value {
                    self.description = Some(*v);
                    Ok(())
                } else {
                    Err(StatusCode::BadTypeMismatch)
                }
            }
            AttributeId::WriteMask => {
                if let Variant::UInt32(v) = value {
                    self.write_mask = Some(v);
                    Ok(())
                } else {
                    Err(StatusCode::BadTypeMismatch)
                }
            }
            AttributeId::UserWriteMask => {
                if let Variant::UInt32(v) = value {
                    self.user_write_mask = Some(v);
                    Ok(())
                } else {
                    Err(StatusCode::BadTypeMismatch)
                }
            }
            _ => Err(StatusCode::BadAttributeIdInvalid),
        }
    }
}

impl Base {
    /// Create a new base node.
    pub fn new(
        node_class: NodeClass,
        node_id: &NodeId,
        browse_name: impl Into<QualifiedName>,
        display_name: impl Into<LocalizedText>,
    ) -> Base {
        Base {
            node_id: node_id.clone(),
            node_class,
            browse_name: browse_name.into(),
            display_name: display_name.into(),
            description: None,
            write_mask: None,
            user_write_mask: None,
        }
    }

    /// `true` if the node has a node id and a browse name.
    pub fn is_valid(&self) -> bool {
        !self.node_id.is_null() && !self.browse_name.is_null()
    }

    /// Set the node id of this node.
    pub fn set_node_id(&mut self, node_id: NodeId) {
        self.node_id = node_id;
    }

    /// Set the node class of this node.
    pub fn set_node_class(&mut self, node_class: NodeClass) {
        self.node_class = node_class;
    }

    /// Set the browse name of this node.
    pub fn set_browse_name(&mut self, browse_name: impl Into<QualifiedName>) {
        self.browse_name = browse_name.into();
    }
}
