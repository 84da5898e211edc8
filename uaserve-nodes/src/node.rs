use uaserve_types::{
    AttributeId, DataEncoding, DataValue, LocalizedText, NodeClass, NodeId, NumericRange,
    QualifiedName, StatusCode, TimestampsToReturn, Variant, WriteMask,
};

use super::{DataType, Method, Object, ObjectType, ReferenceType, Variable, VariableType, View};

/// The `NodeType` enum, one variant per node class.
#[derive(Debug, Clone)]
pub enum NodeType {
    /// General structural nodes without special meaning.
    Object(Box<Object>),
    /// Object types define properties of object nodes.
    ObjectType(Box<ObjectType>),
    /// Reference types define properties of references.
    ReferenceType(Box<ReferenceType>),
    /// Variables hold a current value.
    Variable(Box<Variable>),
    /// Variable types define properties of variable nodes.
    VariableType(Box<VariableType>),
    /// Views are predefined subsets of the address space.
    View(Box<View>),
    /// Data types define the types used by variables.
    DataType(Box<DataType>),
    /// Methods can be called with the Call service.
    Method(Box<Method>),
}

/// Trait for anything with a node id.
pub trait HasNodeId {
    /// The node id of this item.
    fn node_id(&self) -> &NodeId;
}

impl HasNodeId for NodeType {
    fn node_id(&self) -> &NodeId {
        self.as_node().node_id()
    }
}

macro_rules! node_type_from {
    ($tp:ident) => {
        impl From<$tp> for NodeType {
            fn from(value: $tp) -> Self {
                NodeType::$tp(Box::new(value))
            }
        }
    };
}

node_type_from!(Object);
node_type_from!(ObjectType);
node_type_from!(ReferenceType);
node_type_from!(Variable);
node_type_from!(VariableType);
node_type_from!(View);
node_type_from!(DataType);
node_type_from!(Method);

impl NodeType {
    /// A reference to this as dyn [`Node`].
    pub fn as_node<'a>(&'a self) -> &'a (dyn Node + 'a) {
        match self {
            NodeType::Object(value) => value.as_ref(),
            NodeType::ObjectType(value) => value.as_ref(),
            NodeType::ReferenceType(value) => value.as_ref(),
            NodeType::Variable(value) => value.as_ref(),
            NodeType::VariableType(value) => value.as_ref(),
            NodeType::View(value) => value.as_ref(),
            NodeType::DataType(value) => value.as_ref(),
            NodeType::Method(value) => value.as_ref(),
        }
    }

    /// A mutable reference to this as dyn [`Node`].
    pub fn as_mut_node(&mut self) -> &mut dyn Node {
        match self {
            NodeType::Object(ref mut value) => value.as_mut(),
            NodeType::ObjectType(ref mut value) => value.as_mut(),
            NodeType::ReferenceType(ref mut value) => value.as_mut(),
            NodeType::Variable(ref mut value) => value.as_mut(),
            NodeType::VariableType(ref mut value) => value.as_mut(),
            NodeType::View(ref mut value) => value.as_mut(),
            NodeType::DataType(ref mut value) => value.as_mut(),
            NodeType::Method(ref mut value) => value.as_mut(),
        }
    }

    /// The variable inside this node, if it is one.
    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            NodeType::Variable(value) => Some(value),
            _ => None,
        }
    }

    /// The [`NodeClass`] of this node.
    pub fn node_class(&self) -> NodeClass {
        match self {
            NodeType::Object(_) => NodeClass::Object,
            NodeType::ObjectType(_) => NodeClass::ObjectType,
            NodeType::ReferenceType(_) => NodeClass::ReferenceType,
            NodeType::Variable(_) => NodeClass::Variable,
            NodeType::VariableType(_) => NodeClass::VariableType,
            NodeType::View(_) => NodeClass::View,
            NodeType::DataType(_) => NodeClass::DataType,
            NodeType::Method(_) => NodeClass::Method,
        }
    }
}

/// The attributes every node class shares. Getters that return an `Option`
/// do so because the attribute is optional.
pub trait NodeBase {
    /// The node class.
    fn node_class(&self) -> NodeClass;

    /// The node id.
    fn node_id(&self) -> &NodeId;

    /// The browse name.
    fn browse_name(&self) -> &QualifiedName;

    /// The display name.
    fn display_name(&self) -> &LocalizedText;

    /// Set the display name.
    fn set_display_name(&mut self, display_name: LocalizedText);

    /// The description of this node.
    fn description(&self) -> Option<&LocalizedText>;

    /// Set the description of this node.
    fn set_description(&mut self, description: LocalizedText);

    /// The write mask of this node.
    fn write_mask(&self) -> Option<WriteMask>;

    /// Set the write mask of this node.
    fn set_write_mask(&mut self, write_mask: WriteMask);

    /// The user write mask of this node.
    fn user_write_mask(&self) -> Option<WriteMask>;

    /// Set the user write mask of this node.
    fn set_user_write_mask(&mut self, user_write_mask: WriteMask);
}

/// Attribute access, dispatched on the node class.
pub trait Node: NodeBase {
    /// Read one attribute of the node as a data value. `None` when the
    /// attribute is not supported by the node class or not set.
    fn get_attribute(
        &self,
        timestamps_to_return: TimestampsToReturn,
        attribute_id: AttributeId,
        index_range: &NumericRange,
        data_encoding: &DataEncoding,
    ) -> Option<DataValue>;

    /// Write one attribute of the node. Type checks against the attribute,
    /// but not against the variable data type, which the caller handles.
    fn set_attribute(&mut self, attribute_id: AttributeId, value: Variant)
        -> Result<(), StatusCode>;
}
