#![warn(missing_docs)]

//! Node representations for the server address space: one type per node
//! class sharing a common [`Base`], the reference store, and the type tree
//! used for subtype queries.

use bitflags::bitflags;

mod base;
mod data_type;
mod method;
mod node;
mod object;
mod object_type;
mod reference_type;
mod references;
mod type_tree;
mod variable;
mod variable_type;
mod view;

pub use base::Base;
pub use data_type::{DataType, DataTypeBuilder};
pub use method::{Method, MethodBuilder, MethodCallback};
pub use node::{HasNodeId, Node, NodeBase, NodeType};
pub use object::{Object, ObjectBuilder};
pub use object_type::{ObjectType, ObjectTypeBuilder};
pub use reference_type::{ReferenceType, ReferenceTypeBuilder};
pub use references::{Reference, ReferenceRef, References};
pub use type_tree::{DefaultTypeTree, TypeTree};
pub use variable::{
    DataSource, Variable, VariableBuilder, VariableValue, VALUE_RANK_ANY, VALUE_RANK_ONE_DIMENSION,
    VALUE_RANK_ONE_OR_MORE_DIMENSIONS, VALUE_RANK_SCALAR, VALUE_RANK_SCALAR_OR_ONE_DIMENSION,
};
pub use variable_type::{VariableType, VariableTypeBuilder};
pub use view::{View, ViewBuilder};

use uaserve_types::NodeId;

/// Direction of a reference relative to its source node.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ReferenceDirection {
    /// Reference from the source node to the target.
    Forward,
    /// Reference from the target node to the source.
    Inverse,
}

bitflags! {
    /// The access level of a variable, part 3 8.57.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct AccessLevel: u8 {
        /// The current value is readable.
        const CURRENT_READ = 1;
        /// The current value is writable.
        const CURRENT_WRITE = 2;
        /// The history is readable.
        const HISTORY_READ = 4;
        /// The history is writable.
        const HISTORY_WRITE = 8;
    }
}

bitflags! {
    /// The event notifier of an object or view, part 3 8.59.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct EventNotifier: u8 {
        /// Events of the node can be subscribed to.
        const SUBSCRIBE_TO_EVENTS = 1;
        /// The event history is readable.
        const HISTORY_READ = 4;
        /// The event history is writable.
        const HISTORY_WRITE = 8;
    }
}

/// Something a node plus its references can be inserted into. Implemented
/// by the address space in the server crate.
pub trait NodeInsertTarget {
    /// Insert a node with a list of references. Returns `false` if a node
    /// with the same id already exists.
    fn insert<'a, T: Into<NodeType>>(
        &mut self,
        node: T,
        references: Option<&'a [(&'a NodeId, &NodeId, ReferenceDirection)]>,
    ) -> bool;
}

// A builder for each node class. Builders are a convenient way to create a
// node and the references tying it into the address space in one go.
macro_rules! node_builder_impl {
    ( $node_builder_ty:ident, $node_ty:ident ) => {
        use log::trace;
        use uaserve_types::{
            LocalizedText as BuilderLocalizedText, NodeId as BuilderNodeId,
            QualifiedName as BuilderQualifiedName, ReferenceTypeId,
        };
        use $crate::{NodeInsertTarget, ReferenceDirection};

        /// A builder for constructing a node of the same name, along with
        /// the references tying it into the address space.
        pub struct $node_builder_ty {
            node: $node_ty,
            references: Vec<(BuilderNodeId, BuilderNodeId, ReferenceDirection)>,
        }

        impl $node_builder_ty {
            /// Create a builder for a node with the mandatory attributes.
            pub fn new<T, S>(node_id: &BuilderNodeId, browse_name: T, display_name: S) -> Self
            where
                T: Into<BuilderQualifiedName>,
                S: Into<BuilderLocalizedText>,
            {
                use $crate::NodeBase;
                trace!("Creating a node using a builder, node id {}", node_id);
                let mut node = $node_ty::default();
                node.base.set_node_id(node_id.clone());
                node.base.set_browse_name(browse_name);
                node.base.set_display_name(display_name.into());
                Self {
                    node,
                    references: Vec::with_capacity(10),
                }
            }

            /// The node id of the node being built.
            pub fn get_node_id(&self) -> &BuilderNodeId {
                use $crate::NodeBase;
                self.node.node_id()
            }

            /// `true` if the builder state would produce a valid node.
            pub fn is_valid(&self) -> bool {
                self.node.is_valid()
            }

            /// Set the description of the node.
            pub fn description<V>(mut self, description: V) -> Self
            where
                V: Into<BuilderLocalizedText>,
            {
                use $crate::NodeBase;
                self.node.set_description(description.into());
                self
            }

            /// Add a reference from or to the node.
            pub fn reference<T>(
                mut self,
                node_id: T,
                reference_type_id: ReferenceTypeId,
                reference_direction: ReferenceDirection,
            ) -> Self
            where
                T: Into<BuilderNodeId>,
            {
                self.references.push((
                    node_id.into(),
                    reference_type_id.into(),
                    reference_direction,
                ));
                self
            }

            /// This node organizes the target node.
            pub fn organizes<T>(self, organizes_id: T) -> Self
            where
                T: Into<BuilderNodeId>,
            {
                self.reference(
                    organizes_id,
                    ReferenceTypeId::Organizes,
                    ReferenceDirection::Forward,
                )
            }

            /// This node is organized by the target node.
            pub fn organized_by<T>(self, organized_by_id: T) -> Self
            where
                T: Into<BuilderNodeId>,
            {
                self.reference(
                    organized_by_id,
                    ReferenceTypeId::Organizes,
                    ReferenceDirection::Inverse,
                )
            }

            /// This node is a component of the target node.
            pub fn component_of<T>(self, component_of_id: T) -> Self
            where
                T: Into<BuilderNodeId>,
            {
                self.reference(
                    component_of_id,
                    ReferenceTypeId::HasComponent,
                    ReferenceDirection::Inverse,
                )
            }

            /// This node is a property of the target node.
            pub fn property_of<T>(self, property_of_id: T) -> Self
            where
                T: Into<BuilderNodeId>,
            {
                self.reference(
                    property_of_id,
                    ReferenceTypeId::HasProperty,
                    ReferenceDirection::Inverse,
                )
            }

            /// Build the node, discarding any references added. Panics if
            /// the node is invalid.
            pub fn build(self) -> $node_ty {
                if self.is_valid() {
                    self.node
                } else {
                    panic!(
                        "The node is not valid, node id = {:?}",
                        self.get_node_id()
                    );
                }
            }

            /// Insert the node and its references into the target address
            /// space. Panics if the node is invalid.
            pub fn insert(self, address_space: &mut impl NodeInsertTarget) -> bool {
                if self.is_valid() {
                    if !self.references.is_empty() {
                        let references = self
                            .references
                            .iter()
                            .map(|v| (&v.0, &v.1, v.2))
                            .collect::<Vec<_>>();
                        address_space.insert(self.node, Some(references.as_slice()))
                    } else {
                        address_space.insert(self.node, None)
                    }
                } else {
                    panic!(
                        "The node is not valid, node id = {:?}",
                        self.get_node_id()
                    );
                }
            }
        }
    };
}

pub(crate) use node_builder_impl;

// NodeBase is identical for every node class: delegate to the base.
macro_rules! node_base_impl {
    ( $node_ty:ident ) => {
        use $crate::node::{NodeBase, NodeType};
        use uaserve_types::{
            LocalizedText, NodeClass, NodeId, QualifiedName, WriteMask,
        };

        impl From<$node_ty> for Box<NodeType> {
            fn from(value: $node_ty) -> Self {
                Box::new(value.into())
            }
        }

        impl $node_ty {
            /// The base attributes shared by every node class.
            pub fn base(&self) -> &$crate::Base {
                &self.base
            }

            /// The base attributes, mutable.
            pub fn base_mut(&mut self) -> &mut $crate::Base {
                &mut self.base
            }
        }

        impl NodeBase for $node_ty {
            fn node_class(&self) -> NodeClass {
                self.base.node_class()
            }

            fn node_id(&self) -> &NodeId {
                self.base.node_id()
            }

            fn browse_name(&self) -> &QualifiedName {
                self.base.browse_name()
            }

            fn display_name(&self) -> &LocalizedText {
                self.base.display_name()
            }

            fn set_display_name(&mut self, display_name: LocalizedText) {
                self.base.set_display_name(display_name);
            }

            fn description(&self) -> Option<&LocalizedText> {
                self.base.description()
            }

            fn set_description(&mut self, description: LocalizedText) {
                self.base.set_description(description);
            }

            fn write_mask(&self) -> Option<WriteMask> {
                self.base.write_mask()
            }

            fn set_write_mask(&mut self, write_mask: WriteMask) {
                self.base.set_write_mask(write_mask);
            }

            fn user_write_mask(&self) -> Option<WriteMask> {
                self.base.user_write_mask()
            }

            fn set_user_write_mask(&mut self, user_write_mask: WriteMask) {
                self.base.set_user_write_mask(user_write_mask);
            }
        }
    };
}

pub(crate) use node_base_impl;

// Builder setters shared by node classes with a subset of attributes.
macro_rules! node_builder_impl_subtype {
    ( $node_builder_ty:ident ) => {
        impl $node_builder_ty {
            /// This type is a subtype of the target type.
            pub fn subtype_of<T>(self, type_id: T) -> Self
            where
                T: Into<BuilderNodeId>,
            {
                self.reference(
                    type_id,
                    ReferenceTypeId::HasSubtype,
                    ReferenceDirection::Inverse,
                )
            }

            /// Set whether the type is abstract.
            pub fn is_abstract(mut self, is_abstract: bool) -> Self {
                self.node.set_is_abstract(is_abstract);
                self
            }
        }
    };
}

pub(crate) use node_builder_impl_subtype;
