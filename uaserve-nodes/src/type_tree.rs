//! The type tree, answering subtype queries against the HasSubtype
//! hierarchy.

use hashbrown::HashMap;
use uaserve_types::NodeId;

/// Subtype queries over the type hierarchy. Browse with subtypes and the
/// value type checks of the Write service both go through this.
pub trait TypeTree {
    /// `true` if `child` is `ancestor` or a transitive subtype of it.
    fn is_subtype_of(&self, child: &NodeId, ancestor: &NodeId) -> bool;
}

/// Type tree backed by a parent map maintained alongside the address
/// space. Lookup walks from the child towards the root, which keeps the
/// structure trivially consistent under mutation; the hierarchy is shallow
/// enough that memoization has not been worth its invalidation cost.
#[derive(Debug, Default)]
pub struct DefaultTypeTree {
    /// Maps a type to its supertype through HasSubtype.
    parents: HashMap<NodeId, NodeId>,
}

impl TypeTree for DefaultTypeTree {
    fn is_subtype_of(&self, child: &NodeId, ancestor: &NodeId) -> bool {
        let mut current = child;
        loop {
            if current == ancestor {
                return true;
            }
            match self.parents.get(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }
}

impl DefaultTypeTree {
    /// Create an empty type tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `subtype` as a subtype of `supertype`.
    pub fn add_subtype(&mut self, subtype: NodeId, supertype: NodeId) {
        self.parents.insert(subtype, supertype);
    }

    /// Remove a type from the tree.
    pub fn remove(&mut self, node: &NodeId) {
        self.parents.remove(node);
        // Children of the removed type become roots of their own.
        self.parents.retain(|_, parent| parent != node);
    }

    /// The supertype of `node`, if it has one.
    pub fn parent(&self, node: &NodeId) -> Option<&NodeId> {
        self.parents.get(node)
    }
}

#[cfg(test)]
mod tests {
    use super::{DefaultTypeTree, TypeTree};
    use uaserve_types::{NodeId, ReferenceTypeId};

    #[test]
    fn walks_to_ancestor() {
        let mut tree = DefaultTypeTree::new();
        tree.add_subtype(
            ReferenceTypeId::HasChild.into(),
            ReferenceTypeId::HierarchicalReferences.into(),
        );
        tree.add_subtype(
            ReferenceTypeId::Aggregates.into(),
            ReferenceTypeId::HasChild.into(),
        );
        tree.add_subtype(
            ReferenceTypeId::HasComponent.into(),
            ReferenceTypeId::Aggregates.into(),
        );

        let component: NodeId = ReferenceTypeId::HasComponent.into();
        let hierarchical: NodeId = ReferenceTypeId::HierarchicalReferences.into();
        assert!(tree.is_subtype_of(&component, &hierarchical));
        assert!(tree.is_subtype_of(&component, &component));
        assert!(!tree.is_subtype_of(&hierarchical, &component));

        let organizes: NodeId = ReferenceTypeId::Organizes.into();
        assert!(!tree.is_subtype_of(&organizes, &hierarchical));
    }
}
