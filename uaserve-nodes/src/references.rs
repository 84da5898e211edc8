//! The reference store. Forward references are held per source node with a
//! mirrored inverse set per target node, and both sides are always updated
//! together.

use hashbrown::{Equivalent, HashMap, HashSet};
use uaserve_types::{BrowseDirection, NodeId};

use crate::{ReferenceDirection, TypeTree};

/// An owned reference edge.
#[derive(PartialEq, Eq, Clone, Debug, Hash)]
pub struct Reference {
    /// Reference type id.
    pub reference_type: NodeId,
    /// Target node id.
    pub target_node: NodeId,
}

// Must hash and compare identically to Reference.
#[derive(PartialEq, Eq, Clone, Debug, Hash)]
struct ReferenceKey<'a> {
    pub reference_type: &'a NodeId,
    pub target_node: &'a NodeId,
}

impl Equivalent<Reference> for ReferenceKey<'_> {
    fn equivalent(&self, key: &Reference) -> bool {
        &key.reference_type == self.reference_type && &key.target_node == self.target_node
    }
}

/// A borrowed reference edge with its direction, as yielded by lookups.
#[derive(PartialEq, Eq, Clone, Debug, Hash)]
pub struct ReferenceRef<'a> {
    /// Reference type id.
    pub reference_type: &'a NodeId,
    /// Target node id.
    pub target_node: &'a NodeId,
    /// Direction of the reference relative to the queried node.
    pub direction: ReferenceDirection,
}

// hashbrown rather than std lets us remove references keyed by borrowed
// node ids without cloning them.
#[derive(Debug, Default)]
/// Store of all references of an address space.
pub struct References {
    /// References by source node id.
    by_source: HashMap<NodeId, HashSet<Reference>>,
    /// The same references mirrored by target node id.
    by_target: HashMap<NodeId, HashSet<Reference>>,
}

impl References {
    /// Create an empty reference store.
    pub fn new() -> Self {
        Self {
            by_source: HashMap::new(),
            by_target: HashMap::new(),
        }
    }

    /// Insert a list of references relative to `source`.
    pub fn insert<'a, S>(
        &mut self,
        source: &NodeId,
        references: &'a [(&'a NodeId, &S, ReferenceDirection)],
    ) where
        S: Into<NodeId> + Clone,
    {
        for (target, typ, direction) in references {
            let typ: NodeId = (*typ).clone().into();
            match direction {
                ReferenceDirection::Forward => self.insert_reference(source, target, typ),
                ReferenceDirection::Inverse => self.insert_reference(target, source, typ),
            }
        }
    }

    /// Insert a single reference. The inverse side is recorded atomically
    /// with the forward side.
    pub fn insert_reference(
        &mut self,
        source_node: &NodeId,
        target_node: &NodeId,
        reference_type: impl Into<NodeId>,
    ) {
        if source_node == target_node {
            panic!(
                "Node id from == node id to {}, self reference is not allowed",
                source_node
            );
        }

        let forward_refs = match self.by_source.get_mut(source_node) {
            Some(r) => r,
            None => self.by_source.entry(source_node.clone()).or_default(),
        };

        let reference_type = reference_type.into();

        if !forward_refs.insert(Reference {
            reference_type: reference_type.clone(),
            target_node: target_node.clone(),
        }) {
            // Already present, so the inverse is present as well.
            return;
        }

        let inverse_refs = match self.by_target.get_mut(target_node) {
            Some(r) => r,
            None => self.by_target.entry(target_node.clone()).or_default(),
        };

        inverse_refs.insert(Reference {
            reference_type,
            target_node: source_node.clone(),
        });
    }

    /// Insert a list of references as (source, target, type) triples.
    pub fn insert_references<'a>(
        &mut self,
        references: impl Iterator<Item = (&'a NodeId, &'a NodeId, impl Into<NodeId>)>,
    ) {
        for (source, target, typ) in references {
            self.insert_reference(source, target, typ);
        }
    }

    /// Delete a reference and its mirrored inverse.
    ///
    /// Returns whether the reference was found.
    pub fn delete_reference(
        &mut self,
        source_node: &NodeId,
        target_node: &NodeId,
        reference_type: impl Into<NodeId>,
    ) -> bool {
        let mut found = false;
        let reference_type = reference_type.into();
        let rf = ReferenceKey {
            reference_type: &reference_type,
            target_node,
        };
        found |= self
            .by_source
            .get_mut(source_node)
            .map(|f| f.remove(&rf))
            .unwrap_or_default();

        let rf = ReferenceKey {
            reference_type: &reference_type,
            target_node: source_node,
        };

        found |= self
            .by_target
            .get_mut(target_node)
            .map(|f| f.remove(&rf))
            .unwrap_or_default();

        found
    }

    /// Delete all references of `source_node`, optionally also the
    /// references other nodes have towards it.
    ///
    /// Returns whether any references were found.
    pub fn delete_node_references(
        &mut self,
        source_node: &NodeId,
        delete_target_references: bool,
    ) -> bool {
        let mut found = false;
        let source = self.by_source.remove(source_node);
        found |= source.is_some();
        if delete_target_references {
            for rf in source.into_iter().flatten() {
                if let Some(rec) = self.by_target.get_mut(&rf.target_node) {
                    rec.remove(&ReferenceKey {
                        reference_type: &rf.reference_type,
                        target_node: source_node,
                    });
                }
            }
        }

        let target = self.by_target.remove(source_node);
        found |= target.is_some();

        if delete_target_references {
            for rf in target.into_iter().flatten() {
                if let Some(rec) = self.by_source.get_mut(&rf.target_node) {
                    rec.remove(&ReferenceKey {
                        reference_type: &rf.reference_type,
                        target_node: source_node,
                    });
                }
            }
        }

        found
    }

    /// `true` if the given forward reference exists.
    pub fn has_reference(
        &self,
        source_node: &NodeId,
        target_node: &NodeId,
        reference_type: impl Into<NodeId>,
    ) -> bool {
        let reference_type = reference_type.into();
        self.by_source
            .get(source_node)
            .map(|n| {
                n.contains(&ReferenceKey {
                    reference_type: &reference_type,
                    target_node,
                })
            })
            .unwrap_or_default()
    }

    /// Iterate over the references of `source_node` matching the filters.
    /// A filter of `(type, true)` also matches subtypes of `type`.
    pub fn find_references<'a: 'b, 'b>(
        &'a self,
        source_node: &'b NodeId,
        filter: Option<(impl Into<NodeId>, bool)>,
        type_tree: &'b dyn TypeTree,
        direction: BrowseDirection,
    ) -> impl Iterator<Item = ReferenceRef<'a>> + 'b {
        ReferenceIterator::new(
            source_node,
            direction,
            self,
            filter.map(|f| (f.0.into(), f.1)),
            type_tree,
        )
    }
}

// Concrete iterator type so find_references can return impl Iterator.
struct ReferenceIterator<'a, 'b> {
    filter: Option<(NodeId, bool)>,
    type_tree: &'b dyn TypeTree,
    iter_s: Option<hashbrown::hash_set::Iter<'a, Reference>>,
    iter_t: Option<hashbrown::hash_set::Iter<'a, Reference>>,
}

impl<'a> Iterator for ReferenceIterator<'a, '_> {
    type Item = ReferenceRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let inner = self.next_inner()?;

            if let Some(filter) = &self.filter {
                if !filter.1 && inner.reference_type != &filter.0
                    || filter.1
                        && !self
                            .type_tree
                            .is_subtype_of(inner.reference_type, &filter.0)
                {
                    continue;
                }
            }

            break Some(inner);
        }
    }
}

impl<'a, 'b> ReferenceIterator<'a, 'b> {
    pub fn new(
        source_node: &'b NodeId,
        direction: BrowseDirection,
        references: &'a References,
        filter: Option<(NodeId, bool)>,
        type_tree: &'b dyn TypeTree,
    ) -> Self {
        Self {
            filter,
            type_tree,
            iter_s: matches!(direction, BrowseDirection::Both | BrowseDirection::Forward)
                .then(|| references.by_source.get(source_node))
                .flatten()
                .map(|r| r.iter()),
            iter_t: matches!(direction, BrowseDirection::Both | BrowseDirection::Inverse)
                .then(|| references.by_target.get(source_node))
                .flatten()
                .map(|r| r.iter()),
        }
    }

    fn next_inner(&mut self) -> Option<ReferenceRef<'a>> {
        if let Some(iter_s) = &mut self.iter_s {
            match iter_s.next() {
                Some(r) => {
                    return Some(ReferenceRef {
                        reference_type: &r.reference_type,
                        target_node: &r.target_node,
                        direction: ReferenceDirection::Forward,
                    })
                }
                None => self.iter_s = None,
            }
        }

        if let Some(iter_t) = &mut self.iter_t {
            match iter_t.next() {
                Some(r) => {
                    return Some(ReferenceRef {
                        reference_type: &r.reference_type,
                        target_node: &r.target_node,
                        direction: ReferenceDirection::Inverse,
                    })
                }
                None => self.iter_t = None,
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::References;
    use crate::{DefaultTypeTree, ReferenceDirection};
    use uaserve_types::{BrowseDirection, NodeId, ReferenceTypeId};

    fn ids() -> (NodeId, NodeId) {
        (NodeId::new(1, "a"), NodeId::new(1, "b"))
    }

    #[test]
    fn insert_creates_both_sides() {
        let (a, b) = ids();
        let mut refs = References::new();
        refs.insert_reference(&a, &b, ReferenceTypeId::Organizes);

        let tree = DefaultTypeTree::new();
        let forward: Vec<_> = refs
            .find_references(
                &a,
                None::<(NodeId, bool)>,
                &tree,
                BrowseDirection::Forward,
            )
            .collect();
        assert_eq!(forward.len(), 1);
        assert_eq!(forward[0].target_node, &b);
        assert_eq!(forward[0].direction, ReferenceDirection::Forward);

        let inverse: Vec<_> = refs
            .find_references(
                &b,
                None::<(NodeId, bool)>,
                &tree,
                BrowseDirection::Inverse,
            )
            .collect();
        assert_eq!(inverse.len(), 1);
        assert_eq!(inverse[0].target_node, &a);
        assert_eq!(inverse[0].direction, ReferenceDirection::Inverse);
    }

    #[test]
    fn delete_removes_both_sides() {
        let (a, b) = ids();
        let mut refs = References::new();
        refs.insert_reference(&a, &b, ReferenceTypeId::Organizes);
        assert!(refs.delete_reference(&a, &b, ReferenceTypeId::Organizes));

        let tree = DefaultTypeTree::new();
        assert_eq!(
            refs.find_references(&b, None::<(NodeId, bool)>, &tree, BrowseDirection::Both)
                .count(),
            0
        );
        assert_eq!(
            refs.find_references(&a, None::<(NodeId, bool)>, &tree, BrowseDirection::Both)
                .count(),
            0
        );
    }

    #[test]
    fn delete_node_references_cleans_other_nodes() {
        let (a, b) = ids();
        let c = NodeId::new(1, "c");
        let mut refs = References::new();
        refs.insert_reference(&a, &b, ReferenceTypeId::Organizes);
        refs.insert_reference(&c, &a, ReferenceTypeId::HasComponent);

        assert!(refs.delete_node_references(&a, true));

        let tree = DefaultTypeTree::new();
        assert_eq!(
            refs.find_references(&b, None::<(NodeId, bool)>, &tree, BrowseDirection::Both)
                .count(),
            0
        );
        assert_eq!(
            refs.find_references(&c, None::<(NodeId, bool)>, &tree, BrowseDirection::Both)
                .count(),
            0
        );
    }
}
