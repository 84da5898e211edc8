//! The server namespace table, mapping namespace URIs to indexes.

use hashbrown::HashMap;

/// The OPC UA core namespace URI, always index 0.
pub const OPC_UA_NAMESPACE: &str = "http://opcfoundation.org/UA/";

/// Map of namespace URI to namespace index.
#[derive(Debug, Clone)]
pub struct NamespaceMap {
    known_namespaces: HashMap<String, u16>,
}

impl Default for NamespaceMap {
    fn default() -> Self {
        Self::new()
    }
}

impl NamespaceMap {
    /// Create a new namespace map containing only the core namespace.
    pub fn new() -> Self {
        let mut known = HashMap::new();
        known.insert(OPC_UA_NAMESPACE.to_owned(), 0u16);
        Self {
            known_namespaces: known,
        }
    }

    /// Add a new namespace, returning its index. If the namespace is
    /// already present its existing index is returned.
    pub fn add_namespace(&mut self, namespace: &str) -> u16 {
        if let Some(idx) = self.known_namespaces.get(namespace) {
            return *idx;
        }
        let max = self
            .known_namespaces
            .values()
            .max()
            .copied()
            .unwrap_or_default();
        self.known_namespaces.insert(namespace.to_owned(), max + 1);
        max + 1
    }

    /// Get the inner map of URI to index.
    pub fn known_namespaces(&self) -> &HashMap<String, u16> {
        &self.known_namespaces
    }

    /// Look up the index of the given namespace URI.
    pub fn get_index(&self, namespace: &str) -> Option<u16> {
        self.known_namespaces.get(namespace).copied()
    }

    /// Resolve a namespace index back to its URI.
    pub fn get_namespace(&self, index: u16) -> Option<&str> {
        self.known_namespaces
            .iter()
            .find(|(_, idx)| **idx == index)
            .map(|(uri, _)| uri.as_str())
    }

    /// The namespace table in index order, as served by the
    /// server NamespaceArray variable.
    pub fn namespace_array(&self) -> Vec<String> {
        let mut entries: Vec<_> = self.known_namespaces.iter().collect();
        entries.sort_by_key(|(_, idx)| **idx);
        entries.into_iter().map(|(uri, _)| uri.clone()).collect()
    }
}
