//! Encoding context, carrying decoding limits and the namespace table.

use crate::{encoding::DecodingOptions, namespaces::NamespaceMap};

/// Context used during encoding and decoding.
///
/// A borrowed view of a [`ContextOwned`], cheap to construct per message.
#[derive(Debug)]
pub struct Context<'a> {
    namespaces: &'a NamespaceMap,
    options: &'a DecodingOptions,
}

impl<'a> Context<'a> {
    /// Get the decoding options.
    pub fn options(&self) -> &DecodingOptions {
        self.options
    }

    /// Get the namespace map.
    pub fn namespaces(&self) -> &'a NamespaceMap {
        self.namespaces
    }
}

/// Owned encoding context, typically stored on the secure channel and
/// borrowed for each message that passes through it.
#[derive(Debug, Default, Clone)]
pub struct ContextOwned {
    namespaces: NamespaceMap,
    options: DecodingOptions,
}

impl ContextOwned {
    /// Create a new owned context.
    pub fn new(namespaces: NamespaceMap, options: DecodingOptions) -> Self {
        Self {
            namespaces,
            options,
        }
    }

    /// Create a context with default decoding limits and an empty
    /// namespace table. Mostly useful in tests.
    pub fn new_default() -> Self {
        Self::default()
    }

    /// Borrow a [`Context`] from this.
    pub fn context(&self) -> Context<'_> {
        Context {
            namespaces: &self.namespaces,
            options: &self.options,
        }
    }

    /// Get the decoding options.
    pub fn options(&self) -> &DecodingOptions {
        &self.options
    }

    /// Get the decoding options mutably.
    pub fn options_mut(&mut self) -> &mut DecodingOptions {
        &mut self.options
    }

    /// Get the namespace map.
    pub fn namespaces(&self) -> &NamespaceMap {
        &self.namespaces
    }

    /// Get the namespace map mutably.
    pub fn namespaces_mut(&mut self) -> &mut NamespaceMap {
        &mut self.namespaces
    }
}
