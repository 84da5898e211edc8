//! The service handlers: attribute, view, node management, method and
//! discovery service sets. Session, channel and subscription services live
//! with their owning managers.

pub mod attributes;
pub mod discovery;
pub mod method;
pub mod node_management;
pub mod view;
