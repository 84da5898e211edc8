//! The `Method` node class, including the callable handle supplied by the
//! embedder.

use std::fmt;
use std::sync::Arc;

use uaserve_types::{
    AttributeId, DataEncoding, DataValue, NumericRange, StatusCode, TimestampsToReturn, Variant,
};

use crate::{node_base_impl, node_builder_impl, Base, Node};

/// The callable backing a method node. Receives the object the method was
/// called on and the input arguments, returns the output arguments.
pub type MethodCallback =
    Arc<dyn Fn(&uaserve_types::NodeId, &[Variant]) -> Result<Vec<Variant>, StatusCode> + Send + Sync>;

/// A method node.
#[derive(Clone)]
pub struct Method {
    pub(crate) base: Base,
    executable: bool,
    user_executable: bool,
    callback: Option<MethodCallback>,
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("base", &self.base)
            .field("executable", &self.executable)
            .field("user_executable", &self.user_executable)
            .field("callback", &self.callback.as_ref().map(|_| "..."))
            .finish()
    }
}

impl Default for Method {
    fn default() -> Self {
        Method {
            base: Base {
                node_class: uaserve_types::NodeClass::Method,
                ..Default::default()
            },
            executable: false,
            user_executable: false,
            callback: None,
        }
    }
}

node_base_impl!(Method);

impl Node for Method {
    fn get_attribute(
        &self,
        timestamps_to_return: TimestampsToReturn,
        attribute_id: AttributeId,
        index_range: &NumericRange,
        data_encoding: &DataEncoding,
    ) -> Option<DataValue> {
        match attribute_id {
            AttributeId::Executable => Some(self.executable.into()),
            AttributeId::UserExecutable => Some(self.user_executable.into()),
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
            AttributeId::Executable => {
                if let Variant::Boolean(v) = value {
                    self.executable = v;
                    Ok(())
                } else {
                    Err(StatusCode::BadTypeMismatch)
                }
            }
            AttributeId::UserExecutable => {
                if let Variant::Boolean(v) = value {
                    self.user_executable = v;
                    Ok(())
                } else {
                    Err(StatusCode::BadTypeMismatch)
                }
            }
            _ => self.base.set_attribute(attribute_id, value),
        }
    }
}

impl Method {
    /// Create a method node.
    pub fn new(
        node_id: &NodeId,
        browse_name: impl Into<QualifiedName>,
        display_name: impl Into<LocalizedText>,
        executable: bool,
        user_executable: bool,
    ) -> Method {
        Method {
            base: Base::new(NodeClass::Method, node_id, browse_name, display_name),
            executable,
            user_executable,
            callback: None,
        }
    }

    /// `true` if the node is valid for insertion.
    pub fn is_valid(&self) -> bool {
        self.base.is_valid()
    }

    /// Whether the method may be called at all.
    pub fn executable(&self) -> bool {
        self.executable
    }

    /// Set whether the method may be called.
    pub fn set_executable(&mut self, executable: bool) {
        self.executable = executable;
    }

    /// Whether the current user may call the method.
    pub fn user_executable(&self) -> bool {
        self.user_executable
    }

    /// Set whether the current user may call the method.
    pub fn set_user_executable(&mut self, user_executable: bool) {
        self.user_executable = user_executable;
    }

    /// The callable backing this method.
    pub fn callback(&self) -> Option<&MethodCallback> {
        self.callback.as_ref()
    }

    /// Install the callable backing this method.
    pub fn set_callback(&mut self, callback: MethodCallback) {
        self.callback = Some(callback);
    }
}

node_builder_impl!(MethodBuilder, Method);

impl MethodBuilder {
    /// Mark the method executable for everyone.
    pub fn executable(mut self, executable: bool) -> Self {
        self.node.set_executable(executable);
        self.node.set_user_executable(executable);
        self
    }

    /// Install the callable backing the method.
    pub fn callback(mut self, callback: super::MethodCallback) -> Self {
        self.node.set_callback(callback);
        self
    }
}
