//! The `View` node class.

use uaserve_types::{
    AttributeId, DataEncoding, DataValue, NumericRange, StatusCode, TimestampsToReturn, Variant,
};

use crate::{node_base_impl, node_builder_impl, Base, EventNotifier, Node};

/// A view node, a predefined subset of the address space.
#[derive(Debug, Clone)]
pub struct View {
    pub(crate) base: Base,
    event_notifier: u8,
    contains_no_loops: bool,
}

impl Default for View {
    fn default() -> Self {
        View {
            base: Base {
                node_class: uaserve_types::NodeClass::View,
                ..Default::default()
            },
            event_notifier: 0,
            contains_no_loops: true,
        }
    }
}

node_base_impl!(View);

impl Node for View {
    fn get_attribute(
        &self,
        timestamps_to_return: TimestampsToReturn,
        attribute_id: AttributeId,
        index_range: &NumericRange,
        data_encoding: &DataEncoding,
    ) -> Option<DataValue> {
        match attribute_id {
            AttributeId::EventNotifier => Some(self.event_notifier.into()),
            AttributeId::ContainsNoLoops => Some(self.contains_no_loops.into()),
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
            AttributeId::EventNotifier => {
                if let Variant::Byte(v) = value {
                    self.event_notifier = v;
                    Ok(())
                } else {
                    Err(StatusCode::BadTypeMismatch)
                }
            }
            AttributeId::ContainsNoLoops => {
                if let Variant::Boolean(v) = value {
                    self.contains_no_loops = v;
                    Ok(())
                } else {
                    Err(StatusCode::BadTypeMismatch)
                }
            }
            _ => self.base.set_attribute(attribute_id, value),
        }
    }
}

impl View {
    /// Create a view node.
    pub fn new(
        node_id: &NodeId,
        browse_name: impl Into<QualifiedName>,
        display_name: impl Into<LocalizedText>,
        event_notifier: EventNotifier,
        contains_no_loops: bool,
    ) -> View {
        View {
            base: Base::new(NodeClass::View, node_id, browse_name, display_name),
            event_notifier: event_notifier.bits(),
            contains_no_loops,
        }
    }

    /// `true` if the node is valid for insertion.
    pub fn is_valid(&self) -> bool {
        self.base.is_valid()
    }

    /// Whether the view is guaranteed free of loops.
    pub fn contains_no_loops(&self) -> bool {
        self.contains_no_loops
    }

    /// The event notifier flags of the view.
    pub fn event_notifier(&self) -> EventNotifier {
        EventNotifier::from_bits_truncate(self.event_notifier)
    }
}

node_builder_impl!(ViewBuilder, View);

impl ViewBuilder {
    /// Set whether the view is guaranteed free of loops.
    pub fn contains_no_loops(mut self, contains_no_loops: bool) -> Self {
        self.node.contains_no_loops = contains_no_loops;
        self
    }
}
