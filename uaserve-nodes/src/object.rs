//! The `Object` node class.

use uaserve_types::{
    AttributeId, DataEncoding, DataValue, NumericRange, StatusCode, TimestampsToReturn, Variant,
};

use crate::{node_base_impl, node_builder_impl, Base, EventNotifier, Node};

/// An object node.
#[derive(Debug, Clone)]
pub struct Object {
    pub(crate) base: Base,
    event_notifier: u8,
}

impl Default for Object {
    fn default() -> Self {
        Object {
            base: Base {
                node_class: uaserve_types::NodeClass::Object,
                ..Default::default()
            },
            event_notifier: 0,
        }
    }
}

node_base_impl!(Object);

impl Node for Object {
    fn get_attribute(
        &self,
        timestamps_to_return: TimestampsToReturn,
        attribute_id: AttributeId,
        index_range: &NumericRange,
        data_encoding: &DataEncoding,
    ) -> Option<DataValue> {
        match attribute_id {
            AttributeId::EventNotifier => Some(self.event_notifier.into()),
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
            _ => self.base.set_attribute(attribute_id, value),
        }
    }
}

impl Object {
    /// Create an object node.
    pub fn new(
        node_id: &NodeId,
        browse_name: impl Into<QualifiedName>,
        display_name: impl Into<LocalizedText>,
        event_notifier: EventNotifier,
    ) -> Object {
        Object {
            base: Base::new(NodeClass::Object, node_id, browse_name, display_name),
            event_notifier: event_notifier.bits(),
        }
    }

    /// `true` if the node is valid for insertion.
    pub fn is_valid(&self) -> bool {
        self.base.is_valid()
    }

    /// The event notifier flags of the object.
    pub fn event_notifier(&self) -> EventNotifier {
        EventNotifier::from_bits_truncate(self.event_notifier)
    }

    /// Set the event notifier flags.
    pub fn set_event_notifier(&mut self, event_notifier: EventNotifier) {
        self.event_notifier = event_notifier.bits();
    }
}

node_builder_impl!(ObjectBuilder, Object);

impl ObjectBuilder {
    /// Set the event notifier flags of the object.
    pub fn event_notifier(mut self, event_notifier: EventNotifier) -> Self {
        self.node.set_event_notifier(event_notifier);
        self
    }

    /// Declare the object to be an instance of the given object type.
    pub fn has_type_definition(self, type_id: impl Into<BuilderNodeId>) -> Self {
        self.reference(
            type_id,
            ReferenceTypeId::HasTypeDefinition,
            ReferenceDirection::Forward,
        )
    }

    /// Add a component to the object.
    pub fn has_component(self, component_id: impl Into<BuilderNodeId>) -> Self {
        self.reference(
            component_id,
            ReferenceTypeId::HasComponent,
            ReferenceDirection::Forward,
        )
    }

    /// Add a property to the object.
    pub fn has_property(self, property_id: impl Into<BuilderNodeId>) -> Self {
        self.reference(
            property_id,
            ReferenceTypeId::HasProperty,
            ReferenceDirection::Forward,
        )
    }
}
