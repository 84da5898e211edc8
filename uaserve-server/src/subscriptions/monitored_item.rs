//! The [`MonitoredItem`] type: one sampled attribute feeding a
//! subscription, with its notification queue and change filter.

use std::collections::VecDeque;

use log::debug;
use tokio::time::{Duration, Instant};
use uaserve_types::{
    AttributeId, DataChangeFilter, DataChangeTrigger, DataValue, DeadbandType, EventFieldList,
    EventFilter, ExtensionObject, MonitoredItemCreateRequest, MonitoredItemNotification,
    MonitoringMode, MonitoringParameters, NodeId, NumericRange, ObjectId, StatusCode,
    TimestampsToReturn, Variant,
};

use crate::address_space::AddressSpace;
use crate::config::SubscriptionLimits;

/// The parsed monitoring filter of an item.
#[derive(Debug, Clone)]
pub enum MonitoredItemFilter {
    /// No filter: report data changes with the StatusValue trigger.
    None,
    /// A data change filter.
    DataChange(DataChangeFilter),
    /// An event filter; the select clauses determine the reported fields.
    Event(EventFilter),
}

impl MonitoredItemFilter {
    fn parse(
        object: &ExtensionObject,
        attribute_id: AttributeId,
    ) -> Result<MonitoredItemFilter, StatusCode> {
        if object.is_null() {
            return Ok(MonitoredItemFilter::None);
        }
        match object.object_id() {
            Some(ObjectId::DataChangeFilter_Encoding_DefaultBinary) => {
                if attribute_id != AttributeId::Value {
                    return Err(StatusCode::BadFilterNotAllowed);
                }
                let ctx = uaserve_types::ContextOwned::new_default();
                let filter: DataChangeFilter = object
                    .decode_inner(&ctx.context())
                    .map_err(|_| StatusCode::BadMonitoredItemFilterInvalid)?;
                if filter.deadband_type == DeadbandType::Percent as u32 {
                    // Percent deadband needs an EURange, which this server
                    // does not maintain.
                    return Err(StatusCode::BadMonitoredItemFilterUnsupported);
                }
                Ok(MonitoredItemFilter::DataChange(filter))
            }
            Some(ObjectId::EventFilter_Encoding_DefaultBinary) => {
                if attribute_id != AttributeId::EventNotifier {
                    return Err(StatusCode::BadFilterNotAllowed);
                }
                let ctx = uaserve_types::ContextOwned::new_default();
                let filter: EventFilter = object
                    .decode_inner(&ctx.context())
                    .map_err(|_| StatusCode::BadEventFilterInvalid)?;
                Ok(MonitoredItemFilter::Event(filter))
            }
            _ => Err(StatusCode::BadMonitoredItemFilterUnsupported),
        }
    }
}

/// One monitored attribute of one node.
#[derive(Debug)]
pub struct MonitoredItem {
    id: u32,
    client_handle: u32,
    node_id: NodeId,
    attribute_id: AttributeId,
    index_range: NumericRange,
    monitoring_mode: MonitoringMode,
    sampling_interval_ms: f64,
    sampling_interval: Duration,
    queue_size: usize,
    discard_oldest: bool,
    timestamps_to_return: TimestampsToReturn,
    filter: MonitoredItemFilter,
    queue: VecDeque<MonitoredItemNotification>,
    event_queue: VecDeque<EventFieldList>,
    last_value: Option<DataValue>,
    last_sample: Option<Instant>,
}

impl MonitoredItem {
    /// Validate a create request and construct the item. The current
    /// attribute value is sampled as the change detection baseline
    /// without producing a notification, so clients see changes from
    /// creation onwards.
    pub fn validate_and_create(
        id: u32,
        request: &MonitoredItemCreateRequest,
        timestamps_to_return: TimestampsToReturn,
        publishing_interval_ms: f64,
        limits: &SubscriptionLimits,
        address_space: &AddressSpace,
    ) -> Result<MonitoredItem, StatusCode> {
        let attribute_id = AttributeId::try_from(request.item_to_monitor.attribute_id)?;
        let index_range = request
            .item_to_monitor
            .index_range
            .as_ref()
            .parse::<NumericRange>()?;
        let filter = MonitoredItemFilter::parse(&request.requested_parameters.filter, attribute_id)?;
        let (sampling_interval_ms, queue_size) = Self::revise_parameters(
            &request.requested_parameters,
            publishing_interval_ms,
            limits,
        );

        let baseline = address_space.read_attribute(
            &request.item_to_monitor.node_id,
            attribute_id,
            &index_range,
            TimestampsToReturn::Both,
        );

        Ok(MonitoredItem {
            id,
            client_handle: request.requested_parameters.client_handle,
            node_id: request.item_to_monitor.node_id.clone(),
            attribute_id,
            index_range,
            monitoring_mode: request.monitoring_mode,
            sampling_interval_ms,
            sampling_interval: Duration::from_micros((sampling_interval_ms * 1000.0) as u64),
            queue_size,
            discard_oldest: request.requested_parameters.discard_oldest,
            timestamps_to_return,
            filter,
            queue: VecDeque::new(),
            event_queue: VecDeque::new(),
            last_value: Some(baseline),
            last_sample: None,
        })
    }

    fn revise_parameters(
        params: &MonitoringParameters,
        publishing_interval_ms: f64,
        limits: &SubscriptionLimits,
    ) -> (f64, usize) {
        // A negative sampling interval asks for the publishing interval.
        let sampling_interval_ms = if params.sampling_interval < 0.0 {
            publishing_interval_ms
        } else {
            params.sampling_interval.max(limits.min_sampling_interval_ms)
        };
        let queue_size = (params.queue_size as usize)
            .clamp(1, limits.max_monitored_item_queue_size);
        (sampling_interval_ms, queue_size)
    }

    /// Apply new monitoring parameters from a modify request.
    pub fn modify(
        &mut self,
        params: &MonitoringParameters,
        timestamps_to_return: TimestampsToReturn,
        publishing_interval_ms: f64,
        limits: &SubscriptionLimits,
    ) -> Result<(), StatusCode> {
        let filter = MonitoredItemFilter::parse(&params.filter, self.attribute_id)?;
        let (sampling_interval_ms, queue_size) =
            Self::revise_parameters(params, publishing_interval_ms, limits);
        self.client_handle = params.client_handle;
        self.sampling_interval_ms = sampling_interval_ms;
        self.sampling_interval = Duration::from_micros((sampling_interval_ms * 1000.0) as u64);
        self.queue_size = queue_size;
        self.discard_oldest = params.discard_oldest;
        self.filter = filter;
        if timestamps_to_return != TimestampsToReturn::Invalid {
            self.timestamps_to_return = timestamps_to_return;
        }
        while self.queue.len() > self.queue_size {
            self.discard_one();
        }
        Ok(())
    }

    /// The server assigned id of the item.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// The node the item monitors.
    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    /// The monitored attribute.
    pub fn attribute_id(&self) -> AttributeId {
        self.attribute_id
    }

    /// The granted sampling interval in milliseconds.
    pub fn sampling_interval_ms(&self) -> f64 {
        self.sampling_interval_ms
    }

    /// The granted queue size.
    pub fn queue_size(&self) -> u32 {
        self.queue_size as u32
    }

    /// The current monitoring mode.
    pub fn monitoring_mode(&self) -> MonitoringMode {
        self.monitoring_mode
    }

    /// Change the monitoring mode. Disabling clears the queues.
    pub fn set_monitoring_mode(&mut self, mode: MonitoringMode) {
        if mode == MonitoringMode::Disabled {
            self.queue.clear();
            self.event_queue.clear();
        }
        self.monitoring_mode = mode;
    }

    /// `true` if the item monitors events rather than data changes.
    pub fn is_event_item(&self) -> bool {
        matches!(self.filter, MonitoredItemFilter::Event(_))
    }

    /// The select clauses of an event item.
    pub fn event_filter(&self) -> Option<&EventFilter> {
        match &self.filter {
            MonitoredItemFilter::Event(f) => Some(f),
            _ => None,
        }
    }

    /// Sample the monitored attribute if the item is due. Returns `true`
    /// if a notification was queued.
    pub fn sample(&mut self, address_space: &AddressSpace, now: Instant) -> bool {
        if self.monitoring_mode == MonitoringMode::Disabled || self.is_event_item() {
            return false;
        }
        if let Some(last) = self.last_sample {
            if now.duration_since(last) < self.sampling_interval {
                return false;
            }
        }
        self.last_sample = Some(now);

        let mut value = address_space.read_attribute(
            &self.node_id,
            self.attribute_id,
            &self.index_range,
            TimestampsToReturn::Both,
        );

        let changed = match &self.last_value {
            None => true,
            Some(last) => self.value_changed(last, &value),
        };
        if !changed {
            return false;
        }
        self.last_value = Some(value.clone());

        value.keep_timestamps(self.timestamps_to_return);
        self.enqueue_data_change(MonitoredItemNotification {
            client_handle: self.client_handle,
            value,
        });
        true
    }

    /// Queue a set of event fields for an event item.
    pub fn enqueue_event(&mut self, fields: Vec<Variant>) {
        if self.monitoring_mode == MonitoringMode::Disabled {
            return;
        }
        if self.event_queue.len() >= self.queue_size {
            if self.discard_oldest {
                self.event_queue.pop_front();
            } else {
                self.event_queue.pop_back();
            }
        }
        self.event_queue.push_back(EventFieldList {
            client_handle: self.client_handle,
            event_fields: Some(fields),
        });
    }

    fn enqueue_data_change(&mut self, notification: MonitoredItemNotification) {
        if self.queue.len() >= self.queue_size {
            self.discard_one();
        }
        self.queue.push_back(notification);
    }

    fn discard_one(&mut self) {
        if self.discard_oldest {
            self.queue.pop_front();
        } else {
            self.queue.pop_back();
        }
        debug!(
            "Monitored item {} dropped a notification, queue is full",
            self.id
        );
    }

    /// Drain up to `max` queued data change notifications. Only reporting
    /// items surrender their queue.
    pub fn drain_notifications(&mut self, max: usize) -> Vec<MonitoredItemNotification> {
        if self.monitoring_mode != MonitoringMode::Reporting {
            return Vec::new();
        }
        let take = self.queue.len().min(max);
        self.queue.drain(..take).collect()
    }

    /// Drain up to `max` queued event notifications.
    pub fn drain_events(&mut self, max: usize) -> Vec<EventFieldList> {
        if self.monitoring_mode != MonitoringMode::Reporting {
            return Vec::new();
        }
        let take = self.event_queue.len().min(max);
        self.event_queue.drain(..take).collect()
    }

    /// `true` if the item currently has queued notifications to report.
    pub fn has_notifications(&self) -> bool {
        self.monitoring_mode == MonitoringMode::Reporting
            && (!self.queue.is_empty() || !self.event_queue.is_empty())
    }

    fn value_changed(&self, last: &DataValue, current: &DataValue) -> bool {
        let trigger = match &self.filter {
            MonitoredItemFilter::DataChange(f) => f.trigger,
            _ => DataChangeTrigger::StatusValue,
        };
        match trigger {
            DataChangeTrigger::Status => last.status() != current.status(),
            DataChangeTrigger::StatusValue => {
                last.status() != current.status() || self.value_differs(last, current)
            }
            DataChangeTrigger::StatusValueTimestamp => {
                last.status() != current.status()
                    || self.value_differs(last, current)
                    || last.source_timestamp != current.source_timestamp
            }
        }
    }

    fn value_differs(&self, last: &DataValue, current: &DataValue) -> bool {
        if let MonitoredItemFilter::DataChange(f) = &self.filter {
            if f.deadband_type == DeadbandType::Absolute as u32 {
                if let (Some(a), Some(b)) = (
                    last.value.as_ref().and_then(as_f64),
                    current.value.as_ref().and_then(as_f64),
                ) {
                    return (a - b).abs() > f.deadband_value;
                }
            }
        }
        last.value != current.value
    }
}

fn as_f64(v: &Variant) -> Option<f64> {
    match v {
        Variant::SByte(v) => Some(*v as f64),
        Variant::Byte(v) => Some(*v as f64),
        Variant::Int16(v) => Some(*v as f64),
        Variant::UInt16(v) => Some(*v as f64),
        Variant::Int32(v) => Some(*v as f64),
        Variant::UInt32(v) => Some(*v as f64),
        Variant::Int64(v) => Some(*v as f64),
        Variant::UInt64(v) => Some(*v as f64),
        Variant::Float(v) => Some(*v as f64),
        Variant::Double(v) => Some(*v),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::MonitoredItem;
    use crate::address_space::AddressSpace;
    use crate::config::SubscriptionLimits;
    use tokio::time::{advance, Duration, Instant};
    use uaserve_nodes::{NodeInsertTarget, VariableBuilder};
    use uaserve_types::{
        ContextOwned, DataChangeFilter, DataChangeTrigger, DeadbandType, ExtensionObject,
        MonitoredItemCreateRequest, MonitoringMode, NodeId, Variant,
    };

    fn space_with_value(value: f64) -> (AddressSpace, NodeId) {
        let mut space = AddressSpace::new();
        let id = NodeId::new(1, "v");
        let node = VariableBuilder::new(&id, "v", "v")
            .value(value)
            .data_type(uaserve_types::DataTypeId::Double)
            .build();
        space.insert(node, None);
        (space, id)
    }

    fn set_value(space: &mut AddressSpace, id: &NodeId, value: f64) {
        if let Some(uaserve_nodes::NodeType::Variable(v)) = space.find_mut(id) {
            v.set_value_direct(value);
        }
    }

    fn item(
        space: &AddressSpace,
        id: &NodeId,
        queue_size: u32,
        discard_oldest: bool,
        filter: ExtensionObject,
    ) -> MonitoredItem {
        let mut request = MonitoredItemCreateRequest::new_value(id.clone(), 5, 10.0, queue_size);
        request.requested_parameters.discard_oldest = discard_oldest;
        request.requested_parameters.filter = filter;
        MonitoredItem::validate_and_create(
            1,
            &request,
            uaserve_types::TimestampsToReturn::Both,
            100.0,
            &SubscriptionLimits::default(),
            space,
        )
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn queue_overflow_discards_oldest() {
        let (mut space, id) = space_with_value(0.0);
        let mut item = item(&space, &id, 2, true, ExtensionObject::null());

        for value in 1..=4 {
            set_value(&mut space, &id, value as f64);
            advance(Duration::from_millis(20)).await;
            assert!(item.sample(&space, Instant::now()));
        }

        // Queue size 2 keeps the two newest values
        let drained = item.drain_notifications(10);
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].value.value, Some(Variant::Double(3.0)));
        assert_eq!(drained[1].value.value, Some(Variant::Double(4.0)));
    }

    #[tokio::test(start_paused = true)]
    async fn absolute_deadband_suppresses_small_changes() {
        let (mut space, id) = space_with_value(10.0);
        let ctx = ContextOwned::new_default();
        let filter = DataChangeFilter {
            trigger: DataChangeTrigger::StatusValue,
            deadband_type: DeadbandType::Absolute as u32,
            deadband_value: 1.0,
        };
        let filter = ExtensionObject::from_message(&filter, &ctx.context()).unwrap();
        let mut item = item(&space, &id, 10, true, filter);

        // A change below the deadband is not reported
        set_value(&mut space, &id, 10.5);
        advance(Duration::from_millis(20)).await;
        assert!(!item.sample(&space, Instant::now()));

        // A change beyond the deadband is
        set_value(&mut space, &id, 12.0);
        advance(Duration::from_millis(20)).await;
        assert!(item.sample(&space, Instant::now()));
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_items_do_not_sample() {
        let (mut space, id) = space_with_value(1.0);
        let mut item = item(&space, &id, 10, true, ExtensionObject::null());
        item.set_monitoring_mode(MonitoringMode::Disabled);
        set_value(&mut space, &id, 2.0);
        advance(Duration::from_millis(20)).await;
        assert!(!item.sample(&space, Instant::now()));
        assert!(!item.has_notifications());
    }
}
