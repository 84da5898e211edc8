//! The subscription engine: server wide cache of the subscriptions of all
//! sessions, the periodic publish machinery, and the subscription service
//! set.

mod monitored_item;
mod session_subscriptions;
mod subscription;

pub use monitored_item::{MonitoredItem, MonitoredItemFilter};
pub use session_subscriptions::{PendingPublish, SessionSubscriptions};
pub use subscription::{Subscription, TickResult};

use hashbrown::HashMap;
use log::{debug, info};
use parking_lot::Mutex;
use tokio::time::Instant;
use uaserve_types::{
    CreateMonitoredItemsRequest, CreateSubscriptionRequest, CreateSubscriptionResponse,
    DeleteSubscriptionsRequest, DeleteSubscriptionsResponse, ExtensionObject,
    ModifyMonitoredItemsRequest, ModifySubscriptionRequest, ModifySubscriptionResponse,
    MonitoredItemCreateResult, MonitoredItemModifyResult, NotificationMessage, RepublishRequest,
    RepublishResponse, ResponseHeader, SetMonitoringModeRequest, SetPublishingModeRequest,
    SetPublishingModeResponse, StatusCode, Variant,
};

use crate::address_space::AddressSpace;
use crate::config::SubscriptionLimits;
use crate::info::ServerInfo;

/// Server wide cache of session subscriptions. Subscriptions are owned by
/// their session; the cache just routes by session id.
pub struct SubscriptionCache {
    inner: Mutex<HashMap<u32, SessionSubscriptions>>,
    limits: SubscriptionLimits,
}

impl SubscriptionCache {
    /// Create an empty cache with the configured limits.
    pub fn new(limits: SubscriptionLimits) -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            limits,
        }
    }

    /// Create a subscription for `session_id`, clamping the requested
    /// parameters to the server limits.
    pub fn create_subscription(
        &self,
        session_id: u32,
        request: &CreateSubscriptionRequest,
        info: &ServerInfo,
    ) -> Result<CreateSubscriptionResponse, StatusCode> {
        let publishing_interval_ms =
            self.revise_publishing_interval(request.requested_publishing_interval);
        let max_keep_alive_count =
            self.revise_keep_alive_count(request.requested_max_keep_alive_count);
        let lifetime_count =
            self.revise_lifetime_count(request.requested_lifetime_count, max_keep_alive_count);

        let subscription_id = info.subscription_id_handle.next();
        let subscription = Subscription::new(
            subscription_id,
            publishing_interval_ms,
            lifetime_count,
            max_keep_alive_count,
            request.max_notifications_per_publish as usize,
            request.priority,
            request.publishing_enabled,
            &self.limits,
        );

        let mut inner = self.inner.lock();
        let session = inner
            .entry(session_id)
            .or_insert_with(|| SessionSubscriptions::new(self.limits));
        session.insert(subscription)?;
        info!("Created subscription {subscription_id} for session {session_id}");

        Ok(CreateSubscriptionResponse {
            response_header: ResponseHeader::new_good(&request.request_header),
            subscription_id,
            revised_publishing_interval: publishing_interval_ms,
            revised_lifetime_count: lifetime_count,
            revised_max_keep_alive_count: max_keep_alive_count,
        })
    }

    /// Modify a subscription of `session_id`.
    pub fn modify_subscription(
        &self,
        session_id: u32,
        request: &ModifySubscriptionRequest,
    ) -> Result<ModifySubscriptionResponse, StatusCode> {
        let publishing_interval_ms =
            self.revise_publishing_interval(request.requested_publishing_interval);
        let max_keep_alive_count =
            self.revise_keep_alive_count(request.requested_max_keep_alive_count);
        let lifetime_count =
            self.revise_lifetime_count(request.requested_lifetime_count, max_keep_alive_count);

        let mut inner = self.inner.lock();
        let subscription = inner
            .get_mut(&session_id)
            .and_then(|s| s.get_mut(request.subscription_id))
            .ok_or(StatusCode::BadSubscriptionIdInvalid)?;
        subscription.modify(
            publishing_interval_ms,
            lifetime_count,
            max_keep_alive_count,
            request.max_notifications_per_publish as usize,
            request.priority,
        );

        Ok(ModifySubscriptionResponse {
            response_header: ResponseHeader::new_good(&request.request_header),
            revised_publishing_interval: publishing_interval_ms,
            revised_lifetime_count: lifetime_count,
            revised_max_keep_alive_count: max_keep_alive_count,
        })
    }

    /// Enable or disable publishing on a set of subscriptions.
    pub fn set_publishing_mode(
        &self,
        session_id: u32,
        request: &SetPublishingModeRequest,
    ) -> Result<SetPublishingModeResponse, StatusCode> {
        let Some(ids) = &request.subscription_ids else {
            return Err(StatusCode::BadNothingToDo);
        };
        if ids.is_empty() {
            return Err(StatusCode::BadNothingToDo);
        }
        let mut inner = self.inner.lock();
        let session = inner
            .get_mut(&session_id)
            .ok_or(StatusCode::BadSubscriptionIdInvalid)?;
        let results = ids
            .iter()
            .map(|id| match session.get_mut(*id) {
                Some(sub) => {
                    sub.set_publishing_enabled(request.publishing_enabled);
                    StatusCode::Good
                }
                None => StatusCode::BadSubscriptionIdInvalid,
            })
            .collect();
        Ok(SetPublishingModeResponse {
            response_header: ResponseHeader::new_good(&request.request_header),
            results: Some(results),
            diagnostic_infos: None,
        })
    }

    /// Delete a set of subscriptions of `session_id`.
    pub fn delete_subscriptions(
        &self,
        session_id: u32,
        request: &DeleteSubscriptionsRequest,
    ) -> Result<DeleteSubscriptionsResponse, StatusCode> {
        let Some(ids) = &request.subscription_ids else {
            return Err(StatusCode::BadNothingToDo);
        };
        if ids.is_empty() {
            return Err(StatusCode::BadNothingToDo);
        }
        let mut inner = self.inner.lock();
        let session = inner
            .get_mut(&session_id)
            .ok_or(StatusCode::BadSubscriptionIdInvalid)?;
        let results = ids
            .iter()
            .map(|id| match session.remove(*id) {
                Some(_) => StatusCode::Good,
                None => StatusCode::BadSubscriptionIdInvalid,
            })
            .collect();
        Ok(DeleteSubscriptionsResponse {
            response_header: ResponseHeader::new_good(&request.request_header),
            results: Some(results),
            diagnostic_infos: None,
        })
    }

    /// Create monitored items on a subscription.
    pub fn create_monitored_items(
        &self,
        session_id: u32,
        request: &CreateMonitoredItemsRequest,
        info: &ServerInfo,
        address_space: &AddressSpace,
    ) -> Result<Vec<MonitoredItemCreateResult>, StatusCode> {
        let Some(items) = &request.items_to_create else {
            return Err(StatusCode::BadNothingToDo);
        };
        if items.is_empty() {
            return Err(StatusCode::BadNothingToDo);
        }
        if items.len() > info.config.limits.operational.max_monitored_items_per_call {
            return Err(StatusCode::BadTooManyOperations);
        }

        let mut inner = self.inner.lock();
        let subscription = inner
            .get_mut(&session_id)
            .and_then(|s| s.get_mut(request.subscription_id))
            .ok_or(StatusCode::BadSubscriptionIdInvalid)?;

        let results = items
            .iter()
            .map(|item| {
                if subscription.len() >= self.limits.max_monitored_items_per_sub {
                    return MonitoredItemCreateResult {
                        status_code: StatusCode::BadTooManyMonitoredItems,
                        ..Default::default()
                    };
                }
                if !address_space.node_exists(&item.item_to_monitor.node_id) {
                    return MonitoredItemCreateResult {
                        status_code: StatusCode::BadNodeIdUnknown,
                        ..Default::default()
                    };
                }
                let id = info.monitored_item_id_handle.next();
                match MonitoredItem::validate_and_create(
                    id,
                    item,
                    request.timestamps_to_return,
                    subscription.publishing_interval_ms(),
                    &self.limits,
                    address_space,
                ) {
                    Ok(created) => {
                        let result = MonitoredItemCreateResult {
                            status_code: StatusCode::Good,
                            monitored_item_id: created.id(),
                            revised_sampling_interval: created.sampling_interval_ms(),
                            revised_queue_size: created.queue_size(),
                            filter_result: ExtensionObject::null(),
                        };
                        subscription.insert_item(created);
                        result
                    }
                    Err(status) => MonitoredItemCreateResult {
                        status_code: status,
                        ..Default::default()
                    },
                }
            })
            .collect();
        Ok(results)
    }

    /// Modify monitored items of a subscription.
    pub fn modify_monitored_items(
        &self,
        session_id: u32,
        request: &ModifyMonitoredItemsRequest,
    ) -> Result<Vec<MonitoredItemModifyResult>, StatusCode> {
        let Some(items) = &request.items_to_modify else {
            return Err(StatusCode::BadNothingToDo);
        };
        if items.is_empty() {
            return Err(StatusCode::BadNothingToDo);
        }
        let mut inner = self.inner.lock();
        let subscription = inner
            .get_mut(&session_id)
            .and_then(|s| s.get_mut(request.subscription_id))
            .ok_or(StatusCode::BadSubscriptionIdInvalid)?;
        let publishing_interval_ms = subscription.publishing_interval_ms();

        let results = items
            .iter()
            .map(|item| {
                let Some(existing) = subscription.items_mut().get_mut(&item.monitored_item_id)
                else {
                    return MonitoredItemModifyResult {
                        status_code: StatusCode::BadMonitoredItemIdInvalid,
                        ..Default::default()
                    };
                };
                match existing.modify(
                    &item.requested_parameters,
                    request.timestamps_to_return,
                    publishing_interval_ms,
                    &self.limits,
                ) {
                    Ok(()) => MonitoredItemModifyResult {
                        status_code: StatusCode::Good,
                        revised_sampling_interval: existing.sampling_interval_ms(),
                        revised_queue_size: existing.queue_size(),
                        filter_result: ExtensionObject::null(),
                    },
                    Err(status) => MonitoredItemModifyResult {
                        status_code: status,
                        ..Default::default()
                    },
                }
            })
            .collect();
        Ok(results)
    }

    /// Change the monitoring mode of a set of items.
    pub fn set_monitoring_mode(
        &self,
        session_id: u32,
        request: &SetMonitoringModeRequest,
    ) -> Result<Vec<StatusCode>, StatusCode> {
        let Some(ids) = &request.monitored_item_ids else {
            return Err(StatusCode::BadNothingToDo);
        };
        if ids.is_empty() {
            return Err(StatusCode::BadNothingToDo);
        }
        let mut inner = self.inner.lock();
        let subscription = inner
            .get_mut(&session_id)
            .and_then(|s| s.get_mut(request.subscription_id))
            .ok_or(StatusCode::BadSubscriptionIdInvalid)?;
        Ok(ids
            .iter()
            .map(|id| match subscription.items_mut().get_mut(id) {
                Some(item) => {
                    item.set_monitoring_mode(request.monitoring_mode);
                    StatusCode::Good
                }
                None => StatusCode::BadMonitoredItemIdInvalid,
            })
            .collect())
    }

    /// Delete a set of monitored items.
    pub fn delete_monitored_items(
        &self,
        session_id: u32,
        subscription_id: u32,
        ids: &[u32],
    ) -> Result<Vec<StatusCode>, StatusCode> {
        if ids.is_empty() {
            return Err(StatusCode::BadNothingToDo);
        }
        let mut inner = self.inner.lock();
        let subscription = inner
            .get_mut(&session_id)
            .and_then(|s| s.get_mut(subscription_id))
            .ok_or(StatusCode::BadSubscriptionIdInvalid)?;
        Ok(ids
            .iter()
            .map(|id| match subscription.remove_item(*id) {
                Some(_) => StatusCode::Good,
                None => StatusCode::BadMonitoredItemIdInvalid,
            })
            .collect())
    }

    /// Park a publish request for the session. The request resolves
    /// through the oneshot in `pending` once a notification, keep-alive or
    /// failure is available.
    pub fn enqueue_publish_request(
        &self,
        session_id: u32,
        pending: PendingPublish,
    ) -> Result<(), StatusCode> {
        let mut inner = self.inner.lock();
        let Some(session) = inner.get_mut(&session_id) else {
            return Err(StatusCode::BadNoSubscription);
        };
        session.enqueue_publish(pending)?;
        // A retained message or pending status change may already be
        // waiting for this request.
        session.deliver_status_changes();
        Self::drain_unsent(session);
        Ok(())
    }

    /// Serve a Republish request from the retransmission queue.
    pub fn republish(
        &self,
        session_id: u32,
        request: &RepublishRequest,
    ) -> Result<RepublishResponse, StatusCode> {
        let inner = self.inner.lock();
        let subscription = inner
            .get(&session_id)
            .and_then(|s| s.subscriptions().get(&request.subscription_id))
            .ok_or(StatusCode::BadSubscriptionIdInvalid)?;
        let notification_message = subscription.republish(request.retransmit_sequence_number)?;
        Ok(RepublishResponse {
            response_header: ResponseHeader::new_good(&request.request_header),
            notification_message,
        })
    }

    /// Push event fields to the event items monitoring `notifier`.
    pub fn notify_events(&self, session_id: u32, notifier: &uaserve_types::NodeId, fields: &[Variant]) {
        let mut inner = self.inner.lock();
        let Some(session) = inner.get_mut(&session_id) else {
            return;
        };
        for sub in session.subscriptions_mut().values_mut() {
            for item in sub.items_mut().values_mut() {
                if item.is_event_item() && item.node_id() == notifier {
                    item.enqueue_event(fields.to_vec());
                }
            }
        }
    }

    /// The periodic tick driving every subscription: samples due items,
    /// runs due publish cycles, answers parked publish requests and
    /// expires what has lapsed.
    pub fn periodic_tick(&self, address_space: &AddressSpace) {
        let now = Instant::now();
        let mut inner = self.inner.lock();
        for (session_id, session) in inner.iter_mut() {
            session.expire_publish_requests(now);
            Self::drain_unsent(session);

            // Items sample at their own cadence, independent of the
            // publish cycle of their subscription.
            for subscription in session.subscriptions_mut().values_mut() {
                subscription.sample(address_space, now);
            }

            let due: Vec<u32> = {
                let mut ids: Vec<_> = session
                    .subscriptions()
                    .values()
                    .filter(|s| s.publish_due(now))
                    .map(|s| (s.id(), s.priority()))
                    .collect();
                // Higher priority subscriptions publish first.
                ids.sort_by(|a, b| b.1.cmp(&a.1));
                ids.into_iter().map(|(id, _)| id).collect()
            };

            let mut expired = Vec::new();
            for id in due {
                let publish_available = session.publish_available();
                let (result, more) = {
                    let Some(subscription) = session.get_mut(id) else {
                        continue;
                    };
                    let result = subscription.tick(now, publish_available);
                    (result, subscription.has_unsent())
                };
                match result {
                    TickResult::None => {}
                    TickResult::Notification(message) => {
                        session.respond_publish(id, message, more);
                    }
                    TickResult::KeepAlive(message) => {
                        session.respond_publish(id, message, false);
                    }
                    TickResult::Expired => expired.push(id),
                }
            }
            for id in expired {
                info!(
                    "Subscription {id} of session {session_id} expired without publish traffic"
                );
                session.remove(id);
                session.notify_status_change(id, StatusCode::BadTimeout);
            }
        }
    }

    /// Tear down everything a session owns, failing parked publish
    /// requests with `status`.
    pub fn delete_session_subscriptions(&self, session_id: u32, status: StatusCode) {
        let mut inner = self.inner.lock();
        if let Some(mut session) = inner.remove(&session_id) {
            debug!("Removing subscriptions of session {session_id}");
            session.clear_publish_queue(status);
        }
    }

    fn drain_unsent(session: &mut SessionSubscriptions) {
        loop {
            if !session.publish_available() {
                return;
            }
            let next: Option<(u32, NotificationMessage, bool)> = {
                let mut found = None;
                for sub in session.subscriptions_mut().values_mut() {
                    if sub.has_unsent() {
                        if let Some(message) = sub.take_unsent() {
                            found = Some((sub.id(), message, sub.has_unsent()));
                            break;
                        }
                    }
                }
                found
            };
            match next {
                Some((id, message, more)) => session.respond_publish(id, message, more),
                None => return,
            }
        }
    }

    fn revise_publishing_interval(&self, requested_ms: f64) -> f64 {
        if requested_ms <= 0.0 {
            self.limits.min_publishing_interval_ms
        } else {
            requested_ms.max(self.limits.min_publishing_interval_ms)
        }
    }

    fn revise_keep_alive_count(&self, requested: u32) -> u32 {
        if requested == 0 {
            self.limits.default_keep_alive_count
        } else {
            requested.min(self.limits.max_keep_alive_count)
        }
    }

    fn revise_lifetime_count(&self, requested: u32, keep_alive: u32) -> u32 {
        // Part 4 requires the lifetime to be at least three keep-alives.
        requested.clamp(keep_alive * 3, self.limits.max_lifetime_count.max(keep_alive * 3))
    }
}

#[cfg(test)]
mod tests {
    use super::{PendingPublish, SubscriptionCache};
    use crate::address_space::{populate_core_namespace, AddressSpace};
    use crate::authenticator::DefaultAuthenticator;
    use crate::config::ServerConfig;
    use crate::info::ServerInfo;
    use std::sync::Arc;
    use tokio::time::{advance, Duration, Instant};
    use uaserve_core::ResponseMessage;
    use uaserve_nodes::{NodeType, VariableBuilder};
    use uaserve_types::{
        CreateMonitoredItemsRequest, CreateSubscriptionRequest, DataTypeId,
        MonitoredItemCreateRequest, NodeId, ObjectId, PublishRequest, RequestHeader, StatusCode,
        TimestampsToReturn, Variant,
    };

    fn setup() -> (ServerInfo, SubscriptionCache, AddressSpace, NodeId) {
        let config = Arc::new(ServerConfig::default());
        let info = ServerInfo::new(
            config.clone(),
            Arc::new(DefaultAuthenticator::new(Default::default())),
        );
        let cache = SubscriptionCache::new(config.limits.subscriptions);
        let mut space = AddressSpace::new();
        populate_core_namespace(&mut space, "urn:test");
        let id = NodeId::new(1, "the.answer");
        VariableBuilder::new(&id, "the.answer", "the.answer")
            .value(42i32)
            .data_type(DataTypeId::Int32)
            .organized_by(ObjectId::ObjectsFolder)
            .insert(&mut space);
        (info, cache, space, id)
    }

    fn create_subscription(info: &ServerInfo, cache: &SubscriptionCache) -> u32 {
        cache
            .create_subscription(
                1,
                &CreateSubscriptionRequest {
                    requested_publishing_interval: 100.0,
                    requested_lifetime_count: 100,
                    requested_max_keep_alive_count: 10,
                    ..Default::default()
                },
                info,
            )
            .unwrap()
            .subscription_id
    }

    fn monitor_value(
        info: &ServerInfo,
        cache: &SubscriptionCache,
        space: &AddressSpace,
        sub_id: u32,
        node: &NodeId,
    ) {
        let results = cache
            .create_monitored_items(
                1,
                &CreateMonitoredItemsRequest {
                    subscription_id: sub_id,
                    timestamps_to_return: TimestampsToReturn::Both,
                    items_to_create: Some(vec![MonitoredItemCreateRequest::new_value(
                        node.clone(),
                        99,
                        50.0,
                        10,
                    )]),
                    ..Default::default()
                },
                info,
                space,
            )
            .unwrap();
        assert_eq!(results[0].status_code, StatusCode::Good);
    }

    fn publish(
        cache: &SubscriptionCache,
    ) -> tokio::sync::oneshot::Receiver<ResponseMessage> {
        let (send, recv) = tokio::sync::oneshot::channel();
        cache
            .enqueue_publish_request(
                1,
                PendingPublish {
                    response: send,
                    request: Box::new(PublishRequest {
                        request_header: RequestHeader::new(NodeId::null(), 1),
                        subscription_acknowledgements: None,
                    }),
                    ack_results: None,
                    deadline: Instant::now() + Duration::from_secs(30),
                },
            )
            .unwrap();
        recv
    }

    #[tokio::test(start_paused = true)]
    async fn data_change_notification_flow() {
        let (info, cache, mut space, node) = setup();
        let sub_id = create_subscription(&info, &cache);
        monitor_value(&info, &cache, &space, sub_id, &node);

        let mut recv = publish(&cache);

        // Write a new value, then run ticks past the publishing interval.
        if let Some(NodeType::Variable(v)) = space.find_mut(&node) {
            v.set_value_direct(43i32);
        }
        let mut response = None;
        for _ in 0..20 {
            advance(Duration::from_millis(10)).await;
            cache.periodic_tick(&space);
            if let Ok(msg) = recv.try_recv() {
                response = Some(msg);
                break;
            }
        }

        let ResponseMessage::Publish(publish) =
            response.expect("publish should resolve within 200ms of simulated time")
        else {
            panic!("expected a publish response");
        };
        assert_eq!(publish.subscription_id, sub_id);
        assert_eq!(publish.notification_message.sequence_number, 1);

        let data = publish.notification_message.notification_data.clone().unwrap();
        assert_eq!(data.len(), 1);
        let ctx = uaserve_types::ContextOwned::new_default();
        let dcn: uaserve_types::DataChangeNotification =
            data[0].decode_inner(&ctx.context()).unwrap();
        let items = dcn.monitored_items.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].client_handle, 99);
        assert_eq!(items[0].value.value, Some(Variant::Int32(43)));
    }

    #[tokio::test(start_paused = true)]
    async fn republish_and_acknowledge() {
        let (info, cache, mut space, node) = setup();
        let sub_id = create_subscription(&info, &cache);
        monitor_value(&info, &cache, &space, sub_id, &node);

        let mut recv = publish(&cache);
        if let Some(NodeType::Variable(v)) = space.find_mut(&node) {
            v.set_value_direct(43i32);
        }
        let mut first = None;
        for _ in 0..20 {
            advance(Duration::from_millis(10)).await;
            cache.periodic_tick(&space);
            if let Ok(msg) = recv.try_recv() {
                first = Some(msg);
                break;
            }
        }
        let ResponseMessage::Publish(first) = first.unwrap() else {
            panic!("expected publish");
        };
        let seq = first.notification_message.sequence_number;
        assert_eq!(seq, 1);

        // Unacknowledged, the message can be republished.
        let republished = cache
            .republish(
                1,
                &uaserve_types::RepublishRequest {
                    request_header: RequestHeader::new(NodeId::null(), 2),
                    subscription_id: sub_id,
                    retransmit_sequence_number: seq,
                },
            )
            .unwrap();
        assert_eq!(republished.notification_message, first.notification_message);

        // Acknowledge through the next publish request.
        let (send, _recv2) = tokio::sync::oneshot::channel();
        cache
            .enqueue_publish_request(
                1,
                PendingPublish {
                    response: send,
                    request: Box::new(PublishRequest {
                        request_header: RequestHeader::new(NodeId::null(), 3),
                        subscription_acknowledgements: Some(vec![
                            uaserve_types::SubscriptionAcknowledgement {
                                subscription_id: sub_id,
                                sequence_number: seq,
                            },
                        ]),
                    }),
                    ack_results: None,
                    deadline: Instant::now() + Duration::from_secs(30),
                },
            )
            .unwrap();

        // Republishing the acknowledged message now fails.
        assert_eq!(
            cache
                .republish(
                    1,
                    &uaserve_types::RepublishRequest {
                        request_header: RequestHeader::new(NodeId::null(), 4),
                        subscription_id: sub_id,
                        retransmit_sequence_number: seq,
                    },
                )
                .unwrap_err(),
            StatusCode::BadMessageNotAvailable
        );
    }
}
