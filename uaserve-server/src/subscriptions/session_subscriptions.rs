//! Per-session subscription state: the subscriptions a session owns and
//! the queue of parked publish requests that feed them.

use std::collections::VecDeque;

use hashbrown::HashMap;
use log::debug;
use tokio::time::Instant;
use uaserve_core::ResponseMessage;
use uaserve_types::{
    DateTime, ExtensionObject, NotificationMessage, PublishRequest, PublishResponse,
    ResponseHeader, ServiceFault, StatusCode, StatusChangeNotification,
};

use super::subscription::Subscription;
use crate::config::SubscriptionLimits;

/// A parked publish request, answered when a notification or keep-alive
/// becomes available, or failed when its deadline passes.
pub struct PendingPublish {
    /// Channel resolving the parked request in the connection task.
    pub response: tokio::sync::oneshot::Sender<ResponseMessage>,
    /// The original request.
    pub request: Box<PublishRequest>,
    /// Results of the acknowledgements carried by the request.
    pub ack_results: Option<Vec<StatusCode>>,
    /// Monotonic deadline derived from the request timeout hint.
    pub deadline: Instant,
}

/// The subscriptions and publish queue of one session.
pub struct SessionSubscriptions {
    subscriptions: HashMap<u32, Subscription>,
    publish_queue: VecDeque<PendingPublish>,
    /// Status changes of removed subscriptions, delivered on the next
    /// publish.
    status_changes: VecDeque<(u32, StatusCode)>,
    limits: SubscriptionLimits,
}

impl SessionSubscriptions {
    pub(super) fn new(limits: SubscriptionLimits) -> Self {
        Self {
            subscriptions: HashMap::new(),
            publish_queue: VecDeque::new(),
            status_changes: VecDeque::new(),
            limits,
        }
    }

    pub(super) fn subscriptions(&self) -> &HashMap<u32, Subscription> {
        &self.subscriptions
    }

    pub(super) fn subscriptions_mut(&mut self) -> &mut HashMap<u32, Subscription> {
        &mut self.subscriptions
    }

    pub(super) fn get_mut(&mut self, subscription_id: u32) -> Option<&mut Subscription> {
        self.subscriptions.get_mut(&subscription_id)
    }

    pub(super) fn insert(&mut self, subscription: Subscription) -> Result<(), StatusCode> {
        if self.subscriptions.len() >= self.limits.max_subscriptions_per_session {
            return Err(StatusCode::BadTooManySubscriptions);
        }
        self.subscriptions.insert(subscription.id(), subscription);
        Ok(())
    }

    pub(super) fn remove(&mut self, subscription_id: u32) -> Option<Subscription> {
        self.subscriptions.remove(&subscription_id)
    }

    /// Park a publish request. Acknowledgements are processed before the
    /// request is queued, and every subscription's lifetime restarts since
    /// the client has demonstrated liveness.
    pub(super) fn enqueue_publish(
        &mut self,
        mut pending: PendingPublish,
    ) -> Result<(), StatusCode> {
        if self.subscriptions.is_empty() {
            return Err(StatusCode::BadNoSubscription);
        }
        if self.publish_queue.len() >= self.limits.max_pending_publish_requests {
            return Err(StatusCode::BadTooManyPublishRequests);
        }

        let ack_results = pending
            .request
            .subscription_acknowledgements
            .as_ref()
            .map(|acks| {
                acks.iter()
                    .map(|ack| match self.subscriptions.get_mut(&ack.subscription_id) {
                        Some(sub) => sub.acknowledge(ack.sequence_number),
                        None => StatusCode::BadSubscriptionIdInvalid,
                    })
                    .collect::<Vec<_>>()
            });
        pending.ack_results = ack_results;

        for sub in self.subscriptions.values_mut() {
            sub.reset_lifetime();
        }

        self.publish_queue.push_back(pending);
        Ok(())
    }

    /// `true` if a publish request is parked.
    pub(super) fn publish_available(&self) -> bool {
        !self.publish_queue.is_empty()
    }

    /// Answer the oldest parked publish request with `message` from
    /// `subscription_id`.
    pub(super) fn respond_publish(
        &mut self,
        subscription_id: u32,
        message: NotificationMessage,
        more_notifications: bool,
    ) {
        let Some(pending) = self.publish_queue.pop_front() else {
            return;
        };
        let available_sequence_numbers = self
            .subscriptions
            .get(&subscription_id)
            .and_then(|s| s.available_sequence_numbers());
        let response = PublishResponse {
            response_header: ResponseHeader::new_good(&pending.request.request_header),
            subscription_id,
            available_sequence_numbers,
            more_notifications,
            notification_message: message,
            results: pending.ack_results,
            diagnostic_infos: None,
        };
        // The receiver dropping just means the connection went away.
        let _ = pending.response.send(response.into());
    }

    /// Queue a status change for delivery and try to deliver it at once.
    pub(super) fn notify_status_change(&mut self, subscription_id: u32, status: StatusCode) {
        self.status_changes.push_back((subscription_id, status));
        self.deliver_status_changes();
    }

    /// Deliver queued status changes while publish requests are parked.
    pub(super) fn deliver_status_changes(&mut self) {
        while !self.status_changes.is_empty() && !self.publish_queue.is_empty() {
            let (subscription_id, status) = self.status_changes.pop_front().unwrap();
            let Some(pending) = self.publish_queue.pop_front() else {
                return;
            };
            let notification = StatusChangeNotification {
                status,
                diagnostic_info: Default::default(),
            };
            let ctx = uaserve_types::ContextOwned::new_default();
            let notification_data = ExtensionObject::from_message(&notification, &ctx.context())
                .map(|o| vec![o])
                .ok();
            let response = PublishResponse {
                response_header: ResponseHeader::new_good(&pending.request.request_header),
                subscription_id,
                available_sequence_numbers: None,
                more_notifications: false,
                notification_message: NotificationMessage {
                    sequence_number: 0,
                    publish_time: DateTime::now(),
                    notification_data,
                },
                results: pending.ack_results,
                diagnostic_infos: None,
            };
            let _ = pending.response.send(response.into());
            debug!(
                "Delivered status change {status} for subscription {subscription_id}"
            );
        }
    }

    /// Fail parked publish requests whose deadline passed with
    /// `BadTimeout`. Deadlines follow the per-request timeout hint, so
    /// the queue is not deadline ordered.
    pub(super) fn expire_publish_requests(&mut self, now: Instant) {
        let mut i = 0;
        while i < self.publish_queue.len() {
            if self.publish_queue[i].deadline <= now {
                let pending = self.publish_queue.remove(i).unwrap();
                let fault = ServiceFault::new(
                    pending.request.request_header.request_handle,
                    StatusCode::BadTimeout,
                );
                let _ = pending.response.send(fault.into());
            } else {
                i += 1;
            }
        }
    }

    /// Fail every parked publish request, used at session teardown.
    pub(super) fn clear_publish_queue(&mut self, status: StatusCode) {
        for pending in self.publish_queue.drain(..) {
            let fault = ServiceFault::new(pending.request.request_header.request_handle, status);
            let _ = pending.response.send(fault.into());
        }
    }
}
