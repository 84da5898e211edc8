//! The [`Subscription`] state machine: publish cycles, sequence numbers,
//! keep-alives, lifetime countdown and the retransmission queue.

use std::collections::{BTreeMap, VecDeque};

use hashbrown::HashMap;
use log::debug;
use tokio::time::{Duration, Instant};
use uaserve_types::{
    ContextOwned, DataChangeNotification, DateTime, EventNotificationList, ExtensionObject,
    NotificationMessage, StatusCode,
};

use super::monitored_item::MonitoredItem;
use crate::address_space::AddressSpace;
use crate::config::SubscriptionLimits;

/// What one publish cycle of a subscription produced.
#[derive(Debug)]
pub enum TickResult {
    /// Nothing this cycle.
    None,
    /// A notification message is ready; it has also been retained for
    /// republishing.
    Notification(NotificationMessage),
    /// Too many cycles without notifications; a keep-alive is due.
    KeepAlive(NotificationMessage),
    /// The lifetime expired; the subscription must be removed.
    Expired,
}

/// One subscription and everything it owns.
pub struct Subscription {
    id: u32,
    publishing_interval_ms: f64,
    publishing_interval: Duration,
    lifetime_count: u32,
    max_keep_alive_count: u32,
    max_notifications_per_publish: usize,
    priority: u8,
    publishing_enabled: bool,
    items: HashMap<u32, MonitoredItem>,
    /// The next sequence number to issue. Starts at 1, gap free.
    next_sequence_number: u32,
    keep_alive_counter: u32,
    lifetime_counter: u32,
    next_publish: Instant,
    /// Messages retained until acknowledged, keyed by sequence number.
    retransmission: BTreeMap<u32, NotificationMessage>,
    /// Sequence numbers retained but not yet delivered to any publish
    /// response, oldest first.
    unsent: VecDeque<u32>,
    retransmission_cap: usize,
}

impl Subscription {
    /// Create a subscription from revised parameters.
    pub fn new(
        id: u32,
        publishing_interval_ms: f64,
        lifetime_count: u32,
        max_keep_alive_count: u32,
        max_notifications_per_publish: usize,
        priority: u8,
        publishing_enabled: bool,
        limits: &SubscriptionLimits,
    ) -> Subscription {
        let publishing_interval = Duration::from_micros((publishing_interval_ms * 1000.0) as u64);
        Subscription {
            id,
            publishing_interval_ms,
            publishing_interval,
            lifetime_count,
            max_keep_alive_count,
            max_notifications_per_publish,
            priority,
            publishing_enabled,
            items: HashMap::new(),
            next_sequence_number: 1,
            keep_alive_counter: max_keep_alive_count,
            lifetime_counter: lifetime_count,
            next_publish: Instant::now() + publishing_interval,
            retransmission: BTreeMap::new(),
            unsent: VecDeque::new(),
            retransmission_cap: limits.max_retransmission_queue_size,
        }
    }

    /// The subscription id.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// The publishing interval.
    pub fn publishing_interval(&self) -> Duration {
        self.publishing_interval
    }

    /// The publishing interval in milliseconds, as granted.
    pub fn publishing_interval_ms(&self) -> f64 {
        self.publishing_interval_ms
    }

    /// The granted lifetime count.
    pub fn lifetime_count(&self) -> u32 {
        self.lifetime_count
    }

    /// The granted keep-alive count.
    pub fn max_keep_alive_count(&self) -> u32 {
        self.max_keep_alive_count
    }

    /// The priority of the subscription relative to its siblings.
    pub fn priority(&self) -> u8 {
        self.priority
    }

    /// Enable or disable publishing.
    pub fn set_publishing_enabled(&mut self, enabled: bool) {
        self.publishing_enabled = enabled;
    }

    /// Apply modified parameters.
    pub fn modify(
        &mut self,
        publishing_interval_ms: f64,
        lifetime_count: u32,
        max_keep_alive_count: u32,
        max_notifications_per_publish: usize,
        priority: u8,
    ) {
        self.publishing_interval_ms = publishing_interval_ms;
        self.publishing_interval = Duration::from_micros((publishing_interval_ms * 1000.0) as u64);
        self.lifetime_count = lifetime_count;
        self.max_keep_alive_count = max_keep_alive_count;
        self.max_notifications_per_publish = max_notifications_per_publish;
        self.priority = priority;
        self.reset_lifetime();
        self.keep_alive_counter = self.max_keep_alive_count;
    }

    /// The monitored items of this subscription.
    pub fn items(&self) -> &HashMap<u32, MonitoredItem> {
        &self.items
    }

    /// The monitored items, mutable.
    pub fn items_mut(&mut self) -> &mut HashMap<u32, MonitoredItem> {
        &mut self.items
    }

    /// Insert a freshly created monitored item.
    pub fn insert_item(&mut self, item: MonitoredItem) {
        self.items.insert(item.id(), item);
    }

    /// Remove a monitored item by id.
    pub fn remove_item(&mut self, item_id: u32) -> Option<MonitoredItem> {
        self.items.remove(&item_id)
    }

    /// Number of monitored items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// `true` if the subscription holds no monitored items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Reset the lifetime countdown; called whenever the owning session
    /// shows publish traffic.
    pub fn reset_lifetime(&mut self) {
        self.lifetime_counter = self.lifetime_count;
    }

    /// Sample all monitored items that are due.
    pub fn sample(&mut self, address_space: &AddressSpace, now: Instant) {
        for item in self.items.values_mut() {
            item.sample(address_space, now);
        }
    }

    /// `true` if a publish cycle is due at `now`.
    pub fn publish_due(&self, now: Instant) -> bool {
        now >= self.next_publish
    }

    /// Run one publish cycle. `publish_available` tells the subscription
    /// whether the session has a parked publish request; keep-alives are
    /// only produced when one is there to carry them.
    pub fn tick(&mut self, now: Instant, publish_available: bool) -> TickResult {
        // Catch up rather than drift when ticks come late.
        while self.next_publish <= now {
            self.next_publish += self.publishing_interval;
        }

        self.lifetime_counter = self.lifetime_counter.saturating_sub(1);
        if self.lifetime_counter == 0 {
            debug!("Subscription {} lifetime expired", self.id);
            return TickResult::Expired;
        }

        if !self.publishing_enabled {
            return TickResult::None;
        }

        let message = self.assemble_notification();
        if let Some(message) = message {
            self.keep_alive_counter = self.max_keep_alive_count;
            self.retain(message.clone());
            if publish_available {
                // The caller sends it; pop it from the unsent backlog.
                self.unsent.pop_back();
                return TickResult::Notification(message);
            }
            debug!(
                "Subscription {} retained message {} awaiting a publish request",
                self.id, message.sequence_number
            );
            return TickResult::None;
        }

        // No notifications this cycle: count towards a keep-alive.
        if self.keep_alive_counter > 1 {
            self.keep_alive_counter -= 1;
            return TickResult::None;
        }
        if !publish_available {
            // Stay due; the keep-alive goes out with the next publish.
            return TickResult::None;
        }
        self.keep_alive_counter = self.max_keep_alive_count;
        TickResult::KeepAlive(self.make_keep_alive())
    }

    fn assemble_notification(&mut self) -> Option<NotificationMessage> {
        let limit = if self.max_notifications_per_publish == 0 {
            usize::MAX
        } else {
            self.max_notifications_per_publish
        };

        let mut data_changes = Vec::new();
        let mut events = Vec::new();
        let mut budget = limit;
        for item in self.items.values_mut() {
            if budget == 0 {
                break;
            }
            let changes = item.drain_notifications(budget);
            budget -= changes.len();
            data_changes.extend(changes);
            if budget == 0 {
                break;
            }
            let evts = item.drain_events(budget);
            budget -= evts.len();
            events.extend(evts);
        }

        if data_changes.is_empty() && events.is_empty() {
            return None;
        }

        let ctx = ContextOwned::new_default();
        let mut notification_data = Vec::new();
        if !data_changes.is_empty() {
            let notification = DataChangeNotification {
                monitored_items: Some(data_changes),
                diagnostic_infos: None,
            };
            if let Ok(object) = ExtensionObject::from_message(&notification, &ctx.context()) {
                notification_data.push(object);
            }
        }
        if !events.is_empty() {
            let notification = EventNotificationList {
                events: Some(events),
            };
            if let Ok(object) = ExtensionObject::from_message(&notification, &ctx.context()) {
                notification_data.push(object);
            }
        }

        let sequence_number = self.take_sequence_number();
        Some(NotificationMessage {
            sequence_number,
            publish_time: DateTime::now(),
            notification_data: Some(notification_data),
        })
    }

    fn make_keep_alive(&mut self) -> NotificationMessage {
        // Keep-alives advance the sequence counter but are not retained.
        let sequence_number = self.take_sequence_number();
        NotificationMessage {
            sequence_number,
            publish_time: DateTime::now(),
            notification_data: None,
        }
    }

    fn take_sequence_number(&mut self) -> u32 {
        let seq = self.next_sequence_number;
        // Sequence numbers wrap to 1, not 0.
        self.next_sequence_number = self.next_sequence_number.checked_add(1).unwrap_or(1);
        seq
    }

    fn retain(&mut self, message: NotificationMessage) {
        if self.retransmission.len() >= self.retransmission_cap {
            // Overwrite the oldest retained message.
            if let Some((&oldest, _)) = self.retransmission.iter().next() {
                self.retransmission.remove(&oldest);
                self.unsent.retain(|s| *s != oldest);
            }
        }
        self.unsent.push_back(message.sequence_number);
        self.retransmission.insert(message.sequence_number, message);
    }

    /// The oldest retained message not yet delivered, if any.
    pub fn take_unsent(&mut self) -> Option<NotificationMessage> {
        let seq = self.unsent.pop_front()?;
        self.retransmission.get(&seq).cloned()
    }

    /// `true` if undelivered retained messages remain.
    pub fn has_unsent(&self) -> bool {
        !self.unsent.is_empty()
    }

    /// The sequence numbers currently retained for republishing.
    pub fn available_sequence_numbers(&self) -> Option<Vec<u32>> {
        if self.retransmission.is_empty() {
            None
        } else {
            Some(self.retransmission.keys().copied().collect())
        }
    }

    /// Acknowledge a sequence number, dropping it from retention.
    pub fn acknowledge(&mut self, sequence_number: u32) -> StatusCode {
        if self.retransmission.remove(&sequence_number).is_some() {
            self.unsent.retain(|s| *s != sequence_number);
            StatusCode::Good
        } else {
            StatusCode::BadSequenceNumberUnknown
        }
    }

    /// Fetch a retained message for Republish.
    pub fn republish(&self, sequence_number: u32) -> Result<NotificationMessage, StatusCode> {
        self.retransmission
            .get(&sequence_number)
            .cloned()
            .ok_or(StatusCode::BadMessageNotAvailable)
    }
}

#[cfg(test)]
mod tests {
    use super::{Subscription, TickResult};
    use crate::config::SubscriptionLimits;
    use tokio::time::Instant;
    use uaserve_types::StatusCode;

    fn test_subscription(max_keep_alive: u32, lifetime: u32) -> Subscription {
        Subscription::new(
            1,
            100.0,
            lifetime,
            max_keep_alive,
            0,
            0,
            true,
            &SubscriptionLimits::default(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn keep_alive_cadence() {
        let mut sub = test_subscription(3, 100);
        let now = Instant::now();

        // Two idle cycles count down, the third emits a keep-alive.
        assert!(matches!(sub.tick(now, true), TickResult::None));
        assert!(matches!(sub.tick(now, true), TickResult::None));
        let TickResult::KeepAlive(msg) = sub.tick(now, true) else {
            panic!("expected keep alive");
        };
        assert_eq!(msg.sequence_number, 1);
        assert!(msg.is_keep_alive());

        // Counter reset, the cadence repeats.
        assert!(matches!(sub.tick(now, true), TickResult::None));
    }

    #[tokio::test(start_paused = true)]
    async fn lifetime_expiry() {
        let mut sub = test_subscription(100, 3);
        let now = Instant::now();
        assert!(matches!(sub.tick(now, false), TickResult::None));
        assert!(matches!(sub.tick(now, false), TickResult::None));
        assert!(matches!(sub.tick(now, false), TickResult::Expired));
    }

    #[tokio::test(start_paused = true)]
    async fn acknowledge_drops_retention() {
        let mut sub = test_subscription(10, 100);
        // Retain a message by hand.
        sub.retain(uaserve_types::NotificationMessage {
            sequence_number: 1,
            publish_time: uaserve_types::DateTime::now(),
            notification_data: Some(vec![Default::default()]),
        });
        assert!(sub.republish(1).is_ok());
        assert_eq!(sub.acknowledge(1), StatusCode::Good);
        assert_eq!(
            sub.republish(1).unwrap_err(),
            StatusCode::BadMessageNotAvailable
        );
        assert_eq!(sub.acknowledge(1), StatusCode::BadSequenceNumberUnknown);
    }
}
