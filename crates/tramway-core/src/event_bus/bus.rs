//! Notification hub implementation.
//!
//! Publishing is queue-and-drain: `publish` appends to a FIFO queue, and the
//! caller that finds no drain in progress delivers queued notifications one
//! at a time to a snapshot of the current subscribers, in registration
//! order. A notification published from inside a handler, or from another
//! thread while a drain runs, is queued behind the current one and delivered
//! by the same drain. Nothing is held locked while a handler runs, so
//! handlers may publish, subscribe or unsubscribe freely.

use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use uuid::Uuid;

use super::events::{
    Channel, FaultEvent, FaultSource, LifecycleEvent, LifecycleKind, Notification,
};
use crate::data::CabinId;
use crate::fault::{Fault, Severity};

/// Subscription handle for unsubscribing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    /// Create a new unique subscription ID
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sub({})", &self.0.to_string()[..8])
    }
}

/// Filter to receive only some notifications
#[derive(Debug, Clone, Default)]
pub enum EventFilter {
    /// Receive everything.
    #[default]
    All,
    /// Receive notifications on any of these channels.
    Channels(Vec<Channel>),
}

impl EventFilter {
    /// Check if a notification matches this filter
    pub fn matches(&self, notification: &Notification) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::Channels(channels) => channels.contains(&notification.channel()),
        }
    }
}

type Handler = Arc<dyn Fn(&Notification) + Send + Sync>;

/// Configuration for the hub
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Capacity of the broadcast channel for async receivers.
    pub channel_capacity: usize,
    /// Whether to keep notification history.
    pub enable_history: bool,
    /// Maximum number of notifications to retain in history.
    pub max_history_size: usize,
    /// How long to retain notifications in history.
    pub history_retention: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
            enable_history: false,
            max_history_size: 1000,
            history_retention: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Clone)]
struct TimestampedNotification {
    notification: Notification,
    timestamp: Instant,
}

#[derive(Default)]
struct Pending {
    queue: VecDeque<Notification>,
    draining: bool,
}

/// Clears the draining flag even if a handler panics mid-drain
struct DrainGuard<'a> {
    pending: &'a Mutex<Pending>,
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.pending.lock().draining = false;
    }
}

/// Fan-out of lifecycle events and faults to subscribers
pub struct NotificationHub {
    /// Broadcast sender for async receivers
    sender: broadcast::Sender<Notification>,
    /// Registered synchronous handlers, in registration order
    handlers: RwLock<Vec<(SubscriptionId, EventFilter, Handler)>>,
    /// Notifications waiting for delivery
    pending: Mutex<Pending>,
    /// Notification history (optional)
    history: RwLock<VecDeque<TimestampedNotification>>,
    /// Configuration
    config: HubConfig,
}

impl NotificationHub {
    /// Create a new hub with default configuration
    pub fn new() -> Self {
        Self::with_config(HubConfig::default())
    }

    /// Create a new hub with custom configuration
    pub fn with_config(config: HubConfig) -> Self {
        let (sender, _) = broadcast::channel(config.channel_capacity.max(1));
        Self {
            sender,
            handlers: RwLock::new(Vec::new()),
            pending: Mutex::new(Pending::default()),
            history: RwLock::new(VecDeque::new()),
            config,
        }
    }

    /// Publish a notification to all subscribers
    ///
    /// Delivery order is FIFO across all publishers. When another drain is in
    /// progress this returns as soon as the notification is queued.
    pub fn publish(&self, notification: Notification) {
        if self.config.enable_history {
            self.add_to_history(&notification);
        }

        {
            let mut pending = self.pending.lock();
            pending.queue.push_back(notification);
            if pending.draining {
                return;
            }
            pending.draining = true;
        }

        let guard = DrainGuard {
            pending: &self.pending,
        };
        loop {
            let next = {
                let mut pending = self.pending.lock();
                match pending.queue.pop_front() {
                    Some(next) => next,
                    None => {
                        pending.draining = false;
                        break;
                    }
                }
            };
            self.dispatch(next);
        }
        std::mem::forget(guard);
    }

    fn dispatch(&self, notification: Notification) {
        trace_notification(&notification);

        let handlers: Vec<Handler> = self
            .handlers
            .read()
            .iter()
            .filter(|(_, filter, _)| filter.matches(&notification))
            .map(|(_, _, handler)| handler.clone())
            .collect();

        for handler in handlers {
            handler(&notification);
        }

        // No receivers is fine; synchronous handlers have already run
        let _ = self.sender.send(notification);
    }

    /// Publish a lifecycle event
    pub fn publish_lifecycle(&self, kind: LifecycleKind, cabin: CabinId, position: f64) {
        self.publish(Notification::Lifecycle(LifecycleEvent::new(
            kind, cabin, position,
        )));
    }

    /// Publish a fault
    pub fn publish_fault(&self, fault: Fault, source: FaultSource) {
        self.publish(Notification::Fault(FaultEvent::new(fault, source)));
    }

    /// Subscribe with a synchronous handler
    ///
    /// The handler runs on whichever thread drains the queue, so it should
    /// return quickly.
    pub fn subscribe<F>(&self, filter: EventFilter, handler: F) -> SubscriptionId
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        let id = SubscriptionId::new();
        self.handlers.write().push((id, filter, Arc::new(handler)));
        tracing::debug!("Subscription {} added", id);
        id
    }

    /// Subscribe to lifecycle events only
    pub fn subscribe_lifecycle<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&LifecycleEvent) + Send + Sync + 'static,
    {
        self.subscribe(
            EventFilter::Channels(vec![Channel::Lifecycle]),
            move |notification| {
                if let Notification::Lifecycle(event) = notification {
                    handler(event);
                }
            },
        )
    }

    /// Subscribe to faults only
    pub fn subscribe_faults<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&FaultEvent) + Send + Sync + 'static,
    {
        self.subscribe(
            EventFilter::Channels(vec![Channel::Fault]),
            move |notification| {
                if let Notification::Fault(event) = notification {
                    handler(event);
                }
            },
        )
    }

    /// Get a receiver for async polling
    pub fn receiver(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// Unsubscribe
    ///
    /// Returns true if the subscription was found and removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.write();
        let before = handlers.len();
        handlers.retain(|(sub, _, _)| *sub != id);
        let removed = handlers.len() != before;
        if removed {
            tracing::debug!("Subscription {} removed", id);
        }
        removed
    }

    /// Get the number of active subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.handlers.read().len()
    }

    /// Get recent history (if enabled)
    ///
    /// Returns notifications since the given instant, or all history if None.
    pub fn history(&self, since: Option<Instant>) -> Vec<Notification> {
        if !self.config.enable_history {
            return Vec::new();
        }

        let history = self.history.read();
        match since {
            Some(since) => history
                .iter()
                .filter(|e| e.timestamp >= since)
                .map(|e| e.notification.clone())
                .collect(),
            None => history.iter().map(|e| e.notification.clone()).collect(),
        }
    }

    /// Clear history
    pub fn clear_history(&self) {
        self.history.write().clear();
    }

    /// Get the current configuration
    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Add a notification to history, maintaining size and age limits
    fn add_to_history(&self, notification: &Notification) {
        let mut history = self.history.write();
        let now = Instant::now();

        history.push_back(TimestampedNotification {
            notification: notification.clone(),
            timestamp: now,
        });

        let retention = self.config.history_retention;
        while history
            .front()
            .is_some_and(|e| now.duration_since(e.timestamp) > retention)
        {
            history.pop_front();
        }

        while history.len() > self.config.max_history_size {
            history.pop_front();
        }
    }
}

fn trace_notification(notification: &Notification) {
    match notification {
        Notification::Lifecycle(_) => tracing::debug!("{}", notification.description()),
        Notification::Fault(event) => match event.severity() {
            Severity::Fatal => tracing::error!("{}", notification.description()),
            Severity::Danger | Severity::Warning => {
                tracing::warn!("{}", notification.description())
            }
            Severity::Info | Severity::Ok => tracing::debug!("{}", notification.description()),
        },
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for NotificationHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationHub")
            .field("subscribers", &self.subscriber_count())
            .field("config", &self.config)
            .finish()
    }
}
