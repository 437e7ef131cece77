//! Cabin listener interface
//!
//! Defines the listener trait for cabin lifecycle events

use async_trait::async_trait;

use crate::event_bus::{LifecycleEvent, LifecycleKind};

/// Listener trait for cabin lifecycle events
///
/// Implement this trait to react to one cabin's events from a dedicated task.
/// Callbacks may await; they run one at a time, in publication order.
#[async_trait]
pub trait CabinListener: Send + Sync {
    /// Called when the cabin is armed for departure
    async fn on_ready(&self, _event: &LifecycleEvent) {}

    /// Called when the cable position changed
    async fn on_moved(&self, _event: &LifecycleEvent) {}

    /// Called when the cable reached a terminal
    async fn on_arrived(&self, _event: &LifecycleEvent) {}
}

/// Route an event to the matching listener callback
pub async fn dispatch_lifecycle(listener: &dyn CabinListener, event: &LifecycleEvent) {
    match event.kind {
        LifecycleKind::Ready => listener.on_ready(event).await,
        LifecycleKind::Moved => listener.on_moved(event).await,
        LifecycleKind::Arrived => listener.on_arrived(event).await,
    }
}
