//! # Notification Hub
//!
//! Fan-out of cabin lifecycle events and faults to subscribers (platforms,
//! supervisors, presentation layers).
//!
//! ## Overview
//!
//! - Cabins publish `Ready`, `Moved` and `Arrived` on the lifecycle channel
//! - Any periodic task publishes faults on the fault channel
//! - Subscribers register synchronous callbacks per channel, or poll an
//!   async broadcast receiver
//! - Re-entrant publication from inside a callback is queued, never recursive
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tramway_core::event_bus::{NotificationHub, LifecycleKind};
//!
//! let hub = NotificationHub::new();
//! let sub = hub.subscribe_lifecycle(|event| {
//!     if event.kind == LifecycleKind::Arrived {
//!         println!("{} arrived at {}", event.cabin, event.position);
//!     }
//! });
//! hub.subscribe_faults(|report| eprintln!("{}", report.fault));
//!
//! hub.unsubscribe(sub);
//! ```

mod bus;
mod events;

pub use bus::*;
pub use events::*;
