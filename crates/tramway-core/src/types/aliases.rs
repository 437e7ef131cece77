//! Shared handles
//!
//! One cable and one hub serve every periodic task of a tramway, and the
//! passenger queues of a station are shared with its two platforms.
//!
//! ```rust,ignore
//! use tramway_core::types::*;
//!
//! let cable: SharedCable = Arc::new(CableLine::new(10_000.0)?);
//! let queue: ThreadSafe<Vec<Person>> = thread_safe(Vec::new());
//! ```

use parking_lot::Mutex;
use std::sync::Arc;

use crate::data::CableLine;
use crate::event_bus::NotificationHub;

/// The cable shared by both cabins, the stations and the supervisor.
pub type SharedCable = Arc<CableLine>;

/// The hub shared by every publisher and subscriber of one tramway.
pub type SharedHub = Arc<NotificationHub>;

/// Mutex-protected state shared across tasks; never hold the guard across an `.await`.
pub type ThreadSafe<T> = Arc<Mutex<T>>;

#[inline]
pub fn thread_safe<T>(value: T) -> ThreadSafe<T> {
    Arc::new(Mutex::new(value))
}
