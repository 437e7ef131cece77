//! # Tramway Core
//!
//! Core types for the control core of a reversible two-cabin aerial tramway.
//! Provides the shared cable and its invariants, passenger sets, the graded
//! fault model and the notification hub tying the periodic tasks together.

pub mod constants;
pub mod core;
pub mod data;
pub mod error;
pub mod event_bus;
pub mod fault;
pub mod types;
pub mod units;

pub use core::{dispatch_lifecycle, AdmissionCheck, AdmitAll, CabinListener};

pub use data::{
    CabinId, CabinPhase, CableLimits, CableLine, CableSnapshot, DoorSide, DoorState, Occupancy,
    Person, PersonId, StationPosition,
};

pub use error::{Error, FaultResult, Result};

pub use fault::{Fault, FaultKind, Severity};

// Re-export the hub for convenience
pub use event_bus::{
    Channel, EventFilter, FaultEvent, FaultSource, HubConfig, LifecycleEvent, LifecycleKind,
    Notification, NotificationHub, SubscriptionId,
};

pub use types::{thread_safe, SharedCable, SharedHub, ThreadSafe};
