//! Notification type definitions for the hub.
//!
//! Two disjoint channels travel through the hub: lifecycle events emitted by
//! cabins, and faults raised by any periodic task. Notifications are
//! cloneable and serializable for logging/replay.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::data::{CabinId, StationPosition};
use crate::fault::{Fault, Severity};

/// Root notification enum
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Notification {
    /// Cabin lifecycle event
    Lifecycle(LifecycleEvent),
    /// Fault report
    Fault(FaultEvent),
}

impl Notification {
    /// Get the channel of this notification
    pub fn channel(&self) -> Channel {
        match self {
            Notification::Lifecycle(_) => Channel::Lifecycle,
            Notification::Fault(_) => Channel::Fault,
        }
    }

    /// Get a short description of this notification for logging
    pub fn description(&self) -> String {
        match self {
            Notification::Lifecycle(e) => e.description(),
            Notification::Fault(e) => e.description(),
        }
    }
}

/// Notification channel, used for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    /// Ready / Moved / Arrived
    Lifecycle,
    /// Faults with severity and message
    Fault,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Lifecycle => write!(f, "Lifecycle"),
            Channel::Fault => write!(f, "Fault"),
        }
    }
}

/// Kind of lifecycle event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleKind {
    /// Cabin armed and primed for departure
    Ready,
    /// Cable position changed since the previous tick
    Moved,
    /// Cable position reached one of the terminals
    Arrived,
}

impl fmt::Display for LifecycleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleKind::Ready => write!(f, "Ready"),
            LifecycleKind::Moved => write!(f, "Moved"),
            LifecycleKind::Arrived => write!(f, "Arrived"),
        }
    }
}

/// Lifecycle event emitted by a cabin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    /// What happened
    pub kind: LifecycleKind,
    /// Originating cabin
    pub cabin: CabinId,
    /// Cable position observed when the event was emitted
    pub position: f64,
}

impl LifecycleEvent {
    /// Create a lifecycle event
    pub fn new(kind: LifecycleKind, cabin: CabinId, position: f64) -> Self {
        Self {
            kind,
            cabin,
            position,
        }
    }

    fn description(&self) -> String {
        format!("{} {} at {:.2} m", self.cabin, self.kind, self.position)
    }
}

/// Where a fault was detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaultSource {
    /// A cabin's own self-check loop
    Cabin(CabinId),
    /// The shared cable
    Cable,
    /// A platform serving `cabin` at `station`
    Platform {
        /// Station the platform belongs to
        station: StationPosition,
        /// Cabin the platform serves
        cabin: CabinId,
    },
    /// A station outside of its platforms
    Station(StationPosition),
    /// The safety supervisor
    Supervisor,
}

impl fmt::Display for FaultSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultSource::Cabin(id) => write!(f, "{}", id),
            FaultSource::Cable => write!(f, "cable"),
            FaultSource::Platform { station, cabin } => {
                write!(f, "{} station platform for {}", station, cabin)
            }
            FaultSource::Station(station) => write!(f, "{} station", station),
            FaultSource::Supervisor => write!(f, "supervisor"),
        }
    }
}

/// Fault report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultEvent {
    /// The fault
    pub fault: Fault,
    /// Where it was detected
    pub source: FaultSource,
    /// When it was raised
    pub raised_at: DateTime<Utc>,
}

impl FaultEvent {
    /// Create a fault report stamped with the current time
    pub fn new(fault: Fault, source: FaultSource) -> Self {
        Self {
            fault,
            source,
            raised_at: Utc::now(),
        }
    }

    /// Severity of the reported fault
    pub fn severity(&self) -> Severity {
        self.fault.severity
    }

    fn description(&self) -> String {
        format!("{}: {}", self.source, self.fault)
    }
}
