//! Data models shared by the cabins, platforms and supervisor
//!
//! This module provides:
//! - The shared cable ([`CableLine`]) and its consistent snapshots
//! - Passengers and bounded passenger sets
//! - Door, station and cabin identifiers

pub mod cable;
pub mod occupancy;

pub use cable::{CableLimits, CableLine, CableSnapshot};
pub use occupancy::{Occupancy, Person, PersonId};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// Which of the two doors of a cabin or platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DoorSide {
    /// Loading side, towards the waiting area
    Internal,
    /// Unloading side, towards the exit
    External,
}

impl fmt::Display for DoorSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DoorSide::Internal => write!(f, "internal"),
            DoorSide::External => write!(f, "external"),
        }
    }
}

/// Open/closed state of a pair of doors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DoorState {
    /// Internal (loading) door is open
    pub internal_open: bool,
    /// External (unloading) door is open
    pub external_open: bool,
}

impl DoorState {
    /// Whether the given door is open
    pub fn is_open(&self, side: DoorSide) -> bool {
        match side {
            DoorSide::Internal => self.internal_open,
            DoorSide::External => self.external_open,
        }
    }

    /// Open or close one door
    pub fn set(&mut self, side: DoorSide, open: bool) {
        match side {
            DoorSide::Internal => self.internal_open = open,
            DoorSide::External => self.external_open = open,
        }
    }

    /// Whether either door is open
    pub fn any_open(&self) -> bool {
        self.internal_open || self.external_open
    }

    /// Close both doors
    pub fn close_all(&mut self) {
        self.internal_open = false;
        self.external_open = false;
    }
}

/// Which end of the line a station sits at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StationPosition {
    /// Valley station
    Lower,
    /// Mountain station
    Upper,
}

impl fmt::Display for StationPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StationPosition::Lower => write!(f, "lower"),
            StationPosition::Upper => write!(f, "upper"),
        }
    }
}

/// Process-unique cabin identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CabinId(pub u32);

static NEXT_CABIN_ID: AtomicU32 = AtomicU32::new(0);

impl CabinId {
    /// Allocate the next identifier
    pub fn next() -> Self {
        Self(NEXT_CABIN_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for CabinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cabin-{}", self.0)
    }
}

/// Cabin state machine phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CabinPhase {
    /// Cable stopped, cabin not armed
    StoppedNotReady,
    /// Cable stopped, cabin armed since the last standstill
    StoppedReady,
    /// Cable moving
    Moving,
}

impl fmt::Display for CabinPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CabinPhase::StoppedNotReady => write!(f, "Stopped (not ready)"),
            CabinPhase::StoppedReady => write!(f, "Stopped (ready)"),
            CabinPhase::Moving => write!(f, "Moving"),
        }
    }
}
