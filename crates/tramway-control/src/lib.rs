//! # Tramway Control
//!
//! The periodic units of a reversible two-cabin tramway: cabins running
//! their self-check loops, station platforms sequencing arrivals and
//! departures, and the safety supervisor. All of them share one cable and
//! one notification hub from `tramway-core`.

pub mod cabin;
pub mod station;
pub mod supervisor;
pub mod task;

pub use cabin::{Cabin, CabinConfig, CabinStatus};
pub use station::{Platform, PlatformStatus, PlatformTiming, Station, StationConfig, StationQueues};
pub use supervisor::{SafetySupervisor, SupervisorConfig};
pub use task::{StopSignal, TaskHandle};
