//! Station platform and the arrival/departure protocol
//!
//! A platform serves one cabin at one station. It opens its doors only while
//! its cabin is docked and not armed, and it runs the unload/reload sequence
//! when its cabin arrives. Lock order is platform state, then cabin state,
//! then the cable.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use tramway_core::constants::{DEFAULT_CLOSE_HOLD_MS, DEFAULT_LOAD_HOLD_MS, DEFAULT_UNLOAD_WINDOW_MS};
use tramway_core::{
    dispatch_lifecycle, CabinListener, DoorSide, DoorState, Fault, FaultResult, FaultSource,
    LifecycleEvent, LifecycleKind, Person, Severity, SharedHub, StationPosition, ThreadSafe,
};

use super::StationQueues;
use crate::cabin::Cabin;
use crate::task::TaskHandle;

/// Dwell timers of the arrival sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformTiming {
    /// Time passengers get to leave through the external door
    pub unload_window: Duration,
    /// Hold after opening the internal door
    pub load_hold: Duration,
    /// Hold after closing the external door
    pub close_hold: Duration,
}

impl Default for PlatformTiming {
    fn default() -> Self {
        Self {
            unload_window: Duration::from_millis(DEFAULT_UNLOAD_WINDOW_MS),
            load_hold: Duration::from_millis(DEFAULT_LOAD_HOLD_MS),
            close_hold: Duration::from_millis(DEFAULT_CLOSE_HOLD_MS),
        }
    }
}

/// Door and readiness state of a platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlatformStatus {
    pub doors: DoorState,
    pub cabin_ready: bool,
}

/// One platform of a station
pub struct Platform {
    station: StationPosition,
    dock_position: f64,
    cabin: Arc<Cabin>,
    queues: ThreadSafe<StationQueues>,
    hub: SharedHub,
    timing: PlatformTiming,
    state: Mutex<PlatformStatus>,
    sequence: tokio::sync::Mutex<()>,
}

impl Platform {
    /// Create a platform docking `cabin` at `dock_position`
    ///
    /// A platform whose cabin is elsewhere at construction starts ready,
    /// since the cabin is presumed sealed at the opposite terminal.
    pub fn new(
        station: StationPosition,
        cabin: Arc<Cabin>,
        dock_position: f64,
        queues: ThreadSafe<StationQueues>,
        hub: SharedHub,
        timing: PlatformTiming,
    ) -> Self {
        let docked = cabin.cable().position() == dock_position;
        Self {
            station,
            dock_position,
            cabin,
            queues,
            hub,
            timing,
            state: Mutex::new(PlatformStatus {
                doors: DoorState::default(),
                cabin_ready: !docked,
            }),
            sequence: tokio::sync::Mutex::new(()),
        }
    }

    pub fn station(&self) -> StationPosition {
        self.station
    }

    /// Cable position at which the cabin is at this platform
    pub fn dock_position(&self) -> f64 {
        self.dock_position
    }

    pub fn cabin(&self) -> &Arc<Cabin> {
        &self.cabin
    }

    pub fn timing(&self) -> PlatformTiming {
        self.timing
    }

    /// Current doors and readiness
    pub fn status(&self) -> PlatformStatus {
        *self.state.lock()
    }

    pub fn is_ready(&self) -> bool {
        self.state.lock().cabin_ready
    }

    /// Whether an arrival sequence is in progress
    pub fn is_sequence_running(&self) -> bool {
        self.sequence.try_lock().is_err()
    }

    /// Whether the cabin is docked here and stationary
    pub fn is_cabin_here(&self) -> bool {
        self.cabin
            .cable()
            .read(|snapshot| snapshot.position == self.dock_position && !snapshot.is_moving())
    }

    /// Source tag used for faults raised by this platform
    pub fn fault_source(&self) -> FaultSource {
        FaultSource::Platform {
            station: self.station,
            cabin: self.cabin.id(),
        }
    }

    /// Open a platform door
    ///
    /// Dock position and readiness are validated atomically with the change.
    /// A refused open leaves that door closed.
    pub fn open_door(&self, side: DoorSide) -> FaultResult<()> {
        let mut state = self.state.lock();
        state.doors.set(side, false);

        let cabin_ready = state.cabin_ready;
        self.cabin.cable().read(|snapshot| {
            if snapshot.position != self.dock_position {
                return Err(Fault::platform(
                    Severity::Danger,
                    format!(
                        "Cable wrong position, can't open {} door ({:.2} m, dock at {:.2} m)",
                        side, snapshot.position, self.dock_position
                    ),
                ));
            }
            if cabin_ready {
                return Err(Fault::platform(
                    Severity::Danger,
                    format!("Cabin ready to move, can't open {} door", side),
                ));
            }
            Ok(())
        })?;

        state.doors.set(side, true);
        Ok(())
    }

    pub fn close_door(&self, side: DoorSide) {
        self.state.lock().doors.set(side, false);
    }

    /// Mark the platform ready (closing both doors) or not ready
    pub fn set_ready(&self, ready: bool) {
        let mut state = self.state.lock();
        if ready {
            state.doors.close_all();
        }
        state.cabin_ready = ready;
    }

    /// While the cabin is away, doors must be closed and the platform ready
    pub fn check(&self) -> FaultResult<()> {
        let state = self.state.lock();
        let away = self
            .cabin
            .cable()
            .read(|snapshot| snapshot.position != self.dock_position);
        if !away {
            return Ok(());
        }
        if state.doors.any_open() {
            return Err(Fault::platform(
                Severity::Fatal,
                "Door open while the cabin is away",
            ));
        }
        if !state.cabin_ready {
            return Err(Fault::platform(
                Severity::Fatal,
                "Cabin not ready and away from the platform",
            ));
        }
        Ok(())
    }

    /// Unload the arrived cabin and load the waiting group
    ///
    /// Runs to completion; a second call while one is running is rejected.
    pub async fn run_arrival_sequence(&self) -> FaultResult<()> {
        let _sequence = self.sequence.try_lock().map_err(|_| {
            Fault::platform(Severity::Danger, "Arrival sequence already running")
        })?;
        tracing::info!(
            "{} station: arrival sequence for {} started",
            self.station,
            self.cabin.id()
        );

        self.set_ready(false);
        self.cabin.set_ready(false)?;

        self.open_door(DoorSide::External)?;
        self.cabin.open_door(DoorSide::External);
        tokio::time::sleep(self.timing.unload_window).await;

        self.open_door(DoorSide::Internal)?;
        self.cabin.open_door(DoorSide::Internal);
        tokio::time::sleep(self.timing.load_hold).await;

        self.close_door(DoorSide::External);
        self.cabin.close_door(DoorSide::External);
        tokio::time::sleep(self.timing.close_hold).await;

        self.transfer_passengers();
        tracing::info!(
            "{} station: arrival sequence for {} finished",
            self.station,
            self.cabin.id()
        );
        Ok(())
    }

    fn transfer_passengers(&self) {
        let leaving = self.cabin.empty_people();
        let unloaded = leaving.len();
        let boarding = {
            let mut queues = self.queues.lock();
            queues.general.extend(leaving);
            queues.ready.drain()
        };

        // Boarding stops at the first refusal; the rest of the group waits
        let mut refusal = None;
        let mut left_behind: Vec<Person> = Vec::new();
        for person in boarding {
            if refusal.is_none() {
                match self.cabin.add_passenger(person.clone()) {
                    Ok(()) => continue,
                    Err(fault) => refusal = Some(fault),
                }
            }
            left_behind.push(person);
        }
        let boarded = self.cabin.passenger_count();

        {
            let mut queues = self.queues.lock();
            let overflow = queues.requeue_front(left_behind);
            if overflow > 0 {
                tracing::warn!(
                    "{} station: {} people moved to the general queue, no room to wait",
                    self.station,
                    overflow
                );
            }
            queues.refill_ready();
        }
        tracing::debug!(
            "{} station: {} off, {} on {}",
            self.station,
            unloaded,
            boarded,
            self.cabin.id()
        );

        if let Some(fault) = refusal {
            self.hub.publish_fault(fault, self.fault_source());
        }
    }

    /// Seal the platform for departure, mirroring the armed cabin
    pub fn prepare_departure(&self) {
        self.cabin.close_door(DoorSide::External);
        self.close_door(DoorSide::External);
        self.cabin.close_door(DoorSide::Internal);
        self.close_door(DoorSide::Internal);
        self.set_ready(true);
    }

    /// Spawn the task reacting to this platform's cabin events
    ///
    /// Events are forwarded from the hub over a channel and handled one at
    /// a time, so arrival sequences for this platform never overlap.
    pub fn start(self: &Arc<Self>) -> TaskHandle {
        let (tx, mut rx) = mpsc::unbounded_channel::<LifecycleEvent>();
        let cabin_id = self.cabin.id();
        let subscription = self.hub.subscribe_lifecycle(move |event| {
            if event.cabin == cabin_id && event.kind != LifecycleKind::Moved {
                // Receiver gone means the task has stopped
                let _ = tx.send(*event);
            }
        });

        let platform = Arc::clone(self);
        let name = format!("{} platform for {}", self.station, cabin_id);
        TaskHandle::spawn(name, move |mut stop| async move {
            while !stop.is_stopped() {
                let event = tokio::select! {
                    event = rx.recv() => event,
                    _ = stop.stopped() => None,
                };
                let Some(event) = event else { break };
                dispatch_lifecycle(&*platform, &event).await;
            }
            platform.hub.unsubscribe(subscription);
        })
    }
}

#[async_trait]
impl CabinListener for Platform {
    async fn on_ready(&self, event: &LifecycleEvent) {
        if event.cabin == self.cabin.id() {
            self.prepare_departure();
        }
    }

    async fn on_arrived(&self, event: &LifecycleEvent) {
        if event.cabin != self.cabin.id() || event.position != self.dock_position {
            return;
        }
        if let Err(fault) = self.run_arrival_sequence().await {
            self.hub.publish_fault(fault, self.fault_source());
        }
    }
}

impl std::fmt::Debug for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Platform")
            .field("station", &self.station)
            .field("cabin", &self.cabin.id())
            .field("dock_position", &self.dock_position)
            .field("status", &self.status())
            .finish()
    }
}
