//! Cabin safety state machine
//!
//! A cabin hangs on the shared cable and owns its weight, its two doors, its
//! passengers and an armed flag. The derived phase is computed from one
//! cable snapshot:
//!
//! - `StoppedNotReady -> StoppedReady` through [`Cabin::set_ready`]
//! - `StoppedReady -> Moving` when the cable leaves zero speed
//! - `Moving -> StoppedNotReady` when the cable stops again; the cabin must re-arm
//!
//! Lock order is cabin state first, cable second. Notifications are always
//! published after both locks are released.

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use tramway_core::constants::{
    DEFAULT_CABIN_CAPACITY, DEFAULT_CABIN_TICK_MS, DEFAULT_DOOR_PAUSE_MS, DEFAULT_MAX_WEIGHT,
    DEFAULT_TARE_WEIGHT,
};
use tramway_core::fault::{arming_severity, door_severity, weight_severity};
use tramway_core::{
    CabinId, CabinPhase, CableSnapshot, DoorSide, DoorState, Fault, FaultResult,
    FaultSource, LifecycleKind, Occupancy, Person, PersonId, Severity, SharedCable, SharedHub,
};

use crate::task::{tick_interval, TaskHandle};

/// Cabin parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CabinConfig {
    /// Exclusive upper bound of a valid weight, kg
    pub max_weight: f64,
    /// Weight of the empty cabin, kg
    pub tare_weight: f64,
    /// Maximum number of passengers
    pub capacity: usize,
    /// Self-check period
    pub tick: Duration,
    /// Pause between door operations in start/stop sequences
    pub door_pause: Duration,
}

impl Default for CabinConfig {
    fn default() -> Self {
        Self {
            max_weight: DEFAULT_MAX_WEIGHT,
            tare_weight: DEFAULT_TARE_WEIGHT,
            capacity: DEFAULT_CABIN_CAPACITY,
            tick: Duration::from_millis(DEFAULT_CABIN_TICK_MS),
            door_pause: Duration::from_millis(DEFAULT_DOOR_PAUSE_MS),
        }
    }
}

impl CabinConfig {
    /// Reject parameters no cabin could be built with
    pub fn validate(&self) -> FaultResult<()> {
        if !(self.max_weight.is_finite() && self.max_weight > 0.0) {
            return Err(Fault::config(format!(
                "Maximum cabin weight must be positive, got {}",
                self.max_weight
            )));
        }
        if !(self.tare_weight > 0.0 && self.tare_weight < self.max_weight) {
            return Err(Fault::config(format!(
                "Tare weight must be in (0, {}), got {}",
                self.max_weight, self.tare_weight
            )));
        }
        if self.tick.is_zero() {
            return Err(Fault::config("Cabin tick must be positive"));
        }
        Ok(())
    }
}

/// Point-in-time view of a cabin for presentation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CabinStatus {
    pub id: CabinId,
    pub phase: CabinPhase,
    pub weight: f64,
    pub doors: DoorState,
    pub passengers: usize,
    pub position: f64,
}

#[derive(Debug)]
struct CabinState {
    weight: f64,
    doors: DoorState,
    ready: bool,
    armed_epoch: u64,
    occupancy: Occupancy,
}

/// One of the two cabins of a tramway
#[derive(Debug)]
pub struct Cabin {
    id: CabinId,
    cable: SharedCable,
    hub: SharedHub,
    config: CabinConfig,
    state: Mutex<CabinState>,
}

impl Cabin {
    /// Mount a new, empty cabin on `cable`
    ///
    /// Fails with a configuration fault if the parameters are unusable,
    /// including a zero passenger capacity.
    pub fn new(cable: SharedCable, hub: SharedHub, config: CabinConfig) -> FaultResult<Self> {
        config.validate()?;
        let occupancy = Occupancy::new(config.capacity)?;
        let id = CabinId::next();
        tracing::debug!("{} mounted on cable of {:.0} m", id, cable.length());

        Ok(Self {
            id,
            cable,
            hub,
            config,
            state: Mutex::new(CabinState {
                weight: config.tare_weight,
                doors: DoorState::default(),
                ready: false,
                armed_epoch: 0,
                occupancy,
            }),
        })
    }

    pub fn id(&self) -> CabinId {
        self.id
    }

    /// The cable this cabin is mounted on
    pub fn cable(&self) -> &SharedCable {
        &self.cable
    }

    pub fn config(&self) -> &CabinConfig {
        &self.config
    }

    /// Current weight reading, kg
    pub fn weight(&self) -> f64 {
        self.state.lock().weight
    }

    /// Current door state
    pub fn doors(&self) -> DoorState {
        self.state.lock().doors
    }

    /// Passengers on board, in boarding order
    pub fn passengers(&self) -> Vec<Person> {
        self.state.lock().occupancy.people().to_vec()
    }

    /// Number of passengers on board
    pub fn passenger_count(&self) -> usize {
        self.state.lock().occupancy.len()
    }

    /// Set the weight; fails unless `0 < weight < max_weight`
    pub fn set_weight(&self, weight: f64) -> FaultResult<()> {
        let mut state = self.state.lock();
        self.validate_weight(weight)?;
        state.weight = weight;
        Ok(())
    }

    /// Add `delta` to the weight
    pub fn increment_weight(&self, delta: f64) -> FaultResult<()> {
        let mut state = self.state.lock();
        let weight = state.weight + delta;
        self.validate_weight(weight)?;
        state.weight = weight;
        Ok(())
    }

    /// Subtract `delta` from the weight
    pub fn decrement_weight(&self, delta: f64) -> FaultResult<()> {
        let mut state = self.state.lock();
        let weight = state.weight - delta;
        self.validate_weight(weight)?;
        state.weight = weight;
        Ok(())
    }

    fn validate_weight(&self, weight: f64) -> FaultResult<()> {
        if weight > 0.0 && weight < self.config.max_weight {
            Ok(())
        } else {
            Err(Fault::weight(weight, self.config.max_weight))
        }
    }

    /// Board a passenger
    ///
    /// Capacity and resulting weight are validated together; on failure
    /// neither the passengers nor the weight change.
    pub fn add_passenger(&self, person: Person) -> FaultResult<()> {
        let mut state = self.state.lock();
        state.occupancy.ensure_room()?;
        let weight = state.weight + person.weight;
        self.validate_weight(weight)?;
        state.occupancy.add(person)?;
        state.weight = weight;
        Ok(())
    }

    /// Take one passenger off; returns `None` if they were not on board
    pub fn remove_passenger(&self, id: PersonId) -> Option<Person> {
        let mut state = self.state.lock();
        let person = state.occupancy.remove(id)?;
        state.weight -= person.weight;
        Some(person)
    }

    /// Take every passenger off, in boarding order
    pub fn empty_people(&self) -> Vec<Person> {
        let mut state = self.state.lock();
        let people = state.occupancy.drain();
        let total: f64 = people.iter().map(|p| p.weight).sum();
        state.weight -= total;
        people
    }

    /// Open a door
    ///
    /// Refused without error unless the cabin is `StoppedNotReady`; a stale
    /// arm from before the last motion does not block it. The returned state
    /// tells the caller what actually happened.
    pub fn open_door(&self, side: DoorSide) -> DoorState {
        let mut state = self.state.lock();
        let phase = self.cable.read(|snapshot| phase_of(&state, snapshot));
        if phase != CabinPhase::StoppedNotReady {
            tracing::debug!("{} refused to open {} door", self.id, side);
        } else {
            state.doors.set(side, true);
        }
        state.doors
    }

    /// Close a door
    pub fn close_door(&self, side: DoorSide) -> DoorState {
        let mut state = self.state.lock();
        state.doors.set(side, false);
        state.doors
    }

    /// Arm or disarm the cabin
    ///
    /// Arming runs the full self-check first and requires closed doors and a
    /// stationary cable. A successful arm publishes a `Ready` event.
    /// Disarming always succeeds.
    pub fn set_ready(&self, ready: bool) -> FaultResult<()> {
        if !ready {
            self.state.lock().ready = false;
            return Ok(());
        }

        let position = {
            let mut state = self.state.lock();
            let (epoch, position) = self.cable.read(|snapshot| -> FaultResult<(u64, f64)> {
                self.check_state(&state, snapshot)?;
                if arming_severity(state.doors, snapshot.speed) != Severity::Ok {
                    return Err(Fault::arming(state.doors, snapshot.speed));
                }
                Ok((snapshot.motion_epoch, snapshot.position))
            })?;
            state.ready = true;
            state.armed_epoch = epoch;
            position
        };

        tracing::debug!("{} armed at {:.2} m", self.id, position);
        self.hub
            .publish_lifecycle(LifecycleKind::Ready, self.id, position);
        Ok(())
    }

    /// Armed since the last standstill and the cable is not moving
    pub fn is_ready(&self) -> bool {
        self.phase() == CabinPhase::StoppedReady
    }

    /// Current state machine phase
    pub fn phase(&self) -> CabinPhase {
        let state = self.state.lock();
        self.cable.read(|snapshot| phase_of(&state, snapshot))
    }

    /// Snapshot for presentation
    pub fn status(&self) -> CabinStatus {
        let state = self.state.lock();
        let snapshot = self.cable.snapshot();
        let phase = phase_of(&state, &snapshot);
        CabinStatus {
            id: self.id,
            phase,
            weight: state.weight,
            doors: state.doors,
            passengers: state.occupancy.len(),
            position: snapshot.position,
        }
    }

    /// Full self-check: weight, then doors, then the cable
    pub fn check(&self) -> FaultResult<()> {
        let state = self.state.lock();
        self.cable.read(|snapshot| self.check_state(&state, snapshot))
    }

    fn check_state(&self, state: &CabinState, snapshot: &CableSnapshot) -> FaultResult<()> {
        if weight_severity(state.weight, self.config.max_weight) != Severity::Ok {
            return Err(Fault::weight(state.weight, self.config.max_weight));
        }
        if door_severity(state.doors, snapshot.speed) != Severity::Ok {
            return Err(Fault::door(state.doors, snapshot.speed));
        }
        snapshot.check()
    }

    /// Close both doors with short pauses, then arm
    pub async fn start_cabin(&self) -> FaultResult<()> {
        self.close_door(DoorSide::Internal);
        tokio::time::sleep(self.config.door_pause).await;
        self.close_door(DoorSide::External);
        tokio::time::sleep(self.config.door_pause).await;
        self.set_ready(true)
    }

    /// Close both doors with short pauses, then disarm
    pub async fn stop_cabin(&self) {
        self.close_door(DoorSide::Internal);
        tokio::time::sleep(self.config.door_pause).await;
        self.close_door(DoorSide::External);
        tokio::time::sleep(self.config.door_pause).await;
        // Disarming cannot fail
        let _ = self.set_ready(false);
    }

    /// One iteration of the self-check loop
    ///
    /// Publishes `Moved` (and `Arrived` at a terminal) when the position
    /// differs from `last_position`, then runs the self-check and publishes
    /// any failure. Returns the position observed this tick.
    pub fn observe(&self, last_position: f64) -> f64 {
        let snapshot = self.cable.snapshot();
        if snapshot.position != last_position {
            self.hub
                .publish_lifecycle(LifecycleKind::Moved, self.id, snapshot.position);
            if snapshot.is_at_terminal() {
                tracing::info!("{} arrived at {:.0} m", self.id, snapshot.position);
                self.hub
                    .publish_lifecycle(LifecycleKind::Arrived, self.id, snapshot.position);
            }
        }

        if let Err(fault) = self.check() {
            self.hub.publish_fault(fault, FaultSource::Cabin(self.id));
        }
        snapshot.position
    }

    /// Spawn the periodic self-check task
    ///
    /// The task keeps running after reporting a fault, fatal or not.
    pub fn start(self: &Arc<Self>) -> TaskHandle {
        let cabin = Arc::clone(self);
        TaskHandle::spawn(format!("{} self-check", self.id), move |mut stop| async move {
            let mut interval = tick_interval(cabin.config.tick);
            let mut last_position = cabin.cable.position();
            while stop.tick(&mut interval).await {
                last_position = cabin.observe(last_position);
            }
        })
    }
}

fn phase_of(state: &CabinState, snapshot: &CableSnapshot) -> CabinPhase {
    if snapshot.is_moving() {
        CabinPhase::Moving
    } else if state.ready && snapshot.motion_epoch == state.armed_epoch {
        CabinPhase::StoppedReady
    } else {
        CabinPhase::StoppedNotReady
    }
}
