//! Safety supervisor
//!
//! A background watcher over the whole tramway. Every tick it asserts the
//! wiring (two distinct cabins, both on the shared cable), runs each cabin's
//! self-check, the cable's own check and the platform checks of every
//! registered station. Failures are published through the hub; nothing is
//! returned to a caller and no emergency stop is triggered.

use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;

use tramway_core::constants::DEFAULT_SUPERVISOR_TICK_MS;
use tramway_core::{Fault, FaultSource, SharedCable, SharedHub};

use crate::cabin::Cabin;
use crate::station::Station;
use crate::task::{tick_interval, TaskHandle};

/// Supervisor parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorConfig {
    /// Check period
    pub tick: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(DEFAULT_SUPERVISOR_TICK_MS),
        }
    }
}

/// Periodic cross-component checker
#[derive(Debug)]
pub struct SafetySupervisor {
    cable: SharedCable,
    cabins: [Arc<Cabin>; 2],
    stations: RwLock<Vec<Arc<Station>>>,
    hub: SharedHub,
    config: SupervisorConfig,
}

impl SafetySupervisor {
    /// Watch `cabin0` and `cabin1` on `cable`
    ///
    /// Wiring is not validated here; miswired cabins are reported on every tick.
    pub fn new(
        cable: SharedCable,
        cabin0: Arc<Cabin>,
        cabin1: Arc<Cabin>,
        hub: SharedHub,
        config: SupervisorConfig,
    ) -> Self {
        Self {
            cable,
            cabins: [cabin0, cabin1],
            stations: RwLock::new(Vec::new()),
            hub,
            config,
        }
    }

    /// Include this station's platforms in every check
    pub fn add_station(&self, station: Arc<Station>) {
        self.stations.write().push(station);
    }

    pub fn station_count(&self) -> usize {
        self.stations.read().len()
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    /// Run every check once and collect the failures
    pub fn check_once(&self) -> Vec<(Fault, FaultSource)> {
        let mut faults = Vec::new();

        if Arc::ptr_eq(&self.cabins[0], &self.cabins[1]) {
            faults.push((
                Fault::config("Required two different cabins"),
                FaultSource::Supervisor,
            ));
        }
        for (index, cabin) in self.cabins.iter().enumerate() {
            if !Arc::ptr_eq(cabin.cable(), &self.cable) {
                faults.push((
                    Fault::config(format!("Cabin {} connected to wrong cable", index)),
                    FaultSource::Supervisor,
                ));
            }
        }

        for cabin in &self.cabins {
            if let Err(fault) = cabin.check() {
                faults.push((fault, FaultSource::Cabin(cabin.id())));
            }
        }
        if let Err(fault) = self.cable.check_invariants() {
            faults.push((fault, FaultSource::Cable));
        }

        let stations: Vec<Arc<Station>> = self.stations.read().clone();
        for station in stations {
            faults.extend(station.check());
        }
        faults
    }

    /// Run every check once and publish the failures; returns how many there were
    pub fn run_once(&self) -> usize {
        let faults = self.check_once();
        let count = faults.len();
        for (fault, source) in faults {
            self.hub.publish_fault(fault, source);
        }
        count
    }

    /// Spawn the periodic supervision task
    pub fn start(self: &Arc<Self>) -> TaskHandle {
        let supervisor = Arc::clone(self);
        TaskHandle::spawn("safety supervisor", move |mut stop| async move {
            let mut interval = tick_interval(supervisor.config.tick);
            while stop.tick(&mut interval).await {
                supervisor.run_once();
            }
        })
    }
}
