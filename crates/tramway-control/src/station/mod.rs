//! Terminal stations
//!
//! Each station owns two platforms, one per cabin, docked at opposite ends
//! of the cable so that one cabin is at the upper station exactly when the
//! other is at the lower station. The station also owns the passenger
//! queues its platforms load from and unload into.

mod platform;

pub use platform::{Platform, PlatformStatus, PlatformTiming};

use std::collections::VecDeque;
use std::sync::Arc;

use tramway_core::{
    thread_safe, AdmissionCheck, Fault, FaultResult, FaultSource, Occupancy, Person,
    SharedHub, StationPosition, ThreadSafe,
};

use crate::cabin::Cabin;
use crate::task::TaskHandle;

/// Passengers waiting at or leaving a station
#[derive(Debug, Clone)]
pub struct StationQueues {
    /// People who got off a cabin here
    pub general: Vec<Person>,
    /// Group boarding with the next departure
    pub ready: Occupancy,
    /// Secondary queue feeding the ready group
    pub incoming: Option<Occupancy>,
}

impl StationQueues {
    /// Create empty queues; the ready group holds one cabin load
    pub fn new(ready_capacity: usize, incoming_capacity: Option<usize>) -> FaultResult<Self> {
        Ok(Self {
            general: Vec::new(),
            ready: Occupancy::new(ready_capacity)?,
            incoming: incoming_capacity.map(Occupancy::new).transpose()?,
        })
    }

    /// Move people from the incoming queue into the ready group until it is full
    pub fn refill_ready(&mut self) {
        let Some(incoming) = self.incoming.as_mut() else {
            return;
        };
        let mut line: VecDeque<Person> = incoming.drain().into();
        self.ready.fill_from(&mut line);
        incoming.prepend_from(&mut line);
    }

    /// Put people who could not board back at the head of the line
    ///
    /// They take the ready group ahead of anyone admitted since it was
    /// drained. People pushed out of the ready group go to the front of the
    /// incoming queue, and whoever still does not fit joins the general
    /// queue. Nobody is dropped. Returns how many ended up in the general
    /// queue.
    pub fn requeue_front(&mut self, people: Vec<Person>) -> usize {
        let mut line: VecDeque<Person> = people.into();
        line.extend(self.ready.drain());
        self.ready.fill_from(&mut line);
        if let Some(incoming) = self.incoming.as_mut() {
            incoming.prepend_from(&mut line);
        }
        let overflow = line.len();
        self.general.extend(line);
        overflow
    }
}

/// Station parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StationConfig {
    /// Arrival sequence timers of both platforms
    pub timing: PlatformTiming,
    /// Capacity of the secondary incoming queue; `None` disables it
    pub incoming_capacity: Option<usize>,
}

/// A terminal station
#[derive(Debug)]
pub struct Station {
    position: StationPosition,
    platforms: [Arc<Platform>; 2],
    queues: ThreadSafe<StationQueues>,
}

impl Station {
    /// Build a station for two cabins on the same cable
    ///
    /// Fails with a configuration fault if both arguments are the same cabin
    /// or the cabins hang on different cables.
    pub fn new(
        position: StationPosition,
        cabin0: Arc<Cabin>,
        cabin1: Arc<Cabin>,
        hub: SharedHub,
        config: StationConfig,
    ) -> FaultResult<Self> {
        if Arc::ptr_eq(&cabin0, &cabin1) {
            return Err(Fault::config("Cabins can't be the same"));
        }
        if !Arc::ptr_eq(cabin0.cable(), cabin1.cable()) {
            return Err(Fault::config("Wrong cable connected to the cabins"));
        }

        let queues = thread_safe(StationQueues::new(
            cabin0.config().capacity,
            config.incoming_capacity,
        )?);

        let length = cabin0.cable().length();
        let (dock0, dock1) = match position {
            StationPosition::Upper => (length, 0.0),
            StationPosition::Lower => (0.0, length),
        };

        let platform = |cabin: Arc<Cabin>, dock: f64| {
            Arc::new(Platform::new(
                position,
                cabin,
                dock,
                queues.clone(),
                hub.clone(),
                config.timing,
            ))
        };
        let platforms = [platform(cabin0, dock0), platform(cabin1, dock1)];

        tracing::debug!(
            "{} station built, docks at {:.0} m and {:.0} m",
            position,
            dock0,
            dock1
        );
        Ok(Self {
            position,
            platforms,
            queues,
        })
    }

    pub fn position(&self) -> StationPosition {
        self.position
    }

    /// Both platforms, in cabin order
    pub fn platforms(&self) -> &[Arc<Platform>; 2] {
        &self.platforms
    }

    /// Platform serving `index` (0 or 1)
    pub fn platform(&self, index: usize) -> Option<&Arc<Platform>> {
        self.platforms.get(index)
    }

    /// Platform serving this cabin, if any
    pub fn platform_for(&self, cabin: &Arc<Cabin>) -> Option<&Arc<Platform>> {
        self.platforms
            .iter()
            .find(|platform| Arc::ptr_eq(platform.cabin(), cabin))
    }

    /// Let a person through the gate
    ///
    /// Admitted people join the incoming queue, or the ready group when the
    /// station has no incoming queue. Returns `Ok(false)` if the gate refuses
    /// them, and an occupancy fault if there is no room left.
    pub fn admit(&self, person: Person, gate: &dyn AdmissionCheck) -> FaultResult<bool> {
        if !gate.admits(&person) {
            tracing::debug!("{} station gate refused {}", self.position, person.name);
            return Ok(false);
        }
        let mut guard = self.queues.lock();
        let queues = &mut *guard;
        match queues.incoming.as_mut() {
            Some(incoming) => incoming.add(person)?,
            None => queues.ready.add(person)?,
        }
        queues.refill_ready();
        Ok(true)
    }

    /// People who got off here
    pub fn general_queue(&self) -> Vec<Person> {
        self.queues.lock().general.clone()
    }

    /// Take everyone out of the general queue
    pub fn take_general_queue(&self) -> Vec<Person> {
        std::mem::take(&mut self.queues.lock().general)
    }

    /// Group boarding with the next departure
    pub fn ready_people(&self) -> Vec<Person> {
        self.queues.lock().ready.people().to_vec()
    }

    /// People in the incoming queue; empty when the station has none
    pub fn incoming_people(&self) -> Vec<Person> {
        self.queues
            .lock()
            .incoming
            .as_ref()
            .map(|incoming| incoming.people().to_vec())
            .unwrap_or_default()
    }

    /// Run both platform checks; returns every failure with its source
    pub fn check(&self) -> Vec<(Fault, FaultSource)> {
        self.platforms
            .iter()
            .filter_map(|platform| {
                platform
                    .check()
                    .err()
                    .map(|fault| (fault, platform.fault_source()))
            })
            .collect()
    }

    /// Spawn both platform tasks
    pub fn start(&self) -> Vec<TaskHandle> {
        self.platforms.iter().map(|platform| platform.start()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cabin::CabinConfig;
    use tramway_core::{AdmitAll, CableLine, FaultKind, NotificationHub};

    fn cabins() -> (Arc<Cabin>, Arc<Cabin>, SharedHub) {
        let cable = Arc::new(CableLine::new(10_000.0).unwrap());
        let hub = Arc::new(NotificationHub::new());
        let make = || Arc::new(Cabin::new(cable.clone(), hub.clone(), CabinConfig::default()).unwrap());
        (make(), make(), hub)
    }

    #[test]
    fn test_dock_positions() {
        let (c0, c1, hub) = cabins();
        let upper = Station::new(
            StationPosition::Upper,
            c0.clone(),
            c1.clone(),
            hub.clone(),
            StationConfig::default(),
        )
        .unwrap();
        let lower =
            Station::new(StationPosition::Lower, c0.clone(), c1, hub, StationConfig::default())
                .unwrap();

        assert_eq!(upper.platforms()[0].dock_position(), 10_000.0);
        assert_eq!(upper.platforms()[1].dock_position(), 0.0);
        assert_eq!(lower.platforms()[0].dock_position(), 0.0);
        assert_eq!(lower.platforms()[1].dock_position(), 10_000.0);
        assert!(lower.platform_for(&c0).is_some());
        assert!(lower.platform(2).is_none());
    }

    #[test]
    fn test_same_cabin_rejected() {
        let (c0, _, hub) = cabins();
        let err = Station::new(
            StationPosition::Lower,
            c0.clone(),
            c0,
            hub,
            StationConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err.kind, FaultKind::Config);
        assert!(err.is_fatal());
    }

    #[test]
    fn test_admit_fills_ready_group_through_incoming() {
        let (c0, c1, hub) = cabins();
        let config = StationConfig {
            incoming_capacity: Some(100),
            ..StationConfig::default()
        };
        let station = Station::new(StationPosition::Lower, c0, c1, hub, config).unwrap();

        assert!(station.admit(Person::new("Anna", 60.0), &AdmitAll).unwrap());
        let refuse = |_: &Person| false;
        assert!(!station.admit(Person::new("Bruno", 80.0), &refuse).unwrap());

        assert_eq!(station.ready_people().len(), 1);
        assert!(station.incoming_people().is_empty());
    }

    fn names(people: &[Person]) -> Vec<&str> {
        people.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_requeue_front_displaces_later_arrivals() {
        let mut queues = StationQueues::new(2, Some(3)).unwrap();
        queues.ready.add(Person::new("Newcomer", 70.0)).unwrap();
        queues.ready.add(Person::new("Newcomer2", 70.0)).unwrap();
        if let Some(incoming) = queues.incoming.as_mut() {
            incoming.add(Person::new("Queued", 70.0)).unwrap();
        }

        let overflow =
            queues.requeue_front(vec![Person::new("Heavy", 7_000.0), Person::new("Light", 70.0)]);

        assert_eq!(overflow, 0);
        assert_eq!(names(queues.ready.people()), vec!["Heavy", "Light"]);
        let incoming = queues.incoming.as_ref().unwrap();
        assert_eq!(names(incoming.people()), vec!["Newcomer", "Newcomer2", "Queued"]);
    }

    #[test]
    fn test_requeue_front_overflows_into_general() {
        let mut queues = StationQueues::new(2, None).unwrap();
        queues.ready.add(Person::new("Newcomer", 70.0)).unwrap();
        queues.ready.add(Person::new("Newcomer2", 70.0)).unwrap();

        let overflow =
            queues.requeue_front(vec![Person::new("Heavy", 7_000.0), Person::new("Light", 70.0)]);

        assert_eq!(overflow, 2);
        assert_eq!(names(queues.ready.people()), vec!["Heavy", "Light"]);
        assert_eq!(names(&queues.general), vec!["Newcomer", "Newcomer2"]);
    }

    #[test]
    fn test_refill_stops_at_capacity() {
        let mut queues = StationQueues::new(2, Some(5)).unwrap();
        if let Some(incoming) = queues.incoming.as_mut() {
            for n in 0..4 {
                incoming.add(Person::new(format!("P{}", n), 70.0)).unwrap();
            }
        }
        queues.refill_ready();
        assert!(queues.ready.is_full());
        assert_eq!(queues.incoming.as_ref().map(|q| q.len()), Some(2));
    }
}
