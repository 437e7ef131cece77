//! End-to-end tests of the station handoff protocol

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use tramway_control::{
    Cabin, CabinConfig, PlatformTiming, SafetySupervisor, Station, StationConfig,
    SupervisorConfig, TaskHandle,
};
use tramway_core::{
    AdmitAll, CableLine, FaultEvent, LifecycleKind, NotificationHub, Person, SharedCable,
    SharedHub, StationPosition,
};

struct Rig {
    cable: SharedCable,
    hub: SharedHub,
    cabin0: Arc<Cabin>,
    cabin1: Arc<Cabin>,
    upper: Arc<Station>,
    lower: Arc<Station>,
    supervisor: Arc<SafetySupervisor>,
    faults: Arc<Mutex<Vec<FaultEvent>>>,
}

fn rig(incoming_capacity: Option<usize>) -> Rig {
    let cable: SharedCable = Arc::new(CableLine::new(10_000.0).unwrap());
    let hub: SharedHub = Arc::new(NotificationHub::new());
    let cabin_config = CabinConfig {
        tick: Duration::from_millis(5),
        door_pause: Duration::from_millis(1),
        ..CabinConfig::default()
    };
    let cabin0 = Arc::new(Cabin::new(cable.clone(), hub.clone(), cabin_config).unwrap());
    let cabin1 = Arc::new(Cabin::new(cable.clone(), hub.clone(), cabin_config).unwrap());

    let station_config = StationConfig {
        timing: PlatformTiming {
            unload_window: Duration::from_millis(20),
            load_hold: Duration::from_millis(5),
            close_hold: Duration::from_millis(1),
        },
        incoming_capacity,
    };
    let station = |position| {
        Arc::new(
            Station::new(
                position,
                cabin0.clone(),
                cabin1.clone(),
                hub.clone(),
                station_config,
            )
            .unwrap(),
        )
    };
    let upper = station(StationPosition::Upper);
    let lower = station(StationPosition::Lower);

    let supervisor = Arc::new(SafetySupervisor::new(
        cable.clone(),
        cabin0.clone(),
        cabin1.clone(),
        hub.clone(),
        SupervisorConfig::default(),
    ));
    supervisor.add_station(upper.clone());
    supervisor.add_station(lower.clone());

    let faults = Arc::new(Mutex::new(Vec::new()));
    {
        let faults = faults.clone();
        hub.subscribe_faults(move |event| faults.lock().push(event.clone()));
    }

    Rig {
        cable,
        hub,
        cabin0,
        cabin1,
        upper,
        lower,
        supervisor,
        faults,
    }
}

impl Rig {
    fn start(&self) -> Vec<TaskHandle> {
        let mut tasks = self.upper.start();
        tasks.extend(self.lower.start());
        tasks.push(self.cabin0.start());
        tasks.push(self.cabin1.start());
        tasks
    }
}

async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..400 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}

async fn stop_all(tasks: Vec<TaskHandle>) {
    for task in tasks {
        task.stop().await;
    }
}

#[tokio::test]
async fn test_arrival_at_upper_dock_ends_sealed_and_ready() {
    let rig = rig(None);
    let tasks = rig.start();

    rig.cabin0.start_cabin().await.unwrap();
    rig.cabin1.start_cabin().await.unwrap();
    assert!(rig.cabin0.is_ready() && rig.cabin1.is_ready());
    let all_ready = || {
        rig.upper.platforms().iter().all(|p| p.is_ready())
            && rig.lower.platforms().iter().all(|p| p.is_ready())
    };
    assert!(wait_until(all_ready).await);

    rig.cable.set_speed(5.0).unwrap();
    assert!(!rig.cabin0.is_ready());
    assert!(!rig.cabin1.is_ready());
    assert!(rig.supervisor.check_once().is_empty());

    rig.cable.set_speed(0.0).unwrap();
    rig.cable.set_position(10_000.0).unwrap();

    let platform = rig.upper.platform_for(&rig.cabin0).unwrap().clone();
    assert_eq!(platform.dock_position(), 10_000.0);
    let unloaded = wait_until(|| {
        let status = platform.status();
        status.doors.internal_open && !status.doors.external_open && !platform.is_sequence_running()
    })
    .await;
    assert!(unloaded);
    assert!(!platform.is_ready());
    assert!(!rig.cabin0.is_ready());

    rig.cabin0.start_cabin().await.unwrap();
    assert!(wait_until(|| platform.is_ready()).await);

    let status = platform.status();
    assert!(!status.doors.any_open());
    assert!(status.cabin_ready);
    assert!(!rig.cabin0.doors().any_open());

    stop_all(tasks).await;
    assert!(rig.faults.lock().is_empty(), "{:?}", rig.faults.lock());
}

#[tokio::test]
async fn test_passengers_swap_at_arrival() {
    let rig = rig(Some(10));
    let tasks = rig.start();

    rig.cabin0.add_passenger(Person::new("Going up", 80.0)).unwrap();
    assert!(rig.upper.admit(Person::new("Going down", 70.0), &AdmitAll).unwrap());
    assert_eq!(rig.upper.ready_people().len(), 1);

    rig.cable.set_position(10_000.0).unwrap();

    let platform = rig.upper.platform_for(&rig.cabin0).unwrap().clone();
    let done = wait_until(|| {
        platform.status().doors.internal_open && !platform.is_sequence_running()
    })
    .await;
    assert!(done);

    let general = rig.upper.general_queue();
    assert_eq!(general.len(), 1);
    assert_eq!(general[0].name, "Going up");

    let on_board = rig.cabin0.passengers();
    assert_eq!(on_board.len(), 1);
    assert_eq!(on_board[0].name, "Going down");
    assert_eq!(rig.cabin0.weight(), 500.0 + 70.0);
    assert!(rig.upper.ready_people().is_empty());

    stop_all(tasks).await;
}

#[tokio::test]
async fn test_repeated_arrivals_are_serialized() {
    let rig = rig(None);
    let tasks = rig.start();

    let platform = rig.lower.platform_for(&rig.cabin0).unwrap().clone();
    assert_eq!(platform.dock_position(), 0.0);

    rig.hub
        .publish_lifecycle(LifecycleKind::Arrived, rig.cabin0.id(), 0.0);
    rig.hub
        .publish_lifecycle(LifecycleKind::Arrived, rig.cabin0.id(), 0.0);

    assert!(wait_until(|| platform.is_sequence_running()).await);
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert!(wait_until(|| !platform.is_sequence_running()).await);

    stop_all(tasks).await;
    assert!(rig.faults.lock().is_empty(), "{:?}", rig.faults.lock());
}

#[tokio::test]
async fn test_arrival_at_other_terminal_is_ignored() {
    let rig = rig(None);
    let tasks = rig.start();

    let platform = rig.upper.platform_for(&rig.cabin1).unwrap().clone();
    assert_eq!(platform.dock_position(), 0.0);
    let before = platform.status();

    rig.hub
        .publish_lifecycle(LifecycleKind::Arrived, rig.cabin1.id(), 10_000.0);
    tokio::time::sleep(Duration::from_millis(30)).await;

    assert!(!platform.is_sequence_running());
    assert_eq!(platform.status(), before);

    stop_all(tasks).await;
}
