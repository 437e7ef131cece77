//! Periodic tasks report runtime faults and keep running

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use tramway_control::{Cabin, CabinConfig, SafetySupervisor, SupervisorConfig};
use tramway_core::{
    CableLine, FaultEvent, FaultKind, FaultSource, NotificationHub, Severity, SharedCable,
    SharedHub,
};

async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..400 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}

#[tokio::test]
async fn test_overspeed_is_reported_on_every_tick() {
    let cable: SharedCable = Arc::new(CableLine::new(10_000.0).unwrap());
    let hub: SharedHub = Arc::new(NotificationHub::new());
    let config = CabinConfig {
        tick: Duration::from_millis(5),
        ..CabinConfig::default()
    };
    let cabin0 = Arc::new(Cabin::new(cable.clone(), hub.clone(), config).unwrap());
    let cabin1 = Arc::new(Cabin::new(cable.clone(), hub.clone(), config).unwrap());
    let supervisor = Arc::new(SafetySupervisor::new(
        cable.clone(),
        cabin0.clone(),
        cabin1.clone(),
        hub.clone(),
        SupervisorConfig {
            tick: Duration::from_millis(5),
        },
    ));

    let faults: Arc<Mutex<Vec<FaultEvent>>> = Arc::new(Mutex::new(Vec::new()));
    {
        let faults = faults.clone();
        hub.subscribe_faults(move |event| faults.lock().push(event.clone()));
    }

    let tasks = vec![cabin0.start(), supervisor.start()];

    cable.set_speed(23.0).unwrap();
    while !matches!(cable.check_invariants(), Err(fault) if fault.is_fatal()) {
        cable.accelerate();
    }

    let fatal_speed_from = |source: FaultSource| {
        let faults = faults.lock();
        faults.iter().any(|event| {
            event.source == source
                && event.fault.kind == FaultKind::Speed
                && event.fault.severity == Severity::Fatal
        })
    };
    assert!(wait_until(|| fatal_speed_from(FaultSource::Cabin(cabin0.id()))).await);
    assert!(wait_until(|| fatal_speed_from(FaultSource::Cable)).await);

    let seen = faults.lock().len();
    assert!(wait_until(|| faults.lock().len() >= seen + 4).await);
    assert!(tasks.iter().all(|task| !task.is_finished()));

    for task in tasks {
        task.stop().await;
    }
}
