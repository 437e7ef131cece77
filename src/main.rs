use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};

use tramway::{
    default_config_path, init_logging_with, AdmitAll, Config, LogFormat, Person, StationPosition,
    TaskHandle, Tramway, BUILD_DATE, VERSION,
};
use tramway_control::task::tick_interval;
use tramway_core::units::kmh_to_mps;

/// Drive loop period
const DRIVE_TICK: Duration = Duration::from_millis(100);

/// Simulated seconds per real second
const TIME_SCALE: f64 = 60.0;

/// Cruise speed as a share of the cable maximum
const CRUISE_RATIO: f64 = 0.8;

const DEMO_GUESTS: usize = 12;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let format = match std::env::var("TRAMWAY_LOG_FORMAT").as_deref() {
        Ok("json") => LogFormat::Json,
        _ => LogFormat::Pretty,
    };
    init_logging_with(format)?;

    info!("Tramway {} (built {})", VERSION, BUILD_DATE);

    let path = match std::env::args().nth(1) {
        Some(path) => PathBuf::from(path),
        None => default_config_path()?,
    };
    let config = Config::load_or_default(&path)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    info!("Configuration: {}", path.display());

    let tramway = Arc::new(Tramway::from_config(config)?);
    tramway.start();

    let lower = tramway.station(StationPosition::Lower);
    for n in 0..DEMO_GUESTS {
        let guest = Person::new(format!("Guest {}", n + 1), 60.0 + (n % 5) as f64 * 8.0);
        if let Err(fault) = lower.admit(guest, &AdmitAll) {
            warn!("Lower station full: {}", fault);
            break;
        }
    }

    tramway.arm().await?;
    let drive = spawn_drive(tramway.clone());

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");

    drive.stop().await;
    for cabin in tramway.cabins() {
        cabin.stop_cabin().await;
    }
    tramway.shutdown().await;
    Ok(())
}

/// Shuttle the cable between the terminals, re-arming the cabins after each arrival
fn spawn_drive(tramway: Arc<Tramway>) -> TaskHandle {
    TaskHandle::spawn("drive", move |mut stop| async move {
        let cable = tramway.cable().clone();
        let length = cable.length();
        let cruise = cable.limits().max_speed * CRUISE_RATIO;
        let mut interval = tick_interval(DRIVE_TICK);

        loop {
            // Wait for departure clearance
            while !tramway.cabins().iter().all(|cabin| cabin.is_ready()) {
                if !stop.tick(&mut interval).await {
                    return;
                }
            }

            let forward = cable.position() < length / 2.0;
            let target = if forward { length } else { 0.0 };
            info!("Departing towards {:.0} m", target);

            while stop.tick(&mut interval).await {
                if cable.speed().abs() < cruise {
                    if forward {
                        cable.accelerate();
                    } else {
                        cable.decelerate();
                    }
                }
                if let Err(fault) = cable.check_invariants() {
                    warn!("Drive: {}", fault);
                    let _ = cable.set_speed(cruise.copysign(cable.speed()));
                }

                let step = kmh_to_mps(cable.speed().abs()) * DRIVE_TICK.as_secs_f64() * TIME_SCALE;
                let remaining = (target - cable.position()).abs();
                let moved = if step >= remaining {
                    cable.set_position(target).and_then(|_| cable.set_speed(0.0))
                } else if forward {
                    cable.increment_position(step)
                } else {
                    cable.decrement_position(step)
                };
                if let Err(fault) = moved {
                    warn!("Drive: {}", fault);
                    return;
                }
                if step >= remaining {
                    break;
                }
            }
            if stop.is_stopped() {
                return;
            }
            info!("Stopped at {:.0} m", target);

            // Let the cabins report the arrival, then wait for both platforms
            tokio::time::sleep(tramway.config().cabin_config().tick * 3).await;
            while sequence_running(&tramway) {
                if !stop.tick(&mut interval).await {
                    return;
                }
            }

            for cabin in tramway.cabins() {
                if let Err(fault) = cabin.start_cabin().await {
                    warn!("Failed to re-arm {}: {}", cabin.id(), fault);
                }
            }
        }
    })
}

fn sequence_running(tramway: &Tramway) -> bool {
    [StationPosition::Upper, StationPosition::Lower]
        .into_iter()
        .flat_map(|position| tramway.station(position).platforms().iter())
        .any(|platform| platform.is_sequence_running())
}
