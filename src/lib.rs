//! # Tramway
//!
//! Control core for a reversible two-cabin aerial tramway:
//! - One shared cable with range-checked position and speed
//! - Two cabins with weight, door and readiness safety checks
//! - Two stations sequencing unloading, loading and departure
//! - A periodic safety supervisor reporting graded faults
//!
//! ## Architecture
//!
//! The workspace is organized as multiple crates:
//!
//! 1. **tramway-core** - Cable, passengers, fault model, notification hub
//! 2. **tramway-control** - Cabin, platform, station and supervisor tasks
//! 3. **tramway-settings** - Configuration files and validation
//! 4. **tramway** - Assembly of a complete tramway and the demo binary
//!
//! Faults are reported, never acted on: a FATAL fault is logged and
//! delivered to subscribers, and stopping the cable is left to the drive.

use anyhow::Context;
use parking_lot::Mutex;
use std::sync::Arc;

pub use tramway_control::{
    Cabin, CabinConfig, CabinStatus, Platform, PlatformStatus, PlatformTiming, SafetySupervisor,
    Station, StationConfig, SupervisorConfig, TaskHandle,
};
pub use tramway_core::{
    AdmissionCheck, AdmitAll, CabinId, CabinPhase, CableLine, Fault, FaultEvent, FaultKind,
    FaultSource, LifecycleEvent, LifecycleKind, Notification, NotificationHub, Person,
    Severity, SharedCable, SharedHub, StationPosition,
};
pub use tramway_settings::{default_config_path, Config};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable, multi-line
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output with pretty formatting
/// - RUST_LOG environment variable support
pub fn init_logging() -> anyhow::Result<()> {
    init_logging_with(LogFormat::Pretty)
}

/// Initialize logging in the given format
pub fn init_logging_with(format: LogFormat) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    match format {
        LogFormat::Pretty => {
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stdout)
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .with_thread_names(true)
                .with_line_number(true)
                .pretty();

            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()?;
        }
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stdout)
                .with_target(true)
                .with_thread_names(true)
                .json();

            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()?;
        }
    }

    Ok(())
}

/// A complete tramway: one cable, two cabins, two stations, one supervisor
#[derive(Debug)]
pub struct Tramway {
    config: Config,
    cable: SharedCable,
    hub: SharedHub,
    cabins: [Arc<Cabin>; 2],
    upper: Arc<Station>,
    lower: Arc<Station>,
    supervisor: Arc<SafetySupervisor>,
    tasks: Mutex<Vec<TaskHandle>>,
}

impl Tramway {
    /// Wire up every component from a configuration
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        config.validate().context("Invalid tramway configuration")?;

        let cable: SharedCable = Arc::new(
            CableLine::with_limits(config.cable.length, config.cable_limits())
                .context("Failed to create the cable")?,
        );
        let hub: SharedHub = Arc::new(NotificationHub::with_config(config.hub_config()));

        let cabin = || -> anyhow::Result<Arc<Cabin>> {
            let cabin = Cabin::new(cable.clone(), hub.clone(), config.cabin_config())
                .context("Failed to create a cabin")?;
            Ok(Arc::new(cabin))
        };
        let cabins = [cabin()?, cabin()?];

        let station = |position| -> anyhow::Result<Arc<Station>> {
            let station = Station::new(
                position,
                cabins[0].clone(),
                cabins[1].clone(),
                hub.clone(),
                config.station_config(),
            )
            .with_context(|| format!("Failed to create the {} station", position))?;
            Ok(Arc::new(station))
        };
        let upper = station(StationPosition::Upper)?;
        let lower = station(StationPosition::Lower)?;

        let supervisor = Arc::new(SafetySupervisor::new(
            cable.clone(),
            cabins[0].clone(),
            cabins[1].clone(),
            hub.clone(),
            config.supervisor_config(),
        ));
        supervisor.add_station(upper.clone());
        supervisor.add_station(lower.clone());

        Ok(Self {
            config,
            cable,
            hub,
            cabins,
            upper,
            lower,
            supervisor,
            tasks: Mutex::new(Vec::new()),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cable(&self) -> &SharedCable {
        &self.cable
    }

    pub fn hub(&self) -> &SharedHub {
        &self.hub
    }

    pub fn cabins(&self) -> &[Arc<Cabin>; 2] {
        &self.cabins
    }

    pub fn station(&self, position: StationPosition) -> &Arc<Station> {
        match position {
            StationPosition::Upper => &self.upper,
            StationPosition::Lower => &self.lower,
        }
    }

    pub fn supervisor(&self) -> &Arc<SafetySupervisor> {
        &self.supervisor
    }

    /// Whether the periodic tasks are running
    pub fn is_running(&self) -> bool {
        !self.tasks.lock().is_empty()
    }

    /// Spawn every periodic task
    ///
    /// Platforms subscribe before the cabins start publishing, so no arrival
    /// is missed. Calling this twice has no effect.
    pub fn start(&self) {
        let mut tasks = self.tasks.lock();
        if !tasks.is_empty() {
            tracing::warn!("Tramway already running");
            return;
        }
        tasks.extend(self.upper.start());
        tasks.extend(self.lower.start());
        tasks.extend(self.cabins.iter().map(|cabin| cabin.start()));
        tasks.push(self.supervisor.start());
        tracing::info!("Tramway started with {} tasks", tasks.len());
    }

    /// Close the doors of both cabins and arm them
    pub async fn arm(&self) -> anyhow::Result<()> {
        for cabin in &self.cabins {
            cabin
                .start_cabin()
                .await
                .with_context(|| format!("Failed to arm {}", cabin.id()))?;
        }
        Ok(())
    }

    /// Stop every periodic task, letting running sequences finish
    pub async fn shutdown(&self) {
        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in &tasks {
            task.request_stop();
        }
        for task in tasks {
            task.stop().await;
        }
        tracing::info!("Tramway stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_config() -> Config {
        let mut config = Config::default();
        config.cabin.tick_ms = 5;
        config.cabin.door_pause_ms = 1;
        config.supervisor.tick_ms = 5;
        config
    }

    #[test]
    fn test_assembly_from_default_config() {
        let tramway = Tramway::from_config(Config::default()).unwrap();

        assert_eq!(tramway.cable().length(), tramway.config().cable.length);
        assert_eq!(tramway.supervisor().station_count(), 2);
        assert_eq!(
            tramway.station(StationPosition::Upper).position(),
            StationPosition::Upper
        );
        assert!(!Arc::ptr_eq(&tramway.cabins()[0], &tramway.cabins()[1]));
        assert!(tramway.supervisor().check_once().is_empty());
        assert!(!tramway.is_running());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = Config::default();
        config.cable.length = -1.0;
        assert!(Tramway::from_config(config).is_err());
    }

    #[tokio::test]
    async fn test_start_arm_and_shutdown() {
        let tramway = Tramway::from_config(quick_config()).unwrap();
        tramway.start();
        tramway.start();
        assert!(tramway.is_running());

        tramway.arm().await.unwrap();
        assert!(tramway.cabins().iter().all(|cabin| cabin.is_ready()));

        tramway.shutdown().await;
        assert!(!tramway.is_running());
    }
}
