//! Tramway configuration
//!
//! One [`Config`] describes a whole tramway: cable, cabins, platforms,
//! stations, supervisor and hub. Files may be JSON or TOML, chosen by
//! extension, and missing sections or keys fall back to the defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tramway_control::{CabinConfig, PlatformTiming, StationConfig, SupervisorConfig};
use tramway_core::constants::{
    DEFAULT_CABIN_CAPACITY, DEFAULT_CABIN_TICK_MS, DEFAULT_CABLE_LENGTH, DEFAULT_CLOSE_HOLD_MS,
    DEFAULT_DOOR_PAUSE_MS, DEFAULT_LOAD_HOLD_MS, DEFAULT_MAX_SPEED, DEFAULT_MAX_WEIGHT,
    DEFAULT_SPEED_STEP, DEFAULT_SUPERVISOR_TICK_MS, DEFAULT_TARE_WEIGHT,
    DEFAULT_UNLOAD_WINDOW_MS,
};
use tramway_core::{CableLimits, HubConfig};

use crate::error::{ConfigError, ConfigResult, SettingsError, SettingsResult};

/// Cable geometry and speed limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CableSettings {
    /// Cable length in meters
    pub length: f64,
    /// Maximum absolute speed in km/h
    pub max_speed: f64,
    /// Ramp step as a fraction of the current speed
    pub speed_step: f64,
}

impl Default for CableSettings {
    fn default() -> Self {
        Self {
            length: DEFAULT_CABLE_LENGTH,
            max_speed: DEFAULT_MAX_SPEED,
            speed_step: DEFAULT_SPEED_STEP,
        }
    }
}

impl From<&CableSettings> for CableLimits {
    fn from(settings: &CableSettings) -> Self {
        CableLimits {
            max_speed: settings.max_speed,
            speed_step: settings.speed_step,
        }
    }
}

/// Cabin limits and timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CabinSettings {
    /// Exclusive upper weight bound in kg
    pub max_weight: f64,
    /// Empty cabin weight in kg
    pub tare_weight: f64,
    /// Passenger capacity
    pub capacity: usize,
    /// Self-check period in milliseconds
    pub tick_ms: u64,
    /// Pause between door operations in milliseconds
    pub door_pause_ms: u64,
}

impl Default for CabinSettings {
    fn default() -> Self {
        Self {
            max_weight: DEFAULT_MAX_WEIGHT,
            tare_weight: DEFAULT_TARE_WEIGHT,
            capacity: DEFAULT_CABIN_CAPACITY,
            tick_ms: DEFAULT_CABIN_TICK_MS,
            door_pause_ms: DEFAULT_DOOR_PAUSE_MS,
        }
    }
}

impl From<&CabinSettings> for CabinConfig {
    fn from(settings: &CabinSettings) -> Self {
        CabinConfig {
            max_weight: settings.max_weight,
            tare_weight: settings.tare_weight,
            capacity: settings.capacity,
            tick: Duration::from_millis(settings.tick_ms),
            door_pause: Duration::from_millis(settings.door_pause_ms),
        }
    }
}

/// Arrival sequence dwell timers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformSettings {
    /// Unload window in milliseconds
    pub unload_window_ms: u64,
    /// Hold after opening the loading door, in milliseconds
    pub load_hold_ms: u64,
    /// Hold after closing the unloading door, in milliseconds
    pub close_hold_ms: u64,
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self {
            unload_window_ms: DEFAULT_UNLOAD_WINDOW_MS,
            load_hold_ms: DEFAULT_LOAD_HOLD_MS,
            close_hold_ms: DEFAULT_CLOSE_HOLD_MS,
        }
    }
}

impl From<&PlatformSettings> for PlatformTiming {
    fn from(settings: &PlatformSettings) -> Self {
        PlatformTiming {
            unload_window: Duration::from_millis(settings.unload_window_ms),
            load_hold: Duration::from_millis(settings.load_hold_ms),
            close_hold: Duration::from_millis(settings.close_hold_ms),
        }
    }
}

/// Station waiting areas
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationSettings {
    /// Whether stations have a secondary incoming queue
    pub in_queue_enabled: bool,
    /// Capacity of the incoming queue
    pub in_queue_capacity: usize,
}

impl Default for StationSettings {
    fn default() -> Self {
        Self {
            in_queue_enabled: true,
            in_queue_capacity: 4 * DEFAULT_CABIN_CAPACITY,
        }
    }
}

/// Safety supervisor timing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorSettings {
    /// Check period in milliseconds
    pub tick_ms: u64,
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self {
            tick_ms: DEFAULT_SUPERVISOR_TICK_MS,
        }
    }
}

impl From<&SupervisorSettings> for SupervisorConfig {
    fn from(settings: &SupervisorSettings) -> Self {
        SupervisorConfig {
            tick: Duration::from_millis(settings.tick_ms),
        }
    }
}

/// Notification hub buffering and history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubSettings {
    /// Broadcast channel capacity for async receivers
    pub channel_capacity: usize,
    /// Keep a notification history
    pub enable_history: bool,
    /// Maximum history entries
    pub max_history_size: usize,
    /// History retention in seconds
    pub history_retention_secs: u64,
}

impl Default for HubSettings {
    fn default() -> Self {
        let defaults = HubConfig::default();
        Self {
            channel_capacity: defaults.channel_capacity,
            enable_history: defaults.enable_history,
            max_history_size: defaults.max_history_size,
            history_retention_secs: defaults.history_retention.as_secs(),
        }
    }
}

impl From<&HubSettings> for HubConfig {
    fn from(settings: &HubSettings) -> Self {
        HubConfig {
            channel_capacity: settings.channel_capacity,
            enable_history: settings.enable_history,
            max_history_size: settings.max_history_size,
            history_retention: Duration::from_secs(settings.history_retention_secs),
        }
    }
}

/// Complete tramway configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub cable: CableSettings,
    pub cabin: CabinSettings,
    pub platform: PlatformSettings,
    pub station: StationSettings,
    pub supervisor: SupervisorSettings,
    pub hub: HubSettings,
}

enum Format {
    Json,
    Toml,
}

fn format_of(path: &Path) -> ConfigResult<Format> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("toml") => Ok(Format::Toml),
        _ => Err(ConfigError::UnknownFormat {
            path: path.to_path_buf(),
        }),
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = format_of(path)?;
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load from `path` if it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::info!("No configuration at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match format_of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        std::fs::write(path, content).map_err(|source| SettingsError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        // Cable
        if !(self.cable.length.is_finite() && self.cable.length > 0.0) {
            return Err(ConfigError::out_of_range("cable.length", self.cable.length));
        }
        if !(self.cable.max_speed.is_finite() && self.cable.max_speed > 0.0) {
            return Err(ConfigError::out_of_range(
                "cable.max_speed",
                self.cable.max_speed,
            ));
        }
        if !(self.cable.speed_step > 0.0 && self.cable.speed_step < 1.0) {
            return Err(ConfigError::out_of_range(
                "cable.speed_step",
                self.cable.speed_step,
            ));
        }

        // Cabin
        if !(self.cabin.max_weight.is_finite() && self.cabin.max_weight > 0.0) {
            return Err(ConfigError::out_of_range(
                "cabin.max_weight",
                self.cabin.max_weight,
            ));
        }
        if !(self.cabin.tare_weight > 0.0 && self.cabin.tare_weight < self.cabin.max_weight) {
            return Err(ConfigError::out_of_range(
                "cabin.tare_weight",
                self.cabin.tare_weight,
            ));
        }
        if self.cabin.capacity == 0 {
            return Err(ConfigError::out_of_range("cabin.capacity", 0));
        }
        if self.cabin.tick_ms == 0 {
            return Err(ConfigError::out_of_range("cabin.tick_ms", 0));
        }

        // Station and supervisor
        if self.station.in_queue_enabled && self.station.in_queue_capacity == 0 {
            return Err(ConfigError::out_of_range("station.in_queue_capacity", 0));
        }
        if self.supervisor.tick_ms == 0 {
            return Err(ConfigError::out_of_range("supervisor.tick_ms", 0));
        }

        // Hub
        if self.hub.channel_capacity == 0 {
            return Err(ConfigError::out_of_range("hub.channel_capacity", 0));
        }

        Ok(())
    }

    pub fn cable_limits(&self) -> CableLimits {
        (&self.cable).into()
    }

    pub fn cabin_config(&self) -> CabinConfig {
        (&self.cabin).into()
    }

    pub fn platform_timing(&self) -> PlatformTiming {
        (&self.platform).into()
    }

    /// Station parameters from the platform and station sections
    pub fn station_config(&self) -> StationConfig {
        StationConfig {
            timing: self.platform_timing(),
            incoming_capacity: self
                .station
                .in_queue_enabled
                .then_some(self.station.in_queue_capacity),
        }
    }

    pub fn supervisor_config(&self) -> SupervisorConfig {
        (&self.supervisor).into()
    }

    pub fn hub_config(&self) -> HubConfig {
        (&self.hub).into()
    }
}

/// Default location of the configuration file
pub fn default_config_path() -> SettingsResult<PathBuf> {
    let dir = dirs::config_dir().ok_or(SettingsError::NoConfigDir)?;
    Ok(dir.join("tramway").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::new();
        assert!(config.validate().is_ok());
        assert_eq!(config.cable.length, 10_000.0);
        assert_eq!(config.cabin_config().max_weight, 7_000.0);
        assert_eq!(
            config.platform_timing().unload_window,
            Duration::from_secs(10)
        );
        assert_eq!(
            config.supervisor_config().tick,
            Duration::from_millis(100)
        );
    }

    #[test]
    fn test_validation_errors() {
        let mut config = Config::new();
        config.cable.length = 0.0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::out_of_range("cable.length", 0.0))
        );

        let mut config = Config::new();
        config.cabin.tare_weight = 7_500.0;
        assert!(config.validate().is_err());

        let mut config = Config::new();
        config.cabin.capacity = 0;
        assert!(config.validate().is_err());

        let mut config = Config::new();
        config.cable.speed_step = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_station_config_in_queue_toggle() {
        let mut config = Config::new();
        assert_eq!(config.station_config().incoming_capacity, Some(240));

        config.station.in_queue_enabled = false;
        assert_eq!(config.station_config().incoming_capacity, None);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str("[cable]\nlength = 2500.0\n").unwrap();
        assert_eq!(config.cable.length, 2_500.0);
        assert_eq!(config.cable.max_speed, DEFAULT_MAX_SPEED);
        assert_eq!(config.cabin, CabinSettings::default());
    }

    #[test]
    fn test_unsupported_extension() {
        let err = Config::new()
            .save_to_file(Path::new("tramway.yaml"))
            .unwrap_err();
        assert!(matches!(
            err,
            SettingsError::Invalid(ConfigError::UnknownFormat { .. })
        ));
    }

    #[test]
    fn test_default_config_path() {
        if let Ok(path) = default_config_path() {
            assert!(path.ends_with("tramway/config.toml"));
        }
    }
}
