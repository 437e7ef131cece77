//! Tramway Settings Crate
//!
//! Loads, validates and saves the configuration of a tramway and converts
//! it into the runtime parameters of each component.

pub mod config;
pub mod error;

pub use config::{
    default_config_path, CabinSettings, CableSettings, Config, HubSettings, PlatformSettings,
    StationSettings, SupervisorSettings,
};
pub use error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
