//! Error types for the settings crate.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to read, write or locate a configuration file
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("No configuration directory on this platform")]
    NoConfigDir,

    #[error("Malformed JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed TOML configuration: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Could not encode configuration as TOML: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] ConfigError),
}

/// A configuration that cannot describe a working tramway
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Only `.json` and `.toml` files are understood
    #[error("Unsupported config format: {}", .path.display())]
    UnknownFormat { path: PathBuf },

    #[error("'{key}' cannot be {value}")]
    OutOfRange { key: &'static str, value: String },
}

impl ConfigError {
    pub(crate) fn out_of_range(key: &'static str, value: impl ToString) -> Self {
        ConfigError::OutOfRange {
            key,
            value: value.to_string(),
        }
    }
}

pub type SettingsResult<T> = Result<T, SettingsError>;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_file_and_key() {
        let err = SettingsError::Read {
            path: PathBuf::from("/etc/tramway.toml"),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(err.to_string(), "Failed to read /etc/tramway.toml: gone");

        let err = ConfigError::out_of_range("cable.length", -1.0);
        assert_eq!(err.to_string(), "'cable.length' cannot be -1");

        let err = ConfigError::UnknownFormat {
            path: PathBuf::from("tramway.ini"),
        };
        assert_eq!(err.to_string(), "Unsupported config format: tramway.ini");
    }

    #[test]
    fn test_validation_error_converts() {
        let err: SettingsError = ConfigError::out_of_range("cabin.capacity", 0).into();
        assert!(matches!(err, SettingsError::Invalid(_)));
        assert_eq!(err.to_string(), "Invalid configuration: 'cabin.capacity' cannot be 0");
    }
}
