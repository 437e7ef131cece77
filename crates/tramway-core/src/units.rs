//! Unit helpers
//!
//! Cable positions are meters, cable speed is kilometers per hour and cabin
//! weight is kilograms. These helpers keep the formatting of diagnostic
//! messages consistent and convert speed for drive loops that integrate
//! position over time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Physical quantity reported by a fault or a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quantity {
    /// Cable position, meters
    Meters,
    /// Cable speed, kilometers per hour
    KmPerHour,
    /// Cabin weight, kilograms
    Kilograms,
}

impl Quantity {
    /// Unit label as printed in diagnostics
    pub fn label(&self) -> &'static str {
        match self {
            Self::Meters => "m",
            Self::KmPerHour => "km/h",
            Self::Kilograms => "kg",
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Quantity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "m" | "meters" => Ok(Self::Meters),
            "km/h" | "kmh" => Ok(Self::KmPerHour),
            "kg" | "kilograms" => Ok(Self::Kilograms),
            _ => Err(format!("Unknown quantity: {}", s)),
        }
    }
}

/// Format a value with two decimals and its bracketed unit, e.g. `12.50[km/h]`
pub fn format_quantity(value: f64, quantity: Quantity) -> String {
    format!("{:.2}[{}]", value, quantity.label())
}

/// Convert kilometers per hour to meters per second
pub fn kmh_to_mps(kmh: f64) -> f64 {
    kmh / 3.6
}

/// Convert meters per second to kilometers per hour
pub fn mps_to_kmh(mps: f64) -> f64 {
    mps * 3.6
}
