//! Graded fault model
//!
//! Every domain fault is built from a snapshot of the offending object rather
//! than from a free-form message. The constructor measures how far the value
//! is past its nearest safe bound and derives the severity from that
//! distance with fixed thresholds, so the same inputs always produce the same
//! severity and message shape.
//!
//! Severities are ordered from least to most severe:
//! `Ok < Info < Warning < Danger < Fatal`. `Ok` and `Info` are informational;
//! producing one means a check was invoked without need.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::constants::{
    POSITION_DANGER_LIMIT, SPEED_DANGER_LIMIT, SPEED_WARNING_LIMIT, WEIGHT_DANGER_LIMIT,
    WEIGHT_WARNING_LIMIT,
};
use crate::data::{CableSnapshot, DoorState};
use crate::units::{format_quantity, Quantity};

/// Fault severity, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Nothing wrong
    Ok,
    /// Informational
    Info,
    /// Out of bounds, not yet dangerous
    Warning,
    /// Out of bounds and unsafe
    Danger,
    /// Out of bounds far enough that operation must not continue
    Fatal,
}

impl Severity {
    /// Banner printed at the head of a diagnostic
    pub fn banner(&self) -> &'static str {
        match self {
            Severity::Ok => "OK!",
            Severity::Info => "INFO!",
            Severity::Warning => "WARNING!",
            Severity::Danger => "DANGER!",
            Severity::Fatal => "FATAL!",
        }
    }

    /// Whether this severity should be surfaced as a failure
    pub fn is_failure(&self) -> bool {
        *self >= Severity::Warning
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.banner())
    }
}

/// What kind of invariant a fault reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaultKind {
    /// Cable position outside `[0, length]`
    Position,
    /// Cable speed beyond the maximum
    Speed,
    /// Cabin weight outside `(0, max_weight)`
    Weight,
    /// Cabin door open while the cable moves
    Door,
    /// Passenger set over capacity
    Occupancy,
    /// Bad wiring or bad parameters at construction time
    Config,
    /// Platform protocol violation (door open off-dock, sequence busy...)
    Platform,
    /// Cabin asked to arm with a door open or the cable moving
    Arming,
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FaultKind::Position => "Position",
            FaultKind::Speed => "Speed",
            FaultKind::Weight => "Weight",
            FaultKind::Door => "Door",
            FaultKind::Occupancy => "Occupancy",
            FaultKind::Config => "Config",
            FaultKind::Platform => "Platform",
            FaultKind::Arming => "Arming",
        };
        write!(f, "{}", name)
    }
}

/// A detected invariant violation
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{severity} {kind} fault: {message}")]
pub struct Fault {
    /// Which invariant was violated
    pub kind: FaultKind,
    /// Derived severity
    pub severity: Severity,
    /// Human-readable diagnostic
    pub message: String,
    /// Distance past the nearest safe bound, when the fault is measurable
    pub difference: Option<f64>,
}

impl Fault {
    fn measured(kind: FaultKind, severity: Severity, message: String, difference: f64) -> Self {
        Self {
            kind,
            severity,
            message,
            difference: Some(difference),
        }
    }

    /// Fault with an explicit severity and message
    pub fn new(kind: FaultKind, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity,
            message: message.into(),
            difference: None,
        }
    }

    /// Cable position fault from a cable snapshot
    pub fn position(snapshot: &CableSnapshot) -> Self {
        let difference = position_difference(snapshot.position, snapshot.length);
        let message = format!(
            "The cable position is outside the cable by {}",
            format_quantity(difference, Quantity::Meters)
        );
        Self::measured(
            FaultKind::Position,
            position_severity(difference),
            message,
            difference,
        )
    }

    /// Cable speed fault from a cable snapshot
    pub fn speed(snapshot: &CableSnapshot) -> Self {
        let difference = speed_difference(snapshot.speed, snapshot.max_speed);
        let message = format!(
            "The cable speed exceeds the limit by {}",
            format_quantity(difference, Quantity::KmPerHour)
        );
        Self::measured(FaultKind::Speed, speed_severity(difference), message, difference)
    }

    /// Cabin weight fault from a scale reading
    pub fn weight(weight: f64, max_weight: f64) -> Self {
        let severity = weight_severity(weight, max_weight);
        let (message, difference) = if weight < 0.0 {
            (
                format!(
                    "Cabin weight scale error, reading {}",
                    format_quantity(weight, Quantity::Kilograms)
                ),
                -weight,
            )
        } else if weight >= max_weight {
            let difference = weight - max_weight;
            (
                format!(
                    "The cabin weight is over the limit by {}",
                    format_quantity(difference, Quantity::Kilograms)
                ),
                difference,
            )
        } else if weight == 0.0 {
            ("Cabin weight scale reads zero".to_string(), 0.0)
        } else {
            (
                format!(
                    "Cabin weight {} is within limits",
                    format_quantity(weight, Quantity::Kilograms)
                ),
                0.0,
            )
        };
        Self::measured(FaultKind::Weight, severity, message, difference)
    }

    /// Door fault from the cabin doors and the current cable speed
    pub fn door(doors: DoorState, speed: f64) -> Self {
        let severity = door_severity(doors, speed);
        let mut open = Vec::new();
        if speed != 0.0 {
            if doors.internal_open {
                open.push("Internal door is open while the cable moves");
            }
            if doors.external_open {
                open.push("External door is open while the cable moves");
            }
        }
        let message = if open.is_empty() {
            "Doors are consistent with cable motion".to_string()
        } else {
            open.join("; ")
        };
        Self::new(FaultKind::Door, severity, message)
    }

    /// Occupancy fault raised when an add would exceed capacity
    pub fn occupancy(count: usize, capacity: usize) -> Self {
        let severity = if count >= capacity {
            Severity::Warning
        } else {
            Severity::Ok
        };
        let difference = (count + 1).saturating_sub(capacity) as f64;
        Self::measured(
            FaultKind::Occupancy,
            severity,
            format!("No more room: {} of {} places taken", count, capacity),
            difference,
        )
    }

    /// Refused arm request from the cabin doors and the current cable speed
    pub fn arming(doors: DoorState, speed: f64) -> Self {
        let severity = arming_severity(doors, speed);
        let mut reasons = Vec::new();
        if doors.internal_open {
            reasons.push("internal door open".to_string());
        }
        if doors.external_open {
            reasons.push("external door open".to_string());
        }
        if speed != 0.0 {
            reasons.push(format!(
                "cable moving at {}",
                format_quantity(speed, Quantity::KmPerHour)
            ));
        }
        let message = if reasons.is_empty() {
            "Cabin can be armed".to_string()
        } else {
            format!("Cannot arm the cabin: {}", reasons.join(", "))
        };
        Self::new(FaultKind::Arming, severity, message)
    }

    /// Wiring or parameter error found at construction time
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Config, Severity::Fatal, message)
    }

    /// Platform protocol fault
    pub fn platform(severity: Severity, message: impl Into<String>) -> Self {
        Self::new(FaultKind::Platform, severity, message)
    }

    /// Full diagnostic text: banner line followed by the message
    pub fn diagnostic(&self) -> String {
        format!("{}\n{}", self.severity.banner(), self.message)
    }

    /// Whether this fault should be surfaced as a failure
    pub fn is_failure(&self) -> bool {
        self.severity.is_failure()
    }

    /// Whether this fault is fatal
    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }
}

/// Distance of a cable position past `[0, length]`, zero when inside
pub fn position_difference(position: f64, length: f64) -> f64 {
    if position > length {
        position - length
    } else if position < 0.0 {
        -position
    } else {
        0.0
    }
}

/// Severity of a position overshoot
pub fn position_severity(difference: f64) -> Severity {
    if difference <= 0.0 {
        Severity::Ok
    } else if difference <= POSITION_DANGER_LIMIT {
        Severity::Danger
    } else {
        Severity::Fatal
    }
}

/// Distance of a speed past `[-max_speed, max_speed]`, zero when inside
pub fn speed_difference(speed: f64, max_speed: f64) -> f64 {
    if speed > max_speed {
        speed - max_speed
    } else if speed < -max_speed {
        -speed - max_speed
    } else {
        0.0
    }
}

/// Severity of a speed overshoot
pub fn speed_severity(difference: f64) -> Severity {
    if difference <= 0.0 {
        Severity::Ok
    } else if difference <= SPEED_WARNING_LIMIT {
        Severity::Warning
    } else if difference <= SPEED_DANGER_LIMIT {
        Severity::Danger
    } else {
        Severity::Fatal
    }
}

/// Severity of a cabin weight reading against its limit
///
/// A negative reading is a broken scale and always fatal. A reading at or
/// above the limit is graded by the overshoot. A zero reading is a warning.
pub fn weight_severity(weight: f64, max_weight: f64) -> Severity {
    if weight < 0.0 {
        Severity::Fatal
    } else if weight >= max_weight {
        let difference = weight - max_weight;
        if difference <= WEIGHT_WARNING_LIMIT {
            Severity::Warning
        } else if difference <= WEIGHT_DANGER_LIMIT {
            Severity::Danger
        } else {
            Severity::Fatal
        }
    } else if weight == 0.0 {
        Severity::Warning
    } else {
        Severity::Ok
    }
}

/// Severity of the door state against cable motion
pub fn door_severity(doors: DoorState, speed: f64) -> Severity {
    if doors.any_open() && speed != 0.0 {
        Severity::Danger
    } else {
        Severity::Ok
    }
}

/// Severity of an arm request
///
/// Arming needs closed doors and a stationary cable. A refusal is a warning:
/// nothing unsafe happened, the cabin simply stays disarmed.
pub fn arming_severity(doors: DoorState, speed: f64) -> Severity {
    if doors.any_open() || speed != 0.0 {
        Severity::Warning
    } else {
        Severity::Ok
    }
}
