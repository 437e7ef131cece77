//! Default limits and timings for the tramway.
//!
//! These are the factory values; every one of them can be overridden
//! through `tramway-settings`.

/// Default cable length in meters.
pub const DEFAULT_CABLE_LENGTH: f64 = 10_000.0;

/// Maximum cable speed in kilometers per hour.
pub const DEFAULT_MAX_SPEED: f64 = 23.2;

/// Fraction of the current speed applied by one accelerate/decelerate step.
pub const DEFAULT_SPEED_STEP: f64 = 0.05;

/// Speed kick applied when ramping away from exactly zero.
pub const SPEED_KICK: f64 = 1.0;

/// Maximum gross cabin weight in kilograms.
pub const DEFAULT_MAX_WEIGHT: f64 = 7_000.0;

/// Weight of the empty cabin as read by its scale, in kilograms.
pub const DEFAULT_TARE_WEIGHT: f64 = 500.0;

/// Passenger capacity of one cabin.
pub const DEFAULT_CABIN_CAPACITY: usize = 60;

/// Cabin self-check period in milliseconds.
pub const DEFAULT_CABIN_TICK_MS: u64 = 100;

/// Pause between door operations when a cabin is started or stopped.
pub const DEFAULT_DOOR_PAUSE_MS: u64 = 200;

/// Time passengers get to leave the cabin after arrival.
pub const DEFAULT_UNLOAD_WINDOW_MS: u64 = 10_000;

/// Hold after the loading door opens, before the unload door closes.
pub const DEFAULT_LOAD_HOLD_MS: u64 = 500;

/// Hold after the unload door closes, before passengers are transferred.
pub const DEFAULT_CLOSE_HOLD_MS: u64 = 1;

/// Safety supervisor period in milliseconds.
pub const DEFAULT_SUPERVISOR_TICK_MS: u64 = 100;

// Severity thresholds, measured as the distance past the nearest safe bound.

/// Speed overshoot (km/h) up to which a speed fault is a warning.
pub const SPEED_WARNING_LIMIT: f64 = 2.0;
/// Speed overshoot (km/h) up to which a speed fault is dangerous; beyond is fatal.
pub const SPEED_DANGER_LIMIT: f64 = 7.0;

/// Weight overshoot (kg) up to which a weight fault is a warning.
pub const WEIGHT_WARNING_LIMIT: f64 = 50.0;
/// Weight overshoot (kg) up to which a weight fault is dangerous; beyond is fatal.
pub const WEIGHT_DANGER_LIMIT: f64 = 100.0;

/// Position overshoot (m) up to which a position fault is dangerous; beyond is fatal.
pub const POSITION_DANGER_LIMIT: f64 = 2.0;
