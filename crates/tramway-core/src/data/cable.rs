//! Shared cable state
//!
//! One [`CableLine`] exists per tramway and both cabins hang on it. Position
//! and speed live behind a single lock so no reader can observe a torn
//! `(position, speed)` pair; every check works on one [`CableSnapshot`].

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_MAX_SPEED, DEFAULT_SPEED_STEP, SPEED_KICK};
use crate::error::FaultResult;
use crate::fault::{position_difference, speed_difference, Fault};

/// Speed limits of a cable
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CableLimits {
    /// Maximum absolute speed, km/h
    pub max_speed: f64,
    /// Fraction of the current speed applied by one ramp step
    pub speed_step: f64,
}

impl Default for CableLimits {
    fn default() -> Self {
        Self {
            max_speed: DEFAULT_MAX_SPEED,
            speed_step: DEFAULT_SPEED_STEP,
        }
    }
}

/// Consistent view of the cable at one instant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CableSnapshot {
    /// Cable length, meters
    pub length: f64,
    /// Maximum absolute speed, km/h
    pub max_speed: f64,
    /// Position, meters
    pub position: f64,
    /// Speed, km/h
    pub speed: f64,
    /// Number of times the cable has started moving from a standstill
    pub motion_epoch: u64,
}

impl CableSnapshot {
    /// Whether the cable is moving
    pub fn is_moving(&self) -> bool {
        self.speed != 0.0
    }

    /// Whether the position is exactly one of the two terminals
    pub fn is_at_terminal(&self) -> bool {
        self.position == 0.0 || self.position == self.length
    }

    /// Validate position and speed ranges
    pub fn check(&self) -> FaultResult<()> {
        if position_difference(self.position, self.length) > 0.0 {
            return Err(Fault::position(self));
        }
        if speed_difference(self.speed, self.max_speed) > 0.0 {
            return Err(Fault::speed(self));
        }
        Ok(())
    }
}

#[derive(Debug)]
struct CableState {
    position: f64,
    speed: f64,
    motion_epoch: u64,
}

impl CableState {
    fn write_speed(&mut self, speed: f64) {
        if self.speed == 0.0 && speed != 0.0 {
            self.motion_epoch += 1;
        }
        self.speed = speed;
    }
}

/// The shared cable
#[derive(Debug)]
pub struct CableLine {
    length: f64,
    limits: CableLimits,
    state: Mutex<CableState>,
}

impl CableLine {
    /// Create a cable of the given length with default limits, at rest at position 0
    pub fn new(length: f64) -> FaultResult<Self> {
        Self::with_limits(length, CableLimits::default())
    }

    /// Create a cable with explicit limits
    pub fn with_limits(length: f64, limits: CableLimits) -> FaultResult<Self> {
        if !(length.is_finite() && length > 0.0) {
            return Err(Fault::config(format!(
                "Cable length must be positive, got {}",
                length
            )));
        }
        if !(limits.max_speed.is_finite() && limits.max_speed > 0.0) {
            return Err(Fault::config(format!(
                "Maximum speed must be positive, got {}",
                limits.max_speed
            )));
        }
        if !(limits.speed_step > 0.0 && limits.speed_step < 1.0) {
            return Err(Fault::config(format!(
                "Speed step must be in (0, 1), got {}",
                limits.speed_step
            )));
        }

        Ok(Self {
            length,
            limits,
            state: Mutex::new(CableState {
                position: 0.0,
                speed: 0.0,
                motion_epoch: 0,
            }),
        })
    }

    /// Cable length, meters
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Cable limits
    pub fn limits(&self) -> CableLimits {
        self.limits
    }

    /// Current position
    pub fn position(&self) -> f64 {
        self.state.lock().position
    }

    /// Current speed
    pub fn speed(&self) -> f64 {
        self.state.lock().speed
    }

    /// Take a consistent snapshot of the cable
    pub fn snapshot(&self) -> CableSnapshot {
        let state = self.state.lock();
        self.snapshot_of(&state)
    }

    /// Run `f` against a snapshot while holding the cable lock
    ///
    /// The cable cannot change until `f` returns, which lets callers validate
    /// and act in one step. `f` must not call back into this cable.
    pub fn read<R>(&self, f: impl FnOnce(&CableSnapshot) -> R) -> R {
        let state = self.state.lock();
        f(&self.snapshot_of(&state))
    }

    fn snapshot_of(&self, state: &CableState) -> CableSnapshot {
        CableSnapshot {
            length: self.length,
            max_speed: self.limits.max_speed,
            position: state.position,
            speed: state.speed,
            motion_epoch: state.motion_epoch,
        }
    }

    /// Set the position; out-of-range values are rejected and leave the cable unchanged
    pub fn set_position(&self, position: f64) -> FaultResult<()> {
        let mut state = self.state.lock();
        self.store_position(&mut state, position)
    }

    fn store_position(&self, state: &mut CableState, position: f64) -> FaultResult<()> {
        if !(0.0..=self.length).contains(&position) {
            let mut attempted = self.snapshot_of(state);
            attempted.position = position;
            return Err(Fault::position(&attempted));
        }
        state.position = position;
        Ok(())
    }

    /// Set the speed; values beyond the maximum are rejected and leave the cable unchanged
    pub fn set_speed(&self, speed: f64) -> FaultResult<()> {
        let mut state = self.state.lock();
        if speed.is_nan() || speed.abs() > self.limits.max_speed {
            let mut attempted = self.snapshot_of(&state);
            attempted.speed = speed;
            return Err(Fault::speed(&attempted));
        }
        state.write_speed(speed);
        Ok(())
    }

    /// Move the position forward by `delta`
    pub fn increment_position(&self, delta: f64) -> FaultResult<()> {
        let mut state = self.state.lock();
        let target = state.position + delta;
        self.store_position(&mut state, target)
    }

    /// Move the position backward by `delta`
    pub fn decrement_position(&self, delta: f64) -> FaultResult<()> {
        let mut state = self.state.lock();
        let target = state.position - delta;
        self.store_position(&mut state, target)
    }

    /// Ramp the speed one step in the positive direction and return the new speed
    ///
    /// Not range-checked: run [`CableLine::check_invariants`] afterwards.
    pub fn accelerate(&self) -> f64 {
        let step = self.limits.speed_step;
        let mut state = self.state.lock();
        let mut speed = state.speed;
        if speed == 0.0 {
            speed = SPEED_KICK;
        }
        let next = if speed > 0.0 {
            speed + speed * step
        } else {
            speed - speed * step
        };
        state.write_speed(next);
        next
    }

    /// Ramp the speed one step in the negative direction and return the new speed
    ///
    /// Not range-checked: run [`CableLine::check_invariants`] afterwards.
    pub fn decelerate(&self) -> f64 {
        let step = self.limits.speed_step;
        let mut state = self.state.lock();
        let mut speed = state.speed;
        if speed == 0.0 {
            speed = -SPEED_KICK;
        }
        let next = if speed > 0.0 {
            speed - speed * step
        } else {
            speed + speed * step
        };
        state.write_speed(next);
        next
    }

    /// Validate position and speed against their ranges
    pub fn check_invariants(&self) -> FaultResult<()> {
        self.snapshot().check()
    }
}
