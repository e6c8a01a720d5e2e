//! Run-state machine
//!
//! The unit boots once, then runs until a mechanical fault. A fault is
//! terminal; only an external reset leaves it.

use crate::traits::{DriverError, MotionError};

/// Irrecoverable faults, each shown as its own blink pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum FaultCode {
    /// Motion bus did not come up or stopped responding
    MotionBus = 0,
    /// Stepper driver rejected its configuration
    DriverInit = 1,
    /// Axis failed to find its reference
    HomingFailed = 2,
    /// Axis stalled during a move
    AxisStalled = 3,
    /// Filament never reached the sensor
    LoadFailed = 4,
    /// Filament never cleared the sensor
    UnloadFailed = 5,
}

impl FaultCode {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl From<MotionError> for FaultCode {
    fn from(err: MotionError) -> Self {
        match err {
            MotionError::Bus => FaultCode::MotionBus,
            MotionError::Stalled => FaultCode::AxisStalled,
            MotionError::HomingFailed | MotionError::NotHomed => FaultCode::HomingFailed,
        }
    }
}

impl From<DriverError> for FaultCode {
    fn from(err: DriverError) -> Self {
        match err {
            DriverError::Communication => FaultCode::MotionBus,
            DriverError::InvalidConfig => FaultCode::DriverInit,
        }
    }
}

/// Lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RunState {
    /// Bring-up and homing
    #[default]
    Boot,
    /// Serving commands and buttons
    Running,
    /// Terminal; the fault pattern is shown until reset
    Faulted(FaultCode),
}

/// Events driving the run-state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// Boot sequence finished and the axes are homed
    BootComplete,
    /// A dispatcher or boot step failed mechanically
    FaultDetected(FaultCode),
}

impl RunState {
    pub fn is_running(&self) -> bool {
        matches!(self, RunState::Running)
    }

    /// Fault code when faulted
    pub fn fault(&self) -> Option<FaultCode> {
        match self {
            RunState::Faulted(code) => Some(*code),
            _ => None,
        }
    }

    /// Process an event and return the next state
    pub fn transition(self, event: Event) -> Self {
        use Event::*;
        use RunState::*;

        match (self, event) {
            (Boot, BootComplete) => Running,
            (Boot, FaultDetected(code)) => Faulted(code),
            (Running, FaultDetected(code)) => Faulted(code),

            // Faulted is terminal; everything else stays put
            _ => self,
        }
    }
}
