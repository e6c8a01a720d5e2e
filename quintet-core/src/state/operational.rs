//! Operational state and its value types

use serde::{Deserialize, Serialize};

use crate::config::{EXTRUDERS, PARK_POSITION};
use crate::traits::DriverProfile;

/// Motor driver operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverMode {
    #[default]
    Normal,
    /// Reduced current, silent chopper
    Stealth,
}

impl DriverMode {
    /// Map an `M` operand; anything but 0 or 1 is rejected
    pub fn from_operand(value: i32) -> Option<Self> {
        match value {
            0 => Some(DriverMode::Normal),
            1 => Some(DriverMode::Stealth),
            _ => None,
        }
    }

    /// Driver profile used while running in this mode
    pub fn profile(self) -> DriverProfile {
        match self {
            DriverMode::Normal => DriverProfile::Normal,
            DriverMode::Stealth => DriverProfile::Stealth,
        }
    }
}

/// Material class recorded per slot by the printer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum FilamentType {
    #[default]
    Unknown = 0,
    TypeA = 1,
    TypeB = 2,
}

impl FilamentType {
    /// Map an `F` type operand (0..=2)
    pub fn from_operand(value: i32) -> Option<Self> {
        match value {
            0 => Some(FilamentType::Unknown),
            1 => Some(FilamentType::TypeA),
            2 => Some(FilamentType::TypeB),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Everything the control loop knows about the unit
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OperationalState {
    /// Engaged slot, `PARK_POSITION` when parked
    pub active_extruder: u8,
    /// Set by a printer-driven switch, cleared by unload
    pub is_printing: bool,
    pub is_filament_loaded: bool,
    /// Slot the loaded strand belongs to; meaningful while loaded
    pub loaded_slot: u8,
    pub driver_mode: DriverMode,
    pub filament_types: [FilamentType; EXTRUDERS],
    /// Printer reported its own filament sensor triggered
    pub fsensor_triggered: bool,
}

impl Default for OperationalState {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationalState {
    /// Power-on state
    pub const fn new() -> Self {
        Self {
            active_extruder: 0,
            is_printing: false,
            is_filament_loaded: false,
            loaded_slot: 0,
            driver_mode: DriverMode::Normal,
            filament_types: [FilamentType::Unknown; EXTRUDERS],
            fsensor_triggered: false,
        }
    }

    pub fn is_parked(&self) -> bool {
        self.active_extruder == PARK_POSITION
    }

    /// Convert a wire operand into a slot index, rejecting the park position
    pub fn slot_index(value: i32) -> Option<u8> {
        u8::try_from(value)
            .ok()
            .filter(|&slot| usize::from(slot) < EXTRUDERS)
    }
}
