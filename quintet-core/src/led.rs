//! Indicator patterns
//!
//! The indicator is five red/green pairs, one per slot, packed into 16
//! bits. Slot `i` owns bits `2*(4-i)` (green) and `2*(4-i)+1` (red), so
//! slot 0 sits in the top pair and slot 4 in the bottom one.

use crate::config::EXTRUDERS;
use crate::state::FaultCode;

/// Raw indicator pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LedPattern(pub u16);

/// Bring-up phases, each with its own pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum BootPhase {
    Indicator = 0,
    Serial = 1,
    MotionBus = 2,
    Driver = 3,
    Sensor = 4,
}

impl LedPattern {
    pub const OFF: Self = Self(0);

    /// All red: filament still in the selector
    pub const FILAMENT_PRESENT: Self = Self(0x2aa);

    /// All green: filament removed, homing may proceed
    pub const FILAMENT_REMOVED: Self = Self(0x155);

    /// Park indication, first half
    pub const PARK_RED: Self = Self(0b10);

    /// Park indication, second half
    pub const PARK_GREEN: Self = Self(0b01);

    fn shift(slot: u8) -> u32 {
        2 * (EXTRUDERS as u32 - 1 - u32::from(slot))
    }

    /// Green LED of a slot
    pub fn slot_green(slot: u8) -> Self {
        Self(1u16.checked_shl(Self::shift(slot)).unwrap_or(0))
    }

    /// Red LED of a slot, shown while feeding
    pub fn slot_red(slot: u8) -> Self {
        Self(2u16.checked_shl(Self::shift(slot)).unwrap_or(0))
    }

    /// Boot phase `k` lights `1 << 2k`
    pub fn boot_phase(phase: BootPhase) -> Self {
        Self(1 << (2 * phase as u16))
    }

    /// Fault `code` shows `code + 1`
    pub fn fault(code: FaultCode) -> Self {
        Self(u16::from(code.as_u8()) + 1)
    }

    pub fn bits(self) -> u16 {
        self.0
    }
}
