//! Motion primitives
//!
//! Trajectory generation and step timing live behind this trait. Every
//! call blocks until the move has physically completed.

/// Errors reported by motion primitives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionError {
    /// Motion bus did not respond
    Bus,
    /// Stall detected during a move
    Stalled,
    /// Reference switch or stall not found while homing
    HomingFailed,
    /// Move requested before homing
    NotHomed,
}

/// Pulley rotation relative to the filament path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PulleyDirection {
    /// Push filament towards the printer
    Feed,
    /// Pull filament back towards the spool
    Retract,
}

/// Pulley speed class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PulleySpeed {
    /// Bowden transfer
    Fast,
    /// Sensor seeking and extruder grip
    Slow,
}

/// Selector, idler and pulley axes
pub trait Motion {
    /// Bring up the bus shared by the stepper drivers
    fn init_bus(&mut self) -> Result<(), MotionError>;

    /// Reset axis bookkeeping; positions are unknown until homed
    fn init_axes(&mut self) -> Result<(), MotionError>;

    /// Home selector and idler
    fn home(&mut self) -> Result<(), MotionError>;

    /// Move selector and idler to a slot; the park position is accepted
    fn select(&mut self, slot: u8) -> Result<(), MotionError>;

    /// Move the selector out of the filament path, leaving the idler alone
    fn park_selector(&mut self) -> Result<(), MotionError>;

    /// Press (`true`) or release the idler bearing against the pulley
    fn set_idler(&mut self, engaged: bool) -> Result<(), MotionError>;

    /// Run the pulley for a distance in millimetres
    fn pulley(
        &mut self,
        direction: PulleyDirection,
        mm: u16,
        speed: PulleySpeed,
    ) -> Result<(), MotionError>;

    /// Sweep the selector blade across the filament path
    fn cut(&mut self) -> Result<(), MotionError>;
}
