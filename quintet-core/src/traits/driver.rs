//! Stepper driver configuration trait

/// Errors that can occur while configuring drivers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverError {
    /// Communication error with a driver (SPI)
    Communication,
    /// Driver read back a configuration other than the one written
    InvalidConfig,
}

/// Register set applied to all axes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverProfile {
    /// Stall detection armed for sensorless homing
    Homing,
    /// Full current, spread cycle
    Normal,
    /// Reduced current, silent chopper
    Stealth,
}

/// Configures every stepper driver on the bus at once
pub trait MotorDriver {
    /// Program all axes with the given profile
    fn init(&mut self, profile: DriverProfile) -> Result<(), DriverError>;
}
