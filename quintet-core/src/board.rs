//! Board composition
//!
//! A [`Platform`] names the concrete collaborator types of one board;
//! [`Board`] owns one instance of each. The control logic is generic over
//! the platform and never touches hardware directly.

use embedded_hal::delay::DelayNs;
use quintet_hal::{InputPin, SerialPort, SettingsStorage};

use crate::traits::{Buttons, Indicator, Motion, MotorDriver, ReceiveInterrupt, SystemControl};

/// Concrete collaborator types of a board
pub trait Platform {
    type Indicator: Indicator;
    type Buttons: Buttons;
    /// Filament presence sensor in the selector
    type Sensor: InputPin;
    type Motion: Motion;
    type Driver: MotorDriver;
    /// Link to the printer
    type Serial: SerialPort;
    type RxIrq: ReceiveInterrupt;
    type Delay: DelayNs;
    type Storage: SettingsStorage;
    type System: SystemControl;
}

/// Collaborator instances
pub struct Board<P: Platform> {
    pub indicator: P::Indicator,
    pub buttons: P::Buttons,
    pub sensor: P::Sensor,
    pub motion: P::Motion,
    pub driver: P::Driver,
    pub serial: P::Serial,
    pub rx_irq: P::RxIrq,
    pub delay: P::Delay,
    pub storage: P::Storage,
    pub system: P::System,
}

impl<P: Platform> Board<P> {
    /// True while filament blocks the selector sensor
    pub fn filament_present(&mut self) -> bool {
        self.sensor.is_high()
    }
}
