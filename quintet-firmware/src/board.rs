//! Concrete collaborator types of the RP2040 selector board
//!
//! Pin map:
//!
//! | Function                | GPIO           |
//! |-------------------------|----------------|
//! | Printer UART TX / RX    | 0 / 1          |
//! | Pulley STEP / DIR / DIAG| 2 / 3 / 8      |
//! | Selector STEP/DIR/DIAG  | 4 / 5 / 9      |
//! | Idler STEP / DIR / DIAG | 6 / 7 / 10     |
//! | Driver enable (low)     | 11             |
//! | LED shift data/clk/latch| 12 / 13 / 14   |
//! | Filament sensor         | 15             |
//! | Driver SPI MISO/SCK/MOSI| 16 / 18 / 19   |
//! | Driver CS pulley/sel/idl| 17 / 20 / 21   |
//! | Button ladder (ADC0)    | 26             |

use embassy_rp::gpio::Output;
use embassy_rp::peripherals::SPI0;
use embassy_rp::spi::{Blocking, Spi};
use embassy_time::Delay;
use quintet_core::Platform;
use quintet_drivers::indicator::Shr16;
use quintet_drivers::stepper::Tmc2130Bank;

use crate::bus::SharedSpiDevice;
use crate::inputs::{FilamentSensor, LadderButtons};
use crate::motion::Mechanics;
use crate::serial::{PrinterSerial, Uart0Interrupt};
use crate::storage::FlashSettings;
use crate::system::Rp2040System;

pub type DriverBus = Spi<'static, SPI0, Blocking>;
pub type DriverDevice = SharedSpiDevice<'static, DriverBus, Output<'static>>;

pub struct Rp2040Board;

impl Platform for Rp2040Board {
    type Indicator = Shr16<Output<'static>, Output<'static>, Output<'static>>;
    type Buttons = LadderButtons;
    type Sensor = FilamentSensor;
    type Motion = Mechanics;
    type Driver = Tmc2130Bank<DriverDevice>;
    type Serial = PrinterSerial;
    type RxIrq = Uart0Interrupt;
    type Delay = Delay;
    type Storage = FlashSettings;
    type System = Rp2040System;
}
