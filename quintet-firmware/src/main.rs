//! Quintet - filament selector firmware
//!
//! Binds the RP2040 peripherals to the selector collaborators and hands
//! control to the blocking main cycle in `quintet-core`.

#![no_std]
#![no_main]

use core::cell::RefCell;

use embassy_executor::Spawner;
use embassy_rp::adc::{self, Adc, Channel};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::{PIO0, UART0};
use embassy_rp::pio::Pio;
use embassy_rp::spi::{self, Spi};
use embassy_rp::uart::{self, BufferedInterruptHandler, Uart};
use embassy_rp::watchdog::Watchdog;
use embassy_time::Delay;
use static_cell::StaticCell;
#[cfg(feature = "defmt")]
use {defmt_rtt as _, panic_probe as _};

use quintet_core::{Board, Selector};
use quintet_drivers::indicator::Shr16;
use quintet_drivers::stepper::{Tmc2130Bank, Tmc2130Config};
use quintet_hal::uart::{DataBits, Parity, StopBits};
use quintet_hal::UartConfig;

use crate::board::{DriverBus, Rp2040Board};
use crate::bus::SharedSpiDevice;
use crate::inputs::{FilamentSensor, LadderButtons};
use crate::motion::Mechanics;
use crate::serial::{PrinterSerial, Uart0Interrupt};
use crate::stepper::PioAxis;
use crate::storage::FlashSettings;
use crate::system::Rp2040System;

mod board;
mod bus;
mod inputs;
mod motion;
mod serial;
mod stepper;
mod storage;
mod system;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
    PIO0_IRQ_0 => embassy_rp::pio::InterruptHandler<PIO0>;
});

// UART ring buffers (must live forever)
static TX_BUF: StaticCell<[u8; 64]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 64]> = StaticCell::new();

static DRIVER_BUS: StaticCell<RefCell<DriverBus>> = StaticCell::new();

/// TMC2130 SPI clock
const DRIVER_SPI_HZ: u32 = 1_000_000;

fn uart_config(config: &UartConfig) -> uart::Config {
    let mut out = uart::Config::default();
    out.baudrate = config.baudrate;
    out.data_bits = match config.data_bits {
        DataBits::Seven => uart::DataBits::DataBits7,
        DataBits::Eight => uart::DataBits::DataBits8,
    };
    out.parity = match config.parity {
        Parity::None => uart::Parity::ParityNone,
        Parity::Even => uart::Parity::ParityEven,
        Parity::Odd => uart::Parity::ParityOdd,
    };
    out.stop_bits = match config.stop_bits {
        StopBits::One => uart::StopBits::STOP1,
        StopBits::Two => uart::StopBits::STOP2,
    };
    out
}

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    #[cfg(feature = "defmt")]
    defmt::info!("Quintet firmware starting...");

    let p = embassy_rp::init(Default::default());

    // Printer link
    let tx_buf = TX_BUF.init([0u8; 64]);
    let rx_buf = RX_BUF.init([0u8; 64]);
    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config(&UartConfig::default()));
    let serial = PrinterSerial::new(uart.into_buffered(Irqs, tx_buf, rx_buf));

    // Step generation
    let Pio {
        mut common,
        sm0,
        sm1,
        sm2,
        ..
    } = Pio::new(p.PIO0, Irqs);
    let program = stepper::load_program(&mut common);

    let pulley = PioAxis::new(
        &mut common,
        sm0,
        &program,
        p.PIN_2,
        Output::new(p.PIN_3, Level::Low),
        Input::new(p.PIN_8, Pull::Down),
        false,
    );
    let selector = PioAxis::new(
        &mut common,
        sm1,
        &program,
        p.PIN_4,
        Output::new(p.PIN_5, Level::Low),
        Input::new(p.PIN_9, Pull::Down),
        true,
    );
    let idler = PioAxis::new(
        &mut common,
        sm2,
        &program,
        p.PIN_6,
        Output::new(p.PIN_7, Level::Low),
        Input::new(p.PIN_10, Pull::Down),
        false,
    );
    // Drivers stay disabled until the motion bus is brought up.
    let enable = Output::new(p.PIN_11, Level::High);
    let motion = Mechanics::new(pulley, selector, idler, enable);

    // Driver configuration bus, SPI mode 3
    let mut spi_config = spi::Config::default();
    spi_config.frequency = DRIVER_SPI_HZ;
    spi_config.phase = spi::Phase::CaptureOnSecondTransition;
    spi_config.polarity = spi::Polarity::IdleHigh;
    let bus = DRIVER_BUS.init(RefCell::new(Spi::new_blocking(
        p.SPI0, p.PIN_18, p.PIN_19, p.PIN_16, spi_config,
    )));
    let driver = Tmc2130Bank::new(
        [
            SharedSpiDevice::new(bus, Output::new(p.PIN_17, Level::High)),
            SharedSpiDevice::new(bus, Output::new(p.PIN_20, Level::High)),
            SharedSpiDevice::new(bus, Output::new(p.PIN_21, Level::High)),
        ],
        Tmc2130Config::default(),
    );

    let indicator = Shr16::new(
        Output::new(p.PIN_12, Level::Low),
        Output::new(p.PIN_13, Level::Low),
        Output::new(p.PIN_14, Level::High),
    );

    let buttons = LadderButtons::new(
        Adc::new_blocking(p.ADC, adc::Config::default()),
        Channel::new_pin(p.PIN_26, Pull::None),
    );

    let board: Board<Rp2040Board> = Board {
        indicator,
        buttons,
        sensor: FilamentSensor::new(Input::new(p.PIN_15, Pull::Down)),
        motion,
        driver,
        serial,
        rx_irq: Uart0Interrupt::new(),
        delay: Delay,
        storage: FlashSettings::new(p.FLASH, p.DMA_CH0),
        system: Rp2040System::new(Watchdog::new(p.WATCHDOG)),
    };

    #[cfg(feature = "defmt")]
    defmt::info!("Peripherals bound, entering main cycle");

    Selector::new(board).run()
}
