//! Printer link on UART0
//!
//! The buffered UART is filled from the UART0 interrupt. Receive is gated
//! by the UART's own receive and receive-timeout interrupt sources, so the
//! transmit side keeps draining replies while receive is masked. Masked
//! bytes wait in the 32-byte hardware FIFO.

use embassy_rp::pac;
use embassy_rp::uart::BufferedUart;
use embedded_io::{Read, ReadReady, Write};
use quintet_core::traits::ReceiveInterrupt;
use quintet_hal::{SerialPort, UartConfig, UartRx, UartTx};

/// Blocking view of the buffered printer UART
pub struct PrinterSerial {
    uart: BufferedUart,
}

impl PrinterSerial {
    pub fn new(uart: BufferedUart) -> Self {
        Self { uart }
    }
}

impl UartTx for PrinterSerial {
    type Error = embassy_rp::uart::Error;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.uart.write_all(data)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Write::flush(&mut self.uart)
    }
}

impl UartRx for PrinterSerial {
    fn try_read_byte(&mut self) -> Option<u8> {
        if !self.uart.read_ready().unwrap_or(false) {
            return None;
        }
        let mut byte = [0u8; 1];
        match self.uart.read(&mut byte) {
            Ok(1) => Some(byte[0]),
            _ => None,
        }
    }
}

impl SerialPort for PrinterSerial {
    fn init(&mut self, config: &UartConfig) {
        // Frame format is fixed at construction; only the rate is applied here.
        self.uart.set_baudrate(config.baudrate);

        // Drop anything the printer sent while we were booting.
        while self.try_read_byte().is_some() {}

        #[cfg(feature = "defmt")]
        defmt::info!("Printer link at {} baud", config.baudrate);
    }
}

/// Receive interrupt sources of UART0
pub struct Uart0Interrupt {
    enabled: bool,
}

impl Uart0Interrupt {
    /// The buffered driver unmasks receive when it starts
    pub fn new() -> Self {
        Self { enabled: true }
    }

    fn set_receive_mask(&mut self, enabled: bool) {
        pac::UART0.uartimsc().modify(|w| {
            w.set_rxim(enabled);
            w.set_rtim(enabled);
        });
        self.enabled = enabled;
    }
}

impl ReceiveInterrupt for Uart0Interrupt {
    fn enable(&mut self) {
        self.set_receive_mask(true);
    }

    fn disable(&mut self) {
        self.set_receive_mask(false);
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}
