//! Chip-select devices on the shared driver SPI bus

use core::cell::RefCell;
use core::convert::Infallible;

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::{ErrorType, Operation, SpiBus, SpiDevice};
use embassy_time::block_for;
use embassy_time::Duration;

/// One driver on a bus shared through a `RefCell`
///
/// Everything runs on one execution context, so the bus is never borrowed
/// twice.
pub struct SharedSpiDevice<'a, BUS, CS> {
    bus: &'a RefCell<BUS>,
    cs: CS,
}

impl<'a, BUS, CS> SharedSpiDevice<'a, BUS, CS>
where
    CS: OutputPin<Error = Infallible>,
{
    pub fn new(bus: &'a RefCell<BUS>, mut cs: CS) -> Self {
        cs.set_high().unwrap_or_else(|never| match never {});
        Self { bus, cs }
    }
}

impl<BUS, CS> ErrorType for SharedSpiDevice<'_, BUS, CS>
where
    BUS: SpiBus<u8>,
    CS: OutputPin<Error = Infallible>,
{
    type Error = BUS::Error;
}

impl<BUS, CS> SpiDevice for SharedSpiDevice<'_, BUS, CS>
where
    BUS: SpiBus<u8>,
    CS: OutputPin<Error = Infallible>,
{
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
        let mut bus = self.bus.borrow_mut();
        self.cs.set_low().unwrap_or_else(|never| match never {});

        let result = operations.iter_mut().try_for_each(|op| match op {
            Operation::Read(buf) => bus.read(buf),
            Operation::Write(buf) => bus.write(buf),
            Operation::Transfer(read, write) => bus.transfer(read, write),
            Operation::TransferInPlace(buf) => bus.transfer_in_place(buf),
            Operation::DelayNs(ns) => {
                block_for(Duration::from_micros(u64::from(ns.div_ceil(1000))));
                Ok(())
            }
        });
        let flushed = bus.flush();

        self.cs.set_high().unwrap_or_else(|never| match never {});
        result.and(flushed)
    }
}
