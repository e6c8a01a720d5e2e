//! Status LEDs on two chained 74HC595 shift registers
//!
//! The 16-bit chain is shifted out MSB first and latched in one go. LEDs
//! occupy the upper ten outputs; the slot-0 pair sits on bits 8-9 of the
//! logical pattern but on outputs 6-7 of the chain, so the pattern is
//! remapped before shifting. The lower six outputs are left as they were.

use core::convert::Infallible;

use embedded_hal::digital::OutputPin;
use quintet_core::led::LedPattern;
use quintet_core::traits::Indicator;

/// Outputs wired to LEDs
pub const LED_MASK: u16 = 0xFFC0;

/// Map a logical LED pattern onto chain outputs
pub fn led_outputs(pattern: LedPattern) -> u16 {
    let bits = pattern.bits();
    ((bits & 0x00FF) << 8) | ((bits & 0x0300) >> 2)
}

fn drive<P: OutputPin<Error = Infallible>>(pin: &mut P, high: bool) {
    let result = if high { pin.set_high() } else { pin.set_low() };
    result.unwrap_or_else(|never| match never {})
}

/// Shift register chain driving the indicator
pub struct Shr16<D, C, L> {
    data: D,
    clock: C,
    latch: L,
    value: u16,
}

impl<D, C, L> Shr16<D, C, L>
where
    D: OutputPin<Error = Infallible>,
    C: OutputPin<Error = Infallible>,
    L: OutputPin<Error = Infallible>,
{
    pub fn new(data: D, clock: C, latch: L) -> Self {
        Self {
            data,
            clock,
            latch,
            value: 0,
        }
    }

    /// Last value latched onto the outputs
    pub fn value(&self) -> u16 {
        self.value
    }

    /// Shift out and latch all 16 outputs
    pub fn write(&mut self, value: u16) {
        drive(&mut self.latch, false);
        for bit in (0..16).rev() {
            drive(&mut self.data, value & (1 << bit) != 0);
            drive(&mut self.clock, true);
            drive(&mut self.clock, false);
        }
        drive(&mut self.latch, true);
        self.value = value;
    }
}

impl<D, C, L> Indicator for Shr16<D, C, L>
where
    D: OutputPin<Error = Infallible>,
    C: OutputPin<Error = Infallible>,
    L: OutputPin<Error = Infallible>,
{
    fn init(&mut self) {
        drive(&mut self.clock, false);
        drive(&mut self.latch, true);
        self.write(0);
    }

    fn set(&mut self, pattern: LedPattern) {
        let value = (self.value & !LED_MASK) | led_outputs(pattern);
        self.write(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::digital::ErrorType;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Shift register model fed by the three pins
    #[derive(Default)]
    struct Chain {
        data: bool,
        clock: bool,
        shift: u16,
        latched: Vec<u16>,
    }

    #[derive(Clone, Copy)]
    enum Role {
        Data,
        Clock,
        Latch,
    }

    struct Pin(Rc<RefCell<Chain>>, Role);

    impl ErrorType for Pin {
        type Error = Infallible;
    }

    impl OutputPin for Pin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            let mut chain = self.0.borrow_mut();
            match self.1 {
                Role::Data => chain.data = false,
                Role::Clock => chain.clock = false,
                Role::Latch => {}
            }
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            let mut chain = self.0.borrow_mut();
            match self.1 {
                Role::Data => chain.data = true,
                Role::Clock => {
                    if !chain.clock {
                        chain.shift = (chain.shift << 1) | u16::from(chain.data);
                    }
                    chain.clock = true;
                }
                Role::Latch => {
                    let value = chain.shift;
                    chain.latched.push(value);
                }
            }
            Ok(())
        }
    }

    fn chain() -> (Rc<RefCell<Chain>>, Shr16<Pin, Pin, Pin>) {
        let state = Rc::new(RefCell::new(Chain::default()));
        let shr = Shr16::new(
            Pin(state.clone(), Role::Data),
            Pin(state.clone(), Role::Clock),
            Pin(state.clone(), Role::Latch),
        );
        (state, shr)
    }

    #[test]
    fn test_led_remap() {
        assert_eq!(led_outputs(LedPattern::slot_green(0)), 0x0040);
        assert_eq!(led_outputs(LedPattern::slot_red(0)), 0x0080);
        assert_eq!(led_outputs(LedPattern::slot_green(4)), 0x0100);
        assert_eq!(led_outputs(LedPattern::FILAMENT_PRESENT) & !LED_MASK, 0);
        assert_eq!(led_outputs(LedPattern::FILAMENT_REMOVED) & !LED_MASK, 0);
    }

    #[test]
    fn test_write_shifts_msb_first() {
        let (state, mut shr) = chain();
        shr.write(0xA5C3);
        assert_eq!(state.borrow().latched.last(), Some(&0xA5C3));
        assert_eq!(shr.value(), 0xA5C3);
    }

    #[test]
    fn test_set_preserves_non_led_outputs() {
        let (state, mut shr) = chain();
        shr.init();
        shr.write(0x0015);
        shr.set(LedPattern::slot_green(2));
        assert_eq!(
            state.borrow().latched.last(),
            Some(&(0x0015 | led_outputs(LedPattern::slot_green(2))))
        );

        shr.set(LedPattern::OFF);
        assert_eq!(shr.value(), 0x0015);
    }
}
