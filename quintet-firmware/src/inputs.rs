//! Filament sensor and front panel buttons

use embassy_rp::adc::{Adc, Blocking, Channel};
use embassy_rp::gpio::Input;
use embassy_time::{block_for, Duration};
use quintet_core::traits::{Button, Buttons};
use quintet_hal::InputPin;

/// Optical sensor in the selector, high while filament blocks it
pub struct FilamentSensor {
    pin: Input<'static>,
}

impl FilamentSensor {
    pub fn new(pin: Input<'static>) -> Self {
        Self { pin }
    }
}

impl InputPin for FilamentSensor {
    fn is_high(&mut self) -> bool {
        self.pin.is_high()
    }
}

/// 12-bit reading bands of the resistor ladder, lowest first
const LADDER: [(u16, u16, Button); 3] = [
    (0, 400, Button::Right),
    (900, 1500, Button::Middle),
    (1900, 2600, Button::Left),
];

/// Time between the two samples that must agree
const DEBOUNCE: Duration = Duration::from_millis(2);

/// Decode one ADC reading
pub fn decode(raw: u16) -> Option<Button> {
    LADDER
        .iter()
        .find(|(low, high, _)| (*low..=*high).contains(&raw))
        .map(|(_, _, button)| *button)
}

/// Three buttons sharing one ADC pin
pub struct LadderButtons {
    adc: Adc<'static, Blocking>,
    channel: Channel<'static>,
}

impl LadderButtons {
    pub fn new(adc: Adc<'static, Blocking>, channel: Channel<'static>) -> Self {
        Self { adc, channel }
    }

    fn sample(&mut self) -> Option<Button> {
        match self.adc.blocking_read(&mut self.channel) {
            Ok(raw) => decode(raw),
            Err(_e) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("Button ADC read failed: {:?}", _e);
                None
            }
        }
    }
}

impl Buttons for LadderButtons {
    fn init(&mut self) {
        // Settle the sample-and-hold after power-up.
        let _ = self.sample();
    }

    fn clicked(&mut self) -> Option<Button> {
        let first = self.sample()?;
        block_for(DEBOUNCE);
        (self.sample() == Some(first)).then_some(first)
    }
}
