//! GPIO pin abstractions

/// Digital input pin
///
/// Implementations read the pin level from the hardware. Reads take
/// `&mut self` so simulated inputs can advance their own state.
pub trait InputPin {
    /// Check if the pin reads high (logic 1)
    fn is_high(&mut self) -> bool;

    /// Check if the pin reads low (logic 0)
    fn is_low(&mut self) -> bool {
        !self.is_high()
    }

    /// Pin level as a wire digit (`0` or `1`)
    fn level(&mut self) -> u8 {
        u8::from(self.is_high())
    }
}
