//! Front panel buttons

/// Front panel buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Button {
    Left,
    Middle,
    Right,
}

/// Button ladder reader
pub trait Buttons {
    /// Bring up the sampling hardware
    fn init(&mut self);

    /// Sample the buttons
    ///
    /// Returns the button held down at the time of the call, if any.
    /// Debouncing is the implementation's concern.
    fn clicked(&mut self) -> Option<Button>;
}
