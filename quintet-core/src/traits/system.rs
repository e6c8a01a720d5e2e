//! System-level controls

/// Resets and hand-offs that leave the normal control flow
pub trait SystemControl {
    /// Reset the unit
    ///
    /// On hardware this does not return.
    fn reset(&mut self);

    /// Run the interactive setup menu; returns when the operator leaves it
    fn enter_setup_menu(&mut self);
}

/// Mask for the serial receive interrupt
pub trait ReceiveInterrupt {
    fn enable(&mut self);
    fn disable(&mut self);
    fn is_enabled(&self) -> bool;
}
