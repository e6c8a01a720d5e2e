//! Scoped receive-interrupt masking
//!
//! The serial receive interrupt may stage bytes only while the main cycle
//! is waiting between command processing and manual control. Indicator
//! writes and selection moves run inside a [`CriticalSection`], which
//! masks the interrupt on entry and restores the previous mask on every
//! exit path, including early returns through `?`.

use core::ops::{Deref, DerefMut};

use crate::board::{Board, Platform};
use crate::traits::ReceiveInterrupt;

/// Receive interrupt masked for the guard's lifetime
pub struct CriticalSection<'a, P: Platform> {
    board: &'a mut Board<P>,
    was_enabled: bool,
}

impl<'a, P: Platform> CriticalSection<'a, P> {
    /// Mask the receive interrupt
    pub fn enter(board: &'a mut Board<P>) -> Self {
        let was_enabled = board.rx_irq.is_enabled();
        board.rx_irq.disable();
        Self { board, was_enabled }
    }
}

impl<P: Platform> Deref for CriticalSection<'_, P> {
    type Target = Board<P>;

    fn deref(&self) -> &Board<P> {
        self.board
    }
}

impl<P: Platform> DerefMut for CriticalSection<'_, P> {
    fn deref_mut(&mut self) -> &mut Board<P> {
        self.board
    }
}

impl<P: Platform> Drop for CriticalSection<'_, P> {
    fn drop(&mut self) {
        if self.was_enabled {
            self.board.rx_irq.enable();
        }
    }
}
