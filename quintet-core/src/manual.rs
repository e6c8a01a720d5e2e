//! Manual control while the printer is idle
//!
//! Left and right step the selection across the slots and the park
//! position. Middle primes the active slot, but only if the button is
//! still held on a second sample.

use embedded_hal::delay::DelayNs;

use crate::board::{Board, Platform};
use crate::config::{PARK_BLINK_MS, PARK_POSITION};
use crate::dispatch::Dispatcher;
use crate::led::LedPattern;
use crate::state::{FaultCode, OperationalState};
use crate::traits::{Button, Buttons, Indicator};

/// One pass of the manual loop
pub fn run<P: Platform>(
    board: &mut Board<P>,
    state: &mut OperationalState,
    dispatcher: &Dispatcher,
) -> Result<(), FaultCode> {
    show_active(board, state);

    let active = state.active_extruder;
    match board.buttons.clicked() {
        Some(Button::Right) if active < PARK_POSITION => {
            dispatcher.select(board, state, active + 1)?;
        }
        Some(Button::Left) if active > 0 => {
            dispatcher.select(board, state, active - 1)?;
        }
        Some(Button::Middle) if !state.is_parked() => {
            board.indicator.set(LedPattern::slot_red(active));
            if board.buttons.clicked() == Some(Button::Middle) {
                let _primed = dispatcher.feed(board, state)?;
                #[cfg(feature = "defmt")]
                defmt::info!("Manual feed of slot {}: primed={}", active, _primed);
            }
        }
        _ => {}
    }
    Ok(())
}

/// Light the active slot green, or blink the park pattern
fn show_active<P: Platform>(board: &mut Board<P>, state: &OperationalState) {
    if state.is_parked() {
        board.indicator.set(LedPattern::PARK_RED);
        board.delay.delay_ms(PARK_BLINK_MS);
        board.indicator.set(LedPattern::PARK_GREEN);
        board.delay.delay_ms(PARK_BLINK_MS);
    } else {
        board.indicator.set(LedPattern::slot_green(state.active_extruder));
    }
}
