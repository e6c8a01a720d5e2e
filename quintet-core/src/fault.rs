//! Fault indication
//!
//! A fault is terminal. [`escalate`] is the production boundary: it shows
//! the fault pattern for one second, blanks for two, and never returns.

use embedded_hal::delay::DelayNs;

use crate::config::{FAULT_OFF_MS, FAULT_ON_MS};
use crate::led::LedPattern;
use crate::state::FaultCode;
use crate::traits::Indicator;

/// One period of the fault pattern
pub fn blink_once<I: Indicator, D: DelayNs>(indicator: &mut I, delay: &mut D, code: FaultCode) {
    indicator.set(LedPattern::fault(code));
    delay.delay_ms(FAULT_ON_MS);
    indicator.set(LedPattern::OFF);
    delay.delay_ms(FAULT_OFF_MS);
}

/// Show the fault pattern until an external reset
pub fn escalate<I: Indicator, D: DelayNs>(indicator: &mut I, delay: &mut D, code: FaultCode) -> ! {
    #[cfg(feature = "defmt")]
    defmt::error!("Fault: {:?}", code);
    loop {
        blink_once(indicator, delay, code);
    }
}
