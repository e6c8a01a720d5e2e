//! Watchdog reset and setup menu hand-off

use embassy_rp::watchdog::Watchdog;
use quintet_core::traits::SystemControl;

pub struct Rp2040System {
    watchdog: Watchdog,
}

impl Rp2040System {
    pub fn new(watchdog: Watchdog) -> Self {
        Self { watchdog }
    }
}

impl SystemControl for Rp2040System {
    fn reset(&mut self) {
        #[cfg(feature = "defmt")]
        defmt::info!("Reset requested");
        self.watchdog.trigger_reset();
        loop {
            cortex_m::asm::wfi();
        }
    }

    fn enter_setup_menu(&mut self) {
        // The board has no setup menu; the request is only logged.
        #[cfg(feature = "defmt")]
        defmt::info!("Setup menu requested, none on this board");
    }
}
