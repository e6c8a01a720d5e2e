//! Power-on sequence
//!
//! Brings up the collaborators in a fixed order, blinking a distinct
//! indicator pattern after each of the first five phases, then homes the
//! axes once the selector is free of filament.

use embedded_hal::delay::DelayNs;
use quintet_hal::{SerialPort, UartConfig, UartTx};

use crate::board::{Board, Platform};
use crate::config::{Settings, BOOT_SETTLE_MS, SAFETY_BLINK_MS};
use crate::led::{BootPhase, LedPattern};
use crate::state::{FaultCode, OperationalState};
use crate::traits::{Button, Buttons, DriverProfile, Indicator, Motion, MotorDriver, SystemControl};

/// Banner sent once the link is up
pub const START_BANNER: &[u8] = b"start\n";

/// Result of a completed boot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BootOutcome {
    /// Middle button was held during bring-up
    pub menu_requested: bool,
    /// Settings restored from storage
    pub settings: Settings,
}

/// Run the boot sequence
///
/// Returns once the axes are homed and the drivers run in the persisted
/// mode. Blocks in the safety gate for as long as filament sits in the
/// selector.
pub fn run<P: Platform>(
    board: &mut Board<P>,
    state: &mut OperationalState,
) -> Result<BootOutcome, FaultCode> {
    board.indicator.init();
    blink_phase(board, BootPhase::Indicator);
    board.delay.delay_ms(BOOT_SETTLE_MS);

    board.serial.init(&UartConfig::default());
    if board.serial.write_blocking(START_BANNER).is_err() {
        #[cfg(feature = "defmt")]
        defmt::warn!("Failed to send start banner");
    }
    blink_phase(board, BootPhase::Serial);

    board.motion.init_bus()?;
    blink_phase(board, BootPhase::MotionBus);

    board.driver.init(DriverProfile::Homing)?;
    blink_phase(board, BootPhase::Driver);

    board.buttons.init();
    blink_phase(board, BootPhase::Sensor);

    board.motion.init_axes()?;

    let menu_requested = board.buttons.clicked() == Some(Button::Middle);

    safety_gate(board);

    #[cfg(feature = "defmt")]
    defmt::info!("Homing");
    board.motion.home()?;

    let settings = Settings::load(&mut board.storage);
    state.driver_mode = settings.driver_mode;
    board.driver.init(settings.driver_mode.profile())?;

    if menu_requested {
        #[cfg(feature = "defmt")]
        defmt::info!("Entering setup menu");
        board.system.enter_setup_menu();
    }

    Ok(BootOutcome {
        menu_requested,
        settings,
    })
}

/// Phase indication: on 40 ms, off 20 ms, on 40 ms, off 10 ms
pub fn blink_phase<P: Platform>(board: &mut Board<P>, phase: BootPhase) {
    let pattern = LedPattern::boot_phase(phase);
    board.indicator.set(pattern);
    board.delay.delay_ms(40);
    board.indicator.set(LedPattern::OFF);
    board.delay.delay_ms(20);
    board.indicator.set(pattern);
    board.delay.delay_ms(40);
    board.indicator.set(LedPattern::OFF);
    board.delay.delay_ms(10);
}

/// Block while filament sits in the selector
///
/// The operator pulls the strand and confirms with the right button. Red
/// means the sensor still sees filament, green means it is gone. The
/// sensor is checked again after every confirmation, so homing never
/// starts with filament in the selector.
pub fn safety_gate<P: Platform>(board: &mut Board<P>) {
    while board.filament_present() {
        #[cfg(feature = "defmt")]
        defmt::warn!("Filament in selector, waiting for removal");
        while board.buttons.clicked() != Some(Button::Right) {
            let pattern = if board.filament_present() {
                LedPattern::FILAMENT_PRESENT
            } else {
                LedPattern::FILAMENT_REMOVED
            };
            board.indicator.set(pattern);
            board.delay.delay_ms(SAFETY_BLINK_MS);
            board.indicator.set(LedPattern::OFF);
            board.delay.delay_ms(SAFETY_BLINK_MS);
        }
    }
}
