//! Selector, idler and pulley mechanics
//!
//! Selector and idler are homed sensorless: they run towards their end stop
//! and the driver's stall flag marks the reference. Positions are counted in
//! microsteps from that reference.

use embassy_rp::gpio::Output;
use quintet_core::config::{EXTRUDERS, PARK_POSITION};
use quintet_core::traits::{Motion, MotionError, PulleyDirection, PulleySpeed};

use crate::stepper::{MoveEnd, PioAxis, StallPolicy};

/// Selector microsteps between adjacent slots
const SELECTOR_STEPS_PER_SLOT: i32 = 697;
/// Selector offset of slot 0 from the homed end
const SELECTOR_SLOT0: i32 = 120;
/// Blade sweep past the filament path when cutting
const SELECTOR_CUT_SWEEP: i32 = 400;

/// Idler microsteps between adjacent slots
const IDLER_STEPS_PER_SLOT: i32 = 355;
/// Idler offset of slot 0 from the homed end
const IDLER_SLOT0: i32 = 32;
/// Extra idler travel that lifts the bearing off the pulley
const IDLER_RELEASE: i32 = IDLER_STEPS_PER_SLOT / 2 + 40;

/// Longest travel tried before homing gives up
const SELECTOR_HOMING_TRAVEL: i32 = 4000;
const IDLER_HOMING_TRAVEL: i32 = 2000;

/// Pulley microsteps per millimetre of filament
const PULLEY_STEPS_PER_MM: i32 = 19;

const SELECTOR_HZ: u32 = 4000;
const SELECTOR_HOMING_HZ: u32 = 2000;
const IDLER_HZ: u32 = 2500;
const IDLER_HOMING_HZ: u32 = 1500;
const PULLEY_FAST_HZ: u32 = 3400;
const PULLEY_SLOW_HZ: u32 = 700;

fn selector_target(slot: u8) -> i32 {
    SELECTOR_SLOT0 + i32::from(slot) * SELECTOR_STEPS_PER_SLOT
}

fn idler_target(slot: u8, engaged: bool) -> i32 {
    let slot = slot.min(EXTRUDERS as u8 - 1);
    let base = IDLER_SLOT0 + i32::from(slot) * IDLER_STEPS_PER_SLOT;
    if engaged {
        base
    } else {
        base + IDLER_RELEASE
    }
}

/// The three axes and the shared driver enable line
pub struct Mechanics {
    pulley: PioAxis<'static, 0>,
    selector: PioAxis<'static, 1>,
    idler: PioAxis<'static, 2>,
    /// Active low enable shared by all drivers
    enable: Output<'static>,
    homed: bool,
    slot: u8,
    idler_engaged: bool,
}

impl Mechanics {
    pub fn new(
        pulley: PioAxis<'static, 0>,
        selector: PioAxis<'static, 1>,
        idler: PioAxis<'static, 2>,
        enable: Output<'static>,
    ) -> Self {
        Self {
            pulley,
            selector,
            idler,
            enable,
            homed: false,
            slot: 0,
            idler_engaged: false,
        }
    }

    fn ensure_homed(&self) -> Result<(), MotionError> {
        if self.homed {
            Ok(())
        } else {
            Err(MotionError::NotHomed)
        }
    }

    fn home_selector(&mut self) -> Result<(), MotionError> {
        match self
            .selector
            .move_by(-SELECTOR_HOMING_TRAVEL, SELECTOR_HOMING_HZ, StallPolicy::Stop)?
        {
            MoveEnd::Stalled => {
                self.selector.set_position(0);
                Ok(())
            }
            MoveEnd::Completed => Err(MotionError::HomingFailed),
        }
    }

    fn home_idler(&mut self) -> Result<(), MotionError> {
        match self
            .idler
            .move_by(-IDLER_HOMING_TRAVEL, IDLER_HOMING_HZ, StallPolicy::Stop)?
        {
            MoveEnd::Stalled => {
                self.idler.set_position(0);
                Ok(())
            }
            MoveEnd::Completed => Err(MotionError::HomingFailed),
        }
    }

    fn move_idler(&mut self, slot: u8, engaged: bool) -> Result<(), MotionError> {
        self.idler.move_to(idler_target(slot, engaged), IDLER_HZ)?;
        self.idler_engaged = engaged;
        Ok(())
    }
}

impl Motion for Mechanics {
    fn init_bus(&mut self) -> Result<(), MotionError> {
        self.enable.set_low();
        Ok(())
    }

    fn init_axes(&mut self) -> Result<(), MotionError> {
        self.homed = false;
        self.slot = 0;
        self.idler_engaged = false;
        self.pulley.set_position(0);
        Ok(())
    }

    fn home(&mut self) -> Result<(), MotionError> {
        // Idler first so the selector never drags filament under the bearing.
        self.home_idler()?;
        self.home_selector()?;
        self.homed = true;

        self.move_idler(0, false)?;
        self.selector.move_to(selector_target(0), SELECTOR_HZ)?;
        self.slot = 0;

        #[cfg(feature = "defmt")]
        defmt::info!("Selector and idler homed");
        Ok(())
    }

    fn select(&mut self, slot: u8) -> Result<(), MotionError> {
        self.ensure_homed()?;
        let slot = slot.min(PARK_POSITION);
        let engaged = self.idler_engaged && slot != PARK_POSITION;
        self.move_idler(slot, engaged)?;
        self.selector.move_to(selector_target(slot), SELECTOR_HZ)?;
        self.slot = slot;
        Ok(())
    }

    fn park_selector(&mut self) -> Result<(), MotionError> {
        self.ensure_homed()?;
        self.selector
            .move_to(selector_target(PARK_POSITION), SELECTOR_HZ)
    }

    fn set_idler(&mut self, engaged: bool) -> Result<(), MotionError> {
        self.ensure_homed()?;
        self.move_idler(self.slot, engaged)
    }

    fn pulley(
        &mut self,
        direction: PulleyDirection,
        mm: u16,
        speed: PulleySpeed,
    ) -> Result<(), MotionError> {
        let steps = i32::from(mm) * PULLEY_STEPS_PER_MM;
        let steps = match direction {
            PulleyDirection::Feed => steps,
            PulleyDirection::Retract => -steps,
        };
        let freq = match speed {
            PulleySpeed::Fast => PULLEY_FAST_HZ,
            PulleySpeed::Slow => PULLEY_SLOW_HZ,
        };
        match self.pulley.move_by(steps, freq, StallPolicy::Fault)? {
            MoveEnd::Completed => Ok(()),
            MoveEnd::Stalled => Err(MotionError::Stalled),
        }
    }

    fn cut(&mut self) -> Result<(), MotionError> {
        self.ensure_homed()?;
        let home = selector_target(self.slot);
        self.selector.move_to(home + SELECTOR_CUT_SWEEP, SELECTOR_HZ)?;
        self.selector.move_to(home, SELECTOR_HZ)
    }
}
