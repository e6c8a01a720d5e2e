//! Filament operation dispatcher
//!
//! Compound filament actions built from motion primitives and the
//! selector's filament sensor. Every operation blocks until the filament
//! has physically arrived (or failed to). Mechanical failures, including
//! exhausted retries, come back as a [`FaultCode`] for the caller to
//! escalate. The only soft failure is [`Dispatcher::cut_tip`] finding no
//! filament to cut.
//!
//! Operations that need an engaged slot do nothing while the selector is
//! parked.

use crate::board::{Board, Platform};
use crate::config::PARK_POSITION;
use crate::state::{FaultCode, OperationalState};
use crate::traits::{Motion, PulleyDirection, PulleySpeed};

/// Travel distances in millimetres and retry counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DispatchConfig {
    /// Pulley step between sensor samples
    pub step_mm: u16,
    /// Longest feed while waiting for the sensor to trigger
    pub sensor_seek_mm: u16,
    /// Selector to extruder gears
    pub bowden_length_mm: u16,
    /// Longest retract while waiting for the sensor to clear
    pub unload_seek_mm: u16,
    /// Retract after the sensor clears so the selector can move freely
    pub selector_clearance_mm: u16,
    /// Reverse travel between two seek attempts
    pub retry_backoff_mm: u16,
    /// Push into the extruder gears on `C0`
    pub extruder_grip_mm: u16,
    /// Tip length pushed past the sensor before cutting
    pub cut_overhang_mm: u16,
    /// Retract that pushes an ejected strand out of the unit
    pub eject_mm: u16,
    /// Seek attempts before a load faults
    pub load_attempts: u8,
    /// Seek attempts before an unload faults
    pub unload_attempts: u8,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            step_mm: 2,
            sensor_seek_mm: 120,
            bowden_length_mm: 427,
            unload_seek_mm: 500,
            selector_clearance_mm: 25,
            retry_backoff_mm: 10,
            extruder_grip_mm: 30,
            cut_overhang_mm: 8,
            eject_mm: 60,
            load_attempts: 3,
            unload_attempts: 3,
        }
    }
}

/// Filament operation dispatcher
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(config: DispatchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Move selector and idler to `slot` (park position allowed)
    pub fn select<P: Platform>(
        &self,
        board: &mut Board<P>,
        state: &mut OperationalState,
        slot: u8,
    ) -> Result<(), FaultCode> {
        board.motion.select(slot)?;
        state.active_extruder = slot;
        Ok(())
    }

    /// Prime the active slot: bring the tip to the sensor and back behind
    /// the selector
    ///
    /// Returns whether the filament reached the sensor.
    pub fn feed<P: Platform>(
        &self,
        board: &mut Board<P>,
        state: &OperationalState,
    ) -> Result<bool, FaultCode> {
        if state.is_parked() {
            return Ok(false);
        }

        board.motion.set_idler(true)?;
        let primed = self.seek(board, PulleyDirection::Feed, true, self.config.sensor_seek_mm)?;
        if primed {
            self.clear_selector(board)?;
        }
        board.motion.set_idler(false)?;
        Ok(primed)
    }

    /// Feed the active slot until the sensor triggers, then through the
    /// bowden tube
    pub fn load_with_sensor<P: Platform>(
        &self,
        board: &mut Board<P>,
        state: &mut OperationalState,
    ) -> Result<(), FaultCode> {
        if state.is_parked() {
            return Ok(());
        }

        board.motion.set_idler(true)?;
        let mut found = false;
        for _attempt in 0..self.config.load_attempts {
            if self.seek(board, PulleyDirection::Feed, true, self.config.sensor_seek_mm)? {
                found = true;
                break;
            }
            #[cfg(feature = "defmt")]
            defmt::warn!("Load attempt {} missed the sensor", _attempt + 1);
            board.motion.pulley(
                PulleyDirection::Retract,
                self.config.retry_backoff_mm,
                PulleySpeed::Slow,
            )?;
        }
        if !found {
            return Err(FaultCode::LoadFailed);
        }

        board.motion.pulley(
            PulleyDirection::Feed,
            self.config.bowden_length_mm,
            PulleySpeed::Fast,
        )?;
        board.motion.set_idler(false)?;
        state.is_filament_loaded = true;
        state.loaded_slot = state.active_extruder;
        Ok(())
    }

    /// Retract until the sensor clears, then clear the selector
    ///
    /// A loaded strand is retracted through its own slot even when the
    /// selection has moved on since it was loaded; the selection is
    /// restored afterwards. Clears `is_filament_loaded` and `is_printing`.
    pub fn unload_with_sensor<P: Platform>(
        &self,
        board: &mut Board<P>,
        state: &mut OperationalState,
    ) -> Result<(), FaultCode> {
        let slot = if state.is_filament_loaded {
            state.loaded_slot
        } else {
            state.active_extruder
        };

        if slot != PARK_POSITION {
            let away = slot != state.active_extruder;
            if away {
                #[cfg(feature = "defmt")]
                defmt::debug!("Returning to slot {} to unload", slot);
                board.motion.select(slot)?;
            }

            board.motion.set_idler(true)?;
            let mut cleared = false;
            for _attempt in 0..self.config.unload_attempts {
                if self.seek(
                    board,
                    PulleyDirection::Retract,
                    false,
                    self.config.unload_seek_mm,
                )? {
                    cleared = true;
                    break;
                }
                #[cfg(feature = "defmt")]
                defmt::warn!("Unload attempt {} left filament at the sensor", _attempt + 1);
                board.motion.pulley(
                    PulleyDirection::Feed,
                    self.config.retry_backoff_mm,
                    PulleySpeed::Slow,
                )?;
            }
            if !cleared {
                return Err(FaultCode::UnloadFailed);
            }

            board.motion.pulley(
                PulleyDirection::Retract,
                self.config.selector_clearance_mm,
                PulleySpeed::Slow,
            )?;
            board.motion.set_idler(false)?;

            if away {
                board.motion.select(state.active_extruder)?;
            }
        }

        state.is_filament_loaded = false;
        state.is_printing = false;
        Ok(())
    }

    /// Printer-driven tool change
    ///
    /// Staying on the loaded slot is a no-op. Leaving a loaded slot
    /// unloads it first. Ends with the new slot loaded and
    /// `is_printing` set.
    pub fn switch_with_sensor<P: Platform>(
        &self,
        board: &mut Board<P>,
        state: &mut OperationalState,
        slot: u8,
    ) -> Result<(), FaultCode> {
        if state.is_filament_loaded && state.loaded_slot == slot {
            if state.active_extruder != slot {
                self.select(board, state, slot)?;
            }
        } else {
            if state.is_filament_loaded {
                self.unload_with_sensor(board, state)?;
            }
            self.select(board, state, slot)?;
            self.load_with_sensor(board, state)?;
        }
        state.is_printing = true;
        Ok(())
    }

    /// Push the loaded strand into the extruder gears
    pub fn load_into_extruder<P: Platform>(
        &self,
        board: &mut Board<P>,
        state: &OperationalState,
    ) -> Result<(), FaultCode> {
        if state.is_parked() {
            return Ok(());
        }
        board.motion.set_idler(true)?;
        board.motion.pulley(
            PulleyDirection::Feed,
            self.config.extruder_grip_mm,
            PulleySpeed::Slow,
        )?;
        board.motion.set_idler(false)?;
        Ok(())
    }

    /// Trim a damaged tip with the selector blade
    ///
    /// Returns `false` when no filament reaches the blade. A loaded strand
    /// is pulled back first; `is_printing` is left as it was.
    pub fn cut_tip<P: Platform>(
        &self,
        board: &mut Board<P>,
        state: &mut OperationalState,
    ) -> Result<bool, FaultCode> {
        if state.is_parked() {
            return Ok(false);
        }

        if state.is_filament_loaded {
            let printing = state.is_printing;
            self.unload_with_sensor(board, state)?;
            state.is_printing = printing;
        }

        board.motion.set_idler(true)?;
        if !self.seek(board, PulleyDirection::Feed, true, self.config.sensor_seek_mm)? {
            board.motion.set_idler(false)?;
            return Ok(false);
        }

        board.motion.pulley(
            PulleyDirection::Feed,
            self.config.cut_overhang_mm,
            PulleySpeed::Slow,
        )?;
        board.motion.cut()?;
        self.clear_selector(board)?;
        board.motion.set_idler(false)?;
        Ok(true)
    }

    /// Push the strand of `slot` out of the back of the unit
    ///
    /// The idler stays engaged until [`Dispatcher::recover_after_eject`].
    pub fn eject<P: Platform>(
        &self,
        board: &mut Board<P>,
        state: &mut OperationalState,
        slot: u8,
    ) -> Result<(), FaultCode> {
        if state.is_filament_loaded {
            self.unload_with_sensor(board, state)?;
        }
        self.select(board, state, slot)?;
        board.motion.park_selector()?;
        board.motion.set_idler(true)?;
        board.motion.pulley(
            PulleyDirection::Retract,
            self.config.eject_mm,
            PulleySpeed::Fast,
        )?;
        Ok(())
    }

    /// Release the idler and bring the selector back to the active slot
    pub fn recover_after_eject<P: Platform>(
        &self,
        board: &mut Board<P>,
        state: &OperationalState,
    ) -> Result<(), FaultCode> {
        board.motion.set_idler(false)?;
        board.motion.select(state.active_extruder)?;
        Ok(())
    }

    /// Run the pulley in steps until the sensor reads `present`
    fn seek<P: Platform>(
        &self,
        board: &mut Board<P>,
        direction: PulleyDirection,
        present: bool,
        max_mm: u16,
    ) -> Result<bool, FaultCode> {
        let mut travelled = 0;
        while travelled < max_mm {
            if board.filament_present() == present {
                return Ok(true);
            }
            board
                .motion
                .pulley(direction, self.config.step_mm, PulleySpeed::Slow)?;
            travelled += self.config.step_mm;
        }
        Ok(board.filament_present() == present)
    }

    /// Pull the tip back past the sensor and clear of the selector
    fn clear_selector<P: Platform>(&self, board: &mut Board<P>) -> Result<(), FaultCode> {
        if !self.seek(
            board,
            PulleyDirection::Retract,
            false,
            self.config.sensor_seek_mm,
        )? {
            return Err(FaultCode::UnloadFailed);
        }
        board.motion.pulley(
            PulleyDirection::Retract,
            self.config.selector_clearance_mm,
            PulleySpeed::Slow,
        )?;
        Ok(())
    }
}
