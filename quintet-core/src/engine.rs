//! Serial command engine
//!
//! Each call to [`CommandEngine::poll`] takes at most one staged byte from
//! the link. Complete lines are lexed into a [`Command`], checked against
//! the verb's guard and executed through the [`Dispatcher`]. Lines that do
//! not parse or fail their guard are dropped without a reply.

use embedded_hal::delay::DelayNs;
use quintet_hal::{InputPin, UartRx, UartTx};
use quintet_protocol::{parse, Command, LineError, LineFramer, Response};

use crate::board::{Board, Platform};
use crate::config::{
    FW_BUILD, FW_VERSION, LOAD_FEED_SETTLE_MS, LOAD_SELECT_SETTLE_MS, UNLOAD_SETTLE_MS,
};
use crate::dispatch::Dispatcher;
use crate::state::{DriverMode, FaultCode, FilamentType, OperationalState};
use crate::traits::{MotorDriver, SystemControl};

/// Line framer plus command execution
#[derive(Debug, Clone, Default)]
pub struct CommandEngine {
    framer: LineFramer,
}

impl CommandEngine {
    pub fn new() -> Self {
        Self {
            framer: LineFramer::new(),
        }
    }

    /// True while the tail of an overlong line is being dropped
    pub fn is_discarding(&self) -> bool {
        self.framer.is_discarding()
    }

    /// Consume at most one pending byte
    ///
    /// Returns the reply that was written, if a line completed and was
    /// answered. A mechanical failure inside a command is returned as the
    /// fault to escalate; no reply is written for that command.
    pub fn poll<P: Platform>(
        &mut self,
        board: &mut Board<P>,
        state: &mut OperationalState,
        dispatcher: &Dispatcher,
    ) -> Result<Option<Response>, FaultCode> {
        let Some(byte) = board.serial.try_read_byte() else {
            return Ok(None);
        };

        let line = match self.framer.feed(byte) {
            Ok(Some(line)) => line,
            Ok(None) => return Ok(None),
            Err(LineError::Overflow) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("Command line overflow, discarding until terminator");
                return Ok(None);
            }
        };

        let Some(command) = parse(&line) else {
            #[cfg(feature = "defmt")]
            defmt::debug!("Unrecognized line: {=[u8]:a}", line.as_slice());
            return Ok(None);
        };

        #[cfg(feature = "defmt")]
        defmt::debug!("Command: {:?}", command);

        let response = execute(command, board, state, dispatcher)?;
        if let Some(response) = response {
            reply(board, response);
        }
        Ok(response)
    }
}

fn reply<P: Platform>(board: &mut Board<P>, response: Response) {
    let encoded = response.encode();
    if board.serial.write_blocking(encoded.as_bytes()).is_err() {
        #[cfg(feature = "defmt")]
        defmt::warn!("Failed to send {:?}", response);
        return;
    }
    // Nothing useful to do if the flush fails; the peer will resend
    let _ = board.serial.flush();
}

/// Apply guards and run one command
///
/// `Ok(None)` means the command was rejected or produces no reply.
fn execute<P: Platform>(
    command: Command,
    board: &mut Board<P>,
    state: &mut OperationalState,
    dispatcher: &Dispatcher,
) -> Result<Option<Response>, FaultCode> {
    match command {
        Command::Select(n) => {
            let Some(slot) = OperationalState::slot_index(n) else {
                return Ok(None);
            };
            dispatcher.switch_with_sensor(board, state, slot)?;
            Ok(Some(Response::Ok))
        }

        Command::Load(n) => {
            let Some(slot) = OperationalState::slot_index(n) else {
                return Ok(None);
            };
            if state.is_filament_loaded {
                return Ok(None);
            }
            dispatcher.select(board, state, slot)?;
            board.delay.delay_ms(LOAD_SELECT_SETTLE_MS);
            if !dispatcher.feed(board, state)? {
                #[cfg(feature = "defmt")]
                defmt::warn!("Load of slot {}: filament never reached the sensor", slot);
            }
            board.delay.delay_ms(LOAD_FEED_SETTLE_MS);
            Ok(Some(Response::Ok))
        }

        Command::SetMode(m) => {
            let Some(mode) = DriverMode::from_operand(m) else {
                return Ok(None);
            };
            state.driver_mode = mode;
            board.driver.init(mode.profile())?;
            #[cfg(feature = "defmt")]
            defmt::info!("Driver mode {:?}", mode);
            Ok(Some(Response::Ok))
        }

        Command::Unload(_) => {
            dispatcher.unload_with_sensor(board, state)?;
            board.delay.delay_ms(UNLOAD_SETTLE_MS);
            Ok(Some(Response::Ok))
        }

        Command::Reset(0) => {
            board.system.reset();
            Ok(None)
        }

        Command::Probe(0) => Ok(Some(Response::Value(i32::from(board.sensor.level())))),

        Command::Status(0) => Ok(Some(Response::Ok)),
        Command::Status(1) => Ok(Some(Response::Value(FW_VERSION))),
        Command::Status(2) => Ok(Some(Response::Value(FW_BUILD))),

        Command::SetFilamentType { index, kind } => {
            let (Some(slot), Some(kind)) = (
                OperationalState::slot_index(index),
                FilamentType::from_operand(kind),
            ) else {
                return Ok(None);
            };
            state.filament_types[usize::from(slot)] = kind;
            Ok(Some(Response::Ok))
        }

        Command::Continue(0) => {
            dispatcher.load_into_extruder(board, state)?;
            Ok(Some(Response::Ok))
        }
        Command::Continue(1) => {
            if dispatcher.cut_tip(board, state)? {
                dispatcher.load_with_sensor(board, state)?;
                Ok(Some(Response::Ok))
            } else {
                Ok(Some(Response::NotOk))
            }
        }

        Command::Eject(n) => {
            let Some(slot) = OperationalState::slot_index(n) else {
                return Ok(None);
            };
            dispatcher.eject(board, state, slot)?;
            Ok(Some(Response::Ok))
        }

        Command::Recover(0) => {
            dispatcher.recover_after_eject(board, state)?;
            Ok(Some(Response::Ok))
        }

        Command::FsensorEvent(0) => Ok(Some(Response::Ok)),
        Command::FsensorEvent(1) => {
            state.fsensor_triggered = true;
            Ok(Some(Response::Ok))
        }

        Command::Reset(_)
        | Command::Probe(_)
        | Command::Status(_)
        | Command::Continue(_)
        | Command::Recover(_)
        | Command::FsensorEvent(_) => Ok(None),
    }
}
