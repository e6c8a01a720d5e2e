//! Counted step pulses from PIO0
//!
//! Every axis runs the same program on its own state machine. The CPU
//! pushes a step count, the state machine emits that many pulses and pushes
//! a word back when done. Direction is a plain GPIO; the TMC2130 DIAG
//! output is watched while the pulses run.

use embassy_rp::gpio::{Input, Level, Output};
use embassy_rp::peripherals::PIO0;
use embassy_rp::pio::{Common, Config, Direction as PioDirection, LoadedProgram, PioPin, StateMachine};
use embassy_rp::Peri;
use fixed::types::U24F8;
use quintet_core::traits::MotionError;

/// System clock frequency (RP2040 default)
pub const SYS_CLK_HZ: u32 = 125_000_000;

/// PIO cycles per emitted step (2 high, 2 low)
const CYCLES_PER_STEP: u32 = 4;

/// Maximum step frequency in Hz
pub const MAX_STEP_FREQ_HZ: u32 = 200_000;

/// Load the counted step program into PIO0
///
/// ```text
/// .wrap_target
///     pull block
///     out x, 32
/// step:
///     set pins, 1 [1]
///     set pins, 0
///     jmp x-- step
///     push block
/// .wrap
/// ```
pub fn load_program<'d>(common: &mut Common<'d, PIO0>) -> LoadedProgram<'d, PIO0> {
    let prg = pio::pio_asm!(
        ".wrap_target",
        "pull block",
        "out x, 32",
        "step:",
        "set pins, 1 [1]",
        "set pins, 0",
        "jmp x-- step",
        "push block",
        ".wrap"
    );
    common.load_program(&prg.program)
}

/// PIO clock divider for a step rate
pub fn clock_divider(freq_hz: u32) -> U24F8 {
    let freq = freq_hz.clamp(1, MAX_STEP_FREQ_HZ);
    let divider_x256 = (u64::from(SYS_CLK_HZ) * 256) / u64::from(freq * CYCLES_PER_STEP);
    // Divider is 16.8 fixed point in hardware.
    U24F8::from_bits(divider_x256.min(0x00FF_FFFF) as u32)
}

/// How a move reacts to the DIAG output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StallPolicy {
    /// A stall aborts the move with an error
    Fault,
    /// A stall ends the move early and is reported as success
    Stop,
}

/// Outcome of a move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveEnd {
    Completed,
    Stalled,
}

/// One axis: step state machine, direction pin and DIAG input
pub struct PioAxis<'d, const SM: usize> {
    sm: StateMachine<'d, PIO0, SM>,
    origin: u8,
    dir: Output<'d>,
    diag: Input<'d>,
    invert_dir: bool,
    position: i32,
}

impl<'d, const SM: usize> PioAxis<'d, SM> {
    pub fn new<STEP: PioPin>(
        common: &mut Common<'d, PIO0>,
        mut sm: StateMachine<'d, PIO0, SM>,
        program: &LoadedProgram<'d, PIO0>,
        step_pin: Peri<'d, STEP>,
        dir: Output<'d>,
        diag: Input<'d>,
        invert_dir: bool,
    ) -> Self {
        let step = common.make_pio_pin(step_pin);

        let mut cfg = Config::default();
        cfg.use_program(program, &[]);
        cfg.set_set_pins(&[&step]);
        cfg.clock_divider = clock_divider(1000);

        sm.set_config(&cfg);
        sm.set_pin_dirs(PioDirection::Out, &[&step]);
        sm.set_enable(true);

        Self {
            sm,
            origin: program.origin,
            dir,
            diag,
            invert_dir,
            position: 0,
        }
    }

    /// Position in steps from the homed end
    pub fn position(&self) -> i32 {
        self.position
    }

    /// Declare the current position
    pub fn set_position(&mut self, steps: i32) {
        self.position = steps;
    }

    /// Move to an absolute position
    pub fn move_to(&mut self, target: i32, freq_hz: u32) -> Result<(), MotionError> {
        match self.move_by(target - self.position, freq_hz, StallPolicy::Fault)? {
            MoveEnd::Completed => Ok(()),
            MoveEnd::Stalled => Err(MotionError::Stalled),
        }
    }

    /// Move relative to the current position
    ///
    /// Blocks until all pulses are out or the driver flags a stall.
    pub fn move_by(
        &mut self,
        steps: i32,
        freq_hz: u32,
        policy: StallPolicy,
    ) -> Result<MoveEnd, MotionError> {
        if steps == 0 {
            return Ok(MoveEnd::Completed);
        }

        let forward = steps > 0;
        self.dir.set_level(if forward != self.invert_dir {
            Level::High
        } else {
            Level::Low
        });

        self.sm.set_clock_divider(clock_divider(freq_hz));
        self.sm.clkdiv_restart();

        // The program emits one more pulse than the pushed count.
        let count = steps.unsigned_abs();
        while !self.sm.tx().try_push(count - 1) {}

        loop {
            if self.sm.rx().try_pull().is_some() {
                self.position += steps;
                return Ok(MoveEnd::Completed);
            }
            if self.diag.is_high() {
                self.abort();
                // Position is unknown after a stall.
                return match policy {
                    StallPolicy::Fault => Err(MotionError::Stalled),
                    StallPolicy::Stop => Ok(MoveEnd::Stalled),
                };
            }
        }
    }

    /// Stop pulse output and rearm the program
    fn abort(&mut self) {
        self.sm.set_enable(false);
        self.sm.clear_fifos();
        self.sm.restart();
        // SAFETY: `origin` is the start of the program loaded for this
        // state machine, and the machine is disabled while it jumps.
        unsafe { self.sm.exec_jmp(self.origin) };
        self.sm.set_enable(true);
    }
}
