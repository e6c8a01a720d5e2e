//! Top-level control loop

use crate::board::{Board, Platform};
use crate::boot;
use crate::critical::CriticalSection;
use crate::dispatch::{DispatchConfig, Dispatcher};
use crate::engine::CommandEngine;
use crate::fault;
use crate::manual;
use crate::state::{Event, FaultCode, OperationalState, RunState};
use crate::traits::ReceiveInterrupt;

/// The filament selector: board, state and the run-state machine
pub struct Selector<P: Platform> {
    board: Board<P>,
    state: OperationalState,
    run_state: RunState,
    engine: CommandEngine,
    dispatcher: Dispatcher,
}

impl<P: Platform> Selector<P> {
    pub fn new(board: Board<P>) -> Self {
        Self::with_config(board, DispatchConfig::default())
    }

    pub fn with_config(board: Board<P>, config: DispatchConfig) -> Self {
        Self {
            board,
            state: OperationalState::new(),
            run_state: RunState::Boot,
            engine: CommandEngine::new(),
            dispatcher: Dispatcher::new(config),
        }
    }

    pub fn state(&self) -> &OperationalState {
        &self.state
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    fn apply(&mut self, event: Event) -> RunState {
        self.run_state = self.run_state.transition(event);
        self.run_state
    }

    /// Run the boot sequence; only acts in [`RunState::Boot`]
    ///
    /// Receive is masked first, so the first command poll of the main
    /// cycle starts masked whatever state the board handed over.
    pub fn boot(&mut self) -> RunState {
        if self.run_state != RunState::Boot {
            return self.run_state;
        }
        self.board.rx_irq.disable();
        let event = match boot::run(&mut self.board, &mut self.state) {
            Ok(_outcome) => {
                #[cfg(feature = "defmt")]
                defmt::info!("Boot complete: {:?}", _outcome);
                Event::BootComplete
            }
            Err(code) => Event::FaultDetected(code),
        };
        self.apply(event)
    }

    /// One iteration of the main cycle
    ///
    /// Command processing runs with the receive interrupt masked, then the
    /// interrupt is opened for a receive window. Manual control, when the
    /// printer is not driving the unit, runs inside a critical section.
    /// The interrupt is masked again before returning.
    pub fn cycle(&mut self) -> RunState {
        if !self.run_state.is_running() {
            return self.run_state;
        }
        match self.serve() {
            Ok(()) => self.run_state,
            Err(code) => self.apply(Event::FaultDetected(code)),
        }
    }

    fn serve(&mut self) -> Result<(), FaultCode> {
        self.engine
            .poll(&mut self.board, &mut self.state, &self.dispatcher)?;

        self.board.rx_irq.enable();
        let result = if self.state.is_printing {
            Ok(())
        } else {
            let mut cs = CriticalSection::enter(&mut self.board);
            manual::run(&mut *cs, &mut self.state, &self.dispatcher)
        };
        self.board.rx_irq.disable();
        result
    }

    /// Boot, then cycle until a fault, then show the fault forever
    pub fn run(mut self) -> ! {
        self.boot();
        loop {
            if let Some(code) = self.cycle().fault() {
                fault::escalate(&mut self.board.indicator, &mut self.board.delay, code);
            }
        }
    }
}
