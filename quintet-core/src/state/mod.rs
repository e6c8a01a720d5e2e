//! Runtime state of the selector
//!
//! [`OperationalState`] is owned by the main control context and never
//! shared with the receive interrupt. [`RunState`] is the explicit
//! lifecycle: boot, normal running, or a terminal fault.

pub mod machine;
pub mod operational;

pub use machine::{Event, FaultCode, RunState};
pub use operational::{DriverMode, FilamentType, OperationalState};
