//! Board-agnostic control logic for the filament selector firmware
//!
//! This crate contains everything that does not depend on a specific
//! board:
//!
//! - Collaborator traits (indicator, buttons, motion, motor drivers)
//! - Operational state and the run-state machine
//! - Filament operation dispatcher
//! - Serial command engine
//! - Boot sequence with the homing safety gate
//! - Manual control loop
//! - Fault escalation

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod board;
pub mod boot;
pub mod config;
pub mod controller;
pub mod critical;
pub mod dispatch;
pub mod engine;
pub mod fault;
pub mod led;
pub mod manual;
pub mod state;
pub mod traits;

#[cfg(test)]
pub(crate) mod sim;

pub use board::{Board, Platform};
pub use controller::Selector;
pub use state::{DriverMode, FaultCode, FilamentType, OperationalState, RunState};
