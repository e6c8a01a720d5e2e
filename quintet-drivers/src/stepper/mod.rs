//! Stepper driver implementations

pub mod tmc2130;

pub use tmc2130::{Axis, AxisCurrents, Tmc2130Bank, Tmc2130Config, Tmc2130Error};
