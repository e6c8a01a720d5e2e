//! Collaborator traits
//!
//! These traits define the interface between the control logic and the
//! board-specific implementations of indicator, buttons, motion and
//! stepper drivers.

pub mod driver;
pub mod indicator;
pub mod input;
pub mod motion;
pub mod system;

pub use driver::{DriverError, DriverProfile, MotorDriver};
pub use indicator::Indicator;
pub use input::{Button, Buttons};
pub use motion::{Motion, MotionError, PulleyDirection, PulleySpeed};
pub use system::{ReceiveInterrupt, SystemControl};
