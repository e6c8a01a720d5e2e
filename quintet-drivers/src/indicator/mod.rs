//! Status indicator implementations

pub mod shr16;

pub use shr16::Shr16;
