//! Status indicator trait

use crate::led::LedPattern;

/// Five red/green LED pairs driven as one 16-bit pattern
pub trait Indicator {
    /// Bring up the indicator hardware and blank it
    fn init(&mut self);

    /// Show a pattern; replaces whatever was shown before
    fn set(&mut self, pattern: LedPattern);
}
