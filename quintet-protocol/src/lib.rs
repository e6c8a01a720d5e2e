//! Selector Serial Protocol
//!
//! Line-oriented ASCII protocol spoken between the printer controller and
//! the filament selector.
//!
//! # Protocol Overview
//!
//! ```text
//! printer → selector:   T2\n   L0\n   F2 1\n   FS1\n   ...
//! selector → printer:   ok\n   not_ok\n   1ok\n   106ok\n
//! ```
//!
//! - Lines end with CR, LF or NUL and hold at most 31 bytes.
//! - A command is a verb prefix followed by one or two decimal operands.
//! - Unknown or malformed lines are dropped without a reply; the printer
//!   times out and resends.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod command;
pub mod line;
pub mod response;

pub use command::{parse, Command, RULES};
pub use line::{Line, LineError, LineFramer, LINE_CAPACITY};
pub use response::{Response, MAX_RESPONSE_LEN};
