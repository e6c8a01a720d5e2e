//! Replies sent back to the printer

use core::fmt::Write;

use heapless::String;

/// Longest encoded reply (`-2147483648ok\n`)
pub const MAX_RESPONSE_LEN: usize = 16;

/// Reply tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Response {
    /// `ok\n`
    Ok,
    /// `not_ok\n`
    NotOk,
    /// `{value}ok\n`
    Value(i32),
}

impl Response {
    /// Encode the reply including its line terminator
    pub fn encode(&self) -> String<MAX_RESPONSE_LEN> {
        let mut out = String::new();
        // Every variant fits in MAX_RESPONSE_LEN.
        let _ = match self {
            Response::Ok => out.push_str("ok\n").map_err(|_| core::fmt::Error),
            Response::NotOk => out.push_str("not_ok\n").map_err(|_| core::fmt::Error),
            Response::Value(value) => write!(out, "{}ok\n", value),
        };
        out
    }
}
