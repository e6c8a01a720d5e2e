//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in quintet-core:
//!
//! - Stepper drivers (TMC2130 over SPI)
//! - Status indicator (chained 8-bit shift registers)

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod indicator;
pub mod stepper;
