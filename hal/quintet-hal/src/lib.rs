//! Quintet Hardware Abstraction Layer
//!
//! Traits implemented by board bindings so the selector logic in
//! `quintet-core` can run against real hardware or a host simulation.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  quintet-core (selector logic)          │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  quintet-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ quintet-      │       │ host          │
//! │ firmware      │       │ simulation    │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::InputPin`] - Digital input (filament sensor)
//! - [`uart::UartRx`], [`uart::UartTx`], [`uart::SerialPort`] - Printer link
//! - [`flash::SettingsStorage`] - Persisted settings

#![no_std]
#![deny(unsafe_code)]

pub mod flash;
pub mod gpio;
pub mod uart;

pub use flash::{FlashError, SettingsStorage, StorageKey};
pub use gpio::InputPin;
pub use uart::{SerialPort, UartConfig, UartRx, UartTx};
