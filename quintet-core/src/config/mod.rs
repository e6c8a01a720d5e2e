//! Build-time constants and persisted settings

pub mod settings;

pub use settings::Settings;

/// Number of filament slots
pub const EXTRUDERS: usize = 5;

/// Selector position with no filament engaged
pub const PARK_POSITION: u8 = EXTRUDERS as u8;

/// Reported by `S1`
pub const FW_VERSION: i32 = 106;

/// Reported by `S2`
pub const FW_BUILD: i32 = 168;

/// Wait after indicator bring-up so the printer finishes booting first
pub const BOOT_SETTLE_MS: u32 = 2000;

/// Half period of the filament-present warning during boot
pub const SAFETY_BLINK_MS: u32 = 300;

/// Half period of the park indication
pub const PARK_BLINK_MS: u32 = 50;

/// Fault pattern on-time
pub const FAULT_ON_MS: u32 = 1000;

/// Fault pattern off-time
pub const FAULT_OFF_MS: u32 = 2000;

/// `L`: settle after selecting, before feeding
pub const LOAD_SELECT_SETTLE_MS: u32 = 10;

/// `L`: settle after feeding, before replying
pub const LOAD_FEED_SETTLE_MS: u32 = 100;

/// `U`: settle after unloading, before replying
pub const UNLOAD_SETTLE_MS: u32 = 200;
