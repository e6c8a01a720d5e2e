//! Operator settings persisted across power cycles
//!
//! Stored as postcard binary data under [`StorageKey::Settings`]. Only the
//! read side lives here; missing or corrupt data yields the defaults.

use quintet_hal::{FlashError, SettingsStorage, StorageKey};
use serde::{Deserialize, Serialize};

use crate::state::DriverMode;

/// Upper bound on the encoded settings size
pub const SETTINGS_MAX_LEN: usize = 32;

/// Persisted settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Settings {
    /// Driver mode restored after homing
    pub driver_mode: DriverMode,
}

impl Settings {
    /// Read settings from storage, falling back to defaults
    pub fn load<S: SettingsStorage>(storage: &mut S) -> Self {
        match Self::try_load(storage) {
            Ok(settings) => settings,
            Err(_e) => {
                #[cfg(feature = "defmt")]
                defmt::info!("No valid settings stored ({:?}), using defaults", _e);
                Self::default()
            }
        }
    }

    /// Read settings from storage
    pub fn try_load<S: SettingsStorage>(storage: &mut S) -> Result<Self, FlashError> {
        let mut buffer = [0u8; SETTINGS_MAX_LEN];
        let len = storage.read(StorageKey::Settings, &mut buffer)?;
        let bytes = buffer.get(..len).ok_or(FlashError::BufferTooSmall)?;
        postcard::from_bytes(bytes).map_err(|_| FlashError::Corrupted)
    }

    /// Encode into `buffer`, returning the used prefix
    pub fn encode<'a>(&self, buffer: &'a mut [u8]) -> Result<&'a mut [u8], FlashError> {
        postcard::to_slice(self, buffer).map_err(|_| FlashError::BufferTooSmall)
    }
}
