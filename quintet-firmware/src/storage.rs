//! Settings partition in the last 64KB of flash
//!
//! Items are kept by sequential-storage for wear leveling. The selector only
//! reads at boot, so the async flash driver is driven to completion in place.

use embassy_futures::block_on;
use embassy_rp::dma::Channel;
use embassy_rp::flash::{Async, Flash};
use embassy_rp::peripherals::FLASH;
use embassy_rp::Peri;
use quintet_hal::{FlashError, SettingsStorage, StorageKey};
use sequential_storage::cache::NoCache;
use sequential_storage::map;

/// 2MB flash
pub const FLASH_SIZE: usize = 2 * 1024 * 1024;
pub const SETTINGS_PARTITION_SIZE: usize = 64 * 1024;
pub const SETTINGS_PARTITION_START: usize = FLASH_SIZE - SETTINGS_PARTITION_SIZE;

/// Flash range for the settings partition
pub const SETTINGS_RANGE: core::ops::Range<u32> =
    (SETTINGS_PARTITION_START as u32)..(FLASH_SIZE as u32);

/// Scratch space for one stored item
const ITEM_BUFFER: usize = 128;

pub struct FlashSettings {
    flash: Flash<'static, FLASH, Async, FLASH_SIZE>,
}

impl FlashSettings {
    pub fn new(flash: Peri<'static, FLASH>, dma: Peri<'static, impl Channel>) -> Self {
        Self {
            flash: Flash::new(flash, dma),
        }
    }
}

impl SettingsStorage for FlashSettings {
    fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, FlashError> {
        let mut data_buffer = [0u8; ITEM_BUFFER];

        let result = block_on(map::fetch_item::<StorageKey, &[u8], _>(
            &mut self.flash,
            SETTINGS_RANGE,
            &mut NoCache::new(),
            &mut data_buffer,
            &key,
        ));

        match result {
            Ok(Some(data)) => {
                let dest = buffer
                    .get_mut(..data.len())
                    .ok_or(FlashError::BufferTooSmall)?;
                dest.copy_from_slice(data);
                Ok(data.len())
            }
            Ok(None) => Err(FlashError::NotFound),
            Err(_) => Err(FlashError::Corrupted),
        }
    }
}
