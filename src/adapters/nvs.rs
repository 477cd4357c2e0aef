//! NVS (Non-Volatile Storage) adapter.
//!
//! Two views over the same flash partition:
//!
//! - [`NvsAdapter`] implements [`ConfigPort`]: the whole [`TesterConfig`]
//!   as one postcard blob.
//! - [`NvsResultTable`] implements [`StoragePort`]: the result slot table
//!   as one blob with a RAM mirror, so byte-offset writes from the store
//!   land as whole-blob commits.
//!
//! ESP-IDF commits a blob atomically per `nvs_commit()`, which gives the
//! store its record-level atomicity.  The simulation backend keeps blobs
//! in a shared in-memory map.

use log::{info, warn};

use crate::app::ports::{ConfigPort, StoragePort};
use crate::config::TesterConfig;
use crate::error::{ConfigError, StorageError};
use crate::store::TABLE_LEN;

#[cfg(not(target_os = "espidf"))]
use std::{cell::RefCell, collections::HashMap, rc::Rc};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

const NAMESPACE: &str = "quadpack";
const CONFIG_KEY: &str = "testcfg";
const RESULTS_KEY: &str = "results";

const MAX_BLOB_SIZE: usize = 4000;

/// Raw blob access plus the config port.  Cheap to clone: every clone
/// talks to the same partition (or, in simulation, the same map).
#[derive(Clone)]
pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    store: Rc<RefCell<HashMap<String, Vec<u8>>>>,
}

impl NvsAdapter {
    /// Initialise NVS flash.
    ///
    /// On first boot or after a version mismatch the partition is erased
    /// and re-initialised.
    #[cfg(target_os = "espidf")]
    pub fn new() -> Result<Self, ConfigError> {
        // SAFETY: called once from the main task before any other NVS use.
        let ret = unsafe { nvs_flash_init() };
        if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
            warn!("NVS: erasing and re-initialising flash partition");
            if unsafe { nvs_flash_erase() } != ESP_OK || unsafe { nvs_flash_init() } != ESP_OK {
                return Err(ConfigError::Io);
            }
        } else if ret != ESP_OK {
            return Err(ConfigError::Io);
        }
        info!("NVS: ESP-IDF flash initialised");
        Ok(Self {})
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Result<Self, ConfigError> {
        info!("NVS: simulation backend");
        Ok(Self {
            store: Rc::default(),
        })
    }

    /// Read a blob.  `Ok(None)` when the key has never been written.
    #[cfg(not(target_os = "espidf"))]
    pub fn get_blob(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.store.borrow().get(&composite_key(key)).cloned())
    }

    /// Write and commit a blob.
    #[cfg(not(target_os = "espidf"))]
    pub fn set_blob(&self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if data.len() > MAX_BLOB_SIZE {
            return Err(StorageError::OutOfBounds);
        }
        self.store
            .borrow_mut()
            .insert(composite_key(key), data.to_vec());
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    pub fn get_blob(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let key_buf = c_key(key);
        let result = with_nvs_handle(false, |handle| {
            let mut size: usize = 0;
            // First call: size only.
            let ret = unsafe {
                nvs_get_blob(
                    handle,
                    key_buf.as_ptr() as *const _,
                    core::ptr::null_mut(),
                    &mut size,
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            if size == 0 || size > MAX_BLOB_SIZE {
                return Err(ESP_ERR_NVS_INVALID_LENGTH);
            }
            let mut buf = vec![0u8; size];
            let ret = unsafe {
                nvs_get_blob(
                    handle,
                    key_buf.as_ptr() as *const _,
                    buf.as_mut_ptr() as *mut _,
                    &mut size,
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(buf)
        });
        match result {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Ok(None),
            Err(e) => {
                warn!("NVS: read '{}' failed ({})", key, e);
                Err(StorageError::Io)
            }
        }
    }

    #[cfg(target_os = "espidf")]
    pub fn set_blob(&self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if data.len() > MAX_BLOB_SIZE {
            return Err(StorageError::OutOfBounds);
        }
        let key_buf = c_key(key);
        with_nvs_handle(true, |handle| {
            let ret = unsafe {
                nvs_set_blob(
                    handle,
                    key_buf.as_ptr() as *const _,
                    data.as_ptr() as *const _,
                    data.len(),
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            let ret = unsafe { nvs_commit(handle) };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(())
        })
        .map_err(|e| {
            warn!("NVS: write '{}' failed ({})", key, e);
            StorageError::Io
        })
    }
}

#[cfg(not(target_os = "espidf"))]
fn composite_key(key: &str) -> String {
    format!("{}::{}", NAMESPACE, key)
}

/// NUL-terminated key, truncated to the 15-character NVS limit.
#[cfg(target_os = "espidf")]
fn c_key(key: &str) -> [u8; 16] {
    let mut buf = [0u8; 16];
    let kb = key.as_bytes();
    let len = kb.len().min(15);
    buf[..len].copy_from_slice(&kb[..len]);
    buf
}

/// Open the namespace, run `f` with the handle, then close.
#[cfg(target_os = "espidf")]
fn with_nvs_handle<F, T>(write: bool, f: F) -> Result<T, i32>
where
    F: FnOnce(nvs_handle_t) -> Result<T, i32>,
{
    let ns = c_key(NAMESPACE);
    let mode = if write {
        nvs_open_mode_t_NVS_READWRITE
    } else {
        nvs_open_mode_t_NVS_READONLY
    };
    let mut handle: nvs_handle_t = 0;
    let ret = unsafe { nvs_open(ns.as_ptr() as *const _, mode, &mut handle) };
    if ret != ESP_OK {
        return Err(ret);
    }
    let result = f(handle);
    unsafe {
        nvs_close(handle);
    }
    result
}

// ── ConfigPort implementation ─────────────────────────────────

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<TesterConfig, ConfigError> {
        match self.get_blob(CONFIG_KEY) {
            Ok(Some(bytes)) => {
                let cfg: TesterConfig =
                    postcard::from_bytes(&bytes).map_err(|_| ConfigError::Corrupted)?;
                cfg.validate()?;
                info!("NVS: loaded config ({} bytes)", bytes.len());
                Ok(cfg)
            }
            Ok(None) => {
                info!("NVS: no stored config, using defaults");
                Ok(TesterConfig::default())
            }
            Err(_) => Err(ConfigError::Io),
        }
    }

    fn save(&self, config: &TesterConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::Io)?;
        self.set_blob(CONFIG_KEY, &bytes)
            .map_err(|_| ConfigError::Io)?;
        info!("NVS: config saved ({} bytes)", bytes.len());
        Ok(())
    }
}

// ── Result table ──────────────────────────────────────────────

/// Byte-addressable result slot table backed by one NVS blob.
pub struct NvsResultTable {
    nvs: NvsAdapter,
    mirror: Vec<u8>,
}

impl NvsResultTable {
    /// Load the table blob, or start from an erased table when none
    /// exists or the stored one has the wrong length.
    pub fn open(nvs: NvsAdapter) -> Result<Self, StorageError> {
        let mirror = match nvs.get_blob(RESULTS_KEY)? {
            Some(bytes) if bytes.len() == TABLE_LEN => {
                info!("NVS: result table loaded");
                bytes
            }
            Some(bytes) => {
                warn!(
                    "NVS: result table is {} bytes, expected {}; starting erased",
                    bytes.len(),
                    TABLE_LEN
                );
                vec![0xFF; TABLE_LEN]
            }
            None => {
                info!("NVS: no result table, starting erased");
                vec![0xFF; TABLE_LEN]
            }
        };
        Ok(Self { nvs, mirror })
    }
}

impl StoragePort for NvsResultTable {
    fn read(&self, offset: usize, buf: &mut [u8]) -> Result<(), StorageError> {
        let src = offset
            .checked_add(buf.len())
            .and_then(|end| self.mirror.get(offset..end))
            .ok_or(StorageError::OutOfBounds)?;
        buf.copy_from_slice(src);
        Ok(())
    }

    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), StorageError> {
        let end = offset
            .checked_add(data.len())
            .filter(|&end| end <= self.mirror.len())
            .ok_or(StorageError::OutOfBounds)?;
        let mut next = self.mirror.clone();
        next[offset..end].copy_from_slice(data);
        self.nvs.set_blob(RESULTS_KEY, &next)?;
        self.mirror = next;
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.mirror.len()
    }
}
