//! Persistent result store: 13 fixed slots of 39 bytes, written in place.
//!
//! Slot *i* lives at byte offset `i × 39`.  There is no existence bitmap
//! and no compaction; writing a slot is the only way its previous contents
//! are lost.

use log::info;

use crate::app::ports::StoragePort;
use crate::error::StoreError;
use crate::model::{RECORD_LEN, SLOT_COUNT, Slot, TestResult};

/// Bytes occupied by the whole slot table.
pub const TABLE_LEN: usize = RECORD_LEN * SLOT_COUNT;

/// Fill pattern of an erased slot.
const ERASED: u8 = 0xFF;

/// Slot-addressed view over a byte-addressable medium.
pub struct ResultStore<S: StoragePort> {
    storage: S,
}

impl<S: StoragePort> ResultStore<S> {
    /// Wrap a medium large enough for the slot table.
    pub fn new(storage: S) -> Result<Self, StoreError> {
        let capacity = storage.capacity();
        if capacity < TABLE_LEN {
            return Err(StoreError::TooSmall {
                capacity,
                required: TABLE_LEN,
            });
        }
        Ok(Self { storage })
    }

    /// Overwrite `slot` with `result`.
    pub fn save(&mut self, slot: Slot, result: &TestResult) -> Result<(), StoreError> {
        self.storage.write(Self::offset(slot), &result.to_bytes())?;
        info!("STORE: result written to slot {}", slot.number());
        Ok(())
    }

    /// Read back whatever `slot` holds.  A never-written slot decodes as
    /// whatever the medium contains; callers decide what is meaningful.
    pub fn load(&self, slot: Slot) -> Result<TestResult, StoreError> {
        let mut raw = [0u8; RECORD_LEN];
        self.storage.read(Self::offset(slot), &mut raw)?;
        Ok(TestResult::from_bytes(&raw))
    }

    /// Return `slot` to the erased pattern.
    pub fn erase(&mut self, slot: Slot) -> Result<(), StoreError> {
        self.storage.write(Self::offset(slot), &[ERASED; RECORD_LEN])?;
        info!("STORE: slot {} erased", slot.number());
        Ok(())
    }

    /// Borrow the underlying medium.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn offset(slot: Slot) -> usize {
        slot.index() * RECORD_LEN
    }
}
