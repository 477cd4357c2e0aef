//! Unified error types for the quad-pack tester firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! main loop's error handling uniform.  All variants are `Copy` so they can
//! be passed through the service, the FSM and the event sink without
//! allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The safety gate refused to start a test.
    Test(TestFault),
    /// The result store could not complete a slot operation.
    Store(StoreError),
    /// A host byte stream could not be decoded.
    Protocol(ProtocolError),
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Test(e) => write!(f, "test: {e}"),
            Self::Store(e) => write!(f, "store: {e}"),
            Self::Protocol(e) => write!(f, "protocol: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Test faults
// ---------------------------------------------------------------------------

/// Reasons the safety gate refuses to start a test.
///
/// Both are terminal for the current attempt: the operator acknowledges the
/// error screen and the gate runs again in full on the next attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestFault {
    /// No coherent pack voltage across the four taps.
    Connection,
    /// At least one cell is below the minimum unloaded voltage.
    Safety,
}

impl fmt::Display for TestFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connection => write!(f, "no battery connection"),
            Self::Safety => write!(f, "cell below minimum voltage"),
        }
    }
}

impl From<TestFault> for Error {
    fn from(e: TestFault) -> Self {
        Self::Test(e)
    }
}

// ---------------------------------------------------------------------------
// Storage errors
// ---------------------------------------------------------------------------

/// Errors from the byte-addressable [`StoragePort`](crate::app::ports::StoragePort).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Access past the end of the medium.
    OutOfBounds,
    /// The backend reported a read/write failure.
    Io,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds => write!(f, "access out of bounds"),
            Self::Io => write!(f, "I/O error"),
        }
    }
}

/// Errors from [`ResultStore`](crate::store::ResultStore) slot operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// The medium is smaller than the slot table.
    TooSmall { capacity: usize, required: usize },
    /// The underlying storage failed.
    Storage(StorageError),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooSmall { capacity, required } => {
                write!(f, "medium holds {capacity} bytes, slot table needs {required}")
            }
            Self::Storage(e) => write!(f, "{e}"),
        }
    }
}

impl From<StorageError> for StoreError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

// ---------------------------------------------------------------------------
// Remote protocol errors
// ---------------------------------------------------------------------------

/// Malformed input on the host serial link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// The first byte of a frame is not a known command.
    UnknownCommand(u8),
    /// A byte inside a numeric field is not an ASCII digit.
    InvalidDigit(u8),
    /// The requested slot number is outside 1–13.
    SlotOutOfRange(u8),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCommand(b) => write!(f, "unknown command byte 0x{b:02x}"),
            Self::InvalidDigit(b) => write!(f, "invalid digit byte 0x{b:02x}"),
            Self::SlotOutOfRange(n) => write!(f, "slot {n} out of range"),
        }
    }
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        Self::Protocol(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from [`ConfigPort`](crate::app::ports::ConfigPort) operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    Io,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
            Self::Io => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for Error {}
impl std::error::Error for TestFault {}
impl std::error::Error for StorageError {}
impl std::error::Error for StoreError {}
impl std::error::Error for ProtocolError {}
impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
