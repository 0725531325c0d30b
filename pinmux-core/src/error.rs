//! Error type shared by every pin operation
//!
//! Mutating operations validate first, so `InvalidParameter` and
//! `NotSupported` always leave hardware and status untouched.

use core::fmt;

/// Pin operation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinError {
    /// Value outside the declared numeric range
    InvalidParameter,
    /// Pin lacks the capability, or the required hardware is not present
    NotSupported,
    /// Contention: a test-and-set lost, or a pin-locked owner holds the pin
    Busy,
    /// A blocking wait exceeded its timeout
    Cancelled,
}

/// Result alias for pin operations
pub type Result<T> = core::result::Result<T, PinError>;

impl fmt::Display for PinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinError::InvalidParameter => f.write_str("invalid parameter"),
            PinError::NotSupported => f.write_str("not supported"),
            PinError::Busy => f.write_str("busy"),
            PinError::Cancelled => f.write_str("cancelled"),
        }
    }
}

impl embedded_hal::digital::Error for PinError {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}
