//! Driver error types.

use core::fmt;

/// Errors a [`Transceiver`](crate::Transceiver) reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverError {
    /// Hardware initialization failed or the device did not respond.
    InitFailed,
    /// The device could not change power state.
    PowerFailed,
    /// The requested line configuration or control setting was rejected.
    ConfigRejected,
    /// A transfer in the same direction is already in progress.
    Busy,
    /// An I/O error occurred while starting a transfer.
    IoError,
    /// The requested operation is not supported by this device.
    Unsupported,
    /// The device is not in a valid state for this operation.
    InvalidState,
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InitFailed => f.write_str("transceiver initialization failed"),
            Self::PowerFailed => f.write_str("power state change failed"),
            Self::ConfigRejected => f.write_str("configuration rejected"),
            Self::Busy => f.write_str("transfer already in progress"),
            Self::IoError => f.write_str("I/O error"),
            Self::Unsupported => f.write_str("operation not supported"),
            Self::InvalidState => f.write_str("invalid transceiver state"),
        }
    }
}

impl core::error::Error for DriverError {}
