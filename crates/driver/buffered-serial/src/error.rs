//! Device error types.

use core::fmt;

use serial_driver_api::DriverError;

/// Errors returned by [`BufferedSerial`](crate::BufferedSerial) operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialError {
    /// `open` was called on a device that is already open.
    AlreadyOpen,
    /// The transceiver could not be brought up; the device was rolled back
    /// to closed.
    DeviceUnavailable(DriverError),
    /// The transceiver rejected a send.
    Io(DriverError),
    /// The device is closed.
    NotOpen,
    /// A blocked call was cancelled by `close`.
    Cancelled,
}

impl fmt::Display for SerialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyOpen => f.write_str("device already open"),
            Self::DeviceUnavailable(e) => write!(f, "device unavailable: {e}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::NotOpen => f.write_str("device not open"),
            Self::Cancelled => f.write_str("operation cancelled by close"),
        }
    }
}

impl core::error::Error for SerialError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::DeviceUnavailable(e) | Self::Io(e) => Some(e),
            _ => None,
        }
    }
}
