//! Generic byte-stream device capability.

/// Interface trait for character devices.
///
/// Higher-level I/O code (device files, consoles, protocol stacks) is
/// written against this trait rather than against a concrete driver.
/// `read` and `write` may block the calling thread; they must not be called
/// from interrupt context.
pub trait CharDevice {
    /// Settings accepted by [`open`](Self::open).
    type Config;
    /// Error returned by every fallible operation.
    type Error;

    /// The device's name, e.g. `"/dev/ttyS0"`.
    fn name(&self) -> &str;

    /// Brings the device up.
    ///
    /// Takes `&'static self` because the device registers itself with
    /// interrupt-driven hardware that outlives any borrow.
    ///
    /// # Errors
    ///
    /// Returns an error if the device is already open or the hardware
    /// cannot be started.
    fn open(&'static self, config: Self::Config) -> Result<(), Self::Error>;

    /// Shuts the device down.
    ///
    /// # Errors
    ///
    /// Returns an error if the device cannot be shut down cleanly.
    fn close(&self) -> Result<(), Self::Error>;

    /// Returns `true` between a successful `open` and the next `close`.
    fn is_open(&self) -> bool;

    /// Reads available bytes into `buf`, blocking until at least one byte
    /// is available.
    ///
    /// # Errors
    ///
    /// Returns an error if the device is not open or the read is cancelled.
    fn read(&self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Writes bytes from `buf`, blocking while the device applies
    /// back-pressure.
    ///
    /// # Errors
    ///
    /// Returns an error if the device is not open or the transfer fails.
    fn write(&self, buf: &[u8]) -> Result<usize, Self::Error>;
}
