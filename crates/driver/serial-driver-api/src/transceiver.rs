//! Transceiver contract.
//!
//! A [`Transceiver`] is the hardware half of a serial line: a UART, a USB
//! CDC ACM function, or a simulation. Transfers are asynchronous. The driver
//! starts a send or receive over a raw buffer and learns about completion
//! through the [`SerialEventHandler`] registered at initialization, reading
//! the progress counters from inside that callback.

use crate::error::DriverError;
use crate::event::SerialEventHandler;
use crate::line::LineConfig;

/// Power state requested through [`Transceiver::power`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    /// Powered down; registers may lose state.
    Off,
    /// Fully powered and clocked.
    Full,
}

/// Individually switchable line directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    /// The transmit output.
    Tx,
    /// The receive input.
    Rx,
}

/// Snapshot of transfer activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransceiverStatus {
    /// A send is in progress.
    pub tx_busy: bool,
    /// A receive is armed.
    pub rx_busy: bool,
}

/// Interface trait for serial transceivers.
///
/// Methods take `&self` because the hardware is shared between the thread
/// driving the device and the interrupt handler; implementations provide
/// their own interior synchronization.
pub trait Transceiver: Sync {
    /// Prepares the hardware and registers `handler` for events.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError`] if the hardware cannot be brought up.
    fn initialize(&self, handler: &'static dyn SerialEventHandler) -> Result<(), DriverError>;

    /// Releases the hardware and forgets the event handler.
    ///
    /// Any armed transfer is abandoned; no events are reported afterwards.
    fn uninitialize(&self);

    /// Changes the power state.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError`] if the state change fails.
    fn power(&self, state: PowerState) -> Result<(), DriverError>;

    /// Applies line settings. Hardware flow control stays disabled.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::ConfigRejected`] if the settings are unsupported.
    fn configure(&self, line: &LineConfig) -> Result<(), DriverError>;

    /// Enables or disables one line direction.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError`] if the line cannot be switched.
    fn control(&self, line: Line, enable: bool) -> Result<(), DriverError>;

    /// Starts sending `len` bytes from `data`.
    ///
    /// Completion is reported with [`SerialEvents::TX_COMPLETE`]; the number
    /// of bytes sent is then available from [`tx_count`](Self::tx_count).
    ///
    /// # Errors
    ///
    /// Returns [`DriverError`] if the send cannot be started.
    ///
    /// # Safety
    ///
    /// `data..data + len` must stay valid and unmodified until the completion
    /// event is delivered or the transceiver is uninitialized.
    ///
    /// [`SerialEvents::TX_COMPLETE`]: crate::SerialEvents::TX_COMPLETE
    unsafe fn start_send(&self, data: *const u8, len: usize) -> Result<(), DriverError>;

    /// Starts receiving up to `len` bytes into `data`.
    ///
    /// Restarts the receive counter at zero. The transfer completes with
    /// [`SerialEvents::RECEIVE_COMPLETE`] once `len` bytes have arrived;
    /// partial progress may be reported earlier with
    /// [`SerialEvents::RX_TIMEOUT`].
    ///
    /// # Errors
    ///
    /// Returns [`DriverError`] if the receive cannot be started.
    ///
    /// # Safety
    ///
    /// `data..data + len` must stay valid and must not be accessed by anyone
    /// else until the completion event is delivered or the transceiver is
    /// uninitialized.
    ///
    /// [`SerialEvents::RECEIVE_COMPLETE`]: crate::SerialEvents::RECEIVE_COMPLETE
    /// [`SerialEvents::RX_TIMEOUT`]: crate::SerialEvents::RX_TIMEOUT
    unsafe fn start_receive(&self, data: *mut u8, len: usize) -> Result<(), DriverError>;

    /// Returns the current transfer activity.
    fn status(&self) -> TransceiverStatus;

    /// Bytes received since the last [`start_receive`](Self::start_receive).
    fn rx_count(&self) -> usize;

    /// Bytes sent by the last [`start_send`](Self::start_send).
    fn tx_count(&self) -> usize;
}
