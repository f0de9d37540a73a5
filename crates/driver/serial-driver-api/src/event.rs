//! Asynchronous transceiver events.

use bitflags::bitflags;

bitflags! {
    /// Event bits a transceiver reports through [`SerialEventHandler::on_event`].
    ///
    /// Several bits may be set in a single callback.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SerialEvents: u32 {
        /// The armed receive transfer has been filled.
        const RECEIVE_COMPLETE = 1 << 0;
        /// A framing error was detected on the receive line.
        const RX_FRAMING_ERROR = 1 << 1;
        /// The receive line went idle with a partially filled transfer.
        const RX_TIMEOUT       = 1 << 2;
        /// The in-flight send transfer has finished.
        const TX_COMPLETE      = 1 << 3;
    }
}

impl SerialEvents {
    /// Events after which the receive counter may have moved.
    pub const RECEIVE_ANY: Self = Self::RECEIVE_COMPLETE
        .union(Self::RX_FRAMING_ERROR)
        .union(Self::RX_TIMEOUT);
}

/// Callback entry point a transceiver invokes from interrupt context.
///
/// Implementations must not block. The transceiver calls this only between
/// [`initialize`](crate::Transceiver::initialize) and
/// [`uninitialize`](crate::Transceiver::uninitialize).
pub trait SerialEventHandler: Sync {
    /// Handles one batch of events.
    fn on_event(&self, events: SerialEvents);
}
