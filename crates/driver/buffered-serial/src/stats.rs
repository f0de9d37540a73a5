//! Per-open transfer counters.

/// Counters maintained by the event handler and the write path.
///
/// Reset by every successful [`open`](crate::BufferedSerial::open).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SerialStats {
    /// Bytes committed to the receive ring.
    pub rx_bytes: usize,
    /// Bytes the transceiver reported as sent.
    pub tx_bytes: usize,
    /// Bytes discarded to keep reception armed.
    pub rx_overruns: usize,
    /// Receive events flagged as framing errors.
    pub rx_framing_errors: usize,
    /// Receive events flagged as idle timeouts.
    pub rx_timeouts: usize,
    /// Receive or send re-arms the transceiver rejected from the handler.
    pub rearm_failures: usize,
}
