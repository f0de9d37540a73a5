//! Read path.

use serial_driver_api::Transceiver;
use serial_sync::{CriticalSection, WaitChannel};

use crate::device::BufferedSerial;
use crate::error::SerialError;

impl<T, W, C> BufferedSerial<T, W, C>
where
    T: Transceiver,
    W: WaitChannel,
    C: CriticalSection,
{
    /// Reads received bytes into `buf`, blocking until at least one is
    /// available.
    ///
    /// Returns as soon as any data has been received, with as many bytes
    /// as are buffered up to `buf.len()`. An empty `buf` returns `Ok(0)`
    /// immediately.
    ///
    /// # Errors
    ///
    /// - [`SerialError::NotOpen`] if the device is closed.
    /// - [`SerialError::Cancelled`] if the device is closed while blocked
    ///   and the close policy is [`Cancel`](crate::ClosePolicy::Cancel).
    ///   Under [`EndOfFile`](crate::ClosePolicy::EndOfFile) the call
    ///   returns `Ok(0)` instead.
    pub fn read(&self, buf: &mut [u8]) -> Result<usize, SerialError> {
        let ticket = self.ticket()?;
        if buf.is_empty() {
            return Ok(0);
        }

        loop {
            {
                let mut state = self.state.lock();
                if let Some(ended) = state.ended(ticket, 0) {
                    return ended;
                }
                let n = state.rx.pop_front(buf);
                if n > 0 {
                    return Ok(n);
                }
            }
            self.rx_ready.wait();
        }
    }
}
