//! Write path, buffered and direct.

use log::debug;
use serial_driver_api::Transceiver;
use serial_ring::ByteRing;
use serial_sync::{CriticalSection, WaitChannel};

use crate::device::{BufferedSerial, Ticket};
use crate::error::SerialError;

/// Queues as much of `src` as the ring takes, for the first push of a
/// write.
///
/// Nothing is queued at or above the high watermark, except into an empty
/// ring. Pushes after a wake-up skip the gate and fill any free space.
fn push_gated(tx: &mut ByteRing, src: &[u8]) -> usize {
    if tx.is_below_high_watermark() || tx.is_empty() {
        tx.push_back(src)
    } else {
        0
    }
}

impl<T, W, C> BufferedSerial<T, W, C>
where
    T: Transceiver,
    W: WaitChannel,
    C: CriticalSection,
{
    /// Writes `buf` to the line.
    ///
    /// With a transmit ring the bytes are queued and the call returns once
    /// all of them are buffered, blocking while the ring is full; the
    /// return value is then always `buf.len()`. Without one the transceiver
    /// sends straight from `buf` and the call returns, after the transfer
    /// completes, the byte count the transceiver reports.
    ///
    /// # Errors
    ///
    /// - [`SerialError::NotOpen`] if the device is closed.
    /// - [`SerialError::Io`] if the transceiver rejects a send.
    /// - [`SerialError::Cancelled`] if the device is closed while blocked
    ///   and the close policy is [`Cancel`](crate::ClosePolicy::Cancel).
    ///   Under [`EndOfFile`](crate::ClosePolicy::EndOfFile) the call
    ///   returns the number of bytes queued so far (zero for a direct
    ///   send).
    pub fn write(&self, buf: &[u8]) -> Result<usize, SerialError> {
        let ticket = self.ticket()?;
        if buf.is_empty() {
            return Ok(0);
        }
        if self.is_buffered() {
            self.write_buffered(ticket, buf)
        } else {
            self.write_direct(ticket, buf)
        }
    }

    fn write_buffered(&self, ticket: Ticket, buf: &[u8]) -> Result<usize, SerialError> {
        let mut accepted = self.push_tx(|tx| push_gated(tx, buf));

        loop {
            self.kick_transmit()?;
            if accepted == buf.len() {
                return Ok(accepted);
            }

            self.tx_ready.wait();
            if let Some(ended) = self.state.lock().ended(ticket, accepted) {
                return ended;
            }
            let rest = &buf[accepted..];
            accepted += self.push_tx(|tx| tx.push_back(rest));
        }
    }

    fn push_tx(&self, push: impl FnOnce(&mut ByteRing) -> usize) -> usize {
        self.state.lock().tx.as_mut().map_or(0, push)
    }

    /// Starts a send of the next queued span unless one is in flight.
    fn kick_transmit(&self) -> Result<(), SerialError> {
        let span = {
            let mut state = self.state.lock();
            if state.tx_in_flight {
                return Ok(());
            }
            let Some(span) = state.tx.as_ref().map(ByteRing::front_span) else {
                return Ok(());
            };
            if span.is_empty() {
                return Ok(());
            }
            state.tx_in_flight = true;
            span
        };

        // SAFETY: The span covers queued bytes of the transmit ring, whose
        // storage is 'static. The front cursor only moves past them once
        // the transceiver reports them sent.
        let sent = unsafe { self.transceiver.start_send(span.as_ptr(), span.len()) };
        if let Err(err) = sent {
            self.state.lock().tx_in_flight = false;
            debug!("{}: send of {} bytes rejected: {}", self.name(), span.len(), err);
            return Err(SerialError::Io(err));
        }
        Ok(())
    }

    fn write_direct(&self, ticket: Ticket, buf: &[u8]) -> Result<usize, SerialError> {
        while self.transceiver.status().tx_busy {
            self.tx_ready.wait();
            if let Some(ended) = self.state.lock().ended(ticket, 0) {
                return ended;
            }
        }

        // SAFETY: `buf` stays borrowed until this call returns, and the call
        // only returns once the transceiver reports the send finished (or
        // after a close that uninitializes the transceiver).
        unsafe { self.transceiver.start_send(buf.as_ptr(), buf.len()) }
            .map_err(SerialError::Io)?;

        // A signal latched before this send, such as one left by a close
        // with nobody waiting, must not end the wait early.
        loop {
            self.tx_ready.wait();
            let mut state = self.state.lock();
            if let Some(ended) = state.ended(ticket, 0) {
                return ended;
            }
            if !self.transceiver.status().tx_busy {
                let sent = self.transceiver.tx_count();
                state.stats.tx_bytes += sent;
                return Ok(sent);
            }
        }
    }
}
