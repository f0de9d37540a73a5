//! Transceiver event handling.
//!
//! Runs in interrupt context. Every ring and counter update happens under
//! the shared lock, and so does re-arming the receive, since the counter
//! baseline restarts only once the transceiver accepts the new span.
//! Chained sends and waiter wake-ups happen after the lock is released.

use log::{error, trace, warn};
use serial_driver_api::{SerialEventHandler, SerialEvents, Transceiver};
use serial_ring::Span;
use serial_sync::{CriticalSection, WaitChannel};

use crate::config::OverrunPolicy;
use crate::device::{BufferedSerial, Shared};

impl<T, W, C> SerialEventHandler for BufferedSerial<T, W, C>
where
    T: Transceiver,
    W: WaitChannel,
    C: CriticalSection,
{
    fn on_event(&self, events: SerialEvents) {
        trace!("{}: events {:?}", self.name(), events);
        if events.intersects(SerialEvents::RECEIVE_ANY) {
            self.on_receive(events);
        }
        if events.contains(SerialEvents::TX_COMPLETE) {
            self.on_transmit_complete();
        }
    }
}

impl<T, W, C> BufferedSerial<T, W, C>
where
    T: Transceiver,
    W: WaitChannel,
    C: CriticalSection,
{
    fn on_receive(&self, events: SerialEvents) {
        let delta = {
            let mut state = self.state.lock();
            if !state.open {
                drop(state);
                warn!("{}: ignoring events {:?} while closed", self.name(), events);
                return;
            }
            let counter = self.transceiver.rx_count();
            assert!(
                counter >= state.rx_count,
                "receive counter went backwards ({} < {})",
                counter,
                state.rx_count
            );
            let delta = counter - state.rx_count;
            state.rx_count = counter;

            let committed = state.rx.advance_back(delta);
            assert_eq!(
                committed, delta,
                "receive ring out of sync with the transceiver"
            );
            state.stats.rx_bytes += delta;
            if events.contains(SerialEvents::RX_FRAMING_ERROR) {
                state.stats.rx_framing_errors += 1;
            }
            if events.contains(SerialEvents::RX_TIMEOUT) {
                state.stats.rx_timeouts += 1;
            }

            if events.contains(SerialEvents::RECEIVE_COMPLETE) {
                let span = self.next_receive_span(&mut state);
                // SAFETY: The span is free space in the receive ring, whose
                // storage is 'static. It is committed only after the
                // transceiver reports progress into it.
                match unsafe { self.transceiver.start_receive(span.as_ptr(), span.len()) } {
                    Ok(()) => state.rx_count = 0,
                    Err(err) => {
                        // The counter keeps its old total, so later events
                        // see no new bytes until the next open.
                        error!("{}: failed to re-arm receive: {}", self.name(), err);
                        state.stats.rearm_failures += 1;
                    }
                }
            }
            delta
        };

        if delta > 0 {
            self.rx_ready.signal();
        }
    }

    /// Picks the span for the next receive, giving up one byte if the ring
    /// is full.
    fn next_receive_span(&self, state: &mut Shared) -> Span {
        let mut span = state.rx.back_span();
        if span.is_empty() {
            match state.overrun {
                OverrunPolicy::DropOldest => state.rx.advance_front(1),
                OverrunPolicy::DropNewest => state.rx.retreat_back(1),
            };
            state.stats.rx_overruns += 1;
            warn!("{}: receive overrun, dropped one byte", self.name());
            span = state.rx.back_span();
        }
        assert!(!span.is_empty(), "no receive space after overrun handling");
        span
    }

    fn on_transmit_complete(&self) {
        let (next, mut wake) = {
            let mut state = self.state.lock();
            if !state.open {
                drop(state);
                warn!("{}: ignoring transmit completion while closed", self.name());
                return;
            }
            let in_flight = state.tx_in_flight;
            let Some(tx) = state.tx.as_mut().filter(|_| in_flight) else {
                // Direct sends, and stale completions from before a close.
                drop(state);
                self.tx_ready.signal();
                return;
            };
            let sent = self.transceiver.tx_count();
            let consumed = tx.advance_front(sent);
            assert_eq!(consumed, sent, "transmit ring out of sync with the transceiver");
            let next = tx.front_span();
            let wake = tx.is_below_low_watermark();
            if next.is_empty() {
                state.tx_in_flight = false;
            }
            state.stats.tx_bytes += sent;
            (next, wake)
        };

        if !next.is_empty() {
            // SAFETY: The span covers queued bytes of the transmit ring,
            // whose storage is 'static.
            if let Err(err) = unsafe { self.transceiver.start_send(next.as_ptr(), next.len()) } {
                error!("{}: failed to chain send: {}", self.name(), err);
                let mut state = self.state.lock();
                state.tx_in_flight = false;
                state.stats.rearm_failures += 1;
                wake = true;
            }
        }

        if wake {
            self.tx_ready.signal();
        }
    }
}
