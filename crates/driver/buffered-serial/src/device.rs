//! Device controller: construction, open/close lifecycle, shared state.

use log::{debug, info, warn};
use serial_driver_api::{CharDevice, DriverError, Line, PowerState, Transceiver};
use serial_ring::ByteRing;
use serial_sync::{CriticalSection, DefaultSignal, IrqDisable, IrqLock, WaitChannel};

use crate::config::{ClosePolicy, OverrunPolicy, SerialConfig};
use crate::error::SerialError;
use crate::stats::SerialStats;

/// State shared between caller threads and the event handler.
///
/// Only touched under [`BufferedSerial::state`]'s lock.
pub(crate) struct Shared {
    pub(crate) rx: ByteRing,
    /// `None` selects unbuffered transmit.
    pub(crate) tx: Option<ByteRing>,
    /// Hardware receive counter as of the last event. Restarts at zero
    /// with every receive the handler arms.
    pub(crate) rx_count: usize,
    /// A buffered send is outstanding. Tracked locally because the
    /// transceiver's busy flag may read idle between chained sends.
    pub(crate) tx_in_flight: bool,
    pub(crate) open: bool,
    /// Bumped by every `close`.
    pub(crate) epoch: u32,
    pub(crate) overrun: OverrunPolicy,
    pub(crate) on_close: ClosePolicy,
    pub(crate) stats: SerialStats,
}

impl Shared {
    /// Decides how a blocking call taken out under `ticket` ends if its
    /// session has been closed since.
    ///
    /// Returns `None` while the session is current or the close policy
    /// leaves blocked callers alone. Otherwise returns the call's result:
    /// [`SerialError::Cancelled`], or `Ok(eof)` for end-of-file.
    pub(crate) fn ended(&self, ticket: Ticket, eof: usize) -> Option<Result<usize, SerialError>> {
        if ticket.epoch == self.epoch {
            return None;
        }
        match ticket.on_close {
            ClosePolicy::LeavePending => None,
            ClosePolicy::Cancel => Some(Err(SerialError::Cancelled)),
            ClosePolicy::EndOfFile => Some(Ok(eof)),
        }
    }
}

/// Identifies the open session a blocking call started in.
#[derive(Clone, Copy)]
pub(crate) struct Ticket {
    epoch: u32,
    on_close: ClosePolicy,
}

/// A buffered, interrupt-driven serial device.
///
/// Received bytes are collected into a receive [`ByteRing`] by the
/// transceiver's interrupt handler and drained by [`read`](Self::read).
/// With a transmit ring, [`write`](Self::write) queues bytes and returns
/// once they are buffered; without one it hands the caller's buffer to the
/// transceiver and waits for the transfer to finish.
///
/// `W` is the wait channel blocked callers sleep on, `C` the critical
/// section that keeps the interrupt handler out while a caller updates the
/// shared state.
pub struct BufferedSerial<T, W = DefaultSignal, C = IrqDisable>
where
    C: CriticalSection,
{
    name: &'static str,
    pub(crate) transceiver: T,
    pub(crate) state: IrqLock<Shared, C>,
    pub(crate) rx_ready: W,
    pub(crate) tx_ready: W,
}

impl<T, W, C> BufferedSerial<T, W, C>
where
    T: Transceiver,
    W: WaitChannel,
    C: CriticalSection,
{
    /// Creates a closed device.
    ///
    /// `tx` selects the transmit mode: `Some` queues writes in the ring,
    /// `None` sends straight from the caller's buffer.
    pub fn new(name: &'static str, transceiver: T, rx: ByteRing, tx: Option<ByteRing>) -> Self {
        Self {
            name,
            transceiver,
            state: IrqLock::named(name, Shared {
                rx,
                tx,
                rx_count: 0,
                tx_in_flight: false,
                open: false,
                epoch: 0,
                overrun: OverrunPolicy::default(),
                on_close: ClosePolicy::default(),
                stats: SerialStats::default(),
            }),
            rx_ready: W::new(),
            tx_ready: W::new(),
        }
    }

    /// The name given at construction.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The underlying transceiver.
    pub const fn transceiver(&self) -> &T {
        &self.transceiver
    }

    /// Returns `true` if the transmit path queues into a ring.
    pub fn is_buffered(&self) -> bool {
        self.state.lock().tx.is_some()
    }

    /// Returns `true` between a successful [`open`](Self::open) and the next
    /// [`close`](Self::close).
    pub fn is_open(&self) -> bool {
        self.state.lock().open
    }

    /// Counters for the current (or most recent) open session.
    pub fn stats(&self) -> SerialStats {
        self.state.lock().stats
    }

    /// Bytes received and not yet read.
    pub fn rx_available(&self) -> usize {
        self.state.lock().rx.len()
    }

    /// Bytes queued for transmission and not yet confirmed sent.
    ///
    /// Always zero in unbuffered mode.
    pub fn tx_queued(&self) -> usize {
        self.state.lock().tx.as_ref().map_or(0, ByteRing::len)
    }

    /// Opens the device.
    ///
    /// Clears the rings, binds this device as the transceiver's event
    /// handler, powers it up, applies
    /// `config.line`, enables both line directions and arms the first
    /// receive into the receive ring.
    ///
    /// # Errors
    ///
    /// - [`SerialError::AlreadyOpen`] if the device is open; nothing is done.
    /// - [`SerialError::DeviceUnavailable`] if any transceiver step fails;
    ///   the transceiver is powered off and uninitialized and the device
    ///   stays closed.
    pub fn open(&'static self, config: SerialConfig) -> Result<(), SerialError>
    where
        T: 'static,
        W: 'static,
        C: 'static,
    {
        {
            let mut state = self.state.lock();
            if state.open {
                return Err(SerialError::AlreadyOpen);
            }
            // Wait channels keep any signal latched by the last close, so
            // callers blocked across close and reopen still see it.
            state.open = true;
            state.rx.clear();
            if let Some(tx) = state.tx.as_mut() {
                tx.clear();
            }
            state.rx_count = 0;
            state.tx_in_flight = false;
            state.overrun = config.overrun;
            state.on_close = config.on_close;
            state.stats = SerialStats::default();
        }

        if let Err(err) = self.start_transceiver(&config) {
            let _ = self.transceiver.power(PowerState::Off);
            self.transceiver.uninitialize();
            self.state.lock().open = false;
            warn!("{}: open failed: {}", self.name, err);
            return Err(SerialError::DeviceUnavailable(err));
        }

        info!(
            "{}: open at {} baud ({} transmit)",
            self.name,
            config.line.baud,
            if self.is_buffered() { "buffered" } else { "direct" }
        );
        Ok(())
    }

    fn start_transceiver(&'static self, config: &SerialConfig) -> Result<(), DriverError>
    where
        T: 'static,
        W: 'static,
        C: 'static,
    {
        self.transceiver.initialize(self)?;
        self.transceiver.power(PowerState::Full)?;
        self.transceiver.configure(&config.line)?;
        self.transceiver.control(Line::Tx, true)?;
        self.transceiver.control(Line::Rx, true)?;

        let span = self.state.lock().rx.back_span();
        debug!("{}: arming first receive of {} bytes", self.name, span.len());
        // SAFETY: The span is free space in the receive ring, whose storage
        // is 'static. Only the event handler commits it, after the
        // transceiver reports progress.
        unsafe { self.transceiver.start_receive(span.as_ptr(), span.len()) }
    }

    /// Closes the device.
    ///
    /// Disables both line directions, powers the transceiver off and
    /// uninitializes it. Depending on the [`ClosePolicy`] chosen at open,
    /// callers blocked in `read` or `write` are woken. Closing a closed
    /// device does nothing.
    ///
    /// # Errors
    ///
    /// Never fails; transceiver errors during shutdown are logged.
    pub fn close(&self) -> Result<(), SerialError> {
        let on_close = {
            let mut state = self.state.lock();
            if !state.open {
                return Ok(());
            }
            state.open = false;
            state.epoch = state.epoch.wrapping_add(1);
            state.tx_in_flight = false;
            state.on_close
        };

        let shutdown = [
            self.transceiver.control(Line::Tx, false),
            self.transceiver.control(Line::Rx, false),
            self.transceiver.power(PowerState::Off),
        ];
        for err in shutdown.into_iter().filter_map(Result::err) {
            debug!("{}: shutdown step failed: {}", self.name, err);
        }
        self.transceiver.uninitialize();

        if on_close != ClosePolicy::LeavePending {
            self.rx_ready.signal();
            self.tx_ready.signal();
        }

        info!("{}: closed", self.name);
        Ok(())
    }

    /// Starts a blocking call in the current open session.
    pub(crate) fn ticket(&self) -> Result<Ticket, SerialError> {
        let state = self.state.lock();
        if !state.open {
            return Err(SerialError::NotOpen);
        }
        Ok(Ticket {
            epoch: state.epoch,
            on_close: state.on_close,
        })
    }
}

impl<T, W, C> CharDevice for BufferedSerial<T, W, C>
where
    T: Transceiver + 'static,
    W: WaitChannel + 'static,
    C: CriticalSection + 'static,
{
    type Config = SerialConfig;
    type Error = SerialError;

    fn name(&self) -> &str {
        self.name
    }

    fn open(&'static self, config: SerialConfig) -> Result<(), SerialError> {
        BufferedSerial::open(self, config)
    }

    fn close(&self) -> Result<(), SerialError> {
        BufferedSerial::close(self)
    }

    fn is_open(&self) -> bool {
        BufferedSerial::is_open(self)
    }

    fn read(&self, buf: &mut [u8]) -> Result<usize, SerialError> {
        BufferedSerial::read(self, buf)
    }

    fn write(&self, buf: &[u8]) -> Result<usize, SerialError> {
        BufferedSerial::write(self, buf)
    }
}
