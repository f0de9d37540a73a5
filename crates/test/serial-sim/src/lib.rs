//! Simulated serial transceiver.
//!
//! [`SimTransceiver`] implements [`Transceiver`] in memory so a driver can be
//! exercised on the host. The test plays the remote end and the interrupt
//! controller: [`feed`](SimTransceiver::feed) and
//! [`deliver`](SimTransceiver::deliver) push bytes into the armed receive,
//! [`complete_send`](SimTransceiver::complete_send) finishes the in-flight
//! send. Event callbacks run on the calling thread with the simulator's own
//! lock released, so the handler may call back into the transceiver.
//!
//! Every transceiver call is recorded as a [`Call`], and any step can be made
//! to fail with [`fail`](SimTransceiver::fail).

use std::sync::{Mutex, MutexGuard, PoisonError};

use serial_driver_api::{
    DriverError, Line, LineConfig, PowerState, SerialEventHandler, SerialEvents, Transceiver,
    TransceiverStatus,
};

/// A recorded transceiver call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    /// Handler bound.
    Initialize,
    /// Handler released, transfers abandoned.
    Uninitialize,
    /// Power state requested.
    Power(PowerState),
    /// Line settings applied.
    Configure(LineConfig),
    /// Line direction enabled or disabled.
    Control(Line, bool),
    /// Send of the given length.
    StartSend(usize),
    /// Receive of the given length.
    StartReceive(usize),
}

/// A fallible transceiver step, for failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Step {
    Initialize,
    Power,
    Configure,
    Control,
    StartSend,
    StartReceive,
}

/// Driver memory handed over by `start_send` / `start_receive`.
#[derive(Clone, Copy)]
struct Transfer {
    ptr: *mut u8,
    len: usize,
}

// SAFETY: The driver guarantees the memory stays valid until completion or
// `uninitialize`; the simulator only touches it under its lock.
unsafe impl Send for Transfer {}

#[derive(Default)]
struct Inner {
    calls: Vec<Call>,
    failures: Vec<(Step, DriverError)>,
    handler: Option<&'static dyn SerialEventHandler>,
    power: Option<PowerState>,
    line: Option<LineConfig>,
    rx: Option<Transfer>,
    rx_count: usize,
    tx: Option<Transfer>,
    tx_count: usize,
    send_limit: Option<usize>,
    transmitted: Vec<u8>,
}

impl Inner {
    fn check(&self, step: Step) -> Result<(), DriverError> {
        match self.failures.iter().find(|(s, _)| *s == step) {
            Some(&(_, err)) => Err(err),
            None => Ok(()),
        }
    }
}

/// In-memory [`Transceiver`].
#[derive(Default)]
pub struct SimTransceiver {
    inner: Mutex<Inner>,
}

impl SimTransceiver {
    /// Creates an uninitialized, powered-off transceiver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes `step` fail with `err` until [`succeed`](Self::succeed) is called.
    pub fn fail(&self, step: Step, err: DriverError) {
        let mut inner = self.inner();
        inner.failures.retain(|(s, _)| *s != step);
        inner.failures.push((step, err));
    }

    /// Stops injecting failures into `step`.
    pub fn succeed(&self, step: Step) {
        self.inner().failures.retain(|(s, _)| *s != step);
    }

    /// Calls made so far, oldest first.
    pub fn calls(&self) -> Vec<Call> {
        self.inner().calls.clone()
    }

    /// Forgets the recorded calls.
    pub fn clear_calls(&self) {
        self.inner().calls.clear();
    }

    /// Returns `true` while an event handler is bound.
    pub fn is_initialized(&self) -> bool {
        self.inner().handler.is_some()
    }

    /// Last power state requested, if any.
    pub fn power_state(&self) -> Option<PowerState> {
        self.inner().power
    }

    /// Last line configuration applied, if any.
    pub fn line(&self) -> Option<LineConfig> {
        self.inner().line
    }

    /// Space left in the armed receive, or zero if none is armed.
    pub fn rx_armed(&self) -> usize {
        let inner = self.inner();
        inner.rx.map_or(0, |rx| rx.len - inner.rx_count)
    }

    /// Length of the in-flight send, if any.
    pub fn pending_send(&self) -> Option<usize> {
        self.inner().tx.map(|tx| tx.len)
    }

    /// Caps how many bytes each completed send reports as transmitted.
    pub fn limit_sends(&self, limit: Option<usize>) {
        self.inner().send_limit = limit;
    }

    /// Bytes the remote end has seen, in order.
    pub fn transmitted(&self) -> Vec<u8> {
        self.inner().transmitted.clone()
    }

    /// Raises `events` on the bound handler, if any.
    pub fn fire(&self, events: SerialEvents) {
        let handler = self.inner().handler;
        if let Some(handler) = handler {
            handler.on_event(events);
        }
    }

    /// Receives `bytes` from the line without signaling an idle line.
    ///
    /// Bytes go into the armed receive; each time it fills, a
    /// `RECEIVE_COMPLETE` event is raised and the remainder goes into the
    /// receive the handler re-arms. Stops early if nothing is armed.
    ///
    /// Returns the number of bytes taken.
    pub fn feed(&self, bytes: &[u8]) -> usize {
        let mut taken = 0;
        while taken < bytes.len() {
            let (handler, filled) = {
                let mut inner = self.inner();
                let (Some(rx), Some(handler)) = (inner.rx, inner.handler) else {
                    break;
                };
                let n = (rx.len - inner.rx_count).min(bytes.len() - taken);
                // SAFETY: `rx_count + n <= rx.len`, inside the armed receive.
                unsafe {
                    core::ptr::copy_nonoverlapping(
                        bytes[taken..].as_ptr(),
                        rx.ptr.add(inner.rx_count),
                        n,
                    );
                }
                inner.rx_count += n;
                taken += n;
                let filled = inner.rx_count == rx.len;
                if filled {
                    inner.rx = None;
                }
                (handler, filled)
            };
            if filled {
                handler.on_event(SerialEvents::RECEIVE_COMPLETE);
            }
        }
        taken
    }

    /// Receives `bytes`, then signals the line going idle if a receive was
    /// left partially filled.
    ///
    /// Returns the number of bytes taken.
    pub fn deliver(&self, bytes: &[u8]) -> usize {
        let taken = self.feed(bytes);
        let partial = {
            let inner = self.inner();
            inner.rx.is_some() && inner.rx_count > 0
        };
        if partial {
            self.fire(SerialEvents::RX_TIMEOUT);
        }
        taken
    }

    /// Finishes the in-flight send and raises `TX_COMPLETE`.
    ///
    /// Returns `false` if no send was in flight.
    pub fn complete_send(&self) -> bool {
        let handler = {
            let mut inner = self.inner();
            let Some(tx) = inner.tx.take() else {
                return false;
            };
            let sent = inner.send_limit.map_or(tx.len, |limit| tx.len.min(limit));
            // SAFETY: The send's memory is valid until its completion, which
            // is being raised now.
            let bytes = unsafe { core::slice::from_raw_parts(tx.ptr.cast_const(), sent) };
            inner.transmitted.extend_from_slice(bytes);
            inner.tx_count = sent;
            inner.handler
        };
        if let Some(handler) = handler {
            handler.on_event(SerialEvents::TX_COMPLETE);
        }
        true
    }

    /// Completes sends until none is in flight.
    ///
    /// Returns the number completed.
    pub fn drain_sends(&self) -> usize {
        let mut completed = 0;
        while self.complete_send() {
            completed += 1;
        }
        completed
    }
}

impl Transceiver for SimTransceiver {
    fn initialize(&self, handler: &'static dyn SerialEventHandler) -> Result<(), DriverError> {
        let mut inner = self.inner();
        inner.calls.push(Call::Initialize);
        inner.check(Step::Initialize)?;
        inner.handler = Some(handler);
        Ok(())
    }

    fn uninitialize(&self) {
        let mut inner = self.inner();
        inner.calls.push(Call::Uninitialize);
        inner.handler = None;
        inner.rx = None;
        inner.tx = None;
        inner.rx_count = 0;
        inner.tx_count = 0;
    }

    fn power(&self, state: PowerState) -> Result<(), DriverError> {
        let mut inner = self.inner();
        inner.calls.push(Call::Power(state));
        inner.check(Step::Power)?;
        inner.power = Some(state);
        Ok(())
    }

    fn configure(&self, line: &LineConfig) -> Result<(), DriverError> {
        let mut inner = self.inner();
        inner.calls.push(Call::Configure(*line));
        inner.check(Step::Configure)?;
        inner.line = Some(*line);
        Ok(())
    }

    fn control(&self, line: Line, enable: bool) -> Result<(), DriverError> {
        let mut inner = self.inner();
        inner.calls.push(Call::Control(line, enable));
        inner.check(Step::Control)
    }

    unsafe fn start_send(&self, data: *const u8, len: usize) -> Result<(), DriverError> {
        let mut inner = self.inner();
        inner.calls.push(Call::StartSend(len));
        inner.check(Step::StartSend)?;
        if inner.tx.is_some() {
            return Err(DriverError::Busy);
        }
        inner.tx = Some(Transfer {
            ptr: data.cast_mut(),
            len,
        });
        inner.tx_count = 0;
        Ok(())
    }

    unsafe fn start_receive(&self, data: *mut u8, len: usize) -> Result<(), DriverError> {
        let mut inner = self.inner();
        inner.calls.push(Call::StartReceive(len));
        inner.check(Step::StartReceive)?;
        inner.rx = Some(Transfer { ptr: data, len });
        inner.rx_count = 0;
        Ok(())
    }

    fn status(&self) -> TransceiverStatus {
        let inner = self.inner();
        TransceiverStatus {
            tx_busy: inner.tx.is_some(),
            rx_busy: inner.rx.is_some(),
        }
    }

    fn rx_count(&self) -> usize {
        self.inner().rx_count
    }

    fn tx_count(&self) -> usize {
        self.inner().tx_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter {
        receive: AtomicUsize,
        timeout: AtomicUsize,
        transmit: AtomicUsize,
    }

    impl SerialEventHandler for Counter {
        fn on_event(&self, events: SerialEvents) {
            if events.contains(SerialEvents::RECEIVE_COMPLETE) {
                self.receive.fetch_add(1, Ordering::SeqCst);
            }
            if events.contains(SerialEvents::RX_TIMEOUT) {
                self.timeout.fetch_add(1, Ordering::SeqCst);
            }
            if events.contains(SerialEvents::TX_COMPLETE) {
                self.transmit.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    fn counter() -> &'static Counter {
        Box::leak(Box::new(Counter {
            receive: AtomicUsize::new(0),
            timeout: AtomicUsize::new(0),
            transmit: AtomicUsize::new(0),
        }))
    }

    #[test]
    fn records_calls_in_order() {
        let sim = SimTransceiver::new();
        sim.initialize(counter()).unwrap();
        sim.power(PowerState::Full).unwrap();
        sim.control(Line::Rx, true).unwrap();
        sim.uninitialize();
        assert_eq!(
            sim.calls(),
            [
                Call::Initialize,
                Call::Power(PowerState::Full),
                Call::Control(Line::Rx, true),
                Call::Uninitialize,
            ]
        );
        assert!(!sim.is_initialized());
    }

    #[test]
    fn injected_failure_until_succeed() {
        let sim = SimTransceiver::new();
        sim.fail(Step::Configure, DriverError::ConfigRejected);
        assert_eq!(
            sim.configure(&LineConfig::new()),
            Err(DriverError::ConfigRejected)
        );
        sim.succeed(Step::Configure);
        assert_eq!(sim.configure(&LineConfig::new()), Ok(()));
        assert_eq!(sim.line(), Some(LineConfig::new()));
    }

    #[test]
    fn feed_fills_armed_receive_and_raises_completion() {
        let sim = SimTransceiver::new();
        let events = counter();
        sim.initialize(events).unwrap();
        let buf: &'static mut [u8] = Box::leak(vec![0u8; 4].into_boxed_slice());
        unsafe { sim.start_receive(buf.as_mut_ptr(), buf.len()) }.unwrap();

        assert_eq!(sim.feed(b"ab"), 2);
        assert_eq!(sim.rx_count(), 2);
        assert_eq!(sim.rx_armed(), 2);
        assert_eq!(events.receive.load(Ordering::SeqCst), 0);

        // The handler here does not re-arm, so the rest is refused.
        assert_eq!(sim.feed(b"cdef"), 2);
        assert_eq!(events.receive.load(Ordering::SeqCst), 1);
        assert_eq!(sim.rx_armed(), 0);
        assert_eq!(buf, b"abcd");
    }

    #[test]
    fn deliver_raises_timeout_for_partial_receive() {
        let sim = SimTransceiver::new();
        let events = counter();
        sim.initialize(events).unwrap();
        let buf: &'static mut [u8] = Box::leak(vec![0u8; 8].into_boxed_slice());
        unsafe { sim.start_receive(buf.as_mut_ptr(), buf.len()) }.unwrap();

        assert_eq!(sim.deliver(b"xyz"), 3);
        assert_eq!(events.timeout.load(Ordering::SeqCst), 1);
        assert_eq!(events.receive.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn send_completes_once() {
        let sim = SimTransceiver::new();
        let events = counter();
        sim.initialize(events).unwrap();
        let data = b"hello";
        unsafe { sim.start_send(data.as_ptr(), data.len()) }.unwrap();
        assert!(sim.status().tx_busy);
        assert_eq!(
            unsafe { sim.start_send(data.as_ptr(), data.len()) },
            Err(DriverError::Busy)
        );

        assert!(sim.complete_send());
        assert!(!sim.complete_send());
        assert_eq!(sim.transmitted(), b"hello");
        assert_eq!(sim.tx_count(), 5);
        assert_eq!(events.transmit.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn send_limit_truncates_reported_count() {
        let sim = SimTransceiver::new();
        sim.limit_sends(Some(2));
        let data = b"hello";
        unsafe { sim.start_send(data.as_ptr(), data.len()) }.unwrap();
        assert!(sim.complete_send());
        assert_eq!(sim.transmitted(), b"he");
        assert_eq!(sim.tx_count(), 2);
    }
}
