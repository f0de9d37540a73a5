//! Shared fixtures for the device tests.

#![allow(dead_code)]

use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use buffered_serial::{BufferedSerial, SerialConfig};
use serial_ring::ByteRing;
use serial_sim::SimTransceiver;

pub type Device = BufferedSerial<SimTransceiver>;

/// How long a test waits for another thread before giving up.
pub const DEADLINE: Duration = Duration::from_secs(10);

/// Time after which a thread that has not returned is taken to be blocked.
pub const SETTLE: Duration = Duration::from_millis(50);

pub fn storage(len: usize) -> &'static mut [u8] {
    Box::leak(vec![0u8; len].into_boxed_slice())
}

pub fn ring(len: usize) -> ByteRing {
    ByteRing::new(storage(len))
}

/// A closed device with `rx` bytes of receive storage and, if given, `tx`
/// bytes of transmit storage.
pub fn device(rx: usize, tx: Option<usize>) -> &'static Device {
    device_with(ring(rx), tx.map(ring))
}

pub fn device_with(rx: ByteRing, tx: Option<ByteRing>) -> &'static Device {
    Box::leak(Box::new(BufferedSerial::new(
        "ttyS0",
        SimTransceiver::new(),
        rx,
        tx,
    )))
}

/// Like [`device`], opened with the default configuration.
pub fn opened(rx: usize, tx: Option<usize>) -> &'static Device {
    let dev = device(rx, tx);
    dev.open(SerialConfig::new()).unwrap();
    dev
}

/// Spins until `cond` holds, panicking after [`DEADLINE`].
pub fn wait_for(what: &str, mut cond: impl FnMut() -> bool) {
    let start = Instant::now();
    while !cond() {
        assert!(start.elapsed() < DEADLINE, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(1));
    }
}

/// Joins `handle` once it finishes, panicking after [`DEADLINE`].
pub fn join<T>(handle: JoinHandle<T>) -> T {
    wait_for("thread to finish", || handle.is_finished());
    handle.join().unwrap()
}

/// Asserts that `handle` is still running after [`SETTLE`].
pub fn assert_blocked<T>(handle: &JoinHandle<T>) {
    thread::sleep(SETTLE);
    assert!(!handle.is_finished(), "call returned instead of blocking");
}

/// Reads once on a new thread, returning the bytes read.
pub fn spawn_read(dev: &'static Device, len: usize) -> JoinHandle<Result<Vec<u8>, buffered_serial::SerialError>> {
    thread::spawn(move || {
        let mut buf = vec![0u8; len];
        let n = dev.read(&mut buf)?;
        buf.truncate(n);
        Ok(buf)
    })
}

/// Reads everything currently buffered without blocking.
pub fn read_available(dev: &Device) -> Vec<u8> {
    let mut buf = vec![0u8; dev.rx_available()];
    if buf.is_empty() {
        return buf;
    }
    let n = dev.read(&mut buf).unwrap();
    buf.truncate(n);
    buf
}
