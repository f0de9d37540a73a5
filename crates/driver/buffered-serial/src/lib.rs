//! Buffered, interrupt-driven serial device.
//!
//! [`BufferedSerial`] sits between a [`Transceiver`](serial_driver_api::Transceiver)
//! and byte-stream callers. Received bytes land in a receive ring straight
//! from the transceiver; the event handler commits them and wakes a blocked
//! reader. Writes either queue into a transmit ring that the event handler
//! drains by chaining sends, or go straight from the caller's buffer.
//!
//! The device binds itself as the transceiver's event handler on
//! [`open`](BufferedSerial::open), so it must live in a `static` (or be
//! leaked) before it is opened.

#![cfg_attr(not(test), no_std)]

mod config;
mod device;
mod error;
mod event;
mod read;
mod stats;
mod write;

pub use config::{ClosePolicy, OverrunPolicy, SerialConfig};
pub use device::BufferedSerial;
pub use error::SerialError;
pub use stats::SerialStats;
