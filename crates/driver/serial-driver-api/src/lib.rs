//! Driver API for buffered serial lines.
//!
//! This crate defines the seams between a buffered serial driver and the
//! code around it:
//!
//! - **Below** -- the [`Transceiver`] contract a UART or USB CDC backend
//!   implements, plus the [`SerialEvents`] it reports through a
//!   [`SerialEventHandler`].
//! - **Above** -- the generic [`CharDevice`] byte-stream capability that
//!   higher-level I/O code consumes.

#![cfg_attr(not(test), no_std)]

pub mod char_device;
pub mod error;
pub mod event;
pub mod line;
pub mod transceiver;

// Re-export all public types at the crate root for ergonomic imports.
pub use char_device::CharDevice;
pub use error::DriverError;
pub use event::{SerialEventHandler, SerialEvents};
pub use line::{DataBits, LineConfig, Parity, StopBits};
pub use transceiver::{Line, PowerState, Transceiver, TransceiverStatus};
