//! Device configuration.

use serial_driver_api::LineConfig;

/// What the event handler gives up when the receive ring is full.
///
/// Either way one slot is freed so reception stays armed; a full receive
/// ring therefore settles at `capacity - 1` unread bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverrunPolicy {
    /// Discard the oldest unread byte (advance the front cursor).
    #[default]
    DropOldest,
    /// Discard the most recently received byte (retreat the back cursor).
    DropNewest,
}

/// What `close` does to callers blocked in `read` or `write`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClosePolicy {
    /// Leave them blocked. They resume if the device is reopened and data
    /// or transmit space arrives.
    #[default]
    LeavePending,
    /// Wake them; they fail with [`SerialError::Cancelled`](crate::SerialError::Cancelled).
    Cancel,
    /// Wake them; a read returns `Ok(0)` and a write returns the number of
    /// bytes it had handed to the driver so far.
    EndOfFile,
}

/// Settings applied by [`BufferedSerial::open`](crate::BufferedSerial::open).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialConfig {
    /// Line settings passed to the transceiver.
    pub line: LineConfig,
    /// Receive overrun handling.
    pub overrun: OverrunPolicy,
    /// Treatment of blocked callers on close.
    pub on_close: ClosePolicy,
}

impl SerialConfig {
    /// 8-N-1 at 115 200 baud, dropping the oldest byte on overrun, leaving
    /// blocked callers alone on close.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            line: LineConfig::new(),
            overrun: OverrunPolicy::DropOldest,
            on_close: ClosePolicy::LeavePending,
        }
    }

    /// Returns this configuration with different line settings.
    #[must_use]
    pub const fn with_line(mut self, line: LineConfig) -> Self {
        self.line = line;
        self
    }

    /// Returns this configuration with a different overrun policy.
    #[must_use]
    pub const fn with_overrun(mut self, overrun: OverrunPolicy) -> Self {
        self.overrun = overrun;
        self
    }

    /// Returns this configuration with a different close policy.
    #[must_use]
    pub const fn with_close_policy(mut self, on_close: ClosePolicy) -> Self {
        self.on_close = on_close;
        self
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self::new()
    }
}
