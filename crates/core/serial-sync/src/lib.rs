//! Synchronization primitives shared between interrupt handlers and
//! blocking driver callers.
//!
//! - [`CriticalSection`] is the pluggable "scoped acquire" capability. The
//!   default, [`IrqDisable`], masks local interrupts on bare-metal targets.
//! - [`IrqLock`] is a spin lock that enters a critical section before
//!   spinning, so data it protects can be touched from both thread and
//!   interrupt context without deadlocking against a preempted holder.
//! - [`WaitChannel`] is a binary signal a thread can block on and an
//!   interrupt handler can raise. [`SpinSignal`] works everywhere;
//!   [`ThreadSignal`] parks host threads (feature `std`).

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]

mod critical_section;
mod irq_lock;
mod loom_compat;
mod wait;

pub use critical_section::{CriticalSection, IrqDisable, NoIrq};
pub use irq_lock::{IrqLock, IrqLockGuard};
pub use wait::{SpinSignal, WaitChannel};

#[cfg(any(test, feature = "std"))]
pub use wait::ThreadSignal;

/// The wait channel used when a driver does not pick one explicitly.
///
/// Parks the thread on hosted builds and spins on bare metal.
#[cfg(any(test, feature = "std"))]
pub type DefaultSignal = ThreadSignal;

/// The wait channel used when a driver does not pick one explicitly.
///
/// Parks the thread on hosted builds and spins on bare metal.
#[cfg(not(any(test, feature = "std")))]
pub type DefaultSignal = SpinSignal;
