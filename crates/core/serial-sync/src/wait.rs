//! Binary wait channels.
//!
//! A [`WaitChannel`] carries a single pending-signal bit. [`signal`] sets it
//! and wakes at most one waiter; [`wait`] blocks until the bit is set and
//! clears it. A signal raised while nobody waits is latched, so a thread
//! that checks shared state, drops its lock, and then waits cannot miss a
//! wakeup sent in between. Several signals before a wait collapse into one.
//!
//! [`signal`]: WaitChannel::signal
//! [`wait`]: WaitChannel::wait

use crate::loom_compat::{AtomicBool, Ordering, spin_loop};

/// Block-until-signaled / signal-one-waiter primitive.
///
/// `signal` must be callable from interrupt context: it never blocks and
/// never allocates.
pub trait WaitChannel: Sync {
    /// Creates a channel in the blocked (no pending signal) state.
    fn new() -> Self
    where
        Self: Sized;

    /// Blocks until the channel is signaled, consuming the signal.
    fn wait(&self);

    /// Signals the channel, waking at most one waiter.
    fn signal(&self);
}

/// Wait channel that busy-waits on an atomic flag.
///
/// Usable without an OS. The waiting CPU spins with
/// [`spin_loop`](core::hint::spin_loop) hints until the flag is raised.
pub struct SpinSignal {
    pending: AtomicBool,
}

impl SpinSignal {
    /// Creates a channel with no pending signal.
    #[cfg(not(loom))]
    pub const fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
        }
    }

    /// Creates a channel with no pending signal.
    #[cfg(loom)]
    pub fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
        }
    }

    /// Consumes a pending signal without waiting.
    ///
    /// Returns `true` if a signal was pending.
    pub fn try_take(&self) -> bool {
        self.pending.swap(false, Ordering::Acquire)
    }
}

impl Default for SpinSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl WaitChannel for SpinSignal {
    fn new() -> Self {
        SpinSignal::new()
    }

    fn wait(&self) {
        while !self.try_take() {
            while !self.pending.load(Ordering::Relaxed) {
                spin_loop();
            }
        }
    }

    fn signal(&self) {
        self.pending.store(true, Ordering::Release);
    }
}

#[cfg(any(test, feature = "std"))]
pub use thread::ThreadSignal;

#[cfg(any(test, feature = "std"))]
mod thread {
    use std::sync::{Condvar, Mutex, PoisonError};

    use super::WaitChannel;

    /// Wait channel that parks the calling thread.
    ///
    /// Hosted counterpart of [`SpinSignal`](super::SpinSignal), used when the
    /// "interrupt" side is another thread (simulated hardware, deferred
    /// handlers).
    pub struct ThreadSignal {
        pending: Mutex<bool>,
        cond: Condvar,
    }

    impl ThreadSignal {
        /// Creates a channel with no pending signal.
        pub const fn new() -> Self {
            Self {
                pending: Mutex::new(false),
                cond: Condvar::new(),
            }
        }
    }

    impl Default for ThreadSignal {
        fn default() -> Self {
            Self::new()
        }
    }

    impl WaitChannel for ThreadSignal {
        fn new() -> Self {
            ThreadSignal::new()
        }

        fn wait(&self) {
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            while !*pending {
                pending = self
                    .cond
                    .wait(pending)
                    .unwrap_or_else(PoisonError::into_inner);
            }
            *pending = false;
        }

        fn signal(&self) {
            *self.pending.lock().unwrap_or_else(PoisonError::into_inner) = true;
            self.cond.notify_one();
        }
    }
}
