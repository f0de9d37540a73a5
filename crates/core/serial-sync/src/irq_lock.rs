//! Interrupt-safe spin lock.
//!
//! Enters a [`CriticalSection`] before acquiring the inner spin lock and
//! leaves it on release. Data shared between an interrupt handler and thread
//! code lives behind one of these: the critical section stops the handler
//! from preempting a holder on the same CPU, the spin lock excludes other
//! CPUs.

use core::fmt;
use core::marker::PhantomData;
use core::ops::{Deref, DerefMut};

use crate::critical_section::{CriticalSection, IrqDisable};
use crate::loom_compat::{AtomicBool, Ordering, UnsafeCell, spin_loop};

/// A spin lock that holds a critical section while locked.
pub struct IrqLock<T, C: CriticalSection = IrqDisable> {
    locked: AtomicBool,
    name: &'static str,
    data: UnsafeCell<T>,
    _section: PhantomData<fn() -> C>,
}

// SAFETY: Atomic ops on `locked` ensure exclusive access to `data`.
unsafe impl<T: Send, C: CriticalSection> Send for IrqLock<T, C> {}
unsafe impl<T: Send, C: CriticalSection> Sync for IrqLock<T, C> {}

impl<T, C: CriticalSection> IrqLock<T, C> {
    /// Creates a new unlocked `IrqLock`.
    #[cfg(not(loom))]
    pub const fn new(value: T) -> Self {
        Self::named("<unnamed>", value)
    }

    /// Creates a new unlocked `IrqLock` with a name for diagnostics.
    #[cfg(not(loom))]
    pub const fn named(name: &'static str, value: T) -> Self {
        Self {
            locked: AtomicBool::new(false),
            name,
            data: UnsafeCell::new(value),
            _section: PhantomData,
        }
    }

    /// Creates a new unlocked `IrqLock`.
    #[cfg(loom)]
    pub fn new(value: T) -> Self {
        Self::named("<unnamed>", value)
    }

    /// Creates a new unlocked `IrqLock` with a name for diagnostics.
    #[cfg(loom)]
    pub fn named(name: &'static str, value: T) -> Self {
        Self {
            locked: AtomicBool::new(false),
            name,
            data: UnsafeCell::new(value),
            _section: PhantomData,
        }
    }

    /// Returns the diagnostic name given at construction.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Acquires the lock, entering the critical section first.
    pub fn lock(&self) -> IrqLockGuard<'_, T, C> {
        let state = C::enter();

        // TTAS spin to acquire.
        loop {
            if self
                .locked
                .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
                .is_ok()
            {
                return IrqLockGuard {
                    lock: self,
                    state,
                    _not_send: PhantomData,
                };
            }
            while self.locked.load(Ordering::Relaxed) {
                spin_loop();
            }
        }
    }

    /// Attempts to acquire the lock without spinning.
    pub fn try_lock(&self) -> Option<IrqLockGuard<'_, T, C>> {
        let state = C::enter();
        if self
            .locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            Some(IrqLockGuard {
                lock: self,
                state,
                _not_send: PhantomData,
            })
        } else {
            // SAFETY: Undoes the `enter` above; nothing was entered after it.
            unsafe { C::exit(state) };
            None
        }
    }

    /// Consumes the lock and returns the protected value.
    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

impl<T, C: CriticalSection> fmt::Debug for IrqLock<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IrqLock")
            .field("name", &self.name)
            .field("locked", &self.locked.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/// RAII guard that leaves the critical section on drop.
///
/// Not `Send`: the saved interrupt state belongs to the acquiring CPU.
pub struct IrqLockGuard<'a, T, C: CriticalSection = IrqDisable> {
    lock: &'a IrqLock<T, C>,
    state: C::State,
    _not_send: PhantomData<*const ()>,
}

impl<T, C: CriticalSection> Deref for IrqLockGuard<'_, T, C> {
    type Target = T;
    fn deref(&self) -> &T {
        // SAFETY: The lock is held, so we have exclusive access to the data.
        self.lock.data.with(|data| unsafe { &*data })
    }
}

impl<T, C: CriticalSection> DerefMut for IrqLockGuard<'_, T, C> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: The lock is held, so we have exclusive access to the data.
        self.lock.data.with_mut(|data| unsafe { &mut *data })
    }
}

impl<T, C: CriticalSection> Drop for IrqLockGuard<'_, T, C> {
    fn drop(&mut self) {
        self.lock.locked.store(false, Ordering::Release);
        // SAFETY: `state` came from the `enter` that preceded acquisition.
        unsafe { C::exit(self.state) };
    }
}
