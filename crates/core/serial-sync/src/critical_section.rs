//! Critical-section strategies.
//!
//! A critical section keeps the local interrupt handler from running while a
//! thread is in the middle of a multi-step update of shared driver state. It
//! is not a lock: it never blocks and must only be held for short, bounded
//! sequences. [`IrqLock`](crate::IrqLock) layers a spin lock on top for
//! exclusion against other CPUs (or host threads).

/// Scoped "enter / exit" capability used by [`IrqLock`](crate::IrqLock).
///
/// # Safety
///
/// While the state returned by [`enter`](Self::enter) has not been passed to
/// [`exit`](Self::exit), no interrupt handler that touches the protected data
/// may run on the current CPU. `NoIrq` is only sound when no such handler
/// exists on the current CPU.
pub unsafe trait CriticalSection {
    /// Saved state needed to undo [`enter`](Self::enter).
    type State: Copy;

    /// Enters the critical section, returning the state to restore.
    fn enter() -> Self::State;

    /// Leaves the critical section.
    ///
    /// # Safety
    ///
    /// `state` must come from the matching [`enter`](Self::enter) call on
    /// this CPU, and sections must be exited in reverse order of entry.
    unsafe fn exit(state: Self::State);
}

/// Masks local interrupts for the duration of the section.
///
/// Saves RFLAGS / DAIF and restores the previous interrupt-enable state on
/// exit, so sections nest. On hosted targets there are no interrupts to mask
/// and this is a no-op.
pub struct IrqDisable;

// SAFETY: Interrupts are masked between `enter` and `exit` on bare metal.
// Hosted targets have no interrupt handlers.
unsafe impl CriticalSection for IrqDisable {
    type State = u64;

    #[inline]
    fn enter() -> u64 {
        save_flags_and_cli()
    }

    #[inline]
    unsafe fn exit(state: u64) {
        restore_flags(state);
    }
}

/// Does nothing on entry or exit.
///
/// For handlers that are dispatched on a thread rather than from an interrupt
/// vector (deferred work, simulations). Exclusion then comes entirely from
/// the spin lock.
pub struct NoIrq;

// SAFETY: Only used when no interrupt handler shares the protected data.
unsafe impl CriticalSection for NoIrq {
    type State = ();

    #[inline]
    fn enter() {}

    #[inline]
    unsafe fn exit(_state: ()) {}
}

#[cfg(all(target_os = "none", target_arch = "x86_64"))]
#[inline]
fn save_flags_and_cli() -> u64 {
    let flags: u64;
    // SAFETY: Reading RFLAGS and disabling interrupts is safe in kernel mode.
    unsafe {
        core::arch::asm!(
            "pushfq",
            "pop {}",
            "cli",
            out(reg) flags,
            options(nomem),
        );
    }
    flags
}

#[cfg(all(target_os = "none", target_arch = "x86_64"))]
#[inline]
fn restore_flags(flags: u64) {
    // Only IF matters; leave the rest of RFLAGS alone.
    if flags & (1 << 9) != 0 {
        // SAFETY: Re-enabling interrupts restores the state saved on entry.
        unsafe {
            core::arch::asm!("sti", options(nomem, nostack, preserves_flags));
        }
    }
}

#[cfg(all(target_os = "none", target_arch = "aarch64"))]
#[inline]
fn save_flags_and_cli() -> u64 {
    let flags: u64;
    // SAFETY: Reading DAIF and masking interrupts is safe at EL1.
    unsafe {
        core::arch::asm!(
            "mrs {}, DAIF",
            "msr DAIFSet, #0xf",
            out(reg) flags,
            options(nomem),
        );
    }
    flags
}

#[cfg(all(target_os = "none", target_arch = "aarch64"))]
#[inline]
fn restore_flags(flags: u64) {
    // SAFETY: Restoring DAIF to the state saved on entry.
    unsafe {
        core::arch::asm!(
            "msr DAIF, {}",
            in(reg) flags,
            options(nomem, nostack, preserves_flags),
        );
    }
}

#[cfg(not(all(target_os = "none", any(target_arch = "x86_64", target_arch = "aarch64"))))]
#[inline]
fn save_flags_and_cli() -> u64 {
    0
}

#[cfg(not(all(target_os = "none", any(target_arch = "x86_64", target_arch = "aarch64"))))]
#[inline]
fn restore_flags(_flags: u64) {}
