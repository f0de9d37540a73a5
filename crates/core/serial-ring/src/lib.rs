//! Fixed-capacity byte ring buffer for interrupt-driven I/O.
//!
//! [`ByteRing`] is a FIFO of bytes over caller-provided `'static` storage.
//! Besides the usual copy-in / copy-out operations it exposes the longest
//! contiguous free region at the back and the longest contiguous queued
//! region at the front as raw [`Span`]s, so a transceiver can DMA directly
//! into or out of the buffer. Once the hardware is done, the driver commits
//! the transfer by moving the matching cursor ([`ByteRing::advance_back`],
//! [`ByteRing::advance_front`]).
//!
//! # Capacity
//!
//! Unlike a `SIZE - 1` ring, the buffer tracks its length explicitly and all
//! `storage.len()` bytes are usable.
//!
//! # Watermarks
//!
//! Two thresholds drive back-pressure. A producer may keep adding data while
//! the buffer is [below the high watermark](ByteRing::is_below_high_watermark);
//! a blocked producer is worth waking once it drops
//! [to the low watermark](ByteRing::is_below_low_watermark).
//!
//! # Examples
//!
//! ```ignore
//! use serial_ring::ByteRing;
//!
//! static mut STORAGE: [u8; 64] = [0; 64];
//! // SAFETY: `STORAGE` is only ever handed to this ring.
//! let mut ring = ByteRing::new(unsafe { &mut *core::ptr::addr_of_mut!(STORAGE) });
//!
//! ring.push_back(b"hello");
//! let mut out = [0u8; 8];
//! assert_eq!(ring.pop_front(&mut out), 5);
//! assert_eq!(&out[..5], b"hello");
//! ```

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

use core::ptr::NonNull;

/// A contiguous region inside a [`ByteRing`]'s storage.
///
/// Handed to hardware as the target of a receive or the source of a send.
/// The region stays valid for as long as the ring's storage does, which is
/// `'static`; whether its bytes are meaningful depends on the cursors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    ptr: NonNull<u8>,
    len: usize,
}

impl Span {
    /// Pointer to the first byte of the region.
    #[must_use]
    pub const fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    /// Number of bytes in the region.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the region has no bytes.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

// SAFETY: A span is a plain address range; access is governed by the ring's
// owner, which only hands spans to one transfer at a time.
unsafe impl Send for Span {}

/// A byte FIFO with fixed capacity and high/low watermarks.
pub struct ByteRing {
    storage: NonNull<u8>,
    cap: usize,
    front: usize,
    len: usize,
    low: usize,
    high: usize,
}

// SAFETY: The ring exclusively owns its storage (it was given a
// `&'static mut`), and all access goes through `&mut self` or through spans
// whose use the owner coordinates.
unsafe impl Send for ByteRing {}

impl ByteRing {
    /// Creates an empty ring over `storage`.
    ///
    /// Watermarks default to three quarters (high) and one quarter (low) of
    /// the capacity.
    ///
    /// # Panics
    ///
    /// Panics if `storage` is empty.
    #[must_use]
    pub fn new(storage: &'static mut [u8]) -> Self {
        let cap = storage.len();
        Self::with_watermarks(storage, cap / 4, cap * 3 / 4)
    }

    /// Creates an empty ring over `storage` with explicit watermarks.
    ///
    /// # Panics
    ///
    /// Panics if `storage` is empty, or unless `low <= high <= storage.len()`.
    #[must_use]
    pub fn with_watermarks(storage: &'static mut [u8], low: usize, high: usize) -> Self {
        assert!(!storage.is_empty(), "ring storage must not be empty");
        assert!(
            low <= high && high <= storage.len(),
            "watermarks must satisfy low <= high <= capacity"
        );
        let cap = storage.len();
        Self {
            storage: NonNull::from(storage).cast(),
            cap,
            front: 0,
            len: 0,
            low,
            high,
        }
    }

    /// Total number of bytes the ring can hold.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.cap
    }

    /// Number of queued bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Number of bytes that can still be added.
    #[must_use]
    pub const fn free(&self) -> usize {
        self.cap - self.len
    }

    /// Returns `true` if no bytes are queued.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns `true` if no more bytes can be added.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.len == self.cap
    }

    /// The low watermark.
    #[must_use]
    pub const fn low_watermark(&self) -> usize {
        self.low
    }

    /// The high watermark.
    #[must_use]
    pub const fn high_watermark(&self) -> usize {
        self.high
    }

    /// Returns `true` while fewer than `high` bytes are queued.
    #[must_use]
    pub const fn is_below_high_watermark(&self) -> bool {
        self.len < self.high
    }

    /// Returns `true` once at most `low` bytes are queued.
    #[must_use]
    pub const fn is_below_low_watermark(&self) -> bool {
        self.len <= self.low
    }

    /// Discards all queued bytes and rewinds both cursors.
    pub fn clear(&mut self) {
        self.front = 0;
        self.len = 0;
    }

    const fn back(&self) -> usize {
        (self.front + self.len) % self.cap
    }

    fn span_at(&self, index: usize, len: usize) -> Span {
        // SAFETY: `index <= cap`, so the result is within or one past the
        // end of the storage allocation.
        let ptr = unsafe { self.storage.add(index) };
        Span { ptr, len }
    }

    /// Longest contiguous free region starting at the back cursor.
    ///
    /// Empty when the ring is full.
    #[must_use]
    pub fn back_span(&self) -> Span {
        let back = self.back();
        let len = if self.is_full() {
            0
        } else if back >= self.front {
            self.cap - back
        } else {
            self.front - back
        };
        self.span_at(back, len)
    }

    /// Longest contiguous queued region starting at the front cursor.
    ///
    /// Empty when the ring is empty.
    #[must_use]
    pub fn front_span(&self) -> Span {
        let len = self.len.min(self.cap - self.front);
        self.span_at(self.front, len)
    }

    /// Commits up to `n` bytes written directly after the back cursor.
    ///
    /// Returns the number of bytes actually committed, which is less than
    /// `n` only if the ring did not have that much free space.
    pub fn advance_back(&mut self, n: usize) -> usize {
        let n = n.min(self.free());
        self.len += n;
        n
    }

    /// Uncommits up to `n` of the most recently added bytes.
    ///
    /// Returns the number of bytes actually removed.
    pub fn retreat_back(&mut self, n: usize) -> usize {
        let n = n.min(self.len);
        self.len -= n;
        n
    }

    /// Discards up to `n` bytes from the front.
    ///
    /// Returns the number of bytes actually discarded.
    pub fn advance_front(&mut self, n: usize) -> usize {
        let n = n.min(self.len);
        self.front = (self.front + n) % self.cap;
        self.len -= n;
        n
    }

    /// Moves up to `dst.len()` bytes from the front into `dst`.
    ///
    /// Returns the number of bytes copied.
    pub fn pop_front(&mut self, dst: &mut [u8]) -> usize {
        let n = dst.len().min(self.len);
        let first = n.min(self.cap - self.front);
        // SAFETY: Both source ranges lie inside queued bytes of the storage
        // and `dst` has room for `n` bytes. Storage and `dst` never overlap
        // because `dst` is a safe borrow distinct from the ring's storage.
        unsafe {
            core::ptr::copy_nonoverlapping(
                self.storage.as_ptr().add(self.front),
                dst.as_mut_ptr(),
                first,
            );
            core::ptr::copy_nonoverlapping(
                self.storage.as_ptr(),
                dst.as_mut_ptr().add(first),
                n - first,
            );
        }
        self.advance_front(n)
    }

    /// Copies up to the free space's worth of `src` onto the back.
    ///
    /// Returns the number of bytes accepted.
    pub fn push_back(&mut self, src: &[u8]) -> usize {
        let n = src.len().min(self.free());
        let back = self.back();
        let first = n.min(self.cap - back);
        // SAFETY: Both destination ranges lie inside free bytes of the
        // storage and `src` holds at least `n` bytes.
        unsafe {
            core::ptr::copy_nonoverlapping(src.as_ptr(), self.storage.as_ptr().add(back), first);
            core::ptr::copy_nonoverlapping(
                src.as_ptr().add(first),
                self.storage.as_ptr(),
                n - first,
            );
        }
        self.advance_back(n)
    }
}

impl core::fmt::Debug for ByteRing {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ByteRing")
            .field("capacity", &self.cap)
            .field("front", &self.front)
            .field("len", &self.len)
            .field("low", &self.low)
            .field("high", &self.high)
            .finish()
    }
}
