//! Atomic types used for metric storage.
//!
//! Metric values are either 64-bit unsigned counts or 64-bit floats.  We
//! always require a 64-bit atomic integer regardless of whether the standard
//! library exposes one for the target architecture, so 32-bit targets fall
//! back to `portable-atomic`.
//!
//! There is no native atomic float, so [`AtomicF64`] stores the IEEE-754 bit
//! pattern in an `AtomicU64` and performs read-modify-write operations as
//! compare-and-swap loops over the reinterpreted bits.

use std::sync::atomic::Ordering;

#[cfg(target_pointer_width = "32")]
pub use portable_atomic::AtomicU64;
#[cfg(not(target_pointer_width = "32"))]
pub use std::sync::atomic::AtomicU64;

/// An atomic 64-bit float, stored as its bit pattern in an [`AtomicU64`].
#[derive(Debug, Default)]
pub struct AtomicF64 {
    bits: AtomicU64,
}

impl AtomicF64 {
    /// Creates a new `AtomicF64` with the given initial value.
    pub fn new(value: f64) -> Self {
        AtomicF64 { bits: AtomicU64::new(value.to_bits()) }
    }

    /// Loads the current value.
    pub fn load(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }

    /// Stores `value`, replacing whatever was there.
    pub fn store(&self, value: f64) {
        let _ = self.bits.swap(value.to_bits(), Ordering::AcqRel);
    }

    /// Adds `delta` to the current value.
    ///
    /// Runs as a CAS loop over the bit pattern: the update retries until no
    /// concurrent writer has raced in between the load and the swap, so no
    /// update is ever lost.
    pub fn add(&self, delta: f64) {
        let _ = self.bits.fetch_update(Ordering::AcqRel, Ordering::Relaxed, |curr| {
            let input = f64::from_bits(curr);
            let output = input + delta;
            Some(output.to_bits())
        });
    }
}
