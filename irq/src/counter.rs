//! # Interrupt Counters
//!
//! Per-slot invocation counters. Targets with 64-bit atomics count with a
//! single [`AtomicU64`]; everything else uses [`SplitCounter`], a low/high
//! pair of 32-bit halves.
//!
//! ## Wraparound Law
//!
//! For a [`SplitCounter`], an increment that wraps the low half from
//! `u32::MAX` to `0` carries one into the high half, so the logical value
//! `(high << 32) | low` advances by exactly one per increment. The combined
//! value wraps from `u64::MAX` to `0`.
//!
//! Worst-case handler times use [`WorstCase`]: 64-bit where the target has
//! the atomics for it, otherwise 32-bit nanoseconds saturating at about
//! 4.29 seconds.

use core::sync::atomic::{AtomicU32, Ordering};

cfg_if::cfg_if! {
    if #[cfg(target_has_atomic = "64")] {
        use core::sync::atomic::AtomicU64;

        /// Counter used by vector entries on this target
        pub type IrqCounter = WideCounter;
    } else {
        /// Counter used by vector entries on this target
        pub type IrqCounter = SplitCounter;
    }
}

/// Running maximum of handler times in nanoseconds
#[derive(Debug)]
pub struct WorstCase {
    #[cfg(target_has_atomic = "64")]
    nanos: AtomicU64,
    #[cfg(not(target_has_atomic = "64"))]
    nanos: AtomicU32,
}

impl WorstCase {
    /// Zero
    pub const fn new() -> Self {
        Self {
            #[cfg(target_has_atomic = "64")]
            nanos: AtomicU64::new(0),
            #[cfg(not(target_has_atomic = "64"))]
            nanos: AtomicU32::new(0),
        }
    }

    /// Raise to `nanos` if larger
    #[inline(always)]
    pub fn record(&self, nanos: u64) {
        #[cfg(not(target_has_atomic = "64"))]
        let nanos = u32::try_from(nanos).unwrap_or(u32::MAX);
        self.nanos.fetch_max(nanos, Ordering::Relaxed);
    }

    /// Current maximum
    #[inline]
    pub fn get(&self) -> u64 {
        u64::from(self.nanos.load(Ordering::Relaxed))
    }

    /// Reset to zero
    pub fn reset(&self) {
        self.nanos.store(0, Ordering::Relaxed);
    }
}

impl Default for WorstCase {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Wide Counter
// =============================================================================

/// Single 64-bit counter
#[cfg(target_has_atomic = "64")]
#[derive(Debug)]
pub struct WideCounter(AtomicU64);

#[cfg(target_has_atomic = "64")]
impl WideCounter {
    /// A zeroed counter
    pub const fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    /// Add one, wrapping at `u64::MAX`
    #[inline(always)]
    pub fn increment(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    /// Current value
    #[inline]
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    /// Reset to zero
    pub fn reset(&self) {
        self.0.store(0, Ordering::Relaxed);
    }
}

#[cfg(target_has_atomic = "64")]
impl Default for WideCounter {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Split Counter
// =============================================================================

/// 64-bit counter built from two 32-bit halves
#[derive(Debug)]
pub struct SplitCounter {
    low: AtomicU32,
    high: AtomicU32,
}

impl SplitCounter {
    /// A zeroed counter
    pub const fn new() -> Self {
        Self {
            low: AtomicU32::new(0),
            high: AtomicU32::new(0),
        }
    }

    /// Add one, carrying into the high half when the low half wraps
    #[inline(always)]
    pub fn increment(&self) {
        if self.low.fetch_add(1, Ordering::Relaxed) == u32::MAX {
            self.high.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Current value
    ///
    /// The halves are read separately; a reader racing a carry may see a
    /// torn value. Readers are diagnostic only.
    #[inline]
    pub fn get(&self) -> u64 {
        let high = self.high.load(Ordering::Relaxed) as u64;
        let low = self.low.load(Ordering::Relaxed) as u64;
        (high << 32) | low
    }

    /// Low half
    pub fn low(&self) -> u32 {
        self.low.load(Ordering::Relaxed)
    }

    /// High half
    pub fn high(&self) -> u32 {
        self.high.load(Ordering::Relaxed)
    }

    /// Reset to zero
    pub fn reset(&self) {
        self.low.store(0, Ordering::Relaxed);
        self.high.store(0, Ordering::Relaxed);
    }

    #[cfg(test)]
    fn preset(&self, value: u64) {
        self.low.store(value as u32, Ordering::Relaxed);
        self.high.store((value >> 32) as u32, Ordering::Relaxed);
    }
}

impl Default for SplitCounter {
    fn default() -> Self {
        Self::new()
    }
}
