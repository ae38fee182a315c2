//! # Vector Table
//!
//! The table of interrupt service routines consumed by the dispatcher.
//!
//! ```text
//! ┌──────┬──────────────┬──────────────┬────────────┬───────────────┐
//! │ Slot │   Handler    │   Argument   │   Count    │  Worst (ns)   │
//! ├──────┼──────────────┼──────────────┼────────────┼───────────────┤
//! │  0   │ timer_isr    │ &TIMER       │  120 431   │     2 310     │
//! │  1   │ (none)       │ null         │        3   │         0     │
//! │  2   │ uart_isr     │ &UART0       │    8 812   │    14 002     │
//! │ ...  │              │              │            │               │
//! └──────┴──────────────┴──────────────┴────────────┴───────────────┘
//! ```
//!
//! Handler and argument are written by the registration subsystem, which is
//! expected to do so with interrupts disabled. The dispatcher only touches the
//! statistics columns.

use core::ffi::c_void;
use core::ptr;
use core::sync::atomic::{AtomicPtr, Ordering};

use crate::counter::{IrqCounter, WorstCase};
use crate::Irq;

// =============================================================================
// Handler Types
// =============================================================================

/// Interrupt service routine
///
/// Receives the raw IRQ number, the opaque trap context from the
/// architecture entry code, and the argument registered with the handler.
pub type Isr = fn(irq: Irq, context: *mut c_void, arg: *mut c_void);

/// Default handler for interrupts nobody claimed
///
/// Safe to call with a null argument.
pub fn unexpected_isr(irq: Irq, _context: *mut c_void, _arg: *mut c_void) {
    log::error!("IRQ: unexpected interrupt {}", irq);
}

/// Atomic storage for an optional [`Isr`]
///
/// Null means no handler. Only [`IsrSlot::set`] stores non-null values and it
/// only accepts `Isr` function pointers.
#[repr(transparent)]
struct IsrSlot(AtomicPtr<()>);

impl IsrSlot {
    const fn empty() -> Self {
        Self(AtomicPtr::new(ptr::null_mut()))
    }

    fn set(&self, isr: Option<Isr>) {
        let raw = isr.map_or(ptr::null_mut(), |f| f as *mut ());
        self.0.store(raw, Ordering::Release);
    }

    #[inline(always)]
    fn get(&self) -> Option<Isr> {
        let raw = self.0.load(Ordering::Acquire);
        if raw.is_null() {
            None
        } else {
            // SAFETY: `set` only stores null or a valid `Isr` pointer.
            Some(unsafe { core::mem::transmute::<*mut (), Isr>(raw) })
        }
    }
}

// =============================================================================
// Vector Entry
// =============================================================================

/// One interrupt slot: handler, argument and statistics
pub struct VectorEntry {
    handler: IsrSlot,
    arg: AtomicPtr<c_void>,
    count: IrqCounter,
    worst_nanos: WorstCase,
}

impl VectorEntry {
    /// An unattached slot with zeroed statistics
    pub const fn new() -> Self {
        Self {
            handler: IsrSlot::empty(),
            arg: AtomicPtr::new(ptr::null_mut()),
            count: IrqCounter::new(),
            worst_nanos: WorstCase::new(),
        }
    }

    /// Attach `isr` with `arg`, or detach when `isr` is `None`
    ///
    /// Statistics restart from zero so they describe the new handler.
    /// Detaching also clears the argument.
    pub fn attach(&self, isr: Option<Isr>, arg: *mut c_void) {
        let arg = if isr.is_some() { arg } else { ptr::null_mut() };
        // Clear the handler first so a racing dispatch never pairs the old
        // handler with the new argument.
        self.handler.set(None);
        self.arg.store(arg, Ordering::Release);
        self.reset_stats();
        self.handler.set(isr);
    }

    /// Detach the handler
    pub fn detach(&self) {
        self.attach(None, ptr::null_mut());
    }

    /// Registered handler
    #[inline(always)]
    pub fn handler(&self) -> Option<Isr> {
        self.handler.get()
    }

    /// Registered argument (null when unset)
    #[inline(always)]
    pub fn arg(&self) -> *mut c_void {
        self.arg.load(Ordering::Acquire)
    }

    /// Whether a handler is attached
    pub fn is_attached(&self) -> bool {
        self.handler.get().is_some()
    }

    /// Number of interrupts taken on this slot
    pub fn count(&self) -> u64 {
        self.count.get()
    }

    /// Longest observed handler run time in nanoseconds
    pub fn worst_nanos(&self) -> u64 {
        self.worst_nanos.get()
    }

    /// Count one arrival
    #[inline(always)]
    pub(crate) fn record_arrival(&self) {
        self.count.increment();
    }

    /// Raise the worst-case time if `nanos` exceeds it
    #[inline(always)]
    pub(crate) fn record_elapsed(&self, nanos: u64) {
        self.worst_nanos.record(nanos);
    }

    /// Zero the count and worst-case time
    pub fn reset_stats(&self) {
        self.count.reset();
        self.worst_nanos.reset();
    }
}

impl Default for VectorEntry {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for VectorEntry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("VectorEntry")
            .field("attached", &self.is_attached())
            .field("arg", &self.arg())
            .field("count", &self.count())
            .field("worst_nanos", &self.worst_nanos())
            .finish()
    }
}

// =============================================================================
// Vector Table
// =============================================================================

/// Fixed-size table of vector entries
///
/// Meant to live in a `static`, sized for the number of dispatchable
/// interrupts on the platform.
#[derive(Debug)]
pub struct VectorTable<const N: usize> {
    entries: [VectorEntry; N],
}

impl<const N: usize> VectorTable<N> {
    /// Number of slots
    pub const SLOTS: usize = N;

    /// A table with every slot unattached
    pub const fn new() -> Self {
        Self {
            entries: [const { VectorEntry::new() }; N],
        }
    }

    /// All entries
    #[inline(always)]
    pub fn entries(&self) -> &[VectorEntry] {
        &self.entries
    }

    /// Entry for a slot index
    pub fn entry(&self, slot: usize) -> Option<&VectorEntry> {
        self.entries.get(slot)
    }

    /// Zero the statistics of every slot
    pub fn reset_stats(&self) {
        for entry in &self.entries {
            entry.reset_stats();
        }
    }
}

impl<const N: usize> Default for VectorTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn isr_a(_irq: Irq, _ctx: *mut c_void, _arg: *mut c_void) {}

    fn isr_b(_irq: Irq, _ctx: *mut c_void, _arg: *mut c_void) {}

    #[test]
    fn test_new_entry_is_empty() {
        let entry = VectorEntry::new();
        assert!(entry.handler().is_none());
        assert!(entry.arg().is_null());
        assert_eq!(entry.count(), 0);
        assert_eq!(entry.worst_nanos(), 0);
    }

    #[test]
    fn test_attach_roundtrips_handler() {
        let mut cookie = 7u32;
        let arg = &mut cookie as *mut u32 as *mut c_void;
        let entry = VectorEntry::new();

        entry.attach(Some(isr_a), arg);
        assert_eq!(entry.handler().map(|f| f as usize), Some(isr_a as usize));
        assert_eq!(entry.arg(), arg);

        entry.attach(Some(isr_b), ptr::null_mut());
        assert_eq!(entry.handler().map(|f| f as usize), Some(isr_b as usize));
        assert!(entry.arg().is_null());
    }

    #[test]
    fn test_detach_clears_argument_and_stats() {
        let mut cookie = 1u8;
        let entry = VectorEntry::new();
        entry.attach(Some(isr_a), &mut cookie as *mut u8 as *mut c_void);
        entry.record_arrival();
        entry.record_elapsed(500);

        entry.detach();
        assert!(!entry.is_attached());
        assert!(entry.arg().is_null());
        assert_eq!(entry.count(), 0);
        assert_eq!(entry.worst_nanos(), 0);
    }

    #[test]
    fn test_attach_none_ignores_argument() {
        let mut cookie = 1u8;
        let entry = VectorEntry::new();
        entry.attach(None, &mut cookie as *mut u8 as *mut c_void);
        assert!(entry.arg().is_null());
    }

    #[test]
    fn test_worst_case_only_rises() {
        let entry = VectorEntry::new();
        for (nanos, expected) in [(300, 300), (100, 300), (900, 900), (899, 900)] {
            entry.record_elapsed(nanos);
            assert_eq!(entry.worst_nanos(), expected);
        }
    }

    #[test]
    fn test_table_reset_stats() {
        static TABLE: VectorTable<4> = VectorTable::new();
        assert_eq!(VectorTable::<4>::SLOTS, 4);

        TABLE.entries()[1].record_arrival();
        TABLE.entries()[3].record_elapsed(42);
        TABLE.reset_stats();

        assert!(TABLE.entries().iter().all(|e| e.count() == 0));
        assert!(TABLE.entries().iter().all(|e| e.worst_nanos() == 0));
        assert!(TABLE.entry(4).is_none());
    }
}
