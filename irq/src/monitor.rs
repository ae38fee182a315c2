//! # IRQ Monitoring Policies
//!
//! Per-slot instrumentation is chosen at build time by the dispatcher's
//! monitor type parameter:
//!
//! | Policy          | Counts arrivals | Times handlers |
//! |-----------------|-----------------|----------------|
//! | [`Unmonitored`] | no              | no             |
//! | [`Counted`]     | yes             | no             |
//! | [`Monitored`]   | yes             | yes            |
//!
//! All three are zero-sized. With [`Unmonitored`] both hooks inline to
//! nothing and the handler call is a plain indirect call.

use core::ffi::c_void;

use crate::clock::IrqClock;
use crate::vector::{Isr, VectorEntry};
use crate::Irq;

/// Instrumentation around a dispatch
pub trait IrqMonitor {
    /// An interrupt arrived on `entry`, attached or not
    fn on_arrival(&self, entry: &VectorEntry);

    /// Run `isr` for a resolved slot
    fn call<C: IrqClock>(
        &self,
        clock: &C,
        entry: &VectorEntry,
        isr: Isr,
        irq: Irq,
        context: *mut c_void,
        arg: *mut c_void,
    );
}

/// No instrumentation
#[derive(Debug, Clone, Copy, Default)]
pub struct Unmonitored;

impl IrqMonitor for Unmonitored {
    #[inline(always)]
    fn on_arrival(&self, _entry: &VectorEntry) {}

    #[inline(always)]
    fn call<C: IrqClock>(
        &self,
        _clock: &C,
        _entry: &VectorEntry,
        isr: Isr,
        irq: Irq,
        context: *mut c_void,
        arg: *mut c_void,
    ) {
        isr(irq, context, arg);
    }
}

/// Count arrivals per slot
#[derive(Debug, Clone, Copy, Default)]
pub struct Counted;

impl IrqMonitor for Counted {
    #[inline(always)]
    fn on_arrival(&self, entry: &VectorEntry) {
        entry.record_arrival();
    }

    #[inline(always)]
    fn call<C: IrqClock>(
        &self,
        _clock: &C,
        _entry: &VectorEntry,
        isr: Isr,
        irq: Irq,
        context: *mut c_void,
        arg: *mut c_void,
    ) {
        isr(irq, context, arg);
    }
}

/// Count arrivals and track the worst-case handler time per slot
#[derive(Debug, Clone, Copy, Default)]
pub struct Monitored;

impl IrqMonitor for Monitored {
    #[inline(always)]
    fn on_arrival(&self, entry: &VectorEntry) {
        entry.record_arrival();
    }

    #[inline]
    fn call<C: IrqClock>(
        &self,
        clock: &C,
        entry: &VectorEntry,
        isr: Isr,
        irq: Irq,
        context: *mut c_void,
        arg: *mut c_void,
    ) {
        let start = clock.stamp();
        isr(irq, context, arg);
        let end = clock.stamp();
        entry.record_elapsed(clock.elapsed_nanos(start, end));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;
    use core::ptr;

    /// Clock that advances 10 ns per reading
    struct StepClock {
        reads: Cell<u64>,
    }

    impl IrqClock for StepClock {
        type Stamp = u64;

        fn stamp(&self) -> u64 {
            let n = self.reads.get() + 1;
            self.reads.set(n);
            n * 10
        }

        fn elapsed_nanos(&self, start: u64, end: u64) -> u64 {
            end - start
        }
    }

    fn nop_isr(_irq: Irq, _ctx: *mut c_void, _arg: *mut c_void) {}

    fn run<M: IrqMonitor>(monitor: M) -> (VectorEntry, u64) {
        let clock = StepClock { reads: Cell::new(0) };
        let entry = VectorEntry::new();
        monitor.on_arrival(&entry);
        monitor.call(&clock, &entry, nop_isr, 3, ptr::null_mut(), ptr::null_mut());
        (entry, clock.reads.get())
    }

    #[test]
    fn test_policies_are_zero_sized() {
        assert_eq!(core::mem::size_of::<Unmonitored>(), 0);
        assert_eq!(core::mem::size_of::<Counted>(), 0);
        assert_eq!(core::mem::size_of::<Monitored>(), 0);
    }

    #[test]
    fn test_unmonitored_touches_nothing() {
        let (entry, reads) = run(Unmonitored);
        assert_eq!(entry.count(), 0);
        assert_eq!(entry.worst_nanos(), 0);
        assert_eq!(reads, 0);
    }

    #[test]
    fn test_counted_counts_without_clock() {
        let (entry, reads) = run(Counted);
        assert_eq!(entry.count(), 1);
        assert_eq!(entry.worst_nanos(), 0);
        assert_eq!(reads, 0);
    }

    #[test]
    fn test_monitored_counts_and_times() {
        let (entry, reads) = run(Monitored);
        assert_eq!(entry.count(), 1);
        assert_eq!(entry.worst_nanos(), 10);
        assert_eq!(reads, 2);
    }
}
