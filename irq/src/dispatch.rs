//! # IRQ Dispatcher
//!
//! The trampoline between architecture trap entry and interrupt service
//! routines.
//!
//! ```text
//!  trap entry ──▶ dispatch(irq, context)
//!                   │
//!                   ├─ resolve slot ──────── none ──┐
//!                   │     │                         │
//!                   │     ▼                         │
//!                   │  count arrival                │
//!                   │     │                         ▼
//!                   ├─ entropy hint          unexpected_isr
//!                   │     │
//!                   ├─ call isr (timed when monitored)
//!                   │
//!                   └─ record running task for this CPU
//! ```
//!
//! Resolution, monitoring and entropy harvesting are type parameters, so each
//! configuration compiles to its own straight-line code path with no runtime
//! configuration checks.

use core::ffi::c_void;
use core::ptr;
use core::sync::atomic::AtomicUsize;

use crate::config::{DefaultEntropy, DefaultMonitor};
use crate::error::{IrqError, IrqResult};
use crate::irqmap::{FullTable, IrqMap, SlotResolver};
use crate::monitor::IrqMonitor;
use crate::platform::{record_running, EntropyPolicy, Platform, RunningTasks};
use crate::report::{self, IrqInfo};
use crate::vector::{unexpected_isr, Isr, VectorEntry, VectorTable};
use crate::Irq;

/// Object-safe view of a dispatcher, for installing behind the C entry point
pub trait Dispatch: Sync {
    /// Dispatch one interrupt
    fn dispatch(&self, irq: Irq, context: *mut c_void);
}

/// Interrupt dispatcher over an injected vector table
pub struct Dispatcher<'a, P, R = FullTable, M = DefaultMonitor, E = DefaultEntropy> {
    platform: P,
    vectors: &'a [VectorEntry],
    running: &'a [AtomicUsize],
    resolver: R,
    monitor: M,
    entropy: E,
    unexpected: Isr,
}

impl<'a, P: Platform> Dispatcher<'a, P> {
    /// Full-table dispatcher with the build's default monitor and entropy
    /// policies and [`unexpected_isr`] as fallback
    pub fn new<const N: usize, const NCPUS: usize>(
        platform: P,
        vectors: &'a VectorTable<N>,
        running: &'a RunningTasks<NCPUS>,
    ) -> Self {
        Self {
            platform,
            vectors: vectors.entries(),
            running: running.slots(),
            resolver: FullTable,
            monitor: DefaultMonitor::default(),
            entropy: DefaultEntropy::default(),
            unexpected: unexpected_isr,
        }
    }
}

impl<P, R: core::fmt::Debug, M, E> core::fmt::Debug for Dispatcher<'_, P, R, M, E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("slots", &self.vectors.len())
            .field("cpus", &self.running.len())
            .field("resolver", &self.resolver)
            .field("monitor", &core::any::type_name::<M>())
            .field("entropy", &core::any::type_name::<E>())
            .finish()
    }
}

impl<'a, P, R, M, E> Dispatcher<'a, P, R, M, E> {
    /// Resolve IRQs through a compact table map
    pub fn with_irq_map(self, map: IrqMap<'a>) -> Dispatcher<'a, P, IrqMap<'a>, M, E> {
        self.with_resolver(map)
    }

    /// Resolve IRQs with `resolver`
    pub fn with_resolver<R2: SlotResolver>(self, resolver: R2) -> Dispatcher<'a, P, R2, M, E> {
        Dispatcher {
            platform: self.platform,
            vectors: self.vectors,
            running: self.running,
            resolver,
            monitor: self.monitor,
            entropy: self.entropy,
            unexpected: self.unexpected,
        }
    }

    /// Instrument dispatches with `monitor`
    pub fn with_monitor<M2: IrqMonitor>(self, monitor: M2) -> Dispatcher<'a, P, R, M2, E> {
        Dispatcher {
            platform: self.platform,
            vectors: self.vectors,
            running: self.running,
            resolver: self.resolver,
            monitor,
            entropy: self.entropy,
            unexpected: self.unexpected,
        }
    }

    /// Feed the entropy pool according to `entropy`
    pub fn with_entropy<E2: EntropyPolicy>(self, entropy: E2) -> Dispatcher<'a, P, R, M, E2> {
        Dispatcher {
            platform: self.platform,
            vectors: self.vectors,
            running: self.running,
            resolver: self.resolver,
            monitor: self.monitor,
            entropy,
            unexpected: self.unexpected,
        }
    }

    /// Replace the fallback for unclaimed interrupts
    pub fn with_unexpected(mut self, isr: Isr) -> Self {
        self.unexpected = isr;
        self
    }
}

impl<'a, P, R, M, E> Dispatcher<'a, P, R, M, E>
where
    P: Platform,
    R: SlotResolver,
    M: IrqMonitor,
    E: EntropyPolicy,
{
    /// Dispatch one interrupt
    ///
    /// Called from trap entry with interrupts of equal or lower priority
    /// masked. Runs exactly one handler: the one attached to the IRQ's slot,
    /// or the unexpected-interrupt fallback with a null argument.
    #[inline]
    pub fn dispatch(&self, irq: Irq, context: *mut c_void) {
        let entry = self
            .resolver
            .resolve(irq, self.vectors.len())
            .and_then(|ndx| self.vectors.get(ndx));

        let mut isr = self.unexpected;
        let mut arg = ptr::null_mut();

        if let Some(entry) = entry {
            if let Some(handler) = entry.handler() {
                isr = handler;
                arg = entry.arg();
            }

            self.monitor.on_arrival(entry);
        }

        self.entropy.harvest(&self.platform, irq);

        match entry {
            Some(entry) => {
                self.monitor
                    .call(self.platform.clock(), entry, isr, irq, context, arg)
            },
            None => isr(irq, context, arg),
        }

        // Only crash reporting reads this.
        record_running(
            self.running,
            self.platform.this_cpu(),
            self.platform.this_task(),
        );
    }

    /// Vector entry serving `irq`
    pub fn entry(&self, irq: Irq) -> Option<&'a VectorEntry> {
        let vectors = self.vectors;
        self.resolver
            .resolve(irq, vectors.len())
            .and_then(|ndx| vectors.get(ndx))
    }

    /// Attach `isr` with `arg` to `irq`, or detach it when `isr` is `None`
    ///
    /// Must not race a dispatch of the same IRQ; callers disable interrupts
    /// around it.
    pub fn attach(&self, irq: Irq, isr: Option<Isr>, arg: *mut c_void) -> IrqResult {
        if irq as usize >= self.resolver.irq_count(self.vectors.len()) {
            return Err(IrqError::InvalidIrq);
        }

        let entry = self.entry(irq).ok_or(IrqError::NotMapped)?;
        entry.attach(isr, arg);

        if isr.is_some() {
            log::debug!("IRQ: attached handler to IRQ {} ({:p})", irq, arg);
        } else {
            log::debug!("IRQ: detached IRQ {}", irq);
        }

        Ok(())
    }

    /// Detach the handler for `irq`
    pub fn detach(&self, irq: Irq) -> IrqResult {
        self.attach(irq, None, ptr::null_mut())
    }

    /// Visit every IRQ with an attached handler
    pub fn for_each_attached<F: FnMut(&IrqInfo)>(&self, f: F) {
        report::for_each_attached(self.vectors, &self.resolver, f);
    }
}

impl<P, R, M, E> Dispatch for Dispatcher<'_, P, R, M, E>
where
    P: Platform + Sync,
    R: SlotResolver + Sync,
    M: IrqMonitor + Sync,
    E: EntropyPolicy + Sync,
{
    fn dispatch(&self, irq: Irq, context: *mut c_void) {
        Dispatcher::dispatch(self, irq, context);
    }
}
