//! # Platform Hooks
//!
//! Everything the dispatcher needs from the rest of the kernel: which CPU it
//! runs on, which task that CPU is running, a clock for handler timing, and
//! optionally the entropy pool.

use core::sync::atomic::{AtomicUsize, Ordering};

use crate::clock::IrqClock;
use crate::Irq;

/// Opaque reference to a task control block
///
/// Zero means "no task".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct TaskRef(usize);

impl TaskRef {
    /// No task
    pub const NONE: TaskRef = TaskRef(0);

    /// Wrap a task address or identifier
    pub const fn new(raw: usize) -> Self {
        Self(raw)
    }

    /// Raw value
    pub const fn as_raw(self) -> usize {
        self.0
    }

    /// Whether this is [`TaskRef::NONE`]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

/// Kernel services consumed by the dispatcher
///
/// Every method is called from interrupt context and must not block.
pub trait Platform {
    /// Clock used to time handlers
    ///
    /// Platforms built through [`kernel_dispatcher`](crate::config::kernel_dispatcher)
    /// must use [`PlatformClock`](crate::config::PlatformClock).
    type Clock: IrqClock;

    /// The handler timing clock
    fn clock(&self) -> &Self::Clock;

    /// Index of the CPU taking the interrupt
    fn this_cpu(&self) -> usize;

    /// Task the scheduler considers running on this CPU
    fn this_task(&self) -> TaskRef;

    /// Feed interrupt timing into the entropy pool
    fn add_irq_randomness(&self, irq: Irq) {
        let _ = irq;
    }
}

impl<P: Platform + ?Sized> Platform for &P {
    type Clock = P::Clock;

    #[inline(always)]
    fn clock(&self) -> &Self::Clock {
        (**self).clock()
    }

    #[inline(always)]
    fn this_cpu(&self) -> usize {
        (**self).this_cpu()
    }

    #[inline(always)]
    fn this_task(&self) -> TaskRef {
        (**self).this_task()
    }

    #[inline(always)]
    fn add_irq_randomness(&self, irq: Irq) {
        (**self).add_irq_randomness(irq)
    }
}

// =============================================================================
// Running Tasks
// =============================================================================

/// Per-CPU record of the task running when the last dispatch finished
///
/// Only read by crash reporting. Slots are written with relaxed stores and no
/// lock; a reader may see a value one dispatch old.
#[derive(Debug)]
pub struct RunningTasks<const NCPUS: usize> {
    slots: [AtomicUsize; NCPUS],
}

impl<const NCPUS: usize> RunningTasks<NCPUS> {
    /// All CPUs recorded as running no task
    pub const fn new() -> Self {
        Self {
            slots: [const { AtomicUsize::new(0) }; NCPUS],
        }
    }

    /// Slots as a slice, for handing to a dispatcher
    #[inline(always)]
    pub fn slots(&self) -> &[AtomicUsize] {
        &self.slots
    }

    /// Task last recorded for `cpu`
    pub fn get(&self, cpu: usize) -> Option<TaskRef> {
        self.slots
            .get(cpu)
            .map(|slot| TaskRef(slot.load(Ordering::Relaxed)))
    }

    /// Record `task` for `cpu`; CPUs past the table are ignored
    #[inline(always)]
    pub fn set(&self, cpu: usize, task: TaskRef) {
        record_running(&self.slots, cpu, task);
    }
}

impl<const NCPUS: usize> Default for RunningTasks<NCPUS> {
    fn default() -> Self {
        Self::new()
    }
}

#[inline(always)]
pub(crate) fn record_running(slots: &[AtomicUsize], cpu: usize, task: TaskRef) {
    if let Some(slot) = slots.get(cpu) {
        slot.store(task.as_raw(), Ordering::Relaxed);
    }
}

// =============================================================================
// Entropy Policy
// =============================================================================

/// Whether the dispatcher feeds IRQ numbers to the entropy pool
pub trait EntropyPolicy {
    /// Hand `irq` to the platform entropy pool, or do nothing
    fn harvest<P: Platform>(&self, platform: &P, irq: Irq);
}

/// Do not feed the entropy pool
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHarvest;

impl EntropyPolicy for NoHarvest {
    #[inline(always)]
    fn harvest<P: Platform>(&self, _platform: &P, _irq: Irq) {}
}

/// Feed every IRQ number to the entropy pool before its handler runs
#[derive(Debug, Clone, Copy, Default)]
pub struct Harvest;

impl EntropyPolicy for Harvest {
    #[inline(always)]
    fn harvest<P: Platform>(&self, platform: &P, irq: Irq) {
        platform.add_irq_randomness(irq);
    }
}
