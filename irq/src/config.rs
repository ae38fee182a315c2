//! # Build Configuration
//!
//! Cargo features pick the policies a kernel dispatcher is built with:
//!
//! | Feature                | Effect                                        |
//! |------------------------|-----------------------------------------------|
//! | `irq-count`            | count arrivals per slot                       |
//! | `irq-timing`           | also track worst-case handler time            |
//! | `minimal-vector-table` | resolve IRQs through an [`IrqMap`]            |
//! | `irq-randomness`       | feed IRQ numbers to the entropy pool          |
//! | `clock-systime`        | time handlers with the system clock           |
//!
//! Nothing here is consulted at run time; the choices are types.

use bitflags::bitflags;

use crate::dispatch::Dispatcher;
use crate::error::IrqResult;
use crate::platform::{Platform, RunningTasks};
use crate::vector::{VectorEntry, VectorTable};

// Only the policies picked by the active features are used.
#[allow(unused_imports)]
use crate::{
    clock::{CounterClock, CycleCounter, SysClock, SystemClock},
    irqmap::{FullTable, IrqMap},
    monitor::{Counted, Monitored, Unmonitored},
    platform::{Harvest, NoHarvest},
};

cfg_if::cfg_if! {
    if #[cfg(feature = "irq-timing")] {
        /// Monitor policy selected by the build
        pub type DefaultMonitor = Monitored;
    } else if #[cfg(feature = "irq-count")] {
        /// Monitor policy selected by the build
        pub type DefaultMonitor = Counted;
    } else {
        /// Monitor policy selected by the build
        pub type DefaultMonitor = Unmonitored;
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "irq-randomness")] {
        /// Entropy policy selected by the build
        pub type DefaultEntropy = Harvest;
    } else {
        /// Entropy policy selected by the build
        pub type DefaultEntropy = NoHarvest;
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "clock-systime")] {
        /// Time source a kernel platform must provide in this build
        pub trait TimeSource: SystemClock {}

        impl<T: SystemClock> TimeSource for T {}

        /// Handler timing clock over the platform time source `T`
        pub type PlatformClock<T> = SysClock<T>;

        /// Wrap `source` in the clock this build times handlers with
        pub const fn platform_clock<T: TimeSource>(source: T) -> PlatformClock<T> {
            SysClock(source)
        }
    } else {
        /// Time source a kernel platform must provide in this build
        pub trait TimeSource: CycleCounter {}

        impl<T: CycleCounter> TimeSource for T {}

        /// Handler timing clock over the platform time source `T`
        pub type PlatformClock<T> = CounterClock<T>;

        /// Wrap `source` in the clock this build times handlers with
        pub const fn platform_clock<T: TimeSource>(source: T) -> PlatformClock<T> {
            CounterClock(source)
        }
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "minimal-vector-table")] {
        /// Dispatcher type the kernel installs
        pub type KernelDispatcher<'a, P> = Dispatcher<'a, P, IrqMap<'a>>;
    } else {
        /// Dispatcher type the kernel installs
        pub type KernelDispatcher<'a, P> = Dispatcher<'a, P, FullTable>;
    }
}

/// Build the dispatcher this configuration calls for
///
/// The platform's clock must be [`PlatformClock`], so a platform timing
/// handlers with the wrong source fails to compile. Compact-table builds
/// also take the IRQ map, which is checked against the table.
pub fn kernel_dispatcher<'a, P, T, const N: usize, const NCPUS: usize>(
    platform: P,
    vectors: &'a VectorTable<N>,
    running: &'a RunningTasks<NCPUS>,
    #[cfg(feature = "minimal-vector-table")] map: IrqMap<'a>,
) -> IrqResult<KernelDispatcher<'a, P>>
where
    P: Platform<Clock = PlatformClock<T>>,
    T: TimeSource,
{
    let dispatcher = Dispatcher::new(platform, vectors, running);

    #[cfg(feature = "minimal-vector-table")]
    let dispatcher = {
        map.validate(N)?;
        dispatcher.with_irq_map(map)
    };

    Ok(dispatcher)
}

bitflags! {
    /// Instrumentation compiled into this build
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DispatchFeatures: u32 {
        /// Per-slot arrival counts
        const COUNT = 1 << 0;
        /// Per-slot worst-case handler time
        const TIMING = 1 << 1;
        /// Compact vector table behind an IRQ map
        const MINIMAL_TABLE = 1 << 2;
        /// Entropy harvesting
        const RANDOMNESS = 1 << 3;
        /// System clock instead of the cycle counter
        const SYSTEM_CLOCK = 1 << 4;
    }
}

impl DispatchFeatures {
    /// Features enabled in this build
    pub const fn compiled() -> Self {
        let mut features = Self::empty();
        if cfg!(feature = "irq-count") {
            features = features.union(Self::COUNT);
        }
        if cfg!(feature = "irq-timing") {
            features = features.union(Self::TIMING);
        }
        if cfg!(feature = "minimal-vector-table") {
            features = features.union(Self::MINIMAL_TABLE);
        }
        if cfg!(feature = "irq-randomness") {
            features = features.union(Self::RANDOMNESS);
        }
        if cfg!(feature = "clock-systime") {
            features = features.union(Self::SYSTEM_CLOCK);
        }
        features
    }
}

static_assertions::assert_impl_all!(VectorEntry: Send, Sync);
static_assertions::assert_eq_size!(DefaultMonitor, ());
static_assertions::assert_eq_size!(DefaultEntropy, ());

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{CycleCounter, SystemClock};
    use crate::platform::TaskRef;
    use crate::Irq;
    use core::cell::Cell;
    use core::ffi::c_void;
    use core::ptr;
    use core::time::Duration;

    #[cfg(feature = "minimal-vector-table")]
    use crate::{
        error::IrqError,
        irqmap::{build_irq_map, IrqMapped},
    };

    /// Source usable as either kind of clock: 100 ticks or 7 ns per read
    #[derive(Default)]
    struct DualSource {
        reads: Cell<u32>,
    }

    impl DualSource {
        fn next(&self) -> u32 {
            let n = self.reads.get() + 1;
            self.reads.set(n);
            n
        }
    }

    impl CycleCounter for DualSource {
        fn ticks(&self) -> Option<u32> {
            Some(self.next() * 100)
        }

        fn ticks_to_nanos(&self, ticks: u32) -> u64 {
            ticks as u64
        }
    }

    impl SystemClock for DualSource {
        fn now(&self) -> Option<Duration> {
            Some(Duration::from_nanos(self.next() as u64 * 7))
        }
    }

    struct BoardPlatform {
        clock: PlatformClock<DualSource>,
    }

    impl Platform for BoardPlatform {
        type Clock = PlatformClock<DualSource>;

        fn clock(&self) -> &Self::Clock {
            &self.clock
        }

        fn this_cpu(&self) -> usize {
            0
        }

        fn this_task(&self) -> TaskRef {
            TaskRef::new(0x1000)
        }
    }

    fn nop_isr(_irq: Irq, _ctx: *mut c_void, _arg: *mut c_void) {}

    #[cfg(feature = "minimal-vector-table")]
    static MAP: [IrqMapped; 16] = build_irq_map(&[(3, 3), (5, 0)]);

    #[test]
    fn test_kernel_dispatcher_follows_features() {
        let features = DispatchFeatures::compiled();
        let platform = BoardPlatform {
            clock: platform_clock(DualSource::default()),
        };
        let vectors = VectorTable::<4>::new();
        let running = RunningTasks::<1>::new();

        #[cfg(feature = "minimal-vector-table")]
        let d = kernel_dispatcher(&platform, &vectors, &running, IrqMap::new(&MAP));
        #[cfg(not(feature = "minimal-vector-table"))]
        let d = kernel_dispatcher(&platform, &vectors, &running);
        let d = d.unwrap();

        d.attach(3, Some(nop_isr), ptr::null_mut()).unwrap();
        d.dispatch(3, ptr::null_mut());

        let slot = &vectors.entries()[3];
        let expected_count = if features.contains(DispatchFeatures::COUNT) { 1 } else { 0 };
        assert_eq!(slot.count(), expected_count);

        let expected_worst = match (
            features.contains(DispatchFeatures::TIMING),
            features.contains(DispatchFeatures::SYSTEM_CLOCK),
        ) {
            (false, _) => 0,
            (true, true) => 7,
            (true, false) => 100,
        };
        assert_eq!(slot.worst_nanos(), expected_worst);

        // IRQ 2 has its own slot only in a full table.
        let minimal = features.contains(DispatchFeatures::MINIMAL_TABLE);
        assert_eq!(d.entry(2).is_none(), minimal);
        assert_eq!(
            core::any::type_name::<KernelDispatcher<'_, &BoardPlatform>>().contains("IrqMap"),
            minimal
        );
    }

    #[cfg(feature = "minimal-vector-table")]
    #[test]
    fn test_kernel_dispatcher_rejects_map_past_table() {
        static BAD: [IrqMapped; 16] = build_irq_map(&[(3, 9)]);
        let platform = BoardPlatform {
            clock: platform_clock(DualSource::default()),
        };
        let vectors = VectorTable::<4>::new();
        let running = RunningTasks::<1>::new();

        let d = kernel_dispatcher(&platform, &vectors, &running, IrqMap::new(&BAD));
        assert!(matches!(d, Err(IrqError::InvalidSlot)));
    }

    #[test]
    fn test_timing_implies_count() {
        let features = DispatchFeatures::compiled();
        if features.contains(DispatchFeatures::TIMING) {
            assert!(features.contains(DispatchFeatures::COUNT));
        }
    }

    #[test]
    fn test_default_policies_match_features() {
        let features = DispatchFeatures::compiled();
        let name = core::any::type_name::<DefaultMonitor>();
        if features.contains(DispatchFeatures::TIMING) {
            assert!(name.ends_with("Monitored"));
        } else if features.contains(DispatchFeatures::COUNT) {
            assert!(name.ends_with("Counted"));
        } else {
            assert!(name.ends_with("Unmonitored"));
        }
    }
}
