//! # Handler Timing Sources
//!
//! The dispatcher times handlers through [`IrqClock`]. Platforms provide one
//! of two kinds of time source and wrap it in the matching adapter:
//!
//! | Source            | Adapter         | Reading                      |
//! |-------------------|-----------------|------------------------------|
//! | [`CycleCounter`]  | [`CounterClock`]| free-running 32-bit ticks    |
//! | [`SystemClock`]   | [`SysClock`]    | monotonic time since boot    |
//!
//! Either source may be read before it is initialized. An unavailable
//! reading counts as zero, so an early interrupt produces a large but
//! harmless measurement instead of a fault.

use core::time::Duration;

/// Time source used to measure handler run time
pub trait IrqClock {
    /// Opaque timestamp
    type Stamp: Copy;

    /// Take a timestamp
    fn stamp(&self) -> Self::Stamp;

    /// Nanoseconds between two stamps
    fn elapsed_nanos(&self, start: Self::Stamp, end: Self::Stamp) -> u64;
}

impl<C: IrqClock + ?Sized> IrqClock for &C {
    type Stamp = C::Stamp;

    #[inline(always)]
    fn stamp(&self) -> Self::Stamp {
        (**self).stamp()
    }

    #[inline(always)]
    fn elapsed_nanos(&self, start: Self::Stamp, end: Self::Stamp) -> u64 {
        (**self).elapsed_nanos(start, end)
    }
}

// =============================================================================
// Cycle Counter
// =============================================================================

/// Fast free-running counter in platform-defined units
///
/// The counter is unsigned, monotonically increasing modulo 2^32, and the
/// elapsed ticks between two readings are their wrapping difference.
pub trait CycleCounter {
    /// Current tick count, `None` before the counter is running
    fn ticks(&self) -> Option<u32>;

    /// Convert elapsed ticks to nanoseconds
    fn ticks_to_nanos(&self, ticks: u32) -> u64;
}

impl<T: CycleCounter + ?Sized> CycleCounter for &T {
    #[inline(always)]
    fn ticks(&self) -> Option<u32> {
        (**self).ticks()
    }

    #[inline(always)]
    fn ticks_to_nanos(&self, ticks: u32) -> u64 {
        (**self).ticks_to_nanos(ticks)
    }
}

/// [`IrqClock`] over a [`CycleCounter`]
#[derive(Debug, Clone, Copy, Default)]
pub struct CounterClock<T>(pub T);

impl<T: CycleCounter> IrqClock for CounterClock<T> {
    type Stamp = u32;

    #[inline(always)]
    fn stamp(&self) -> u32 {
        self.0.ticks().unwrap_or(0)
    }

    #[inline(always)]
    fn elapsed_nanos(&self, start: u32, end: u32) -> u64 {
        self.0.ticks_to_nanos(end.wrapping_sub(start))
    }
}

/// Tick-to-nanosecond conversion for a counter of known frequency
///
/// Returns 0 for an uncalibrated (zero) frequency.
#[inline]
pub const fn ticks_to_nanos(ticks: u64, frequency_hz: u64) -> u64 {
    if frequency_hz > 0 {
        ((ticks as u128 * 1_000_000_000) / frequency_hz as u128) as u64
    } else {
        0
    }
}

// =============================================================================
// System Clock
// =============================================================================

/// General monotonic system clock
pub trait SystemClock {
    /// Time since boot, `None` before the clock is running
    fn now(&self) -> Option<Duration>;
}

impl<T: SystemClock + ?Sized> SystemClock for &T {
    #[inline(always)]
    fn now(&self) -> Option<Duration> {
        (**self).now()
    }
}

/// [`IrqClock`] over a [`SystemClock`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SysClock<T>(pub T);

impl<T: SystemClock> IrqClock for SysClock<T> {
    type Stamp = Duration;

    #[inline(always)]
    fn stamp(&self) -> Duration {
        self.0.now().unwrap_or(Duration::ZERO)
    }

    #[inline(always)]
    fn elapsed_nanos(&self, start: Duration, end: Duration) -> u64 {
        let nanos = end.saturating_sub(start).as_nanos();
        u64::try_from(nanos).unwrap_or(u64::MAX)
    }
}

// =============================================================================
// No Clock
// =============================================================================

/// Clock for platforms without a time source; every measurement is zero
#[derive(Debug, Clone, Copy, Default)]
pub struct NoClock;

impl IrqClock for NoClock {
    type Stamp = ();

    #[inline(always)]
    fn stamp(&self) {}

    #[inline(always)]
    fn elapsed_nanos(&self, _start: (), _end: ()) -> u64 {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    struct Ticks {
        now: Cell<Option<u32>>,
    }

    impl CycleCounter for Ticks {
        fn ticks(&self) -> Option<u32> {
            self.now.get()
        }

        // 4 ns per tick
        fn ticks_to_nanos(&self, ticks: u32) -> u64 {
            ticks as u64 * 4
        }
    }

    struct Uptime(Option<Duration>);

    impl SystemClock for Uptime {
        fn now(&self) -> Option<Duration> {
            self.0
        }
    }

    #[test]
    fn test_counter_clock_elapsed() {
        let clock = CounterClock(Ticks {
            now: Cell::new(Some(100)),
        });
        let start = clock.stamp();
        clock.0.now.set(Some(350));
        let end = clock.stamp();
        assert_eq!(clock.elapsed_nanos(start, end), 1000);
    }

    #[test]
    fn test_counter_clock_wraps() {
        let clock = CounterClock(Ticks {
            now: Cell::new(Some(u32::MAX - 9)),
        });
        let start = clock.stamp();
        clock.0.now.set(Some(15));
        let end = clock.stamp();
        assert_eq!(clock.elapsed_nanos(start, end), 25 * 4);
    }

    #[test]
    fn test_counter_clock_not_running_reads_zero() {
        let clock = CounterClock(Ticks {
            now: Cell::new(None),
        });
        assert_eq!(clock.stamp(), 0);
        assert_eq!(clock.elapsed_nanos(0, 10), 40);
    }

    #[test]
    fn test_sys_clock_elapsed() {
        let clock = SysClock(Uptime(Some(Duration::new(2, 999_999_000))));
        let start = clock.stamp();
        let end = Duration::new(3, 1_500);
        assert_eq!(clock.elapsed_nanos(start, end), 2_500);
    }

    #[test]
    fn test_sys_clock_not_running_reads_zero() {
        let clock = SysClock(Uptime(None));
        assert_eq!(clock.stamp(), Duration::ZERO);
        // A clock that goes backwards measures nothing.
        assert_eq!(
            clock.elapsed_nanos(Duration::from_micros(5), Duration::ZERO),
            0
        );
    }

    #[test]
    fn test_ticks_to_nanos() {
        assert_eq!(ticks_to_nanos(3_000, 3_000_000_000), 1_000);
        assert_eq!(ticks_to_nanos(24, 24_000_000), 1_000);
        assert_eq!(ticks_to_nanos(1_000, 0), 0);
    }
}
