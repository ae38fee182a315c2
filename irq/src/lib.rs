//! # Helix IRQ Dispatch
//!
//! The interrupt trampoline: the one function every hardware interrupt passes
//! through between architecture trap entry and its service routine.
//!
//! ## Flow
//!
//! ```text
//!  ┌────────────┐   irq, context   ┌──────────────┐   slot   ┌─────────────┐
//!  │ trap entry │ ───────────────▶ │  Dispatcher  │ ───────▶ │ VectorTable │
//!  └────────────┘                  └──────┬───────┘          └──────┬──────┘
//!                                         │                         │
//!                              count, time│        handler, arg     │
//!                                         ▼                         ▼
//!                                  ┌─────────────┐          ┌──────────────┐
//!                                  │  Platform   │          │ ISR / unexp. │
//!                                  │ clock, cpu, │          └──────────────┘
//!                                  │ task, rng   │
//!                                  └─────────────┘
//! ```
//!
//! ## Components
//!
//! - **Dispatcher**: routes one interrupt to exactly one handler
//! - **Vector Table**: handlers, arguments and per-slot statistics
//! - **IRQ Map**: compact tables for sparse interrupt spaces
//! - **Monitors**: build-time choice of counting and timing
//! - **Entry Point**: install-once global behind `irq_dispatch`
//!
//! The dispatcher allocates nothing, takes no locks and never fails; IRQs it
//! cannot route go to the unexpected-interrupt handler.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

pub mod clock;
pub mod config;
pub mod counter;
pub mod dispatch;
pub mod entry;
pub mod error;
pub mod irqmap;
pub mod monitor;
pub mod platform;
pub mod report;
pub mod vector;

/// Raw interrupt number as delivered by trap entry
pub type Irq = u32;

pub use clock::{CounterClock, CycleCounter, IrqClock, NoClock, SysClock, SystemClock};
pub use config::{
    kernel_dispatcher, platform_clock, DefaultEntropy, DefaultMonitor, DispatchFeatures,
    KernelDispatcher, PlatformClock, TimeSource,
};
pub use dispatch::{Dispatch, Dispatcher};
pub use entry::{install, irq_dispatch, is_installed, EntryPoint};
pub use error::{IrqError, IrqResult};
pub use irqmap::{build_irq_map, FullTable, IrqMap, IrqMapped, SlotResolver, IRQ_UNMAPPED};
pub use monitor::{Counted, IrqMonitor, Monitored, Unmonitored};
pub use platform::{EntropyPolicy, Harvest, NoHarvest, Platform, RunningTasks, TaskRef};
pub use report::IrqInfo;
pub use vector::{unexpected_isr, Isr, VectorEntry, VectorTable};
