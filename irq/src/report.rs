//! # IRQ Statistics Report
//!
//! Walks the IRQ namespace and reports every interrupt with an attached
//! handler, the way a `/proc/irqs` style listing would:
//!
//! ```text
//! IRQ SLOT HANDLER            ARGUMENT                COUNT   WORST(ns)
//!  17    0 0x0000000080012a40 0x0000000080200000       1042        3120
//! ```

use core::ffi::c_void;
use core::fmt;

use crate::irqmap::SlotResolver;
use crate::vector::{Isr, VectorEntry};
use crate::Irq;

/// Snapshot of one attached interrupt
#[derive(Clone, Copy)]
pub struct IrqInfo {
    /// Raw IRQ number
    pub irq: Irq,
    /// Vector table slot
    pub slot: usize,
    /// Attached handler
    pub handler: Isr,
    /// Handler argument
    pub arg: *mut c_void,
    /// Interrupts taken
    pub count: u64,
    /// Worst-case handler time in nanoseconds
    pub worst_nanos: u64,
}

impl IrqInfo {
    /// Column header matching the [`fmt::Display`] output
    pub const HEADER: &'static str =
        "IRQ SLOT HANDLER            ARGUMENT                COUNT   WORST(ns)";

    fn capture(irq: Irq, slot: usize, entry: &VectorEntry) -> Option<Self> {
        let handler = entry.handler()?;
        Some(Self {
            irq,
            slot,
            handler,
            arg: entry.arg(),
            count: entry.count(),
            worst_nanos: entry.worst_nanos(),
        })
    }
}

impl fmt::Debug for IrqInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IrqInfo")
            .field("irq", &self.irq)
            .field("slot", &self.slot)
            .field("handler", &(self.handler as *const ()))
            .field("arg", &self.arg)
            .field("count", &self.count)
            .field("worst_nanos", &self.worst_nanos)
            .finish()
    }
}

impl fmt::Display for IrqInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>3} {:>4} {:#018x} {:#018x} {:>10} {:>11}",
            self.irq,
            self.slot,
            self.handler as usize,
            self.arg as usize,
            self.count,
            self.worst_nanos
        )
    }
}

/// Call `f` for every raw IRQ whose slot has a handler attached
///
/// With a compact table several IRQs may share a slot; each is reported.
pub fn for_each_attached<R, F>(vectors: &[VectorEntry], resolver: &R, mut f: F)
where
    R: SlotResolver + ?Sized,
    F: FnMut(&IrqInfo),
{
    let irqs = resolver.irq_count(vectors.len());
    for irq in 0..irqs {
        let Ok(irq) = Irq::try_from(irq) else {
            break;
        };
        let Some(slot) = resolver.resolve(irq, vectors.len()) else {
            continue;
        };
        if let Some(info) = vectors.get(slot).and_then(|e| IrqInfo::capture(irq, slot, e)) {
            f(&info);
        }
    }
}
