//! # IRQ Index Resolution
//!
//! Turns a raw IRQ number into a vector table slot.
//!
//! - [`FullTable`]: one slot per IRQ, the slot index is the IRQ number.
//! - [`IrqMap`]: a large, sparse IRQ namespace folded into a small dense
//!   table. Each raw IRQ maps to a slot index or to [`IRQ_UNMAPPED`].
//!
//! ```text
//!   raw IRQ      0    1    2    3   ...  57   58   59  ...
//!   IrqMap     [ U ][ U ][ 0 ][ U ] ... [ 1 ][ U ][ 2 ] ...
//!                        │                │         │
//!                        ▼                ▼         ▼
//!   VectorTable        [ 0 ]            [ 1 ]     [ 2 ]
//! ```

use crate::error::{IrqError, IrqResult};
use crate::Irq;

/// Compact slot index stored in an [`IrqMap`]
pub type IrqMapped = u16;

/// Map entry for IRQs with no slot in the compact table
pub const IRQ_UNMAPPED: IrqMapped = IrqMapped::MAX;

/// Largest compact table an [`IrqMap`] can address
pub const MAX_MAPPED_SLOTS: usize = IRQ_UNMAPPED as usize;

/// Strategy for turning a raw IRQ into a slot index
pub trait SlotResolver {
    /// Size of the raw IRQ namespace
    fn irq_count(&self, slots: usize) -> usize;

    /// Slot for `irq` in a table of `slots` entries, if it has one
    ///
    /// Never returns an index `>= slots`.
    fn resolve(&self, irq: Irq, slots: usize) -> Option<usize>;
}

// =============================================================================
// Full Table
// =============================================================================

/// Every IRQ has its own slot
#[derive(Debug, Clone, Copy, Default)]
pub struct FullTable;

impl SlotResolver for FullTable {
    #[inline(always)]
    fn irq_count(&self, slots: usize) -> usize {
        slots
    }

    #[inline(always)]
    fn resolve(&self, irq: Irq, slots: usize) -> Option<usize> {
        let ndx = irq as usize;
        (ndx < slots).then_some(ndx)
    }
}

// =============================================================================
// Minimal Table Map
// =============================================================================

/// Raw IRQ to compact slot map
#[derive(Debug, Clone, Copy)]
pub struct IrqMap<'a> {
    map: &'a [IrqMapped],
}

impl<'a> IrqMap<'a> {
    /// Wrap a map covering the whole raw IRQ namespace
    pub const fn new(map: &'a [IrqMapped]) -> Self {
        Self { map }
    }

    /// Mapped slot for `irq`, without checking it against a table
    ///
    /// `None` for IRQs past the map and for [`IRQ_UNMAPPED`] entries.
    pub fn get(&self, irq: Irq) -> Option<IrqMapped> {
        self.map
            .get(irq as usize)
            .copied()
            .filter(|&ndx| ndx != IRQ_UNMAPPED)
    }

    /// Check that every entry is either unmapped or inside a table of
    /// `slots` entries, and that the table fits the map's index range
    pub fn validate(&self, slots: usize) -> IrqResult {
        if slots > MAX_MAPPED_SLOTS {
            log::warn!(
                "IRQ: {} slot table exceeds the {} an IRQ map can address",
                slots,
                MAX_MAPPED_SLOTS
            );
            return Err(IrqError::InvalidSlot);
        }

        match self
            .map
            .iter()
            .position(|&ndx| ndx != IRQ_UNMAPPED && ndx as usize >= slots)
        {
            Some(irq) => {
                log::warn!(
                    "IRQ: map entry for IRQ {} points at slot {} of {}",
                    irq,
                    self.map[irq],
                    slots
                );
                Err(IrqError::InvalidSlot)
            },
            None => Ok(()),
        }
    }
}

impl SlotResolver for IrqMap<'_> {
    #[inline(always)]
    fn irq_count(&self, _slots: usize) -> usize {
        self.map.len()
    }

    #[inline(always)]
    fn resolve(&self, irq: Irq, slots: usize) -> Option<usize> {
        let ndx = self.get(irq)? as usize;
        (ndx < slots).then_some(ndx)
    }
}

/// Build a map of `N` IRQs from `(irq, slot)` pairs
///
/// IRQs not listed stay [`IRQ_UNMAPPED`].
pub const fn build_irq_map<const N: usize>(pairs: &[(usize, IrqMapped)]) -> [IrqMapped; N] {
    let mut map = [IRQ_UNMAPPED; N];
    let mut i = 0;
    while i < pairs.len() {
        let (irq, slot) = pairs[i];
        map[irq] = slot;
        i += 1;
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_table_bounds() {
        assert_eq!(FullTable.resolve(0, 64), Some(0));
        assert_eq!(FullTable.resolve(63, 64), Some(63));
        assert_eq!(FullTable.resolve(64, 64), None);
        assert_eq!(FullTable.resolve(Irq::MAX, 64), None);
        assert_eq!(FullTable.resolve(0, 0), None);
    }

    #[test]
    fn test_irq_map_resolves() {
        static MAP: [IrqMapped; 64] = build_irq_map(&[(2, 0), (57, 1), (59, 2)]);
        let map = IrqMap::new(&MAP);

        assert_eq!(map.irq_count(3), 64);
        assert_eq!(map.resolve(2, 3), Some(0));
        assert_eq!(map.resolve(57, 3), Some(1));
        assert_eq!(map.resolve(59, 3), Some(2));
        assert_eq!(map.resolve(3, 3), None);
        assert_eq!(map.resolve(64, 3), None);
        assert!(map.validate(3).is_ok());
    }

    #[test]
    fn test_irq_map_rejects_slot_past_table() {
        // Slot 5 does not exist in a 3-entry table.
        let raw = build_irq_map::<8>(&[(1, 0), (4, 5)]);
        let map = IrqMap::new(&raw);

        assert_eq!(map.get(4), Some(5));
        assert_eq!(map.resolve(4, 3), None);
        assert_eq!(map.validate(3), Err(IrqError::InvalidSlot));
        assert!(map.validate(6).is_ok());
    }

    #[test]
    fn test_unmapped_never_resolves() {
        let raw = build_irq_map::<8>(&[(1, 0)]);
        let map = IrqMap::new(&raw);

        // Even a table large enough to hold the sentinel's index.
        let slots = IRQ_UNMAPPED as usize + 1;
        assert_eq!(map.get(5), None);
        assert_eq!(map.resolve(5, slots), None);
        assert_eq!(map.resolve(1, slots), Some(0));
    }

    #[test]
    fn test_validate_rejects_oversized_table() {
        let raw = build_irq_map::<8>(&[(1, 0)]);
        let map = IrqMap::new(&raw);

        assert!(map.validate(MAX_MAPPED_SLOTS).is_ok());
        assert_eq!(map.validate(MAX_MAPPED_SLOTS + 1), Err(IrqError::InvalidSlot));
    }

    #[test]
    fn test_empty_irq_space() {
        let map = IrqMap::new(&[]);
        assert_eq!(map.irq_count(4), 0);
        assert_eq!(map.resolve(0, 4), None);
    }
}
