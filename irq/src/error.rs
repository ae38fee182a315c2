//! # IRQ Errors
//!
//! Errors reported by the registration-side API. The dispatch path itself
//! never fails: anything it cannot route goes to the unexpected-interrupt
//! handler.

use core::fmt;

/// Result type for IRQ table operations
pub type IrqResult<T = ()> = Result<T, IrqError>;

/// IRQ operation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrqError {
    /// IRQ number outside the configured interrupt space
    InvalidIrq,
    /// Slot index outside the vector table
    InvalidSlot,
    /// IRQ exists but has no slot in the compact vector table
    NotMapped,
    /// A dispatcher is already installed
    AlreadyInstalled,
    /// No dispatcher has been installed yet
    NotInstalled,
}

impl fmt::Display for IrqError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrqError::InvalidIrq => write!(f, "IRQ number out of range"),
            IrqError::InvalidSlot => write!(f, "vector slot out of range"),
            IrqError::NotMapped => write!(f, "IRQ not mapped to a vector slot"),
            IrqError::AlreadyInstalled => write!(f, "dispatcher already installed"),
            IrqError::NotInstalled => write!(f, "dispatcher not installed"),
        }
    }
}
