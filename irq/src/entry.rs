//! # Trap Entry Point
//!
//! Architecture trap code calls [`irq_dispatch`] with the raw IRQ number and
//! the saved register context. The kernel installs its dispatcher once during
//! early boot; interrupts taken before that are logged and dropped.

use core::ffi::c_void;

use spin::Once;

use crate::config::DispatchFeatures;
use crate::dispatch::Dispatch;
use crate::error::{IrqError, IrqResult};
use crate::Irq;

/// Install-once slot holding the dispatcher trap entry forwards to
pub struct EntryPoint {
    dispatcher: Once<&'static dyn Dispatch>,
}

impl EntryPoint {
    /// Empty entry point
    pub const fn new() -> Self {
        Self {
            dispatcher: Once::new(),
        }
    }

    /// Install `dispatcher`; only the first call succeeds
    pub fn install(&self, dispatcher: &'static dyn Dispatch) -> IrqResult {
        let mut installed = false;
        self.dispatcher.call_once(|| {
            installed = true;
            dispatcher
        });

        if !installed {
            return Err(IrqError::AlreadyInstalled);
        }

        log::info!(
            "IRQ: dispatcher installed (features: {:?})",
            DispatchFeatures::compiled()
        );
        Ok(())
    }

    /// Whether a dispatcher has been installed
    pub fn is_installed(&self) -> bool {
        self.dispatcher.is_completed()
    }

    /// The installed dispatcher
    pub fn dispatcher(&self) -> IrqResult<&'static dyn Dispatch> {
        self.dispatcher.get().copied().ok_or(IrqError::NotInstalled)
    }

    /// Forward one interrupt to the installed dispatcher
    #[inline]
    pub fn dispatch(&self, irq: Irq, context: *mut c_void) {
        match self.dispatcher.get() {
            Some(dispatcher) => dispatcher.dispatch(irq, context),
            None => log::warn!("IRQ: IRQ {} before dispatcher install, dropped", irq),
        }
    }
}

impl Default for EntryPoint {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for EntryPoint {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EntryPoint")
            .field("installed", &self.is_installed())
            .finish()
    }
}

static ENTRY: EntryPoint = EntryPoint::new();

/// Install the kernel's dispatcher behind [`irq_dispatch`]
pub fn install(dispatcher: &'static dyn Dispatch) -> IrqResult {
    ENTRY.install(dispatcher)
}

/// Whether [`install`] has run
pub fn is_installed() -> bool {
    ENTRY.is_installed()
}

/// Trap entry
///
/// `context` is the saved register state, passed through to the handler
/// untouched.
#[no_mangle]
pub extern "C" fn irq_dispatch(irq: u32, context: *mut c_void) {
    ENTRY.dispatch(irq, context);
}
