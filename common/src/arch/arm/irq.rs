use core::sync::atomic::{Ordering, compiler_fence};

use cortex_m::interrupt;
use cortex_m::register::primask;

use crate::sync::irq::IrqControl;

pub struct CortexMIrq;

/// Interrupt control for ARMv7-M cores.
///
/// Masks configurable-priority exceptions through PRIMASK.
///
/// # State Management
/// The `State` type is `bool`: whether interrupts were enabled before
/// `disable()` ran.
impl IrqControl for CortexMIrq {
    type State = bool;

    #[inline(always)]
    fn disable() -> bool {
        let was_enabled = primask::read().is_active();
        interrupt::disable();
        // Keep protected accesses after the mask.
        compiler_fence(Ordering::SeqCst);
        was_enabled
    }

    #[inline(always)]
    fn restore(prev_enabled: bool) {
        compiler_fence(Ordering::SeqCst);
        if prev_enabled {
            // SAFETY: only re-enables what `disable` found enabled.
            unsafe { interrupt::enable() };
        }
    }
}
