//! External Interrupt Hardware Abstraction Layer.
//!
//! Register-level view of an external interrupt block: one pending flag,
//! one mask bit, two trigger-enable bits and one source multiplexer per
//! line. Line numbers passed to these methods have already been validated
//! by [`crate::irq::Line`], so the operations cannot fail.

use crate::hal::gpio::EdgeDetect;

/// External interrupt block (EXTI + its source multiplexer).
pub trait ExternalInterrupts {
    /// Unmask a line so a pending flag raises an interrupt request.
    fn unmask(&mut self, line: u8);

    /// Program the rising/falling trigger-enable bits of a line.
    fn set_edge(&mut self, line: u8, edge: EdgeDetect);

    /// Route a line to the pin with the same number on the port selected
    /// by `source`.
    fn route(&mut self, line: u8, source: u8);

    /// Whether the pending flag of a line is set.
    fn is_pending(&self, line: u8) -> bool;

    /// Clear the pending flag of a line.
    fn clear_pending(&mut self, line: u8);

    /// Set the pending flag of a line from software.
    fn software_trigger(&mut self, line: u8);
}
