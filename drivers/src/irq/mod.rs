//! External interrupt subsystem.
//!
//! - [`line`]: line numbering and port routing
//! - [`handlers`]: the per-line callback table
//! - [`dispatch`]: vector groups and the handler bodies
//! - [`exti`]: the controller that binds pins to lines and owns the table

pub mod dispatch;
pub mod exti;
pub mod handlers;
pub mod line;

pub use dispatch::{GroupPolicy, Vector};
pub use exti::ExtiController;
pub use handlers::{LineHandler, LineRegistry};
pub use line::{LINE_COUNT, Line};

use crate::hal::gpio::Port;

/// External interrupt configuration errors.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExtiError {
    /// Line number outside 0..=15.
    InvalidLine(u8),
    /// The line multiplexer cannot select this port.
    UnsupportedPort(Port),
    /// The pin could not be configured as an input.
    Gpio,
    /// The line's vector could not be enabled.
    InterruptController,
}
