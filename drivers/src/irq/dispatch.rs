//! External interrupt dispatch.
//!
//! Lines 0–4 each own a vector. Lines 5–9 and 10–15 share one vector per
//! group, and the controller does not say which line of a group fired, so
//! the group handlers test every pending flag themselves.

use core::ops::RangeInclusive;

use super::handlers::LineRegistry;
use super::line::Line;
use crate::hal::exti::ExternalInterrupts;
use crate::hal::interrupt::IrqNumber;

// STM32F42x/43x vector table positions.
pub const IRQ_EXTI0: IrqNumber = 6;
pub const IRQ_EXTI1: IrqNumber = 7;
pub const IRQ_EXTI2: IrqNumber = 8;
pub const IRQ_EXTI3: IrqNumber = 9;
pub const IRQ_EXTI4: IrqNumber = 10;
pub const IRQ_EXTI9_5: IrqNumber = 23;
pub const IRQ_EXTI15_10: IrqNumber = 40;

/// Hardware entry point servicing one or more lines.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Vector {
    Exti0,
    Exti1,
    Exti2,
    Exti3,
    Exti4,
    /// Lines 5..=9.
    Exti9_5,
    /// Lines 10..=15.
    Exti15_10,
}

impl Vector {
    pub const ALL: [Vector; 7] = [
        Vector::Exti0,
        Vector::Exti1,
        Vector::Exti2,
        Vector::Exti3,
        Vector::Exti4,
        Vector::Exti9_5,
        Vector::Exti15_10,
    ];

    pub const fn for_line(line: Line) -> Self {
        match line.number() {
            0 => Vector::Exti0,
            1 => Vector::Exti1,
            2 => Vector::Exti2,
            3 => Vector::Exti3,
            4 => Vector::Exti4,
            5..=9 => Vector::Exti9_5,
            _ => Vector::Exti15_10,
        }
    }

    /// Line numbers owned by this vector, ascending.
    pub const fn lines(self) -> RangeInclusive<u8> {
        match self {
            Vector::Exti0 => 0..=0,
            Vector::Exti1 => 1..=1,
            Vector::Exti2 => 2..=2,
            Vector::Exti3 => 3..=3,
            Vector::Exti4 => 4..=4,
            Vector::Exti9_5 => 5..=9,
            Vector::Exti15_10 => 10..=15,
        }
    }

    /// Whether several lines share this vector.
    pub const fn is_shared(self) -> bool {
        matches!(self, Vector::Exti9_5 | Vector::Exti15_10)
    }

    /// Position in the NVIC.
    pub const fn irq_number(self) -> IrqNumber {
        match self {
            Vector::Exti0 => IRQ_EXTI0,
            Vector::Exti1 => IRQ_EXTI1,
            Vector::Exti2 => IRQ_EXTI2,
            Vector::Exti3 => IRQ_EXTI3,
            Vector::Exti4 => IRQ_EXTI4,
            Vector::Exti9_5 => IRQ_EXTI9_5,
            Vector::Exti15_10 => IRQ_EXTI15_10,
        }
    }
}

/// How a shared vector services its group.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum GroupPolicy {
    /// Service the lowest pending line, then return.
    ///
    /// Other pending lines keep their flag set, so the vector re-enters
    /// immediately. A lower line that pends continuously starves the
    /// higher lines of its group.
    #[default]
    FirstPending,
    /// Service every pending line of the group in ascending order.
    AllPending,
}

/// Body of a vector's interrupt handler.
///
/// Each line is tested independently; a line is serviced only if its flag
/// was observed pending, and its flag is cleared before its handler runs.
/// Returns the number of lines serviced.
pub fn service<E: ExternalInterrupts>(
    lines: &mut E,
    registry: &LineRegistry<'_>,
    vector: Vector,
    policy: GroupPolicy,
) -> usize {
    let mut serviced = 0;

    for number in vector.lines() {
        let line = Line(number);
        if !lines.is_pending(number) {
            continue;
        }

        lines.clear_pending(number);
        registry.dispatch(line);
        serviced += 1;

        if policy == GroupPolicy::FirstPending {
            break;
        }
    }

    if serviced == 0 {
        log::trace!("spurious entry on {:?}", vector);
    }

    serviced
}
