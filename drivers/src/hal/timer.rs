//! Timer Hardware Abstraction Layer.
//!
//! Durations and the free-running cycle counter behind the busy-wait
//! delays in [`crate::delay`].

use core::ops::Deref;

/// Wraps a time, in microseconds.
#[derive(Default, Debug, Copy, Clone, Eq, Ord, PartialOrd, PartialEq)]
pub struct Micros(u32);

/// Wraps a time, in milliseconds.
#[derive(Default, Debug, Copy, Clone, Eq, Ord, PartialOrd, PartialEq)]
pub struct Millis(u32);

impl Micros {
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl Millis {
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    /// Number of `rhs` periods that fit in this duration.
    pub const fn div(&self, rhs: Millis) -> u32 {
        self.0 / rhs.0
    }
}

impl Deref for Micros {
    type Target = u32;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Deref for Millis {
    type Target = u32;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Free-running 32-bit cycle counter.
///
/// The counter increments once per core clock cycle and wraps at `2^32`.
pub trait CycleCounter {
    /// Start the counter.
    fn enable(&mut self);

    /// Reset the counter to zero.
    fn reset(&mut self);

    /// Current counter value.
    fn cycles(&self) -> u32;
}
