//! Busy-wait delays on the core cycle counter.
//!
//! The counter is reset before every wait, so a wait never spans more than
//! one counter period. Requests reaching the end of that period are clamped
//! to [`SAFETY_MARGIN_US`] short of it and the clamped duration is returned.

use crate::hal::timer::{CycleCounter, Micros, Millis};

/// Distance kept from the counter wrap by a clamped wait, in microseconds.
pub const SAFETY_MARGIN_US: u32 = 100;

const CYCLES_WINDOW: u64 = 1 << 32;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DelayError {
    /// The core clock is below 1 MHz, so a microsecond is under one cycle.
    ClockTooSlow(u32),
}

pub struct CycleDelay<C> {
    counter: C,
    cycles_per_us: u32,
    max_us: u32,
}

impl<C: CycleCounter> CycleDelay<C> {
    /// Start `counter` and derive the delay window from the core clock.
    pub fn new(mut counter: C, core_clock_hz: u32) -> Result<Self, DelayError> {
        let cycles_per_us = core_clock_hz / 1_000_000;
        if cycles_per_us == 0 {
            return Err(DelayError::ClockTooSlow(core_clock_hz));
        }

        let max_us = (CYCLES_WINDOW / cycles_per_us as u64).min(u32::MAX as u64) as u32;
        counter.enable();
        log::debug!("cycle delay: {} cycles/us, window {} us", cycles_per_us, max_us);

        Ok(Self {
            counter,
            cycles_per_us,
            max_us,
        })
    }

    pub fn cycles_per_us(&self) -> u32 {
        self.cycles_per_us
    }

    /// Microseconds covered by one counter period.
    pub fn max_us(&self) -> u32 {
        self.max_us
    }

    /// What `delay_us` waits instead of a request of `max_us` or more.
    pub fn clamped(&self) -> Micros {
        Micros::new(self.max_us - SAFETY_MARGIN_US)
    }

    /// Spin for `us` microseconds and return the time actually waited.
    ///
    /// `max_us` itself is never reached when the clock divides `2^32`
    /// evenly, so it is clamped along with everything above it.
    pub fn delay_us(&mut self, us: Micros) -> Micros {
        let target = if *us >= self.max_us {
            let clamped = self.clamped();
            log::trace!("delay of {} us clamped to {} us", *us, *clamped);
            clamped
        } else {
            us
        };

        self.counter.reset();
        while self.counter.cycles() / self.cycles_per_us < *target {
            core::hint::spin_loop();
        }

        target
    }

    /// Spin for `ms` milliseconds, one millisecond at a time.
    pub fn delay_ms(&mut self, ms: Millis) -> Millis {
        for _ in 0..*ms {
            self.delay_us(Micros::new(1000));
        }
        ms
    }

    pub fn release(self) -> C {
        self.counter
    }
}
