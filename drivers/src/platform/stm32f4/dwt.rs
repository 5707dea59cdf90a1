//! Data watchpoint and trace unit cycle counter.

use cortex_m::peripheral::{DCB, DWT};

use crate::hal::timer::CycleCounter;

/// `CYCCNT`, counting core clock cycles.
pub struct Dwt {
    dcb: DCB,
    dwt: DWT,
}

impl Dwt {
    pub fn new(dcb: DCB, dwt: DWT) -> Self {
        Self { dcb, dwt }
    }
}

impl CycleCounter for Dwt {
    fn enable(&mut self) {
        self.dcb.enable_trace();
        self.dwt.set_cycle_count(0);
        self.dwt.enable_cycle_counter();
    }

    fn reset(&mut self) {
        self.dwt.set_cycle_count(0);
    }

    fn cycles(&self) -> u32 {
        DWT::cycle_count()
    }
}
