//! STM32F4 EXTI block and SYSCFG line multiplexer.

use core::ptr::{read_volatile, write_volatile};

use super::{modify, set_bits};
use crate::hal::exti::ExternalInterrupts;
use crate::hal::gpio::EdgeDetect;

pub const EXTI_BASE: usize = 0x4001_3C00;
pub const SYSCFG_BASE: usize = 0x4001_3800;

#[repr(C)]
struct Registers {
    imr: u32,
    emr: u32,
    rtsr: u32,
    ftsr: u32,
    swier: u32,
    pr: u32,
}

#[repr(C)]
struct SyscfgRegisters {
    memrmp: u32,
    pmc: u32,
    exticr: [u32; 4],
}

#[inline(always)]
fn regs() -> *mut Registers {
    EXTI_BASE as *mut Registers
}

#[inline(always)]
fn syscfg() -> *mut SyscfgRegisters {
    SYSCFG_BASE as *mut SyscfgRegisters
}

/// EXTICR register index, mask and shift of a line's source selector.
const fn exticr_field(line: u8) -> (usize, u32, u32) {
    let shift = (line % 4) as u32 * 4;
    ((line / 4) as usize, 0xF << shift, shift)
}

/// Register value with `bit` set or cleared.
const fn with_bit(value: u32, bit: u32, set: bool) -> u32 {
    if set { value | bit } else { value & !bit }
}

// ============================================================================
// HAL Implementation
// ============================================================================

/// STM32F4 external interrupt controller.
///
/// SYSCFG must be clocked before lines are routed.
#[derive(Debug)]
pub struct Stm32Exti;

impl Stm32Exti {
    /// # Safety
    ///
    /// Only one instance may exist.
    pub const unsafe fn new() -> Self {
        Self
    }
}

impl ExternalInterrupts for Stm32Exti {
    fn unmask(&mut self, line: u8) {
        unsafe { set_bits(&mut (*regs()).imr, 1 << line) }
    }

    fn set_edge(&mut self, line: u8, edge: EdgeDetect) {
        let bit = 1 << line;
        unsafe {
            let r = regs();
            let rtsr = read_volatile(&(*r).rtsr);
            write_volatile(&mut (*r).rtsr, with_bit(rtsr, bit, edge.rising()));
            let ftsr = read_volatile(&(*r).ftsr);
            write_volatile(&mut (*r).ftsr, with_bit(ftsr, bit, edge.falling()));
        }
    }

    fn route(&mut self, line: u8, source: u8) {
        let (index, mask, shift) = exticr_field(line);
        unsafe { modify(&mut (*syscfg()).exticr[index], mask, (source as u32) << shift) }
    }

    fn is_pending(&self, line: u8) -> bool {
        unsafe { read_volatile(&(*regs()).pr) & (1 << line) != 0 }
    }

    fn clear_pending(&mut self, line: u8) {
        // Write-one-to-clear; a read-modify-write would clear every pending line.
        unsafe { write_volatile(&mut (*regs()).pr, 1 << line) }
    }

    fn software_trigger(&mut self, line: u8) {
        unsafe { write_volatile(&mut (*regs()).swier, 1 << line) }
    }
}
