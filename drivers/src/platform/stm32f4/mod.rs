//! STM32F429 Platform Implementation
//!
//! Register-level drivers for the parts of the F429 this firmware uses.

pub mod dwt;
pub mod exti;
pub mod gpio;
pub mod i2c;
pub mod nvic;
pub mod rcc;
pub mod usart;

use core::ptr::{read_volatile, write_volatile};

use super::Platform;
use rcc::{ClockConfig, ClockError, Clocks};

/// `old` with the bits under `mask` replaced by `value`.
const fn replace(old: u32, mask: u32, value: u32) -> u32 {
    (old & !mask) | (value & mask)
}

/// Volatile read-modify-write of the bits under `mask`.
#[inline]
pub(crate) fn modify(reg: &mut u32, mask: u32, value: u32) {
    unsafe {
        let old = read_volatile(reg);
        write_volatile(reg, replace(old, mask, value));
    }
}

#[inline]
pub(crate) fn set_bits(reg: &mut u32, bits: u32) {
    modify(reg, bits, bits);
}

pub struct Stm32f4Platform;

impl Platform for Stm32f4Platform {
    type Clocks = Clocks;
    type Error = ClockError;

    fn name() -> &'static str {
        "STM32F429 (Cortex-M4F)"
    }

    unsafe fn early_init() -> Result<Clocks, ClockError> {
        unsafe { rcc::init(&ClockConfig::MAX_180MHZ) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_touches_only_masked_bits() {
        assert_eq!(replace(0xFFFF_FFFF, 0b1100, 0b0100), 0xFFFF_FFF7);
        assert_eq!(replace(0, 0xF0, 0xFF), 0xF0);
    }

    #[test]
    fn modify_and_set_on_plain_memory() {
        let mut reg = 0b1010u32;
        modify(&mut reg, 0b0011, 0b0001);
        assert_eq!(reg, 0b1001);
        set_bits(&mut reg, 1 << 31);
        assert_eq!(reg, 0x8000_0009);
    }
}
