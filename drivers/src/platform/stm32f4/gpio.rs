//! STM32F4 GPIO Driver
//!
//! Nine ports of 16 pins, each port a 0x400-byte register block.

use core::ptr::{read_volatile, write_volatile};

use super::{modify, rcc};
use crate::hal::gpio::{GpioController, GpioError, Pin, PinLevel, Port, PullMode};

/// GPIOA base address; port `n` sits `n * PORT_STRIDE` above it.
pub const GPIO_BASE: usize = 0x4002_0000;
pub const PORT_STRIDE: usize = 0x400;

/// Highest alternate function number.
pub const MAX_AF: u8 = 15;

#[repr(C)]
struct Registers {
    moder: u32,
    otyper: u32,
    ospeedr: u32,
    pupdr: u32,
    idr: u32,
    odr: u32,
    bsrr: u32,
    lckr: u32,
    afr: [u32; 2],
}

#[inline(always)]
fn regs(port: Port) -> *mut Registers {
    (GPIO_BASE + port.index() as usize * PORT_STRIDE) as *mut Registers
}

/// MODER field values.
#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    Input = 0b00,
    Output = 0b01,
    Alternate = 0b10,
    Analog = 0b11,
}

#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OutputType {
    PushPull = 0,
    OpenDrain = 1,
}

/// OSPEEDR field values.
#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Speed {
    Low = 0b00,
    Medium = 0b01,
    Fast = 0b10,
    High = 0b11,
}

const fn pull_bits(pull: PullMode) -> u32 {
    match pull {
        PullMode::None => 0b00,
        PullMode::Up => 0b01,
        PullMode::Down => 0b10,
    }
}

/// Mask and shift of a `width`-bit per-pin field.
const fn field(number: u8, width: u32) -> (u32, u32) {
    let shift = number as u32 * width;
    (((1 << width) - 1) << shift, shift)
}

/// AFR index, mask and shift of a pin's alternate function field.
const fn af_field(number: u8) -> (usize, u32, u32) {
    let (mask, shift) = field(number % 8, 4);
    ((number / 8) as usize, mask, shift)
}

/// BSRR word driving a pin to `level`.
const fn bsrr_word(pin: Pin, level: PinLevel) -> u32 {
    match level {
        PinLevel::High => pin.mask(),
        PinLevel::Low => pin.mask() << 16,
    }
}

// ============================================================================
// Raw Hardware Functions
// ============================================================================

pub fn set_mode(pin: Pin, mode: Mode) {
    let (mask, shift) = field(pin.number(), 2);
    unsafe { modify(&mut (*regs(pin.port())).moder, mask, (mode as u32) << shift) }
}

pub fn set_output_type(pin: Pin, output: OutputType) {
    let (mask, shift) = field(pin.number(), 1);
    unsafe { modify(&mut (*regs(pin.port())).otyper, mask, (output as u32) << shift) }
}

pub fn set_speed(pin: Pin, speed: Speed) {
    let (mask, shift) = field(pin.number(), 2);
    unsafe { modify(&mut (*regs(pin.port())).ospeedr, mask, (speed as u32) << shift) }
}

pub fn set_pull(pin: Pin, pull: PullMode) {
    let (mask, shift) = field(pin.number(), 2);
    unsafe { modify(&mut (*regs(pin.port())).pupdr, mask, pull_bits(pull) << shift) }
}

pub fn set_alternate_function(pin: Pin, af: u8) -> Result<(), GpioError> {
    if af > MAX_AF {
        return Err(GpioError::InvalidFunction);
    }
    let (index, mask, shift) = af_field(pin.number());
    unsafe { modify(&mut (*regs(pin.port())).afr[index], mask, (af as u32) << shift) }
    Ok(())
}

pub fn write(pin: Pin, level: PinLevel) {
    unsafe { write_volatile(&mut (*regs(pin.port())).bsrr, bsrr_word(pin, level)) }
}

pub fn level(pin: Pin) -> PinLevel {
    let idr = unsafe { read_volatile(&(*regs(pin.port())).idr) };
    PinLevel::from(idr & pin.mask() != 0)
}

pub fn output_level(pin: Pin) -> PinLevel {
    let odr = unsafe { read_volatile(&(*regs(pin.port())).odr) };
    PinLevel::from(odr & pin.mask() != 0)
}

// ============================================================================
// HAL Implementation
// ============================================================================

/// STM32F4 GPIO controller covering every port.
#[derive(Debug)]
pub struct Stm32Gpio;

impl Stm32Gpio {
    /// # Safety
    ///
    /// Only one instance should drive a given pin.
    pub const unsafe fn new() -> Self {
        Self
    }

    /// Route a pin to an on-chip peripheral.
    pub fn set_alternate(
        &mut self,
        pin: Pin,
        af: u8,
        output: OutputType,
        pull: PullMode,
    ) -> Result<(), GpioError> {
        rcc::enable_gpio(pin.port());
        set_alternate_function(pin, af)?;
        set_output_type(pin, output);
        set_speed(pin, Speed::Fast);
        set_pull(pin, pull);
        set_mode(pin, Mode::Alternate);
        Ok(())
    }

    /// Configure an open-drain output, used to bit-bang a stuck bus.
    pub fn set_open_drain_output(&mut self, pin: Pin, pull: PullMode) -> Result<(), GpioError> {
        rcc::enable_gpio(pin.port());
        set_output_type(pin, OutputType::OpenDrain);
        set_speed(pin, Speed::Fast);
        set_pull(pin, pull);
        set_mode(pin, Mode::Output);
        Ok(())
    }
}

impl GpioController for Stm32Gpio {
    type Pin = Pin;
    type Error = GpioError;

    fn set_input(&mut self, pin: Pin, pull: PullMode) -> Result<(), GpioError> {
        rcc::enable_gpio(pin.port());
        set_mode(pin, Mode::Input);
        set_pull(pin, pull);
        set_alternate_function(pin, 0)
    }

    fn set_output(&mut self, pin: Pin) -> Result<(), GpioError> {
        rcc::enable_gpio(pin.port());
        set_output_type(pin, OutputType::PushPull);
        set_speed(pin, Speed::Fast);
        set_pull(pin, PullMode::None);
        set_alternate_function(pin, 0)?;
        set_mode(pin, Mode::Output);
        Ok(())
    }

    fn set_pull(&mut self, pin: Pin, pull: PullMode) -> Result<(), GpioError> {
        set_pull(pin, pull);
        Ok(())
    }

    fn set_high(&mut self, pin: Pin) -> Result<(), GpioError> {
        write(pin, PinLevel::High);
        Ok(())
    }

    fn set_low(&mut self, pin: Pin) -> Result<(), GpioError> {
        write(pin, PinLevel::Low);
        Ok(())
    }

    fn read(&self, pin: Pin) -> Result<PinLevel, GpioError> {
        Ok(level(pin))
    }

    fn toggle(&mut self, pin: Pin) -> Result<(), GpioError> {
        let next = match output_level(pin) {
            PinLevel::High => PinLevel::Low,
            PinLevel::Low => PinLevel::High,
        };
        write(pin, next);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pin(port: Port, number: u8) -> Pin {
        Pin::new(port, number).unwrap()
    }

    #[test]
    fn port_blocks() {
        assert_eq!(regs(Port::A) as usize, 0x4002_0000);
        assert_eq!(regs(Port::D) as usize, 0x4002_0C00);
        assert_eq!(regs(Port::F) as usize, 0x4002_1400);
    }

    #[test]
    fn two_bit_fields() {
        assert_eq!(field(0, 2), (0b11, 0));
        assert_eq!(field(7, 2), (0b11 << 14, 14));
        assert_eq!(field(15, 2), (0b11 << 30, 30));
    }

    #[test]
    fn alternate_function_fields() {
        assert_eq!(af_field(6), (0, 0xF << 24, 24));
        assert_eq!(af_field(8), (1, 0xF, 0));
        assert_eq!(af_field(9), (1, 0xF << 4, 4));
    }

    #[test]
    fn bsrr_set_and_reset_halves() {
        assert_eq!(bsrr_word(pin(Port::B, 7), PinLevel::High), 1 << 7);
        assert_eq!(bsrr_word(pin(Port::B, 7), PinLevel::Low), 1 << 23);
    }

    #[test]
    fn out_of_range_alternate_function() {
        assert_eq!(set_alternate_function(pin(Port::A, 0), 16), Err(GpioError::InvalidFunction));
    }
}
