//! STM32F4 I2C master (I2C1 / I2C2), polled.

use bitflags::bitflags;
use core::ptr::{read_volatile, write_volatile};

use super::gpio::{self, OutputType, Stm32Gpio};
use super::rcc::{self, Apb1, Clocks};
use super::{modify, set_bits};
use crate::hal::gpio::{Pin, PinLevel, PullMode};
use crate::hal::i2c::{I2cBus, I2cError, I2cSpeed};

pub const I2C1_BASE: usize = 0x4000_5400;
pub const I2C2_BASE: usize = 0x4000_5800;

/// Alternate function carrying I2C1..3.
pub const AF_I2C: u8 = 4;

/// Status polls before a transfer is abandoned.
pub const SPIN_BUDGET: u32 = 100_000;

/// SCL pulses clocking a stuck slave out of a transfer.
const UNSTICK_PULSES: u32 = 10;
const UNSTICK_HALF_PERIOD: u32 = 1_000;

#[repr(C)]
struct Registers {
    cr1: u32,
    cr2: u32,
    oar1: u32,
    oar2: u32,
    dr: u32,
    sr1: u32,
    sr2: u32,
    ccr: u32,
    trise: u32,
    fltr: u32,
}

bitflags! {
    /// I2C_CR1.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Control1: u32 {
        const PE    = 1 << 0;
        const START = 1 << 8;
        const STOP  = 1 << 9;
        const ACK   = 1 << 10;
        const POS   = 1 << 11;
    }

    /// I2C_SR1.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Status1: u32 {
        const SB   = 1 << 0;
        const ADDR = 1 << 1;
        const BTF  = 1 << 2;
        const RXNE = 1 << 6;
        const TXE  = 1 << 7;
        const BERR = 1 << 8;
        const ARLO = 1 << 9;
        const AF   = 1 << 10;
    }
}

const SR2_BUSY: u32 = 1 << 1;
const CCR_FAST: u32 = 1 << 15;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Instance {
    I2c1,
    I2c2,
}

impl Instance {
    const fn base(self) -> usize {
        match self {
            Instance::I2c1 => I2C1_BASE,
            Instance::I2c2 => I2C2_BASE,
        }
    }

    const fn clock(self) -> Apb1 {
        match self {
            Instance::I2c1 => Apb1::I2C1,
            Instance::I2c2 => Apb1::I2C2,
        }
    }
}

/// CR2 FREQ, CCR and TRISE for a bus speed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Timing {
    pub freq_mhz: u32,
    pub ccr: u32,
    pub trise: u32,
}

impl Timing {
    pub const fn new(pclk1: u32, speed: I2cSpeed) -> Result<Self, I2cError> {
        let freq_mhz = pclk1 / 1_000_000;
        if freq_mhz < 2 || freq_mhz > 50 {
            return Err(I2cError::InvalidConfig);
        }

        Ok(match speed {
            I2cSpeed::Standard => {
                let ccr = pclk1 / (speed.hz() * 2);
                Timing {
                    freq_mhz,
                    ccr: if ccr < 4 { 4 } else { ccr },
                    trise: freq_mhz + 1,
                }
            }
            // Duty 2:1, 300 ns rise time.
            I2cSpeed::Fast => {
                let ccr = pclk1 / (speed.hz() * 3);
                Timing {
                    freq_mhz,
                    ccr: CCR_FAST | if ccr < 1 { 1 } else { ccr },
                    trise: freq_mhz * 300 / 1000 + 1,
                }
            }
        })
    }
}

/// Map an SR1 snapshot to an error flag, if any is raised.
fn check_errors(status: Status1) -> Result<(), I2cError> {
    if status.contains(Status1::AF) {
        Err(I2cError::Nack)
    } else if status.intersects(Status1::ARLO | Status1::BERR) {
        Err(I2cError::Bus)
    } else {
        Ok(())
    }
}

fn half_period() {
    for _ in 0..UNSTICK_HALF_PERIOD {
        core::hint::spin_loop();
    }
}

// ============================================================================
// HAL Implementation
// ============================================================================

pub struct Stm32I2c {
    instance: Instance,
}

impl Stm32I2c {
    /// Free the bus, hand the pins to the peripheral and program its timing.
    ///
    /// # Safety
    ///
    /// Only one instance per I2C block may exist.
    pub unsafe fn new(
        instance: Instance,
        scl: Pin,
        sda: Pin,
        speed: I2cSpeed,
        clocks: &Clocks,
        gpio: &mut Stm32Gpio,
    ) -> Result<Self, I2cError> {
        let timing = Timing::new(clocks.pclk1, speed)?;

        // Clock a slave stuck mid-byte until it releases SDA.
        gpio.set_open_drain_output(scl, PullMode::Up).map_err(|_| I2cError::InvalidConfig)?;
        gpio.set_open_drain_output(sda, PullMode::Up).map_err(|_| I2cError::InvalidConfig)?;
        gpio::write(sda, PinLevel::High);
        for _ in 0..UNSTICK_PULSES {
            gpio::write(scl, PinLevel::Low);
            half_period();
            gpio::write(scl, PinLevel::High);
            half_period();
        }

        for pin in [scl, sda] {
            gpio.set_alternate(pin, AF_I2C, OutputType::OpenDrain, PullMode::Up)
                .map_err(|_| I2cError::InvalidConfig)?;
        }

        rcc::enable_apb1(instance.clock());
        rcc::reset_apb1(instance.clock());

        let bus = Self { instance };
        unsafe {
            let r = bus.regs();
            write_volatile(&mut (*r).cr2, timing.freq_mhz);
            write_volatile(&mut (*r).ccr, timing.ccr);
            write_volatile(&mut (*r).trise, timing.trise);
            set_bits(&mut (*r).cr1, Control1::PE.bits());
        }

        log::debug!("{:?}: {} Hz, {:?}", instance, speed.hz(), timing);
        Ok(bus)
    }

    #[inline]
    fn regs(&self) -> *mut Registers {
        self.instance.base() as *mut Registers
    }

    fn status(&self) -> Status1 {
        Status1::from_bits_truncate(unsafe { read_volatile(&(*self.regs()).sr1) })
    }

    fn set(&mut self, bits: Control1) {
        unsafe { set_bits(&mut (*self.regs()).cr1, bits.bits()) }
    }

    fn clear(&mut self, bits: Control1) {
        unsafe { modify(&mut (*self.regs()).cr1, bits.bits(), 0) }
    }

    fn send(&mut self, byte: u8) {
        unsafe { write_volatile(&mut (*self.regs()).dr, byte as u32) }
    }

    fn receive(&mut self) -> u8 {
        unsafe { read_volatile(&(*self.regs()).dr) as u8 }
    }

    /// Reading SR1 then SR2 clears ADDR.
    fn clear_addr(&mut self) {
        unsafe {
            let r = self.regs();
            let _ = read_volatile(&(*r).sr1);
            let _ = read_volatile(&(*r).sr2);
        }
    }

    /// Poll SR1 until `flag` is set, an error flag is raised or the
    /// budget runs out. Errors release the bus.
    fn wait(&mut self, flag: Status1) -> Result<(), I2cError> {
        for _ in 0..SPIN_BUDGET {
            let status = self.status();
            if let Err(err) = check_errors(status) {
                let flags = Status1::AF | Status1::ARLO | Status1::BERR;
                unsafe { modify(&mut (*self.regs()).sr1, flags.bits(), 0) }
                self.set(Control1::STOP);
                return Err(err);
            }
            if status.contains(flag) {
                return Ok(());
            }
            core::hint::spin_loop();
        }

        self.set(Control1::STOP);
        log::warn!("{:?}: timeout waiting for {:?}", self.instance, flag);
        Err(I2cError::Timeout)
    }

    fn wait_idle(&mut self) -> Result<(), I2cError> {
        for _ in 0..SPIN_BUDGET {
            if unsafe { read_volatile(&(*self.regs()).sr2) } & SR2_BUSY == 0 {
                return Ok(());
            }
            core::hint::spin_loop();
        }
        Err(I2cError::Timeout)
    }

    /// START, then address the device in write or read direction.
    fn address(&mut self, address: u8, read: bool) -> Result<(), I2cError> {
        self.set(Control1::START);
        self.wait(Status1::SB)?;
        self.send((address << 1) | read as u8);
        self.wait(Status1::ADDR)
    }

    /// Address the device and send the register pointer.
    fn select(&mut self, address: u8, register: u8) -> Result<(), I2cError> {
        self.clear(Control1::POS);
        self.address(address, false)?;
        self.clear_addr();
        self.wait(Status1::TXE)?;
        self.send(register);
        self.wait(Status1::TXE)
    }
}

impl I2cBus for Stm32I2c {
    type Error = I2cError;

    fn write_register(&mut self, address: u8, register: u8, value: u8) -> Result<(), I2cError> {
        self.wait_idle()?;
        self.select(address, register)?;
        self.send(value);
        self.wait(Status1::BTF)?;
        self.set(Control1::STOP);
        Ok(())
    }

    fn read_registers(
        &mut self,
        address: u8,
        first_register: u8,
        buffer: &mut [u8],
    ) -> Result<(), I2cError> {
        if buffer.is_empty() {
            return Err(I2cError::InvalidConfig);
        }

        self.wait_idle()?;
        self.set(Control1::ACK);
        self.select(address, first_register)?;
        self.address(address, true)?;

        let len = buffer.len();
        match len {
            1 => {
                self.clear(Control1::ACK);
                self.clear_addr();
                self.set(Control1::STOP);
                self.wait(Status1::RXNE)?;
                buffer[0] = self.receive();
            }
            2 => {
                self.clear(Control1::ACK);
                self.set(Control1::POS);
                self.clear_addr();
                self.wait(Status1::BTF)?;
                self.set(Control1::STOP);
                buffer[0] = self.receive();
                buffer[1] = self.receive();
                self.clear(Control1::POS);
            }
            _ => {
                self.clear_addr();
                for byte in &mut buffer[..len - 3] {
                    self.wait(Status1::RXNE)?;
                    *byte = self.receive();
                }
                // Last three bytes: NACK the final one, STOP before reading it.
                self.wait(Status1::BTF)?;
                self.clear(Control1::ACK);
                buffer[len - 3] = self.receive();
                self.wait(Status1::BTF)?;
                self.set(Control1::STOP);
                buffer[len - 2] = self.receive();
                buffer[len - 1] = self.receive();
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_mode_timing_at_45mhz() {
        assert_eq!(
            Timing::new(45_000_000, I2cSpeed::Standard),
            Ok(Timing {
                freq_mhz: 45,
                ccr: 225,
                trise: 46,
            })
        );
    }

    #[test]
    fn fast_mode_timing_at_45mhz() {
        assert_eq!(
            Timing::new(45_000_000, I2cSpeed::Fast),
            Ok(Timing {
                freq_mhz: 45,
                ccr: CCR_FAST | 37,
                trise: 14,
            })
        );
    }

    #[test]
    fn bus_clock_out_of_range() {
        assert_eq!(Timing::new(1_000_000, I2cSpeed::Standard), Err(I2cError::InvalidConfig));
        assert_eq!(Timing::new(90_000_000, I2cSpeed::Fast), Err(I2cError::InvalidConfig));
    }

    #[test]
    fn error_flags() {
        assert_eq!(check_errors(Status1::SB | Status1::AF), Err(I2cError::Nack));
        assert_eq!(check_errors(Status1::ARLO), Err(I2cError::Bus));
        assert_eq!(check_errors(Status1::TXE | Status1::BTF), Ok(()));
    }
}
