//! STM32F4 USART transmitter.
//!
//! The TX pin picks the USART; receive is not wired.

use bitflags::bitflags;
use core::ptr::{read_volatile, write_volatile};

use super::gpio::{OutputType, Stm32Gpio};
use super::rcc::{self, Apb1, Apb2, Clocks};
use crate::hal::gpio::{Pin, Port, PullMode};
use crate::hal::serial::{DataBits, Parity, SerialConfig, SerialError, SerialPort, StopBits};

pub const USART1_BASE: usize = 0x4001_1000;
pub const USART2_BASE: usize = 0x4000_4400;
pub const USART3_BASE: usize = 0x4000_4800;

/// Alternate function carrying USART1..3.
pub const AF_USART: u8 = 7;

/// TX is driven push-pull with no internal pull resistor.
pub const TX_OUTPUT: OutputType = OutputType::PushPull;
pub const TX_PULL: PullMode = PullMode::None;

#[repr(C)]
struct Registers {
    sr: u32,
    dr: u32,
    brr: u32,
    cr1: u32,
    cr2: u32,
    cr3: u32,
    gtpr: u32,
}

bitflags! {
    /// USART_SR.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Status: u32 {
        const PE   = 1 << 0;
        const FE   = 1 << 1;
        const NF   = 1 << 2;
        const ORE  = 1 << 3;
        const TC   = 1 << 6;
        const TXE  = 1 << 7;
    }

    /// USART_CR1.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Control1: u32 {
        const TE = 1 << 3;
        const PS = 1 << 9;
        const PCE = 1 << 10;
        const M  = 1 << 12;
        const UE = 1 << 13;
    }
}

const CR2_STOP_TWO: u32 = 0b10 << 12;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Instance {
    Usart1,
    Usart2,
    Usart3,
}

impl Instance {
    /// USART whose TX signal `pin` can carry.
    pub const fn for_tx(pin: Pin) -> Result<Self, SerialError> {
        match (pin.port(), pin.number()) {
            (Port::A, 9) | (Port::B, 6) => Ok(Instance::Usart1),
            (Port::A, 2) => Ok(Instance::Usart2),
            (Port::D, 8) => Ok(Instance::Usart3),
            _ => Err(SerialError::UnsupportedPin),
        }
    }

    pub const fn base(self) -> usize {
        match self {
            Instance::Usart1 => USART1_BASE,
            Instance::Usart2 => USART2_BASE,
            Instance::Usart3 => USART3_BASE,
        }
    }

    /// Clock of the bus the USART sits on.
    pub const fn pclk(self, clocks: &Clocks) -> u32 {
        match self {
            Instance::Usart1 => clocks.pclk2,
            Instance::Usart2 | Instance::Usart3 => clocks.pclk1,
        }
    }

    fn enable_clock(self) {
        match self {
            Instance::Usart1 => rcc::enable_apb2(Apb2::USART1),
            Instance::Usart2 => rcc::enable_apb1(Apb1::USART2),
            Instance::Usart3 => rcc::enable_apb1(Apb1::USART3),
        }
    }
}

/// BRR for 16x oversampling: the mantissa/fraction split is `pclk / baud`.
pub const fn brr(pclk: u32, baud: u32) -> Result<u32, SerialError> {
    if baud == 0 {
        return Err(SerialError::InvalidConfig);
    }
    let divider = (pclk + baud / 2) / baud;
    if divider < 16 || divider > 0xFFFF {
        return Err(SerialError::InvalidConfig);
    }
    Ok(divider)
}

/// CR1 and CR2 frame-format bits.
fn frame_bits(config: &SerialConfig) -> Result<(Control1, u32), SerialError> {
    let parity = match config.parity {
        Parity::None => Control1::empty(),
        Parity::Even => Control1::PCE,
        Parity::Odd => Control1::PCE | Control1::PS,
    };
    // The parity bit takes the place of the top data bit.
    let word = match (config.data_bits, config.parity) {
        (DataBits::Eight, Parity::None) => Control1::empty(),
        (DataBits::Eight, _) | (DataBits::Nine, Parity::None) => Control1::M,
        (DataBits::Nine, _) => return Err(SerialError::InvalidConfig),
    };
    let stop = match config.stop_bits {
        StopBits::One => 0,
        StopBits::Two => CR2_STOP_TWO,
    };
    Ok((parity | word, stop))
}

// ============================================================================
// HAL Implementation
// ============================================================================

pub struct Stm32Usart {
    instance: Instance,
    pclk: u32,
}

impl Stm32Usart {
    /// Claim the USART behind `tx` and switch the pin to it.
    ///
    /// # Safety
    ///
    /// Only one instance per USART may exist.
    pub unsafe fn new(tx: Pin, clocks: &Clocks, gpio: &mut Stm32Gpio) -> Result<Self, SerialError> {
        let instance = Instance::for_tx(tx)?;
        gpio.set_alternate(tx, AF_USART, TX_OUTPUT, TX_PULL)
            .map_err(|_| SerialError::UnsupportedPin)?;
        instance.enable_clock();

        Ok(Self {
            instance,
            pclk: instance.pclk(clocks),
        })
    }

    pub fn instance(&self) -> Instance {
        self.instance
    }

    #[inline]
    fn regs(&self) -> *mut Registers {
        self.instance.base() as *mut Registers
    }

    fn status(&self) -> Status {
        Status::from_bits_truncate(unsafe { read_volatile(&(*self.regs()).sr) })
    }
}

impl SerialPort for Stm32Usart {
    type Error = SerialError;

    fn configure(&mut self, config: SerialConfig) -> Result<(), SerialError> {
        let divider = brr(self.pclk, config.baud_rate)?;
        let (format, stop) = frame_bits(&config)?;

        unsafe {
            let r = self.regs();
            write_volatile(&mut (*r).cr1, 0);
            write_volatile(&mut (*r).cr2, stop);
            write_volatile(&mut (*r).cr3, 0);
            write_volatile(&mut (*r).brr, divider);
            write_volatile(&mut (*r).cr1, (format | Control1::UE | Control1::TE).bits());
        }

        log::debug!("{:?}: {} baud, BRR {:#06x}", self.instance, config.baud_rate, divider);
        Ok(())
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), SerialError> {
        while !self.status().contains(Status::TXE) {
            core::hint::spin_loop();
        }
        unsafe { write_volatile(&mut (*self.regs()).dr, byte as u32) }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SerialError> {
        while self.is_busy() {
            core::hint::spin_loop();
        }
        Ok(())
    }

    fn is_busy(&self) -> bool {
        !self.status().contains(Status::TC)
    }
}
