//! Cortex-M4 nested vectored interrupt controller.

use cortex_m::interrupt::InterruptNumber;
use cortex_m::peripheral::NVIC;

use crate::hal::interrupt::{InterruptController, IrqNumber};

/// Device interrupts on the STM32F42x/43x.
pub const IRQ_COUNT: IrqNumber = 91;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NvicError {
    InvalidIrq(IrqNumber),
}

/// Position in the device vector table, checked against [`IRQ_COUNT`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DeviceIrq(u16);

impl DeviceIrq {
    pub const fn new(irq: IrqNumber) -> Result<Self, NvicError> {
        if irq < IRQ_COUNT {
            Ok(Self(irq as u16))
        } else {
            Err(NvicError::InvalidIrq(irq))
        }
    }
}

// SAFETY: `DeviceIrq::new` only admits positions of the device vector table.
unsafe impl InterruptNumber for DeviceIrq {
    fn number(self) -> u16 {
        self.0
    }
}

/// Owns the core NVIC so only one driver unmasks device interrupts.
pub struct Nvic {
    _nvic: NVIC,
}

impl Nvic {
    pub fn new(nvic: NVIC) -> Self {
        Self { _nvic: nvic }
    }
}

impl InterruptController for Nvic {
    type Error = NvicError;

    fn enable(&mut self, irq: IrqNumber) -> Result<(), NvicError> {
        let irq = DeviceIrq::new(irq)?;
        // SAFETY: the EXTI handlers only reach state behind an `IrqSpinLock`,
        // which is installed before any line is configured.
        unsafe { NVIC::unmask(irq) }
        Ok(())
    }
}
