//! I2C Hardware Abstraction Layer.
//!
//! Register-oriented master transfers, the only shape the sensor drivers
//! need.

/// Bus speed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum I2cSpeed {
    /// 100 kHz.
    Standard,
    /// 400 kHz.
    Fast,
}

impl I2cSpeed {
    pub const fn hz(self) -> u32 {
        match self {
            I2cSpeed::Standard => 100_000,
            I2cSpeed::Fast => 400_000,
        }
    }
}

/// I2C errors.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum I2cError {
    /// A status flag never appeared within the spin budget.
    Timeout,
    /// The addressed device did not acknowledge.
    Nack,
    /// Arbitration lost or misplaced START/STOP.
    Bus,
    /// Zero-length transfer or bad timing parameters.
    InvalidConfig,
}

/// I2C master trait.
pub trait I2cBus {
    /// Error type for bus operations.
    type Error: core::fmt::Debug;

    /// Write one register of the device at 7-bit `address`.
    fn write_register(&mut self, address: u8, register: u8, value: u8) -> Result<(), Self::Error>;

    /// Read `buffer.len()` consecutive registers starting at `first_register`.
    fn read_registers(
        &mut self,
        address: u8,
        first_register: u8,
        buffer: &mut [u8],
    ) -> Result<(), Self::Error>;

    /// Read a single register.
    fn read_register(&mut self, address: u8, register: u8) -> Result<u8, Self::Error> {
        let mut value = [0u8; 1];
        self.read_registers(address, register, &mut value)?;
        Ok(value[0])
    }
}
