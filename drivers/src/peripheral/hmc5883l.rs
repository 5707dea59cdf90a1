//! Honeywell HMC5883L three-axis magnetometer.

use super::{SensorError, be_i16, read, write};
use crate::hal::i2c::I2cBus;

pub const ADDRESS: u8 = 0x1E;

const CONFIG_A: u8 = 0x00;
const CONFIG_B: u8 = 0x01;
const MODE: u8 = 0x02;
const DATA_X_MSB: u8 = 0x03;
const IDENT_A: u8 = 0x0A;

const IDENTITY: [u8; 3] = *b"H43";

// 8-sample average, 75 Hz output, normal measurement.
const AVERAGE_8_75HZ: u8 = 0x78;
// ±1.3 Ga.
const GAIN_1_3GA: u8 = 0x20;
const CONTINUOUS: u8 = 0x00;

const LSB_PER_GAUSS: f32 = 1090.0;

/// Raw value the device reports for an axis that overflowed.
pub const OVERFLOW: i16 = -4096;

pub struct Hmc5883l {
    address: u8,
}

impl Hmc5883l {
    pub const fn new() -> Self {
        Self { address: ADDRESS }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Check the identification registers and start continuous measurement.
    pub fn init<B: I2cBus + ?Sized>(&self, bus: &mut B) -> Result<(), SensorError> {
        let mut id = [0u8; 3];
        read(bus, self.address, IDENT_A, &mut id)?;
        if id != IDENTITY {
            return Err(SensorError::UnknownDevice {
                address: self.address,
                id: id[0],
            });
        }

        write(bus, self.address, CONFIG_A, AVERAGE_8_75HZ)?;
        write(bus, self.address, CONFIG_B, GAIN_1_3GA)?;
        write(bus, self.address, MODE, CONTINUOUS)?;

        log::info!("HMC5883L at {:#04x} ready", self.address);
        Ok(())
    }

    /// Field strength on X, Y, Z in gauss.
    ///
    /// The device sends the axes as X, Z, Y.
    pub fn read<B: I2cBus + ?Sized>(&self, bus: &mut B) -> Result<[f32; 3], SensorError> {
        let mut raw = [0u8; 6];
        read(bus, self.address, DATA_X_MSB, &mut raw)?;

        let (x, z, y) = (be_i16(&raw, 0), be_i16(&raw, 2), be_i16(&raw, 4));
        if [x, y, z].contains(&OVERFLOW) {
            log::warn!("HMC5883L: axis overflow");
        }

        Ok([x, y, z].map(|axis| axis as f32 / LSB_PER_GAUSS))
    }
}

impl Default for Hmc5883l {
    fn default() -> Self {
        Self::new()
    }
}
