//! Peripheral Drivers
//!
//! This module contains drivers for off-chip devices reached through a
//! HAL bus trait, so they work on any platform that implements the bus.
//!
//! # Available Peripherals
//!
//! - [`mpu6050`]: InvenSense MPU6050 accelerometer + gyroscope
//! - [`hmc5883l`]: Honeywell HMC5883L magnetometer
//! - [`motion`]: both combined into one 9-axis reading

pub mod hmc5883l;
pub mod motion;
pub mod mpu6050;

use crate::hal::i2c::I2cBus;

/// Sensor driver errors.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SensorError {
    /// A bus transfer failed.
    Bus,
    /// The device at `address` answered with an unexpected identity.
    UnknownDevice { address: u8, id: u8 },
}

fn write<B: I2cBus + ?Sized>(bus: &mut B, address: u8, register: u8, value: u8) -> Result<(), SensorError> {
    bus.write_register(address, register, value).map_err(|err| {
        log::error!("i2c {:#04x}: write {:#04x} failed: {:?}", address, register, err);
        SensorError::Bus
    })
}

fn read<B: I2cBus + ?Sized>(bus: &mut B, address: u8, first: u8, buffer: &mut [u8]) -> Result<(), SensorError> {
    bus.read_registers(address, first, buffer).map_err(|err| {
        log::error!("i2c {:#04x}: read {:#04x} failed: {:?}", address, first, err);
        SensorError::Bus
    })
}

/// Big-endian signed 16-bit sample starting at `bytes[at]`.
fn be_i16(bytes: &[u8], at: usize) -> i16 {
    i16::from_be_bytes([bytes[at], bytes[at + 1]])
}
