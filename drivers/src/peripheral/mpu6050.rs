//! InvenSense MPU6050 accelerometer + gyroscope.
//!
//! Configured for ±2 g and ±250 °/s with the auxiliary I2C bus in bypass
//! mode, so a magnetometer hanging off it shows up on the main bus. The
//! INT pin pulses high whenever a new sample is ready.

use super::{SensorError, be_i16, read, write};
use crate::hal::i2c::I2cBus;

pub const ADDRESS: u8 = 0x68;

const SMPLRT_DIV: u8 = 0x19;
const CONFIG: u8 = 0x1A;
const GYRO_CONFIG: u8 = 0x1B;
const ACCEL_CONFIG: u8 = 0x1C;
const INT_PIN_CFG: u8 = 0x37;
const INT_ENABLE: u8 = 0x38;
const ACCEL_XOUT_H: u8 = 0x3B;
const PWR_MGMT_1: u8 = 0x6B;
const WHO_AM_I: u8 = 0x75;

const IDENTITY: u8 = 0x68;

// PLL on the X gyro, sleep off.
const CLKSEL_GYRO_X: u8 = 0x01;
// 1 kHz / (1 + 9) = 100 Hz.
const SAMPLE_DIVIDER: u8 = 9;
// 44 Hz accel / 42 Hz gyro bandwidth.
const DLPF_44HZ: u8 = 0x03;
const GYRO_250DPS: u8 = 0x00;
const ACCEL_2G: u8 = 0x00;
const I2C_BYPASS_EN: u8 = 0x02;
const DATA_RDY_EN: u8 = 0x01;

const ACCEL_LSB_PER_G: f32 = 16384.0;
const GYRO_LSB_PER_DPS: f32 = 131.0;
const TEMP_LSB_PER_C: f32 = 340.0;
const TEMP_OFFSET_C: f32 = 36.53;

/// Length of one accel + temperature + gyro burst.
pub const SAMPLE_LEN: usize = 14;

/// One converted sample.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct MpuSample {
    /// X, Y, Z in g.
    pub accel: [f32; 3],
    /// Degrees Celsius.
    pub temperature: f32,
    /// X, Y, Z in degrees per second.
    pub gyro: [f32; 3],
}

impl MpuSample {
    pub fn from_raw(raw: &[u8; SAMPLE_LEN]) -> Self {
        let axis = |at: usize, scale: f32| be_i16(raw, at) as f32 / scale;
        Self {
            accel: [
                axis(0, ACCEL_LSB_PER_G),
                axis(2, ACCEL_LSB_PER_G),
                axis(4, ACCEL_LSB_PER_G),
            ],
            temperature: be_i16(raw, 6) as f32 / TEMP_LSB_PER_C + TEMP_OFFSET_C,
            gyro: [
                axis(8, GYRO_LSB_PER_DPS),
                axis(10, GYRO_LSB_PER_DPS),
                axis(12, GYRO_LSB_PER_DPS),
            ],
        }
    }
}

pub struct Mpu6050 {
    address: u8,
}

impl Mpu6050 {
    pub const fn new() -> Self {
        Self { address: ADDRESS }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Check the identity register and apply the configuration.
    pub fn init<B: I2cBus + ?Sized>(&self, bus: &mut B) -> Result<(), SensorError> {
        let mut id = [0u8; 1];
        read(bus, self.address, WHO_AM_I, &mut id)?;
        if id[0] != IDENTITY {
            return Err(SensorError::UnknownDevice {
                address: self.address,
                id: id[0],
            });
        }

        for (register, value) in [
            (PWR_MGMT_1, CLKSEL_GYRO_X),
            (SMPLRT_DIV, SAMPLE_DIVIDER),
            (CONFIG, DLPF_44HZ),
            (GYRO_CONFIG, GYRO_250DPS),
            (ACCEL_CONFIG, ACCEL_2G),
            (INT_PIN_CFG, I2C_BYPASS_EN),
            (INT_ENABLE, DATA_RDY_EN),
        ] {
            write(bus, self.address, register, value)?;
        }

        log::info!("MPU6050 at {:#04x} ready", self.address);
        Ok(())
    }

    /// Burst-read and convert the latest sample.
    pub fn read<B: I2cBus + ?Sized>(&self, bus: &mut B) -> Result<MpuSample, SensorError> {
        let mut raw = [0u8; SAMPLE_LEN];
        read(bus, self.address, ACCEL_XOUT_H, &mut raw)?;
        Ok(MpuSample::from_raw(&raw))
    }
}

impl Default for Mpu6050 {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockI2c;

    fn bus_with_mpu() -> MockI2c {
        let mut bus = MockI2c::default();
        bus.set(ADDRESS, WHO_AM_I, IDENTITY);
        bus
    }

    #[test]
    fn init_configures_device() {
        let mut bus = bus_with_mpu();
        Mpu6050::new().init(&mut bus).unwrap();

        assert_eq!(bus.writes()[0], (ADDRESS, PWR_MGMT_1, 0x01));
        assert!(bus.writes().contains(&(ADDRESS, INT_PIN_CFG, 0x02)));
        assert!(bus.writes().contains(&(ADDRESS, INT_ENABLE, 0x01)));
        assert!(bus.writes().contains(&(ADDRESS, GYRO_CONFIG, 0x00)));
        assert_eq!(bus.writes().len(), 7);
    }

    #[test]
    fn init_rejects_wrong_identity() {
        let mut bus = MockI2c::default();
        bus.set(ADDRESS, WHO_AM_I, 0x70);

        assert_eq!(
            Mpu6050::new().init(&mut bus),
            Err(SensorError::UnknownDevice { address: ADDRESS, id: 0x70 })
        );
        assert!(bus.writes().is_empty());
    }

    #[test]
    fn missing_device_is_a_bus_error() {
        let mut bus = MockI2c::default();
        assert_eq!(Mpu6050::new().init(&mut bus), Err(SensorError::Bus));
    }

    #[test]
    fn sample_conversion() {
        let mut bus = bus_with_mpu();
        bus.set_block(
            ADDRESS,
            ACCEL_XOUT_H,
            &[
                0x40, 0x00, // +1 g
                0xC0, 0x00, // -1 g
                0x20, 0x00, // +0.5 g
                0x00, 0x00, // 36.53 C
                0x00, 0x83, // +1 dps
                0xFF, 0x7D, // -1 dps
                0x41, 0x80, // +128 dps
            ],
        );

        let sample = Mpu6050::new().read(&mut bus).unwrap();
        assert_eq!(sample.accel, [1.0, -1.0, 0.5]);
        assert!((sample.temperature - 36.53).abs() < 1e-4);
        assert_eq!(sample.gyro, [1.0, -1.0, 128.0]);
    }
}
