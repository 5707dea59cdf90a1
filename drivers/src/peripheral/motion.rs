//! Nine-axis motion sensing: MPU6050 plus an HMC5883L behind its bypass.

use super::SensorError;
use super::hmc5883l::Hmc5883l;
use super::mpu6050::Mpu6050;
use crate::hal::i2c::I2cBus;

/// One combined reading.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct ImuReading {
    /// Degrees per second.
    pub gyro: [f32; 3],
    /// g.
    pub accel: [f32; 3],
    /// Gauss.
    pub magn: [f32; 3],
    /// Degrees Celsius.
    pub temperature: f32,
}

impl ImuReading {
    /// Gyro, accelerometer then magnetometer axes, X Y Z each.
    pub fn values(&self) -> [f32; 9] {
        let mut out = [0.0; 9];
        out[..3].copy_from_slice(&self.gyro);
        out[3..6].copy_from_slice(&self.accel);
        out[6..].copy_from_slice(&self.magn);
        out
    }
}

#[derive(Default)]
pub struct MotionSensor {
    imu: Mpu6050,
    compass: Hmc5883l,
}

impl MotionSensor {
    pub const fn new() -> Self {
        Self {
            imu: Mpu6050::new(),
            compass: Hmc5883l::new(),
        }
    }

    /// Bring up the MPU6050 first; the compass is unreachable until its
    /// bypass is enabled.
    pub fn init<B: I2cBus + ?Sized>(&self, bus: &mut B) -> Result<(), SensorError> {
        self.imu.init(bus)?;
        self.compass.init(bus)
    }

    pub fn read<B: I2cBus + ?Sized>(&self, bus: &mut B) -> Result<ImuReading, SensorError> {
        let sample = self.imu.read(bus)?;
        let magn = self.compass.read(bus)?;
        Ok(ImuReading {
            gyro: sample.gyro,
            accel: sample.accel,
            magn,
            temperature: sample.temperature,
        })
    }
}
