//! Data-ready flag and the sample-and-stream step of the main loop.

use core::sync::atomic::{AtomicBool, Ordering};

use drivers::peripheral::motion::{ImuReading, MotionSensor};
use drivers::platform::stm32f4::i2c::Stm32I2c;
use drivers::telemetry::{Format, TxBuffer};

use crate::console;
use crate::error::AppError;

static DATA_READY: AtomicBool = AtomicBool::new(false);

fn data_ready() {
    DATA_READY.store(true, Ordering::Release);
}

/// Line handler for the sensor's INT pin.
pub static ON_DATA_READY: fn() = data_ready;

/// Consume the data-ready flag.
pub fn take_data_ready() -> bool {
    DATA_READY.swap(false, Ordering::Acquire)
}

pub struct Sensors {
    bus: Stm32I2c,
    motion: MotionSensor,
    tx: TxBuffer,
    format: Format,
}

impl Sensors {
    /// Bring up both chips. The magnetometer sits behind the IMU's bypass,
    /// so it is identified second.
    pub fn init(mut bus: Stm32I2c, format: Format) -> Result<Self, AppError> {
        let motion = MotionSensor::new();
        motion.init(&mut bus)?;
        log::info!("motion sensor ready, streaming {:?}", format);

        Ok(Self {
            bus,
            motion,
            tx: TxBuffer::new(),
            format,
        })
    }

    pub fn read(&mut self) -> Result<ImuReading, AppError> {
        Ok(self.motion.read(&mut self.bus)?)
    }

    /// Read one sample and send its acceleration to the console.
    pub fn stream(&mut self) -> Result<ImuReading, AppError> {
        let reading = self.read()?;
        self.tx.encode(self.format, &reading.accel)?;

        let tx = &self.tx;
        console::with(|port| tx.send(port)).transpose()?;
        Ok(reading)
    }
}
