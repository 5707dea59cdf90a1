use drivers::delay::DelayError;
use drivers::hal::gpio::GpioError;
use drivers::hal::i2c::I2cError;
use drivers::hal::serial::SerialError;
use drivers::irq::ExtiError;
use drivers::peripheral::SensorError;
use drivers::platform::stm32f4::rcc::ClockError;
use drivers::telemetry::TelemetryError;

/// Anything that stops the firmware from booting or drops a sample.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AppError {
    Clock(ClockError),
    Serial(SerialError),
    Gpio(GpioError),
    Delay(DelayError),
    I2c(I2cError),
    Sensor(SensorError),
    Exti(ExtiError),
    /// The EXTI controller was used before [`crate::vectors::install`].
    ExtiNotInstalled,
    /// `cortex_m::Peripherals` were already taken.
    CorePeripheralsTaken,
    Telemetry(TelemetryError),
}

macro_rules! from_error {
    ($($source:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$source> for AppError {
                fn from(err: $source) -> Self {
                    AppError::$variant(err)
                }
            }
        )*
    };
}

from_error! {
    ClockError => Clock,
    SerialError => Serial,
    GpioError => Gpio,
    DelayError => Delay,
    I2cError => I2c,
    SensorError => Sensor,
    ExtiError => Exti,
    TelemetryError => Telemetry,
}
