//! Board wiring and build-time settings.

use drivers::hal::gpio::{EdgeDetect, Pin, Port, PullMode};
use drivers::hal::i2c::I2cSpeed;
use drivers::hal::timer::Millis;
use drivers::irq::GroupPolicy;
use drivers::platform::stm32f4::i2c::Instance as I2cInstance;
use drivers::telemetry::Format;
use log::LevelFilter;

const fn pin(port: Port, number: u8) -> Pin {
    match Pin::new(port, number) {
        Ok(pin) => pin,
        Err(_) => panic!("pin number out of range"),
    }
}

/// Status LED.
pub const LED: Pin = pin(Port::B, 7);
pub const BLINK_INTERVAL: Millis = Millis::new(1000);

/// Main loop period.
pub const TICK: Millis = Millis::new(1);

/// Console USART TX (USART3).
pub const CONSOLE_TX: Pin = pin(Port::D, 8);
pub const CONSOLE_BAUD: u32 = 115_200;

pub const I2C: I2cInstance = I2cInstance::I2c2;
pub const I2C_SCL: Pin = pin(Port::F, 1);
pub const I2C_SDA: Pin = pin(Port::F, 0);
pub const I2C_SPEED: I2cSpeed = I2cSpeed::Fast;

/// MPU6050 INT, pulsed high on every new sample.
pub const SENSOR_DRDY: Pin = pin(Port::F, 2);
pub const SENSOR_DRDY_PULL: PullMode = PullMode::None;
pub const SENSOR_DRDY_EDGE: EdgeDetect = EdgeDetect::Rising;

pub const LOG_LEVEL: LevelFilter = LevelFilter::Info;

cfg_if::cfg_if! {
    if #[cfg(feature = "dispatch-all-pending")] {
        pub const GROUP_POLICY: GroupPolicy = GroupPolicy::AllPending;
    } else {
        pub const GROUP_POLICY: GroupPolicy = GroupPolicy::FirstPending;
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "stream-dashboard")] {
        use drivers::telemetry::Gauge;

        /// Bars span the accelerometer's +-2 g range.
        const ACCEL_GAUGES: [Gauge; 3] = [
            Gauge::new("Accel X", "g", -2.0, 2.0),
            Gauge::new("Accel Y", "g", -2.0, 2.0),
            Gauge::new("Accel Z", "g", -2.0, 2.0),
        ];
        pub const TELEMETRY_FORMAT: Format = Format::Dashboard(&ACCEL_GAUGES);
    } else if #[cfg(feature = "stream-binary")] {
        pub const TELEMETRY_FORMAT: Format = Format::Binary;
    } else {
        pub const TELEMETRY_FORMAT: Format = Format::Csv;
    }
}
