//! Hardware Driver Subsystem
//!
//! This crate provides a layered architecture for hardware abstraction:
//!
//! # Module Organization
//!
//! - [`hal`]: Platform-independent trait definitions
//! - [`irq`]: External interrupt lines, handler table and dispatch
//! - [`delay`]: Busy-wait delays on the cycle counter
//! - [`telemetry`]: Sensor reading encodings for the console
//! - [`peripheral`]: Off-chip device drivers (IMU, magnetometer)
//! - [`platform`]: Platform-specific drivers (SoC level)
//!
//! Everything above [`platform`] is generic over the HAL traits and runs
//! unchanged in host tests.
//!
//! # Usage Example
//!
//! ```no_run
//! use drivers::hal::gpio::{Pin, Port};
//! use drivers::hal::serial::{SerialConfig, SerialPort};
//! use drivers::platform::stm32f4::{gpio::Stm32Gpio, rcc::ClockConfig, usart::Stm32Usart};
//!
//! let clocks = ClockConfig::MAX_180MHZ.clocks();
//! let mut gpio = unsafe { Stm32Gpio::new() };
//! let tx = Pin::new(Port::D, 8).unwrap();
//! let mut uart = unsafe { Stm32Usart::new(tx, &clocks, &mut gpio) }.unwrap();
//! uart.configure(SerialConfig::new_8n1(115200)).unwrap();
//! uart.write(b"Hello, world!\r\n").unwrap();
//! ```

#![cfg_attr(not(test), no_std)]

pub mod delay;
pub mod hal;
pub mod irq;
pub mod peripheral;
pub mod platform;
pub mod telemetry;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use delay::CycleDelay;
pub use hal::gpio::{EdgeDetect, GpioController, Pin, PinLevel, Port, PullMode};
pub use hal::interrupt::InterruptController;
pub use hal::serial::{SerialConfig, SerialPort};
pub use irq::{ExtiController, ExtiError, GroupPolicy, LineHandler, Vector};
