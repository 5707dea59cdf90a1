//! Hardware Abstraction Layer (HAL) - Platform-Independent Traits
//!
//! This module defines generic traits for interacting with hardware
//! peripherals. The platform drivers in [`crate::platform`] implement them
//! against real registers; the test doubles in `crate::testing` implement
//! them in memory so the interrupt core runs on a host.
//!
//! # Available Interfaces
//!
//! - [`gpio`]: General Purpose Input/Output control and pin naming
//! - [`exti`]: External interrupt lines (pending flags, triggers, routing)
//! - [`interrupt`]: Interrupt controller management
//! - [`timer`]: Durations and the free-running cycle counter
//! - [`serial`]: Serial port (UART) communication
//! - [`i2c`]: I2C master register transfers

pub mod exti;
pub mod gpio;
pub mod i2c;
pub mod interrupt;
pub mod serial;
pub mod timer;
