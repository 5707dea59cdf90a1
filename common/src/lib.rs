//! Shared `no_std` building blocks for the drivers and the firmware.

#![cfg_attr(not(test), no_std)]

pub mod arch;
pub mod sync;
