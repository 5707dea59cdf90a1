//! GPIO (General Purpose Input/Output) Hardware Abstraction Layer.
//!
//! This module defines platform-independent traits for GPIO control, plus
//! the port/pin naming shared by every driver that takes a pin argument.

use core::fmt;

/// Number of pins in one GPIO port.
pub const PINS_PER_PORT: u8 = 16;

/// Pin logic level.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PinLevel {
    /// Logic low (0V or ground).
    Low,
    /// Logic high (VDD).
    High,
}

impl From<bool> for PinLevel {
    fn from(value: bool) -> Self {
        if value {
            PinLevel::High
        } else {
            PinLevel::Low
        }
    }
}

impl From<PinLevel> for bool {
    fn from(level: PinLevel) -> bool {
        matches!(level, PinLevel::High)
    }
}

/// Internal pull resistor configuration.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PullMode {
    /// No pull resistor (high impedance).
    None,
    /// Enable internal pull-up resistor.
    Up,
    /// Enable internal pull-down resistor.
    Down,
}

/// Edge sensitivity of an external interrupt line.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EdgeDetect {
    /// Detect rising edge (low-to-high transition).
    Rising,
    /// Detect falling edge (high-to-low transition).
    Falling,
    /// Detect both rising and falling edges.
    Both,
}

impl EdgeDetect {
    /// Whether a rising edge fires the line.
    pub const fn rising(self) -> bool {
        matches!(self, EdgeDetect::Rising | EdgeDetect::Both)
    }

    /// Whether a falling edge fires the line.
    pub const fn falling(self) -> bool {
        matches!(self, EdgeDetect::Falling | EdgeDetect::Both)
    }
}

/// GPIO port letter.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Port {
    A = 0,
    B = 1,
    C = 2,
    D = 3,
    E = 4,
    F = 5,
    G = 6,
    H = 7,
    I = 8,
}

impl Port {
    /// Zero-based port index (A = 0).
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Port for a zero-based index.
    pub const fn from_index(index: u8) -> Option<Self> {
        Some(match index {
            0 => Port::A,
            1 => Port::B,
            2 => Port::C,
            3 => Port::D,
            4 => Port::E,
            5 => Port::F,
            6 => Port::G,
            7 => Port::H,
            8 => Port::I,
            _ => return None,
        })
    }

    /// Port letter, for diagnostics.
    pub const fn letter(self) -> char {
        (b'A' + self as u8) as char
    }
}

/// A pin identified by port and pin-within-port (`PA0`, `PF2`, ...).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Pin {
    port: Port,
    number: u8,
}

impl Pin {
    /// Create a pin; `number` must be below [`PINS_PER_PORT`].
    pub const fn new(port: Port, number: u8) -> Result<Self, GpioError> {
        if number < PINS_PER_PORT {
            Ok(Self { port, number })
        } else {
            Err(GpioError::InvalidPin)
        }
    }

    /// Decode a flat pin index (`port * 16 + number`).
    pub const fn from_index(index: u8) -> Result<Self, GpioError> {
        match Port::from_index(index / PINS_PER_PORT) {
            Some(port) => Self::new(port, index % PINS_PER_PORT),
            None => Err(GpioError::InvalidPin),
        }
    }

    pub const fn port(self) -> Port {
        self.port
    }

    /// Pin number within its port (0..=15).
    pub const fn number(self) -> u8 {
        self.number
    }

    /// Single-bit mask of this pin within its port registers.
    pub const fn mask(self) -> u32 {
        1 << self.number
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}{}", self.port.letter(), self.number)
    }
}

/// GPIO errors.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GpioError {
    /// Pin number or port index out of range.
    InvalidPin,
    /// Alternate function number out of range.
    InvalidFunction,
}

/// GPIO controller trait.
///
/// This trait represents a GPIO controller capable of configuring
/// and controlling multiple GPIO pins.
///
/// # Type Parameters
///
/// - `Pin`: Platform-specific pin identifier
/// - `Error`: Error type for operations that can fail
pub trait GpioController {
    /// Platform-specific pin identifier.
    type Pin: Copy + Clone;

    /// Error type for GPIO operations.
    type Error: core::fmt::Debug;

    /// Configure a pin as a digital input with the given pull and no
    /// alternate function.
    fn set_input(&mut self, pin: Self::Pin, pull: PullMode) -> Result<(), Self::Error>;

    /// Configure a pin as a push-pull output.
    fn set_output(&mut self, pin: Self::Pin) -> Result<(), Self::Error>;

    /// Configure the internal pull resistor for a pin.
    fn set_pull(&mut self, pin: Self::Pin, pull: PullMode) -> Result<(), Self::Error>;

    /// Set a pin to logic high.
    fn set_high(&mut self, pin: Self::Pin) -> Result<(), Self::Error>;

    /// Set a pin to logic low.
    fn set_low(&mut self, pin: Self::Pin) -> Result<(), Self::Error>;

    /// Read the current logic level of a pin.
    fn read(&self, pin: Self::Pin) -> Result<PinLevel, Self::Error>;

    /// Set the pin to a specific level.
    fn set_level(&mut self, pin: Self::Pin, level: PinLevel) -> Result<(), Self::Error> {
        match level {
            PinLevel::High => self.set_high(pin),
            PinLevel::Low => self.set_low(pin),
        }
    }

    /// Toggle the output state of a pin.
    fn toggle(&mut self, pin: Self::Pin) -> Result<(), Self::Error> {
        let level = self.read(pin)?;
        self.set_level(
            pin,
            if level == PinLevel::High {
                PinLevel::Low
            } else {
                PinLevel::High
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockGpio;

    #[test]
    fn pin_from_flat_index() {
        let pin = Pin::from_index(5 * 16 + 2).unwrap();
        assert_eq!(pin.port(), Port::F);
        assert_eq!(pin.number(), 2);
        assert_eq!(pin.mask(), 0b100);
        assert_eq!(Pin::from_index(9 * 16), Err(GpioError::InvalidPin));
    }

    #[test]
    fn pin_number_out_of_range() {
        assert_eq!(Pin::new(Port::A, 16), Err(GpioError::InvalidPin));
    }

    #[test]
    fn pin_display() {
        assert_eq!(Pin::new(Port::A, 0).unwrap().to_string(), "PA0");
        assert_eq!(Pin::new(Port::D, 8).unwrap().to_string(), "PD8");
    }

    #[test]
    fn edge_detect_bits() {
        assert!(EdgeDetect::Rising.rising() && !EdgeDetect::Rising.falling());
        assert!(!EdgeDetect::Falling.rising() && EdgeDetect::Falling.falling());
        assert!(EdgeDetect::Both.rising() && EdgeDetect::Both.falling());
    }

    #[test]
    fn toggle_flips_level() {
        let led = Pin::new(Port::B, 7).unwrap();
        let mut gpio = MockGpio::default();
        gpio.set_output(led).unwrap();

        gpio.toggle(led).unwrap();
        assert_eq!(gpio.read(led), Ok(PinLevel::High));
        gpio.toggle(led).unwrap();
        assert_eq!(gpio.read(led), Ok(PinLevel::Low));
    }
}
