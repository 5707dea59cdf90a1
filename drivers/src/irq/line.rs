//! External interrupt line numbering and port routing.

use super::ExtiError;
use super::dispatch::Vector;
use crate::hal::gpio::{Pin, Port};

/// Number of GPIO-capable external interrupt lines.
pub const LINE_COUNT: usize = 16;

/// One of the 16 GPIO external interrupt lines.
///
/// Line `n` can be fed by pin `n` of any port, but by only one port at a
/// time.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Line(pub(super) u8);

impl Line {
    /// Validate a raw line number.
    pub const fn new(number: u8) -> Result<Self, ExtiError> {
        if (number as usize) < LINE_COUNT {
            Ok(Self(number))
        } else {
            Err(ExtiError::InvalidLine(number))
        }
    }

    /// The line a pin is wired to: its pin-within-port number.
    pub const fn of(pin: Pin) -> Self {
        Self(pin.number())
    }

    pub const fn number(self) -> u8 {
        self.0
    }

    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }

    /// Hardware vector that services this line.
    pub const fn vector(self) -> Vector {
        Vector::for_line(self)
    }

    /// Every line, ascending.
    pub fn all() -> impl Iterator<Item = Line> {
        (0..LINE_COUNT as u8).map(Line)
    }
}

/// Multiplexer selector routing a line to `port`.
///
/// Only the ports wired on this board are accepted; anything else is
/// rejected instead of leaving stale routing bits behind.
pub const fn port_source(port: Port) -> Result<u8, ExtiError> {
    match port {
        Port::A => Ok(0b0000),
        Port::B => Ok(0b0001),
        Port::C => Ok(0b0010),
        Port::D => Ok(0b0011),
        Port::F => Ok(0b0101),
        other => Err(ExtiError::UnsupportedPort(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_bounds() {
        assert_eq!(Line::new(15).map(Line::number), Ok(15));
        assert_eq!(Line::new(16), Err(ExtiError::InvalidLine(16)));
    }

    #[test]
    fn line_follows_pin_number() {
        let pin = Pin::new(Port::F, 2).unwrap();
        assert_eq!(Line::of(pin).number(), 2);
    }

    #[test]
    fn routed_ports() {
        assert_eq!(port_source(Port::A), Ok(0));
        assert_eq!(port_source(Port::D), Ok(3));
        assert_eq!(port_source(Port::F), Ok(5));
        for port in [Port::E, Port::G, Port::H, Port::I] {
            assert_eq!(port_source(port), Err(ExtiError::UnsupportedPort(port)));
        }
    }

    #[test]
    fn all_lines_ascending() {
        let numbers: Vec<u8> = Line::all().map(Line::number).collect();
        assert_eq!(numbers, (0..16).collect::<Vec<u8>>());
    }
}
