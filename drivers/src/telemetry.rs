//! Telemetry encodings streamed over the console.
//!
//! - CSV: `v0,v1,...\r\n`, seven decimals per value
//! - binary: `0xAA`, every value as a little-endian `f32`, then a
//!   little-endian `u16` checksum
//! - dashboard: labelled ASCII bar graphs redrawn in place with an ANSI
//!   cursor-up sequence

use core::fmt::{self, Write};

use crate::hal::serial::SerialPort;

/// Capacity of the transmit buffer.
pub const TX_CAPACITY: usize = 1024;

/// First byte of a binary frame.
pub const FRAME_START: u8 = 0xAA;

/// Cells between the brackets of a dashboard graph.
pub const GRAPH_WIDTH: usize = 30;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TelemetryError {
    /// Nothing to encode.
    Empty,
    /// The encoding does not fit in [`TX_CAPACITY`] bytes.
    Overflow,
    /// The serial port rejected a byte.
    Serial,
    /// A dashboard got a different number of values than it has gauges.
    Layout,
}

/// One dashboard row: its label, unit and the range the bar spans.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Gauge {
    pub label: &'static str,
    pub unit: &'static str,
    pub min: f32,
    pub max: f32,
}

impl Gauge {
    pub const fn new(label: &'static str, unit: &'static str, min: f32, max: f32) -> Self {
        Self {
            label,
            unit,
            min,
            max,
        }
    }
}

/// Wire format selected for sensor readings.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub enum Format {
    #[default]
    Csv,
    Binary,
    /// One gauge per value, in order.
    Dashboard(&'static [Gauge]),
}

/// Sum of the little-endian 16-bit halves of every value, wrapping.
pub fn checksum(values: &[f32]) -> u16 {
    values
        .iter()
        .flat_map(|value| {
            let b = value.to_le_bytes();
            [u16::from_le_bytes([b[0], b[1]]), u16::from_le_bytes([b[2], b[3]])]
        })
        .fold(0u16, |sum, half| sum.wrapping_add(half))
}

/// Fixed-capacity transmit buffer.
pub struct TxBuffer {
    bytes: [u8; TX_CAPACITY],
    len: usize,
}

impl TxBuffer {
    pub const fn new() -> Self {
        Self {
            bytes: [0; TX_CAPACITY],
            len: 0,
        }
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn push(&mut self, byte: u8) -> Result<(), TelemetryError> {
        let slot = self.bytes.get_mut(self.len).ok_or(TelemetryError::Overflow)?;
        *slot = byte;
        self.len += 1;
        Ok(())
    }

    fn extend(&mut self, bytes: &[u8]) -> Result<(), TelemetryError> {
        let end = self.len + bytes.len();
        if end > TX_CAPACITY {
            return Err(TelemetryError::Overflow);
        }
        self.bytes[self.len..end].copy_from_slice(bytes);
        self.len = end;
        Ok(())
    }

    /// Replace the contents with `values` in `format`.
    pub fn encode(&mut self, format: Format, values: &[f32]) -> Result<(), TelemetryError> {
        match format {
            Format::Csv => self.csv(values),
            Format::Binary => self.binary(values),
            Format::Dashboard(gauges) => self.dashboard(gauges, values),
        }
    }

    /// Replace the contents with one CSV line.
    pub fn csv(&mut self, values: &[f32]) -> Result<(), TelemetryError> {
        if values.is_empty() {
            return Err(TelemetryError::Empty);
        }

        self.clear();
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                self.push(b',')?;
            }
            write!(self, "{:.7}", value).map_err(|_| TelemetryError::Overflow)?;
        }
        self.extend(b"\r\n")
    }

    /// Replace the contents with one binary frame.
    pub fn binary(&mut self, values: &[f32]) -> Result<(), TelemetryError> {
        if values.is_empty() {
            return Err(TelemetryError::Empty);
        }
        if 1 + values.len() * 4 + 2 > TX_CAPACITY {
            return Err(TelemetryError::Overflow);
        }

        self.clear();
        self.push(FRAME_START)?;
        for value in values {
            self.extend(&value.to_le_bytes())?;
        }
        self.extend(&checksum(values).to_le_bytes())
    }

    /// Replace the contents with one dashboard frame, a row per gauge,
    /// ending with the cursor moved back to the first row.
    pub fn dashboard(&mut self, gauges: &[Gauge], values: &[f32]) -> Result<(), TelemetryError> {
        if values.is_empty() {
            return Err(TelemetryError::Empty);
        }
        if gauges.len() != values.len() {
            return Err(TelemetryError::Layout);
        }

        self.clear();
        for (gauge, &value) in gauges.iter().zip(values) {
            self.append_graph(gauge.label, value, gauge.unit, gauge.min, gauge.max)?;
        }
        self.append_cursor_home()
    }

    /// Append a dashboard row:
    ///
    /// ```text
    /// Accel X [          *                   ] -0.985 g
    /// ```
    ///
    /// The marker is placed by where `value` falls between `min` and `max`;
    /// values outside the range, NaN, or a degenerate range leave the graph
    /// empty.
    pub fn append_graph(
        &mut self,
        label: &str,
        value: f32,
        unit: &str,
        min: f32,
        max: f32,
    ) -> Result<(), TelemetryError> {
        let fraction = (value - min) / (max - min);
        let marker = (fraction.is_finite() && (0.0..=1.0).contains(&fraction))
            .then(|| ((GRAPH_WIDTH - 1) as f32 * fraction) as usize);

        self.extend(label.as_bytes())?;
        self.extend(b" [")?;
        for cell in 0..GRAPH_WIDTH {
            self.push(if Some(cell) == marker { b'*' } else { b' ' })?;
        }
        self.extend(b"] ")?;

        let (sign, magnitude) = if value >= 0.0 { (b'+', value) } else { (b'-', -value) };
        self.push(sign)?;
        write!(self, "{:.3} {}", magnitude, unit).map_err(|_| TelemetryError::Overflow)?;
        self.extend(b"\n\r")
    }

    /// Append the ANSI sequence moving the cursor back over every line in
    /// the buffer and hiding it, so the next dashboard overwrites this one.
    pub fn append_cursor_home(&mut self) -> Result<(), TelemetryError> {
        let lines = self.as_bytes().iter().filter(|&&byte| byte == b'\n').count();
        write!(self, "\x1B[{}A\x1B[?25l", lines).map_err(|_| TelemetryError::Overflow)
    }

    /// Transmit the buffer and wait for the last byte to leave.
    pub fn send<S: SerialPort + ?Sized>(&self, port: &mut S) -> Result<(), TelemetryError> {
        port.write(self.as_bytes()).map_err(|err| {
            log::error!("telemetry: transmit failed: {:?}", err);
            TelemetryError::Serial
        })?;
        port.flush().map_err(|_| TelemetryError::Serial)
    }
}

impl Default for TxBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Write for TxBuffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.extend(s.as_bytes()).map_err(|_| fmt::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingSerial;

    #[test]
    fn csv_line() {
        let mut buffer = TxBuffer::new();
        buffer.csv(&[1.5, -0.25, 0.0]).unwrap();
        assert_eq!(buffer.as_bytes(), b"1.5000000,-0.2500000,0.0000000\r\n");
    }

    #[test]
    fn csv_replaces_previous_contents() {
        let mut buffer = TxBuffer::new();
        buffer.csv(&[1.0, 2.0]).unwrap();
        buffer.csv(&[3.0]).unwrap();
        assert_eq!(buffer.as_bytes(), b"3.0000000\r\n");
    }

    #[test]
    fn empty_input_is_rejected() {
        let mut buffer = TxBuffer::new();
        assert_eq!(buffer.csv(&[]), Err(TelemetryError::Empty));
        assert_eq!(buffer.binary(&[]), Err(TelemetryError::Empty));
    }

    #[test]
    fn csv_overflow() {
        let values = [-1234.5678f32; 100];
        let mut buffer = TxBuffer::new();
        assert_eq!(buffer.csv(&values), Err(TelemetryError::Overflow));
    }

    #[test]
    fn binary_frame_layout() {
        let mut buffer = TxBuffer::new();
        buffer.binary(&[1.0, -2.0]).unwrap();

        // 1.0 = 0x3F80_0000, -2.0 = 0xC000_0000.
        let sum: u16 = 0x0000 + 0x3F80 + 0x0000 + 0xC000;
        let mut expected = vec![FRAME_START, 0x00, 0x00, 0x80, 0x3F, 0x00, 0x00, 0x00, 0xC0];
        expected.extend_from_slice(&sum.to_le_bytes());
        assert_eq!(buffer.as_bytes(), expected.as_slice());
    }

    #[test]
    fn checksum_wraps() {
        // Each -NaN with every bit set contributes 0xFFFF twice.
        let all_ones = f32::from_bits(u32::MAX);
        assert_eq!(checksum(&[all_ones]), 0xFFFE);
        assert_eq!(checksum(&[all_ones, all_ones]), 0xFFFC);
    }

    #[test]
    fn binary_overflow_leaves_buffer_untouched() {
        let mut buffer = TxBuffer::new();
        buffer.csv(&[1.0]).unwrap();
        assert_eq!(buffer.binary(&[0.0; 256]), Err(TelemetryError::Overflow));
        assert_eq!(buffer.as_bytes(), b"1.0000000\r\n");
    }

    #[test]
    fn encode_dispatches_on_format() {
        let mut buffer = TxBuffer::new();
        buffer.encode(Format::default(), &[0.5]).unwrap();
        assert_eq!(buffer.as_bytes(), b"0.5000000\r\n");
        buffer.encode(Format::Binary, &[0.5]).unwrap();
        assert_eq!(buffer.as_bytes()[0], FRAME_START);
        assert_eq!(buffer.len(), 7);
    }

    #[test]
    fn dashboard_row() {
        let mut buffer = TxBuffer::new();
        buffer.append_graph("X", 0.0, "g", -1.0, 1.0).unwrap();

        // 29 * 0.5 = 14.5, truncated to cell 14.
        let mut expected = String::from("X [");
        expected.push_str(&" ".repeat(14));
        expected.push('*');
        expected.push_str(&" ".repeat(15));
        expected.push_str("] +0.000 g\n\r");
        assert_eq!(buffer.as_bytes(), expected.as_bytes());
    }

    #[test]
    fn dashboard_negative_value_and_cursor_home() {
        let mut buffer = TxBuffer::new();
        buffer.append_graph("A", -1.0, "g", -1.0, 1.0).unwrap();
        buffer.append_graph("B", 1.0, "g", -1.0, 1.0).unwrap();
        buffer.append_cursor_home().unwrap();

        let text = core::str::from_utf8(buffer.as_bytes()).unwrap();
        assert!(text.starts_with("A [*"));
        assert!(text.contains("] -1.000 g\n\r"));
        assert!(text.contains("*] +1.000 g\n\r"));
        assert!(text.ends_with("\x1B[2A\x1B[?25l"));
    }

    #[test]
    fn graph_without_a_position_is_empty() {
        let blank = format!("[{}]", " ".repeat(GRAPH_WIDTH));
        let cases = [
            (f32::NAN, -1.0, 1.0),
            (0.0, 1.0, 1.0),
            (1.0, 1.0, 1.0),
            (1.5, -1.0, 1.0),
            (-1.5, -1.0, 1.0),
            (f32::INFINITY, -1.0, 1.0),
        ];

        for (value, min, max) in cases {
            let mut buffer = TxBuffer::new();
            buffer.append_graph("V", value, "g", min, max).unwrap();
            let text = core::str::from_utf8(buffer.as_bytes()).unwrap();
            assert!(text.contains(&blank), "{value} in {min}..{max}: {text:?}");
        }
    }

    #[test]
    fn dashboard_frame() {
        static GAUGES: [Gauge; 2] = [
            Gauge::new("Accel X", "g", -2.0, 2.0),
            Gauge::new("Accel Y", "g", -2.0, 2.0),
        ];
        let mut buffer = TxBuffer::new();
        buffer.csv(&[9.0]).unwrap();
        buffer.encode(Format::Dashboard(&GAUGES), &[-2.0, 2.0]).unwrap();

        let text = core::str::from_utf8(buffer.as_bytes()).unwrap();
        let rows: Vec<&str> = text.split("\n\r").collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].starts_with("Accel X [*"));
        assert!(rows[0].ends_with("] -2.000 g"));
        assert!(rows[1].starts_with("Accel Y ["));
        assert!(rows[1].ends_with("*] +2.000 g"));
        assert_eq!(rows[2], "\x1B[2A\x1B[?25l");
    }

    #[test]
    fn dashboard_needs_a_gauge_per_value() {
        static GAUGES: [Gauge; 1] = [Gauge::new("Temp", "C", 0.0, 50.0)];
        let mut buffer = TxBuffer::new();
        buffer.csv(&[1.0]).unwrap();

        assert_eq!(buffer.dashboard(&GAUGES, &[20.0, 21.0]), Err(TelemetryError::Layout));
        assert_eq!(buffer.dashboard(&GAUGES, &[]), Err(TelemetryError::Empty));
        assert_eq!(buffer.as_bytes(), b"1.0000000\r\n");
    }

    #[test]
    fn send_writes_and_flushes() {
        let mut buffer = TxBuffer::new();
        buffer.csv(&[2.0]).unwrap();

        let mut port = RecordingSerial::default();
        buffer.send(&mut port).unwrap();
        assert_eq!(port.sent, b"2.0000000\r\n");

        port.fail = true;
        assert_eq!(buffer.send(&mut port), Err(TelemetryError::Serial));
    }
}
