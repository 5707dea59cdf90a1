//! In-memory implementations of the HAL traits for host tests.

use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use crate::hal::exti::ExternalInterrupts;
use crate::hal::gpio::{EdgeDetect, GpioController, GpioError, Pin, PinLevel, PullMode};
use crate::hal::i2c::{I2cBus, I2cError};
use crate::hal::interrupt::{InterruptController, IrqNumber};
use crate::hal::serial::{SerialConfig, SerialError, SerialPort};
use crate::hal::timer::CycleCounter;
use crate::irq::line::port_source;

/// Register write recorded by [`MockExti`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExtiOp {
    Unmask(u8),
    Edge(u8, EdgeDetect),
    Route(u8, u8),
}

/// EXTI block model. Routing starts at port A like the reset value.
#[derive(Default)]
pub struct MockExti {
    imr: u16,
    rtsr: u16,
    ftsr: u16,
    pending: u16,
    sources: [u8; 16],
    ops: Vec<ExtiOp>,
    clears: Vec<u8>,
}

impl MockExti {
    pub fn force_pending(&mut self, line: u8) {
        self.pending |= 1 << line;
    }

    /// Drive an edge on `pin`. The line goes pending only if it is
    /// unmasked, sensitive to this edge and routed to the pin's port.
    pub fn edge(&mut self, pin: Pin, rising: bool) {
        let line = pin.number();
        let bit = 1u16 << line;
        let triggers = if rising { self.rtsr } else { self.ftsr };
        let sensitive = triggers & bit != 0;
        let routed = port_source(pin.port()) == Ok(self.sources[line as usize]);
        if self.imr & bit != 0 && sensitive && routed {
            self.pending |= bit;
        }
    }

    pub fn is_unmasked(&self, line: u8) -> bool {
        self.imr & (1 << line) != 0
    }

    pub fn source(&self, line: u8) -> u8 {
        self.sources[line as usize]
    }

    pub fn ops(&self) -> &[ExtiOp] {
        &self.ops
    }

    /// Lines cleared so far, in order.
    pub fn clear_log(&self) -> Vec<u8> {
        self.clears.clone()
    }
}

impl ExternalInterrupts for MockExti {
    fn unmask(&mut self, line: u8) {
        self.imr |= 1 << line;
        self.ops.push(ExtiOp::Unmask(line));
    }

    fn set_edge(&mut self, line: u8, edge: EdgeDetect) {
        let bit = 1u16 << line;
        self.rtsr = if edge.rising() { self.rtsr | bit } else { self.rtsr & !bit };
        self.ftsr = if edge.falling() { self.ftsr | bit } else { self.ftsr & !bit };
        self.ops.push(ExtiOp::Edge(line, edge));
    }

    fn route(&mut self, line: u8, source: u8) {
        self.sources[line as usize] = source;
        self.ops.push(ExtiOp::Route(line, source));
    }

    fn is_pending(&self, line: u8) -> bool {
        self.pending & (1 << line) != 0
    }

    fn clear_pending(&mut self, line: u8) {
        self.pending &= !(1 << line);
        self.clears.push(line);
    }

    fn software_trigger(&mut self, line: u8) {
        self.pending |= 1 << line;
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PinMode {
    Input(PullMode),
    Output,
}

#[derive(Default)]
pub struct MockGpio {
    modes: BTreeMap<Pin, PinMode>,
    levels: BTreeMap<Pin, PinLevel>,
    /// Every call fails with this error when set.
    pub fail_with: Option<GpioError>,
}

impl MockGpio {
    pub fn mode(&self, pin: Pin) -> Option<PinMode> {
        self.modes.get(&pin).copied()
    }

    fn check(&self) -> Result<(), GpioError> {
        match self.fail_with {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl GpioController for MockGpio {
    type Pin = Pin;
    type Error = GpioError;

    fn set_input(&mut self, pin: Pin, pull: PullMode) -> Result<(), GpioError> {
        self.check()?;
        self.modes.insert(pin, PinMode::Input(pull));
        Ok(())
    }

    fn set_output(&mut self, pin: Pin) -> Result<(), GpioError> {
        self.check()?;
        self.modes.insert(pin, PinMode::Output);
        Ok(())
    }

    fn set_pull(&mut self, pin: Pin, pull: PullMode) -> Result<(), GpioError> {
        self.check()?;
        if let Some(PinMode::Input(current)) = self.modes.get_mut(&pin) {
            *current = pull;
        }
        Ok(())
    }

    fn set_high(&mut self, pin: Pin) -> Result<(), GpioError> {
        self.check()?;
        self.levels.insert(pin, PinLevel::High);
        Ok(())
    }

    fn set_low(&mut self, pin: Pin) -> Result<(), GpioError> {
        self.check()?;
        self.levels.insert(pin, PinLevel::Low);
        Ok(())
    }

    fn read(&self, pin: Pin) -> Result<PinLevel, GpioError> {
        self.check()?;
        Ok(self.levels.get(&pin).copied().unwrap_or(PinLevel::Low))
    }
}

#[derive(Default)]
pub struct MockNvic {
    enabled: BTreeSet<IrqNumber>,
}

impl MockNvic {
    pub fn is_enabled(&self, irq: IrqNumber) -> bool {
        self.enabled.contains(&irq)
    }

    pub fn enabled_count(&self) -> usize {
        self.enabled.len()
    }
}

impl InterruptController for MockNvic {
    type Error = ();

    fn enable(&mut self, irq: IrqNumber) -> Result<(), ()> {
        self.enabled.insert(irq);
        Ok(())
    }
}

/// Cycle counter that advances `step` cycles on every read.
pub struct FakeCycles {
    now: Cell<u32>,
    step: u32,
    pub enabled: bool,
    pub resets: u32,
    pub reads: Cell<u32>,
}

impl FakeCycles {
    pub fn new(step: u32) -> Self {
        Self::starting_at(0, step)
    }

    pub fn starting_at(now: u32, step: u32) -> Self {
        Self {
            now: Cell::new(now),
            step,
            enabled: false,
            resets: 0,
            reads: Cell::new(0),
        }
    }
}

impl CycleCounter for FakeCycles {
    fn enable(&mut self) {
        self.enabled = true;
    }

    fn reset(&mut self) {
        self.now.set(0);
        self.resets += 1;
    }

    fn cycles(&self) -> u32 {
        let now = self.now.get();
        self.now.set(now.wrapping_add(self.step));
        self.reads.set(self.reads.get() + 1);
        now
    }
}

/// I2C bus with a 256-byte register file per attached device.
#[derive(Default)]
pub struct MockI2c {
    devices: BTreeMap<u8, [u8; 256]>,
    writes: Vec<(u8, u8, u8)>,
}

impl MockI2c {
    pub fn set(&mut self, address: u8, register: u8, value: u8) {
        self.devices.entry(address).or_insert([0; 256])[register as usize] = value;
    }

    pub fn set_block(&mut self, address: u8, first_register: u8, values: &[u8]) {
        for (offset, &value) in values.iter().enumerate() {
            self.set(address, first_register.wrapping_add(offset as u8), value);
        }
    }

    /// Register writes so far, as `(address, register, value)`.
    pub fn writes(&self) -> &[(u8, u8, u8)] {
        &self.writes
    }
}

impl I2cBus for MockI2c {
    type Error = I2cError;

    fn write_register(&mut self, address: u8, register: u8, value: u8) -> Result<(), I2cError> {
        let device = self.devices.get_mut(&address).ok_or(I2cError::Nack)?;
        device[register as usize] = value;
        self.writes.push((address, register, value));
        Ok(())
    }

    fn read_registers(
        &mut self,
        address: u8,
        first_register: u8,
        buffer: &mut [u8],
    ) -> Result<(), I2cError> {
        if buffer.is_empty() {
            return Err(I2cError::InvalidConfig);
        }
        let device = self.devices.get(&address).ok_or(I2cError::Nack)?;
        for (offset, byte) in buffer.iter_mut().enumerate() {
            *byte = device[first_register.wrapping_add(offset as u8) as usize];
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingSerial {
    pub sent: Vec<u8>,
    pub config: Option<SerialConfig>,
    pub fail: bool,
}

impl SerialPort for RecordingSerial {
    type Error = SerialError;

    fn configure(&mut self, config: SerialConfig) -> Result<(), SerialError> {
        self.config = Some(config);
        Ok(())
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), SerialError> {
        if self.fail {
            return Err(SerialError::Overrun);
        }
        self.sent.push(byte);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SerialError> {
        Ok(())
    }

    fn is_busy(&self) -> bool {
        false
    }
}

/// Collects handler invocations in call order.
pub struct Recorder {
    calls: Mutex<Vec<u8>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A handler that records `tag` each time it fires.
    pub fn handler(&self, tag: u8) -> impl Fn() + Sync + '_ {
        move || self.calls.lock().unwrap().push(tag)
    }

    pub fn calls(&self) -> Vec<u8> {
        self.calls.lock().unwrap().clone()
    }
}
