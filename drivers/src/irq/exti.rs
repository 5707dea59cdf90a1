//! External interrupt controller.
//!
//! Owns the callback table and the EXTI block, binds pins to lines at setup
//! time and runs the vector handler bodies at interrupt time.
//!
//! # Example
//!
//! ```no_run
//! use core::sync::atomic::{AtomicBool, Ordering};
//! use drivers::hal::gpio::{EdgeDetect, Pin, Port, PullMode};
//! use drivers::irq::{ExtiController, GroupPolicy, Vector};
//! use drivers::platform::stm32f4::{exti::Stm32Exti, gpio::Stm32Gpio, nvic::Nvic};
//!
//! static READY: AtomicBool = AtomicBool::new(false);
//! static ON_READY: fn() = || READY.store(true, Ordering::Release);
//!
//! let mut exti = ExtiController::new(unsafe { Stm32Exti::new() }, GroupPolicy::FirstPending);
//! let mut gpio = unsafe { Stm32Gpio::new() };
//! let mut nvic = Nvic::new(cortex_m::Peripherals::take().unwrap().NVIC);
//!
//! let pin = Pin::new(Port::F, 2).unwrap();
//! exti.configure(&mut gpio, &mut nvic, pin, PullMode::None, EdgeDetect::Rising, &ON_READY)
//!     .unwrap();
//!
//! // From the EXTI2 vector:
//! exti.handle(Vector::Exti2);
//! ```

use super::ExtiError;
use super::dispatch::{self, GroupPolicy, Vector};
use super::handlers::{LineHandler, LineRegistry};
use super::line::{LINE_COUNT, Line, port_source};
use crate::hal::exti::ExternalInterrupts;
use crate::hal::gpio::{EdgeDetect, GpioController, Pin, PullMode};
use crate::hal::interrupt::InterruptController;

pub struct ExtiController<'a, E> {
    lines: E,
    registry: LineRegistry<'a>,
    bindings: [Option<Pin>; LINE_COUNT],
    policy: GroupPolicy,
}

impl<'a, E: ExternalInterrupts> ExtiController<'a, E> {
    pub const fn new(lines: E, policy: GroupPolicy) -> Self {
        Self {
            lines,
            registry: LineRegistry::new(),
            bindings: [None; LINE_COUNT],
            policy,
        }
    }

    /// Turn `pin` into an interrupt source that runs `handler`.
    ///
    /// The line is the pin's number within its port. Configuring a line
    /// again replaces its handler and, if the port differs, steals the line
    /// from the previously bound pin.
    ///
    /// The port is validated before anything is written.
    pub fn configure<G, N>(
        &mut self,
        gpio: &mut G,
        nvic: &mut N,
        pin: Pin,
        pull: PullMode,
        edge: EdgeDetect,
        handler: &'a dyn LineHandler,
    ) -> Result<Line, ExtiError>
    where
        G: GpioController<Pin = Pin>,
        N: InterruptController,
    {
        let line = Line::of(pin);
        let number = line.number();
        let source = port_source(pin.port())?;

        gpio.set_input(pin, pull).map_err(|err| {
            log::error!("{}: input configuration failed: {:?}", pin, err);
            ExtiError::Gpio
        })?;

        self.registry.register(line, handler);
        self.lines.unmask(number);
        self.lines.set_edge(number, edge);

        if let Some(previous) = self.bindings[line.index()].replace(pin) {
            if previous != pin {
                log::warn!("EXTI{} moves from {} to {}", number, previous, pin);
            }
        }
        self.lines.route(number, source);

        let vector = line.vector();
        nvic.enable(vector.irq_number()).map_err(|err| {
            log::error!("{:?}: enable failed: {:?}", vector, err);
            ExtiError::InterruptController
        })?;

        log::debug!("{} -> EXTI{} ({:?}, {:?}, pull {:?})", pin, number, vector, edge, pull);
        Ok(line)
    }

    /// Bind `handler` to a raw line number without touching the hardware.
    pub fn register_line(
        &mut self,
        number: u8,
        handler: &'a dyn LineHandler,
    ) -> Result<Line, ExtiError> {
        let line = Line::new(number)?;
        self.registry.register(line, handler);
        Ok(line)
    }

    /// Force the pending flag of `pin`'s line, as if its edge had occurred.
    pub fn trigger(&mut self, pin: Pin) -> Line {
        let line = Line::of(pin);
        self.lines.software_trigger(line.number());
        line
    }

    /// Body of `vector`'s interrupt handler. Returns the lines serviced.
    pub fn handle(&mut self, vector: Vector) -> usize {
        dispatch::service(&mut self.lines, &self.registry, vector, self.policy)
    }

    /// Run `line`'s handler directly, bypassing the pending flags.
    pub fn dispatch(&self, line: Line) -> bool {
        self.registry.dispatch(line)
    }

    /// Pin currently routed to `line`.
    pub fn binding(&self, line: Line) -> Option<Pin> {
        self.bindings[line.index()]
    }

    pub fn policy(&self) -> GroupPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: GroupPolicy) {
        self.policy = policy;
    }

    pub fn registry(&self) -> &LineRegistry<'a> {
        &self.registry
    }

    pub fn lines(&self) -> &E {
        &self.lines
    }

    pub fn lines_mut(&mut self) -> &mut E {
        &mut self.lines
    }
}
