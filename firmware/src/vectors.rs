//! EXTI interrupt entry points.

use common::arch::arm::irq::CortexMIrq;
use common::sync::IrqSpinLock;
use drivers::hal::gpio::{EdgeDetect, Pin, PullMode};
use drivers::irq::{ExtiController, Line, LineHandler, Vector};
use drivers::platform::stm32f4::exti::Stm32Exti;
use drivers::platform::stm32f4::gpio::Stm32Gpio;
use drivers::platform::stm32f4::nvic::Nvic;
use stm32f4::stm32f429::interrupt;

use crate::error::AppError;

static EXTI: IrqSpinLock<Option<ExtiController<'static, Stm32Exti>>, CortexMIrq> =
    IrqSpinLock::new(None);

/// Hand the controller to the interrupt handlers.
///
/// Must happen before any line is configured, so that an edge arriving
/// right after its vector is enabled always finds the controller.
pub fn install(controller: ExtiController<'static, Stm32Exti>) {
    *EXTI.lock() = Some(controller);
}

pub fn configure(
    gpio: &mut Stm32Gpio,
    nvic: &mut Nvic,
    pin: Pin,
    pull: PullMode,
    edge: EdgeDetect,
    handler: &'static dyn LineHandler,
) -> Result<Line, AppError> {
    let mut exti = EXTI.lock();
    let exti = exti.as_mut().ok_or(AppError::ExtiNotInstalled)?;
    Ok(exti.configure(gpio, nvic, pin, pull, edge, handler)?)
}

/// Pend `pin`'s line from software.
pub fn trigger(pin: Pin) -> Result<Line, AppError> {
    let mut exti = EXTI.lock();
    let exti = exti.as_mut().ok_or(AppError::ExtiNotInstalled)?;
    Ok(exti.trigger(pin))
}

fn service(vector: Vector) {
    if let Some(exti) = EXTI.lock().as_mut() {
        exti.handle(vector);
    }
}

// ============================================================================
// Entry Points
// ============================================================================

#[interrupt]
fn EXTI0() {
    service(Vector::Exti0);
}

#[interrupt]
fn EXTI1() {
    service(Vector::Exti1);
}

#[interrupt]
fn EXTI2() {
    service(Vector::Exti2);
}

#[interrupt]
fn EXTI3() {
    service(Vector::Exti3);
}

#[interrupt]
fn EXTI4() {
    service(Vector::Exti4);
}

#[interrupt]
fn EXTI9_5() {
    service(Vector::Exti9_5);
}

#[interrupt]
fn EXTI15_10() {
    service(Vector::Exti15_10);
}
