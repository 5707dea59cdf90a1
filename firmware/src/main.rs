//! STM32F429 motion-sensor firmware.
//!
//! Boots the clock tree, the console and the sensors, then waits for the
//! IMU's data-ready interrupt and streams each sample while blinking the
//! status LED.

#![no_std]
#![no_main]

mod config;
mod console;
mod error;
mod logger;
mod sensors;
mod vectors;

use core::convert::Infallible;
use core::fmt::Write;
use core::panic::PanicInfo;

use common::arch::arm::irq::CortexMIrq;
use common::sync::irq::IrqControl;
use cortex_m_rt::{ExceptionFrame, entry, exception};
use drivers::delay::CycleDelay;
use drivers::hal::gpio::GpioController;
use drivers::hal::serial::{SerialConfig, SerialPort, SerialWriter};
use drivers::irq::ExtiController;
use drivers::platform::stm32f4::{
    dwt::Dwt, exti::Stm32Exti, gpio::Stm32Gpio, i2c::Stm32I2c, nvic::Nvic, usart::Stm32Usart,
};
use drivers::platform::{CurrentPlatform, Platform};

use crate::error::AppError;
use crate::sensors::Sensors;

#[entry]
fn main() -> ! {
    match run() {
        Ok(never) => match never {},
        Err(err) => {
            log::error!("boot failed: {:?}", err);
            park()
        }
    }
}

fn run() -> Result<Infallible, AppError> {
    let cp = cortex_m::Peripherals::take().ok_or(AppError::CorePeripheralsTaken)?;
    let clocks = unsafe { CurrentPlatform::early_init() }?;
    let mut gpio = unsafe { Stm32Gpio::new() };
    let mut nvic = Nvic::new(cp.NVIC);

    let mut port = unsafe { Stm32Usart::new(config::CONSOLE_TX, &clocks, &mut gpio) }?;
    port.configure(SerialConfig::new_8n1(config::CONSOLE_BAUD))?;
    console::init(port);
    logger::init(config::LOG_LEVEL);
    kprintln!();
    log::info!("{}, {:?}", CurrentPlatform::name(), clocks);

    let mut delay = CycleDelay::new(Dwt::new(cp.DCB, cp.DWT), clocks.sysclk)?;
    gpio.set_output(config::LED)?;

    let bus = unsafe {
        Stm32I2c::new(
            config::I2C,
            config::I2C_SCL,
            config::I2C_SDA,
            config::I2C_SPEED,
            &clocks,
            &mut gpio,
        )
    }?;
    let mut sensors = Sensors::init(bus, config::TELEMETRY_FORMAT)?;

    vectors::install(ExtiController::new(unsafe { Stm32Exti::new() }, config::GROUP_POLICY));
    let line = vectors::configure(
        &mut gpio,
        &mut nvic,
        config::SENSOR_DRDY,
        config::SENSOR_DRDY_PULL,
        config::SENSOR_DRDY_EDGE,
        &sensors::ON_DATA_READY,
    )?;
    log::info!("data-ready on {} (EXTI{})", config::SENSOR_DRDY, line.number());

    // The sensor may have latched a sample before the line was armed, in
    // which case INT stays high and no edge ever arrives.
    vectors::trigger(config::SENSOR_DRDY)?;

    let blink_ticks = config::BLINK_INTERVAL.div(config::TICK);
    let mut ticks = 0;
    loop {
        delay.delay_ms(config::TICK);

        ticks += 1;
        if ticks >= blink_ticks {
            ticks = 0;
            gpio.toggle(config::LED)?;
        }

        if sensors::take_data_ready() {
            if let Err(err) = sensors.stream() {
                log::warn!("sample dropped: {:?}", err);
            }
        }
    }
}

/// Mask interrupts and stop.
fn park() -> ! {
    CortexMIrq::disable();
    loop {
        core::hint::spin_loop();
    }
}

#[exception]
unsafe fn HardFault(frame: &ExceptionFrame) -> ! {
    console::try_with(|port| {
        let _ = writeln!(
            SerialWriter(port),
            "\nhard fault at {:#010x}, lr {:#010x}",
            frame.pc(),
            frame.lr()
        );
    });
    park()
}

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    console::try_with(|port| {
        let _ = writeln!(SerialWriter(port), "\npanic: {}", info);
    });
    park()
}
