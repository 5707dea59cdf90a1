//! Console USART shared by the logger and telemetry.

use common::arch::arm::irq::CortexMIrq;
use common::sync::IrqSpinLock;
use drivers::platform::stm32f4::usart::Stm32Usart;

static CONSOLE: IrqSpinLock<Option<Stm32Usart>, CortexMIrq> = IrqSpinLock::new(None);

pub fn init(port: Stm32Usart) {
    *CONSOLE.lock() = Some(port);
}

/// Run `f` on the console, if it is set up.
pub fn with<R>(f: impl FnOnce(&mut Stm32Usart) -> R) -> Option<R> {
    CONSOLE.with(|console| console.as_mut().map(f))
}

/// Like [`with`], but gives up instead of spinning when the console is
/// already held further up the stack.
pub fn try_with<R>(f: impl FnOnce(&mut Stm32Usart) -> R) -> Option<R> {
    CONSOLE.try_lock()?.as_mut().map(f)
}

/// Print to console without newline
#[macro_export]
macro_rules! kprint {
    ($($arg:tt)*) => {{
        use core::fmt::Write as _;
        $crate::console::with(|port| {
            let _ = write!(drivers::hal::serial::SerialWriter(port), $($arg)*);
        });
    }};
}

#[macro_export]
macro_rules! kprintln {
    () => { $crate::kprint!("\n") };
    ($($arg:tt)*) => {{
        $crate::kprint!($($arg)*);
        $crate::kprint!("\n");
    }};
}
