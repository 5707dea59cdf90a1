//! `log` backend writing to the console.

use core::fmt::Write;

use drivers::hal::serial::SerialWriter;
use log::{LevelFilter, Log, Metadata, Record};

use crate::console;

struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        // Dropped if the console is held, e.g. a driver logging mid-transmit.
        console::try_with(|port| {
            let _ = writeln!(
                SerialWriter(port),
                "[{}] {}: {}",
                record.level(),
                record.target(),
                record.args()
            );
        });
    }

    fn flush(&self) {}
}

pub fn init(level: LevelFilter) {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}
