// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! `log` backend writing to the debug USART.
//!
//! Initialize once at startup, after the USART is configured:
//!
//! ```ignore
//! logger::init(Usart::new(serial), LevelFilter::Debug).ok();
//! log::info!("motorctl up");
//! ```
//!
//! Each record is written as `LEVEL target - message\r\n`. Writes block on the USART inside a
//! critical section, so keep `trace` output out of fast interrupt paths in release builds.

use core::cell::RefCell;
use core::fmt::Write;

use cortex_m::interrupt::{self, Mutex};
use log::{LevelFilter, Metadata, Record, SetLoggerError};
use stm32f7xx_hal::pac;

use crate::hw::Usart;

struct UsartLogger {
    usart: Mutex<RefCell<Option<Usart<pac::USART1>>>>,
}

impl log::Log for UsartLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        interrupt::free(|cs| {
            if let Some(usart) = self.usart.borrow(cs).borrow_mut().as_mut() {
                let _ = write!(
                    usart,
                    "{} {} - {}\r\n",
                    record.level(),
                    record.target(),
                    record.args()
                );
            }
        });
    }

    fn flush(&self) {
        interrupt::free(|cs| {
            if let Some(usart) = self.usart.borrow(cs).borrow_mut().as_mut() {
                usart.flush();
            }
        });
    }
}

static LOGGER: UsartLogger = UsartLogger {
    usart: Mutex::new(RefCell::new(None)),
};

/// Install the USART logger as the global `log` backend.
///
/// Fails if a logger was already installed; the USART is kept either way.
pub fn init(usart: Usart<pac::USART1>, level: LevelFilter) -> Result<(), SetLoggerError> {
    interrupt::free(|cs| LOGGER.usart.borrow(cs).replace(Some(usart)));
    log::set_logger(&LOGGER)?;
    log::set_max_level(level);
    Ok(())
}
