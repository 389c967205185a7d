//! Browser console backend for the `log` facade.

use log::{Level, LevelFilter, Log, Metadata, Record};

pub struct ConsoleLogger {
    level: LevelFilter,
}

impl ConsoleLogger {
    pub const fn new(level: LevelFilter) -> Self {
        Self { level }
    }
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!("[{}] {}: {}", record.level(), record.target(), record.args());
        let line = wasm_bindgen::JsValue::from_str(&line);
        match record.level() {
            Level::Error => web_sys::console::error_1(&line),
            Level::Warn => web_sys::console::warn_1(&line),
            Level::Info => web_sys::console::info_1(&line),
            Level::Debug | Level::Trace => web_sys::console::debug_1(&line),
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger::new(crate::config::LOG_LEVEL);

/// Install the console logger. Safe to call more than once.
pub fn init() {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(LOGGER.level);
    }
}
