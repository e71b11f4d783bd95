//! Minimal timestamped logging used across binders and the storage client.
//!
//! Verbosity is read once from `TABLEBIND_LOG` (`off`, `error`, `warn`, `info`); defaults to `info`.

use chrono::Local;
use once_cell::sync::Lazy;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Off,
    Error,
    Warn,
    Info,
}

impl Level {
    fn parse(raw: &str) -> Level {
        match raw.trim().to_lowercase().as_str() {
            "off" => Level::Off,
            "error" => Level::Error,
            "warn" => Level::Warn,
            _ => Level::Info,
        }
    }
}

static MAX_LEVEL: Lazy<Level> = Lazy::new(|| {
    std::env::var("TABLEBIND_LOG").map(|v| Level::parse(&v)).unwrap_or(Level::Info)
});

pub fn enabled(level: Level) -> bool {
    level != Level::Off && level <= *MAX_LEVEL
}

fn emit(level: Level, tag: &str, args: fmt::Arguments) {
    if !enabled(level) {
        return;
    }
    let now = Local::now().format("%Y-%m-%d %H:%M:%S");
    match level {
        Level::Error => eprintln!("[{}] {} {}", now, tag, args),
        _ => println!("[{}] {} {}", now, tag, args),
    }
}

pub fn info(args: fmt::Arguments) {
    emit(Level::Info, "INFO", args)
}

pub fn warn(args: fmt::Arguments) {
    emit(Level::Warn, "WARN", args)
}

pub fn error(args: fmt::Arguments) {
    emit(Level::Error, "ERROR", args)
}

#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::logger::info(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::logger::warn(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::logger::error(format_args!($($arg)*))
    };
}
