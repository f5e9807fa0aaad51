// Console Logger
//
// Logger that writes to the console, tagged with the emitting component.

use super::logger::{LogLevel, Logger};

/// Console logger.
#[derive(Debug, Clone)]
pub struct ConsoleLogger {
    level: LogLevel,
    target: String,
}

impl ConsoleLogger {
    pub fn new(level: LogLevel) -> Self {
        Self::for_target(level, "annotation")
    }

    pub fn for_target(level: LogLevel, target: impl Into<String>) -> Self {
        Self {
            level,
            target: target.into(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    fn format(&self, level: LogLevel, msg: &str) -> String {
        format!("[{}] {}: {}", level, self.target, msg)
    }
}

impl Logger for ConsoleLogger {
    fn level(&self) -> LogLevel {
        self.level
    }

    fn debug(&self, msg: &str) {
        if self.is_enabled(LogLevel::Debug) {
            eprintln!("{}", self.format(LogLevel::Debug, msg));
        }
    }

    fn info(&self, msg: &str) {
        if self.is_enabled(LogLevel::Info) {
            println!("{}", self.format(LogLevel::Info, msg));
        }
    }

    fn warn(&self, msg: &str) {
        if self.is_enabled(LogLevel::Warn) {
            eprintln!("{}", self.format(LogLevel::Warn, msg));
        }
    }

    fn error(&self, msg: &str) {
        if self.is_enabled(LogLevel::Error) {
            eprintln!("{}", self.format(LogLevel::Error, msg));
        }
    }
}
