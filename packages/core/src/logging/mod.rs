//! Logging
//!
//! Minimal logger abstraction shared by the metadata layer. Levels are
//! immutable and shareable, so loggers must be `Send + Sync`.

pub mod src;

pub use src::console_logger::ConsoleLogger;
pub use src::logger::{LogLevel, Logger, NullLogger};
