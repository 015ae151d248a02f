//! logstore - process-wide in-memory log store
//!
//! Entries below a severity threshold are dropped, accepted entries are kept
//! in a bounded FIFO history and written to a pluggable sink.

pub mod config;
pub mod logging;

pub use logging::{global, init_global, LogData, LogEntry, LogLevel, LogSink, LogStore};
