//! Logging system for logstore
//!
//! Provides the process-wide log store, its entry and level types, output
//! sinks, and a `tracing` layer that feeds the store.

mod entry;
mod layer;
mod level;
mod sink;
mod store;

pub use entry::{LogData, LogEntry, Payload};
pub use layer::LogStoreLayer;
pub use level::{LogLevel, ParseLevelError};
pub use sink::{
    format_entry, ConsoleSink, ConsoleStream, LogSink, NoopSink, SinkError, TracingSink,
    SINK_TARGET,
};
pub use store::{global, init_global, LogStore, StoreError, DEFAULT_CAPACITY, DEFAULT_THRESHOLD};
