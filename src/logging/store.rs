//! Process-wide log store
//!
//! Holds a bounded, insertion-ordered history of accepted entries and
//! forwards each one to a sink. Entries below the current threshold are
//! dropped before they are stored or emitted.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use chrono::Utc;
use thiserror::Error;

use crate::config::Config;

use super::entry::{LogData, LogEntry};
use super::level::LogLevel;
use super::sink::{ConsoleSink, LogSink};

/// Maximum entries kept by a default store
pub const DEFAULT_CAPACITY: usize = 1000;

/// Threshold of a default store
pub const DEFAULT_THRESHOLD: LogLevel = LogLevel::Info;

static GLOBAL: OnceLock<LogStore> = OnceLock::new();

/// Errors from global store setup
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("the global log store is already initialized")]
    AlreadyInitialized,
}

/// Get the process-wide store, creating a default one on first use
pub fn global() -> &'static LogStore {
    GLOBAL.get_or_init(LogStore::new)
}

/// Install `store` as the process-wide store
///
/// Must run before anything calls [`global`]; afterwards the singleton is
/// fixed for the life of the process.
pub fn init_global(store: LogStore) -> Result<&'static LogStore, StoreError> {
    GLOBAL
        .set(store)
        .map_err(|_| StoreError::AlreadyInitialized)?;
    Ok(global())
}

/// Everything mutated under the store lock
struct State {
    threshold: LogLevel,
    entries: VecDeque<LogEntry>,
    sink: Arc<dyn LogSink>,
}

/// Thread-safe bounded log history with a severity threshold
pub struct LogStore {
    state: Mutex<State>,
    /// Maximum entries to keep; fixed at construction
    capacity: usize,
    dropped: AtomicU64,
    sink_failures: AtomicU64,
}

impl LogStore {
    /// Create a store with the default threshold, capacity and console sink
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a store keeping at most `capacity` entries
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_sink(capacity, DEFAULT_THRESHOLD, Arc::new(ConsoleSink::new()))
    }

    /// Create a fully specified store
    ///
    /// A capacity of zero is raised to one.
    pub fn with_sink(capacity: usize, threshold: LogLevel, sink: Arc<dyn LogSink>) -> Self {
        let capacity = capacity.max(1);
        Self {
            state: Mutex::new(State {
                threshold,
                entries: VecDeque::with_capacity(capacity),
                sink,
            }),
            capacity,
            dropped: AtomicU64::new(0),
            sink_failures: AtomicU64::new(0),
        }
    }

    /// Create a store from loaded configuration
    pub fn from_config(config: &Config) -> Self {
        Self::with_sink(config.capacity, config.level, config.sink.build())
    }

    fn state(&self) -> MutexGuard<'_, State> {
        // No caller code runs under the lock, so a poisoned guard still
        // holds a consistent buffer.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the minimum level accepted from now on
    pub fn set_threshold(&self, level: LogLevel) {
        self.state().threshold = level;
    }

    /// Get the current minimum accepted level
    pub fn threshold(&self) -> LogLevel {
        self.state().threshold
    }

    /// Replace the sink used for future entries
    pub fn set_sink(&self, sink: Arc<dyn LogSink>) {
        self.state().sink = sink;
    }

    /// Get the maximum number of buffered entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Record a message at `level`
    ///
    /// Below-threshold calls are dropped silently. Accepted entries are
    /// buffered, evicting the oldest past capacity, then emitted to the sink
    /// once the lock is released. Sink failures never reach the caller.
    pub fn log(
        &self,
        level: LogLevel,
        message: impl Into<String>,
        context: Option<&str>,
        data: Option<LogData>,
    ) {
        let (entry, sink) = {
            let mut state = self.state();
            if level < state.threshold {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                return;
            }

            let entry = LogEntry::new(
                level,
                message.into(),
                Utc::now(),
                context.map(str::to_string),
                data,
            );
            state.entries.push_back(entry.clone());
            while state.entries.len() > self.capacity {
                state.entries.pop_front();
            }
            (entry, Arc::clone(&state.sink))
        };

        self.emit(sink.as_ref(), &entry);
    }

    fn emit(&self, sink: &dyn LogSink, entry: &LogEntry) {
        let reason = match panic::catch_unwind(AssertUnwindSafe(|| sink.emit(entry))) {
            Ok(Ok(())) => return,
            Ok(Err(e)) => e.to_string(),
            Err(_) => "sink panicked".to_string(),
        };
        self.sink_failures.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("Log sink failed: {}", reason);
    }

    /// Record a debug message
    pub fn debug(&self, message: impl Into<String>, context: Option<&str>, data: Option<LogData>) {
        self.log(LogLevel::Debug, message, context, data);
    }

    /// Record an info message
    pub fn info(&self, message: impl Into<String>, context: Option<&str>, data: Option<LogData>) {
        self.log(LogLevel::Info, message, context, data);
    }

    /// Record a warning
    pub fn warn(&self, message: impl Into<String>, context: Option<&str>, data: Option<LogData>) {
        self.log(LogLevel::Warn, message, context, data);
    }

    /// Record an error
    pub fn error(&self, message: impl Into<String>, context: Option<&str>, data: Option<LogData>) {
        self.log(LogLevel::Error, message, context, data);
    }

    /// Copy out buffered entries in insertion order
    ///
    /// With `min_level`, only entries at or above it are returned.
    pub fn get_logs(&self, min_level: Option<LogLevel>) -> Vec<LogEntry> {
        let state = self.state();
        match min_level {
            Some(min) => state
                .entries
                .iter()
                .filter(|e| e.level() >= min)
                .cloned()
                .collect(),
            None => state.entries.iter().cloned().collect(),
        }
    }

    /// Empty the buffer, keeping threshold and capacity
    pub fn clear_logs(&self) {
        self.state().entries.clear();
    }

    /// Get the number of buffered entries
    pub fn len(&self) -> usize {
        self.state().entries.len()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Calls rejected by the threshold since construction
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Emissions that returned an error or panicked since construction
    pub fn sink_failure_count(&self) -> u64 {
        self.sink_failures.load(Ordering::Relaxed)
    }
}

impl Default for LogStore {
    fn default() -> Self {
        Self::new()
    }
}
