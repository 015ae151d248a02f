//! Output sinks
//!
//! A sink receives every entry the store accepts, exactly once, after the
//! store has released its lock. Sinks pick an output channel from the
//! entry's level; they never filter.

use std::io::{self, Write};

use chrono::SecondsFormat;
use thiserror::Error;

use super::entry::{LogData, LogEntry};
use super::level::LogLevel;

/// Target used for everything `TracingSink` emits
pub const SINK_TARGET: &str = "logstore::sink";

/// Errors a sink may report
///
/// The store swallows these; they only feed its failure counter.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to write log line: {0}")]
    Io(#[from] io::Error),

    #[error("sink unavailable: {0}")]
    Unavailable(String),
}

/// Destination for accepted entries
pub trait LogSink: Send + Sync {
    fn emit(&self, entry: &LogEntry) -> Result<(), SinkError>;
}

/// Render an entry as `<ISO-8601 timestamp> [<context>] <message>`
///
/// The attachment is not part of the line; sinks pass it separately.
/// `ConsoleSink` prefixes this line with the level name.
pub fn format_entry(entry: &LogEntry) -> String {
    format!(
        "{} [{}] {}",
        entry
            .timestamp()
            .to_rfc3339_opts(SecondsFormat::Millis, true),
        entry.context().unwrap_or(""),
        entry.message()
    )
}

/// Write `<LEVEL> <line> [<data>]`, with the attachment appended if present
fn write_entry<W: Write>(out: &mut W, entry: &LogEntry) -> io::Result<()> {
    let line = format_entry(entry);
    let tag = entry.level().as_str();
    match entry.data() {
        Some(data) => writeln!(out, "{:<5} {} {:?}", tag, line, data),
        None => writeln!(out, "{:<5} {}", tag, line),
    }
}

/// Standard stream a console line is written to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleStream {
    Stdout,
    Stderr,
}

/// Console output
///
/// A terminal has two streams for four channels, so each line carries its
/// level name. Warn and error always go to stderr; debug and info go to
/// stdout unless the sink was built with [`ConsoleSink::stderr_only`].
#[derive(Debug, Clone, Copy)]
pub struct ConsoleSink {
    /// Stream for debug and info lines
    low_stream: ConsoleStream,
}

impl ConsoleSink {
    /// Debug/info on stdout, warn/error on stderr
    pub fn new() -> Self {
        Self {
            low_stream: ConsoleStream::Stdout,
        }
    }

    /// Every level on stderr, leaving stdout to the program
    pub fn stderr_only() -> Self {
        Self {
            low_stream: ConsoleStream::Stderr,
        }
    }

    /// Get the stream an entry at `level` is written to
    pub fn stream_for(&self, level: LogLevel) -> ConsoleStream {
        match level {
            LogLevel::Debug | LogLevel::Info => self.low_stream,
            LogLevel::Warn | LogLevel::Error => ConsoleStream::Stderr,
        }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSink for ConsoleSink {
    fn emit(&self, entry: &LogEntry) -> Result<(), SinkError> {
        match self.stream_for(entry.level()) {
            ConsoleStream::Stdout => write_entry(&mut io::stdout().lock(), entry)?,
            ConsoleStream::Stderr => write_entry(&mut io::stderr().lock(), entry)?,
        }
        Ok(())
    }
}

/// Forwards entries to the `tracing` macro matching their level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&self, entry: &LogEntry) -> Result<(), SinkError> {
        let line = format_entry(entry);
        let data: Option<&LogData> = entry.data();
        match entry.level() {
            LogLevel::Debug => tracing::debug!(target: SINK_TARGET, data = ?data, "{}", line),
            LogLevel::Info => tracing::info!(target: SINK_TARGET, data = ?data, "{}", line),
            LogLevel::Warn => tracing::warn!(target: SINK_TARGET, data = ?data, "{}", line),
            LogLevel::Error => tracing::error!(target: SINK_TARGET, data = ?data, "{}", line),
        }
        Ok(())
    }
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl LogSink for NoopSink {
    fn emit(&self, _entry: &LogEntry) -> Result<(), SinkError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn entry(level: LogLevel, context: Option<&str>, data: Option<LogData>) -> LogEntry {
        let timestamp = DateTime::parse_from_rfc3339("2024-05-01T12:00:00.250Z")
            .unwrap()
            .with_timezone(&Utc);
        LogEntry::new(
            level,
            "bid placed".to_string(),
            timestamp,
            context.map(str::to_string),
            data,
        )
    }

    #[test]
    fn test_format_entry_with_context() {
        let line = format_entry(&entry(LogLevel::Info, Some("Auction"), None));
        assert_eq!(line, "2024-05-01T12:00:00.250Z [Auction] bid placed");
    }

    #[test]
    fn test_format_entry_without_context() {
        let line = format_entry(&entry(LogLevel::Info, None, None));
        assert_eq!(line, "2024-05-01T12:00:00.250Z [] bid placed");
    }

    #[test]
    fn test_format_entry_ignores_data() {
        let line = format_entry(&entry(LogLevel::Info, None, Some(LogData::new(99u32))));
        assert!(!line.contains("99"));
    }

    #[test]
    fn test_write_entry_appends_data() {
        let mut out = Vec::new();
        write_entry(
            &mut out,
            &entry(LogLevel::Warn, Some("Auction"), Some(LogData::new("lot-7"))),
        )
        .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "WARN  2024-05-01T12:00:00.250Z [Auction] bid placed \"lot-7\"\n"
        );
    }

    #[test]
    fn test_write_entry_without_data() {
        let mut out = Vec::new();
        write_entry(&mut out, &entry(LogLevel::Error, None, None)).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "ERROR 2024-05-01T12:00:00.250Z [] bid placed\n"
        );
    }

    #[test]
    fn test_console_stream_routing() {
        let sink = ConsoleSink::new();
        assert_eq!(sink.stream_for(LogLevel::Debug), ConsoleStream::Stdout);
        assert_eq!(sink.stream_for(LogLevel::Info), ConsoleStream::Stdout);
        assert_eq!(sink.stream_for(LogLevel::Warn), ConsoleStream::Stderr);
        assert_eq!(sink.stream_for(LogLevel::Error), ConsoleStream::Stderr);
    }

    #[test]
    fn test_console_stderr_only_routing() {
        let sink = ConsoleSink::stderr_only();
        for level in LogLevel::ALL {
            assert_eq!(sink.stream_for(level), ConsoleStream::Stderr);
        }
    }

    #[test]
    fn test_builtin_sinks_succeed() {
        for level in LogLevel::ALL {
            let e = entry(level, None, None);
            assert!(NoopSink.emit(&e).is_ok());
            assert!(TracingSink.emit(&e).is_ok());
        }
    }
}
