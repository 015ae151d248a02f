//! Log entries and their opaque attachments

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::level::LogLevel;

/// Object-safe bound for attachment values
///
/// Blanket-implemented for every `Debug + Send + Sync + 'static` type so that
/// callers never implement it by hand.
pub trait Payload: fmt::Debug + Send + Sync + 'static {
    fn as_any(&self) -> &dyn Any;
}

impl<T: fmt::Debug + Send + Sync + 'static> Payload for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Opaque diagnostic payload carried alongside an entry
///
/// The store never looks inside. Sinks may render it through `Debug`.
#[derive(Clone)]
pub struct LogData(Arc<dyn Payload>);

impl LogData {
    /// Wrap any debuggable value
    pub fn new<T: Payload>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Borrow the payload as a concrete type, if it is one
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        // Deref first: `Arc<dyn Payload>` is itself a `Payload`.
        (*self.0).as_any().downcast_ref::<T>()
    }
}

impl fmt::Debug for LogData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

/// A single log entry
///
/// Entries are created by the store when a call passes the threshold and are
/// never modified afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    level: LogLevel,
    message: String,
    timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<String>,
    #[serde(skip)]
    data: Option<LogData>,
}

impl LogEntry {
    pub(crate) fn new(
        level: LogLevel,
        message: String,
        timestamp: DateTime<Utc>,
        context: Option<String>,
        data: Option<LogData>,
    ) -> Self {
        Self {
            level,
            message,
            timestamp,
            context,
            data,
        }
    }

    /// Get the severity of the entry
    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// Get the message text
    pub fn message(&self) -> &str {
        &self.message
    }

    /// When the store accepted the entry
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Label of the subsystem that produced the entry
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// Get the attached payload, if any
    pub fn data(&self) -> Option<&LogData> {
        self.data.as_ref()
    }
}
