//! `tracing` bridge
//!
//! Lets code that already logs through `tracing` feed a [`LogStore`]. Events
//! are converted to entries and go through the store's usual threshold,
//! eviction and sink handling.

use std::fmt::Write as _;
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use super::store::LogStore;

/// Events from this crate are never forwarded, so neither the store's own
/// diagnostics nor `TracingSink` output can loop back into a store.
const OWN_TARGET: &str = "logstore";

/// Where a layer forwards events
enum Destination {
    Store(Arc<LogStore>),
    Global,
}

/// A `tracing` layer that records events into a [`LogStore`]
pub struct LogStoreLayer {
    destination: Destination,
}

impl LogStoreLayer {
    /// Forward events into `store`
    pub fn new(store: Arc<LogStore>) -> Self {
        Self {
            destination: Destination::Store(store),
        }
    }

    /// Forward events into the process-wide store
    pub fn global() -> Self {
        Self {
            destination: Destination::Global,
        }
    }

    fn store(&self) -> &LogStore {
        match &self.destination {
            Destination::Store(store) => store.as_ref(),
            Destination::Global => super::store::global(),
        }
    }
}

fn is_own_target(target: &str) -> bool {
    target == OWN_TARGET || target.starts_with("logstore::")
}

impl<S> Layer<S> for LogStoreLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if is_own_target(metadata.target()) {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        // Last path segment makes a short context label.
        let context = metadata
            .module_path()
            .unwrap_or_else(|| metadata.target())
            .rsplit("::")
            .next()
            .unwrap_or_default();
        let context = if context.is_empty() {
            None
        } else {
            Some(context)
        };

        self.store()
            .log((*metadata.level()).into(), visitor.finish(), context, None);
    }
}

/// Collects the `message` field plus any other fields as `name=value`
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn push_field(&mut self, field: &Field, value: &dyn std::fmt::Display) {
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        let _ = write!(self.fields, "{}={}", field.name(), value);
    }

    fn finish(self) -> String {
        match (self.message.is_empty(), self.fields.is_empty()) {
            (_, true) => self.message,
            (true, false) => self.fields,
            (false, false) => format!("{} {}", self.message, self.fields),
        }
    }
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.push_field(field, &format_args!("{:?}", value));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.push_field(field, &value);
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.push_field(field, &value);
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.push_field(field, &value);
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.push_field(field, &value);
    }
}
