//! Bridge from tracing to a [`Logger`]

use std::fmt::Write;
use std::sync::Arc;

use tracing::{Event, Subscriber, field::Visit};
use tracing_subscriber::{Layer, layer::Context, registry::LookupSpan};

use crate::{Level, LogRecord, Logger, is_dispatching};

/// A tracing layer that forwards events to a [`Logger`].
///
/// The event target becomes the record source. Spans in scope are prefixed
/// to the message as `outer::inner: message`.
pub struct TracingBridge {
    logger: Arc<dyn Logger>,
    min_level: Level,
}

impl TracingBridge {
    /// Create a new tracing bridge forwarding every level
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            logger,
            min_level: Level::Trace,
        }
    }

    /// Only forward events at or above `level`
    #[must_use]
    pub const fn with_min_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }
}

impl<S> Layer<S> for TracingBridge
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        // Raised from inside a sink; forwarding would re-enter its lock.
        if is_dispatching() {
            return;
        }

        let level = map_level(*event.metadata().level());
        if level < self.min_level || !self.logger.is_enabled(level) {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let mut span_context = Vec::new();
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                span_context.push(span.name());
            }
        }

        let message = if span_context.is_empty() {
            visitor.finish()
        } else {
            format!("{}: {}", span_context.join("::"), visitor.finish())
        };

        // tracing has no way to hand an error back to the emitting code.
        let _ = self
            .logger
            .log(LogRecord::new(level, event.metadata().target(), message));
    }
}

fn map_level(level: tracing::Level) -> Level {
    match level {
        tracing::Level::ERROR => Level::Error,
        tracing::Level::WARN => Level::Warn,
        tracing::Level::INFO => Level::Info,
        tracing::Level::DEBUG => Level::Debug,
        tracing::Level::TRACE => Level::Trace,
    }
}

/// Visitor to extract the message from tracing fields
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn push_field(&mut self, name: &str, value: impl std::fmt::Display) {
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        let _ = write!(self.fields, "{name}={value}");
    }

    /// Message followed by the remaining fields as `key=value`
    fn finish(mut self) -> String {
        if !self.fields.is_empty() {
            if !self.message.is_empty() {
                self.message.push(' ');
            }
            self.message.push_str(&self.fields);
        }
        self.message
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.push_field(field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.push_field(field.name(), format_args!("{value:?}"));
        }
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.push_field(field.name(), value);
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.push_field(field.name(), value);
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.push_field(field.name(), value);
    }
}

/// Install a global subscriber that forwards tracing events to `logger`.
///
/// Records from the `log` crate are not captured; see
/// [`init_log_bridge`](crate::compat::init_log_bridge) for those.
///
/// # Errors
///
/// Fails if a global subscriber has already been installed.
pub fn init_tracing_bridge(
    logger: Arc<dyn Logger>,
    min_level: Level,
) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    use tracing_subscriber::prelude::*;

    let subscriber =
        tracing_subscriber::registry().with(TracingBridge::new(logger).with_min_level(min_level));
    tracing::subscriber::set_global_default(subscriber)
}
