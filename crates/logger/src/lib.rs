//! Log records, sinks and the multiplexing sink used by the log service.
//!
//! A [`Sink`] is anything that accepts [`LogRecord`]s and can be closed. The
//! [`MultiplexSink`] fans a record out to several sinks in registration order
//! and lets a member be detached again without closing it, which is how the
//! console stops receiving output once a durable sink takes over.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

mod console;
mod error;
mod formatter;
mod level;
mod logger;
mod multiplex;
mod record;
mod reentrancy;
mod sink;

pub mod compat;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use console::ConsoleSink;
pub use error::{MemberFailure, Result, SinkError};
pub use formatter::{JsonFormatter, LogFormat, LogFormatter, PlainTextFormatter};
pub use level::{Level, ParseLevelError};
pub use logger::{Logger, NoOpLogger, ScopedLogger};
pub use multiplex::MultiplexSink;
pub use record::LogRecord;
pub use reentrancy::{DispatchGuard, is_dispatching};
pub use sink::{NoOpSink, Sink, SinkId};
