//! Fan-out of records to an ordered set of sinks

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::{DispatchGuard, LogRecord, MemberFailure, Result, Sink, SinkError, SinkId};

struct Members {
    next_id: u64,
    entries: Vec<(SinkId, Arc<dyn Sink>)>,
}

/// Sink that forwards every record to each of its members.
///
/// Members are visited in registration order. A failing member never stops
/// the remaining ones from receiving the record; all failures are reported
/// together as [`SinkError::PartialWriteFailure`].
pub struct MultiplexSink {
    name: String,
    members: Mutex<Members>,
}

impl MultiplexSink {
    /// Create an empty multiplexer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: "multiplex".to_string(),
            members: Mutex::new(Members {
                next_id: 0,
                entries: Vec::new(),
            }),
        }
    }

    /// Register a member at the end of the iteration order.
    pub fn add(&self, sink: Arc<dyn Sink>) -> SinkId {
        let mut members = self.members.lock();
        let id = SinkId::new(members.next_id);
        members.next_id += 1;
        debug!(%id, sink = sink.name(), "added sink");
        members.entries.push((id, sink));
        id
    }

    /// Detach a member without closing it and hand it back to the caller.
    ///
    /// Returns `None` if no member is registered under `id`.
    pub fn remove(&self, id: SinkId) -> Option<Arc<dyn Sink>> {
        let mut members = self.members.lock();
        let position = members.entries.iter().position(|(member, _)| *member == id)?;
        let (_, sink) = members.entries.remove(position);
        debug!(%id, sink = sink.name(), "removed sink");
        Some(sink)
    }

    /// Whether a member is registered under `id`.
    #[must_use]
    pub fn contains(&self, id: SinkId) -> bool {
        self.members.lock().entries.iter().any(|(member, _)| *member == id)
    }

    /// Identifiers of the current members in registration order.
    #[must_use]
    pub fn ids(&self) -> Vec<SinkId> {
        self.members.lock().entries.iter().map(|(id, _)| *id).collect()
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.lock().entries.len()
    }

    /// Whether there are no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn for_each_member(
        entries: &[(SinkId, Arc<dyn Sink>)],
        op: impl Fn(&dyn Sink) -> Result<()>,
    ) -> Vec<MemberFailure> {
        entries
            .iter()
            .filter_map(|(id, sink)| {
                op(sink.as_ref()).err().map(|error| MemberFailure {
                    id: *id,
                    name: sink.name().to_string(),
                    error,
                })
            })
            .collect()
    }
}

impl Default for MultiplexSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for MultiplexSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn write(&self, record: &LogRecord) -> Result<()> {
        let _dispatch = DispatchGuard::enter();
        let members = self.members.lock();
        let failures = Self::for_each_member(&members.entries, |sink| sink.write(record));
        if failures.is_empty() {
            Ok(())
        } else {
            Err(SinkError::PartialWriteFailure { failures })
        }
    }

    fn flush(&self) -> Result<()> {
        let members = self.members.lock();
        let failures = Self::for_each_member(&members.entries, |sink| sink.flush());
        if failures.is_empty() {
            Ok(())
        } else {
            Err(SinkError::PartialWriteFailure { failures })
        }
    }

    /// Close every member in registration order and detach them, so a second
    /// call has nothing left to close.
    fn close(&self) -> Result<()> {
        let entries = std::mem::take(&mut self.members.lock().entries);
        let failures = Self::for_each_member(&entries, |sink| sink.close());
        if failures.is_empty() {
            Ok(())
        } else {
            Err(SinkError::PartialCloseFailure { failures })
        }
    }
}
