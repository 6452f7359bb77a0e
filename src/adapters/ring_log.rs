//! In-memory event log for the status page.
//!
//! [`RingLogSink`] forwards every event to an inner sink (normally the
//! serial [`LogEventSink`](super::log_sink::LogEventSink)) and keeps the
//! most recent [`MAX_LOG_ENTRIES`] as human-readable lines, each tagged
//! with a uuid and the wall-clock time.  Oldest entries are evicted first.

use heapless::Deque;
use serde::Serialize;

use crate::app::events::BridgeEvent;
use crate::app::ports::{Clock, EventSink};

pub const MAX_LOG_ENTRIES: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub uuid: String,
    /// Unix seconds, 0 before time sync.
    pub timestamp: u64,
    pub message: String,
}

#[derive(Serialize)]
struct LogsDoc<'a> {
    logs: Vec<&'a LogEntry>,
}

pub struct RingLogSink<S, C> {
    inner: S,
    clock: C,
    entries: Deque<LogEntry, MAX_LOG_ENTRIES>,
}

impl<S: EventSink, C: Clock> RingLogSink<S, C> {
    pub fn new(inner: S, clock: C) -> Self {
        Self {
            inner,
            clock,
            entries: Deque::new(),
        }
    }

    /// Append a free-form line.
    pub fn record(&mut self, message: String) {
        if self.entries.is_full() {
            self.entries.pop_front();
        }
        let entry = LogEntry {
            uuid: uuid::Uuid::new_v4().to_string(),
            timestamp: self.clock.unix_secs(),
            message,
        };
        // Cannot fail: a slot was freed above.
        let _ = self.entries.push_back(entry);
    }

    /// Oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// `{"logs":[{"uuid":..,"timestamp":..,"message":..},...]}`, oldest first.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&LogsDoc {
            logs: self.entries.iter().collect(),
        })
    }
}

impl<S: EventSink, C: Clock> EventSink for RingLogSink<S, C> {
    fn emit(&mut self, event: &BridgeEvent) {
        self.inner.emit(event);
        self.record(event.to_string());
    }
}
