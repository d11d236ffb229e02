//! Outbound column notifications.
//!
//! The render path reports each column transition to a [`ColumnSink`]. The
//! realtime sink is the producer half of a bounded SPSC ring: pushing never
//! blocks or allocates, and a full ring silently drops the event.

use ringbuf::traits::Producer;
use ringbuf::HeapProd;
use serde::Serialize;

/// `{"type":"column","column":n}` on the wire.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename = "column")]
pub struct ColumnEvent {
    pub column: u32,
}

impl ColumnEvent {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{{\"type\":\"column\",\"column\":{}}}", self.column))
    }
}

/// Receiver of column-change events, called from the render path.
pub trait ColumnSink {
    fn column_changed(&mut self, event: ColumnEvent);
}

impl ColumnSink for HeapProd<ColumnEvent> {
    #[inline]
    fn column_changed(&mut self, event: ColumnEvent) {
        let _ = self.try_push(event);
    }
}

/// Collects every event. Allocates; offline rendering and tests only.
impl ColumnSink for Vec<ColumnEvent> {
    fn column_changed(&mut self, event: ColumnEvent) {
        self.push(event);
    }
}

/// Drops every event.
#[derive(Copy, Clone, Debug, Default)]
pub struct Discard;

impl ColumnSink for Discard {
    #[inline]
    fn column_changed(&mut self, _: ColumnEvent) {}
}
