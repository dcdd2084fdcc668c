//! The data model (`Snapshot`) and the columnar projection of a sequence of
//! snapshots into six named streams.
//!
//! A [`Snapshot`] is `(timestamp, items)`; [`StreamBuffers`] accumulates the
//! columnar projection as snapshots are fed in, and hands out fixed-size
//! slices for the block builder to encode.

use std::collections::VecDeque;

use crate::error::{GicsError, Result};

/// One item's fields within a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Item {
    pub price: i64,
    pub quantity: i64,
}

/// A single timestamped snapshot: a timestamp plus an insertion-ordered set
/// of `(item_id, Item)` pairs. Keys are unique within a snapshot; decode-side
/// equality is by item id, not by insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub timestamp: i64,
    pub items: Vec<(u32, Item)>,
}

impl Snapshot {
    pub fn new(timestamp: i64) -> Self {
        Snapshot {
            timestamp,
            items: Vec::new(),
        }
    }

    pub fn push(&mut self, item_id: u32, price: i64, quantity: i64) {
        self.items.push((item_id, Item { price, quantity }));
    }

    /// Two snapshots are logically equivalent when their timestamps match
    /// and their item maps match irrespective of insertion order.
    pub fn logically_eq(&self, other: &Snapshot) -> bool {
        if self.timestamp != other.timestamp || self.items.len() != other.items.len() {
            return false;
        }
        let mut a: Vec<_> = self.items.clone();
        let mut b: Vec<_> = other.items.clone();
        a.sort_by_key(|(id, _)| *id);
        b.sort_by_key(|(id, _)| *id);
        a == b
    }
}

/// Identifies one of the six columnar streams. Discriminants are the wire
/// values stored in a block header's `stream_id` byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StreamId {
    Time = 10,
    Value = 20,
    /// Reserved for the schema/generic field-extension framing hook; this
    /// engine never produces META blocks itself.
    Meta = 30,
    ItemId = 40,
    Quantity = 50,
    SnapshotLen = 60,
}

impl StreamId {
    pub fn from_u8(byte: u8) -> Result<Self> {
        match byte {
            10 => Ok(StreamId::Time),
            20 => Ok(StreamId::Value),
            30 => Ok(StreamId::Meta),
            40 => Ok(StreamId::ItemId),
            50 => Ok(StreamId::Quantity),
            60 => Ok(StreamId::SnapshotLen),
            other => Err(GicsError::incomplete(format!("unknown stream id {other}"))),
        }
    }

    /// Fixed flush order per segment boundary.
    pub const FLUSH_ORDER: [StreamId; 5] = [
        StreamId::Time,
        StreamId::SnapshotLen,
        StreamId::ItemId,
        StreamId::Value,
        StreamId::Quantity,
    ];
}

/// Accumulates the columnar projection of a sequence of snapshots.
#[derive(Debug, Default)]
pub struct StreamBuffers {
    pub time: VecDeque<i64>,
    pub snapshot_len: VecDeque<i64>,
    pub item_id: VecDeque<i64>,
    pub value: VecDeque<i64>,
    pub quantity: VecDeque<i64>,
}

impl StreamBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Project one snapshot's fields onto the six buffers.
    pub fn push_snapshot(&mut self, snapshot: &Snapshot) {
        self.time.push_back(snapshot.timestamp);
        self.snapshot_len.push_back(snapshot.items.len() as i64);
        for &(item_id, item) in &snapshot.items {
            self.item_id.push_back(item_id as i64);
            self.value.push_back(item.price);
            self.quantity.push_back(item.quantity);
        }
    }

    /// Number of buffered items for `stream`.
    pub fn buffered(&self, stream: StreamId) -> usize {
        self.queue(stream).len()
    }

    fn queue(&self, stream: StreamId) -> &VecDeque<i64> {
        match stream {
            StreamId::Time => &self.time,
            StreamId::SnapshotLen => &self.snapshot_len,
            StreamId::ItemId => &self.item_id,
            StreamId::Value => &self.value,
            StreamId::Quantity => &self.quantity,
            StreamId::Meta => unreachable!("META stream is never buffered"),
        }
    }

    fn queue_mut(&mut self, stream: StreamId) -> &mut VecDeque<i64> {
        match stream {
            StreamId::Time => &mut self.time,
            StreamId::SnapshotLen => &mut self.snapshot_len,
            StreamId::ItemId => &mut self.item_id,
            StreamId::Value => &mut self.value,
            StreamId::Quantity => &mut self.quantity,
            StreamId::Meta => unreachable!("META stream is never buffered"),
        }
    }

    /// Drain up to `max` items from the front of `stream`'s buffer.
    pub fn drain_up_to(&mut self, stream: StreamId, max: usize) -> Vec<i64> {
        let q = self.queue_mut(stream);
        let n = q.len().min(max);
        q.drain(..n).collect()
    }

    /// `true` once every buffer is empty (nothing left to flush).
    pub fn is_empty(&self) -> bool {
        StreamId::FLUSH_ORDER.iter().all(|&s| self.buffered(s) == 0)
    }
}
