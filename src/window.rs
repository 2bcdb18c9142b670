//! Retained point window of a dataset: slide-and-evict, run merge and run collapse.
//!
//! The most recent point of a window is held inline; all older retained points are committed
//! to a [`SlotBuffer`] shared by the successive snapshots of one dataset. Merging a repeated
//! value only replaces the inline point, so it never touches memory that older snapshots
//! read. Pushing commits the previous inline point at the buffer's cursor, which is only done
//! in place by the snapshot that performed the latest commit; any other snapshot forks.

use crate::buffer::{SharedSlotBuffer, SlotBuffer};
use crate::types::Point;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub(crate) struct Window {
    buffer: SharedSlotBuffer,
    /// Buffer generation observed when this window was created, before its own add wrote
    /// to the buffer.
    observed: u64,
    /// Buffer generation `offset` refers to.
    layout: u64,
    /// Buffer write count observed when this window was created.
    writes: u64,
    /// Start of the committed points in the buffer.
    offset: usize,
    /// Number of committed points.
    len: usize,
    tail: Option<Point>,
}

impl Window {
    /// Creates an empty window for `capacity` retained points.
    ///
    /// `capacity` logical slots are doubled for amortized compaction; one of them is the
    /// inline tail, so the buffer itself has `2 * capacity - 1` slots.
    pub(crate) fn new(capacity: usize) -> Self {
        Window {
            buffer: SlotBuffer::shared((2 * capacity).saturating_sub(1)),
            observed: 0,
            layout: 0,
            writes: 0,
            offset: 0,
            len: 0,
            tail: None,
        }
    }

    #[inline]
    pub(crate) fn size(&self) -> usize {
        self.len + usize::from(self.tail.is_some())
    }

    /// Most recent retained point.
    #[inline]
    pub(crate) fn last(&self) -> Option<Point> {
        self.tail
    }

    pub(crate) fn first(&self) -> Option<Point> {
        self.get(0)
    }

    pub(crate) fn get(&self, index: usize) -> Option<Point> {
        if index < self.len {
            SlotBuffer::lock(&self.buffer).get(self.offset + index)
        } else if index == self.len {
            self.tail
        } else {
            None
        }
    }

    /// True once a compaction shifted the buffer slots this window was created against,
    /// including the compaction performed by the add that created it.
    pub(crate) fn is_outdated(&self) -> bool {
        SlotBuffer::lock(&self.buffer).generation() != self.observed
    }

    /// True if the add that created this window compacted its buffer.
    #[inline]
    pub(crate) fn compacted(&self) -> bool {
        self.layout != self.observed
    }

    /// Generation of the buffer this window currently belongs to.
    pub(crate) fn buffer_generation(&self) -> u64 {
        SlotBuffer::lock(&self.buffer).generation()
    }

    /// Copies the retained points out, oldest first.
    pub(crate) fn points(&self) -> Vec<Point> {
        let mut out = Vec::with_capacity(self.size());
        if self.len > 0 {
            SlotBuffer::lock(&self.buffer).copy_range(self.offset, self.len, &mut out);
        }
        out.extend(self.tail);
        out
    }

    /// Appends `point`, evicting the oldest point when `capacity` is already reached.
    pub(crate) fn push(&self, point: Point, capacity: usize) -> Window {
        let Some(last) = self.tail else {
            return self.with_tail(point);
        };
        if self.size() < capacity {
            return self.commit(self.offset, self.len, last, point);
        }
        if self.len == 0 {
            // capacity 1: the inline point itself ages out
            return self.with_tail(point);
        }
        self.commit(self.offset + 1, self.len - 1, last, point)
    }

    /// Replaces the most recent point.
    #[inline]
    pub(crate) fn merge(&self, point: Point) -> Window {
        self.with_tail(point)
    }

    /// Replaces the whole window with the two points `start` and `point`.
    pub(crate) fn collapse(&self, start: Point, point: Point) -> Window {
        if self.len == 1 && self.tail.is_some() && self.get(0) == Some(start) {
            return self.merge(point);
        }
        self.commit(self.offset + self.len, 0, start, point)
    }

    fn with_tail(&self, point: Point) -> Window {
        Window {
            observed: self.layout,
            tail: Some(point),
            ..self.clone()
        }
    }

    /// Commits `committed` behind the range `[offset, offset + len)` and makes `tail` the new
    /// inline point.
    fn commit(&self, offset: usize, len: usize, committed: Point, tail: Point) -> Window {
        let mut buffer = SlotBuffer::lock(&self.buffer);
        let is_head = buffer.generation() == self.layout
            && buffer.writes() == self.writes
            && buffer.cursor() == offset + len;
        if is_head {
            let offset = buffer.append(offset, committed);
            return Window {
                buffer: Arc::clone(&self.buffer),
                observed: self.layout,
                layout: buffer.generation(),
                writes: buffer.writes(),
                offset,
                len: len + 1,
                tail: Some(tail),
            };
        }

        let mut fork = buffer.fork(offset, len);
        drop(buffer);
        let offset = fork.append(0, committed);
        Window {
            observed: fork.generation(),
            layout: fork.generation(),
            writes: fork.writes(),
            buffer: Arc::new(Mutex::new(fork)),
            offset,
            len: len + 1,
            tail: Some(tail),
        }
    }
}
