use crate::types::Point;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

// Type alias for the physical buffer of a single dataset, protected by a Mutex.
// Arc lets successive snapshots of the same dataset share one buffer.
pub(crate) type SharedSlotBuffer = Arc<Mutex<SlotBuffer>>;

/// Reusable physical storage behind the committed points of a dataset window.
///
/// Points are appended at a write cursor. When the cursor reaches the end of the slots, the
/// most recent half is shifted to the front and the generation advances, which invalidates
/// the slot offsets recorded by every snapshot taken before the shift.
#[derive(Debug)]
pub(crate) struct SlotBuffer {
    slots: Box<[Point]>,
    cursor: usize,
    generation: u64,
    /// Total number of appends; identifies the snapshot that may keep appending in place.
    writes: u64,
}

impl SlotBuffer {
    /// Creates a buffer with room for `slots` committed points (at least one).
    pub(crate) fn new(slots: usize) -> Self {
        SlotBuffer {
            slots: vec![Point::default(); slots.max(1)].into_boxed_slice(),
            cursor: 0,
            generation: 0,
            writes: 0,
        }
    }

    pub(crate) fn shared(slots: usize) -> SharedSlotBuffer {
        Arc::new(Mutex::new(SlotBuffer::new(slots)))
    }

    /// Locks the buffer. Nothing panics while the lock is held, so a poisoned lock still
    /// guards consistent data and is recovered instead of propagated.
    pub(crate) fn lock(buffer: &SharedSlotBuffer) -> MutexGuard<'_, SlotBuffer> {
        buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[inline]
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    pub(crate) fn writes(&self) -> u64 {
        self.writes
    }

    #[inline]
    pub(crate) fn cursor(&self) -> usize {
        self.cursor
    }

    #[cfg(test)]
    pub(crate) fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Copies `len` slots starting at `offset`, clamped to the physical bounds.
    pub(crate) fn copy_range(&self, offset: usize, len: usize, out: &mut Vec<Point>) {
        let start = offset.min(self.slots.len());
        let end = offset.saturating_add(len).min(self.slots.len());
        out.extend_from_slice(&self.slots[start..end]);
    }

    pub(crate) fn get(&self, index: usize) -> Option<Point> {
        self.slots.get(index).copied()
    }

    /// Starts a private buffer of the same size holding a copy of `[offset, offset + len)`.
    pub(crate) fn fork(&self, offset: usize, len: usize) -> SlotBuffer {
        let mut fresh = SlotBuffer::new(self.slots.len());
        let mut copied = Vec::with_capacity(len);
        self.copy_range(offset, len, &mut copied);
        fresh.slots[..copied.len()].copy_from_slice(&copied);
        fresh.cursor = copied.len();
        fresh
    }

    /// Appends `point` directly behind the committed range `[offset, cursor)` and returns the
    /// (possibly relocated) offset of that range, which has grown by one.
    ///
    /// The caller's range must end at the cursor and be no longer than half the slots.
    pub(crate) fn append(&mut self, offset: usize, point: Point) -> usize {
        let mut offset = offset;
        if self.cursor >= self.slots.len() {
            let keep = self.slots.len() / 2;
            let from = self.cursor - keep;
            self.slots.copy_within(from..self.cursor, 0);
            offset = offset.saturating_sub(from);
            self.cursor = keep;
            self.generation += 1;
        }
        self.slots[self.cursor] = point;
        self.cursor += 1;
        self.writes += 1;
        offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(buffer: &SlotBuffer, offset: usize, len: usize) -> Vec<i64> {
        let mut out = Vec::new();
        buffer.copy_range(offset, len, &mut out);
        out.into_iter().map(|p| p.value).collect()
    }

    #[test]
    fn test_append_until_compaction() {
        let mut buffer = SlotBuffer::new(5);
        let mut offset = 0;
        for i in 0..5 {
            offset = buffer.append(offset, Point::new(i, i));
        }
        assert_eq!(buffer.cursor(), 5);
        assert_eq!(buffer.generation(), 0);
        assert_eq!(values(&buffer, 0, 5), vec![0, 1, 2, 3, 4]);

        // Range [3, 5) is still alive when the sixth point arrives.
        let offset = buffer.append(3, Point::new(5, 5));
        assert_eq!(buffer.generation(), 1);
        assert_eq!(offset, 0);
        assert_eq!(buffer.cursor(), 3);
        assert_eq!(values(&buffer, offset, 3), vec![3, 4, 5]);
        assert_eq!(buffer.writes(), 6);
    }

    #[test]
    fn test_append_empty_range_at_full_cursor() {
        let mut buffer = SlotBuffer::new(3);
        for i in 0..3 {
            buffer.append(i as usize, Point::new(i, i));
        }
        let offset = buffer.append(3, Point::new(9, 9));
        assert_eq!(buffer.generation(), 1);
        assert_eq!(offset, 1);
        assert_eq!(values(&buffer, offset, 1), vec![9]);
    }

    #[test]
    fn test_fork_copies_only_the_range() {
        let mut buffer = SlotBuffer::new(5);
        for i in 0..4 {
            buffer.append(0, Point::new(i, i * 10));
        }
        let fork = buffer.fork(1, 2);
        assert_eq!(fork.cursor(), 2);
        assert_eq!(fork.generation(), 0);
        assert_eq!(fork.writes(), 0);
        assert_eq!(fork.slot_count(), 5);
        assert_eq!(values(&fork, 0, 2), vec![10, 20]);
    }

    #[test]
    fn test_copy_range_is_clamped() {
        let buffer = SlotBuffer::new(2);
        let mut out = Vec::new();
        buffer.copy_range(1, 10, &mut out);
        assert_eq!(out.len(), 1);
        buffer.copy_range(7, 3, &mut out);
        assert_eq!(out.len(), 1);
    }
}
