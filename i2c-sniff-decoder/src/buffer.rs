//! Fixed-capacity circular transaction store
//!
//! Slots are allocated once and overwritten in place. The cursor is the
//! index of the slot being (or about to be) filled.

use crate::types::Transaction;

pub struct TransactionBuffer {
    slots: Vec<Transaction>,
    cursor: usize,
}

impl TransactionBuffer {
    /// Allocate `capacity` slots of `max_bytes` byte entries each
    pub fn new(capacity: usize, max_bytes: usize) -> Self {
        Self {
            slots: (0..capacity)
                .map(|_| Transaction::with_capacity(max_bytes))
                .collect(),
            cursor: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn get(&self, index: usize) -> Option<&Transaction> {
        self.slots.get(index)
    }

    pub(crate) fn at_mut(&mut self, index: usize) -> &mut Transaction {
        let index = index % self.slots.len();
        &mut self.slots[index]
    }

    /// Slot under the cursor
    pub(crate) fn current_mut(&mut self) -> &mut Transaction {
        let cursor = self.cursor;
        &mut self.slots[cursor]
    }

    /// Move the cursor forward one slot, wrapping at capacity
    pub(crate) fn advance(&mut self) -> usize {
        self.cursor = (self.cursor + 1) % self.slots.len();
        self.cursor
    }

    pub(crate) fn rewind(&mut self) {
        self.cursor = 0;
    }

    /// Swap slot `index` into slot 0 and point the cursor at it
    pub(crate) fn move_to_front(&mut self, index: usize) {
        let len = self.slots.len();
        self.slots.swap(0, index % len);
        self.cursor = 0;
    }

    /// Owned, trimmed copies of the first `count` slots
    pub(crate) fn snapshot_prefix(&self, count: usize) -> Vec<Transaction> {
        self.slots
            .iter()
            .take(count)
            .map(Transaction::snapshot)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preallocates_slots() {
        let buffer = TransactionBuffer::new(32, 128);
        assert_eq!(buffer.capacity(), 32);
        assert_eq!(buffer.cursor(), 0);
        assert_eq!(buffer.get(31).map(|t| t.bytes.len()), Some(128));
        assert!(buffer.get(32).is_none());
    }

    #[test]
    fn test_advance_wraps_at_capacity() {
        let mut buffer = TransactionBuffer::new(4, 2);
        assert_eq!(buffer.advance(), 1);
        assert_eq!(buffer.advance(), 2);
        assert_eq!(buffer.advance(), 3);
        assert_eq!(buffer.advance(), 0);
    }

    #[test]
    fn test_snapshot_prefix() {
        let mut buffer = TransactionBuffer::new(4, 8);
        buffer.current_mut().length = 1;
        buffer.advance();
        buffer.current_mut().length = 2;
        buffer.current_mut().stop = true;

        let prefix = buffer.snapshot_prefix(2);
        assert_eq!(prefix.len(), 2);
        assert_eq!(prefix[0].bytes.len(), 1);
        assert_eq!(prefix[1].bytes.len(), 2);
        assert!(prefix[1].stop);

        buffer.rewind();
        assert_eq!(buffer.cursor(), 0);
    }

    #[test]
    fn test_move_to_front() {
        let mut buffer = TransactionBuffer::new(4, 2);
        buffer.at_mut(2).length = 1;
        buffer.advance();
        buffer.advance();

        buffer.move_to_front(2);
        assert_eq!(buffer.cursor(), 0);
        assert_eq!(buffer.get(0).map(|t| t.length), Some(1));
        assert_eq!(buffer.get(2).map(|t| t.length), Some(0));
    }
}
