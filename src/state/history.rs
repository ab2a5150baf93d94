/// Undo/redo history
///
/// A capped buffer of snapshots plus a cursor pointing at the snapshot that
/// matches the current draft. New snapshots discard everything after the
/// cursor (the redo branch). When the buffer is full the oldest snapshot is
/// evicted and the cursor is shifted so it keeps pointing at the same
/// snapshot.

use std::collections::VecDeque;

/// Default number of snapshots kept per item
pub const DEFAULT_CAPACITY: usize = 50;

#[derive(Debug, Clone)]
pub struct History<T> {
    entries: VecDeque<T>,
    cursor: usize,
    capacity: usize,
}

impl<T: Clone> History<T> {
    /// Create an empty history. A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            cursor: 0,
            capacity,
        }
    }

    /// Create a history whose first entry is `initial`, so the first edit
    /// can be undone back to it.
    pub fn seeded(initial: T, capacity: usize) -> Self {
        let mut history = Self::new(capacity);
        history.entries.push_back(initial);
        history
    }

    /// Record a new snapshot after the cursor.
    pub fn push(&mut self, snapshot: T) {
        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        self.entries.push_back(snapshot);
        self.cursor = self.entries.len() - 1;

        if self.entries.len() > self.capacity {
            self.entries.pop_front();
            self.cursor -= 1;
        }
    }

    /// Step back one snapshot. Returns `None` at the oldest snapshot.
    pub fn undo(&mut self) -> Option<T> {
        if self.cursor == 0 || self.entries.is_empty() {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor).cloned()
    }

    /// Step forward one snapshot. Returns `None` at the newest snapshot.
    pub fn redo(&mut self) -> Option<T> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor).cloned()
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// Snapshot under the cursor
    pub fn current(&self) -> Option<&T> {
        self.entries.get(self.cursor)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undo_redo_bounds_are_noops() {
        let mut history = History::seeded(0, 10);
        assert_eq!(history.undo(), None);
        assert_eq!(history.redo(), None);

        history.push(1);
        assert_eq!(history.redo(), None);
        assert_eq!(history.undo(), Some(0));
        assert_eq!(history.undo(), None);
        assert_eq!(history.current(), Some(&0));
    }

    #[test]
    fn test_undo_then_redo_restores() {
        let mut history = History::seeded(0, 10);
        for value in 1..=5 {
            history.push(value);
        }

        for _ in 0..3 {
            history.undo();
        }
        assert_eq!(history.current(), Some(&2));

        let mut last = None;
        for _ in 0..3 {
            last = history.redo();
        }
        assert_eq!(last, Some(5));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_push_after_undo_discards_redo_branch() {
        let mut history = History::seeded(0, 10);
        history.push(1);
        history.push(2);
        history.undo();
        history.push(7);

        assert_eq!(history.entries.len(), 3);
        assert!(!history.can_redo());
        assert_eq!(history.undo(), Some(1));
    }

    #[test]
    fn test_overflow_evicts_oldest_and_keeps_cursor_target() {
        let mut history = History::seeded(0, 3);
        history.push(1);
        history.push(2);
        history.push(3);

        assert_eq!(history.entries.len(), 3);
        assert_eq!(history.current(), Some(&3));
        assert_eq!(history.undo(), Some(2));
        assert_eq!(history.undo(), Some(1));
        assert_eq!(history.undo(), None);
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let mut history = History::new(DEFAULT_CAPACITY);
        for value in 0..200 {
            history.push(value);
            assert!(history.entries.len() <= DEFAULT_CAPACITY);
            assert_eq!(history.current(), Some(&value));
        }
        assert_eq!(history.entries.len(), DEFAULT_CAPACITY);
    }

    #[test]
    fn test_zero_capacity_keeps_one_entry() {
        let mut history = History::new(0);
        history.push(1);
        history.push(2);
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.current(), Some(&2));
        assert!(!history.can_undo());
    }
}
