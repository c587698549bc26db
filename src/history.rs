//! Undo/redo over whole-document snapshots
//!
//! History is a linear list of snapshots plus a cursor. Committing drops
//! everything after the cursor, so redo is lost once a new edit is made.
//! Snapshots are cheap when `T` shares structure on clone (see
//! [`LayerStack`](crate::layers::LayerStack)).

/// Snapshot history with a cursor. Never empty; `0 <= index < len`.
#[derive(Debug, Clone)]
pub struct History<T: Clone> {
    snapshots: Vec<T>,
    index: usize,
}

impl<T: Clone> History<T> {
    /// A history holding only `initial`.
    pub fn new(initial: T) -> Self {
        Self { snapshots: vec![initial], index: 0 }
    }

    /// Record `state` as the newest entry, discarding any redo branch.
    pub fn commit(&mut self, state: T) {
        self.snapshots.truncate(self.index + 1);
        self.snapshots.push(state);
        self.index = self.snapshots.len() - 1;
    }

    /// Step back one entry, returning the snapshot to restore.
    pub fn undo(&mut self) -> Option<&T> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        Some(&self.snapshots[self.index])
    }

    /// Step forward one entry, returning the snapshot to restore.
    pub fn redo(&mut self) -> Option<&T> {
        if self.index + 1 >= self.snapshots.len() {
            return None;
        }
        self.index += 1;
        Some(&self.snapshots[self.index])
    }

    #[cfg(test)]
    fn current(&self) -> &T {
        &self.snapshots[self.index]
    }

    /// Forget everything and start over from `state`.
    pub fn reset(&mut self, state: T) {
        self.snapshots.clear();
        self.snapshots.push(state);
        self.index = 0;
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Always false; kept for symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.snapshots.len()
    }
}
