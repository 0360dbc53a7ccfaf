use crate::error::{CoreError, Result};
use std::collections::VecDeque;

/// Snapshot-based undo/redo history over any state shape.
///
/// `present` is the only live value; `past` and `future` hold whole
/// snapshots. Every accepted `set_state` clears `future`.
#[derive(Debug, Clone)]
pub struct History<S> {
    past: VecDeque<S>,
    present: S,
    future: VecDeque<S>,
    max_size: usize,
    replaying: bool,
}

impl<S: Clone + PartialEq> History<S> {
    pub fn new(initial: S, max_size: usize) -> Self {
        Self {
            past: VecDeque::new(),
            present: initial,
            future: VecDeque::new(),
            max_size,
            replaying: false,
        }
    }

    pub fn present(&self) -> &S {
        &self.present
    }

    /// Record `next` as the new present. Returns false when nothing was
    /// recorded: the value equals the present, or a replay is in progress
    /// (in which case only `present` is replaced).
    pub fn set_state(&mut self, next: S) -> bool {
        if self.replaying {
            self.present = next;
            return false;
        }
        if next == self.present {
            return false;
        }
        let previous = std::mem::replace(&mut self.present, next);
        self.past.push_back(previous);
        while self.past.len() > self.max_size {
            self.past.pop_front();
        }
        self.future.clear();
        true
    }

    /// `set_state` with a producer computed from the current present.
    pub fn update(&mut self, producer: impl FnOnce(&S) -> S) -> bool {
        let next = producer(&self.present);
        self.set_state(next)
    }

    /// Run `f` with replay mode on: state writes inside it replace the present
    /// without touching past or future.
    pub fn replay<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let was = std::mem::replace(&mut self.replaying, true);
        let out = f(self);
        self.replaying = was;
        out
    }

    pub fn is_replaying(&self) -> bool {
        self.replaying
    }

    pub fn undo(&mut self) -> Result<&S> {
        let previous = self.past.pop_back().ok_or(CoreError::NothingToUndo)?;
        let current = std::mem::replace(&mut self.present, previous);
        self.future.push_front(current);
        Ok(&self.present)
    }

    pub fn redo(&mut self) -> Result<&S> {
        let next = self.future.pop_front().ok_or(CoreError::NothingToRedo)?;
        let current = std::mem::replace(&mut self.present, next);
        self.past.push_back(current);
        Ok(&self.present)
    }

    /// Replace everything with a fresh present and no history.
    pub fn reset(&mut self, state: S) {
        self.past.clear();
        self.future.clear();
        self.present = state;
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.past.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.future.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // set_state + undo/redo
    // -----------------------------------------------------------------------

    #[test]
    fn set_undo_redo() {
        let mut history = History::new(0, 50);
        assert!(history.set_state(1));
        assert_eq!(*history.present(), 1);

        assert_eq!(*history.undo().unwrap(), 0);
        assert_eq!(*history.redo().unwrap(), 1);
    }

    #[test]
    fn n_undos_restore_initial_and_redos_restore_latest() {
        let mut history = History::new(vec![0], 50);
        for i in 1..=5 {
            history.update(|s| {
                let mut next = s.clone();
                next.push(i);
                next
            });
        }
        for _ in 0..5 {
            history.undo().unwrap();
        }
        assert_eq!(history.present(), &vec![0]);
        for _ in 0..5 {
            history.redo().unwrap();
        }
        assert_eq!(history.present(), &vec![0, 1, 2, 3, 4, 5]);
    }

    // -----------------------------------------------------------------------
    // New state clears redo branch
    // -----------------------------------------------------------------------

    #[test]
    fn new_state_after_undo_clears_future() {
        let mut history = History::new("a", 50);
        history.set_state("b");
        history.set_state("c");
        history.undo().unwrap();
        assert!(history.can_redo());

        history.set_state("d");
        assert!(!history.can_redo());
        assert!(matches!(history.redo(), Err(CoreError::NothingToRedo)));
        assert_eq!(*history.undo().unwrap(), "b");
    }

    // -----------------------------------------------------------------------
    // Equal states do not create entries
    // -----------------------------------------------------------------------

    #[test]
    fn equal_state_is_noop() {
        let mut history = History::new(vec![1, 2], 50);
        assert!(!history.set_state(vec![1, 2]));
        assert!(!history.can_undo());
    }

    // -----------------------------------------------------------------------
    // Empty stacks
    // -----------------------------------------------------------------------

    #[test]
    fn undo_redo_on_empty_leave_state() {
        let mut history = History::new(7, 50);
        assert!(matches!(history.undo(), Err(CoreError::NothingToUndo)));
        assert!(matches!(history.redo(), Err(CoreError::NothingToRedo)));
        assert_eq!(*history.present(), 7);
    }

    // -----------------------------------------------------------------------
    // max_size drops oldest
    // -----------------------------------------------------------------------

    #[test]
    fn max_size_drops_oldest() {
        let mut history = History::new(0, 3);
        for i in 1..=5 {
            history.set_state(i);
        }
        assert_eq!(history.undo_depth(), 3);
        assert_eq!(*history.undo().unwrap(), 4);
        assert_eq!(*history.undo().unwrap(), 3);
        assert_eq!(*history.undo().unwrap(), 2);
        assert!(history.undo().is_err());
    }

    // -----------------------------------------------------------------------
    // Replay mode
    // -----------------------------------------------------------------------

    #[test]
    fn replay_replaces_present_only() {
        let mut history = History::new(0, 50);
        history.set_state(1);
        history.undo().unwrap();

        let recorded = history.replay(|h| h.set_state(10));
        assert!(!recorded);
        assert!(!history.is_replaying());
        assert_eq!(*history.present(), 10);
        assert_eq!(history.undo_depth(), 0);
        assert_eq!(history.redo_depth(), 1);
    }

    // -----------------------------------------------------------------------
    // reset
    // -----------------------------------------------------------------------

    #[test]
    fn reset_clears_both_stacks() {
        let mut history = History::new(0, 50);
        history.set_state(1);
        history.set_state(2);
        history.undo().unwrap();
        history.reset(9);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert_eq!(*history.present(), 9);
    }

    #[test]
    fn can_undo_can_redo_flags() {
        let mut history = History::new(0, 50);
        assert!(!history.can_undo());
        assert!(!history.can_redo());

        history.set_state(1);
        assert!(history.can_undo());
        assert!(!history.can_redo());

        history.undo().unwrap();
        assert!(!history.can_undo());
        assert!(history.can_redo());

        history.redo().unwrap();
        assert!(history.can_undo());
        assert!(!history.can_redo());
    }
}
