use crate::config::EngineConfig;
use crate::editing::{EditOperations, EditOutcome, EditRequest, Engine, RepositionRequest};
use crate::error::Result;
use crate::history::History;
use crate::types::*;
use uuid::Uuid;

/// Local editing session: an edit surface plus the history that owns the
/// committed state. Each successful edit records exactly one entry.
#[derive(Debug, Clone)]
pub struct Editor<E = Engine> {
    ops: E,
    history: History<TimelineState>,
}

impl Editor<Engine> {
    pub fn with_config(config: EngineConfig, initial: TimelineState) -> Self {
        let limit = config.history_limit;
        Self::new(Engine::new(config), initial, limit)
    }
}

impl<E: EditOperations> Editor<E> {
    pub fn new(ops: E, initial: TimelineState, history_limit: usize) -> Self {
        Self {
            ops,
            history: History::new(initial, history_limit),
        }
    }

    pub fn ops(&self) -> &E {
        &self.ops
    }

    pub fn state(&self) -> &TimelineState {
        self.history.present()
    }

    pub fn history(&self) -> &History<TimelineState> {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut History<TimelineState> {
        &mut self.history
    }

    /// Validate and commit one edit. A rejected edit leaves the state and the
    /// history untouched.
    pub fn apply(&mut self, request: &EditRequest) -> Result<EditOutcome> {
        let edit = self.ops.apply(self.history.present(), request)?;
        self.history.set_state(edit.state);
        Ok(edit.outcome)
    }

    pub fn trim(&mut self, clip_id: Uuid, range: TrimRange) -> Result<EditOutcome> {
        self.apply(&EditRequest::Trim { clip_id, range })
    }

    pub fn split(&mut self, clip_id: Uuid, at_us: TimeUs) -> Result<EditOutcome> {
        self.apply(&EditRequest::Split { clip_id, at_us })
    }

    pub fn merge(&mut self, clip_ids: &[Uuid]) -> Result<EditOutcome> {
        self.apply(&EditRequest::Merge {
            clip_ids: clip_ids.to_vec(),
        })
    }

    pub fn reposition(&mut self, request: RepositionRequest) -> Result<EditOutcome> {
        self.apply(&EditRequest::Reposition(request))
    }

    /// Install an externally produced state (e.g. from the session service)
    /// as a new history entry.
    pub fn commit(&mut self, state: TimelineState) -> bool {
        self.history.set_state(state)
    }

    pub fn undo(&mut self) -> Result<&TimelineState> {
        self.history.undo()
    }

    pub fn redo(&mut self) -> Result<&TimelineState> {
        self.history.redo()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }
}
