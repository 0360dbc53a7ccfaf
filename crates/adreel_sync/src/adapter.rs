use crate::error::{Result, SyncError};
use crate::service::SessionService;
use crate::wire::*;
use adreel_core::editing::{EditOperations, EditOutcome, EditRequest, Edit, Engine, RepositionRequest};
use adreel_core::{Editor, History, TimeUs, TimelineState, TrimRange};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::watch;
use uuid::Uuid;

/// When local history advances for a remote edit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitPolicy {
    /// Only once the service has confirmed the edit.
    #[default]
    Confirmed,
    /// Immediately with the local result; withdrawn if the request fails.
    Optimistic,
}

/// Keeps a local [`Editor`] in step with a remote editing session.
///
/// Every edit is validated locally first and never sent when it fails. A
/// confirmed response replaces the local state wholesale with the service's
/// authoritative copy. Failed requests are not retried.
///
/// Mutations take `&mut self`, so one adapter has at most one request in
/// flight.
pub struct SessionSync<S, E = Engine> {
    service: S,
    editor: Editor<E>,
    policy: CommitPolicy,
    poll_interval: Duration,
    expired: bool,
    closed: bool,
}

impl<S: SessionService, E: EditOperations> SessionSync<S, E> {
    pub fn new(service: S, editor: Editor<E>) -> Self {
        Self {
            service,
            editor,
            policy: CommitPolicy::default(),
            poll_interval: Duration::from_secs(2),
            expired: false,
            closed: false,
        }
    }

    pub fn with_policy(mut self, policy: CommitPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn editor(&self) -> &Editor<E> {
        &self.editor
    }

    pub fn state(&self) -> &TimelineState {
        self.editor.state()
    }

    pub fn policy(&self) -> CommitPolicy {
        self.policy
    }

    /// True once the service has reported expired credentials. The session
    /// must be rebuilt after re-authenticating.
    pub fn is_expired(&self) -> bool {
        self.expired
    }

    pub fn close(&mut self) {
        self.closed = true;
    }

    // -----------------------------------------------------------------------
    // Edits
    // -----------------------------------------------------------------------

    pub async fn trim(&mut self, clip_id: Uuid, range: TrimRange) -> Result<EditOutcome> {
        self.apply(&EditRequest::Trim { clip_id, range }).await
    }

    pub async fn split(&mut self, clip_id: Uuid, at_us: TimeUs) -> Result<EditOutcome> {
        self.apply(&EditRequest::Split { clip_id, at_us }).await
    }

    pub async fn merge(&mut self, clip_ids: &[Uuid]) -> Result<EditOutcome> {
        self.apply(&EditRequest::Merge {
            clip_ids: clip_ids.to_vec(),
        })
        .await
    }

    pub async fn reposition(&mut self, request: RepositionRequest) -> Result<EditOutcome> {
        self.apply(&EditRequest::Reposition(request)).await
    }

    pub async fn apply(&mut self, request: &EditRequest) -> Result<EditOutcome> {
        self.ensure_active()?;

        let local = match self.editor.ops().apply(self.editor.state(), request) {
            Ok(edit) => edit,
            Err(err) => {
                tracing::debug!("edit rejected locally: {}", err);
                return Err(SyncError::ValidationRejected(err));
            }
        };

        let checkpoint = match self.policy {
            CommitPolicy::Optimistic => {
                let checkpoint = self.editor.history().clone();
                self.editor.commit(local.state.clone());
                Some(checkpoint)
            }
            CommitPolicy::Confirmed => None,
        };

        match self.send(request, &local).await {
            Ok((state, outcome)) => {
                if checkpoint.is_some() {
                    // Swap in the authoritative copy without a second entry.
                    self.editor.history_mut().replay(|h| h.set_state(state));
                } else {
                    self.editor.commit(state);
                }
                tracing::info!(outcome = ?outcome, "edit confirmed");
                Ok(outcome)
            }
            Err(err) => {
                if let Some(checkpoint) = checkpoint {
                    // Restores present, undo and redo stacks as they were.
                    *self.editor.history_mut() = checkpoint;
                }
                self.note_failure(&err);
                Err(err)
            }
        }
    }

    async fn send(
        &self,
        request: &EditRequest,
        local: &Edit,
    ) -> Result<(TimelineState, EditOutcome)> {
        match request {
            EditRequest::Trim { clip_id, range } => {
                let resp = self
                    .service
                    .trim(&TrimBody {
                        clip_id: *clip_id,
                        trim_start: range.trim_start_us.as_seconds(),
                        trim_end: range.trim_end_us.as_seconds(),
                    })
                    .await?;
                let outcome = EditOutcome::Trimmed {
                    clip_id: resp.clip_id,
                    range: *range,
                };
                Ok((TimelineState::try_from(resp.updated_state)?, outcome))
            }
            EditRequest::Split { clip_id, at_us } => {
                let resp = self
                    .service
                    .split(&SplitBody {
                        clip_id: *clip_id,
                        split_time: at_us.as_seconds(),
                    })
                    .await?;
                let [left, right] = resp.clip_ids;
                let outcome = EditOutcome::Split {
                    original: *clip_id,
                    left,
                    right,
                };
                Ok((TimelineState::try_from(resp.updated_state)?, outcome))
            }
            EditRequest::Merge { clip_ids } => {
                let removed = match &local.outcome {
                    EditOutcome::Merged { removed, .. } => removed.clone(),
                    _ => clip_ids.clone(),
                };
                let resp = self
                    .service
                    .merge(&MergeBody {
                        clip_ids: removed.clone(),
                    })
                    .await?;
                let outcome = EditOutcome::Merged {
                    removed,
                    merged: resp.merged_clip_id,
                };
                Ok((TimelineState::try_from(resp.updated_state)?, outcome))
            }
            EditRequest::Reposition(req) => {
                // Send the locally resolved (snapped) position.
                let (track, start_us) = match local.outcome {
                    EditOutcome::Repositioned {
                        track, start_us, ..
                    } => (track, start_us),
                    _ => (req.track, req.start_us),
                };
                let resp = self
                    .service
                    .reposition(&RepositionBody {
                        clip_id: req.clip_id,
                        start_time: start_us.as_seconds(),
                        track_index: track,
                    })
                    .await?;
                let outcome = EditOutcome::Repositioned {
                    clip_id: resp.clip_id,
                    track: resp.track_index,
                    start_us: TimeUs::from_seconds(resp.start_time),
                };
                Ok((TimelineState::try_from(resp.updated_state)?, outcome))
            }
        }
    }

    // -----------------------------------------------------------------------
    // History
    // -----------------------------------------------------------------------

    /// Step back through history and push the restored state to the session,
    /// so the next confirmed edit builds on it. When the push fails the step
    /// is taken back and local state is unchanged.
    pub async fn undo(&mut self) -> Result<&TimelineState> {
        self.ensure_active()?;
        let checkpoint = self.editor.history().clone();
        self.editor.undo()?;
        self.push_step(checkpoint).await
    }

    pub async fn redo(&mut self) -> Result<&TimelineState> {
        self.ensure_active()?;
        let checkpoint = self.editor.history().clone();
        self.editor.redo()?;
        self.push_step(checkpoint).await
    }

    pub fn can_undo(&self) -> bool {
        self.editor.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.editor.can_redo()
    }

    // -----------------------------------------------------------------------
    // Session lifecycle
    // -----------------------------------------------------------------------

    /// Save the session. With `include_state` the local state is sent as
    /// the editing state to persist.
    pub async fn save(&mut self, include_state: bool) -> Result<SaveResponse> {
        self.ensure_active()?;
        let body = SaveBody {
            editing_state: include_state.then(|| WireState::from(self.editor.state())),
        };
        match self.service.save(&body).await {
            Ok(resp) => {
                if let Some(state) = resp.updated_state.clone() {
                    match TimelineState::try_from(state) {
                        Ok(state) => self.reconcile(state),
                        Err(err) => {
                            self.note_failure(&err);
                            return Err(err);
                        }
                    }
                }
                tracing::info!("session {} saved at {}", resp.session_id, resp.saved_at);
                Ok(resp)
            }
            Err(err) => {
                self.note_failure(&err);
                Err(err)
            }
        }
    }

    pub async fn export(&mut self) -> Result<ExportResponse> {
        self.ensure_active()?;
        match self.service.export().await {
            Ok(resp) => {
                tracing::info!("export {} {:?}", resp.export_id, resp.status);
                Ok(resp)
            }
            Err(err) => {
                self.note_failure(&err);
                Err(err)
            }
        }
    }

    pub async fn export_status(&mut self, export_id: &str) -> Result<ExportStatus> {
        self.ensure_active()?;
        let body = ExportStatusBody {
            export_id: export_id.to_string(),
        };
        match self.service.export_status(&body).await {
            Ok(status) => Ok(status),
            Err(err) => {
                self.note_failure(&err);
                Err(err)
            }
        }
    }

    /// Poll an export until it completes or fails, publishing every status on
    /// `progress_tx`. A failed export is returned as `Ok` with
    /// [`ExportState::Failed`]; only request errors are `Err`.
    pub async fn wait_for_export(
        &mut self,
        export_id: &str,
        progress_tx: watch::Sender<ExportStatus>,
    ) -> Result<ExportStatus> {
        loop {
            let status = self.export_status(export_id).await?;
            tracing::info!(
                "export {}: {:?} {:.0}%",
                export_id,
                status.status,
                status.progress * 100.0
            );
            let _ = progress_tx.send(status.clone());
            if status.status.is_terminal() {
                return Ok(status);
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Save the present after a history step. An echoed state replaces the
    /// present in place so the undo and redo stacks survive. On failure the
    /// history goes back to `checkpoint`.
    async fn push_step(
        &mut self,
        checkpoint: History<TimelineState>,
    ) -> Result<&TimelineState> {
        match self.save_present().await {
            Ok(session_id) => {
                tracing::debug!("history step saved to session {}", session_id);
                Ok(self.editor.state())
            }
            Err(err) => {
                *self.editor.history_mut() = checkpoint;
                self.note_failure(&err);
                Err(err)
            }
        }
    }

    async fn save_present(&mut self) -> Result<String> {
        let body = SaveBody {
            editing_state: Some(WireState::from(self.editor.state())),
        };
        let resp = self.service.save(&body).await?;
        if let Some(state) = resp.updated_state {
            let state = TimelineState::try_from(state)?;
            self.editor.history_mut().replay(|h| h.set_state(state));
        }
        Ok(resp.session_id)
    }

    fn ensure_active(&self) -> Result<()> {
        if self.closed {
            return Err(SyncError::SessionClosed);
        }
        if self.expired {
            return Err(SyncError::AuthExpired);
        }
        Ok(())
    }

    fn note_failure(&mut self, err: &SyncError) {
        if err.requires_reauth() {
            tracing::warn!("session expired, re-authentication required");
            self.expired = true;
        } else {
            tracing::warn!("session request failed: {}", err);
        }
    }

    /// Adopt a service state that is not the result of a local edit.
    fn reconcile(&mut self, state: TimelineState) {
        if self.editor.commit(state) {
            tracing::debug!("local state replaced by session state");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
