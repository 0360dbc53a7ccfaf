//! In-process session service holding the authoritative state in memory.
//!
//! Applies edits with the core [`Engine`] the way the hosted service does:
//! trims are baked into the clip duration before the state is returned, and
//! rejections come back as the same status codes the HTTP service would
//! send. Used for offline sessions and as the test double for the adapter.

use crate::error::{Result, SyncError};
use crate::service::SessionService;
use crate::wire::*;
use adreel_core::editing::{bake_trim, EditOperations, EditOutcome, Engine, RepositionRequest};
use adreel_core::{CoreError, EngineConfig, TimeUs, TimelineState, TrimRange};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Progress added per status poll of a running export.
const EXPORT_PROGRESS_STEP: f64 = 0.5;

#[derive(Debug)]
struct Inner {
    state: TimelineState,
    exports: HashMap<String, ExportStatus>,
    injected_failure: Option<u16>,
    requests: usize,
}

#[derive(Debug)]
pub struct LocalSessionService {
    session_id: String,
    engine: Engine,
    inner: Mutex<Inner>,
}

impl LocalSessionService {
    pub fn new(config: EngineConfig, initial: TimelineState) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            engine: Engine::new(config),
            inner: Mutex::new(Inner {
                state: initial,
                exports: HashMap::new(),
                injected_failure: None,
                requests: 0,
            }),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Current authoritative state.
    pub fn snapshot(&self) -> TimelineState {
        self.lock().state.clone()
    }

    /// Requests received so far, failed ones included.
    pub fn request_count(&self) -> usize {
        self.lock().requests
    }

    /// Make the next request fail with `status` as a remote error.
    pub fn fail_next(&self, status: u16) {
        self.lock().injected_failure = Some(status);
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Count the request and consume an injected failure.
    fn begin(&self) -> Result<MutexGuard<'_, Inner>> {
        let mut inner = self.lock();
        inner.requests += 1;
        if let Some(status) = inner.injected_failure.take() {
            return Err(SyncError::from_status(status, "injected failure"));
        }
        Ok(inner)
    }
}

/// Rejections from the engine as the remote service reports them.
fn rejected(err: CoreError) -> SyncError {
    match err {
        CoreError::ClipNotFound(id) => SyncError::from_status(404, format!("clip {id} not found")),
        other => SyncError::from_status(400, other.to_string()),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
        .to_string()
}

#[async_trait::async_trait]
impl SessionService for LocalSessionService {
    async fn trim(&self, body: &TrimBody) -> Result<TrimResponse> {
        let mut inner = self.begin()?;
        let range = TrimRange::new(
            TimeUs::from_seconds(body.trim_start),
            TimeUs::from_seconds(body.trim_end),
        );
        let edit = self
            .engine
            .trim(&inner.state, body.clip_id, range)
            .map_err(rejected)?;
        let baked = bake_trim(&edit.state, body.clip_id, self.engine.config()).map_err(rejected)?;
        let duration = baked
            .clip(body.clip_id)
            .map(|c| c.duration_us.as_seconds())
            .unwrap_or_default();
        inner.state = baked;
        Ok(TrimResponse {
            clip_id: body.clip_id,
            duration,
            updated_state: WireState::from(&inner.state),
        })
    }

    async fn split(&self, body: &SplitBody) -> Result<SplitResponse> {
        let mut inner = self.begin()?;
        let edit = self
            .engine
            .split(&inner.state, body.clip_id, TimeUs::from_seconds(body.split_time))
            .map_err(rejected)?;
        let EditOutcome::Split { left, right, .. } = edit.outcome else {
            return Err(SyncError::from_status(500, "split produced no halves"));
        };
        let duration_of = |id: Uuid| {
            edit.state
                .clip(id)
                .map(|c| c.duration_us.as_seconds())
                .unwrap_or_default()
        };
        let durations = [duration_of(left), duration_of(right)];
        inner.state = edit.state;
        Ok(SplitResponse {
            clip_ids: [left, right],
            durations,
            updated_state: WireState::from(&inner.state),
        })
    }

    async fn merge(&self, body: &MergeBody) -> Result<MergeResponse> {
        let mut inner = self.begin()?;
        let edit = self
            .engine
            .merge(&inner.state, &body.clip_ids)
            .map_err(rejected)?;
        let EditOutcome::Merged { merged, .. } = edit.outcome else {
            return Err(SyncError::from_status(500, "merge produced no clip"));
        };
        let duration = edit
            .state
            .clip(merged)
            .map(|c| c.duration_us.as_seconds())
            .unwrap_or_default();
        inner.state = edit.state;
        Ok(MergeResponse {
            merged_clip_id: merged,
            duration,
            updated_state: WireState::from(&inner.state),
        })
    }

    async fn reposition(&self, body: &RepositionBody) -> Result<RepositionResponse> {
        let mut inner = self.begin()?;
        // The client sends an already resolved start; no second snap here.
        let request = RepositionRequest {
            clip_id: body.clip_id,
            track: body.track_index,
            start_us: TimeUs::from_seconds(body.start_time),
            snap: false,
        };
        let edit = self
            .engine
            .reposition(&inner.state, request)
            .map_err(rejected)?;
        let EditOutcome::Repositioned {
            track, start_us, ..
        } = edit.outcome
        else {
            return Err(SyncError::from_status(500, "reposition produced no position"));
        };
        inner.state = edit.state;
        Ok(RepositionResponse {
            clip_id: body.clip_id,
            start_time: start_us.as_seconds(),
            track_index: track,
            updated_state: WireState::from(&inner.state),
        })
    }

    async fn save(&self, body: &SaveBody) -> Result<SaveResponse> {
        let mut inner = self.begin()?;
        if let Some(state) = &body.editing_state {
            inner.state = TimelineState::try_from(state.clone())?;
        }
        Ok(SaveResponse {
            session_id: self.session_id.clone(),
            saved_at: now_unix_seconds(),
            updated_state: Some(WireState::from(&inner.state)),
        })
    }

    async fn export(&self) -> Result<ExportResponse> {
        let mut inner = self.begin()?;
        if inner.state.clips.is_empty() {
            return Err(SyncError::from_status(400, "nothing to export"));
        }
        let export_id = Uuid::new_v4().to_string();
        let estimate = inner.state.total_duration().as_seconds();
        inner.exports.insert(export_id.clone(), ExportStatus::queued());
        Ok(ExportResponse {
            export_id,
            status: ExportState::Queued,
            estimated_time_seconds: Some(estimate),
        })
    }

    async fn export_status(&self, body: &ExportStatusBody) -> Result<ExportStatus> {
        let mut inner = self.begin()?;
        let Some(status) = inner.exports.get_mut(&body.export_id) else {
            return Err(SyncError::from_status(
                404,
                format!("export {} not found", body.export_id),
            ));
        };
        if !status.status.is_terminal() {
            status.progress = (status.progress + EXPORT_PROGRESS_STEP).min(1.0);
            if status.progress >= 1.0 {
                status.status = ExportState::Completed;
                status.current_step = Some("done".into());
                status.eta_seconds = None;
            } else {
                status.status = ExportState::Processing;
                status.current_step = Some("rendering".into());
                status.eta_seconds = Some(1.0 - status.progress);
            }
        }
        Ok(status.clone())
    }
}
