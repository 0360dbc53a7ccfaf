use crate::config::EngineConfig;
use crate::error::{CoreError, Result};
use crate::snapping::resolve_drop;
use crate::types::*;
use crate::validate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A drop produced by dragging a clip. `snap` is false while the
/// fine-control modifier is held.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RepositionRequest {
    pub clip_id: Uuid,
    pub track: usize,
    pub start_us: TimeUs,
    pub snap: bool,
}

/// One user-level edit, in the shape it is scripted and sent to the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditRequest {
    Trim { clip_id: Uuid, range: TrimRange },
    Split { clip_id: Uuid, at_us: TimeUs },
    Merge { clip_ids: Vec<Uuid> },
    Reposition(RepositionRequest),
}

/// What an edit did, for callers that need the ids it created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EditOutcome {
    Trimmed {
        clip_id: Uuid,
        range: TrimRange,
    },
    Split {
        original: Uuid,
        left: Uuid,
        right: Uuid,
    },
    Merged {
        removed: Vec<Uuid>,
        merged: Uuid,
    },
    Repositioned {
        clip_id: Uuid,
        track: usize,
        start_us: TimeUs,
    },
}

/// A validated replacement for the committed state.
#[derive(Debug, Clone, PartialEq)]
pub struct Edit {
    pub state: TimelineState,
    pub outcome: EditOutcome,
}

/// The four timeline mutations. Implementations never touch the input
/// state; they return a full replacement or a rejection.
pub trait EditOperations {
    fn trim(&self, state: &TimelineState, clip_id: Uuid, range: TrimRange) -> Result<Edit>;

    /// `at_us` is relative to the clip start. A pending trim on the clip is
    /// dropped; the halves start untrimmed.
    fn split(&self, state: &TimelineState, clip_id: Uuid, at_us: TimeUs) -> Result<Edit>;

    fn merge(&self, state: &TimelineState, clip_ids: &[Uuid]) -> Result<Edit>;

    fn reposition(&self, state: &TimelineState, request: RepositionRequest) -> Result<Edit>;

    fn apply(&self, state: &TimelineState, request: &EditRequest) -> Result<Edit> {
        match request {
            EditRequest::Trim { clip_id, range } => self.trim(state, *clip_id, *range),
            EditRequest::Split { clip_id, at_us } => self.split(state, *clip_id, *at_us),
            EditRequest::Merge { clip_ids } => self.merge(state, clip_ids),
            EditRequest::Reposition(request) => self.reposition(state, *request),
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl EditOperations for Engine {
    /// Records the pending in/out points. Duration and timeline bounds stay as
    /// they are until the session confirms the trim.
    fn trim(&self, state: &TimelineState, clip_id: Uuid, range: TrimRange) -> Result<Edit> {
        let clip = state.clip(clip_id).ok_or(CoreError::ClipNotFound(clip_id))?;
        validate::validate_trim(clip, range, &self.config)?;

        let mut next = state.clone();
        next.trim_state.insert(clip_id, range);
        Ok(Edit {
            state: next,
            outcome: EditOutcome::Trimmed { clip_id, range },
        })
    }

    fn split(&self, state: &TimelineState, clip_id: Uuid, at_us: TimeUs) -> Result<Edit> {
        let index = state
            .clip_index(clip_id)
            .ok_or(CoreError::ClipNotFound(clip_id))?;
        let original = &state.clips[index];
        validate::validate_split(original, at_us, &self.config)?;

        let left = Clip {
            id: Uuid::new_v4(),
            duration_us: at_us,
            ..original.clone()
        };
        let right = Clip {
            id: Uuid::new_v4(),
            source_in_us: original.source_in_us + at_us,
            timeline_start_us: original.timeline_start_us + at_us,
            duration_us: original.duration_us - at_us,
            ..original.clone()
        };
        let (left_id, right_id) = (left.id, right.id);

        let mut next = state.clone();
        let explicit_track = next.track_assignments.get(&clip_id).copied();
        next.forget(clip_id);
        if let Some(track) = explicit_track {
            next.track_assignments.insert(left_id, track);
            next.track_assignments.insert(right_id, track);
        }
        next.clips[index] = left;
        next.clips.insert(index + 1, right);

        Ok(Edit {
            state: next,
            outcome: EditOutcome::Split {
                original: clip_id,
                left: left_id,
                right: right_id,
            },
        })
    }

    fn merge(&self, state: &TimelineState, clip_ids: &[Uuid]) -> Result<Edit> {
        let ordered = validate::validate_merge(state, clip_ids, &self.config)?;
        let earliest = ordered[0];
        let span_start = earliest.timeline_start_us;
        let span_end = ordered
            .iter()
            .map(|c| c.timeline_end_us())
            .fold(span_start, TimeUs::max);

        let merged = Clip {
            id: Uuid::new_v4(),
            timeline_start_us: span_start,
            duration_us: span_end - span_start,
            ..earliest.clone()
        };
        let merged_id = merged.id;
        let earliest_id = earliest.id;
        let removed: Vec<Uuid> = ordered.iter().map(|c| c.id).collect();
        let explicit_track = state.track_assignments.get(&earliest_id).copied();

        let mut next = state.clone();
        let mut merged = Some(merged);
        next.clips = state
            .clips
            .iter()
            .filter_map(|c| {
                if c.id == earliest_id {
                    merged.take()
                } else if removed.contains(&c.id) {
                    None
                } else {
                    Some(c.clone())
                }
            })
            .collect();
        for id in &removed {
            next.forget(*id);
        }
        if let Some(track) = explicit_track {
            next.track_assignments.insert(merged_id, track);
        }

        Ok(Edit {
            state: next,
            outcome: EditOutcome::Merged {
                removed,
                merged: merged_id,
            },
        })
    }

    /// Commits a drop: snaps the start (unless disabled), records the track
    /// and clears any pending position override for the clip.
    fn reposition(&self, state: &TimelineState, request: RepositionRequest) -> Result<Edit> {
        let start = resolve_drop(
            request.start_us,
            self.config.snap_interval_us,
            request.snap,
        );
        validate::validate_reposition(state, request.clip_id, request.track, start, &self.config)?;

        let mut next = state.clone();
        if let Some(clip) = next.clips.iter_mut().find(|c| c.id == request.clip_id) {
            clip.timeline_start_us = start;
        }
        next.track_assignments.insert(request.clip_id, request.track);
        next.position_overrides.remove(&request.clip_id);

        Ok(Edit {
            state: next,
            outcome: EditOutcome::Repositioned {
                clip_id: request.clip_id,
                track: request.track,
                start_us: start,
            },
        })
    }
}

/// Fold a clip's pending trim into its duration and source offset. The clip
/// keeps its timeline start. A clip without a pending trim is returned
/// unchanged.
pub fn bake_trim(
    state: &TimelineState,
    clip_id: Uuid,
    config: &EngineConfig,
) -> Result<TimelineState> {
    let index = state
        .clip_index(clip_id)
        .ok_or(CoreError::ClipNotFound(clip_id))?;
    let Some(range) = state.trim_state.get(&clip_id).copied() else {
        return Ok(state.clone());
    };
    validate::validate_trim(&state.clips[index], range, config)?;

    let mut next = state.clone();
    let clip = &mut next.clips[index];
    clip.source_in_us = clip.source_in_us + range.trim_start_us;
    clip.duration_us = range.duration_us();
    next.trim_state.remove(&clip_id);
    Ok(next)
}
