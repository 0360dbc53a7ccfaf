//! Request and response bodies exchanged with the session service.
//!
//! The service speaks camelCase JSON with times in seconds. Everything is
//! converted to and from microsecond [`TimeUs`] at this boundary.

use crate::error::{Result, SyncError};
use adreel_core::types::{Clip, TimeUs, TimelineState, TrimRange};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Timeline state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireClip {
    pub id: Uuid,
    pub source_path: PathBuf,
    pub scene_number: u32,
    #[serde(default)]
    pub source_in: f64,
    pub timeline_start: f64,
    /// Derived from start and duration on the way in.
    #[serde(default)]
    pub timeline_end: f64,
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_overlay: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTrim {
    pub trim_start: f64,
    pub trim_end: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireState {
    pub clips: Vec<WireClip>,
    #[serde(default)]
    pub track_assignments: BTreeMap<Uuid, usize>,
    #[serde(default)]
    pub position_overrides: BTreeMap<Uuid, f64>,
    #[serde(default)]
    pub trim_state: BTreeMap<Uuid, WireTrim>,
}

impl From<&Clip> for WireClip {
    fn from(clip: &Clip) -> Self {
        Self {
            id: clip.id,
            source_path: clip.source_path.clone(),
            scene_number: clip.scene_number,
            source_in: clip.source_in_us.as_seconds(),
            timeline_start: clip.timeline_start_us.as_seconds(),
            timeline_end: clip.timeline_end_us().as_seconds(),
            duration: clip.duration_us.as_seconds(),
            thumbnail: clip.thumbnail.clone(),
            text_overlay: clip.text_overlay.clone(),
        }
    }
}

impl From<WireClip> for Clip {
    fn from(wire: WireClip) -> Self {
        Clip {
            id: wire.id,
            source_path: wire.source_path,
            scene_number: wire.scene_number,
            source_in_us: TimeUs::from_seconds(wire.source_in),
            timeline_start_us: TimeUs::from_seconds(wire.timeline_start),
            duration_us: TimeUs::from_seconds(wire.duration),
            thumbnail: wire.thumbnail,
            text_overlay: wire.text_overlay,
        }
    }
}

impl From<TrimRange> for WireTrim {
    fn from(range: TrimRange) -> Self {
        Self {
            trim_start: range.trim_start_us.as_seconds(),
            trim_end: range.trim_end_us.as_seconds(),
        }
    }
}

impl From<WireTrim> for TrimRange {
    fn from(wire: WireTrim) -> Self {
        TrimRange::new(
            TimeUs::from_seconds(wire.trim_start),
            TimeUs::from_seconds(wire.trim_end),
        )
    }
}

impl From<&TimelineState> for WireState {
    fn from(state: &TimelineState) -> Self {
        Self {
            clips: state.clips.iter().map(WireClip::from).collect(),
            track_assignments: state.track_assignments.clone(),
            position_overrides: state
                .position_overrides
                .iter()
                .map(|(id, t)| (*id, t.as_seconds()))
                .collect(),
            trim_state: state
                .trim_state
                .iter()
                .map(|(id, r)| (*id, WireTrim::from(*r)))
                .collect(),
        }
    }
}

/// States from the service pass the structural checks before they are
/// adopted. A state that fails them is a malformed response.
impl TryFrom<WireState> for TimelineState {
    type Error = SyncError;

    fn try_from(wire: WireState) -> Result<Self> {
        let state = TimelineState {
            clips: wire.clips.into_iter().map(Clip::from).collect(),
            track_assignments: wire.track_assignments,
            position_overrides: wire
                .position_overrides
                .into_iter()
                .map(|(id, s)| (id, TimeUs::from_seconds(s)))
                .collect(),
            trim_state: wire
                .trim_state
                .into_iter()
                .map(|(id, t)| (id, TrimRange::from(t)))
                .collect(),
        };
        state
            .check_integrity()
            .map_err(SyncError::malformed_response)?;
        Ok(state)
    }
}

// ---------------------------------------------------------------------------
// Edit requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrimBody {
    pub clip_id: Uuid,
    pub trim_start: f64,
    pub trim_end: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitBody {
    pub clip_id: Uuid,
    /// Seconds from the clip start.
    pub split_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeBody {
    pub clip_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositionBody {
    pub clip_id: Uuid,
    pub start_time: f64,
    pub track_index: usize,
}

// ---------------------------------------------------------------------------
// Edit responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrimResponse {
    pub clip_id: Uuid,
    pub duration: f64,
    pub updated_state: WireState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitResponse {
    /// Left half first.
    pub clip_ids: [Uuid; 2],
    pub durations: [f64; 2],
    pub updated_state: WireState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeResponse {
    pub merged_clip_id: Uuid,
    pub duration: f64,
    pub updated_state: WireState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositionResponse {
    pub clip_id: Uuid,
    pub start_time: f64,
    pub track_index: usize,
    pub updated_state: WireState,
}

// ---------------------------------------------------------------------------
// Session lifecycle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editing_state: Option<WireState>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResponse {
    pub session_id: String,
    pub saved_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_state: Option<WireState>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportState {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl ExportState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExportState::Completed | ExportState::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResponse {
    pub export_id: String,
    pub status: ExportState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time_seconds: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportStatusBody {
    pub export_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportStatus {
    pub status: ExportState,
    /// 0.0 to 1.0
    pub progress: f64,
    #[serde(default)]
    pub current_step: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta_seconds: Option<f64>,
}

impl ExportStatus {
    pub fn queued() -> Self {
        Self {
            status: ExportState::Queued,
            progress: 0.0,
            current_step: None,
            eta_seconds: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_converts_to_seconds_and_back() {
        let mut clip = Clip::new("scene_1.mp4", 1, TimeUs(1_250_000), TimeUs(3_000_000));
        clip.source_in_us = TimeUs(400_000);
        let mut state = TimelineState::new(vec![clip.clone()]);
        state.track_assignments.insert(clip.id, 2);
        state.position_overrides.insert(clip.id, TimeUs(9_500_000));
        state
            .trim_state
            .insert(clip.id, TrimRange::new(TimeUs(100_000), TimeUs(2_900_000)));

        let wire = WireState::from(&state);
        assert_eq!(wire.clips[0].timeline_start, 1.25);
        assert_eq!(wire.clips[0].timeline_end, 4.25);
        assert_eq!(wire.position_overrides[&clip.id], 9.5);

        assert_eq!(TimelineState::try_from(wire).unwrap(), state);
    }

    #[test]
    fn broken_service_state_is_rejected() {
        let clip = Clip::new("a.mp4", 1, TimeUs(0), TimeUs(2_000_000));
        let mut wire = WireState::from(&TimelineState::new(vec![clip]));
        wire.clips.push(wire.clips[0].clone());

        let err = TimelineState::try_from(wire).unwrap_err();
        assert!(matches!(err, SyncError::InvalidRequest(_)));
    }

    #[test]
    fn json_is_camel_case() {
        let clip = Clip::new("a.mp4", 3, TimeUs(0), TimeUs(2_000_000));
        let json = serde_json::to_value(WireClip::from(&clip)).unwrap();
        assert_eq!(json["sceneNumber"], 3);
        assert_eq!(json["timelineEnd"], 2.0);

        let body = RepositionBody {
            clip_id: clip.id,
            start_time: 1.5,
            track_index: 1,
        };
        let json = serde_json::to_value(body).unwrap();
        assert_eq!(json["startTime"], 1.5);
        assert_eq!(json["trackIndex"], 1);
    }

    #[test]
    fn incoming_clip_end_is_ignored() {
        let id = Uuid::new_v4();
        let json = serde_json::json!({
            "id": id,
            "sourcePath": "b.mp4",
            "sceneNumber": 1,
            "timelineStart": 2.0,
            "timelineEnd": 99.0,
            "duration": 3.0
        });
        let wire: WireClip = serde_json::from_value(json).unwrap();
        let clip = Clip::from(wire);
        assert_eq!(clip.timeline_end_us(), TimeUs(5_000_000));
    }

    #[test]
    fn export_status_parses() {
        let status: ExportStatus = serde_json::from_str(
            r#"{"status":"processing","progress":0.4,"currentStep":"encoding","etaSeconds":12}"#,
        )
        .unwrap();
        assert_eq!(status.status, ExportState::Processing);
        assert!(!status.status.is_terminal());
        assert_eq!(status.current_step.as_deref(), Some("encoding"));
    }
}
