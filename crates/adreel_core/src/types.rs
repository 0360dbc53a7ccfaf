use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, Div, Mul, Sub};
use std::path::PathBuf;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// TimeUs
// ---------------------------------------------------------------------------

#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub struct TimeUs(pub i64);

impl TimeUs {
    pub const ZERO: Self = Self(0);

    /// Rounds to the nearest microsecond so that values such as `0.3` land on
    /// `300_000` rather than one microsecond short.
    pub fn from_seconds(s: f64) -> Self {
        Self((s * 1_000_000.0).round() as i64)
    }

    pub fn as_seconds(&self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    pub fn abs_diff(self, other: Self) -> Self {
        Self((self.0 - other.0).abs())
    }
}

impl Add for TimeUs {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for TimeUs {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Mul<i64> for TimeUs {
    type Output = Self;
    fn mul(self, rhs: i64) -> Self {
        Self(self.0 * rhs)
    }
}

impl Div<i64> for TimeUs {
    type Output = Self;
    fn div(self, rhs: i64) -> Self {
        Self(self.0 / rhs)
    }
}

impl fmt::Display for TimeUs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_us = self.0.unsigned_abs();
        let total_ms = total_us / 1_000;
        let ms = total_ms % 1_000;
        let total_secs = total_ms / 1_000;
        let secs = total_secs % 60;
        let total_mins = total_secs / 60;
        let mins = total_mins % 60;
        let hours = total_mins / 60;
        if self.0 < 0 {
            write!(f, "-{:02}:{:02}:{:02}.{:03}", hours, mins, secs, ms)
        } else {
            write!(f, "{:02}:{:02}:{:02}.{:03}", hours, mins, secs, ms)
        }
    }
}

// ---------------------------------------------------------------------------
// Clip
// ---------------------------------------------------------------------------

/// A contiguous segment of source video placed on the timeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Clip {
    pub id: Uuid,
    pub source_path: PathBuf,
    pub scene_number: u32,
    /// Offset into the source media where this clip begins.
    #[serde(default)]
    pub source_in_us: TimeUs,
    pub timeline_start_us: TimeUs,
    pub duration_us: TimeUs,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_overlay: Option<serde_json::Value>,
}

impl Clip {
    pub fn new(
        source_path: impl Into<PathBuf>,
        scene_number: u32,
        timeline_start_us: TimeUs,
        duration_us: TimeUs,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_path: source_path.into(),
            scene_number,
            source_in_us: TimeUs::ZERO,
            timeline_start_us,
            duration_us,
            thumbnail: None,
            text_overlay: None,
        }
    }

    pub fn timeline_end_us(&self) -> TimeUs {
        self.timeline_start_us + self.duration_us
    }

    /// Track used when no explicit assignment exists.
    pub fn default_track(&self) -> usize {
        self.scene_number.saturating_sub(1) as usize
    }
}

// ---------------------------------------------------------------------------
// TrimRange
// ---------------------------------------------------------------------------

/// Pending in/out points relative to the clip start, not yet folded into the
/// clip's duration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrimRange {
    pub trim_start_us: TimeUs,
    pub trim_end_us: TimeUs,
}

impl TrimRange {
    pub fn new(trim_start_us: TimeUs, trim_end_us: TimeUs) -> Self {
        Self {
            trim_start_us,
            trim_end_us,
        }
    }

    /// The untrimmed range of a clip.
    pub fn full(clip: &Clip) -> Self {
        Self::new(TimeUs::ZERO, clip.duration_us)
    }

    pub fn duration_us(&self) -> TimeUs {
        self.trim_end_us - self.trim_start_us
    }
}

// ---------------------------------------------------------------------------
// TimelineState
// ---------------------------------------------------------------------------

/// The committed editing state. Replaced wholesale on every edit.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TimelineState {
    pub clips: Vec<Clip>,
    #[serde(default)]
    pub track_assignments: BTreeMap<Uuid, usize>,
    #[serde(default)]
    pub position_overrides: BTreeMap<Uuid, TimeUs>,
    #[serde(default)]
    pub trim_state: BTreeMap<Uuid, TrimRange>,
}

impl TimelineState {
    pub fn new(clips: Vec<Clip>) -> Self {
        Self {
            clips,
            ..Self::default()
        }
    }

    pub fn clip(&self, clip_id: Uuid) -> Option<&Clip> {
        self.clips.iter().find(|c| c.id == clip_id)
    }

    pub fn clip_index(&self, clip_id: Uuid) -> Option<usize> {
        self.clips.iter().position(|c| c.id == clip_id)
    }

    pub fn track_of(&self, clip: &Clip) -> usize {
        self.track_assignments
            .get(&clip.id)
            .copied()
            .unwrap_or_else(|| clip.default_track())
    }

    /// Start time used for display: the override while one exists, the
    /// committed start otherwise.
    pub fn effective_start(&self, clip: &Clip) -> TimeUs {
        self.position_overrides
            .get(&clip.id)
            .copied()
            .unwrap_or(clip.timeline_start_us)
    }

    pub fn trim_range(&self, clip: &Clip) -> TrimRange {
        self.trim_state
            .get(&clip.id)
            .copied()
            .unwrap_or_else(|| TrimRange::full(clip))
    }

    /// Number of tracks holding at least the highest-indexed clip.
    pub fn occupied_track_count(&self) -> usize {
        self.clips
            .iter()
            .map(|c| self.track_of(c) + 1)
            .max()
            .unwrap_or(0)
    }

    /// Lanes available as drop targets: every occupied track plus one spare.
    pub fn lane_count(&self) -> usize {
        self.occupied_track_count() + 1
    }

    /// End of the furthest clip on the committed timeline.
    pub fn total_duration(&self) -> TimeUs {
        self.clips
            .iter()
            .map(|c| c.timeline_end_us())
            .max()
            .unwrap_or(TimeUs::ZERO)
    }

    /// Clips ordered by committed start, ties kept in array order.
    pub fn clips_by_start(&self) -> Vec<&Clip> {
        let mut sorted: Vec<&Clip> = self.clips.iter().collect();
        sorted.sort_by_key(|c| c.timeline_start_us);
        sorted
    }

    /// Drop every per-clip entry that refers to a clip no longer present.
    pub(crate) fn forget(&mut self, clip_id: Uuid) {
        self.track_assignments.remove(&clip_id);
        self.position_overrides.remove(&clip_id);
        self.trim_state.remove(&clip_id);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
