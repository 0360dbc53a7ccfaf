//! Projection of clips onto the canvas. Recomputed on every render, never
//! stored.

use crate::config::EngineConfig;
use crate::coords::Scale;
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipPosition {
    pub clip_id: Uuid,
    pub x: f64,
    pub width: f64,
    pub track_index: usize,
    pub effective_start: TimeUs,
    pub effective_end: TimeUs,
}

impl ClipPosition {
    pub fn y(&self, track_height: f64) -> f64 {
        self.track_index as f64 * track_height
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn contains(&self, px: f64, py: f64, track_height: f64) -> bool {
        let top = self.y(track_height);
        px >= self.x && px < self.right() && py >= top && py < top + track_height
    }

    /// Rectangle intersection against `[x0, x1] x [y0, y1]`.
    pub fn intersects(&self, rect: &Rect, track_height: f64) -> bool {
        let top = self.y(track_height);
        self.x <= rect.max_x
            && self.right() >= rect.min_x
            && top <= rect.max_y
            && top + track_height >= rect.min_y
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Rect {
    /// Normalized rectangle spanned by two corners in any order.
    pub fn from_corners(a: (f64, f64), b: (f64, f64)) -> Self {
        Self {
            min_x: a.0.min(b.0),
            min_y: a.1.min(b.1),
            max_x: a.0.max(b.0),
            max_y: a.1.max(b.1),
        }
    }
}

/// Lay out every clip. `preview` overrides take precedence over the
/// overrides stored in the state (live drag position).
pub fn compute_positions(
    state: &TimelineState,
    preview: &BTreeMap<Uuid, TimeUs>,
    scale: Scale,
    config: &EngineConfig,
) -> Vec<ClipPosition> {
    let mut positions: Vec<ClipPosition> = state
        .clips
        .iter()
        .map(|clip| {
            let start = preview
                .get(&clip.id)
                .copied()
                .unwrap_or_else(|| state.effective_start(clip));
            ClipPosition {
                clip_id: clip.id,
                x: scale.to_pixels(start),
                width: scale
                    .to_pixels(clip.duration_us)
                    .max(config.min_clip_width_px),
                track_index: state.track_of(clip),
                effective_start: start,
                effective_end: start + clip.duration_us,
            }
        })
        .collect();
    // Stable sort: equal starts keep array order.
    positions.sort_by_key(|p| p.effective_start);
    positions
}

/// Positions grouped per track, each track ordered by start.
pub fn positions_by_track(positions: &[ClipPosition]) -> BTreeMap<usize, Vec<&ClipPosition>> {
    let mut tracks: BTreeMap<usize, Vec<&ClipPosition>> = BTreeMap::new();
    for p in positions {
        tracks.entry(p.track_index).or_default().push(p);
    }
    tracks
}

/// Topmost clip under a canvas point.
pub fn hit_test(positions: &[ClipPosition], x: f64, y: f64, track_height: f64) -> Option<Uuid> {
    positions
        .iter()
        .rev()
        .find(|p| p.contains(x, y, track_height))
        .map(|p| p.clip_id)
}

/// Track lane under a vertical canvas offset, clamped to the available lanes.
pub fn track_at(y: f64, track_height: f64, lanes: usize) -> usize {
    let raw = (y / track_height).floor();
    if raw <= 0.0 {
        0
    } else {
        (raw as usize).min(lanes.saturating_sub(1))
    }
}
