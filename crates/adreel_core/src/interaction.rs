//! Pointer gesture state machine for the timeline canvas.
//!
//! The controller turns pointer down/move/up events into [`Intent`]s. It owns
//! only transient interaction state (gesture, selection, drag preview,
//! pending trim) and never writes into [`TimelineState`]; callers feed the
//! intents to an editor.
//!
//! Pointer coordinates are canvas content coordinates: `x` already includes
//! horizontal scroll, `y` is measured from the top of the first track.

use crate::config::EngineConfig;
use crate::coords::{Scale, ZoomLevel};
use crate::editing::{EditRequest, RepositionRequest};
use crate::layout::{self, ClipPosition, Rect};
use crate::types::*;
use crate::validate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub meta: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        meta: false,
        alt: false,
    };

    /// Ctrl on Linux/Windows, Cmd on macOS.
    pub fn toggles_selection(&self) -> bool {
        self.ctrl || self.meta
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pointer {
    pub x: f64,
    pub y: f64,
    pub modifiers: Modifiers,
}

impl Pointer {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    fn distance_to(&self, origin: (f64, f64)) -> f64 {
        ((self.x - origin.0).powi(2) + (self.y - origin.1).powi(2)).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrimHandle {
    Start,
    End,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    Idle,
    Seeking,
    SelectingBox {
        origin: (f64, f64),
        current: (f64, f64),
    },
    /// Pressed on a clip body but not yet past the drag threshold.
    PressedClip {
        clip_id: Uuid,
        origin: (f64, f64),
        grab_offset_px: f64,
    },
    DraggingClip {
        clip_id: Uuid,
        grab_offset_px: f64,
        track: usize,
        start_us: TimeUs,
    },
    DraggingTrimHandle {
        clip_id: Uuid,
        handle: TrimHandle,
        range: TrimRange,
        valid: bool,
    },
}

/// What the caller should do in response to a pointer event.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Seek(TimeUs),
    SelectionChanged(Vec<Uuid>),
    DragPreview {
        clip_id: Uuid,
        track: usize,
        start_us: TimeUs,
    },
    Drop(RepositionRequest),
    TrimPreview {
        clip_id: Uuid,
        range: TrimRange,
        valid: bool,
    },
    /// The handle was released; `range` waits for an explicit confirm.
    TrimPending {
        clip_id: Uuid,
        range: TrimRange,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitIndicator {
    pub clip_id: Uuid,
    /// Relative to the clip start.
    pub at_us: TimeUs,
    pub x: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandleRect {
    pub handle: TrimHandle,
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl HandleRect {
    fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y < self.max_y
    }
}

#[derive(Debug, Clone)]
pub struct InteractionController {
    config: EngineConfig,
    zoom: ZoomLevel,
    gesture: Gesture,
    selection: Vec<Uuid>,
    playhead: TimeUs,
    split_mode: bool,
    pending_trim: Option<(Uuid, TrimRange)>,
    preview: BTreeMap<Uuid, TimeUs>,
}

impl InteractionController {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            zoom: ZoomLevel::initial(&config),
            config,
            gesture: Gesture::Idle,
            selection: Vec::new(),
            playhead: TimeUs::ZERO,
            split_mode: false,
            pending_trim: None,
            preview: BTreeMap::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn selection(&self) -> &[Uuid] {
        &self.selection
    }

    pub fn playhead(&self) -> TimeUs {
        self.playhead
    }

    pub fn zoom(&self) -> f64 {
        self.zoom.value()
    }

    pub fn scale(&self) -> Scale {
        Scale::from_config(&self.config, self.zoom.value())
    }

    pub fn pending_trim(&self) -> Option<(Uuid, TrimRange)> {
        self.pending_trim
    }

    pub fn split_mode(&self) -> bool {
        self.split_mode
    }

    /// Live drag positions, layered over the committed state when laying out.
    pub fn preview_overrides(&self) -> &BTreeMap<Uuid, TimeUs> {
        &self.preview
    }

    pub fn positions(&self, state: &TimelineState) -> Vec<ClipPosition> {
        layout::compute_positions(state, &self.preview, self.scale(), &self.config)
    }

    // -----------------------------------------------------------------------
    // Playhead, zoom, modes
    // -----------------------------------------------------------------------

    pub fn set_playhead(&mut self, time: TimeUs) {
        self.playhead = time.max(TimeUs::ZERO);
    }

    pub fn set_split_mode(&mut self, on: bool) {
        self.split_mode = on;
    }

    pub fn zoom_in(&mut self) {
        self.zoom.zoom_in(&self.config);
    }

    pub fn zoom_out(&mut self) {
        self.zoom.zoom_out(&self.config);
    }

    pub fn on_wheel(&mut self, delta_y: f64, modifiers: Modifiers) -> bool {
        self.zoom
            .on_wheel(delta_y, modifiers.toggles_selection(), &self.config)
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    pub fn select_only(&mut self, clip_id: Uuid) {
        self.selection = vec![clip_id];
    }

    pub fn toggle_selected(&mut self, clip_id: Uuid) {
        if let Some(pos) = self.selection.iter().position(|id| *id == clip_id) {
            self.selection.remove(pos);
        } else {
            self.selection.push(clip_id);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// The clip trim handles and the split indicator apply to.
    pub fn single_selected(&self) -> Option<Uuid> {
        match self.selection.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    /// Forget selected ids and pending trims for clips that no longer exist,
    /// e.g. after a split or merge replaced them.
    pub fn sync_with(&mut self, state: &TimelineState) {
        self.selection.retain(|id| state.clip(*id).is_some());
        if let Some((clip_id, _)) = self.pending_trim {
            if state.clip(clip_id).is_none() {
                self.pending_trim = None;
            }
        }
        self.preview.retain(|id, _| state.clip(*id).is_some());
    }

    // -----------------------------------------------------------------------
    // Pointer events
    // -----------------------------------------------------------------------

    pub fn pointer_down(&mut self, state: &TimelineState, pointer: Pointer) -> Option<Intent> {
        self.sync_with(state);
        let positions = self.positions(state);

        if let Some((clip_id, handle, range)) = self.handle_at(state, &positions, pointer) {
            self.gesture = Gesture::DraggingTrimHandle {
                clip_id,
                handle,
                range,
                valid: true,
            };
            return None;
        }

        let track_height = self.config.track_height_px;
        if let Some(clip_id) = layout::hit_test(&positions, pointer.x, pointer.y, track_height) {
            let clip_x = positions
                .iter()
                .find(|p| p.clip_id == clip_id)
                .map(|p| p.x)
                .unwrap_or(pointer.x);
            self.gesture = Gesture::PressedClip {
                clip_id,
                origin: (pointer.x, pointer.y),
                grab_offset_px: pointer.x - clip_x,
            };
            return None;
        }

        if pointer.modifiers.shift {
            self.gesture = Gesture::SelectingBox {
                origin: (pointer.x, pointer.y),
                current: (pointer.x, pointer.y),
            };
            return None;
        }

        self.gesture = Gesture::Seeking;
        Some(self.seek_to(pointer.x))
    }

    pub fn pointer_move(&mut self, state: &TimelineState, pointer: Pointer) -> Option<Intent> {
        match self.gesture.clone() {
            Gesture::Idle => None,
            Gesture::Seeking => Some(self.seek_to(pointer.x)),
            Gesture::SelectingBox { origin, .. } => {
                self.gesture = Gesture::SelectingBox {
                    origin,
                    current: (pointer.x, pointer.y),
                };
                let rect = Rect::from_corners(origin, (pointer.x, pointer.y));
                let hits: Vec<Uuid> = self
                    .positions(state)
                    .iter()
                    .filter(|p| p.intersects(&rect, self.config.track_height_px))
                    .map(|p| p.clip_id)
                    .collect();
                if hits == self.selection {
                    None
                } else {
                    self.selection = hits;
                    Some(Intent::SelectionChanged(self.selection.clone()))
                }
            }
            Gesture::PressedClip {
                clip_id,
                origin,
                grab_offset_px,
            } => {
                if pointer.distance_to(origin) <= self.config.drag_threshold_px {
                    return None;
                }
                Some(self.drag_clip(state, clip_id, grab_offset_px, pointer))
            }
            Gesture::DraggingClip {
                clip_id,
                grab_offset_px,
                ..
            } => Some(self.drag_clip(state, clip_id, grab_offset_px, pointer)),
            Gesture::DraggingTrimHandle {
                clip_id, handle, range, ..
            } => self.drag_trim_handle(state, clip_id, handle, range, pointer),
        }
    }

    pub fn pointer_up(&mut self, state: &TimelineState, pointer: Pointer) -> Option<Intent> {
        let gesture = std::mem::replace(&mut self.gesture, Gesture::Idle);
        match gesture {
            Gesture::Idle | Gesture::Seeking => None,
            Gesture::SelectingBox { .. } => {
                Some(Intent::SelectionChanged(self.selection.clone()))
            }
            Gesture::PressedClip { clip_id, .. } => {
                if pointer.modifiers.toggles_selection() {
                    self.toggle_selected(clip_id);
                } else {
                    self.select_only(clip_id);
                }
                Some(Intent::SelectionChanged(self.selection.clone()))
            }
            Gesture::DraggingClip {
                clip_id,
                track,
                start_us,
                ..
            } => {
                self.preview.remove(&clip_id);
                Some(Intent::Drop(RepositionRequest {
                    clip_id,
                    track,
                    start_us,
                    snap: !pointer.modifiers.alt,
                }))
            }
            Gesture::DraggingTrimHandle { clip_id, range, .. } => {
                let clip = state.clip(clip_id)?;
                if !validate::is_valid_trim(clip, range, &self.config) {
                    return None;
                }
                self.pending_trim = Some((clip_id, range));
                Some(Intent::TrimPending { clip_id, range })
            }
        }
    }

    /// Abort the current gesture and drop any drag preview.
    pub fn cancel(&mut self) {
        self.gesture = Gesture::Idle;
        self.preview.clear();
    }

    // -----------------------------------------------------------------------
    // Edit requests derived from interaction state
    // -----------------------------------------------------------------------

    /// Take the pending trim as an edit to commit.
    pub fn confirm_trim(&mut self) -> Option<EditRequest> {
        self.pending_trim
            .take()
            .map(|(clip_id, range)| EditRequest::Trim { clip_id, range })
    }

    pub fn discard_trim(&mut self) {
        self.pending_trim = None;
    }

    /// Split point under the playhead, shown only when the split is valid.
    pub fn split_indicator(&self, state: &TimelineState) -> Option<SplitIndicator> {
        if !self.split_mode {
            return None;
        }
        let clip = state.clip(self.single_selected()?)?;
        let at_us = self.playhead - state.effective_start(clip);
        if !validate::is_valid_split(clip, at_us, &self.config) {
            return None;
        }
        Some(SplitIndicator {
            clip_id: clip.id,
            at_us,
            x: self.scale().to_pixels(self.playhead),
        })
    }

    pub fn split_request(&self, state: &TimelineState) -> Option<EditRequest> {
        self.split_indicator(state)
            .map(|ind| EditRequest::Split {
                clip_id: ind.clip_id,
                at_us: ind.at_us,
            })
    }

    pub fn can_merge(&self, state: &TimelineState) -> bool {
        self.selection.len() >= 2 && validate::is_valid_merge(state, &self.selection, &self.config)
    }

    pub fn merge_request(&self, state: &TimelineState) -> Option<EditRequest> {
        self.can_merge(state).then(|| EditRequest::Merge {
            clip_ids: self.selection.clone(),
        })
    }

    /// Trim handle rectangles for the single selected clip.
    pub fn trim_handles(&self, state: &TimelineState) -> Vec<HandleRect> {
        let positions = self.positions(state);
        self.handle_rects(state, &positions)
            .map(|(_, rects)| rects.to_vec())
            .unwrap_or_default()
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn seek_to(&mut self, x: f64) -> Intent {
        self.set_playhead(self.scale().to_time(x));
        Intent::Seek(self.playhead)
    }

    fn drag_clip(
        &mut self,
        state: &TimelineState,
        clip_id: Uuid,
        grab_offset_px: f64,
        pointer: Pointer,
    ) -> Intent {
        let track = layout::track_at(pointer.y, self.config.track_height_px, state.lane_count());
        let start_us = self
            .scale()
            .to_time(pointer.x - grab_offset_px)
            .max(TimeUs::ZERO);
        self.preview.insert(clip_id, start_us);
        self.gesture = Gesture::DraggingClip {
            clip_id,
            grab_offset_px,
            track,
            start_us,
        };
        Intent::DragPreview {
            clip_id,
            track,
            start_us,
        }
    }

    fn drag_trim_handle(
        &mut self,
        state: &TimelineState,
        clip_id: Uuid,
        handle: TrimHandle,
        range: TrimRange,
        pointer: Pointer,
    ) -> Option<Intent> {
        let clip = state.clip(clip_id)?;
        let clip_x = self.scale().to_pixels(state.effective_start(clip));
        let candidate = self.scale().to_time(pointer.x - clip_x);

        let (raw, clamped) = match handle {
            TrimHandle::Start => (
                TrimRange::new(candidate, range.trim_end_us),
                TrimRange::new(
                    validate::clamp_trim_start(candidate, range, &self.config),
                    range.trim_end_us,
                ),
            ),
            TrimHandle::End => (
                TrimRange::new(range.trim_start_us, candidate),
                TrimRange::new(
                    range.trim_start_us,
                    validate::clamp_trim_end(candidate, range, clip.duration_us, &self.config),
                ),
            ),
        };
        // The handle shows red while the pointer asks for more than the clamp allows.
        let valid = validate::is_valid_trim(clip, raw, &self.config);

        self.gesture = Gesture::DraggingTrimHandle {
            clip_id,
            handle,
            range: clamped,
            valid,
        };
        Some(Intent::TrimPreview {
            clip_id,
            range: clamped,
            valid,
        })
    }

    fn handle_rects(
        &self,
        state: &TimelineState,
        positions: &[ClipPosition],
    ) -> Option<(Uuid, [HandleRect; 2])> {
        let clip_id = self.single_selected()?;
        let clip = state.clip(clip_id)?;
        let pos = positions.iter().find(|p| p.clip_id == clip_id)?;
        let range = self.current_trim(state, clip);

        let scale = self.scale();
        let half = self.config.trim_handle_width_px / 2.0;
        let top = pos.y(self.config.track_height_px);
        let bottom = top + self.config.track_height_px;
        let rect = |handle, at: TimeUs| {
            let cx = pos.x + scale.to_pixels(at);
            HandleRect {
                handle,
                min_x: cx - half,
                max_x: cx + half,
                min_y: top,
                max_y: bottom,
            }
        };
        Some((
            clip_id,
            [
                rect(TrimHandle::Start, range.trim_start_us),
                rect(TrimHandle::End, range.trim_end_us),
            ],
        ))
    }

    fn handle_at(
        &self,
        state: &TimelineState,
        positions: &[ClipPosition],
        pointer: Pointer,
    ) -> Option<(Uuid, TrimHandle, TrimRange)> {
        let (clip_id, rects) = self.handle_rects(state, positions)?;
        let hit = rects.iter().find(|r| r.contains(pointer.x, pointer.y))?;
        let clip = state.clip(clip_id)?;
        Some((clip_id, hit.handle, self.current_trim(state, clip)))
    }

    /// Pending (unconfirmed) trim if one exists for the clip, else the
    /// committed trim state.
    fn current_trim(&self, state: &TimelineState, clip: &Clip) -> TrimRange {
        match self.pending_trim {
            Some((id, range)) if id == clip.id => range,
            _ => state.trim_range(clip),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
