//! Horizontal viewport over the scrollable canvas, and playhead follow.

use serde::{Deserialize, Serialize};

pub const DEFAULT_FOLLOW_MARGIN_PX: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub scroll_x: f64,
    pub width: f64,
}

impl Viewport {
    pub fn new(width: f64) -> Self {
        Self {
            scroll_x: 0.0,
            width,
        }
    }

    pub fn right(&self) -> f64 {
        self.scroll_x + self.width
    }

    pub fn is_visible(&self, x: f64) -> bool {
        x >= self.scroll_x && x <= self.right()
    }
}

/// Batches playhead-follow scrolling to the display refresh.
///
/// Pointer moves call [`ScrollFollower::request`] as often as they like; only
/// the latest target survives, and [`ScrollFollower::on_frame`] applies at
/// most one scroll change per frame.
#[derive(Debug, Clone)]
pub struct ScrollFollower {
    margin_px: f64,
    pending: Option<f64>,
}

impl Default for ScrollFollower {
    fn default() -> Self {
        Self::new(DEFAULT_FOLLOW_MARGIN_PX)
    }
}

impl ScrollFollower {
    pub fn new(margin_px: f64) -> Self {
        Self {
            margin_px,
            pending: None,
        }
    }

    /// Ask for `target_x` to be kept inside the viewport. Returns true if a
    /// scroll is now pending.
    pub fn request(&mut self, viewport: &Viewport, target_x: f64) -> bool {
        let margin = self.margin_px.min(viewport.width / 2.0);
        let scroll = if target_x > viewport.right() - margin {
            Some(target_x - viewport.width + margin)
        } else if target_x < viewport.scroll_x + margin {
            Some((target_x - margin).max(0.0))
        } else {
            None
        };
        match scroll {
            Some(s) if s != viewport.scroll_x => {
                self.pending = Some(s);
                true
            }
            _ => {
                self.pending = None;
                false
            }
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Apply the coalesced scroll, if any. Called once per animation frame.
    pub fn on_frame(&mut self, viewport: &mut Viewport) -> bool {
        match self.pending.take() {
            Some(scroll_x) => {
                viewport.scroll_x = scroll_x;
                true
            }
            None => false,
        }
    }
}
