//! Conversion between timeline time and canvas pixels.

use crate::config::EngineConfig;
use crate::types::TimeUs;
use serde::{Deserialize, Serialize};

pub const BASE_PIXELS_PER_SECOND: f64 = 100.0;

/// Pixels-per-second at a given zoom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    pub base_pixels_per_second: f64,
    pub zoom: f64,
}

impl Scale {
    pub fn new(base_pixels_per_second: f64, zoom: f64) -> Self {
        Self {
            base_pixels_per_second,
            zoom,
        }
    }

    pub fn at(zoom: f64) -> Self {
        Self::new(BASE_PIXELS_PER_SECOND, zoom)
    }

    pub fn from_config(config: &EngineConfig, zoom: f64) -> Self {
        Self::new(config.base_pixels_per_second, config.clamp_zoom(zoom))
    }

    pub fn pixels_per_second(&self) -> f64 {
        self.base_pixels_per_second * self.zoom
    }

    pub fn to_pixels(&self, time: TimeUs) -> f64 {
        time.as_seconds() * self.pixels_per_second()
    }

    pub fn to_time(&self, pixels: f64) -> TimeUs {
        TimeUs::from_seconds(pixels / self.pixels_per_second())
    }
}

/// `time * BASE_PIXELS_PER_SECOND * zoom`
pub fn to_pixels(time: TimeUs, zoom: f64) -> f64 {
    Scale::at(zoom).to_pixels(time)
}

/// `pixels / (BASE_PIXELS_PER_SECOND * zoom)`
pub fn to_time(pixels: f64, zoom: f64) -> TimeUs {
    Scale::at(zoom).to_time(pixels)
}

/// Width of the scrollable canvas. Deliberately several times longer than
/// the content so clips can be dragged past the current end.
pub fn timeline_width_px(total_duration: TimeUs, scale: Scale, config: &EngineConfig) -> f64 {
    let extended = config.timeline_extension_factor * scale.to_pixels(total_duration);
    extended.max(config.min_timeline_width_px)
}

// ---------------------------------------------------------------------------
// Zoom
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomLevel(f64);

impl ZoomLevel {
    pub fn new(zoom: f64, config: &EngineConfig) -> Self {
        Self(round_zoom(config.clamp_zoom(zoom)))
    }

    pub fn initial(config: &EngineConfig) -> Self {
        Self::new(config.default_zoom, config)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn zoom_in(&mut self, config: &EngineConfig) {
        *self = Self::new(self.0 + config.zoom_step, config);
    }

    pub fn zoom_out(&mut self, config: &EngineConfig) {
        *self = Self::new(self.0 - config.zoom_step, config);
    }

    /// Modifier+wheel zoom. Scrolling up (negative delta) zooms in. Returns
    /// false when the wheel event should scroll instead.
    pub fn on_wheel(&mut self, delta_y: f64, modifier: bool, config: &EngineConfig) -> bool {
        if !modifier || delta_y == 0.0 {
            return false;
        }
        if delta_y < 0.0 {
            self.zoom_in(config);
        } else {
            self.zoom_out(config);
        }
        true
    }
}

// Keeps repeated 0.2 steps from drifting (1.0 + 0.2 + 0.2 ...).
fn round_zoom(zoom: f64) -> f64 {
    (zoom * 1_000_000.0).round() / 1_000_000.0
}

// ---------------------------------------------------------------------------
// Ruler
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeMarker {
    pub time: TimeUs,
    pub x: f64,
    pub label: String,
}

/// Spacing between ruler labels; shrinks as zoom grows.
pub fn marker_interval(zoom: f64) -> TimeUs {
    if zoom >= 4.0 {
        TimeUs(500_000)
    } else if zoom >= 2.0 {
        TimeUs(1_000_000)
    } else if zoom >= 1.0 {
        TimeUs(2_000_000)
    } else if zoom >= 0.7 {
        TimeUs(5_000_000)
    } else {
        TimeUs(10_000_000)
    }
}

/// Ruler ticks covering `[0, width_px]`. Empty when the width does not map
/// to a finite, non-negative time.
pub fn time_markers(scale: Scale, width_px: f64) -> Vec<TimeMarker> {
    let end_seconds = width_px / scale.pixels_per_second();
    if !end_seconds.is_finite() || end_seconds < 0.0 {
        return Vec::new();
    }
    let step = marker_interval(scale.zoom);
    let end = TimeUs::from_seconds(end_seconds);
    let mut markers = Vec::new();
    let mut t = TimeUs::ZERO;
    while t <= end {
        markers.push(TimeMarker {
            time: t,
            x: scale.to_pixels(t),
            label: format_marker(t),
        });
        match t.0.checked_add(step.0) {
            Some(next) => t = TimeUs(next),
            None => break,
        }
    }
    markers
}

fn format_marker(t: TimeUs) -> String {
    let total_ms = t.0 / 1_000;
    let mins = total_ms / 60_000;
    let secs = (total_ms / 1_000) % 60;
    let frac = total_ms % 1_000;
    if frac == 0 {
        format!("{}:{:02}", mins, secs)
    } else {
        format!("{}:{:02}.{}", mins, secs, frac / 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixels_at_default_zoom() {
        assert_eq!(to_pixels(TimeUs(1_000_000), 1.0), 100.0);
        assert_eq!(to_pixels(TimeUs(2_500_000), 2.0), 500.0);
        assert_eq!(to_time(250.0, 1.0), TimeUs(2_500_000));
    }

    #[test]
    fn roundtrip_within_one_microsecond() {
        let zooms = [0.5, 0.7, 1.0, 1.3, 3.3, 7.9, 10.0];
        let times = [0, 1, 333_333, 1_000_000, 12_345_678, 600_000_000];
        for &z in &zooms {
            for &t in &times {
                let back = to_time(to_pixels(TimeUs(t), z), z);
                assert!(back.abs_diff(TimeUs(t)) <= TimeUs(1), "t={t} z={z}");
            }
        }
    }

    #[test]
    fn scale_from_config_clamps_zoom() {
        let cfg = EngineConfig::default();
        assert_eq!(Scale::from_config(&cfg, 50.0).zoom, 10.0);
        assert_eq!(Scale::from_config(&cfg, 0.0).zoom, 0.5);
    }

    #[test]
    fn timeline_width_has_floor() {
        let cfg = EngineConfig::default();
        let scale = Scale::at(1.0);
        // 2s of content -> 600px extended, floor wins
        assert_eq!(timeline_width_px(TimeUs(2_000_000), scale, &cfg), 3000.0);
        // 20s of content -> 3 * 2000px
        assert_eq!(timeline_width_px(TimeUs(20_000_000), scale, &cfg), 6000.0);
    }

    #[test]
    fn zoom_steps_and_clamps() {
        let cfg = EngineConfig::default();
        let mut zoom = ZoomLevel::initial(&cfg);
        zoom.zoom_in(&cfg);
        zoom.zoom_in(&cfg);
        assert_eq!(zoom.value(), 1.4);
        for _ in 0..10 {
            zoom.zoom_out(&cfg);
        }
        assert_eq!(zoom.value(), 0.5);
        for _ in 0..100 {
            zoom.zoom_in(&cfg);
        }
        assert_eq!(zoom.value(), 10.0);
    }

    #[test]
    fn wheel_zooms_only_with_modifier() {
        let cfg = EngineConfig::default();
        let mut zoom = ZoomLevel::initial(&cfg);
        assert!(!zoom.on_wheel(-120.0, false, &cfg));
        assert_eq!(zoom.value(), 1.0);
        assert!(zoom.on_wheel(-120.0, true, &cfg));
        assert_eq!(zoom.value(), 1.2);
        assert!(zoom.on_wheel(120.0, true, &cfg));
        assert_eq!(zoom.value(), 1.0);
    }

    #[test]
    fn marker_interval_bands() {
        assert_eq!(marker_interval(0.5), TimeUs(10_000_000));
        assert_eq!(marker_interval(0.8), TimeUs(5_000_000));
        assert_eq!(marker_interval(1.0), TimeUs(2_000_000));
        assert_eq!(marker_interval(2.5), TimeUs(1_000_000));
        assert_eq!(marker_interval(10.0), TimeUs(500_000));
    }

    #[test]
    fn markers_cover_width() {
        let markers = time_markers(Scale::at(1.0), 1000.0);
        // 2s spacing over 10s
        assert_eq!(markers.len(), 6);
        assert_eq!(markers[1].x, 200.0);
        assert_eq!(markers[1].label, "0:02");
        assert_eq!(markers[5].time, TimeUs(10_000_000));

        let fine = time_markers(Scale::at(4.0), 400.0);
        assert_eq!(fine[1].label, "0:00.5");
    }

    #[test]
    fn markers_for_unusable_width_are_empty() {
        assert!(time_markers(Scale::at(1.0), f64::INFINITY).is_empty());
        assert!(time_markers(Scale::at(1.0), f64::NAN).is_empty());
        assert!(time_markers(Scale::at(1.0), -10.0).is_empty());
        assert_eq!(time_markers(Scale::at(1.0), 0.0).len(), 1);
    }
}
