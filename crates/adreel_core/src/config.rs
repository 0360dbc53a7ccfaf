use crate::error::Result;
use crate::types::TimeUs;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What a drop does when the clip lands on top of another clip on the same
/// track.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// Accept the drop; overlap is resolved at export time.
    #[default]
    Allow,
    /// Refuse the drop with `CoreError::OverlapDetected`.
    Reject,
}

/// Tunables for validation, layout and pointer interaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub min_clip_duration_us: TimeUs,
    /// Largest gap (or overlap) between two clips still considered adjacent
    /// for merging.
    pub merge_tolerance_us: TimeUs,
    pub snap_interval_us: TimeUs,
    /// Pointer travel before a press on a clip becomes a drag.
    pub drag_threshold_px: f64,
    pub base_pixels_per_second: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub zoom_step: f64,
    pub default_zoom: f64,
    pub min_clip_width_px: f64,
    pub min_timeline_width_px: f64,
    pub timeline_extension_factor: f64,
    pub track_height_px: f64,
    pub trim_handle_width_px: f64,
    pub history_limit: usize,
    pub overlap_policy: OverlapPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_clip_duration_us: TimeUs(500_000),
            merge_tolerance_us: TimeUs(10_000),
            snap_interval_us: TimeUs(500_000),
            drag_threshold_px: 5.0,
            base_pixels_per_second: 100.0,
            min_zoom: 0.5,
            max_zoom: 10.0,
            zoom_step: 0.2,
            default_zoom: 1.0,
            min_clip_width_px: 20.0,
            min_timeline_width_px: 3000.0,
            timeline_extension_factor: 3.0,
            track_height_px: 60.0,
            trim_handle_width_px: 8.0,
            history_limit: 50,
            overlap_policy: OverlapPolicy::Allow,
        }
    }
}

impl EngineConfig {
    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: EngineConfig = serde_json::from_str(&data)?;
        Ok(config)
    }

    /// Save the config as pretty-printed JSON.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        zoom.clamp(self.min_zoom, self.max_zoom)
    }
}
