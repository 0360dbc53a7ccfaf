use crate::error::Result;
use crate::types::*;
use std::path::{Path, PathBuf};

pub const TIMELINE_EXTENSION: &str = "adreel.json";

impl TimelineState {
    /// Save the timeline as pretty-printed JSON.
    /// Appends `.adreel.json` if the path has no extension.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = ensure_extension(path.as_ref());
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;
        Ok(path)
    }

    /// Load a timeline and run the structural checks on it. The configured
    /// minimum duration is left to [`TimelineState::validate`].
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let state: TimelineState = serde_json::from_str(&data)?;
        state.check_integrity()?;
        Ok(state)
    }
}

fn ensure_extension(path: &Path) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension(TIMELINE_EXTENSION)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    fn sample_state() -> TimelineState {
        let a = Clip::new("intro.mp4", 1, TimeUs(0), TimeUs(4_000_000));
        let mut b = Clip::new("outro.mp4", 2, TimeUs(4_000_000), TimeUs(3_000_000));
        b.text_overlay = Some(serde_json::json!({ "text": "Buy now", "position": "bottom" }));
        let mut state = TimelineState::new(vec![a.clone(), b]);
        state.track_assignments.insert(a.id, 2);
        state
            .trim_state
            .insert(a.id, TrimRange::new(TimeUs(500_000), TimeUs(3_500_000)));
        state
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let state = sample_state();
        let written = state.save_to_file(dir.path().join("ad.json")).unwrap();
        assert_eq!(written, dir.path().join("ad.json"));

        let loaded = TimelineState::load_from_file(&written).unwrap();
        assert_eq!(state, loaded);
    }

    #[test]
    fn save_appends_extension() {
        let dir = tempfile::tempdir().unwrap();
        let written = sample_state().save_to_file(dir.path().join("ad")).unwrap();
        assert_eq!(written, dir.path().join("ad.adreel.json"));
        assert!(written.exists());
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = TimelineState::load_from_file(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, CoreError::Io(_)));
    }

    #[test]
    fn load_tolerates_missing_maps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bare.json");
        let clip = Clip::new("a.mp4", 1, TimeUs(0), TimeUs(1_000_000));
        let json = serde_json::json!({ "clips": [clip] });
        std::fs::write(&path, json.to_string()).unwrap();

        let state = TimelineState::load_from_file(&path).unwrap();
        assert_eq!(state.clips.len(), 1);
        assert!(state.track_assignments.is_empty());
        assert!(state.trim_state.is_empty());
    }

    #[test]
    fn load_rejects_broken_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        let mut clip = Clip::new("a.mp4", 1, TimeUs(0), TimeUs(1_000_000));
        clip.duration_us = TimeUs(-200_000);
        let json = serde_json::json!({ "clips": [clip] });
        std::fs::write(&path, json.to_string()).unwrap();

        let err = TimelineState::load_from_file(&path).unwrap_err();
        assert!(matches!(err, CoreError::InvalidState(_)));
    }
}
