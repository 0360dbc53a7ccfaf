use thiserror::Error;

use crate::types::TimeUs;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Clip not found: {0}")]
    ClipNotFound(uuid::Uuid),

    #[error("Invalid trim: {0}")]
    InvalidTrim(String),

    #[error("Invalid split at {at} (clip duration {duration})")]
    InvalidSplit { at: TimeUs, duration: TimeUs },

    #[error("Invalid merge: {0}")]
    InvalidMerge(String),

    #[error("Track {track} out of range (0..{lanes})")]
    TrackOutOfRange { track: usize, lanes: usize },

    #[error("Overlap detected on track {0}")]
    OverlapDetected(usize),

    #[error("Invalid timeline state: {0}")]
    InvalidState(String),

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,
}

impl CoreError {
    /// True for rejections produced by local edit validation. These never
    /// reach the session service.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CoreError::ClipNotFound(_)
                | CoreError::InvalidTrim(_)
                | CoreError::InvalidSplit { .. }
                | CoreError::InvalidMerge(_)
                | CoreError::TrackOutOfRange { .. }
                | CoreError::OverlapDetected(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
