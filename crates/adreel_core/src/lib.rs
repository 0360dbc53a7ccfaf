//! Editing model for scene-based video ads: clips on a multi-track timeline,
//! validated trim/split/merge/reposition, snapshot undo/redo, and the pointer
//! gesture controller for the timeline canvas.

pub mod config;
pub mod coords;
pub mod editing;
pub mod editor;
pub mod error;
pub mod history;
pub mod interaction;
pub mod layout;
pub mod project;
pub mod snapping;
pub mod types;
pub mod validate;
pub mod viewport;

pub use config::{EngineConfig, OverlapPolicy};
pub use editing::{EditOperations, EditOutcome, EditRequest, Engine, RepositionRequest};
pub use editor::Editor;
pub use error::{CoreError, Result};
pub use history::History;
pub use types::{Clip, TimeUs, TimelineState, TrimRange};
