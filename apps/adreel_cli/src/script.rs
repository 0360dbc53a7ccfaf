//! Edit scripts: a JSON array of edits and history steps, replayed in order.
//!
//! ```json
//! [
//!   { "op": "split", "clip_id": "…", "at_us": 2000000 },
//!   { "op": "undo" }
//! ]
//! ```

use adreel_core::{EditOperations, EditRequest, Editor};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum HistoryStep {
    Undo,
    Redo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Step {
    History(HistoryStep),
    Edit(EditRequest),
}

pub fn load(path: &Path) -> Result<Vec<Step>> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read script {}", path.display()))?;
    parse(&data).with_context(|| format!("invalid script {}", path.display()))
}

pub fn parse(data: &str) -> Result<Vec<Step>> {
    Ok(serde_json::from_str(data)?)
}

pub fn run_step<E: EditOperations>(editor: &mut Editor<E>, step: &Step) -> Result<()> {
    match step {
        Step::Edit(request) => {
            let outcome = editor.apply(request)?;
            tracing::info!(outcome = ?outcome, "applied");
        }
        Step::History(HistoryStep::Undo) => {
            editor.undo()?;
            tracing::info!("undo");
        }
        Step::History(HistoryStep::Redo) => {
            editor.redo()?;
            tracing::info!("redo");
        }
    }
    Ok(())
}
