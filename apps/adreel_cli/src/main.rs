mod script;

use adreel_core::coords::{self, Scale};
use adreel_core::layout;
use adreel_core::validate;
use adreel_core::{Editor, EngineConfig, TimelineState};
use adreel_sync::wire::{ExportState, ExportStatus};
use adreel_sync::{HttpSessionService, SessionConfig, SessionSync, SyncError};
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "adreel")]
#[command(about = "Inspect and edit scene-based video ad timelines", long_about = None)]
struct Cli {
    /// Engine config (JSON). Defaults apply for missing fields.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the clip position index of a timeline
    Layout {
        timeline: PathBuf,

        #[arg(long, default_value_t = 1.0)]
        zoom: f64,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Replay an edit script against a timeline and write the result
    Apply {
        timeline: PathBuf,

        /// JSON array of edits (trim/split/merge/reposition/undo/redo)
        script: PathBuf,

        /// Output file; defaults to overwriting the input timeline
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Report whether a set of clips can be merged
    CheckMerge {
        timeline: PathBuf,

        #[arg(required = true, num_args = 2..)]
        clip_ids: Vec<Uuid>,
    },

    /// Drive a remote editing session
    Remote {
        #[arg(long)]
        url: String,

        #[arg(long)]
        session: String,

        #[arg(long, env = "ADREEL_TOKEN", hide_env_values = true)]
        token: Option<String>,

        #[command(subcommand)]
        action: RemoteAction,
    },
}

#[derive(Subcommand)]
enum RemoteAction {
    /// Save the session, optionally pushing a local timeline as its state
    Save {
        #[arg(long)]
        state: Option<PathBuf>,
    },

    /// Start an export
    Export {
        /// Poll until the export finishes
        #[arg(long)]
        wait: bool,

        #[arg(long, default_value_t = 2000)]
        poll_ms: u64,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Layout {
            timeline,
            zoom,
            json,
        } => cmd_layout(&config, &timeline, zoom, json),
        Commands::Apply {
            timeline,
            script,
            output,
        } => cmd_apply(config, &timeline, &script, output.as_deref()),
        Commands::CheckMerge { timeline, clip_ids } => {
            cmd_check_merge(&config, &timeline, &clip_ids)
        }
        Commands::Remote {
            url,
            session,
            token,
            action,
        } => {
            let mut session_config = SessionConfig::new(url, session);
            session_config.token = token;
            cmd_remote(config, session_config, action).await
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(p) => EngineConfig::load_from_file(p)
            .with_context(|| format!("failed to load config {}", p.display())),
        None => Ok(EngineConfig::default()),
    }
}

fn load_timeline(path: &Path, config: &EngineConfig) -> Result<TimelineState> {
    let state = TimelineState::load_from_file(path)
        .with_context(|| format!("failed to load timeline {}", path.display()))?;
    state
        .validate(config)
        .with_context(|| format!("invalid timeline {}", path.display()))?;
    Ok(state)
}

/// Command: adreel layout <timeline>
fn cmd_layout(config: &EngineConfig, timeline: &Path, zoom: f64, json: bool) -> Result<()> {
    let state = load_timeline(timeline, config)?;
    let scale = Scale::from_config(config, zoom);
    let positions = layout::compute_positions(&state, &BTreeMap::new(), scale, config);

    if json {
        println!("{}", serde_json::to_string_pretty(&positions)?);
        return Ok(());
    }

    println!(
        "{} clips, {} lanes, {} total, canvas {:.0}px at zoom {}",
        state.clips.len(),
        state.lane_count(),
        state.total_duration(),
        coords::timeline_width_px(state.total_duration(), scale, config),
        scale.zoom
    );
    println!(
        "{:<36}  {:>5}  {:>10}  {:>10}  {:>12}  {:>12}",
        "clip", "track", "x", "width", "start", "end"
    );
    for p in &positions {
        println!(
            "{:<36}  {:>5}  {:>10.1}  {:>10.1}  {:>12}  {:>12}",
            p.clip_id, p.track_index, p.x, p.width, p.effective_start, p.effective_end
        );
    }
    Ok(())
}

/// Command: adreel apply <timeline> <script>
fn cmd_apply(
    config: EngineConfig,
    timeline: &Path,
    script_path: &Path,
    output: Option<&Path>,
) -> Result<()> {
    let state = load_timeline(timeline, &config)?;
    let steps = script::load(script_path)?;
    let mut editor = Editor::with_config(config, state);

    for (i, step) in steps.iter().enumerate() {
        script::run_step(&mut editor, step).with_context(|| format!("step {} failed", i + 1))?;
    }

    let target = output.unwrap_or(timeline);
    let written = editor
        .state()
        .save_to_file(target)
        .with_context(|| format!("failed to write {}", target.display()))?;
    tracing::info!(
        "applied {} steps, {} clips written to {}",
        steps.len(),
        editor.state().clips.len(),
        written.display()
    );
    Ok(())
}

/// Command: adreel check-merge <timeline> <ids...>
fn cmd_check_merge(config: &EngineConfig, timeline: &Path, clip_ids: &[Uuid]) -> Result<()> {
    let state = load_timeline(timeline, config)?;
    match validate::validate_merge(&state, clip_ids, config) {
        Ok(clips) => {
            let start = clips[0].timeline_start_us;
            let end = clips
                .iter()
                .map(|c| c.timeline_end_us())
                .max()
                .unwrap_or(start);
            println!("mergeable: {} clips spanning {} - {}", clips.len(), start, end);
        }
        Err(e) => println!("not mergeable: {}", e),
    }
    Ok(())
}

/// Command: adreel remote ...
async fn cmd_remote(
    config: EngineConfig,
    session_config: SessionConfig,
    action: RemoteAction,
) -> Result<()> {
    let service = HttpSessionService::new(session_config).map_err(remote_error)?;

    match action {
        RemoteAction::Save { state } => {
            let initial = match &state {
                Some(path) => load_timeline(path, &config)?,
                None => TimelineState::default(),
            };
            let mut sync = SessionSync::new(service, Editor::with_config(config, initial));
            let resp = sync.save(state.is_some()).await.map_err(remote_error)?;
            println!("saved session {} at {}", resp.session_id, resp.saved_at);
        }
        RemoteAction::Export { wait, poll_ms } => {
            let mut sync = SessionSync::new(
                service,
                Editor::with_config(config, TimelineState::default()),
            )
            .with_poll_interval(Duration::from_millis(poll_ms));

            let export = sync.export().await.map_err(remote_error)?;
            println!("export {} {:?}", export.export_id, export.status);
            if !wait {
                return Ok(());
            }

            let (tx, mut rx) = tokio::sync::watch::channel(ExportStatus::queued());
            let printer = tokio::spawn(async move {
                while rx.changed().await.is_ok() {
                    let status = rx.borrow().clone();
                    println!(
                        "{:>3.0}% {}",
                        status.progress * 100.0,
                        status.current_step.unwrap_or_default()
                    );
                }
            });

            let done = sync
                .wait_for_export(&export.export_id, tx)
                .await
                .map_err(remote_error)?;
            let _ = printer.await;

            if done.status == ExportState::Failed {
                anyhow::bail!("export {} failed", export.export_id);
            }
            println!("export {} completed", export.export_id);
        }
    }
    Ok(())
}

fn remote_error(err: SyncError) -> anyhow::Error {
    if err.requires_reauth() {
        anyhow!("{} Set ADREEL_TOKEN to a fresh token.", err.user_message())
    } else {
        anyhow!("{} ({})", err.user_message(), err)
    }
}
