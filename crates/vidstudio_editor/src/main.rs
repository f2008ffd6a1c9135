// SPDX-License-Identifier: MIT OR Apache-2.0
//! `vidstudio` - headless driver for the VidStudio editor core.
//!
//! Replays a scripted session against a headless preview and prints the
//! resulting state as JSON.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use vidstudio_editor::preview::PreviewRecord;
use vidstudio_editor::{
    EditorConfig, EditorState, FileProjectStore, HeadlessPreview, Notification, NotificationLog, Session,
    SessionReport, SessionRunner, TracingSink, PRESETS,
};

#[derive(Parser, Debug)]
#[command(name = "vidstudio")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a RON session file
    Run {
        /// Session file
        session: PathBuf,

        /// Editor config (defaults apply when the file is missing)
        #[arg(long, default_value = vidstudio_editor::config::CONFIG_FILE_NAME)]
        config: PathBuf,
    },
    /// List the voice presets
    Presets,
}

#[derive(Serialize)]
struct RunOutput {
    report: SessionReport,
    preview: PreviewRecord,
    notifications: Vec<Notification>,
}

fn main() -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("vidstudio_editor=debug,vidstudio_timeline=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    match args.command {
        Command::Run { session, config } => run(&session, &config),
        Command::Presets => {
            println!("{}", serde_json::to_string_pretty(PRESETS)?);
            Ok(())
        }
    }
}

fn run(session_path: &Path, config_path: &Path) -> anyhow::Result<()> {
    tracing::info!("Starting VidStudio session runner v{}", env!("CARGO_PKG_VERSION"));

    let config = EditorConfig::load_or_default(config_path)
        .with_context(|| format!("reading config {}", config_path.display()))?;
    let session =
        Session::load(session_path).with_context(|| format!("reading session {}", session_path.display()))?;
    let store = FileProjectStore::open(&config.project_dir)
        .with_context(|| format!("opening project dir {}", config.project_dir.display()))?;

    let preview = HeadlessPreview::new();
    let log = NotificationLog::new(config.notification_capacity);
    let editor = EditorState::new(
        config,
        Box::new(preview.clone()),
        Box::new(preview.clone()),
        Box::new((TracingSink, log.clone())),
    )
    .with_project_store(Box::new(store));

    let mut runner = SessionRunner::new(editor);
    let report = runner.run(&session);

    let output = RunOutput {
        report,
        preview: preview.record(),
        notifications: log.entries(),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
