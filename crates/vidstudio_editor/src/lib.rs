// SPDX-License-Identifier: MIT OR Apache-2.0
//! VidStudio editor core.
//!
//! Builds on `vidstudio_timeline` with:
//! - Undo/redo history of timeline snapshots
//! - Voice presets and the echo/reverb effect graph
//! - Notifications, project persistence and configuration
//! - The [`EditorState`] context and a scripted session runner
//!
//! ## Architecture
//!
//! Everything runs on one thread. A timeline edit is a
//! [`TimelineCommand`](commands::TimelineCommand); the editor executes it,
//! snapshots the result into [`History`](history::History) and refreshes
//! the preview. Collaborators (preview surface, audio sink, notification
//! sink, project store) are traits with headless implementations here.

pub mod commands;
pub mod config;
pub mod effects;
pub mod error;
pub mod export;
pub mod history;
pub mod notify;
pub mod preview;
pub mod project;
pub mod session;
pub mod state;

pub use config::EditorConfig;
pub use effects::{
    compute_playback_rate, AudioEffectSink, EffectGraph, EffectParam, EffectPreset, PlaybackRate,
    VoiceEffects, PRESETS,
};
pub use error::EditorError;
pub use export::ExportPlan;
pub use history::{History, HistoryError};
pub use notify::{Notification, NotificationLog, NotificationSink, Severity, TracingSink};
pub use preview::HeadlessPreview;
pub use project::{FileProjectStore, MemoryProjectStore, ProjectData, ProjectId, ProjectStore};
pub use session::{EditorAction, Session, SessionReport, SessionRunner};
pub use state::{EditorSnapshot, EditorState};
