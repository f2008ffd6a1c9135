// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scripted editor sessions.
//!
//! A session is a RON list of [`EditorAction`]s replayed against an
//! [`EditorState`]. Actions name media and clips by position (import order
//! and timeline order) because ids are only assigned at run time. Time is
//! virtual: `Wait` advances the clock and lets delayed plays fire.

use crate::effects::EffectParam;
use crate::error::EditorError;
use crate::project::ProjectId;
use crate::state::{EditorSnapshot, EditorState};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};
use thiserror::Error;
use vidstudio_timeline::{ClipId, MediaId, MediaImport};

/// Session file errors
#[derive(Debug, Error)]
pub enum SessionError {
    /// File could not be read
    #[error("Session I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File is not valid RON
    #[error("Session parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

/// A named editor command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EditorAction {
    /// Import a file
    Import {
        /// File name
        name: String,
        /// MIME type
        mime_type: String,
        /// Declared size
        #[serde(default)]
        size_bytes: u64,
        /// Server upload URL
        #[serde(default)]
        upload_url: Option<String>,
    },
    /// Place the n-th imported file on a track
    AddClip {
        /// Import index
        media: usize,
        /// Target track
        track: usize,
    },
    /// Split at the playhead
    Split,
    /// Append a track
    AddTrack,
    /// Remove a track and its clips
    RemoveTrack {
        /// Track index
        track: usize,
    },
    /// Remove the n-th clip
    RemoveClip {
        /// Clip position
        clip: usize,
    },
    /// Reorder the n-th clip and/or change its track
    MoveClip {
        /// Clip position
        clip: usize,
        /// New position
        #[serde(default)]
        index: Option<usize>,
        /// New track
        #[serde(default)]
        track: Option<usize>,
    },
    /// Undo
    Undo,
    /// Redo
    Redo,
    /// Set the zoom level
    SetZoom(f32),
    /// Zoom in one step
    ZoomIn,
    /// Zoom out one step
    ZoomOut,
    /// Drag the playhead to a pixel offset
    DragPlayhead(f32),
    /// Media time report from the preview
    TimeUpdate {
        /// Current time in seconds
        current: f64,
        /// Media duration in seconds
        duration: f64,
    },
    /// The preview finished its media
    MediaEnded,
    /// Advance the virtual clock by milliseconds
    Wait(u64),
    /// Start the video sequence over
    RestartSequence,
    /// Select a voice preset
    ApplyPreset(String),
    /// Move one effect slider
    SetEffect {
        /// Parameter
        param: EffectParam,
        /// New value
        value: f64,
    },
    /// Apply the voice settings to the preview
    ApplyEffects,
    /// Save the project under a name
    Save(String),
    /// Load the most recently saved project
    LoadLast,
    /// Plan an export
    Export,
}

/// A scripted session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Actions in order
    pub actions: Vec<EditorAction>,
}

impl Session {
    /// Parse a session from RON
    pub fn from_ron(content: &str) -> Result<Self, SessionError> {
        Ok(ron::from_str(content)?)
    }

    /// Load a session file
    pub fn load(path: &Path) -> Result<Self, SessionError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_ron(&content)
    }
}

/// Outcome of one action
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepResult {
    /// The action, in debug form
    pub action: String,
    /// Error text when the action was refused or failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Everything a session run produced
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    /// Per-action results
    pub steps: Vec<StepResult>,
    /// Editor state after the last action
    pub final_state: EditorSnapshot,
}

/// Replays actions against an editor
pub struct SessionRunner {
    editor: EditorState,
    imported: Vec<MediaId>,
    saved: Vec<ProjectId>,
    clock: Instant,
}

impl SessionRunner {
    /// Wrap an editor
    pub fn new(editor: EditorState) -> Self {
        Self {
            editor,
            imported: Vec::new(),
            saved: Vec::new(),
            clock: Instant::now(),
        }
    }

    /// The editor being driven
    pub fn editor(&self) -> &EditorState {
        &self.editor
    }

    /// Give the editor back
    pub fn into_editor(self) -> EditorState {
        self.editor
    }

    /// Run one action
    pub fn dispatch(&mut self, action: &EditorAction) -> Result<(), EditorError> {
        match action {
            EditorAction::Import {
                name,
                mime_type,
                size_bytes,
                upload_url,
            } => {
                let media = self.editor.import_media(MediaImport {
                    name: name.clone(),
                    mime_type: mime_type.clone(),
                    bytes: None,
                    size_bytes: *size_bytes,
                    upload_url: upload_url.clone(),
                });
                // The media exists even when the follow-up clip failed
                if let Some(file) = self.editor.registry().files().last() {
                    self.imported.push(file.id);
                }
                media.map(drop)
            }
            EditorAction::AddClip { media, track } => match self.imported.get(*media) {
                Some(id) => self.editor.add_clip(*id, *track).map(drop),
                None => {
                    tracing::debug!(media, "Skipping clip for unknown media");
                    Ok(())
                }
            },
            EditorAction::Split => self.editor.split().map(drop),
            EditorAction::AddTrack => self.editor.add_track().map(drop),
            EditorAction::RemoveTrack { track } => self.editor.remove_track(*track).map(drop),
            EditorAction::RemoveClip { clip } => match self.clip_at(*clip) {
                Some(id) => self.editor.remove_clip(id).map(drop),
                None => Ok(()),
            },
            EditorAction::MoveClip { clip, index, track } => match self.clip_at(*clip) {
                Some(id) => self.editor.move_clip(id, *index, *track),
                None => Ok(()),
            },
            EditorAction::Undo => self.editor.undo(),
            EditorAction::Redo => self.editor.redo(),
            EditorAction::SetZoom(level) => {
                self.editor.set_zoom(*level);
                Ok(())
            }
            EditorAction::ZoomIn => {
                self.editor.zoom_in();
                Ok(())
            }
            EditorAction::ZoomOut => {
                self.editor.zoom_out();
                Ok(())
            }
            EditorAction::DragPlayhead(offset) => {
                self.editor.drag_playhead(*offset);
                Ok(())
            }
            EditorAction::TimeUpdate { current, duration } => {
                self.editor.time_update(*current, *duration);
                Ok(())
            }
            EditorAction::MediaEnded => {
                self.editor.media_ended(self.clock);
                Ok(())
            }
            EditorAction::Wait(ms) => {
                self.clock += Duration::from_millis(*ms);
                self.editor.tick(self.clock);
                Ok(())
            }
            EditorAction::RestartSequence => {
                self.editor.restart_sequence();
                Ok(())
            }
            EditorAction::ApplyPreset(name) => self.editor.apply_preset(name).map(drop),
            EditorAction::SetEffect { param, value } => {
                self.editor.set_effect_param(*param, *value);
                Ok(())
            }
            EditorAction::ApplyEffects => self.editor.apply_effects().map(drop),
            EditorAction::Save(name) => {
                let id = self.editor.save_project(name)?;
                self.saved.push(id);
                Ok(())
            }
            EditorAction::LoadLast => match self.saved.last() {
                Some(id) => self.editor.load_project(*id),
                None => {
                    tracing::debug!("Nothing saved in this session");
                    Ok(())
                }
            },
            EditorAction::Export => self.editor.export_plan().map(drop),
        }
    }

    /// Run every action of a session and report
    pub fn run(&mut self, session: &Session) -> SessionReport {
        let steps = session
            .actions
            .iter()
            .map(|action| {
                let error = self.dispatch(action).err().map(|e| e.to_string());
                StepResult {
                    action: format!("{action:?}"),
                    error,
                }
            })
            .collect();

        SessionReport {
            steps,
            final_state: self.editor.snapshot(),
        }
    }

    fn clip_at(&self, position: usize) -> Option<ClipId> {
        self.editor.timeline().clips().get(position).map(|c| c.id)
    }
}
