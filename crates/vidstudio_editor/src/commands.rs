// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline commands.
//!
//! Each mutating timeline operation is a command with a description. The
//! editor runs a command against the live timeline and, on success, records
//! the resulting state in the [`History`](crate::history::History).

use serde::{Deserialize, Serialize};
use vidstudio_timeline::{Clip, ClipId, MediaId, MediaRegistry, SplitStrategy, Timeline, TimelineError};

/// Trait for edits that produce a new undo entry
pub trait TimelineCommand {
    /// What the edit hands back
    type Output;

    /// Short description stored with the history entry
    fn description(&self) -> &str;

    /// Apply the edit
    fn execute(&self, timeline: &mut Timeline, registry: &MediaRegistry) -> Result<Self::Output, CommandError>;
}

/// Error type for command execution
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    /// Timeline rejected the edit
    #[error(transparent)]
    Timeline(#[from] TimelineError),
}

/// Command to place a media file on a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddClipCommand {
    /// Media to place
    pub media_id: MediaId,
    /// Target track
    pub track_index: usize,
}

impl TimelineCommand for AddClipCommand {
    type Output = Clip;

    fn description(&self) -> &str {
        "Add clip"
    }

    fn execute(&self, timeline: &mut Timeline, registry: &MediaRegistry) -> Result<Self::Output, CommandError> {
        let clip = timeline.add_clip(self.media_id, self.track_index, registry);
        tracing::debug!(clip = %clip.id, track = self.track_index, "Clip added");
        Ok(clip)
    }
}

/// Command to split at the playhead
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitClipCommand {
    /// Playhead position in seconds
    pub playhead: f64,
    /// Which clip gets cut
    pub strategy: SplitStrategy,
}

impl TimelineCommand for SplitClipCommand {
    type Output = Clip;

    fn description(&self) -> &str {
        "Split clip"
    }

    fn execute(&self, timeline: &mut Timeline, _registry: &MediaRegistry) -> Result<Self::Output, CommandError> {
        let derived = timeline.split_at_playhead(self.playhead, self.strategy)?;
        tracing::debug!(clip = %derived.id, playhead = self.playhead, "Clip split");
        Ok(derived)
    }
}

/// Command to append a track
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddTrackCommand;

impl TimelineCommand for AddTrackCommand {
    type Output = usize;

    fn description(&self) -> &str {
        "Add track"
    }

    fn execute(&self, timeline: &mut Timeline, _registry: &MediaRegistry) -> Result<Self::Output, CommandError> {
        Ok(timeline.add_track())
    }
}

/// Command to delete a track and the clips on it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveTrackCommand {
    /// Track to delete
    pub track_index: usize,
}

impl TimelineCommand for RemoveTrackCommand {
    type Output = Vec<Clip>;

    fn description(&self) -> &str {
        "Remove track"
    }

    fn execute(&self, timeline: &mut Timeline, _registry: &MediaRegistry) -> Result<Self::Output, CommandError> {
        let removed = timeline.remove_track(self.track_index)?;
        tracing::debug!(track = self.track_index, clips = removed.len(), "Track removed");
        Ok(removed)
    }
}

/// Command to delete a clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveClipCommand {
    /// Clip to delete
    pub clip_id: ClipId,
}

impl TimelineCommand for RemoveClipCommand {
    type Output = Clip;

    fn description(&self) -> &str {
        "Remove clip"
    }

    fn execute(&self, timeline: &mut Timeline, _registry: &MediaRegistry) -> Result<Self::Output, CommandError> {
        Ok(timeline.remove_clip(self.clip_id)?)
    }
}

/// Command to reorder a clip or put it on another track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveClipCommand {
    /// Clip to move
    pub clip_id: ClipId,
    /// New position in insertion order
    #[serde(default)]
    pub index: Option<usize>,
    /// New track
    #[serde(default)]
    pub track_index: Option<usize>,
}

impl TimelineCommand for MoveClipCommand {
    type Output = ();

    fn description(&self) -> &str {
        "Move clip"
    }

    fn execute(&self, timeline: &mut Timeline, _registry: &MediaRegistry) -> Result<Self::Output, CommandError> {
        // Validate both parts before touching the timeline
        if timeline.clip(self.clip_id).is_none() {
            return Err(TimelineError::ClipNotFound(self.clip_id).into());
        }
        if let Some(track) = self.track_index {
            if track >= timeline.track_count() {
                return Err(TimelineError::TrackOutOfRange {
                    index: track,
                    count: timeline.track_count(),
                }
                .into());
            }
        }

        if let Some(track) = self.track_index {
            timeline.set_clip_track(self.clip_id, track)?;
        }
        if let Some(index) = self.index {
            timeline.move_clip(self.clip_id, index)?;
        }
        Ok(())
    }
}
