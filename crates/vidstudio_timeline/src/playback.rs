// SPDX-License-Identifier: MIT OR Apache-2.0
//! Preview playback coordination.
//!
//! The [`PlaybackCoordinator`] keeps a single active preview element, the
//! playhead and the clip list consistent:
//! - one video clip on the timeline shows a single preview
//! - several video clips play back-to-back as a sequence
//! - media time drives the playhead, dragging the playhead seeks the media
//! - zoom scales both the preview and the clip widths

use crate::clip::{Clip, ClipId};
use crate::media::{MediaFile, MediaId, MediaRegistry};
use crate::timeline::Timeline;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Smallest zoom level
pub const MIN_ZOOM: f32 = 0.5;
/// Largest zoom level
pub const MAX_ZOOM: f32 = 3.0;
/// Delay between loading the next sequence entry and playing it
pub const DEFAULT_ADVANCE_DELAY: Duration = Duration::from_millis(100);
/// Default width of the timeline viewport in pixels
pub const DEFAULT_VIEWPORT_WIDTH: f32 = 1000.0;

/// The active preview element (a video element, a decoder, a test double).
pub trait PreviewSurface {
    /// Load a media file, replacing whatever was loaded
    fn load(&mut self, media: &MediaFile);

    /// Drop the loaded media
    fn unload(&mut self);

    /// Start playback
    fn play(&mut self);

    /// Seek to a position in seconds
    fn seek(&mut self, seconds: f64);

    /// Duration of the loaded media, once known
    fn duration(&self) -> Option<f64>;

    /// Apply a scale transform
    fn set_scale(&mut self, scale: f32);

    /// Set the playback rate and whether pitch is preserved
    fn set_playback_rate(&mut self, rate: f64, preserves_pitch: bool);

    /// Whether anything is loaded
    fn has_media(&self) -> bool;
}

/// Coordinator phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackPhase {
    /// Nothing to preview
    #[default]
    Idle,
    /// Exactly one video clip is previewed
    SinglePreview,
    /// Video clips play back-to-back
    SequencePlaying,
    /// The sequence ran past its last clip
    SequenceComplete,
}

/// Who moved the playhead
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayheadSource {
    /// Media time update
    MediaTime,
    /// User drag; seeks the media as a side effect
    Drag,
}

/// Result of recomputing the preview
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewChange {
    /// No video on the timeline
    Cleared,
    /// A single video is previewed
    Single(MediaId),
    /// A sequence was (re)started at its first entry
    SequenceStarted {
        /// Number of clips in the sequence
        length: usize,
    },
    /// Nothing changed
    Unchanged,
}

/// Result of a "playback ended" signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceAdvance {
    /// The next entry was loaded and will play shortly
    Next {
        /// Zero-based index now playing
        index: usize,
        /// Sequence length
        total: usize,
    },
    /// The last entry finished
    Completed {
        /// Sequence length
        total: usize,
    },
}

/// Result of a zoom request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomOutcome {
    /// Zoom level after clamping
    pub level: f32,
    /// Whether a preview was there to scale
    pub applied: bool,
}

/// Transient playback state, rebuilt from the timeline on every refresh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    /// Current phase
    pub phase: PlaybackPhase,
    /// Media loaded into the preview
    pub active_media_file_id: Option<MediaId>,
    /// Index into the video sequence
    pub current_sequence_index: usize,
    /// Whether sequence playback is active
    pub is_sequence_playing: bool,
    /// Zoom level in `[MIN_ZOOM, MAX_ZOOM]`
    pub zoom_level: f32,
    /// Playhead offset in pixels
    pub playhead_offset: f32,
}

/// Synchronizes the preview surface with the timeline
#[derive(Debug, Clone)]
pub struct PlaybackCoordinator {
    phase: PlaybackPhase,
    active_media: Option<MediaId>,
    sequence: Vec<ClipId>,
    sequence_index: usize,
    sequence_playing: bool,
    zoom: f32,
    playhead_px: f32,
    viewport_width: f32,
    advance_delay: Duration,
    pending_play: Option<Instant>,
}

impl PlaybackCoordinator {
    /// Create an idle coordinator
    pub fn new() -> Self {
        Self {
            phase: PlaybackPhase::Idle,
            active_media: None,
            sequence: Vec::new(),
            sequence_index: 0,
            sequence_playing: false,
            zoom: 1.0,
            playhead_px: 0.0,
            viewport_width: DEFAULT_VIEWPORT_WIDTH,
            advance_delay: DEFAULT_ADVANCE_DELAY,
            pending_play: None,
        }
    }

    /// Set the delay between loading the next sequence entry and playing it
    pub fn with_advance_delay(mut self, delay: Duration) -> Self {
        self.advance_delay = delay;
        self
    }

    /// Set the viewport width used to map time to pixels
    pub fn with_viewport_width(mut self, width: f32) -> Self {
        self.set_viewport_width(width);
        self
    }

    /// Update the viewport width
    pub fn set_viewport_width(&mut self, width: f32) {
        if width.is_finite() && width > 0.0 {
            self.viewport_width = width;
        }
    }

    /// Current phase
    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    /// Media in the preview
    pub fn active_media(&self) -> Option<MediaId> {
        self.active_media
    }

    /// Index into the video sequence
    pub fn sequence_index(&self) -> usize {
        self.sequence_index
    }

    /// Current zoom level
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Playhead offset in pixels
    pub fn playhead_offset(&self) -> f32 {
        self.playhead_px
    }

    /// Playhead position as a fraction of the viewport, in `[0, 1]`
    pub fn playhead_fraction(&self) -> f64 {
        (f64::from(self.playhead_px) / f64::from(self.viewport_width)).min(1.0)
    }

    /// Playhead position in seconds of a `span` mapped onto the viewport.
    ///
    /// Media time and drag seeks use the same mapping, so this is the time
    /// the preview was last at when `span` is the previewed duration.
    pub fn playhead_time(&self, span: f64) -> f64 {
        if span.is_finite() && span > 0.0 {
            self.playhead_fraction() * span
        } else {
            0.0
        }
    }

    /// Whether a delayed play is waiting
    pub fn has_pending_play(&self) -> bool {
        self.pending_play.is_some()
    }

    /// Snapshot of the transient state
    pub fn state(&self) -> PlaybackState {
        PlaybackState {
            phase: self.phase,
            active_media_file_id: self.active_media,
            current_sequence_index: self.sequence_index,
            is_sequence_playing: self.sequence_playing,
            zoom_level: self.zoom,
            playhead_offset: self.playhead_px,
        }
    }

    /// Recompute the preview after the timeline changed.
    ///
    /// A delayed play survives when the preview is left as it was. Reloading
    /// or clearing the preview cancels it, so a stale entry cannot start
    /// after the clip list moved on.
    pub fn refresh(
        &mut self,
        timeline: &Timeline,
        registry: &MediaRegistry,
        surface: &mut dyn PreviewSurface,
    ) -> PreviewChange {
        let sequence = timeline.video_sequence(registry);
        let ids: Vec<ClipId> = sequence.iter().map(|c| c.id).collect();

        match sequence.as_slice() {
            [] => {
                self.sequence.clear();
                self.sequence_index = 0;
                self.sequence_playing = false;
                if self.phase == PlaybackPhase::Idle && self.active_media.is_none() {
                    return PreviewChange::Unchanged;
                }
                self.phase = PlaybackPhase::Idle;
                self.active_media = None;
                self.pending_play = None;
                surface.unload();
                tracing::debug!("Preview cleared");
                PreviewChange::Cleared
            }
            [only] => {
                let unchanged = self.phase == PlaybackPhase::SinglePreview
                    && self.active_media == Some(only.media_id)
                    && surface.has_media();
                self.sequence = ids;
                self.sequence_index = 0;
                self.sequence_playing = false;
                self.phase = PlaybackPhase::SinglePreview;
                if unchanged {
                    return PreviewChange::Unchanged;
                }
                self.pending_play = None;
                self.load(only, registry, surface);
                PreviewChange::Single(only.media_id)
            }
            [first, ..] => {
                let in_sequence = matches!(
                    self.phase,
                    PlaybackPhase::SequencePlaying | PlaybackPhase::SequenceComplete
                );
                if in_sequence && self.sequence == ids {
                    return PreviewChange::Unchanged;
                }
                let length = ids.len();
                self.sequence = ids;
                self.sequence_index = 0;
                self.sequence_playing = true;
                self.phase = PlaybackPhase::SequencePlaying;
                self.pending_play = None;
                self.load(first, registry, surface);
                tracing::info!(length, "Video sequence ready");
                PreviewChange::SequenceStarted { length }
            }
        }
    }

    /// Restart sequence playback from the first entry.
    ///
    /// This is the way back out of [`PlaybackPhase::SequenceComplete`].
    pub fn restart_sequence(
        &mut self,
        timeline: &Timeline,
        registry: &MediaRegistry,
        surface: &mut dyn PreviewSurface,
    ) -> PreviewChange {
        self.phase = PlaybackPhase::Idle;
        self.sequence.clear();
        self.refresh(timeline, registry, surface)
    }

    /// Handle the preview's "playback ended" signal
    pub fn on_media_ended(
        &mut self,
        now: Instant,
        timeline: &Timeline,
        registry: &MediaRegistry,
        surface: &mut dyn PreviewSurface,
    ) -> Option<SequenceAdvance> {
        if self.phase != PlaybackPhase::SequencePlaying {
            return None;
        }

        let sequence = timeline.video_sequence(registry);
        let total = sequence.len();
        self.sequence_index += 1;

        if let Some(next) = sequence.get(self.sequence_index) {
            self.load(next, registry, surface);
            self.pending_play = Some(now + self.advance_delay);
            tracing::debug!(index = self.sequence_index, total, "Advancing sequence");
            Some(SequenceAdvance::Next {
                index: self.sequence_index,
                total,
            })
        } else {
            self.phase = PlaybackPhase::SequenceComplete;
            self.sequence_index = 0;
            self.sequence_playing = false;
            self.pending_play = None;
            tracing::info!(total, "Video sequence completed");
            Some(SequenceAdvance::Completed { total })
        }
    }

    /// Issue a delayed play once it is due. Returns whether play was issued.
    pub fn tick(&mut self, now: Instant, surface: &mut dyn PreviewSurface) -> bool {
        match self.pending_play {
            Some(due) if now >= due => {
                self.pending_play = None;
                if surface.has_media() {
                    surface.play();
                    true
                } else {
                    false
                }
            }
            _ => false,
        }
    }

    /// Handle the preview's "time updated" signal
    pub fn on_time_update(&mut self, current_time: f64, duration: f64, surface: &mut dyn PreviewSurface) {
        if self.active_media.is_none() || !duration.is_finite() || duration <= 0.0 {
            return;
        }
        let percent = (current_time / duration) as f32;
        self.set_playhead(percent * self.viewport_width, PlayheadSource::MediaTime, surface);
    }

    /// Move the playhead by dragging it to `offset` pixels
    pub fn drag_playhead(&mut self, offset: f32, surface: &mut dyn PreviewSurface) {
        self.set_playhead(offset, PlayheadSource::Drag, surface);
    }

    /// The only writer of the playhead position.
    ///
    /// A drag seeks the preview to the matching fraction of its duration.
    pub fn set_playhead(&mut self, offset: f32, source: PlayheadSource, surface: &mut dyn PreviewSurface) {
        if offset.is_nan() {
            return;
        }
        self.playhead_px = offset.max(0.0);

        if source == PlayheadSource::Drag {
            if let Some(duration) = surface.duration().filter(|d| d.is_finite() && *d > 0.0) {
                surface.seek(self.playhead_time(duration));
            }
        }
    }

    /// Clamp and apply a zoom level
    pub fn set_zoom(&mut self, level: f32, surface: &mut dyn PreviewSurface) -> ZoomOutcome {
        if !level.is_nan() {
            self.zoom = level.clamp(MIN_ZOOM, MAX_ZOOM);
        }

        let applied = surface.has_media();
        if applied {
            surface.set_scale(self.zoom);
        }
        ZoomOutcome {
            level: self.zoom,
            applied,
        }
    }

    fn load(&mut self, clip: &Clip, registry: &MediaRegistry, surface: &mut dyn PreviewSurface) {
        if let Some(media) = registry.lookup(clip.media_id) {
            surface.load(media);
            self.active_media = Some(media.id);
            tracing::debug!(media = %media.name, "Loaded preview");
        }
    }
}

impl Default for PlaybackCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
