// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline model: clips placed on numbered tracks.

use crate::clip::{Clip, ClipId, DEFAULT_CLIP_DURATION};
use crate::media::{MediaId, MediaRegistry};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Timeline errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimelineError {
    /// Split requested on an empty timeline
    #[error("No clip to split")]
    NothingToSplit,

    /// No clip covers the playhead position
    #[error("No clip under the playhead at {0:.2}s")]
    NoClipAtPlayhead(f64),

    /// Clip does not exist
    #[error("Clip not found: {0}")]
    ClipNotFound(ClipId),

    /// Track index out of range
    #[error("Track {index} does not exist ({count} tracks)")]
    TrackOutOfRange {
        /// Requested index
        index: usize,
        /// Current track count
        count: usize,
    },
}

/// Result type for timeline operations
pub type Result<T> = std::result::Result<T, TimelineError>;

/// How a split picks the clip it cuts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SplitStrategy {
    /// Duplicate the most recently inserted clip
    #[default]
    DuplicateLast,
    /// Cut the most recently inserted clip the playhead falls strictly inside
    AtPlayhead,
}

/// The unit of undo/redo: ordered clips plus the track count.
///
/// `track_index < track_count` is not enforced when clips are added.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineState {
    /// Clips in insertion order
    pub clips: Vec<Clip>,
    /// Number of track lanes
    #[serde(rename = "tracks")]
    pub track_count: usize,
}

/// Ordered collection of clips on tracks
#[derive(Debug, Clone)]
pub struct Timeline {
    state: TimelineState,
    default_duration: f64,
}

impl Timeline {
    /// Create a timeline with the given number of empty tracks
    pub fn new(track_count: usize) -> Self {
        Self {
            state: TimelineState {
                clips: Vec::new(),
                track_count,
            },
            default_duration: DEFAULT_CLIP_DURATION,
        }
    }

    /// Set the duration given to newly added clips
    pub fn with_default_duration(mut self, duration: f64) -> Self {
        if duration > 0.0 {
            self.default_duration = duration;
        }
        self
    }

    /// Current state
    pub fn state(&self) -> &TimelineState {
        &self.state
    }

    /// Replace the whole state (clear-then-rebuild)
    pub fn replace_state(&mut self, state: TimelineState) {
        self.state = state;
    }

    /// All clips in insertion order
    pub fn clips(&self) -> &[Clip] {
        &self.state.clips
    }

    /// Number of tracks
    pub fn track_count(&self) -> usize {
        self.state.track_count
    }

    /// Number of clips
    pub fn clip_count(&self) -> usize {
        self.state.clips.len()
    }

    /// Get a clip
    pub fn clip(&self, id: ClipId) -> Option<&Clip> {
        self.state.clips.iter().find(|c| c.id == id)
    }

    /// Append a clip at time zero with the default duration.
    ///
    /// Overlaps with clips on the same track are allowed.
    pub fn add_clip(&mut self, media_id: MediaId, track_index: usize, registry: &MediaRegistry) -> Clip {
        let name = registry
            .lookup(media_id)
            .map_or_else(|| "Untitled clip".to_string(), |m| m.name.clone());
        let clip = Clip::new(media_id, name, track_index, self.default_duration);
        self.state.clips.push(clip.clone());
        clip
    }

    /// Split according to `strategy`, returning the derived clip
    pub fn split_at_playhead(&mut self, playhead: f64, strategy: SplitStrategy) -> Result<Clip> {
        if self.state.clips.is_empty() {
            return Err(TimelineError::NothingToSplit);
        }

        let derived = match strategy {
            SplitStrategy::DuplicateLast => {
                let last = self.state.clips.last().ok_or(TimelineError::NothingToSplit)?;
                last.duplicate()
            }
            SplitStrategy::AtPlayhead => self
                .state
                .clips
                .iter_mut()
                .rev()
                .find_map(|c| c.split_at(playhead))
                .ok_or(TimelineError::NoClipAtPlayhead(playhead))?,
        };

        self.state.clips.push(derived.clone());
        Ok(derived)
    }

    /// Add a track and return its index
    pub fn add_track(&mut self) -> usize {
        self.state.track_count += 1;
        self.state.track_count - 1
    }

    /// Remove a track, deleting its clips and shifting higher tracks down.
    ///
    /// Returns the removed clips.
    pub fn remove_track(&mut self, index: usize) -> Result<Vec<Clip>> {
        if index >= self.state.track_count {
            return Err(TimelineError::TrackOutOfRange {
                index,
                count: self.state.track_count,
            });
        }

        let (removed, kept): (Vec<Clip>, Vec<Clip>) = std::mem::take(&mut self.state.clips)
            .into_iter()
            .partition(|c| c.track_index == index);

        self.state.clips = kept
            .into_iter()
            .map(|mut c| {
                if c.track_index > index {
                    c.track_index -= 1;
                }
                c
            })
            .collect();
        self.state.track_count -= 1;
        Ok(removed)
    }

    /// Remove a clip
    pub fn remove_clip(&mut self, id: ClipId) -> Result<Clip> {
        let idx = self.position(id)?;
        Ok(self.state.clips.remove(idx))
    }

    /// Move a clip to a new position in insertion order
    pub fn move_clip(&mut self, id: ClipId, new_index: usize) -> Result<()> {
        let idx = self.position(id)?;
        let clip = self.state.clips.remove(idx);
        let new_index = new_index.min(self.state.clips.len());
        self.state.clips.insert(new_index, clip);
        Ok(())
    }

    /// Put a clip on another track
    pub fn set_clip_track(&mut self, id: ClipId, track_index: usize) -> Result<()> {
        if track_index >= self.state.track_count {
            return Err(TimelineError::TrackOutOfRange {
                index: track_index,
                count: self.state.track_count,
            });
        }
        let idx = self.position(id)?;
        self.state.clips[idx].track_index = track_index;
        Ok(())
    }

    /// Clips whose media resolves to a video, in insertion order
    pub fn video_sequence<'a>(&'a self, registry: &MediaRegistry) -> Vec<&'a Clip> {
        self.state
            .clips
            .iter()
            .filter(|c| registry.lookup(c.media_id).is_some_and(|m| m.is_video()))
            .collect()
    }

    /// Clips on one track, in insertion order
    pub fn clips_on_track(&self, track_index: usize) -> impl Iterator<Item = &Clip> {
        self.state
            .clips
            .iter()
            .filter(move |c| c.track_index == track_index)
    }

    /// Clips that can be rendered: on an existing track with resolvable media
    pub fn renderable_clips<'a>(&'a self, registry: &'a MediaRegistry) -> impl Iterator<Item = &'a Clip> {
        let track_count = self.state.track_count;
        self.state
            .clips
            .iter()
            .filter(move |c| c.track_index < track_count && registry.contains(c.media_id))
    }

    /// End of the last clip
    pub fn content_duration(&self) -> f64 {
        self.state
            .clips
            .iter()
            .map(Clip::end_time)
            .fold(0.0, f64::max)
    }

    fn position(&self, id: ClipId) -> Result<usize> {
        self.state
            .clips
            .iter()
            .position(|c| c.id == id)
            .ok_or(TimelineError::ClipNotFound(id))
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaImport;

    fn registry_with(kinds: &[(&str, &str)]) -> (MediaRegistry, Vec<MediaId>) {
        let mut registry = MediaRegistry::new();
        let ids = kinds
            .iter()
            .map(|(name, mime)| registry.import(MediaImport::from_bytes(*name, *mime, vec![0])).id)
            .collect();
        (registry, ids)
    }

    #[test]
    fn test_add_clip_appends_with_defaults() {
        let (registry, ids) = registry_with(&[("a.mp4", "video/mp4")]);
        let mut timeline = Timeline::new(1);
        let clip = timeline.add_clip(ids[0], 0, &registry);
        assert_eq!(clip.name, "a.mp4");
        assert_eq!(clip.duration, DEFAULT_CLIP_DURATION);
        assert_eq!(clip.start_time, 0.0);
        assert_eq!(timeline.clip_count(), 1);
    }

    #[test]
    fn test_add_clip_allows_overlap_and_dangling_media() {
        let (registry, ids) = registry_with(&[("a.mp4", "video/mp4")]);
        let mut timeline = Timeline::new(1);
        timeline.add_clip(ids[0], 0, &registry);
        timeline.add_clip(ids[0], 0, &registry);
        let dangling = timeline.add_clip(MediaId::new(), 0, &registry);
        assert_eq!(timeline.clip_count(), 3);
        assert_eq!(dangling.name, "Untitled clip");
        assert_eq!(timeline.renderable_clips(&registry).count(), 2);
    }

    #[test]
    fn test_split_empty_timeline_fails() {
        let mut timeline = Timeline::new(1);
        assert_eq!(
            timeline.split_at_playhead(0.0, SplitStrategy::DuplicateLast),
            Err(TimelineError::NothingToSplit)
        );
        assert_eq!(
            timeline.split_at_playhead(0.0, SplitStrategy::AtPlayhead),
            Err(TimelineError::NothingToSplit)
        );
    }

    #[test]
    fn test_split_duplicates_last_clip() {
        let (registry, ids) = registry_with(&[("a.mp4", "video/mp4"), ("b.mp4", "video/mp4")]);
        let mut timeline = Timeline::new(2);
        timeline.add_clip(ids[0], 0, &registry);
        let last = timeline.add_clip(ids[1], 1, &registry);

        let derived = timeline.split_at_playhead(1.0, SplitStrategy::DuplicateLast).unwrap();
        assert_eq!(derived.media_id, last.media_id);
        assert_eq!(derived.name, "b.mp4 (Part 2)");
        assert_ne!(derived.id, last.id);
        assert_eq!(timeline.clips().last(), Some(&derived));
    }

    #[test]
    fn test_split_at_playhead_cuts_covering_clip() {
        let (registry, ids) = registry_with(&[("a.mp4", "video/mp4")]);
        let mut timeline = Timeline::new(1);
        let first = timeline.add_clip(ids[0], 0, &registry);

        let derived = timeline.split_at_playhead(2.0, SplitStrategy::AtPlayhead).unwrap();
        assert_eq!(derived.start_time, 2.0);
        assert_eq!(derived.duration, 3.0);
        assert_eq!(timeline.clip(first.id).unwrap().duration, 2.0);

        assert_eq!(
            timeline.split_at_playhead(9.0, SplitStrategy::AtPlayhead),
            Err(TimelineError::NoClipAtPlayhead(9.0))
        );
    }

    #[test]
    fn test_split_at_playhead_skips_clip_starting_there() {
        let media = MediaId::new();
        let older = Clip::new(media, "older.mp4", 0, 5.0);
        let mut newer = Clip::new(media, "newer.mp4", 0, 5.0);
        newer.start_time = 3.0;
        let mut timeline = Timeline::new(1);
        timeline.replace_state(TimelineState {
            clips: vec![older.clone(), newer.clone()],
            track_count: 1,
        });

        let derived = timeline.split_at_playhead(3.0, SplitStrategy::AtPlayhead).unwrap();
        assert_eq!(derived.name, "older.mp4 (Part 2)");
        assert_eq!(derived.start_time, 3.0);
        assert_eq!(timeline.clip(older.id).unwrap().duration, 3.0);
        assert_eq!(timeline.clip(newer.id), Some(&newer));
    }

    #[test]
    fn test_remove_track_cascades_and_shifts() {
        let (registry, ids) = registry_with(&[("a.mp4", "video/mp4")]);
        let mut timeline = Timeline::new(3);
        let on0 = timeline.add_clip(ids[0], 0, &registry);
        let on1 = timeline.add_clip(ids[0], 1, &registry);
        let on2 = timeline.add_clip(ids[0], 2, &registry);

        let removed = timeline.remove_track(1).unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].id, on1.id);
        assert_eq!(timeline.track_count(), 2);
        assert_eq!(timeline.clip(on0.id).unwrap().track_index, 0);
        assert_eq!(timeline.clip(on2.id).unwrap().track_index, 1);

        assert!(matches!(
            timeline.remove_track(5),
            Err(TimelineError::TrackOutOfRange { index: 5, count: 2 })
        ));
    }

    #[test]
    fn test_video_sequence_keeps_insertion_order() {
        let (registry, ids) = registry_with(&[
            ("a.mp4", "video/mp4"),
            ("b.mp3", "audio/mpeg"),
            ("c.webm", "video/webm"),
        ]);
        let mut timeline = Timeline::new(1);
        let c = timeline.add_clip(ids[2], 0, &registry);
        timeline.add_clip(ids[1], 0, &registry);
        timeline.add_clip(MediaId::new(), 0, &registry);
        let a = timeline.add_clip(ids[0], 0, &registry);

        let sequence: Vec<ClipId> = timeline.video_sequence(&registry).iter().map(|c| c.id).collect();
        assert_eq!(sequence, vec![c.id, a.id]);
    }

    #[test]
    fn test_move_and_retrack_clip() {
        let (registry, ids) = registry_with(&[("a.mp4", "video/mp4")]);
        let mut timeline = Timeline::new(2);
        let a = timeline.add_clip(ids[0], 0, &registry);
        let b = timeline.add_clip(ids[0], 0, &registry);

        timeline.move_clip(b.id, 0).unwrap();
        assert_eq!(timeline.clips()[0].id, b.id);
        assert_eq!(timeline.clips()[1].id, a.id);

        timeline.set_clip_track(a.id, 1).unwrap();
        assert_eq!(timeline.clips_on_track(1).count(), 1);
        assert!(timeline.set_clip_track(a.id, 4).is_err());
        assert!(timeline.move_clip(ClipId::new(), 0).is_err());
    }

    #[test]
    fn test_content_duration() {
        let (registry, ids) = registry_with(&[("a.mp4", "video/mp4")]);
        let mut timeline = Timeline::new(1);
        assert_eq!(timeline.content_duration(), 0.0);
        timeline.add_clip(ids[0], 0, &registry);
        timeline.split_at_playhead(1.0, SplitStrategy::AtPlayhead).unwrap();
        assert_eq!(timeline.content_duration(), 5.0);
    }
}
