// SPDX-License-Identifier: MIT OR Apache-2.0
//! Clip definitions for the timeline.

use crate::media::MediaId;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Default duration given to a freshly placed clip, in seconds
pub const DEFAULT_CLIP_DURATION: f64 = 5.0;

/// Base horizontal scale of the timeline at zoom 1.0
pub const PIXELS_PER_SECOND: f64 = 20.0;

/// Suffix appended to the name of the clip produced by a split
pub const SPLIT_SUFFIX: &str = " (Part 2)";

/// Shortest piece a split is allowed to leave behind
const MIN_SPLIT_PIECE: f64 = 0.001;

/// Unique identifier for a clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClipId(pub Uuid);

impl ClipId {
    /// Create a new random clip ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClipId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A placed reference to a media file on a track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clip {
    /// Unique clip ID
    pub id: ClipId,
    /// Referenced media (not owned; may dangle)
    #[serde(rename = "fileId")]
    pub media_id: MediaId,
    /// Display name
    pub name: String,
    /// Track lane
    #[serde(rename = "track")]
    pub track_index: usize,
    /// Start time in seconds
    pub start_time: f64,
    /// Duration in seconds, always positive
    pub duration: f64,
}

impl Clip {
    /// Create a clip at time zero with the given duration
    pub fn new(media_id: MediaId, name: impl Into<String>, track_index: usize, duration: f64) -> Self {
        Self {
            id: ClipId::new(),
            media_id,
            name: name.into(),
            track_index,
            start_time: 0.0,
            duration: if duration > 0.0 { duration } else { DEFAULT_CLIP_DURATION },
        }
    }

    /// End time in seconds (exclusive)
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    /// Whether `time` falls inside `[start, end)`
    pub fn contains_time(&self, time: f64) -> bool {
        time >= self.start_time && time < self.end_time()
    }

    /// Rendered width in pixels at the given zoom
    pub fn pixel_width(&self, zoom: f32) -> f64 {
        pixel_width(self.duration, zoom)
    }

    /// Copy of this clip with a fresh id and the split suffix
    pub fn duplicate(&self) -> Self {
        Self {
            id: ClipId::new(),
            name: format!("{}{}", self.name, SPLIT_SUFFIX),
            ..self.clone()
        }
    }

    /// Cut this clip at `time`.
    ///
    /// Shortens `self` to end at `time` and returns the remainder as a new
    /// clip, or `None` when `time` is not strictly inside the clip.
    pub fn split_at(&mut self, time: f64) -> Option<Clip> {
        let head = time - self.start_time;
        let tail = self.end_time() - time;
        if head < MIN_SPLIT_PIECE || tail < MIN_SPLIT_PIECE {
            return None;
        }

        let mut rest = self.duplicate();
        rest.start_time = time;
        rest.duration = tail;
        self.duration = head;
        Some(rest)
    }
}

/// Width in pixels of `duration` seconds at `zoom`
pub fn pixel_width(duration: f64, zoom: f32) -> f64 {
    duration * PIXELS_PER_SECOND * f64::from(zoom)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(start: f64, duration: f64) -> Clip {
        let mut clip = Clip::new(MediaId::new(), "shot.mp4", 0, duration);
        clip.start_time = start;
        clip
    }

    #[test]
    fn test_new_clip_defaults() {
        let c = Clip::new(MediaId::new(), "a.mp4", 2, DEFAULT_CLIP_DURATION);
        assert_eq!(c.start_time, 0.0);
        assert_eq!(c.duration, 5.0);
        assert_eq!(c.track_index, 2);

        let fixed = Clip::new(MediaId::new(), "b.mp4", 0, -1.0);
        assert_eq!(fixed.duration, DEFAULT_CLIP_DURATION);
    }

    #[test]
    fn test_pixel_width_scales_with_zoom() {
        let c = clip(0.0, 5.0);
        assert_eq!(c.pixel_width(1.0), 100.0);
        assert_eq!(c.pixel_width(0.5), 50.0);
        assert_eq!(c.pixel_width(3.0), 300.0);
    }

    #[test]
    fn test_duplicate_gets_new_id_and_suffix() {
        let c = clip(1.0, 5.0);
        let d = c.duplicate();
        assert_ne!(c.id, d.id);
        assert_eq!(d.name, "shot.mp4 (Part 2)");
        assert_eq!(d.media_id, c.media_id);
        assert_eq!(d.start_time, c.start_time);
    }

    #[test]
    fn test_split_at_divides_clip() {
        let mut c = clip(2.0, 5.0);
        let rest = c.split_at(4.5).unwrap();
        assert_eq!(c.duration, 2.5);
        assert_eq!(rest.start_time, 4.5);
        assert_eq!(rest.duration, 2.5);
        assert_eq!(rest.end_time(), 7.0);
    }

    #[test]
    fn test_split_outside_clip_is_rejected() {
        let mut c = clip(2.0, 5.0);
        assert!(c.split_at(2.0).is_none());
        assert!(c.split_at(7.0).is_none());
        assert!(c.split_at(10.0).is_none());
        assert_eq!(c.duration, 5.0);
    }

    #[test]
    fn test_contains_time_is_half_open() {
        let c = clip(1.0, 2.0);
        assert!(c.contains_time(1.0));
        assert!(c.contains_time(2.999));
        assert!(!c.contains_time(3.0));
        assert!(!c.contains_time(0.5));
    }

    #[test]
    fn test_serialized_field_names() {
        let c = clip(0.0, 5.0);
        let json = serde_json::to_value(&c).unwrap();
        assert!(json.get("fileId").is_some());
        assert!(json.get("track").is_some());
        assert!(json.get("startTime").is_some());
    }
}
