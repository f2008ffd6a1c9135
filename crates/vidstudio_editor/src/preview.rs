// SPDX-License-Identifier: MIT OR Apache-2.0
//! Headless preview surface and audio sink.
//!
//! [`HeadlessPreview`] stands in for the video element and the audio graph
//! when no UI is attached. It records every call so the session runner can
//! print what a real surface would have shown. Clones share one record.

use crate::effects::{AudioEffectSink, EffectGraph};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use vidstudio_timeline::{MediaFile, MediaId, PreviewSurface};

/// Everything the headless surface was asked to do
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRecord {
    /// Loaded media
    pub loaded: Option<MediaId>,
    /// Name of the loaded media
    pub loaded_name: Option<String>,
    /// Every media id passed to `load`, in order
    pub load_history: Vec<MediaId>,
    /// Number of `play` calls
    pub plays: usize,
    /// Current position in seconds
    pub position: f64,
    /// Every seek target
    pub seeks: Vec<f64>,
    /// Scale transform
    pub scale: f32,
    /// Playback rate
    pub playback_rate: f64,
    /// Whether pitch is preserved
    pub preserves_pitch: bool,
    /// Last effect graph received
    pub graph: Option<EffectGraph>,
}

impl Default for PreviewRecord {
    fn default() -> Self {
        Self {
            loaded: None,
            loaded_name: None,
            load_history: Vec::new(),
            plays: 0,
            position: 0.0,
            seeks: Vec::new(),
            scale: 1.0,
            playback_rate: 1.0,
            preserves_pitch: true,
            graph: None,
        }
    }
}

/// Recording preview surface
#[derive(Debug, Clone)]
pub struct HeadlessPreview {
    record: Arc<Mutex<PreviewRecord>>,
    media_duration: Option<f64>,
}

impl HeadlessPreview {
    /// Create a surface that reports no duration
    pub fn new() -> Self {
        Self {
            record: Arc::new(Mutex::new(PreviewRecord::default())),
            media_duration: None,
        }
    }

    /// Report `seconds` as the duration of any loaded media
    pub fn with_media_duration(mut self, seconds: f64) -> Self {
        self.media_duration = Some(seconds);
        self
    }

    /// Copy of the record
    pub fn record(&self) -> PreviewRecord {
        self.record.lock().clone()
    }

    /// Media currently loaded
    pub fn loaded(&self) -> Option<MediaId> {
        self.record.lock().loaded
    }
}

impl Default for HeadlessPreview {
    fn default() -> Self {
        Self::new()
    }
}

impl PreviewSurface for HeadlessPreview {
    fn load(&mut self, media: &MediaFile) {
        let mut record = self.record.lock();
        record.loaded = Some(media.id);
        record.loaded_name = Some(media.name.clone());
        record.load_history.push(media.id);
        record.position = 0.0;
    }

    fn unload(&mut self) {
        let mut record = self.record.lock();
        record.loaded = None;
        record.loaded_name = None;
        record.position = 0.0;
    }

    fn play(&mut self) {
        self.record.lock().plays += 1;
    }

    fn seek(&mut self, seconds: f64) {
        let mut record = self.record.lock();
        record.position = seconds;
        record.seeks.push(seconds);
    }

    fn duration(&self) -> Option<f64> {
        self.record.lock().loaded.and(self.media_duration)
    }

    fn set_scale(&mut self, scale: f32) {
        self.record.lock().scale = scale;
    }

    fn set_playback_rate(&mut self, rate: f64, preserves_pitch: bool) {
        let mut record = self.record.lock();
        record.playback_rate = rate;
        record.preserves_pitch = preserves_pitch;
    }

    fn has_media(&self) -> bool {
        self.record.lock().loaded.is_some()
    }
}

impl AudioEffectSink for HeadlessPreview {
    fn apply_graph(&mut self, graph: &EffectGraph) {
        self.record.lock().graph = Some(*graph);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidstudio_timeline::{MediaImport, MediaRegistry};

    #[test]
    fn test_clones_share_record() {
        let mut registry = MediaRegistry::new();
        let media = registry.import(MediaImport::from_bytes("a.mp4", "video/mp4", vec![0]));

        let observer = HeadlessPreview::new().with_media_duration(8.0);
        let mut surface = observer.clone();
        assert_eq!(surface.duration(), None);

        surface.load(&media);
        surface.seek(2.0);
        surface.set_playback_rate(1.5, false);
        assert_eq!(observer.loaded(), Some(media.id));
        assert_eq!(observer.duration(), Some(8.0));

        let record = observer.record();
        assert_eq!(record.position, 2.0);
        assert_eq!(record.playback_rate, 1.5);
        assert!(!record.preserves_pitch);

        surface.unload();
        assert!(!observer.has_media());
    }

    #[test]
    fn test_records_graph() {
        let mut surface = HeadlessPreview::new();
        surface.apply_graph(&EffectGraph::from_amounts(0.0, 50.0));
        assert_eq!(surface.record().graph.unwrap().wet.gain, 0.5);
    }
}
