// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor state management.
//!
//! [`EditorState`] is the one context object every operation goes through.
//! It owns the media registry, the timeline, the undo history, the playback
//! coordinator and the voice effects, and holds the collaborators that the
//! outside world supplies (preview surface, audio sink, notifications,
//! project store).
//!
//! Every successful timeline edit is followed by a history snapshot and a
//! preview refresh, in that order.

use crate::commands::{
    AddClipCommand, AddTrackCommand, MoveClipCommand, RemoveClipCommand, RemoveTrackCommand,
    SplitClipCommand, TimelineCommand,
};
use crate::config::EditorConfig;
use crate::effects::{
    AppliedEffects, AudioEffectSink, EffectParam, EffectPreset, EffectSettings, VoiceEffects,
};
use crate::error::EditorError;
use crate::export::{plan_export, ExportPlan};
use crate::history::{History, HistoryStats};
use crate::notify::{NotificationLog, NotificationSink, Severity, TracingSink};
use crate::preview::HeadlessPreview;
use crate::project::{ProjectData, ProjectId, ProjectStore};
use serde::Serialize;
use std::time::Instant;
use vidstudio_timeline::{
    Clip, ClipId, MediaFile, MediaId, MediaImport, MediaRegistry, PlaybackCoordinator, PlaybackState,
    PreviewChange, PreviewSurface, SequenceAdvance, Timeline, TimelineState, ZoomOutcome,
};

/// Result type for editor operations
pub type Result<T> = std::result::Result<T, EditorError>;

/// Serializable view of everything the editor holds
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorSnapshot {
    /// Imported media in import order
    pub media_files: Vec<MediaFile>,
    /// Clips and tracks
    pub timeline: TimelineState,
    /// Preview state
    pub playback: PlaybackState,
    /// Undo history summary
    pub history: HistoryStats,
    /// Current voice settings
    pub effects: EffectSettings,
    /// Last applied preset
    pub preset: Option<&'static str>,
}

/// The editor context
pub struct EditorState {
    config: EditorConfig,
    registry: MediaRegistry,
    timeline: Timeline,
    history: History,
    playback: PlaybackCoordinator,
    effects: VoiceEffects,
    surface: Box<dyn PreviewSurface>,
    audio: Box<dyn AudioEffectSink>,
    notifier: Box<dyn NotificationSink>,
    store: Option<Box<dyn ProjectStore>>,
}

impl EditorState {
    /// Create an editor around the given collaborators
    pub fn new(
        config: EditorConfig,
        surface: Box<dyn PreviewSurface>,
        audio: Box<dyn AudioEffectSink>,
        notifier: Box<dyn NotificationSink>,
    ) -> Self {
        let timeline = Timeline::new(1).with_default_duration(config.default_clip_duration);
        let history = History::with_max_depth(config.history_depth);
        let playback = PlaybackCoordinator::new()
            .with_advance_delay(config.advance_delay())
            .with_viewport_width(config.viewport_width);

        Self {
            config,
            registry: MediaRegistry::new(),
            timeline,
            history,
            playback,
            effects: VoiceEffects::new(),
            surface,
            audio,
            notifier,
            store: None,
        }
    }

    /// Create an editor wired to a [`HeadlessPreview`] and a [`NotificationLog`].
    ///
    /// Returns handles to both so callers can observe what happened.
    pub fn headless(config: EditorConfig) -> (Self, HeadlessPreview, NotificationLog) {
        let preview = HeadlessPreview::new();
        let log = NotificationLog::new(config.notification_capacity);
        let editor = Self::new(
            config,
            Box::new(preview.clone()),
            Box::new(preview.clone()),
            Box::new((TracingSink, log.clone())),
        );
        (editor, preview, log)
    }

    /// Attach a persistence backend
    pub fn with_project_store(mut self, store: Box<dyn ProjectStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Settings
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Imported media
    pub fn registry(&self) -> &MediaRegistry {
        &self.registry
    }

    /// The timeline
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Undo history
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Playback coordinator
    pub fn playback(&self) -> &PlaybackCoordinator {
        &self.playback
    }

    /// Voice effects
    pub fn effects(&self) -> &VoiceEffects {
        &self.effects
    }

    /// Serializable summary of the current state
    pub fn snapshot(&self) -> EditorSnapshot {
        EditorSnapshot {
            media_files: self.registry.files().cloned().collect(),
            timeline: self.timeline.state().clone(),
            playback: self.playback.state(),
            history: self.history.stats(),
            effects: *self.effects.settings(),
            preset: self.effects.preset_name(),
        }
    }

    /// Import a file. Videos go straight onto the timeline when configured.
    pub fn import_media(&mut self, import: MediaImport) -> Result<MediaFile> {
        let media = self.registry.import(import);
        self.notify(&format!("Added {}", media.name), Severity::Success);

        if media.is_video() && self.config.auto_add_video_imports {
            // Each imported video lands on the track matching the clip count
            let track_index = self.timeline.clip_count();
            self.execute(&AddClipCommand {
                media_id: media.id,
                track_index,
            })?;
        }
        Ok(media)
    }

    /// Place a media file on a track
    pub fn add_clip(&mut self, media_id: MediaId, track_index: usize) -> Result<Clip> {
        let clip = self.execute(&AddClipCommand { media_id, track_index })?;
        self.notify(&format!("Clip added: {}", clip.name), Severity::Success);
        Ok(clip)
    }

    /// Split at the current playhead using the configured strategy
    pub fn split(&mut self) -> Result<Clip> {
        let command = SplitClipCommand {
            playhead: self.playhead_seconds(),
            strategy: self.config.split_strategy,
        };
        let clip = self.execute(&command)?;
        self.notify("Clip split at playhead", Severity::Success);
        Ok(clip)
    }

    /// Append a track
    pub fn add_track(&mut self) -> Result<usize> {
        let index = self.execute(&AddTrackCommand)?;
        self.notify("New track added", Severity::Success);
        Ok(index)
    }

    /// Remove a track together with its clips
    pub fn remove_track(&mut self, track_index: usize) -> Result<Vec<Clip>> {
        let removed = self.execute(&RemoveTrackCommand { track_index })?;
        self.notify(
            &format!("Track {} removed ({} clips)", track_index + 1, removed.len()),
            Severity::Success,
        );
        Ok(removed)
    }

    /// Delete a clip
    pub fn remove_clip(&mut self, clip_id: ClipId) -> Result<Clip> {
        let clip = self.execute(&RemoveClipCommand { clip_id })?;
        self.notify(&format!("Removed {}", clip.name), Severity::Success);
        Ok(clip)
    }

    /// Reorder a clip and/or put it on another track
    pub fn move_clip(&mut self, clip_id: ClipId, index: Option<usize>, track_index: Option<usize>) -> Result<()> {
        self.execute(&MoveClipCommand {
            clip_id,
            index,
            track_index,
        })?;
        self.notify("Clip moved", Severity::Success);
        Ok(())
    }

    /// Run a timeline command, then snapshot and refresh the preview
    pub fn execute<C: TimelineCommand>(&mut self, command: &C) -> Result<C::Output> {
        let output = match command.execute(&mut self.timeline, &self.registry) {
            Ok(output) => output,
            Err(e) => return Err(self.report(e.into())),
        };

        if let Err(e) = self.history.snapshot(self.timeline.state(), command.description()) {
            return Err(self.report(e.into()));
        }
        tracing::debug!(
            command = command.description(),
            entries = self.history.len(),
            "Recorded history entry"
        );

        self.refresh_preview();
        Ok(output)
    }

    /// Ordered video clips that make up the preview sequence
    pub fn video_sequence(&self) -> Vec<&Clip> {
        self.timeline.video_sequence(&self.registry)
    }

    /// Step back one history entry
    pub fn undo(&mut self) -> Result<()> {
        match self.history.undo() {
            Ok(state) => {
                self.restore(state);
                self.notify("Undid last action", Severity::Info);
                Ok(())
            }
            Err(e) => Err(self.report_with(e.into(), Severity::Info)),
        }
    }

    /// Step forward one history entry
    pub fn redo(&mut self) -> Result<()> {
        match self.history.redo() {
            Ok(state) => {
                self.restore(state);
                self.notify("Redid last action", Severity::Info);
                Ok(())
            }
            Err(e) => Err(self.report_with(e.into(), Severity::Info)),
        }
    }

    fn restore(&mut self, state: TimelineState) {
        // Clear-then-rebuild, including the track count
        self.timeline.replace_state(state);
        self.refresh_preview();
    }

    fn refresh_preview(&mut self) -> PreviewChange {
        let change = self
            .playback
            .refresh(&self.timeline, &self.registry, self.surface.as_mut());
        if let PreviewChange::SequenceStarted { length } = change {
            self.notify(&format!("Video sequence ready: {length} videos"), Severity::Success);
        }
        change
    }

    /// Start the video sequence over from its first clip
    pub fn restart_sequence(&mut self) -> PreviewChange {
        let change = self
            .playback
            .restart_sequence(&self.timeline, &self.registry, self.surface.as_mut());
        if let PreviewChange::SequenceStarted { length } = change {
            self.notify(&format!("Video sequence ready: {length} videos"), Severity::Success);
        }
        change
    }

    /// The preview reached the end of its media
    pub fn media_ended(&mut self, now: Instant) -> Option<SequenceAdvance> {
        let advance = self
            .playback
            .on_media_ended(now, &self.timeline, &self.registry, self.surface.as_mut());
        match advance {
            Some(SequenceAdvance::Next { index, total }) => {
                self.notify(&format!("Playing video {}/{}", index + 1, total), Severity::Info);
            }
            Some(SequenceAdvance::Completed { .. }) => {
                self.notify("Video sequence completed!", Severity::Success);
            }
            None => {}
        }
        advance
    }

    /// Issue any delayed play that is due
    pub fn tick(&mut self, now: Instant) -> bool {
        self.playback.tick(now, self.surface.as_mut())
    }

    /// The preview reported a new media time
    pub fn time_update(&mut self, current_time: f64, duration: f64) {
        self.playback
            .on_time_update(current_time, duration, self.surface.as_mut());
    }

    /// The user dragged the playhead to `offset` pixels
    pub fn drag_playhead(&mut self, offset: f32) {
        self.playback.drag_playhead(offset, self.surface.as_mut());
    }

    /// Playhead position in timeline seconds.
    ///
    /// The viewport spans the timeline content, the same mapping media time
    /// and drag seeks use.
    pub fn playhead_seconds(&self) -> f64 {
        self.playback.playhead_time(self.timeline.content_duration())
    }

    /// Width of a clip in timeline pixels at the current zoom
    pub fn clip_pixel_width(&self, clip: &Clip) -> f64 {
        clip.duration * self.config.pixels_per_second * f64::from(self.playback.zoom())
    }

    /// Set the zoom level.
    ///
    /// The level is kept even without loaded media; the surface just has
    /// nothing to scale, which is reported as an error notice.
    pub fn set_zoom(&mut self, level: f32) -> ZoomOutcome {
        let outcome = self.playback.set_zoom(level, self.surface.as_mut());
        let percent = (outcome.level * 100.0).round();
        self.notify(&format!("Zoom: {percent}%"), Severity::Info);
        if !outcome.applied {
            self.notify("No media to zoom", Severity::Error);
        }
        outcome
    }

    /// Zoom in by one step
    pub fn zoom_in(&mut self) -> ZoomOutcome {
        self.set_zoom(self.playback.zoom() + self.config.zoom_step)
    }

    /// Zoom out by one step
    pub fn zoom_out(&mut self) -> ZoomOutcome {
        self.set_zoom(self.playback.zoom() - self.config.zoom_step)
    }

    /// Load a named preset into the effect settings
    pub fn apply_preset(&mut self, name: &str) -> Result<&'static EffectPreset> {
        match self.effects.apply_preset(name) {
            Ok(preset) => {
                self.notify(&format!("Voice preset selected: {}", preset.name), Severity::Info);
                Ok(preset)
            }
            Err(e) => Err(self.report(e.into())),
        }
    }

    /// Adjust one voice parameter.
    ///
    /// Speed goes straight to loaded media with pitch preserved; everything
    /// else waits for [`apply_effects`](Self::apply_effects).
    pub fn set_effect_param(&mut self, param: EffectParam, value: f64) {
        self.effects.set_param(param, value);
        match param {
            EffectParam::Pitch => {
                let pitch = self.effects.settings().pitch_semitones;
                self.notify(&format!("Pitch: {pitch:+}"), Severity::Info);
            }
            EffectParam::Speed if self.surface.has_media() => {
                let speed = self.effects.settings().speed;
                self.surface.set_playback_rate(speed, true);
                tracing::debug!(speed, "Speed applied to preview");
            }
            _ => {}
        }
    }

    /// Push the voice settings to the preview and the audio graph
    pub fn apply_effects(&mut self) -> Result<AppliedEffects> {
        match self.effects.apply(self.surface.as_mut(), self.audio.as_mut()) {
            Ok(applied) => {
                let label = self.effects.preset_name().unwrap_or("custom");
                self.notify(
                    &format!("Applied {label} effect! Playback rate: {:.2}x", applied.rate.rate),
                    Severity::Success,
                );
                Ok(applied)
            }
            Err(e) => Err(self.report(e.into())),
        }
    }

    /// Current media and clips as a project payload
    pub fn project_data(&self) -> ProjectData {
        ProjectData::capture(self.registry.files(), self.timeline.state())
    }

    /// Save through the attached store
    pub fn save_project(&mut self, name: &str) -> Result<ProjectId> {
        let data = self.project_data();
        let Some(store) = self.store.as_mut() else {
            return Err(self.report(EditorError::NoProjectStore));
        };
        match store.save(name, &data) {
            Ok(id) => {
                self.notify("Project saved!", Severity::Success);
                Ok(id)
            }
            Err(e) => {
                tracing::warn!("Saving project failed: {e}");
                Err(self.report(e.into()))
            }
        }
    }

    /// Load a project from the attached store
    pub fn load_project(&mut self, id: ProjectId) -> Result<()> {
        let Some(store) = self.store.as_ref() else {
            return Err(self.report(EditorError::NoProjectStore));
        };
        let document = match store.load(id) {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!(%id, "Loading project failed: {e}");
                return Err(self.report(e.into()));
            }
        };
        self.load_project_data(document.data)?;
        self.notify(&format!("Project loaded: {}", document.name), Severity::Success);
        Ok(())
    }

    /// Replace media and timeline with a saved payload.
    ///
    /// History starts over with the loaded state as its only entry.
    pub fn load_project_data(&mut self, data: ProjectData) -> Result<()> {
        let state = data.timeline_state();
        self.registry.restore(data.media_files);
        self.timeline.replace_state(state);
        self.history.clear();
        if let Err(e) = self.history.snapshot(self.timeline.state(), "Load project") {
            return Err(self.report(e.into()));
        }
        self.refresh_preview();
        Ok(())
    }

    /// Plan the export of the video sequence
    pub fn export_plan(&mut self) -> Result<ExportPlan> {
        let Some(plan) = plan_export(&self.timeline, &self.registry) else {
            return Err(self.report(EditorError::NothingToExport));
        };
        match &plan {
            ExportPlan::Single(item) => {
                self.notify(&format!("Exporting {}", item.file_name), Severity::Success);
            }
            ExportPlan::Parts(items) => {
                self.notify(
                    &format!("Preparing to export {} combined videos...", items.len()),
                    Severity::Info,
                );
            }
        }
        Ok(plan)
    }

    fn notify(&self, message: &str, severity: Severity) {
        self.notifier.notify(message, severity);
    }

    fn report(&self, err: EditorError) -> EditorError {
        self.report_with(err, Severity::Error)
    }

    fn report_with(&self, err: EditorError, severity: Severity) -> EditorError {
        self.notify(&err.to_string(), severity);
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::MemoryProjectStore;
    use vidstudio_timeline::{PlaybackPhase, SplitStrategy};

    fn video(name: &str) -> MediaImport {
        MediaImport::from_bytes(name, "video/mp4", vec![0; 4])
    }

    #[test]
    fn test_import_video_auto_adds_clip() {
        let (mut editor, preview, log) = EditorState::headless(EditorConfig::default());
        let media = editor.import_media(video("a.mp4")).unwrap();

        assert_eq!(editor.timeline().clip_count(), 1);
        assert_eq!(editor.history().len(), 1);
        assert_eq!(editor.playback().phase(), PlaybackPhase::SinglePreview);
        assert_eq!(preview.loaded(), Some(media.id));
        assert_eq!(log.entries()[0].message, "Added a.mp4");
    }

    #[test]
    fn test_import_without_auto_add() {
        let config = EditorConfig {
            auto_add_video_imports: false,
            ..Default::default()
        };
        let (mut editor, _, _) = EditorState::headless(config);
        editor.import_media(video("a.mp4")).unwrap();
        assert_eq!(editor.timeline().clip_count(), 0);
        assert!(editor.history().is_empty());
    }

    #[test]
    fn test_audio_import_stays_in_library() {
        let (mut editor, preview, _) = EditorState::headless(EditorConfig::default());
        editor
            .import_media(MediaImport::from_bytes("song.mp3", "audio/mpeg", vec![1]))
            .unwrap();
        assert_eq!(editor.registry().len(), 1);
        assert_eq!(editor.timeline().clip_count(), 0);
        assert!(!preview.has_media());
    }

    #[test]
    fn test_failed_split_leaves_history_alone() {
        let (mut editor, _, log) = EditorState::headless(EditorConfig::default());
        let err = editor.split().unwrap_err();
        assert!(err.is_no_op());
        assert!(editor.history().is_empty());
        let last = log.last().unwrap();
        assert_eq!(last.message, "No clip to split");
        assert_eq!(last.severity, Severity::Error);
    }

    #[test]
    fn test_split_at_playhead_strategy_uses_drag_position() {
        let config = EditorConfig {
            split_strategy: SplitStrategy::AtPlayhead,
            auto_add_video_imports: false,
            ..Default::default()
        };
        let (mut editor, _, _) = EditorState::headless(config);
        let media = editor.import_media(video("a.mp4")).unwrap();
        let clip = editor.add_clip(media.id, 0).unwrap();

        // 400px of a 1000px viewport over a 5s clip is two seconds in
        editor.drag_playhead(400.0);
        let derived = editor.split().unwrap();
        assert_eq!(derived.start_time, 2.0);
        assert_eq!(editor.timeline().clip(clip.id).unwrap().duration, 2.0);
    }

    #[test]
    fn test_split_at_playhead_follows_media_time() {
        let config = EditorConfig {
            split_strategy: SplitStrategy::AtPlayhead,
            ..Default::default()
        };
        let (mut editor, _, _) = EditorState::headless(config);
        let media = editor.import_media(video("a.mp4")).unwrap();

        editor.time_update(2.5, 5.0);
        assert_eq!(editor.playhead_seconds(), 2.5);

        // Zoom changes clip widths, not where the playhead points
        editor.set_zoom(2.0);
        let derived = editor.split().unwrap();
        assert_eq!(derived.start_time, 2.5);
        assert_eq!(derived.media_id, media.id);
        assert_eq!(editor.timeline().clips()[0].duration, 2.5);
    }

    #[test]
    fn test_speed_slider_reaches_loaded_media() {
        let (mut editor, preview, _) = EditorState::headless(EditorConfig::default());
        editor.set_effect_param(EffectParam::Speed, 1.5);
        assert_eq!(preview.record().playback_rate, 1.0);

        editor.import_media(video("a.mp4")).unwrap();
        editor.set_effect_param(EffectParam::Pitch, 4.0);
        assert_eq!(preview.record().playback_rate, 1.0);
        editor.set_effect_param(EffectParam::Speed, 2.0);
        let record = preview.record();
        assert_eq!(record.playback_rate, 2.0);
        assert!(record.preserves_pitch);
    }

    #[test]
    fn test_undo_notices_are_info() {
        let (mut editor, _, log) = EditorState::headless(EditorConfig::default());
        assert!(editor.undo().is_err());
        assert!(editor.redo().is_err());
        let entries = log.entries();
        assert_eq!(entries[0].message, "Nothing to undo");
        assert_eq!(entries[1].message, "Nothing to redo");
        assert!(entries.iter().all(|n| n.severity == Severity::Info));
    }

    #[test]
    fn test_undo_refreshes_preview() {
        let (mut editor, preview, _) = EditorState::headless(EditorConfig::default());
        let first = editor.import_media(video("a.mp4")).unwrap();
        editor.import_media(video("b.mp4")).unwrap();
        assert_eq!(editor.playback().phase(), PlaybackPhase::SequencePlaying);

        editor.undo().unwrap();
        assert_eq!(editor.timeline().clip_count(), 1);
        assert_eq!(editor.playback().phase(), PlaybackPhase::SinglePreview);
        assert_eq!(preview.loaded(), Some(first.id));
    }

    #[test]
    fn test_zoom_without_media_keeps_level() {
        let (mut editor, _, log) = EditorState::headless(EditorConfig::default());
        let outcome = editor.set_zoom(2.0);
        assert_eq!(outcome.level, 2.0);
        assert!(!outcome.applied);
        assert_eq!(log.last().unwrap().message, "No media to zoom");

        editor.zoom_out();
        assert!((editor.playback().zoom() - 1.9).abs() < 1e-6);
    }

    #[test]
    fn test_effects_need_loaded_media() {
        let (mut editor, preview, _) = EditorState::headless(EditorConfig::default());
        editor.apply_preset("robot").unwrap();
        assert!(editor.apply_effects().is_err());

        editor.import_media(video("a.mp4")).unwrap();
        let applied = editor.apply_effects().unwrap();
        let record = preview.record();
        assert_eq!(record.playback_rate, applied.rate.rate);
        assert!(!record.preserves_pitch);
        assert!(record.graph.unwrap().echo_wet_mix() > 0.0);
    }

    #[test]
    fn test_save_requires_store() {
        let (mut editor, _, _) = EditorState::headless(EditorConfig::default());
        assert!(matches!(editor.save_project("x"), Err(EditorError::NoProjectStore)));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let (editor, _, _) = EditorState::headless(EditorConfig::default());
        let mut editor = editor.with_project_store(Box::new(MemoryProjectStore::new()));
        editor.import_media(video("a.mp4")).unwrap();
        editor.add_track().unwrap();
        let saved = editor.timeline().state().clone();
        let id = editor.save_project("Demo").unwrap();

        editor.import_media(video("b.mp4")).unwrap();
        editor.load_project(id).unwrap();

        assert_eq!(editor.timeline().state(), &saved);
        assert_eq!(editor.registry().len(), 1);
        assert_eq!(editor.history().len(), 1);
        assert!(!editor.history().can_undo());
    }

    #[test]
    fn test_export_plan_needs_video() {
        let (mut editor, _, log) = EditorState::headless(EditorConfig::default());
        assert!(matches!(editor.export_plan(), Err(EditorError::NothingToExport)));
        assert_eq!(log.last().unwrap().message, "No videos to combine");

        editor.import_media(video("a.mp4")).unwrap();
        editor.import_media(video("b.mp4")).unwrap();
        assert_eq!(editor.export_plan().unwrap().items().len(), 2);
    }
}
