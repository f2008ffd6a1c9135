// SPDX-License-Identifier: MIT OR Apache-2.0
//! Voice effects for the preview.
//!
//! This module provides:
//! - The static voice preset table
//! - Pitch/speed to playback-rate mapping
//! - A fixed delay + feedback + wet/dry graph for echo or reverb
//!
//! Pitch is approximated by changing the playback rate with pitch
//! preservation turned off. Echo and reverb share one delay line, so only
//! one of them is active at a time and echo wins.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use vidstudio_timeline::PreviewSurface;

/// Frequency ratio of one equal-tempered semitone
pub const SEMITONE_RATIO: f64 = 1.05946;

/// Delay used for echo, in seconds
pub const ECHO_DELAY_SECONDS: f64 = 0.3;
/// Upper bound for the echo feedback gain
pub const MAX_ECHO_FEEDBACK: f64 = 0.6;
/// Delay used for reverb, in seconds
pub const REVERB_DELAY_SECONDS: f64 = 0.05;
/// Feedback gain used for reverb
pub const REVERB_FEEDBACK: f64 = 0.4;

/// Pitch slider range in semitones
pub const PITCH_RANGE: (f64, f64) = (-12.0, 12.0);
/// Speed slider range
pub const SPEED_RANGE: (f64, f64) = (0.25, 4.0);

/// Name that means "no preset selected"
pub const NO_PRESET: &str = "none";

/// Effects errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EffectsError {
    /// "none" or an empty selection
    #[error("Please select a voice preset")]
    NoPresetSelected,

    /// Name not in the preset table
    #[error("Unknown voice preset: {0}")]
    UnknownPreset(String),

    /// Nothing loaded to apply effects to
    #[error("No video to apply effects to")]
    NoMedia,
}

/// Result type for effects operations
pub type Result<T> = std::result::Result<T, EffectsError>;

/// A named, fixed vector of voice parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectPreset {
    /// Preset name
    pub name: &'static str,
    /// Pitch shift in semitones
    pub pitch_semitones: f64,
    /// Speed multiplier
    pub speed_multiplier: f64,
    /// Reverb amount, 0-100
    pub reverb_percent: f64,
    /// Echo amount, 0-100
    pub echo_percent: f64,
}

/// The preset table
pub const PRESETS: &[EffectPreset] = &[
    EffectPreset {
        name: "radio",
        pitch_semitones: 2.0,
        speed_multiplier: 1.0,
        reverb_percent: 15.0,
        echo_percent: 5.0,
    },
    EffectPreset {
        name: "robot",
        pitch_semitones: -8.0,
        speed_multiplier: 0.9,
        reverb_percent: 30.0,
        echo_percent: 20.0,
    },
    EffectPreset {
        name: "chipmunk",
        pitch_semitones: 8.0,
        speed_multiplier: 1.3,
        reverb_percent: 0.0,
        echo_percent: 0.0,
    },
    EffectPreset {
        name: "deep",
        pitch_semitones: -6.0,
        speed_multiplier: 0.8,
        reverb_percent: 10.0,
        echo_percent: 0.0,
    },
    EffectPreset {
        name: "echo",
        pitch_semitones: 0.0,
        speed_multiplier: 1.0,
        reverb_percent: 40.0,
        echo_percent: 60.0,
    },
    EffectPreset {
        name: "telephone",
        pitch_semitones: 3.0,
        speed_multiplier: 1.0,
        reverb_percent: 5.0,
        echo_percent: 0.0,
    },
    EffectPreset {
        name: "stadium",
        pitch_semitones: 0.0,
        speed_multiplier: 1.0,
        reverb_percent: 80.0,
        echo_percent: 40.0,
    },
];

/// Find a preset by name (case-insensitive)
pub fn find_preset(name: &str) -> Option<&'static EffectPreset> {
    PRESETS.iter().find(|p| p.name.eq_ignore_ascii_case(name.trim()))
}

/// Playback rate plus whether the output should preserve pitch
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackRate {
    /// Rate multiplier
    pub rate: f64,
    /// Whether pitch preservation stays on
    pub preserves_pitch: bool,
}

/// Map speed and pitch to a playback rate.
///
/// With zero pitch the rate is the speed and pitch is preserved. Otherwise
/// the rate carries the pitch shift and preservation is turned off.
pub fn compute_playback_rate(speed: f64, pitch_semitones: f64) -> PlaybackRate {
    if pitch_semitones == 0.0 {
        PlaybackRate {
            rate: speed,
            preserves_pitch: true,
        }
    } else {
        PlaybackRate {
            rate: speed * SEMITONE_RATIO.powf(pitch_semitones),
            preserves_pitch: false,
        }
    }
}

/// Which effect drives the shared delay line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum DelayMode {
    /// Delay line muted
    #[default]
    Bypass,
    /// Long delay with strong feedback
    Echo,
    /// Short delay standing in for a room
    Reverb,
}

/// Delay node
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct DelayNode {
    /// Delay time in seconds
    pub delay_seconds: f64,
}

/// Gain node
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GainNode {
    /// Linear gain
    pub gain: f64,
}

/// Fixed four-node chain: source -> delay -> feedback -> delay, delay -> wet,
/// source -> dry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EffectGraph {
    /// What the delay line is used for
    pub mode: DelayMode,
    /// Delay line
    pub delay: DelayNode,
    /// Feedback into the delay line
    pub feedback: GainNode,
    /// Delayed signal level
    pub wet: GainNode,
    /// Direct signal level
    pub dry: GainNode,
}

impl EffectGraph {
    /// Graph with the delay line muted
    pub fn bypass() -> Self {
        Self {
            mode: DelayMode::Bypass,
            delay: DelayNode::default(),
            feedback: GainNode { gain: 0.0 },
            wet: GainNode { gain: 0.0 },
            dry: GainNode { gain: 1.0 },
        }
    }

    /// Configure the graph from echo and reverb amounts
    pub fn from_amounts(reverb_percent: f64, echo_percent: f64) -> Self {
        let mut graph = Self::bypass();
        if echo_percent > 0.0 {
            let amount = echo_percent / 100.0;
            graph.mode = DelayMode::Echo;
            graph.delay.delay_seconds = ECHO_DELAY_SECONDS;
            graph.feedback.gain = amount.min(MAX_ECHO_FEEDBACK);
            graph.wet.gain = amount;
        } else if reverb_percent > 0.0 {
            graph.mode = DelayMode::Reverb;
            graph.delay.delay_seconds = REVERB_DELAY_SECONDS;
            graph.feedback.gain = REVERB_FEEDBACK;
            graph.wet.gain = reverb_percent / 100.0;
        }
        graph
    }

    /// Wet level attributable to echo
    pub fn echo_wet_mix(&self) -> f64 {
        if self.mode == DelayMode::Echo {
            self.wet.gain
        } else {
            0.0
        }
    }

    /// Wet level attributable to reverb
    pub fn reverb_wet_mix(&self) -> f64 {
        if self.mode == DelayMode::Reverb {
            self.wet.gain
        } else {
            0.0
        }
    }
}

impl Default for EffectGraph {
    fn default() -> Self {
        Self::bypass()
    }
}

/// Receives the configured effect graph (a Web Audio graph, a mixer, a log)
pub trait AudioEffectSink {
    /// Apply a graph configuration
    fn apply_graph(&mut self, graph: &EffectGraph);
}

/// One adjustable voice parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EffectParam {
    /// Semitones
    Pitch,
    /// Multiplier
    Speed,
    /// Percent
    Reverb,
    /// Percent
    Echo,
}

/// Current voice parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectSettings {
    /// Pitch shift in semitones
    pub pitch_semitones: f64,
    /// Speed multiplier
    pub speed: f64,
    /// Reverb amount, 0-100
    pub reverb_percent: f64,
    /// Echo amount, 0-100
    pub echo_percent: f64,
}

impl Default for EffectSettings {
    fn default() -> Self {
        Self {
            pitch_semitones: 0.0,
            speed: 1.0,
            reverb_percent: 0.0,
            echo_percent: 0.0,
        }
    }
}

impl From<&EffectPreset> for EffectSettings {
    fn from(preset: &EffectPreset) -> Self {
        Self {
            pitch_semitones: preset.pitch_semitones,
            speed: preset.speed_multiplier,
            reverb_percent: preset.reverb_percent,
            echo_percent: preset.echo_percent,
        }
    }
}

impl EffectSettings {
    /// Set one parameter, clamped to its range
    pub fn set(&mut self, param: EffectParam, value: f64) {
        if value.is_nan() {
            return;
        }
        match param {
            EffectParam::Pitch => self.pitch_semitones = value.clamp(PITCH_RANGE.0, PITCH_RANGE.1),
            EffectParam::Speed => self.speed = value.clamp(SPEED_RANGE.0, SPEED_RANGE.1),
            EffectParam::Reverb => self.reverb_percent = value.clamp(0.0, 100.0),
            EffectParam::Echo => self.echo_percent = value.clamp(0.0, 100.0),
        }
    }

    /// Playback rate for these settings
    pub fn playback_rate(&self) -> PlaybackRate {
        compute_playback_rate(self.speed, self.pitch_semitones)
    }

    /// Effect graph for these settings
    pub fn graph(&self) -> EffectGraph {
        EffectGraph::from_amounts(self.reverb_percent, self.echo_percent)
    }
}

/// What [`VoiceEffects::apply`] pushed to the outputs
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AppliedEffects {
    /// Rate sent to the preview
    pub rate: PlaybackRate,
    /// Graph sent to the audio sink
    pub graph: EffectGraph,
}

/// Preset and parameter store
#[derive(Debug, Clone, Default)]
pub struct VoiceEffects {
    settings: EffectSettings,
    preset: Option<&'static str>,
}

impl VoiceEffects {
    /// Create with neutral settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Current settings
    pub fn settings(&self) -> &EffectSettings {
        &self.settings
    }

    /// Name of the last applied preset
    pub fn preset_name(&self) -> Option<&'static str> {
        self.preset
    }

    /// Load a preset into the settings
    pub fn apply_preset(&mut self, name: &str) -> Result<&'static EffectPreset> {
        let trimmed = name.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(NO_PRESET) {
            return Err(EffectsError::NoPresetSelected);
        }
        let preset = find_preset(trimmed).ok_or_else(|| EffectsError::UnknownPreset(trimmed.to_string()))?;
        self.settings = EffectSettings::from(preset);
        self.preset = Some(preset.name);
        tracing::debug!(preset = preset.name, "Voice preset loaded");
        Ok(preset)
    }

    /// Adjust a single parameter; the preset no longer describes the settings
    pub fn set_param(&mut self, param: EffectParam, value: f64) {
        self.settings.set(param, value);
        self.preset = None;
    }

    /// Reset to neutral settings
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Push the current settings to the preview and the audio graph
    pub fn apply(
        &self,
        surface: &mut dyn PreviewSurface,
        sink: &mut dyn AudioEffectSink,
    ) -> Result<AppliedEffects> {
        if !surface.has_media() {
            return Err(EffectsError::NoMedia);
        }
        let rate = self.settings.playback_rate();
        let graph = self.settings.graph();
        surface.set_playback_rate(rate.rate, rate.preserves_pitch);
        sink.apply_graph(&graph);
        tracing::info!(rate = rate.rate, mode = ?graph.mode, "Voice effects applied");
        Ok(AppliedEffects { rate, graph })
    }
}
