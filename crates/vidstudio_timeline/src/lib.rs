// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline model for the VidStudio editor.
//!
//! This crate provides the in-memory editing model:
//! - Media registry of imported files
//! - Clips placed on numbered tracks
//! - Video sequence derivation for continuous preview
//! - Playback coordination with a single preview surface
//!
//! ## Architecture
//!
//! The model is plain data plus a coordinator:
//! - [`TimelineState`] is a value type, cheap to snapshot for undo/redo
//! - Clips reference media by id and tolerate dangling references
//! - [`PreviewSurface`] abstracts the media element being driven

pub mod clip;
pub mod media;
pub mod playback;
pub mod timeline;

pub use clip::{Clip, ClipId, DEFAULT_CLIP_DURATION, PIXELS_PER_SECOND};
pub use media::{MediaFile, MediaId, MediaImport, MediaKind, MediaLocator, MediaRegistry};
pub use playback::{
    PlaybackCoordinator, PlaybackPhase, PlaybackState, PlayheadSource, PreviewChange,
    PreviewSurface, SequenceAdvance, ZoomOutcome, MAX_ZOOM, MIN_ZOOM,
};
pub use timeline::{SplitStrategy, Timeline, TimelineError, TimelineState};
