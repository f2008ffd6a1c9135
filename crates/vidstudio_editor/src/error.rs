// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor error type.

use crate::commands::CommandError;
use crate::config::ConfigError;
use crate::effects::EffectsError;
use crate::history::HistoryError;
use crate::project::ProjectError;
use thiserror::Error;
use vidstudio_timeline::TimelineError;

/// Errors returned by [`EditorState`](crate::state::EditorState) operations
#[derive(Debug, Error)]
pub enum EditorError {
    /// Undo/redo failed
    #[error(transparent)]
    History(#[from] HistoryError),

    /// Timeline rejected an edit
    #[error(transparent)]
    Timeline(#[from] TimelineError),

    /// Preset or effects request rejected
    #[error(transparent)]
    Effects(#[from] EffectsError),

    /// Persistence failed
    #[error(transparent)]
    Project(#[from] ProjectError),

    /// Config could not be read
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Export requested without any video on the timeline
    #[error("No videos to combine")]
    NothingToExport,

    /// No persistence backend attached
    #[error("No project store configured")]
    NoProjectStore,
}

impl From<CommandError> for EditorError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::Timeline(e) => Self::Timeline(e),
        }
    }
}

impl EditorError {
    /// Whether the request was simply not applicable and nothing changed
    pub fn is_no_op(&self) -> bool {
        matches!(
            self,
            Self::History(HistoryError::NothingToUndo | HistoryError::NothingToRedo)
                | Self::Timeline(TimelineError::NothingToSplit | TimelineError::NoClipAtPlayhead(_))
                | Self::Effects(_)
                | Self::NothingToExport
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_op_classification() {
        assert!(EditorError::from(HistoryError::NothingToUndo).is_no_op());
        assert!(EditorError::from(CommandError::Timeline(TimelineError::NothingToSplit)).is_no_op());
        assert!(EditorError::from(EffectsError::NoMedia).is_no_op());
        assert!(!EditorError::NoProjectStore.is_no_op());
        assert_eq!(EditorError::NothingToExport.to_string(), "No videos to combine");
    }
}
