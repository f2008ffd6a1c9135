// SPDX-License-Identifier: MIT OR Apache-2.0
//! Export planning.
//!
//! No encoding happens here. A single video exports as itself; a sequence
//! exports as numbered parts in sequence order.

use serde::Serialize;
use vidstudio_timeline::{MediaId, MediaRegistry, Timeline};

/// One file to hand to the download/encode collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportItem {
    /// Source media
    pub media_id: MediaId,
    /// Where the bytes come from
    pub source: String,
    /// Suggested output file name
    pub file_name: String,
}

/// What an export produces
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "items")]
pub enum ExportPlan {
    /// The one video on the timeline
    Single(ExportItem),
    /// Every video of the sequence, in order
    Parts(Vec<ExportItem>),
}

impl ExportPlan {
    /// Items in output order
    pub fn items(&self) -> &[ExportItem] {
        match self {
            Self::Single(item) => std::slice::from_ref(item),
            Self::Parts(items) => items,
        }
    }
}

/// Plan the export of the timeline's video sequence.
///
/// Returns `None` when there is no video to export.
pub fn plan_export(timeline: &Timeline, registry: &MediaRegistry) -> Option<ExportPlan> {
    let files: Vec<_> = timeline
        .video_sequence(registry)
        .into_iter()
        .filter_map(|clip| registry.lookup(clip.media_id))
        .collect();

    match files.as_slice() {
        [] => None,
        [only] => Some(ExportPlan::Single(ExportItem {
            media_id: only.id,
            source: only.locator.uri().to_string(),
            file_name: format!("exported-{}", only.name),
        })),
        many => Some(ExportPlan::Parts(
            many.iter()
                .enumerate()
                .map(|(i, file)| ExportItem {
                    media_id: file.id,
                    source: file.locator.uri().to_string(),
                    file_name: format!("combined-part-{}-{}", i + 1, file.name),
                })
                .collect(),
        )),
    }
}
