// SPDX-License-Identifier: MIT OR Apache-2.0
//! Project persistence.
//!
//! A project is the media list plus the clip list, exchanged as JSON with
//! camelCase keys. Stores hand out a [`ProjectId`] on save. Blob bytes are
//! not part of a project, only the descriptors.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use uuid::Uuid;
use vidstudio_timeline::{Clip, MediaFile, TimelineState};

/// Current project document format version
pub const PROJECT_FORMAT_VERSION: u32 = 1;

/// Extension of project documents in a [`FileProjectStore`]
pub const PROJECT_EXTENSION: &str = "json";

/// Project errors
#[derive(Debug, Error)]
pub enum ProjectError {
    /// File system failure
    #[error("Project I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Document is not valid JSON
    #[error("Project JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Document written by a newer editor
    #[error("Project version {found} is newer than supported version {supported}")]
    VersionTooNew {
        /// Version in the document
        found: u32,
        /// Highest version this build reads
        supported: u32,
    },

    /// No project with that id
    #[error("Project not found: {0}")]
    NotFound(ProjectId),
}

/// Result type for project operations
pub type Result<T> = std::result::Result<T, ProjectError>;

/// Identifier handed out by a store on save
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectId(pub Uuid);

impl ProjectId {
    /// Create a new random project ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ProjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn default_track_count() -> usize {
    1
}

/// The saved payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectData {
    /// Imported media descriptors
    pub media_files: Vec<MediaFile>,
    /// Clips in insertion order
    pub timeline_clips: Vec<Clip>,
    /// Number of tracks
    #[serde(default = "default_track_count")]
    pub track_count: usize,
}

impl ProjectData {
    /// Build the payload from live editor data
    pub fn capture<'a>(media: impl IntoIterator<Item = &'a MediaFile>, timeline: &TimelineState) -> Self {
        Self {
            media_files: media.into_iter().cloned().collect(),
            timeline_clips: timeline.clips.clone(),
            track_count: timeline.track_count,
        }
    }

    /// Timeline part of the payload
    pub fn timeline_state(&self) -> TimelineState {
        TimelineState {
            clips: self.timeline_clips.clone(),
            track_count: self.track_count,
        }
    }
}

/// A stored project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDocument {
    /// Format version
    pub version: u32,
    /// Project ID
    pub id: ProjectId,
    /// Display name
    pub name: String,
    /// Unix timestamp of the save, in seconds
    pub saved_at: u64,
    /// Payload
    pub data: ProjectData,
}

impl ProjectDocument {
    /// Create a document stamped with the current time
    pub fn new(id: ProjectId, name: impl Into<String>, data: ProjectData) -> Self {
        Self {
            version: PROJECT_FORMAT_VERSION,
            id,
            name: name.into(),
            saved_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            data,
        }
    }

    /// Parse a JSON document
    pub fn from_json(content: &str) -> Result<Self> {
        let document: ProjectDocument = serde_json::from_str(content)?;

        // Version check
        if document.version > PROJECT_FORMAT_VERSION {
            return Err(ProjectError::VersionTooNew {
                found: document.version,
                supported: PROJECT_FORMAT_VERSION,
            });
        }

        Ok(document)
    }

    /// Render as pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Listing entry for this document
    pub fn summary(&self) -> ProjectSummary {
        ProjectSummary {
            id: self.id,
            name: self.name.clone(),
            saved_at: self.saved_at,
            clip_count: self.data.timeline_clips.len(),
        }
    }
}

/// Listing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    /// Project ID
    pub id: ProjectId,
    /// Display name
    pub name: String,
    /// Unix timestamp of the save
    pub saved_at: u64,
    /// Number of clips
    pub clip_count: usize,
}

/// Persistence backend for projects
pub trait ProjectStore {
    /// Store a project and return its id
    fn save(&mut self, name: &str, data: &ProjectData) -> Result<ProjectId>;

    /// Fetch a stored project
    fn load(&self, id: ProjectId) -> Result<ProjectDocument>;

    /// All stored projects, most recent first
    fn list(&self) -> Result<Vec<ProjectSummary>>;
}

fn sort_recent_first(summaries: &mut [ProjectSummary]) {
    summaries.sort_by(|a, b| b.saved_at.cmp(&a.saved_at).then_with(|| a.name.cmp(&b.name)));
}

/// Store that keeps projects in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryProjectStore {
    documents: IndexMap<ProjectId, ProjectDocument>,
}

impl MemoryProjectStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored projects
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl ProjectStore for MemoryProjectStore {
    fn save(&mut self, name: &str, data: &ProjectData) -> Result<ProjectId> {
        let id = ProjectId::new();
        self.documents
            .insert(id, ProjectDocument::new(id, name, data.clone()));
        Ok(id)
    }

    fn load(&self, id: ProjectId) -> Result<ProjectDocument> {
        self.documents.get(&id).cloned().ok_or(ProjectError::NotFound(id))
    }

    fn list(&self) -> Result<Vec<ProjectSummary>> {
        let mut summaries: Vec<_> = self.documents.values().map(ProjectDocument::summary).collect();
        sort_recent_first(&mut summaries);
        Ok(summaries)
    }
}

/// Store that writes one JSON document per project into a directory
#[derive(Debug, Clone)]
pub struct FileProjectStore {
    root: PathBuf,
}

impl FileProjectStore {
    /// Use `root` as the project directory, creating it if needed
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Project directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a project document
    pub fn document_path(&self, id: ProjectId) -> PathBuf {
        self.root.join(format!("{id}.{PROJECT_EXTENSION}"))
    }
}

impl ProjectStore for FileProjectStore {
    fn save(&mut self, name: &str, data: &ProjectData) -> Result<ProjectId> {
        let id = ProjectId::new();
        let document = ProjectDocument::new(id, name, data.clone());
        let path = self.document_path(id);
        std::fs::write(&path, document.to_json()?)?;
        tracing::info!(%id, path = %path.display(), "Project saved");
        Ok(id)
    }

    fn load(&self, id: ProjectId) -> Result<ProjectDocument> {
        let path = self.document_path(id);
        if !path.exists() {
            return Err(ProjectError::NotFound(id));
        }
        let content = std::fs::read_to_string(&path)?;
        ProjectDocument::from_json(&content)
    }

    fn list(&self) -> Result<Vec<ProjectSummary>> {
        let mut summaries = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(PROJECT_EXTENSION) {
                continue;
            }
            let content = std::fs::read_to_string(&path)?;
            match ProjectDocument::from_json(&content) {
                Ok(document) => summaries.push(document.summary()),
                Err(e) => tracing::warn!(path = %path.display(), "Skipping unreadable project: {e}"),
            }
        }
        sort_recent_first(&mut summaries);
        Ok(summaries)
    }
}
