// SPDX-License-Identifier: MIT OR Apache-2.0
//! Media registry holding imported media descriptors.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Unique identifier for an imported media file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaId(pub Uuid);

impl MediaId {
    /// Create a new random media ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MediaId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Broad media category derived from the MIME type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    /// `video/*`
    Video,
    /// `audio/*`
    Audio,
    /// `image/*`
    Image,
    /// Anything else
    Other,
}

impl MediaKind {
    /// Classify a MIME type string
    pub fn from_mime(mime_type: &str) -> Self {
        let major = mime_type
            .split('/')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match major.as_str() {
            "video" => Self::Video,
            "audio" => Self::Audio,
            "image" => Self::Image,
            _ => Self::Other,
        }
    }

    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Video => "Video",
            Self::Audio => "Audio",
            Self::Image => "Image",
            Self::Other => "Other",
        }
    }
}

/// Where the bytes of a media file can be obtained.
///
/// Blob locators point at bytes held by the registry for the lifetime of the
/// session; upload locators point at a URL handed out by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MediaLocator {
    /// Session-local byte buffer
    Blob(String),
    /// Server-provided upload URL
    Upload(String),
}

impl MediaLocator {
    /// Blob locator for a media id
    pub fn blob_for(id: MediaId) -> Self {
        Self::Blob(format!("blob:vidstudio/{id}"))
    }

    /// The URI string
    pub fn uri(&self) -> &str {
        match self {
            Self::Blob(uri) | Self::Upload(uri) => uri,
        }
    }
}

/// An imported media file. Immutable after import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaFile {
    /// Unique media ID
    pub id: MediaId,
    /// Original file name
    pub name: String,
    /// MIME type as reported at import
    pub mime_type: String,
    /// Size in bytes
    pub size_bytes: u64,
    /// Byte-stream locator
    pub locator: MediaLocator,
}

impl MediaFile {
    /// Get the media kind
    pub fn kind(&self) -> MediaKind {
        MediaKind::from_mime(&self.mime_type)
    }

    /// Whether this media is a video
    pub fn is_video(&self) -> bool {
        self.kind() == MediaKind::Video
    }
}

/// Raw bytes plus metadata handed to [`MediaRegistry::import`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaImport {
    /// File name
    pub name: String,
    /// MIME type
    pub mime_type: String,
    /// File contents, when held locally
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes: Option<Vec<u8>>,
    /// Declared size, used when no bytes are supplied
    #[serde(default)]
    pub size_bytes: u64,
    /// Upload URL, when the bytes live on the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_url: Option<String>,
}

impl MediaImport {
    /// Import from an in-memory buffer
    pub fn from_bytes(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size_bytes: bytes.len() as u64,
            bytes: Some(bytes),
            upload_url: None,
        }
    }

    /// Import a file that was uploaded to the server
    pub fn uploaded(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        size_bytes: u64,
        url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes: None,
            size_bytes,
            upload_url: Some(url.into()),
        }
    }
}

/// Session-lifetime store of imported media.
///
/// Iteration follows import order. There is no removal.
#[derive(Debug, Clone, Default)]
pub struct MediaRegistry {
    files: IndexMap<MediaId, MediaFile>,
    blobs: HashMap<MediaLocator, Arc<[u8]>>,
}

impl MediaRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Import a file and assign it an id and locator
    pub fn import(&mut self, import: MediaImport) -> MediaFile {
        let id = MediaId::new();
        let MediaImport {
            name,
            mime_type,
            bytes,
            size_bytes,
            upload_url,
        } = import;

        let (locator, size_bytes) = match (upload_url, bytes) {
            (Some(url), bytes) => {
                let size = bytes.map_or(size_bytes, |b| b.len() as u64);
                (MediaLocator::Upload(url), size)
            }
            (None, Some(bytes)) => {
                let locator = MediaLocator::blob_for(id);
                let size = bytes.len() as u64;
                self.blobs.insert(locator.clone(), Arc::from(bytes));
                (locator, size)
            }
            (None, None) => (MediaLocator::blob_for(id), size_bytes),
        };

        let file = MediaFile {
            id,
            name,
            mime_type,
            size_bytes,
            locator,
        };
        tracing::debug!(id = %file.id, name = %file.name, kind = file.kind().name(), "Imported media");
        self.files.insert(id, file.clone());
        file
    }

    /// Look up a media file
    pub fn lookup(&self, id: MediaId) -> Option<&MediaFile> {
        self.files.get(&id)
    }

    /// Whether a media id resolves
    pub fn contains(&self, id: MediaId) -> bool {
        self.files.contains_key(&id)
    }

    /// Bytes held for a locator, if they live in this session
    pub fn bytes(&self, locator: &MediaLocator) -> Option<Arc<[u8]>> {
        self.blobs.get(locator).cloned()
    }

    /// All files in import order
    pub fn files(&self) -> impl Iterator<Item = &MediaFile> {
        self.files.values()
    }

    /// Number of imported files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether nothing has been imported
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Replace the registry contents with previously saved descriptors.
    ///
    /// Bytes of blob locators do not survive a save, so only descriptors
    /// come back.
    pub fn restore(&mut self, files: impl IntoIterator<Item = MediaFile>) {
        self.files.clear();
        self.blobs.clear();
        for file in files {
            self.files.insert(file.id, file);
        }
    }
}
