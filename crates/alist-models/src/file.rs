//! Resolved file metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::FsObject;

/// Metadata for one remote file, sufficient to pick and render a preview.
///
/// Fetched fresh for every preview request and never cached.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RemoteFileDescriptor {
    /// Absolute remote path the descriptor was resolved from.
    pub path: String,
    /// File name without directory.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Whether the object is a directory.
    pub is_directory: bool,
    /// Modification time exactly as the backend sent it.
    pub modified_at: String,
    /// URL serving the raw content.
    pub raw_url: String,
}

impl RemoteFileDescriptor {
    /// Map a backend object onto a descriptor.
    ///
    /// Fields are copied verbatim. When the backend omits `raw_url` (or
    /// sends an empty one), the download URL `{base_url}/d{path}` is used.
    pub fn from_fs_object(path: &str, object: FsObject, base_url: &str) -> Self {
        let raw_url = object
            .raw_url
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| download_url(base_url, path));

        Self {
            path: path.to_string(),
            name: object.name,
            size: object.size,
            is_directory: object.is_dir,
            modified_at: object.modified,
            raw_url,
        }
    }

    /// Parsed modification time, if the backend sent RFC 3339.
    pub fn modified_time(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.modified_at)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }

    /// Lower-cased extension of [`name`](Self::name), without the dot.
    pub fn extension(&self) -> Option<String> {
        self.name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
    }
}

/// Deterministic download URL for a path: `{base_url}/d{path}`.
pub fn download_url(base_url: &str, path: &str) -> String {
    format!("{}/d{}", base_url.trim_end_matches('/'), path)
}
