//! Package data types shared by the catalog, the archive reader and storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lowercased lookup key for ids and versions.
///
/// Identity comparisons in the feed are case-insensitive and go through this
/// key rather than locale-aware comparison.
pub fn normalize_key(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Metadata read from an archive's embedded manifest.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest {
    pub id: String,
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub authors: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
}

/// A parsed package archive, ready to be handed to storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageArchive {
    pub manifest: PackageManifest,
    /// Filename the archive was uploaded under
    pub source_filename: String,
}

impl PackageArchive {
    pub fn id(&self) -> &str {
        &self.manifest.id
    }

    pub fn version(&self) -> &str {
        &self.manifest.version
    }
}

/// One stored package version.
///
/// Created once at push time from the manifest plus the fields assigned by
/// storage, and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageRecord {
    pub id: String,
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub authors: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    /// Archive filename inside the package's storage directory
    pub filename: String,
    /// Archive size in bytes
    pub size: u64,
    /// Lowercase hex SHA256 of the archive
    pub sha256: String,
    pub published: DateTime<Utc>,
}

impl PackageRecord {
    pub fn from_manifest(
        manifest: PackageManifest,
        filename: String,
        size: u64,
        sha256: String,
        published: DateTime<Utc>,
    ) -> Self {
        Self {
            id: manifest.id,
            version: manifest.version,
            description: manifest.description,
            authors: manifest.authors,
            title: manifest.title,
            tags: manifest.tags,
            filename,
            size,
            sha256,
            published,
        }
    }

    /// Case-insensitive grouping key for this record's id
    pub fn key(&self) -> String {
        normalize_key(&self.id)
    }

    pub fn has_id(&self, id: &str) -> bool {
        self.key() == normalize_key(id)
    }

    /// Case-insensitive exact match on id and version
    pub fn matches(&self, id: &str, version: &str) -> bool {
        self.has_id(id) && normalize_key(&self.version) == normalize_key(version)
    }

    /// Case-insensitive substring match against id or description
    pub fn matches_query(&self, needle: &str) -> bool {
        self.key().contains(needle) || self.description.to_lowercase().contains(needle)
    }
}
