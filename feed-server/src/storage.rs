//! # Durable Storage
//!
//! The [`StorageGateway`] trait is the catalog's only path to persisted
//! packages. Gateways answer with a [`FeedResponse`] so their status and
//! message can be passed to callers verbatim.
//!
//! [`FileSystemStorage`] keeps each package version in its own directory
//! under the data directory:
//!
//! ```text
//! <data_dir>/packages/
//!   mytestpackage/
//!     1.0.1/
//!       mytestpackage.1.0.1.nupkg
//!       package.json
//! ```
//!
//! `package.json` holds the serialized [`PackageRecord`] and is written after
//! the archive, so a version directory without it is never listed.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::error::{FeedError, FeedResult};
use crate::response::{FeedResponse, FeedStatus};
use crate::types::{normalize_key, PackageArchive, PackageRecord};
use crate::validation::validate_filename;
use crate::{archive::PACKAGE_EXTENSION, sha256_hash};

const RECORD_FILE: &str = "package.json";

/// Persistence capability used by the catalog.
#[async_trait]
pub trait StorageGateway: Send + Sync {
    /// Persist an archive and return the record created for it.
    async fn save(&self, archive: &PackageArchive, content: &[u8]) -> FeedResponse<PackageRecord>;

    /// Enumerate every stored record. `NotFound` when nothing is stored.
    async fn read(&self) -> FeedResponse<Vec<PackageRecord>>;

    /// Raw archive bytes for a stored record.
    async fn open(&self, record: &PackageRecord) -> FeedResponse<Vec<u8>>;
}

/// Stores packages in a directory tree on the local filesystem.
#[derive(Debug, Clone)]
pub struct FileSystemStorage {
    root: PathBuf,
}

impl FileSystemStorage {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            root: data_dir.as_ref().join("packages"),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn version_dir(&self, id: &str, version: &str) -> FeedResult<PathBuf> {
        let id = normalize_key(id);
        let version = normalize_key(version);
        validate_filename(&id)?;
        validate_filename(&version)?;
        Ok(self.root.join(id).join(version))
    }

    async fn try_save(&self, archive: &PackageArchive, content: &[u8]) -> FeedResult<PackageRecord> {
        let dir = self.version_dir(archive.id(), archive.version())?;
        let filename = format!(
            "{}.{}{}",
            normalize_key(archive.id()),
            normalize_key(archive.version()),
            PACKAGE_EXTENSION
        );
        validate_filename(&filename)?;

        fs::create_dir_all(&dir).await?;
        debug!(dir = %dir.display(), "Created package directory");

        let archive_path = dir.join(&filename);
        fs::write(&archive_path, content).await?;

        let record = PackageRecord::from_manifest(
            archive.manifest.clone(),
            filename,
            content.len() as u64,
            sha256_hash(content),
            Utc::now(),
        );
        fs::write(dir.join(RECORD_FILE), serde_json::to_vec_pretty(&record)?).await?;

        info!(
            id = %record.id,
            version = %record.version,
            path = %archive_path.display(),
            size = record.size,
            "Package saved"
        );
        Ok(record)
    }

    async fn try_read(&self) -> FeedResult<Vec<PackageRecord>> {
        if !fs::try_exists(&self.root).await? {
            debug!(root = %self.root.display(), "Package directory does not exist");
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        let mut id_dirs = fs::read_dir(&self.root).await?;
        while let Some(id_entry) = id_dirs.next_entry().await? {
            if !id_entry.file_type().await?.is_dir() {
                continue;
            }

            let mut version_dirs = fs::read_dir(id_entry.path()).await?;
            while let Some(version_entry) = version_dirs.next_entry().await? {
                let record_path = version_entry.path().join(RECORD_FILE);
                if !fs::try_exists(&record_path).await? {
                    continue;
                }

                let bytes = fs::read(&record_path).await?;
                match serde_json::from_slice::<PackageRecord>(&bytes) {
                    Ok(record) => records.push(record),
                    Err(e) => {
                        warn!(path = %record_path.display(), error = %e, "Skipping unreadable package record");
                    }
                }
            }
        }

        records.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok(records)
    }

    async fn try_open(&self, record: &PackageRecord) -> FeedResult<Vec<u8>> {
        validate_filename(&record.filename)?;
        let path = self
            .version_dir(&record.id, &record.version)?
            .join(&record.filename);

        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "Package archive missing from storage");
                Err(FeedError::NotFound(format!(
                    "Archive for {} {} not found",
                    record.id, record.version
                )))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl StorageGateway for FileSystemStorage {
    async fn save(&self, archive: &PackageArchive, content: &[u8]) -> FeedResponse<PackageRecord> {
        FeedResponse::from_result(self.try_save(archive, content).await)
    }

    async fn read(&self) -> FeedResponse<Vec<PackageRecord>> {
        match self.try_read().await {
            Ok(records) if records.is_empty() => {
                FeedResponse::failure(FeedStatus::NotFound, "No packages found")
            }
            result => FeedResponse::from_result(result),
        }
    }

    async fn open(&self, record: &PackageRecord) -> FeedResponse<Vec<u8>> {
        FeedResponse::from_result(self.try_open(record).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PackageManifest;
    use tempfile::TempDir;

    fn archive(id: &str, version: &str) -> PackageArchive {
        PackageArchive {
            manifest: PackageManifest {
                id: id.to_string(),
                version: version.to_string(),
                description: format!("{id} description"),
                authors: "tests".to_string(),
                ..Default::default()
            },
            source_filename: format!("{id}.{version}.nupkg"),
        }
    }

    #[tokio::test]
    async fn test_read_empty_storage_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileSystemStorage::new(temp_dir.path());

        let response = storage.read().await;
        assert_eq!(response.status(), FeedStatus::NotFound);
        assert!(response.payload().is_none());
    }

    #[tokio::test]
    async fn test_save_assigns_storage_fields() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileSystemStorage::new(temp_dir.path());
        let content = b"archive bytes";

        let response = storage.save(&archive("MyTestPackage", "1.0.0"), content).await;
        assert!(response.is_success());
        let record = response.into_payload().unwrap();

        assert_eq!(record.id, "MyTestPackage");
        assert_eq!(record.filename, "mytestpackage.1.0.0.nupkg");
        assert_eq!(record.size, content.len() as u64);
        assert_eq!(record.sha256, sha256_hash(content));

        let on_disk = storage
            .root()
            .join("mytestpackage/1.0.0/mytestpackage.1.0.0.nupkg");
        assert_eq!(std::fs::read(on_disk).unwrap(), content);
    }

    #[tokio::test]
    async fn test_read_returns_saved_records() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileSystemStorage::new(temp_dir.path());

        storage.save(&archive("A", "1.0.0"), b"a1").await;
        storage.save(&archive("A", "1.0.1"), b"a2").await;
        storage.save(&archive("B", "2.0.0"), b"b1").await;

        let records = storage.read().await.into_payload().unwrap();
        assert_eq!(records.len(), 3);
        assert!(records.iter().any(|r| r.matches("b", "2.0.0")));
    }

    #[tokio::test]
    async fn test_incomplete_version_dirs_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileSystemStorage::new(temp_dir.path());
        std::fs::create_dir_all(storage.root().join("half/1.0.0")).unwrap();
        std::fs::write(storage.root().join("half/1.0.0/half.1.0.0.nupkg"), b"x").unwrap();

        assert_eq!(storage.read().await.status(), FeedStatus::NotFound);
    }

    #[tokio::test]
    async fn test_open_returns_archive_bytes() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileSystemStorage::new(temp_dir.path());
        let record = storage
            .save(&archive("A", "1.0.0"), b"payload")
            .await
            .into_payload()
            .unwrap();

        let bytes = storage.open(&record).await.into_payload().unwrap();
        assert_eq!(bytes, b"payload");
    }

    #[tokio::test]
    async fn test_open_missing_archive_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileSystemStorage::new(temp_dir.path());
        let mut record = storage
            .save(&archive("A", "1.0.0"), b"payload")
            .await
            .into_payload()
            .unwrap();
        record.filename = "a.9.9.9.nupkg".to_string();

        assert_eq!(storage.open(&record).await.status(), FeedStatus::NotFound);
    }

    #[tokio::test]
    async fn test_save_rejects_unsafe_ids() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileSystemStorage::new(temp_dir.path());

        let response = storage.save(&archive("../escape", "1.0.0"), b"x").await;
        assert_eq!(response.status(), FeedStatus::BadRequest);
    }
}
