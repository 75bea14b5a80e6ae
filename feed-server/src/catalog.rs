//! # Package Catalog
//!
//! [`PackageCatalog`] coordinates the archive reader, durable storage and
//! the session cache, and implements push, lookup, search and listing.
//!
//! ## Cache population
//!
//! Every operation starts from the in-memory collection. When the
//! [`SessionCache`] is unset it is filled from one storage read; a set but
//! empty cache is used as-is. Storage read failures are handed back to the
//! caller unchanged.
//!
//! Population, the post-push append and reload all run under the catalog's
//! populate lock. A storage read and the `set` that follows it therefore
//! cannot interleave with an append or a clear, and an append to an unset
//! cache is dropped because the next population reads the new record back
//! from storage.
//!
//! ## Push
//!
//! Duplicate detection and the storage write happen while holding the
//! catalog's push lock, so at most one record exists per id and version
//! even under concurrent uploads.

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::archive::ArchiveReader;
use crate::cache::SessionCache;
use crate::error::FeedError;
use crate::response::{FeedResponse, FeedStatus};
use crate::storage::StorageGateway;
use crate::types::PackageRecord;
use crate::validation::{self, MAX_UPLOAD_SIZE};
use crate::version::compare_versions;

/// An uploaded file as received from the transport layer.
#[derive(Debug, Clone)]
pub struct PackageUpload {
    pub filename: String,
    pub content: Bytes,
}

impl PackageUpload {
    pub fn new(filename: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }
}

/// A stored archive together with its record.
#[derive(Debug, Clone)]
pub struct PackageDownload {
    pub record: PackageRecord,
    pub content: Vec<u8>,
}

pub struct PackageCatalog {
    storage: Arc<dyn StorageGateway>,
    reader: Arc<dyn ArchiveReader>,
    cache: Arc<SessionCache>,
    push_lock: Mutex<()>,
    populate_lock: Mutex<()>,
    max_upload_size: u64,
}

impl PackageCatalog {
    pub fn new(
        storage: Arc<dyn StorageGateway>,
        reader: Arc<dyn ArchiveReader>,
        cache: Arc<SessionCache>,
    ) -> Self {
        Self {
            storage,
            reader,
            cache,
            push_lock: Mutex::new(()),
            populate_lock: Mutex::new(()),
            max_upload_size: MAX_UPLOAD_SIZE,
        }
    }

    pub fn with_max_upload_size(mut self, bytes: u64) -> Self {
        self.max_upload_size = bytes;
        self
    }

    pub fn cache(&self) -> &Arc<SessionCache> {
        &self.cache
    }

    /// Current collection, loading it from storage when the cache is unset.
    async fn load_packages(&self) -> FeedResponse<Vec<PackageRecord>> {
        if let Some(packages) = self.cache.get().await {
            debug!(count = packages.len(), "Serving catalog from session cache");
            return FeedResponse::ok(packages);
        }

        let _populating = self.populate_lock.lock().await;
        if let Some(packages) = self.cache.get().await {
            debug!(count = packages.len(), "Session cache populated while waiting");
            return FeedResponse::ok(packages);
        }

        debug!("Session cache unset, reading durable storage");
        match self.storage.read().await.into_result() {
            Ok(packages) => {
                self.cache.set(packages.clone()).await;
                FeedResponse::ok(packages)
            }
            Err(failure) => {
                debug!(status = %failure.status(), "Durable storage read failed");
                failure
            }
        }
    }

    fn find<'a>(packages: &'a [PackageRecord], id: &str, version: &str) -> Option<&'a PackageRecord> {
        packages.iter().find(|record| record.matches(id, version))
    }

    /// Upload a package archive.
    pub async fn push(&self, upload: Option<PackageUpload>) -> FeedResponse<()> {
        let Some(upload) = upload else {
            warn!("Push without a package file");
            return FeedResponse::failure(FeedStatus::BadRequest, "No package file was uploaded");
        };

        if let Err(e) =
            validation::validate_upload_size(upload.content.len() as u64, self.max_upload_size)
        {
            return e.into();
        }

        let archive = match self.reader.read(&upload.filename, &upload.content) {
            Ok(archive) => archive,
            Err(e) => {
                warn!(filename = %upload.filename, error = %e, "Rejected unreadable package archive");
                return FeedError::from(e).into();
            }
        };

        let _guard = self.push_lock.lock().await;

        // Nothing stored yet is an empty catalog for the duplicate check.
        let loaded = self.load_packages().await;
        let existing = if loaded.status() == FeedStatus::NotFound {
            Vec::new()
        } else {
            match loaded.into_result() {
                Ok(packages) => packages,
                Err(failure) => return failure,
            }
        };

        if Self::find(&existing, archive.id(), archive.version()).is_some() {
            warn!(id = %archive.id(), version = %archive.version(), "Package already exists");
            return FeedError::Conflict("Package already exists".to_string()).into();
        }

        let record = match self.storage.save(&archive, &upload.content).await.into_result() {
            Ok(record) => record,
            Err(failure) => {
                warn!(id = %archive.id(), version = %archive.version(), status = %failure.status(), "Storage rejected package");
                return failure;
            }
        };

        info!(id = %record.id, version = %record.version, size = record.size, "Package pushed");
        {
            let _populating = self.populate_lock.lock().await;
            self.cache.append(record).await;
        }

        FeedResponse::no_content("Package pushed")
    }

    /// Exact, case-insensitive lookup of one package version.
    pub async fn get(&self, id: &str, version: &str) -> Option<PackageRecord> {
        let packages = self.load_packages().await.into_payload()?;
        Self::find(&packages, id, version).cloned()
    }

    /// Latest version of every package whose id or description contains `query`.
    pub async fn search(&self, query: Option<&str>) -> FeedResponse<Vec<PackageRecord>> {
        let packages = match self.load_packages().await.into_result() {
            Ok(packages) => packages,
            Err(failure) => return failure,
        };
        if packages.is_empty() {
            return FeedResponse::ok(Vec::new());
        }

        let needle = query.unwrap_or_default().trim().to_lowercase();

        let mut groups: BTreeMap<String, Vec<PackageRecord>> = BTreeMap::new();
        for record in packages {
            if needle.is_empty() || record.matches_query(&needle) {
                groups.entry(record.key()).or_default().push(record);
            }
        }

        let latest: Vec<PackageRecord> = groups
            .into_values()
            .filter_map(|versions| {
                versions
                    .into_iter()
                    .max_by(|a, b| compare_versions(&a.version, &b.version))
            })
            .collect();

        debug!(query = %needle, results = latest.len(), "Search completed");
        FeedResponse::ok(latest)
    }

    /// Every stored version of one package, newest first.
    pub async fn package_versions(&self, id: &str) -> FeedResponse<Vec<PackageRecord>> {
        let packages = match self.load_packages().await.into_result() {
            Ok(packages) => packages,
            Err(failure) => return failure,
        };

        let mut versions: Vec<PackageRecord> = packages
            .into_iter()
            .filter(|record| record.has_id(id))
            .collect();

        if versions.is_empty() {
            debug!(id = %id, "No versions for package");
            return FeedResponse::failure(FeedStatus::NotFound, format!("Package '{id}' not found"));
        }

        versions.sort_by(|a, b| compare_versions(&b.version, &a.version));
        FeedResponse::ok(versions)
    }

    /// One package version.
    pub async fn get_package(&self, id: &str, version: &str) -> FeedResponse<PackageRecord> {
        let packages = match self.load_packages().await.into_result() {
            Ok(packages) => packages,
            Err(failure) => return failure,
        };

        match Self::find(&packages, id, version) {
            Some(record) => FeedResponse::ok(record.clone()),
            None => FeedResponse::failure(
                FeedStatus::NotFound,
                format!("Package '{id}' version '{version}' not found"),
            ),
        }
    }

    /// The full catalog.
    pub async fn get_packages(&self) -> FeedResponse<Vec<PackageRecord>> {
        self.load_packages().await
    }

    /// Stored archive bytes for one package version.
    pub async fn download(&self, id: &str, version: &str) -> FeedResponse<PackageDownload> {
        let record = match self.get_package(id, version).await.into_result() {
            Ok(record) => record,
            Err(failure) => return failure,
        };

        self.storage
            .open(&record)
            .await
            .map(|content| PackageDownload { record, content })
    }

    /// Forget the cached collection so the next operation re-reads storage.
    pub async fn reload(&self) {
        let _populating = self.populate_lock.lock().await;
        self.cache.clear().await;
        info!("Session cache cleared");
    }
}
