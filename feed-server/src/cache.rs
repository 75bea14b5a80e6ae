//! In-memory session cache of the package catalog.
//!
//! The cache is either *unset* (never loaded, or dropped by a reload) or
//! *set* to a collection that may be empty. Only an unset cache makes the
//! catalog go back to durable storage.

use tokio::sync::RwLock;
use tracing::debug;

use crate::types::PackageRecord;

#[derive(Debug, Default)]
pub struct SessionCache {
    packages: RwLock<Option<Vec<PackageRecord>>>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the cached collection, `None` while unset
    pub async fn get(&self) -> Option<Vec<PackageRecord>> {
        self.packages.read().await.clone()
    }

    /// Replace the whole collection
    pub async fn set(&self, packages: Vec<PackageRecord>) {
        debug!(count = packages.len(), "Session cache replaced");
        *self.packages.write().await = Some(packages);
    }

    /// Add one record to a set collection.
    ///
    /// An unset cache stays unset: it holds no view of storage to extend, and
    /// the next population reads the record from storage anyway. A record
    /// already present for the same id and version is not added twice.
    pub async fn append(&self, record: PackageRecord) {
        let mut guard = self.packages.write().await;
        let Some(packages) = guard.as_mut() else {
            debug!(id = %record.id, version = %record.version, "Session cache unset, append skipped");
            return;
        };
        if packages
            .iter()
            .any(|existing| existing.matches(&record.id, &record.version))
        {
            return;
        }
        debug!(id = %record.id, version = %record.version, "Session cache append");
        packages.push(record);
    }

    /// Drop back to the unset state
    pub async fn clear(&self) {
        *self.packages.write().await = None;
    }

    pub async fn is_set(&self) -> bool {
        self.packages.read().await.is_some()
    }

    /// Number of cached records, `None` while unset
    pub async fn len(&self) -> Option<usize> {
        self.packages.read().await.as_ref().map(Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PackageManifest;
    use chrono::Utc;

    fn record(id: &str, version: &str) -> PackageRecord {
        PackageRecord::from_manifest(
            PackageManifest {
                id: id.into(),
                version: version.into(),
                ..Default::default()
            },
            format!("{id}.{version}.nupkg"),
            1,
            String::new(),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_starts_unset() {
        let cache = SessionCache::new();
        assert!(!cache.is_set().await);
        assert!(cache.get().await.is_none());
        assert_eq!(cache.len().await, None);
    }

    #[tokio::test]
    async fn test_empty_set_is_distinct_from_unset() {
        let cache = SessionCache::new();
        cache.set(Vec::new()).await;
        assert!(cache.is_set().await);
        assert_eq!(cache.get().await, Some(Vec::new()));
        assert_eq!(cache.len().await, Some(0));
    }

    #[tokio::test]
    async fn test_append_on_unset_stays_unset() {
        let cache = SessionCache::new();
        cache.append(record("A", "1.0.0")).await;
        assert!(!cache.is_set().await);
        assert_eq!(cache.len().await, None);
    }

    #[tokio::test]
    async fn test_append_skips_existing_record() {
        let cache = SessionCache::new();
        cache.set(vec![record("A", "1.0.0")]).await;
        cache.append(record("a", "1.0.0")).await;
        assert_eq!(cache.len().await, Some(1));
    }

    #[tokio::test]
    async fn test_append_and_clear() {
        let cache = SessionCache::new();
        cache.set(vec![record("A", "1.0.0")]).await;
        cache.append(record("A", "1.0.1")).await;
        assert_eq!(cache.len().await, Some(2));

        cache.clear().await;
        assert!(!cache.is_set().await);
    }
}
