//! # Local Package Feed
//!
//! A minimal local feed for `.nupkg` package archives. Clients push
//! archives, look up single versions, list every version of a package and
//! search for the latest version of each matching package.
//!
//! ## Key Modules
//!
//! - [`catalog`]: push, lookup, search and listing over the session cache
//! - [`archive`]: reads package metadata out of uploaded archives
//! - [`storage`]: durable storage gateway and its filesystem implementation
//! - [`cache`]: in-memory session cache of package records
//! - [`response`]: the uniform response envelope and status vocabulary
//! - [`api`] / [`server`]: HTTP handlers and routing
//! - [`client_ops`]: CLI-side client for a running feed
//! - [`config`]: JSON configuration with defaults

pub mod api;
pub mod archive;
pub mod cache;
pub mod catalog;
pub mod client_ops;
pub mod config;
pub mod error;
pub mod response;
pub mod server;
pub mod state;
pub mod storage;
pub mod types;
pub mod validation;
pub mod version;

pub use archive::{ArchiveError, ArchiveReader, NupkgReader};
pub use cache::SessionCache;
pub use catalog::{PackageCatalog, PackageDownload, PackageUpload};
pub use client_ops::{list_packages, push_package, search_packages, FeedClient};
pub use config::Config;
pub use error::{FeedError, FeedResult};
pub use response::{FeedResponse, FeedStatus};
pub use server::{build_router, run_server};
pub use state::AppState;
pub use storage::{FileSystemStorage, StorageGateway};
pub use types::{PackageArchive, PackageManifest, PackageRecord};
pub use version::{compare_versions, PackageVersion};

/// Hex-encoded SHA256 of `data`.
///
/// # Examples
///
/// ```
/// # use feed_server::sha256_hash;
/// assert_eq!(
///     sha256_hash(b"hello"),
///     "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
/// );
/// ```
pub fn sha256_hash(data: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}
