//! Shared application state handed to every HTTP handler.

use std::path::PathBuf;
use std::sync::Arc;

use crate::archive::NupkgReader;
use crate::cache::SessionCache;
use crate::catalog::PackageCatalog;
use crate::config::Config;
use crate::storage::FileSystemStorage;

#[derive(Clone)]
pub struct AppState {
    /// Base directory; archives are stored under `<data_dir>/packages`
    pub data_dir: PathBuf,
    /// Full server address, e.g. "http://localhost:5000"
    pub server_addr: String,
    pub config: Arc<Config>,
    pub catalog: Arc<PackageCatalog>,
}

impl AppState {
    /// Wires a catalog over filesystem storage in `data_dir` with an unset cache.
    pub fn new(data_dir: PathBuf, server_addr: String, config: Config) -> Self {
        let storage = Arc::new(FileSystemStorage::new(&data_dir));
        let catalog = PackageCatalog::new(
            storage,
            Arc::new(NupkgReader),
            Arc::new(SessionCache::new()),
        )
        .with_max_upload_size(config.max_upload_size_bytes());

        Self {
            data_dir,
            server_addr,
            config: Arc::new(config),
            catalog: Arc::new(catalog),
        }
    }
}
