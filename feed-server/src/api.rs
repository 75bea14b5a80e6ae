//! # HTTP Handlers
//!
//! Thin adapters between axum extractors and [`PackageCatalog`] operations.
//! Catalog responses are returned as-is; [`FeedResponse`] maps its status
//! onto the HTTP status code.
//!
//! [`PackageCatalog`]: crate::catalog::PackageCatalog

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::catalog::PackageUpload;
use crate::error::{FeedError, FeedResult};
use crate::response::FeedResponse;
use crate::state::AppState;
use crate::types::PackageRecord;
use crate::validation::{self, validate_filename};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// Takes the first file field of a push body. Plain form fields are skipped.
async fn read_upload(multipart: &mut Multipart) -> FeedResult<Option<PackageUpload>> {
    let mut field_count = 0;

    while let Some(field) = multipart.next_field().await? {
        field_count += 1;
        if field_count > validation::MAX_MULTIPART_FIELDS {
            warn!(field_count, "Too many multipart fields");
            return Err(FeedError::BadRequest(format!(
                "Too many multipart fields: {} (max: {})",
                field_count,
                validation::MAX_MULTIPART_FIELDS
            )));
        }

        let name = field.name().unwrap_or("").to_string();
        let Some(filename) = field.file_name().map(str::to_string) else {
            debug!(field_name = %name, "Skipping non-file multipart field");
            continue;
        };
        validate_filename(&filename)?;

        let content = field.bytes().await?;
        debug!(field_name = %name, filename = %filename, size = content.len(), "Read upload");
        return Ok(Some(PackageUpload { filename, content }));
    }

    Ok(None)
}

pub async fn push_package(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> FeedResponse<()> {
    info!("Processing package push");
    match read_upload(&mut multipart).await {
        Ok(upload) => state.catalog.push(upload).await,
        Err(e) => e.into(),
    }
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> FeedResponse<Vec<PackageRecord>> {
    state.catalog.search(query.q.as_deref()).await
}

pub async fn get_packages(State(state): State<Arc<AppState>>) -> FeedResponse<Vec<PackageRecord>> {
    state.catalog.get_packages().await
}

pub async fn reload(State(state): State<Arc<AppState>>) -> FeedResponse<()> {
    state.catalog.reload().await;
    FeedResponse::no_content("Catalog reloaded")
}

pub async fn package_versions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> FeedResponse<Vec<PackageRecord>> {
    state.catalog.package_versions(&id).await
}

pub async fn get_package(
    State(state): State<Arc<AppState>>,
    Path((id, version)): Path<(String, String)>,
) -> FeedResponse<PackageRecord> {
    state.catalog.get_package(&id, &version).await
}

/// Raw archive bytes on success, the JSON envelope otherwise.
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path((id, version)): Path<(String, String)>,
) -> Response {
    match state.catalog.download(&id, &version).await.into_result::<()>() {
        Ok(download) => {
            info!(id = %download.record.id, version = %download.record.version, "Serving package download");
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "application/octet-stream".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{}\"", download.record.filename),
                    ),
                ],
                download.content,
            )
                .into_response()
        }
        Err(failure) => failure.into_response(),
    }
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

pub async fn status(State(state): State<Arc<AppState>>) -> Json<Value> {
    let cached = state.catalog.cache().len().await;
    Json(json!({
        "status": "ok",
        "service": "feed-server",
        "version": env!("CARGO_PKG_VERSION"),
        "data_directory": state.data_dir.to_string_lossy(),
        "server_addr": state.server_addr,
        "cached_packages": cached,
    }))
}
