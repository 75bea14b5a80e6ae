//! # Error Handling
//!
//! Internal error type for the feed. Every catalog operation ultimately
//! reports through a [`FeedResponse`](crate::response::FeedResponse); this
//! module provides the error side of that conversion so library code can use
//! `?` and still land on the closed status vocabulary.
//!
//! ## Error Classifications
//!
//! - **Caller input** ([`FeedStatus::BadRequest`]): missing upload, oversized
//!   upload, malformed multipart body, unsafe filenames
//! - **Malformed content** ([`FeedStatus::UnsupportedMediaType`]): the upload
//!   is not a readable package archive; the reader error is kept as detail
//! - **State conflicts** ([`FeedStatus::Conflict`], [`FeedStatus::NotFound`])
//! - **Storage failures** ([`FeedStatus::InternalServerError`]): filesystem
//!   and serialization errors from the durable store

use serde_json::{json, Value};

use crate::archive::ArchiveError;
use crate::response::FeedStatus;

/// Application-specific error types
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Multipart form parsing error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("Unsupported package archive: {0}")]
    UnsupportedMediaType(#[from] ArchiveError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl FeedError {
    /// Status this error is reported with
    pub fn status(&self) -> FeedStatus {
        match self {
            FeedError::BadRequest(_) | FeedError::Multipart(_) => FeedStatus::BadRequest,
            FeedError::UnsupportedMediaType(_) => FeedStatus::UnsupportedMediaType,
            FeedError::NotFound(_) => FeedStatus::NotFound,
            FeedError::Conflict(_) => FeedStatus::Conflict,
            FeedError::Io(_) | FeedError::Json(_) | FeedError::Internal(_) => {
                FeedStatus::InternalServerError
            }
        }
    }

    /// Structured detail attached to the response envelope, if any
    pub fn details(&self) -> Option<Value> {
        match self {
            FeedError::UnsupportedMediaType(e) => Some(json!({
                "kind": e.kind(),
                "source": e.to_string(),
            })),
            FeedError::Io(e) => Some(json!({ "kind": format!("{:?}", e.kind()) })),
            FeedError::Multipart(e) => Some(json!({ "source": e.body_text() })),
            _ => None,
        }
    }
}

/// Convenient result type for feed operations.
pub type FeedResult<T> = Result<T, FeedError>;
