//! # Response Envelope
//!
//! Every catalog operation returns a [`FeedResponse`]: a success flag, one
//! status from the closed [`FeedStatus`] vocabulary, an optional message, an
//! optional payload and optional structured error detail.
//!
//! The success flag is never set independently; it is derived from the
//! status, and the constructors only attach a payload to successful
//! responses.
//!
//! ```json
//! {
//!   "success": false,
//!   "status": "unsupported_media_type",
//!   "message": "Unsupported package archive: ...",
//!   "error": { "kind": "zip", "source": "..." }
//! }
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FeedError, FeedResult};

/// Closed set of statuses a feed operation can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedStatus {
    Ok,
    BadRequest,
    Conflict,
    UnsupportedMediaType,
    NotFound,
    InternalServerError,
}

impl FeedStatus {
    pub fn is_success(self) -> bool {
        matches!(self, FeedStatus::Ok)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FeedStatus::Ok => "ok",
            FeedStatus::BadRequest => "bad_request",
            FeedStatus::Conflict => "conflict",
            FeedStatus::UnsupportedMediaType => "unsupported_media_type",
            FeedStatus::NotFound => "not_found",
            FeedStatus::InternalServerError => "internal_server_error",
        }
    }

    pub fn http_status(self) -> StatusCode {
        match self {
            FeedStatus::Ok => StatusCode::OK,
            FeedStatus::BadRequest => StatusCode::BAD_REQUEST,
            FeedStatus::Conflict => StatusCode::CONFLICT,
            FeedStatus::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            FeedStatus::NotFound => StatusCode::NOT_FOUND,
            FeedStatus::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for FeedStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uniform result of a catalog or storage operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedResponse<T> {
    success: bool,
    status: FeedStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<Value>,
}

impl<T> FeedResponse<T> {
    /// Successful response carrying a payload.
    pub fn ok(payload: T) -> Self {
        Self {
            success: true,
            status: FeedStatus::Ok,
            message: None,
            payload: Some(payload),
            error: None,
        }
    }

    /// Successful response without content.
    pub fn no_content(message: impl Into<String>) -> Self {
        Self {
            success: true,
            status: FeedStatus::Ok,
            message: Some(message.into()),
            payload: None,
            error: None,
        }
    }

    /// Failed response. Never carries a payload.
    pub fn failure(status: FeedStatus, message: impl Into<String>) -> Self {
        debug_assert!(!status.is_success(), "failure built with OK status");
        Self {
            success: status.is_success(),
            status,
            message: Some(message.into()),
            payload: None,
            error: None,
        }
    }

    pub fn with_error(mut self, error: Value) -> Self {
        self.error = Some(error);
        self
    }

    pub fn from_result(result: FeedResult<T>) -> Self {
        match result {
            Ok(payload) => Self::ok(payload),
            Err(e) => e.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn status(&self) -> FeedStatus {
        self.status
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn payload(&self) -> Option<&T> {
        self.payload.as_ref()
    }

    pub fn error(&self) -> Option<&Value> {
        self.error.as_ref()
    }

    pub fn into_payload(self) -> Option<T> {
        self.payload
    }

    /// Re-types a response, keeping status, message and error detail but
    /// dropping the payload. Used to pass a failure through verbatim.
    pub fn propagate<U>(self) -> FeedResponse<U> {
        FeedResponse {
            success: self.success,
            status: self.status,
            message: self.message,
            payload: None,
            error: self.error,
        }
    }

    /// Splits into the payload, or the failure re-typed for the caller.
    ///
    /// A successful response without a payload has nothing to hand over and
    /// is reported as an internal failure rather than a success-flagged `Err`.
    pub fn into_result<U>(self) -> Result<T, FeedResponse<U>> {
        if !self.success {
            return Err(self.propagate());
        }
        match self.payload {
            Some(payload) => Ok(payload),
            None => Err(FeedError::Internal(format!(
                "{} response carried no payload",
                self.status
            ))
            .into()),
        }
    }

    pub fn map<U, F>(self, f: F) -> FeedResponse<U>
    where
        F: FnOnce(T) -> U,
    {
        FeedResponse {
            success: self.success,
            status: self.status,
            message: self.message,
            payload: self.payload.map(f),
            error: self.error,
        }
    }
}

impl<T> From<FeedError> for FeedResponse<T> {
    fn from(err: FeedError) -> Self {
        let details = err.details();
        let response = FeedResponse::failure(err.status(), err.to_string());
        match details {
            Some(details) => response.with_error(details),
            None => response,
        }
    }
}

impl<T: Serialize> IntoResponse for FeedResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status.http_status();

        match self.status {
            FeedStatus::Ok => {}
            FeedStatus::InternalServerError => {
                tracing::error!(status = %self.status, message = ?self.message, "Request failed");
            }
            _ => {
                tracing::warn!(status = %self.status, message = ?self.message, "Request rejected");
            }
        }

        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::ArchiveError;
    use crate::types::{PackageManifest, PackageRecord};

    #[test]
    fn test_success_is_derived_from_status() {
        let ok = FeedResponse::ok(vec![1, 2, 3]);
        assert!(ok.is_success());
        assert_eq!(ok.status(), FeedStatus::Ok);
        assert_eq!(ok.payload(), Some(&vec![1, 2, 3]));

        let failed: FeedResponse<Vec<i32>> =
            FeedResponse::failure(FeedStatus::Conflict, "Package already exists");
        assert!(!failed.is_success());
        assert!(failed.payload().is_none());
        assert_eq!(failed.message(), Some("Package already exists"));
    }

    #[test]
    fn test_no_content_success() {
        let response: FeedResponse<()> = FeedResponse::no_content("done");
        assert!(response.is_success());
        assert!(response.payload().is_none());
    }

    #[test]
    fn test_propagate_keeps_status_and_message() {
        let failed: FeedResponse<String> =
            FeedResponse::failure(FeedStatus::NotFound, "No packages found");
        let propagated: FeedResponse<Vec<u8>> = failed.propagate();
        assert_eq!(propagated.status(), FeedStatus::NotFound);
        assert_eq!(propagated.message(), Some("No packages found"));
        assert!(!propagated.is_success());
    }

    #[test]
    fn test_into_result() {
        let ok: FeedResponse<u32> = FeedResponse::ok(7);
        assert_eq!(ok.into_result::<()>().ok(), Some(7));

        let failed: FeedResponse<u32> = FeedResponse::failure(FeedStatus::BadRequest, "nope");
        let err = failed.into_result::<String>().unwrap_err();
        assert_eq!(err.status(), FeedStatus::BadRequest);
    }

    #[test]
    fn test_into_result_without_payload_is_a_failure() {
        let done: FeedResponse<u32> = FeedResponse::no_content("done");
        let err = done.into_result::<()>().unwrap_err();
        assert!(!err.is_success());
        assert_eq!(err.status(), FeedStatus::InternalServerError);
    }

    #[test]
    fn test_failed_listing_round_trips_through_json() {
        let failed: FeedResponse<Vec<PackageRecord>> =
            FeedResponse::failure(FeedStatus::NotFound, "No packages found");
        let json = serde_json::to_string(&failed).unwrap();
        assert!(!json.contains("payload"));

        let decoded: FeedResponse<Vec<PackageRecord>> = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, failed);
        assert!(decoded.payload().is_none());
    }

    #[test]
    fn test_listing_round_trips_through_json() {
        let record = PackageRecord::from_manifest(
            PackageManifest {
                id: "A".to_string(),
                version: "1.0.0".to_string(),
                ..Default::default()
            },
            "a.1.0.0.nupkg".to_string(),
            3,
            String::new(),
            chrono::Utc::now(),
        );
        let listing = FeedResponse::ok(vec![record]);

        let json = serde_json::to_string(&listing).unwrap();
        let decoded: FeedResponse<Vec<PackageRecord>> = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, listing);
    }

    #[test]
    fn test_from_error_attaches_detail() {
        let response: FeedResponse<()> = FeedError::from(ArchiveError::MissingManifest).into();
        assert_eq!(response.status(), FeedStatus::UnsupportedMediaType);
        assert!(response.error().is_some());
        assert!(!response.is_success());
    }

    #[test]
    fn test_http_mapping() {
        assert_eq!(FeedStatus::Ok.http_status(), StatusCode::OK);
        assert_eq!(FeedStatus::BadRequest.http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(FeedStatus::Conflict.http_status(), StatusCode::CONFLICT);
        assert_eq!(
            FeedStatus::UnsupportedMediaType.http_status(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(FeedStatus::NotFound.http_status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_serialized_shape() {
        let response: FeedResponse<()> = FeedResponse::failure(FeedStatus::NotFound, "missing");
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["status"], "not_found");
        assert_eq!(value["message"], "missing");
        assert!(value.get("payload").is_none());
    }
}
