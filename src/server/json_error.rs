//! JSON error bodies for the HTTP API.
//!
//! Every failure is answered with `{"detail": "..."}`. Upstream and storage
//! failures are logged here and answered with a fixed detail.

use axum::extract::FromRequest;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{error, warn};

use crate::error::{ExtractError, QaError, UploadError};
use crate::models::ErrorBody;

pub const DOCUMENT_NOT_FOUND: &str = "Document not found";
pub const UPSTREAM_FAILURE: &str = "Error with Hugging Face API request.";
pub const NO_FILE_UPLOADED: &str = "No file uploaded";
pub const INVALID_PDF: &str = "Uploaded file is not a valid PDF";
pub const INTERNAL_ERROR: &str = "Internal server error";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn no_file_uploaded() -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, NO_FILE_UPLOADED)
    }

    fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            detail: self.detail,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<QaError> for ApiError {
    fn from(err: QaError) -> Self {
        match err {
            QaError::InvalidRequest(detail) => Self::new(StatusCode::UNPROCESSABLE_ENTITY, detail),
            QaError::DocumentNotFound(filename) => {
                warn!(filename = %filename, "Document not found");
                Self::new(StatusCode::NOT_FOUND, DOCUMENT_NOT_FOUND)
            }
            err if err.is_upstream() => {
                error!(stage = %err.failed_at(), "Upstream failure: {err}");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, UPSTREAM_FAILURE)
            }
            err => {
                error!(stage = %err.failed_at(), "Question answering failed: {err}");
                Self::internal()
            }
        }
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::InvalidRequest(detail) => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, detail)
            }
            UploadError::Extract(ExtractError::NotPdf | ExtractError::Malformed(_)) => {
                warn!("Rejected upload: {err}");
                Self::new(StatusCode::BAD_REQUEST, INVALID_PDF)
            }
            err => {
                error!("Upload failed: {err}");
                Self::internal()
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, err.body_text())
            }
            JsonRejection::JsonSyntaxError(err) => {
                Self::new(StatusCode::BAD_REQUEST, err.body_text())
            }
            JsonRejection::MissingJsonContentType(_) => Self::new(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "Missing `Content-Type: application/json` header",
            ),
            // `JsonRejection` is non-exhaustive.
            other => Self::new(other.status(), other.body_text()),
        }
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::new(err.status(), err.body_text())
    }
}

/// `axum::Json` with rejections rendered as [`ApiError`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
