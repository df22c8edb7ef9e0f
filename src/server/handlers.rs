use std::time::Instant;

use axum::Json;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::json_error::{ApiError, ApiJson};
use crate::context::AppContext;
use crate::error::UploadError;
use crate::models::{AskQuestionRequest, HealthResponse, QueryResult, StatusResponse, UploadResponse};
use crate::utils::elapsed_ms;

pub const UPLOAD_PATH: &str = "/upload_pdf/";
pub const ASK_PATH: &str = "/ask_question/";

/// Accept a multipart upload with a `file` field.
pub async fn upload_pdf(
    State(ctx): State<AppContext>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let started = Instant::now();
    let result = receive_upload(&ctx, multipart?).await;
    ctx.record_request(UPLOAD_PATH, elapsed_ms(started), result.is_ok());
    result
}

async fn receive_upload(
    ctx: &AppContext,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let service = ctx.upload_service();

    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        if filename.trim().is_empty() {
            return Err(ApiError::no_file_uploaded());
        }

        let spool = service.spool()?;
        let mut file = tokio::fs::File::from_std(spool.as_file().try_clone().map_err(UploadError::from)?);
        let mut received = 0usize;
        while let Some(chunk) = field.chunk().await? {
            received += chunk.len();
            file.write_all(&chunk).await.map_err(UploadError::from)?;
        }
        file.flush().await.map_err(UploadError::from)?;
        drop(file);
        debug!(filename = %filename, bytes = received, "Upload spooled");

        service.store_file(&filename, spool.path()).await?;
        return Ok(Json(UploadResponse::for_file(&filename)));
    }

    Err(ApiError::no_file_uploaded())
}

/// Answer a question about a previously uploaded document. Rejected bodies
/// are recorded as failed requests too.
pub async fn ask_question(
    State(ctx): State<AppContext>,
    payload: Result<ApiJson<AskQuestionRequest>, ApiError>,
) -> Result<Json<QueryResult>, ApiError> {
    let started = Instant::now();
    let result = match payload {
        Ok(ApiJson(request)) => ctx
            .qa_pipeline()
            .answer(&request)
            .await
            .map_err(ApiError::from),
        Err(rejection) => Err(rejection),
    };
    ctx.record_request(ASK_PATH, elapsed_ms(started), result.is_ok());
    Ok(Json(result?.result))
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn status(State(ctx): State<AppContext>) -> Json<StatusResponse> {
    Json(ctx.status().await)
}
