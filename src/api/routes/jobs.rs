//! Job handlers: submit, batch upload, status, result.

use super::{DownloadRequest, UPLOAD_FIELD};
use crate::api::AppState;
use crate::api::extract::JsonOrForm;
use crate::error::{Error, JobError};
use crate::types::{BatchResponse, JobId, JobInfo, SubmitResponse};
use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, State, multipart::MultipartRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use tokio_util::io::ReaderStream;

/// POST /api/download - Submit one URL
#[utoipa::path(
    post,
    path = "/api/download",
    tag = "jobs",
    request_body(content = DownloadRequest, description = "JSON or urlencoded form"),
    responses(
        (status = 202, description = "Job accepted", body = SubmitResponse),
        (status = 400, description = "Missing body or url", body = crate::error::ApiError),
        (status = 401, description = "Missing or invalid token", body = crate::error::ApiError),
        (status = 503, description = "Shutting down", body = crate::error::ApiError)
    )
)]
pub async fn submit_download(
    State(state): State<AppState>,
    JsonOrForm(request): JsonOrForm<DownloadRequest>,
) -> Response {
    let url = request.url.unwrap_or_default();
    match state
        .service
        .submit(&url, request.formato.as_deref())
        .await
    {
        Ok(job_id) => (StatusCode::ACCEPTED, Json(SubmitResponse { job_id })).into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /api/upload_txt - Submit one audio job per line of an uploaded text file
#[utoipa::path(
    post,
    path = "/api/upload_txt",
    tag = "jobs",
    request_body(content = Vec<u8>, description = "Text file in the 'file' field, one URL per line", content_type = "multipart/form-data"),
    responses(
        (status = 202, description = "Jobs accepted, in line order", body = BatchResponse),
        (status = 400, description = "No file uploaded", body = crate::error::ApiError),
        (status = 401, description = "Missing or invalid token", body = crate::error::ApiError)
    )
)]
pub async fn upload_txt(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let Ok(mut multipart) = multipart else {
        return Error::Validation("no file uploaded".into()).into_response();
    };

    let mut content = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some(UPLOAD_FIELD) => match field.bytes().await {
                Ok(bytes) => {
                    content = Some(bytes);
                    break;
                }
                Err(e) => return multipart_error(&state, e).into_response(),
            },
            Ok(Some(_)) => continue,
            Ok(None) => break,
            Err(e) => return multipart_error(&state, e).into_response(),
        }
    }

    let Some(bytes) = content else {
        return Error::Validation("no file uploaded".into()).into_response();
    };

    let text = String::from_utf8_lossy(&bytes);
    match state.service.submit_batch(&text).await {
        Ok(jobs) => (StatusCode::ACCEPTED, Json(BatchResponse { jobs })).into_response(),
        Err(e) => e.into_response(),
    }
}

fn multipart_error(state: &AppState, e: axum::extract::multipart::MultipartError) -> Error {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::PayloadTooLarge {
            limit: state.config.api.max_body_bytes,
        }
    } else {
        Error::Validation(format!("invalid multipart body: {}", e.body_text()))
    }
}

/// GET /api/status/:job_id - Current job record
#[utoipa::path(
    get,
    path = "/api/status/{job_id}",
    tag = "jobs",
    params(
        ("job_id" = String, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Job record", body = JobInfo),
        (status = 401, description = "Missing or invalid token", body = crate::error::ApiError),
        (status = 404, description = "Job not found", body = crate::error::ApiError)
    )
)]
pub async fn get_status(State(state): State<AppState>, Path(job_id): Path<String>) -> Response {
    match state.service.job(&JobId::from(job_id)).await {
        Ok(job) => (StatusCode::OK, Json(JobInfo::from(&job))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /api/result/:job_id - Download the produced file
#[utoipa::path(
    get,
    path = "/api/result/{job_id}",
    tag = "jobs",
    params(
        ("job_id" = String, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "File contents as an attachment", content_type = "application/octet-stream"),
        (status = 400, description = "Job not done yet, details carry its status", body = crate::error::ApiError),
        (status = 401, description = "Missing or invalid token", body = crate::error::ApiError),
        (status = 404, description = "Job or file not found", body = crate::error::ApiError)
    )
)]
pub async fn get_result(State(state): State<AppState>, Path(job_id): Path<String>) -> Response {
    let id = JobId::from(job_id);
    let path = match state.service.result_file(&id).await {
        Ok(path) => path,
        Err(e) => return e.into_response(),
    };

    // The file can disappear between the check and the open
    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Error::Job(JobError::FileMissing {
                id: id.to_string(),
                path,
            })
            .into_response();
        }
        Err(e) => return Error::Io(e).into_response(),
    };
    let length = file.metadata().await.ok().map(|m| m.len());

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| id.to_string());
    tracing::debug!(job_id = %id, file = %file_name, "Streaming result");

    let mut response = Response::new(Body::from_stream(ReaderStream::new(file)));
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, content_type_for(&path));
    headers.insert(header::CONTENT_DISPOSITION, content_disposition(&file_name));
    if let Some(length) = length {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    }
    response
}

/// Media type guessed from the file extension, `application/octet-stream` otherwise
pub(crate) fn content_type_for(path: &std::path::Path) -> HeaderValue {
    mime_guess::from_path(path)
        .first_raw()
        .map(HeaderValue::from_static)
        .unwrap_or_else(|| HeaderValue::from_static("application/octet-stream"))
}

/// `attachment` disposition with an ASCII fallback name and the exact UTF-8 name
pub(crate) fn content_disposition(file_name: &str) -> HeaderValue {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let value = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(file_name)
    );
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

