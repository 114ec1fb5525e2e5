//! Video upload and retrieval.

use axum::{
    body::Body,
    extract::{FromRequest, Multipart},
    http::{header, HeaderValue, Method, Request, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::http::request::essence;
use crate::http::response::{require_method, ViewError, GET_HEAD, GET_HEAD_POST};
use crate::http::server::AppState;
use crate::media::{MediaKind, MediaRecord};
use crate::views::{media_url, upload_form};

const FIELD: &str = "video";

#[derive(Debug, Serialize)]
pub struct VideoUploaded {
    #[serde(flatten)]
    pub record: MediaRecord,
    pub url: Option<String>,
}

/// Stream a multipart `video` field to disk.
pub async fn upload_video(state: AppState, request: Request<Body>) -> Result<Response, ViewError> {
    require_method(request.method(), GET_HEAD_POST)?;
    if request.method() != Method::POST {
        let action = request.uri().path().to_string();
        return Ok(Html(upload_form("Upload a video", &action, FIELD, "video/*")).into_response());
    }

    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| ViewError::BadRequest(e.body_text()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ViewError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(FIELD) {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(essence).unwrap_or_default();
        if !content_type.starts_with("video/") {
            return Err(ViewError::UnsupportedMediaType(content_type));
        }

        let record = state
            .media
            .save_stream(
                MediaKind::Video,
                file_name.as_deref(),
                &content_type,
                field,
                state.config.media.max_video_bytes,
            )
            .await?;

        let url = media_url(&state, record.id);
        return Ok((StatusCode::CREATED, Json(VideoUploaded { record, url })).into_response());
    }

    Err(ViewError::BadRequest(format!("missing '{FIELD}' field")))
}

/// Return the most recently uploaded video.
pub async fn get_processed_video(
    state: AppState,
    request: Request<Body>,
) -> Result<Response, ViewError> {
    require_method(request.method(), GET_HEAD)?;

    let record = state
        .media
        .latest(MediaKind::Video)
        .ok_or_else(|| ViewError::NotFound("no video has been uploaded".into()))?;
    Ok(file_response(&record, request).await)
}

/// Stream a stored file from disk, honouring `Range` and `HEAD`.
///
/// The stored content type replaces the one guessed from the extension.
pub(crate) async fn file_response(record: &MediaRecord, request: Request<Body>) -> Response {
    let response = match ServeFile::new(&record.path).oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    };

    let (mut parts, body) = response.into_parts();
    if parts.status.is_success() {
        if let Ok(value) = HeaderValue::from_str(&record.content_type) {
            parts.headers.insert(header::CONTENT_TYPE, value);
        }
    }
    Response::from_parts(parts, Body::new(body))
}
