//! Still-image upload for dehazing.

use axum::{
    body::{Body, Bytes},
    extract::{multipart::Field, FromRequest, Multipart},
    http::{Method, Request, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::frames::Frame;
use crate::http::request::essence;
use crate::http::response::{require_method, ViewError, GET_HEAD_POST};
use crate::http::server::AppState;
use crate::media::{MediaKind, MediaRecord};
use crate::processing;
use crate::views::{media_url, upload_form};

const FIELD: &str = "image";

#[derive(Debug, Serialize)]
pub struct DehazeResult {
    pub input: MediaRecord,
    pub output: MediaRecord,
    pub output_url: Option<String>,
}

pub async fn dehaze_image_upload(
    state: AppState,
    request: Request<Body>,
) -> Result<Response, ViewError> {
    require_method(request.method(), GET_HEAD_POST)?;
    if request.method() != Method::POST {
        let action = request.uri().path().to_string();
        return Ok(Html(upload_form("Dehaze an image", &action, FIELD, "image/*")).into_response());
    }

    let limit = state.config.media.max_image_bytes;
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
        if !content_type.starts_with("image/") {
            return Err(ViewError::UnsupportedMediaType(content_type));
        }
        let data = read_field(field, limit).await?;
        if data.is_empty() {
            return Err(ViewError::BadRequest("upload is empty".into()));
        }

        let frame = Frame::new(0, content_type.clone(), data.clone());
        let processed = processing::run_blocking(state.processor.clone(), frame).await?;

        let input = state
            .media
            .save(MediaKind::DehazeInput, file_name.as_deref(), &content_type, &data)
            .await?;
        let output = match state
            .media
            .save(
                MediaKind::DehazeOutput,
                file_name.as_deref(),
                &processed.content_type,
                &processed.data,
            )
            .await
        {
            Ok(output) => output,
            Err(e) => {
                state.media.remove(&input.id).await;
                return Err(e.into());
            }
        };

        let output_url = media_url(&state, output.id);
        return Ok((
            StatusCode::CREATED,
            Json(DehazeResult {
                input,
                output,
                output_url,
            }),
        )
            .into_response());
    }

    Err(ViewError::BadRequest(format!("missing '{FIELD}' field")))
}

/// Buffer a multipart field, rejecting it once it exceeds `limit` bytes.
pub(crate) async fn read_field(mut field: Field<'_>, limit: usize) -> Result<Bytes, ViewError> {
    let mut buf = Vec::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| ViewError::BadRequest(e.body_text()))?
    {
        if buf.len() + chunk.len() > limit {
            return Err(ViewError::PayloadTooLarge(limit));
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(Bytes::from(buf))
}
