//! Live frame ingest and the mixed-replace video feed.

use std::convert::Infallible;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures_util::StreamExt;
use serde::Serialize;

use crate::frames::{encode_part, Frame, FEED_BOUNDARY};
use crate::http::request::{content_type, read_body, RequestIdExt};
use crate::http::response::{require_method, ViewError, GET_HEAD, POST_ONLY};
use crate::http::server::AppState;
use crate::processing;

#[derive(Debug, Serialize)]
pub struct FrameAck {
    pub frame_id: u64,
    pub content_type: String,
    pub bytes: usize,
    pub received_at: u64,
}

/// Stream the latest frame, then every new one, until shutdown or disconnect.
pub async fn video_feed(state: AppState, request: Request<Body>) -> Result<Response, ViewError> {
    require_method(request.method(), GET_HEAD)?;

    let stream = state
        .frames
        .subscribe()
        .map(|frame| Ok::<_, Infallible>(encode_part(&frame)));

    tracing::info!(
        request_id = %request.request_id(),
        subscribers = state.frames.subscriber_count(),
        "Video feed opened"
    );

    Response::builder()
        .status(StatusCode::OK)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/x-mixed-replace; boundary={FEED_BOUNDARY}"),
        )
        .header(header::CACHE_CONTROL, "no-cache, no-store, must-revalidate")
        .body(Body::from_stream(stream))
        .map_err(|e| ViewError::Internal(e.to_string()))
}

/// Accept one image, run it through the processor and publish it to the feed.
pub async fn process_frame(state: AppState, request: Request<Body>) -> Result<Response, ViewError> {
    require_method(request.method(), POST_ONLY)?;

    let content_type = content_type(&request)
        .ok_or_else(|| ViewError::UnsupportedMediaType("missing content type".into()))?;
    if !content_type.starts_with("image/") {
        return Err(ViewError::UnsupportedMediaType(content_type));
    }

    let request_id = request.request_id().to_string();
    let (parts, body) = request.into_parts();
    let data = read_body(&parts.headers, body, state.config.feed.max_frame_bytes).await?;
    if data.is_empty() {
        return Err(ViewError::BadRequest("frame body is empty".into()));
    }

    let frame = Frame::new(0, content_type, data);
    let processed = processing::run_blocking(state.processor.clone(), frame).await?;

    let content_type = processed.content_type.clone();
    let bytes = processed.data.len();
    let received_at = processed.received_at;
    let frame_id = state
        .frames
        .publish(processed)
        .ok_or_else(|| ViewError::Unavailable("video feed is closed".into()))?;
    tracing::debug!(request_id = %request_id, frame_id, bytes, "Frame published");

    Ok(Json(FrameAck {
        frame_id,
        content_type,
        bytes,
        received_at,
    })
    .into_response())
}
