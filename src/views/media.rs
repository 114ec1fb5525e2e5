//! Stored upload retrieval by id.

use axum::{body::Body, http::Request, response::Response};
use uuid::Uuid;

use crate::http::response::{require_method, ViewError, GET_HEAD};
use crate::http::server::AppState;
use crate::routing::Params;
use crate::views::video::file_response;

pub async fn serve_media(
    state: AppState,
    params: Params,
    request: Request<Body>,
) -> Result<Response, ViewError> {
    require_method(request.method(), GET_HEAD)?;

    let record = params
        .get("id")
        .and_then(|id| Uuid::parse_str(id).ok())
        .and_then(|id| state.media.get(&id))
        .ok_or_else(|| ViewError::NotFound(request.uri().path().to_string()))?;

    Ok(file_response(&record, request).await)
}
