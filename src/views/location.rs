//! Location telemetry submission and query.

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, FromRequest, Query},
    http::{Method, Request, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::http::request::read_body;
use crate::http::response::{require_method, ViewError, GET_HEAD_POST};
use crate::http::server::AppState;
use crate::location::{LocationPoint, StoredLocation};

const DEFAULT_LIMIT: usize = 100;

#[derive(Debug, Default, Deserialize)]
pub struct LocationQuery {
    pub limit: Option<usize>,
    pub device_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LocationList {
    pub count: usize,
    pub points: Vec<StoredLocation>,
}

pub async fn location_data(state: AppState, request: Request<Body>) -> Result<Response, ViewError> {
    require_method(request.method(), GET_HEAD_POST)?;

    if request.method() == Method::POST {
        let (parts, body) = request.into_parts();
        let data = read_body(&parts.headers, body, state.config.location.max_body_bytes).await?;
        let request = Request::from_parts(parts, Body::from(data));
        let Json(point) = Json::<LocationPoint>::from_request(request, &())
            .await
            .map_err(json_rejection)?;
        let stored = state.locations.record(point)?;
        tracing::debug!(
            seq = stored.seq,
            latitude = stored.point.latitude,
            longitude = stored.point.longitude,
            "Location recorded"
        );
        return Ok((StatusCode::CREATED, Json(stored)).into_response());
    }

    let Query(query) = Query::<LocationQuery>::try_from_uri(request.uri())
        .map_err(|e| ViewError::BadRequest(e.body_text()))?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LIMIT)
        .min(state.locations.capacity());
    let points = state.locations.recent(limit, query.device_id.as_deref());

    Ok(Json(LocationList {
        count: points.len(),
        points,
    })
    .into_response())
}

fn json_rejection(rejection: JsonRejection) -> ViewError {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            ViewError::UnsupportedMediaType("expected application/json".into())
        }
        other => ViewError::BadRequest(other.body_text()),
    }
}
