use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::http::server::AppState;
use crate::routing::Params;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub routes: usize,
    pub feed_subscribers: usize,
    pub stored_media: usize,
    pub stored_locations: usize,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RouteEntry {
    pub name: String,
    pub pattern: String,
    pub view: String,
    pub enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    pub path: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Resolution {
    pub name: String,
    pub route: String,
    pub view: String,
    pub params: Params,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        routes: state.routes.load().len(),
        feed_subscribers: state.frames.subscriber_count(),
        stored_media: state.media.count(),
        stored_locations: state.locations.len(),
    })
}

/// The URL table in declaration order, disabled routes included.
pub async fn get_routes(State(state): State<AppState>) -> Json<Vec<RouteEntry>> {
    let table = state.routes.load();
    Json(
        table
            .iter()
            .map(|route| RouteEntry {
                name: route.name().to_string(),
                pattern: route.pattern().to_string(),
                view: route.handler().as_str().to_string(),
                enabled: route.is_enabled(),
            })
            .collect(),
    )
}

pub async fn resolve_path(
    State(state): State<AppState>,
    Query(query): Query<ResolveQuery>,
) -> Result<Json<Resolution>, StatusCode> {
    let table = state.routes.load();
    let m = table.resolve(&query.path).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(Resolution {
        name: m.name.to_string(),
        route: m.route.to_string(),
        view: m.handler.as_str().to_string(),
        params: m.params,
    }))
}
