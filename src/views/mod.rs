//! Request handlers referenced by the URL table.
//!
//! Each handler receives the shared state, the parameters captured by the
//! matched route, and the full request. Handlers check their own methods.

pub mod dehaze;
pub mod feed;
pub mod home;
pub mod location;
pub mod media;
pub mod video;

use std::time::Duration;

use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use uuid::Uuid;

use crate::config::TimeoutConfig;
use crate::http::server::AppState;
use crate::routing::Params;

/// Handler reference stored in each route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Home,
    VideoFeed,
    ProcessFrame,
    DehazeImageUpload,
    UploadVideo,
    GetProcessedVideo,
    LocationData,
    Media,
}

impl View {
    pub fn as_str(self) -> &'static str {
        match self {
            View::Home => "home",
            View::VideoFeed => "video_feed",
            View::ProcessFrame => "process_frame",
            View::DehazeImageUpload => "dehaze_image_upload",
            View::UploadVideo => "upload_video",
            View::GetProcessedVideo => "get_processed_video",
            View::LocationData => "location_data_handler",
            View::Media => "serve_media",
        }
    }

    /// How long the handler may take to produce its response.
    ///
    /// Video uploads write the whole body before answering, so they get the
    /// upload timeout instead of the request timeout.
    pub fn timeout(self, timeouts: &TimeoutConfig) -> Duration {
        match self {
            View::UploadVideo => Duration::from_secs(timeouts.upload_secs),
            _ => Duration::from_secs(timeouts.request_secs),
        }
    }

    /// Invoke the handler.
    pub async fn call(self, state: AppState, params: Params, request: Request<Body>) -> Response {
        let result = match self {
            View::Home => home::home(state, request).await,
            View::VideoFeed => feed::video_feed(state, request).await,
            View::ProcessFrame => feed::process_frame(state, request).await,
            View::DehazeImageUpload => dehaze::dehaze_image_upload(state, request).await,
            View::UploadVideo => video::upload_video(state, request).await,
            View::GetProcessedVideo => video::get_processed_video(state, request).await,
            View::LocationData => location::location_data(state, request).await,
            View::Media => media::serve_media(state, params, request).await,
        };
        result.unwrap_or_else(IntoResponse::into_response)
    }
}

/// Public URL of a stored file, when the `media` route is enabled.
pub(crate) fn media_url(state: &AppState, id: Uuid) -> Option<String> {
    let mut params = Params::new();
    params.insert("id".to_string(), id.to_string());
    state.routes.load().reverse("media", &params).ok()
}

/// Minimal HTML page shell shared by the form views.
pub(crate) fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{title}</title></head>\n<body>\n<h1>{title}</h1>\n{body}\n</body>\n</html>\n"
    )
}

/// Upload form posting a single file field to `action`.
pub(crate) fn upload_form(title: &str, action: &str, field: &str, accept: &str) -> String {
    page(
        title,
        &format!(
            "<form method=\"post\" action=\"{action}\" enctype=\"multipart/form-data\">\n<input type=\"file\" name=\"{field}\" accept=\"{accept}\" required>\n<button type=\"submit\">Upload</button>\n</form>"
        ),
    )
}
