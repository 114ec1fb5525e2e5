//! HTTP server setup and dispatch.
//!
//! # Responsibilities
//! - Create the Axum router with the URL-table dispatcher as its fallback
//! - Wire up middleware (tracing, request ID, body and concurrency limits)
//! - Bound each view by its own timeout (uploads get a longer one)
//! - Resolve each request path against the live route table
//! - Redirect slash-less paths when only the slashed form resolves
//! - Apply route toggles from config reloads
//! - Close feed streams and drain requests on shutdown

use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderValue, Method, Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{
    limit::RequestBodyLimitLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::frames::FrameHub;
use crate::http::request::{request_id_layers, RequestIdExt};
use crate::http::response::ViewError;
use crate::location::LocationStore;
use crate::media::MediaStore;
use crate::observability::metrics;
use crate::processing::{ImageProcessor, Passthrough};
use crate::routing::{RouteError, RouteTable};
use crate::urls;
use crate::views::View;

/// Multipart framing allowance on top of the largest accepted upload.
const BODY_OVERHEAD: usize = 64 * 1024;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<ArcSwap<RouteTable<View>>>,
    pub config: Arc<ServerConfig>,
    pub frames: FrameHub,
    pub media: MediaStore,
    pub locations: LocationStore,
    pub processor: Arc<dyn ImageProcessor>,
}

impl AppState {
    /// Rebuild the route table from `config` and swap it in.
    ///
    /// Only the route toggles (`routes.disabled`, `media.serve`) take effect live.
    pub fn reload_routes(&self, config: &ServerConfig) -> Result<(), RouteError> {
        let table = urls::urlpatterns(&config.routes, &config.media)?;
        self.routes.store(Arc::new(table));
        Ok(())
    }
}

/// HTTP server for the URL table.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a server that passes images through unchanged.
    pub fn new(config: ServerConfig) -> Result<Self, RouteError> {
        Self::with_processor(config, Arc::new(Passthrough))
    }

    /// Create a server using `processor` for frames and dehaze uploads.
    pub fn with_processor(
        config: ServerConfig,
        processor: Arc<dyn ImageProcessor>,
    ) -> Result<Self, RouteError> {
        let table = urls::urlpatterns(&config.routes, &config.media)?;

        let state = AppState {
            routes: Arc::new(ArcSwap::from_pointee(table)),
            frames: FrameHub::new(),
            media: MediaStore::new(&config.media.root),
            locations: LocationStore::new(config.location.capacity),
            processor,
            config: Arc::new(config),
        };

        let router = Self::build_router(&state.config, state.clone());
        Ok(Self { router, state })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ServerConfig, state: AppState) -> Router {
        let body_limit = config
            .media
            .max_video_bytes
            .max(config.media.max_image_bytes)
            .max(config.feed.max_frame_bytes)
            .saturating_add(BODY_OVERHEAD);

        let mut router = Router::new()
            .fallback(dispatch)
            .with_state(state)
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(body_limit))
            .layer(GlobalConcurrencyLimitLayer::new(config.listener.max_connections));

        if config.security.enable_headers {
            router = router
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::X_FRAME_OPTIONS,
                    HeaderValue::from_static("DENY"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::REFERRER_POLICY,
                    HeaderValue::from_static("same-origin"),
                ));
        }

        router
            .layer(TraceLayer::new_for_http())
            .layer(request_id_layers())
    }

    /// Router with all layers, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn config(&self) -> &ServerConfig {
        &self.state.config
    }

    /// Run the server until `shutdown` fires.
    ///
    /// Validated configs arriving on `config_updates` replace the route table.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<ServerConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, routes = self.state.routes.load().len(), "HTTP server starting");

        let reload_state = self.state.clone();
        tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                match reload_state.reload_routes(&config) {
                    Ok(()) => tracing::info!(
                        disabled = ?config.routes.disabled,
                        "Route table reloaded"
                    ),
                    Err(e) => tracing::error!(error = %e, "Route reload rejected, keeping current table"),
                }
            }
        });

        let frames = self.state.frames.clone();
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, closing video feeds");
                frames.close();
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Resolve the request path against the URL table and invoke the matched view.
async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request.request_id().to_string();

    let table = state.routes.load_full();
    let resolved = table
        .resolve(&path)
        .map(|m| (*m.handler, m.name.to_string(), m.params));

    match resolved {
        Some((view, name, params)) => {
            tracing::debug!(
                request_id = %request_id,
                method = %method,
                path = %path,
                route = %name,
                view = view.as_str(),
                "Dispatching request"
            );
            let timeout = view.timeout(&state.config.timeouts);
            let call = view.call(state, params, request);
            let response = match tokio::time::timeout(timeout, call).await {
                Ok(response) => response,
                Err(_) => {
                    tracing::warn!(
                        request_id = %request_id,
                        route = %name,
                        timeout_secs = timeout.as_secs(),
                        "View timed out"
                    );
                    StatusCode::REQUEST_TIMEOUT.into_response()
                }
            };
            metrics::record_request(&name, method.as_str(), response.status().as_u16(), start_time);
            response
        }
        None => {
            let redirectable = method == Method::GET || method == Method::HEAD;
            if state.config.routes.append_slash && redirectable {
                if let Some(target) = table.append_slash_candidate(&path) {
                    let location = match request.uri().query() {
                        Some(query) => format!("{target}?{query}"),
                        None => target,
                    };
                    tracing::debug!(request_id = %request_id, path = %path, location = %location, "Appending slash");
                    metrics::record_request("none", method.as_str(), 301, start_time);
                    return (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)])
                        .into_response();
                }
            }

            tracing::warn!(request_id = %request_id, method = %method, path = %path, "No route matched");
            metrics::record_request("none", method.as_str(), 404, start_time);
            ViewError::NotFound(path).into_response()
        }
    }
}
