//! Admin API: route table introspection and server status.

pub mod auth;
pub mod handlers;

use axum::{middleware, routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::http::server::AppState;

pub fn setup_admin_router(state: AppState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/routes", get(get_routes))
        .route("/admin/resolve", get(resolve_path))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}

/// Serve the admin API until `shutdown` fires.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), std::io::Error> {
    tracing::info!(address = %listener.local_addr()?, "Admin API listening");
    axum::serve(listener, setup_admin_router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::http::HttpServer;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn admin_router() -> Router {
        let mut config = ServerConfig::default();
        config.admin.api_key = "test-key".into();
        let server = HttpServer::new(config).unwrap();
        setup_admin_router(server.state().clone())
    }

    fn authed(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("Authorization", "Bearer test-key")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_requires_bearer_token() {
        let response = admin_router()
            .oneshot(Request::builder().uri("/admin/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_routes_listing() {
        let response = admin_router().oneshot(authed("/admin/routes")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let routes: Vec<RouteEntry> = serde_json::from_slice(&body).unwrap();
        assert_eq!(routes.len(), 8);
        assert_eq!(routes[0].name, "home");
        assert_eq!(routes[0].pattern, "");
        let processed = routes.iter().find(|r| r.name == "get_processed_video").unwrap();
        assert!(!processed.enabled);
        assert_eq!(processed.pattern, "processedvideo/");
    }

    #[tokio::test]
    async fn test_resolve() {
        let router = admin_router();
        let response = router
            .clone()
            .oneshot(authed("/admin/resolve?path=/dehaze/"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let resolution: Resolution = serde_json::from_slice(&body).unwrap();
        assert_eq!(resolution.name, "dehaze_image");
        assert_eq!(resolution.view, "dehaze_image_upload");

        let response = router
            .oneshot(authed("/admin/resolve?path=/processedvideo/"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
