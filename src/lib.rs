//! HTTP service for live frame processing, image dehazing uploads, video
//! uploads and location telemetry, dispatched through a named URL table.

pub mod admin;
pub mod config;
pub mod frames;
pub mod http;
pub mod lifecycle;
pub mod location;
pub mod media;
pub mod observability;
pub mod processing;
pub mod routing;
pub mod urls;
pub mod views;

pub use config::ServerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
