//! Metrics collection and exposition.
//!
//! # Metrics
//! - `dehaze_requests_total` (counter): requests by route, method, status
//! - `dehaze_request_duration_seconds` (histogram): latency per route
//! - `dehaze_frames_total` (counter): frames published to the feed
//! - `dehaze_feed_subscribers` (gauge): open video feed streams
//! - `dehaze_upload_bytes_total` (counter): stored bytes by media kind
//! - `dehaze_locations_total` (counter): accepted location points
//!
//! Without an installed recorder every call is a no-op, so tests need no setup.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one dispatched request. `route` is the route name, or `"none"`.
pub fn record_request(route: &str, method: &str, status: u16, start: Instant) {
    counter!(
        "dehaze_requests_total",
        "route" => route.to_string(),
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("dehaze_request_duration_seconds", "route" => route.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_frame() {
    counter!("dehaze_frames_total").increment(1);
}

pub fn set_feed_subscribers(count: usize) {
    gauge!("dehaze_feed_subscribers").set(count as f64);
}

pub fn record_upload(kind: &'static str, bytes: u64) {
    counter!("dehaze_upload_bytes_total", "kind" => kind).increment(bytes);
}

pub fn record_location() {
    counter!("dehaze_locations_total").increment(1);
}
