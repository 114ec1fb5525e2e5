//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address, connection limit).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// URL table toggles.
    pub routes: RoutesConfig,

    /// Upload storage settings.
    pub media: MediaConfig,

    /// Live frame feed settings.
    pub feed: FeedConfig,

    /// Location telemetry settings.
    pub location: LocationConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    pub admin: AdminConfig,

    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,

    /// Maximum concurrent in-flight requests (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
            max_connections: 1_024,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Time allowed to produce response headers, in seconds.
    /// Streaming bodies (the video feed, file downloads) are not bounded by this.
    pub request_secs: u64,
    /// Time allowed for a whole video upload, in seconds.
    pub upload_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 60,
            upload_secs: 3600,
        }
    }
}

/// URL table toggles.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutesConfig {
    /// Route names that stay in the table but never resolve.
    pub disabled: Vec<String>,

    /// Redirect `/foo` to `/foo/` when only the latter resolves.
    pub append_slash: bool,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            disabled: vec!["get_processed_video".to_string()],
            append_slash: true,
        }
    }
}

/// Upload storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Directory uploads are written under.
    pub root: String,

    /// Expose stored files through the `media` route.
    pub serve: bool,

    /// Largest accepted still image, in bytes.
    pub max_image_bytes: usize,

    /// Largest accepted video upload, in bytes.
    pub max_video_bytes: usize,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            root: "media".to_string(),
            serve: true,
            max_image_bytes: 10 * 1024 * 1024,   // 10MB
            max_video_bytes: 512 * 1024 * 1024,  // 512MB
        }
    }
}

/// Live frame feed configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Largest accepted single frame, in bytes.
    pub max_frame_bytes: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            max_frame_bytes: 4 * 1024 * 1024,
        }
    }
}

/// Location telemetry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LocationConfig {
    /// Points retained before the oldest is dropped.
    pub capacity: usize,
    /// Largest accepted JSON body for a single point.
    pub max_body_bytes: usize,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            capacity: 10_000,
            max_body_bytes: 64 * 1024,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines instead of human-readable text.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Add `X-Content-Type-Options` / `X-Frame-Options` / `Referrer-Policy`.
    pub enable_headers: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8000");
        assert_eq!(config.routes.disabled, vec!["get_processed_video"]);
        assert!(config.routes.append_slash);
        assert!(config.media.serve);
    }

    #[test]
    fn test_partial_sections() {
        let config: ServerConfig = toml::from_str(
            r#"
            [routes]
            disabled = []

            [media]
            root = "/var/lib/dehaze"
            "#,
        )
        .unwrap();
        assert!(config.routes.disabled.is_empty());
        assert!(config.routes.append_slash);
        assert_eq!(config.media.root, "/var/lib/dehaze");
        assert_eq!(config.media.max_image_bytes, 10 * 1024 * 1024);
    }
}
