//! Live frame subsystem.
//!
//! # Data Flow
//! ```text
//! POST /process_frame/
//!     → processing (ImageProcessor, blocking pool)
//!     → hub.rs publish (latest frame replaces previous)
//!     → every GET /video_feed/ stream emits the new frame
//! ```

pub mod hub;

use std::time::{SystemTime, UNIX_EPOCH};

use axum::body::Bytes;

pub use hub::{encode_part, FrameHub, FEED_BOUNDARY};

/// A single still image moving through the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub id: u64,
    pub content_type: String,
    pub data: Bytes,
    /// Seconds since epoch.
    pub received_at: u64,
}

impl Frame {
    pub fn new(id: u64, content_type: impl Into<String>, data: Bytes) -> Self {
        Self {
            id,
            content_type: content_type.into(),
            data,
            received_at: unix_now(),
        }
    }
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
