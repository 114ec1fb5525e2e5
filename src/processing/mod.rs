//! Image processing seam.
//!
//! Frames and uploaded stills pass through an [`ImageProcessor`] before they
//! are published or stored. The server ships only [`Passthrough`]; a real
//! dehazing backend plugs in through `HttpServer::with_processor`.

use std::sync::Arc;

use thiserror::Error;

use crate::frames::Frame;

#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("unsupported image format '{0}'")]
    Unsupported(String),
    #[error("processing failed: {0}")]
    Failed(String),
    #[error("processing task aborted: {0}")]
    Aborted(#[from] tokio::task::JoinError),
}

/// CPU-bound image transform. Called on the blocking thread pool.
pub trait ImageProcessor: Send + Sync + std::fmt::Debug {
    fn process(&self, frame: &Frame) -> Result<Frame, ProcessingError>;
}

/// Returns its input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl ImageProcessor for Passthrough {
    fn process(&self, frame: &Frame) -> Result<Frame, ProcessingError> {
        Ok(frame.clone())
    }
}

/// Run `processor` on the blocking pool so request tasks stay responsive.
pub async fn run_blocking(
    processor: Arc<dyn ImageProcessor>,
    frame: Frame,
) -> Result<Frame, ProcessingError> {
    tokio::task::spawn_blocking(move || processor.process(&frame)).await?
}
