//! Latest-frame broadcast hub.
//!
//! # Responsibilities
//! - Hold the most recently published frame
//! - Wake every open feed stream when a new frame arrives
//! - End all feed streams on shutdown
//!
//! # Design Decisions
//! - `watch` channel: slow viewers skip frames instead of queueing them
//! - Frames are `Arc`-shared; publishing never copies image bytes

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::body::Bytes;
use futures_util::stream::{self, Stream};
use tokio::sync::watch;

use crate::frames::Frame;
use crate::observability::metrics;

#[derive(Debug, Clone)]
enum FeedState {
    Open(Option<Arc<Frame>>),
    Closed,
}

/// Shared handle to the live frame feed.
#[derive(Debug, Clone)]
pub struct FrameHub {
    tx: Arc<watch::Sender<FeedState>>,
    next_id: Arc<AtomicU64>,
}

impl FrameHub {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(FeedState::Open(None));
        Self {
            tx: Arc::new(tx),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Replace the current frame and wake all subscribers.
    ///
    /// The frame id is assigned here, under the channel lock, so the feed's
    /// current frame always carries the highest id handed out. Returns `None`
    /// once the hub is closed.
    pub fn publish(&self, mut frame: Frame) -> Option<u64> {
        let mut published = None;
        self.tx.send_if_modified(|state| match state {
            FeedState::Open(current) => {
                frame.id = self.next_id.fetch_add(1, Ordering::Relaxed);
                published = Some(frame.id);
                *current = Some(Arc::new(frame));
                true
            }
            FeedState::Closed => false,
        });
        if published.is_some() {
            metrics::record_frame();
        }
        published
    }

    /// The most recently published frame.
    pub fn latest(&self) -> Option<Arc<Frame>> {
        match &*self.tx.borrow() {
            FeedState::Open(frame) => frame.clone(),
            FeedState::Closed => None,
        }
    }

    /// End every open feed stream. Idempotent.
    pub fn close(&self) {
        self.tx.send_replace(FeedState::Closed);
    }

    pub fn is_closed(&self) -> bool {
        matches!(*self.tx.borrow(), FeedState::Closed)
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Stream of frames: the current one (if any), then each newly published one.
    ///
    /// The stream ends when the hub is closed.
    pub fn subscribe(&self) -> impl Stream<Item = Arc<Frame>> + Send + 'static {
        let rx = self.tx.subscribe();
        metrics::set_feed_subscribers(self.subscriber_count());

        let subscription = Subscription {
            rx,
            first: true,
            tx: self.tx.clone(),
        };
        stream::unfold(subscription, |mut sub| async move {
            loop {
                if sub.first {
                    sub.first = false;
                } else if sub.rx.changed().await.is_err() {
                    return None;
                }
                let state = sub.rx.borrow_and_update().clone();
                match state {
                    FeedState::Open(Some(frame)) => return Some((frame, sub)),
                    FeedState::Open(None) => continue,
                    FeedState::Closed => return None,
                }
            }
        })
    }
}

impl Default for FrameHub {
    fn default() -> Self {
        Self::new()
    }
}

struct Subscription {
    rx: watch::Receiver<FeedState>,
    first: bool,
    tx: Arc<watch::Sender<FeedState>>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        // Our own receiver is still counted until this returns.
        metrics::set_feed_subscribers(self.tx.receiver_count().saturating_sub(1));
    }
}

/// Boundary separating parts of the `multipart/x-mixed-replace` feed.
pub const FEED_BOUNDARY: &str = "frame";

/// Encode one frame as a part of the mixed-replace stream.
pub fn encode_part(frame: &Frame) -> Bytes {
    let header = format!(
        "--{}\r\nContent-Type: {}\r\nContent-Length: {}\r\n\r\n",
        FEED_BOUNDARY,
        frame.content_type,
        frame.data.len()
    );
    let mut part = Vec::with_capacity(header.len() + frame.data.len() + 2);
    part.extend_from_slice(header.as_bytes());
    part.extend_from_slice(&frame.data);
    part.extend_from_slice(b"\r\n");
    Bytes::from(part)
}
