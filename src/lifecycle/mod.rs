//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     broadcast → HTTP server closes video feeds, stops accepting, drains
//!              → admin API stops
//! ```
//!
//! # Design Decisions
//! - Ordered startup lives in main: config, logging, metrics, listeners
//! - One broadcast channel fans the shutdown out to every server task

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
