//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, content-type helpers)
//!     → server.rs dispatch (route table lookup)
//!     → views (handler for the matched route)
//!     → response.rs (view errors → status codes)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestIdExt, X_REQUEST_ID};
pub use response::ViewError;
pub use server::{AppState, HttpServer};
