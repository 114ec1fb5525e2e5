//! Location telemetry ingestion.

pub mod store;

pub use store::{LocationError, LocationPoint, LocationStore, StoredLocation};
