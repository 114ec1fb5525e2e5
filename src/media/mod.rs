//! Upload storage.
//!
//! Files land under `<media.root>/<kind dir>/<uuid>.<ext>`; the index lives in
//! memory and is rebuilt empty on restart.

pub mod store;

pub use store::{MediaError, MediaKind, MediaRecord, MediaStore};
