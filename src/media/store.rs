//! On-disk upload storage with an in-memory index.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::body::Bytes;
use dashmap::DashMap;
use futures_util::{pin_mut, Stream, StreamExt};
use serde::Serialize;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::frames::unix_now;
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("upload exceeds {limit} bytes")]
    TooLarge { limit: usize },
    #[error("upload stream failed: {0}")]
    Stream(String),
    #[error("upload is empty")]
    Empty,
}

/// What a stored file is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    DehazeInput,
    DehazeOutput,
    Video,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::DehazeInput => "dehaze_input",
            MediaKind::DehazeOutput => "dehaze_output",
            MediaKind::Video => "video",
        }
    }

    fn dir(self) -> &'static str {
        match self {
            MediaKind::DehazeInput => "dehaze/input",
            MediaKind::DehazeOutput => "dehaze/output",
            MediaKind::Video => "videos",
        }
    }
}

/// Index entry for one stored file.
#[derive(Debug, Clone, Serialize)]
pub struct MediaRecord {
    pub id: Uuid,
    pub kind: MediaKind,
    pub original_name: Option<String>,
    pub content_type: String,
    pub size: u64,
    /// Seconds since epoch.
    pub created_at: u64,
    #[serde(skip)]
    pub path: PathBuf,
    #[serde(skip)]
    seq: u64,
}

/// Upload store rooted at a directory.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
    index: Arc<DashMap<Uuid, MediaRecord>>,
    seq: Arc<AtomicU64>,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            index: Arc::new(DashMap::new()),
            seq: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store a fully buffered upload.
    pub async fn save(
        &self,
        kind: MediaKind,
        original_name: Option<&str>,
        content_type: &str,
        data: &[u8],
    ) -> Result<MediaRecord, MediaError> {
        if data.is_empty() {
            return Err(MediaError::Empty);
        }
        let (id, path) = self.allocate(kind, original_name).await?;
        fs::write(&path, data).await?;
        Ok(self.index_record(id, kind, original_name, content_type, data.len() as u64, path))
    }

    /// Stream an upload to disk chunk by chunk, enforcing `limit`.
    ///
    /// The partial file is removed if the stream fails, overflows or is cancelled.
    pub async fn save_stream<S, E>(
        &self,
        kind: MediaKind,
        original_name: Option<&str>,
        content_type: &str,
        stream: S,
        limit: usize,
    ) -> Result<MediaRecord, MediaError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: std::fmt::Display,
    {
        let (id, path) = self.allocate(kind, original_name).await?;
        let partial = PartialFile::new(path);
        match write_stream(partial.path(), stream, limit).await? {
            0 => Err(MediaError::Empty),
            size => {
                let path = partial.commit();
                Ok(self.index_record(id, kind, original_name, content_type, size, path))
            }
        }
    }

    /// Drop a record from the index and delete its file.
    pub async fn remove(&self, id: &Uuid) -> Option<MediaRecord> {
        let (_, record) = self.index.remove(id)?;
        if let Err(e) = fs::remove_file(&record.path).await {
            tracing::warn!(id = %id, error = %e, "Failed to delete stored media");
        }
        Some(record)
    }

    pub fn get(&self, id: &Uuid) -> Option<MediaRecord> {
        self.index.get(id).map(|r| r.value().clone())
    }

    /// Most recently stored record of `kind`.
    pub fn latest(&self, kind: MediaKind) -> Option<MediaRecord> {
        self.index
            .iter()
            .filter(|r| r.value().kind == kind)
            .max_by_key(|r| r.value().seq)
            .map(|r| r.value().clone())
    }

    pub fn count(&self) -> usize {
        self.index.len()
    }

    async fn allocate(
        &self,
        kind: MediaKind,
        original_name: Option<&str>,
    ) -> Result<(Uuid, PathBuf), MediaError> {
        let dir = self.root.join(kind.dir());
        fs::create_dir_all(&dir).await?;

        let id = Uuid::new_v4();
        let file_name = match original_name.and_then(extension) {
            Some(ext) => format!("{id}.{ext}"),
            None => id.to_string(),
        };
        Ok((id, dir.join(file_name)))
    }

    fn index_record(
        &self,
        id: Uuid,
        kind: MediaKind,
        original_name: Option<&str>,
        content_type: &str,
        size: u64,
        path: PathBuf,
    ) -> MediaRecord {
        let record = MediaRecord {
            id,
            kind,
            original_name: original_name.map(str::to_string),
            content_type: content_type.to_string(),
            size,
            created_at: unix_now(),
            path,
            seq: self.seq.fetch_add(1, Ordering::Relaxed),
        };
        self.index.insert(id, record.clone());
        metrics::record_upload(kind.as_str(), size);
        tracing::info!(
            id = %record.id,
            kind = kind.as_str(),
            size = record.size,
            "Media stored"
        );
        record
    }
}

/// A file being written. Deleted on drop unless committed, so an upload
/// future cancelled mid-write leaves nothing behind.
struct PartialFile {
    path: PathBuf,
    committed: bool,
}

impl PartialFile {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            committed: false,
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn commit(mut self) -> PathBuf {
        self.committed = true;
        std::mem::take(&mut self.path)
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = ?self.path, error = %e, "Failed to remove partial upload");
            }
        }
    }
}

async fn write_stream<S, E>(path: &Path, stream: S, limit: usize) -> Result<u64, MediaError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: std::fmt::Display,
{
    pin_mut!(stream);
    let mut file = fs::File::create(path).await?;
    let mut written: usize = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| MediaError::Stream(e.to_string()))?;
        written += chunk.len();
        if written > limit {
            return Err(MediaError::TooLarge { limit });
        }
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    Ok(written as u64)
}

/// Extension of an uploaded filename, if short and alphanumeric.
fn extension(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() || ext.len() > 8 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
