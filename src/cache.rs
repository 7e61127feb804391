//! Local persistence hook for fetched poems.
//!
//! The engine saves every non-empty remote result here and reads it back when
//! the remote is unreachable. [`NoopCache`] is the default and keeps the
//! engine's fallback purely on the sample corpus.

use crate::model::Poem;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cache file is not valid JSON: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[async_trait]
pub trait PoemCache: Send + Sync {
    async fn save(&self, poems: &[Poem]) -> Result<(), CacheError>;
    async fn load_cached(&self) -> Result<Vec<Poem>, CacheError>;
}

/// Cache that stores nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCache;

#[async_trait]
impl PoemCache for NoopCache {
    async fn save(&self, _poems: &[Poem]) -> Result<(), CacheError> {
        Ok(())
    }

    async fn load_cached(&self) -> Result<Vec<Poem>, CacheError> {
        Ok(Vec::new())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    saved_at: DateTime<Utc>,
    poems: Vec<Poem>,
}

/// JSON file cache holding the most recently fetched poems.
///
/// New poems go to the front; entries are unique by id and capped at
/// `max_entries`. Writes go to a temp file that is renamed over the cache,
/// so a crash mid-write never leaves a truncated cache behind.
#[derive(Debug, Clone)]
pub struct JsonFileCache {
    path: PathBuf,
    max_entries: usize,
}

impl JsonFileCache {
    pub const DEFAULT_MAX_ENTRIES: usize = 500;

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_entries: Self::DEFAULT_MAX_ENTRIES,
        }
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_file(&self) -> Result<Option<CacheFile>, CacheError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::Io(e)),
        }
    }

    async fn write_atomic(&self, file: &CacheFile) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(file)?;
        let temp_path = self.path.with_extension(format!(
            "tmp.{:016x}",
            Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&temp_path, &bytes).await?;
        if let Err(e) = tokio::fs::rename(&temp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(CacheError::Io(e));
        }
        Ok(())
    }
}

#[async_trait]
impl PoemCache for JsonFileCache {
    async fn save(&self, poems: &[Poem]) -> Result<(), CacheError> {
        if poems.is_empty() {
            return Ok(());
        }

        // Unreadable cache contents are replaced rather than blocking saves
        let existing = match self.read_file().await {
            Ok(file) => file.map(|f| f.poems).unwrap_or_default(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Discarding unreadable poem cache");
                Vec::new()
            }
        };

        let mut seen = HashSet::new();
        let merged: Vec<Poem> = poems
            .iter()
            .cloned()
            .chain(existing)
            .filter(|p| seen.insert(p.id))
            .take(self.max_entries)
            .collect();

        let count = merged.len();
        self.write_atomic(&CacheFile {
            saved_at: Utc::now(),
            poems: merged,
        })
        .await?;
        tracing::debug!(path = %self.path.display(), entries = count, "Saved poem cache");
        Ok(())
    }

    async fn load_cached(&self) -> Result<Vec<Poem>, CacheError> {
        Ok(self.read_file().await?.map(|f| f.poems).unwrap_or_default())
    }
}
