//! Staging area for decrypted documents
//!
//! Writes each artifact to a fresh file in the temp directory and registers
//! it with the [`TempArtifactRegistry`] for shutdown cleanup.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};
use url::Url;

use crate::error::{StorageError, StorageResult};
use crate::registry::TempArtifactRegistry;

/// Configuration for the staging area
#[derive(Debug, Clone)]
pub struct StagingConfig {
    /// Directory staged files are written to
    pub dir: PathBuf,
    /// File name prefix
    pub prefix: String,
    /// File extension, without the dot
    pub extension: String,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            dir: std::env::temp_dir(),
            prefix: "powermis".to_string(),
            extension: "pdf".to_string(),
        }
    }
}

impl StagingConfig {
    /// Stage into a specific directory
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Self::default()
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }
}

/// A document written to temporary storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    /// Absolute path of the file
    pub path: PathBuf,
    /// `file://` URI for the viewer
    pub uri: String,
    /// Bytes written
    pub size: usize,
}

/// Writes artifacts to uniquely named temp files
pub struct StagingArea {
    config: StagingConfig,
    registry: Arc<TempArtifactRegistry>,
    sequence: AtomicU64,
}

impl StagingArea {
    pub fn new(config: StagingConfig, registry: Arc<TempArtifactRegistry>) -> Self {
        Self {
            config,
            registry,
            sequence: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &StagingConfig {
        &self.config
    }

    /// Registry staged files are tracked in
    pub fn registry(&self) -> &Arc<TempArtifactRegistry> {
        &self.registry
    }

    /// Write `data` to a new file and register it.
    ///
    /// The file is only registered once fully written. A partially written
    /// file is removed again.
    #[instrument(skip(self, data), fields(size = data.len()))]
    pub async fn stage(&self, data: &[u8]) -> StorageResult<StagedFile> {
        fs::create_dir_all(&self.config.dir).await?;
        let dir = fs::canonicalize(&self.config.dir).await?;
        let path = dir.join(self.next_file_name());

        let uri = Url::from_file_path(&path)
            .map_err(|_| StorageError::InvalidPath(path.clone()))?
            .to_string();

        write_new_file(&path, data).await?;

        self.registry.register(&path);
        debug!(path = %path.display(), "Staged artifact");

        Ok(StagedFile {
            path,
            uri,
            size: data.len(),
        })
    }

    /// `<prefix>_<unix millis>_<sequence>.<extension>`
    fn next_file_name(&self) -> String {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        format!(
            "{}_{}_{}.{}",
            self.config.prefix,
            chrono::Utc::now().timestamp_millis(),
            seq,
            self.config.extension
        )
    }
}

async fn write_new_file(path: &Path, data: &[u8]) -> StorageResult<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;

    let written = match file.write_all(data).await {
        Ok(()) => file.flush().await,
        Err(e) => Err(e),
    };
    if let Err(e) = written {
        drop(file);
        let _ = fs::remove_file(path).await;
        return Err(e.into());
    }
    Ok(())
}
