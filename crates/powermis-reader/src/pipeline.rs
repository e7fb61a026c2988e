//! Fetch, decrypt, and stage pipeline
//!
//! Each invocation runs the chain strictly in order: download the container,
//! decrypt it on the blocking pool, write the document to a fresh temp file.
//! Nothing is written unless every earlier step succeeded.

use std::sync::Arc;

use powermis_core::{DocumentFetcher, InvocationParams};
use powermis_crypto::KeyResolver;
use powermis_storage::{StagedFile, StagingArea};
use tracing::{debug, info, instrument, warn};

use crate::error::{ReaderError, ReaderResult};

/// Turns a remote encrypted container into a local document
pub struct DocumentPipeline {
    fetcher: Arc<dyn DocumentFetcher>,
    resolver: KeyResolver,
    staging: StagingArea,
}

impl DocumentPipeline {
    pub fn new(fetcher: Arc<dyn DocumentFetcher>, staging: StagingArea) -> Self {
        Self {
            fetcher,
            resolver: KeyResolver::new(),
            staging,
        }
    }

    /// Use a different key resolver
    pub fn with_key_resolver(mut self, resolver: KeyResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn staging(&self) -> &StagingArea {
        &self.staging
    }

    /// Stage the document named by an invocation
    pub async fn open(&self, params: &InvocationParams) -> ReaderResult<StagedFile> {
        self.stage_remote_document(&params.file_url, &params.file_key)
            .await
    }

    /// Fetch the container at `location`, decrypt it with `key` (or the
    /// fallback key), and stage the result.
    ///
    /// Failures are logged with their full cause; the returned error's
    /// [`user_message`](ReaderError::user_message) is what the user sees.
    #[instrument(skip(self, key))]
    pub async fn stage_remote_document(
        &self,
        location: &str,
        key: &str,
    ) -> ReaderResult<StagedFile> {
        let result = self.fetch_decrypt_stage(location, key).await;
        if let Err(e) = &result {
            warn!(error = %e, "Failed to open document");
        }
        result
    }

    async fn fetch_decrypt_stage(&self, location: &str, key: &str) -> ReaderResult<StagedFile> {
        let body = self.fetcher.fetch(location).await?;
        debug!(size = body.len(), "Container downloaded");

        let resolver = self.resolver.clone();
        let key = key.to_string();
        let (document, source) =
            tokio::task::spawn_blocking(move || resolver.decrypt_resolved(&body, &key))
                .await
                .map_err(|e| ReaderError::DecryptionFailed(format!("decrypt task: {}", e)))??;
        debug!(?source, size = document.len(), "Container decrypted");

        let staged = self.staging.stage(&document).await?;
        info!(path = %staged.path.display(), size = staged.size, "Document staged");
        Ok(staged)
    }
}
