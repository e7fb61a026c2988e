//! Two-tier key resolution.
//!
//! Older documents were encrypted under a single universal key, newer ones
//! under a per-request key. Decryption tries the supplied key first and only
//! then the fallback key. The order is fixed.

use tracing::{debug, warn};

use crate::container::decrypt_container;
use crate::error::{CryptoError, CryptoResult};

/// Universal key used by documents predating per-request keys
pub const FALLBACK_KEY: &str = "HqQ1lktHBygmbnrQ";

/// Which key opened a container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Supplied,
    Fallback,
}

/// Decrypts containers with a supplied key, falling back to a fixed key
#[derive(Debug, Clone)]
pub struct KeyResolver {
    fallback_key: String,
}

impl Default for KeyResolver {
    fn default() -> Self {
        Self {
            fallback_key: FALLBACK_KEY.to_string(),
        }
    }
}

impl KeyResolver {
    /// Resolver using [`FALLBACK_KEY`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver with a different fallback key
    pub fn with_fallback_key(fallback_key: impl Into<String>) -> Self {
        Self {
            fallback_key: fallback_key.into(),
        }
    }

    /// Decrypt `data` and report which key succeeded.
    ///
    /// # Errors
    ///
    /// - [`CryptoError::MalformedContainer`] immediately, without a retry
    /// - [`CryptoError::DecryptionFailed`] when both keys are rejected
    pub fn decrypt_resolved(
        &self,
        data: &[u8],
        supplied_key: &str,
    ) -> CryptoResult<(Vec<u8>, KeySource)> {
        let supplied_reason = match decrypt_container(data, supplied_key.as_bytes()) {
            Ok(document) => return Ok((document, KeySource::Supplied)),
            Err(CryptoError::DecryptionError(reason)) => reason,
            Err(e) => return Err(e),
        };

        warn!(reason = %supplied_reason, "Supplied key rejected, retrying with fallback key");

        match decrypt_container(data, self.fallback_key.as_bytes()) {
            Ok(document) => {
                debug!(size = document.len(), "Container opened with fallback key");
                Ok((document, KeySource::Fallback))
            }
            Err(CryptoError::DecryptionError(fallback_reason)) => {
                Err(CryptoError::DecryptionFailed(format!(
                    "supplied key: {}; fallback key: {}",
                    supplied_reason, fallback_reason
                )))
            }
            Err(e) => Err(e),
        }
    }

    /// Decrypt `data`, discarding which key was used
    pub fn decrypt(&self, data: &[u8], supplied_key: &str) -> CryptoResult<Vec<u8>> {
        self.decrypt_resolved(data, supplied_key)
            .map(|(document, _)| document)
    }
}

/// Decrypt with the supplied key, then with [`FALLBACK_KEY`]
pub fn decrypt_with_fallback(data: &[u8], supplied_key: &str) -> CryptoResult<Vec<u8>> {
    KeyResolver::new().decrypt(data, supplied_key)
}
