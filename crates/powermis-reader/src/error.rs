//! Error types for the reader

use std::time::Duration;

use powermis_core::{FetchError, PrinterError, SurfaceError};
use powermis_crypto::CryptoError;
use powermis_storage::StorageError;
use thiserror::Error;

/// Errors that can occur while opening or printing a document
///
/// Display strings carry the full detail for logs. What the user sees comes
/// from [`ReaderError::user_message`].
#[derive(Debug, Error)]
pub enum ReaderError {
    /// The invocation did not name a document
    #[error("No document in invocation")]
    NoDocument,

    /// Downloading the container failed
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// The container envelope is corrupt
    #[error("Malformed container: {0}")]
    MalformedContainer(String),

    /// Neither the supplied nor the fallback key opened the container
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    /// Writing the decrypted document to temp storage failed
    #[error("Staging error: {0}")]
    Staging(#[from] StorageError),

    /// The print page could not be loaded or rendered
    #[error("Print page failed to load: {0}")]
    SurfaceLoadFailure(String),

    /// The print page did not report readiness in time
    #[error("Print page not ready after {0:?}")]
    SurfaceTimeout(Duration),

    #[error("No printer available")]
    NoPrinterAvailable,

    #[error("Print failed: {0}")]
    PrintFailed(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// The reader is quitting and accepts no more documents
    #[error("Reader is shutting down")]
    ShuttingDown,
}

impl ReaderError {
    /// Short message suitable for the viewer
    pub fn user_message(&self) -> String {
        match self {
            ReaderError::NoDocument => "no document to display".to_string(),
            ReaderError::Fetch(_)
            | ReaderError::MalformedContainer(_)
            | ReaderError::DecryptionFailed(_)
            | ReaderError::Staging(_) => "unable to load PDF".to_string(),
            ReaderError::SurfaceLoadFailure(reason) => format!("PDF load failed: {}", reason),
            ReaderError::SurfaceTimeout(timeout) => {
                format!("PDF load timed out ({} s)", timeout.as_secs())
            }
            ReaderError::NoPrinterAvailable => "no available printer".to_string(),
            ReaderError::PrintFailed(reason) if reason.is_empty() => {
                "print failed: unknown error".to_string()
            }
            ReaderError::PrintFailed(reason) => format!("print failed: {}", reason),
            ReaderError::Config(_) => "configuration error".to_string(),
            ReaderError::ShuttingDown => "reader is shutting down".to_string(),
        }
    }
}

impl From<CryptoError> for ReaderError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::MalformedContainer(reason) => ReaderError::MalformedContainer(reason),
            other => ReaderError::DecryptionFailed(other.to_string()),
        }
    }
}

impl From<SurfaceError> for ReaderError {
    fn from(e: SurfaceError) -> Self {
        match e {
            SurfaceError::PrintFailed(reason) => ReaderError::PrintFailed(reason),
            SurfaceError::LoadFailed { code, description } => {
                ReaderError::SurfaceLoadFailure(format!("{} (code {})", description, code))
            }
            other => ReaderError::SurfaceLoadFailure(other.to_string()),
        }
    }
}

impl From<PrinterError> for ReaderError {
    fn from(e: PrinterError) -> Self {
        tracing::debug!(error = %e, "Printer enumeration failed");
        ReaderError::NoPrinterAvailable
    }
}

impl From<toml::de::Error> for ReaderError {
    fn from(e: toml::de::Error) -> Self {
        ReaderError::Config(e.to_string())
    }
}

/// Result type alias for reader operations
pub type ReaderResult<T> = Result<T, ReaderError>;
