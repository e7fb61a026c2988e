//! Error types raised by reader collaborators

use thiserror::Error;

/// Errors from fetching a remote document
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid document location: {0}")]
    InvalidLocation(String),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    #[error("Failed to read response body: {0}")]
    Body(String),
}

/// Errors reported by a render surface
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("Page load failed: {description} (code {code})")]
    LoadFailed { code: i32, description: String },

    #[error("Navigation rejected: {0}")]
    Navigation(String),

    #[error("Surface already closed")]
    Closed,

    #[error("Print failed: {0}")]
    PrintFailed(String),
}

/// Errors from printer enumeration
#[derive(Debug, Error)]
pub enum PrinterError {
    #[error("No window available to query printers")]
    NoHost,

    #[error("Printer enumeration failed: {0}")]
    Enumeration(String),
}
