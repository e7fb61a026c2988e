//! # Powermis Storage
//!
//! Temporary storage for decrypted documents.
//!
//! ## Features
//!
//! - **StagingArea**: Writes each artifact to a uniquely named temp file
//! - **TempArtifactRegistry**: Tracks staged files and deletes them once at shutdown
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use powermis_storage::{StagingArea, StagingConfig, TempArtifactRegistry};
//!
//! #[tokio::main]
//! async fn main() {
//!     let registry = Arc::new(TempArtifactRegistry::new());
//!     let staging = StagingArea::new(StagingConfig::default(), registry.clone());
//!
//!     let staged = staging.stage(b"%PDF-1.7 ...").await.unwrap();
//!     println!("open {}", staged.uri);
//!
//!     // Single shutdown hook
//!     registry.drain_all();
//! }
//! ```

pub mod error;
pub mod registry;
pub mod staging;

// Re-exports
pub use error::{StorageError, StorageResult};
pub use registry::{DrainReport, TempArtifactRegistry};
pub use staging::{StagedFile, StagingArea, StagingConfig};
