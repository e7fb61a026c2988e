//! # Powermis Core
//!
//! Core types, collaborator traits, and errors shared by the Powermis
//! document reader crates.
//!
//! The reader talks to the platform (viewer window, offscreen print surface,
//! printer list, remote document store) only through the traits defined
//! here, so the same pipeline and print logic run against real platform
//! adapters and against the in-memory mocks in [`mock`].
//!
//! ## Key Traits
//!
//! - [`DocumentFetcher`]: Retrieves a remote encrypted container
//! - [`ViewerSink`]: Receives display instructions for the user-facing viewer
//! - [`RenderSurface`] / [`SurfaceFactory`]: Offscreen surface used for printing
//! - [`PrinterEnumerator`]: Lists the platform's print targets
//!
//! ## Key Types
//!
//! - [`InvocationParams`]: Validated document location and key from a scheme URL
//! - [`PrintJobRequest`]: A print request as issued by the viewer
//! - [`PrintSettings`]: Resolved configuration passed to the print command
//! - [`SurfaceEvent`]: Signals raised by a render surface while loading

pub mod error;
pub mod mock;
pub mod traits;
pub mod types;

// Re-export main types
pub use error::*;
pub use mock::*;
pub use traits::*;
pub use types::*;
